use crate::pitch::Note;
use crate::session::{Shared, Task};
use crate::timeline::TaskId;
use crate::tracker::Layer;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

pub const MAX_ACTIVE_NOTES: usize = 4;
pub const TICK_DELAY_MS: RangeInclusive<u64> = 1000..=3000;
pub const NOTE_DURATION_MS: RangeInclusive<u64> = 1500..=4000;
/// Silent sectors are redrawn at once this many times before waiting for the next tick.
pub const MAX_IMMEDIATE_RETRIES: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassiveTask {
    Tick,
    NoteEnd,
}

/// Plays random sectors on its own until stopped.
#[derive(Debug, Default)]
pub struct PassivePlayer {
    active: bool,
    tick: Option<TaskId>,
    retries: u32,
    notes: Vec<(TaskId, Note)>,
}

impl PassivePlayer {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn active_notes(&self) -> usize {
        self.notes.len()
    }

    pub(crate) fn tick_task(&self) -> Option<TaskId> {
        self.tick
    }

    pub(crate) fn start(&mut self, now: Instant, shared: &mut Shared<'_>) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.schedule_tick(now, shared);
        log::info!("Passive mode started");
        true
    }

    /// Cancels everything this player scheduled and unflashes its sectors.
    pub(crate) fn stop(&mut self, shared: &mut Shared<'_>) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.retries = 0;

        if let Some(id) = self.tick.take() {
            shared.timeline.cancel(id);
        }
        for (id, note) in self.notes.drain(..) {
            shared.timeline.cancel(id);
            shared.tracker.remove(Layer::Flashing, note.sector);
        }
        log::info!("Passive mode stopped");
        true
    }

    pub(crate) fn run(
        &mut self,
        id: TaskId,
        task: PassiveTask,
        at: Instant,
        shared: &mut Shared<'_>,
    ) {
        match task {
            PassiveTask::Tick => {
                self.tick = None;
                self.tick(at, shared);
            }
            PassiveTask::NoteEnd => {
                if let Some(pos) = self.notes.iter().position(|(n, _)| *n == id) {
                    let (_, note) = self.notes.remove(pos);
                    shared.tracker.remove(Layer::Flashing, note.sector);
                }
            }
        }
    }

    fn tick(&mut self, at: Instant, shared: &mut Shared<'_>) {
        if !self.active {
            return;
        }

        if self.notes.len() < MAX_ACTIVE_NOTES {
            let sector = shared.layout.random_sector(&mut *shared.rng);
            let Some(note) = shared.layout.note(sector) else {
                if self.retries < MAX_IMMEDIATE_RETRIES {
                    self.retries += 1;
                    log::debug!("Passive note at {} out of range, retrying", sector);
                    self.tick =
                        Some(shared.timeline.schedule(at, Task::Passive(PassiveTask::Tick)));
                } else {
                    self.retries = 0;
                    log::debug!("No playable sector found, waiting for the next tick");
                    self.schedule_tick(at, shared);
                }
                return;
            };
            self.retries = 0;

            let duration = Duration::from_millis(shared.rng.gen_range(NOTE_DURATION_MS));
            shared.sound(note, duration);
            shared.tracker.add(Layer::Flashing, sector);
            let id = shared
                .timeline
                .schedule(at + duration, Task::Passive(PassiveTask::NoteEnd));
            self.notes.push((id, note));
            log::debug!(
                "Passive note {} at {} for {:?}",
                note.frequency,
                sector,
                duration
            );
        }

        self.schedule_tick(at, shared);
    }

    fn schedule_tick(&mut self, now: Instant, shared: &mut Shared<'_>) {
        let delay = Duration::from_millis(shared.rng.gen_range(TICK_DELAY_MS));
        self.tick = Some(
            shared
                .timeline
                .schedule(now + delay, Task::Passive(PassiveTask::Tick)),
        );
    }
}
