use crate::grid::{GridConfig, GridLayout, Point, SectorAddress};
use crate::learning::{LearningConfig, LearningError, LearningSession, LearningTask, Verdict};
use crate::passive::{PassivePlayer, PassiveTask};
use crate::pitch::{Note, TonePlayer};
use crate::scene::Scene;
use crate::timeline::{TaskId, Timeline};
use crate::tracker::{Layer, SectorTracker};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

pub const CLICK_NOTE: Duration = Duration::from_millis(1000);
pub const CLICK_FLASH: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Unflash(SectorAddress),
    Passive(PassiveTask),
    Learning(LearningTask),
}

/// The resources every mode works against, borrowed out of the session for one call.
pub(crate) struct Shared<'a> {
    pub layout: &'a GridLayout,
    pub tracker: &'a mut SectorTracker,
    pub timeline: &'a mut Timeline<Task>,
    pub rng: &'a mut StdRng,
    pub player: &'a dyn TonePlayer,
    pub last_note: &'a mut Option<Note>,
}

impl Shared<'_> {
    pub fn sound(&mut self, note: Note, duration: Duration) {
        self.player
            .play(note.frequency, duration, note.frequency.volume_multiplier());
        *self.last_note = Some(note);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    Played(Note),
    Answered(Verdict),
}

/// Owns the grid and every mode that draws on it. Single threaded: the front end
/// feeds it input and calls [`Session::advance`] whenever [`Session::next_deadline`] passes.
pub struct Session {
    layout: GridLayout,
    show_colors: bool,
    tracker: SectorTracker,
    timeline: Timeline<Task>,
    flashes: Vec<TaskId>,
    passive: PassivePlayer,
    learning: LearningSession,
    rng: StdRng,
    player: Box<dyn TonePlayer>,
    last_note: Option<Note>,
}

impl Session {
    pub fn new(config: GridConfig, show_colors: bool, player: Box<dyn TonePlayer>) -> Self {
        Self {
            layout: GridLayout::new(config, 0.0, 0.0),
            show_colors,
            tracker: SectorTracker::new(),
            timeline: Timeline::new(),
            flashes: Vec::new(),
            passive: PassivePlayer::default(),
            learning: LearningSession::default(),
            rng: StdRng::from_entropy(),
            player,
            last_note: None,
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_band(mut self, band: RangeInclusive<f64>) -> Self {
        self.layout = self.layout.with_band(band);
        self
    }

    pub fn with_canvas(mut self, width: f64, height: f64) -> Self {
        self.resize(width, height);
        self
    }

    fn split(&mut self) -> (&mut PassivePlayer, &mut LearningSession, Shared<'_>) {
        (
            &mut self.passive,
            &mut self.learning,
            Shared {
                layout: &self.layout,
                tracker: &mut self.tracker,
                timeline: &mut self.timeline,
                rng: &mut self.rng,
                player: &*self.player,
                last_note: &mut self.last_note,
            },
        )
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn tracker(&self) -> &SectorTracker {
        &self.tracker
    }

    pub fn learning(&self) -> &LearningSession {
        &self.learning
    }

    pub fn passive(&self) -> &PassivePlayer {
        &self.passive
    }

    pub fn show_colors(&self) -> bool {
        self.show_colors
    }

    pub fn last_note(&self) -> Option<&Note> {
        self.last_note.as_ref()
    }

    pub fn scene(&self) -> Scene {
        Scene::build(&self.layout, &self.tracker, self.show_colors)
    }

    pub fn take_redraw(&mut self) -> bool {
        self.tracker.take_redraw()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.layout.resize(width, height);
        self.tracker.request_redraw();
    }

    /// Swaps the grid shape. Addresses from the old grid mean nothing on the new one,
    /// so transient state is dropped and running modes start over.
    pub fn reconfigure(&mut self, config: GridConfig, now: Instant) {
        if config == self.layout.config() {
            return;
        }
        let center = self.layout.center();
        self.layout = GridLayout::new(config, center.x * 2.0, center.y * 2.0)
            .with_band(self.layout.band().clone());

        for id in self.flashes.drain(..) {
            self.timeline.cancel(id);
        }

        let passive = self.stop_passive();
        let learning = self
            .learning
            .is_active()
            .then(|| self.learning.config().clone());
        self.stop_learning();
        self.tracker.clear_all();
        self.tracker.request_redraw();

        if passive {
            self.start_passive(now);
        }
        if let Some(learning) = learning
            && let Err(e) = self.start_learning(learning, now)
        {
            log::warn!("Could not restart learning: {}", e);
        }
        log::info!(
            "Grid reconfigured to {}x{}",
            config.radial_divisions(),
            config.circumferential_divisions()
        );
    }

    pub fn set_show_colors(&mut self, show_colors: bool) {
        if self.show_colors != show_colors {
            self.show_colors = show_colors;
            self.tracker.request_redraw();
        }
    }

    pub fn toggle_show_colors(&mut self) -> bool {
        self.set_show_colors(!self.show_colors);
        self.show_colors
    }

    pub fn click(&mut self, point: Point, now: Instant) -> Option<ClickOutcome> {
        let sector = self.layout.locate(point)?;

        let (_, learning, mut shared) = self.split();
        if let Some(verdict) = learning.answer_spatial(sector, now, &mut shared) {
            return Some(ClickOutcome::Answered(verdict));
        }

        let note = self.layout.note(sector)?;
        let (_, _, mut shared) = self.split();
        shared.sound(note, CLICK_NOTE);
        log::debug!("Clicked {}, playing {}", sector, note.frequency);

        if !self.show_colors {
            self.tracker.add(Layer::Flashing, sector);
            let id = self
                .timeline
                .schedule(now + CLICK_FLASH, Task::Unflash(sector));
            self.flashes.push(id);
        }
        Some(ClickOutcome::Played(note))
    }

    pub fn start_passive(&mut self, now: Instant) -> bool {
        let (passive, _, mut shared) = self.split();
        passive.start(now, &mut shared)
    }

    pub fn stop_passive(&mut self) -> bool {
        let (passive, _, mut shared) = self.split();
        passive.stop(&mut shared)
    }

    /// Returns whether passive mode is running afterwards.
    pub fn toggle_passive(&mut self, now: Instant) -> bool {
        if !self.stop_passive() {
            self.start_passive(now);
        }
        self.passive.is_active()
    }

    pub fn start_learning(
        &mut self,
        config: LearningConfig,
        now: Instant,
    ) -> Result<(), LearningError> {
        let (_, learning, mut shared) = self.split();
        learning.start(config, now, &mut shared)
    }

    pub fn stop_learning(&mut self) -> bool {
        let (_, learning, mut shared) = self.split();
        learning.stop(&mut shared)
    }

    pub fn choose_option(&mut self, index: usize, now: Instant) -> Option<Verdict> {
        let (_, learning, mut shared) = self.split();
        learning.choose(index, now, &mut shared)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timeline.next_deadline()
    }

    /// Runs every task due at `now`, including ones scheduled by tasks run here.
    pub fn advance(&mut self, now: Instant) {
        while let Some((id, at, task)) = self.timeline.pop_due(now) {
            match task {
                Task::Unflash(sector) => {
                    self.flashes.retain(|f| *f != id);
                    self.tracker.remove(Layer::Flashing, sector);
                }
                Task::Passive(task) => {
                    let (passive, _, mut shared) = self.split();
                    passive.run(id, task, at, &mut shared);
                }
                Task::Learning(task) => {
                    let (_, learning, mut shared) = self.split();
                    learning.run(id, task, at, &mut shared);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passive::MAX_ACTIVE_NOTES;
    use crate::testing::RecordingPlayer;

    fn session(radial: u32, circumferential: u32, show_colors: bool) -> (Session, RecordingPlayer) {
        let player = RecordingPlayer::default();
        let session = Session::new(
            GridConfig::new(radial, circumferential).unwrap(),
            show_colors,
            Box::new(player.clone()),
        )
        .with_rng(StdRng::seed_from_u64(42))
        .with_canvas(600.0, 600.0);
        (session, player)
    }

    fn point_of(session: &Session, sector: SectorAddress) -> Point {
        let layout = session.layout();
        layout.to_canvas(layout.sector_center(sector))
    }

    #[test]
    fn test_click_plays_and_flashes() {
        let (mut session, player) = session(3, 8, false);
        let t0 = Instant::now();
        let sector = SectorAddress::new(0, 0);

        let outcome = session.click(point_of(&session, sector), t0).unwrap();
        let ClickOutcome::Played(note) = outcome else {
            panic!("expected a note, got {:?}", outcome);
        };
        assert!((note.frequency.hz() - 130.815).abs() < 1e-9);
        assert_eq!(session.last_note(), Some(&note));

        let played = player.played();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].1, CLICK_NOTE);
        assert_eq!(played[0].2, 5.0);

        assert!(session.tracker().contains(Layer::Flashing, sector));
        assert!(session.take_redraw());
        assert!(!session.scene().is_skeleton());

        session.advance(t0 + CLICK_FLASH);
        assert!(session.tracker().is_empty(Layer::Flashing));
        assert!(session.scene().is_skeleton());
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn test_click_with_colors_does_not_flash() {
        let (mut session, player) = session(3, 8, true);
        let t0 = Instant::now();
        session.click(point_of(&session, SectorAddress::new(2, 4)), t0);
        assert_eq!(player.played().len(), 1);
        assert!(session.tracker().is_empty(Layer::Flashing));
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn test_click_outside_grid_is_ignored() {
        let (mut session, player) = session(8, 8, false);
        let t0 = Instant::now();
        session.take_redraw();
        assert_eq!(session.click(Point::new(300.0, 300.0), t0), None);
        assert_eq!(session.click(Point::new(0.0, 0.0), t0), None);
        assert!(player.played().is_empty());
        assert!(!session.take_redraw());
    }

    #[test]
    fn test_repeated_click_flash_expires_once() {
        let (mut session, _) = session(3, 8, false);
        let t0 = Instant::now();
        let p = point_of(&session, SectorAddress::new(1, 3));
        session.click(p, t0);
        session.click(p, t0 + Duration::from_millis(400));

        session.advance(t0 + CLICK_FLASH);
        assert!(session.tracker().is_empty(Layer::Flashing));
        session.advance(t0 + Duration::from_millis(1400));
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn test_passive_respects_note_cap() {
        let (mut session, player) = session(3, 8, false);
        let t0 = Instant::now();
        assert!(session.start_passive(t0));
        assert!(!session.start_passive(t0));

        for step in 0..200 {
            session.advance(t0 + Duration::from_millis(step * 100));
            assert!(session.passive().active_notes() <= MAX_ACTIVE_NOTES);
        }
        let played = player.played();
        assert!(!played.is_empty());
        for (_, duration, _) in &played {
            assert!((1500..=4000).contains(&(duration.as_millis() as u64)));
        }
    }

    fn next_tick(session: &Session) -> Instant {
        let id = session.passive().tick_task().unwrap();
        session.timeline.deadline(id).unwrap()
    }

    #[test]
    fn test_passive_tick_delay_stays_in_range() {
        let (mut session, _) = session(3, 8, false);
        let range = Duration::from_millis(1000)..=Duration::from_millis(3000);
        let t0 = Instant::now();
        session.start_passive(t0);
        assert!(range.contains(&(next_tick(&session) - t0)));

        for _ in 0..20 {
            let at = next_tick(&session);
            session.advance(at);
            assert!(range.contains(&(next_tick(&session) - at)));
        }
    }

    #[test]
    fn test_silent_grid_never_uses_a_note_slot() {
        let (session, player) = session(3, 8, false);
        let mut session = session.with_band(0.0..=1.0);
        let t0 = Instant::now();
        session.start_passive(t0);

        let mut last = t0;
        for _ in 0..5 {
            let at = next_tick(&session);
            // retries are bounded, so this returns
            session.advance(at);
            assert_eq!(session.passive().active_notes(), 0);
            assert!(next_tick(&session) - at >= Duration::from_millis(1000));
            last = at;
        }
        assert!(player.played().is_empty());
        assert!(session.tracker().is_empty(Layer::Flashing));

        session.reconfigure(GridConfig::new(4, 6).unwrap(), last);
        assert_eq!(session.layout().band(), &(0.0..=1.0));
    }

    #[test]
    fn test_rejected_sector_is_retried_at_once() {
        // only the innermost ring of a 3 x 8 grid sounds
        let (session, player) = session(3, 8, false);
        let mut session = session.with_band(100.0..=250.0);
        let t0 = Instant::now();
        session.start_passive(t0);

        let mut ticks = 0;
        while player.played().is_empty() {
            let at = next_tick(&session);
            session.advance(at);
            ticks += 1;
            assert!(ticks < 50);
        }

        assert_eq!(player.played().len(), 1);
        assert_eq!(session.passive().active_notes(), 1);
        let (frequency, _, _) = player.played()[0];
        assert!((100.0..=250.0).contains(&frequency.hz()));
        assert!(
            session
                .tracker()
                .iter(Layer::Flashing)
                .all(|s| s.radial_index == 0)
        );
    }

    #[test]
    fn test_passive_stop_cleans_up() {
        let (mut session, _) = session(8, 8, false);
        let t0 = Instant::now();
        session.start_passive(t0);
        let mut now = t0;
        while session.passive().active_notes() == 0 {
            now += Duration::from_millis(100);
            session.advance(now);
        }
        assert!(!session.tracker().is_empty(Layer::Flashing));

        assert!(session.stop_passive());
        assert!(session.tracker().is_empty(Layer::Flashing));
        assert_eq!(session.next_deadline(), None);
        assert!(session.scene().is_skeleton());
        assert!(!session.stop_passive());
    }

    #[test]
    fn test_passive_stop_keeps_click_flash_timers() {
        let (mut session, _) = session(3, 8, false);
        let t0 = Instant::now();
        session.start_passive(t0);
        session.click(point_of(&session, SectorAddress::new(0, 1)), t0);
        session.stop_passive();
        assert_eq!(session.next_deadline(), Some(t0 + CLICK_FLASH));
    }

    #[test]
    fn test_toggle_passive() {
        let (mut session, _) = session(3, 8, false);
        let t0 = Instant::now();
        assert!(session.toggle_passive(t0));
        assert!(!session.toggle_passive(t0));
        assert!(!session.passive().is_active());
    }

    #[test]
    fn test_reconfigure_drops_transient_state() {
        let (mut session, _) = session(3, 8, false);
        let t0 = Instant::now();
        session.click(point_of(&session, SectorAddress::new(2, 7)), t0);
        session.start_passive(t0);

        session.reconfigure(GridConfig::new(8, 4).unwrap(), t0);
        assert_eq!(session.layout().skip_radial_levels(), 2);
        assert_eq!(session.layout().max_radius(), 290.0);
        assert!(session.tracker().is_empty(Layer::Flashing));
        assert!(session.passive().is_active());
        // only the restarted passive tick remains
        assert!(session.next_deadline().unwrap() >= t0 + Duration::from_millis(1000));
    }

    #[test]
    fn test_toggle_show_colors_requests_redraw() {
        let (mut session, _) = session(3, 8, false);
        session.take_redraw();
        assert!(session.toggle_show_colors());
        assert!(session.take_redraw());
        assert!(!session.scene().is_skeleton());
    }
}
