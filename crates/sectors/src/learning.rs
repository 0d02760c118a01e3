//! Cue/recall drill: present a random sector through one modality and ask for it back
//! through another.

use crate::color::SectorColor;
use crate::grid::{GridLayout, PolarPoint, SectorAddress};
use crate::pitch::{Frequency, Note};
use crate::session::{Shared, Task};
use crate::timeline::TaskId;
use crate::tracker::Layer;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

pub const TONE_CUE: Duration = Duration::from_millis(1000);
pub const COLOR_CUE: Duration = Duration::from_millis(500);
pub const HIGHLIGHT_CUE: Duration = Duration::from_millis(500);
pub const POPUP_CUE: Duration = Duration::from_millis(1000);
pub const FEEDBACK: Duration = Duration::from_millis(500);
pub const PAUSE: Duration = Duration::from_millis(500);

pub const DISTRACTOR_COUNT: usize = 6;
pub const MAX_SAMPLE_ATTEMPTS: usize = 1000;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    #[strum(to_string = "piano", serialize = "tone")]
    Piano,
    #[strum(to_string = "color", serialize = "colour")]
    Color,
    Spatial,
    #[strum(to_string = "coordinate", serialize = "coordinates")]
    Coordinate,
}

impl Modality {
    /// A tone can cue a sector but there is no way to answer with one.
    pub fn can_recall(self) -> bool {
        self != Self::Piano
    }

    pub fn recallable() -> impl Iterator<Item = Self> {
        Self::iter().filter(|m| m.can_recall())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningError {
    #[error("Please select at least one cue modality.")]
    NoCueModality,
    #[error("Please select at least one recall modality.")]
    NoRecallModality,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningConfig {
    #[serde(default)]
    pub cues: BTreeSet<Modality>,
    #[serde(default)]
    pub recalls: BTreeSet<Modality>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            cues: Modality::iter().collect(),
            recalls: Modality::recallable().collect(),
        }
    }
}

impl LearningConfig {
    pub fn new(
        cues: impl IntoIterator<Item = Modality>,
        recalls: impl IntoIterator<Item = Modality>,
    ) -> Self {
        Self {
            cues: cues.into_iter().collect(),
            recalls: recalls.into_iter().filter(|m| m.can_recall()).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), LearningError> {
        if self.cues.is_empty() {
            return Err(LearningError::NoCueModality);
        }
        if !self.recalls.iter().any(|m| m.can_recall()) {
            return Err(LearningError::NoRecallModality);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingCue,
    CuePresented,
    AwaitingResponse,
    Feedback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cue {
    pub cue_modality: Modality,
    pub recall_modality: Modality,
    pub sector: SectorAddress,
    pub frequency: Frequency,
    pub coordinates: PolarPoint,
    pub color: SectorColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOption {
    pub label: String,
    /// Swatch for colour questions.
    pub color: Option<SectorColor>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum Verdict {
    #[strum(to_string = "CORRECT")]
    Correct,
    #[strum(to_string = "INCORRECT")]
    Incorrect,
}

impl Verdict {
    fn from_bool(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Incorrect }
    }
}

/// Everything the front end overlays on top of the grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearningView {
    pub background: Option<SectorColor>,
    pub popup: Option<String>,
    pub prompt: Option<Modality>,
    pub options: Vec<AnswerOption>,
    pub feedback: Option<Verdict>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningTask {
    NextCue,
    CueEnd,
    FeedbackEnd,
}

#[derive(Debug, Default)]
pub struct LearningSession {
    phase: Phase,
    config: LearningConfig,
    cue: Option<Cue>,
    view: LearningView,
    pending: Vec<TaskId>,
}

impl LearningSession {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    pub fn cue(&self) -> Option<&Cue> {
        self.cue.as_ref()
    }

    pub fn view(&self) -> &LearningView {
        &self.view
    }

    fn awaiting_answer(&self) -> bool {
        matches!(self.phase, Phase::CuePresented | Phase::AwaitingResponse)
    }

    pub(crate) fn start(
        &mut self,
        config: LearningConfig,
        now: Instant,
        shared: &mut Shared<'_>,
    ) -> Result<(), LearningError> {
        config.validate()?;
        self.stop(shared);

        self.config = config;
        self.phase = Phase::AwaitingCue;
        self.schedule(now, LearningTask::NextCue, shared);
        log::info!(
            "Learning started, cues {:?}, recalls {:?}",
            self.config.cues,
            self.config.recalls
        );
        Ok(())
    }

    pub(crate) fn stop(&mut self, shared: &mut Shared<'_>) -> bool {
        if self.phase == Phase::Idle {
            return false;
        }
        self.cancel_pending(shared);
        shared.tracker.clear(Layer::Highlighted);
        self.view = LearningView::default();
        self.cue = None;
        self.phase = Phase::Idle;
        log::info!("Learning stopped");
        true
    }

    fn cancel_pending(&mut self, shared: &mut Shared<'_>) {
        for id in self.pending.drain(..) {
            shared.timeline.cancel(id);
        }
    }

    fn schedule(&mut self, at: Instant, task: LearningTask, shared: &mut Shared<'_>) {
        self.pending
            .push(shared.timeline.schedule(at, Task::Learning(task)));
    }

    pub(crate) fn run(
        &mut self,
        id: TaskId,
        task: LearningTask,
        at: Instant,
        shared: &mut Shared<'_>,
    ) {
        self.pending.retain(|p| *p != id);
        match task {
            LearningTask::NextCue => self.next_cue(at, shared),
            LearningTask::CueEnd => self.end_cue(shared),
            LearningTask::FeedbackEnd => {
                self.view = LearningView::default();
                self.cue = None;
                self.phase = Phase::AwaitingCue;
                self.schedule(at + PAUSE, LearningTask::NextCue, shared);
            }
        }
    }

    fn next_cue(&mut self, at: Instant, shared: &mut Shared<'_>) {
        let Some(cue) = self.draw_cue(shared) else {
            self.schedule(at + PAUSE, LearningTask::NextCue, shared);
            return;
        };

        let duration = self.present(&cue, shared);
        self.view.prompt = Some(cue.recall_modality);
        self.view.options = match cue.recall_modality {
            Modality::Color => color_options(shared.layout, cue.color, &mut *shared.rng),
            Modality::Coordinate => {
                coordinate_options(shared.layout, cue.coordinates, &mut *shared.rng)
            }
            Modality::Spatial | Modality::Piano => Vec::new(),
        };
        log::debug!(
            "Cue {} via {}, recall via {}",
            cue.sector,
            cue.cue_modality,
            cue.recall_modality
        );

        self.cue = Some(cue);
        self.phase = Phase::CuePresented;
        self.schedule(at + duration, LearningTask::CueEnd, shared);
    }

    fn draw_cue(&self, shared: &mut Shared<'_>) -> Option<Cue> {
        let cues: Vec<_> = self.config.cues.iter().copied().collect();
        let cue_modality = *cues.choose(&mut *shared.rng)?;

        let recalls: Vec<_> = self
            .config
            .recalls
            .iter()
            .copied()
            .filter(|m| m.can_recall() && *m != cue_modality)
            .collect();
        let Some(&recall_modality) = recalls.choose(&mut *shared.rng) else {
            log::debug!("No recall modality besides {}, skipping cycle", cue_modality);
            return None;
        };

        let sector = shared.layout.random_sector(&mut *shared.rng);
        let frequency = shared.layout.frequency(sector)?;
        Some(Cue {
            cue_modality,
            recall_modality,
            sector,
            frequency,
            coordinates: shared.layout.sector_center(sector),
            color: shared.layout.color(sector),
        })
    }

    fn present(&mut self, cue: &Cue, shared: &mut Shared<'_>) -> Duration {
        match cue.cue_modality {
            Modality::Piano => {
                shared.sound(Note::new(cue.frequency, cue.sector), TONE_CUE);
                TONE_CUE
            }
            Modality::Color => {
                self.view.background = Some(cue.color);
                COLOR_CUE
            }
            Modality::Spatial => {
                shared.tracker.add(Layer::Highlighted, cue.sector);
                HIGHLIGHT_CUE
            }
            Modality::Coordinate => {
                self.view.popup = Some(cue.coordinates.to_string());
                POPUP_CUE
            }
        }
    }

    fn end_cue(&mut self, shared: &mut Shared<'_>) {
        self.view.background = None;
        self.view.popup = None;
        if let Some(cue) = &self.cue {
            shared.tracker.remove(Layer::Highlighted, cue.sector);
        }
        if self.phase == Phase::CuePresented {
            self.phase = Phase::AwaitingResponse;
        }
    }

    /// Answers with the option at `index`. Ignored unless an option question is open.
    pub(crate) fn choose(
        &mut self,
        index: usize,
        at: Instant,
        shared: &mut Shared<'_>,
    ) -> Option<Verdict> {
        if !self.awaiting_answer() {
            return None;
        }
        let correct = self.view.options.get(index)?.is_correct;
        Some(self.resolve(correct, at, shared))
    }

    /// Consumes a grid click when the open question asks for a location.
    pub(crate) fn answer_spatial(
        &mut self,
        sector: SectorAddress,
        at: Instant,
        shared: &mut Shared<'_>,
    ) -> Option<Verdict> {
        let cue = self.cue.filter(|c| c.recall_modality == Modality::Spatial)?;
        if !self.awaiting_answer() {
            return None;
        }
        Some(self.resolve(cue.sector == sector, at, shared))
    }

    fn resolve(&mut self, correct: bool, at: Instant, shared: &mut Shared<'_>) -> Verdict {
        let verdict = Verdict::from_bool(correct);
        // an answer given while the cue is still showing ends it now
        self.cancel_pending(shared);
        self.end_cue(shared);
        self.view.feedback = Some(verdict);
        self.phase = Phase::Feedback;
        self.schedule(at + FEEDBACK, LearningTask::FeedbackEnd, shared);
        log::debug!("Answer {}", verdict);
        verdict
    }
}

/// Collects up to [`DISTRACTOR_COUNT`] values whose keys differ from each other and
/// from the correct one.
fn distractors<T, K: PartialEq>(
    correct: &T,
    mut sample: impl FnMut() -> T,
    key: impl Fn(&T) -> K,
) -> Vec<T> {
    let mut seen = vec![key(correct)];
    let mut found = Vec::with_capacity(DISTRACTOR_COUNT);

    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        if found.len() == DISTRACTOR_COUNT {
            break;
        }
        let candidate = sample();
        let k = key(&candidate);
        if !seen.contains(&k) {
            seen.push(k);
            found.push(candidate);
        }
    }

    if found.len() < DISTRACTOR_COUNT {
        log::warn!(
            "Only {} distinct distractors available, wanted {}",
            found.len(),
            DISTRACTOR_COUNT
        );
    }
    found
}

pub fn color_options<R: Rng + ?Sized>(
    layout: &GridLayout,
    correct: SectorColor,
    rng: &mut R,
) -> Vec<AnswerOption> {
    let others = distractors(
        &correct,
        || layout.color(layout.random_sector(&mut *rng)),
        |c| c.to_string(),
    );
    let option = |color: SectorColor, is_correct| AnswerOption {
        label: color.to_string(),
        color: Some(color),
        is_correct,
    };

    let mut options: Vec<_> = std::iter::once(option(correct, true))
        .chain(others.into_iter().map(|c| option(c, false)))
        .collect();
    options.shuffle(rng);
    options
}

pub fn coordinate_options<R: Rng + ?Sized>(
    layout: &GridLayout,
    correct: PolarPoint,
    rng: &mut R,
) -> Vec<AnswerOption> {
    let others = distractors(
        &correct,
        || layout.sector_center(layout.random_sector(&mut *rng)),
        // rounded labels can collide on small canvases
        |p| p.to_string(),
    );
    let option = |point: PolarPoint, is_correct| AnswerOption {
        label: point.to_string(),
        color: None,
        is_correct,
    };

    let mut options: Vec<_> = std::iter::once(option(correct, true))
        .chain(others.into_iter().map(|p| option(p, false)))
        .collect();
    options.shuffle(rng);
    options
}
