//! One visualizer's controller state: producer, parameters, external store
//! and the cursor over the latest run.
//!
//! Everything here is synchronous. Time enters only through
//! [`Session::tick`], which the [`Player`](crate::Player) calls when its
//! timer fires and which tests call directly.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stepwise_step::{Producer, ResetPolicy, Sequence, Step};
use tracing::{debug, trace};

use crate::config::PlaybackConfig;
use crate::cursor::{Cursor, PlaybackState};

/// Which parameters a reset regenerates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamSource {
    /// Parameters the session was mounted with
    Defaults,
    /// Parameters currently in effect
    Current,
}

/// An owned snapshot of an external structure plus its version.
///
/// Each committed operation moves version N to N+1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    version: u64,
    value: T,
}

impl<T> Versioned<T> {
    pub fn new(value: T) -> Self {
        Self { version: 0, value }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T: PartialEq> Versioned<T> {
    /// Replace the value with its successor. The version only moves when
    /// the value actually changed.
    pub fn commit(&mut self, value: T) -> u64 {
        if value != self.value {
            self.value = value;
            self.version += 1;
        }
        self.version
    }
}

/// Snapshot of the controller for readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub index: usize,
    pub total: usize,
    pub state: PlaybackState,
    pub is_playing: bool,
    pub speed: u32,
    pub delay_ms: u64,
    pub epoch: u64,
    pub store_version: u64,
    pub progress: f64,
}

/// Where the loaded sequence came from, which decides how it is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// `produce` over the current params and store; replay re-runs it
    Produced,
    /// `operate` over the previous store; replay reuses the sequence
    Operation,
}

/// Controller for one visualizer.
pub struct Session<P: Producer> {
    producer: P,
    config: PlaybackConfig,
    defaults: P::Params,
    params: P::Params,
    store: Versioned<P::Store>,
    cursor: Cursor<P::Snapshot, P::Role>,
    origin: Origin,
}

impl<P: Producer> Session<P> {
    /// Mount a visualizer: run the producer once and load its steps.
    pub fn new(producer: P, params: P::Params, config: PlaybackConfig) -> Self {
        Self::with_store(producer, params, P::Store::default(), config)
    }

    /// Mount with a pre-populated store.
    pub fn with_store(
        producer: P,
        params: P::Params,
        store: P::Store,
        config: PlaybackConfig,
    ) -> Self {
        let speed = config.speed.clamp(config.initial_speed);
        let steps = producer.produce(&params, &store);
        let mut cursor = Cursor::new(Sequence::from_steps(Vec::new()), speed);
        cursor.load(Sequence::from_steps(steps), config.autoplay);
        debug!(total = cursor.total(), autoplay = config.autoplay, "mounted session");

        Self {
            producer,
            config,
            defaults: params.clone(),
            params,
            store: Versioned::new(store),
            cursor,
            origin: Origin::Produced,
        }
    }

    /// Replace the sequence wholesale and rewind.
    pub fn load(&mut self, steps: Vec<Step<P::Snapshot, P::Role>>, autoplay: bool) {
        self.origin = Origin::Produced;
        self.load_sequence(steps, autoplay);
    }

    fn load_sequence(&mut self, steps: Vec<Step<P::Snapshot, P::Role>>, autoplay: bool) {
        if steps.is_empty() {
            debug!("producer returned no steps, substituting idle step");
        }
        self.cursor.load(Sequence::from_steps(steps), autoplay);
        debug!(
            epoch = self.cursor.epoch(),
            total = self.cursor.total(),
            playing = self.cursor.is_playing(),
            "loaded sequence"
        );
    }

    /// Pause/resume, or replay from scratch once the run has finished.
    ///
    /// A produced run is regenerated from the current params and store. An
    /// operation's explanation is replayed as recorded: its input store has
    /// already been superseded by the commit.
    pub fn toggle_play_pause(&mut self) {
        if self.cursor.is_at_terminal() && self.cursor.total() > 1 {
            match self.origin {
                Origin::Produced => {
                    debug!("regenerating finished run");
                    let steps = self.regenerate();
                    self.load(steps, true);
                }
                Origin::Operation => {
                    debug!("replaying finished operation");
                    self.cursor.replay();
                }
            }
        } else if self.cursor.is_playing() {
            self.cursor.pause();
        } else {
            self.cursor.play();
        }
    }

    /// Change the speed (clamped to the configured range).
    pub fn set_speed(&mut self, setting: u32) {
        let speed = self.config.speed.clamp(setting);
        if speed != setting {
            debug!(requested = setting, applied = speed, "clamped speed setting");
        }
        self.cursor.set_speed(speed);
    }

    /// Regenerate from default or current parameters and park at the start.
    pub fn reset(&mut self, source: ParamSource) {
        if source == ParamSource::Defaults {
            self.params = self.defaults.clone();
        }
        if P::RESET == ResetPolicy::ClearStore {
            let version = self.store.commit(P::Store::default());
            debug!(version, "cleared store on reset");
        }
        let steps = self.regenerate();
        self.load(steps, false);
    }

    /// Replace the parameters and show the new run from the start.
    pub fn set_params(&mut self, params: P::Params) {
        self.params = params;
        let steps = self.regenerate();
        self.load(steps, false);
    }

    /// Apply an operation to the external store.
    ///
    /// The new store is committed before anything is animated; the loaded
    /// steps only explain a change that has already happened.
    pub fn request_operation(&mut self, op: P::Op) {
        let transition = self.producer.operate(&self.params, self.store.value(), op);
        let version = self.store.commit(transition.store);
        debug!(version, "committed operation");
        self.origin = Origin::Operation;
        self.load_sequence(transition.steps, true);
    }

    /// Timer tick: advance one step while playing.
    pub fn tick(&mut self) -> bool {
        let advanced = self.cursor.tick();
        trace!(index = self.cursor.index(), advanced, "tick");
        advanced
    }

    /// Scrub to an index and pause.
    pub fn seek(&mut self, index: usize) {
        self.cursor.seek(index);
    }

    /// Jump back to the first step and pause.
    pub fn rewind(&mut self) {
        self.cursor.seek(0);
    }

    pub fn step_forward(&mut self) {
        self.cursor.step_forward();
    }

    pub fn step_backward(&mut self) {
        self.cursor.step_backward();
    }

    /// Wait before the next tick at the current speed.
    pub fn delay(&self) -> Duration {
        self.config.speed.delay(self.cursor.speed())
    }

    pub fn cursor(&self) -> &Cursor<P::Snapshot, P::Role> {
        &self.cursor
    }

    pub fn current_step(&self) -> &Step<P::Snapshot, P::Role> {
        self.cursor.current()
    }

    pub fn params(&self) -> &P::Params {
        &self.params
    }

    pub fn store(&self) -> &Versioned<P::Store> {
        &self.store
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            index: self.cursor.index(),
            total: self.cursor.total(),
            state: self.cursor.state(),
            is_playing: self.cursor.is_playing(),
            speed: self.cursor.speed(),
            delay_ms: self.delay().as_millis() as u64,
            epoch: self.cursor.epoch(),
            store_version: self.store.version(),
            progress: self.cursor.progress(),
        }
    }

    fn regenerate(&self) -> Vec<Step<P::Snapshot, P::Role>> {
        self.producer.produce(&self.params, self.store.value())
    }
}
