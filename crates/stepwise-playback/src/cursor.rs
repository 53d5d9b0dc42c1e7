//! Read cursor over a step sequence.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stepwise_step::{Sequence, Step};

/// Coarse playback state, derived from the cursor for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Parked at the first step
    Stopped,
    /// Advancing on the timer
    Playing,
    /// Held somewhere past the first step
    Paused,
    /// Reached the terminal step
    Finished,
}

/// Everything that decides whether the timer must be re-armed.
///
/// Any change to it (a new sequence, a new index, play/pause) cancels the
/// pending tick; a speed change alone does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub epoch: u64,
    pub index: usize,
    pub playing: bool,
}

/// Cursor over an immutable sequence.
///
/// The sequence is shared read-only; the cursor only ever moves its index
/// or replaces the whole sequence.
#[derive(Debug)]
pub struct Cursor<S, R> {
    sequence: Arc<Sequence<S, R>>,
    index: usize,
    playing: bool,
    speed: u32,
    epoch: u64,
}

impl<S, R> Cursor<S, R> {
    /// Create a paused cursor at the first step.
    pub fn new(sequence: Sequence<S, R>, speed: u32) -> Self {
        Self {
            sequence: Arc::new(sequence),
            index: 0,
            playing: false,
            speed,
            epoch: 0,
        }
    }

    /// Replace the sequence and rewind.
    ///
    /// A single-step sequence never starts playing: there is nothing to
    /// advance to.
    pub fn load(&mut self, sequence: Sequence<S, R>, autoplay: bool) {
        self.sequence = Arc::new(sequence);
        self.index = 0;
        self.epoch += 1;
        self.playing = autoplay && !self.is_at_terminal();
    }

    /// Rewind the loaded sequence and play it again.
    pub fn replay(&mut self) {
        self.index = 0;
        self.epoch += 1;
        self.playing = !self.is_at_terminal();
    }

    /// Current index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Total number of steps.
    pub fn total(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the timer is advancing the cursor.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current speed setting.
    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Number of loads so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The loaded sequence.
    pub fn sequence(&self) -> &Arc<Sequence<S, R>> {
        &self.sequence
    }

    /// Step under the cursor.
    pub fn current(&self) -> &Step<S, R> {
        self.sequence.get(self.index).unwrap_or_else(|| self.sequence.last())
    }

    /// Whether the cursor sits on the last step.
    pub fn is_at_terminal(&self) -> bool {
        self.index >= self.sequence.terminal_index()
    }

    pub fn position(&self) -> Position {
        Position {
            epoch: self.epoch,
            index: self.index,
            playing: self.playing,
        }
    }

    pub fn state(&self) -> PlaybackState {
        if self.playing {
            PlaybackState::Playing
        } else if self.is_at_terminal() && self.total() > 1 {
            PlaybackState::Finished
        } else if self.index == 0 {
            PlaybackState::Stopped
        } else {
            PlaybackState::Paused
        }
    }

    /// Start advancing. No-op on the terminal step.
    pub fn play(&mut self) {
        self.playing = !self.is_at_terminal();
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Update the speed; the caller decides when it takes effect.
    pub fn set_speed(&mut self, speed: u32) {
        self.speed = speed;
    }

    /// Advance one step on a timer tick.
    ///
    /// Returns `false` when not playing or already terminal. Playback stops
    /// on reaching the terminal step.
    pub fn tick(&mut self) -> bool {
        if !self.playing || self.is_at_terminal() {
            self.playing = false;
            return false;
        }
        self.index += 1;
        if self.is_at_terminal() {
            self.playing = false;
        }
        true
    }

    /// Scrub to `index` (clamped) and pause.
    pub fn seek(&mut self, index: usize) {
        self.index = index.min(self.sequence.terminal_index());
        self.playing = false;
    }

    /// Manually step forward one step and pause.
    pub fn step_forward(&mut self) -> Option<&Step<S, R>> {
        self.playing = false;
        if self.is_at_terminal() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    /// Manually step back one step and pause.
    pub fn step_backward(&mut self) -> Option<&Step<S, R>> {
        self.playing = false;
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    /// Progress through the sequence, 0.0 at the first step and 1.0 at the
    /// terminal one.
    pub fn progress(&self) -> f64 {
        let terminal = self.sequence.terminal_index();
        if terminal == 0 {
            1.0
        } else {
            self.index as f64 / terminal as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_step::Highlights;

    fn make_sequence(count: usize) -> Sequence<usize, ()> {
        Sequence::from_steps(
            (0..count)
                .map(|i| Step::new(format!("step {i}"), Highlights::default(), i))
                .collect(),
        )
    }

    #[test]
    fn cursor_starts_at_zero() {
        let cursor = Cursor::new(make_sequence(10), 500);
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.state(), PlaybackState::Stopped);
        assert!(!cursor.is_playing());
    }

    #[test]
    fn load_rewinds_and_bumps_epoch() {
        let mut cursor = Cursor::new(make_sequence(10), 500);
        cursor.seek(7);
        cursor.load(make_sequence(4), true);

        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.total(), 4);
        assert_eq!(cursor.epoch(), 1);
        assert!(cursor.is_playing());
    }

    #[test]
    fn replay_rewinds_same_sequence() {
        let mut cursor = Cursor::new(make_sequence(3), 500);
        cursor.seek(2);
        let before = cursor.sequence().clone();

        cursor.replay();

        assert_eq!(cursor.index(), 0);
        assert!(cursor.is_playing());
        assert_eq!(cursor.epoch(), 1);
        assert!(Arc::ptr_eq(cursor.sequence(), &before));
    }

    #[test]
    fn single_step_never_plays() {
        let mut cursor = Cursor::new(make_sequence(1), 500);
        cursor.load(make_sequence(1), true);
        assert!(!cursor.is_playing());

        cursor.play();
        assert!(!cursor.is_playing());
        assert_eq!(cursor.state(), PlaybackState::Stopped);
    }

    #[test]
    fn tick_advances_and_self_terminates() {
        let mut cursor = Cursor::new(make_sequence(3), 500);
        cursor.play();

        assert!(cursor.tick());
        assert_eq!(cursor.index(), 1);
        assert!(cursor.is_playing());

        assert!(cursor.tick());
        assert_eq!(cursor.index(), 2);
        assert!(!cursor.is_playing());
        assert_eq!(cursor.state(), PlaybackState::Finished);

        assert!(!cursor.tick());
        assert_eq!(cursor.index(), 2);
    }

    #[test]
    fn tick_while_paused_does_nothing() {
        let mut cursor = Cursor::new(make_sequence(3), 500);
        assert!(!cursor.tick());
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn seek_clamps_to_bounds() {
        let mut cursor = Cursor::new(make_sequence(10), 500);

        cursor.seek(5);
        assert_eq!(cursor.index(), 5);
        assert_eq!(cursor.state(), PlaybackState::Paused);

        cursor.seek(100);
        assert_eq!(cursor.index(), 9);

        cursor.seek(0);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn manual_stepping_pauses() {
        let mut cursor = Cursor::new(make_sequence(3), 500);
        cursor.play();

        let step = cursor.step_forward().map(|s| *s.state());
        assert_eq!(step, Some(1));
        assert!(!cursor.is_playing());

        cursor.step_forward();
        assert!(cursor.step_forward().is_none());

        cursor.step_backward();
        cursor.step_backward();
        assert!(cursor.step_backward().is_none());
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn progress_calculation() {
        let mut cursor = Cursor::new(make_sequence(11), 500);
        assert_eq!(cursor.progress(), 0.0);

        cursor.seek(5);
        assert_eq!(cursor.progress(), 0.5);

        cursor.seek(10);
        assert_eq!(cursor.progress(), 1.0);

        let single = Cursor::new(make_sequence(1), 500);
        assert_eq!(single.progress(), 1.0);
    }

    #[test]
    fn position_tracks_what_rearms_the_timer() {
        let mut cursor = Cursor::new(make_sequence(5), 500);
        let before = cursor.position();

        cursor.set_speed(900);
        assert_eq!(cursor.position(), before);

        cursor.play();
        assert_ne!(cursor.position(), before);
    }
}
