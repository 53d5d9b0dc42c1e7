//! Stepwise Playback Controller
//!
//! Replays a producer's step sequence on a timer and exposes the controls
//! every visualizer shares: play/pause, speed, reset, scrubbing and, for
//! visualizers backed by a persistent structure, operations against it.
//!
//! # Architecture
//!
//! - **Cursor**: read position over an immutable, shared sequence
//! - **Session**: producer + params + versioned store + cursor; synchronous
//! - **Player**: tokio task that owns a session and fires its ticks
//! - **Speed**: slider setting to delay mapping (`delay = max - speed + min`)
//!
//! # Usage
//!
//! ```ignore
//! let session = Session::new(MinMax, MinMaxParams::values([1, 2, 3]), PlaybackConfig::default());
//! let player = Player::spawn(session);
//!
//! player.set_speed(900).await?;
//! let frame = player.frame();
//! render(frame.step());
//! ```

mod config;
mod cursor;
mod error;
mod player;
mod session;
mod speed;

pub use config::PlaybackConfig;
pub use cursor::{Cursor, PlaybackState, Position};
pub use error::{Error, Result};
pub use player::{Frame, Player};
pub use session::{ParamSource, PlaybackStatus, Session, Versioned};
pub use speed::{delay_ms, SpeedRange, DEFAULT_MAX_SPEED, DEFAULT_MIN_SPEED};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::convert::Infallible;
    use stepwise_step::{Highlights, Producer, Step, Transition};

    struct Counter;

    impl Producer for Counter {
        type Params = usize;
        type Store = ();
        type Op = Infallible;
        type Snapshot = usize;
        type Role = ();

        fn produce(&self, params: &usize, _store: &()) -> Vec<Step<usize, ()>> {
            (0..*params)
                .map(|i| Step::new(format!("count {i}"), Highlights::default(), i))
                .collect()
        }

        fn operate(&self, _params: &usize, _store: &(), op: Infallible) -> Transition<Self> {
            match op {}
        }
    }

    #[derive(Debug, Clone)]
    enum Control {
        Tick,
        Toggle,
        Speed(u32),
        Reset(bool),
        Params(usize),
        Seek(usize),
        Forward,
        Backward,
    }

    fn arb_control() -> impl Strategy<Value = Control> {
        prop_oneof![
            4 => Just(Control::Tick),
            1 => Just(Control::Toggle),
            1 => (0u32..2000).prop_map(Control::Speed),
            1 => any::<bool>().prop_map(Control::Reset),
            1 => (0usize..12).prop_map(Control::Params),
            1 => (0usize..20).prop_map(Control::Seek),
            1 => Just(Control::Forward),
            1 => Just(Control::Backward),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn index_stays_in_bounds(
            initial in 0usize..12,
            controls in prop::collection::vec(arb_control(), 0..80),
        ) {
            let mut session = Session::new(Counter, initial, PlaybackConfig::default());
            for control in controls {
                match control {
                    Control::Tick => { session.tick(); }
                    Control::Toggle => session.toggle_play_pause(),
                    Control::Speed(s) => session.set_speed(s),
                    Control::Reset(defaults) => session.reset(if defaults {
                        ParamSource::Defaults
                    } else {
                        ParamSource::Current
                    }),
                    Control::Params(n) => session.set_params(n),
                    Control::Seek(i) => session.seek(i),
                    Control::Forward => session.step_forward(),
                    Control::Backward => session.step_backward(),
                }
                let cursor = session.cursor();
                prop_assert!(cursor.index() < cursor.total());
                prop_assert!(cursor.total() >= 1);
                prop_assert!(!(cursor.is_playing() && cursor.is_at_terminal()));
                prop_assert!(session.config().speed.contains(cursor.speed()));
            }
        }

        #[test]
        fn ticks_advance_by_exactly_one(len in 1usize..30, ticks in 0usize..40) {
            let mut session = Session::new(Counter, len, PlaybackConfig::default());
            for _ in 0..ticks {
                let before = session.cursor().index();
                let advanced = session.tick();
                let after = session.cursor().index();
                if advanced {
                    prop_assert_eq!(after, before + 1);
                } else {
                    prop_assert_eq!(after, before);
                }
            }
            prop_assert_eq!(session.cursor().index(), ticks.min(len - 1));
        }
    }
}
