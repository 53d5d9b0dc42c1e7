//! Stepwise Step Contract
//!
//! The unit of animation shared by every visualizer: an immutable [`Step`]
//! holding a full snapshot of algorithm state, highlight annotations and a
//! line of narration.
//!
//! # Shape of a visualizer
//!
//! 1. A [`Producer`] runs its algorithm once, synchronously, to completion
//! 2. Every pedagogically relevant instant is recorded as a [`Step`]
//! 3. The resulting [`Sequence`] is handed to a playback controller, which
//!    only ever moves a read cursor over it
//!
//! A sequence is never empty. A producer with nothing to show still yields
//! the idle step, so a renderer always has something to draw.
//!
//! # Recording
//!
//! Recursive algorithms thread a [`StepRecorder`] through their calls by
//! `&mut` instead of pushing into captured shared vectors. Ids for nodes or
//! calls come from an [`IdSequence`] owned by the invocation.

mod highlight;
mod ids;
mod producer;
mod recorder;
mod step;

pub use highlight::{Highlight, Highlights, Target};
pub use ids::IdSequence;
pub use producer::{NoOperation, Producer, ResetPolicy, Transition};
pub use recorder::StepRecorder;
pub use step::{Sequence, Step, IDLE_MESSAGE};
