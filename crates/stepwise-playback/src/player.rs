//! Async driver that advances a [`Session`] on a wall-clock timer.
//!
//! # Model
//!
//! One task owns the session. Controls arrive as messages and are answered
//! with the resulting [`PlaybackStatus`]; every change is published as a
//! [`Frame`] on a watch channel for renderers.
//!
//! The task keeps at most one armed deadline. Whenever a command changes
//! the cursor's [`Position`](crate::Position) (new sequence, new index,
//! play/pause) the deadline is dropped and re-armed from scratch, so a tick
//! scheduled for a replaced sequence can never fire against its successor.
//! A speed change leaves the armed deadline alone and is picked up when the
//! next one is armed.

use std::sync::Arc;

use stepwise_step::{Producer, Sequence, Step};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::session::{ParamSource, PlaybackStatus, Session};

/// Commands queued ahead of the driver before senders wait.
const COMMAND_BUFFER: usize = 32;

/// What a renderer needs to draw the current instant.
#[derive(Debug)]
pub struct Frame<S, R> {
    pub sequence: Arc<Sequence<S, R>>,
    pub status: PlaybackStatus,
}

impl<S, R> Clone for Frame<S, R> {
    fn clone(&self) -> Self {
        Self {
            sequence: Arc::clone(&self.sequence),
            status: self.status.clone(),
        }
    }
}

impl<S, R> Frame<S, R> {
    /// Step under the cursor.
    pub fn step(&self) -> &Step<S, R> {
        self.sequence
            .get(self.status.index)
            .unwrap_or_else(|| self.sequence.last())
    }
}

enum Action<P: Producer> {
    Status,
    Load {
        steps: Vec<Step<P::Snapshot, P::Role>>,
        autoplay: bool,
    },
    Toggle,
    SetSpeed(u32),
    Reset(ParamSource),
    SetParams(P::Params),
    Operate(P::Op),
    Seek(usize),
    Rewind,
    StepForward,
    StepBackward,
}

struct Envelope<P: Producer> {
    action: Action<P>,
    reply: oneshot::Sender<PlaybackStatus>,
}

/// Handle to a running player. Cheap to clone; the task stops when the last
/// handle is dropped.
pub struct Player<P: Producer> {
    commands: mpsc::Sender<Envelope<P>>,
    frames: watch::Receiver<Frame<P::Snapshot, P::Role>>,
}

impl<P: Producer> Clone for Player<P> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            frames: self.frames.clone(),
        }
    }
}

impl<P: Producer> Player<P> {
    /// Spawn the driver task on the current tokio runtime.
    pub fn spawn(session: Session<P>) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (frames_tx, frames_rx) = watch::channel(frame_of(&session));

        let driver = Driver {
            session,
            commands: commands_rx,
            frames: frames_tx,
            deadline: None,
        };
        tokio::spawn(driver.run());

        Self {
            commands: commands_tx,
            frames: frames_rx,
        }
    }

    /// Latest published frame.
    pub fn frame(&self) -> Frame<P::Snapshot, P::Role> {
        self.frames.borrow().clone()
    }

    /// Receiver notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<Frame<P::Snapshot, P::Role>> {
        self.frames.clone()
    }

    /// Current status, after every previously sent command has applied.
    pub async fn status(&self) -> Result<PlaybackStatus> {
        self.request(Action::Status).await
    }

    /// Replace the sequence wholesale.
    pub async fn load(
        &self,
        steps: Vec<Step<P::Snapshot, P::Role>>,
        autoplay: bool,
    ) -> Result<PlaybackStatus> {
        self.request(Action::Load { steps, autoplay }).await
    }

    pub async fn toggle_play_pause(&self) -> Result<PlaybackStatus> {
        self.request(Action::Toggle).await
    }

    pub async fn set_speed(&self, setting: u32) -> Result<PlaybackStatus> {
        self.request(Action::SetSpeed(setting)).await
    }

    pub async fn reset(&self, source: ParamSource) -> Result<PlaybackStatus> {
        self.request(Action::Reset(source)).await
    }

    pub async fn set_params(&self, params: P::Params) -> Result<PlaybackStatus> {
        self.request(Action::SetParams(params)).await
    }

    pub async fn request_operation(&self, op: P::Op) -> Result<PlaybackStatus> {
        self.request(Action::Operate(op)).await
    }

    pub async fn seek(&self, index: usize) -> Result<PlaybackStatus> {
        self.request(Action::Seek(index)).await
    }

    pub async fn rewind(&self) -> Result<PlaybackStatus> {
        self.request(Action::Rewind).await
    }

    pub async fn step_forward(&self) -> Result<PlaybackStatus> {
        self.request(Action::StepForward).await
    }

    pub async fn step_backward(&self) -> Result<PlaybackStatus> {
        self.request(Action::StepBackward).await
    }

    async fn request(&self, action: Action<P>) -> Result<PlaybackStatus> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Envelope { action, reply })
            .await
            .map_err(|_| Error::Closed)?;
        response.await.map_err(|_| Error::Closed)
    }
}

struct Driver<P: Producer> {
    session: Session<P>,
    commands: mpsc::Receiver<Envelope<P>>,
    frames: watch::Sender<Frame<P::Snapshot, P::Role>>,
    deadline: Option<Instant>,
}

impl<P: Producer> Driver<P> {
    async fn run(mut self) {
        self.arm();
        loop {
            // Ticks that are already due win over queued commands so a
            // command never observes a stale index.
            tokio::select! {
                biased;
                () = wait_until(self.deadline) => {
                    self.session.tick();
                    self.arm();
                    self.publish();
                }
                envelope = self.commands.recv() => {
                    let Some(Envelope { action, reply }) = envelope else {
                        break;
                    };
                    let before = self.session.cursor().position();
                    let publish = self.apply(action);
                    if self.session.cursor().position() != before {
                        self.arm();
                    }
                    if publish {
                        self.publish();
                    }
                    let _ = reply.send(self.session.status());
                }
            }
        }
        debug!("player stopped");
    }

    /// Returns whether readers should see a new frame.
    fn apply(&mut self, action: Action<P>) -> bool {
        match action {
            Action::Status => return false,
            Action::Load { steps, autoplay } => self.session.load(steps, autoplay),
            Action::Toggle => self.session.toggle_play_pause(),
            Action::SetSpeed(setting) => self.session.set_speed(setting),
            Action::Reset(source) => self.session.reset(source),
            Action::SetParams(params) => self.session.set_params(params),
            Action::Operate(op) => self.session.request_operation(op),
            Action::Seek(index) => self.session.seek(index),
            Action::Rewind => self.session.rewind(),
            Action::StepForward => self.session.step_forward(),
            Action::StepBackward => self.session.step_backward(),
        }
        true
    }

    /// Replace any pending deadline with one for the next step, if playing.
    fn arm(&mut self) {
        let cursor = self.session.cursor();
        self.deadline = if cursor.is_playing() && !cursor.is_at_terminal() {
            let delay = self.session.delay();
            trace!(index = cursor.index(), ?delay, "armed tick");
            Some(Instant::now() + delay)
        } else {
            None
        };
    }

    fn publish(&self) {
        self.frames.send_replace(frame_of(&self.session));
    }
}

fn frame_of<P: Producer>(session: &Session<P>) -> Frame<P::Snapshot, P::Role> {
    Frame {
        sequence: Arc::clone(session.cursor().sequence()),
        status: session.status(),
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use std::convert::Infallible;
    use std::time::Duration;
    use stepwise_step::{Highlights, Transition};

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

    fn paused() -> PlaybackConfig {
        PlaybackConfig::default().with_autoplay(false)
    }

    #[tokio::test]
    async fn spawned_player_reports_status() {
        let player = Player::spawn(Session::new(Counter, 4, paused()));
        let status = player.status().await.unwrap();
        assert_eq!(status.total, 4);
        assert_eq!(status.index, 0);
        assert!(!status.is_playing);
    }

    #[tokio::test]
    async fn manual_controls_publish_frames() {
        let player = Player::spawn(Session::new(Counter, 4, paused()));
        let mut frames = player.subscribe();

        player.step_forward().await.unwrap();
        frames.changed().await.unwrap();
        assert_eq!(*frames.borrow().step().state(), 1);

        player.seek(3).await.unwrap();
        assert_eq!(*player.frame().step().state(), 3);

        player.rewind().await.unwrap();
        assert_eq!(player.frame().status.index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn autoplay_runs_to_completion() {
        let player = Player::spawn(Session::new(Counter, 4, PlaybackConfig::default()));
        tokio::time::sleep(Duration::from_secs(10)).await;

        let status = player.status().await.unwrap();
        assert_eq!(status.index, 3);
        assert!(!status.is_playing);
    }

    #[test]
    fn dropped_driver_reports_closed() {
        let (commands, commands_rx) = mpsc::channel::<Envelope<Counter>>(1);
        let session = Session::new(Counter, 2, paused());
        let (_frames_tx, frames) = watch::channel(frame_of(&session));
        drop(commands_rx);

        let player = Player { commands, frames };
        let result = tokio_test::block_on(player.status());
        assert!(matches!(result, Err(Error::Closed)));
    }
}
