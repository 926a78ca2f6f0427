//! Tone player seam. The session only knows how to ask for a tone and how to
//! learn that it has finished; how a level maps to output gain is the
//! player's business.

pub mod timed;

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};

use crate::core::ear::Ear;

/// Errors reported by a tone player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToneError {
    /// No usable output device (missing device, permission denied).
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),
    /// The player refused the request.
    #[error("tone rejected: {0}")]
    Rejected(String),
    /// Playback ended without reporting completion.
    #[error("playback interrupted")]
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneRequest {
    pub frequency: u32,
    /// dB HL, opaque to the session.
    pub level: f32,
    pub duration: Duration,
    pub channel: Ear,
}

/// Completion handle for one presentation, resolved once playback (fade-out
/// included) is over.
#[derive(Debug, Clone)]
pub struct Playback {
    done: Receiver<Result<(), ToneError>>,
}

/// Player-side half of a [`Playback`].
#[derive(Debug)]
pub struct PlaybackSender {
    tx: Sender<Result<(), ToneError>>,
}

impl PlaybackSender {
    pub fn finish(self, result: Result<(), ToneError>) {
        // The session may have stopped and dropped its handle already.
        let _ = self.tx.try_send(result);
    }
}

impl Playback {
    pub fn pending() -> (PlaybackSender, Playback) {
        let (tx, done) = bounded(1);
        (PlaybackSender { tx }, Playback { done })
    }

    /// A presentation that already completed, e.g. from a muted player.
    pub fn finished() -> Self {
        let (tx, pb) = Self::pending();
        tx.finish(Ok(()));
        pb
    }

    pub fn failed(err: ToneError) -> Self {
        let (tx, pb) = Self::pending();
        tx.finish(Err(err));
        pb
    }

    pub fn receiver(&self) -> &Receiver<Result<(), ToneError>> {
        &self.done
    }

    /// `None` while still playing.
    pub fn try_finish(&self) -> Option<Result<(), ToneError>> {
        match self.done.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ToneError::Interrupted)),
        }
    }

    /// Block until playback ends.
    pub fn wait(&self) -> Result<(), ToneError> {
        self.done.recv().unwrap_or(Err(ToneError::Interrupted))
    }
}

pub trait TonePlayer: Send {
    /// Begin playing `tone`. Errors here mean the tone never started.
    fn present(&mut self, tone: &ToneRequest) -> Result<Playback, ToneError>;

    /// Cut any tone in flight without waiting for its natural end.
    fn stop_immediately(&mut self);
}

impl<P: TonePlayer + ?Sized> TonePlayer for Box<P> {
    fn present(&mut self, tone: &ToneRequest) -> Result<Playback, ToneError> {
        (**self).present(tone)
    }

    fn stop_immediately(&mut self) {
        (**self).stop_immediately()
    }
}
