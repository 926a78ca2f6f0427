//! Silent player that only keeps time: each tone "plays" for its duration
//! plus a release tail, on a short-lived timer thread.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Sender, after, bounded, select};
use tracing::debug;

use super::{Playback, ToneError, TonePlayer, ToneRequest};

/// Release tail appended after each tone, matching a short fade-out.
pub const DEFAULT_TAIL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct TimedPlayer {
    tail: Duration,
    cancel: Option<Sender<()>>,
}

impl TimedPlayer {
    pub fn new() -> Self {
        Self {
            tail: DEFAULT_TAIL,
            cancel: None,
        }
    }

    pub fn with_tail(mut self, tail: Duration) -> Self {
        self.tail = tail;
        self
    }
}

impl Default for TimedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl TonePlayer for TimedPlayer {
    fn present(&mut self, tone: &ToneRequest) -> Result<Playback, ToneError> {
        // One tone at a time: a new request cuts the previous one.
        self.stop_immediately();

        let (done, playback) = Playback::pending();
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let total = tone.duration + self.tail;
        debug!(
            "tone {} Hz at {:.1} dB HL to {} ear for {:?}",
            tone.frequency, tone.level, tone.channel, total
        );
        thread::Builder::new()
            .name("tone-timer".into())
            .spawn(move || {
                select! {
                    recv(cancel_rx) -> _ => done.finish(Err(ToneError::Interrupted)),
                    recv(after(total)) -> _ => done.finish(Ok(())),
                }
            })
            .map_err(|err| ToneError::DeviceUnavailable(err.to_string()))?;
        self.cancel = Some(cancel_tx);
        Ok(playback)
    }

    fn stop_immediately(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.try_send(());
        }
    }
}
