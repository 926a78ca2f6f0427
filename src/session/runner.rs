//! Blocking driver for a [`TestSession`].
//!
//! Everything happens on the calling thread. Each iteration waits on exactly
//! one of: the tone's completion handle, or the open response window's
//! deadline; responses and stop requests arrive over a command channel.

use crossbeam_channel::{Receiver, at, select};
use tracing::{debug, info};

use super::{Phase, SessionError, TestSession, Waiting};
use crate::audio::{ToneError, TonePlayer};
use crate::core::result::TestResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Heard,
    NotHeard,
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(TestResult),
    Stopped,
}

/// Start `session` and drive it until it completes, is stopped, or the
/// player fails. A disconnected command channel counts as a stop request.
pub fn run<P: TonePlayer>(
    session: &mut TestSession<P>,
    commands: &Receiver<Command>,
) -> Result<RunOutcome, SessionError> {
    session.start()?;
    loop {
        match session.phase() {
            Phase::Complete => {
                info!("run finished: {} cells", session.cells().len());
                return Ok(RunOutcome::Completed(session.result()));
            }
            Phase::Idle => return Ok(RunOutcome::Stopped),
            Phase::Running => {}
        }

        match session.waiting().clone() {
            Waiting::Playback(playback) => select! {
                recv(playback.receiver()) -> done => {
                    session.complete_playback(done.unwrap_or(Err(ToneError::Interrupted)))?;
                }
                recv(commands) -> cmd => apply(session, cmd.ok())?,
            },
            Waiting::Response(window) => select! {
                recv(commands) -> cmd => apply(session, cmd.ok())?,
                recv(at(window.deadline)) -> _ => session.expire_response(window.id)?,
            },
            Waiting::Nothing => {
                debug!("running session has nothing pending; stopping");
                session.stop();
            }
        }
    }
}

fn apply<P: TonePlayer>(
    session: &mut TestSession<P>,
    command: Option<Command>,
) -> Result<(), SessionError> {
    match command {
        Some(Command::Heard) => session.respond_heard(),
        Some(Command::NotHeard) => session.respond_not_heard(),
        Some(Command::Stop) | None => {
            session.stop();
            Ok(())
        }
    }
}
