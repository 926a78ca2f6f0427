//! Sweep controller: drives one staircase per (frequency, ear) cell, times
//! tone presentation and response windows, and aggregates the thresholds.
//!
//! All state lives on one control path. The session never blocks: it asks the
//! player for a tone and records what it is waiting for ([`Waiting`]); a
//! driver (see [`runner`]) or a manual loop calling [`TestSession::poll`]
//! feeds completions, responses and window expiries back in.

pub mod events;
pub mod runner;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::{Playback, ToneError, TonePlayer, ToneRequest};
use crate::config::{ConfigError, TestConfig};
use crate::core::ear::{Cell, Ear, sweep_order};
use crate::core::result::{TestResult, Threshold};
use crate::core::seeker::{Step, ThresholdSeeker};

pub use events::{EventBus, EventListener, ResponseSource, SessionEvent, Subscription};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("tone presentation failed: {0}")]
    Tone(#[from] ToneError),
    #[error("invalid test configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    Complete,
}

/// Read-only snapshot of the observable session fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionState {
    pub current_frequency: u32,
    pub current_ear: Ear,
    pub current_level: f32,
    /// A tone is playing.
    pub is_presenting: bool,
    /// The tone has ended and a response (or its timeout) is expected.
    pub awaiting_response: bool,
    pub phase: Phase,
}

/// Token of one response window. Expiry only applies to the window it was
/// armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseWindow {
    pub id: WindowId,
    pub deadline: Instant,
}

/// The single outstanding suspension point of a running session.
#[derive(Debug, Clone)]
pub enum Waiting {
    Nothing,
    Playback(Playback),
    Response(ResponseWindow),
}

pub struct TestSession<P: TonePlayer> {
    config: TestConfig,
    cells: Vec<Cell>,
    cursor: usize,
    seeker: ThresholdSeeker,
    phase: Phase,
    presenting: bool,
    waiting: Waiting,
    next_window: u64,
    recorded: BTreeMap<Cell, Threshold>,
    created_at: DateTime<Utc>,
    player: P,
    events: EventBus,
}

impl<P: TonePlayer> TestSession<P> {
    pub fn new(config: TestConfig, player: P) -> Result<Self, ConfigError> {
        config.validate()?;
        let cells = sweep_order(&config.frequencies);
        let seeker = ThresholdSeeker::new(config.level_rules());
        Ok(Self {
            config,
            cells,
            cursor: 0,
            seeker,
            phase: Phase::Idle,
            presenting: false,
            waiting: Waiting::Nothing,
            next_window: 0,
            recorded: BTreeMap::new(),
            created_at: Utc::now(),
            player,
            events: EventBus::new(),
        })
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Every cell in presentation order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn current_cell(&self) -> Cell {
        self.cells[self.cursor]
    }

    pub fn seeker(&self) -> &ThresholdSeeker {
        &self.seeker
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn state(&self) -> SessionState {
        let cell = self.current_cell();
        SessionState {
            current_frequency: cell.frequency,
            current_ear: cell.ear,
            current_level: self.seeker.level(),
            is_presenting: self.presenting,
            awaiting_response: self.response_window().is_some(),
            phase: self.phase,
        }
    }

    pub fn waiting(&self) -> &Waiting {
        &self.waiting
    }

    pub fn response_window(&self) -> Option<ResponseWindow> {
        match self.waiting {
            Waiting::Response(window) => Some(window),
            _ => None,
        }
    }

    pub fn thresholds(&self) -> impl Iterator<Item = &Threshold> {
        self.recorded.values()
    }

    /// Share of cells with a recorded threshold (including "no response"),
    /// in percent.
    pub fn progress(&self) -> f32 {
        self.recorded.len() as f32 / self.cells.len() as f32 * 100.0
    }

    /// Aggregate of everything recorded so far; usable mid-sweep.
    pub fn result(&self) -> TestResult {
        TestResult::from_thresholds(&self.config.frequencies, self.recorded.values(), self.created_at)
    }

    pub fn on<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(Arc::new(listener))
    }

    /// Begin a sweep at the first cell. Ignored while already running.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase == Phase::Running {
            debug!("start ignored: session already running");
            return Ok(());
        }
        self.cursor = 0;
        self.recorded.clear();
        self.seeker = ThresholdSeeker::new(self.config.level_rules());
        self.waiting = Waiting::Nothing;
        self.presenting = false;
        self.created_at = Utc::now();
        self.phase = Phase::Running;
        info!(
            "hearing test started: {} cells, frequencies {:?}",
            self.cells.len(),
            self.config.frequencies
        );
        self.emit_state();
        self.present()
    }

    /// Cancel the pending wait and silence the player. Safe in any phase.
    /// A completed session deliberately keeps its `Complete` phase and result.
    pub fn stop(&mut self) {
        let active = self.phase == Phase::Running
            || self.presenting
            || !matches!(self.waiting, Waiting::Nothing);
        if !active {
            return;
        }
        self.player.stop_immediately();
        self.waiting = Waiting::Nothing;
        self.presenting = false;
        if self.phase == Phase::Running {
            self.phase = Phase::Idle;
        }
        info!("hearing test stopped at {}", self.current_cell());
        self.emit_state();
    }

    pub fn respond_heard(&mut self) -> Result<(), SessionError> {
        self.accept(true, ResponseSource::Explicit)
    }

    pub fn respond_not_heard(&mut self) -> Result<(), SessionError> {
        self.accept(false, ResponseSource::Explicit)
    }

    /// Implicit "not heard" for `window`, if that window is still open.
    pub fn expire_response(&mut self, window: WindowId) -> Result<(), SessionError> {
        match self.waiting {
            Waiting::Response(open) if open.id == window => {
                debug!("response timeout at {}: treating as not heard", self.current_cell());
                self.accept(false, ResponseSource::Timeout)
            }
            _ => Ok(()),
        }
    }

    /// Report the end of the playback the session is waiting on.
    pub fn complete_playback(&mut self, result: Result<(), ToneError>) -> Result<(), SessionError> {
        if !matches!(self.waiting, Waiting::Playback(_)) {
            return Ok(());
        }
        self.playback_done(result)
    }

    /// Non-blocking drive step: picks up a finished playback and expires an
    /// overdue response window.
    pub fn poll(&mut self, now: Instant) -> Result<(), SessionError> {
        match self.waiting.clone() {
            Waiting::Playback(playback) => match playback.try_finish() {
                Some(result) => self.playback_done(result),
                None => Ok(()),
            },
            Waiting::Response(window) if now >= window.deadline => self.expire_response(window.id),
            _ => Ok(()),
        }
    }

    fn accept(&mut self, heard: bool, source: ResponseSource) -> Result<(), SessionError> {
        if self.phase != Phase::Running || self.response_window().is_none() {
            debug!(
                "response ignored (heard={heard}, phase={:?}, awaiting={})",
                self.phase,
                self.response_window().is_some()
            );
            return Ok(());
        }
        // Closing the window first makes any later expiry or duplicate a no-op.
        self.waiting = Waiting::Nothing;

        let cell = self.current_cell();
        let level = self.seeker.level();
        debug!(
            "{cell}: {} at {level:.1} dB HL ({:?}, {:?})",
            if heard { "heard" } else { "not heard" },
            self.seeker.direction(),
            source
        );
        self.events.publish(&SessionEvent::Response {
            cell,
            level,
            heard,
            source,
        });

        match self.seeker.respond(heard) {
            Step::Present(_) => self.present(),
            Step::Threshold(threshold) => self.record(threshold),
        }
    }

    fn present(&mut self) -> Result<(), SessionError> {
        let cell = self.current_cell();
        let level = self.seeker.level();
        self.presenting = true;
        self.emit_state();
        self.events.publish(&SessionEvent::ToneStarted { cell, level });

        let request = ToneRequest {
            frequency: cell.frequency,
            level,
            duration: self.config.tone_duration(),
            channel: cell.ear,
        };
        match self.player.present(&request) {
            Ok(playback) => match playback.try_finish() {
                Some(result) => self.playback_done(result),
                None => {
                    self.waiting = Waiting::Playback(playback);
                    Ok(())
                }
            },
            Err(err) => self.abort(err),
        }
    }

    fn playback_done(&mut self, result: Result<(), ToneError>) -> Result<(), SessionError> {
        self.waiting = Waiting::Nothing;
        if let Err(err) = result {
            return self.abort(err);
        }
        let cell = self.current_cell();
        let level = self.seeker.level();
        self.presenting = false;
        self.events.publish(&SessionEvent::ToneEnded { cell, level });

        let id = WindowId(self.next_window);
        self.next_window += 1;
        self.waiting = Waiting::Response(ResponseWindow {
            id,
            deadline: Instant::now() + self.config.response_timeout(),
        });
        self.emit_state();
        Ok(())
    }

    fn record(&mut self, level: Option<f32>) -> Result<(), SessionError> {
        let cell = self.current_cell();
        let threshold = Threshold {
            frequency: cell.frequency,
            ear: cell.ear,
            level,
            presentations: self.seeker.presentations(),
        };
        self.recorded.insert(cell, threshold);
        match level {
            Some(db) => info!("threshold {cell}: {db:.1} dB HL"),
            None => info!("threshold {cell}: no response at {:.1} dB HL", self.config.max_level),
        }

        let next = self.cells.get(self.cursor + 1).copied();
        if next.is_none() {
            self.phase = Phase::Complete;
            self.presenting = false;
        }
        self.events.publish(&SessionEvent::ThresholdFound(threshold));

        match next {
            Some(next) => {
                self.cursor += 1;
                self.seeker = ThresholdSeeker::new(self.config.level_rules());
                if next.ear == cell.ear {
                    self.events.publish(&SessionEvent::FrequencyComplete(cell));
                } else {
                    self.events.publish(&SessionEvent::EarComplete(cell.ear));
                }
                self.emit_state();
                self.present()
            }
            None => {
                info!("hearing test complete");
                self.events.publish(&SessionEvent::EarComplete(cell.ear));
                self.emit_state();
                self.events.publish(&SessionEvent::Completed(self.result()));
                Ok(())
            }
        }
    }

    fn abort(&mut self, err: ToneError) -> Result<(), SessionError> {
        warn!("{}: {err}; stopping session", self.current_cell());
        self.player.stop_immediately();
        self.waiting = Waiting::Nothing;
        self.presenting = false;
        self.phase = Phase::Idle;
        self.events.publish(&SessionEvent::PresentationFailed(err.clone()));
        self.emit_state();
        Err(SessionError::Tone(err))
    }

    fn emit_state(&self) {
        self.events.publish(&SessionEvent::StateChange(self.state()));
    }
}

impl<P: TonePlayer> std::fmt::Debug for TestSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSession")
            .field("state", &self.state())
            .field("progress", &self.progress())
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PlaybackSender;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records requests; completes tones at once unless `hold` is set, in
    /// which case the senders are parked for the test to resolve.
    #[derive(Default)]
    struct MockPlayer {
        requests: Arc<Mutex<Vec<ToneRequest>>>,
        stops: Arc<AtomicUsize>,
        hold: bool,
        held: Vec<PlaybackSender>,
        fail_at: Option<usize>,
    }

    impl TonePlayer for MockPlayer {
        fn present(&mut self, tone: &ToneRequest) -> Result<Playback, ToneError> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(*tone);
            if self.fail_at == Some(requests.len()) {
                return Err(ToneError::DeviceUnavailable("unplugged".into()));
            }
            if self.hold {
                let (tx, pb) = Playback::pending();
                self.held.push(tx);
                Ok(pb)
            } else {
                Ok(Playback::finished())
            }
        }

        fn stop_immediately(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config(frequencies: &[u32]) -> TestConfig {
        TestConfig::standard().with_frequencies(frequencies.to_vec())
    }

    fn session(frequencies: &[u32]) -> TestSession<MockPlayer> {
        TestSession::new(config(frequencies), MockPlayer::default()).expect("valid config")
    }

    fn levels(s: &TestSession<MockPlayer>) -> Vec<f32> {
        s.player().requests.lock().unwrap().iter().map(|r| r.level).collect()
    }

    fn collect(s: &TestSession<MockPlayer>) -> Arc<Mutex<Vec<SessionEvent>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        s.on(move |ev| sink.lock().unwrap().push(ev.clone()));
        log
    }

    #[test]
    fn initial_state_is_idle_at_first_cell() {
        let s = session(&[250, 500]);
        let st = s.state();
        assert_eq!(st.phase, Phase::Idle);
        assert_eq!(st.current_ear, Ear::Right);
        assert_eq!(st.current_frequency, 250);
        assert_eq!(st.current_level, 40.0);
        assert!(!st.is_presenting);
        assert!(!st.awaiting_response);
        assert_eq!(s.progress(), 0.0);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let err = TestSession::new(config(&[]), MockPlayer::default()).unwrap_err();
        assert_eq!(err, ConfigError::EmptyFrequencies);
    }

    #[test]
    fn start_presents_first_tone_and_awaits_response() {
        let mut s = session(&[1000]);
        s.start().unwrap();
        let st = s.state();
        assert_eq!(st.phase, Phase::Running);
        assert!(!st.is_presenting);
        assert!(st.awaiting_response);
        let requests = s.player().requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].channel, Ear::Right);
        assert_eq!(requests[0].frequency, 1000);
        assert_eq!(requests[0].duration, s.config().tone_duration());
    }

    #[test]
    fn start_while_running_is_ignored() {
        let mut s = session(&[1000]);
        s.start().unwrap();
        s.respond_not_heard().unwrap();
        s.start().unwrap();
        assert_eq!(levels(&s), vec![40.0, 45.0]);
        assert_eq!(s.state().current_level, 45.0);
    }

    #[test]
    fn responses_before_start_are_ignored() {
        let mut s = session(&[1000]);
        s.respond_heard().unwrap();
        s.respond_not_heard().unwrap();
        assert_eq!(s.state().current_level, 40.0);
        assert!(levels(&s).is_empty());
    }

    #[test]
    fn concrete_scenario_moves_to_left_ear() {
        let mut s = session(&[1000]);
        s.start().unwrap();
        s.respond_not_heard().unwrap();
        s.respond_not_heard().unwrap();
        s.respond_heard().unwrap();
        s.respond_heard().unwrap();

        assert_eq!(levels(&s), vec![40.0, 45.0, 50.0, 50.0, 40.0]);
        let st = s.state();
        assert_eq!(st.current_ear, Ear::Left);
        assert_eq!(st.current_frequency, 1000);
        assert_eq!(st.current_level, 40.0);
        assert_eq!(s.result().ear(Ear::Right, 1000), Some(50.0));
        assert_eq!(s.progress(), 50.0);
    }

    #[test]
    fn duplicate_response_during_next_tone_is_ignored() {
        let mut s = TestSession::new(
            config(&[1000]),
            MockPlayer {
                hold: true,
                ..MockPlayer::default()
            },
        )
        .unwrap();
        s.start().unwrap();
        assert!(s.state().is_presenting);
        s.respond_heard().unwrap();
        assert_eq!(levels(&s), vec![40.0]);

        s.complete_playback(Ok(())).unwrap();
        s.respond_heard().unwrap();
        s.respond_heard().unwrap();
        assert_eq!(levels(&s), vec![40.0, 30.0]);
        assert_eq!(s.state().current_level, 30.0);
        assert!(s.state().is_presenting);
    }

    #[test]
    fn poll_picks_up_finished_playback() {
        let mut s = TestSession::new(
            config(&[1000]),
            MockPlayer {
                hold: true,
                ..MockPlayer::default()
            },
        )
        .unwrap();
        s.start().unwrap();
        s.poll(Instant::now()).unwrap();
        assert!(s.state().is_presenting);

        let tx = s.player.held.pop().unwrap();
        tx.finish(Ok(()));
        s.poll(Instant::now()).unwrap();
        assert!(s.state().awaiting_response);
    }

    #[test]
    fn timeout_matches_explicit_not_heard() {
        let mut explicit = session(&[1000, 2000]);
        let mut timed = session(&[1000, 2000]);
        explicit.start().unwrap();
        timed.start().unwrap();

        explicit.respond_not_heard().unwrap();
        let window = timed.response_window().unwrap();
        timed.expire_response(window.id).unwrap();

        let (a, b) = (explicit.state(), timed.state());
        assert_eq!(a.current_level, b.current_level);
        assert_eq!(a.current_ear, b.current_ear);
        assert_eq!(a.awaiting_response, b.awaiting_response);
        assert_eq!(levels(&explicit), levels(&timed));
        assert_eq!(explicit.seeker().direction(), timed.seeker().direction());
    }

    #[test]
    fn stale_window_cannot_expire_after_response() {
        let mut s = session(&[1000]);
        s.start().unwrap();
        let stale = s.response_window().unwrap().id;
        s.respond_heard().unwrap();
        s.expire_response(stale).unwrap();
        assert_eq!(levels(&s), vec![40.0, 30.0]);
        assert_eq!(s.seeker().direction(), crate::core::seeker::Direction::Descending);
    }

    #[test]
    fn poll_expires_overdue_window() {
        let mut s = session(&[1000]);
        s.start().unwrap();
        let deadline = s.response_window().unwrap().deadline;
        s.poll(deadline - std::time::Duration::from_millis(1)).unwrap();
        assert_eq!(levels(&s), vec![40.0]);
        s.poll(deadline).unwrap();
        assert_eq!(levels(&s), vec![40.0, 45.0]);
    }

    #[test]
    fn stop_cancels_window_and_is_idempotent() {
        let mut s = session(&[1000]);
        let log = collect(&s);
        s.start().unwrap();
        let window = s.response_window().unwrap().id;
        s.stop();
        assert_eq!(s.state().phase, Phase::Idle);
        assert!(!s.state().awaiting_response);
        assert_eq!(s.player().stops.load(Ordering::SeqCst), 1);

        let events_after_stop = log.lock().unwrap().len();
        s.stop();
        s.expire_response(window).unwrap();
        s.respond_heard().unwrap();
        assert_eq!(log.lock().unwrap().len(), events_after_stop);
        assert_eq!(s.player().stops.load(Ordering::SeqCst), 1);
        assert_eq!(levels(&s), vec![40.0]);
    }

    #[test]
    fn step_that_cannot_move_the_level_is_rejected() {
        let cfg = TestConfig {
            step_up: 1e-6,
            ..config(&[1000])
        };
        let err = TestSession::new(cfg, MockPlayer::default()).unwrap_err();
        assert_eq!(err, ConfigError::StepTooSmall("step_up"));
    }

    #[test]
    fn stop_during_playback_cuts_tone_and_ignores_late_completion() {
        let mut s = TestSession::new(
            config(&[1000]),
            MockPlayer {
                hold: true,
                ..MockPlayer::default()
            },
        )
        .unwrap();
        let log = collect(&s);
        s.start().unwrap();
        assert!(matches!(s.waiting(), Waiting::Playback(_)));

        s.stop();
        let st = s.state();
        assert_eq!(s.player().stops.load(Ordering::SeqCst), 1);
        assert_eq!(st.phase, Phase::Idle);
        assert!(!st.is_presenting);
        assert!(!st.awaiting_response);
        let events_after_stop = log.lock().unwrap().len();

        let tx = s.player.held.pop().unwrap();
        tx.finish(Ok(()));
        s.complete_playback(Ok(())).unwrap();
        s.poll(Instant::now()).unwrap();

        assert!(s.response_window().is_none());
        assert!(matches!(s.waiting(), Waiting::Nothing));
        assert_eq!(levels(&s), vec![40.0]);
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(log.lock().unwrap().len(), events_after_stop);
    }

    #[test]
    fn player_failure_leaves_session_idle() {
        let mut s = TestSession::new(
            config(&[1000]),
            MockPlayer {
                fail_at: Some(2),
                ..MockPlayer::default()
            },
        )
        .unwrap();
        let log = collect(&s);
        s.start().unwrap();
        let err = s.respond_heard().unwrap_err();
        assert!(matches!(err, SessionError::Tone(ToneError::DeviceUnavailable(_))));
        let st = s.state();
        assert_eq!(st.phase, Phase::Idle);
        assert!(!st.is_presenting);
        assert!(!st.awaiting_response);
        assert!(
            log.lock()
                .unwrap()
                .iter()
                .any(|e| matches!(e, SessionEvent::PresentationFailed(_)))
        );

        // The caller may restart once the device is back.
        s.start().unwrap();
        assert_eq!(s.state().phase, Phase::Running);
        assert_eq!(s.progress(), 0.0);
    }

    #[test]
    fn start_failure_is_reported() {
        let mut s = TestSession::new(
            config(&[1000]),
            MockPlayer {
                fail_at: Some(1),
                ..MockPlayer::default()
            },
        )
        .unwrap();
        assert!(s.start().is_err());
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn no_response_at_ceiling_counts_as_done() {
        let cfg = TestConfig {
            max_level: 45.0,
            ..config(&[1000, 2000])
        };
        let mut s = TestSession::new(cfg, MockPlayer::default()).unwrap();
        s.start().unwrap();
        s.respond_not_heard().unwrap();
        s.respond_not_heard().unwrap();
        assert_eq!(s.progress(), 25.0);
        let recorded: Vec<_> = s.thresholds().copied().collect();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].level, None);
        assert_eq!(s.state().current_frequency, 2000);
        assert_eq!(s.state().current_ear, Ear::Right);
    }

    #[test]
    fn completion_emits_result_once() {
        let cfg = TestConfig {
            max_level: 40.0,
            ..config(&[1000])
        };
        let mut s = TestSession::new(cfg, MockPlayer::default()).unwrap();
        let log = collect(&s);
        s.start().unwrap();
        s.respond_not_heard().unwrap();
        s.respond_not_heard().unwrap();

        assert_eq!(s.phase(), Phase::Complete);
        assert_eq!(s.progress(), 100.0);
        let events = log.lock().unwrap();
        let completed: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Completed(r) => Some(r.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].thresholds.len(), 1);
        assert_eq!(completed[0].thresholds[0].right_ear, None);
        assert!(events.iter().any(|e| matches!(e, SessionEvent::EarComplete(Ear::Right))));

        drop(events);
        s.respond_heard().unwrap();
        s.stop();
        assert_eq!(s.phase(), Phase::Complete);
    }

    #[test]
    fn unsubscribed_listener_gets_nothing() {
        let mut s = session(&[1000]);
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let sub = s.on(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let other = collect(&s);
        sub.unsubscribe();
        s.start().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!other.lock().unwrap().is_empty());
    }

    #[test]
    fn presentation_events_bracket_each_tone() {
        let mut s = session(&[1000]);
        let log = collect(&s);
        s.start().unwrap();
        let names: Vec<&str> = log.lock().unwrap().iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec!["state_change", "state_change", "tone_start", "tone_end", "state_change"]
        );
    }
}
