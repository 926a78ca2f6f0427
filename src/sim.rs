//! Scripted listener for demos, tests and benchmarks.
//!
//! A tone is heard when its level is at or above the listener's true
//! threshold for that ear and frequency, except for seeded random lapses
//! (missed audible tones) and false alarms (reported inaudible tones).

use std::collections::BTreeMap;
use std::sync::Mutex;

use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::TonePlayer;
use crate::core::ear::{Cell, Ear};
use crate::session::runner::Command;
use crate::session::{SessionEvent, Subscription, TestSession};

#[derive(Debug, Clone)]
pub struct SimulatedListener {
    right: f32,
    left: f32,
    overrides: BTreeMap<Cell, f32>,
    lapse_rate: f64,
    false_alarm_rate: f64,
    rng: StdRng,
}

impl SimulatedListener {
    pub fn new(right: f32, left: f32, seed: u64) -> Self {
        Self {
            right,
            left,
            overrides: BTreeMap::new(),
            lapse_rate: 0.0,
            false_alarm_rate: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Same threshold in both ears at every frequency.
    pub fn flat(threshold: f32, seed: u64) -> Self {
        Self::new(threshold, threshold, seed)
    }

    pub fn with_threshold(mut self, cell: Cell, level: f32) -> Self {
        self.overrides.insert(cell, level);
        self
    }

    pub fn with_lapse_rate(mut self, p: f64) -> Self {
        self.lapse_rate = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_false_alarm_rate(mut self, p: f64) -> Self {
        self.false_alarm_rate = p.clamp(0.0, 1.0);
        self
    }

    pub fn true_threshold(&self, cell: Cell) -> f32 {
        self.overrides.get(&cell).copied().unwrap_or(match cell.ear {
            Ear::Right => self.right,
            Ear::Left => self.left,
        })
    }

    pub fn hears(&mut self, cell: Cell, level: f32) -> bool {
        if level >= self.true_threshold(cell) {
            !(self.lapse_rate > 0.0 && self.rng.random_bool(self.lapse_rate))
        } else {
            self.false_alarm_rate > 0.0 && self.rng.random_bool(self.false_alarm_rate)
        }
    }

    /// Answer every tone of `session` over `commands` as soon as it ends.
    /// With `silent_misses`, inaudible tones get no command and the response
    /// window is left to expire.
    pub fn attach<P: TonePlayer>(
        self,
        session: &TestSession<P>,
        commands: Sender<Command>,
        silent_misses: bool,
    ) -> Subscription {
        let listener = Mutex::new(self);
        session.on(move |event| {
            let SessionEvent::ToneEnded { cell, level } = event else {
                return;
            };
            let Ok(mut listener) = listener.lock() else {
                return;
            };
            let command = if listener.hears(*cell, *level) {
                Command::Heard
            } else if silent_misses {
                return;
            } else {
                Command::NotHeard
            };
            let _ = commands.send(command);
        })
    }
}
