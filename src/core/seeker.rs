//! Per-cell threshold search (simplified Hughson-Westlake staircase).
//!
//! - Start at `start` dB HL, descending.
//! - Heard while descending: go down by `step_down`; below `min` the cell
//!   finalizes at `min`.
//! - Not heard (explicit or timeout): switch to ascending for the rest of the
//!   cell and go up by `step_up`; above `max` the cell finalizes with no
//!   threshold.
//! - Heard while ascending: two hits at the same level finalize at that level,
//!   otherwise the same level is presented again.

use serde::{Deserialize, Serialize};

/// Level space and step sizes for one staircase, in dB HL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelRules {
    pub start: f32,
    pub min: f32,
    pub max: f32,
    pub step_up: f32,
    pub step_down: f32,
}

impl Default for LevelRules {
    fn default() -> Self {
        Self {
            start: 40.0,
            min: -10.0,
            max: 90.0,
            step_up: 5.0,
            step_down: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Descending,
    Ascending,
}

/// What the session should do after one response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Present again at this level (possibly unchanged).
    Present(f32),
    /// The cell is finished. `None` means no response even at the ceiling.
    Threshold(Option<f32>),
}

/// Hits needed at one ascending level to accept it as the threshold.
pub const ASCENDING_HITS: u32 = 2;

#[derive(Debug, Clone)]
pub struct ThresholdSeeker {
    rules: LevelRules,
    level: f32,
    direction: Direction,
    last_level_heard: Option<f32>,
    hit_count_at_level: u32,
    presentations: u32,
    outcome: Option<Option<f32>>,
}

impl ThresholdSeeker {
    pub fn new(rules: LevelRules) -> Self {
        Self {
            rules,
            level: rules.start,
            direction: Direction::Descending,
            last_level_heard: None,
            hit_count_at_level: 0,
            presentations: 0,
            outcome: None,
        }
    }

    /// Level of the presentation awaiting (or receiving) a response.
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn last_level_heard(&self) -> Option<f32> {
        self.last_level_heard
    }

    pub fn hit_count_at_level(&self) -> u32 {
        self.hit_count_at_level
    }

    /// Responses consumed so far, i.e. tones presented for this cell.
    pub fn presentations(&self) -> u32 {
        self.presentations
    }

    /// `Some(level)` once the cell has finalized.
    pub fn outcome(&self) -> Option<Option<f32>> {
        self.outcome
    }

    pub fn rules(&self) -> &LevelRules {
        &self.rules
    }

    /// Feed one response for the tone presented at `level()`.
    ///
    /// Once finalized, further responses are ignored and the same
    /// `Step::Threshold` is returned.
    pub fn respond(&mut self, heard: bool) -> Step {
        if let Some(outcome) = self.outcome {
            return Step::Threshold(outcome);
        }
        self.presentations += 1;
        if heard {
            self.on_heard()
        } else {
            self.on_not_heard()
        }
    }

    fn on_heard(&mut self) -> Step {
        match self.direction {
            Direction::Ascending => {
                if self.last_level_heard == Some(self.level) {
                    self.hit_count_at_level += 1;
                } else {
                    self.last_level_heard = Some(self.level);
                    self.hit_count_at_level = 1;
                }
                if self.hit_count_at_level >= ASCENDING_HITS {
                    self.finalize(Some(self.level))
                } else {
                    Step::Present(self.level)
                }
            }
            Direction::Descending => {
                self.level -= self.rules.step_down;
                if self.level < self.rules.min {
                    // Even the quietest level is audible; do not go lower.
                    self.finalize(Some(self.rules.min))
                } else {
                    Step::Present(self.level)
                }
            }
        }
    }

    fn on_not_heard(&mut self) -> Step {
        self.direction = Direction::Ascending;
        self.last_level_heard = None;
        self.hit_count_at_level = 0;
        self.level += self.rules.step_up;
        if self.level > self.rules.max {
            self.finalize(None)
        } else {
            Step::Present(self.level)
        }
    }

    fn finalize(&mut self, threshold: Option<f32>) -> Step {
        self.outcome = Some(threshold);
        Step::Threshold(threshold)
    }
}
