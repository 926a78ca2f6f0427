//! Ears, test cells, and the fixed sweep order.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ear {
    Right,
    Left,
}

impl Ear {
    /// Audiometric convention: the right ear is tested first.
    pub const ORDER: [Ear; 2] = [Ear::Right, Ear::Left];

    /// Stereo position for a player that pans a mono tone (-1 = left, +1 = right).
    pub fn pan(self) -> f32 {
        match self {
            Ear::Right => 1.0,
            Ear::Left => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Ear::Right => "right",
            Ear::Left => "left",
        }
    }
}

impl fmt::Display for Ear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (frequency, ear) unit of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub frequency: u32,
    pub ear: Ear,
}

impl Cell {
    pub fn new(frequency: u32, ear: Ear) -> Self {
        Self { frequency, ear }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz/{}", self.frequency, self.ear)
    }
}

/// Cells in presentation order: every frequency for the right ear, then every
/// frequency for the left ear, each in configured order.
pub fn sweep_order(frequencies: &[u32]) -> Vec<Cell> {
    Ear::ORDER
        .iter()
        .flat_map(|&ear| frequencies.iter().map(move |&f| Cell::new(f, ear)))
        .collect()
}
