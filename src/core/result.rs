//! Finalized thresholds and the aggregated audiogram result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ear::{Cell, Ear};

/// Outcome of one finalized cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub frequency: u32,
    pub ear: Ear,
    /// `None`: no response even at the loudness ceiling.
    pub level: Option<f32>,
    /// Tones presented before the cell finalized.
    pub presentations: u32,
}

impl Threshold {
    pub fn cell(&self) -> Cell {
        Cell::new(self.frequency, self.ear)
    }
}

/// Both ears' thresholds at one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyThresholds {
    pub frequency: u32,
    pub right_ear: Option<f32>,
    pub left_ear: Option<f32>,
}

impl FrequencyThresholds {
    pub fn ear(&self, ear: Ear) -> Option<f32> {
        match ear {
            Ear::Right => self.right_ear,
            Ear::Left => self.left_ear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub thresholds: Vec<FrequencyThresholds>,
}

impl TestResult {
    /// One record per configured frequency, in configured order, whatever
    /// order the thresholds were recorded in. Unrecorded cells read as `None`.
    pub fn from_thresholds<'a>(
        frequencies: &[u32],
        thresholds: impl IntoIterator<Item = &'a Threshold> + Clone,
        created_at: DateTime<Utc>,
    ) -> Self {
        let records = frequencies
            .iter()
            .map(|&frequency| {
                let mut rec = FrequencyThresholds {
                    frequency,
                    right_ear: None,
                    left_ear: None,
                };
                for t in thresholds.clone() {
                    if t.frequency != frequency {
                        continue;
                    }
                    match t.ear {
                        Ear::Right => rec.right_ear = t.level,
                        Ear::Left => rec.left_ear = t.level,
                    }
                }
                rec
            })
            .collect();
        Self {
            created_at,
            updated_at: Utc::now(),
            thresholds: records,
        }
    }

    pub fn at(&self, frequency: u32) -> Option<&FrequencyThresholds> {
        self.thresholds.iter().find(|t| t.frequency == frequency)
    }

    pub fn ear(&self, ear: Ear, frequency: u32) -> Option<f32> {
        self.at(frequency).and_then(|t| t.ear(ear))
    }

    pub fn frequencies(&self) -> impl Iterator<Item = u32> + '_ {
        self.thresholds.iter().map(|t| t.frequency)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(frequency: u32, ear: Ear, level: Option<f32>) -> Threshold {
        Threshold {
            frequency,
            ear,
            level,
            presentations: 4,
        }
    }

    #[test]
    fn records_follow_configured_order() {
        let recorded = [
            t(4000, Ear::Left, Some(35.0)),
            t(1000, Ear::Right, Some(10.0)),
        ];
        let result = TestResult::from_thresholds(&[1000, 2000, 4000], recorded.iter(), Utc::now());
        let freqs: Vec<u32> = result.frequencies().collect();
        assert_eq!(freqs, vec![1000, 2000, 4000]);
        assert_eq!(result.ear(Ear::Right, 1000), Some(10.0));
        assert_eq!(result.ear(Ear::Left, 1000), None);
        assert_eq!(result.ear(Ear::Left, 4000), Some(35.0));
        assert_eq!(result.at(2000).map(|r| (r.right_ear, r.left_ear)), Some((None, None)));
    }

    #[test]
    fn json_uses_snake_case_fields() {
        let recorded = [t(1000, Ear::Right, Some(20.0))];
        let result = TestResult::from_thresholds(&[1000], recorded.iter(), Utc::now());
        let json = result.to_json().expect("serialize");
        assert!(json.contains("\"right_ear\": 20.0"));
        assert!(json.contains("\"left_ear\": null"));
        let back: TestResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.thresholds, result.thresholds);
    }
}
