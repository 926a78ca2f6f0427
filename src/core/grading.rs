//! Downstream audiogram metrics: loss grades, pure tone average, age norms.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ear::Ear;
use super::result::TestResult;

/// Speech frequencies averaged for the PTA.
pub const PTA_FREQUENCIES: [u32; 3] = [500, 1000, 2000];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HearingLossGrade {
    Normal,
    Slight,
    Mild,
    Moderate,
    ModeratelySevere,
    Severe,
    Profound,
}

impl HearingLossGrade {
    /// Upper bounds are inclusive: 20 dB HL is still normal.
    pub fn classify(threshold_db: f32) -> Self {
        match threshold_db {
            t if t <= 20.0 => Self::Normal,
            t if t <= 25.0 => Self::Slight,
            t if t <= 40.0 => Self::Mild,
            t if t <= 55.0 => Self::Moderate,
            t if t <= 70.0 => Self::ModeratelySevere,
            t if t <= 90.0 => Self::Severe,
            _ => Self::Profound,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Slight => "Slight loss",
            Self::Mild => "Mild loss",
            Self::Moderate => "Moderate loss",
            Self::ModeratelySevere => "Moderately severe loss",
            Self::Severe => "Severe loss",
            Self::Profound => "Profound loss",
        }
    }
}

impl fmt::Display for HearingLossGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f32>() / values.len() as f32)
    }
}

fn finite_thresholds<'a>(
    result: &'a TestResult,
    ear: Ear,
    frequencies: &'a [u32],
) -> impl Iterator<Item = f32> + 'a {
    frequencies
        .iter()
        .filter_map(move |&f| result.ear(ear, f))
        .filter(|v| v.is_finite())
}

/// Mean threshold over the PTA frequencies that have a value.
pub fn pure_tone_average(result: &TestResult, ear: Ear) -> Option<f32> {
    let values: Vec<f32> = finite_thresholds(result, ear, &PTA_FREQUENCIES).collect();
    mean(&values)
}

/// Like [`pure_tone_average`], but averages every available frequency when
/// fewer than two PTA frequencies have a value.
pub fn pure_tone_average_with_fallback(result: &TestResult, ear: Ear) -> Option<f32> {
    let values: Vec<f32> = finite_thresholds(result, ear, &PTA_FREQUENCIES).collect();
    if values.len() >= 2 {
        return mean(&values);
    }
    let all: Vec<u32> = result.frequencies().collect();
    let values: Vec<f32> = finite_thresholds(result, ear, &all).collect();
    mean(&values)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarPair<T> {
    pub right: T,
    pub left: T,
}

/// PTA change from `older` to `newer` (positive = worse).
pub fn pta_change(older: &TestResult, newer: &TestResult) -> EarPair<Option<f32>> {
    let delta = |ear| {
        let old = pure_tone_average_with_fallback(older, ear)?;
        let new = pure_tone_average_with_fallback(newer, ear)?;
        Some(new - old)
    };
    EarPair {
        right: delta(Ear::Right),
        left: delta(Ear::Left),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyStyle {
    /// "4k", "500"
    #[default]
    Short,
    /// "4000"
    Full,
    /// "4 kilohertz", "500 hertz"
    Spoken,
}

pub fn format_frequency(hz: u32, style: FrequencyStyle) -> String {
    let khz = || {
        let k = hz as f32 / 1000.0;
        if hz % 1000 == 0 {
            format!("{}", hz / 1000)
        } else {
            format!("{k}")
        }
    };
    match style {
        FrequencyStyle::Full => hz.to_string(),
        FrequencyStyle::Short if hz >= 1000 => format!("{}k", khz()),
        FrequencyStyle::Short => hz.to_string(),
        FrequencyStyle::Spoken if hz >= 1000 => format!("{} kilohertz", khz()),
        FrequencyStyle::Spoken => format!("{hz} hertz"),
    }
}

/// Population percentiles of the threshold at one frequency, dB HL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedRange {
    pub p10: i32,
    pub median: i32,
    pub p90: i32,
}

/// (frequency, median coefficient, p90 coefficient, p90 offset, p10 spread)
const AGE_MODEL: [(u32, f32, f32, f32, f32); 11] = [
    (125, 0.05, 0.15, 8.0, 0.1),
    (250, 0.10, 0.20, 10.0, 0.1),
    (500, 0.15, 0.25, 10.0, 0.1),
    (750, 0.17, 0.30, 10.0, 0.13),
    (1000, 0.20, 0.35, 10.0, 0.15),
    (1500, 0.27, 0.45, 10.0, 0.18),
    (2000, 0.35, 0.55, 10.0, 0.2),
    (3000, 0.50, 0.80, 12.0, 0.3),
    (4000, 0.70, 1.10, 15.0, 0.4),
    (6000, 0.85, 1.30, 18.0, 0.45),
    (8000, 1.00, 1.50, 20.0, 0.5),
];

/// Lower bound of the 10th percentile, dB HL.
const P10_FLOOR: i32 = -5;

/// Expected thresholds for otologically normal listeners of `age` years
/// (simplified ISO 7029 model).
pub fn expected_thresholds(age: u32) -> BTreeMap<u32, ExpectedRange> {
    let offset = age.saturating_sub(20) as f32;
    AGE_MODEL
        .iter()
        .map(|&(freq, median_k, p90_k, p90_offset, spread)| {
            let median = (offset * median_k).round() as i32;
            let p90 = (offset * p90_k + p90_offset).round() as i32;
            let p10 = {
                let m = (offset * median_k).round() as i32;
                let upper = (offset * (median_k + spread) + spread * 10.0).round() as i32;
                let half_range = ((upper - m) as f32 * 0.5).round() as i32;
                (m - half_range).max(P10_FLOOR)
            };
            (freq, ExpectedRange { p10, median, p90 })
        })
        .collect()
}
