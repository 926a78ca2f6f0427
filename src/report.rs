//! Plain-text rendering of a finished test.

use std::fmt::Write;

use crate::core::ear::Ear;
use crate::core::grading::{
    FrequencyStyle, HearingLossGrade, expected_thresholds, format_frequency,
    pure_tone_average_with_fallback,
};
use crate::core::result::TestResult;

pub const DISCLAIMER: &str = "This is a self-administered screening, not a clinical diagnosis. \
Consult an audiologist if you have concerns about your hearing.";

const MISSING: &str = "—";

fn level(value: Option<f32>) -> String {
    match value {
        Some(db) => format!("{db:.0}"),
        None => MISSING.to_string(),
    }
}

/// Per-ear pure-tone average with its grade, followed by the disclaimer.
pub fn summary(result: &TestResult) -> String {
    let mut out = String::new();
    for ear in Ear::ORDER {
        let _ = match pure_tone_average_with_fallback(result, ear) {
            Some(pta) => writeln!(
                out,
                "{:<5} ear: {pta:.1} dB HL ({})",
                capitalized(ear),
                HearingLossGrade::classify(pta)
            ),
            None => writeln!(out, "{:<5} ear: no measurable threshold", capitalized(ear)),
        };
    }
    let _ = writeln!(out);
    out.push_str(DISCLAIMER);
    out
}

/// One row per frequency: label, right and left thresholds in dB HL.
pub fn audiogram_table(result: &TestResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>6} {:>6} {:>6}", "Hz", "Right", "Left");
    for row in &result.thresholds {
        let _ = writeln!(
            out,
            "{:>6} {:>6} {:>6}",
            format_frequency(row.frequency, FrequencyStyle::Short),
            level(row.right_ear),
            level(row.left_ear)
        );
    }
    out
}

/// Rows where a measured threshold lies above the 90th percentile for `age`.
pub fn age_comparison(result: &TestResult, age: u32) -> String {
    let expected = expected_thresholds(age);
    let mut out = String::new();
    for row in &result.thresholds {
        let Some(range) = expected.get(&row.frequency) else {
            continue;
        };
        for ear in Ear::ORDER {
            if let Some(db) = row.ear(ear) {
                if db > range.p90 as f32 {
                    let _ = writeln!(
                        out,
                        "{} {} ear: {db:.0} dB HL (typical at {age}: {} to {} dB HL)",
                        format_frequency(row.frequency, FrequencyStyle::Full),
                        ear,
                        range.p10,
                        range.p90
                    );
                }
            }
        }
    }
    if out.is_empty() {
        let _ = writeln!(out, "All thresholds are within the typical range for age {age}.");
    }
    out
}

fn capitalized(ear: Ear) -> &'static str {
    match ear {
        Ear::Right => "Right",
        Ear::Left => "Left",
    }
}
