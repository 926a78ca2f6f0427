use clap::Parser;

use crate::config::{TestMode, TestSettings};
use crate::sim::SimulatedListener;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Self-administered pure-tone hearing test")]
pub struct Args {
    /// Path to config TOML (written with commented defaults if missing)
    #[arg(long, default_value = "audiometer.toml")]
    pub config: String,

    /// Test preset (overrides config)
    #[arg(long, value_enum)]
    pub mode: Option<TestMode>,

    /// Comma-separated frequencies in Hz, e.g. 1000,4000 (overrides mode)
    #[arg(long, value_delimiter = ',')]
    pub frequencies: Option<Vec<u32>>,

    /// Run unattended against a simulated listener with this threshold (dB HL) in both ears
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["simulate_right", "simulate_left"])]
    pub simulate: Option<f32>,

    /// Simulated right-ear threshold (dB HL)
    #[arg(long, allow_hyphen_values = true, requires = "simulate_left")]
    pub simulate_right: Option<f32>,

    /// Simulated left-ear threshold (dB HL)
    #[arg(long, allow_hyphen_values = true, requires = "simulate_right")]
    pub simulate_left: Option<f32>,

    /// Probability that the simulated listener misses an audible tone
    #[arg(long, default_value_t = 0.0)]
    pub lapse_rate: f64,

    /// RNG seed for the simulated listener
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Compare thresholds with typical values for this age
    #[arg(long)]
    pub age: Option<u32>,

    /// Print the result as JSON after the summary
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl Args {
    /// Apply command-line overrides on top of the config file's settings.
    pub fn apply(&self, settings: &mut TestSettings) {
        if let Some(mode) = self.mode {
            settings.mode = mode;
            // A new preset brings its own frequency list unless one is given.
            settings.frequencies = None;
        }
        if let Some(freqs) = &self.frequencies {
            settings.frequencies = Some(freqs.clone());
        }
    }

    pub fn simulated_listener(&self) -> Option<SimulatedListener> {
        let (right, left) = match (self.simulate, self.simulate_right, self.simulate_left) {
            (Some(both), _, _) => (both, both),
            (None, Some(right), Some(left)) => (right, left),
            _ => return None,
        };
        Some(SimulatedListener::new(right, left, self.seed).with_lapse_rate(self.lapse_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ear::{Cell, Ear};

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("audiometer").chain(argv.iter().copied()))
            .expect("parse args")
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert_eq!(args.config, "audiometer.toml");
        assert_eq!(args.mode, None);
        assert!(args.simulated_listener().is_none());
        assert!(!args.json);
    }

    #[test]
    fn frequencies_are_comma_separated() {
        let args = parse(&["--frequencies", "1000,4000"]);
        assert_eq!(args.frequencies, Some(vec![1000, 4000]));
    }

    #[test]
    fn mode_replaces_file_frequencies() {
        let mut settings = TestSettings {
            frequencies: Some(vec![250]),
            ..TestSettings::default()
        };
        parse(&["--mode", "quick"]).apply(&mut settings);
        assert_eq!(settings.mode, TestMode::Quick);
        assert_eq!(settings.resolve().unwrap().frequencies, vec![1000, 4000, 8000]);
    }

    #[test]
    fn per_ear_simulation() {
        let args = parse(&["--simulate-right", "-5", "--simulate-left", "35"]);
        let l = args.simulated_listener().expect("listener");
        assert_eq!(l.true_threshold(Cell::new(1000, Ear::Right)), -5.0);
        assert_eq!(l.true_threshold(Cell::new(1000, Ear::Left)), 35.0);
    }

    #[test]
    fn one_sided_simulation_is_rejected() {
        let argv = ["audiometer", "--simulate-right", "10"];
        assert!(Args::try_parse_from(argv).is_err());
    }
}
