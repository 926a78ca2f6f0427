// Entry point: loads config, then runs one sweep either interactively
// (stdin answers) or against a simulated listener.
use std::io::{self, BufRead};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{Sender, unbounded};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use audiometer::audio::timed::TimedPlayer;
use audiometer::cli::Args;
use audiometer::config::{AppConfig, LoggingConfig, TestConfig};
use audiometer::core::grading::{FrequencyStyle, format_frequency};
use audiometer::report;
use audiometer::session::runner::{self, Command, RunOutcome};
use audiometer::session::{SessionError, SessionEvent, TestSession};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn spawn_keyboard(tx: Sender<Command>) {
    let spawned = thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let cmd = match line.trim().to_ascii_lowercase().as_str() {
                    "" | "y" | "yes" => Command::Heard,
                    "n" | "no" => Command::NotHeard,
                    "q" | "quit" => Command::Stop,
                    other => {
                        eprintln!("Unrecognized {other:?}: Enter/y = heard, n = not heard, q = quit");
                        continue;
                    }
                };
                if tx.send(cmd).is_err() || cmd == Command::Stop {
                    break;
                }
            }
        });
    if let Err(err) = spawned {
        warn!("keyboard input unavailable: {err}; use Ctrl-C to stop");
    }
}

fn run(args: &Args, app: AppConfig) -> Result<(), SessionError> {
    let mut settings = app.test.clone();
    args.apply(&mut settings);
    let mut config = settings.resolve()?;
    let listener = args.simulated_listener();
    if listener.is_some() {
        // Nobody needs to hear a simulated sweep.
        config = TestConfig {
            tone_duration_ms: 1,
            ..config
        };
    }

    let player = match listener {
        Some(_) => TimedPlayer::new().with_tail(Duration::ZERO),
        None => TimedPlayer::new(),
    };
    let mut session = TestSession::new(config, player)?;
    info!(
        "{} ({} cells)",
        settings.mode.label(),
        session.cells().len()
    );

    let (tx, rx) = unbounded();
    let ctrlc_tx = tx.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Command::Stop);
    }) {
        warn!("failed to install Ctrl-C handler: {err}");
    }

    let _subscription = match listener {
        Some(listener) => listener.attach(&session, tx, false),
        None => {
            println!("Press Enter (or y) when you hear a tone, n if you did not, q to quit.");
            spawn_keyboard(tx);
            session.on(|event| match event {
                SessionEvent::ToneStarted { cell, .. } => println!(
                    "Tone: {} in the {} ear",
                    format_frequency(cell.frequency, FrequencyStyle::Spoken),
                    cell.ear
                ),
                SessionEvent::EarComplete(ear) => println!("{ear} ear done."),
                _ => {}
            })
        }
    };

    match runner::run(&mut session, &rx)? {
        RunOutcome::Completed(result) => {
            println!("{}", report::audiogram_table(&result));
            println!("{}", report::summary(&result));
            if let Some(age) = args.age {
                println!();
                print!("{}", report::age_comparison(&result, age));
            }
            if args.json {
                match result.to_json() {
                    Ok(json) => println!("{json}"),
                    Err(err) => error!("failed to serialize result: {err}"),
                }
            }
        }
        RunOutcome::Stopped => {
            println!("Test stopped ({:.0}% complete).", session.progress());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let app = AppConfig::load_or_default(&args.config);
    init_tracing(&app.logging);

    match run(&args, app) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
