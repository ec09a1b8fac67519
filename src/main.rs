//! Morse Drill - adaptive Morse code character trainer
//!
//! Plays one character at a time as a flashing lamp (and a tone when built
//! with the `audio` feature) and judges the key the learner presses.

#[cfg(feature = "audio")]
mod audio;
mod config;
mod cw;
mod display;
mod error;
mod input;
mod playback;
mod trainer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use config::Settings;
use cw::ALPHABET_SIZE;
use display::{SharedSurface, Silent, Sounder, TerminalSurface};
use input::KeyReader;
use playback::PlaybackChannel;
use trainer::{RoundMachine, Scheduler, SessionEnd, SessionStats};

#[derive(Parser, Debug)]
#[command(name = "morse-drill", version)]
#[command(about = "Adaptive Morse code character trainer")]
struct Args {
    /// Keying speed in words per minute
    #[arg(short, long)]
    wpm: Option<f32>,

    /// Tone frequency in Hz
    #[arg(short, long)]
    frequency: Option<f32>,

    /// Tone volume (0.0 - 1.0)
    #[arg(long)]
    volume: Option<f32>,

    /// Flash only, no tone
    #[arg(short, long)]
    mute: bool,

    /// Audio output device name (see --list-devices)
    #[arg(short, long)]
    device: Option<String>,

    /// Seed for the symbol order
    #[arg(short, long)]
    seed: Option<u64>,

    /// Seconds allowed for an answer before it counts as too slow
    #[arg(short, long)]
    time_to_guess: Option<f32>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Store the resulting settings as the new defaults
    #[arg(long)]
    save: bool,

    /// List audio output devices and exit
    #[arg(long)]
    list_devices: bool,
}

impl Args {
    /// Command line values override the settings file
    fn apply(&self, settings: &mut Settings) {
        if let Some(wpm) = self.wpm {
            settings.wpm = wpm;
        }
        if let Some(frequency) = self.frequency {
            settings.tone_frequency = frequency;
        }
        if let Some(volume) = self.volume {
            settings.tone_volume = volume;
        }
        if self.mute {
            settings.mute = true;
        }
        if let Some(device) = &self.device {
            settings.output_device = Some(device.clone());
        }
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        if let Some(secs) = self.time_to_guess {
            settings.time_to_guess_secs = secs;
        }
    }
}

/// Leaves raw mode and the alternate screen however the session ends
struct TerminalGuard {
    surface: Arc<Mutex<TerminalSurface>>,
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = self.surface.lock().shutdown() {
            tracing::warn!("failed to restore screen: {}", e);
        }
        if let Err(e) = input::disable_raw_mode() {
            tracing::warn!("failed to leave raw mode: {}", e);
        }
    }
}

/// Runs `restore` when `result` failed, keeping the original error
fn restore_on_error<T>(
    result: std::io::Result<T>,
    restore: impl FnOnce() -> std::io::Result<()>,
) -> std::io::Result<T> {
    if result.is_err() {
        if let Err(e) = restore() {
            tracing::warn!("failed to leave raw mode: {}", e);
        }
    }
    result
}

fn init_logging(log_file: Option<&Path>) -> error::Result<()> {
    // The terminal belongs to the trainer; without a log file nothing is logged
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[cfg(feature = "audio")]
fn build_sounder(settings: &Settings) -> Arc<dyn Sounder> {
    if settings.mute {
        return Arc::new(Silent);
    }

    match audio::ToneEngineHandle::new(
        settings.tone_frequency,
        settings.tone_volume,
        settings.output_device.clone(),
    ) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            tracing::warn!(target: "audio", "no tone, flashing only: {}", e);
            eprintln!("⚠ {} (continuing without sound)", e);
            Arc::new(Silent)
        }
    }
}

#[cfg(not(feature = "audio"))]
fn build_sounder(settings: &Settings) -> Arc<dyn Sounder> {
    if !settings.mute {
        tracing::info!(target: "audio", "built without the audio feature, flashing only");
    }
    Arc::new(Silent)
}

fn list_devices() {
    #[cfg(feature = "audio")]
    {
        let devices = audio::ToneEngineHandle::list_output_devices();
        if devices.is_empty() {
            println!("No audio output devices found");
        }
        for name in devices {
            println!("{}", name);
        }
    }

    #[cfg(not(feature = "audio"))]
    println!("Built without audio support; rebuild with --features audio");
}

fn run_session(settings: &Settings) -> error::Result<(SessionEnd, SessionStats, usize)> {
    let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let scheduler = Scheduler::new(rng);
    let sounder = build_sounder(settings);

    input::enable_raw_mode()?;
    let surface = restore_on_error(TerminalSurface::new(), input::disable_raw_mode)?;
    let surface = Arc::new(Mutex::new(surface));
    let _guard = TerminalGuard {
        surface: Arc::clone(&surface),
    };
    let shared: SharedSurface = surface;

    let (channel, finished_rx) =
        PlaybackChannel::spawn(shared, sounder, settings.playback_timing());
    let (input_tx, input_rx) = crossbeam_channel::unbounded();
    let mut reader = KeyReader::spawn(input_tx);

    let mut machine = RoundMachine::new(scheduler, channel, settings.round_timing());
    let end = machine.run(&input_rx, &finished_rx);
    let stats = machine.stats();
    let learned = machine.scheduler().learned().len();

    reader.stop();
    drop(finished_rx);
    machine.into_playback().shutdown();

    Ok((end, stats, learned))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    if args.list_devices {
        list_devices();
        return Ok(());
    }

    let mut settings = Settings::load();
    args.apply(&mut settings);
    if args.save {
        let path = settings.save()?;
        println!("Settings saved to {}", path.display());
    }
    tracing::info!("starting with {:?}", settings);

    let (end, stats, learned) = run_session(&settings)?;

    match end {
        SessionEnd::Completed => println!("🎉 All {} characters learned!", ALPHABET_SIZE),
        SessionEnd::Quit => println!("Session ended."),
    }
    println!(
        "📊 {} rounds | {} correct | {} too slow | {} wrong | {} paused | {}/{} learned",
        stats.rounds,
        stats.correct,
        stats.too_slow,
        stats.wrong,
        stats.forced_misses,
        learned,
        ALPHABET_SIZE
    );

    Ok(())
}
