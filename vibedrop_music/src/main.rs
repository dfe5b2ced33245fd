// Vibe Drop CLI entry point.
//
// Renders a chord progression and/or melody to MIDI files. Settings come
// from an optional JSON config, then CLI flags override individual fields.
// Every requested file is rendered in memory before the first one is
// written, so a failure leaves no partial output.
//
// Usage:
//   vibedrop <chords|melody|both> [--config FILE] [--root C4] [--mode minor]
//     [--scale minor_pentatonic] [--bpm 85] [--bars 4] [--time-signature 4/4]
//     [--ppq 480] [--seed N] [--out-dir DIR]
//
// Logging goes through env_logger; set RUST_LOG=debug for per-bar detail.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use log::info;
use vibedrop_music::config::GeneratorConfig;
use vibedrop_music::render::{
    CHORD_FILE_NAME, ChordRequest, MELODY_FILE_NAME, MelodyRequest, export, render_chords,
    render_melody,
};
use vibedrop_music::Result;
use vibedrop_prng::SeededRng;

#[derive(Debug, Parser)]
#[command(name = "vibedrop", version, about = "RnB & lo-fi MIDI sketch generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON config file; flags below override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Key root as a pitch name (C4, G#3) or MIDI number (60)
    #[arg(long, global = true)]
    root: Option<String>,

    /// Chord mode: minor or major
    #[arg(long, global = true)]
    mode: Option<String>,

    /// Melody scale (defaults to the mode's pentatonic)
    #[arg(long, global = true)]
    scale: Option<String>,

    /// Tempo in beats per minute
    #[arg(long, global = true)]
    bpm: Option<u32>,

    /// Number of bars to generate
    #[arg(long, global = true)]
    bars: Option<usize>,

    /// Chord track time signature, e.g. 4/4 or 6/8
    #[arg(long, global = true)]
    time_signature: Option<String>,

    /// Ticks per quarter note (positive multiple of 12)
    #[arg(long, global = true)]
    ppq: Option<u32>,

    /// RNG seed (same seed => same MIDI)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Output directory
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Generate a chord progression (chords.mid)
    Chords,
    /// Generate a melody (melody.mid)
    Melody,
    /// Generate both, from the same seed
    Both,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("loading config from {}", path.display());
            GeneratorConfig::load(path)?
        }
        None => GeneratorConfig::default(),
    };
    apply_overrides(&mut config, &cli);

    let settings = config.resolve()?;
    let seed = settings.seed.unwrap_or_else(clock_seed);
    info!("seed {seed} (pass --seed {seed} to reproduce)");
    let mut rng = SeededRng::new(seed);

    let mut outputs: Vec<(&str, Vec<u8>)> = Vec::new();
    if matches!(cli.command, Command::Chords | Command::Both) {
        let bytes = render_chords(&ChordRequest::from_settings(&settings), &mut rng)?;
        outputs.push((CHORD_FILE_NAME, bytes));
    }
    if matches!(cli.command, Command::Melody | Command::Both) {
        let bytes = render_melody(&MelodyRequest::from_settings(&settings), &mut rng)?;
        outputs.push((MELODY_FILE_NAME, bytes));
    }

    for (name, bytes) in outputs {
        let path = export(&settings.output_dir, name, &bytes)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn apply_overrides(config: &mut GeneratorConfig, cli: &Cli) {
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(mode) = &cli.mode {
        config.mode = mode.clone();
    }
    if let Some(scale) = &cli.scale {
        config.scale = Some(scale.clone());
    }
    if let Some(bpm) = cli.bpm {
        config.bpm = bpm;
    }
    if let Some(bars) = cli.bars {
        config.bars = bars;
    }
    if let Some(ts) = &cli.time_signature {
        config.time_signature = ts.clone();
    }
    if let Some(ppq) = cli.ppq {
        config.ticks_per_quarter = ppq;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(dir) = &cli.out_dir {
        config.output_dir = dir.clone();
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
