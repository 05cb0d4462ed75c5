use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tile_merge::autoplay::{self, PlayReport};
use tile_merge::chain::ChainRules;
use tile_merge::persistence::{best_score_key, record_best, MemoryStore, MAX_TILE_KEY};
use tile_merge::slide::SlideConfig;
use tile_merge::trace::{self, Ruleset};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "autoplay", version, about = "Play seeded slide and chain games unattended and record traces")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Variant {
    Slide,
    ChainClassic,
    ChainEscalating,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a batch of games in parallel
    Play {
        #[arg(value_enum, default_value_t = Variant::Slide)]
        variant: Variant,
        /// Number of games; game i uses seed + i
        #[arg(short = 'n', long, default_value_t = 16)]
        games: u64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Accepted inputs per game before giving up
        #[arg(long, default_value_t = 10_000)]
        max_steps: u32,
        /// JSON rules file overriding the variant preset; missing fields keep their defaults
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,
        /// Directory to write one trace per game into
        #[arg(short = 'o', long = "out", value_name = "DIR")]
        out: Option<PathBuf>,
        /// Show a progress bar
        #[arg(long)]
        progress: bool,
    },
    /// Replay a trace file and check it reproduces
    Replay {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn load_ruleset(variant: Variant, rules: Option<&PathBuf>) -> anyhow::Result<Ruleset> {
    let Some(path) = rules else {
        return Ok(match variant {
            Variant::Slide => Ruleset::Slide(SlideConfig::default()),
            Variant::ChainClassic => Ruleset::Chain(ChainRules::classic()),
            Variant::ChainEscalating => Ruleset::Chain(ChainRules::escalating()),
        });
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let ruleset = match variant {
        Variant::Slide => Ruleset::Slide(serde_json::from_str(&text)?),
        Variant::ChainClassic | Variant::ChainEscalating => Ruleset::Chain(serde_json::from_str(&text)?),
    };
    Ok(ruleset)
}

fn play(variant: Variant, games: u64, seed: u64, max_steps: u32, rules: Option<PathBuf>, out: Option<PathBuf>, progress: bool) -> anyhow::Result<()> {
    let ruleset = load_ruleset(variant, rules.as_ref())?;
    if let Some(dir) = &out {
        fs::create_dir_all(dir)?;
    }
    let pb = if progress {
        let pb = ProgressBar::new(games);
        pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} games {elapsed_precise}")?);
        Some(pb)
    } else {
        None
    };

    let reports: Vec<PlayReport> = (0..games)
        .into_par_iter()
        .map(|i| -> anyhow::Result<PlayReport> {
            let report = autoplay::play(&ruleset, seed.wrapping_add(i), max_steps)?;
            if let Some(dir) = &out {
                let path = dir.join(format!("game-{:06}.tmt", seed.wrapping_add(i)));
                trace::write_to_path(&path, &report.trace)?;
            }
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            Ok(report)
        })
        .collect::<anyhow::Result<_>>()?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut store = MemoryStore::new();
    let score_key = best_score_key(&ruleset);
    for r in &reports {
        record_best(&mut store, score_key, r.final_score);
        record_best(&mut store, MAX_TILE_KEY, r.highest_tile as u64);
    }
    let total_steps: u64 = reports.iter().map(|r| r.steps as u64).sum();
    let mean = reports.iter().map(|r| r.final_score).sum::<u64>() as f64 / reports.len().max(1) as f64;
    let best = reports.iter().max_by_key(|r| r.final_score);
    info!(games, total_steps, "batch finished");
    println!("Games: {}, Steps: {}, Mean score: {:.1}", reports.len(), total_steps, mean);
    if let Some(best) = best {
        println!(
            "Best: seed {} score {} highest tile {} ({:?})\n{}",
            best.trace.meta.seed, best.final_score, best.highest_tile, best.state, best.trace.final_grid
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Play { variant, games, seed, max_steps, rules, out, progress } => {
            play(variant, games, seed, max_steps, rules, out, progress)
        }
        Command::Replay { file } => {
            let t = trace::read_from_path(&file).with_context(|| format!("reading {}", file.display()))?;
            let report = trace::replay(&t)?;
            if !report.matches {
                warn!(rejected = report.rejected, "replay diverged");
                anyhow::bail!(
                    "replay diverged: score {} vs recorded {}, {} inputs rejected",
                    report.final_score,
                    t.meta.final_score,
                    report.rejected
                );
            }
            println!("OK: {} steps, score {}\n{}", report.steps, report.final_score, report.final_grid);
            Ok(())
        }
    }
}
