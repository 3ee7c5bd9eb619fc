#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the progression engine.

mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use progression_core::{Difficulty, LevelId, LevelSummary, ObjectiveId};
use progression_engine::{EngineContext, LevelRegistry};
use progression_store::JsonFileStore;
use progression_system_bootstrap::Bootstrap;
use progression_system_level_generation::Template;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DEFAULT_CONFIG_PATH};

/// Tracks level progression for the default campaign.
#[derive(Debug, Parser)]
#[command(name = "progression", version, about)]
struct Cli {
    /// Path of the TOML configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enables debug logging unless `RUST_LOG` is set.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lists campaign levels.
    Levels {
        /// Includes locked levels.
        #[arg(long)]
        all: bool,
    },
    /// Records the outcome of one run of a level.
    Play {
        /// Level to play.
        id: u32,
        /// Score earned by the run.
        #[arg(long)]
        score: u64,
        /// Time the run took, in milliseconds.
        #[arg(long)]
        elapsed_ms: u64,
        /// Objective progress as `ID=VALUE`; may be repeated.
        #[arg(long = "objective", value_parser = parse_objective)]
        objectives: Vec<(u32, u64)>,
    },
    /// Generates a level from a template and prints it as JSON.
    Generate {
        /// Identifier of the generated level.
        id: u32,
        /// Name of a registered template.
        template: String,
        /// Difficulty tier; unrecognized names scale like `normal`.
        difficulty: String,
    },
    /// Prints overall progress.
    Stats,
    /// Clears all progress.
    Reset,
}

fn parse_objective(raw: &str) -> Result<(u32, u64), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got `{raw}`"))?;
    let id = id
        .trim()
        .parse()
        .map_err(|_| format!("invalid objective id `{id}`"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid objective progress `{value}`"))?;
    Ok((id, value))
}

fn install_logging(verbose: bool, fallback: &str) {
    let level = if verbose { "debug" } else { fallback };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    format!("{}.{:03}s", millis / 1_000, millis % 1_000)
}

fn print_level(level: &LevelSummary) {
    let state = if !level.unlocked {
        "locked"
    } else if level.perfect {
        "perfect"
    } else if level.completed {
        "cleared"
    } else {
        "open"
    };
    let best = level
        .best_time
        .map_or_else(|| "-".to_owned(), format_duration);
    println!(
        "{:>3}  {:<16} {:<9} {:<9} {:<8} {}/3  best {:>6} in {}",
        level.id.get(),
        level.name,
        format!("{:?}", level.kind),
        level.difficulty.name(),
        state,
        level.stars,
        level.best_score,
        best,
    );
}

fn open_engine(config: &Config) -> Result<EngineContext<JsonFileStore>> {
    let campaign = Bootstrap
        .campaign()
        .context("built-in campaign is invalid")?;
    let registry = LevelRegistry::from_definitions(campaign).context("failed to build registry")?;
    Ok(EngineContext::new(
        registry,
        JsonFileStore::new(&config.store_path),
    ))
}

fn play(
    config: &Config,
    id: u32,
    score: u64,
    elapsed_ms: u64,
    objectives: &[(u32, u64)],
) -> Result<()> {
    let mut engine = open_engine(config)?;
    let level = LevelId::new(id);
    let mut session = engine
        .start_level(level)
        .with_context(|| format!("cannot start level {level}"))?;
    for &(objective, progress) in objectives {
        let _ = engine
            .update_objective(&mut session, ObjectiveId::new(objective), progress)
            .with_context(|| format!("cannot record progress for objective {objective}"))?;
    }
    let result = engine
        .complete_level(session, score, Duration::from_millis(elapsed_ms))
        .with_context(|| format!("failed to record completion of level {level}"))?;

    println!(
        "Level {} completed: {}/3 stars{}",
        result.level,
        result.stars,
        if result.is_perfect { ", perfect" } else { "" }
    );
    if result.new_best_score {
        println!("New best score: {score}");
    }
    if result.new_best_time {
        println!("New best time: {}", format_duration(Duration::from_millis(elapsed_ms)));
    }
    for reward in &result.rewards {
        println!("Reward: {:?} x{}", reward.kind, reward.value);
    }
    for unlocked in &result.newly_unlocked {
        println!("Unlocked level {unlocked}");
    }
    for achievement in &result.achievements {
        println!("Achievement: {}", achievement.tag());
    }
    Ok(())
}

fn generate(config: &Config, id: u32, template: &str, difficulty: &str) -> Result<()> {
    let mut generator = Bootstrap
        .generator(config.generator_seed)
        .context("built-in templates are invalid")?;
    for extra in &config.templates {
        let extra = Template::new(extra.clone())
            .with_context(|| format!("template `{}` in config is invalid", extra.name))?;
        if let Some(replaced) = generator.register_template(extra) {
            warn!(template = replaced.name(), "config template replaces a built-in one");
        }
    }

    let difficulty = Difficulty::from_name(difficulty).unwrap_or_else(|| {
        warn!(difficulty, "unrecognized difficulty, using normal");
        Difficulty::Normal
    });
    let level = generator
        .generate(LevelId::new(id), template, difficulty)
        .with_context(|| format!("failed to generate level {id}"))?;
    let json = serde_json::to_string_pretty(&level).context("failed to serialize level")?;
    println!("{json}");
    Ok(())
}

fn stats(config: &Config) -> Result<()> {
    let engine = open_engine(config)?;
    let summary = engine.progress_summary();
    println!(
        "Levels:     {} unlocked, {} completed, {} perfect of {}",
        summary.unlocked_levels,
        summary.completed_levels,
        summary.perfect_levels,
        summary.total_levels
    );
    println!(
        "Stars:      {}/{}",
        summary.stars_earned, summary.stars_available
    );
    println!("Completion: {:.1}%", summary.completion_percent);
    println!("Score:      {}", summary.total_score);
    println!("Play time:  {}", format_duration(summary.total_play_time));
    println!(
        "Current:    level {} (furthest {})",
        summary.current_level, summary.max_unlocked_level
    );
    if !summary.achievements.is_empty() {
        println!("Achievements: {}", summary.achievements.join(", "));
    }
    Ok(())
}

/// Entry point for the progression command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    install_logging(cli.verbose, &config.log_level);

    match cli.command {
        Command::Levels { all } => {
            let engine = open_engine(&config)?;
            for level in engine.list_levels(all) {
                print_level(&level);
            }
        }
        Command::Play {
            id,
            score,
            elapsed_ms,
            objectives,
        } => play(&config, id, score, elapsed_ms, &objectives)?,
        Command::Generate {
            id,
            template,
            difficulty,
        } => generate(&config, id, &template, &difficulty)?,
        Command::Stats => stats(&config)?,
        Command::Reset => {
            let mut engine = open_engine(&config)?;
            engine.reset_progress().context("failed to reset progress")?;
            println!("Progress reset");
        }
    }
    Ok(())
}
