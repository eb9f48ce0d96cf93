use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::PathBuf;
use term_snake::game::{GameConfig, GameEngine, Session};
use term_snake::logging::init_file_logging;
use term_snake::modes::HumanMode;
use term_snake::persistence::{FileHighScoreStore, HighScoreStore, MemoryHighScoreStore};
use tracing::info;

#[derive(Parser)]
#[command(name = "term_snake")]
#[command(version, about = "Snake in the terminal")]
struct Cli {
    /// JSON file with game settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width
    #[arg(long)]
    width: Option<usize>,

    /// Grid height
    #[arg(long)]
    height: Option<usize>,

    /// Delay between ticks at the start of a round, in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Shrink the grid to fit the current terminal
    #[arg(long)]
    fit: bool,

    /// Where to keep the high score (defaults to the user data directory)
    #[arg(long, conflicts_with = "no_persist")]
    high_score_file: Option<PathBuf>,

    /// Keep the high score in memory only
    #[arg(long)]
    no_persist: bool,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Seed for food placement
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)?,
            None => GameConfig::default(),
        };

        if let Some(width) = self.width {
            config.grid_width = width;
        }
        if let Some(height) = self.height {
            config.grid_height = height;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.initial_tick_ms = tick_ms;
            config.min_tick_ms = config.min_tick_ms.min(tick_ms);
        }

        if self.fit {
            let (columns, rows) =
                crossterm::terminal::size().context("Failed to read terminal size")?;
            config = config.fit_to_terminal(columns, rows);
        }

        config
            .validate()
            .map_err(|err| anyhow!("Invalid game configuration: {err}"))?;
        Ok(config)
    }

    fn high_score_store(&self) -> Result<Box<dyn HighScoreStore>> {
        if self.no_persist {
            return Ok(Box::new(MemoryHighScoreStore::default()));
        }

        let store = match &self.high_score_file {
            Some(path) => FileHighScoreStore::new(path),
            None => FileHighScoreStore::in_data_dir()?,
        };
        info!(path = ?store.path(), "high score file");
        Ok(Box::new(store))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_file_logging(path)?;
    }

    // Create game configuration from the config file and CLI arguments
    let config = cli.game_config()?;
    info!(?config, "starting");

    let engine = match cli.seed {
        Some(seed) => GameEngine::with_seed(config, seed),
        None => GameEngine::new(config),
    }
    .map_err(|err| anyhow!("Invalid game configuration: {err}"))?;

    let session = Session::new(engine, cli.high_score_store()?);
    let mut human_mode = HumanMode::new(session);
    human_mode.run().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["term_snake"]);
        assert_eq!(cli.game_config().unwrap(), GameConfig::default());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["term_snake", "--width", "30", "--height", "20", "--tick-ms", "40"]);
        let config = cli.game_config().unwrap();
        assert_eq!(config.grid_width, 30);
        assert_eq!(config.grid_height, 20);
        assert_eq!(config.initial_tick_ms, 40);
        assert_eq!(config.min_tick_ms, 40);
    }

    #[test]
    fn test_cli_rejects_invalid_grid() {
        let cli = Cli::parse_from(["term_snake", "--width", "3"]);
        assert!(cli.game_config().is_err());

        let cli = Cli::parse_from(["term_snake", "--width", "33000"]);
        assert!(cli.game_config().is_err());
    }

    #[test]
    fn test_persistence_flags_conflict() {
        let parsed = Cli::try_parse_from(["term_snake", "--no-persist", "--high-score-file", "x.json"]);
        assert!(parsed.is_err());
    }
}
