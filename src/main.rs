//! NBA Spread Pipeline CLI
//!
//! Fetches per-game box scores into incremental CSV datasets and trains
//! gradient-boosted spread models from team averages.

use clap::{Parser, Subcommand};
use hoops::{Config, Result};

#[derive(Parser)]
#[command(name = "hoops")]
#[command(about = "NBA box-score collection and spread model training", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch game logs and box scores for the configured seasons
    Fetch {
        /// Comma-separated seasons ("2023-24,2022-23"), overriding config
        #[arg(long)]
        seasons: Option<String>,
        /// Override the data directory
        #[arg(long)]
        data_dir: Option<String>,
    },
    /// Show stored dataset row counts per season and category
    Status,
    /// Build features and train the spread models
    Train {
        /// Override number of models
        #[arg(long)]
        models: Option<usize>,
        /// Override the train/test cutoff date (YYYY-MM-DD)
        #[arg(long)]
        cutoff: Option<String>,
        /// Seed the hyperparameter draws for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Initialize a new project with default config
    Init,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Fetch { seasons, data_dir } => commands::fetch(&config, seasons, data_dir),
        Commands::Status => commands::status(&config),
        Commands::Train {
            models,
            cutoff,
            seed,
        } => commands::train(&config, models, cutoff, seed),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use hoops::data::{game_log, CategoryStore, SeasonFetcher, StatsClient};
    use hoops::features::{self, MIN_GAME_COUNT};
    use hoops::training::train_models;
    use hoops::{Category, SpreadError};
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.fetch.data_dir)?;
        std::fs::create_dir_all(&config.data.model_dir)?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize seasons and paths", config_path);
        println!("  2. Run 'hoops fetch' to collect game logs and box scores");
        println!("  3. Run 'hoops train' to fit the spread models");

        Ok(())
    }

    pub fn fetch(
        config: &Config,
        seasons: Option<String>,
        data_dir: Option<String>,
    ) -> Result<()> {
        let seasons: Vec<String> = match seasons {
            Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
            None => config.fetch.seasons.clone(),
        };
        let data_dir = data_dir.unwrap_or_else(|| config.fetch.data_dir.clone());

        let interrupt = Arc::new(AtomicBool::new(false));
        {
            let flag = interrupt.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)).map_err(|e| {
                SpreadError::Config(format!("failed to install interrupt handler: {}", e))
            })?;
        }

        let client = StatsClient::new();
        for season in &seasons {
            println!("Fetching season {}...", season);
            let games = game_log::collect_season_games(&client, season)?;
            println!("  {} games with final scores", games.len());

            let games_path = Path::new(&data_dir).join(format!("{}_all_games.csv", season));
            game_log::save_games(&games_path, &games)?;

            let store = CategoryStore::new(&data_dir, season);
            let fetcher = SeasonFetcher::new(&client, store, interrupt.clone());
            fetcher.fetch_season(&games)?;
        }

        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        println!("Dataset Status");
        println!("───────────────────────────────");
        println!("  Data dir: {}", config.fetch.data_dir);

        for season in &config.fetch.seasons {
            println!("  Season {}:", season);
            let games_path =
                Path::new(&config.fetch.data_dir).join(format!("{}_all_games.csv", season));
            match game_log::load_games(&games_path) {
                Ok(games) => println!("    games:       {:>6}", games.len()),
                Err(_) => println!("    games:       (not fetched)"),
            }

            let store = CategoryStore::new(&config.fetch.data_dir, season);
            for category in Category::ALL {
                let table = store.load(category);
                println!("    {:<12} {:>6} rows", format!("{}:", category), table.len());
            }
        }

        Ok(())
    }

    pub fn train(
        config: &Config,
        models: Option<usize>,
        cutoff: Option<String>,
        seed: Option<u64>,
    ) -> Result<()> {
        let cutoff = match cutoff {
            Some(text) => chrono::NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|_| {
                SpreadError::Config(format!("cutoff must be YYYY-MM-DD, got {:?}", text))
            })?,
            None => config.cutoff()?,
        };
        let n = models.unwrap_or(config.training.models);
        let seed = seed.or(config.training.seed);

        println!("Loading games from {}...", config.data.games_path);
        let games = game_log::load_games(&config.data.games_path)?;
        println!("Loading averages from {}...", config.data.averages_path);
        let averages = features::load_averages(&config.data.averages_path, MIN_GAME_COUNT)?;

        let data = features::build_training_data(&games, &averages)?;
        println!(
            "Built {} rows x {} features",
            data.game_ids.len(),
            data.feature_names.len()
        );

        let split = features::split_by_date(&data, &games, cutoff)?;
        println!(
            "Split at {}: {} train / {} test",
            cutoff,
            split.train_game_ids.len(),
            split.test_game_ids.len()
        );

        let reports = train_models(
            &split,
            n,
            Path::new(&config.data.model_dir),
            config.training.early_stopping_rounds,
            seed,
        )?;

        println!("\n=== Training Results ===\n");
        println!(
            "{:>5} {:>6} {:>8} {:>6} {:>7} {:>10} {:>10} {:>10}",
            "Model", "Depth", "LR", "Trees", "Alpha", "Train RMSE", "Test RMSE", "Test MAE"
        );
        println!("{}", "-".repeat(70));
        for r in &reports {
            println!(
                "{:>5} {:>6} {:>8.3} {:>6} {:>7.3} {:>10.3} {:>10.3} {:>10.3}",
                r.index,
                r.params.max_depth,
                r.params.learning_rate,
                r.best_iteration + 1,
                r.params.alpha,
                r.train.rmse,
                r.test.rmse,
                r.test.mae
            );
        }
        println!(
            "\nSaved {} models to {}",
            reports.len(),
            config.data.model_dir
        );

        Ok(())
    }
}
