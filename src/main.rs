//! IPL batting evolution CLI
//!
//! Data import, batting analysis, match outcome model and JSON API.

use clap::{Parser, Subcommand};
use ipl::{Config, Era, Result, TossDecision};

#[derive(Parser)]
#[command(name = "ipl")]
#[command(about = "IPL batting evolution analysis and match prediction", long_about = None)]
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
    /// Initialize a new project with default config
    Init,
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Run the full batting analysis and save processed outputs
    Analyze,
    /// Show per-season trend lines
    Trends {
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Compare strike rates between two eras
    Era {
        /// First era, e.g. 2008-2013
        #[arg(long)]
        era1: Option<Era>,
        /// Second era, e.g. 2014-2024
        #[arg(long)]
        era2: Option<Era>,
        /// Minimum balls for a batter to be sampled in an era
        #[arg(long)]
        min_balls: Option<u32>,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Top players by strike rate and boundary percentage
    Top {
        #[arg(long)]
        limit: Option<usize>,
        /// Minimum balls faced in a season
        #[arg(long)]
        min_balls: Option<u32>,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Train the match outcome model
    Train {
        /// Override number of epochs
        #[arg(long)]
        epochs: Option<usize>,
        /// Override learning rate
        #[arg(long)]
        lr: Option<f64>,
    },
    /// Predict a match outcome
    Predict {
        team1: String,
        team2: String,
        /// Team that won the toss
        #[arg(long)]
        toss_winner: Option<String>,
        /// bat or field
        #[arg(long)]
        toss_decision: Option<String>,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Serve the JSON API over processed outputs
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum DataCommands {
    /// Load the raw CSVs into the database
    Import {
        /// Ball-by-ball CSV (defaults to config)
        #[arg(long)]
        deliveries: Option<String>,
        /// Match CSV (defaults to config)
        #[arg(long)]
        matches: Option<String>,
    },
    /// Show database status
    Status,
    /// Write the cleaned, merged deliveries as CSV
    Export {
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

#[derive(Clone, Copy, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
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

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Data { action } => match action {
            DataCommands::Import {
                deliveries,
                matches,
            } => commands::data_import(&config, deliveries, matches),
            DataCommands::Status => commands::data_status(&config),
            DataCommands::Export { output } => commands::data_export(&config, output),
        },
        Commands::Analyze => commands::analyze(&config),
        Commands::Trends { format } => commands::trends(&config, format),
        Commands::Era {
            era1,
            era2,
            min_balls,
            format,
        } => commands::era(&config, era1, era2, min_balls, format),
        Commands::Top {
            limit,
            min_balls,
            format,
        } => commands::top(&config, limit, min_balls, format),
        Commands::Train { epochs, lr } => commands::train(&config, epochs, lr),
        Commands::Predict {
            team1,
            team2,
            toss_winner,
            toss_decision,
            format,
        } => commands::predict(&config, &team1, &team2, toss_winner, toss_decision, format),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Serve { port } => commands::serve(&config, port),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use ipl::analysis::era::EraComparison;
    use ipl::analysis::{self, BattingStats, SeasonalTrend, TrendLine};
    use ipl::data::{export, loader, Database};
    use ipl::IplError;

    fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
        serde_json::to_string_pretty(value).map_err(|e| IplError::Parse(e.to_string()))
    }

    fn fmt_opt(value: Option<f64>, precision: usize) -> String {
        match value {
            Some(v) => format!("{:.*}", precision, v),
            None => "n/a".to_string(),
        }
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data/raw")?;
        std::fs::create_dir_all(&config.data.processed_dir)?;
        std::fs::create_dir_all("model")?;
        println!("Created data/raw, {} and model/ directories", config.data.processed_dir);

        println!("\nNext steps:");
        println!("  1. Put the ball-by-ball and match CSVs in data/raw/");
        println!("  2. Run 'ipl data import' to load them");
        println!("  3. Run 'ipl analyze' for the batting analysis");

        Ok(())
    }

    pub fn data_import(
        config: &Config,
        deliveries: Option<String>,
        matches: Option<String>,
    ) -> Result<()> {
        let deliveries_path = deliveries.unwrap_or_else(|| config.data.deliveries_path.clone());
        let matches_path = matches.unwrap_or_else(|| config.data.matches_path.clone());

        println!("Loading files:");
        println!("  - {}", deliveries_path);
        println!("  - {}", matches_path);

        let deliveries = loader::load_deliveries(&deliveries_path)?;
        let matches = loader::load_matches(&matches_path)?;
        println!(
            "Parsed {} deliveries and {} matches",
            deliveries.len(),
            matches.len()
        );

        let mut db = Database::open(&config.data.database_path)?;
        let summary = db.import(&matches, &deliveries)?;
        println!(
            "Imported {} matches and {} deliveries into {}",
            summary.matches, summary.deliveries, config.data.database_path
        );

        print_summary(&db)
    }

    fn print_summary(db: &Database) -> Result<()> {
        let summary = db.summary()?;
        println!("\nDataset Summary:");
        println!("  total_matches:  {}", summary.total_matches);
        println!("  total_balls:    {}", summary.total_balls);
        println!("  total_seasons:  {}", summary.total_seasons);
        println!("  seasons_range:  {}", summary.seasons_range());
        println!("  unique_players: {}", summary.unique_players);
        println!("  unique_teams:   {}", summary.unique_teams);
        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;
        let teams = db.get_teams()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:       {}", config.data.database_path);
        println!("  Teams:      {}", teams.len());
        println!("  Matches:    {}", stats.match_count);
        println!("  Deliveries: {}", stats.delivery_count);
        if let (Some(earliest), Some(latest)) = (stats.earliest_match, stats.latest_match) {
            println!("  Range:      {} to {}", earliest, latest);
        }

        if stats.delivery_count > 0 {
            print_summary(&db)?;
        }
        Ok(())
    }

    pub fn data_export(config: &Config, output: Option<String>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let rows = db.get_merged_deliveries()?;
        if rows.is_empty() {
            return Err(IplError::InsufficientData(
                "no deliveries in database, run `ipl data import` first".to_string(),
            ));
        }

        let path = match output {
            Some(p) => std::path::PathBuf::from(p),
            None => config.processed_file("cleaned_data.csv"),
        };
        let written = export::write_cleaned(&path, &rows)?;
        println!("Saved {} cleaned rows to {}", written, path.display());
        Ok(())
    }

    fn load_rows(config: &Config) -> Result<Vec<ipl::MergedDelivery>> {
        let db = Database::open(&config.data.database_path)?;
        let rows = db.get_merged_deliveries()?;
        if rows.is_empty() {
            return Err(IplError::InsufficientData(
                "no deliveries in database, run `ipl data import` first".to_string(),
            ));
        }
        Ok(rows)
    }

    pub fn analyze(config: &Config) -> Result<()> {
        let rows = load_rows(config)?;
        let report = analysis::run_analysis(&rows, &config.analysis)?;

        println!("{}", "=".repeat(50));
        println!("IPL BATTING EVOLUTION ANALYSIS");
        println!("{}", "=".repeat(50));

        println!("\nSTRIKE RATE EVOLUTION:");
        match report.strike_rate_evolution() {
            Some((first, last)) => {
                println!("  {}: {:.1}", first.year, first.strike_rate);
                println!("  {}: {:.1}", last.year, last.strike_rate);
                println!("  Change: {:+.1}", last.strike_rate - first.strike_rate);
            }
            None => println!("  No seasonal trends data available"),
        }

        print_era_comparison(&report.era_comparison);

        println!(
            "\nTOP 5 STRIKE RATE PLAYERS (min {} balls):",
            report.top.min_balls
        );
        if report.top.by_strike_rate.is_empty() {
            println!("  No top performers data");
        } else {
            print_batting_table(&report.top.by_strike_rate[..report.top.by_strike_rate.len().min(5)]);
        }

        let trends_path = config.processed_file(ipl::server::TRENDS_FILE);
        let batting_path = config.processed_file(ipl::server::BATTING_FILE);
        export::write_records(&trends_path, &report.trends)?;
        export::write_records(&batting_path, &report.batting)?;

        println!("\nResults saved to:");
        println!("  - {}", trends_path.display());
        println!("  - {}", batting_path.display());
        Ok(())
    }

    fn print_era_comparison(c: &EraComparison) {
        println!("\nERA COMPARISON ({} vs {}):", c.era1_name, c.era2_name);
        println!(
            "  Strike Rate: {} -> {} ({})",
            fmt_opt(c.era1_avg_sr, 1),
            fmt_opt(c.era2_avg_sr, 1),
            c.strike_rate_increase
                .map(|v| format!("{:+.1}", v))
                .unwrap_or_else(|| "n/a".to_string())
        );
        println!(
            "  Boundary %:  {}% -> {}% ({})",
            fmt_opt(c.era1_boundary_pct, 1),
            fmt_opt(c.era2_boundary_pct, 1),
            c.boundary_increase
                .map(|v| format!("{:+.1}%", v))
                .unwrap_or_else(|| "n/a".to_string())
        );
        println!(
            "  Players analyzed: {} in era1, {} in era2",
            c.players_era1, c.players_era2
        );
        println!(
            "  Statistical Significance: {} (t = {}, p-value: {})",
            if c.significant { "YES" } else { "NO" },
            fmt_opt(c.t_statistic, 3),
            fmt_opt(c.p_value, 4)
        );
    }

    fn print_batting_table(rows: &[BattingStats]) {
        println!(
            "  {:<24} {:>6} {:>6} {:>6} {:>8} {:>10}",
            "Batter", "Year", "Runs", "Balls", "SR", "Boundary%"
        );
        for s in rows {
            println!(
                "  {:<24} {:>6} {:>6} {:>6} {:>8.1} {:>10.1}",
                s.batter, s.year, s.runs_scored, s.balls_faced, s.strike_rate, s.boundary_percentage
            );
        }
    }

    pub fn trends(config: &Config, format: OutputFormat) -> Result<()> {
        let rows = load_rows(config)?;
        let batting = analysis::calculate_batting_stats(&rows);
        let trends: Vec<SeasonalTrend> = analysis::calculate_seasonal_trends(&batting, &rows);
        let lines: Vec<TrendLine> = analysis::all_trend_lines(&trends);

        match format {
            OutputFormat::Json => {
                let body = serde_json::json!({ "seasons": trends, "trend_lines": lines });
                println!("{}", to_json(&body)?);
            }
            OutputFormat::Csv => print!("{}", export::to_csv_string(&trends)?),
            OutputFormat::Table => {
                println!(
                    "{:>6} {:>8} {:>10} {:>8} {:>7} {:>7} {:>8}",
                    "Year", "SR", "Boundary%", "Dot%", "Six%", "Four%", "RunRate"
                );
                for t in &trends {
                    println!(
                        "{:>6} {:>8.1} {:>10.1} {:>8.1} {:>7.1} {:>7.1} {:>8.2}",
                        t.year,
                        t.strike_rate,
                        t.boundary_percentage,
                        t.dot_ball_percentage,
                        t.six_percentage,
                        t.four_percentage,
                        t.run_rate
                    );
                }

                println!("\nTrend lines:");
                for line in &lines {
                    println!(
                        "  {:<12} {} {:.2} -> {} {:.2} | slope {:+.3}/season | total {:+.2} | avg annual {:+.3}",
                        line.metric.to_string(),
                        line.first_year,
                        line.first_value,
                        line.last_year,
                        line.last_value,
                        line.slope,
                        line.total_change,
                        line.annual_change
                    );
                }
            }
        }
        Ok(())
    }

    pub fn era(
        config: &Config,
        era1: Option<Era>,
        era2: Option<Era>,
        min_balls: Option<u32>,
        format: OutputFormat,
    ) -> Result<()> {
        let settings = analysis::EraComparisonConfig {
            era1: era1.unwrap_or(config.analysis.era1),
            era2: era2.unwrap_or(config.analysis.era2),
            min_balls: min_balls.unwrap_or(config.analysis.era_min_balls),
            significance: config.analysis.significance,
        };

        let db = Database::open(&config.data.database_path)?;
        let rows = db.get_deliveries_in_years(
            settings.era1.start.min(settings.era2.start),
            settings.era1.end.max(settings.era2.end),
        )?;
        let comparison = analysis::compare_eras(&rows, &settings);

        match format {
            OutputFormat::Json => println!("{}", to_json(&comparison)?),
            OutputFormat::Csv => print!("{}", export::to_csv_string(&[comparison])?),
            OutputFormat::Table => print_era_comparison(&comparison),
        }
        Ok(())
    }

    pub fn top(
        config: &Config,
        limit: Option<usize>,
        min_balls: Option<u32>,
        format: OutputFormat,
    ) -> Result<()> {
        let rows = load_rows(config)?;
        let batting = analysis::calculate_batting_stats(&rows);
        let top = analysis::top_performers(
            &batting,
            min_balls.unwrap_or(config.analysis.top_min_balls),
            limit.unwrap_or(config.analysis.top_n),
        );

        match format {
            OutputFormat::Json => println!("{}", to_json(&top)?),
            OutputFormat::Csv => {
                println!("# by_strike_rate");
                print!("{}", export::to_csv_string(&top.by_strike_rate)?);
                println!("# by_boundary_percentage");
                print!("{}", export::to_csv_string(&top.by_boundary_percentage)?);
            }
            OutputFormat::Table => {
                println!("Top by strike rate (min {} balls):", top.min_balls);
                print_batting_table(&top.by_strike_rate);
                println!("\nTop by boundary percentage (min {} balls):", top.min_balls);
                print_batting_table(&top.by_boundary_percentage);
            }
        }
        Ok(())
    }

    pub fn train(config: &Config, epochs: Option<usize>, lr: Option<f64>) -> Result<()> {
        let epochs = epochs.unwrap_or(config.model.epochs);
        let lr = lr.unwrap_or(config.model.learning_rate);

        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;
        println!("Loaded {} matches from database", stats.match_count);
        println!("Epochs: {}, learning rate: {}", epochs, lr);

        let report = ipl::training::train_from_database(&db, config, epochs, lr)?;
        let m = &report.metadata;

        println!("\nTraining complete!");
        println!("  Samples:        {} train, {} validation", m.train_samples, m.val_samples);
        println!("  Epochs run:     {} (best {})", m.epochs_run, m.best_epoch);
        println!("  Train accuracy: {:.1}%", m.train_accuracy * 100.0);
        println!("  Val accuracy:   {}", fmt_opt(m.val_accuracy.map(|a| a * 100.0), 1));
        println!("  Val log loss:   {}", fmt_opt(m.val_log_loss, 4));
        println!("  Saved to:       {}", config.data.model_path);

        println!("\nElo ratings:");
        for (team, rating) in &report.elo_ratings {
            println!("  {:<30} {:>7.1}", team, rating);
        }
        Ok(())
    }

    pub fn predict(
        config: &Config,
        team1: &str,
        team2: &str,
        toss_winner: Option<String>,
        toss_decision: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        use burn::backend::NdArray;
        use ipl::predict::{format_prediction, Predictor};

        type MyBackend = NdArray<f32>;

        let toss_decision = match toss_decision {
            Some(d) => Some(TossDecision::from_str_loose(&d).ok_or_else(|| {
                IplError::Parse(format!("Unknown toss decision '{}', use bat or field", d))
            })?),
            None => None,
        };

        let db = Database::open(&config.data.database_path)?;
        let device = Default::default();
        let predictor = Predictor::<MyBackend>::load(db, config, device)?;
        let prediction = predictor.predict(team1, team2, toss_winner.as_deref(), toss_decision)?;

        match format {
            OutputFormat::Table => print!("{}", format_prediction(&prediction)),
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "team1": prediction.team1,
                    "team2": prediction.team2,
                    "team1_win_prob": prediction.team1_win_prob,
                    "predicted_winner": prediction.predicted_winner(),
                    "confidence": prediction.confidence.to_string(),
                });
                println!("{}", to_json(&json)?);
            }
            OutputFormat::Csv => {
                println!("team1,team2,team1_win_prob,predicted_winner,confidence");
                println!(
                    "{},{},{:.3},{},{}",
                    prediction.team1,
                    prediction.team2,
                    prediction.team1_win_prob,
                    prediction.predicted_winner(),
                    prediction.confidence
                );
            }
        }
        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let model_file = ipl::model::logistic::model_file(&config.data.model_path);
        if !model_file.exists() {
            return Err(IplError::NoModel);
        }
        let m = ipl::model::ModelMetadata::load(&config.data.model_path)?;

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:            {}", model_file.display());
        println!("  Trained at:      {}", m.trained_at);
        println!("  Features:        {}", m.feature_names.join(", "));
        println!("  Learning rate:   {}", m.learning_rate);
        println!("  Epochs run:      {} (best {})", m.epochs_run, m.best_epoch);
        println!("  Validation from: {}", m.validation_from);
        println!("  Samples:         {} train, {} validation", m.train_samples, m.val_samples);
        println!("  Train accuracy:  {:.1}%", m.train_accuracy * 100.0);
        println!("  Val accuracy:    {}", fmt_opt(m.val_accuracy.map(|a| a * 100.0), 1));
        Ok(())
    }

    pub fn serve(config: &Config, port: Option<u16>) -> Result<()> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(ipl::server::serve(config, port))
    }
}
