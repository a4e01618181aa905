//! Wobble Lab - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lab_core::persistence::SaveFormat;
use lab_tools::simulate::SimulationConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lab-tools")]
#[command(about = "Development tools for the Wobble research lab")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Binary,
    Ron,
}

impl From<FormatArg> for SaveFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Binary => Self::Binary,
            FormatArg::Ron => Self::Ron,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a catalog file
    Validate {
        /// Catalog file, or a directory containing lab_catalog.ron
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },

    /// Run the lab headless and print a summary
    Simulate {
        /// Simulated seconds
        #[arg(long, default_value_t = 600.0)]
        seconds: f64,
        /// Seconds per tick
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f64,
        /// Behavior seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Buy upgrades whenever affordable
        #[arg(long)]
        auto_upgrade: bool,
        /// Catalog file (built-in catalog if omitted)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Save the final ledger here
        #[arg(long)]
        save: Option<PathBuf>,
        /// Save format (guessed from the extension if omitted)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Print a save file as JSON
    Inspect {
        /// Save file
        save: PathBuf,
    },

    /// Replay offline catch-up against a save
    CatchUp {
        /// Save file
        save: PathBuf,
        /// Hours away
        #[arg(long)]
        hours: f64,
        /// Catalog file (built-in catalog if omitted)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Write the caught-up ledger back
        #[arg(long)]
        write: bool,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> lab_tools::Result<()> {
    match command {
        Commands::Validate { path } => {
            tracing::info!("Validating catalog at: {}", path.display());
            lab_tools::validate::validate_catalog_file(&path)?;
            tracing::info!("Validation passed");
        }

        Commands::Simulate {
            seconds,
            dt,
            seed,
            auto_upgrade,
            catalog,
            save,
            format,
        } => {
            let catalog = lab_tools::validate::load_catalog(catalog.as_deref())?;
            let config = SimulationConfig {
                seconds,
                dt,
                seed,
                auto_upgrade,
            };
            let save = save.as_deref().map(|path| {
                let format = format.map_or_else(|| SaveFormat::from_path(path), SaveFormat::from);
                (path, format)
            });

            let summary = lab_tools::simulate::run_headless(catalog, &config, save, chrono::Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Inspect { save } => {
            println!("{}", lab_tools::inspect::save_to_json(&save)?);
        }

        Commands::CatchUp {
            save,
            hours,
            catalog,
            write,
        } => {
            let catalog = lab_tools::validate::load_catalog(catalog.as_deref())?;
            let report = lab_tools::inspect::catch_up_save(&save, &catalog, hours, write)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
