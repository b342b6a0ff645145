//! fastaccess - inspect accessor dispatchers built from type descriptions

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fastaccess")]
#[command(about = "Build and inspect ordinal-indexed accessor dispatchers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dispatcher for a type description and print its listing
    Disasm {
        /// JSON type description
        file: String,

        /// Write the listing to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Summarize a type description's members and ordinals
    Inspect {
        /// JSON type description
        file: String,

        /// Generation threshold (defaults to FASTACCESS_THRESHOLD or 3)
        #[arg(long)]
        threshold: Option<usize>,

        /// TOML settings file
        #[arg(long)]
        config: Option<String>,
    },
}

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    });
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Disasm { file, output } => commands::disasm::execute(&file, output.as_deref()),
        Commands::Inspect {
            file,
            threshold,
            config,
        } => commands::inspect::execute(&file, threshold, config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
