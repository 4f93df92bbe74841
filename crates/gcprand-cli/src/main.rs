//! CLI for gcprand — random strings seeded by the GCP Dot.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gcprand")]
#[command(about = "gcprand — random strings seeded by the GCP Dot")]
#[command(version = gcprand_core::VERSION)]
struct Cli {
    /// WebDriver endpoint of a running geckodriver/chromedriver
    #[arg(long, global = true, default_value = "http://127.0.0.1:4444")]
    driver_url: String,

    /// Chart page to scrape
    #[arg(long, global = true, default_value = "https://gcpdot.com/gcpchart.php")]
    chart_url: String,

    /// Maximum measurement attempts before giving up on overflowed readings
    #[arg(long, global = true, default_value = "5")]
    max_attempts: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take one chart measurement and print the observation
    Sample {
        /// Print the observation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Repeatedly sample the chart and summarize the history (Ctrl-C stops early)
    Gather {
        /// Number of samples to collect
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Seconds to sleep between samples
        #[arg(long, default_value = "3")]
        interval: u64,

        /// Dump the full history as JSON after gathering
        #[arg(long)]
        json: bool,
    },

    /// Generate a dot-seeded random string
    Generate {
        /// String length (1-1000)
        #[arg(long, default_value = "128")]
        length: usize,

        /// Force a fresh measurement instead of drawing from history
        #[arg(long)]
        fresh: bool,
    },

    /// Serve the random string page and JSON API
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "5000")]
        port: u16,

        /// Host/interface to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let sampler = commands::make_sampler(&cli.driver_url, &cli.chart_url, cli.max_attempts);

    match cli.command {
        Commands::Sample { json } => commands::sample::run(sampler, json),
        Commands::Gather {
            limit,
            interval,
            json,
        } => commands::gather::run(sampler, limit, interval, json),
        Commands::Generate { length, fresh } => commands::generate::run(sampler, length, fresh),
        Commands::Serve { port, host } => commands::serve::run(sampler, &host, port),
    }
}
