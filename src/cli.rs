use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kuryesite")]
#[command(about = "kuryesite - Courier service marketing site and lead capture.")]
#[command(version = env!("VERSION"))]
pub struct Cli {
    /// Path to one or more config files (merged in order).
    #[arg(long, default_value = "config.toml", action = clap::ArgAction::Append)]
    pub config: Vec<PathBuf>,

    /// Path to a site theme directory. If left empty, the default theme
    /// embedded in the binary is served.
    #[arg(long)]
    pub site: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a sample config file.
    NewConfig {
        /// Output path for config file.
        #[arg(short, long, default_value = "config.toml")]
        path: PathBuf,
    },

    /// Build the neighborhoods lookup artifact by scraping the source page.
    Scrape {
        /// Source page URL (overrides [scrape].url from config).
        #[arg(long)]
        url: Option<String>,

        /// id of the table holding the rows (overrides [scrape].table_id).
        #[arg(long)]
        table_id: Option<String>,

        /// Output JSON file (overrides [scrape].output).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}
