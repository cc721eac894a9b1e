use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "folio",
    version,
    about = "Inspect the reading state kept by the folio reader core.",
    long_about = None
)]
pub struct Cli {
    /// Print reading history
    #[clap(short = 'r', long)]
    pub history: bool,

    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable debug output
    #[clap(long)]
    pub debug: bool,

    /// Ebook path whose saved location and annotations to show
    #[clap(name = "EBOOK")]
    pub ebook: Option<String>,
}
