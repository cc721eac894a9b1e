use folio::{
    cli::Cli,
    config::Config,
    logging::{self, LogLevel},
    state::State,
};

use clap::Parser;
use eyre::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(LogLevel::from_flags(cli.verbose, cli.debug));

    let config = match &cli.config {
        Some(path) => Config::load_from(path.clone()),
        None => Config::new(),
    };
    let state = match config {
        Ok(config) => {
            log::debug!("using configuration {}", config.filepath().display());
            match config.data_dir() {
                Some(dir) => State::open(&dir.join("states.db"))?,
                None => State::new()?,
            }
        }
        Err(err) => {
            log::warn!("Could not load configuration, using defaults: {}", err);
            State::new()?
        }
    };
    if cli.history {
        print_history(&state)
    } else if let Some(filepath) = &cli.ebook {
        print_book(&state, filepath)
    } else {
        match state.get_last_read()? {
            Some(filepath) => print_book(&state, &filepath),
            None => {
                println!("No reading history");
                Ok(())
            }
        }
    }
}

fn print_history(state: &State) -> Result<()> {
    let library = state.get_from_history()?;
    if library.is_empty() {
        println!("No reading history");
        return Ok(());
    }
    for (n, item) in library.iter().enumerate() {
        let progress = item
            .reading_progress
            .map(|p| format!("{:>3.0}%", p * 100.0))
            .unwrap_or_else(|| "  -".to_string());
        let title = item.title.as_deref().unwrap_or("Untitled");
        let author = item.author.as_deref().unwrap_or("Unknown");
        println!(
            "{:>3}  {}  {} - {}  ({})",
            n + 1,
            progress,
            title,
            author,
            item.filepath
        );
    }
    Ok(())
}

fn print_book(state: &State, filepath: &str) -> Result<()> {
    match state.get_last_location(filepath)? {
        Some(location) => {
            println!("{}", filepath);
            match location.fraction {
                Some(fraction) => println!("  at {} ({:.1}%)", location.address, fraction * 100.0),
                None => println!("  at {}", location.address),
            }
        }
        None => {
            println!("No saved location for {}", filepath);
            return Ok(());
        }
    }
    for annotation in state.get_annotations(filepath)? {
        let note = annotation.note.as_deref().unwrap_or("");
        println!(
            "  {}  {}  {}",
            annotation.created.format("%Y-%m-%d %H:%M"),
            annotation.value,
            note
        );
    }
    Ok(())
}
