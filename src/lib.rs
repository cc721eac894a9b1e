pub mod address;
pub mod book;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod logging;
pub mod models;
pub mod narration;
pub mod overlay;
pub mod progress;
pub mod renderer;
pub mod resolver;
pub mod search;
pub mod settings;
pub mod state;
pub mod view;
