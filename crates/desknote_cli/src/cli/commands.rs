use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "desknote")]
#[command(version, about = "Manage desktop sticky notes")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Note database (defaults to the configured location)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Config file (defaults to <config_dir>/desktop-notes/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all notes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new note at the next free cascade position
    Add {
        /// Bind the note to this file (created empty when missing)
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// Show a hidden note
    Show { id: String },

    /// Hide a note
    Hide { id: String },

    /// Flip a note between shown and hidden
    Toggle { id: String },

    /// Delete a note permanently
    Delete { id: String },

    /// Move a note's top-left corner
    Move {
        id: String,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
    },

    /// Resize a note (raised to the minimum size)
    Resize { id: String, width: i32, height: i32 },

    /// Change a note's style
    Style {
        id: String,

        /// Opacity between 0.0 and 1.0
        #[arg(long)]
        transparency: Option<f64>,

        /// Background color as #RGB or #RRGGBB
        #[arg(long)]
        color: Option<String>,

        /// Inner margin in pixels
        #[arg(long)]
        margin: Option<u32>,
    },

    /// Print the status/delete change log
    Changes {
        /// Only entries after this sequence number
        #[arg(long, default_value_t = 0)]
        after: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
