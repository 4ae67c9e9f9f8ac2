//! Command-line management view over the shared note store.
//!
//! Status and delete commands are recorded in the change log, so note hosts
//! in other processes pick them up on their next poll.

mod cli;

use clap::Parser;
use cli::{
    handle_add, handle_changes, handle_delete, handle_list, handle_move, handle_resize,
    handle_set_status, handle_style, handle_toggle, open_context, Cli, Commands,
};
use desknote_core::NoteStatus;
use log::error;

fn main() {
    let cli = Cli::parse();

    let result = open_context(cli.db, cli.config, cli.log_level).and_then(|ctx| {
        match cli.command {
            Commands::List { json } => handle_list(&ctx, json),
            Commands::Add { file } => handle_add(&ctx, file),
            Commands::Show { id } => handle_set_status(&ctx, &id, NoteStatus::Shown),
            Commands::Hide { id } => handle_set_status(&ctx, &id, NoteStatus::Hidden),
            Commands::Toggle { id } => handle_toggle(&ctx, &id),
            Commands::Delete { id } => handle_delete(&ctx, &id),
            Commands::Move { id, x, y } => handle_move(&ctx, &id, x, y),
            Commands::Resize { id, width, height } => handle_resize(&ctx, &id, width, height),
            Commands::Style {
                id,
                transparency,
                color,
                margin,
            } => handle_style(&ctx, &id, transparency, color, margin),
            Commands::Changes { after, json } => handle_changes(&ctx, after, json),
        }
    });

    if let Err(e) = result {
        error!("event=cli_command module=cli status=error error={e}");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
