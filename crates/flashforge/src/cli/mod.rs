//! Command-line interface for flashforge.
//!
//! This module provides the CLI structure for the `flashforge` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    AddCommand, AssistModeArg, ConfigCommand, DeleteCommand, ListCommand, OutputFormat,
    SideArg, StatusCommand, SuggestCommand,
};

/// flashforge - Build and study a flashcard deck from the terminal
///
/// Cards are saved to a local deck after every change. Study mode shows one
/// card at a time; flip it to check your answer.
#[derive(Debug, Parser)]
#[command(name = "flashforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a card to the deck
    Add(AddCommand),

    /// List the cards in the deck
    List(ListCommand),

    /// Delete a card from the deck
    Delete(DeleteCommand),

    /// Study the deck one card at a time
    Study,

    /// Ask the suggestion service for card content
    Suggest(SuggestCommand),

    /// Show deck and storage status
    Status(StatusCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
