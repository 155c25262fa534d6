//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::card::CardSide;
use crate::suggest::AssistMode;

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Front of the card (term)
    pub front: String,

    /// Back of the card (definition)
    pub back: String,

    /// Ask the suggestion service to extend one side before saving
    #[arg(short, long, value_enum)]
    pub assist: Option<SideArg>,

    /// How to merge the suggestion into the assisted side
    #[arg(short, long, value_enum, default_value = "append")]
    pub mode: AssistModeArg,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Card id, or a unique prefix of it
    pub id: String,

    /// Delete without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Suggest command arguments.
#[derive(Debug, Args)]
pub struct SuggestCommand {
    /// Text to generate a suggestion for
    pub query: String,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Card side argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    /// The term side
    Front,
    /// The definition side
    Back,
}

impl From<SideArg> for CardSide {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Front => Self::Front,
            SideArg::Back => Self::Back,
        }
    }
}

/// Suggestion merge mode argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AssistModeArg {
    /// Keep the typed text and add the suggestion below it
    #[default]
    Append,
    /// Use the suggestion instead of the typed text
    Replace,
}

impl From<AssistModeArg> for AssistMode {
    fn from(arg: AssistModeArg) -> Self {
        match arg {
            AssistModeArg::Append => Self::Append,
            AssistModeArg::Replace => Self::Replace,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_arg_conversion() {
        assert_eq!(CardSide::from(SideArg::Front), CardSide::Front);
        assert_eq!(CardSide::from(SideArg::Back), CardSide::Back);
    }

    #[test]
    fn test_assist_mode_arg_conversion() {
        assert_eq!(AssistMode::from(AssistModeArg::Append), AssistMode::Append);
        assert_eq!(AssistMode::from(AssistModeArg::Replace), AssistMode::Replace);
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_add_command_debug() {
        let cmd = AddCommand {
            front: "term".to_string(),
            back: "definition".to_string(),
            assist: Some(SideArg::Back),
            mode: AssistModeArg::Replace,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("term"));
        assert!(debug_str.contains("Replace"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
