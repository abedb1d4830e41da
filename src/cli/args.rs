// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// sitepilot - conversational editor for website content
#[derive(Parser, Debug)]
#[command(name = "sitepilot")]
#[command(version, about = "Conversational editor for website content")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one instruction to the assistant
    Chat(ChatArgs),

    /// Show stored conversations or the messages of one conversation
    History(HistoryArgs),

    /// Inspect stored content documents
    Doc(DocArgs),
}

/// Site and locale every command is scoped to
#[derive(clap::Args, Debug, Clone)]
pub struct SiteArgs {
    /// Site identifier
    #[arg(short, long)]
    pub site: String,

    /// Content locale
    #[arg(short, long, default_value = "en")]
    pub locale: String,
}

/// Arguments for the chat subcommand
#[derive(clap::Args, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Instruction for the assistant
    #[arg(short, long)]
    pub message: String,

    /// Continue an existing conversation
    #[arg(long)]
    pub conversation: Option<String>,

    /// Preview changes without saving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print progress events as JSON lines
    #[arg(long)]
    pub stream: bool,

    /// Actor recorded on content writes
    #[arg(long)]
    pub actor: Option<String>,

    /// Model to use
    #[arg(long)]
    pub model: Option<String>,

    /// LLM provider to use (anthropic, openai)
    #[arg(short, long)]
    pub provider: Option<String>,
}

/// Arguments for the history subcommand
#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Conversation to print; lists conversation ids when absent
    #[arg(long)]
    pub conversation: Option<String>,

    /// Maximum number of messages to print
    #[arg(long, default_value = "20")]
    pub limit: usize,
}

/// Arguments for the doc subcommand
#[derive(clap::Args, Debug)]
pub struct DocArgs {
    #[command(subcommand)]
    pub command: DocCommands,
}

/// Document subcommands
#[derive(Subcommand, Debug)]
pub enum DocCommands {
    /// Print one document
    Get {
        #[command(flatten)]
        site: SiteArgs,

        /// Logical document path (e.g. pages/home.json)
        path: String,
    },

    /// List documents under a prefix
    List {
        #[command(flatten)]
        site: SiteArgs,

        /// Path prefix (e.g. pages/)
        #[arg(default_value = "")]
        prefix: String,
    },
}

/// Output format options
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_command() {
        let cli = Cli::try_parse_from([
            "sitepilot", "chat", "--site", "s1", "--message", "Set the hero title",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.site.site, "s1");
                assert_eq!(args.site.locale, "en");
                assert_eq!(args.message, "Set the hero title");
                assert!(!args.dry_run);
                assert!(!args.stream);
            }
            other => panic!("expected chat, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_chat_flags() {
        let cli = Cli::try_parse_from([
            "sitepilot", "-vv", "chat", "-s", "s1", "-l", "fr", "-m", "hi", "--dry-run", "--stream",
            "--conversation", "c-1", "--actor", "ed@example.com",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Chat(args) = cli.command else {
            panic!("expected chat");
        };
        assert_eq!(args.site.locale, "fr");
        assert!(args.dry_run);
        assert!(args.stream);
        assert_eq!(args.conversation.as_deref(), Some("c-1"));
        assert_eq!(args.actor.as_deref(), Some("ed@example.com"));
    }

    #[test]
    fn test_chat_requires_message() {
        assert!(Cli::try_parse_from(["sitepilot", "chat", "--site", "s1"]).is_err());
    }

    #[test]
    fn test_parse_doc_list_default_prefix() {
        let cli = Cli::try_parse_from(["sitepilot", "doc", "list", "--site", "s1"]).unwrap();
        let Commands::Doc(DocArgs {
            command: DocCommands::List { prefix, .. },
        }) = cli.command
        else {
            panic!("expected doc list");
        };
        assert_eq!(prefix, "");
    }

    #[test]
    fn test_parse_format_json() {
        let cli = Cli::try_parse_from([
            "sitepilot", "--format", "json", "doc", "get", "--site", "s1", "pages/home.json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
