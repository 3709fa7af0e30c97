//! CLI interface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "promptlib")]
#[command(version, about = "Store prompt templates and fill their {placeholders}", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "PROMPTLIB_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Prompt library file
    #[arg(short, long, value_name = "FILE", env = "PROMPTLIB_LIBRARY", global = true)]
    pub library: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List prompts in the library
    List {
        /// Only prompts in this category
        #[arg(long)]
        category: Option<String>,

        /// Only prompts whose title, category or content contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// List categories
    Categories,

    /// Show a prompt and its placeholders
    Show {
        title: String,
    },

    /// Add a prompt
    Add {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "General")]
        category: String,

        #[command(flatten)]
        content: ContentArgs,
    },

    /// Edit a prompt
    Edit {
        /// Title of the prompt to edit
        title: String,

        /// New title
        #[arg(long = "title")]
        new_title: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[command(flatten)]
        content: ContentArgs,
    },

    /// Remove a prompt
    Remove {
        title: String,
    },

    /// Add starter prompts to an empty library
    Init,

    /// Fill the placeholders of a prompt and copy the result
    Fill {
        title: String,

        #[command(flatten)]
        fill: FillArgs,

        /// Do not ask for values; placeholders without --set stay unfilled
        #[arg(long)]
        no_interactive: bool,

        /// Print the number of tokens of the filled prompt
        #[arg(long)]
        tokens: bool,

        /// Write the filled prompt to a file instead of the clipboard
        #[arg(short, long, value_name = "FILE", conflicts_with = "stdout")]
        output: Option<PathBuf>,

        /// Print the filled prompt instead of copying it
        #[arg(long)]
        stdout: bool,
    },

    /// Render a template given on the command line, in a file or on stdin
    Render {
        #[command(flatten)]
        content: ContentArgs,

        #[command(flatten)]
        fill: FillArgs,
    },
}

#[derive(Args, Debug, Default)]
pub struct ContentArgs {
    /// Template text
    #[arg(long, conflicts_with = "file")]
    pub content: Option<String>,

    /// Read the template from a file
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct FillArgs {
    /// Placeholder value as name=value, can be repeated
    #[arg(short, long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Fail if any placeholder is left unfilled
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn parses_fill_with_values() {
        let cli = Cli::try_parse_from([
            "promptlib", "fill", "Outreach", "--set", "tone=friendly", "-s", "client=Acme", "--no-interactive", "--stdout",
        ]).unwrap();
        match cli.command {
            Commands::Fill { title, fill, no_interactive, stdout, output, .. } => {
                assert_eq!(title, "Outreach");
                assert_eq!(fill.set, vec!["tone=friendly", "client=Acme"]);
                assert!(no_interactive);
                assert!(stdout);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn output_conflicts_with_stdout() {
        assert!(Cli::try_parse_from(["promptlib", "fill", "x", "--stdout", "--output", "out.txt"]).is_err());
    }

    #[test]
    fn content_conflicts_with_file() {
        assert!(Cli::try_parse_from(["promptlib", "add", "--title", "t", "--content", "c", "--file", "f"]).is_err());
    }

    #[test]
    fn parses_edit_rename() {
        let cli = Cli::try_parse_from(["promptlib", "edit", "Old", "--title", "New", "--category", "Sales"]).unwrap();
        match cli.command {
            Commands::Edit { title, new_title, category, .. } => {
                assert_eq!(title, "Old");
                assert_eq!(new_title.as_deref(), Some("New"));
                assert_eq!(category.as_deref(), Some("Sales"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn global_library_flag() {
        let cli = Cli::try_parse_from(["promptlib", "list", "--library", "/tmp/lib.json"]).unwrap();
        assert_eq!(cli.library.unwrap().to_str(), Some("/tmp/lib.json"));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
