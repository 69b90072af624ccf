//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// In-memory forest with a scratch-then-apply staging workflow
#[derive(Parser, Debug)]
#[command(name = "stagetree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath, env = "STAGETREE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the demonstration seed tree
    Seed {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a staging session (commands from a script or stdin)
    Session {
        /// Script file, one command per line ("-" or omitted: stdin)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        script: Option<PathBuf>,
        /// Print views as JSON
        #[arg(long)]
        json: bool,
        /// Stop at the first failing command
        #[arg(long)]
        strict: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create global config template
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn given_session_args_when_parsing_then_flags_are_set() {
        let cli = Cli::try_parse_from(["stagetree", "-dd", "session", "--strict", "-s", "run.txt"])
            .unwrap();
        assert_eq!(cli.debug, 2);
        match cli.command {
            Some(Commands::Session {
                script,
                json,
                strict,
            }) => {
                assert_eq!(script, Some(PathBuf::from("run.txt")));
                assert!(!json);
                assert!(strict);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
