//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "indexgate")]
#[command(about = "Manage index-gated channel access grants", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path of the index file (overrides INDEXGATE_INDEX_FILE)
    #[arg(long, global = true)]
    pub index_file: Option<PathBuf>,

    /// Length of generated indexes (overrides INDEXGATE_TOKEN_LENGTH)
    #[arg(long, global = true, value_parser = parse_token_length)]
    pub token_length: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue a new index for a channel/role pair
    ///
    /// Examples:
    ///   indexgate create --channel 1187000000000000001 --role 1187000000000000002
    ///   indexgate create --channel general --role access-general
    Create {
        /// Channel ID the index unlocks
        #[arg(long)]
        channel: String,

        /// Role ID that grants access to the channel
        #[arg(long)]
        role: String,
    },

    /// Resolve an index to its channel and role
    Lookup {
        /// Index to resolve (exact match)
        index: String,
    },

    /// List all issued indexes in creation order
    List,

    /// Print an index that is currently unused, without recording it
    Generate {
        /// Index length (defaults to the configured token length)
        #[arg(long, value_parser = parse_token_length)]
        length: Option<usize>,
    },
}

fn parse_token_length(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Invalid token length: {}. Must be a positive integer", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_length_flag() {
        let cli = Cli::try_parse_from(["indexgate", "generate", "--length", "16"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { length: Some(16) }));

        let cli = Cli::try_parse_from(["indexgate", "generate"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { length: None }));
    }

    #[test]
    fn test_generate_rejects_zero_length() {
        assert!(Cli::try_parse_from(["indexgate", "generate", "--length", "0"]).is_err());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["indexgate", "list", "--index-file", "/tmp/x.json", "--token-length", "12"])
            .unwrap();
        assert_eq!(cli.index_file, Some(PathBuf::from("/tmp/x.json")));
        assert_eq!(cli.token_length, Some(12));
    }
}
