//! CLI tool for zipsession archive operations.

mod commands;
mod exit_codes;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Edit zip archives entry by entry
#[derive(Parser)]
#[command(name = "zipsession")]
#[command(author, version, about = "Edit zip archives entry by entry", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// List archive contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Show packed size, method and CRC
        #[arg(long)]
        technical: bool,
    },

    /// Write an entry's content to stdout
    Cat {
        /// Archive file to read
        archive: PathBuf,

        /// Entry name
        entry: String,
    },

    /// Add or replace an entry (alias: a)
    #[command(alias = "a")]
    Put {
        /// Archive file to modify
        archive: PathBuf,

        /// Entry name
        entry: String,

        /// File to read the content from, or `-` for stdin
        source: PathBuf,

        /// Create the archive if it does not exist
        #[arg(long)]
        create: bool,

        /// Compression level (0-9, 0 stores)
        #[arg(short = 'l', long, default_value = "6", env = "ZIPSESSION_LEVEL")]
        level: u32,
    },

    /// Remove an entry (alias: d)
    #[command(alias = "d")]
    Rm {
        /// Archive file to modify
        archive: PathBuf,

        /// Entry name
        entry: String,
    },

    /// Add an empty directory marker
    Mkdir {
        /// Archive file to modify
        archive: PathBuf,

        /// Directory name
        dir: String,

        /// Create the archive if it does not exist
        #[arg(long)]
        create: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                exit_codes::BAD_ARGS
            } else {
                exit_codes::SUCCESS
            };
            std::process::exit(code);
        }
    };

    let exit_code = match cli.command {
        Commands::List { archive, technical } => commands::list(&archive, technical, cli.format),

        Commands::Cat { archive, entry } => commands::cat(&archive, &entry),

        Commands::Put {
            archive,
            entry,
            source,
            create,
            level,
        } => commands::put(&commands::PutConfig {
            archive_path: &archive,
            entry: &entry,
            source: &source,
            create,
            level,
        }),

        Commands::Rm { archive, entry } => commands::rm(&archive, &entry),

        Commands::Mkdir {
            archive,
            dir,
            create,
        } => commands::mkdir(&archive, &dir, create),
    };

    std::process::exit(exit_code.code());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_put() {
        let cli = Cli::try_parse_from([
            "zipsession", "put", "a.zip", "x.txt", "-", "--create", "-l", "9",
        ])
        .unwrap();
        match cli.command {
            Commands::Put { create, level, .. } => {
                assert!(create);
                assert_eq!(level, 9);
            }
            _ => panic!("expected put"),
        }
    }
}
