mod file;
mod labels;
mod present;

use std::io;
use std::path::{Path, PathBuf};

use brackets_core::{
    match_list, render_layout, validate, AdvancePolicy, Bracket, BuildOptions, CompetitorId,
    Competitors, MatchId, RenderOptions,
};
use clap::{Parser, Subcommand};
use thiserror::Error;

use labels::Labels;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Path to the bracket file.
    #[arg(short, long, default_value = "bracket.json")]
    file: PathBuf,
    /// Path to a JSON file overriding the default labels.
    #[arg(short, long)]
    labels: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Creates a new bracket, overwriting the bracket file.
    New {
        /// Accept any number of competitors between 2 and 256, filling up with byes.
        #[arg(long)]
        byes: bool,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Prints the bracket.
    Show {
        /// Include the actions available for every match.
        #[arg(long)]
        edit: bool,
        /// Render byes like any other match.
        #[arg(long)]
        hide_byes: bool,
    },
    /// Reports the winner of a match.
    Advance {
        match_id: MatchId,
        winner: u64,
        /// Allow changing the winner of a decided match.
        #[arg(long)]
        replace: bool,
    },
    /// Removes the reported winner of a match.
    Clear { match_id: MatchId },
    /// Prints the outcome of every match.
    Matches,
}

impl Command {
    pub fn run(self, path: &Path, labels: &Labels) -> Result<(), Error> {
        match self {
            Self::New { byes, names } => {
                if byes {
                    validate::unique_names(&names)?;
                } else {
                    validate::validate(&names)?;
                }

                let bracket =
                    Bracket::new_with_options(Competitors::from_names(names), BuildOptions { byes })?;
                file::save(path, &bracket)?;

                print_bracket(&bracket, labels, RenderOptions::default());
            }
            Self::Show { edit, hide_byes } => {
                let bracket = file::load(path)?;

                print_bracket(
                    &bracket,
                    labels,
                    RenderOptions {
                        can_edit: edit,
                        show_byes: !hide_byes,
                        ..Default::default()
                    },
                );
            }
            Self::Advance {
                match_id,
                winner,
                replace,
            } => {
                let mut bracket = file::load(path)?;

                let policy = if replace {
                    AdvancePolicy::Replace
                } else {
                    AdvancePolicy::Reject
                };

                bracket.advance_with_policy(match_id, CompetitorId(winner), policy)?;
                file::save(path, &bracket)?;

                print_bracket(&bracket, labels, RenderOptions::default());
            }
            Self::Clear { match_id } => {
                let mut bracket = file::load(path)?;

                bracket.clear(match_id)?;
                file::save(path, &bracket)?;

                print_bracket(&bracket, labels, RenderOptions::default());
            }
            Self::Matches => {
                let bracket = file::load(path)?;

                print!("{}", present::matches(&match_list(&bracket), labels));
            }
        }

        Ok(())
    }
}

fn print_bracket(bracket: &Bracket, labels: &Labels, options: RenderOptions) {
    print!("{}", present::bracket(&render_layout(bracket, &options), labels));
}

fn main() {
    pretty_env_logger::init();

    let args = Args::parse();

    let labels = match &args.labels {
        Some(path) => match Labels::from_file(path) {
            Ok(labels) => labels,
            Err(err) => {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        },
        None => Labels::default(),
    };

    if let Err(err) = args.command.run(&args.file, &labels) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Bracket(#[from] brackets_core::Error),
}

#[cfg(test)]
mod tests {
    use super::{Command, Error};
    use crate::file;
    use crate::labels::Labels;

    use brackets_core::CompetitorId;

    #[test]
    fn test_command_run() {
        let path = file::tests::temp_path("command");
        let labels = Labels::default();

        Command::New {
            byes: false,
            names: ["A", "B", "C", "D"].map(String::from).to_vec(),
        }
        .run(&path, &labels)
        .unwrap();

        Command::Advance {
            match_id: 0,
            winner: 1,
            replace: false,
        }
        .run(&path, &labels)
        .unwrap();

        let bracket = file::load(&path).unwrap();
        assert_eq!(bracket.matches()[2].one_id, Some(CompetitorId(1)));

        let err = Command::Advance {
            match_id: 0,
            winner: 0,
            replace: false,
        }
        .run(&path, &labels)
        .unwrap_err();
        assert!(matches!(err, Error::Bracket(_)));

        Command::Advance {
            match_id: 0,
            winner: 0,
            replace: true,
        }
        .run(&path, &labels)
        .unwrap();

        let bracket = file::load(&path).unwrap();
        assert_eq!(bracket.matches()[2].one_id, Some(CompetitorId(0)));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_command_new_invalid() {
        let path = file::tests::temp_path("invalid");
        let labels = Labels::default();

        let err = Command::New {
            byes: false,
            names: ["A", "B", "C"].map(String::from).to_vec(),
        }
        .run(&path, &labels)
        .unwrap_err();
        assert!(matches!(err, Error::Bracket(_)));
        assert!(!path.exists());

        Command::New {
            byes: true,
            names: ["A", "B", "C"].map(String::from).to_vec(),
        }
        .run(&path, &labels)
        .unwrap();

        let bracket = file::load(&path).unwrap();
        assert!(bracket.matches()[1].is_bye());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_command_missing_file() {
        let path = file::tests::temp_path("missing");

        let err = Command::Matches.run(&path, &Labels::default()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
