//! Command-line surface

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lexgen_core::{PipelineError, Tier};
use std::path::PathBuf;
use std::str::FromStr;

/// Parsed invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    pub(crate) config: Option<PathBuf>,
    pub(crate) log_json: bool,
    pub(crate) action: Action,
}

/// What to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Word { letter: String, enriched: bool },
    Question { tier: Tier },
    Topic { topic: String },
    Validate { word: String },
    Translate { word: String },
    Profiles,
}

pub(crate) fn command() -> Command {
    Command::new("lexgen")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate validated, unique vocabulary words and quiz questions")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("word")
                .about("Generate a word starting with a letter")
                .arg(
                    Arg::new("letter")
                        .long("letter")
                        .required(true)
                        .help("Starting letter"),
                )
                .arg(
                    Arg::new("enriched")
                        .long("enriched")
                        .action(ArgAction::SetTrue)
                        .help("Include the definition and its translation"),
                ),
        )
        .subcommand(
            Command::new("question")
                .about("Generate a multiple-choice synonym question")
                .arg(
                    Arg::new("tier")
                        .long("tier")
                        .required(true)
                        .value_parser(["easy", "medium", "hard"])
                        .help("Difficulty tier"),
                ),
        )
        .subcommand(
            Command::new("topic")
                .about("Generate a vocabulary word related to a topic")
                .arg(
                    Arg::new("topic")
                        .long("topic")
                        .required(true)
                        .help("Topic text"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a word against the dictionary")
                .arg(Arg::new("word").long("word").required(true).help("Word to check")),
        )
        .subcommand(
            Command::new("translate")
                .about("Translate a word into the target language")
                .arg(
                    Arg::new("word")
                        .long("word")
                        .required(true)
                        .help("Word to translate"),
                ),
        )
        .subcommand(Command::new("profiles").about("Print the effective profile table"))
}

pub(crate) fn parse(matches: &ArgMatches) -> Result<Invocation, PipelineError> {
    let string = |args: &ArgMatches, id: &str| {
        args.get_one::<String>(id).cloned().ok_or_else(|| {
            PipelineError::InvalidRequest(format!("missing --{id}"))
        })
    };

    let action = match matches.subcommand() {
        Some(("word", args)) => Action::Word {
            letter: string(args, "letter")?,
            enriched: args.get_flag("enriched"),
        },
        Some(("question", args)) => Action::Question {
            tier: Tier::from_str(&string(args, "tier")?)
                .map_err(|e| PipelineError::InvalidRequest(e.to_string()))?,
        },
        Some(("topic", args)) => Action::Topic {
            topic: string(args, "topic")?,
        },
        Some(("validate", args)) => Action::Validate {
            word: string(args, "word")?,
        },
        Some(("translate", args)) => Action::Translate {
            word: string(args, "word")?,
        },
        Some(("profiles", _)) => Action::Profiles,
        _ => {
            return Err(PipelineError::InvalidRequest(
                "unknown command".to_string(),
            ));
        }
    };

    Ok(Invocation {
        config: matches.get_one::<PathBuf>("config").cloned(),
        log_json: matches.get_flag("log-json"),
        action,
    })
}

/// Exactly one character
pub(crate) fn single_letter(text: &str) -> Result<char, PipelineError> {
    let mut chars = text.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => Ok(letter),
        _ => Err(PipelineError::InvalidRequest(format!(
            "expected a single letter, got {text:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn invocation(args: &[&str]) -> Invocation {
        let matches = command().try_get_matches_from(args).unwrap();
        parse(&matches).unwrap()
    }

    #[test]
    fn word_with_flags() {
        let parsed = invocation(&["lexgen", "--log-json", "word", "--letter", "b", "--enriched"]);
        assert_eq!(
            parsed,
            Invocation {
                config: None,
                log_json: true,
                action: Action::Word {
                    letter: "b".to_string(),
                    enriched: true,
                },
            }
        );
    }

    #[test]
    fn global_config_after_subcommand() {
        let parsed = invocation(&[
            "lexgen",
            "question",
            "--tier",
            "hard",
            "--config",
            "lexgen.toml",
        ]);
        assert_eq!(parsed.config, Some(PathBuf::from("lexgen.toml")));
        assert_eq!(parsed.action, Action::Question { tier: Tier::Hard });
    }

    #[test]
    fn unknown_tier_rejected_by_parser() {
        assert!(command()
            .try_get_matches_from(["lexgen", "question", "--tier", "extreme"])
            .is_err());
    }

    #[test]
    fn subcommand_required() {
        assert!(command().try_get_matches_from(["lexgen"]).is_err());
    }

    #[test]
    fn single_letter_checks_length() {
        assert_eq!(single_letter(" q ").unwrap(), 'q');
        assert!(single_letter("ab").is_err());
        assert!(single_letter("").is_err());
    }

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }
}
