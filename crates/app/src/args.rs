use std::fmt;
use std::path::PathBuf;

use paper_core::model::{BankId, Points, ReviewUpdate};
use services::papers::GroupRef;
use services::{PaperMode, PaperRequest, PracticeRequest, TitlePageRequest};

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    InvalidBankId { raw: String },
    InvalidPoints { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidSelection { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "missing command"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidBankId { raw } => write!(f, "invalid --bank value: {raw}"),
            ArgsError::InvalidPoints { raw } => {
                write!(f, "Please enter a valid number of points. (got {raw})")
            }
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidSelection { raw } => {
                write!(f, "invalid --group value: {raw} (expected topic|index)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  paper banks");
    eprintln!("  paper topics        [--bank <id>]");
    eprintln!("  paper groups        [--bank <id>] <topic>");
    eprintln!("  paper generate      [--bank <id>] --topic <name>... [--points <n>] [--seed <n>]");
    eprintln!("                      [--exclude-unrelated] [--group <topic|index>...]");
    eprintln!("                      [--title-page] [--title <s>] [--subtitle <s>] [--date <s>] [--notes <s>]");
    eprintln!("  paper search        [--bank <id>] <term>");
    eprintln!("  paper practice      [--bank <id>] [--topic <name>] [--count <n>] [--seed <n>]");
    eprintln!("  paper review-groups [--bank <id>]");
    eprintln!("  paper review-status [--bank <id>]");
    eprintln!("  paper review-set    [--bank <id>] --key <key> [--status <s>] [--notes <s>]");
    eprintln!("                      [--topic <name>] [--group-id <id>] [--label <s>] [--group-index <n>]");
    eprintln!("  paper note          [--bank <id>] <text>...");
    eprintln!("  paper notes         [--bank <id>]");
    eprintln!("  paper check-images");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --data-dir <path>   directory holding one folder per bank");
    eprintln!("  --db <sqlite_url>   review and note database");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PAPER_DATA_DIR, PAPER_DB_URL, PAPER_BANKS_FILE, RUST_LOG");
}

/// Options accepted by every command.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    pub data_dir: Option<PathBuf>,
    pub db_url: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Banks,
    Topics { bank: Option<BankId> },
    Groups { bank: Option<BankId>, topic: String },
    Generate { bank: Option<BankId>, request: PaperRequest },
    Search { bank: Option<BankId>, term: String },
    Practice { bank: Option<BankId>, request: PracticeRequest },
    ReviewGroups { bank: Option<BankId> },
    ReviewStatus { bank: Option<BankId> },
    ReviewSet { bank: Option<BankId>, update: ReviewUpdate },
    Note { bank: Option<BankId>, text: String },
    Notes { bank: Option<BankId> },
    CheckImages,
    Help,
}

#[derive(Debug, PartialEq)]
pub struct Invocation {
    pub global: GlobalArgs,
    pub command: Command,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

/// Flags shared by all commands plus `--bank`.
#[derive(Default)]
struct Common {
    global: GlobalArgs,
    bank: Option<BankId>,
    positionals: Vec<String>,
}

impl Common {
    /// Consume `arg` if it is a shared flag or a positional argument.
    /// Returns the argument back when the command must handle it.
    fn take(
        &mut self,
        arg: String,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Option<String>, ArgsError> {
        match arg.as_str() {
            "--data-dir" => {
                self.global.data_dir = Some(PathBuf::from(require_value(args, "--data-dir")?));
            }
            "--db" => {
                let value = require_value(args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                self.global.db_url = Some(value);
            }
            "--bank" => {
                let value = require_value(args, "--bank")?;
                let bank = BankId::new(value.trim())
                    .map_err(|_| ArgsError::InvalidBankId { raw: value.clone() })?;
                self.bank = Some(bank);
            }
            _ if arg.starts_with("--") => return Ok(Some(arg)),
            _ => self.positionals.push(arg),
        }
        Ok(None)
    }

    fn no_positionals(&self) -> Result<(), ArgsError> {
        match self.positionals.first() {
            Some(extra) => Err(ArgsError::UnknownArg(extra.clone())),
            None => Ok(()),
        }
    }

    fn single_positional(&mut self, name: &'static str) -> Result<String, ArgsError> {
        if self.positionals.len() > 1 {
            return Err(ArgsError::UnknownArg(self.positionals[1].clone()));
        }
        self.positionals
            .pop()
            .ok_or(ArgsError::MissingArgument { name })
    }
}

/// Parse a command line (without the program name).
///
/// # Errors
///
/// Returns `ArgsError` for unknown commands, unknown flags and bad values.
pub fn parse(argv: Vec<String>) -> Result<Invocation, ArgsError> {
    let mut args = argv.into_iter();
    let name = args.next().ok_or(ArgsError::MissingCommand)?;
    let mut common = Common::default();

    let command = match name.as_str() {
        "--help" | "-h" | "help" => Command::Help,
        "banks" => {
            parse_plain(&mut common, &mut args)?;
            Command::Banks
        }
        "check-images" => {
            parse_plain(&mut common, &mut args)?;
            Command::CheckImages
        }
        "topics" => {
            parse_plain(&mut common, &mut args)?;
            Command::Topics { bank: common.bank.take() }
        }
        "review-groups" => {
            parse_plain(&mut common, &mut args)?;
            Command::ReviewGroups { bank: common.bank.take() }
        }
        "review-status" => {
            parse_plain(&mut common, &mut args)?;
            Command::ReviewStatus { bank: common.bank.take() }
        }
        "notes" => {
            parse_plain(&mut common, &mut args)?;
            Command::Notes { bank: common.bank.take() }
        }
        "groups" => {
            parse_only_common(&mut common, &mut args)?;
            Command::Groups {
                topic: common.single_positional("topic")?,
                bank: common.bank.take(),
            }
        }
        "search" => {
            parse_only_common(&mut common, &mut args)?;
            Command::Search {
                term: common.single_positional("term")?,
                bank: common.bank.take(),
            }
        }
        "note" => {
            parse_only_common(&mut common, &mut args)?;
            if common.positionals.is_empty() {
                return Err(ArgsError::MissingArgument { name: "text" });
            }
            Command::Note {
                text: common.positionals.join(" "),
                bank: common.bank.take(),
            }
        }
        "generate" => {
            let request = parse_generate(&mut common, &mut args)?;
            Command::Generate {
                bank: common.bank.take(),
                request,
            }
        }
        "practice" => {
            let request = parse_practice(&mut common, &mut args)?;
            Command::Practice {
                bank: common.bank.take(),
                request,
            }
        }
        "review-set" => {
            let update = parse_review_set(&mut common, &mut args)?;
            Command::ReviewSet {
                bank: common.bank.take(),
                update,
            }
        }
        _ => return Err(ArgsError::UnknownCommand(name)),
    };

    Ok(Invocation {
        global: common.global,
        command,
    })
}

fn parse_only_common(
    common: &mut Common,
    args: &mut impl Iterator<Item = String>,
) -> Result<(), ArgsError> {
    while let Some(arg) = args.next() {
        if let Some(unknown) = common.take(arg, args)? {
            return Err(ArgsError::UnknownArg(unknown));
        }
    }
    Ok(())
}

fn parse_plain(common: &mut Common, args: &mut impl Iterator<Item = String>) -> Result<(), ArgsError> {
    parse_only_common(common, args)?;
    common.no_positionals()
}

fn parse_generate(
    common: &mut Common,
    args: &mut impl Iterator<Item = String>,
) -> Result<PaperRequest, ArgsError> {
    let mut topics = Vec::new();
    let mut target_points = Points::ZERO;
    let mut seed = None;
    let mut exclude_unrelated = false;
    let mut selections: Vec<GroupRef> = Vec::new();
    let mut title_page: Option<TitlePageRequest> = None;

    while let Some(arg) = args.next() {
        let Some(flag) = common.take(arg, args)? else {
            continue;
        };
        match flag.as_str() {
            "--topic" => topics.push(require_value(args, "--topic")?),
            "--points" => {
                let raw = require_value(args, "--points")?;
                target_points = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(|value| Points::new(value).ok())
                    .ok_or(ArgsError::InvalidPoints { raw })?;
            }
            "--seed" => seed = Some(parse_number("--seed", require_value(args, "--seed")?)?),
            "--exclude-unrelated" => exclude_unrelated = true,
            "--group" => {
                let raw = require_value(args, "--group")?;
                let selection = raw
                    .parse::<GroupRef>()
                    .map_err(|_| ArgsError::InvalidSelection { raw: raw.clone() })?;
                selections.push(selection);
            }
            "--title-page" => {
                title_page.get_or_insert_with(TitlePageRequest::default);
            }
            "--title" => {
                title_page.get_or_insert_with(TitlePageRequest::default).title =
                    Some(require_value(args, "--title")?);
            }
            "--subtitle" => {
                title_page.get_or_insert_with(TitlePageRequest::default).subtitle =
                    Some(require_value(args, "--subtitle")?);
            }
            "--date" => {
                title_page.get_or_insert_with(TitlePageRequest::default).date =
                    Some(require_value(args, "--date")?);
            }
            "--notes" => {
                title_page.get_or_insert_with(TitlePageRequest::default).notes =
                    Some(require_value(args, "--notes")?);
            }
            _ => return Err(ArgsError::UnknownArg(flag)),
        }
    }
    common.no_positionals()?;

    let mode = if selections.is_empty() {
        PaperMode::Automatic {
            target_points,
            exclude_unrelated,
            seed,
        }
    } else {
        PaperMode::Custom { selections }
    };

    Ok(PaperRequest {
        topics,
        mode,
        title_page,
    })
}

fn parse_practice(
    common: &mut Common,
    args: &mut impl Iterator<Item = String>,
) -> Result<PracticeRequest, ArgsError> {
    let mut request = PracticeRequest::default();
    while let Some(arg) = args.next() {
        let Some(flag) = common.take(arg, args)? else {
            continue;
        };
        match flag.as_str() {
            "--topic" => request.topic = Some(require_value(args, "--topic")?),
            "--count" => {
                request.count = Some(parse_number("--count", require_value(args, "--count")?)?);
            }
            "--seed" => request.seed = Some(parse_number("--seed", require_value(args, "--seed")?)?),
            _ => return Err(ArgsError::UnknownArg(flag)),
        }
    }
    common.no_positionals()?;
    Ok(request)
}

fn parse_review_set(
    common: &mut Common,
    args: &mut impl Iterator<Item = String>,
) -> Result<ReviewUpdate, ArgsError> {
    let mut update = ReviewUpdate::default();
    while let Some(arg) = args.next() {
        let Some(flag) = common.take(arg, args)? else {
            continue;
        };
        match flag.as_str() {
            "--key" => update.key = require_value(args, "--key")?,
            "--status" => update.status = Some(require_value(args, "--status")?),
            "--notes" => update.notes = Some(require_value(args, "--notes")?),
            "--topic" => update.topic = Some(require_value(args, "--topic")?),
            "--group-id" => update.group_id = Some(require_value(args, "--group-id")?),
            "--label" => update.label = Some(require_value(args, "--label")?),
            "--group-index" => {
                update.group_index = Some(parse_number(
                    "--group-index",
                    require_value(args, "--group-index")?,
                )?);
            }
            _ => return Err(ArgsError::UnknownArg(flag)),
        }
    }
    common.no_positionals()?;
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn parses_global_flags_anywhere() {
        let inv = parse(argv("topics --data-dir /srv --bank CSAS --db sqlite::memory:")).unwrap();
        assert_eq!(inv.global.data_dir, Some(PathBuf::from("/srv")));
        assert_eq!(inv.global.db_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(
            inv.command,
            Command::Topics {
                bank: Some(BankId::new("CSAS").unwrap())
            }
        );
    }

    #[test]
    fn parses_automatic_generate() {
        let inv = parse(argv(
            "generate --topic Recursion --topic SQL --points 40 --seed 7 --exclude-unrelated --subtitle Mock",
        ))
        .unwrap();
        let Command::Generate { bank, request } = inv.command else {
            panic!("expected generate");
        };
        assert!(bank.is_none());
        assert_eq!(request.topics, vec!["Recursion", "SQL"]);
        assert_eq!(
            request.mode,
            PaperMode::Automatic {
                target_points: Points::from(40),
                exclude_unrelated: true,
                seed: Some(7),
            }
        );
        assert_eq!(request.title_page.unwrap().subtitle.as_deref(), Some("Mock"));
    }

    #[test]
    fn group_flags_switch_to_custom_mode() {
        let inv = parse(argv("generate --topic SQL --group SQL|2 --group SQL|0")).unwrap();
        let Command::Generate { request, .. } = inv.command else {
            panic!("expected generate");
        };
        let PaperMode::Custom { selections } = request.mode else {
            panic!("expected custom mode");
        };
        assert_eq!(selections.len(), 2);
        assert_eq!(selections[0].index, 2);
        assert!(request.title_page.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(parse(vec![]), Err(ArgsError::MissingCommand));
        assert_eq!(
            parse(argv("generate --points lots")),
            Err(ArgsError::InvalidPoints { raw: "lots".into() })
        );
        assert_eq!(
            parse(argv("generate --group SQL")),
            Err(ArgsError::InvalidSelection { raw: "SQL".into() })
        );
        assert_eq!(
            parse(argv("search")),
            Err(ArgsError::MissingArgument { name: "term" })
        );
        assert_eq!(
            parse(argv("banks --verbose")),
            Err(ArgsError::UnknownArg("--verbose".into()))
        );
        assert_eq!(
            parse(argv("practice --count")),
            Err(ArgsError::MissingValue { flag: "--count" })
        );
        assert!(matches!(parse(argv("frobnicate")), Err(ArgsError::UnknownCommand(_))));
    }

    #[test]
    fn parse_errors_surface_once_through_run() {
        let err = parse(argv("generate --points lots")).unwrap_err();
        let expected = err.to_string();
        let boxed: Box<dyn std::error::Error> = err.into();
        assert_eq!(boxed.to_string(), expected);
        assert!(!expected.contains('\n'));
    }

    #[test]
    fn note_joins_words_and_review_set_reads_fields() {
        let inv = parse(argv("note --bank PHAS image is cropped")).unwrap();
        assert_eq!(
            inv.command,
            Command::Note {
                bank: Some(BankId::new("PHAS").unwrap()),
                text: "image is cropped".into()
            }
        );

        let inv = parse(argv("review-set --key SQL|1 --status ok --group-index 1")).unwrap();
        let Command::ReviewSet { update, .. } = inv.command else {
            panic!("expected review-set");
        };
        assert_eq!(update.key, "SQL|1");
        assert_eq!(update.status.as_deref(), Some("ok"));
        assert_eq!(update.group_index, Some(1));
    }
}
