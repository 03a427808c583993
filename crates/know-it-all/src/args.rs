//! Command-line surface
//!
//! The clap command is generated from the parameter table. Each parameter
//! accepts zero or one value per occurrence, and occurrences are appended,
//! so a bare `-o` and a valued `--outfile x` on the same line are both
//! visible to the dispatch loop.

use anyhow::{bail, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;

use crate::error::KiaError;
use crate::params::PARAMS;

/// Written inside a value to stand for a single space
pub const SPACE_ESCAPE: &str = ":/s";

/// Build the clap command from the parameter table
pub fn command() -> Command {
    let mut cmd = Command::new("know-it-all")
        .about("Command-line record-store editor - a flat JSON collection of items and their attributes")
        .version(env!("CARGO_PKG_VERSION"))
        .disable_help_flag(true)
        .disable_version_flag(true)
        .after_help(
            "EXAMPLES:
    know-it-all -+ milk -k price,organic -v 1.20,true -t float,bool
    know-it-all -@ milk -r
    know-it-all -s milk
    know-it-all -@ [ALL] -k organic -p
    know-it-all -? k",
        );

    for spec in PARAMS {
        let mut arg = Arg::new(spec.canonical())
            .num_args(0..=1)
            .action(ArgAction::Append)
            .allow_negative_numbers(true)
            .help(spec.description);

        for name in spec.names {
            let mut chars = name.chars();
            arg = match (chars.next(), chars.next()) {
                (Some(short), None) => arg.short(short),
                _ => arg.long(*name),
            };
        }
        if let Some(placeholder) = spec.placeholder {
            arg = arg.value_name(placeholder);
        }

        cmd = cmd.arg(arg);
    }

    cmd
}

/// Replace every `:/s` with a space
pub fn unescape(value: &str) -> String {
    value.replace(SPACE_ESCAPE, " ")
}

/// Raw parse result keyed by canonical parameter name
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    flags: HashSet<String>,
    values: HashMap<String, String>,
}

impl ParsedArgs {
    /// Parse an argv (including the program name)
    pub fn parse_from<I, T>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match command().try_get_matches_from(argv) {
            Ok(matches) => Ok(Self::from_matches(&matches)),
            Err(e) => bail!(KiaError::Usage(e.to_string().trim_end().to_string())),
        }
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        let mut parsed = Self::default();

        for spec in PARAMS {
            let name = spec.canonical();
            let Some(occurrences) = matches.get_raw_occurrences(name) else {
                continue;
            };

            for occurrence in occurrences {
                match occurrence.into_iter().next() {
                    Some(raw) => {
                        let value = unescape(&raw.to_string_lossy());
                        parsed.values.entry(name.to_string()).or_insert(value);
                    }
                    None => {
                        parsed.flags.insert(name.to_string());
                    }
                }
            }
        }

        parsed
    }

    pub fn with_flag(mut self, name: &str) -> Self {
        self.flags.insert(name.to_string());
        self
    }

    pub fn with_value(mut self, name: &str, value: &str) -> Self {
        self.values
            .entry(name.to_string())
            .or_insert_with(|| unescape(value));
        self
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}
