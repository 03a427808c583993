//! Invocation context
//!
//! A [`Session`] is created once per run and handed by reference to every
//! handler. It owns the parameter registry, the configuration and the output
//! sink, and it is the only way handlers reach each other's values.
//!
//! Resolution is lazy. Asking for a parameter that was passed but whose
//! handler has not run yet runs that handler first, so a handler never
//! depends on where its inputs sit in the registry order.

use anyhow::{Context, Result};
use colored::{Color, Colorize};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, trace};

use crate::args::ParsedArgs;
use crate::config::Config;
use crate::error::KiaError;
use crate::handlers::{self, Flow};
use crate::params::{ParamId, Presence, Registry};
use crate::store::{Selector, Store};
use crate::value::ValueType;

/// Resolved value of a flag parameter that was passed
pub const FLAG_SET: &str = "set";

/// How a piece of output is painted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Success,
    Warning,
    Fatal,
    Status,
    Muted,
    Heading,
    Identifier,
    Key,
    Value,
    Highlight,
}

pub struct Session<W: Write> {
    registry: Registry,
    config: Config,
    out: W,
}

/// Split a comma separated list; the empty string is the empty list
pub fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(',').map(str::to_string).collect()
    }
}

impl<W: Write> Session<W> {
    pub fn new(args: &ParsedArgs, config: Config, out: W) -> Self {
        Self {
            registry: Registry::new(args),
            config,
            out,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run a parameter's handler with the value it was passed
    pub fn invoke(&mut self, id: ParamId) -> Result<Flow> {
        let spec = id.spec();
        self.registry.mark_invoked(id);

        let value = match self.registry.presence(id).clone() {
            Presence::Value(value) => Some(value),
            Presence::Flag => None,
            Presence::MissingArgument => {
                return Err(KiaError::MissingArgument(spec.prettify("'/'")).into())
            }
            Presence::PassedTwice => {
                return Err(KiaError::PassedTwice(spec.prettify("'/'")).into())
            }
            Presence::Absent => return Ok(Flow::Continue),
        };

        debug!("Invoking {} with {:?}", spec.prettify("/"), value);
        handlers::run(self, id, value.as_deref())
            .with_context(|| spec.prettify("/"))
    }

    /// Resolved value of another parameter, running its handler first if it
    /// was passed but has not been handled yet.
    pub fn resolve(&mut self, id: ParamId, required: bool) -> Result<Option<String>> {
        if self.registry.is_pending(id) {
            trace!("Resolving {} lazily", id.canonical());
            self.invoke(id)?;
        }

        match self.registry.resolved(id) {
            Some(value) => Ok(Some(value.to_string())),
            None if required => Err(KiaError::NotSet(id.canonical()).into()),
            None => Ok(None),
        }
    }

    /// Bind a value for any parameter
    pub fn bind(&mut self, id: ParamId, value: impl Into<String>) {
        self.registry.bind(id, value);
    }

    /// A flag that was passed resolves to set. Conflicts on the flag itself
    /// surface here when it is resolved before its own turn.
    fn flag_set(&mut self, id: ParamId) -> Result<bool> {
        Ok(self.resolve(id, false)?.is_some())
    }

    pub fn verbose(&mut self) -> Result<bool> {
        self.flag_set(ParamId::Verbose)
    }

    pub fn force(&mut self) -> Result<bool> {
        self.flag_set(ParamId::Force)
    }

    pub fn colour(&mut self) -> Result<bool> {
        Ok(!self.flag_set(ParamId::Colourless)?)
    }

    /// Store path: the outfile if one was given, otherwise the configured
    /// default, which must exist. A pending decrypt runs first since it
    /// replaces the outfile with its plaintext.
    pub fn outfile_path(&mut self) -> Result<PathBuf> {
        if self.registry.is_pending(ParamId::Decrypt) {
            trace!("Running decrypt before reading the outfile");
            self.invoke(ParamId::Decrypt)?;
        }

        if let Some(path) = self.resolve(ParamId::Outfile, false)? {
            return Ok(PathBuf::from(path));
        }

        let fallback = self.config.store_path.clone();
        self.warning(&format!(
            "{}: No outfile provided, defaulting to '{}'.",
            ParamId::Outfile.spec().prettify("/"),
            fallback.display()
        ))?;

        if !fallback.exists() {
            return Err(KiaError::OutfileMissing(fallback).into());
        }

        self.bind(ParamId::Outfile, fallback.to_string_lossy());
        Ok(fallback)
    }

    pub fn open_store(&mut self) -> Result<Store> {
        let path = self.outfile_path()?;
        Store::open(&path)
    }

    pub fn item_selector(&mut self, required: bool) -> Result<Option<Selector>> {
        Ok(self
            .resolve(ParamId::Item, required)?
            .map(|raw| Selector::parse(&raw)))
    }

    pub fn key_list(&mut self) -> Result<Vec<String>> {
        let raw = self.resolve(ParamId::Key, true)?.unwrap_or_default();
        Ok(split_list(&raw))
    }

    pub fn type_list(&mut self) -> Result<Vec<ValueType>> {
        let raw = self.resolve(ParamId::Type, false)?.unwrap_or_default();
        split_list(&raw).iter().map(|t| ValueType::parse(t)).collect()
    }

    /// Apply the force policy: an error is returned unchanged unless force
    /// mode is on, in which case it is reported and swallowed.
    pub fn recover(&mut self, err: anyhow::Error) -> Result<()> {
        if self.force()? {
            debug!("Continuing past error in force mode: {:#}", err);
            self.report_fatal(&err)?;
            Ok(())
        } else {
            Err(err)
        }
    }

    pub fn paint(&mut self, text: &str, style: Style) -> Result<String> {
        if !self.colour()? {
            return Ok(text.to_string());
        }

        let painted = match style {
            Style::Success => text.bright_green(),
            Style::Warning => text.yellow(),
            Style::Fatal => text.bright_red(),
            Style::Status => text.color(Color::White).dimmed(),
            Style::Muted => text.bright_black(),
            Style::Heading => text.magenta().underline(),
            Style::Identifier => text.yellow().bold(),
            Style::Key => text.cyan().italic(),
            Style::Value => text.yellow(),
            Style::Highlight => text.yellow().reversed(),
        };
        Ok(painted.to_string())
    }

    fn status_line(&mut self, message: &str, style: Style, status: &str) -> Result<()> {
        let message = self.paint(message, style)?;
        let status = self.paint(status, Style::Status)?;
        writeln!(self.out, "{} [{}]", message, status).context("Failed to write output")
    }

    pub fn success(&mut self, message: &str) -> Result<()> {
        self.status_line(message, Style::Success, "0")
    }

    /// Only shown in verbose mode
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if !self.verbose()? {
            return Ok(());
        }
        self.status_line(message, Style::Warning, "0.5")
    }

    pub fn report_fatal(&mut self, err: &anyhow::Error) -> Result<()> {
        self.status_line(&format!("{:#}", err), Style::Fatal, "1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn session(args: ParsedArgs, tmp: &TempDir) -> Session<Vec<u8>> {
        let config = Config {
            store_path: tmp.path().join("database.json"),
            encrypted_path: tmp.path().join("encrypted.kia"),
            decrypted_path: tmp.path().join("decrypted.json"),
        };
        Session::new(&args.with_flag("c"), config, Vec::new())
    }

    fn output(session: Session<Vec<u8>>) -> String {
        String::from_utf8(session.into_output()).unwrap()
    }

    #[test]
    fn test_split_list() {
        assert!(split_list("").is_empty());
        assert_eq!(split_list("a"), vec!["a"]);
        assert_eq!(split_list("a,,b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_required_resolution() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(ParsedArgs::default(), &tmp);

        assert_eq!(session.resolve(ParamId::Key, false)?, None);
        let err = session.resolve(ParamId::Key, true).unwrap_err();
        assert_eq!(err.downcast_ref::<KiaError>(), Some(&KiaError::NotSet("k")));
        Ok(())
    }

    #[test]
    fn test_lazy_resolution_runs_handler_once() -> Result<()> {
        let tmp = TempDir::new()?;
        let args = ParsedArgs::default().with_value("k", "a,b").with_value("t", "int,bool");
        let mut session = session(args, &tmp);

        assert!(session.registry().is_pending(ParamId::Key));
        assert_eq!(session.key_list()?, vec!["a", "b"]);
        assert!(session.registry().is_invoked(ParamId::Key));
        assert_eq!(
            session.type_list()?,
            vec![ValueType::Integer, ValueType::Boolean]
        );
        Ok(())
    }

    #[test]
    fn test_outfile_fallback() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(ParsedArgs::default().with_flag("V"), &tmp);

        let err = session.outfile_path().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KiaError>(),
            Some(KiaError::OutfileMissing(_))
        ));

        fs::write(tmp.path().join("database.json"), "[]")?;
        assert_eq!(session.outfile_path()?, tmp.path().join("database.json"));
        assert!(session.registry().resolved(ParamId::Outfile).is_some());

        let out = output(session);
        assert!(out.contains("No outfile provided, defaulting to"));
        assert!(out.contains("[0.5]"));
        Ok(())
    }

    #[test]
    fn test_flag_conflict_is_not_swallowed() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(ParsedArgs::default().with_value("c", "x"), &tmp);

        let err = session.colour().unwrap_err();
        assert_eq!(
            err.downcast_ref::<KiaError>(),
            Some(&KiaError::PassedTwice("c'/'colourless".into()))
        );
        assert!(session.paint("text", Style::Muted).is_ok());
        Ok(())
    }

    #[test]
    fn test_warnings_need_verbose() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(ParsedArgs::default(), &tmp);
        session.warning("hidden")?;
        session.success("shown")?;
        assert_eq!(output(session), "shown [0]\n");
        Ok(())
    }

    #[test]
    fn test_recover_depends_on_force() -> Result<()> {
        let tmp = TempDir::new()?;

        let mut strict = session(ParsedArgs::default(), &tmp);
        assert!(strict.recover(KiaError::NoParameters.into()).is_err());

        let mut forced = session(ParsedArgs::default().with_flag("F"), &tmp);
        forced.recover(KiaError::NoParameters.into())?;
        assert_eq!(output(forced), "No parameters provided. [1]\n");
        Ok(())
    }
}
