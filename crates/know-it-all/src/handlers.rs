//! Parameter handlers
//!
//! One function per parameter. Binding handlers (`o`, `@`, `t`, `k` and the
//! flags) only validate and record a value for others to resolve; action
//! handlers load the store, act, and write it back when they change it.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;

use crate::cipher;
use crate::error::KiaError;
use crate::params::{find_by_name, ParamId, ParamSpec, PARAMS};
use crate::session::{split_list, Session, Style, FLAG_SET};
use crate::store::{Assignment, Record, Selector};
use crate::value::ValueType;

/// What the dispatch loop does after a handler succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Flow {
    fn of(id: ParamId) -> Self {
        if id.spec().terminal {
            Self::Stop
        } else {
            Self::Continue
        }
    }
}

pub fn handle<W: Write>(session: &mut Session<W>, id: ParamId, value: Option<&str>) -> Result<()> {
    match id {
        ParamId::Help => help(session, value),
        ParamId::Verbose | ParamId::Force | ParamId::Colourless => {
            session.bind(id, FLAG_SET);
            Ok(())
        }
        ParamId::Count => count(session),
        ParamId::Outfile => outfile(session, required(id, value)?),
        ParamId::Decrypt => decrypt(session, required(id, value)?),
        ParamId::Encrypt => encrypt(session, required(id, value)?),
        ParamId::Search => search(session, required(id, value)?),
        ParamId::Item => item(session, required(id, value)?),
        ParamId::Add => add(session, required(id, value)?),
        ParamId::Erase => erase(session),
        ParamId::Readable => readable(session, value),
        ParamId::Type => type_list(session, required(id, value)?),
        ParamId::Key => {
            session.bind(id, required(id, value)?);
            Ok(())
        }
        ParamId::Pop => pop(session),
        ParamId::Value => assign(session, required(id, value)?),
    }
}

/// Run a handler and report whether the invocation should stop
pub fn run<W: Write>(session: &mut Session<W>, id: ParamId, value: Option<&str>) -> Result<Flow> {
    handle(session, id, value)?;
    Ok(Flow::of(id))
}

fn required(id: ParamId, value: Option<&str>) -> Result<&str> {
    match value {
        Some(value) => Ok(value),
        None => bail!(KiaError::MissingArgument(id.spec().prettify("'/'"))),
    }
}

fn help<W: Write>(session: &mut Session<W>, name: Option<&str>) -> Result<()> {
    let specs: Vec<&ParamSpec> = match name {
        None => PARAMS.iter().collect(),
        Some(name) => match find_by_name(name) {
            Some(spec) => vec![spec],
            None => bail!(KiaError::UnknownParameter(name.to_string())),
        },
    };

    let mut text = String::new();
    for spec in specs {
        text.push_str("# ");
        text.push_str(&session.paint(&spec.prettify("/"), Style::Heading)?);

        if let Some(placeholder) = spec.placeholder {
            let (open, close) = if spec.takes_value { ("<", ">") } else { ("[", "]") };
            text.push(' ');
            text.push_str(&session.paint(open, Style::Muted)?);
            text.push_str(&session.paint(placeholder, Style::Value)?);
            text.push_str(&session.paint(close, Style::Muted)?);
        }

        text.push('\n');
        text.push_str(&session.paint(spec.description, Style::Muted)?);
        text.push_str("\n\n");
    }

    write!(session.out(), "{}", text).context("Failed to write help")
}

fn count<W: Write>(session: &mut Session<W>) -> Result<()> {
    let store = session.open_store()?;
    writeln!(session.out(), "{}", store.len()).context("Failed to write count")
}

fn outfile<W: Write>(session: &mut Session<W>, path: &str) -> Result<()> {
    if !Path::new(path).exists() {
        bail!(KiaError::OutfileMissing(path.into()));
    }
    session.bind(ParamId::Outfile, path);
    Ok(())
}

fn decrypt<W: Write>(session: &mut Session<W>, phrase: &str) -> Result<()> {
    let source = session.outfile_path()?;
    let target = session.config().decrypted_path.clone();

    cipher::decrypt_file(&source, &target, phrase)?;
    session.bind(ParamId::Outfile, target.to_string_lossy());

    session.success(&format!(
        "Decrypted '{}' into '{}'.",
        source.display(),
        target.display()
    ))
}

fn encrypt<W: Write>(session: &mut Session<W>, phrase: &str) -> Result<()> {
    let source = session.outfile_path()?;
    let target = session.config().encrypted_path.clone();

    cipher::encrypt_file(&source, &target, phrase)?;

    session.success(&format!(
        "Encrypted '{}' into '{}'.",
        source.display(),
        target.display()
    ))
}

/// Paint `text` with `base`, reversing every occurrence of `term`
fn highlight<W: Write>(
    session: &mut Session<W>,
    text: &str,
    term: &str,
    base: Style,
) -> Result<String> {
    if term.is_empty() {
        return session.paint(text, base);
    }

    let mut painted = String::new();
    let mut pieces = text.split(term).peekable();
    while let Some(piece) = pieces.next() {
        painted.push_str(&session.paint(piece, base)?);
        if pieces.peek().is_some() {
            painted.push_str(&session.paint(term, Style::Highlight)?);
        }
    }
    Ok(painted)
}

fn search<W: Write>(session: &mut Session<W>, term: &str) -> Result<()> {
    let store = session.open_store()?;
    let hits = store.search(term);
    if hits.is_empty() {
        bail!(KiaError::NoMatches(term.to_string()));
    }

    let mut report = String::new();
    for hit in hits {
        report.push_str(&session.paint("> ", Style::Muted)?);
        report.push_str(&highlight(session, &hit.identifier, term, Style::Identifier)?);
        report.push('\n');

        for (key, text) in &hit.attributes {
            report.push_str(&highlight(session, key, term, Style::Key)?);
            report.push_str(" : ");
            report.push_str(&highlight(session, text, term, Style::Value)?);
            report.push('\n');
        }
    }

    write!(session.out(), "{}", report).context("Failed to write search results")
}

fn item<W: Write>(session: &mut Session<W>, raw: &str) -> Result<()> {
    let selector = Selector::parse(raw);
    if let Selector::One(_) = selector {
        session.open_store()?.ensure_selected(&selector)?;
    }
    session.bind(ParamId::Item, raw);
    Ok(())
}

fn add<W: Write>(session: &mut Session<W>, identifier: &str) -> Result<()> {
    let mut store = session.open_store()?;
    store.add(identifier)?;
    store.save()?;

    session.bind(ParamId::Item, identifier);
    session.success(&format!(
        "Item of identifier '{}' has been added to the database.",
        identifier
    ))
}

fn selected_item<W: Write>(session: &mut Session<W>) -> Result<Selector> {
    match session.item_selector(true)? {
        Some(selector) => Ok(selector),
        None => bail!(KiaError::NotSet(ParamId::Item.canonical())),
    }
}

fn erase<W: Write>(session: &mut Session<W>) -> Result<()> {
    let selector = selected_item(session)?;
    let mut store = session.open_store()?;

    let removed = store.erase(&selector)?;
    store.save()?;

    for identifier in removed {
        session.success(&format!("Removed item '{}'.", identifier))?;
    }
    Ok(())
}

fn render_record<W: Write>(session: &mut Session<W>, record: &Record) -> Result<String> {
    let mut text = session.paint("> ", Style::Muted)?;
    text.push_str(&session.paint(&record.identifier, Style::Identifier)?);
    text.push('\n');

    if record.attributes.is_empty() {
        text.push_str(&session.paint("N/A", Style::Muted)?);
        text.push('\n');
    }
    for (key, value) in &record.attributes {
        text.push_str(&session.paint(key, Style::Key)?);
        text.push_str(" : ");
        text.push_str(&session.paint(&value.to_string(), Style::Value)?);
        text.push('\n');
    }
    Ok(text)
}

fn readable<W: Write>(session: &mut Session<W>, identifier: Option<&str>) -> Result<()> {
    let selector = match identifier {
        Some(raw) => Some(Selector::parse(raw)),
        None => session.item_selector(false)?,
    };
    let store = session.open_store()?;

    if let Some(selector) = &selector {
        store.ensure_selected(selector)?;
    }

    let mut text = String::new();
    for record in store.records() {
        if selector.as_ref().map_or(true, |s| s.matches(record)) {
            text.push_str(&render_record(session, record)?);
        }
    }
    write!(session.out(), "{}", text).context("Failed to write items")
}

fn type_list<W: Write>(session: &mut Session<W>, raw: &str) -> Result<()> {
    for token in split_list(raw) {
        ValueType::parse(&token)?;
    }
    session.bind(ParamId::Type, raw);
    Ok(())
}

fn pop<W: Write>(session: &mut Session<W>) -> Result<()> {
    let keys = session.key_list()?;
    let selector = selected_item(session)?;
    let mut store = session.open_store()?;

    let removal = store.remove_keys(&selector, &keys)?;
    for (identifier, key) in &removal.missing {
        session.warning(&format!(
            "{}: Key '{}' is not present in item '{}'.",
            ParamId::Pop.spec().prettify("/"),
            key,
            identifier
        ))?;
    }
    if removal.removed.is_empty() {
        bail!(KiaError::NothingChanged);
    }

    store.save()?;
    for (identifier, key) in &removal.removed {
        session.success(&format!(
            "Key '{}' removed from item '{}'.",
            key, identifier
        ))?;
    }
    Ok(())
}

fn assign<W: Write>(session: &mut Session<W>, raw: &str) -> Result<()> {
    let values = split_list(raw);
    let keys = session.key_list()?;
    let types = session.type_list()?;

    if keys.len() != values.len() {
        bail!(KiaError::KeyValueMismatch {
            keys: keys.len(),
            values: values.len(),
        });
    }
    if types.len() > values.len() {
        bail!(KiaError::TooManyTypes {
            types: types.len(),
            values: values.len(),
        });
    }

    let selector = selected_item(session)?;
    let mut store = session.open_store()?;
    store.ensure_selected(&selector)?;

    // (assignment, declared type, text as given)
    let mut converted: Vec<(Assignment, ValueType, &str)> = Vec::new();
    for (i, (key, text)) in keys.iter().zip(&values).enumerate() {
        let ty = types.get(i).copied().unwrap_or(ValueType::String);
        match ty.convert(text) {
            Ok(value) => converted.push((
                Assignment {
                    key: key.clone(),
                    value,
                },
                ty,
                text.as_str(),
            )),
            Err(e) => session.recover(e)?,
        }
    }

    let assignments: Vec<Assignment> = converted.iter().map(|(a, _, _)| a.clone()).collect();
    let touched = store.assign(&selector, &assignments)?;
    store.save()?;

    for identifier in &touched {
        for (assignment, ty, text) in &converted {
            session.success(&format!(
                "Value of key '{}' has been assigned the value '{}' (of type '{}') for item '{}'.",
                assignment.key, text, ty, identifier
            ))?;
        }
    }
    Ok(())
}
