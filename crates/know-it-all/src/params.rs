//! Parameter registry
//!
//! Every recognised option is declared once in [`PARAMS`]. The order of that
//! table is a contract: it decides which handler runs first when several
//! parameters are passed together, and the first terminal parameter to run
//! ends the invocation.
//!
//! The [`Registry`] holds the per-invocation state of each parameter: how it
//! was passed, whether its handler has run, and the value it resolved to.

use crate::args::ParsedArgs;

/// Canonical identity of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    Help,
    Verbose,
    Force,
    Colourless,
    Count,
    Outfile,
    Decrypt,
    Encrypt,
    Search,
    Item,
    Add,
    Erase,
    Readable,
    Type,
    Key,
    Pop,
    Value,
}

/// Static declaration of a parameter
#[derive(Debug)]
pub struct ParamSpec {
    pub id: ParamId,
    /// Aliases; the first one is canonical
    pub names: &'static [&'static str],
    /// A value is required whenever the parameter is present
    pub takes_value: bool,
    /// Successfully running the handler ends the invocation
    pub terminal: bool,
    /// Shown in help; `None` for pure flags
    pub placeholder: Option<&'static str>,
    pub description: &'static str,
}

impl ParamSpec {
    pub fn canonical(&self) -> &'static str {
        self.names[0]
    }

    /// All aliases joined with `sep`, e.g. `+/add`
    pub fn prettify(&self, sep: &str) -> String {
        self.names.join(sep)
    }
}

pub const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        id: ParamId::Help,
        names: &["?", "help"],
        takes_value: false,
        terminal: true,
        placeholder: Some("parameter"),
        description: "Provides help for all parameters, or for the one named.",
    },
    ParamSpec {
        id: ParamId::Verbose,
        names: &["V", "verbose"],
        takes_value: false,
        terminal: false,
        placeholder: None,
        description: "Enables warnings.",
    },
    ParamSpec {
        id: ParamId::Force,
        names: &["F", "force"],
        takes_value: false,
        terminal: false,
        placeholder: None,
        description: "Reports fatal errors but carries on regardless. Later operations may see partially applied changes.",
    },
    ParamSpec {
        id: ParamId::Colourless,
        names: &["c", "colourless"],
        takes_value: false,
        terminal: false,
        placeholder: None,
        description: "Disables coloured output.",
    },
    ParamSpec {
        id: ParamId::Count,
        names: &["C", "count"],
        takes_value: false,
        terminal: false,
        placeholder: None,
        description: "Prints the number of items in the database.",
    },
    ParamSpec {
        id: ParamId::Outfile,
        names: &["o", "outfile"],
        takes_value: true,
        terminal: false,
        placeholder: Some("path"),
        description: "Specifies the target database JSON file. If none is provided, './database.json' is assumed.",
    },
    ParamSpec {
        id: ParamId::Decrypt,
        names: &["d", "decrypt"],
        takes_value: true,
        terminal: false,
        placeholder: Some("phrase"),
        description: "Decrypts the outfile with the phrase into './decrypted.json', which then becomes the outfile.",
    },
    ParamSpec {
        id: ParamId::Encrypt,
        names: &["e", "encrypt"],
        takes_value: true,
        terminal: true,
        placeholder: Some("phrase"),
        description: "Encrypts the outfile with the phrase into './encrypted.kia'. This is obfuscation, not security.",
    },
    ParamSpec {
        id: ParamId::Search,
        names: &["s", "search"],
        takes_value: true,
        terminal: true,
        placeholder: Some("term"),
        description: "Searches the database for the term and prints every match.",
    },
    ParamSpec {
        id: ParamId::Item,
        names: &["@", "item"],
        takes_value: true,
        terminal: false,
        placeholder: Some("identifier"),
        description: "Specifies the item to work on. '[ALL]' selects every item.",
    },
    ParamSpec {
        id: ParamId::Add,
        names: &["+", "add"],
        takes_value: true,
        terminal: false,
        placeholder: Some("identifier"),
        description: "Adds an item to the database and selects it as the working item.",
    },
    ParamSpec {
        id: ParamId::Erase,
        names: &["!", "erase"],
        takes_value: false,
        terminal: true,
        placeholder: None,
        description: "Removes the item specified with @/item.",
    },
    ParamSpec {
        id: ParamId::Readable,
        names: &["r", "readable"],
        takes_value: false,
        terminal: true,
        placeholder: Some("identifier"),
        description: "Prints an item's contents in a readable format. With no item, every item is printed.",
    },
    ParamSpec {
        id: ParamId::Type,
        names: &["t", "type"],
        takes_value: true,
        terminal: false,
        placeholder: Some("type,type,..."),
        description: "Types of the values given with v/value: 'string', 'int'/'integer', 'float'/'decimal', 'boolean'/'bool' or 'null'. Missing types default to 'string'.",
    },
    ParamSpec {
        id: ParamId::Key,
        names: &["k", "key"],
        takes_value: true,
        terminal: false,
        placeholder: Some("key,key,..."),
        description: "Specifies the keys to modify on the item.",
    },
    ParamSpec {
        id: ParamId::Pop,
        names: &["p", "pop"],
        takes_value: false,
        terminal: false,
        placeholder: None,
        description: "Removes the k/key keys from the item.",
    },
    ParamSpec {
        id: ParamId::Value,
        names: &["v", "value"],
        takes_value: true,
        terminal: false,
        placeholder: Some("value,value,..."),
        description: "Values assigned to the k/key keys, one per key. Spaces can be written as ':/s'.",
    },
];

impl ParamId {
    pub fn spec(&self) -> &'static ParamSpec {
        PARAMS
            .iter()
            .find(|spec| spec.id == *self)
            .unwrap_or_else(|| unreachable!("{:?} is missing from PARAMS", self))
    }

    pub fn canonical(&self) -> &'static str {
        self.spec().canonical()
    }
}

/// Look up a parameter by any of its aliases
pub fn find_by_name(name: &str) -> Option<&'static ParamSpec> {
    PARAMS.iter().find(|spec| spec.names.contains(&name))
}

/// How a parameter appeared on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    Absent,
    Flag,
    Value(String),
    /// Bare flag for a parameter that needs a value
    MissingArgument,
    /// Both a bare flag and a valued occurrence
    PassedTwice,
}

impl Presence {
    fn classify(spec: &ParamSpec, args: &ParsedArgs) -> Self {
        let name = spec.canonical();
        match (args.has_flag(name), args.value(name)) {
            (true, _) if spec.takes_value => Self::MissingArgument,
            (true, Some(_)) => Self::PassedTwice,
            (true, None) => Self::Flag,
            (false, Some(value)) => Self::Value(value.to_string()),
            (false, None) => Self::Absent,
        }
    }

    pub fn is_passed(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

#[derive(Debug)]
struct Slot {
    spec: &'static ParamSpec,
    presence: Presence,
    invoked: bool,
    resolved: Option<String>,
}

/// Per-invocation state of every parameter, in registry order
#[derive(Debug)]
pub struct Registry {
    slots: Vec<Slot>,
}

impl Registry {
    pub fn new(args: &ParsedArgs) -> Self {
        let slots = PARAMS
            .iter()
            .map(|spec| Slot {
                spec,
                presence: Presence::classify(spec, args),
                invoked: false,
                resolved: None,
            })
            .collect();

        Self { slots }
    }

    fn slot(&self, id: ParamId) -> &Slot {
        self.slots
            .iter()
            .find(|slot| slot.spec.id == id)
            .unwrap_or_else(|| unreachable!("{:?} is missing from the registry", id))
    }

    fn slot_mut(&mut self, id: ParamId) -> &mut Slot {
        self.slots
            .iter_mut()
            .find(|slot| slot.spec.id == id)
            .unwrap_or_else(|| unreachable!("{:?} is missing from the registry", id))
    }

    /// Parameter ids in registry order
    pub fn order(&self) -> Vec<ParamId> {
        self.slots.iter().map(|slot| slot.spec.id).collect()
    }

    pub fn presence(&self, id: ParamId) -> &Presence {
        &self.slot(id).presence
    }

    pub fn is_invoked(&self, id: ParamId) -> bool {
        self.slot(id).invoked
    }

    /// Passed on the command line but its handler has not run yet
    pub fn is_pending(&self, id: ParamId) -> bool {
        let slot = self.slot(id);
        slot.presence.is_passed() && !slot.invoked
    }

    pub fn mark_invoked(&mut self, id: ParamId) {
        self.slot_mut(id).invoked = true;
    }

    /// Any handler ran, whether from the dispatch loop or lazily
    pub fn any_invoked(&self) -> bool {
        self.slots.iter().any(|slot| slot.invoked)
    }

    pub fn resolved(&self, id: ParamId) -> Option<&str> {
        self.slot(id).resolved.as_deref()
    }

    /// Bind a resolved value. Handlers may bind parameters other than their
    /// own, e.g. `add` selects the item it created.
    pub fn bind(&mut self, id: ParamId, value: impl Into<String>) {
        self.slot_mut(id).resolved = Some(value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_order_is_fixed() {
        let order: Vec<&str> = PARAMS.iter().map(|s| s.canonical()).collect();
        assert_eq!(
            order,
            vec!["?", "V", "F", "c", "C", "o", "d", "e", "s", "@", "+", "!", "r", "t", "k", "p", "v"]
        );
    }

    #[test]
    fn test_names_are_unique() {
        let mut seen = HashSet::new();
        for spec in PARAMS {
            for name in spec.names {
                assert!(seen.insert(*name), "alias {name} declared twice");
            }
        }
        let ids: HashSet<ParamId> = PARAMS.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), PARAMS.len());
    }

    #[test]
    fn test_terminal_parameters() {
        let terminal: Vec<&str> = PARAMS
            .iter()
            .filter(|s| s.terminal)
            .map(|s| s.canonical())
            .collect();
        assert_eq!(terminal, vec!["?", "e", "s", "!", "r"]);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(find_by_name("add").map(|s| s.id), Some(ParamId::Add));
        assert_eq!(find_by_name("+").map(|s| s.id), Some(ParamId::Add));
        assert!(find_by_name("nope").is_none());
        assert_eq!(ParamId::Item.canonical(), "@");
        assert_eq!(ParamId::Add.spec().prettify("/"), "+/add");
    }

    #[test]
    fn test_presence() {
        let args = ParsedArgs::default()
            .with_flag("V")
            .with_flag("k")
            .with_flag("r")
            .with_value("r", "x")
            .with_value("o", "db.json");
        let registry = Registry::new(&args);

        assert_eq!(registry.presence(ParamId::Verbose), &Presence::Flag);
        assert_eq!(registry.presence(ParamId::Key), &Presence::MissingArgument);
        assert_eq!(registry.presence(ParamId::Readable), &Presence::PassedTwice);
        assert_eq!(
            registry.presence(ParamId::Outfile),
            &Presence::Value("db.json".into())
        );
        assert_eq!(registry.presence(ParamId::Add), &Presence::Absent);
    }

    #[test]
    fn test_bind_and_pending() {
        let args = ParsedArgs::default().with_value("@", "x");
        let mut registry = Registry::new(&args);

        assert!(registry.is_pending(ParamId::Item));
        assert!(!registry.is_pending(ParamId::Key));
        assert!(!registry.any_invoked());

        registry.mark_invoked(ParamId::Item);
        registry.bind(ParamId::Item, "x");
        assert!(!registry.is_pending(ParamId::Item));
        assert!(registry.any_invoked());
        assert_eq!(registry.resolved(ParamId::Item), Some("x"));

        registry.bind(ParamId::Item, "y");
        assert_eq!(registry.resolved(ParamId::Item), Some("y"));
    }
}
