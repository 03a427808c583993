//! know-it-all - Command-line record-store editor
//!
//! "Everything you know about everything, in one file."
//!
//! A flat collection of named items, each an open-ended bag of typed
//! attributes, kept in a single JSON file. Every invocation is a short
//! pipeline of single-letter parameters: pick the outfile, pick an item,
//! add or erase items, assign or pop keys, search, read.
//!
//! Parameters are declared once in a fixed order and dispatched in that
//! order, but any handler can ask for any other parameter's value and get
//! it, whether or not that parameter has been handled yet.
//!
//! The store can be obfuscated at rest with a phrase. This is a byte shift,
//! not encryption.

pub mod args;
pub mod cipher;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod params;
pub mod session;
pub mod store;
pub mod value;

pub use args::ParsedArgs;
pub use config::Config;
pub use dispatch::Outcome;
pub use error::KiaError;
pub use params::{ParamId, Registry, PARAMS};
pub use session::Session;
pub use store::{Record, Selector, Store};
pub use value::ValueType;
