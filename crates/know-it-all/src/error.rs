//! Error taxonomy
//!
//! Every condition the tool treats as fatal has a variant here. Operations
//! return `anyhow::Result` and raise these with `bail!`, so callers can
//! recover the kind with `downcast_ref::<KiaError>()`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KiaError {
    // Usage
    #[error("Parameter '{0}' missing argument(s).")]
    MissingArgument(String),

    #[error("Parameter '{0}' passed twice.")]
    PassedTwice(String),

    #[error("No parameters provided.")]
    NoParameters,

    #[error("Parameter '{0}' does not exist.")]
    UnknownParameter(String),

    #[error("Invalid type '{0}'. Run with '-? t' for more information.")]
    InvalidType(String),

    #[error("{0}")]
    Usage(String),

    // Resolution
    #[error("No value provided for '{0}'. Run with '-? {0}' for more information.")]
    NotSet(&'static str),

    // Store format
    #[error("The outfile '{}' does not exist, or is prohibited.", .0.display())]
    OutfileMissing(PathBuf),

    #[error("Error reading JSON from outfile ({0}). Check that the JSON format is valid.")]
    StoreFormat(String),

    // Domain
    #[error("The item identifier '{0}' does not exist in the database.")]
    ItemNotFound(String),

    #[error("An item with the identifier '{0}' is already present within the database.")]
    DuplicateItem(String),

    #[error("'{0}' is reserved and cannot be used as an item identifier.")]
    ReservedIdentifier(String),

    #[error("No items to remove.")]
    NoItemsToRemove,

    #[error("Cannot modify key 'identifier' - it is the name/identifier.")]
    ReservedKey,

    #[error("Key/value count mismatch: {keys} key(s) but {values} value(s).")]
    KeyValueMismatch { keys: usize, values: usize },

    #[error("Too many types: {types} type(s) for {values} value(s).")]
    TooManyTypes { types: usize, values: usize },

    #[error("Could not pop key(s); none could be found in the item(s).")]
    NothingChanged,

    #[error("Failed to find any instances of the term '{0}'.")]
    NoMatches(String),

    // Conversion
    #[error("Error whilst converting '{value}' to type '{ty}'.")]
    Conversion { value: String, ty: &'static str },

    // Cipher policy
    #[error("The phrase cannot be a series of one repeated character.")]
    PhraseSeries,

    #[error("The phrase cannot end with a run of repeated characters.")]
    PhraseTrailingRun,

    #[error("The phrase must be at least {0} characters long.")]
    PhraseTooShort(usize),

    #[error("Decryption failed - wrong phrase or corrupt data.")]
    DecryptionFailed,
}
