//! Store obfuscation
//!
//! A reversible byte shift keyed by a phrase. This is NOT encryption in any
//! meaningful sense: only the final byte of the phrase affects the output,
//! so the effective key is a single byte. The behaviour is kept exactly so
//! that files written by earlier versions still decrypt.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::KiaError;
use crate::store;

/// Shortest phrase accepted, in characters
pub const MIN_PHRASE_LEN: usize = 8;

/// Reject phrases that are a single repeated character, that end in a run of
/// repeated characters, or that are too short (checked in that order).
pub fn validate_phrase(phrase: &str) -> Result<()> {
    let chars: Vec<char> = phrase.chars().collect();

    if let Some(first) = chars.first() {
        if chars.iter().all(|c| c == first) {
            bail!(KiaError::PhraseSeries);
        }
    }

    if trailing_run(&chars) > 1 {
        bail!(KiaError::PhraseTrailingRun);
    }

    if chars.len() < MIN_PHRASE_LEN {
        bail!(KiaError::PhraseTooShort(MIN_PHRASE_LEN));
    }

    Ok(())
}

fn trailing_run(chars: &[char]) -> usize {
    match chars.last() {
        Some(last) => chars.iter().rev().take_while(|c| *c == last).count(),
        None => 0,
    }
}

/// The amount every byte is shifted by.
///
/// Each phrase byte is folded in turn but every step starts over from the
/// plain byte, so only the last one survives.
pub fn effective_shift(phrase: &str) -> u8 {
    phrase.as_bytes().last().copied().unwrap_or(0)
}

pub fn encrypt_bytes(data: &[u8], phrase: &str) -> Vec<u8> {
    let shift = effective_shift(phrase);
    data.iter().map(|b| b.wrapping_add(shift)).collect()
}

pub fn decrypt_bytes(data: &[u8], phrase: &str) -> Vec<u8> {
    let shift = effective_shift(phrase);
    data.iter().map(|b| b.wrapping_sub(shift)).collect()
}

/// Obfuscate `source` into `target`
pub fn encrypt_file(source: &Path, target: &Path, phrase: &str) -> Result<()> {
    validate_phrase(phrase)?;

    let data = fs::read(source)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    fs::write(target, encrypt_bytes(&data, phrase))
        .with_context(|| format!("Failed to write {}", target.display()))?;

    debug!("Encrypted {} -> {}", source.display(), target.display());
    Ok(())
}

/// Reverse `encrypt_file`. The output is written before it is checked, and
/// must parse as a store or the phrase is considered wrong.
pub fn decrypt_file(source: &Path, target: &Path, phrase: &str) -> Result<()> {
    validate_phrase(phrase)?;

    let data = fs::read(source)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let plain = decrypt_bytes(&data, phrase);
    fs::write(target, &plain)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    debug!("Decrypted {} -> {}", source.display(), target.display());

    match store::parse_records(&plain) {
        Ok(_) => Ok(()),
        Err(_) => bail!(KiaError::DecryptionFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn policy(phrase: &str) -> Option<KiaError> {
        validate_phrase(phrase)
            .err()
            .and_then(|e| e.downcast_ref::<KiaError>().cloned())
    }

    #[test]
    fn test_phrase_policy() {
        assert_eq!(policy("aaaaaaaaaa"), Some(KiaError::PhraseSeries));
        assert_eq!(policy("a"), Some(KiaError::PhraseSeries));
        assert_eq!(policy("abcdefgg"), Some(KiaError::PhraseTrailingRun));
        assert_eq!(policy("abc"), Some(KiaError::PhraseTooShort(MIN_PHRASE_LEN)));
        assert_eq!(policy(""), Some(KiaError::PhraseTooShort(MIN_PHRASE_LEN)));
        assert_eq!(policy("correct horse"), None);
        assert_eq!(policy("aabbccdd1"), None);
    }

    #[test]
    fn test_only_last_character_matters() {
        let data = b"[{\"identifier\":\"x\"}]";
        assert_eq!(encrypt_bytes(data, "phrase-one"), encrypt_bytes(data, "other-xyze"));
        assert_ne!(encrypt_bytes(data, "phrase-one"), encrypt_bytes(data, "phrase-onf"));
        assert_eq!(effective_shift("abcdefgh"), b'h');
    }

    #[test]
    fn test_shift_wraps() {
        let data = [0u8, 1, 200, 255];
        let encrypted = encrypt_bytes(&data, "zzzzzzz~x");
        assert_eq!(encrypted[3], 255u8.wrapping_add(b'x'));
        assert_eq!(decrypt_bytes(&encrypted, "zzzzzzz~x"), data);
    }

    #[test]
    fn test_file_round_trip() -> Result<()> {
        let tmp = TempDir::new()?;
        let store = tmp.path().join("database.json");
        let encrypted = tmp.path().join("encrypted.kia");
        let decrypted = tmp.path().join("decrypted.json");
        let content = "[\n    {\n        \"identifier\": \"x\",\n        \"n\": 5\n    }\n]\n";
        fs::write(&store, content)?;

        encrypt_file(&store, &encrypted, "open sesame")?;
        assert_ne!(fs::read(&encrypted)?, content.as_bytes());

        decrypt_file(&encrypted, &decrypted, "open sesame")?;
        assert_eq!(fs::read_to_string(&decrypted)?, content);
        Ok(())
    }

    #[test]
    fn test_wrong_phrase() -> Result<()> {
        let tmp = TempDir::new()?;
        let store = tmp.path().join("database.json");
        let encrypted = tmp.path().join("encrypted.kia");
        let decrypted = tmp.path().join("decrypted.json");
        fs::write(&store, "[{\"identifier\": \"x\"}]")?;

        encrypt_file(&store, &encrypted, "open sesame")?;
        let err = decrypt_file(&encrypted, &decrypted, "open sesamf").unwrap_err();
        assert_eq!(err.downcast_ref::<KiaError>(), Some(&KiaError::DecryptionFailed));
        Ok(())
    }

    #[test]
    fn test_weak_phrase_writes_nothing() -> Result<()> {
        let tmp = TempDir::new()?;
        let store = tmp.path().join("database.json");
        let encrypted = tmp.path().join("encrypted.kia");
        fs::write(&store, "[]")?;

        assert!(encrypt_file(&store, &encrypted, "short").is_err());
        assert!(!encrypted.exists());
        Ok(())
    }
}
