//! The accelerator key: an opaque string naming a key combination.
//!
//! Accelerators look like `"CmdOrCtrl+Shift+K"` or `"Alt+F4"`, but this layer
//! never interprets that syntax.  Whether a string names a real key
//! combination is decided by the host process when it talks to the OS.  The
//! only local rule is that an accelerator must contain something other than
//! whitespace, so an empty request never reaches the bridge.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string cannot be used as an accelerator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AcceleratorError {
    /// The string was empty or contained only whitespace.
    #[error("accelerator must not be empty")]
    Empty,
}

/// An owned, non-empty accelerator string.
///
/// The original text is kept byte-for-byte (no trimming, no case folding) so
/// that the value the host reports in a `fired` event matches the key used in
/// the local binding table exactly.
///
/// # Examples
///
/// ```rust
/// use shortcut_core::Accelerator;
///
/// let acc = Accelerator::parse("CmdOrCtrl+X").unwrap();
/// assert_eq!(acc.as_str(), "CmdOrCtrl+X");
/// assert!(Accelerator::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Accelerator(String);

impl Accelerator {
    /// Validates `raw` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`AcceleratorError::Empty`] if `raw` is empty or whitespace-only.
    pub fn parse(raw: &str) -> Result<Self, AcceleratorError> {
        Self::try_from(raw.to_string())
    }

    /// Returns the accelerator text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the accelerator and returns the owned text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Accelerator {
    type Error = AcceleratorError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if raw.trim().is_empty() {
            return Err(AcceleratorError::Empty);
        }
        Ok(Self(raw))
    }
}

impl From<Accelerator> for String {
    fn from(acc: Accelerator) -> Self {
        acc.0
    }
}

impl FromStr for Accelerator {
    type Err = AcceleratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Accelerator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// `Borrow<str>` lets a `HashMap<Accelerator, _>` be queried with a plain
// `&str`.  The derived `Hash` hashes the inner `String`, which hashes exactly
// like the equivalent `str`, so the `Borrow` contract holds.
impl Borrow<str> for Accelerator {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_accepts_typical_accelerator() {
        let acc = Accelerator::parse("CmdOrCtrl+Shift+K").expect("valid accelerator");
        assert_eq!(acc.as_str(), "CmdOrCtrl+Shift+K");
    }

    #[test]
    fn test_parse_rejects_empty_string() {
        assert_eq!(Accelerator::parse(""), Err(AcceleratorError::Empty));
    }

    #[test]
    fn test_parse_rejects_whitespace_only() {
        assert_eq!(Accelerator::parse(" \t\n"), Err(AcceleratorError::Empty));
    }

    #[test]
    fn test_parse_does_not_trim_or_normalise() {
        // The host reports firings with the exact text it was given, so the
        // local key must not be altered.
        let acc = Accelerator::parse(" alt+f4").unwrap();
        assert_eq!(acc.as_str(), " alt+f4");
        assert_ne!(acc, Accelerator::parse("Alt+F4").unwrap());
    }

    #[test]
    fn test_from_str_matches_parse() {
        let acc: Accelerator = "Super+Space".parse().unwrap();
        assert_eq!(acc, Accelerator::parse("Super+Space").unwrap());
    }

    #[test]
    fn test_hash_map_lookup_by_str() {
        // Arrange
        let mut map = HashMap::new();
        map.insert(Accelerator::parse("F12").unwrap(), 7);

        // Act / Assert
        assert_eq!(map.get("F12"), Some(&7));
        assert_eq!(map.get("F11"), None);
    }

    #[test]
    fn test_serde_rejects_empty_accelerator() {
        let result: Result<Accelerator, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_serde_is_a_bare_string() {
        let acc = Accelerator::parse("Ctrl+Q").unwrap();
        assert_eq!(serde_json::to_string(&acc).unwrap(), "\"Ctrl+Q\"");
    }
}
