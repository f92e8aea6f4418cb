//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`PatchId`] - Content-derived identity of a commit's change
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use topbase::core::types::{BranchName, Oid};
//!
//! // Valid constructions
//! let branch = BranchName::new("feature/my-branch").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//!
//! // Invalid constructions fail at creation time
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`):
/// - Cannot be empty
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
/// - Cannot be exactly `@`
///
/// # Example
///
/// ```
/// use topbase::core::types::BranchName;
///
/// let name = BranchName::new("feature/my-branch").unwrap();
/// assert_eq!(name.as_str(), "feature/my-branch");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Validate a branch name against Git's refname rules.
    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be empty".into(),
            ));
        }

        if name == "@" {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be '@' (reserved)".into(),
            ));
        }

        if name.starts_with('.') || name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '.' or '-'".into(),
            ));
        }

        if name.ends_with(".lock") {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot end with '.lock'".into(),
            ));
        }
        if name.ends_with('/') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot end with '/'".into(),
            ));
        }

        for pattern in ["..", "@{", "//"] {
            if name.contains(pattern) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{pattern}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{c}'"
                )));
            }
        }

        for c in name.chars() {
            if c.is_ascii_control() {
                return Err(TypeError::InvalidBranchName(
                    "branch name cannot contain control characters".into(),
                ));
            }
        }

        // Component-specific rules (split by /)
        for component in name.split('/') {
            if component.is_empty() {
                continue;
            }
            if component.starts_with('.') {
                return Err(TypeError::InvalidBranchName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidBranchName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the full ref name for this branch (`refs/heads/<name>`).
    pub fn refname(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use topbase::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// The OID is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` characters. If `len` exceeds the OID length,
    /// returns the full OID.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Validate an object id.
    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content-derived identity of a commit's change.
///
/// Two commits carry equal `PatchId`s iff their diffs against their
/// respective single parents are byte-identical. The id is independent of
/// commit hash, author, timestamp, and message, which is what allows
/// matching commits across branches whose histories were rewritten.
///
/// Constructed only by [`crate::topbase::fingerprint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatchId([u8; 32]);

impl PatchId {
    /// Wrap a raw SHA-256 digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hex rendering of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for PatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod branch_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(BranchName::new("main").is_ok());
            assert!(BranchName::new("feature/foo").is_ok());
            assert!(BranchName::new("user@feature").is_ok());
            assert!(BranchName::new("v1.2.3").is_ok());
        }

        #[test]
        fn invalid_names() {
            assert!(BranchName::new("").is_err());
            assert!(BranchName::new("@").is_err());
            assert!(BranchName::new(".hidden").is_err());
            assert!(BranchName::new("-flag").is_err());
            assert!(BranchName::new("a..b").is_err());
            assert!(BranchName::new("a@{b").is_err());
            assert!(BranchName::new("a//b").is_err());
            assert!(BranchName::new("branch.lock").is_err());
            assert!(BranchName::new("trailing/").is_err());
            assert!(BranchName::new("has space").is_err());
            assert!(BranchName::new("has~tilde").is_err());
            assert!(BranchName::new("nested/.hidden").is_err());
        }

        #[test]
        fn refname_prefixes_heads() {
            let branch = BranchName::new("feature/foo").unwrap();
            assert_eq!(branch.refname(), "refs/heads/feature/foo");
        }

        #[test]
        fn serde_round_trip() {
            let branch = BranchName::new("feature/foo").unwrap();
            let json = serde_json::to_string(&branch).unwrap();
            assert_eq!(json, "\"feature/foo\"");
            let back: BranchName = serde_json::from_str(&json).unwrap();
            assert_eq!(back, branch);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<BranchName, _> = serde_json::from_str("\"bad..name\"");
            assert!(result.is_err());
        }
    }

    mod oid {
        use super::*;

        const SHA1: &str = "abc123def4567890abc123def4567890abc12345";

        #[test]
        fn valid_sha1() {
            let oid = Oid::new(SHA1).unwrap();
            assert_eq!(oid.as_str(), SHA1);
        }

        #[test]
        fn valid_sha256() {
            let sha256 = "a".repeat(64);
            assert!(Oid::new(sha256).is_ok());
        }

        #[test]
        fn normalized_to_lowercase() {
            let oid = Oid::new(SHA1.to_uppercase()).unwrap();
            assert_eq!(oid.as_str(), SHA1);
        }

        #[test]
        fn invalid_length() {
            assert!(Oid::new("abc123").is_err());
            assert!(Oid::new("a".repeat(41)).is_err());
        }

        #[test]
        fn invalid_characters() {
            assert!(Oid::new("z".repeat(40)).is_err());
        }

        #[test]
        fn short_abbreviation() {
            let oid = Oid::new(SHA1).unwrap();
            assert_eq!(oid.short(7), "abc123d");
            assert_eq!(oid.short(100), SHA1);
        }
    }

    mod patch_id {
        use super::*;

        #[test]
        fn equality_is_byte_equality() {
            let a = PatchId::from_bytes([1u8; 32]);
            let b = PatchId::from_bytes([1u8; 32]);
            let c = PatchId::from_bytes([2u8; 32]);
            assert_eq!(a, b);
            assert_ne!(a, c);
        }

        #[test]
        fn hex_rendering() {
            let id = PatchId::from_bytes([0xab; 32]);
            assert_eq!(id.to_hex().len(), 64);
            assert!(id.to_hex().starts_with("abab"));
        }
    }
}
