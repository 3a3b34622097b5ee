//! Suite path keys.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Schema pattern equivalent to [`SuitePath::new`].
pub const SUITE_PATH_PATTERN: &str = r"^[^/\n].*/$";

/// Why a suite path was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuitePathError {
    /// The path is empty.
    Empty,
    /// The path starts with `/`.
    Absolute,
    /// The path does not end with `/`.
    MissingTrailingSlash,
    /// The path spans more than one line.
    Multiline,
}

impl fmt::Display for SuitePathError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Empty => "suite path must not be empty",
            Self::Absolute => "suite path must be relative (must not start with `/`)",
            Self::MissingTrailingSlash => "suite path must end with `/`",
            Self::Multiline => "suite path must not contain a newline",
        };
        formatter.write_str(reason)
    }
}

impl std::error::Error for SuitePathError {}

/// Relative, slash-terminated path of a suite directory (`tests/main/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SuitePath(String);

impl SuitePath {
    /// Validate and wrap a suite path.
    pub fn new(path: impl Into<String>) -> Result<Self, SuitePathError> {
        let path = path.into();
        check_suite_path(&path)?;
        Ok(Self(path))
    }

    /// Borrow the path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path without its trailing slash.
    #[must_use]
    pub fn directory(&self) -> &str {
        self.0.strip_suffix('/').unwrap_or(&self.0)
    }

    /// Consume and return the path.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Check a suite path without allocating.
pub fn check_suite_path(path: &str) -> Result<(), SuitePathError> {
    if path.is_empty() {
        return Err(SuitePathError::Empty);
    }
    if path.starts_with('/') {
        return Err(SuitePathError::Absolute);
    }
    if path.contains('\n') {
        return Err(SuitePathError::Multiline);
    }
    if !path.ends_with('/') {
        return Err(SuitePathError::MissingTrailingSlash);
    }
    Ok(())
}

impl TryFrom<String> for SuitePath {
    type Error = SuitePathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for SuitePath {
    type Err = SuitePathError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl From<SuitePath> for String {
    fn from(path: SuitePath) -> Self {
        path.0
    }
}

impl AsRef<str> for SuitePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SuitePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SuitePath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_slash_terminated_paths_are_accepted() -> Result<(), SuitePathError> {
        let path = SuitePath::new("tests/")?;
        assert_eq!(path.as_str(), "tests/");
        assert_eq!(path.directory(), "tests");
        assert!(SuitePath::new("tests/main/").is_ok());
        Ok(())
    }

    #[test]
    fn malformed_paths_are_rejected() {
        assert_eq!(SuitePath::new("tests"), Err(SuitePathError::MissingTrailingSlash));
        assert_eq!(SuitePath::new("/tests/"), Err(SuitePathError::Absolute));
        assert_eq!(SuitePath::new(""), Err(SuitePathError::Empty));
        assert_eq!(SuitePath::new("/"), Err(SuitePathError::Absolute));
        assert_eq!(SuitePath::new("a\nb/"), Err(SuitePathError::Multiline));
    }

    #[test]
    fn deserialization_enforces_the_rule() {
        let ok: Result<SuitePath, _> = serde_json::from_str("\"spread/\"");
        let bad: Result<SuitePath, _> = serde_json::from_str("\"spread\"");
        assert!(ok.is_ok());
        assert!(bad.is_err());
    }
}
