//! Semantic version handling for templates
//!
//! Requested versions arrive loosely shaped (a bare major number or string,
//! `major.minor`, or a full triple). They are normalized into strict numeric
//! components at the boundary; malformed input is rejected before any
//! datastore call.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Errors from parsing version inputs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Malformed version: {0:?}")]
    Malformed(String),

    #[error("Version component out of range: {0:?}")]
    OutOfRange(String),

    #[error("Version must be a non-negative integer or a dotted string, got {0}")]
    InvalidInput(String),
}

fn parse_component(part: &str, input: &str) -> Result<u64, VersionError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::Malformed(input.to_string()));
    }
    part.parse()
        .map_err(|_| VersionError::OutOfRange(input.to_string()))
}

/// Fully qualified `major.minor.patch` version
///
/// Ordering is numeric and component-wise, so `1.10.0` sorts above `1.9.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Whether this version sits on the given `major.minor` line
    pub fn is_on_line(&self, major: u64, minor: u64) -> bool {
        self.major == major && self.minor == minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionError::Malformed(s.to_string()));
        }

        Ok(Version {
            major: parse_component(parts[0], s)?,
            minor: parse_component(parts[1], s)?,
            patch: parse_component(parts[2], s)?,
        })
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// A requested version: bare major, `major.minor`, or a full triple
///
/// Omitted components are unconstrained. The patch component is accepted on
/// input but plays no role in version resolution; patches are assigned by
/// the template factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionSpec {
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
}

impl VersionSpec {
    /// The `major.minor` line this spec resolves onto, minor defaulting to 0
    pub fn line(&self) -> (u64, u64) {
        (self.major, self.minor.unwrap_or(0))
    }

    /// Prefix match: present components must equal the version's
    pub fn matches(&self, version: &Version) -> bool {
        self.major == version.major
            && self.minor.map_or(true, |m| m == version.minor)
            && self.patch.map_or(true, |p| p == version.patch)
    }
}

impl From<u64> for VersionSpec {
    fn from(major: u64) -> Self {
        VersionSpec {
            major,
            minor: None,
            patch: None,
        }
    }
}

impl FromStr for VersionSpec {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() > 3 {
            return Err(VersionError::Malformed(s.to_string()));
        }

        Ok(VersionSpec {
            major: parse_component(parts[0], s)?,
            minor: parts.get(1).map(|p| parse_component(p, s)).transpose()?,
            patch: parts.get(2).map(|p| parse_component(p, s)).transpose()?,
        })
    }
}

impl TryFrom<&Value> for VersionSpec {
    type Error = VersionError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .map(VersionSpec::from)
                .ok_or_else(|| VersionError::InvalidInput(n.to_string())),
            Value::String(s) => s.parse(),
            other => Err(VersionError::InvalidInput(other.to_string())),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{minor}")?;
        }
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for VersionSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        VersionSpec::try_from(&value).map_err(D::Error::custom)
    }
}
