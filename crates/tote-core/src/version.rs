//! Dotted numeric package versions and their ordering.
//!
//! A version is a sequence of non-negative integers written `2.0.10`. The
//! default ordering compares component by component; when one sequence runs
//! out first, the longer sequence is greater even if its remaining
//! components are all zero (`2.0.0 > 2.0`). [`VersionOrdering::ZeroPadded`]
//! offers the conventional alternative where `2.0 == 2.0.0`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tote_util::errors::{ToteError, ToteResult};

/// How two versions of different lengths are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionOrdering {
    /// The longer component sequence wins once the shared prefix is equal.
    #[default]
    LengthBiased,
    /// Missing components count as zero, so `1.0 == 1.0.0`.
    ZeroPadded,
}

impl VersionOrdering {
    /// Compare two versions under this policy.
    pub fn compare(self, a: &Version, b: &Version) -> Ordering {
        if a.original == b.original {
            return Ordering::Equal;
        }
        let len = a.components.len().max(b.components.len());
        for i in 0..len {
            let ord = match (a.components.get(i), b.components.get(i)) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(x), None) => match self {
                    VersionOrdering::LengthBiased => Ordering::Greater,
                    VersionOrdering::ZeroPadded => x.cmp(&0),
                },
                (None, Some(y)) => match self {
                    VersionOrdering::LengthBiased => Ordering::Less,
                    VersionOrdering::ZeroPadded => 0.cmp(y),
                },
                (None, None) => Ordering::Equal,
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// A parsed dotted numeric version. Immutable once parsed.
#[derive(Debug, Clone)]
pub struct Version {
    original: String,
    components: Vec<u64>,
}

impl Version {
    /// Parse `text` as dot-separated non-negative integers.
    pub fn parse(text: &str) -> ToteResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ToteError::InvalidVersion {
                input: text.to_string(),
                reason: "empty version".to_string(),
            });
        }
        let components = trimmed
            .split('.')
            .map(|segment| {
                if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                    segment.parse::<u64>().ok()
                } else {
                    None
                }
                .ok_or_else(|| ToteError::InvalidVersion {
                    input: text.to_string(),
                    reason: format!("segment '{segment}' is not a non-negative integer"),
                })
            })
            .collect::<ToteResult<Vec<_>>>()?;
        Ok(Self {
            original: trimmed.to_string(),
            components,
        })
    }

    /// The numeric components in order.
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// The version as it was written.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// First component, zero if absent.
    pub fn major(&self) -> u64 {
        self.components.first().copied().unwrap_or(0)
    }

    /// Second component, zero if absent.
    pub fn minor(&self) -> u64 {
        self.components.get(1).copied().unwrap_or(0)
    }

    /// Compare under an explicit [`VersionOrdering`].
    pub fn compare_with(&self, other: &Version, ordering: VersionOrdering) -> Ordering {
        ordering.compare(self, other)
    }

    /// Same major and minor components, each zero-padded.
    fn same_series(&self, other: &Version) -> bool {
        self.major() == other.major() && self.minor() == other.minor()
    }

    /// `~>` semantics: at least `floor`, within the same major.minor series.
    pub fn is_pessimistically_compatible(&self, floor: &Version) -> bool {
        self.is_pessimistically_compatible_with(floor, VersionOrdering::default())
    }

    pub fn is_pessimistically_compatible_with(
        &self,
        floor: &Version,
        ordering: VersionOrdering,
    ) -> bool {
        self.compare_with(floor, ordering) != Ordering::Less && self.same_series(floor)
    }

    /// `<~` semantics: at most `ceiling`, within the same major.minor series.
    pub fn is_pessimistically_less(&self, ceiling: &Version) -> bool {
        self.is_pessimistically_less_with(ceiling, VersionOrdering::default())
    }

    pub fn is_pessimistically_less_with(
        &self,
        ceiling: &Version,
        ordering: VersionOrdering,
    ) -> bool {
        self.compare_with(ceiling, ordering) != Ordering::Greater && self.same_series(ceiling)
    }
}

impl FromStr for Version {
    type Err = ToteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

// Equality and hashing follow the default (length-biased) ordering: two
// versions are equal exactly when they have the same components.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        VersionOrdering::LengthBiased.compare(self, other)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Version::parse(&text).map_err(serde::de::Error::custom)
    }
}
