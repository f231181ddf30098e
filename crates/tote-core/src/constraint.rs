//! Package constraints: an id plus a conjunctive list of version requirements.
//!
//! Textual grammar: `<id> [ (<op> <version>)+ | <version> ]`, for example
//! `Foo`, `Foo 1.0`, `Foo >= 1.0 < 2.0`, or `Foo ~> 1.2.3`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tote_util::errors::{ToteError, ToteResult};

use crate::package::{ids_match, PackageRecord};
use crate::version::{Version, VersionOrdering};

/// Repeated `(operator)(version)` runs in a constraint remainder.
static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([=<>~]+)\s*([0-9.]+)").expect("valid requirement pattern")
});

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '<' | '>' | '~')
}

/// A version comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    EqualTo,
    GreaterThan,
    GreaterOrEqual,
    /// `~>`: at least the version, within its major.minor series.
    PessimisticGreater,
    LessThan,
    LessOrEqual,
    /// `<~`: at most the version, within its major.minor series.
    PessimisticLess,
}

impl Operator {
    /// Canonical spelling used when rendering constraints.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::EqualTo => "=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::PessimisticGreater => "~>",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::PessimisticLess => "<~",
        }
    }

    /// Parse any accepted spelling, e.g. both `>=` and `=>`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "=" | "==" => Operator::EqualTo,
            ">" => Operator::GreaterThan,
            ">=" | "=>" => Operator::GreaterOrEqual,
            "~>" | ">~" => Operator::PessimisticGreater,
            "<" => Operator::LessThan,
            "<=" | "=<" => Operator::LessOrEqual,
            "<~" | "~<" => Operator::PessimisticLess,
            _ => return None,
        };
        Some(op)
    }

    /// Whether `candidate` stands in this relation to `bound`.
    pub fn accepts(self, candidate: &Version, bound: &Version, ordering: VersionOrdering) -> bool {
        use std::cmp::Ordering::*;
        let ord = candidate.compare_with(bound, ordering);
        match self {
            Operator::EqualTo => ord == Equal,
            Operator::GreaterThan => ord == Greater,
            Operator::GreaterOrEqual => ord != Less,
            Operator::LessThan => ord == Less,
            Operator::LessOrEqual => ord != Greater,
            Operator::PessimisticGreater => {
                candidate.is_pessimistically_compatible_with(bound, ordering)
            }
            Operator::PessimisticLess => candidate.is_pessimistically_less_with(bound, ordering),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One `(operator, version)` pair of a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    pub op: Operator,
    pub version: Version,
}

impl Requirement {
    pub fn new(op: Operator, version: Version) -> Self {
        Self { op, version }
    }

    pub fn matches(&self, candidate: &Version) -> bool {
        self.matches_with(candidate, VersionOrdering::default())
    }

    pub fn matches_with(&self, candidate: &Version, ordering: VersionOrdering) -> bool {
        self.op.accepts(candidate, &self.version, ordering)
    }
}

/// A package id plus an ordered, conjunctive list of requirements.
///
/// An empty requirement list matches every version. Equality is structural:
/// two constraints are equal when their canonical renderings are equal.
#[derive(Debug, Clone)]
pub struct Constraint {
    id: String,
    requirements: Vec<Requirement>,
}

impl Constraint {
    /// A constraint on `id` that accepts any version.
    pub fn any(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            requirements: Vec::new(),
        }
    }

    /// A constraint pinning `id` to exactly `version`.
    pub fn exact(id: impl Into<String>, version: Version) -> Self {
        let mut c = Self::any(id);
        c.add_requirement(Operator::EqualTo, version);
        c
    }

    /// Parse constraint text such as `Foo >= 1.0 < 2.0`.
    pub fn parse(text: &str) -> ToteResult<Self> {
        let invalid = |reason: String| ToteError::InvalidConstraint {
            input: text.to_string(),
            reason,
        };

        let trimmed = text.trim();
        let (id, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((id, rest)) => (id, rest.trim()),
            None => (trimmed, ""),
        };
        if id.is_empty() {
            return Err(invalid("missing package id".to_string()));
        }
        if id.contains(is_operator_char) {
            return Err(invalid(format!(
                "package id '{id}' contains operator characters; separate it with a space"
            )));
        }

        let mut constraint = Self::any(id);
        if rest.is_empty() {
            return Ok(constraint);
        }

        let version = |s: &str| Version::parse(s).map_err(|e| invalid(e.to_string()));

        let mut tokens = rest.split_whitespace();
        if let (Some(only), None) = (tokens.next(), tokens.next()) {
            if !only.contains(is_operator_char) {
                constraint.add_requirement(Operator::EqualTo, version(only)?);
                return Ok(constraint);
            }
        }

        for caps in REQUIREMENT_RE.captures_iter(rest) {
            let symbol = &caps[1];
            let op = Operator::from_symbol(symbol)
                .ok_or_else(|| invalid(format!("unknown operator '{symbol}'")))?;
            constraint.add_requirement(op, version(&caps[2])?);
        }

        // No operator runs found: treat the whole remainder as an exact version.
        if constraint.requirements.is_empty() {
            constraint.add_requirement(Operator::EqualTo, version(rest)?);
        }
        Ok(constraint)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Append a requirement, keeping any existing one with the same operator.
    pub fn add_requirement(&mut self, op: Operator, version: Version) {
        self.requirements.push(Requirement::new(op, version));
    }

    /// Replace the first requirement with operator `op`, or append one.
    pub fn set_requirement(&mut self, op: Operator, version: Version) {
        match self.requirements.iter_mut().find(|r| r.op == op) {
            Some(existing) => existing.version = version,
            None => self.add_requirement(op, version),
        }
    }

    fn first_with(&self, op: Operator) -> Option<&Version> {
        self.requirements
            .iter()
            .find(|r| r.op == op)
            .map(|r| &r.version)
    }

    /// Version of the first `=` requirement.
    pub fn exact_version(&self) -> Option<&Version> {
        self.first_with(Operator::EqualTo)
    }

    /// Version of the first `>=` requirement.
    pub fn min_version(&self) -> Option<&Version> {
        self.first_with(Operator::GreaterOrEqual)
    }

    /// Version of the first `<=` requirement.
    pub fn max_version(&self) -> Option<&Version> {
        self.first_with(Operator::LessOrEqual)
    }

    /// Version of the first `~>` requirement.
    pub fn pessimistic_floor(&self) -> Option<&Version> {
        self.first_with(Operator::PessimisticGreater)
    }

    pub fn set_exact_version(&mut self, version: Version) {
        self.set_requirement(Operator::EqualTo, version);
    }

    pub fn set_min_version(&mut self, version: Version) {
        self.set_requirement(Operator::GreaterOrEqual, version);
    }

    pub fn set_max_version(&mut self, version: Version) {
        self.set_requirement(Operator::LessOrEqual, version);
    }

    pub fn set_pessimistic_floor(&mut self, version: Version) {
        self.set_requirement(Operator::PessimisticGreater, version);
    }

    /// The pinned version when this constraint is exactly `id = version`.
    pub fn pinned_version(&self) -> Option<&Version> {
        match self.requirements.as_slice() {
            [only] if only.op == Operator::EqualTo => Some(&only.version),
            _ => None,
        }
    }

    /// The requirement list alone, e.g. `>= 1.0 < 2.0`.
    pub fn requirements_text(&self) -> String {
        self.requirements
            .iter()
            .map(|r| format!("{} {}", r.op, r.version))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether `candidate` satisfies every requirement.
    pub fn matches(&self, candidate: &Version) -> bool {
        self.matches_with(candidate, VersionOrdering::default())
    }

    pub fn matches_with(&self, candidate: &Version, ordering: VersionOrdering) -> bool {
        self.requirements
            .iter()
            .all(|r| r.matches_with(candidate, ordering))
    }

    /// Whether `record` has this id (case-insensitively) and a matching version.
    pub fn matches_record(&self, record: &PackageRecord) -> bool {
        ids_match(&self.id, &record.id) && self.matches(&record.version)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = format!("{} {}", self.id, self.requirements_text());
        f.write_str(rendered.trim())
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl FromStr for Constraint {
    type Err = ToteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Constraint::parse(s)
    }
}

impl Serialize for Constraint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Constraint::parse(&text).map_err(serde::de::Error::custom)
    }
}
