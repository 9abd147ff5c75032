//! Bilingual lookup lists for relationships, occupations and blood groups
//!
//! The lists are static, but callers read them through [`LookupCache`] over a
//! [`LookupSource`] so a remote source can replace the tables without
//! touching the HTTP layer.

pub mod cache;
mod tables;

pub use cache::{Clock, LookupCache, ManualClock, SystemClock};

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lookup errors
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("unknown lookup list: {0}")]
    UnknownList(String),

    #[error("lookup source failed: {0}")]
    Source(String),
}

/// Which option list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Relationships,
    Occupations,
    BloodGroups,
}

impl LookupKind {
    /// Path segment used by the API
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relationships => "relationships",
            Self::Occupations => "occupations",
            Self::BloodGroups => "blood-groups",
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Relationships, Self::Occupations, Self::BloodGroups]
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupKind {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relationships" => Ok(Self::Relationships),
            "occupations" => Ok(Self::Occupations),
            "blood-groups" | "blood_groups" => Ok(Self::BloodGroups),
            other => Err(LookupError::UnknownList(other.to_string())),
        }
    }
}

/// Option with an English value, its Malayalam counterpart and a combined label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BilingualOption {
    pub value_en: String,
    pub value_ml: String,
    /// `English (മലയാളം)`
    pub label: String,
}

impl BilingualOption {
    fn from_pair((en, ml): (&str, &str)) -> Self {
        Self {
            value_en: en.to_string(),
            value_ml: ml.to_string(),
            label: format!("{en} ({ml})"),
        }
    }
}

/// Blood group code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BloodGroup {
    pub value: String,
    pub label: String,
}

/// One option list as served to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LookupList {
    Bilingual(Vec<BilingualOption>),
    BloodGroups(Vec<BloodGroup>),
}

impl LookupList {
    pub fn len(&self) -> usize {
        match self {
            Self::Bilingual(options) => options.len(),
            Self::BloodGroups(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Relationship options in form order
pub fn relationships() -> Vec<BilingualOption> {
    tables::RELATIONSHIPS
        .iter()
        .copied()
        .map(BilingualOption::from_pair)
        .collect()
}

/// Occupation options in form order
pub fn occupations() -> Vec<BilingualOption> {
    tables::OCCUPATIONS
        .iter()
        .copied()
        .map(BilingualOption::from_pair)
        .collect()
}

/// Blood group options in form order
pub fn blood_groups() -> Vec<BloodGroup> {
    tables::BLOOD_GROUPS
        .iter()
        .map(|g| BloodGroup {
            value: g.to_string(),
            label: g.to_string(),
        })
        .collect()
}

/// Relationship whose English value matches exactly
pub fn find_relationship_by_english(value_en: &str) -> Option<BilingualOption> {
    tables::RELATIONSHIPS
        .iter()
        .find(|(en, _)| *en == value_en)
        .copied()
        .map(BilingualOption::from_pair)
}

/// Occupation whose English value matches exactly
pub fn find_occupation_by_english(value_en: &str) -> Option<BilingualOption> {
    tables::OCCUPATIONS
        .iter()
        .find(|(en, _)| *en == value_en)
        .copied()
        .map(BilingualOption::from_pair)
}

/// Blood group with exactly this code
pub fn find_blood_group(value: &str) -> Option<BloodGroup> {
    tables::BLOOD_GROUPS
        .iter()
        .find(|g| **g == value)
        .map(|g| BloodGroup {
            value: g.to_string(),
            label: g.to_string(),
        })
}

// ============================================================================
// Sources
// ============================================================================

/// Where option lists come from
pub trait LookupSource: Send + Sync {
    fn fetch(&self, kind: LookupKind) -> Result<LookupList, LookupError>;
}

/// Built-in tables
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLookups;

impl LookupSource for StaticLookups {
    fn fetch(&self, kind: LookupKind) -> Result<LookupList, LookupError> {
        Ok(match kind {
            LookupKind::Relationships => LookupList::Bilingual(relationships()),
            LookupKind::Occupations => LookupList::Bilingual(occupations()),
            LookupKind::BloodGroups => LookupList::BloodGroups(blood_groups()),
        })
    }
}
