// Core data structures for the family directory

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Household record
///
/// `id` is `None` until the household has been stored. `members` carries the
/// resolved member list when the household is read together with its members.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Household {
    #[serde(default)]
    pub id: Option<i64>,
    pub house_number: String, // Display key, may mix digits and Malayalam
    pub address_en: String,
    #[serde(default)]
    pub address_ml: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_on_rent: bool,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Household {
    /// Create a household with the required display fields
    pub fn new(house_number: impl Into<String>, address_en: impl Into<String>) -> Self {
        Self {
            house_number: house_number.into(),
            address_en: address_en.into(),
            ..Default::default()
        }
    }

    /// The head member, if one is flagged
    pub fn head(&self) -> Option<&Member> {
        self.members.iter().find(|m| m.is_head)
    }

    /// Number of members flagged as head
    ///
    /// Zero or more than one means the single-head convention was broken
    /// somewhere upstream.
    pub fn head_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_head).count()
    }

    /// Reorder members head first, then by identifier
    pub fn sort_members(&mut self) {
        sort_members(&mut self.members);
    }
}

/// Household member
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Member {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub household_id: Option<i64>,
    pub name_en: String,
    #[serde(default)]
    pub name_ml: String,
    #[serde(default)]
    pub relationship_en: String,
    #[serde(default)]
    pub relationship_ml: String,
    #[serde(default)]
    pub occupation_en: String,
    #[serde(default)]
    pub occupation_ml: String,
    /// Stored age, only meaningful when `dob` is absent
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub blood_group: String,
    #[serde(default)]
    pub is_head: bool,
}

impl Member {
    /// Create a member with an English name
    pub fn new(name_en: impl Into<String>) -> Self {
        Self {
            name_en: name_en.into(),
            ..Default::default()
        }
    }

    /// Create the head member of a household
    pub fn head(name_en: impl Into<String>) -> Self {
        Self {
            is_head: true,
            ..Self::new(name_en)
        }
    }

    /// Age to display as of `today`
    ///
    /// A date of birth wins over the stored age. A birth date in the future
    /// yields `None`.
    pub fn display_age(&self, today: NaiveDate) -> Option<u32> {
        match self.dob {
            Some(dob) => age_on(dob, today),
            None => self.age.and_then(|a| u32::try_from(a).ok()),
        }
    }

    /// True when any user-editable text field has content
    pub fn has_any_field(&self) -> bool {
        [
            &self.name_en,
            &self.name_ml,
            &self.relationship_en,
            &self.relationship_ml,
            &self.occupation_en,
            &self.occupation_ml,
            &self.blood_group,
        ]
        .iter()
        .any(|v| !v.trim().is_empty())
            || self.age.is_some()
            || self.dob.is_some()
    }
}

/// Whole years between `dob` and `today`
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Order members head first, then by ascending identifier
///
/// Members without an identifier sort as id 0. The sort is stable so
/// unsaved members keep their relative order.
pub fn sort_members(members: &mut [Member]) {
    members.sort_by(|a, b| {
        b.is_head
            .cmp(&a.is_head)
            .then_with(|| a.id.unwrap_or(0).cmp(&b.id.unwrap_or(0)))
    });
}

/// Language mode for directory output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English fields only
    English,
    /// Malayalam fields, falling back to English when empty
    Malayalam,
    /// English with Malayalam appended when it differs
    #[default]
    Both,
}

impl Language {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Malayalam => "malayalam",
            Self::Both => "both",
        }
    }

    /// Locale used for labels in this mode
    pub fn label_locale(&self) -> &'static str {
        match self {
            Self::Malayalam => "ml",
            Self::English | Self::Both => "en",
        }
    }

    /// Get all modes
    pub fn all() -> [Self; 3] {
        [Self::English, Self::Malayalam, Self::Both]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    /// Accepts the mode names, locale codes and the Malayalam word for Malayalam
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "malayalam" | "ml" | "മലയാളം" => Ok(Self::Malayalam),
            "both" | "all" => Ok(Self::Both),
            other => Err(format!("unknown language mode: {other}")),
        }
    }
}
