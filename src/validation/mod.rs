//! Household form validation
//!
//! Errors are keyed by form field. Member fields use `member_{index}_{field}`
//! with the index into the submitted member list.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::{Household, Member};

/// Oldest accepted age
pub const MAX_AGE: i32 = 150;

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-()]+$").unwrap());

static BLOOD_GROUP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(A|B|AB|O)[+-]?$").unwrap());

/// Field-level validation failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field, keeping the first one
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (i, (field, message)) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Check a submitted household and its members
pub fn validate_household(household: &Household) -> Result<(), ValidationError> {
    let mut errors = ValidationError::new();

    if household.house_number.trim().is_empty() {
        errors.add("house_number", "House number is required");
    }
    if household.address_en.trim().is_empty() {
        errors.add("address_en", "Address (English) is required");
    }
    if !household.phone.is_empty() && !PHONE_REGEX.is_match(&household.phone) {
        errors.add("phone", "Please enter a valid phone number");
    }
    let owner_blank = household
        .owner_name
        .as_deref()
        .map_or(true, |name| name.trim().is_empty());
    if household.is_on_rent && owner_blank {
        errors.add("owner_name", "Owner's name is required when rented");
    }

    if household.head_count() > 1 {
        errors.add("members", "Only one member can be the head of the family");
    }

    for (index, member) in household.members.iter().enumerate() {
        validate_member(index, member, &mut errors);
    }

    errors.into_result()
}

fn validate_member(index: usize, member: &Member, errors: &mut ValidationError) {
    let key = |field: &str| format!("member_{index}_{field}");
    let name_blank = member.name_en.trim().is_empty();

    if member.is_head {
        if name_blank {
            errors.add(key("name_en"), "Main member name (English) is required");
        }
    } else if member.has_any_field() && name_blank {
        errors.add(
            key("name_en"),
            "Name (English) is required when adding member details",
        );
    }

    if member.dob.is_none() {
        if let Some(age) = member.age {
            if !(0..=MAX_AGE).contains(&age) {
                errors.add(key("age"), "Please enter a valid age (0-150)");
            }
        }
    }

    let blood_group = member.blood_group.trim();
    if !blood_group.is_empty() && !BLOOD_GROUP_REGEX.is_match(blood_group) {
        errors.add(
            key("blood_group"),
            "Please enter a valid blood group (e.g., A+, O-, AB)",
        );
    }
}

/// Normalize a validated household before it is stored
///
/// Drops non-head members without an English name and clears the stored age
/// of members with a date of birth. Blood groups are upper-cased and a blank
/// owner name becomes `None`.
pub fn prepare_for_save(mut household: Household) -> Household {
    household
        .members
        .retain(|m| m.is_head || !m.name_en.trim().is_empty());

    for member in &mut household.members {
        if member.dob.is_some() {
            member.age = None;
        }
        member.blood_group = member.blood_group.trim().to_uppercase();
    }

    if household
        .owner_name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        household.owner_name = None;
    }

    household
}
