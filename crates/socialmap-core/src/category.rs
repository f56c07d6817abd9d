//! Role and house vocabulary.
//!
//! Entities carry free-form category strings; the two filterable dimensions
//! (role and house) are recognised by their exact labels. Any other category
//! is ignored by filtering and region assignment.

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Staff,
    Student,
    Resident,
    Outsider,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Staff, Role::Student, Role::Resident, Role::Outsider];

    pub const fn label(self) -> &'static str {
        match self {
            Role::Staff => "Hogwarts Staff",
            Role::Student => "Student",
            Role::Resident => "Non-Academic Residents",
            Role::Outsider => "Outside of Hogwarts",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for Role {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Role::ALL
            .into_iter()
            .find(|role| role.label() == value)
            .ok_or_else(|| CoreError::InvalidRole(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum House {
    Slytherin,
    Ravenclaw,
    Hufflepuff,
    Gryffindor,
}

impl House {
    /// Column order used by the region layout.
    pub const ALL: [House; 4] = [
        House::Slytherin,
        House::Ravenclaw,
        House::Hufflepuff,
        House::Gryffindor,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            House::Slytherin => "Slytherin",
            House::Ravenclaw => "Ravenclaw",
            House::Hufflepuff => "Hufflepuff",
            House::Gryffindor => "Gryffindor",
        }
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for House {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        House::ALL
            .into_iter()
            .find(|house| house.label() == value)
            .ok_or_else(|| CoreError::InvalidHouse(value.to_string()))
    }
}

/// Roles present in a category set.
pub fn roles_of(categories: &BTreeSet<String>) -> BTreeSet<Role> {
    categories
        .iter()
        .filter_map(|c| Role::try_from(c.as_str()).ok())
        .collect()
}

/// Houses present in a category set.
pub fn houses_of(categories: &BTreeSet<String>) -> BTreeSet<House> {
    categories
        .iter()
        .filter_map(|c| House::try_from(c.as_str()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_labels_round_trip_through_try_from() {
        for role in Role::ALL {
            assert_eq!(Role::try_from(role.label()).unwrap(), role);
        }
        for house in House::ALL {
            assert_eq!(House::try_from(house.label()).unwrap(), house);
        }
        assert!(Role::try_from("Ghost").is_err());
        assert!(House::try_from("slytherin").is_err());
    }

    #[test]
    fn test_category_dimensions_ignore_unknown_labels() {
        let set = cats(&["Student", "Gryffindor", "Quidditch"]);
        assert_eq!(roles_of(&set), [Role::Student].into_iter().collect());
        assert_eq!(houses_of(&set), [House::Gryffindor].into_iter().collect());
        assert!(roles_of(&cats(&["Quidditch"])).is_empty());
    }
}
