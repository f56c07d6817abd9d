//! Graph View Style System
//!
//! Maps relationship statuses to edge colours and style keys, and entity
//! affiliations to group colours.

use serde::{Serialize, Serializer};
use socialmap_core::{House, Role, Status};
use std::collections::BTreeSet;
use std::fmt;

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

// Status colors
pub const COLOR_FRIEND: Color = Color::rgb(0x00, 0xa4, 0x6d);
pub const COLOR_CORDIAL: Color = Color::rgb(0x90, 0xf8, 0xd5);
pub const COLOR_CLOSE: Color = Color::rgb(0x00, 0x62, 0x41);
pub const COLOR_RIVAL: Color = Color::rgb(0xb5, 0x5e, 0x16);
pub const COLOR_ENEMY: Color = Color::rgb(0x82, 0x18, 0x18);
pub const COLOR_FAMILY: Color = Color::rgb(0x3b, 0x82, 0xf6);
pub const COLOR_LOVE_INTEREST: Color = Color::rgb(0xff, 0x7a, 0xf6);
pub const COLOR_FAMILIAR: Color = Color::rgb(0x6b, 0x72, 0x80);
pub const COLOR_EDGE_DEFAULT: Color = Color::rgb(0x9c, 0xa3, 0xaf);

// Group colors
pub const COLOR_SLYTHERIN: Color = Color::rgb(0x1a, 0x5f, 0x3b);
pub const COLOR_RAVENCLAW: Color = Color::rgb(0x1e, 0x3a, 0x8a);
pub const COLOR_GRYFFINDOR: Color = Color::rgb(0x99, 0x1b, 0x1b);
pub const COLOR_HUFFLEPUFF: Color = Color::rgb(0xca, 0x8a, 0x04);
pub const COLOR_STAFF: Color = Color::rgb(0x6b, 0x72, 0x80);
pub const COLOR_OTHER_HOGWARTS: Color = Color::rgb(0x9c, 0xa3, 0xaf);
pub const COLOR_OUTSIDE: Color = Color::rgb(0x4b, 0x55, 0x63);
pub const COLOR_RESIDENTS: Color = Color::rgb(0x8b, 0x5c, 0xf6);

pub const EDGE_WIDTH: f32 = 2.0;
pub const EDGE_OPACITY: f32 = 0.6;

/// Style key of statuses without a palette entry.
pub const DEFAULT_STYLE_KEY: &str = "default";

/// Edge color and style
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeStyle {
    pub color: Color,
    pub width: f32,
    pub opacity: f32,
}

/// Key a renderer uses to pick stroke and marker styling for `status`.
pub fn style_key(status: &Status) -> &str {
    if status.is_known() {
        status.label()
    } else {
        DEFAULT_STYLE_KEY
    }
}

/// Get the base color for a relationship status
pub fn get_edge_color(status: &Status) -> Color {
    match status {
        Status::Friend => COLOR_FRIEND,
        Status::Cordial => COLOR_CORDIAL,
        Status::BestFriend | Status::Companion => COLOR_CLOSE,
        Status::Rival | Status::Dislike => COLOR_RIVAL,
        Status::Enemy | Status::Hate => COLOR_ENEMY,
        Status::Family => COLOR_FAMILY,
        Status::LoveInterest => COLOR_LOVE_INTEREST,
        Status::Familiar => COLOR_FAMILIAR,
        Status::Other(_) => COLOR_EDGE_DEFAULT,
    }
}

pub fn get_edge_style(status: &Status) -> EdgeStyle {
    EdgeStyle {
        color: get_edge_color(status),
        width: EDGE_WIDTH,
        opacity: EDGE_OPACITY,
    }
}

/// Colour-coding group of an entity, as shown in the legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupType {
    House(House),
    Staff,
    Residents,
    Outside,
    OtherHogwarts,
}

impl GroupType {
    /// House wins over role; among roles staff, residents, then outsiders.
    pub fn of(roles: &BTreeSet<Role>, house: Option<House>) -> Self {
        if let Some(house) = house {
            return GroupType::House(house);
        }
        if roles.contains(&Role::Staff) {
            GroupType::Staff
        } else if roles.contains(&Role::Resident) {
            GroupType::Residents
        } else if roles.contains(&Role::Outsider) || roles.is_empty() {
            GroupType::Outside
        } else {
            GroupType::OtherHogwarts
        }
    }
}

pub fn get_group_color(group: GroupType) -> Color {
    match group {
        GroupType::House(House::Slytherin) => COLOR_SLYTHERIN,
        GroupType::House(House::Ravenclaw) => COLOR_RAVENCLAW,
        GroupType::House(House::Gryffindor) => COLOR_GRYFFINDOR,
        GroupType::House(House::Hufflepuff) => COLOR_HUFFLEPUFF,
        GroupType::Staff => COLOR_STAFF,
        GroupType::Residents => COLOR_RESIDENTS,
        GroupType::Outside => COLOR_OUTSIDE,
        GroupType::OtherHogwarts => COLOR_OTHER_HOGWARTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_colors() {
        assert_eq!(get_edge_color(&Status::Friend), COLOR_FRIEND);
        assert_eq!(get_edge_color(&Status::Hate), get_edge_color(&Status::Enemy));
        assert_eq!(get_edge_color(&Status::parse("Mentor")), COLOR_EDGE_DEFAULT);
    }

    #[test]
    fn test_unknown_status_uses_default_style_key() {
        assert_eq!(style_key(&Status::BestFriend), "Best Friend");
        assert_eq!(style_key(&Status::parse("Mentor")), DEFAULT_STYLE_KEY);
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(COLOR_FRIEND.to_hex(), "#00a46d");
        assert_eq!(Color::rgba(255, 0, 0, 128).to_hex(), "#ff000080");
        assert_eq!(serde_json::to_string(&COLOR_FAMILY).unwrap(), "\"#3b82f6\"");
    }

    #[test]
    fn test_group_type_precedence() {
        let staff: BTreeSet<Role> = [Role::Staff].into();
        assert_eq!(
            GroupType::of(&staff, Some(House::Ravenclaw)),
            GroupType::House(House::Ravenclaw)
        );
        assert_eq!(GroupType::of(&staff, None), GroupType::Staff);
        assert_eq!(GroupType::of(&[Role::Student].into(), None), GroupType::OtherHogwarts);
        assert_eq!(GroupType::of(&BTreeSet::new(), None), GroupType::Outside);
        assert_eq!(get_group_color(GroupType::Residents), COLOR_RESIDENTS);
    }
}
