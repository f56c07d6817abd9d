//! Static partition of the canvas into named rectangular regions.
//!
//! Region rectangles are computed once from a stacked band layout (role bands
//! top to bottom, house columns inside the banded roles) plus a separate band
//! for unaffiliated entities. Key derivation is an ordered rule table: the
//! first rule whose predicate holds names the region.

use crate::geometry::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use socialmap_core::{House, Role, houses_of, roles_of};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionKey(pub String);

impl RegionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Rule table
// ============================================================================

/// One row of the key derivation table.
///
/// The rule applies when the category set contains `role` (and a house, if
/// `requires_house`). `template` may reference the entity's house as
/// `{house}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRule {
    pub role: Role,
    #[serde(default)]
    pub requires_house: bool,
    pub template: String,
}

impl RegionRule {
    pub fn new(role: Role, requires_house: bool, template: impl Into<String>) -> Self {
        Self {
            role,
            requires_house,
            template: template.into(),
        }
    }

    pub fn apply(&self, roles: &BTreeSet<Role>, house: Option<House>) -> Option<RegionKey> {
        if !roles.contains(&self.role) {
            return None;
        }
        if self.requires_house && house.is_none() {
            return None;
        }
        if self.template.contains("{house}") {
            let house = house?;
            return Some(RegionKey(self.template.replace("{house}", house.label())));
        }
        Some(RegionKey(self.template.clone()))
    }
}

pub fn default_rules() -> Vec<RegionRule> {
    vec![
        RegionRule::new(Role::Staff, true, "Hogwarts Staff+{house}"),
        RegionRule::new(Role::Staff, false, "Hogwarts Staff"),
        RegionRule::new(Role::Student, true, "Student+{house}"),
        RegionRule::new(Role::Student, false, "Student+Gryffindor"),
        RegionRule::new(Role::Resident, true, "Non-Academic Residents+{house}"),
        RegionRule::new(Role::Resident, false, "Non-Academic Residents"),
        RegionRule::new(Role::Outsider, false, "Outside of Hogwarts"),
    ]
}

// ============================================================================
// Band layout configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BandKind {
    /// One full-width region keyed by the role label.
    Full { role: Role },
    /// One region per house column, keyed `"{role}+{house}"`.
    Columns { role: Role },
}

impl BandKind {
    pub fn role(&self) -> Role {
        match *self {
            BandKind::Full { role } | BandKind::Columns { role } => role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    #[serde(flatten)]
    pub kind: BandKind,
    pub height: f32,
    #[serde(default)]
    pub gap_after: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionLayoutConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub section_padding: f32,
    pub column_gap: f32,
    /// Left-to-right column order.
    pub columns: Vec<House>,
    /// Top-to-bottom band order inside the campus box.
    pub bands: Vec<Band>,
    pub outside_gap: f32,
    pub outside_height_fraction: f32,
    /// Tie-break when an entity carries more than one house.
    pub house_priority: Vec<House>,
    pub rules: Vec<RegionRule>,
    pub default_key: String,
    pub campus_key: String,
}

impl Default for RegionLayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1920.0,
            canvas_height: 1080.0,
            section_padding: 50.0,
            column_gap: 5.0,
            columns: House::ALL.to_vec(),
            bands: vec![
                Band {
                    kind: BandKind::Full { role: Role::Staff },
                    height: 120.0,
                    gap_after: 10.0,
                },
                Band {
                    kind: BandKind::Columns { role: Role::Staff },
                    height: 250.0,
                    gap_after: 0.0,
                },
                Band {
                    kind: BandKind::Columns {
                        role: Role::Student,
                    },
                    height: 450.0,
                    gap_after: 0.0,
                },
                Band {
                    kind: BandKind::Columns {
                        role: Role::Resident,
                    },
                    height: 100.0,
                    gap_after: 10.0,
                },
                Band {
                    kind: BandKind::Full {
                        role: Role::Resident,
                    },
                    height: 80.0,
                    gap_after: 0.0,
                },
            ],
            outside_gap: 20.0,
            outside_height_fraction: 0.25,
            house_priority: vec![
                House::Slytherin,
                House::Ravenclaw,
                House::Gryffindor,
                House::Hufflepuff,
            ],
            rules: default_rules(),
            default_key: Role::Outsider.label().to_string(),
            campus_key: "Hogwarts".to_string(),
        }
    }
}

// ============================================================================
// Region map
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutlineKind {
    Campus,
    RoleBand(Role),
    HouseColumn(House),
    Outside,
}

/// Decorative box a renderer draws behind the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionOutline {
    pub label: String,
    pub kind: OutlineKind,
    pub rect: Rect,
}

#[derive(Debug, Clone)]
pub struct RegionMap {
    regions: Vec<(RegionKey, Rect)>,
    index: HashMap<RegionKey, usize>,
    outlines: Vec<RegionOutline>,
    rules: Vec<RegionRule>,
    house_priority: Vec<House>,
    default_key: RegionKey,
}

impl Default for RegionMap {
    fn default() -> Self {
        Self::new(&RegionLayoutConfig::default())
    }
}

impl RegionMap {
    pub fn new(config: &RegionLayoutConfig) -> Self {
        let mut map = Self {
            regions: Vec::new(),
            index: HashMap::new(),
            outlines: Vec::new(),
            rules: config.rules.clone(),
            house_priority: config.house_priority.clone(),
            default_key: RegionKey::new(config.default_key.clone()),
        };

        let padding = config.section_padding;
        let band_total: f32 = config.bands.iter().map(|b| b.height).sum();
        let campus = Rect::from_pos_size(
            Vec2::ZERO,
            Vec2::new(config.canvas_width, band_total + padding * 2.0),
        );
        map.insert(RegionKey::new(config.campus_key.clone()), campus);
        map.outlines.push(RegionOutline {
            label: config.campus_key.clone(),
            kind: OutlineKind::Campus,
            rect: campus,
        });

        let inner_width = config.canvas_width - padding * 2.0;
        let column_count = config.columns.len().max(1) as f32;
        let column_width =
            (inner_width - (column_count - 1.0) * config.column_gap) / column_count;

        let mut role_boxes: Vec<(Role, Rect)> = Vec::new();
        let mut house_boxes: Vec<(House, Rect)> = Vec::new();
        let mut y = campus.y() + padding;

        for band in &config.bands {
            let role = band.kind.role();
            let band_rect = match band.kind {
                BandKind::Full { role } => {
                    let rect = Rect::from_pos_size(
                        Vec2::new(campus.x() + padding, y),
                        Vec2::new(inner_width, band.height),
                    );
                    map.insert(RegionKey::new(role.label()), rect);
                    rect
                }
                BandKind::Columns { role } => {
                    let mut covered: Option<Rect> = None;
                    for (i, house) in config.columns.iter().enumerate() {
                        let step = column_width + config.column_gap;
                        let x = campus.x() + padding + i as f32 * step;
                        let rect = Rect::from_pos_size(
                            Vec2::new(x, y),
                            Vec2::new(column_width, band.height),
                        );
                        map.insert(
                            RegionKey::new(format!("{}+{}", role.label(), house.label())),
                            rect,
                        );
                        merge_box(&mut house_boxes, *house, rect);
                        covered = Some(covered.map_or(rect, |c| c.union(&rect)));
                    }
                    covered.unwrap_or_else(|| {
                        Rect::from_pos_size(
                            Vec2::new(campus.x() + padding, y),
                            Vec2::new(inner_width, band.height),
                        )
                    })
                }
            };
            merge_box(&mut role_boxes, role, band_rect);
            y += band.height + band.gap_after;
        }

        for (role, rect) in role_boxes {
            map.outlines.push(RegionOutline {
                label: role_outline_label(role).to_string(),
                kind: OutlineKind::RoleBand(role),
                rect,
            });
        }
        for (house, rect) in house_boxes {
            map.outlines.push(RegionOutline {
                label: house.label().to_string(),
                kind: OutlineKind::HouseColumn(house),
                rect,
            });
        }

        let outside = Rect::from_pos_size(
            Vec2::new(0.0, campus.height() + config.outside_gap),
            Vec2::new(
                config.canvas_width,
                config.canvas_height * config.outside_height_fraction - config.outside_gap,
            ),
        );
        map.insert(RegionKey::new(Role::Outsider.label()), outside);
        map.outlines.push(RegionOutline {
            label: Role::Outsider.label().to_string(),
            kind: OutlineKind::Outside,
            rect: outside,
        });

        if !map.index.contains_key(&map.default_key) {
            tracing::warn!(
                "Default region {} is not laid out; falling back to the campus box",
                map.default_key
            );
            map.insert(map.default_key.clone(), campus);
        }

        map
    }

    fn insert(&mut self, key: RegionKey, rect: Rect) {
        match self.index.get(&key) {
            Some(&idx) => self.regions[idx].1 = rect,
            None => {
                self.index.insert(key.clone(), self.regions.len());
                self.regions.push((key, rect));
            }
        }
    }

    /// The house that wins the tie-break for `categories`, if any.
    pub fn primary_house(&self, categories: &BTreeSet<String>) -> Option<House> {
        let houses = houses_of(categories);
        self.house_priority
            .iter()
            .copied()
            .find(|h| houses.contains(h))
            .or_else(|| houses.into_iter().next())
    }

    /// Region key for a category set. Pure and total.
    pub fn key_of(&self, categories: &BTreeSet<String>) -> RegionKey {
        let roles = roles_of(categories);
        let house = self.primary_house(categories);
        self.rules
            .iter()
            .find_map(|rule| rule.apply(&roles, house))
            .unwrap_or_else(|| self.default_key.clone())
    }

    /// Rectangle of `key`, or of the default region when the key is unknown.
    pub fn rect_of(&self, key: &RegionKey) -> Rect {
        match self.index.get(key) {
            Some(&idx) => self.regions[idx].1,
            None => {
                tracing::debug!("Unknown region {}; using {}", key, self.default_key);
                self.default_rect()
            }
        }
    }

    pub fn default_rect(&self) -> Rect {
        self.index
            .get(&self.default_key)
            .map(|&idx| self.regions[idx].1)
            .unwrap_or_default()
    }

    pub fn contains_key(&self, key: &RegionKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn regions(&self) -> impl Iterator<Item = (&RegionKey, Rect)> {
        self.regions.iter().map(|(k, r)| (k, *r))
    }

    pub fn outlines(&self) -> &[RegionOutline] {
        &self.outlines
    }
}

fn merge_box<K: PartialEq + Copy>(boxes: &mut Vec<(K, Rect)>, key: K, rect: Rect) {
    match boxes.iter_mut().find(|(k, _)| *k == key) {
        Some((_, existing)) => *existing = existing.union(&rect),
        None => boxes.push((key, rect)),
    }
}

fn role_outline_label(role: Role) -> &'static str {
    match role {
        Role::Student => "Students",
        other => other.label(),
    }
}
