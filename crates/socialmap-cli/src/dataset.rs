//! JSON dataset loader.
//!
//! The dataset bundles three record lists: character identity, social group
//! membership and directed relationships. Entities are the union of all
//! relationship endpoints; the other two lists only enrich them.

use anyhow::{Context, Result};
use serde::Deserialize;
use socialmap_core::{Entity, Relationship, Role, Status};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct CharacterRecord {
    #[serde(rename = "CharacterID")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SocialRecord {
    #[serde(rename = "CharacterID")]
    pub id: String,
    #[serde(rename = "Groups", default)]
    pub groups: Vec<String>,
}

/// Capital arrives as a number or as numeric text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Capital {
    Number(f32),
    Text(String),
}

impl Default for Capital {
    fn default() -> Self {
        Capital::Number(0.0)
    }
}

impl Capital {
    fn value(&self) -> f32 {
        match self {
            Capital::Number(n) => *n,
            Capital::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RelationshipRecord {
    #[serde(rename = "CharacterID")]
    pub source: String,
    #[serde(rename = "TargetCharacterID")]
    pub target: String,
    #[serde(rename = "SocialCapitalStatus")]
    pub status: String,
    #[serde(rename = "SocialCapital", default)]
    capital: Capital,
}

#[derive(Debug, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub characters: Vec<CharacterRecord>,
    #[serde(default)]
    pub social: Vec<SocialRecord>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        let dataset = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dataset {}", path.display()))?;
        Ok(dataset)
    }

    /// Entities in first-appearance order over the relationship records.
    pub fn entities(&self) -> Vec<Entity> {
        let characters: HashMap<&str, &CharacterRecord> =
            self.characters.iter().map(|c| (c.id.as_str(), c)).collect();
        let social: HashMap<&str, &SocialRecord> =
            self.social.iter().map(|s| (s.id.as_str(), s)).collect();

        let mut seen = BTreeSet::new();
        let mut entities = Vec::new();
        let endpoints = self
            .relationships
            .iter()
            .flat_map(|r| [r.source.as_str(), r.target.as_str()]);

        for id in endpoints {
            if id.trim().is_empty() || !seen.insert(id) {
                continue;
            }
            let groups: Vec<String> = match social.get(id) {
                Some(record) if !record.groups.is_empty() => record.groups.clone(),
                _ => vec![Role::Outsider.label().to_string()],
            };
            let mut entity = Entity::new(id, groups);
            if let Some(character) = characters.get(id) {
                if let Some(name) = character.name.as_deref().filter(|n| !n.trim().is_empty()) {
                    entity = entity.with_display_name(name);
                }
                if let Some(image) = &character.image {
                    entity = entity.with_image(image.clone());
                }
            }
            entities.push(entity);
        }
        entities
    }

    pub fn relationships(&self) -> Vec<Relationship> {
        self.relationships
            .iter()
            .filter(|r| !r.source.trim().is_empty() && !r.target.trim().is_empty())
            .map(|r| {
                Relationship::new(&r.source, &r.target, Status::parse(&r.status))
                    .with_capital(r.capital.value())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "characters": [
            { "CharacterID": "HarryPotter", "Name": "Harry Potter", "image": "harry.png" },
            { "CharacterID": "DracoMalfoy" }
        ],
        "social": [
            { "CharacterID": "HarryPotter", "Groups": ["Student", "Gryffindor"] },
            { "CharacterID": "DracoMalfoy", "Groups": ["Student", "Slytherin"] }
        ],
        "relationships": [
            { "CharacterID": "HarryPotter", "TargetCharacterID": "DracoMalfoy",
              "SocialCapitalStatus": "Rival", "SocialCapital": "3" },
            { "CharacterID": "DracoMalfoy", "TargetCharacterID": "HarryPotter",
              "SocialCapitalStatus": "Rival", "SocialCapital": 2.5 },
            { "CharacterID": "HarryPotter", "TargetCharacterID": "RubeusHagrid",
              "SocialCapitalStatus": "Friend" }
        ]
    }"#;

    #[test]
    fn test_entities_are_relationship_endpoints() {
        let dataset: Dataset = serde_json::from_str(SAMPLE).unwrap();
        let entities = dataset.entities();
        let ids: Vec<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["HarryPotter", "DracoMalfoy", "RubeusHagrid"]);

        assert_eq!(entities[0].display_name, "Harry Potter");
        assert_eq!(entities[0].image_ref.as_deref(), Some("harry.png"));
        assert_eq!(entities[1].display_name, "Draco Malfoy");
        assert!(entities[2].has_category("Outside of Hogwarts"));
        assert_eq!(entities[2].display_name, "Rubeus Hagrid");
    }

    #[test]
    fn test_capital_accepts_text_and_numbers() {
        let dataset: Dataset = serde_json::from_str(SAMPLE).unwrap();
        let rels = dataset.relationships();
        assert_eq!(rels[0].capital, 3.0);
        assert_eq!(rels[1].capital, 2.5);
        assert_eq!(rels[2].capital, 0.0);
        assert_eq!(rels[2].status, Status::Friend);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset.relationships.len(), 3);

        assert!(Dataset::load(Path::new("/no/such/dataset.json")).is_err());
    }
}
