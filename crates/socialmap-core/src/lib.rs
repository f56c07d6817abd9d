use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub mod category;
pub mod edge;
pub mod error;
pub mod status;

pub use category::{House, Role, houses_of, roles_of};
pub use edge::{Edge, Relationship, consolidate};
pub use error::CoreError;
pub use status::Status;

/// Stable identifier of an entity, as found in the source records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ============================================================================
// Entity Types
// ============================================================================

/// Identity and category record of a single entity.
///
/// Positions are not part of this record; they live in the graph model, which
/// is the only place allowed to mutate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub display_name: String,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

impl Entity {
    pub fn new(
        id: impl Into<String>,
        categories: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let id = EntityId::new(id);
        Self {
            display_name: display_name_from_id(id.as_str()),
            id,
            image_ref: None,
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }
}

/// Derive a readable name from a CamelCase id: `"HarryPotter"` -> `"Harry Potter"`.
pub fn display_name_from_id(id: &str) -> String {
    let mut name = String::with_capacity(id.len() + 4);
    for ch in id.chars() {
        if ch.is_uppercase() && !name.is_empty() && !name.ends_with(' ') {
            name.push(' ');
        }
        name.push(ch);
    }
    name.trim().to_string()
}

/// Reject empty ids and duplicates before any graph is built from `entities`.
pub fn validate_entities(entities: &[Entity]) -> Result<(), CoreError> {
    let mut seen = std::collections::HashSet::with_capacity(entities.len());
    for entity in entities {
        if entity.id.as_str().trim().is_empty() {
            return Err(CoreError::EmptyEntityId);
        }
        if !seen.insert(&entity.id) {
            return Err(CoreError::DuplicateEntity(entity.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_from_camel_case_id() {
        assert_eq!(display_name_from_id("HarryPotter"), "Harry Potter");
        assert_eq!(display_name_from_id("Hagrid"), "Hagrid");
        assert_eq!(display_name_from_id(""), "");
    }

    #[test]
    fn test_validate_entities_rejects_duplicates_and_empty_ids() {
        let ok = vec![Entity::new("A", ["Student"]), Entity::new("B", ["Student"])];
        assert!(validate_entities(&ok).is_ok());

        let dup = vec![Entity::new("A", ["Student"]), Entity::new("A", ["Slytherin"])];
        assert!(matches!(
            validate_entities(&dup),
            Err(CoreError::DuplicateEntity(id)) if id.as_str() == "A"
        ));

        let empty = vec![Entity::new(" ", Vec::<String>::new())];
        assert!(matches!(validate_entities(&empty), Err(CoreError::EmptyEntityId)));
    }

    #[test]
    fn test_entity_id_serializes_transparently() {
        let json = serde_json::to_string(&EntityId::new("Luna")).unwrap();
        assert_eq!(json, "\"Luna\"");
    }
}
