use socialmap_core::{Entity, House, Relationship, Role};

const STATUSES: [&str; 6] = ["Friend", "Rival", "Enemy", "Family", "Cordial", "Familiar"];

/// Deterministic synthetic cast spread across every band and house.
pub fn generate_synthetic_cast(
    entity_count: usize,
    links_per_entity: usize,
) -> (Vec<Entity>, Vec<Relationship>) {
    let entities: Vec<Entity> = (0..entity_count)
        .map(|i| {
            let role = Role::ALL[i % Role::ALL.len()];
            let mut categories = vec![role.label().to_string()];
            if role != Role::Outsider && i % 3 != 0 {
                categories.push(House::ALL[(i / 4) % House::ALL.len()].label().to_string());
            }
            Entity::new(format!("Character{i}"), categories)
        })
        .collect();

    let mut relationships = Vec::with_capacity(entity_count * links_per_entity);
    for i in 0..entity_count {
        for k in 1..=links_per_entity {
            // Stride by a prime so links cross regions.
            let j = (i + k * 7) % entity_count;
            if i == j {
                continue;
            }
            let status = STATUSES[(i + k) % STATUSES.len()];
            relationships.push(Relationship::new(
                entities[i].id.as_str(),
                entities[j].id.as_str(),
                status,
            ));
        }
    }
    (entities, relationships)
}
