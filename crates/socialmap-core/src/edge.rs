use crate::{Entity, EntityId, Status};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A raw directed relationship record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: EntityId,
    pub target: EntityId,
    pub status: Status,
    #[serde(default)]
    pub capital: f32,
}

impl Relationship {
    pub fn new(source: &str, target: &str, status: impl Into<Status>) -> Self {
        Self {
            source: EntityId::new(source),
            target: EntityId::new(target),
            status: status.into(),
            capital: 0.0,
        }
    }

    pub fn with_capital(mut self, capital: f32) -> Self {
        self.capital = capital;
        self
    }
}

/// A consolidated edge. Endpoints are always plain entity ids.
///
/// When both directions of a pair exist they are merged into one edge:
/// `is_mutual` when the statuses agree, otherwise `reverse_status` carries the
/// target→source status so the edge can be drawn in two colours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: EntityId,
    pub target: EntityId,
    pub status: Status,
    #[serde(default)]
    pub reverse_status: Option<Status>,
    #[serde(default)]
    pub is_mutual: bool,
    #[serde(default)]
    pub capital: f32,
}

impl Edge {
    pub fn one_way(source: &str, target: &str, status: impl Into<Status>) -> Self {
        Self {
            source: EntityId::new(source),
            target: EntityId::new(target),
            status: status.into(),
            reverse_status: None,
            is_mutual: false,
            capital: 0.0,
        }
    }

    /// Key used by renderers to join path descriptors across frames.
    pub fn key(&self) -> String {
        format!("{}->{}:{}", self.source, self.target, self.status)
    }

    /// Both directions exist but carry different statuses.
    pub fn is_split(&self) -> bool {
        !self.is_mutual && self.reverse_status.is_some()
    }
}

/// Merge raw directed relationships into consolidated edges.
///
/// Records are deduplicated on `(source, target, status)` with later capital
/// values winning. Records referencing unknown entities, and
/// self-relationships, are dropped. A record is merged with an opposite record
/// of the same status when one exists, else with the first unmerged opposite
/// record of any status, else it stays one-way. Output order follows the
/// first occurrence of each forward record.
pub fn consolidate(relationships: &[Relationship], entities: &[Entity]) -> Vec<Edge> {
    let known: HashSet<&EntityId> = entities.iter().map(|e| &e.id).collect();

    let mut records: Vec<Relationship> = Vec::with_capacity(relationships.len());
    let mut record_index: HashMap<(EntityId, EntityId, Status), usize> = HashMap::new();

    for rel in relationships {
        if !known.contains(&rel.source) || !known.contains(&rel.target) {
            tracing::warn!(
                "Dropping relationship {} -> {} ({}): endpoint missing from the entity set",
                rel.source,
                rel.target,
                rel.status
            );
            continue;
        }
        if rel.source == rel.target {
            tracing::warn!("Dropping self-relationship on {}", rel.source);
            continue;
        }

        let key = (rel.source.clone(), rel.target.clone(), rel.status.clone());
        match record_index.get(&key) {
            Some(&idx) => records[idx].capital = rel.capital,
            None => {
                record_index.insert(key, records.len());
                records.push(rel.clone());
            }
        }
    }

    let mut by_pair: HashMap<(&EntityId, &EntityId), Vec<usize>> = HashMap::new();
    for (idx, rec) in records.iter().enumerate() {
        by_pair.entry((&rec.source, &rec.target)).or_default().push(idx);
    }

    // Exact-status partners are claimed first so a differing-status record
    // never steals the reverse record of a mutual pair.
    let mut partner: Vec<Option<usize>> = vec![None; records.len()];
    for (idx, rec) in records.iter().enumerate() {
        if partner[idx].is_some() {
            continue;
        }
        let matched = by_pair.get(&(&rec.target, &rec.source)).and_then(|candidates| {
            candidates
                .iter()
                .copied()
                .find(|&j| partner[j].is_none() && records[j].status == rec.status)
        });
        if let Some(j) = matched {
            partner[idx] = Some(j);
            partner[j] = Some(idx);
        }
    }
    for (idx, rec) in records.iter().enumerate() {
        if partner[idx].is_some() {
            continue;
        }
        let matched = by_pair
            .get(&(&rec.target, &rec.source))
            .and_then(|candidates| candidates.iter().copied().find(|&j| partner[j].is_none()));
        if let Some(j) = matched {
            partner[idx] = Some(j);
            partner[j] = Some(idx);
        }
    }

    let mut edges = Vec::with_capacity(records.len());
    for (idx, rec) in records.iter().enumerate() {
        let reverse = match partner[idx] {
            // The earlier record of a pair carries the edge.
            Some(j) if j < idx => continue,
            Some(j) => Some(&records[j]),
            None => None,
        };

        let reverse_status = reverse.map(|r| r.status.clone());
        let is_mutual = reverse_status.as_ref() == Some(&rec.status);

        edges.push(Edge {
            source: rec.source.clone(),
            target: rec.target.clone(),
            status: rec.status.clone(),
            reverse_status,
            is_mutual,
            capital: rec.capital,
        });
    }

    tracing::debug!(
        "Consolidated {} relationship records into {} edges",
        relationships.len(),
        edges.len()
    );
    edges
}
