use crate::error::GraphError;
use crate::geometry::Vec2;
use crate::region::{RegionKey, RegionMap};
use serde::{Deserialize, Serialize};
use socialmap_core::{Edge, Entity, EntityId, validate_entities};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::Index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeIndex(pub usize);

impl fmt::Display for EdgeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub entity: Entity,
    /// Derived from `entity.categories`; only [`GraphModel::set_categories`]
    /// changes it.
    pub region: RegionKey,
    /// Last position written back by the layout engine.
    pub position: Option<Vec2>,
    /// Pin held when the node last left the working set.
    pub pinned: Option<Vec2>,
}

impl GraphNode {
    pub fn id(&self) -> &EntityId {
        &self.entity.id
    }
}

#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub edge: Edge,
    pub source_idx: NodeIndex,
    pub target_idx: NodeIndex,
}

#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    adjacency: Vec<Vec<EdgeIndex>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len());
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        idx
    }

    pub fn add_edge(
        &mut self,
        source_idx: NodeIndex,
        target_idx: NodeIndex,
        edge: Edge,
    ) -> EdgeIndex {
        let idx = EdgeIndex(self.edges.len());
        self.edges.push(GraphEdge {
            edge,
            source_idx,
            target_idx,
        });
        self.adjacency[source_idx.0].push(idx);
        if target_idx != source_idx {
            self.adjacency[target_idx.0].push(idx);
        }
        idx
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.nodes.len()).map(NodeIndex)
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> {
        (0..self.edges.len()).map(EdgeIndex)
    }

    pub fn edge_endpoints(&self, index: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.edges
            .get(index.0)
            .map(|e| (e.source_idx, e.target_idx))
    }

    pub fn edge_weight(&self, index: EdgeIndex) -> Option<&GraphEdge> {
        self.edges.get(index.0)
    }

    /// Edges with `index` as an endpoint, in insertion order.
    pub fn incident_edges(&self, index: NodeIndex) -> &[EdgeIndex] {
        self.adjacency
            .get(index.0)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Index<NodeIndex> for Graph {
    type Output = GraphNode;
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.0]
    }
}

impl Index<EdgeIndex> for Graph {
    type Output = GraphEdge;
    fn index(&self, index: EdgeIndex) -> &Self::Output {
        &self.edges[index.0]
    }
}

/// The full entity graph. Node and edge sets are fixed after construction;
/// only positions and categories change.
#[derive(Debug, Default)]
pub struct GraphModel {
    pub graph: Graph,
    pub node_map: HashMap<EntityId, NodeIndex>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from validated entities and consolidated edges.
    ///
    /// Edges whose endpoints are unknown are dropped with a warning.
    pub fn build(
        entities: Vec<Entity>,
        edges: Vec<Edge>,
        regions: &RegionMap,
    ) -> Result<Self, GraphError> {
        validate_entities(&entities)?;

        let mut model = Self::new();
        for entity in entities {
            model.add_node(entity, regions);
        }
        for edge in edges {
            model.add_edge(edge);
        }
        tracing::debug!(
            "Built graph model with {} nodes and {} edges",
            model.node_count(),
            model.edge_count()
        );
        Ok(model)
    }

    pub fn add_node(&mut self, entity: Entity, regions: &RegionMap) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&entity.id) {
            return idx;
        }
        let id = entity.id.clone();
        let region = regions.key_of(&entity.categories);
        let idx = self.graph.add_node(GraphNode {
            entity,
            region,
            position: None,
            pinned: None,
        });
        self.node_map.insert(id, idx);
        idx
    }

    pub fn add_edge(&mut self, edge: Edge) -> Option<EdgeIndex> {
        match (
            self.node_map.get(&edge.source).copied(),
            self.node_map.get(&edge.target).copied(),
        ) {
            (Some(src), Some(target)) => Some(self.graph.add_edge(src, target, edge)),
            (src, target) => {
                if src.is_none() {
                    tracing::warn!(
                        "Dropping edge {} because source node {} is missing from graph model",
                        edge.key(),
                        edge.source
                    );
                }
                if target.is_none() {
                    tracing::warn!(
                        "Dropping edge {} because target node {} is missing from graph model",
                        edge.key(),
                        edge.target
                    );
                }
                None
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn index_of(&self, id: &EntityId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    pub fn get_node(&self, id: &EntityId) -> Option<&GraphNode> {
        self.node_map.get(id).map(|&idx| &self.graph[idx])
    }

    /// Distinct neighbours of `index` over all edges.
    pub fn neighbors(&self, index: NodeIndex) -> BTreeSet<NodeIndex> {
        self.graph
            .incident_edges(index)
            .iter()
            .filter_map(|&e| {
                let edge = &self.graph[e];
                if edge.source_idx == index {
                    Some(edge.target_idx)
                } else if edge.target_idx == index {
                    Some(edge.source_idx)
                } else {
                    None
                }
            })
            .filter(|&n| n != index)
            .collect()
    }

    /// Record the final layout state of a node leaving the working set.
    pub fn write_back(&mut self, index: NodeIndex, position: Vec2, pinned: Option<Vec2>) {
        if let Some(node) = self.graph.nodes.get_mut(index.0) {
            node.position = Some(position);
            node.pinned = pinned;
        }
    }

    /// Replace the categories of `index` and re-derive its region.
    ///
    /// Returns the new region key, or `None` if the index is unknown.
    pub fn set_categories(
        &mut self,
        index: NodeIndex,
        categories: BTreeSet<String>,
        regions: &RegionMap,
    ) -> Option<RegionKey> {
        let node = self.graph.nodes.get_mut(index.0)?;
        node.region = regions.key_of(&categories);
        node.entity.categories = categories;
        Some(node.region.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialmap_core::CoreError;

    fn model() -> GraphModel {
        let entities = vec![
            Entity::new("Harry", ["Student", "Gryffindor"]),
            Entity::new("Draco", ["Student", "Slytherin"]),
            Entity::new("Hagrid", ["Hogwarts Staff"]),
        ];
        let edges = vec![
            Edge::one_way("Harry", "Draco", "Rival"),
            Edge::one_way("Hagrid", "Harry", "Friend"),
            Edge::one_way("Harry", "Dobby", "Friend"),
        ];
        GraphModel::build(entities, edges, &RegionMap::default()).unwrap()
    }

    #[test]
    fn test_graph_model() {
        let model = model();
        assert_eq!(model.node_count(), 3);
        assert_eq!(model.edge_count(), 2);

        let harry = model.get_node(&EntityId::new("Harry")).unwrap();
        assert_eq!(harry.region.as_str(), "Student+Gryffindor");
        assert!(harry.position.is_none());
    }

    #[test]
    fn test_neighbors_and_incident_edges() {
        let model = model();
        let harry = model.index_of(&EntityId::new("Harry")).unwrap();
        let draco = model.index_of(&EntityId::new("Draco")).unwrap();
        let hagrid = model.index_of(&EntityId::new("Hagrid")).unwrap();

        assert_eq!(
            model.neighbors(harry),
            [draco, hagrid].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(model.graph.incident_edges(draco).len(), 1);
    }

    #[test]
    fn test_set_categories_rederives_region() {
        let mut model = model();
        let regions = RegionMap::default();
        let draco = model.index_of(&EntityId::new("Draco")).unwrap();

        let key = model
            .set_categories(draco, ["Non-Academic Residents".to_string()].into(), &regions)
            .unwrap();
        assert_eq!(key.as_str(), "Non-Academic Residents");
        assert_eq!(model.graph[draco].region, key);
    }

    #[test]
    fn test_write_back_keeps_pin() {
        let mut model = model();
        let hagrid = model.index_of(&EntityId::new("Hagrid")).unwrap();
        let pin = Vec2::new(300.0, 120.0);
        model.write_back(hagrid, pin, Some(pin));
        assert_eq!(model.graph[hagrid].position, Some(pin));
        assert_eq!(model.graph[hagrid].pinned, Some(pin));

        model.write_back(hagrid, Vec2::new(310.0, 130.0), None);
        assert_eq!(model.graph[hagrid].pinned, None);
    }

    #[test]
    fn test_build_rejects_duplicate_ids() {
        let entities = vec![Entity::new("A", ["Student"]), Entity::new("A", ["Student"])];
        let err = GraphModel::build(entities, Vec::new(), &RegionMap::default()).unwrap_err();
        assert!(matches!(err, GraphError::Core(CoreError::DuplicateEntity(_))));
    }
}
