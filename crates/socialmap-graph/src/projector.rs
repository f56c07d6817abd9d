//! Visible-subgraph projection and its reconciliation with the live layout.

use crate::geometry::Vec2;
use crate::graph::{EdgeIndex, GraphModel, NodeIndex};
use crate::layout::{LayoutEngine, grid_seed};
use crate::region::{RegionKey, RegionMap};
use serde::{Deserialize, Serialize};
use socialmap_core::{EntityId, House, Role, houses_of, roles_of};
use std::collections::{BTreeSet, HashMap};

/// Jitter applied to grid seeds, full width on each axis.
pub const SEED_JITTER: f32 = 15.0;

/// Checkbox and focus state owned by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub roles: BTreeSet<Role>,
    pub houses: BTreeSet<House>,
    #[serde(default)]
    pub focus: Option<EntityId>,
    /// Deactivated nodes stay visible but none of their edges are shown.
    #[serde(default)]
    pub inactive: BTreeSet<EntityId>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::all()
    }
}

impl FilterState {
    /// Every role and house checked, no focus.
    pub fn all() -> Self {
        Self {
            roles: Role::ALL.into_iter().collect(),
            houses: House::ALL.into_iter().collect(),
            focus: None,
            inactive: BTreeSet::new(),
        }
    }

    /// Flip a role checkbox; returns the new state.
    pub fn toggle_role(&mut self, role: Role) -> bool {
        if !self.roles.remove(&role) {
            self.roles.insert(role);
            return true;
        }
        false
    }

    pub fn toggle_house(&mut self, house: House) -> bool {
        if !self.houses.remove(&house) {
            self.houses.insert(house);
            return true;
        }
        false
    }

    /// Flip a node between active and inactive. The focus node cannot be
    /// deactivated; `None` means the toggle was refused.
    pub fn toggle_node(&mut self, id: &EntityId) -> Option<bool> {
        if self.focus.as_ref() == Some(id) {
            return None;
        }
        if self.inactive.remove(id) {
            return Some(false);
        }
        self.inactive.insert(id.clone());
        Some(true)
    }

    pub fn is_inactive(&self, id: &EntityId) -> bool {
        self.inactive.contains(id)
    }

    pub fn with_focus(mut self, focus: impl Into<EntityId>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    pub fn without_role(mut self, role: Role) -> Self {
        self.roles.remove(&role);
        self
    }

    pub fn without_house(mut self, house: House) -> Self {
        self.houses.remove(&house);
        self
    }

    /// Role/house rule: every dimension the entity participates in must have
    /// at least one checked category.
    pub fn admits(&self, categories: &BTreeSet<String>) -> bool {
        let roles = roles_of(categories);
        if !roles.is_empty() && roles.is_disjoint(&self.roles) {
            return false;
        }
        let houses = houses_of(categories);
        if !houses.is_empty() && houses.is_disjoint(&self.houses) {
            return false;
        }
        true
    }
}

/// Visible node and edge sets, both in ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
}

impl Projection {
    pub fn contains_node(&self, index: NodeIndex) -> bool {
        self.nodes.binary_search(&index).is_ok()
    }
}

/// Compute the visible subgraph. Pure.
///
/// Edges touching an inactive node are dropped under every rule; the inactive
/// node itself stays visible.
pub fn project(model: &GraphModel, filter: &FilterState) -> Projection {
    let inactive: BTreeSet<NodeIndex> = filter
        .inactive
        .iter()
        .filter_map(|id| model.index_of(id))
        .collect();
    let active_edge = |e: EdgeIndex| {
        let edge = &model.graph[e];
        !inactive.contains(&edge.source_idx) && !inactive.contains(&edge.target_idx)
    };

    let focus = filter.focus.as_ref().and_then(|id| {
        let idx = model.index_of(id);
        if idx.is_none() {
            tracing::debug!("Focus {} is not in the graph; ignoring it", id);
        }
        idx
    });

    if let Some(focus) = focus {
        let mut nodes = model.neighbors(focus);
        nodes.insert(focus);
        let edges = model
            .graph
            .incident_edges(focus)
            .iter()
            .copied()
            .filter(|&e| {
                let edge = &model.graph[e];
                (edge.source_idx == focus) != (edge.target_idx == focus)
            })
            .filter(|&e| active_edge(e))
            .collect::<BTreeSet<_>>();
        return Projection {
            nodes: nodes.into_iter().collect(),
            edges: edges.into_iter().collect(),
        };
    }

    let nodes: Vec<NodeIndex> = model
        .graph
        .node_indices()
        .filter(|&idx| filter.admits(&model.graph[idx].entity.categories))
        .collect();
    let visible: BTreeSet<NodeIndex> = nodes.iter().copied().collect();
    let edges = model
        .graph
        .edge_indices()
        .filter(|&e| {
            let edge = &model.graph[e];
            visible.contains(&edge.source_idx) && visible.contains(&edge.target_idx)
        })
        .filter(|&e| active_edge(e))
        .collect();

    Projection { nodes, edges }
}

/// What a reconciliation changed in the working set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionDelta {
    pub added: Vec<NodeIndex>,
    pub removed: Vec<NodeIndex>,
    pub kept: usize,
}

impl ProjectionDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Bring the engine's working set in line with `projection`.
///
/// Nodes that stay visible keep their simulation state. Removed nodes have
/// their final position and pin written back to the model. Added nodes come
/// back pinned if they left pinned, resume at their last position when it is
/// still inside their region, and are otherwise grid-seeded among the other
/// visible occupants of that region. The engine is reheated afterwards.
pub fn reconcile(
    engine: &mut LayoutEngine,
    model: &mut GraphModel,
    regions: &RegionMap,
    projection: &Projection,
) -> ProjectionDelta {
    let mut delta = ProjectionDelta::default();

    let current: Vec<NodeIndex> = engine.nodes().iter().map(|n| n.index).collect();
    for index in current {
        if projection.contains_node(index) {
            delta.kept += 1;
            continue;
        }
        if let Some(node) = engine.remove_node(index) {
            model.write_back(index, node.position, node.pinned);
            delta.removed.push(index);
        }
    }

    let padding = engine.config().region_padding;
    let mut occupancy: HashMap<RegionKey, usize> = HashMap::new();
    for &index in &projection.nodes {
        *occupancy.entry(model.graph[index].region.clone()).or_default() += 1;
    }
    let mut placed: HashMap<RegionKey, usize> = HashMap::new();
    for node in engine.nodes() {
        *placed.entry(node.region.clone()).or_default() += 1;
    }

    for &index in &projection.nodes {
        if engine.contains(index) {
            continue;
        }
        let node = &model.graph[index];
        let rect = regions.rect_of(&node.region);
        let resume = node.pinned.or_else(|| {
            node.position
                .filter(|p| p.is_finite() && rect.shrink(padding).contains(*p))
        });
        let position: Vec2 = match resume {
            Some(p) => p,
            None => {
                let slot = placed.entry(node.region.clone()).or_default();
                let occupants = occupancy.get(&node.region).copied().unwrap_or(1);
                let p = grid_seed(rect, padding, *slot, occupants, node.id(), SEED_JITTER);
                *slot += 1;
                p
            }
        };
        engine.insert_node(
            index,
            node.id().clone(),
            node.region.clone(),
            rect,
            position,
        );
        if let Some(pin) = node.pinned {
            engine.pin(index, pin);
        }
        delta.added.push(index);
    }

    engine.set_links(
        projection
            .edges
            .iter()
            .filter_map(|&e| model.graph.edge_endpoints(e)),
    );
    engine.reheat();

    tracing::debug!(
        "Projection reconciled: {} kept, {} added, {} removed",
        delta.kept,
        delta.added.len(),
        delta.removed.len()
    );
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialmap_core::{Edge, Entity};

    fn fixture() -> (GraphModel, RegionMap) {
        let regions = RegionMap::default();
        let entities = vec![
            Entity::new("Harry", ["Student", "Gryffindor"]),
            Entity::new("Draco", ["Student", "Slytherin"]),
            Entity::new("Snape", ["Hogwarts Staff", "Slytherin"]),
            Entity::new("Filch", ["Non-Academic Residents"]),
            Entity::new("Xeno", ["Outside of Hogwarts"]),
            Entity::new("Stray", Vec::<String>::new()),
        ];
        let edges = vec![
            Edge::one_way("Harry", "Draco", "Rival"),
            Edge::one_way("Snape", "Harry", "Dislike"),
            Edge::one_way("Draco", "Snape", "Friend"),
            Edge::one_way("Filch", "Draco", "Familiar"),
        ];
        let model = GraphModel::build(entities, edges, &regions).unwrap();
        (model, regions)
    }

    fn ids(model: &GraphModel, nodes: &[NodeIndex]) -> Vec<String> {
        nodes
            .iter()
            .map(|&n| model.graph[n].id().to_string())
            .collect()
    }

    #[test]
    fn test_identity_projection_with_everything_checked() {
        let (model, _) = fixture();
        let p = project(&model, &FilterState::all());
        assert_eq!(p.nodes.len(), model.node_count());
        assert_eq!(p.edges.len(), model.edge_count());
    }

    #[test]
    fn test_focus_shows_neighbours_and_incident_edges_only() {
        let (model, _) = fixture();
        let filter = FilterState::all().with_focus("Harry").without_role(Role::Student);
        let p = project(&model, &filter);

        assert_eq!(ids(&model, &p.nodes), vec!["Harry", "Draco", "Snape"]);
        // Draco -> Snape connects two neighbours but not the focus.
        assert_eq!(p.edges, vec![EdgeIndex(0), EdgeIndex(1)]);
    }

    #[test]
    fn test_unknown_focus_falls_back_to_filters() {
        let (model, _) = fixture();
        let filter = FilterState::all().with_focus("Voldemort");
        assert_eq!(project(&model, &filter), project(&model, &FilterState::all()));
    }

    #[test]
    fn test_dimension_rule() {
        let (model, _) = fixture();
        let filter = FilterState::all().without_house(House::Slytherin);
        let p = project(&model, &filter);
        assert_eq!(ids(&model, &p.nodes), vec!["Harry", "Filch", "Xeno", "Stray"]);
        assert!(p.edges.is_empty());

        // Snape is staff and Slytherin; unchecking staff hides him even
        // though Slytherin is checked.
        let filter = FilterState::all().without_role(Role::Staff);
        let p = project(&model, &filter);
        assert!(!ids(&model, &p.nodes).contains(&"Snape".to_string()));
        assert_eq!(p.edges, vec![EdgeIndex(0), EdgeIndex(3)]);
    }

    #[test]
    fn test_toggle_round_trip_restores_projection() {
        let (model, _) = fixture();
        let mut filter = FilterState::all();
        let before = project(&model, &filter);
        assert!(!filter.toggle_role(Role::Student));
        assert_ne!(project(&model, &filter), before);
        assert!(filter.toggle_role(Role::Student));
        assert_eq!(project(&model, &filter), before);
    }

    #[test]
    fn test_reconcile_keeps_state_of_surviving_nodes() {
        let (mut model, regions) = fixture();
        let mut engine = LayoutEngine::default();
        let projection = project(&model, &FilterState::all());
        reconcile(&mut engine, &mut model, &regions, &projection);
        for _ in 0..10 {
            engine.tick();
        }
        let harry = model.index_of(&EntityId::new("Harry")).unwrap();
        let filch = model.index_of(&EntityId::new("Filch")).unwrap();
        let before = engine.node(harry).unwrap().clone();
        let filch_at = engine.position(filch).unwrap();

        let filter = FilterState::all().without_role(Role::Resident);
        let projection = project(&model, &filter);
        let delta = reconcile(&mut engine, &mut model, &regions, &projection);
        assert_eq!(delta.removed, vec![filch]);
        assert!(delta.added.is_empty());

        let after = engine.node(harry).unwrap();
        assert_eq!(after.position, before.position);
        assert_eq!(after.velocity, before.velocity);
        assert_eq!(model.graph[filch].position, Some(filch_at));
        assert_eq!(engine.alpha(), 0.5);

        let all = project(&model, &FilterState::all());
        let delta = reconcile(&mut engine, &mut model, &regions, &all);
        assert_eq!(delta.added, vec![filch]);
        assert_eq!(engine.position(filch), Some(filch_at));
    }

    #[test]
    fn test_new_nodes_are_seeded_inside_their_region() {
        let (mut model, regions) = fixture();
        let mut engine = LayoutEngine::default();
        let projection = project(&model, &FilterState::all());
        reconcile(&mut engine, &mut model, &regions, &projection);
        for node in engine.nodes() {
            let rect = regions.rect_of(&node.region).shrink(10.0);
            assert!(rect.contains(node.position), "{} seeded outside", node.id);
        }
        assert_eq!(engine.link_count(), model.edge_count());
    }

    #[test]
    fn test_pin_survives_hide_and_show() {
        let (mut model, regions) = fixture();
        let mut engine = LayoutEngine::default();
        let all = project(&model, &FilterState::all());
        reconcile(&mut engine, &mut model, &regions, &all);

        let filch = model.index_of(&EntityId::new("Filch")).unwrap();
        let pin = engine.position(filch).unwrap() + Vec2::new(5.0, 0.0);
        engine.pin(filch, pin);

        let hidden = project(&model, &FilterState::all().without_role(Role::Resident));
        reconcile(&mut engine, &mut model, &regions, &hidden);
        assert_eq!(model.graph[filch].pinned, Some(pin));

        reconcile(&mut engine, &mut model, &regions, &all);
        let node = engine.node(filch).unwrap();
        assert_eq!(node.pinned, Some(pin));
        assert_eq!(node.position, pin);
    }

    #[test]
    fn test_inactive_node_keeps_node_but_drops_its_edges() {
        let (model, _) = fixture();
        let draco = EntityId::new("Draco");
        let mut filter = FilterState::all();
        assert_eq!(filter.toggle_node(&draco), Some(true));
        assert!(filter.is_inactive(&draco));

        let p = project(&model, &filter);
        assert_eq!(p.nodes.len(), model.node_count());
        // Only Snape -> Harry avoids Draco.
        assert_eq!(p.edges, vec![EdgeIndex(1)]);

        let focused = project(&model, &filter.clone().with_focus("Harry"));
        assert_eq!(ids(&model, &focused.nodes), vec!["Harry", "Draco", "Snape"]);
        assert_eq!(focused.edges, vec![EdgeIndex(1)]);

        assert_eq!(filter.toggle_node(&draco), Some(false));
        assert_eq!(project(&model, &filter), project(&model, &FilterState::all()));
    }

    #[test]
    fn test_focus_node_cannot_be_deactivated() {
        let harry = EntityId::new("Harry");
        let mut filter = FilterState::all().with_focus(harry.clone());
        assert_eq!(filter.toggle_node(&harry), None);
        assert!(!filter.is_inactive(&harry));
    }
}
