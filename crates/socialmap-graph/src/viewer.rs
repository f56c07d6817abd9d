//! The viewer session: one explicit context owning the region map, graph
//! model, layout engine, router and drag state.

use crate::config::ViewerConfig;
use crate::drag::DragController;
use crate::edge_router::{EdgePath, EdgeRouter};
use crate::error::GraphError;
use crate::geometry::Vec2;
use crate::graph::{GraphModel, NodeIndex};
use crate::layout::{LayoutEngine, SimulationState};
use crate::projector::{FilterState, Projection, ProjectionDelta, project, reconcile};
use crate::region::{RegionKey, RegionMap};
use crate::style::{Color, GroupType, get_group_color};
use serde::Serialize;
use socialmap_core::{
    Edge, Entity, EntityId, House, Relationship, Role, consolidate, roles_of, validate_entities,
};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Per-node render data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: EntityId,
    pub label: String,
    pub image: Option<String>,
    pub region: RegionKey,
    pub group: GroupType,
    pub color: Color,
    pub position: Vec2,
    pub pinned: bool,
    /// Deactivated by the user; drawn dimmed with no edges.
    pub inactive: bool,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub tick: u64,
    pub alpha: f32,
    pub state: SimulationState,
    pub positions: BTreeMap<EntityId, Vec2>,
    pub nodes: Vec<NodeView>,
    pub paths: Vec<EdgePath>,
}

#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    regions: RegionMap,
    model: GraphModel,
    engine: LayoutEngine,
    router: EdgeRouter,
    drag: DragController,
    filter: FilterState,
    projection: Projection,
}

impl Viewer {
    /// Consolidate `relationships` and start a session showing everything.
    pub fn create(
        entities: Vec<Entity>,
        relationships: &[Relationship],
        config: ViewerConfig,
    ) -> Result<Self, GraphError> {
        validate_entities(&entities)?;
        let edges = consolidate(relationships, &entities);
        Self::from_edges(entities, edges, config)
    }

    /// Start a session from already consolidated edges.
    pub fn from_edges(
        entities: Vec<Entity>,
        edges: Vec<Edge>,
        config: ViewerConfig,
    ) -> Result<Self, GraphError> {
        let regions = RegionMap::new(&config.regions);
        let model = GraphModel::build(entities, edges, &regions)?;
        let engine = LayoutEngine::new(config.layout.clone());

        let mut viewer = Self {
            router: EdgeRouter::new(config.router),
            drag: DragController::new(config.drag_mode),
            regions,
            model,
            engine,
            filter: FilterState::all(),
            projection: Projection::default(),
            config,
        };
        viewer.project(FilterState::all());
        viewer.engine.reheat_to(viewer.config.layout.alpha_initial);

        tracing::info!(
            "Viewer created with {} entities and {} edges",
            viewer.model.node_count(),
            viewer.model.edge_count()
        );
        Ok(viewer)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    pub fn advance(&mut self, dt: Duration) -> usize {
        self.engine.advance(dt)
    }

    pub fn tick(&mut self) {
        self.engine.tick();
    }

    /// Apply a new filter state and reconcile the working set with it.
    ///
    /// A drag whose node is hidden by the new projection is cancelled first.
    pub fn project(&mut self, filter: FilterState) -> ProjectionDelta {
        let projection = project(&self.model, &filter);
        if let Some(active) = self.drag.active()
            && !projection.contains_node(active)
        {
            tracing::debug!("Dragged node {} left the projection", active);
            self.drag.cancel(&mut self.engine);
        }
        let delta = reconcile(&mut self.engine, &mut self.model, &self.regions, &projection);
        self.filter = filter;
        self.projection = projection;
        delta
    }

    pub fn toggle_role(&mut self, role: Role) -> ProjectionDelta {
        let mut filter = self.filter.clone();
        filter.toggle_role(role);
        self.project(filter)
    }

    pub fn toggle_house(&mut self, house: House) -> ProjectionDelta {
        let mut filter = self.filter.clone();
        filter.toggle_house(house);
        self.project(filter)
    }

    /// Activate or deactivate one node. Returns the new inactive flag, or
    /// `None` for unknown entities and the focus node.
    pub fn toggle_node(&mut self, id: &EntityId) -> Option<bool> {
        self.visible_index(id, "node toggle")?;
        let mut filter = self.filter.clone();
        let inactive = filter.toggle_node(id)?;
        self.project(filter);
        Some(inactive)
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    fn visible_index(&self, id: &EntityId, event: &str) -> Option<NodeIndex> {
        let index = self.model.index_of(id);
        if index.is_none() {
            tracing::debug!("Ignoring {} for unknown entity {}", event, id);
        }
        index
    }

    pub fn drag_start(&mut self, id: &EntityId) -> bool {
        match self.visible_index(id, "drag start") {
            Some(index) => self.drag.start(&mut self.engine, index),
            None => false,
        }
    }

    pub fn drag_move(&mut self, id: &EntityId, pointer: Vec2) -> bool {
        match self.visible_index(id, "drag move") {
            Some(index) => self.drag.move_to(&mut self.engine, index, pointer),
            None => false,
        }
    }

    pub fn drag_end(&mut self, id: &EntityId) -> bool {
        match self.visible_index(id, "drag end") {
            Some(index) => self.drag.end(&mut self.engine, index),
            None => false,
        }
    }

    /// Replace an entity's categories. Its region is re-derived, it is
    /// re-clamped if visible, and the current filter is re-applied.
    pub fn set_categories(
        &mut self,
        id: &EntityId,
        categories: BTreeSet<String>,
    ) -> Option<RegionKey> {
        let index = self.visible_index(id, "category update")?;
        let key = self.model.set_categories(index, categories, &self.regions)?;
        self.engine
            .set_region(index, key.clone(), self.regions.rect_of(&key));
        self.project(self.filter.clone());
        tracing::debug!("Entity {} moved to region {}", id, key);
        Some(key)
    }

    // ========================================================================
    // Output
    // ========================================================================

    pub fn positions(&self) -> BTreeMap<EntityId, Vec2> {
        self.engine
            .nodes()
            .iter()
            .map(|n| (n.id.clone(), n.position))
            .collect()
    }

    pub fn paths(&self) -> Vec<EdgePath> {
        self.router
            .route(&self.model, &self.projection.edges, |idx| self.engine.position(idx))
    }

    pub fn nodes(&self) -> Vec<NodeView> {
        self.projection
            .nodes
            .iter()
            .filter_map(|&idx| {
                let sim = self.engine.node(idx)?;
                let node = &self.model.graph[idx];
                let roles = roles_of(&node.entity.categories);
                let house = self.regions.primary_house(&node.entity.categories);
                let group = GroupType::of(&roles, house);
                Some(NodeView {
                    id: node.id().clone(),
                    label: node.entity.display_name.clone(),
                    image: node.entity.image_ref.clone(),
                    region: node.region.clone(),
                    group,
                    color: get_group_color(group),
                    position: sim.position,
                    pinned: sim.is_pinned(),
                    inactive: self.filter.is_inactive(node.id()),
                })
            })
            .collect()
    }

    pub fn frame(&self) -> Frame {
        Frame {
            tick: self.engine.tick_count(),
            alpha: self.engine.alpha(),
            state: self.engine.state(),
            positions: self.positions(),
            nodes: self.nodes(),
            paths: self.paths(),
        }
    }

    /// End the session, writing every live position and pin back to the
    /// model.
    pub fn dispose(mut self) -> GraphModel {
        for node in self.engine.nodes() {
            self.model.write_back(node.index, node.position, node.pinned);
        }
        tracing::info!("Viewer disposed after {} ticks", self.engine.tick_count());
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer() -> Viewer {
        let entities = vec![
            Entity::new("Harry", ["Student", "Gryffindor"]),
            Entity::new("Draco", ["Student", "Slytherin"]),
            Entity::new("Luna", ["Student", "Ravenclaw"]),
        ];
        let relationships = vec![
            Relationship::new("Harry", "Draco", "Rival"),
            Relationship::new("Draco", "Harry", "Rival"),
        ];
        Viewer::create(entities, &relationships, ViewerConfig::default()).unwrap()
    }

    #[test]
    fn test_create_starts_hot_with_everything_visible() {
        let viewer = viewer();
        assert_eq!(viewer.engine().alpha(), 1.0);
        assert_eq!(viewer.positions().len(), 3);
        assert_eq!(viewer.model().edge_count(), 1);
        assert_eq!(viewer.frame().paths.len(), 1);
    }

    #[test]
    fn test_drag_on_hidden_node_is_ignored() {
        let mut viewer = viewer();
        viewer.project(FilterState::all().with_focus("Harry"));
        assert!(!viewer.drag_start(&EntityId::new("Luna")));
        assert!(!viewer.drag_start(&EntityId::new("Nobody")));
        assert!(viewer.drag_start(&EntityId::new("Draco")));
    }

    #[test]
    fn test_toggle_node_updates_views() {
        let mut viewer = viewer();
        let draco = EntityId::new("Draco");
        assert_eq!(viewer.toggle_node(&draco), Some(true));
        assert!(viewer.paths().is_empty());
        let view = viewer.nodes().into_iter().find(|n| n.id == draco).unwrap();
        assert!(view.inactive);

        assert_eq!(viewer.toggle_node(&EntityId::new("Nobody")), None);
        assert_eq!(viewer.toggle_node(&draco), Some(false));
        assert_eq!(viewer.paths().len(), 1);
    }

    #[test]
    fn test_toggle_house_hides_and_restores() {
        let mut viewer = viewer();
        let delta = viewer.toggle_house(House::Ravenclaw);
        assert_eq!(delta.removed.len(), 1);
        assert!(!viewer.positions().contains_key(&EntityId::new("Luna")));
        let delta = viewer.toggle_house(House::Ravenclaw);
        assert_eq!(delta.added.len(), 1);
        assert_eq!(viewer.filter(), &FilterState::all());
    }

    #[test]
    fn test_set_categories_moves_node_to_new_region() {
        let mut viewer = viewer();
        let luna = EntityId::new("Luna");
        let key = viewer
            .set_categories(&luna, ["Outside of Hogwarts".to_string()].into())
            .unwrap();
        assert_eq!(key.as_str(), "Outside of Hogwarts");

        let rect = viewer.regions().rect_of(&key).shrink(10.0);
        assert!(rect.contains(viewer.positions()[&luna]));
        assert_eq!(viewer.engine().alpha(), 0.5);
    }

    #[test]
    fn test_dispose_writes_back_positions() {
        let mut viewer = viewer();
        viewer.advance(Duration::from_millis(50));
        let positions = viewer.positions();
        let model = viewer.dispose();
        for (id, position) in positions {
            assert_eq!(model.get_node(&id).unwrap().position, Some(position));
        }
    }
}
