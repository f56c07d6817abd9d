//! Region-constrained force simulation.
//!
//! The engine owns the live working set (the visible nodes) and advances it
//! one fixed step at a time: link attraction, pairwise repulsion and
//! collision push adjust velocities, velocities are integrated into
//! positions, and every unpinned node is then clamped back into its padded
//! region rectangle.

use crate::geometry::{ClampSide, Rect, Vec2};
use crate::graph::NodeIndex;
use crate::region::RegionKey;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use socialmap_core::EntityId;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Rest length of a link whose endpoints share a region.
    pub link_distance_same_region: f32,
    pub link_distance_cross_region: f32,
    pub link_strength: f32,
    /// Negative values repel.
    pub charge_strength: f32,
    /// Squared distances below this are raised to it before dividing.
    pub charge_distance_min_sq: f32,
    pub collide_radius: f32,
    pub collide_strength: f32,
    pub alpha_initial: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub reheat_alpha: f32,
    pub drag_alpha_target: f32,
    pub region_padding: f32,
    pub step_seconds: f32,
    pub max_steps_per_advance: usize,
    /// Seed for the jiggle that separates coincident nodes.
    pub jiggle_seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            link_distance_same_region: 120.0,
            link_distance_cross_region: 250.0,
            link_strength: 0.1,
            charge_strength: -200.0,
            charge_distance_min_sq: 1.0,
            collide_radius: 70.0,
            collide_strength: 1.0,
            alpha_initial: 1.0,
            alpha_min: 0.001,
            alpha_decay: 0.01,
            velocity_decay: 0.4,
            reheat_alpha: 0.5,
            drag_alpha_target: 0.3,
            region_padding: 10.0,
            step_seconds: 1.0 / 60.0,
            max_steps_per_advance: 4,
            jiggle_seed: 0x5EED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationState {
    /// No tick has run since construction.
    Initializing,
    Running,
    /// Alpha is below `alpha_min`; only containment runs.
    Settling,
}

#[derive(Debug, Clone)]
pub struct SimNode {
    pub index: NodeIndex,
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pinned: Option<Vec2>,
    pub region: RegionKey,
    /// Region rectangle before padding.
    pub region_rect: Rect,
}

impl SimNode {
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
struct SimLink {
    source: usize,
    target: usize,
    distance: f32,
    /// Share of the correction applied to the target.
    bias: f32,
}

#[derive(Debug)]
pub struct LayoutEngine {
    config: LayoutConfig,
    nodes: Vec<SimNode>,
    slots: HashMap<NodeIndex, usize>,
    link_pairs: Vec<(NodeIndex, NodeIndex)>,
    links: Vec<SimLink>,
    alpha: f32,
    alpha_target: f32,
    state: SimulationState,
    accumulator: f32,
    ticks: u64,
    rng: StdRng,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        let alpha = config.alpha_initial;
        let rng = StdRng::seed_from_u64(config.jiggle_seed);
        Self {
            config,
            nodes: Vec::new(),
            slots: HashMap::new(),
            link_pairs: Vec::new(),
            links: Vec::new(),
            alpha,
            alpha_target: 0.0,
            state: SimulationState::Initializing,
            accumulator: 0.0,
            ticks: 0,
            rng,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, index: NodeIndex) -> bool {
        self.slots.contains_key(&index)
    }

    pub fn node(&self, index: NodeIndex) -> Option<&SimNode> {
        self.slots.get(&index).map(|&slot| &self.nodes[slot])
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn position(&self, index: NodeIndex) -> Option<Vec2> {
        self.node(index).map(|n| n.position)
    }

    pub fn positions(&self) -> impl Iterator<Item = (NodeIndex, Vec2)> + '_ {
        self.nodes.iter().map(|n| (n.index, n.position))
    }

    /// The rectangle a node is held inside: its region minus padding.
    pub fn bounds_of(&self, index: NodeIndex) -> Option<Rect> {
        self.node(index)
            .map(|n| n.region_rect.shrink(self.config.region_padding))
    }

    /// Clamp `point` into the padded region of `index`.
    pub fn clamp_to_region(&self, index: NodeIndex, point: Vec2) -> Option<Vec2> {
        self.bounds_of(index).map(|b| b.clamp_point(point).point)
    }

    // ========================================================================
    // Working set
    // ========================================================================

    /// Add a node to the working set. Re-inserting an existing index
    /// updates its region and keeps its dynamic state.
    pub fn insert_node(
        &mut self,
        index: NodeIndex,
        id: EntityId,
        region: RegionKey,
        region_rect: Rect,
        position: Vec2,
    ) {
        if self.contains(index) {
            self.set_region(index, region, region_rect);
            return;
        }
        let bounds = region_rect.shrink(self.config.region_padding);
        let position = bounds.clamp_point(position).point;
        self.slots.insert(index, self.nodes.len());
        self.nodes.push(SimNode {
            index,
            id,
            position,
            velocity: Vec2::ZERO,
            pinned: None,
            region,
            region_rect,
        });
        self.rebuild_links();
    }

    /// Remove a node, returning its final state.
    pub fn remove_node(&mut self, index: NodeIndex) -> Option<SimNode> {
        let slot = self.slots.remove(&index)?;
        let removed = self.nodes.swap_remove(slot);
        if let Some(moved) = self.nodes.get(slot) {
            self.slots.insert(moved.index, slot);
        }
        self.rebuild_links();
        Some(removed)
    }

    /// Replace the link set. Pairs naming nodes outside the working set are
    /// kept and become active once both endpoints are present.
    pub fn set_links(&mut self, pairs: impl IntoIterator<Item = (NodeIndex, NodeIndex)>) {
        self.link_pairs = pairs.into_iter().collect();
        self.rebuild_links();
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Move a node to a new region and clamp it there if unpinned.
    pub fn set_region(&mut self, index: NodeIndex, region: RegionKey, region_rect: Rect) {
        let Some(&slot) = self.slots.get(&index) else {
            return;
        };
        let padding = self.config.region_padding;
        let node = &mut self.nodes[slot];
        node.region = region;
        node.region_rect = region_rect;
        if node.pinned.is_none() {
            node.position = region_rect.shrink(padding).clamp_point(node.position).point;
        }
        self.rebuild_links();
    }

    fn rebuild_links(&mut self) {
        let mut links = Vec::with_capacity(self.link_pairs.len());
        let mut degree = vec![0usize; self.nodes.len()];
        for &(source, target) in &self.link_pairs {
            let (Some(&s), Some(&t)) = (self.slots.get(&source), self.slots.get(&target)) else {
                continue;
            };
            if s == t {
                continue;
            }
            degree[s] += 1;
            degree[t] += 1;
            let distance = if self.nodes[s].region == self.nodes[t].region {
                self.config.link_distance_same_region
            } else {
                self.config.link_distance_cross_region
            };
            links.push(SimLink {
                source: s,
                target: t,
                distance,
                bias: 0.0,
            });
        }
        for link in &mut links {
            let (ds, dt) = (degree[link.source] as f32, degree[link.target] as f32);
            link.bias = ds / (ds + dt);
        }
        self.links = links;
    }

    // ========================================================================
    // Pinning and energy
    // ========================================================================

    pub fn pin(&mut self, index: NodeIndex, position: Vec2) -> bool {
        let Some(&slot) = self.slots.get(&index) else {
            return false;
        };
        let node = &mut self.nodes[slot];
        node.pinned = Some(position);
        node.position = position;
        node.velocity = Vec2::ZERO;
        true
    }

    pub fn unpin(&mut self, index: NodeIndex) -> bool {
        let Some(&slot) = self.slots.get(&index) else {
            return false;
        };
        self.nodes[slot].pinned = None;
        true
    }

    /// Reset alpha to the configured reheat value.
    pub fn reheat(&mut self) {
        self.reheat_to(self.config.reheat_alpha);
    }

    pub fn reheat_to(&mut self, alpha: f32) {
        self.alpha = alpha;
        if self.state != SimulationState::Initializing {
            self.state = SimulationState::Running;
        }
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target;
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Run as many fixed steps as `dt` covers, bounded by
    /// `max_steps_per_advance`. Returns the number of steps run.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let step = self.config.step_seconds.max(f32::EPSILON);
        self.accumulator += dt.as_secs_f32();

        let mut steps = 0;
        while self.accumulator >= step && steps < self.config.max_steps_per_advance {
            self.tick();
            self.accumulator -= step;
            steps += 1;
        }
        // Drop time the step cap could not absorb.
        if self.accumulator >= step {
            self.accumulator %= step;
        }
        steps
    }

    /// One simulation step.
    pub fn tick(&mut self) {
        self.ticks += 1;
        let min = self.config.alpha_min;
        let active = self.alpha >= min || self.alpha_target >= min;

        if active {
            self.state = SimulationState::Running;
            self.apply_links();
            self.apply_many_body();
            self.apply_collision();
            self.integrate();
        } else {
            if self.state != SimulationState::Settling {
                tracing::debug!("Layout settled after {} ticks", self.ticks);
            }
            self.state = SimulationState::Settling;
            self.hold_pinned();
        }

        self.contain();

        if active {
            self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        }
    }

    fn jiggle(&mut self) -> f32 {
        self.rng.gen_range(-0.5f32..0.5) * 1e-6
    }

    fn apply_links(&mut self) {
        let alpha = self.alpha;
        let strength = self.config.link_strength;
        for i in 0..self.links.len() {
            let link = self.links[i];
            let source = &self.nodes[link.source];
            let target = &self.nodes[link.target];
            let mut delta =
                (target.position + target.velocity) - (source.position + source.velocity);
            if delta.x == 0.0 {
                delta.x = self.jiggle();
            }
            if delta.y == 0.0 {
                delta.y = self.jiggle();
            }
            let length = delta.length();
            if length == 0.0 {
                continue;
            }
            let delta = delta * ((length - link.distance) / length * alpha * strength);

            self.nodes[link.target].velocity -= delta * link.bias;
            self.nodes[link.source].velocity += delta * (1.0 - link.bias);
        }
    }

    fn apply_many_body(&mut self) {
        let n = self.nodes.len();
        if n < 2 {
            return;
        }
        let weight = self.config.charge_strength * self.alpha;
        let min_sq = self.config.charge_distance_min_sq;
        let positions: Vec<Vec2> = self.nodes.iter().map(|n| n.position).collect();

        for i in 0..n {
            for j in (i + 1)..n {
                let mut delta = positions[j] - positions[i];
                if delta.x == 0.0 {
                    delta.x = self.jiggle();
                }
                if delta.y == 0.0 {
                    delta.y = self.jiggle();
                }
                let mut dist_sq = delta.length_sq();
                if dist_sq == 0.0 {
                    continue;
                }
                if dist_sq < min_sq {
                    dist_sq = (min_sq * dist_sq).sqrt();
                }
                let push = delta * (weight / dist_sq);
                self.nodes[i].velocity += push;
                self.nodes[j].velocity -= push;
            }
        }
    }

    fn apply_collision(&mut self) {
        let n = self.nodes.len();
        let radius = self.config.collide_radius * 2.0;
        let radius_sq = radius * radius;
        let strength = self.config.collide_strength;

        for i in 0..n {
            for j in (i + 1)..n {
                let a = &self.nodes[i];
                let b = &self.nodes[j];
                let mut delta = (a.position + a.velocity) - (b.position + b.velocity);
                let dist_sq = delta.length_sq();
                if dist_sq >= radius_sq {
                    continue;
                }
                if delta.x == 0.0 {
                    delta.x = self.jiggle();
                }
                if delta.y == 0.0 {
                    delta.y = self.jiggle();
                }
                let length = delta.length();
                if length == 0.0 {
                    continue;
                }
                let push = delta * ((radius - length) / length * strength * 0.5);
                self.nodes[i].velocity += push;
                self.nodes[j].velocity -= push;
            }
        }
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            if let Some(pinned) = node.pinned {
                node.position = pinned;
                node.velocity = Vec2::ZERO;
                continue;
            }
            node.velocity = node.velocity * keep;
            if !node.velocity.is_finite() {
                node.velocity = Vec2::ZERO;
            }
            node.position += node.velocity;
        }
    }

    fn hold_pinned(&mut self) {
        for node in &mut self.nodes {
            if let Some(pinned) = node.pinned {
                node.position = pinned;
                node.velocity = Vec2::ZERO;
            }
        }
    }

    fn contain(&mut self) {
        let padding = self.config.region_padding;
        for node in &mut self.nodes {
            if node.pinned.is_some() {
                continue;
            }
            let clamped = node.region_rect.shrink(padding).clamp_point(node.position);
            if !clamped.changed() {
                continue;
            }
            node.position = clamped.point;
            match clamped.x {
                ClampSide::Min if node.velocity.x < 0.0 => node.velocity.x = 0.0,
                ClampSide::Max if node.velocity.x > 0.0 => node.velocity.x = 0.0,
                _ => {}
            }
            match clamped.y {
                ClampSide::Min if node.velocity.y < 0.0 => node.velocity.y = 0.0,
                ClampSide::Max if node.velocity.y > 0.0 => node.velocity.y = 0.0,
                _ => {}
            }
        }
    }
}

// ============================================================================
// Seeding
// ============================================================================

/// Grid placement inside a region: `occupants` nodes laid out in
/// `ceil(sqrt(occupants))` columns, `slot` picks the cell. The cell centre is
/// offset by up to `jitter / 2` on each axis, derived from `id`.
pub fn grid_seed(
    rect: Rect,
    padding: f32,
    slot: usize,
    occupants: usize,
    id: &EntityId,
    jitter: f32,
) -> Vec2 {
    let occupants = occupants.max(slot + 1).max(1);
    let cols = (occupants as f32).sqrt().ceil().max(1.0) as usize;
    let rows = occupants.div_ceil(cols);
    let inner = rect.shrink(padding);
    if inner.is_degenerate() {
        return rect.center();
    }
    let cell = Vec2::new(inner.width() / cols as f32, inner.height() / rows as f32);
    let (col, row) = (slot % cols, slot / cols);
    let centre = Vec2::new(
        inner.x() + cell.x * (col as f32 + 0.5),
        inner.y() + cell.y * (row as f32 + 0.5),
    );
    let (jx, jy) = id_jitter(id);
    centre + Vec2::new(jx, jy) * jitter
}

/// Two values in `[-0.5, 0.5)` drawn from an RNG seeded by `id`.
fn id_jitter(id: &EntityId) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(hasher.finish());
    (rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5))
}
