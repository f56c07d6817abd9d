use crate::geometry::Vec2;
use crate::graph::{EdgeIndex, GraphModel, NodeIndex};
use crate::style::{Color, EdgeStyle, get_edge_color, get_edge_style, style_key};
use serde::{Deserialize, Serialize};
use socialmap_core::{Edge, EntityId, Status};
use std::collections::{HashMap, HashSet};
use std::f32::consts::FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Gap left between the source centre and the path start.
    pub source_radius: f32,
    /// Gap left between the path end and the target centre.
    pub target_radius: f32,
    /// Perpendicular distance between neighbouring parallel edges.
    pub spread: f32,
    /// Extra offset applied when a reverse edge is also visible.
    pub bidirectional_offset: f32,
    /// Offsets smaller than this in magnitude are drawn straight.
    pub straight_threshold: f32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            source_radius: 25.0,
            target_radius: 45.0,
            spread: 25.0,
            bidirectional_offset: 15.0,
            straight_threshold: 5.0,
        }
    }
}

/// A quadratic bezier curve segment defined by three control points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuadraticBezier {
    pub start: Vec2,
    pub control: Vec2,
    pub end: Vec2,
}

impl QuadraticBezier {
    /// Sample the curve at parameter t [0, 1]
    pub fn sample(&self, t: f32) -> Vec2 {
        let mt = 1.0 - t;
        self.start * (mt * mt) + self.control * (2.0 * mt * t) + self.end * (t * t)
    }

    /// Split at `t` into two curves that together trace this one.
    pub fn split(&self, t: f32) -> (QuadraticBezier, QuadraticBezier) {
        let a = self.start.lerp(self.control, t);
        let b = self.control.lerp(self.end, t);
        let mid = a.lerp(b, t);
        (
            QuadraticBezier {
                start: self.start,
                control: a,
                end: mid,
            },
            QuadraticBezier {
                start: mid,
                control: b,
                end: self.end,
            },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathGeometry {
    Straight { start: Vec2, end: Vec2 },
    Quadratic(QuadraticBezier),
}

impl PathGeometry {
    pub fn start(&self) -> Vec2 {
        match self {
            PathGeometry::Straight { start, .. } => *start,
            PathGeometry::Quadratic(curve) => curve.start,
        }
    }

    pub fn end(&self) -> Vec2 {
        match self {
            PathGeometry::Straight { end, .. } => *end,
            PathGeometry::Quadratic(curve) => curve.end,
        }
    }

    pub fn sample(&self, t: f32) -> Vec2 {
        match self {
            PathGeometry::Straight { start, end } => start.lerp(*end, t),
            PathGeometry::Quadratic(curve) => curve.sample(t),
        }
    }

    pub fn midpoint(&self) -> Vec2 {
        self.sample(0.5)
    }

    /// Halves meeting at the curve midpoint.
    pub fn split_half(&self) -> (PathGeometry, PathGeometry) {
        match self {
            PathGeometry::Straight { start, end } => {
                let mid = start.lerp(*end, 0.5);
                (
                    PathGeometry::Straight {
                        start: *start,
                        end: mid,
                    },
                    PathGeometry::Straight {
                        start: mid,
                        end: *end,
                    },
                )
            }
            PathGeometry::Quadratic(curve) => {
                let (a, b) = curve.split(0.5);
                (PathGeometry::Quadratic(a), PathGeometry::Quadratic(b))
            }
        }
    }

    /// SVG path data: `M x,y L x,y` or `M x,y Q cx,cy x,y`.
    pub fn svg_path(&self) -> String {
        match self {
            PathGeometry::Straight { start, end } => {
                format!("M {},{} L {},{}", start.x, start.y, end.x, end.y)
            }
            PathGeometry::Quadratic(c) => format!(
                "M {},{} Q {},{} {},{}",
                c.start.x, c.start.y, c.control.x, c.control.y, c.end.x, c.end.y
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Indicators {
    /// Arrow at the target.
    OneWay,
    /// Arrows at both ends, one style.
    TwoWay,
    /// Two half-segments. Each half takes the status held by its nearer
    /// endpoint and ends in an arrow at the midpoint.
    SplitHalves,
}

impl Indicators {
    pub fn of(edge: &Edge) -> Self {
        if edge.is_mutual {
            Indicators::TwoWay
        } else if edge.is_split() {
            Indicators::SplitHalves
        } else {
            Indicators::OneWay
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSegment {
    pub geometry: PathGeometry,
    pub style_key: String,
    pub color: Color,
    pub arrow_start: bool,
    pub arrow_end: bool,
}

/// Everything a renderer needs to draw one visible edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePath {
    pub key: String,
    pub edge: EdgeIndex,
    pub source: EntityId,
    pub target: EntityId,
    pub offset: f32,
    pub geometry: PathGeometry,
    pub indicators: Indicators,
    pub segments: Vec<PathSegment>,
    pub style: EdgeStyle,
    pub label: String,
    pub label_anchor: Vec2,
}

impl EdgePath {
    pub fn svg_path(&self) -> String {
        self.geometry.svg_path()
    }
}

/// Router for calculating edge paths between entity positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeRouter {
    pub config: RouterConfig,
}

impl EdgeRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Geometry between two centres, shrunk at both ends and bent by
    /// `offset` perpendicular to the centre line.
    pub fn route_edge(&self, source: Vec2, target: Vec2, offset: f32) -> PathGeometry {
        let angle = (target - source).angle();
        let dir = Vec2::from_angle(angle);
        let start = source + dir * self.config.source_radius;
        let end = target - dir * self.config.target_radius;

        if offset.abs() < self.config.straight_threshold {
            return PathGeometry::Straight { start, end };
        }
        let mid = start.lerp(end, 0.5);
        let control = mid + Vec2::from_angle(angle + FRAC_PI_2) * offset;
        PathGeometry::Quadratic(QuadraticBezier {
            start,
            control,
            end,
        })
    }

    /// Perpendicular offset of each edge in `edges`, in the same order.
    ///
    /// Edges sharing a `(source, target)` pair fan out symmetrically around
    /// zero; an edge whose reverse pair is also present is pushed aside by
    /// the bidirectional offset.
    pub fn offsets(&self, model: &GraphModel, edges: &[EdgeIndex]) -> Vec<f32> {
        let pairs: Vec<Option<(NodeIndex, NodeIndex)>> = edges
            .iter()
            .map(|&e| model.graph.edge_endpoints(e))
            .collect();

        let mut family_size: HashMap<(NodeIndex, NodeIndex), usize> = HashMap::new();
        for pair in pairs.iter().flatten() {
            *family_size.entry(*pair).or_default() += 1;
        }
        let present: HashSet<(NodeIndex, NodeIndex)> = family_size.keys().copied().collect();

        let mut seen: HashMap<(NodeIndex, NodeIndex), usize> = HashMap::new();
        pairs
            .iter()
            .map(|pair| {
                let Some((s, t)) = *pair else {
                    return 0.0;
                };
                let k = family_size[&(s, t)];
                let index = seen.entry((s, t)).or_default();
                let spread = if k > 1 {
                    (*index as f32 - (k as f32 - 1.0) / 2.0) * self.config.spread
                } else {
                    0.0
                };
                *index += 1;
                let bidir = if s != t && present.contains(&(t, s)) {
                    self.config.bidirectional_offset
                } else {
                    0.0
                };
                spread + bidir
            })
            .collect()
    }

    /// Path descriptors for `edges`. Edges with an endpoint that has no
    /// position are skipped.
    pub fn route(
        &self,
        model: &GraphModel,
        edges: &[EdgeIndex],
        position_of: impl Fn(NodeIndex) -> Option<Vec2>,
    ) -> Vec<EdgePath> {
        let offsets = self.offsets(model, edges);
        let mut paths = Vec::with_capacity(edges.len());

        for (&index, &offset) in edges.iter().zip(&offsets) {
            let Some(graph_edge) = model.graph.edge_weight(index) else {
                continue;
            };
            let (Some(source), Some(target)) = (
                position_of(graph_edge.source_idx),
                position_of(graph_edge.target_idx),
            ) else {
                tracing::debug!(
                    "Skipping edge {} without endpoint positions",
                    graph_edge.edge.key()
                );
                continue;
            };
            let geometry = self.route_edge(source, target, offset);
            paths.push(describe(index, &graph_edge.edge, geometry, offset));
        }
        paths
    }
}

fn segment(
    geometry: PathGeometry,
    status: &Status,
    arrow_start: bool,
    arrow_end: bool,
) -> PathSegment {
    PathSegment {
        geometry,
        style_key: style_key(status).to_string(),
        color: get_edge_color(status),
        arrow_start,
        arrow_end,
    }
}

fn describe(index: EdgeIndex, edge: &Edge, geometry: PathGeometry, offset: f32) -> EdgePath {
    let indicators = Indicators::of(edge);
    let segments = match (indicators, &edge.reverse_status) {
        (Indicators::SplitHalves, Some(reverse)) => {
            let (near_source, near_target) = geometry.split_half();
            vec![
                segment(near_source, &edge.status, false, true),
                segment(near_target, reverse, true, false),
            ]
        }
        (Indicators::TwoWay, _) => vec![segment(geometry, &edge.status, true, true)],
        _ => vec![segment(geometry, &edge.status, false, true)],
    };
    let label = if edge.is_mutual {
        edge.status.plural_label()
    } else {
        edge.status.label().to_string()
    };

    EdgePath {
        key: edge.key(),
        edge: index,
        source: edge.source.clone(),
        target: edge.target.clone(),
        offset,
        geometry,
        indicators,
        segments,
        style: get_edge_style(&edge.status),
        label,
        label_anchor: geometry.midpoint(),
    }
}
