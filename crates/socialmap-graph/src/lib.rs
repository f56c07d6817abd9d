pub mod config;
pub mod drag;
pub mod edge_router;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod projector;
pub mod region;
pub mod style;
pub mod viewer;

pub use config::ViewerConfig;
pub use drag::{DragController, DragMode};
pub use edge_router::{
    EdgePath, EdgeRouter, Indicators, PathGeometry, PathSegment, QuadraticBezier, RouterConfig,
};
pub use error::GraphError;
pub use geometry::{Rect, Vec2};
pub use graph::{EdgeIndex, GraphModel, NodeIndex};
pub use layout::{LayoutConfig, LayoutEngine, SimNode, SimulationState};
pub use projector::{FilterState, Projection, ProjectionDelta, project, reconcile};
pub use region::{RegionKey, RegionLayoutConfig, RegionMap, RegionOutline, RegionRule};
pub use style::{
    Color, EdgeStyle, GroupType, get_edge_color, get_edge_style, get_group_color, style_key,
};
pub use viewer::{Frame, NodeView, Viewer};
