use crate::geometry::Vec2;
use crate::graph::NodeIndex;
use crate::layout::LayoutEngine;
use serde::{Deserialize, Serialize};

/// What happens to a dragged node when the pointer is released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragMode {
    #[default]
    Release,
    KeepPinned,
}

/// Pins a node to the pointer for the duration of a drag.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    mode: DragMode,
    active: Option<NodeIndex>,
}

impl DragController {
    pub fn new(mode: DragMode) -> Self {
        Self { mode, active: None }
    }

    pub fn active(&self) -> Option<NodeIndex> {
        self.active
    }

    /// Pin `index` where it stands and keep the simulation warm.
    pub fn start(&mut self, engine: &mut LayoutEngine, index: NodeIndex) -> bool {
        let Some(position) = engine.position(index) else {
            tracing::debug!("Ignoring drag start on node {} outside the working set", index);
            return false;
        };
        engine.pin(index, position);
        let target = engine.config().drag_alpha_target;
        engine.set_alpha_target(target);
        engine.reheat();
        self.active = Some(index);
        true
    }

    /// Move the pin to `pointer`, clamped into the node's padded region.
    pub fn move_to(&mut self, engine: &mut LayoutEngine, index: NodeIndex, pointer: Vec2) -> bool {
        let Some(clamped) = engine.clamp_to_region(index, pointer) else {
            tracing::debug!("Ignoring drag move on node {} outside the working set", index);
            return false;
        };
        engine.pin(index, clamped)
    }

    /// Finish a drag. The drag alpha target is cleared even when the node
    /// has already left the working set.
    pub fn end(&mut self, engine: &mut LayoutEngine, index: NodeIndex) -> bool {
        if self.active == Some(index) {
            self.active = None;
        }
        engine.set_alpha_target(0.0);
        if !engine.contains(index) {
            tracing::debug!("Ignoring drag end on node {} outside the working set", index);
            return false;
        }
        if self.mode == DragMode::Release {
            engine.unpin(index);
        }
        engine.reheat();
        true
    }

    /// Abandon the active drag, e.g. because its node is about to be hidden.
    /// The node is released or kept pinned as on a normal drag end.
    pub fn cancel(&mut self, engine: &mut LayoutEngine) -> Option<NodeIndex> {
        let index = self.active.take()?;
        if self.mode == DragMode::Release {
            engine.unpin(index);
        }
        engine.set_alpha_target(0.0);
        tracing::debug!("Cancelled drag on node {}", index);
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::region::RegionKey;
    use socialmap_core::EntityId;

    fn engine() -> LayoutEngine {
        let mut engine = LayoutEngine::default();
        let rect = Rect::from_pos_size(Vec2::ZERO, Vec2::new(400.0, 300.0));
        let id = EntityId::new("Hedwig");
        engine.insert_node(NodeIndex(0), id, RegionKey::new("r"), rect, Vec2::new(100.0, 100.0));
        engine
    }

    #[test]
    fn test_drag_pins_and_clamps_pointer() {
        let mut engine = engine();
        let mut drag = DragController::default();

        assert!(drag.start(&mut engine, NodeIndex(0)));
        assert_eq!(drag.active(), Some(NodeIndex(0)));
        assert_eq!(engine.alpha_target(), 0.3);
        assert!(engine.node(NodeIndex(0)).unwrap().is_pinned());

        assert!(drag.move_to(&mut engine, NodeIndex(0), Vec2::new(900.0, -50.0)));
        engine.tick();
        assert_eq!(engine.position(NodeIndex(0)), Some(Vec2::new(390.0, 10.0)));

        assert!(drag.end(&mut engine, NodeIndex(0)));
        assert_eq!(drag.active(), None);
        assert_eq!(engine.alpha_target(), 0.0);
        assert!(!engine.node(NodeIndex(0)).unwrap().is_pinned());
    }

    #[test]
    fn test_keep_pinned_mode() {
        let mut engine = engine();
        let mut drag = DragController::new(DragMode::KeepPinned);
        drag.start(&mut engine, NodeIndex(0));
        drag.move_to(&mut engine, NodeIndex(0), Vec2::new(200.0, 150.0));
        drag.end(&mut engine, NodeIndex(0));

        assert_eq!(engine.node(NodeIndex(0)).unwrap().pinned, Some(Vec2::new(200.0, 150.0)));
    }

    #[test]
    fn test_unknown_node_is_ignored() {
        let mut engine = engine();
        let mut drag = DragController::default();
        assert!(!drag.start(&mut engine, NodeIndex(7)));
        assert!(!drag.move_to(&mut engine, NodeIndex(7), Vec2::ZERO));
        assert!(!drag.end(&mut engine, NodeIndex(7)));
        assert_eq!(engine.alpha_target(), 0.0);
    }

    #[test]
    fn test_end_after_node_removed_clears_drag_target() {
        let mut engine = engine();
        let mut drag = DragController::default();
        drag.start(&mut engine, NodeIndex(0));
        engine.remove_node(NodeIndex(0));

        assert!(!drag.end(&mut engine, NodeIndex(0)));
        assert_eq!(drag.active(), None);
        assert_eq!(engine.alpha_target(), 0.0);
    }

    #[test]
    fn test_cancel_releases_or_keeps_pin_by_mode() {
        let mut engine = engine();
        let mut drag = DragController::default();
        assert_eq!(drag.cancel(&mut engine), None);

        drag.start(&mut engine, NodeIndex(0));
        assert_eq!(drag.cancel(&mut engine), Some(NodeIndex(0)));
        assert_eq!(drag.active(), None);
        assert_eq!(engine.alpha_target(), 0.0);
        assert!(!engine.node(NodeIndex(0)).unwrap().is_pinned());

        let mut keep = DragController::new(DragMode::KeepPinned);
        keep.start(&mut engine, NodeIndex(0));
        keep.cancel(&mut engine);
        assert!(engine.node(NodeIndex(0)).unwrap().is_pinned());
        assert_eq!(engine.alpha_target(), 0.0);
    }
}
