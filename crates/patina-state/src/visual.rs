//! Visual selection bookkeeping.
//!
//! The selection proper is just an anchor plus the live cursor; converting
//! it into an operator range happens in the engine. What persists after
//! leaving visual mode is the selection's shape, so `gv`-style reselection
//! can reproduce an equivalent area at a new cursor location.

use patina_text::{MotionShape, Position};
use tracing::debug;

/// Geometry of the last visual area, retained after leaving visual mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReselectGeometry {
    pub shape: MotionShape,
    pub line_count: usize,
    /// Width in virtual columns (char/block shapes; 0 for line-wise).
    pub vcol_width: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct VisualState {
    pub active: bool,
    pub shape: MotionShape,
    /// Select-mode variant (typing replaces); tracked but not interpreted
    /// differently by the operator path.
    pub select_mode: bool,
    pub anchor: Position,
}

impl Default for VisualState {
    fn default() -> Self {
        // Line numbers are 1-based; an all-zeros anchor would not name a
        // buffer position.
        Self {
            active: false,
            shape: MotionShape::Char,
            select_mode: false,
            anchor: Position::new(1, 0),
        }
    }
}

impl VisualState {
    pub fn start(&mut self, shape: MotionShape, anchor: Position) {
        debug!(target: "state.visual", ?shape, lnum = anchor.lnum, "visual_start");
        self.active = true;
        self.shape = shape;
        self.anchor = anchor;
        self.select_mode = false;
    }

    /// Switch shape without moving the anchor (v -> V -> Ctrl-V).
    pub fn switch_shape(&mut self, shape: MotionShape) {
        self.shape = shape;
    }

    pub fn swap_anchor(&mut self, cursor: &mut Position) {
        std::mem::swap(&mut self.anchor, cursor);
    }

    /// Leave visual mode, producing the reselect geometry for the area
    /// between anchor and `cursor`. `vcol_width` is supplied by the caller
    /// because it needs buffer and tabstop context.
    pub fn leave(&mut self, cursor: Position, vcol_width: usize) -> ReselectGeometry {
        let line_count = self.anchor.lnum.abs_diff(cursor.lnum) + 1;
        let geom = ReselectGeometry {
            shape: self.shape,
            line_count,
            vcol_width,
        };
        debug!(target: "state.visual", ?geom, "visual_leave");
        self.active = false;
        geom
    }
}

impl ReselectGeometry {
    /// Reproduce the stored shape anchored at `cursor`, scaled by `count`.
    /// Returns the new (anchor, cursor-target) pair in line/vcol terms: the
    /// caller resolves virtual columns back to byte offsets.
    pub fn apply_at(&self, cursor: Position, count: usize) -> (Position, usize, usize) {
        let count = count.max(1);
        let lines = self.line_count * count;
        let width = match self.shape {
            MotionShape::Line => 0,
            _ => self.vcol_width * count,
        };
        let anchor = cursor;
        (anchor, lines, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_state_is_inactive_at_the_buffer_origin() {
        let vs = VisualState::default();
        assert!(!vs.active);
        assert!(!vs.select_mode);
        assert_eq!(vs.shape, MotionShape::Char);
        assert_eq!(vs.anchor, Position::new(1, 0));
    }

    #[test]
    fn leave_stores_shape_and_clears_active() {
        let mut vs = VisualState::default();
        vs.start(MotionShape::Block, Position::new(2, 0));
        let geom = vs.leave(Position::new(4, 3), 5);
        assert!(!vs.active);
        assert_eq!(geom.shape, MotionShape::Block);
        assert_eq!(geom.line_count, 3);
        assert_eq!(geom.vcol_width, 5);
    }

    #[test]
    fn reselect_scales_by_count() {
        let geom = ReselectGeometry {
            shape: MotionShape::Char,
            line_count: 2,
            vcol_width: 4,
        };
        let (_anchor, lines, width) = geom.apply_at(Position::new(7, 0), 3);
        assert_eq!(lines, 6);
        assert_eq!(width, 12);
    }

    #[test]
    fn linewise_reselect_has_no_width() {
        let geom = ReselectGeometry {
            shape: MotionShape::Line,
            line_count: 4,
            vcol_width: 9,
        };
        let (_, lines, width) = geom.apply_at(Position::new(1, 0), 1);
        assert_eq!(lines, 4);
        assert_eq!(width, 0);
    }

    #[test]
    fn swap_anchor_exchanges_endpoints() {
        let mut vs = VisualState::default();
        vs.start(MotionShape::Char, Position::new(1, 1));
        let mut cursor = Position::new(3, 0);
        vs.swap_anchor(&mut cursor);
        assert_eq!(cursor, Position::new(1, 1));
        assert_eq!(vs.anchor, Position::new(3, 0));
    }
}
