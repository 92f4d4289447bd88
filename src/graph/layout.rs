//! Fixed node placement used by the graph builder.

use super::{MaterialGraphSpec, NodeId, Position};

pub const OUTPUT: Position = Position::new(250.0, 0.0);
pub const PRINCIPLED: Position = Position::new(-300.0, 0.0);
/// Relative to the principled node.
pub const MAPPING_OFFSET: Position = Position::new(-1050.0, 0.0);
/// Relative to the mapping node.
pub const COORDINATE_OFFSET: Position = Position::new(-200.0, 0.0);
/// Relative to the coordinate node.
pub const VALUE_OFFSET: Position = Position::new(0.0, -300.0);
/// Relative to the principled node.
pub const DISPLACEMENT_OFFSET: Position = Position::new(100.0, -700.0);

// Placement while samples are emitted.
const EMIT_X: f32 = -800.0;
const EMIT_START_Y: f32 = 300.0;
const EMIT_STEP: f32 = 300.0;

// Final stack, relative to the principled node.
const STACK_OFFSET: Position = Position::new(-550.0, 200.0);
const STACK_STEP: f32 = 280.0;

/// Intermediate node placed right of its sample.
const FOLLOWER_OFFSET: Position = Position::new(300.0, 0.0);
const REROUTE_OFFSET: Position = Position::new(-50.0, -120.0);
const FRAME_PADDING: f32 = 40.0;

/// Position of the `index`-th sample at emission time.
pub fn emitted(index: usize) -> Position {
    Position::new(EMIT_X, EMIT_START_Y - EMIT_STEP * index as f32)
}

/// Final position of the `index`-th node of the stack.
pub fn stacked(anchor: Position, index: usize) -> Position {
    anchor + STACK_OFFSET + Position::new(0.0, -STACK_STEP * index as f32)
}

/// Re-stack `order` under `anchor`, then move every follower next to the
/// sample it processes.
pub fn reflow(graph: &mut MaterialGraphSpec, anchor: Position, order: &[NodeId], followers: &[(NodeId, NodeId)]) {
    for (index, id) in order.iter().enumerate() {
        graph.set_position(*id, stacked(anchor, index));
    }
    for (sample, follower) in followers {
        if let Some(at) = graph.get(*sample).map(|n| n.position + FOLLOWER_OFFSET) {
            graph.set_position(*follower, at);
        }
    }
}

/// Centroid of `members`, shifted by the reroute offset.
pub fn reroute(graph: &MaterialGraphSpec, members: &[NodeId]) -> Position {
    let positions: Vec<Position> = members.iter().filter_map(|id| graph.get(*id)).map(|n| n.position).collect();
    let n = positions.len().max(1) as f32;
    let (sx, sy) = positions.iter().fold((0.0f32, 0.0f32), |(x, y), p| (x + p.x, y + p.y));
    Position::new(sx / n, sy / n) + REROUTE_OFFSET
}

/// Top-left corner of a frame around `members`.
pub fn frame(graph: &MaterialGraphSpec, members: &[NodeId]) -> Position {
    let mut min_x = f32::INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    let mut any = false;
    for node in members.iter().filter_map(|id| graph.get(*id)) {
        min_x = min_x.min(node.position.x);
        max_y = max_y.max(node.position.y);
        any = true;
    }
    if !any {
        return Position::default();
    }
    Position::new(min_x - FRAME_PADDING, max_y + FRAME_PADDING)
}
