mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};

use super::RenderGraph;
use forces::{RepulsionParams, accumulate_repulsion_pairs, link_force};
use quadtree::QuadNode;

const MOTION_EPSILON_SQ: f32 = 0.01 * 0.01;

/// Tunables for [`step_physics`]. Lengths are canvas pixels and one call is
/// one time unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct SimulationParams {
    pub center_strength: f32,
    pub link_strength: f32,
    /// Negative pushes nodes apart.
    pub charge_strength: f32,
    pub damping: f32,
    pub rest_length: f32,
    pub repulsion_cutoff: f32,
    pub margin: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            center_strength: 0.005,
            link_strength: 0.02,
            charge_strength: -300.0,
            damping: 0.9,
            rest_length: 80.0,
            repulsion_cutoff: 100.0,
            margin: 20.0,
            width: 800.0,
            height: 600.0,
        }
    }
}

impl SimulationParams {
    pub fn center(&self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }

    /// Inclusive clamp range per axis. Collapses to the centre line when the
    /// canvas is narrower than twice the margin.
    fn bounds(&self) -> (Vec2, Vec2) {
        let axis = |extent: f32| {
            let low = self.margin.min(extent * 0.5);
            (low, (extent - self.margin).max(low))
        };
        let (min_x, max_x) = axis(self.width);
        let (min_y, max_y) = axis(self.height);
        (vec2(min_x, min_y), vec2(max_x, max_y))
    }
}

#[derive(Default)]
pub(in crate::app) struct PhysicsScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    /// Slot in `positions` for each node; `None` for nodes left out this step.
    slots: Vec<Option<usize>>,
}

fn is_finite(value: Vec2) -> bool {
    value.x.is_finite() && value.y.is_finite()
}

/// Advances the layout by one step. Returns whether anything is still moving.
pub(in crate::app) fn step_physics(graph: &mut RenderGraph, params: &SimulationParams) -> bool {
    let node_count = graph.nodes.len();
    if node_count == 0 {
        return false;
    }

    let center = params.center();
    let scratch = &mut graph.physics_scratch;
    scratch.positions.clear();
    scratch.slots.clear();
    scratch.slots.resize(node_count, None);

    for (index, node) in graph.nodes.iter_mut().enumerate() {
        if !is_finite(node.velocity) {
            node.velocity = Vec2::ZERO;
        }
        if !is_finite(node.pos) {
            continue;
        }
        scratch.slots[index] = Some(scratch.positions.len());
        scratch.positions.push(node.pos);
    }

    scratch.forces.clear();
    scratch.forces.resize(scratch.positions.len(), Vec2::ZERO);
    let forces = &mut scratch.forces;
    let positions = &scratch.positions;

    for (force, position) in forces.iter_mut().zip(positions) {
        *force += (center - *position) * params.center_strength;
    }

    if params.charge_strength != 0.0
        && params.repulsion_cutoff > 0.0
        && let Some(tree) = QuadNode::build(positions)
    {
        let repulsion = RepulsionParams {
            charge_strength: params.charge_strength,
            cutoff_sq: params.repulsion_cutoff * params.repulsion_cutoff,
        };
        accumulate_repulsion_pairs(&tree, &tree, true, positions, repulsion, forces);
    }

    if params.link_strength != 0.0 {
        for edge in &graph.edges {
            let (Some(from), Some(to)) = (edge.from, edge.to) else {
                continue;
            };
            if from == to {
                continue;
            }
            let (Some(Some(from_slot)), Some(Some(to_slot))) =
                (scratch.slots.get(from), scratch.slots.get(to))
            else {
                continue;
            };
            let Some(pull) = link_force(
                positions[*from_slot],
                positions[*to_slot],
                params.rest_length,
                params.link_strength * edge.weight,
            ) else {
                continue;
            };
            forces[*from_slot] += pull;
            forces[*to_slot] -= pull;
        }
    }

    let (min, max) = params.bounds();
    let mut moving = false;
    for (index, node) in graph.nodes.iter_mut().enumerate() {
        let Some(slot) = scratch.slots[index] else {
            node.pos = center;
            node.velocity = Vec2::ZERO;
            continue;
        };

        let mut velocity = (node.velocity + forces[slot]) * params.damping;
        if !is_finite(velocity) {
            velocity = Vec2::ZERO;
        }
        let mut position = node.pos + velocity;

        if position.x < min.x || position.x > max.x {
            position.x = position.x.clamp(min.x, max.x);
            velocity.x = 0.0;
        }
        if position.y < min.y || position.y > max.y {
            position.y = position.y.clamp(min.y, max.y);
            velocity.y = 0.0;
        }

        node.pos = position;
        node.velocity = velocity;
        moving |= velocity.length_sq() > MOTION_EPSILON_SQ;
    }

    moving
}
