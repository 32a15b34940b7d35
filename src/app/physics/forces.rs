use eframe::egui::Vec2;

use super::quadtree::QuadNode;

/// Pair distances at or below this are treated as coincident and skipped.
pub(super) const MIN_DISTANCE: f32 = 1e-3;

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    /// Negative pushes apart.
    pub(super) charge_strength: f32,
    pub(super) cutoff_sq: f32,
}

fn repel_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    params: RepulsionParams,
    forces: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance_sq = delta.length_sq();
    if distance_sq > params.cutoff_sq || distance_sq <= MIN_DISTANCE * MIN_DISTANCE {
        return;
    }

    let distance = distance_sq.sqrt();
    let push = delta / distance * (-params.charge_strength / distance_sq);
    forces[from] += push;
    forces[to] -= push;
}

/// Visits every unordered pair whose cells are within the cutoff exactly once.
pub(super) fn accumulate_repulsion_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    params: RepulsionParams,
    forces: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.cutoff_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    repel_pair(from, to, positions, params, forces);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    repel_pair(from, to, positions, params, forces);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_repulsion_pairs(child_a, child_a, true, positions, params, forces);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_repulsion_pairs(child_a, child_b, false, positions, params, forces);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_repulsion_pairs(child, node_b, false, positions, params, forces);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_repulsion_pairs(node_a, child, false, positions, params, forces);
        }
    }
}

/// Spring force on `from`. Pulls the endpoints together when the edge is
/// longer than `rest_length`.
pub(super) fn link_force(from: Vec2, to: Vec2, rest_length: f32, strength: f32) -> Option<Vec2> {
    let delta = to - from;
    let distance = delta.length();
    if distance <= MIN_DISTANCE {
        return None;
    }
    Some(delta / distance * ((distance - rest_length) * strength))
}

#[cfg(test)]
pub(super) fn brute_force_repulsion(positions: &[Vec2], params: RepulsionParams) -> Vec<Vec2> {
    let mut forces = vec![Vec2::ZERO; positions.len()];
    for from in 0..positions.len() {
        for to in (from + 1)..positions.len() {
            repel_pair(from, to, positions, params, &mut forces);
        }
    }
    forces
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;
    use proptest::prelude::*;

    use super::*;

    fn params(cutoff: f32) -> RepulsionParams {
        RepulsionParams {
            charge_strength: -400.0,
            cutoff_sq: cutoff * cutoff,
        }
    }

    #[test]
    fn pairs_beyond_cutoff_do_not_interact() {
        let positions = [vec2(0.0, 0.0), vec2(150.0, 0.0)];
        let forces = brute_force_repulsion(&positions, params(100.0));
        assert_eq!(forces, vec![Vec2::ZERO, Vec2::ZERO]);
    }

    #[test]
    fn negative_charge_pushes_apart() {
        let positions = [vec2(0.0, 0.0), vec2(20.0, 0.0)];
        let forces = brute_force_repulsion(&positions, params(100.0));
        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
        assert!((forces[0].x + 1.0).abs() < 1e-4);
    }

    #[test]
    fn stretched_link_pulls_together() {
        let force =
            link_force(vec2(0.0, 0.0), vec2(100.0, 0.0), 60.0, 0.1).expect("non-zero length");
        assert!((force.x - 4.0).abs() < 1e-5);
        assert!(link_force(vec2(5.0, 5.0), vec2(5.0, 5.0), 60.0, 0.1).is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn quadtree_pairs_match_brute_force(
            points in prop::collection::vec((0u16..800, 0u16..600), 2..120),
            cutoff in 20.0f32..200.0,
        ) {
            let positions = points
                .iter()
                .map(|&(x, y)| vec2(f32::from(x), f32::from(y)))
                .collect::<Vec<_>>();
            let params = params(cutoff);
            let expected = brute_force_repulsion(&positions, params);

            let tree = QuadNode::build(&positions).expect("finite points");
            let mut forces = vec![Vec2::ZERO; positions.len()];
            accumulate_repulsion_pairs(&tree, &tree, true, &positions, params, &mut forces);

            for (got, want) in forces.iter().zip(&expected) {
                let tolerance = 1e-2 * (1.0 + want.length());
                prop_assert!((*got - *want).length() <= tolerance, "got {got:?}, want {want:?}");
            }
        }
    }
}
