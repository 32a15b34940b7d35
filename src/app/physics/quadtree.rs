use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        match (point.x >= self.center.x, point.y >= self.center.y) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    /// Squared gap between two boxes; zero when they touch or overlap.
    /// Never larger than the distance between any point of one and any
    /// point of the other.
    pub(super) fn distance_sq_to(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        dx * dx + dy * dy
    }
}

/// Region quadtree over point indices. Internal nodes hold no indices.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        depth: usize,
    ) -> Self {
        let mut node = Self {
            bounds,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= MAX_DEPTH || node.indices.len() <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            buckets[bounds.quadrant_for(positions[index])].push(index);
        }

        // Coincident points all land in one quadrant; splitting would not help.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            node.children[quadrant] = Some(Box::new(Self::build_node(
                bounds.child(quadrant),
                bucket,
                positions,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_indices(node: &QuadNode) -> usize {
        node.indices.len()
            + node
                .children
                .iter()
                .flatten()
                .map(|child| count_indices(child))
                .sum::<usize>()
    }

    #[test]
    fn every_point_lands_in_exactly_one_leaf() {
        let positions = (0..100)
            .map(|index| vec2((index * 37 % 500) as f32, (index * 91 % 300) as f32))
            .collect::<Vec<_>>();
        let tree = QuadNode::build(&positions).expect("finite points");
        assert!(!tree.is_leaf());
        assert_eq!(count_indices(&tree), positions.len());
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(10.0, 10.0); 40];
        let tree = QuadNode::build(&positions).expect("finite points");
        assert!(tree.is_leaf());
        assert_eq!(tree.indices.len(), 40);
    }

    #[test]
    fn empty_input_has_no_tree() {
        assert!(QuadNode::build(&[]).is_none());
    }

    #[test]
    fn box_gap_is_a_lower_bound() {
        let a = QuadBounds {
            center: vec2(0.0, 0.0),
            half_extent: 10.0,
        };
        let b = QuadBounds {
            center: vec2(50.0, 0.0),
            half_extent: 10.0,
        };
        assert_eq!(a.distance_sq_to(b), 900.0);
        assert_eq!(a.distance_sq_to(a), 0.0);
    }
}
