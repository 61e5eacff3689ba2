use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max.x - min.x).max(max.y - min.y).max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: (span * 0.5) + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
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
}

/// Barnes-Hut quadtree over node positions. Far-away subtrees act on a node
/// as a single aggregated mass at their center of mass.
pub(super) struct QuadNode {
    bounds: QuadBounds,
    center_of_mass: Vec2,
    mass: f32,
    indices: Vec<usize>,
    children: [Option<Box<QuadNode>>; 4],
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
        let mut center_of_mass = Vec2::ZERO;
        for &index in &indices {
            center_of_mass += positions[index];
        }
        let mass = indices.len() as f32;
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
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

        // All points in one quadrant means splitting cannot help.
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

    fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }

    /// Accumulate the repulsive force acting on `positions[index]` into
    /// `force`, approximating distant cells by their aggregate mass.
    pub(super) fn accumulate_repulsion(
        &self,
        index: usize,
        positions: &[Vec2],
        strength: f32,
        softening: f32,
        theta: f32,
        force: &mut Vec2,
    ) {
        if self.mass <= 0.0 {
            return;
        }

        let point = positions[index];

        if self.is_leaf() {
            for &other in &self.indices {
                if other == index {
                    continue;
                }
                *force += repulsion_between(index, other, point, positions[other], strength, softening);
            }
            return;
        }

        let delta = point - self.center_of_mass;
        let distance_sq = delta.length_sq().max(0.0001);
        let distance = distance_sq.sqrt();
        let can_approximate = !self.bounds.contains(point)
            && (self.bounds.side_length() / distance) < theta
            && self.mass > 1.0;

        if can_approximate {
            *force += (delta / distance) * ((strength * self.mass) / (distance_sq + softening));
            return;
        }

        for child in self.children.iter().flatten() {
            child.accumulate_repulsion(index, positions, strength, softening, theta, force);
        }
    }
}

fn repulsion_between(
    index: usize,
    other: usize,
    point_a: Vec2,
    point_b: Vec2,
    strength: f32,
    softening: f32,
) -> Vec2 {
    let delta = point_a - point_b;
    let distance_sq = delta.length_sq();
    let distance = distance_sq.sqrt();
    if distance > 0.0001 {
        return (delta / distance) * (strength / (distance_sq + softening));
    }

    // Coincident points separate along a pseudo-random angle derived from the
    // pair, antisymmetric so both sides push apart instead of drifting
    // together.
    let (low, high) = if index < other {
        (index, other)
    } else {
        (other, index)
    };
    let angle = ((low as f32 * 0.618_034) + (high as f32 * 0.414_214)) * std::f32::consts::TAU;
    let sign = if index < other { 1.0 } else { -1.0 };
    vec2(angle.cos(), angle.sin()) * (sign * (strength / softening))
}
