use crate::core::particle::Particle;
use glam::DVec2;

/// Axis-aligned rectangle described by its centre and half-extents.
///
/// Immutable value type; a fresh `Region` is built for every subdivision
/// and every query range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Rectangle centre.
    pub center: DVec2,
    /// Half-extents per axis (>= 0).
    pub half: DVec2,
}

impl Region {
    pub fn new(center: DVec2, half: DVec2) -> Self {
        debug_assert!(half.x >= 0.0 && half.y >= 0.0);
        Self { center, half }
    }

    /// True iff `point` lies within the rectangle, bounds inclusive.
    #[inline]
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.center.x - self.half.x
            && point.x <= self.center.x + self.half.x
            && point.y >= self.center.y - self.half.y
            && point.y <= self.center.y + self.half.y
    }

    /// True unless `other` is disjoint from `self` on either axis.
    #[inline]
    pub fn intersects(&self, other: &Region) -> bool {
        !(other.center.x - other.half.x > self.center.x + self.half.x
            || other.center.x + other.half.x < self.center.x - self.half.x
            || other.center.y - other.half.y > self.center.y + self.half.y
            || other.center.y + other.half.y < self.center.y - self.half.y)
    }
}

/// Recursive four-way spatial index over particle indices.
///
/// A node buffers at most `capacity` indices; on overflow it splits into
/// four equal quadrants (NW, NE, SW, SE) and pushes its buffered indices
/// down, so an interior node always stores nothing itself. The tree never
/// owns particles: callers pass the particle slice to `insert`/`query`, and
/// the whole structure is cleared and rebuilt from current positions every
/// sub-step rather than maintained incrementally.
#[derive(Debug)]
pub struct QuadTree {
    region: Region,
    capacity: usize,
    items: Vec<u32>,
    children: Option<Box<[QuadTree; 4]>>,
}

impl QuadTree {
    /// Create an empty node over `region`. `capacity` must be >= 1.
    pub fn new(region: Region, capacity: usize) -> Self {
        debug_assert!(capacity >= 1);
        Self {
            region,
            capacity,
            items: Vec::new(),
            children: None,
        }
    }

    /// The region this node covers.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Whether this node has split into four children.
    pub fn is_subdivided(&self) -> bool {
        self.children.is_some()
    }

    /// Total number of indices stored in this subtree.
    pub fn len(&self) -> usize {
        let mut n = self.items.len();
        if let Some(children) = self.children.as_ref() {
            n += children.iter().map(QuadTree::len).sum::<usize>();
        }
        n
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert particle index `idx` at its current position. Returns false
    /// if the position lies outside this node's region; otherwise the index
    /// ends up stored in exactly one node (insertion into children
    /// short-circuits on first acceptance, so a point on a shared quadrant
    /// edge is only ever stored once).
    pub fn insert(&mut self, idx: u32, particles: &[Particle]) -> bool {
        if !self.region.contains(particles[idx as usize].pos) {
            return false;
        }
        if self.children.is_none() {
            if self.items.len() < self.capacity {
                self.items.push(idx);
                return true;
            }
            self.subdivide();
            for buffered in std::mem::take(&mut self.items) {
                self.insert_child(buffered, particles);
            }
        }
        self.insert_child(idx, particles)
    }

    /// Append the indices of stored particles whose positions lie inside
    /// `range` (exact containment, not node overlap), pruning subtrees
    /// whose regions do not intersect it. Output follows traversal order:
    /// this node's buffer, then NW, NE, SW, SE.
    pub fn query(&self, range: &Region, particles: &[Particle], found: &mut Vec<u32>) {
        if !self.region.intersects(range) {
            return;
        }
        for &idx in &self.items {
            if range.contains(particles[idx as usize].pos) {
                found.push(idx);
            }
        }
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.query(range, particles, found);
            }
        }
    }

    /// Region of the deepest node whose region contains `point`, or `None`
    /// if the point lies outside this node.
    pub fn leaf_region_at(&self, point: DVec2) -> Option<Region> {
        if !self.region.contains(point) {
            return None;
        }
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if let Some(region) = child.leaf_region_at(point) {
                    return Some(region);
                }
            }
        }
        Some(self.region)
    }

    /// Collect every node's region in traversal order (self, then NW, NE,
    /// SW, SE), for debug rendering of the index structure.
    pub fn collect_regions(&self, out: &mut Vec<Region>) {
        out.push(self.region);
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.collect_regions(out);
            }
        }
    }

    /// Drop all stored indices and children, returning the node to its
    /// freshly constructed state.
    pub fn clear(&mut self) {
        self.items.clear();
        self.children = None;
    }

    /// Split into four equal quadrants sharing this node's capacity.
    /// Must only run once per node; `insert` guards the call.
    fn subdivide(&mut self) {
        debug_assert!(self.children.is_none(), "node subdivided twice");
        let c = self.region.center;
        let h = self.region.half / 2.0;
        let quadrants = [
            Region::new(DVec2::new(c.x - h.x, c.y - h.y), h), // NW
            Region::new(DVec2::new(c.x + h.x, c.y - h.y), h), // NE
            Region::new(DVec2::new(c.x - h.x, c.y + h.y), h), // SW
            Region::new(DVec2::new(c.x + h.x, c.y + h.y), h), // SE
        ];
        self.children = Some(Box::new(
            quadrants.map(|region| QuadTree::new(region, self.capacity)),
        ));
    }

    /// Attempt insertion into each child in NW, NE, SW, SE order, stopping
    /// at the first that accepts. The quadrants tile this node's region
    /// inclusively, so a point this node contains is always accepted by at
    /// least one child.
    fn insert_child(&mut self, idx: u32, particles: &[Particle]) -> bool {
        let Some(children) = self.children.as_mut() else {
            return false;
        };
        children.iter_mut().any(|child| child.insert(idx, particles))
    }
}
