//! Static R-tree over a generated dataset.
//!
//! The tree is bulk-loaded once and never modified: points are sorted by
//! latitude and packed into leaves of `max_entries`, then each level is sorted
//! by the x (longitude) center of its bounding rectangles and packed into
//! parents of `max_entries` until a single root remains.
//!
//! Queries walk the tree best-first. Nodes wait in a min-heap keyed by the
//! distance from the query to their bounding rectangle, candidates in a
//! max-heap bounded to `k`; a node is skipped once it is farther away than the
//! worst of `k` candidates. Distances are planar Euclidean on degrees, the
//! same metric as [`crate::nearest::k_nearest`].

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use geocluster_common::{GeneratedPoint, GeneratorError, Result};

use crate::nearest::Neighbor;

/// Fan-out used when none is given.
pub const DEFAULT_MAX_ENTRIES: usize = 4;

/// Axis-aligned bounding rectangle, x = longitude, y = latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    fn point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn of_point(point: &GeneratedPoint) -> Self {
        Self::point(point.longitude, point.latitude)
    }

    fn union(&self, other: &Rect) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    /// Smallest distance from (`x`, `y`) to any point of the rectangle.
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        let dx = if x < self.min_x {
            self.min_x - x
        } else if x > self.max_x {
            x - self.max_x
        } else {
            0.0
        };
        let dy = if y < self.min_y {
            self.min_y - y
        } else if y > self.max_y {
            y - self.max_y
        } else {
            0.0
        };
        dx.hypot(dy)
    }

    pub fn contains(&self, other: &Rect) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }
}

#[derive(Debug)]
enum NodeKind {
    Leaf(Vec<GeneratedPoint>),
    /// Indices into the node arena
    Inner(Vec<usize>),
}

#[derive(Debug)]
struct Node {
    mbr: Rect,
    kind: NodeKind,
}

/// Bulk-loaded R-tree answering k-nearest-neighbour queries.
#[derive(Debug)]
pub struct RTree {
    nodes: Vec<Node>,
    root: Option<usize>,
    len: usize,
    max_entries: usize,
}

impl RTree {
    /// Builds a tree with [`DEFAULT_MAX_ENTRIES`] entries per node.
    pub fn bulk_load(points: &[GeneratedPoint]) -> Self {
        Self::build(points, DEFAULT_MAX_ENTRIES)
    }

    /// Builds a tree with a custom fan-out.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidConfig`] if `max_entries < 2`, which
    /// would never reduce a level to a single root.
    pub fn with_max_entries(points: &[GeneratedPoint], max_entries: usize) -> Result<Self> {
        if max_entries < 2 {
            return Err(GeneratorError::InvalidConfig(format!(
                "R-tree nodes need at least 2 entries, got {max_entries}"
            )));
        }
        Ok(Self::build(points, max_entries))
    }

    fn build(points: &[GeneratedPoint], max_entries: usize) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: None,
            len: points.len(),
            max_entries,
        };

        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.latitude.total_cmp(&b.latitude));

        let mut level: Vec<usize> = sorted
            .chunks(max_entries)
            .map(|chunk| {
                let mbr = chunk
                    .iter()
                    .skip(1)
                    .fold(Rect::of_point(&chunk[0]), |acc, p| acc.union(&Rect::of_point(p)));
                tree.push(Node {
                    mbr,
                    kind: NodeKind::Leaf(chunk.to_vec()),
                })
            })
            .collect();

        while level.len() > 1 {
            level.sort_by(|&a, &b| {
                tree.nodes[a]
                    .mbr
                    .center_x()
                    .total_cmp(&tree.nodes[b].mbr.center_x())
            });
            level = level
                .chunks(max_entries)
                .map(|children| {
                    let mbr = children
                        .iter()
                        .skip(1)
                        .fold(tree.nodes[children[0]].mbr, |acc, &c| acc.union(&tree.nodes[c].mbr));
                    tree.push(Node {
                        mbr,
                        kind: NodeKind::Inner(children.to_vec()),
                    })
                })
                .collect();
        }

        tree.root = level.first().copied();
        tracing::debug!(
            "Built R-tree over {} points: {} nodes, depth {}",
            tree.len,
            tree.nodes.len(),
            tree.depth()
        );
        tree
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Bounding rectangle of the whole dataset.
    pub fn bounds(&self) -> Option<Rect> {
        self.root.map(|root| self.nodes[root].mbr)
    }

    /// Number of levels, leaves included. Zero for an empty tree.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.root;
        while let Some(index) = current {
            depth += 1;
            current = match &self.nodes[index].kind {
                NodeKind::Leaf(_) => None,
                NodeKind::Inner(children) => children.first().copied(),
            };
        }
        depth
    }

    /// Returns the `k` points closest to (`lat`, `lon`), nearest first.
    ///
    /// Points at equal distance are ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidQuery`] if the query coordinates are
    /// not finite.
    pub fn nearest(&self, lat: f64, lon: f64, k: usize) -> Result<Vec<Neighbor>> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(GeneratorError::InvalidQuery(format!(
                "query coordinates must be finite, got lat={lat} lon={lon}"
            )));
        }
        let Some(root) = self.root else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut queue = BinaryHeap::new();
        queue.push(Reverse(QueuedNode {
            distance: self.nodes[root].mbr.distance(lon, lat),
            index: root,
        }));
        let mut best: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k.min(self.len));

        while let Some(Reverse(current)) = queue.pop() {
            if best.len() == k && best.peek().is_some_and(|worst| current.distance > worst.0.distance) {
                // Every remaining node is at least this far away
                break;
            }

            match &self.nodes[current.index].kind {
                NodeKind::Leaf(points) => {
                    for point in points {
                        let candidate = Candidate(Neighbor {
                            point: *point,
                            distance: (point.longitude - lon).hypot(point.latitude - lat),
                        });
                        if best.len() < k {
                            best.push(candidate);
                        } else if best.peek().is_some_and(|worst| candidate < *worst) {
                            best.pop();
                            best.push(candidate);
                        }
                    }
                }
                NodeKind::Inner(children) => {
                    for &child in children {
                        let distance = self.nodes[child].mbr.distance(lon, lat);
                        let worth_visiting = best.len() < k
                            || best.peek().is_some_and(|worst| distance <= worst.0.distance);
                        if worth_visiting {
                            queue.push(Reverse(QueuedNode {
                                distance,
                                index: child,
                            }));
                        }
                    }
                }
            }
        }

        Ok(best.into_sorted_vec().into_iter().map(|c| c.0).collect())
    }
}

#[derive(Debug, Clone, Copy)]
struct QueuedNode {
    distance: f64,
    index: usize,
}

impl PartialEq for QueuedNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedNode {}

impl PartialOrd for QueuedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// Neighbor ordered by (distance, id), so the heap top is the worst kept.
#[derive(Debug, Clone, Copy)]
struct Candidate(Neighbor);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .distance
            .total_cmp(&other.0.distance)
            .then(self.0.point.id.cmp(&other.0.point.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate, rng_from_seed};
    use crate::nearest::k_nearest;
    use geocluster_common::GenerationParams;

    fn point(id: u64, latitude: f64, longitude: f64) -> GeneratedPoint {
        GeneratedPoint {
            latitude,
            longitude,
            id,
        }
    }

    fn ids(neighbors: &[Neighbor]) -> Vec<u64> {
        neighbors.iter().map(|n| n.point.id).collect()
    }

    /// Every inner node must enclose its children.
    fn assert_nested(tree: &RTree, index: usize) -> usize {
        match &tree.nodes[index].kind {
            NodeKind::Leaf(points) => {
                for p in points {
                    assert!(tree.nodes[index].mbr.contains(&Rect::of_point(p)));
                }
                points.len()
            }
            NodeKind::Inner(children) => {
                assert!(children.len() <= tree.max_entries);
                children
                    .iter()
                    .map(|&c| {
                        assert!(tree.nodes[index].mbr.contains(&tree.nodes[c].mbr));
                        assert_nested(tree, c)
                    })
                    .sum()
            }
        }
    }

    #[test]
    fn test_rect_distance() {
        let rect = Rect {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 2.0,
            max_y: 2.0,
        };
        assert_eq!(rect.distance(1.0, 1.0), 0.0);
        assert_eq!(rect.distance(5.0, 1.0), 3.0);
        assert_eq!(rect.distance(5.0, 6.0), 5.0);
        assert_eq!(rect.distance(-3.0, -4.0), 5.0);
    }

    #[test]
    fn test_empty_tree() {
        let tree = RTree::bulk_load(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert!(tree.bounds().is_none());
        assert!(tree.nearest(0.0, 0.0, 3).unwrap().is_empty());
    }

    #[test]
    fn test_structure_holds_every_point() {
        let params = GenerationParams {
            total_points: 1_003,
            num_clusters: 10,
            perturbation_stddev_degrees: 0.5,
        };
        let points = generate(params, rng_from_seed(Some(4))).unwrap();

        let tree = RTree::bulk_load(&points);

        assert_eq!(tree.len(), 1_003);
        assert_eq!(tree.max_entries(), DEFAULT_MAX_ENTRIES);
        let root = tree.root.unwrap();
        assert_eq!(assert_nested(&tree, root), 1_003);
        // 251 leaves -> 63 -> 16 -> 4 -> root
        assert_eq!(tree.depth(), 5);
    }

    #[test]
    fn test_small_example() {
        let points = vec![
            point(1, 10.0, 10.0),
            point(2, 0.0, 1.0),
            point(3, 3.0, 4.0),
            point(4, -0.5, 0.0),
            point(5, 40.0, -100.0),
            point(6, -60.0, 150.0),
        ];
        let tree = RTree::with_max_entries(&points, 2).unwrap();

        let nearest = tree.nearest(0.0, 0.0, 3).unwrap();

        assert_eq!(ids(&nearest), vec![4, 2, 3]);
        assert_eq!(nearest[2].distance, 5.0);
    }

    #[test]
    fn test_matches_brute_force_on_generated_dataset() {
        let params = GenerationParams {
            total_points: 5_000,
            num_clusters: 25,
            perturbation_stddev_degrees: 0.1,
        };
        let points = generate(params, rng_from_seed(Some(31))).unwrap();
        let tree = RTree::bulk_load(&points);

        let queries = [
            (34.0, -118.0),
            (points[0].latitude, points[0].longitude),
            (points[4_321].latitude + 0.05, points[4_321].longitude - 0.05),
            (-89.9, 179.9),
            (0.0, 0.0),
        ];
        for (lat, lon) in queries {
            for k in [1, 3, 10, 50] {
                let expected = k_nearest(&points, lat, lon, k).unwrap();
                let actual = tree.nearest(lat, lon, k).unwrap();
                assert_eq!(ids(&actual), ids(&expected), "lat={lat} lon={lon} k={k}");
            }
        }
    }

    #[test]
    fn test_k_larger_than_dataset() {
        let points = vec![point(1, 1.0, 1.0), point(2, 2.0, 2.0)];
        let tree = RTree::bulk_load(&points);

        assert_eq!(ids(&tree.nearest(0.0, 0.0, 10).unwrap()), vec![1, 2]);
        assert!(tree.nearest(0.0, 0.0, 0).unwrap().is_empty());
        assert_eq!(tree.nearest(0.0, 0.0, usize::MAX).unwrap().len(), 2);
    }

    #[test]
    fn test_ties_ordered_by_id() {
        let points = vec![point(3, 0.0, 1.0), point(1, 1.0, 0.0), point(2, -1.0, 0.0)];
        let tree = RTree::bulk_load(&points);

        assert_eq!(ids(&tree.nearest(0.0, 0.0, 2).unwrap()), vec![1, 2]);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            RTree::with_max_entries(&[], 1),
            Err(GeneratorError::InvalidConfig(_))
        ));
        let tree = RTree::bulk_load(&[point(1, 0.0, 0.0)]);
        assert!(matches!(
            tree.nearest(0.0, f64::INFINITY, 1),
            Err(GeneratorError::InvalidQuery(_))
        ));
    }
}
