//! A balanced 3D k-d tree for nearest-neighbor queries
//!
//! The tree is stored as a flat array: each subslice is split at its median
//! along one axis (cycling X, Y, Z with depth), so the node for a subslice is
//! always its middle element and no child pointers are needed.
use log::trace;
use nalgebra::Vector3;

#[derive(Copy, Clone, Debug)]
struct Node {
    pos: Vector3<f32>,
    index: usize,
}

/// Result of a nearest-neighbor query
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Nearest {
    /// Caller-provided index of the nearest stored point
    pub index: usize,

    /// Euclidean distance to that point
    pub distance: f32,
}

/// Static k-d tree over a set of points
///
/// The tree is immutable once built; rebuild it if the points change.
#[derive(Clone, Debug, Default)]
pub struct KdTree {
    nodes: Vec<Node>,
}

impl KdTree {
    /// Builds a balanced tree from `(index, position)` pairs
    pub fn new<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (usize, Vector3<f32>)>,
    {
        let mut nodes: Vec<Node> = points
            .into_iter()
            .map(|(index, pos)| Node { pos, index })
            .collect();
        balance(&mut nodes, 0);
        trace!("built k-d tree with {} nodes", nodes.len());
        Self { nodes }
    }

    /// Returns the number of points in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Checks whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds the stored point closest to `query`
    ///
    /// Returns `None` if the tree is empty.  When several points are at the
    /// same distance, any one of them may be returned.
    pub fn find_nearest(&self, query: &Vector3<f32>) -> Option<Nearest> {
        let mut best = None;
        nearest(&self.nodes, 0, query, &mut best);
        best.map(|(index, dist_sq): (usize, f32)| Nearest {
            index,
            distance: dist_sq.sqrt(),
        })
    }
}

fn balance(nodes: &mut [Node], depth: usize) {
    if nodes.len() <= 1 {
        return;
    }
    let axis = depth % 3;
    let mid = nodes.len() / 2;
    nodes.select_nth_unstable_by(mid, |a, b| a.pos[axis].total_cmp(&b.pos[axis]));
    let (lo, hi) = nodes.split_at_mut(mid);
    balance(lo, depth + 1);
    balance(&mut hi[1..], depth + 1);
}

fn nearest(
    nodes: &[Node],
    depth: usize,
    query: &Vector3<f32>,
    best: &mut Option<(usize, f32)>,
) {
    if nodes.is_empty() {
        return;
    }
    let mid = nodes.len() / 2;
    let node = &nodes[mid];

    let dist_sq = (node.pos - query).norm_squared();
    if best.is_none_or(|(_, b)| dist_sq < b) {
        *best = Some((node.index, dist_sq));
    }

    let axis = depth % 3;
    let delta = query[axis] - node.pos[axis];
    let (near, far) = if delta < 0.0 {
        (&nodes[..mid], &nodes[mid + 1..])
    } else {
        (&nodes[mid + 1..], &nodes[..mid])
    };
    nearest(near, depth + 1, query, best);

    // Only descend into the far side if the splitting plane is closer than
    // the best candidate so far
    if best.is_none_or(|(_, b)| delta * delta < b) {
        nearest(far, depth + 1, query, best);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn brute(points: &[Vector3<f32>], q: &Vector3<f32>) -> Option<f32> {
        points
            .iter()
            .map(|p| (p - q).norm_squared())
            .min_by(|a, b| a.total_cmp(b))
            .map(f32::sqrt)
    }

    #[test]
    fn empty_tree() {
        let tree = KdTree::new(std::iter::empty());
        assert!(tree.is_empty());
        assert_eq!(tree.find_nearest(&Vector3::zeros()), None);
    }

    #[test]
    fn single_point() {
        let tree = KdTree::new([(7, Vector3::new(1.0, 2.0, 2.0))]);
        let n = tree.find_nearest(&Vector3::zeros()).unwrap();
        assert_eq!(n.index, 7);
        assert_eq!(n.distance, 3.0);
    }

    #[test]
    fn duplicate_points() {
        let p = Vector3::new(0.5, 0.5, 0.5);
        let tree = KdTree::new((0..16).map(|i| (i, p)));
        let n = tree.find_nearest(&p).unwrap();
        assert_eq!(n.distance, 0.0);
        assert!(n.index < 16);
    }

    #[test]
    fn matches_brute_force() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
        for size in [1, 2, 3, 10, 100, 1000] {
            let points: Vec<Vector3<f32>> = (0..size)
                .map(|_| {
                    Vector3::new(
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                    )
                })
                .collect();
            let tree = KdTree::new(points.iter().cloned().enumerate());
            assert_eq!(tree.len(), size);
            for _ in 0..200 {
                let q = Vector3::new(
                    rng.gen_range(-1.5..1.5),
                    rng.gen_range(-1.5..1.5),
                    rng.gen_range(-1.5..1.5),
                );
                let n = tree.find_nearest(&q).unwrap();
                let expected = brute(&points, &q).unwrap();
                assert_eq!(n.distance, expected, "size {size}, query {q:?}");
                assert_eq!((points[n.index] - q).norm(), expected);
            }
        }
    }
}
