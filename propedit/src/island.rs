//! Islands: rigid groups of points sharing one pivot and orientation
//!
//! Islands live in an arena ([`Islands`]); each [`ControlPoint`] refers to
//! its island by [`IslandIndex`].
use crate::{
    error::{Error, Result},
    point::ControlPoint,
    topology::Topology,
};
use log::debug;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Strongly-typed index into an [`Islands`] arena
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct IslandIndex(u32);

impl IslandIndex {
    /// Builds a new index
    pub fn new(i: u32) -> Self {
        Self(i)
    }

    /// Returns the index as a `usize`
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for IslandIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared pivot and orientation for a group of points
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Island {
    /// Pivot point
    pub center: Vector3<f32>,
    /// Orientation matrix
    pub axis: Matrix3<f32>,
}

impl Island {
    /// Builds an island with an identity orientation
    pub fn new(center: Vector3<f32>) -> Self {
        Self {
            center,
            axis: Matrix3::identity(),
        }
    }
}

/// Options for [`Islands::from_topology`]
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct IslandOptions {
    /// Give every selected point that is not part of a larger group its own
    /// one-point island
    ///
    /// Needed by connected proportional editing, so that unselected points
    /// can inherit a pivot from any selected point.
    pub single_islands: bool,

    /// Compute an orientation from face normals
    pub calc_axis: bool,
}

/// Arena of islands
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Islands {
    islands: Vec<Island>,
}

impl Islands {
    /// Builds an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an island, returning its index
    pub fn push(&mut self, island: Island) -> IslandIndex {
        let i = IslandIndex(self.islands.len() as u32);
        self.islands.push(island);
        i
    }

    /// Looks up an island, returning `None` if the index is out of range
    pub fn get(&self, i: IslandIndex) -> Option<&Island> {
        self.islands.get(i.index())
    }

    /// Looks up an island, returning an error if the index is out of range
    pub fn try_get(&self, i: IslandIndex) -> Result<&Island> {
        self.get(i)
            .ok_or(Error::BadIslandIndex(i.index(), self.islands.len()))
    }

    /// Returns the number of islands
    pub fn len(&self) -> usize {
        self.islands.len()
    }

    /// Checks whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    /// Iterates over islands
    pub fn iter(&self) -> impl Iterator<Item = &Island> {
        self.islands.iter()
    }

    /// Groups selected points into islands using mesh connectivity
    ///
    /// Two selected points are in the same island if they are joined by a
    /// chain of visible edges whose endpoints are all selected.  Each island
    /// is centered on the mean of its points; if `opts.calc_axis` is set, it
    /// is oriented along the averaged normal of its fully-selected faces.
    ///
    /// Island indices are written into `points[i].island` for member points;
    /// all other points have their island cleared.
    pub fn from_topology(
        points: &mut [ControlPoint],
        topology: &Topology,
        opts: IslandOptions,
    ) -> Result<Self> {
        topology.validate(points.len())?;
        let usable: Vec<bool> = points
            .iter()
            .enumerate()
            .map(|(v, p)| p.selected && !topology.is_vert_hidden(v))
            .collect();

        let mut groups = DisjointSet::new(points.len());
        for e in topology.edges.iter().filter(|e| !e.hidden) {
            let [a, b] = e.verts.map(|v| v as usize);
            if usable[a] && usable[b] {
                groups.union(a, b);
            }
        }

        // Count points per root, so that lone points can be skipped
        let mut count = vec![0usize; points.len()];
        for v in (0..points.len()).filter(|&v| usable[v]) {
            count[groups.find(v)] += 1;
        }

        let mut out = Self::new();
        let mut root_island: Vec<Option<IslandIndex>> = vec![None; points.len()];
        let mut sums: Vec<(Vector3<f32>, usize)> = vec![];
        for v in 0..points.len() {
            let island = if !usable[v] {
                None
            } else {
                let root = groups.find(v);
                if count[root] > 1 {
                    let i = *root_island[root].get_or_insert_with(|| {
                        sums.push((Vector3::zeros(), 0));
                        out.push(Island::new(Vector3::zeros()))
                    });
                    let s = &mut sums[i.index()];
                    s.0 += points[v].pos;
                    s.1 += 1;
                    Some(i)
                } else {
                    None
                }
            };
            points[v].island = island;
        }
        for (island, (sum, n)) in out.islands.iter_mut().zip(&sums) {
            island.center = *sum / *n as f32;
        }

        if opts.calc_axis {
            let mut normals = vec![Vector3::zeros(); out.len()];
            for f in topology.faces.iter().filter(|f| !f.hidden) {
                let first = f.verts[0] as usize;
                if !f.verts.iter().all(|&v| usable[v as usize]) {
                    continue;
                }
                if let Some(i) = points[first].island {
                    normals[i.index()] += face_normal(points, &f.verts);
                }
            }
            for (island, n) in out.islands.iter_mut().zip(&normals) {
                if let Some(n) = n.try_normalize(f32::EPSILON) {
                    island.axis = basis_from_normal(&n);
                }
            }
        }

        let groups_len = out.len();
        if opts.single_islands {
            for p in points.iter_mut().enumerate().filter_map(|(v, p)| {
                (p.selected && p.island.is_none() && !topology.is_vert_hidden(v))
                    .then_some(p)
            }) {
                p.island = Some(out.push(Island::new(p.pos)));
            }
        }
        debug!(
            "built {} islands ({} connected, {} single)",
            out.len(),
            groups_len,
            out.len() - groups_len
        );
        Ok(out)
    }
}

/// Area-weighted polygon normal (Newell's method)
fn face_normal(points: &[ControlPoint], verts: &[u32]) -> Vector3<f32> {
    let mut n = Vector3::zeros();
    for (i, &a) in verts.iter().enumerate() {
        let b = verts[(i + 1) % verts.len()];
        let pa = points[a as usize].pos;
        let pb = points[b as usize].pos;
        n += pa.cross(&pb);
    }
    n
}

/// Builds an orthonormal basis which maps `normal` onto +Z
///
/// `normal` must be unit-length.
pub fn basis_from_normal(normal: &Vector3<f32>) -> Matrix3<f32> {
    let len_sq = normal.x * normal.x + normal.y * normal.y;
    let (t, b) = if len_sq > f32::EPSILON {
        let d = 1.0 / len_sq.sqrt();
        let t = Vector3::new(normal.y * d, -normal.x * d, 0.0);
        let b = Vector3::new(
            -normal.z * t.y,
            normal.z * t.x,
            normal.x * t.y - normal.y * t.x,
        );
        (t, b)
    } else {
        let sign = if normal.z < 0.0 { -1.0 } else { 1.0 };
        (Vector3::new(sign, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0))
    };
    Matrix3::from_rows(&[t.transpose(), b.transpose(), normal.transpose()])
}

/// Union-find with path halving
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut v: usize) -> usize {
        while self.parent[v] != v {
            self.parent[v] = self.parent[self.parent[v]];
            v = self.parent[v];
        }
        v
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_points(selected: &[bool]) -> Vec<ControlPoint> {
        selected
            .iter()
            .enumerate()
            .map(|(i, &s)| ControlPoint::new(Vector3::new(i as f32, 0.0, 0.0), s))
            .collect()
    }

    #[test]
    fn connected_groups() {
        // 0-1-2   3-4   5
        let mut points = grid_points(&[true, true, true, true, true, true]);
        let topo = Topology::from_edges([[0, 1], [1, 2], [3, 4]]);
        let islands =
            Islands::from_topology(&mut points, &topo, IslandOptions::default())
                .unwrap();
        assert_eq!(islands.len(), 2);
        let a = points[0].island.unwrap();
        assert_eq!(points[1].island, Some(a));
        assert_eq!(points[2].island, Some(a));
        let b = points[3].island.unwrap();
        assert_ne!(a, b);
        assert_eq!(points[5].island, None);
        assert_relative_eq!(islands.get(a).unwrap().center.x, 1.0);
        assert_relative_eq!(islands.get(b).unwrap().center.x, 3.5);
    }

    #[test]
    fn unselected_edges_split_islands() {
        let mut points = grid_points(&[true, false, true]);
        let topo = Topology::from_edges([[0, 1], [1, 2]]);
        let opts = IslandOptions {
            single_islands: true,
            ..Default::default()
        };
        let islands = Islands::from_topology(&mut points, &topo, opts).unwrap();
        assert_eq!(islands.len(), 2);
        assert_eq!(points[1].island, None);
        assert_ne!(points[0].island, points[2].island);
        let c = islands.try_get(points[2].island.unwrap()).unwrap().center;
        assert_eq!(c, points[2].pos);
    }

    #[test]
    fn hidden_vertices_are_skipped() {
        // 0-1-2-3, all selected, with 1 hidden
        let mut points = grid_points(&[true, true, true, true]);
        let topo = Topology {
            hidden_verts: vec![false, true, false, false],
            ..Topology::from_edges([[0, 1], [1, 2], [2, 3]])
        };
        let opts = IslandOptions {
            single_islands: true,
            ..Default::default()
        };
        let islands = Islands::from_topology(&mut points, &topo, opts).unwrap();

        // One island for 2-3, and a single-point island for 0
        assert_eq!(islands.len(), 2);
        assert_eq!(points[1].island, None);
        let a = points[0].island.unwrap();
        let b = points[2].island.unwrap();
        assert_ne!(a, b);
        assert_eq!(points[3].island, Some(b));
        assert_relative_eq!(islands.get(a).unwrap().center.x, 0.0);
        assert_relative_eq!(islands.get(b).unwrap().center.x, 2.5);
    }

    #[test]
    fn axis_from_faces() {
        let mut points: Vec<ControlPoint> = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, 1.0),
        ]
        .into_iter()
        .map(|p| ControlPoint::new(p, true))
        .collect();
        let topo = Topology::from_faces([vec![0, 1, 2, 3]]);
        let opts = IslandOptions {
            calc_axis: true,
            ..Default::default()
        };
        let islands = Islands::from_topology(&mut points, &topo, opts).unwrap();
        assert_eq!(islands.len(), 1);
        let axis = islands.iter().next().unwrap().axis;
        // The quad faces -Y, which the island's axis maps to +Z
        let z = axis * Vector3::new(0.0, -1.0, 0.0);
        assert_relative_eq!(z, Vector3::z(), epsilon = 1e-6);
    }

    #[test]
    fn basis_is_orthonormal() {
        for n in [
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(1.0, 2.0, 3.0).normalize(),
        ] {
            let m = basis_from_normal(&n);
            assert_relative_eq!(m * m.transpose(), Matrix3::identity(), epsilon = 1e-6);
            assert_relative_eq!(m * n, Vector3::z(), epsilon = 1e-6);
        }
    }

    #[test]
    fn bad_index() {
        let islands = Islands::new();
        assert!(matches!(
            islands.try_get(IslandIndex::new(3)),
            Err(Error::BadIslandIndex(3, 0))
        ));
    }
}
