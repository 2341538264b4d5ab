//! Connectivity distance: shortest paths along mesh edges and across faces
//!
//! Selected vertices start at distance zero.  Distance then flows outward as
//! a wavefront of edges: along loose edges (and edges touching the original
//! selection) it accumulates edge lengths; across faces it uses a geodesic
//! estimate that unfolds the triangle formed by the edge and the opposite
//! vertex.  Passes repeat until no edge changes.
use crate::{error::Result, point::ControlPoint, topology::Topology};
use log::debug;
use nalgebra::{Matrix3, Vector2, Vector3};

/// Output of a connectivity-distance pass
#[derive(Clone, Debug)]
pub struct ConnectedDistances {
    /// Per-vertex distance, or `None` if no selected vertex is reachable
    pub distance: Vec<Option<f32>>,

    /// Per-vertex index of the selected vertex which the distance came from
    ///
    /// Unreached and selected vertices refer to themselves.
    pub source: Vec<usize>,
}

/// Computes graph distances from every vertex to the nearest selected one
///
/// `space` is applied to positions before measuring lengths.
pub fn connectivity_distance(
    points: &[ControlPoint],
    topology: &Topology,
    space: &Matrix3<f32>,
) -> Result<ConnectedDistances> {
    topology.validate(points.len())?;
    let adj = topology.adjacency(points.len());

    let pos: Vec<Vector3<f32>> = points.iter().map(|p| space * p.pos).collect();
    let hidden: Vec<bool> =
        (0..points.len()).map(|v| topology.is_vert_hidden(v)).collect();
    let selected: Vec<bool> = points
        .iter()
        .zip(&hidden)
        .map(|(p, h)| p.selected && !h)
        .collect();

    let mut state = State {
        dist: selected
            .iter()
            .map(|&s| if s { 0.0 } else { f32::INFINITY })
            .collect(),
        source: (0..points.len()).collect(),
        pos: &pos,
        selected: &selected,
        hidden: &hidden,
    };

    // An edge is loose if no visible face uses it
    let loose: Vec<bool> = adj
        .edge_faces
        .iter()
        .map(|fs| fs.iter().all(|&f| topology.faces[f].hidden))
        .collect();

    let mut queue: Vec<usize> = topology
        .edges
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.hidden)
        .filter(|(_, e)| {
            e.verts.iter().any(|&v| state.dist[v as usize].is_finite())
        })
        .map(|(i, _)| i)
        .collect();
    let mut queued = vec![false; topology.edges.len()];
    let mut next = vec![];
    let mut passes = 0;

    while !queue.is_empty() {
        passes += 1;
        while let Some(e) = queue.pop() {
            let [mut v1, mut v2] = topology.edges[e].verts.map(|v| v as usize);

            if loose[e]
                || !state.dist[v1].is_finite()
                || !state.dist[v2].is_finite()
            {
                // Propagate along the edge, from the nearer vertex
                if state.dist[v1] > state.dist[v2] {
                    std::mem::swap(&mut v1, &mut v2);
                }
                if state.relax(v2, v1, None) {
                    // Direct distance along an edge is only exact next to
                    // the selection or along loose edges; elsewhere, the
                    // across-face pass below takes over.
                    let direct = loose[e] || selected[v1] || selected[v2];
                    for &other in &adj.vert_edges[v2] {
                        if other != e
                            && !queued[other]
                            && !topology.edges[other].hidden
                            && (direct || loose[other])
                        {
                            queued[other] = true;
                            next.push(other);
                        }
                    }
                }
            }

            if loose[e] {
                continue;
            }
            for &f in &adj.edge_faces[e] {
                let face = &topology.faces[f];
                if face.hidden {
                    continue;
                }
                for v0 in face.verts.iter().map(|&v| v as usize) {
                    if v0 == v1 || v0 == v2 || !state.relax(v0, v1, Some(v2)) {
                        continue;
                    }
                    for &other in &adj.vert_edges[v0] {
                        let far = topology.edges[other].other(v0 as u32);
                        if other != e
                            && !queued[other]
                            && !topology.edges[other].hidden
                            && (loose[other]
                                || state.dist[far as usize].is_finite())
                        {
                            queued[other] = true;
                            next.push(other);
                        }
                    }
                }
            }
        }
        for &e in &next {
            queued[e] = false;
        }
        std::mem::swap(&mut queue, &mut next);
    }

    let reached = state.dist.iter().filter(|d| d.is_finite()).count();
    debug!(
        "connectivity distance: {reached} of {} vertices reached in {passes} passes",
        points.len()
    );

    Ok(ConnectedDistances {
        distance: state
            .dist
            .into_iter()
            .map(|d| d.is_finite().then_some(d))
            .collect(),
        source: state.source,
    })
}

struct State<'a> {
    dist: Vec<f32>,
    source: Vec<usize>,
    pos: &'a [Vector3<f32>],
    selected: &'a [bool],
    hidden: &'a [bool],
}

impl State<'_> {
    /// Tries to shorten the distance at `v0` using `v1` (and optionally the
    /// triangle formed with `v2`)
    ///
    /// Returns `true` if the distance at `v0` was improved.
    fn relax(&mut self, v0: usize, v1: usize, v2: Option<usize>) -> bool {
        if self.selected[v0] || self.hidden[v0] {
            return false;
        }
        let d0 = self.dist[v0];
        let d1 = self.dist[v1];
        if d0 <= d1 {
            return false;
        }
        let new = match v2 {
            Some(v2) => {
                let d2 = self.dist[v2];
                if d0 <= d2 {
                    return false;
                }
                geodesic_distance_across_triangle(
                    &self.pos[v0],
                    &self.pos[v1],
                    &self.pos[v2],
                    d1,
                    d2,
                )
            }
            None => d1 + (self.pos[v1] - self.pos[v0]).norm(),
        };
        if new < d0 {
            self.dist[v0] = new;
            self.source[v0] = self.source[v1];
            true
        } else {
            false
        }
    }
}

/// Estimates the geodesic distance at `v0`, given known distances at `v1`
/// and `v2`
///
/// The triangle is unfolded into its own plane and a virtual source point is
/// placed at distances `dist1` and `dist2` from `v1` and `v2`.  If the line
/// from that source to `v0` crosses the `v1-v2` edge, its length is the
/// estimate; otherwise, this falls back to the shorter path through either
/// vertex.
///
/// See "Fast Exact and Approximate Geodesics on Meshes" (Surazhsky et al.,
/// 2005), figure 9.
pub fn geodesic_distance_across_triangle(
    v0: &Vector3<f32>,
    v1: &Vector3<f32>,
    v2: &Vector3<f32>,
    dist1: f32,
    dist2: f32,
) -> f32 {
    let v10 = v0 - v1;
    let v12 = v2 - v1;

    if dist1 != 0.0 && dist2 != 0.0 {
        let d12 = v12.norm();
        if d12 * d12 > 0.0 {
            let u = v12 / d12;
            let n = v12.cross(&v10).normalize();
            let v = n.cross(&u);

            // v0 in triangle-local coordinates
            let v0_local = Vector2::new(v10.dot(&u), v10.dot(&v).abs());

            let a = 0.5 * (1.0 + (dist1 * dist1 - dist2 * dist2) / (d12 * d12));
            let hh = dist1 * dist1 - a * a * d12 * d12;
            if hh > 0.0 {
                let h = hh.sqrt();
                let source = Vector2::new(a * d12, -h);

                let x_intercept = source.x
                    + h * (v0_local.x - source.x) / (v0_local.y + h);
                if (0.0..=d12).contains(&x_intercept) {
                    return (source - v0_local).norm();
                }
            }
        }
    }

    (dist1 + v10.norm()).min(dist2 + (v0 - v2).norm())
}
