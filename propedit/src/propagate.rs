//! Proportional-editing distance propagation
//!
//! Every unselected point is assigned the distance to its nearest selected
//! point, measured either in space (via a [`KdTree`]) or along mesh
//! connectivity (via [`connectivity_distance`]).  Selected points are always
//! at distance zero.
use crate::{
    config::{PropagateConfig, ThreadCount},
    connected::connectivity_distance,
    error::{Error, Result},
    island::Islands,
    kdtree::{KdTree, Nearest},
    point::ControlPoint,
    topology::Topology,
};
use log::debug;
use nalgebra::{Matrix4, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Unit vector along which distances are ignored
///
/// Used for "projected" proportional editing, where falloff should look
/// uniform on screen: positions are flattened onto the plane perpendicular
/// to the view direction before measuring.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionAxis(Vector3<f32>);

impl ProjectionAxis {
    /// Builds a projection axis, normalizing the input
    pub fn new(v: Vector3<f32>) -> Result<Self> {
        v.try_normalize(f32::EPSILON)
            .filter(|n| n.iter().all(|c| c.is_finite()))
            .map(Self)
            .ok_or(Error::BadProjectionAxis([v.x, v.y, v.z]))
    }

    /// Builds a projection axis from a view-to-world matrix
    ///
    /// The axis is the view's Z direction (pointing out of the screen).
    pub fn from_view_to_world(mat: &Matrix4<f32>) -> Result<Self> {
        Self::new(mat.fixed_view::<3, 1>(0, 2).into_owned())
    }

    /// Returns the (unit-length) axis
    pub fn axis(&self) -> Vector3<f32> {
        self.0
    }

    /// Removes the component of `p` along the axis
    pub fn project(&self, p: &Vector3<f32>) -> Vector3<f32> {
        p - self.0 * p.dot(&self.0)
    }
}

/// How distances are measured
#[derive(Copy, Clone, Debug)]
pub enum DistanceMode<'a> {
    /// Straight-line distance, optionally ignoring one axis
    Spatial {
        /// Axis to flatten out before measuring
        projection: Option<ProjectionAxis>,
    },
    /// Shortest path along the edges and faces of a mesh
    ///
    /// Vertex indices in the topology refer to positions in the point slice.
    Connected {
        /// Mesh connectivity
        topology: &'a Topology,
    },
}

impl Default for DistanceMode<'_> {
    fn default() -> Self {
        DistanceMode::Spatial { projection: None }
    }
}

/// Computes straight-line proportional distances in place
///
/// Selected points get a distance of zero; unselected points get the
/// distance to the nearest selected point after removing any component along
/// `projection`, or `None` if nothing is selected.
///
/// This is the single-threaded, island-free case of
/// [`PropagateConfig::run`] and cannot fail.
pub fn compute_proportional_distances(
    points: &mut [ControlPoint],
    projection: Option<&ProjectionAxis>,
) {
    let cfg = PropagateConfig::default();
    let nearest = spatial_query(points, projection, &cfg, |q, tree| {
        q.iter().map(|p| tree.find_nearest(p)).collect()
    });
    apply(points, nearest.into_iter().map(|n| n.map(|n| (n.distance, n.index))));
}

pub(crate) fn propagate(
    points: &mut [ControlPoint],
    mode: &DistanceMode<'_>,
    islands: Option<&Islands>,
    cfg: &PropagateConfig,
) -> Result<()> {
    let sources = match mode {
        DistanceMode::Spatial { projection } => {
            let nearest = match cfg.threads {
                ThreadCount::One => {
                    spatial_query(points, projection.as_ref(), cfg, |q, tree| {
                        q.iter().map(|p| tree.find_nearest(p)).collect()
                    })
                }
                ThreadCount::Many(n) => {
                    let pool = rayon::ThreadPoolBuilder::new()
                        .num_threads(n.get())
                        .build()?;
                    spatial_query(points, projection.as_ref(), cfg, |q, tree| {
                        pool.install(|| {
                            q.par_iter().map(|p| tree.find_nearest(p)).collect()
                        })
                    })
                }
            };
            apply(
                points,
                nearest.iter().map(|n| n.map(|n| (n.distance, n.index))),
            )
        }
        DistanceMode::Connected { topology } => {
            let out = connectivity_distance(points, topology, &cfg.space)?;
            // Hidden selected vertices still sit at zero, but are not
            // sources for anything else.
            points
                .iter_mut()
                .enumerate()
                .zip(out.distance.iter().zip(&out.source))
                .map(|((i, p), (d, s))| {
                    if p.selected {
                        p.distance = Some(0.0);
                        Some(i)
                    } else {
                        p.distance = *d;
                        d.map(|_| *s)
                    }
                })
                .collect()
        }
    };

    if let Some(islands) = islands {
        copy_island_data(points, &sources, islands)?;
    }
    Ok(())
}

/// Runs `query` over the (transformed) unselected positions, with a tree
/// built over the selected positions
///
/// Returns one entry per point; selected points map to themselves.
fn spatial_query<F>(
    points: &[ControlPoint],
    projection: Option<&ProjectionAxis>,
    cfg: &PropagateConfig,
    query: F,
) -> Vec<Option<Nearest>>
where
    F: FnOnce(&[Vector3<f32>], &KdTree) -> Vec<Option<Nearest>>,
{
    let transform = |p: &ControlPoint| {
        let v = cfg.space * p.pos;
        match projection {
            Some(axis) => axis.project(&v),
            None => v,
        }
    };
    let tree = KdTree::new(
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.selected)
            .map(|(i, p)| (i, transform(p))),
    );
    let (unselected, queries): (Vec<usize>, Vec<Vector3<f32>>) = points
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.selected)
        .map(|(i, p)| (i, transform(p)))
        .unzip();
    debug!(
        "spatial propagation: {} selected, {} unselected",
        tree.len(),
        unselected.len()
    );

    let found = query(&queries, &tree);

    let mut out: Vec<Option<Nearest>> = points
        .iter()
        .enumerate()
        .map(|(index, p)| {
            p.selected.then_some(Nearest {
                index,
                distance: 0.0,
            })
        })
        .collect();
    for (i, n) in unselected.into_iter().zip(found) {
        out[i] = n;
    }
    out
}

/// Writes distances into points, returning the per-point source index
fn apply<I>(points: &mut [ControlPoint], nearest: I) -> Vec<Option<usize>>
where
    I: IntoIterator<Item = Option<(f32, usize)>>,
{
    points
        .iter_mut()
        .zip(nearest)
        .map(|(p, n)| {
            p.distance = n.map(|(d, _)| d);
            n.map(|(_, s)| s)
        })
        .collect()
}

/// Copies pivot and orientation from each point's source island
///
/// Selected points take their own island's data; unselected points take the
/// data of their nearest selected point's island (or of that point itself,
/// if it has no island).  Points without a source are left untouched.
fn copy_island_data(
    points: &mut [ControlPoint],
    sources: &[Option<usize>],
    islands: &Islands,
) -> Result<()> {
    for (i, src) in sources.iter().enumerate() {
        let Some(s) = *src else {
            continue;
        };
        let source = points[s];
        let p = &mut points[i];
        match source.island {
            Some(island) => {
                let data = islands.try_get(island)?;
                p.center = data.center;
                p.axis = data.axis;
                p.island = Some(island);
            }
            None if s != i => {
                p.center = source.center;
                p.axis = source.axis;
                p.island = None;
            }
            None => (),
        }
    }
    Ok(())
}
