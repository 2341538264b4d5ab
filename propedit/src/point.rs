//! Control points and simple operations on slices of them
use crate::island::IslandIndex;
use nalgebra::{Matrix3, Vector3};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A single transformable element
///
/// The caller owns the slice of points; propagation reads `pos`,
/// `selected`, and `island`, then writes `distance` (and, in island mode,
/// `center`, `axis`, and `island` on unselected points).  Falloff
/// calculation writes `factor`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Position used for distance queries
    pub pos: Vector3<f32>,

    /// Whether this point is part of the selection
    pub selected: bool,

    /// Island which this point belongs to, if any
    pub island: Option<IslandIndex>,

    /// Pivot used when transforming this point
    pub center: Vector3<f32>,

    /// Orientation used when transforming this point
    pub axis: Matrix3<f32>,

    /// Distance to the nearest selected point
    ///
    /// `None` means that no selected point is reachable, i.e. the falloff is
    /// undefined and the point is left unaffected.
    pub distance: Option<f32>,

    /// Influence factor, in the `0..=1` range
    pub factor: f32,
}

impl ControlPoint {
    /// Builds a new point at the given position
    ///
    /// The pivot defaults to the point's own position and the orientation to
    /// the identity matrix.
    pub fn new(pos: Vector3<f32>, selected: bool) -> Self {
        Self {
            pos,
            selected,
            island: None,
            center: pos,
            axis: Matrix3::identity(),
            distance: None,
            factor: 0.0,
        }
    }

    /// Builder-style helper to assign an island
    pub fn with_island(mut self, island: IslandIndex) -> Self {
        self.island = Some(island);
        self
    }
}

/// Stable partition which moves selected points to the front of the slice
///
/// Returns the number of selected points.
pub fn sort_selected_first(points: &mut [ControlPoint]) -> usize {
    points.sort_by_key(|p| !p.selected);
    points.iter().take_while(|p| p.selected).count()
}

/// Sorts the unselected tail of the slice by ascending distance
///
/// Selected points must already be at the front (see
/// [`sort_selected_first`]); they are left in place.  Points without a
/// distance are moved to the end.
pub fn sort_by_distance(points: &mut [ControlPoint]) {
    let start = points.iter().take_while(|p| p.selected).count();
    points[start..].sort_by_key(|p| match p.distance {
        Some(d) => (false, OrderedFloat(d)),
        None => (true, OrderedFloat(0.0)),
    });
}
