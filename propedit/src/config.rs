//! Configuration structs for propagation and falloff
use crate::{
    error::Result,
    falloff::{Falloff, PropSize},
    island::Islands,
    point::ControlPoint,
    propagate::DistanceMode,
};
use nalgebra::Matrix3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Where spatial nearest-neighbor queries run
///
/// Building the tree and writing results always happen on the calling
/// thread; only the read-only queries are spread out.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadCount {
    /// Query from the calling thread
    #[default]
    One,

    /// Query from a rayon pool of this many workers, built for each run
    Many(NonZeroUsize),
}

/// A count of one maps to [`ThreadCount::One`]
impl From<NonZeroUsize> for ThreadCount {
    fn from(v: NonZeroUsize) -> Self {
        if v.get() == 1 {
            ThreadCount::One
        } else {
            ThreadCount::Many(v)
        }
    }
}

impl std::fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadCount::One => write!(f, "1"),
            ThreadCount::Many(n) => write!(f, "{n}"),
        }
    }
}

/// Settings for distance propagation
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct PropagateConfig {
    /// Linear transform applied to positions before measuring distances
    ///
    /// This is typically the upper-left 3x3 block of the object-to-world
    /// matrix, so that falloff is uniform in world space.
    pub space: Matrix3<f32>,

    /// Number of worker threads for spatial queries
    pub threads: ThreadCount,
}

impl Default for PropagateConfig {
    fn default() -> Self {
        Self {
            space: Matrix3::identity(),
            threads: ThreadCount::default(),
        }
    }
}

impl PropagateConfig {
    /// Computes distances for a set of points using this configuration
    ///
    /// If `islands` is provided, unselected points also inherit the pivot
    /// and orientation of their nearest selected point's island.
    pub fn run(
        &self,
        points: &mut [ControlPoint],
        mode: &DistanceMode<'_>,
        islands: Option<&Islands>,
    ) -> Result<()> {
        crate::propagate::propagate(points, mode, islands, self)
    }
}

/// Settings for turning distances into influence factors
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct FalloffConfig {
    /// Falloff curve
    pub falloff: Falloff,

    /// Radius of influence
    pub size: PropSize,
}

impl FalloffConfig {
    /// Writes an influence factor into every point
    pub fn run<R: Rng + ?Sized>(&self, points: &mut [ControlPoint], rng: &mut R) {
        crate::falloff::calculate_factors(points, self, rng)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn thread_count_from_nonzero() {
        let one = NonZeroUsize::new(1).unwrap();
        let four = NonZeroUsize::new(4).unwrap();
        assert_eq!(ThreadCount::from(one), ThreadCount::One);
        assert_eq!(ThreadCount::from(four), ThreadCount::Many(four));
        assert_eq!(ThreadCount::One.to_string(), "1");
        assert_eq!(ThreadCount::from(four).to_string(), "4");
    }
}
