//! Falloff curves and influence factors
use crate::{
    config::FalloffConfig,
    error::{Error, Result},
    point::ControlPoint,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Shape of the curve mapping distance to influence
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Falloff {
    /// `3t² - 2t³`
    #[default]
    Smooth,
    /// `sqrt(2t - t²)`
    Sphere,
    /// `sqrt(t)`
    Root,
    /// `t (2 - t)`
    InverseSquare,
    /// `t²`
    Sharp,
    /// `t`
    Linear,
    /// Full influence everywhere within range
    Constant,
    /// Random fraction of `t`
    Random,
}

impl Falloff {
    /// Evaluates the curve
    ///
    /// `t` is the normalized closeness, i.e. `1` at the selection and `0` at
    /// the edge of the influence radius.  `rng` is only used by
    /// [`Falloff::Random`].
    pub fn weight<R: Rng + ?Sized>(self, t: f32, rng: &mut R) -> f32 {
        match self {
            Falloff::Smooth => 3.0 * t * t - 2.0 * t * t * t,
            Falloff::Sphere => (2.0 * t - t * t).sqrt(),
            Falloff::Root => t.sqrt(),
            Falloff::InverseSquare => t * (2.0 - t),
            Falloff::Sharp => t * t,
            Falloff::Linear => t,
            Falloff::Constant => 1.0,
            Falloff::Random => rng.r#gen::<f32>() * t,
        }
    }
}

/// Radius of proportional influence
///
/// Always finite and within `PropSize::MIN..=PropSize::MAX`.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PropSize(f32);

impl Default for PropSize {
    fn default() -> Self {
        Self(1.0)
    }
}

impl PropSize {
    /// Smallest allowed radius
    pub const MIN: f32 = 1e-6;
    /// Largest allowed radius
    pub const MAX: f32 = 1e12;

    /// Builds a radius, clamping it into the allowed range
    pub fn new(size: f32) -> Result<Self> {
        if size.is_finite() && size > 0.0 {
            Ok(Self(size.clamp(Self::MIN, Self::MAX)))
        } else {
            Err(Error::BadPropSize(size))
        }
    }

    /// Returns the radius
    pub fn get(self) -> f32 {
        self.0
    }

    /// Grows the radius by one step (10%, or 1% in precision mode)
    pub fn grow(&mut self, precision: bool) {
        self.0 = (self.0 * Self::step(precision)).min(Self::MAX);
    }

    /// Shrinks the radius by one step (10%, or 1% in precision mode)
    pub fn shrink(&mut self, precision: bool) {
        self.0 = (self.0 / Self::step(precision)).max(Self::MIN);
    }

    /// Limits the radius to `far`, e.g. the far clip plane of a perspective
    /// view
    pub fn clamp_to(&mut self, far: f32) {
        if far.is_finite() {
            self.0 = self.0.min(far).max(Self::MIN);
        }
    }

    fn step(precision: bool) -> f32 {
        if precision { 1.01 } else { 1.1 }
    }
}

/// Writes an influence factor into every point
///
/// Selected points get full influence.  Unselected points without a distance,
/// or farther than the radius, get none; the rest are weighted by the
/// falloff curve.
pub fn calculate_factors<R: Rng + ?Sized>(
    points: &mut [ControlPoint],
    cfg: &FalloffConfig,
    rng: &mut R,
) {
    let size = cfg.size.get();
    for p in points.iter_mut() {
        p.factor = if p.selected {
            1.0
        } else {
            match p.distance {
                Some(d) if d <= size => {
                    let t = (size - d) / size;
                    cfg.falloff.weight(t, rng)
                }
                _ => 0.0,
            }
        };
    }
}
