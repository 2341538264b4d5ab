//! `propedit` computes proportional-editing falloff for sets of points.
//!
//! In **proportional editing**, a transform applied to a selection also
//! nudges nearby unselected elements, scaled by how close they are to the
//! selection.  This takes two steps:
//!
//! - **Distance propagation** finds, for every unselected point, the distance
//!   to its nearest selected point.  This is either a straight-line distance
//!   (answered by a [`KdTree`](crate::kdtree::KdTree) built over the
//!   selection, optionally flattened along the view axis) or a
//!   **connectivity distance** measured along the edges and faces of a mesh.
//! - **Falloff** maps each distance to an influence factor in `0..=1`, using
//!   one of several [curves](crate::falloff::Falloff) and a radius.
//!
//! ```
//! use propedit::{ControlPoint, compute_proportional_distances};
//! use nalgebra::Vector3;
//!
//! let mut points = vec![
//!     ControlPoint::new(Vector3::new(0.0, 0.0, 0.0), true),
//!     ControlPoint::new(Vector3::new(1.0, 0.0, 0.0), false),
//!     ControlPoint::new(Vector3::new(0.0, 2.0, 0.0), false),
//! ];
//! compute_proportional_distances(&mut points, None);
//! assert_eq!(points[1].distance, Some(1.0));
//! assert_eq!(points[2].distance, Some(2.0));
//! ```
//!
//! For more control (object-space transforms, connectivity, threads, and
//! islands), use a [`PropagateConfig`]:
//!
//! ```
//! use propedit::{
//!     ControlPoint, DistanceMode, FalloffConfig, PropagateConfig,
//!     falloff::{Falloff, PropSize},
//!     topology::Topology,
//! };
//! use nalgebra::Vector3;
//!
//! let mut points: Vec<ControlPoint> = (0..4)
//!     .map(|i| ControlPoint::new(Vector3::new(i as f32, 0.0, 0.0), i == 0))
//!     .collect();
//! let topology = Topology::from_edges([[0, 1], [1, 2], [2, 3]]);
//! PropagateConfig::default().run(
//!     &mut points,
//!     &DistanceMode::Connected { topology: &topology },
//!     None,
//! )?;
//!
//! let falloff = FalloffConfig {
//!     falloff: Falloff::Linear,
//!     size: PropSize::new(2.0)?,
//! };
//! falloff.run(&mut points, &mut rand::thread_rng());
//! assert_eq!(points[1].factor, 0.5);
//! assert_eq!(points[3].factor, 0.0);
//! # Ok::<(), propedit::Error>(())
//! ```
//!
//! # Islands
//! When transforming around local origins, groups of connected selected
//! points move as rigid [islands](crate::island::Islands), each with its own
//! pivot and orientation.  Passing an island arena to
//! [`PropagateConfig::run`] makes each unselected point inherit the pivot of
//! its nearest selected point's island.
#![warn(missing_docs)]

pub mod cloud;
pub mod config;
pub mod connected;
pub mod falloff;
pub mod island;
pub mod kdtree;
pub mod point;
pub mod propagate;
pub mod topology;

mod error;
pub use error::{Error, Result};

#[doc(inline)]
pub use config::{FalloffConfig, PropagateConfig, ThreadCount};

#[doc(inline)]
pub use point::ControlPoint;

#[doc(inline)]
pub use propagate::{DistanceMode, ProjectionAxis, compute_proportional_distances};
