//! Fiducial marker localization.
//!
//! Odometry drifts. Markers mounted at known positions around the field give
//! an absolute reference to pull the estimate back with.
//!
//! # Module Structure
//!
//! - **[`field`]**: The static marker map.
//! - **[`detection`]**: Per-frame detections, the camera boundary and the
//!   resulting estimate.
//! - **[`localizer`]**: Geometry, scoring and the bounded correction.
//!
//! The image pipeline that finds markers is not part of this crate; it feeds
//! frames in through [`DetectionSource`](detection::DetectionSource).

/// Per-frame vision data.
pub mod detection;

/// Known marker placements.
pub mod field;

/// The marker localizer.
pub mod localizer;
