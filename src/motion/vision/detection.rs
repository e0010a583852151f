//! Per-frame vision data and the camera boundary.
//!
//! Detections reach the localizer through [`DetectionSource`]. On the robot
//! that is a [`TagCamera`], which reads AprilTags off a V5 AI Vision sensor.
//!
//! # Example
//!
//! ```ignore
//! use boreas::motion::vision::detection::TagCamera;
//! use vexide::prelude::*;
//!
//! let camera = TagCamera::new(AiVisionSensor::new(peripherals.port_10));
//! localizer.spawn(camera, config.motion.vision_period());
//! ```

use heapless::Vec;
use log::{info, warn};
use vexide::smart::ai_vision::{AiVisionDetectionMode, AiVisionObject, AiVisionSensor};

/// Most markers a single camera frame can report.
pub const MAX_TAGS_PER_FRAME: usize = 8;

/// One camera frame worth of marker detections.
pub type Frame = Vec<TagDetection, MAX_TAGS_PER_FRAME>;

/// A marker as seen in the image.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TagDetection {
    /// Decoded marker id.
    pub id:             u32,
    /// Horizontal center of the marker in the image, in pixels.
    pub pixel_center_x: f64,
    /// Vertical center of the marker in the image, in pixels.
    pub pixel_center_y: f64,
    /// Width of the marker's bounding box, in pixels.
    pub pixel_width:    f64,
    /// Height of the marker's bounding box, in pixels.
    pub pixel_height:   f64,
    /// Rotation of the marker in the image, in radians.
    pub pixel_angle:    f64,
    /// Whether the detector trusts this entry.
    pub valid:          bool,
}

impl TagDetection {
    /// Creates a valid detection with a square bounding box.
    pub fn new(id: u32, pixel_center_x: f64, pixel_center_y: f64, pixel_size: f64) -> Self {
        Self {
            id,
            pixel_center_x,
            pixel_center_y,
            pixel_width: pixel_size,
            pixel_height: pixel_size,
            pixel_angle: 0.0,
            valid: true,
        }
    }

    /// Builds a detection from a marker's corner points.
    ///
    /// `corners` are image coordinates in the order top-left, top-right,
    /// bottom-right, bottom-left. The center and size come from their
    /// bounding box. The angle is that of the top edge, clockwise positive
    /// since image y points down.
    pub fn from_corners(id: u32, corners: [(f64, f64); 4]) -> Self {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        let [(tl_x, tl_y), (tr_x, tr_y), ..] = corners;

        Self {
            id,
            pixel_center_x: (min_x + max_x) / 2.0,
            pixel_center_y: (min_y + max_y) / 2.0,
            pixel_width: max_x - min_x,
            pixel_height: max_y - min_y,
            pixel_angle: (tr_y - tl_y).atan2(tr_x - tl_x),
            valid: true,
        }
    }

    /// The larger side of the bounding box.
    pub fn pixel_size(&self) -> f64 { self.pixel_width.max(self.pixel_height) }
}

/// A source of camera frames.
///
/// The marker detection pipeline lives outside this crate. It hands its
/// results to the localizer through this trait.
pub trait DetectionSource {
    /// Captures one frame and returns the markers found in it.
    fn snapshot(&mut self) -> Frame;
}

/// An AI Vision sensor reporting AprilTags.
///
/// Objects other than AprilTags are dropped, and a frame keeps at most
/// [`MAX_TAGS_PER_FRAME`] tags. A failed read gives an empty frame.
pub struct TagCamera {
    sensor:    AiVisionSensor,
    connected: bool,
}

impl TagCamera {
    /// Wraps `sensor` and switches it to AprilTag detection.
    pub fn new(mut sensor: AiVisionSensor) -> Self {
        if let Err(err) = sensor.set_detection_mode(AiVisionDetectionMode::APRILTAG) {
            warn!("Could not enable AprilTag detection: {:?}", err);
        }
        Self {
            sensor,
            connected: true,
        }
    }

    /// Whether the last snapshot could be read.
    pub fn is_connected(&self) -> bool { self.connected }
}

impl DetectionSource for TagCamera {
    fn snapshot(&mut self) -> Frame {
        let mut frame = Frame::new();
        let objects = match self.sensor.objects() {
            Ok(objects) => {
                if !self.connected {
                    info!("Vision sensor reconnected");
                    self.connected = true;
                }
                objects
            }
            Err(err) => {
                if self.connected {
                    warn!("Vision sensor unavailable: {:?}", err);
                    self.connected = false;
                }
                return frame;
            }
        };

        for object in objects {
            let AiVisionObject::AprilTag {
                id,
                top_left,
                top_right,
                bottom_right,
                bottom_left,
                ..
            } = object
            else {
                continue;
            };
            let corners = [top_left, top_right, bottom_right, bottom_left]
                .map(|corner| (f64::from(corner.x), f64::from(corner.y)));
            if frame.push(TagDetection::from_corners(u32::from(id), corners)).is_err() {
                break;
            }
        }
        frame
    }
}

/// The robot pose implied by the best marker in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisionEstimate {
    /// Estimated field x, in meters.
    pub x:          f64,
    /// Estimated field y, in meters.
    pub y:          f64,
    /// Heading the estimate was solved with, in radians.
    pub heading:    f64,
    /// Trust in the estimate, in `[0, 1]`.
    pub confidence: f64,
    /// `false` when no usable marker was seen.
    pub valid:      bool,
}

/// What happened to a vision estimate offered to odometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionOutcome {
    /// The pose was blended toward the estimate.
    Applied,
    /// The estimate was invalid or not confident enough.
    Skipped,
    /// The correction moved the pose too far and was treated as a misdetection.
    Rejected,
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_4;

    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn upright_tag_from_corners() {
        let tag = TagDetection::from_corners(
            3,
            [(100.0, 50.0), (140.0, 50.0), (140.0, 90.0), (100.0, 90.0)],
        );
        assert_eq!(tag.id, 3);
        assert!(tag.valid);
        assert_eq!((tag.pixel_center_x, tag.pixel_center_y), (120.0, 70.0));
        assert_eq!((tag.pixel_width, tag.pixel_height), (40.0, 40.0));
        assert_eq!(tag.pixel_angle, 0.0);
        assert_eq!(tag.pixel_size(), 40.0);
    }

    #[test]
    fn rotated_tag_uses_bounding_box() {
        // A 20 px square turned 45 degrees about (160, 120).
        let h = 10.0 * std::f64::consts::SQRT_2;
        let tag = TagDetection::from_corners(
            1,
            [(160.0, 120.0 - h), (160.0 + h, 120.0), (160.0, 120.0 + h), (160.0 - h, 120.0)],
        );
        assert_abs_diff_eq!(tag.pixel_center_x, 160.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tag.pixel_center_y, 120.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tag.pixel_width, 2.0 * h, epsilon = 1e-9);
        assert_abs_diff_eq!(tag.pixel_angle, FRAC_PI_4, epsilon = 1e-9);
    }
}
