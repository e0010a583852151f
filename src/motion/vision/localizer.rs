//! Absolute localization from field markers.
//!
//! For every marker in a frame the localizer estimates range from its apparent
//! size (pinhole model) and bearing from its horizontal offset in the image.
//! Walking back from the marker's known field position along that bearing,
//! then removing the camera's mounting offset, gives a robot position. Each
//! candidate is scored, and the best one in the frame is the frame's
//! [`VisionEstimate`].
//!
//! Estimates are blended into odometry with a small, confidence-scaled weight
//! (a complementary filter). Heading is never corrected from vision.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use boreas::motion::vision::localizer::VisionLocalizer;
//!
//! let localizer = Rc::new(VisionLocalizer::new(config.field, config.vision, odom.clone()));
//! localizer.spawn(camera, config.motion.vision_period());  // 20 Hz
//! ```

use std::{
    rc::Rc,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use log::{debug, info, trace, warn};
use vexide::{task::spawn, time::sleep};

use super::{
    detection::{CorrectionOutcome, DetectionSource, TagDetection, VisionEstimate},
    field::{FieldMap, FieldTag},
};
use crate::{
    config::VisionConfig,
    motion::odom::{devices::Pose, tracker::Odometry},
};

/// Turns marker detections into pose corrections for an [`Odometry`].
pub struct VisionLocalizer {
    field:     FieldMap,
    config:    VisionConfig,
    odom:      Rc<Odometry>,
    latest:    Mutex<VisionEstimate>,
    tag_count: AtomicUsize,
}

impl VisionLocalizer {
    /// Creates a localizer for the given field.
    pub fn new(field: FieldMap, config: VisionConfig, odom: Rc<Odometry>) -> Self {
        info!("Vision localizer initialized with {} field tags", field.tags().len());
        Self {
            field,
            config,
            odom,
            latest: Mutex::new(VisionEstimate::default()),
            tag_count: AtomicUsize::new(0),
        }
    }

    /// Starts the background localization loop.
    ///
    /// Every `period` a frame is taken from `source`, turned into an estimate
    /// and offered to odometry as a correction.
    pub fn spawn(self: &Rc<Self>, mut source: impl DetectionSource + 'static, period: Duration) {
        let localizer = self.clone();
        spawn(async move {
            info!("Vision loop started ({:?} period)", period);
            loop {
                let frame = source.snapshot();
                let estimate = localizer.update(&frame);
                localizer.correct_odometry(&estimate);
                sleep(period).await;
            }
        })
        .detach();
    }

    /// Processes one frame and returns its best estimate.
    ///
    /// The heading used for the geometry is the current odometry heading. An
    /// estimate with `valid == false` means no marker in the frame was usable.
    pub fn update(&self, frame: &[TagDetection]) -> VisionEstimate {
        self.tag_count.store(frame.len(), Ordering::Relaxed);
        let pose = self.odom.pose();

        let mut best = VisionEstimate::default();
        for tag in frame.iter().filter(|tag| tag.valid) {
            let Some(placement) = self.field.get(tag.id) else {
                debug!("Vision: unknown tag id {}, skipped", tag.id);
                continue;
            };
            let Some(candidate) = self.solve(tag, placement, &pose) else {
                continue;
            };
            if candidate.confidence > best.confidence {
                best = candidate;
            }
        }

        if best.valid {
            debug!(
                "Vision estimate ({:.3}, {:.3}) confidence {:.2}",
                best.x, best.y, best.confidence
            );
        }
        *self.latest_guard() = best;
        best
    }

    /// Blends an estimate into the odometry pose.
    ///
    /// # Returns
    ///
    /// - [`CorrectionOutcome::Skipped`] if the estimate is invalid or below
    ///   the minimum confidence.
    /// - [`CorrectionOutcome::Rejected`] if the blended pose would move at
    ///   least `max_correction` meters. The pose is left unchanged.
    /// - [`CorrectionOutcome::Applied`] otherwise.
    pub fn correct_odometry(&self, estimate: &VisionEstimate) -> CorrectionOutcome {
        if !estimate.valid || estimate.confidence < self.config.min_confidence {
            return CorrectionOutcome::Skipped;
        }
        let alpha = correction_alpha(estimate.confidence, &self.config);

        self.odom.with_pose(|pose| {
            let dx = alpha * (estimate.x - pose.x);
            let dy = alpha * (estimate.y - pose.y);
            let magnitude = dx.hypot(dy);

            if magnitude >= self.config.max_correction {
                warn!(
                    "Vision correction rejected: {:.3} m >= max {:.3} m",
                    magnitude, self.config.max_correction
                );
                return CorrectionOutcome::Rejected;
            }
            pose.x += dx;
            pose.y += dy;
            debug!("Vision correction applied: dx={:.4} dy={:.4} alpha={:.3}", dx, dy, alpha);
            CorrectionOutcome::Applied
        })
    }

    /// The estimate from the most recent frame.
    pub fn latest(&self) -> VisionEstimate { *self.latest_guard() }

    /// How many detections the most recent frame contained.
    pub fn tag_count(&self) -> usize { self.tag_count.load(Ordering::Relaxed) }

    fn latest_guard(&self) -> MutexGuard<'_, VisionEstimate> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Back-solves the robot position from one marker.
    fn solve(&self, tag: &TagDetection, placement: &FieldTag, pose: &Pose) -> Option<VisionEstimate> {
        let cfg = &self.config;
        let pixel_size = tag.pixel_size();
        if pixel_size < cfg.min_tag_pixels {
            trace!("Vision: tag {} too small ({:.1} px)", tag.id, pixel_size);
            return None;
        }
        let distance = cfg.tag_size * cfg.focal_length_px / pixel_size;

        let confidence = confidence(distance, pixel_size, cfg);
        if confidence <= 0.0 {
            trace!("Vision: tag {} out of range ({:.2} m)", tag.id, distance);
            return None;
        }

        // Left of center is a counter-clockwise bearing.
        let offset = cfg.image_width_px / 2.0 - tag.pixel_center_x;
        let bearing = pose.theta + cfg.camera_angle + (offset / cfg.focal_length_px).atan();

        let (sin_h, cos_h) = pose.theta.sin_cos();
        let x = placement.x - distance * bearing.cos() - cfg.camera_offset_x * cos_h +
            cfg.camera_offset_y * sin_h;
        let y = placement.y - distance * bearing.sin() - cfg.camera_offset_x * sin_h -
            cfg.camera_offset_y * cos_h;

        Some(VisionEstimate {
            x,
            y,
            heading: pose.theta,
            confidence,
            valid: true,
        })
    }
}

/// Scores a candidate from its range and apparent size.
///
/// Zero beyond `max_range`. Falls off linearly with distance and grows with
/// pixel size up to `size_saturation_px`.
fn confidence(distance: f64, pixel_size: f64, cfg: &VisionConfig) -> f64 {
    if distance <= 0.0 || distance > cfg.max_range {
        return 0.0;
    }
    let distance_factor = (1.0 - distance / cfg.max_range).max(0.0);
    let size_factor = (pixel_size / cfg.size_saturation_px).min(1.0);
    distance_factor * size_factor
}

/// Blend factor for an estimate of the given confidence.
fn correction_alpha(confidence: f64, cfg: &VisionConfig) -> f64 {
    (cfg.base_alpha * confidence).min(cfg.max_alpha)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        config::OdomConfig,
        motion::odom::devices::{TrackingWheel, YawSensor},
    };

    struct Still;

    impl TrackingWheel for Still {
        fn distance(&self) -> Option<f64> { Some(0.0) }
    }

    impl YawSensor for Still {
        fn cumulative_rotation(&self) -> Option<f64> { Some(0.0) }
    }

    fn config() -> VisionConfig {
        VisionConfig {
            camera_offset_x: 0.0,
            camera_offset_y: 0.0,
            ..VisionConfig::default()
        }
    }

    fn localizer(config: VisionConfig, start: Pose) -> VisionLocalizer {
        let odom = Rc::new(Odometry::new(Still, Still, Still, OdomConfig::default()));
        odom.set_pose(start);
        VisionLocalizer::new(FieldMap::default(), config, odom)
    }

    fn estimate(x: f64, y: f64, confidence: f64) -> VisionEstimate {
        VisionEstimate {
            x,
            y,
            heading: 0.0,
            confidence,
            valid: true,
        }
    }

    #[test]
    fn alpha_scales_with_confidence() {
        assert_abs_diff_eq!(correction_alpha(0.5, &VisionConfig::default()), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(correction_alpha(1.0, &VisionConfig::default()), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn small_correction_is_applied() {
        let vision = localizer(config(), Pose::new(1.0, 1.0, 0.3));
        // alpha 0.2 over a 0.25 m disagreement moves the pose 0.05 m.
        let outcome = vision.correct_odometry(&estimate(1.25, 1.0, 0.5));
        assert_eq!(outcome, CorrectionOutcome::Applied);
        let pose = vision.odom.pose();
        assert_abs_diff_eq!(pose.x, 1.05, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.y, 1.0, epsilon = 1e-9);
        assert_eq!(pose.theta, 0.3);
    }

    #[test]
    fn large_correction_is_rejected() {
        let start = Pose::new(1.0, 1.0, 0.0);
        let vision = localizer(config(), start);
        // alpha 0.2 over a 2.5 m disagreement would move the pose 0.5 m.
        let outcome = vision.correct_odometry(&estimate(3.5, 1.0, 0.5));
        assert_eq!(outcome, CorrectionOutcome::Rejected);
        assert_eq!(vision.odom.pose(), start);
    }

    #[test]
    fn low_confidence_is_skipped() {
        let start = Pose::new(1.0, 1.0, 0.0);
        let vision = localizer(config(), start);
        assert_eq!(
            vision.correct_odometry(&estimate(1.1, 1.0, 0.05)),
            CorrectionOutcome::Skipped
        );
        assert_eq!(
            vision.correct_odometry(&VisionEstimate::default()),
            CorrectionOutcome::Skipped
        );
        assert_eq!(vision.odom.pose(), start);
    }

    #[test]
    fn centered_tag_solves_position() {
        // Facing tag 2 on the +x wall from 1.5 m away.
        let cfg = config();
        let vision = localizer(cfg, Pose::new(2.0, 1.22, 0.0));
        let pixels = cfg.tag_size * cfg.focal_length_px / 1.5;
        let frame = [TagDetection::new(2, cfg.image_width_px / 2.0, 120.0, pixels)];

        let best = vision.update(&frame);
        assert!(best.valid);
        assert_abs_diff_eq!(best.x, 3.6576 - 1.5, epsilon = 1e-9);
        assert_abs_diff_eq!(best.y, 1.22, epsilon = 1e-9);
        assert_eq!(vision.tag_count(), 1);
        assert_eq!(vision.latest(), best);
    }

    #[test]
    fn camera_offset_is_removed() {
        let cfg = VisionConfig {
            camera_offset_x: 0.15,
            ..config()
        };
        // Facing +y toward tag 7, camera 0.15 m ahead of the center.
        let vision = localizer(cfg, Pose::new(0.91, 2.0, FRAC_PI_2));
        let pixels = cfg.tag_size * cfg.focal_length_px / 1.0;
        let frame = [TagDetection::new(7, cfg.image_width_px / 2.0, 120.0, pixels)];

        let best = vision.update(&frame);
        assert_abs_diff_eq!(best.x, 0.91, epsilon = 1e-9);
        assert_abs_diff_eq!(best.y, 3.6576 - 1.0 - 0.15, epsilon = 1e-9);
    }

    #[test]
    fn tag_left_of_center_has_positive_bearing() {
        let cfg = config();
        let vision = localizer(cfg, Pose::origin());
        let pixels = cfg.tag_size * cfg.focal_length_px / 1.0;
        let offset = cfg.focal_length_px; // 45 degrees
        let frame = [TagDetection::new(2, cfg.image_width_px / 2.0 - offset, 120.0, pixels)];

        let best = vision.update(&frame);
        let half = std::f64::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!(best.x, 3.6576 - half, epsilon = 1e-9);
        assert_abs_diff_eq!(best.y, 1.22 - half, epsilon = 1e-9);
    }

    #[test]
    fn unknown_and_invalid_tags_are_ignored() {
        let vision = localizer(config(), Pose::origin());
        let mut invalid = TagDetection::new(1, 160.0, 120.0, 80.0);
        invalid.valid = false;
        let frame = [TagDetection::new(42, 160.0, 120.0, 80.0), invalid];
        let best = vision.update(&frame);
        assert!(!best.valid);
        assert_eq!(vision.tag_count(), 2);
    }

    #[test]
    fn too_small_tag_is_skipped() {
        let vision = localizer(config(), Pose::origin());
        let best = vision.update(&[TagDetection::new(1, 160.0, 120.0, 9.0)]);
        assert!(!best.valid);
    }

    #[test]
    fn out_of_range_tag_is_discarded() {
        let cfg = VisionConfig {
            max_range: 1.0,
            ..config()
        };
        let vision = localizer(cfg, Pose::origin());
        // 1.5 m is past max_range but still above min_tag_pixels.
        let pixels = cfg.tag_size * cfg.focal_length_px / 1.5;
        assert!(pixels >= cfg.min_tag_pixels);
        let best = vision.update(&[TagDetection::new(1, 160.0, 120.0, pixels)]);
        assert!(!best.valid);
    }

    #[test]
    fn closest_tag_wins() {
        let cfg = config();
        let vision = localizer(cfg, Pose::new(2.0, 1.22, 0.0));
        let near = cfg.tag_size * cfg.focal_length_px / 1.0;
        let far = cfg.tag_size * cfg.focal_length_px / 2.0;
        let frame = [
            TagDetection::new(2, 160.0, 120.0, far),
            TagDetection::new(4, 160.0, 120.0, near),
        ];
        let best = vision.update(&frame);
        // Tag 4 sits at y = 2.44, so only its solution lands there.
        assert_abs_diff_eq!(best.y, 2.44, epsilon = 1e-9);
        assert_abs_diff_eq!(best.confidence, confidence(1.0, near, &cfg), epsilon = 1e-12);
    }

    #[test]
    fn confidence_model() {
        let cfg = VisionConfig::default();
        assert_eq!(confidence(3.1, 50.0, &cfg), 0.0);
        assert_abs_diff_eq!(confidence(1.5, 50.0, &cfg), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(confidence(1.5, 400.0, &cfg), 0.5, epsilon = 1e-12);
    }
}
