use super::devices::Pose;
use crate::config::OdomConfig;

/// Sensor travel accumulated over one odometry tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct OdomDelta {
    pub forward:  f64,
    pub lateral:  f64,
    pub rotation: f64,
}

/// Integrates one tick of sensor travel into a field-frame pose.
///
/// Off-center wheels trace an arc while the robot rotates, so their share of
/// the rotation is removed before the local displacement is rotated into the
/// field frame at the midpoint heading of the tick. Heading comes from the
/// IMU delta alone.
pub(crate) fn integrate(pose: Pose, delta: OdomDelta, geometry: &OdomConfig) -> Pose {
    let forward = delta.forward - geometry.forward_wheel_offset * delta.rotation;
    let lateral = delta.lateral - geometry.lateral_wheel_offset * delta.rotation;

    let mid = pose.theta + delta.rotation / 2.0;
    let (dx, dy) = rotate_vec(forward, lateral, mid);

    Pose::new(pose.x + dx, pose.y + dy, pose.theta + delta.rotation)
}

fn rotate_vec(x: f64, y: f64, t: f64) -> (f64, f64) {
    let (sin, cos) = t.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}
