use std::{f64::consts::FRAC_PI_2, rc::Rc};

use boreas::{
    config::NavConfig,
    drivetrain::Differential,
    fs::logger,
    motion::{
        Pose,
        chassis::{BrainClock, Chassis},
        command::MotionOutcome,
        odom::{
            devices::{Tracker, TrackingSensor},
            tracker::Odometry,
        },
        vision::{detection::TagCamera, localizer::VisionLocalizer},
    },
};
use log::{LevelFilter, info, warn};
use vexide::prelude::*;

const CONFIG_FILE: &str = "nav_config.json";

struct Robot {
    chassis: Chassis<Differential, BrainClock>,
    vision:  Rc<VisionLocalizer>,
}

impl Robot {
    async fn new(peripherals: Peripherals) -> Self {
        let config = NavConfig::load_or_default(CONFIG_FILE);

        let drivetrain = Differential::new(
            [
                Motor::new(peripherals.port_1, Gearset::Blue, Direction::Reverse),
                Motor::new(peripherals.port_2, Gearset::Blue, Direction::Reverse),
                Motor::new(peripherals.port_3, Gearset::Blue, Direction::Reverse),
            ],
            [
                Motor::new(peripherals.port_4, Gearset::Blue, Direction::Forward),
                Motor::new(peripherals.port_5, Gearset::Blue, Direction::Forward),
                Motor::new(peripherals.port_6, Gearset::Blue, Direction::Forward),
            ],
        );

        let forward = Tracker::new(
            TrackingSensor::RotationSensor(RotationSensor::new(
                peripherals.port_7,
                Direction::Forward,
            )),
            config.odom.wheel_diameter,
            1.0,
            1.0,
        );
        let lateral = Tracker::new(
            TrackingSensor::RotationSensor(RotationSensor::new(
                peripherals.port_8,
                Direction::Reverse,
            )),
            config.odom.wheel_diameter,
            1.0,
            1.0,
        );

        let mut imu = InertialSensor::new(peripherals.port_9);
        if let Err(err) = imu.calibrate().await {
            warn!("IMU calibration failed: {:?}", err);
        }

        let odom = Rc::new(Odometry::new(forward, lateral, imu, config.odom));
        odom.spawn(config.motion.odom_period());

        let vision = Rc::new(VisionLocalizer::new(config.field, config.vision, odom.clone()));
        let camera = TagCamera::new(AiVisionSensor::new(peripherals.port_10));
        vision.spawn(camera, config.motion.vision_period());

        Self {
            chassis: Chassis::new(drivetrain, odom, BrainClock, config.motion),
            vision,
        }
    }
}

impl Compete for Robot {
    async fn autonomous(&mut self) {
        // Starting tile, facing the far wall.
        self.chassis.odom().set_pose(Pose::new(0.6, 0.6, 0.0));

        if self.chassis.drive_to_pose(Pose::new(1.5, 1.2, FRAC_PI_2), false).await
            == MotionOutcome::TimedOut
        {
            warn!("Approach timed out, skipping the rest of the routine");
            return;
        }
        self.chassis.turn_to_heading(0.0).await;
        self.chassis.drive_to_pose(Pose::new(0.9, 1.2, 0.0), true).await;

        let estimate = self.vision.latest();
        info!(
            "Auton done at {:?}, {} tags in view (confidence {:.2})",
            self.chassis.odom().pose(),
            self.vision.tag_count(),
            estimate.confidence
        );
    }

    async fn driver(&mut self) {}
}

#[vexide::main]
async fn main(peripherals: Peripherals) {
    if let Err(err) = logger::init(LevelFilter::Debug) {
        println!("Logger init failed: {}", err);
    }

    let robot = Robot::new(peripherals).await;

    robot.compete().await;
}
