#![no_std]

//! Orientation estimation for a two-chip inertial/magnetic sensor
//! stack on a shared serial bus.
//!
//! The crate reads raw accelerometer, gyroscope, and magnetometer
//! bursts from the primary device of a two-chip stack, establishes
//! rest biases with a short static calibration window, and fuses every
//! sample into stabilized roll/pitch with a fixed-weight complementary
//! filter. An uncorrected gyro-integration track is carried alongside
//! the filtered angles to make bias drift observable, and a planar
//! compass heading is computed independently of the tilt filter.
//!
//! The physical bus transport, one-time device bring-up, and the
//! output sink stay outside the crate: the transport is injected
//! through [`BusTransport`], and [`Tracker`] composes the full
//! read-decode-fuse tick around it.
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use tilt_fusion::{CalibrationOffsets, Estimator, OrientationState, RawFrame};
//!
//! let estimator = Estimator::new();
//! let offsets = CalibrationOffsets::default();
//! let mut state = OrientationState::level_at(0);
//!
//! // One decoded burst: level device, gravity on the z axis, no
//! // rotation.
//! let frame = RawFrame {
//!     accel_z: 16_384,
//!     ..RawFrame::default()
//! };
//!
//! let estimate = estimator.tick(&frame, 10, &offsets, &state);
//! state = estimate.state;
//!
//! assert_eq!(state.filtered, Vector3::new(0.0, 0.0, 0.0));
//! ```

pub mod bus;
pub mod calibration;
pub mod compass;
pub mod estimator;
pub mod frame;
mod math;
pub mod tracker;

// Re-export all public types and functions
pub use bus::{BusError, BusTransport, SensorBus};
pub use calibration::{BiasAccumulator, CalibrationOffsets, CalibrationSettings};
pub use compass::magnetic_heading;
pub use estimator::{Estimate, Estimator, EstimatorSettings, OrientationState, tilt_angles};
pub use frame::{MagFrame, RawFrame};
pub use math::{DEG_TO_RAD, RAD_TO_DEG};
pub use tracker::{TickRecord, Tracker, TrackerConfig};
