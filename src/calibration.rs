//! Startup bias capture for the inertial sensor.
//!
//! Calibration takes a short static sample window right after power-on
//! and averages it into per-axis rest biases. The window must be
//! captured with the device stationary on a level surface; that is a
//! physical precondition nothing in software can verify.

use nalgebra::Vector3;

use crate::frame::RawFrame;

/// Number of samples averaged into the bias estimate.
pub const CALIBRATION_SAMPLES: u32 = 10;

/// Spacing between calibration samples in milliseconds.
pub const CALIBRATION_INTERVAL_MS: u32 = 100;

/// Calibration window configuration.
///
/// The defaults reproduce the fixed capture procedure: ten samples at
/// 100 ms spacing, preceded by one discarded warm-up read.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct CalibrationSettings {
    pub sample_count: u32,
    pub sample_interval_ms: u32,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            sample_count: CALIBRATION_SAMPLES,
            sample_interval_ms: CALIBRATION_INTERVAL_MS,
        }
    }
}

/// Per-axis rest biases, captured once at startup and immutable for the
/// rest of the process.
///
/// `gyro` is subtracted from every subsequent gyroscope reading. `accel`
/// is recorded but never applied: the tilt-angle formulas consume the
/// raw accelerometer counts, reproducing the original estimator's
/// behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOffsets {
    pub accel: Vector3<f32>,
    pub gyro: Vector3<f32>,
}

impl Default for CalibrationOffsets {
    fn default() -> Self {
        Self {
            accel: Vector3::zeros(),
            gyro: Vector3::zeros(),
        }
    }
}

/// Incremental arithmetic mean over a static sample window.
#[derive(Debug, Clone, Copy)]
pub struct BiasAccumulator {
    accel_sum: Vector3<f32>,
    gyro_sum: Vector3<f32>,
    count: u32,
}

impl BiasAccumulator {
    pub fn new() -> Self {
        Self {
            accel_sum: Vector3::zeros(),
            gyro_sum: Vector3::zeros(),
            count: 0,
        }
    }

    /// Folds one frame into the window.
    pub fn record(&mut self, frame: &RawFrame) {
        self.accel_sum += frame.accel();
        self.gyro_sum += frame.gyro();
        self.count += 1;
    }

    /// Samples recorded so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Mean of the recorded window; all-zero offsets when the window is
    /// empty.
    pub fn finish(&self) -> CalibrationOffsets {
        if self.count == 0 {
            return CalibrationOffsets::default();
        }
        let n = self.count as f32;
        CalibrationOffsets {
            accel: self.accel_sum / n,
            gyro: self.gyro_sum / n,
        }
    }
}

impl Default for BiasAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
