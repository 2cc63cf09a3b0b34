//! Complementary-filter orientation estimation.
//!
//! Two angle tracks are carried side by side. The filtered track blends
//! gyro integration with accelerometer-derived tilt every tick: the
//! gyro term is responsive but drifts, the accelerometer term is noisy
//! under motion but bias-free at rest, and the fixed blend weight trades
//! one against the other. The unfiltered track integrates the gyro
//! alone and exists to make that drift observable.
//!
//! The two tracks use different integration bases on purpose: the x/y
//! gyro terms of the filtered track integrate on the previous
//! *filtered* angle, while the drift track integrates on the previous
//! *unfiltered* angle.

use nalgebra::{ComplexField, Vector3};

use crate::calibration::CalibrationOffsets;
use crate::frame::RawFrame;
use crate::math::RAD_TO_DEG;

/// Complementary blend weight applied to the gyro-integrated angle.
pub const FILTER_GAIN: f32 = 0.96;

/// Gyroscope counts per degree/second at the configured full-scale
/// range.
pub const GYRO_SENSITIVITY: f32 = 131.0;

/// Fusion configuration.
///
/// The defaults reproduce the original estimator exactly; both knobs
/// exist so tests and unusual sensor ranges can override them.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct EstimatorSettings {
    /// Blend weight toward the gyro term; the accelerometer term
    /// receives the complement.
    pub gain: f32,
    /// Divisor converting raw gyro counts to degrees/second.
    pub gyroscope_sensitivity: f32,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            gain: FILTER_GAIN,
            gyroscope_sensitivity: GYRO_SENSITIVITY,
        }
    }
}

/// Fusion output after the most recent tick.
///
/// A single-slot rolling state: the control loop passes the previous
/// value into [`Estimator::tick`] and overwrites its slot with the
/// returned one. No history is retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationState {
    /// Millisecond timestamp of the tick that produced this state.
    pub timestamp_ms: u32,
    /// Blended roll/pitch (x, y) plus the pure-gyro yaw channel (z),
    /// in degrees.
    pub filtered: Vector3<f32>,
    /// Gyro integration alone on all three axes, in degrees.
    /// Accumulates bias error without bound; kept as a drift reference.
    pub unfiltered: Vector3<f32>,
}

impl OrientationState {
    /// All-zero angles at a captured start timestamp.
    pub fn level_at(timestamp_ms: u32) -> Self {
        Self {
            timestamp_ms,
            filtered: Vector3::zeros(),
            unfiltered: Vector3::zeros(),
        }
    }
}

/// One tick's outputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// The new rolling state; replaces the previous one wholesale.
    pub state: OrientationState,
    /// Tilt angles derived from the accelerometer alone, in degrees.
    pub accel_angles: Vector3<f32>,
    /// Elapsed time since the previous tick, in seconds.
    pub delta_seconds: f32,
}

/// The fusion core. Holds configuration only; all per-tick state is
/// threaded through [`Estimator::tick`] explicitly.
#[derive(Debug, Clone, Copy)]
pub struct Estimator {
    settings: EstimatorSettings,
}

impl Estimator {
    pub fn new() -> Self {
        Self::with_settings(EstimatorSettings::default())
    }

    pub fn with_settings(settings: EstimatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> EstimatorSettings {
        self.settings
    }

    /// Fuses one decoded frame into a new orientation estimate.
    ///
    /// Consumes the previous state for integration and returns the
    /// replacement; the caller owns the slot.
    pub fn tick(
        &self,
        frame: &RawFrame,
        now_ms: u32,
        offsets: &CalibrationOffsets,
        previous: &OrientationState,
    ) -> Estimate {
        let rate = (frame.gyro() - offsets.gyro) / self.settings.gyroscope_sensitivity;
        let accel_angles = tilt_angles(frame.accel());
        let dt = now_ms.wrapping_sub(previous.timestamp_ms) as f32 / 1000.0;

        // The filtered track integrates on its own previous angles; the
        // drift track integrates on its own history.
        let gyro_angle_x = rate.x * dt + previous.filtered.x;
        let gyro_angle_y = rate.y * dt + previous.filtered.y;
        let gyro_angle_z = rate.z * dt + previous.filtered.z;
        let unfiltered = rate * dt + previous.unfiltered;

        let alpha = self.settings.gain;
        let filtered = Vector3::new(
            alpha * gyro_angle_x + (1.0 - alpha) * accel_angles.x,
            alpha * gyro_angle_y + (1.0 - alpha) * accel_angles.y,
            // No accelerometer reference exists for z; the filtered yaw
            // channel is gyro integration alone.
            gyro_angle_z,
        );

        Estimate {
            state: OrientationState {
                timestamp_ms: now_ms,
                filtered,
                unfiltered,
            },
            accel_angles,
            delta_seconds: dt,
        }
    }
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Tilt angles in degrees from a single accelerometer sample.
///
/// The raw counts are used as-is; the captured accelerometer bias is
/// not subtracted here. The sensor provides no gravity reference for
/// z, so that component is fixed at zero.
pub fn tilt_angles(accel: Vector3<f32>) -> Vector3<f32> {
    let angle_x =
        (accel.y / (accel.x * accel.x + accel.z * accel.z).sqrt()).atan() * RAD_TO_DEG;
    let angle_y =
        (-accel.x / (accel.y * accel.y + accel.z * accel.z).sqrt()).atan() * RAD_TO_DEG;
    Vector3::new(angle_x, angle_y, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn level_frame() -> RawFrame {
        RawFrame {
            accel_z: 16_384,
            ..RawFrame::default()
        }
    }

    #[test]
    fn test_level_and_still_stays_level() {
        let estimator = Estimator::new();
        let offsets = CalibrationOffsets::default();
        let state = OrientationState::level_at(0);

        let estimate = estimator.tick(&level_frame(), 0, &offsets, &state);
        assert_eq!(estimate.delta_seconds, 0.0);
        assert_eq!(estimate.accel_angles, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(estimate.state.filtered, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(estimate.state.unfiltered, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_tilt_angles_pure_axes() {
        // Gravity fully on y: the x tilt saturates at 90 degrees.
        let angles = tilt_angles(Vector3::new(0.0, 16_384.0, 0.0));
        assert!((angles.x - 90.0).abs() < EPSILON);

        // Gravity fully on x: the y tilt saturates at -90 degrees.
        let angles = tilt_angles(Vector3::new(16_384.0, 0.0, 0.0));
        assert!((angles.y + 90.0).abs() < EPSILON);

        // 45 degree roll: equal y and z components.
        let angles = tilt_angles(Vector3::new(0.0, 11_585.0, 11_585.0));
        assert!((angles.x - 45.0).abs() < EPSILON);
        assert_eq!(angles.z, 0.0);
    }

    #[test]
    fn test_filter_error_decays_geometrically() {
        // Zero rotation, constant 45 degree tilt: each tick multiplies
        // the remaining error by the blend weight.
        let estimator = Estimator::new();
        let offsets = CalibrationOffsets::default();
        let mut state = OrientationState::level_at(0);

        let frame = RawFrame {
            accel_y: 11_585,
            accel_z: 11_585,
            ..RawFrame::default()
        };
        let target = tilt_angles(frame.accel()).x;

        let mut now_ms = 0;
        let mut previous_error = (state.filtered.x - target).abs();
        for _ in 0..20 {
            now_ms += 10;
            state = estimator.tick(&frame, now_ms, &offsets, &state).state;
            let error = (state.filtered.x - target).abs();
            assert!(
                (error - previous_error * FILTER_GAIN).abs() < EPSILON,
                "error {error} is not {previous_error} * {FILTER_GAIN}"
            );
            previous_error = error;
        }

        let expected = 45.0 * FILTER_GAIN.powi(20);
        assert!((previous_error - expected).abs() < 1e-2);
    }

    #[test]
    fn test_unfiltered_track_drifts_linearly() {
        // 1310 counts = 10 deg/s; at 10 ms per tick the drift track
        // gains 0.1 degree per tick without bound.
        let estimator = Estimator::new();
        let offsets = CalibrationOffsets::default();
        let mut state = OrientationState::level_at(0);

        let frame = RawFrame {
            accel_z: 16_384,
            gyro_x: 1310,
            ..RawFrame::default()
        };

        for k in 1..=100u32 {
            state = estimator
                .tick(&frame, k * 10, &offsets, &state)
                .state;
            let expected = 0.1 * k as f32;
            assert!(
                (state.unfiltered.x - expected).abs() < 1e-2,
                "tick {k}: {} != {expected}",
                state.unfiltered.x
            );
        }
    }

    #[test]
    fn test_tracks_use_their_own_integration_bases() {
        let estimator = Estimator::new();
        let offsets = CalibrationOffsets::default();
        let previous = OrientationState {
            timestamp_ms: 0,
            filtered: Vector3::new(10.0, 0.0, 5.0),
            unfiltered: Vector3::new(50.0, 0.0, 7.0),
        };

        let estimate = estimator.tick(&level_frame(), 10, &offsets, &previous);

        // Zero rates: the filtered x decays from the filtered base, the
        // drift track holds its own value, and z integrates on the
        // previous filtered z.
        assert!((estimate.state.filtered.x - 0.96 * 10.0).abs() < EPSILON);
        assert!((estimate.state.unfiltered.x - 50.0).abs() < EPSILON);
        assert!((estimate.state.filtered.z - 5.0).abs() < EPSILON);
        assert!((estimate.state.unfiltered.z - 7.0).abs() < EPSILON);
    }

    #[test]
    fn test_gyro_offset_and_sensitivity() {
        let estimator = Estimator::new();
        let offsets = CalibrationOffsets {
            accel: Vector3::zeros(),
            gyro: Vector3::new(131.0, 0.0, 0.0),
        };
        let state = OrientationState::level_at(0);

        // 262 raw counts minus the 131 count bias is 1 deg/s; over one
        // second the drift track gains exactly one degree.
        let frame = RawFrame {
            accel_z: 16_384,
            gyro_x: 262,
            ..RawFrame::default()
        };
        let estimate = estimator.tick(&frame, 1000, &offsets, &state);
        assert!((estimate.state.unfiltered.x - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_timestamp_wraparound() {
        let estimator = Estimator::new();
        let offsets = CalibrationOffsets::default();
        let state = OrientationState::level_at(u32::MAX - 4);

        let estimate = estimator.tick(&level_frame(), 6, &offsets, &state);
        assert!((estimate.delta_seconds - 0.011).abs() < 1e-6);
    }

    #[test]
    fn test_accel_bias_is_not_subtracted() {
        // A nonzero recorded accelerometer bias must not change the
        // tilt angles.
        let estimator = Estimator::new();
        let biased = CalibrationOffsets {
            accel: Vector3::new(500.0, -300.0, 100.0),
            gyro: Vector3::zeros(),
        };
        let state = OrientationState::level_at(0);

        let frame = RawFrame {
            accel_y: 11_585,
            accel_z: 11_585,
            ..RawFrame::default()
        };
        let with_bias = estimator.tick(&frame, 10, &biased, &state);
        let without_bias =
            estimator.tick(&frame, 10, &CalibrationOffsets::default(), &state);
        assert_eq!(with_bias.accel_angles, without_bias.accel_angles);
    }
}
