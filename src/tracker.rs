//! The per-tick control loop: bus reads, decoding, calibration, and
//! fusion wired together.
//!
//! One tick runs to completion before the next begins: a full burst
//! read, a full decode, the fusion computation, and the record
//! emission, all on the single control-loop thread. Bus transactions
//! block synchronously with no timeout, and a failed read skips fusion
//! for that tick while leaving the previous estimate in place; nothing
//! is treated as fatal.

use core::fmt;

use embedded_hal::delay::DelayNs;
use nalgebra::Vector3;

use crate::bus::{BusError, BusTransport, SensorBus};
use crate::calibration::{BiasAccumulator, CalibrationOffsets, CalibrationSettings};
use crate::compass::magnetic_heading;
use crate::estimator::{Estimator, EstimatorSettings, OrientationState};
use crate::frame::{MagFrame, RawFrame};

/// Bus addressing for the two per-tick bursts.
///
/// Only the measurement burst locations live here; the rest of the
/// register map, along with one-time bring-up (power management and the
/// auxiliary-bus wiring that mirrors the compass into the primary
/// device's register space), belongs to the platform code that owns the
/// transport before the tracker does.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct TrackerConfig {
    /// Bus address of the primary inertial device.
    pub device_address: u8,
    /// First register of the 14-byte accel/temperature/gyro burst.
    pub frame_register: u8,
    /// First register of the mirrored compass burst.
    pub compass_register: u8,
    /// Idle interval inserted after each tick, in milliseconds, so the
    /// output sink is not overrun.
    pub idle_ms: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            device_address: 0x68,
            frame_register: 0x3B,
            compass_register: 0x49,
            idle_ms: 4,
        }
    }
}

/// One emitted record per tick.
///
/// The `Display` implementation writes the fields comma-delimited in
/// this fixed order: elapsed seconds, the three accelerometer-derived
/// angles, the three unfiltered gyro-integrated angles, the three
/// filtered angles, and the heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickRecord {
    pub delta_seconds: f32,
    pub accel_angles: Vector3<f32>,
    pub unfiltered_angles: Vector3<f32>,
    pub filtered_angles: Vector3<f32>,
    pub heading: f32,
}

impl fmt::Display for TickRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{},{},{},{},{}",
            self.delta_seconds,
            self.accel_angles.x,
            self.accel_angles.y,
            self.accel_angles.z,
            self.unfiltered_angles.x,
            self.unfiltered_angles.y,
            self.unfiltered_angles.z,
            self.filtered_angles.x,
            self.filtered_angles.y,
            self.filtered_angles.z,
            self.heading,
        )
    }
}

/// Owns the bus layer, the calibration offsets, and the single-slot
/// rolling orientation state; runs the fixed-cadence estimation loop
/// one tick at a time.
pub struct Tracker<T> {
    bus: SensorBus<T>,
    estimator: Estimator,
    calibration: CalibrationSettings,
    config: TrackerConfig,
    offsets: CalibrationOffsets,
    state: OrientationState,
}

impl<T: BusTransport> Tracker<T> {
    /// Builds a tracker with the default filter and calibration
    /// parameters. The transport must already be through device
    /// bring-up.
    pub fn new(transport: T, config: TrackerConfig) -> Self {
        Self::with_settings(
            transport,
            config,
            EstimatorSettings::default(),
            CalibrationSettings::default(),
        )
    }

    pub fn with_settings(
        transport: T,
        config: TrackerConfig,
        estimator: EstimatorSettings,
        calibration: CalibrationSettings,
    ) -> Self {
        Self {
            bus: SensorBus::new(transport, config.device_address),
            estimator: Estimator::with_settings(estimator),
            calibration,
            config,
            offsets: CalibrationOffsets::default(),
            state: OrientationState::level_at(0),
        }
    }

    /// Captures the rest biases from a static sample window.
    ///
    /// Blocks for roughly `sample_count * sample_interval_ms` plus one
    /// discarded warm-up read. The device must sit stationary on a
    /// level surface for the duration. A bus failure abandons the
    /// window and is returned instead of being folded into the mean.
    pub fn calibrate(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<&CalibrationOffsets, BusError> {
        // Warm-up read, discarded.
        self.read_frame()?;

        let mut window = BiasAccumulator::new();
        for _ in 0..self.calibration.sample_count {
            delay.delay_ms(self.calibration.sample_interval_ms);
            let frame = self.read_frame()?;
            window.record(&frame);
        }
        self.offsets = window.finish();
        Ok(&self.offsets)
    }

    /// Resets the rolling estimate to zero angles at `now_ms`.
    pub fn start(&mut self, now_ms: u32) {
        self.state = OrientationState::level_at(now_ms);
    }

    /// Runs one tick: reads and decodes both bursts, fuses the frame
    /// into the rolling state, extracts the heading, and inserts the
    /// fixed idle interval.
    ///
    /// On a bus failure the error is returned, fusion is skipped for
    /// this tick, and the previous estimate stays in place; the caller
    /// may keep looping indefinitely.
    pub fn step(&mut self, now_ms: u32, delay: &mut impl DelayNs) -> Result<TickRecord, BusError> {
        let frame = self.read_frame()?;
        let mag = self.read_compass()?;

        let estimate = self.estimator.tick(&frame, now_ms, &self.offsets, &self.state);
        self.state = estimate.state;

        let record = TickRecord {
            delta_seconds: estimate.delta_seconds,
            accel_angles: estimate.accel_angles,
            unfiltered_angles: self.state.unfiltered,
            filtered_angles: self.state.filtered,
            heading: magnetic_heading(mag.x, mag.y, mag.z),
        };

        delay.delay_ms(self.config.idle_ms);
        Ok(record)
    }

    /// Offsets captured by the last calibration, all-zero before one
    /// runs.
    pub fn offsets(&self) -> &CalibrationOffsets {
        &self.offsets
    }

    /// The rolling estimate after the most recent successful tick.
    pub fn state(&self) -> &OrientationState {
        &self.state
    }

    /// Destroys the tracker and hands the transport back.
    pub fn release(self) -> T {
        self.bus.release()
    }

    fn read_frame(&mut self) -> Result<RawFrame, BusError> {
        let mut payload = [0u8; RawFrame::SIZE];
        self.bus
            .read_registers(self.config.frame_register, &mut payload)?;
        Ok(RawFrame::from_bytes(payload))
    }

    fn read_compass(&mut self) -> Result<MagFrame, BusError> {
        let mut payload = [0u8; MagFrame::SIZE];
        self.bus
            .read_registers(self.config.compass_register, &mut payload)?;
        Ok(MagFrame::from_bytes(payload))
    }
}
