//! Full tracker demonstration against a simulated sensor stack.
//!
//! Runs the whole pipeline the way firmware would: one discarded
//! warm-up read, a ten-sample calibration window, then a fixed-cadence
//! estimation loop that prints one record per tick. The bus transport
//! is a small in-memory device model producing a slow roll, so the
//! filtered angle can be watched converging toward the accelerometer
//! tilt while the unfiltered track drifts with the simulated gyro bias.
//!
//! Run with: `cargo run --example tracker`

use std::time::Instant;

use embedded_hal::delay::DelayNs;
use tilt_fusion::{BusTransport, MagFrame, RawFrame, Tracker, TrackerConfig};

/// Host-side delay backed by the operating system clock.
struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

/// In-memory model of the two-chip stack: a gently rolling device with
/// a constant gyro bias, its compass mirrored into the primary's
/// auxiliary registers.
struct SimulatedStack {
    ticks: u32,
    selected: u8,
    cursor: usize,
    burst: [u8; RawFrame::SIZE],
    compass: [u8; MagFrame::SIZE],
}

impl SimulatedStack {
    fn new() -> Self {
        Self {
            ticks: 0,
            selected: 0,
            cursor: 0,
            burst: [0; RawFrame::SIZE],
            compass: [0; MagFrame::SIZE],
        }
    }

    fn sample(&mut self) {
        self.ticks += 1;
        let roll = (self.ticks as f32 * 0.002).sin() * 0.26; // +/- 15 degrees, radians

        let frame = RawFrame {
            accel_x: 0,
            accel_y: (16_384.0 * roll.sin()) as i16,
            accel_z: (16_384.0 * roll.cos()) as i16,
            temperature: 340,
            gyro_x: 47, // constant bias the calibration window should absorb
            gyro_y: -12,
            gyro_z: 3,
        };
        self.burst = frame.to_bytes();

        // Compass fixed toward magnetic north-east; wire order X, Z, Y.
        self.compass[0..2].copy_from_slice(&400i16.to_be_bytes());
        self.compass[2..4].copy_from_slice(&(-120i16).to_be_bytes());
        self.compass[4..6].copy_from_slice(&400i16.to_be_bytes());
    }
}

impl BusTransport for SimulatedStack {
    fn begin(&mut self, _device: u8) {}

    fn write(&mut self, bytes: &[u8]) -> usize {
        self.selected = bytes[0];
        bytes.len()
    }

    fn end(&mut self, _restart: bool) -> u8 {
        0
    }

    fn request(&mut self, _device: u8, len: usize, _stop: bool) -> usize {
        self.cursor = 0;
        if self.selected == 0x3B {
            self.sample();
        }
        len
    }

    fn read_byte(&mut self) -> u8 {
        let byte = match self.selected {
            0x3B => self.burst[self.cursor],
            _ => self.compass[self.cursor],
        };
        self.cursor += 1;
        byte
    }
}

fn main() {
    let mut tracker = Tracker::new(SimulatedStack::new(), TrackerConfig::default());
    let mut delay = HostDelay;
    let started = Instant::now();

    println!("Calibrating, keep the device level and still...");
    match tracker.calibrate(&mut delay) {
        Ok(offsets) => println!(
            "Gyro bias: ({:.1}, {:.1}, {:.1}) counts",
            offsets.gyro.x, offsets.gyro.y, offsets.gyro.z
        ),
        Err(error) => {
            eprintln!("Calibration failed: {error}");
            return;
        }
    }

    tracker.start(started.elapsed().as_millis() as u32);
    println!(
        "dt,accel_x,accel_y,accel_z,unfiltered_x,unfiltered_y,unfiltered_z,filtered_x,filtered_y,filtered_z,heading"
    );

    for _ in 0..200 {
        let now_ms = started.elapsed().as_millis() as u32;
        match tracker.step(now_ms, &mut delay) {
            Ok(record) => println!("{record}"),
            Err(error) => eprintln!("Tick skipped: {error}"),
        }
    }
}
