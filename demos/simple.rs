use tilt_fusion::{CalibrationOffsets, Estimator, OrientationState, RawFrame};

const TICK_MS: u32 = 10; // 10 ms tick period

fn main() {
    let estimator = Estimator::new();
    let offsets = CalibrationOffsets::default(); // replace with a captured calibration window
    let mut state = OrientationState::level_at(0);

    for tick in 1..=10u32 {
        // this loop should repeat each time a new burst is decoded
        let frame = RawFrame {
            accel_z: 16_384, // replace with the decoded burst from the live bus
            ..RawFrame::default()
        };

        let estimate = estimator.tick(&frame, tick * TICK_MS, &offsets, &state);
        state = estimate.state;

        println!(
            "Roll: {:.2}, Pitch: {:.2}, Yaw: {:.2}",
            state.filtered.x, state.filtered.y, state.filtered.z
        );
    }
}
