//! Compass heading from raw magnetometer words.

use nalgebra::RealField;

use crate::math::RAD_TO_DEG;

/// Compass heading in degrees, `[0, 360)`, from raw magnetometer words.
///
/// The heading is planar: only the horizontal components enter the
/// formula, and the vertical axis is accepted but unused. No tilt
/// compensation is applied, and the result is independent of the tilt
/// filter.
pub fn magnetic_heading(mx: i16, my: i16, _mz: i16) -> f32 {
    let mut heading = f32::from(my).atan2(f32::from(mx));
    if heading < 0.0 {
        heading += 2.0 * core::f32::consts::PI;
    }
    heading * RAD_TO_DEG
}
