//! Decoding of raw sensor bursts into typed samples.
//!
//! The inertial device streams its measurement registers as consecutive
//! 16-bit fields with the high byte first, while the host assembles
//! native values low byte first. Decoding swaps each field's two bytes
//! and reinterprets them as a signed integer in a single step; no
//! arithmetic is involved, so the transformation is exact and
//! reversible.

use nalgebra::Vector3;

/// One decoded inertial burst: three accelerometer axes, the die
/// temperature word, and three gyroscope axes, in register order.
///
/// Values are device-native counts. A frame lives for one tick; the
/// fusion stage consumes it and nothing retains it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RawFrame {
    pub accel_x: i16,
    pub accel_y: i16,
    pub accel_z: i16,
    pub temperature: i16,
    pub gyro_x: i16,
    pub gyro_y: i16,
    pub gyro_z: i16,
}

impl RawFrame {
    /// Length of the measurement burst in bytes.
    pub const SIZE: usize = 14;

    /// Decodes one burst payload.
    ///
    /// Each field arrives high-byte-first on the wire; `from_be_bytes`
    /// performs the byte swap and the reinterpretation in one step.
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self {
            accel_x: i16::from_be_bytes([bytes[0], bytes[1]]),
            accel_y: i16::from_be_bytes([bytes[2], bytes[3]]),
            accel_z: i16::from_be_bytes([bytes[4], bytes[5]]),
            temperature: i16::from_be_bytes([bytes[6], bytes[7]]),
            gyro_x: i16::from_be_bytes([bytes[8], bytes[9]]),
            gyro_y: i16::from_be_bytes([bytes[10], bytes[11]]),
            gyro_z: i16::from_be_bytes([bytes[12], bytes[13]]),
        }
    }

    /// Re-encodes the frame into its wire layout, the exact inverse of
    /// [`RawFrame::from_bytes`].
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let fields = [
            self.accel_x,
            self.accel_y,
            self.accel_z,
            self.temperature,
            self.gyro_x,
            self.gyro_y,
            self.gyro_z,
        ];

        let mut bytes = [0u8; Self::SIZE];
        for (chunk, field) in bytes.chunks_exact_mut(2).zip(fields) {
            chunk.copy_from_slice(&field.to_be_bytes());
        }
        bytes
    }

    /// Accelerometer counts as a float vector for the fusion stage.
    pub fn accel(&self) -> Vector3<f32> {
        Vector3::new(
            f32::from(self.accel_x),
            f32::from(self.accel_y),
            f32::from(self.accel_z),
        )
    }

    /// Gyroscope counts as a float vector for the fusion stage.
    pub fn gyro(&self) -> Vector3<f32> {
        Vector3::new(
            f32::from(self.gyro_x),
            f32::from(self.gyro_y),
            f32::from(self.gyro_z),
        )
    }
}

/// One decoded compass burst.
///
/// The compass streams its axes in X, Z, Y register order, high byte
/// first; the decoder restores the conventional x/y/z naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct MagFrame {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl MagFrame {
    /// Length of the compass burst in bytes.
    pub const SIZE: usize = 6;

    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self {
            x: i16::from_be_bytes([bytes[0], bytes[1]]),
            z: i16::from_be_bytes([bytes[2], bytes[3]]),
            y: i16::from_be_bytes([bytes[4], bytes[5]]),
        }
    }
}
