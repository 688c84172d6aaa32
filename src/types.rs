use crate::registers::Register;

/// All possible errors in this crate
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I²C bus error.
    I2C(E),
    /// The requested integration time is not one of the five durations the
    /// hardware supports.
    InvalidIntegrationTime,
}

/// The two independently converted light channels of the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Green-calibrated ambient light channel, the one illuminance is
    /// derived from.
    Als,
    /// Wideband clear channel.
    Clear,
}

impl Channel {
    /// Address of the least significant byte of this channel's three data
    /// registers.
    pub(crate) fn base_address(self) -> u8 {
        match self {
            Channel::Als => Register::ALS_DATA_0,
            Channel::Clear => Register::CLEAR_DATA_0,
        }
    }
}

/// An ALS sample: the raw 24-bit count together with its illuminance
/// conversion.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LuxData {
    pub raw: u32,
    pub lux: f32,
}
