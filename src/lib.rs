//! # Introduction
//! This is a platform-agnostic Rust driver for the LTR-F216A ambient light
//! sensor, using [`embedded-hal`](https://github.com/rust-embedded/embedded-hal) traits.
//!
//! The sensor free-runs once enabled: it converts light on a green-calibrated
//! ALS channel and a wideband clear channel into 24-bit samples, at one of
//! five integration times. This driver manages the enable/standby lifecycle,
//! the integration time and the raw and lux readout.
//!
//! ## Supported devices
//! Tested with the following sensor(s):
//! - LTR-F216A-01 (7-bit I²C address 0x53, part ID 0xB6)
//!
//! ## Usage
//! ### Setup
//!
//! Instantiate a new driver instance using a [blocking I²C HAL
//! implementation](https://docs.rs/embedded-hal/0.2.*/embedded_hal/blocking/i2c/index.html).
//! For example, using `linux-embedded-hal`:
//! ```no_run
//! use linux_embedded_hal::I2cdev;
//! use ltrf216a::{IntegrationTime, Ltrf216a};
//!
//! let dev = I2cdev::new("/dev/i2c-1").unwrap();
//! let mut sensor = Ltrf216a::init(dev);
//! sensor.set_integration_time(IntegrationTime::Ms200).unwrap();
//! ```
//!
//! ### Device Info
//!
//! Then, you can query information about the sensor:
//!
//! ```no_run
//! # use linux_embedded_hal::I2cdev;
//! # use ltrf216a::Ltrf216a;
//! # let dev = I2cdev::new("/dev/i2c-1").unwrap();
//! # let mut sensor = Ltrf216a::init(dev);
//! let part_id = sensor.part_id().unwrap();
//! assert_eq!(part_id, 0xB6);
//! ```
//!
//! ### Measurements
//!
//! For measuring the illuminance, enable the sensor and wait for a result:
//! ```no_run
//! # use linux_embedded_hal::I2cdev;
//! # use ltrf216a::Ltrf216a;
//! use ltrf216a::Channel;
//! # let dev = I2cdev::new("/dev/i2c-1").unwrap();
//! # let mut sensor = Ltrf216a::init(dev);
//! sensor.enable().unwrap();
//! while !sensor.data_ready().unwrap() {}
//!
//! let light = sensor.als_lux().unwrap();
//! println!("current illuminance: {} lx", light.lux);
//!
//! let clear = sensor.read_channel(Channel::Clear).unwrap();
//! println!("clear channel: {}", clear);
//! ```
//!
//! ### Power management
//!
//! Standby keeps the register file intact, so a later `enable()` picks up
//! the previous settings:
//! ```no_run
//! # use linux_embedded_hal::I2cdev;
//! # use ltrf216a::Ltrf216a;
//! # let dev = I2cdev::new("/dev/i2c-1").unwrap();
//! # let mut sensor = Ltrf216a::init(dev);
//! sensor.disable().unwrap();
//! // ... sleep ...
//! sensor.enable().unwrap();
//! ```
//!
//! ## Optional features
//! - `std`: enables `SharedLtrf216a`, a mutex-guarded handle for hosted
//!   targets where several threads talk to one sensor.
//! - `defmt`: derives `defmt::Format` for the public types.
//!
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#[macro_use]
extern crate num_derive;
use embedded_hal::blocking::i2c;

mod fields;
mod registers;
#[cfg(any(test, feature = "std"))]
pub mod shared;
mod types;
pub use crate::fields::*;
pub use crate::registers::*;
pub use crate::types::{Channel, Error, LuxData};

const LTRF216A_BASE_ADDRESS: u8 = 0x53;

/// LTRF216A driver.
///
/// Owns the bus handle plus a cache of the one configuration value the
/// driver manages, the ALS integration time. The cache is committed only
/// after the matching register write succeeded, so it always mirrors what
/// the hardware holds.
pub struct Ltrf216a<I2C> {
    i2c: I2C,
    int_time: IntegrationTime,
}

impl<I2C, E> Ltrf216a<I2C>
where
    I2C: i2c::WriteRead<Error = E> + i2c::Read<Error = E> + i2c::Write<Error = E>,
{
    /// Initializes the LTRF216A driver while consuming the i2c bus.
    ///
    /// No bus traffic happens here; the sensor stays in standby and the
    /// cached integration time starts at the power-on default.
    pub fn init(i2c: I2C) -> Self {
        Ltrf216a {
            i2c,
            int_time: IntegrationTime::default(),
        }
    }

    /// Get the part ID stored inside the sensor. This ID should be 0xB6.
    pub fn part_id(&mut self) -> Result<u8, Error<E>> {
        self.read_register(Register::PART_ID)
    }

    /// Destroy driver instance, return I²C bus instance.
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    /// Starts free-running measurement by setting the ALS enable bit.
    ///
    /// MAIN_CTRL is read first and the bit is OR-ed in so the other control
    /// bits survive. A failed read issues no write at all.
    pub fn enable(&mut self) -> Result<(), Error<E>> {
        let ctrl = self.read_register(Register::MAIN_CTRL)?;
        self.write_register(Register::MAIN_CTRL, ctrl | MainCtrl::ALS_ENABLE)
    }

    /// Stops measurement and puts the sensor in standby.
    ///
    /// MAIN_CTRL is written to zero outright; entering standby never
    /// depends on a prior read succeeding.
    pub fn disable(&mut self) -> Result<(), Error<E>> {
        self.write_register(Register::MAIN_CTRL, 0x00)
    }

    /// Triggers a software reset, returning every register to its power-on
    /// default. The cached integration time follows along.
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.write_register(Register::MAIN_CTRL, MainCtrl::SW_RESET)?;
        self.int_time = IntegrationTime::default();
        Ok(())
    }

    /// Programs a new ALS integration time.
    ///
    /// Each integration time goes on the bus together with its matching
    /// measurement rate. The cache is only updated once the write has
    /// succeeded; a bus error leaves the previous setting in place.
    pub fn set_integration_time(&mut self, itime: IntegrationTime) -> Result<(), Error<E>> {
        let meas_rate_reg = MeasRateRegister::default()
            .with_integration_time(itime)
            .with_measurement_rate(itime.repeat_rate());

        self.write_register(Register::ALS_MEAS_RATE, meas_rate_reg.value())?;
        self.int_time = itime;
        Ok(())
    }

    /// Programs the integration time from a duration in microseconds.
    ///
    /// Only the five durations of [`IntegrationTime::ALL`] are accepted;
    /// anything else returns [`Error::InvalidIntegrationTime`] without any
    /// bus traffic.
    pub fn set_integration_time_us(&mut self, us: u32) -> Result<(), Error<E>> {
        let itime = IntegrationTime::from_us(us).ok_or(Error::InvalidIntegrationTime)?;
        self.set_integration_time(itime)
    }

    /// The currently programmed integration time, served from the cache
    /// without touching the bus.
    pub fn integration_time(&self) -> IntegrationTime {
        self.int_time
    }

    /// Reads the latest 24-bit sample of one channel.
    pub fn read_channel(&mut self, channel: Channel) -> Result<u32, Error<E>> {
        self.read_data(channel.base_address())
    }

    /// Reads the ALS channel and converts it to a physical lux value.
    pub fn als_lux(&mut self) -> Result<LuxData, Error<E>> {
        let raw = self.read_channel(Channel::Als)?;

        Ok(LuxData {
            raw,
            lux: raw_to_lux(raw, self.int_time),
        })
    }

    /// Returns the contents of the MAIN_STATUS register.
    pub fn status(&mut self) -> Result<MainStatusRegister, Error<E>> {
        let data = self.read_register(Register::MAIN_STATUS)?;

        let status_reg: MainStatusRegister = data.into();
        Ok(status_reg)
    }

    /// Check if new sensor data is ready.
    pub fn data_ready(&mut self) -> Result<bool, Error<E>> {
        let status = self.status()?;
        Ok(status.data_status.value == DataStatus::New)
    }

    fn read_data(&mut self, base_address: u8) -> Result<u32, Error<E>> {
        // Data registers are least significant byte first. A failed read
        // aborts the whole sample; no partial value is ever assembled.
        let data_0 = self.read_register(base_address)?;
        let data_1 = self.read_register(base_address + 1)?;
        let data_2 = self.read_register(base_address + 2)?;

        Ok((u32::from(data_2) << 16) | (u32::from(data_1) << 8) | u32::from(data_0))
    }
}

impl<I2C, E> Ltrf216a<I2C>
where
    I2C: i2c::WriteRead<Error = E> + i2c::Write<Error = E> + i2c::Read<Error = E>,
{
    fn write_register(&mut self, register: u8, data: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(LTRF216A_BASE_ADDRESS, &[register, data])
            .map_err(Error::I2C)
            .and(Ok(()))
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Error<E>> {
        let mut data: [u8; 1] = [0];
        self.i2c
            .write_read(LTRF216A_BASE_ADDRESS, &[register], &mut data)
            .map_err(Error::I2C)
            .and(Ok(data[0]))
    }
}

fn raw_to_lux(als_data: u32, itime: IntegrationTime) -> f32 {
    // lux = 0.45 * ALS_DATA / (gain * int_time), with the gain term fixed
    // at the 3x power-on default this driver never changes.
    let int_time: f32 = itime.into();
    0.45 * als_data as f32 / int_time
}
