//! Mutex-guarded handle for platforms where several execution contexts
//! share one sensor.
//!
//! [`Ltrf216a`] is exclusive by ownership: every operation takes `&mut
//! self`, so the borrow checker already rules out interleaved register
//! sequences from a single thread of control. Hosted targets answering
//! independent read and configuration requests need the same guarantee
//! across threads. [`SharedLtrf216a`] wraps the driver in a mutex and
//! re-exposes the surface on `&self` with one lock acquisition per
//! operation, so multi-transfer operations like the three-byte sample read
//! stay whole on the bus.

use std::sync::{Mutex, MutexGuard};

use embedded_hal::blocking::i2c;

use crate::{Channel, Error, IntegrationTime, Ltrf216a};

/// A [`Ltrf216a`] behind a [`Mutex`], shareable between threads.
pub struct SharedLtrf216a<I2C> {
    inner: Mutex<Ltrf216a<I2C>>,
}

impl<I2C, E> SharedLtrf216a<I2C>
where
    I2C: i2c::WriteRead<Error = E> + i2c::Read<Error = E> + i2c::Write<Error = E>,
{
    /// Brings the sensor up and publishes the shared handle.
    ///
    /// The measurement-rate register is programmed with the power-on
    /// default before the enable bit is set, so cache and hardware agree
    /// from the very first sample. If either step fails no handle is handed
    /// out; the bus is consumed either way.
    pub fn attach(i2c: I2C) -> Result<Self, Error<E>> {
        let mut sensor = Ltrf216a::init(i2c);
        sensor.set_integration_time(IntegrationTime::default())?;
        sensor.enable()?;

        Ok(SharedLtrf216a {
            inner: Mutex::new(sensor),
        })
    }

    /// Puts the sensor in standby and returns the bus.
    ///
    /// Teardown proceeds even on a dying bus, so the outcome of the standby
    /// write is reported next to the bus instead of failing the call.
    pub fn detach(self) -> (I2C, Result<(), Error<E>>) {
        let mut sensor = self
            .inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let standby = sensor.disable();

        (sensor.destroy(), standby)
    }

    /// Stops measurement for a system suspend.
    pub fn suspend(&self) -> Result<(), Error<E>> {
        self.lock().disable()
    }

    /// Restarts measurement after a system resume.
    ///
    /// On failure the sensor stays in standby and the stored integration
    /// time is untouched.
    pub fn resume(&self) -> Result<(), Error<E>> {
        self.lock().enable()
    }

    /// Reads the latest 24-bit sample of one channel.
    pub fn read_channel(&self, channel: Channel) -> Result<u32, Error<E>> {
        self.lock().read_channel(channel)
    }

    /// Programs a new ALS integration time.
    pub fn set_integration_time(&self, itime: IntegrationTime) -> Result<(), Error<E>> {
        self.lock().set_integration_time(itime)
    }

    /// The currently programmed integration time.
    pub fn integration_time(&self) -> IntegrationTime {
        self.lock().integration_time()
    }

    /// Integration time in split numeric form: whole seconds plus leftover
    /// microseconds. Every supported setting is below one second, so the
    /// seconds part is always zero.
    pub fn integration_time_parts(&self) -> (u32, u32) {
        (0, self.lock().integration_time().as_us())
    }

    /// Sets the integration time from the same split numeric form.
    ///
    /// A non-zero seconds part can never match a supported setting and is
    /// rejected up front, without bus traffic.
    pub fn set_integration_time_parts(&self, secs: u32, micros: u32) -> Result<(), Error<E>> {
        if secs != 0 {
            return Err(Error::InvalidIntegrationTime);
        }
        self.lock().set_integration_time_us(micros)
    }

    fn lock(&self) -> MutexGuard<'_, Ltrf216a<I2C>> {
        // The cache only changes after a completed register write, so the
        // state behind a poisoned lock is still consistent.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Channel, Error, IntegrationTime, Register};

    use embedded_hal_mock::i2c;
    use embedded_hal_mock::MockError;
    use std::convert::Infallible;
    use std::io::ErrorKind;
    use std::sync::Arc;
    use std::thread;

    const LTRF216A_ADDR: u8 = 0x53;

    #[test]
    fn attach_programs_defaults_then_enables() {
        let expectations = [
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::ALS_MEAS_RATE, 0x22]),
            i2c::Transaction::write_read(LTRF216A_ADDR, vec![Register::MAIN_CTRL], vec![0x00]),
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x02]),
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x00]),
        ];
        let sensor = SharedLtrf216a::attach(i2c::Mock::new(&expectations)).unwrap();
        assert_eq!(sensor.integration_time(), IntegrationTime::Ms100);

        let (mut mock, standby) = sensor.detach();
        standby.unwrap();
        mock.done(); // verify expectations
    }

    #[test]
    fn failed_attach_hands_out_no_handle() {
        let expectations = [
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::ALS_MEAS_RATE, 0x22]),
            i2c::Transaction::write_read(LTRF216A_ADDR, vec![Register::MAIN_CTRL], vec![0x00])
                .with_error(MockError::Io(ErrorKind::Other)),
        ];
        let mock = i2c::Mock::new(&expectations);
        // Clones share the expectation queue, so this one can still verify
        // after `attach` consumed the mock it was cloned from.
        let mut leftover = mock.clone();

        assert_eq!(
            SharedLtrf216a::attach(mock).err(),
            Some(Error::I2C(MockError::Io(ErrorKind::Other)))
        );
        leftover.done(); // verify expectations
    }

    #[test]
    fn failed_enable_write_hands_out_no_handle() {
        let expectations = [
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::ALS_MEAS_RATE, 0x22]),
            i2c::Transaction::write_read(LTRF216A_ADDR, vec![Register::MAIN_CTRL], vec![0x00]),
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x02])
                .with_error(MockError::Io(ErrorKind::Other)),
        ];
        let mock = i2c::Mock::new(&expectations);
        let mut leftover = mock.clone();

        assert_eq!(
            SharedLtrf216a::attach(mock).err(),
            Some(Error::I2C(MockError::Io(ErrorKind::Other)))
        );
        leftover.done(); // verify expectations
    }

    #[test]
    fn suspend_and_resume_toggle_the_enable_bit_only() {
        let expectations = [
            // attach
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::ALS_MEAS_RATE, 0x22]),
            i2c::Transaction::write_read(LTRF216A_ADDR, vec![Register::MAIN_CTRL], vec![0x00]),
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x02]),
            // suspend
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x00]),
            // resume
            i2c::Transaction::write_read(LTRF216A_ADDR, vec![Register::MAIN_CTRL], vec![0x00]),
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x02]),
            // detach
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x00]),
        ];
        let sensor = SharedLtrf216a::attach(i2c::Mock::new(&expectations)).unwrap();

        sensor.suspend().unwrap();
        sensor.resume().unwrap();
        assert_eq!(sensor.integration_time_parts(), (0, 100_000));

        let (mut mock, standby) = sensor.detach();
        standby.unwrap();
        mock.done(); // verify expectations
    }

    #[test]
    fn failed_resume_reports_and_keeps_state() {
        let expectations = [
            // attach
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::ALS_MEAS_RATE, 0x22]),
            i2c::Transaction::write_read(LTRF216A_ADDR, vec![Register::MAIN_CTRL], vec![0x00]),
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x02]),
            // the host asks for 200 ms
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::ALS_MEAS_RATE, 0x13]),
            // suspend
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x00]),
            // resume fails at the control read
            i2c::Transaction::write_read(LTRF216A_ADDR, vec![Register::MAIN_CTRL], vec![0x00])
                .with_error(MockError::Io(ErrorKind::Other)),
            // detach
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x00]),
        ];
        let sensor = SharedLtrf216a::attach(i2c::Mock::new(&expectations)).unwrap();

        sensor.set_integration_time_parts(0, 200_000).unwrap();
        sensor.suspend().unwrap();

        assert!(sensor.resume().is_err());
        // Still suspended, settings intact.
        assert_eq!(sensor.integration_time_parts(), (0, 200_000));

        let (mut mock, standby) = sensor.detach();
        standby.unwrap();
        mock.done(); // verify expectations
    }

    #[test]
    fn failed_suspend_reports_and_keeps_the_handle() {
        let expectations = [
            // attach
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::ALS_MEAS_RATE, 0x22]),
            i2c::Transaction::write_read(LTRF216A_ADDR, vec![Register::MAIN_CTRL], vec![0x00]),
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x02]),
            // suspend fails at the standby write
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x00])
                .with_error(MockError::Io(ErrorKind::Other)),
            // detach
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x00]),
        ];
        let sensor = SharedLtrf216a::attach(i2c::Mock::new(&expectations)).unwrap();

        assert_eq!(
            sensor.suspend(),
            Err(Error::I2C(MockError::Io(ErrorKind::Other)))
        );

        // The handle stays usable after the report.
        let (mut mock, standby) = sensor.detach();
        standby.unwrap();
        mock.done(); // verify expectations
    }

    #[test]
    fn failed_detach_reports_and_still_returns_the_bus() {
        let expectations = [
            // attach
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::ALS_MEAS_RATE, 0x22]),
            i2c::Transaction::write_read(LTRF216A_ADDR, vec![Register::MAIN_CTRL], vec![0x00]),
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x02]),
            // detach fails at the standby write
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x00])
                .with_error(MockError::Io(ErrorKind::Other)),
        ];
        let sensor = SharedLtrf216a::attach(i2c::Mock::new(&expectations)).unwrap();

        let (mut mock, standby) = sensor.detach();
        assert_eq!(standby, Err(Error::I2C(MockError::Io(ErrorKind::Other))));
        mock.done(); // verify expectations
    }

    #[test]
    fn split_form_rejects_whole_seconds() {
        let expectations = [
            // attach
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::ALS_MEAS_RATE, 0x22]),
            i2c::Transaction::write_read(LTRF216A_ADDR, vec![Register::MAIN_CTRL], vec![0x00]),
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x02]),
            // detach
            i2c::Transaction::write(LTRF216A_ADDR, vec![Register::MAIN_CTRL, 0x00]),
        ];
        let sensor = SharedLtrf216a::attach(i2c::Mock::new(&expectations)).unwrap();

        assert_eq!(
            sensor.set_integration_time_parts(1, 0),
            Err(Error::InvalidIntegrationTime)
        );
        assert_eq!(sensor.integration_time_parts(), (0, 100_000));

        let (mut mock, standby) = sensor.detach();
        standby.unwrap();
        mock.done(); // verify expectations
    }

    /// A stub bus recording the target register of every transfer, so tests
    /// can check that multi-transfer operations are never interleaved.
    #[derive(Clone)]
    struct RecordingBus {
        log: Arc<std::sync::Mutex<Vec<u8>>>,
    }

    /// Tag for write transfers in the log; register addresses stay below it.
    const WRITE_FLAG: u8 = 0x80;

    impl embedded_hal::blocking::i2c::Write for RecordingBus {
        type Error = Infallible;

        fn write(&mut self, _address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
            self.log.lock().unwrap().push(WRITE_FLAG | bytes[0]);
            Ok(())
        }
    }

    impl embedded_hal::blocking::i2c::Read for RecordingBus {
        type Error = Infallible;

        fn read(&mut self, _address: u8, _buffer: &mut [u8]) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl embedded_hal::blocking::i2c::WriteRead for RecordingBus {
        type Error = Infallible;

        fn write_read(
            &mut self,
            _address: u8,
            bytes: &[u8],
            buffer: &mut [u8],
        ) -> Result<(), Self::Error> {
            self.log.lock().unwrap().push(bytes[0]);
            buffer.fill(0);
            Ok(())
        }
    }

    #[test]
    fn concurrent_reads_and_reconfiguration_never_interleave() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sensor = SharedLtrf216a::attach(RecordingBus {
            log: Arc::clone(&log),
        })
        .unwrap();
        log.lock().unwrap().clear(); // drop the attach traffic

        thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..64 {
                    sensor.read_channel(Channel::Als).unwrap();
                }
            });
            s.spawn(|| {
                for _ in 0..64 {
                    sensor.set_integration_time(IntegrationTime::Ms200).unwrap();
                }
            });
        });

        let events = log.lock().unwrap();
        assert_eq!(events.len(), 64 * 3 + 64);

        // Every sample read must occupy three consecutive transfers;
        // whatever is not part of a sample is a rate write.
        let mut samples = 0;
        let mut index = 0;
        while index < events.len() {
            if events[index] == Register::ALS_DATA_0 {
                assert_eq!(events[index + 1], Register::ALS_DATA_1);
                assert_eq!(events[index + 2], Register::ALS_DATA_2);
                samples += 1;
                index += 3;
            } else {
                assert_eq!(events[index], WRITE_FLAG | Register::ALS_MEAS_RATE);
                index += 1;
            }
        }
        assert_eq!(samples, 64);
    }
}
