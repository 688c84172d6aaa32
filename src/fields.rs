/// ALS integration time, i.e. how long light is accumulated for one
/// conversion. Longer integration also means higher ADC resolution, from
/// 16 bits at 25 ms up to 20 bits at 400 ms.
#[derive(Debug, Clone, Copy, PartialEq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntegrationTime {
    Ms400 = 0x00,
    Ms200 = 0x01,
    Ms100 = 0x02,
    Ms50 = 0x03,
    Ms25 = 0x04,
}

impl IntegrationTime {
    /// Every supported integration time, longest first.
    pub const ALL: [IntegrationTime; 5] = [
        IntegrationTime::Ms400,
        IntegrationTime::Ms200,
        IntegrationTime::Ms100,
        IntegrationTime::Ms50,
        IntegrationTime::Ms25,
    ];

    /// Looks up the setting matching an exact conversion duration in
    /// microseconds. Durations the hardware cannot do return `None`.
    pub fn from_us(us: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|itime| itime.as_us() == us)
    }

    /// Duration of one conversion in microseconds.
    pub const fn as_us(self) -> u32 {
        match self {
            IntegrationTime::Ms400 => 400_000,
            IntegrationTime::Ms200 => 200_000,
            IntegrationTime::Ms100 => 100_000,
            IntegrationTime::Ms50 => 50_000,
            IntegrationTime::Ms25 => 25_000,
        }
    }

    /// Measurement rate programmed together with each integration time:
    /// back-to-back conversions for the two long settings, 100 ms otherwise.
    pub(crate) fn repeat_rate(self) -> MeasurementRate {
        match self {
            IntegrationTime::Ms400 | IntegrationTime::Ms200 => MeasurementRate::Ms200,
            _ => MeasurementRate::Ms100,
        }
    }
}

impl Default for IntegrationTime {
    /// Power-on default of the sensor.
    fn default() -> Self {
        IntegrationTime::Ms100
    }
}

impl From<IntegrationTime> for f32 {
    fn from(itime: IntegrationTime) -> f32 {
        // Conversion-time factor relative to the 100 ms default, as used by
        // the datasheet lux formula.
        match itime {
            IntegrationTime::Ms400 => 4.0,
            IntegrationTime::Ms200 => 2.0,
            IntegrationTime::Ms100 => 1.0,
            IntegrationTime::Ms50 => 0.5,
            IntegrationTime::Ms25 => 0.25,
        }
    }
}

/// ALS measurement rate, i.e. the pause between the starts of two
/// consecutive conversions. A rate shorter than the integration time is
/// stretched by the hardware to the integration time itself.
#[derive(Debug, Clone, Copy, PartialEq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementRate {
    Ms25 = 0x00,
    Ms50 = 0x01,
    Ms100 = 0x02,
    Ms200 = 0x03,
    Ms500 = 0x04,
    Ms1000 = 0x05,
    Ms2000 = 0x06,
}

#[derive(Debug, Clone, Copy, PartialEq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataStatus {
    Old = 0x00,
    New = 0x01,
}

#[derive(Debug, Clone, Copy, PartialEq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntStatus {
    Inactive = 0x00,
    Active = 0x01,
}

/// Sticky power-cycle flag. Reads `PowerCycled` after a supply glitch or a
/// software reset, meaning the configuration registers are back at their
/// defaults; cleared by the read itself.
#[derive(Debug, Clone, Copy, PartialEq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerStatus {
    Normal = 0x00,
    PowerCycled = 0x01,
}
