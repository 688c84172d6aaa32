extern crate num as num_renamed;
use crate::create_register;
use crate::fields::*;
use num_renamed::FromPrimitive;
use num_renamed::ToPrimitive;
use paste::paste;

pub mod helpers {
    #[inline]
    pub fn get_mask(start_index: u8, width: u8) -> u8 {
        ((1u8 << width) - 1u8) << start_index
    }
}

/// Register definitions
pub struct Register;
impl Register {
    pub const MAIN_CTRL: u8 = 0x00;
    pub const ALS_MEAS_RATE: u8 = 0x04;
    pub const ALS_GAIN: u8 = 0x05;
    pub const PART_ID: u8 = 0x06;
    pub const MAIN_STATUS: u8 = 0x07;
    pub const CLEAR_DATA_0: u8 = 0x0A;
    pub const CLEAR_DATA_1: u8 = 0x0B;
    pub const CLEAR_DATA_2: u8 = 0x0C;
    pub const ALS_DATA_0: u8 = 0x0D;
    pub const ALS_DATA_1: u8 = 0x0E;
    pub const ALS_DATA_2: u8 = 0x0F;
    pub const INT_CFG: u8 = 0x19;
    pub const INT_PST: u8 = 0x1A;
    pub const ALS_THRES_UP_0: u8 = 0x21;
    pub const ALS_THRES_UP_1: u8 = 0x22;
    pub const ALS_THRES_UP_2: u8 = 0x23;
    pub const ALS_THRES_LOW_0: u8 = 0x24;
    pub const ALS_THRES_LOW_1: u8 = 0x25;
    pub const ALS_THRES_LOW_2: u8 = 0x26;
}

/// MAIN_CTRL bit masks.
///
/// Enabling the sensor is a read-modify-write that must preserve the other
/// control bits, so MAIN_CTRL is manipulated through raw masks rather than
/// a typed register structure.
pub struct MainCtrl;
impl MainCtrl {
    pub const ALS_ENABLE: u8 = 0x02;
    pub const SW_RESET: u8 = 0x10;
}

// General Field structure used by registers
pub struct Field<T> {
    pub start_index: u8,
    pub width: u8,
    pub value: T,
}

impl<T> Field<T>
where
    T: ToPrimitive,
{
    pub fn bits(self) -> u8 {
        // First create a mask of N '1' bits to be used to truncate the value
        // The algorithm: ((1 << length) - 1) << pos
        let mask: u8 = self::helpers::get_mask(self.start_index, self.width);

        let val: u8 = num_renamed::ToPrimitive::to_u8(&self.value).unwrap();
        let tmp: u8 = (val << self.start_index) & mask;
        tmp
    }
}

/// Defines a standard structure for a 8-bit register.
///
/// This macro takes `StructName, {structfield1: type1, structfield2: type2, ...}` as arguments
/// and generates a structure:
///
/// ```compile_fail
/// struct StructName {
///     structfield1: Field<type1>,
///     structfield2: Field<type2>,
///     ...
/// }
/// ```
///
/// The structure will have automatic `with_structfieldX()` factory methods created, as well
/// as a `value()` function that returns the encoded u8 data.
///
/// The `decode StructName` form additionally generates a `From<u8>`
/// implementation. Only registers whose fields map every bit pattern of
/// their window to an enum variant can use it: decoding an unmapped
/// pattern panics. Registers with reserved patterns, like the measurement
/// rate's 0b111, stay write-only.
#[macro_export]
macro_rules! create_register {
    (decode $reg_name:ident, {$($element: ident: $ty: ty),*}) => {
        $crate::create_register!($reg_name, {$($element: $ty),*});

        paste! {
            // Creates a From<u8> implementation for this register
            impl From<u8> for $reg_name {
                fn from(val: u8) -> Self {
                    let new_reg = $reg_name::default();

                    $(
                        let [<$element _mask>] = self::helpers::get_mask(new_reg.$element.start_index, new_reg.$element.width);
                        let [<$element _val>] = FromPrimitive::from_u8( (val & [<$element _mask>]) >> new_reg.$element.start_index ).unwrap();
                        let new_reg = new_reg.[<with_ $element>]([<$element _val>]);
                    )*

                    new_reg
                }
            }
        }
    };

    ($reg_name:ident, {$($element: ident: $ty: ty),*}) => {
        pub struct $reg_name { $(pub $element: Field<$ty>),* }

        paste! {
            impl $reg_name {
                pub fn value(self) -> u8 {
                    let mut temp: u8 = 0x00;
                    $(
                        temp |= self.$element.bits();
                    )*
                    temp
                }

            // Creates with_<variable> methods
            $(
                pub fn [<with_ $element>] (self, [<new_ $element>]: $ty) -> Self {
                    let mut tmp = $reg_name{..self};
                    tmp.$element.value = [<new_ $element>];
                    tmp
                }
            )*
            }
        }
    }
}

create_register!(MeasRateRegister, {measurement_rate: MeasurementRate, integration_time: IntegrationTime});

impl Default for MeasRateRegister {
    /// Power-on contents: 100 ms integration time, 100 ms measurement rate.
    fn default() -> Self {
        MeasRateRegister {
            measurement_rate: Field {
                start_index: 0,
                width: 3,
                value: MeasurementRate::Ms100,
            },
            integration_time: Field {
                start_index: 4,
                width: 3,
                value: IntegrationTime::Ms100,
            },
        }
    }
}

create_register!(decode MainStatusRegister, {data_status: DataStatus, int_status: IntStatus, power_status: PowerStatus});

impl Default for MainStatusRegister {
    fn default() -> Self {
        MainStatusRegister {
            data_status: Field {
                start_index: 3,
                width: 1,
                value: DataStatus::Old,
            },
            int_status: Field {
                start_index: 4,
                width: 1,
                value: IntStatus::Inactive,
            },
            power_status: Field {
                start_index: 5,
                width: 1,
                value: PowerStatus::Normal,
            },
        }
    }
}
