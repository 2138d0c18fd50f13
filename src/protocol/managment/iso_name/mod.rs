//! ISO 11783 NAME field (64 bits). The gateway advertises its
//! [`DeviceInformation`](crate::config::DeviceInformation) through this value
//! and compares NAMEs to arbitrate address conflicts: the lower NAME keeps
//! the address.
//!
//! # Bit layout (Little Endian order)
//!
//! ```text
//! Bits  0-20  (21 bits) : Unique number
//! Bits 21-31  (11 bits) : Manufacturer code
//! Bits 32-39  ( 8 bits) : Device instance (lower 3 + upper 5)
//! Bits 40-47  ( 8 bits) : Device function
//! Bit  48     ( 1 bit ) : Reserved
//! Bits 49-55  ( 7 bits) : Device class
//! Bits 56-59  ( 4 bits) : System instance
//! Bits 60-62  ( 3 bits) : Industry group
//! Bit  63     ( 1 bit ) : Arbitrary Address Capable
//! ```
use core::fmt;

use crate::error::ExtractionError;

const UNIQUE_NUMBER: (u32, u64) = (0, 0x1F_FFFF);
const MANUFACTURER_CODE: (u32, u64) = (21, 0x7FF);
const DEVICE_INSTANCE: (u32, u64) = (32, 0xFF);
const DEVICE_FUNCTION: (u32, u64) = (40, 0xFF);
const DEVICE_CLASS: (u32, u64) = (49, 0x7F);
const SYSTEM_INSTANCE: (u32, u64) = (56, 0x0F);
const INDUSTRY_GROUP: (u32, u64) = (60, 0x07);
const ARBITRARY_ADDRESS: (u32, u64) = (63, 0x01);

#[inline]
const fn get(raw: u64, (shift, mask): (u32, u64)) -> u64 {
    (raw >> shift) & mask
}

#[inline]
const fn set(raw: u64, (shift, mask): (u32, u64), value: u64) -> u64 {
    (raw & !(mask << shift)) | ((value & mask) << shift)
}

/// Wrapper around the ISO 11783 NAME field (64 bits).
///
/// # Example
///
/// ```
/// use korri_gateway::protocol::managment::iso_name::IsoName;
///
/// let name = IsoName::builder()
///     .unique_number(1)
///     .manufacturer_code(2046)
///     .device_function(130) // PC gateway
///     .device_class(25)     // Inter/Intranetwork Device
///     .industry_group(4)
///     .arbitrary_address_capable(true)
///     .build();
///
/// assert_eq!(name.device_function(), 130);
/// assert!(name.is_marine());
/// assert!(name.is_arbitrary_address_capable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IsoName(u64);

impl IsoName {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn builder() -> IsoNameBuilder {
        IsoNameBuilder::new()
    }

    /// Unique number (bits 0-20), typically a serial number.
    #[inline]
    pub const fn unique_number(&self) -> u32 {
        get(self.0, UNIQUE_NUMBER) as u32
    }

    #[inline]
    pub const fn manufacturer_code(&self) -> u16 {
        get(self.0, MANUFACTURER_CODE) as u16
    }

    #[inline]
    pub const fn device_instance(&self) -> u8 {
        get(self.0, DEVICE_INSTANCE) as u8
    }

    #[inline]
    pub const fn device_function(&self) -> u8 {
        get(self.0, DEVICE_FUNCTION) as u8
    }

    #[inline]
    pub const fn device_class(&self) -> u8 {
        get(self.0, DEVICE_CLASS) as u8
    }

    #[inline]
    pub const fn system_instance(&self) -> u8 {
        get(self.0, SYSTEM_INSTANCE) as u8
    }

    #[inline]
    pub const fn industry_group(&self) -> u8 {
        get(self.0, INDUSTRY_GROUP) as u8
    }

    /// Bit 63: the node may fall back to the 128-247 address range.
    #[inline]
    pub const fn is_arbitrary_address_capable(&self) -> bool {
        get(self.0, ARBITRARY_ADDRESS) == 1
    }

    #[inline]
    pub const fn is_marine(&self) -> bool {
        self.industry_group() == 4
    }

    /// Eight-byte payload of an address claim (PGN 60928).
    #[inline]
    pub const fn to_claim_payload(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// Read the NAME out of an address claim payload.
    pub fn from_claim_payload(data: &[u8]) -> Result<Self, ExtractionError> {
        let bytes: [u8; 8] = data
            .try_into()
            .map_err(|_| ExtractionError::InvalidDataLen)?;
        Ok(Self(u64::from_le_bytes(bytes)))
    }

    /// Address arbitration: `true` when `self` keeps a contested address.
    #[inline]
    pub const fn wins_against(&self, other: IsoName) -> bool {
        self.0 < other.0
    }
}

impl From<u64> for IsoName {
    #[inline]
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for IsoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IsoName {{ unique: {}, mfg: {}, func: {}, class: {}, inst: {}, aac: {} }}",
            self.unique_number(),
            self.manufacturer_code(),
            self.device_function(),
            self.device_class(),
            self.device_instance(),
            self.is_arbitrary_address_capable()
        )
    }
}

/// Fluent `const` builder for [`IsoName`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoNameBuilder {
    raw: u64,
}

impl IsoNameBuilder {
    #[inline]
    pub const fn new() -> Self {
        Self { raw: 0 }
    }

    /// # Panics
    /// Panics when the value does not fit in 21 bits.
    #[inline]
    pub const fn unique_number(mut self, value: u32) -> Self {
        assert!(value <= 0x1F_FFFF, "Unique number must fit in 21 bits");
        self.raw = set(self.raw, UNIQUE_NUMBER, value as u64);
        self
    }

    /// # Panics
    /// Panics when the value does not fit in 11 bits.
    #[inline]
    pub const fn manufacturer_code(mut self, value: u16) -> Self {
        assert!(value <= 0x7FF, "Manufacturer code must fit in 11 bits");
        self.raw = set(self.raw, MANUFACTURER_CODE, value as u64);
        self
    }

    #[inline]
    pub const fn device_instance(mut self, value: u8) -> Self {
        self.raw = set(self.raw, DEVICE_INSTANCE, value as u64);
        self
    }

    #[inline]
    pub const fn device_function(mut self, value: u8) -> Self {
        self.raw = set(self.raw, DEVICE_FUNCTION, value as u64);
        self
    }

    /// # Panics
    /// Panics when the value does not fit in 7 bits.
    #[inline]
    pub const fn device_class(mut self, value: u8) -> Self {
        assert!(value <= 0x7F, "Device class must fit in 7 bits");
        self.raw = set(self.raw, DEVICE_CLASS, value as u64);
        self
    }

    /// # Panics
    /// Panics when the value does not fit in 4 bits.
    #[inline]
    pub const fn system_instance(mut self, value: u8) -> Self {
        assert!(value <= 0x0F, "System instance must fit in 4 bits");
        self.raw = set(self.raw, SYSTEM_INSTANCE, value as u64);
        self
    }

    /// # Panics
    /// Panics when the value does not fit in 3 bits.
    #[inline]
    pub const fn industry_group(mut self, value: u8) -> Self {
        assert!(value <= 0x07, "Industry group must fit in 3 bits");
        self.raw = set(self.raw, INDUSTRY_GROUP, value as u64);
        self
    }

    #[inline]
    pub const fn arbitrary_address_capable(mut self, value: bool) -> Self {
        self.raw = set(self.raw, ARBITRARY_ADDRESS, value as u64);
        self
    }

    #[inline]
    pub const fn build(self) -> IsoName {
        IsoName(self.raw)
    }
}
