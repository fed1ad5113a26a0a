use std::fmt::{self, Display, Formatter};

/// Number of bits the kernel reserves for the minor number in its internal
/// `dev_t` encoding.
const MINOR_BITS: u32 = 20;
const MINOR_MASK: u32 = (1 << MINOR_BITS) - 1;

/// A block device identifier, encoded the way the block layer reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Combine a `(major, minor)` pair into a device identifier.
    pub const fn new(major: u32, minor: u32) -> Self {
        DeviceId((major << MINOR_BITS) | (minor & MINOR_MASK))
    }

    /// Wrap an already-encoded identifier.
    pub const fn from_raw(raw: u32) -> Self {
        DeviceId(raw)
    }

    /// The encoded value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The major number, usually naming the driver.
    pub const fn major(self) -> u32 {
        self.0 >> MINOR_BITS
    }

    /// The minor number.
    pub const fn minor(self) -> u32 {
        self.0 & MINOR_MASK
    }
}

impl From<u32> for DeviceId {
    fn from(raw: u32) -> Self {
        DeviceId::from_raw(raw)
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.major(), self.minor())
    }
}
