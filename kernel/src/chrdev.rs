//! Character device numbers and number regions.
//!
//! A driver reserves one contiguous [`Region`] of device numbers up front and
//! derives every device's number from the region base.

use core::fmt;

use log::debug;

use crate::{
    code::EINVAL,
    error::KernelResult as Result,
    registry::ResourceRegistry,
};

pub const MINORBITS: u32 = 20;
pub const MINORMASK: u32 = (1 << MINORBITS) - 1;

/// A device number, `dev_t`: major in the high bits, minor in the low
/// [`MINORBITS`] bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceNumber(u32);

impl DeviceNumber {
    /// Equivalent to `MKDEV`. Minor bits above [`MINORMASK`] are dropped.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self((major << MINORBITS) | (minor & MINORMASK))
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u32 {
        self.0
    }

    pub const fn major(self) -> u32 {
        self.0 >> MINORBITS
    }

    pub const fn minor(self) -> u32 {
        self.0 & MINORMASK
    }

    /// Returns the device number `index` minors past this one.
    ///
    /// Fails with [`EINVAL`] if the minor would leave the minor space.
    pub fn offset(self, index: u32) -> Result<Self> {
        let minor = self
            .minor()
            .checked_add(index)
            .filter(|minor| *minor <= MINORMASK)
            .ok_or(EINVAL)?;
        Ok(Self::new(self.major(), minor))
    }
}

impl fmt::Debug for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceNumber({}:{})", self.major(), self.minor())
    }
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major(), self.minor())
    }
}

/// A reserved block of `count` consecutive device numbers.
///
/// # Invariants
///
/// While a `Region` exists all of its numbers are reserved with the registry
/// that handed it out. [`Region::release`] consumes the region, so a block is
/// returned exactly once.
#[must_use = "a region must be released back to the registry"]
#[derive(Debug)]
pub struct Region {
    base: DeviceNumber,
    count: u32,
    name: &'static str,
}

impl Region {
    /// Equivalent to `alloc_chrdev_region`.
    ///
    /// The registry picks the major; the block starts at `first_minor`.
    pub fn reserve(
        env: &dyn ResourceRegistry,
        first_minor: u32,
        count: u32,
        name: &'static str,
    ) -> Result<Self> {
        if count == 0 {
            return Err(EINVAL);
        }
        let base = env.reserve_identifier_block(first_minor, count, name)?;
        debug!("reserved {} device numbers at {} for {}", count, base, name);
        // INVARIANT: the registry reserved `count` numbers starting at `base`.
        Ok(Region { base, count, name })
    }

    pub fn base(&self) -> DeviceNumber {
        self.base
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Device number of the `index`-th device in the region, `base + index`.
    pub fn id(&self, index: usize) -> Result<DeviceNumber> {
        let index = u32::try_from(index)?;
        if index >= self.count {
            return Err(EINVAL);
        }
        self.base.offset(index)
    }

    /// Equivalent to `unregister_chrdev_region`.
    pub fn release(self, env: &dyn ResourceRegistry) {
        debug!("releasing {} device numbers at {}", self.count, self.base);
        env.release_identifier_block(self.base, self.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        code::{EBUSY, EINVAL},
        registry::mock::{Event, MockRegistry},
    };

    #[test]
    fn device_number_packing() {
        let dev = DeviceNumber::new(240, 3);
        assert_eq!(dev.major(), 240);
        assert_eq!(dev.minor(), 3);
        assert_eq!(dev.as_raw(), (240 << 20) | 3);
        assert_eq!(DeviceNumber::from_raw(dev.as_raw()), dev);
        assert_eq!(alloc::format!("{}", dev), "240:3");
    }

    #[test]
    fn offset_stays_in_minor_space() {
        let dev = DeviceNumber::new(10, MINORMASK - 1);
        assert_eq!(dev.offset(1).unwrap(), DeviceNumber::new(10, MINORMASK));
        assert_eq!(dev.offset(2), Err(EINVAL));
    }

    #[test]
    fn region_ids_are_base_plus_index() {
        let env = MockRegistry::new().with_major(250);
        let region = Region::reserve(&env, 0, 4, "toychar").unwrap();
        assert_eq!(region.base(), DeviceNumber::new(250, 0));
        assert_eq!(region.id(3).unwrap(), DeviceNumber::new(250, 3));
        assert_eq!(region.id(4), Err(EINVAL));
        region.release(&env);
        assert_eq!(
            env.events(),
            [
                Event::Reserve {
                    first_minor: 0,
                    count: 4,
                    name: "toychar".into()
                },
                Event::Release {
                    base: DeviceNumber::new(250, 0),
                    count: 4
                },
            ]
        );
        assert!(env.live_blocks().is_empty());
    }

    #[test]
    fn empty_region_never_reaches_registry() {
        let env = MockRegistry::new();
        assert_eq!(Region::reserve(&env, 0, 0, "toychar").unwrap_err(), EINVAL);
        assert!(env.events().is_empty());
    }

    #[test]
    fn reservation_failure_propagates() {
        let env = MockRegistry::new().fail_reservation(EBUSY);
        assert_eq!(Region::reserve(&env, 0, 4, "toychar").unwrap_err(), EBUSY);
        assert!(env.live_blocks().is_empty());
    }
}
