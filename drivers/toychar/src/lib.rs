//! A sample character driver that registers several devices at once.
//!
//! Loading reserves one device number per device, creates the `toy` class
//! and publishes `toychar0` through `toychar3` under it, all sharing one
//! operations table. A failure at any point unwinds whatever was already
//! registered before the load hook returns.
#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod dispatch;
mod error;
pub mod instance;
mod registrar;

pub use error::RegistrationError;
use kernel::{error::KernelResult, registry::RegistryRef, Module, ThisModule};
pub use registrar::Registry;

/// Number of devices the module registers.
pub const TOYCHAR_DEVICES: usize = 4;
/// Region name and prefix of every device name.
pub const DEVICE_NAME: &str = "toychar";
/// Class the devices are published under.
pub const CLASS_NAME: &str = "toy";
pub const FIRST_MINOR: u32 = 0;

pub struct ToyChar {
    registry: Registry<TOYCHAR_DEVICES>,
}

impl ToyChar {
    pub fn registry(&self) -> &Registry<TOYCHAR_DEVICES> {
        &self.registry
    }
}

impl Module for ToyChar {
    fn init(module: &'static ThisModule, env: RegistryRef) -> KernelResult<Self> {
        kernel::logger::init_logger();
        let registry = Registry::register_all(env, module)?;
        Ok(ToyChar { registry })
    }
}

kernel::module! {
    type: ToyChar,
    name: "toychar",
    author: "Liam Ryan <liamryandev@gmail.com>",
    description: "Sample character driver which registers multiple devices",
    license: "GPL",
}
