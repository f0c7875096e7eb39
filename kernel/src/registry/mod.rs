//! The host side of device registration.
//!
//! A driver never talks to the device model directly. Everything it publishes
//! goes through a [`ResourceRegistry`]: device number blocks, the class
//! namespace its devices live in, and the devices themselves.

use alloc::sync::Arc;

use crate::{
    chrdev::DeviceNumber, error::KernelResult as Result, fs::file_operations::FileOperations,
    module::ThisModule,
};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// Shared reference to the host registry, as handed to a module at load time.
pub type RegistryRef = Arc<dyn ResourceRegistry>;

/// A class namespace created by [`ResourceRegistry::create_namespace`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NamespaceHandle(usize);

impl NamespaceHandle {
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> usize {
        self.0
    }
}

/// The token the host uses to route file operations back to a published
/// device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceHandle(u64);

impl InstanceHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

/// Operations the host offers for publishing named devices.
///
/// Teardown calls return nothing: the host accepts them unconditionally.
pub trait ResourceRegistry: Send + Sync {
    /// Equivalent to `alloc_chrdev_region`. Returns the first number of the block.
    fn reserve_identifier_block(
        &self,
        first_minor: u32,
        count: u32,
        name: &str,
    ) -> Result<DeviceNumber>;

    /// Equivalent to `unregister_chrdev_region`.
    fn release_identifier_block(&self, base: DeviceNumber, count: u32);

    /// Equivalent to `class_create`.
    fn create_namespace(&self, name: &str) -> Result<NamespaceHandle>;

    /// Equivalent to `class_destroy`.
    fn destroy_namespace(&self, namespace: NamespaceHandle);

    /// Adds the device `id` under `name` and binds `ops` to it
    /// (`cdev_add` followed by `device_create`).
    ///
    /// Every call the host later routes to the device carries the returned
    /// handle.
    fn publish(
        &self,
        namespace: NamespaceHandle,
        id: DeviceNumber,
        name: &str,
        ops: Arc<dyn FileOperations>,
        owner: &'static ThisModule,
    ) -> Result<InstanceHandle>;

    /// Equivalent to `device_destroy`.
    fn unpublish(&self, namespace: NamespaceHandle, handle: InstanceHandle);
}
