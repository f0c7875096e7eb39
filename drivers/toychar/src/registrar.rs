//! Registration and teardown of the device set.
//!
//! Registration runs in a fixed order: reserve the number region, create the
//! class, then publish devices `0..N`. If any step fails everything done so
//! far is undone in reverse and the host is left exactly as it was found.
//! Teardown is the same unwinding at full scale and happens when the
//! [`Registry`] is dropped.

use alloc::{format, sync::Arc};

use kernel::{
    chrdev::{DeviceNumber, Region},
    fs::file_operations::FileOperations,
    registry::{NamespaceHandle, RegistryRef, ResourceRegistry},
    ThisModule,
};
use log::{debug, error, info};

use crate::{
    dispatch::ToyCharOps,
    error::RegistrationError,
    instance::{DeviceInstance, InstanceStore},
    CLASS_NAME, DEVICE_NAME, FIRST_MINOR,
};

/// A fully registered set of `N` devices.
///
/// # Invariants
///
/// While a `Registry` exists its region is reserved, its class exists, and
/// every instance in the store is published and bound to its handle.
pub struct Registry<const N: usize> {
    env: RegistryRef,
    region: Option<Region>,
    class: NamespaceHandle,
    store: Arc<InstanceStore<N>>,
}

impl<const N: usize> Registry<N> {
    /// Reserves numbers for `N` devices and publishes all of them under the
    /// class, owned by `owner`.
    ///
    /// On failure nothing stays registered with `env`.
    pub fn register_all(
        env: RegistryRef,
        owner: &'static ThisModule,
    ) -> Result<Self, RegistrationError> {
        let count = u32::try_from(N).map_err(|e| RegistrationError::ResourceExhausted(e.into()))?;
        let region = Region::reserve(&*env, FIRST_MINOR, count, DEVICE_NAME).map_err(|e| {
            error!("could not reserve {} device numbers: {:?}", N, e);
            RegistrationError::ResourceExhausted(e)
        })?;

        let class = match env.create_namespace(CLASS_NAME) {
            Ok(class) => class,
            Err(e) => {
                error!("could not create class {}: {:?}", CLASS_NAME, e);
                region.release(&*env);
                return Err(RegistrationError::ClassCreationFailed(e));
            }
        };

        let store = Arc::new(InstanceStore::<N>::new());
        let ops: Arc<dyn FileOperations> = Arc::new(ToyCharOps::new(store.clone()));
        for instance in store.iter() {
            if let Err(e) = publish_one(&*env, class, &region, &store, instance, &ops, owner) {
                error!("register_all: {}", e);
                rollback(&*env, class, &store, instance.index());
                region.release(&*env);
                return Err(e);
            }
        }

        info!(
            "registered {} {} devices at {}",
            N,
            DEVICE_NAME,
            region.base()
        );
        // INVARIANT: the region, the class and all `N` devices are registered.
        Ok(Registry {
            env,
            region: Some(region),
            class,
            store,
        })
    }

    /// Unpublishes every device, destroys the class and releases the region.
    pub fn unregister_all(self) {
        drop(self);
    }

    pub fn store(&self) -> &InstanceStore<N> {
        &self.store
    }

    pub fn class(&self) -> NamespaceHandle {
        self.class
    }

    /// First device number of the reserved region.
    pub fn base(&self) -> Option<DeviceNumber> {
        self.region.as_ref().map(Region::base)
    }
}

impl<const N: usize> Drop for Registry<N> {
    fn drop(&mut self) {
        // Each device goes by the handle it was published under.
        for instance in self.store.iter() {
            if let Some(handle) = instance.handle() {
                self.store.unbind(handle);
                self.env.unpublish(self.class, handle);
            }
        }
        self.env.destroy_namespace(self.class);
        if let Some(region) = self.region.take() {
            region.release(&*self.env);
        }
        info!("unregistered {} {} devices", N, DEVICE_NAME);
    }
}

fn publish_one<const N: usize>(
    env: &dyn ResourceRegistry,
    class: NamespaceHandle,
    region: &Region,
    store: &InstanceStore<N>,
    instance: &DeviceInstance,
    ops: &Arc<dyn FileOperations>,
    owner: &'static ThisModule,
) -> Result<(), RegistrationError> {
    let index = instance.index();
    let failed = |id, source| RegistrationError::DeviceCreationFailed { index, id, source };

    instance.init_data();
    let id = region.id(index).map_err(|e| failed(region.base(), e))?;
    let name = format!("{}{}", DEVICE_NAME, index);
    let handle = env
        .publish(class, id, &name, ops.clone(), owner)
        .map_err(|e| failed(id, e))?;
    store.bind(index, handle);
    debug!("published {} as {} ({:?})", name, id, handle);
    Ok(())
}

/// Undoes a registration that failed while publishing device `failed`.
///
/// Devices `failed - 1` down to `0` are unpublished, then the class is
/// destroyed. Device `failed` was never published.
fn rollback<const N: usize>(
    env: &dyn ResourceRegistry,
    class: NamespaceHandle,
    store: &InstanceStore<N>,
    failed: usize,
) {
    for index in (0..failed).rev() {
        if let Some(handle) = store.instance(index).and_then(|i| i.handle()) {
            store.unbind(handle);
            env.unpublish(class, handle);
        }
    }
    env.destroy_namespace(class);
}
