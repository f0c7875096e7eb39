//! An in-memory [`ResourceRegistry`] for driver tests.
//!
//! Every call is recorded as an [`Event`]. Failures can be injected into
//! reservation, namespace creation, or the `k`-th publish attempt, and the
//! published operations tables can be driven by handle the way the host routes
//! file calls.
//!
//! Misuse that a real host would turn into a corrupted device model (releasing
//! an unknown block, unpublishing an unknown device, destroying a namespace
//! that still holds devices) panics.

use alloc::{
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};

use hashbrown::HashMap;
use spin::Mutex;

use super::{InstanceHandle, NamespaceHandle, ResourceRegistry};
use crate::{
    buf::{UserSliceReader, UserSliceWriter},
    chrdev::DeviceNumber,
    code::{EEXIST, ENODEV},
    error::{Error, KernelResult as Result},
    fs::file_operations::{File, FileOperations, Offset, OpenFlags},
    module::ThisModule,
};

/// One call made against the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Reserve {
        first_minor: u32,
        count: u32,
        name: String,
    },
    Release {
        base: DeviceNumber,
        count: u32,
    },
    CreateNamespace {
        name: String,
    },
    DestroyNamespace(NamespaceHandle),
    Publish {
        id: DeviceNumber,
        name: String,
    },
    Unpublish(InstanceHandle),
}

struct Published {
    namespace: NamespaceHandle,
    id: DeviceNumber,
    name: String,
    ops: Arc<dyn FileOperations>,
    owner: &'static ThisModule,
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    blocks: Vec<(DeviceNumber, u32)>,
    namespaces: HashMap<NamespaceHandle, String>,
    instances: HashMap<InstanceHandle, Published>,
    next_namespace: usize,
    next_handle: u64,
    publish_attempts: usize,
}

pub struct MockRegistry {
    major: u32,
    remap_base: Option<u64>,
    fail_reservation: Option<Error>,
    fail_namespace: Option<Error>,
    fail_publish: Option<(usize, Error)>,
    state: Mutex<State>,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            major: 240,
            remap_base: None,
            fail_reservation: None,
            fail_namespace: None,
            fail_publish: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Major number handed out by reservations.
    pub fn with_major(mut self, major: u32) -> Self {
        self.major = major;
        self
    }

    /// Hand out instance handles counting up from `base` instead of reusing
    /// the device number.
    pub fn remap_handles(mut self, base: u64) -> Self {
        self.remap_base = Some(base);
        self
    }

    pub fn fail_reservation(mut self, err: Error) -> Self {
        self.fail_reservation = Some(err);
        self
    }

    pub fn fail_namespace(mut self, err: Error) -> Self {
        self.fail_namespace = Some(err);
        self
    }

    /// Fail the `attempt`-th publish call (0-based).
    pub fn fail_publish_at(mut self, attempt: usize, err: Error) -> Self {
        self.fail_publish = Some((attempt, err));
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    /// Blocks currently reserved, as `(base, count)`.
    pub fn live_blocks(&self) -> Vec<(DeviceNumber, u32)> {
        self.state.lock().blocks.clone()
    }

    pub fn live_namespaces(&self) -> Vec<String> {
        self.state.lock().namespaces.values().cloned().collect()
    }

    pub fn published_count(&self) -> usize {
        self.state.lock().instances.len()
    }

    /// Names of the published devices, ordered by device number.
    pub fn published_names(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut devices: Vec<_> = state.instances.values().collect();
        devices.sort_by_key(|p| p.id);
        devices.iter().map(|p| p.name.clone()).collect()
    }

    /// Handles of the published devices, ordered by device number.
    pub fn published_handles(&self) -> Vec<InstanceHandle> {
        let state = self.state.lock();
        let mut devices: Vec<_> = state.instances.iter().collect();
        devices.sort_by_key(|(_, p)| p.id);
        devices.iter().map(|(handle, _)| **handle).collect()
    }

    pub fn device_number(&self, handle: InstanceHandle) -> Option<DeviceNumber> {
        self.state.lock().instances.get(&handle).map(|p| p.id)
    }

    /// Name of the module that owns the device.
    pub fn owner_of(&self, handle: InstanceHandle) -> Option<&'static str> {
        self.state.lock().instances.get(&handle).map(|p| p.owner.name())
    }

    fn ops(&self, handle: InstanceHandle) -> Result<Arc<dyn FileOperations>> {
        self.state
            .lock()
            .instances
            .get(&handle)
            .map(|p| p.ops.clone())
            .ok_or(ENODEV)
    }

    pub fn open(&self, handle: InstanceHandle, flags: OpenFlags) -> Result {
        self.ops(handle)?.open(&File::new(handle, flags))
    }

    pub fn release(&self, handle: InstanceHandle) -> Result {
        self.ops(handle)?
            .release(&File::new(handle, OpenFlags::empty()))
    }

    pub fn read(
        &self,
        handle: InstanceHandle,
        buf: &mut [u8],
        pos: &mut Offset,
    ) -> Result<usize> {
        let ops = self.ops(handle)?;
        let mut writer = UserSliceWriter::new(buf);
        ops.read(&File::new(handle, OpenFlags::READ), &mut writer, pos)
    }

    pub fn write(
        &self,
        handle: InstanceHandle,
        data: &[u8],
        pos: &mut Offset,
    ) -> Result<usize> {
        let ops = self.ops(handle)?;
        let mut reader = UserSliceReader::new(data);
        ops.write(&File::new(handle, OpenFlags::WRITE), &mut reader, pos)
    }
}

impl ResourceRegistry for MockRegistry {
    fn reserve_identifier_block(
        &self,
        first_minor: u32,
        count: u32,
        name: &str,
    ) -> Result<DeviceNumber> {
        let mut state = self.state.lock();
        state.events.push(Event::Reserve {
            first_minor,
            count,
            name: name.to_string(),
        });
        if let Some(err) = self.fail_reservation {
            return Err(err);
        }
        let base = DeviceNumber::new(self.major, first_minor);
        state.blocks.push((base, count));
        Ok(base)
    }

    fn release_identifier_block(&self, base: DeviceNumber, count: u32) {
        let mut state = self.state.lock();
        state.events.push(Event::Release { base, count });
        let pos = state
            .blocks
            .iter()
            .position(|block| *block == (base, count));
        match pos {
            Some(pos) => {
                state.blocks.remove(pos);
            }
            None => panic!("release of unreserved block {}+{}", base, count),
        }
    }

    fn create_namespace(&self, name: &str) -> Result<NamespaceHandle> {
        let mut state = self.state.lock();
        state.events.push(Event::CreateNamespace {
            name: name.to_string(),
        });
        if let Some(err) = self.fail_namespace {
            return Err(err);
        }
        if state.namespaces.values().any(|existing| existing == name) {
            return Err(EEXIST);
        }
        let handle = NamespaceHandle::from_raw(state.next_namespace);
        state.next_namespace += 1;
        state.namespaces.insert(handle, name.to_string());
        Ok(handle)
    }

    fn destroy_namespace(&self, namespace: NamespaceHandle) {
        let mut state = self.state.lock();
        state.events.push(Event::DestroyNamespace(namespace));
        let remaining = state
            .instances
            .values()
            .filter(|p| p.namespace == namespace)
            .count();
        assert_eq!(remaining, 0, "namespace destroyed with devices still published");
        assert!(
            state.namespaces.remove(&namespace).is_some(),
            "destroy of unknown namespace {:?}",
            namespace
        );
    }

    fn publish(
        &self,
        namespace: NamespaceHandle,
        id: DeviceNumber,
        name: &str,
        ops: Arc<dyn FileOperations>,
        owner: &'static ThisModule,
    ) -> Result<InstanceHandle> {
        let mut state = self.state.lock();
        state.events.push(Event::Publish {
            id,
            name: name.to_string(),
        });
        let attempt = state.publish_attempts;
        state.publish_attempts += 1;
        if let Some((at, err)) = self.fail_publish {
            if at == attempt {
                return Err(err);
            }
        }
        if !state.namespaces.contains_key(&namespace) {
            return Err(ENODEV);
        }
        let duplicate = state
            .instances
            .values()
            .any(|p| p.namespace == namespace && (p.name == name || p.id == id));
        if duplicate {
            return Err(EEXIST);
        }
        let handle = match self.remap_base {
            Some(base) => {
                let handle = InstanceHandle::from_raw(base + state.next_handle);
                state.next_handle += 1;
                handle
            }
            None => InstanceHandle::from_raw(id.as_raw().into()),
        };
        state.instances.insert(
            handle,
            Published {
                namespace,
                id,
                name: name.to_string(),
                ops,
                owner,
            },
        );
        Ok(handle)
    }

    fn unpublish(&self, namespace: NamespaceHandle, handle: InstanceHandle) {
        let mut state = self.state.lock();
        state.events.push(Event::Unpublish(handle));
        match state.instances.get(&handle) {
            Some(p) if p.namespace == namespace => {
                state.instances.remove(&handle);
            }
            _ => panic!("unpublish of unknown device {:?}", handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{code::EINVAL, module::ModuleInfo};

    static OWNER: ThisModule = ThisModule::new(&ModuleInfo {
        name: "mock-tests",
        author: "",
        description: "",
        license: "GPL",
    });

    struct Fixed;

    impl FileOperations for Fixed {
        fn read(
            &self,
            _file: &File,
            buf: &mut UserSliceWriter<'_>,
            _offset: &mut Offset,
        ) -> Result<usize> {
            buf.write_slice(b"hi")?;
            Ok(2)
        }
    }

    #[test]
    fn publish_and_route_by_handle() {
        let env = MockRegistry::new().with_major(7);
        let ns = env.create_namespace("cls").unwrap();
        let id = DeviceNumber::new(7, 1);
        let handle = env.publish(ns, id, "dev1", Arc::new(Fixed), &OWNER).unwrap();
        assert_eq!(handle.as_raw(), u64::from(id.as_raw()));
        assert_eq!(env.owner_of(handle), Some("mock-tests"));

        let mut buf = [0u8; 4];
        let mut pos = 0;
        assert_eq!(env.read(handle, &mut buf, &mut pos), Ok(2));
        assert_eq!(&buf[..2], b"hi");
        assert_eq!(env.write(handle, b"x", &mut pos), Err(EINVAL));
        assert_eq!(env.open(InstanceHandle::from_raw(99), OpenFlags::READ), Err(ENODEV));

        env.unpublish(ns, handle);
        env.destroy_namespace(ns);
        assert!(env.live_namespaces().is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let env = MockRegistry::new();
        let ns = env.create_namespace("cls").unwrap();
        env.publish(ns, DeviceNumber::new(240, 0), "dev", Arc::new(Fixed), &OWNER)
            .unwrap();
        let again = env.publish(ns, DeviceNumber::new(240, 1), "dev", Arc::new(Fixed), &OWNER);
        assert_eq!(again, Err(EEXIST));
        assert_eq!(env.published_count(), 1);
    }

    #[test]
    fn remapped_handles_differ_from_ids() {
        let env = MockRegistry::new().remap_handles(1000);
        let ns = env.create_namespace("cls").unwrap();
        let a = env
            .publish(ns, DeviceNumber::new(240, 0), "a", Arc::new(Fixed), &OWNER)
            .unwrap();
        let b = env
            .publish(ns, DeviceNumber::new(240, 1), "b", Arc::new(Fixed), &OWNER)
            .unwrap();
        assert_eq!((a.as_raw(), b.as_raw()), (1000u64, 1001u64));
        assert_eq!(env.published_handles(), [a, b]);
    }

    #[test]
    #[should_panic(expected = "still published")]
    fn destroying_busy_namespace_panics() {
        let env = MockRegistry::new();
        let ns = env.create_namespace("cls").unwrap();
        env.publish(ns, DeviceNumber::new(240, 0), "a", Arc::new(Fixed), &OWNER)
            .unwrap();
        env.destroy_namespace(ns);
    }
}
