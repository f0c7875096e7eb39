//! Device instances and the store that owns them.

use core::fmt::{self, Write};

use hashbrown::HashMap;
use kernel::{code::ENODEV, error::KernelResult as Result, registry::InstanceHandle};
use spin::{Mutex, Once, RwLock};

use crate::DEVICE_NAME;

/// Size of each instance's private buffer.
pub const DATA_SIZE: usize = 32;

/// One character device.
///
/// The handle is recorded once, when the device is published. The buffer is
/// locked so concurrent callers on the same device are serialized.
pub struct DeviceInstance {
    index: usize,
    handle: Once<InstanceHandle>,
    data: Mutex<[u8; DATA_SIZE]>,
}

impl DeviceInstance {
    fn new(index: usize) -> Self {
        Self {
            index,
            handle: Once::new(),
            data: Mutex::new([0; DATA_SIZE]),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Handle the device was published under, if it was ever published.
    pub fn handle(&self) -> Option<InstanceHandle> {
        self.handle.get().copied()
    }

    /// Snapshot of the private buffer.
    pub fn data(&self) -> [u8; DATA_SIZE] {
        *self.data.lock()
    }

    /// Fills the buffer with this instance's tag, NUL padded.
    pub(crate) fn init_data(&self) {
        *self.data.lock() = tag(self.index);
    }
}

/// The initial buffer content of instance `index`: `"toychar device <index>"`.
pub fn tag(index: usize) -> [u8; DATA_SIZE] {
    let mut out = TagWriter {
        buf: [0; DATA_SIZE],
        pos: 0,
    };
    // The writer truncates instead of failing.
    let _ = write!(out, "{} device {}", DEVICE_NAME, index);
    out.buf
}

struct TagWriter {
    buf: [u8; DATA_SIZE],
    pos: usize,
}

impl fmt::Write for TagWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Keep the last byte as a terminator.
        let room = DATA_SIZE - 1 - self.pos;
        let len = core::cmp::min(room, s.len());
        self.buf[self.pos..self.pos + len].copy_from_slice(&s.as_bytes()[..len]);
        self.pos += len;
        Ok(())
    }
}

/// Fixed set of `N` instances plus the handle lookup the dispatch table uses.
pub struct InstanceStore<const N: usize> {
    instances: [DeviceInstance; N],
    by_handle: RwLock<HashMap<InstanceHandle, usize>>,
}

impl<const N: usize> InstanceStore<N> {
    /// Transfer size reported by read and write: the size of the whole store
    /// of instances, not of one buffer.
    pub const REPORTED_SIZE: usize = core::mem::size_of::<[DeviceInstance; N]>();

    pub fn new() -> Self {
        Self {
            instances: core::array::from_fn(DeviceInstance::new),
            by_handle: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn instance(&self, index: usize) -> Option<&DeviceInstance> {
        self.instances.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceInstance> {
        self.instances.iter()
    }

    /// Records `handle` for instance `index` and makes it resolvable.
    pub(crate) fn bind(&self, index: usize, handle: InstanceHandle) {
        self.instances[index].handle.call_once(|| handle);
        self.by_handle.write().insert(handle, index);
    }

    /// Stops routing `handle`. The instance keeps its recorded handle.
    pub(crate) fn unbind(&self, handle: InstanceHandle) {
        self.by_handle.write().remove(&handle);
    }

    /// Finds the instance a published handle belongs to.
    pub fn resolve(&self, handle: InstanceHandle) -> Result<&DeviceInstance> {
        let index = *self.by_handle.read().get(&handle).ok_or(ENODEV)?;
        Ok(&self.instances[index])
    }

    /// Number of instances currently reachable through a handle.
    pub fn bound(&self) -> usize {
        self.by_handle.read().len()
    }
}

impl<const N: usize> Default for InstanceStore<N> {
    fn default() -> Self {
        Self::new()
    }
}
