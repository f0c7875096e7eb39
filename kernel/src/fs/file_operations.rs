//! File operations.
//!
//! A driver binds one [`FileOperations`] table to every device it publishes.
//! The host calls back into the table with the [`File`] being operated on,
//! which carries the handle the device was published under.

use bitflags::bitflags;

use crate::{
    buf::{UserSliceReader, UserSliceWriter},
    code::EINVAL,
    error::KernelResult as Result,
    registry::InstanceHandle,
};

/// File position, `loff_t`.
pub type Offset = i64;

bitflags! {
    /// Mode the file was opened with.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const APPEND = 1 << 2;
        const NONBLOCK = 1 << 3;
    }
}

/// An open file on a published device.
#[derive(Clone, Copy, Debug)]
pub struct File {
    handle: InstanceHandle,
    flags: OpenFlags,
}

impl File {
    pub fn new(handle: InstanceHandle, flags: OpenFlags) -> Self {
        Self { handle, flags }
    }

    /// Handle of the device this file was opened on.
    pub fn handle(&self) -> InstanceHandle {
        self.handle
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }
}

/// Corresponds to the kernel's `struct file_operations`.
///
/// Open and release succeed unless overridden; read and write fail with
/// [`EINVAL`].
pub trait FileOperations: Send + Sync {
    fn open(&self, _file: &File) -> Result {
        Ok(())
    }

    fn release(&self, _file: &File) -> Result {
        Ok(())
    }

    /// Reads data from the device into `buf`, starting at `offset`.
    ///
    /// Returns the transfer size reported to the caller.
    fn read(
        &self,
        _file: &File,
        _buf: &mut UserSliceWriter<'_>,
        _offset: &mut Offset,
    ) -> Result<usize> {
        Err(EINVAL)
    }

    /// Writes the data in `buf` to the device, starting at `offset`.
    fn write(
        &self,
        _file: &File,
        _buf: &mut UserSliceReader<'_>,
        _offset: &mut Offset,
    ) -> Result<usize> {
        Err(EINVAL)
    }
}
