//! The operations table shared by every toychar device.

use alloc::sync::Arc;

use kernel::{
    buf::{UserSliceReader, UserSliceWriter},
    error::KernelResult as Result,
    fs::file_operations::{File, FileOperations, Offset},
};
use log::debug;

use crate::instance::InstanceStore;

/// One table, bound to all `N` devices at publish time. Each call finds its
/// device through the handle carried by the [`File`].
pub struct ToyCharOps<const N: usize> {
    store: Arc<InstanceStore<N>>,
}

impl<const N: usize> ToyCharOps<N> {
    pub fn new(store: Arc<InstanceStore<N>>) -> Self {
        Self { store }
    }
}

impl<const N: usize> FileOperations for ToyCharOps<N> {
    fn open(&self, file: &File) -> Result {
        debug!("open {:?} ({:?})", file.handle(), file.flags());
        Ok(())
    }

    fn release(&self, file: &File) -> Result {
        debug!("release {:?}", file.handle());
        Ok(())
    }

    // Nothing is copied in either direction. Both report the size of the
    // whole instance store regardless of the requested length or offset.
    fn read(
        &self,
        file: &File,
        buf: &mut UserSliceWriter<'_>,
        offset: &mut Offset,
    ) -> Result<usize> {
        let instance = self.store.resolve(file.handle())?;
        debug!(
            "read toychar{}: {} bytes at {}",
            instance.index(),
            buf.len(),
            offset
        );
        Ok(InstanceStore::<N>::REPORTED_SIZE)
    }

    fn write(
        &self,
        file: &File,
        buf: &mut UserSliceReader<'_>,
        offset: &mut Offset,
    ) -> Result<usize> {
        let instance = self.store.resolve(file.handle())?;
        debug!(
            "write toychar{}: {} bytes at {}",
            instance.index(),
            buf.len(),
            offset
        );
        Ok(InstanceStore::<N>::REPORTED_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use kernel::{
        code::ENODEV,
        fs::file_operations::OpenFlags,
        registry::InstanceHandle,
    };

    use super::*;
    use crate::instance::tag;

    fn published_store() -> Arc<InstanceStore<4>> {
        let store = Arc::new(InstanceStore::<4>::new());
        for i in 0..4 {
            store.instance(i).unwrap().init_data();
            store.bind(i, InstanceHandle::from_raw(100 + i as u64));
        }
        store
    }

    #[test]
    fn open_and_release_always_succeed() {
        let ops = ToyCharOps::new(published_store());
        let file = File::new(InstanceHandle::from_raw(9999), OpenFlags::READ);
        assert!(ops.open(&file).is_ok());
        assert!(ops.release(&file).is_ok());
    }

    #[test]
    fn read_reports_store_size_and_copies_nothing() {
        let ops = ToyCharOps::new(published_store());
        let file = File::new(InstanceHandle::from_raw(102), OpenFlags::READ);
        for (len, start) in [(0usize, 0i64), (1, 0), (64, 17), (4096, -3)] {
            let mut dst = alloc::vec![0xaau8; len];
            let mut offset = start;
            let mut writer = UserSliceWriter::new(&mut dst);
            let n = ops.read(&file, &mut writer, &mut offset).unwrap();
            assert_eq!(n, InstanceStore::<4>::REPORTED_SIZE);
            assert_eq!(writer.written(), 0);
            assert_eq!(offset, start);
            assert!(dst.iter().all(|b| *b == 0xaa));
        }
    }

    #[test]
    fn write_leaves_buffer_untouched() {
        let store = published_store();
        let ops = ToyCharOps::new(store.clone());
        let file = File::new(InstanceHandle::from_raw(101), OpenFlags::WRITE);
        let mut offset = 0;
        let mut reader = UserSliceReader::new(b"overwrite me please");
        let n = ops.write(&file, &mut reader, &mut offset).unwrap();
        assert_eq!(n, InstanceStore::<4>::REPORTED_SIZE);
        assert_eq!(store.instance(1).unwrap().data(), tag(1));
    }

    #[test]
    fn unknown_handle_is_rejected() {
        let ops = ToyCharOps::new(published_store());
        let file = File::new(InstanceHandle::from_raw(5), OpenFlags::READ);
        let mut dst = [0u8; 8];
        let mut writer = UserSliceWriter::new(&mut dst);
        assert_eq!(ops.read(&file, &mut writer, &mut 0).err(), Some(ENODEV));
    }
}
