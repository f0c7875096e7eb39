//! Module framework for character device drivers.
//!
//! Drivers are written against the types here and never against the host
//! directly: numbers come from [`chrdev::Region`], devices are published
//! through a [`registry::ResourceRegistry`], and the host calls back through
//! [`fs::file_operations::FileOperations`].
#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod buf;
pub mod chrdev;
pub mod error;
pub mod fs;
pub mod logger;
pub mod module;
pub mod print;
pub mod registry;

pub use error::linux_err as code;
pub use module::{Module, ThisModule};
