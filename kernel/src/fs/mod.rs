//! File-level interfaces exposed to drivers.

pub mod file_operations;
