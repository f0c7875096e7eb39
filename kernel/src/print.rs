//! Printing facilities.
//!
//! Messages are formatted into a bounded line buffer and handed to the
//! installed [`Console`]. Until a console is installed output is discarded.

use core::{cmp, fmt};

use spin::Once;

/// Console log levels, `KERN_EMERG` through `KERN_DEBUG`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum KernLevel {
    Emerg = 0,
    Alert = 1,
    Crit = 2,
    Err = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

/// A sink for formatted log lines.
pub trait Console: Send + Sync {
    fn write_line(&self, level: KernLevel, line: &str);
}

static CONSOLE: Once<&'static dyn Console> = Once::new();

/// Installs the console used by [`printk`].
///
/// Returns `false` if a console was already installed; the first one stays.
pub fn set_console(console: &'static dyn Console) -> bool {
    let mut installed = false;
    CONSOLE.call_once(|| {
        installed = true;
        console
    });
    installed
}

#[doc(hidden)]
pub fn printk(level: KernLevel, s: &[u8]) {
    let Some(console) = CONSOLE.get() else {
        return;
    };
    console.write_line(level, valid_prefix(s));
}

// The line writer truncates on a byte boundary, drop a split character.
fn valid_prefix(s: &[u8]) -> &str {
    match core::str::from_utf8(s) {
        Ok(line) => line,
        Err(e) => core::str::from_utf8(&s[..e.valid_up_to()]).unwrap_or_default(),
    }
}

#[doc(hidden)]
pub fn call_printk(level: KernLevel, args: fmt::Arguments<'_>) {
    let mut writer = LogLineWriter::new();
    let _ = fmt::write(&mut writer, args);
    printk(level, writer.as_bytes());
}

// From kernel/print/printk.c
const LOG_LINE_MAX: usize = 1024 - 32;

#[doc(hidden)]
pub struct LogLineWriter {
    data: [u8; LOG_LINE_MAX],
    pos: usize,
}

#[allow(clippy::new_without_default)]
impl LogLineWriter {
    pub fn new() -> LogLineWriter {
        LogLineWriter {
            data: [0u8; LOG_LINE_MAX],
            pos: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.pos]
    }
}

impl fmt::Write for LogLineWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let copy_len = cmp::min(LOG_LINE_MAX - self.pos, s.as_bytes().len());
        self.data[self.pos..self.pos + copy_len].copy_from_slice(&s.as_bytes()[..copy_len]);
        self.pos += copy_len;
        Ok(())
    }
}

/// Prints an error-level message (level 3).
#[macro_export]
macro_rules! pr_err {
    ($($arg:tt)*) => {
        $crate::print::call_printk($crate::print::KernLevel::Err, format_args!($($arg)*))
    };
}

/// Prints a warning-level message (level 4).
#[macro_export]
macro_rules! pr_warn {
    ($($arg:tt)*) => {
        $crate::print::call_printk($crate::print::KernLevel::Warning, format_args!($($arg)*))
    };
}

/// Prints an info-level message (level 6).
#[macro_export]
macro_rules! pr_info {
    ($($arg:tt)*) => {
        $crate::print::call_printk($crate::print::KernLevel::Info, format_args!($($arg)*))
    };
}

/// Prints a debug-level message (level 7). Compiled out of release builds.
#[macro_export]
macro_rules! pr_debug {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            $crate::print::call_printk($crate::print::KernLevel::Debug, format_args!($($arg)*))
        }
    };
}
