//! Kernel errors.
//!
//! Errors are carried as negative `errno` values, the same encoding the host
//! expects back from a module's load hook.

use alloc::collections::TryReserveError;
use core::{
    ffi::c_int,
    fmt::{self, Debug, Display},
    num::TryFromIntError,
};

use log::warn;

/// Largest errno value the kernel hands out.
pub const MAX_ERRNO: u32 = 4095;

pub type KernelResult<T = (), E = Error> = Result<T, E>;

/// Generic integer kernel error.
///
/// # Invariants
///
/// The value is a valid `errno` (i.e. `>= -MAX_ERRNO && < 0`).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Error(c_int);

impl Error {
    /// Creates an [`Error`] from a kernel error code.
    ///
    /// Values outside the errno range are reported and replaced with `EINVAL`.
    pub fn from_errno(errno: c_int) -> Error {
        if errno < -(MAX_ERRNO as i32) || errno >= 0 {
            // TODO: Make it a `WARN_ONCE` once available.
            warn!(
                "attempted to create `Error` with out of range `errno`: {}",
                errno
            );
            return linux_err::EINVAL;
        }
        // INVARIANT: The check above ensures the type invariant
        // will hold.
        Error(errno)
    }

    pub fn to_errno(&self) -> c_int {
        self.0
    }

    /// Returns a string representing the error, if one exists.
    pub fn name(&self) -> Option<&'static str> {
        linux_err::name(-self.0)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            // Print out number if no name can be found.
            None => f.debug_tuple("Error").field(&-self.0).finish(),
            Some(name) => f.debug_tuple(name).finish(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            None => write!(f, "errno {}", -self.0),
            Some(name) => f.write_str(name),
        }
    }
}

/// Contains the C-compatible error codes.
#[rustfmt::skip]
#[allow(unused)]
pub mod linux_err {
    macro_rules! declare_err {
        ($($err:ident = $num:literal, $doc:expr;)*) => {
            $(
            #[doc = $doc]
            pub const $err: super::Error = super::Error(-$num);
            )*

            pub(super) fn name(errno: core::ffi::c_int) -> Option<&'static str> {
                match errno {
                    $($num => Some(stringify!($err)),)*
                    _ => None,
                }
            }
        };
    }

    declare_err! {
        EPERM = 1, "Operation not permitted.";
        ENOENT = 2, "No such file or directory.";
        ESRCH = 3, "No such process.";
        EINTR = 4, "Interrupted system call.";
        EIO = 5, "I/O error.";
        ENXIO = 6, "No such device or address.";
        E2BIG = 7, "Argument list too long.";
        ENOEXEC = 8, "Exec format error.";
        EBADF = 9, "Bad file number.";
        ECHILD = 10, "No child processes.";
        EAGAIN = 11, "Try again.";
        ENOMEM = 12, "Out of memory.";
        EACCES = 13, "Permission denied.";
        EFAULT = 14, "Bad address.";
        ENOTBLK = 15, "Block device required.";
        EBUSY = 16, "Device or resource busy.";
        EEXIST = 17, "File exists.";
        EXDEV = 18, "Cross-device link.";
        ENODEV = 19, "No such device.";
        ENOTDIR = 20, "Not a directory.";
        EISDIR = 21, "Is a directory.";
        EINVAL = 22, "Invalid argument.";
        ENFILE = 23, "File table overflow.";
        EMFILE = 24, "Too many open files.";
        ENOTTY = 25, "Not a typewriter.";
        ETXTBSY = 26, "Text file busy.";
        EFBIG = 27, "File too large.";
        ENOSPC = 28, "No space left on device.";
        ESPIPE = 29, "Illegal seek.";
        EROFS = 30, "Read-only file system.";
        EMLINK = 31, "Too many links.";
        EPIPE = 32, "Broken pipe.";
        EDOM = 33, "Math argument out of domain of func.";
        ERANGE = 34, "Math result not representable.";
        ENOSYS = 38, "Invalid system call number.";
    }
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Error {
        linux_err::ENOMEM
    }
}

impl From<TryFromIntError> for Error {
    fn from(_: TryFromIntError) -> Error {
        linux_err::EINVAL
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Error {
        linux_err::EINVAL
    }
}

impl From<core::convert::Infallible> for Error {
    fn from(e: core::convert::Infallible) -> Error {
        match e {}
    }
}
