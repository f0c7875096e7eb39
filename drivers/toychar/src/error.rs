use core::{ffi::c_int, fmt};

use kernel::{chrdev::DeviceNumber, error::Error};

/// Why registering the devices failed.
///
/// Each variant keeps the host's error, which is what the load hook reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    /// The device number block could not be reserved.
    ResourceExhausted(Error),
    /// The class namespace could not be created.
    ClassCreationFailed(Error),
    /// Device `index` could not be published as `id`.
    DeviceCreationFailed {
        index: usize,
        id: DeviceNumber,
        source: Error,
    },
}

impl RegistrationError {
    pub fn source(&self) -> Error {
        match self {
            Self::ResourceExhausted(e) | Self::ClassCreationFailed(e) => *e,
            Self::DeviceCreationFailed { source, .. } => *source,
        }
    }

    /// Status reported to the host.
    pub fn to_errno(&self) -> c_int {
        self.source().to_errno()
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceExhausted(e) => write!(f, "could not reserve device numbers: {}", e),
            Self::ClassCreationFailed(e) => write!(f, "could not create class: {}", e),
            Self::DeviceCreationFailed { index, id, source } => {
                write!(f, "could not create device {} ({}): {}", index, id, source)
            }
        }
    }
}

impl From<RegistrationError> for Error {
    fn from(e: RegistrationError) -> Error {
        e.source()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use kernel::code::{EBUSY, ENOMEM};

    use super::*;

    #[test]
    fn status_is_underlying_errno() {
        let e = RegistrationError::DeviceCreationFailed {
            index: 2,
            id: DeviceNumber::new(240, 2),
            source: ENOMEM,
        };
        assert_eq!(e.to_errno(), -12);
        assert_eq!(Error::from(e), ENOMEM);
        assert_eq!(e.to_string(), "could not create device 2 (240:2): ENOMEM");
        assert_eq!(RegistrationError::ClassCreationFailed(EBUSY).to_errno(), -16);
    }
}
