//! Defines fundamental types used throughout the edgemap codebase.

use std::fmt;

/// Enumerates all the errors that can be reported by an edgemap
/// driver. Authors for new drivers should try to map their errors
/// into one of these values. If no current value is appropriate, a
/// new one could be added (requiring a new release of this crate) but
/// make sure the new error code is generic enough that it may be
/// useful for other drivers. For instance, don't add an error value
/// that is specific to one vendor's firmware. Add a more general
/// value and use the associated description string to explain the
/// details.

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// Returned whenever a resource cannot be found.
    NotFound,

    /// A type mismatch is preventing the operation from continuing.
    TypeError,

    /// A configuration fragment couldn't be decoded. The first field
    /// names the fragment that failed.
    ConfigDecode(Fragment, String),

    /// The requested data shape isn't one the driver supports.
    UnsupportedDataType(String),

    /// The device is registered but nothing has written a value to it
    /// yet.
    DeviceNotReady(i32),

    /// The requested operation couldn't complete. The description
    /// field will have more information for the user.
    OperationError(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "item not found"),
            Error::TypeError => write!(f, "incorrect type"),
            Error::ConfigDecode(fragment, detail) => {
                write!(f, "couldn't decode {} config -- {}", fragment, detail)
            }
            Error::UnsupportedDataType(v) => {
                write!(f, "unsupported data type '{}'", &v)
            }
            Error::DeviceNotReady(id) => {
                write!(f, "device {} has no value yet", id)
            }
            Error::OperationError(v) => {
                write!(f, "couldn't complete operation: {}", &v)
            }
        }
    }
}

/// Names the three configuration fragments a mapper host supplies
/// with a request. Decode errors carry one of these so the report
/// says which fragment was malformed.

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Fragment {
    /// Settings shared by every device of a protocol group.
    Common,

    /// The shape of the data a read is expected to produce.
    Visitor,

    /// Per-device protocol settings, including the device address.
    Protocol,
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fragment::Common => write!(f, "protocolCommon"),
            Fragment::Visitor => write!(f, "visitor"),
            Fragment::Protocol => write!(f, "protocol"),
        }
    }
}

pub mod device;
