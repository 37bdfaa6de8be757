//! This crate is used by device drivers of an `edgemap` mapper
//! process.
//!
//! The interfaces and types defined in this crate are useful for
//! those wishing to write a new driver for a class of devices served
//! by the mapper. The mapper executable owns device discovery,
//! polling schedules, and the transport to upstream consumers; a
//! driver only has to parse the configuration fragments the mapper
//! hands it and answer read/write/status requests.

mod types;

// Pull types down to the `edgemap-api` namespace.

pub use types::device;
pub use types::Error;
pub use types::Fragment;

/// A specialization of `std::result::Result<>` where the error value
/// is `types::Error`.

pub type Result<T> = std::result::Result<T, Error>;

pub mod driver;
