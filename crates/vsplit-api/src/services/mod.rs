//! Background and bookkeeping services.

pub mod cleanup;
pub mod session;

pub use cleanup::{CleanupReport, DiskCleanup};
pub use session::SessionLedger;
