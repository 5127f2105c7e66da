//! SQLite persistence for parcel delivery tracking.
//!
//! # Intention
//!
//! - Provide a small data-access API over the `parcel` table.
//! - Keep SQL text, row mapping and status encoding out of callers.
//!
//! # Architectural Boundaries
//!
//! - Only parcel storage code belongs here.
//! - The caller owns the connection; the store only borrows it.
//! - No lifecycle enforcement beyond the `registered` guards on address
//!   edits and deletion.

pub mod error;
pub mod parcel;
pub mod sqlite;
pub mod store;

pub use error::{Error, Result};
pub use parcel::{Parcel, ParcelStatus};
pub use sqlite::{open, parcel_schema, SqliteConfig};
pub use store::ParcelStore;
