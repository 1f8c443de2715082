//! Foundation types for oidtrace.
//!
//! Every other oidtrace crate depends on `oidtrace-types`.
//!
//! # Key Types
//!
//! - [`Oid`] -- Fixed-width identifier of one stored object
//! - [`Tid`] -- Identifier of one committed transaction
//! - [`IntoOid`] -- Accepts raw OIDs or their `0x..` representation
//! - [`OidInfo`] -- Presentation record for a queried object

pub mod error;
pub mod info;
pub mod oid;

pub use error::TypeError;
pub use info::{render_id_path, render_oid_path, IdPath, OidInfo, OidPath};
pub use oid::{IntoOid, Oid, Tid, ID_LEN, REPR_PREFIX};
