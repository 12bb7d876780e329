//! Component resources: guest-defined exports, host-owned imports and the
//! table used to map integer ids back to resource instances.
//!
//! Handles are plain canonical ABI `i32` values. A handle is valid while it is
//! non-negative; [`INVALID_HANDLE`] marks a wrapper whose handle has been
//! moved out or extracted.

mod export;
mod import;
mod table;

pub use self::{
    export::{ExportedResource, Owned},
    import::{ImportedHandle, ImportedResource},
    table::{ResourceId, ResourceTable},
};

/// A raw canonical ABI resource handle.
pub type RawHandle = i32;

/// The reserved handle value of a wrapper that owns nothing.
pub const INVALID_HANDLE: RawHandle = -1;

/// Returns `true` if `handle` refers to a live resource.
pub fn is_valid(handle: RawHandle) -> bool {
    handle >= 0
}
