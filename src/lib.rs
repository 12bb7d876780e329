//! Guest-side runtime for component bindings 🦀
//!
//! Generated bindings use the types in this crate to move lists, strings and
//! resource handles across the canonical ABI without a shared allocator or
//! garbage collector: every value has exactly one owner, and ownership is
//! handed to the other side explicitly.

pub mod alloc;
pub mod ffi;
pub mod logger;
pub mod panic_hook;
pub mod resource;
mod sys;

pub use self::{
    ffi::{
        buffer::OwnedBuffer,
        string::{OwnedString, StrView},
        view::Span,
    },
    resource::{ExportedResource, ImportedHandle, ImportedResource, Owned, ResourceTable},
};
pub use log;

/// Module containing required Wasm exports.
#[cfg(target_arch = "wasm32")]
#[doc(hidden)]
pub mod exports {
    use crate::{logger, panic_hook};

    /// The Wasm start function. This gets set as the module's start function
    /// during post-processing of the Wasm blob, since there is currently no
    /// way to specify it in Rust at the moment.
    #[export_name = "__wit_guest_start"]
    pub extern "C" fn start() {
        panic_hook::set_panic_hook();
        logger::init();
    }

    /// The canonical ABI allocation hook, used by the host to allocate space
    /// for arguments passed to exported functions.
    #[export_name = "cabi_realloc"]
    pub unsafe extern "C" fn cabi_realloc(
        old_ptr: *mut u8,
        old_size: usize,
        align: usize,
        new_size: usize,
    ) -> *mut u8 {
        crate::alloc::realloc(old_ptr, old_size, align, new_size)
    }
}
