//! Module containing FFI utilities for passing owned and borrowed data through
//! the canonical ABI linear memory.
//!
//! # Ownership
//!
//! Every value that crosses the boundary has exactly one owner. The sending
//! side calls `leak` to give up ownership of an allocation as raw
//! `(pointer, length)` parts, and the receiving side adopts them again with
//! `from_raw_parts`. Arguments placed into guest memory by the host are
//! allocated with `cabi_realloc`, so they can be adopted and released like any
//! buffer allocated locally.
//!
//! # Empty Values
//!
//! Empty buffers never allocate. Their data pointer is a non-null sentinel
//! equal to the alignment of the element type, which is also what
//! `cabi_realloc` returns for zero sized requests. This keeps "empty" distinct
//! from "absent" (null) at the ABI level.

pub mod buffer;
pub mod string;
pub mod view;
