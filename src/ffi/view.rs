//! Borrowed `{pointer, length}` views over linear memory.

use crate::ffi::buffer::OwnedBuffer;
use std::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    ops::Deref,
    slice,
};

/// A borrowed, read-only view over `len` elements of externally owned memory.
///
/// This has the same memory representation as a flattened canonical ABI list
/// and is only valid for the call that produced it.
#[repr(C)]
pub struct Span<'a, T> {
    ptr: *const T,
    len: usize,
    _lifetime: PhantomData<&'a [T]>,
}

impl<'a, T> Span<'a, T> {
    /// Creates a view over the specified slice.
    pub fn new(slice: &'a [T]) -> Self {
        Self {
            ptr: slice.as_ptr(),
            len: slice.len(),
            _lifetime: PhantomData,
        }
    }

    /// Creates a view from raw parts received over the ABI.
    ///
    /// # Safety
    ///
    /// When `len` is non-zero, `ptr` must point to `len` initialized elements
    /// that stay alive and unmodified for `'a`.
    pub unsafe fn from_raw_parts(ptr: *const T, len: usize) -> Self {
        Self {
            ptr,
            len,
            _lifetime: PhantomData,
        }
    }

    /// An empty view.
    pub fn empty() -> Self {
        Self::new(&[])
    }

    /// Returns the number of elements in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the raw data pointer of the view.
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// Returns the view as a Rust slice.
    pub fn as_slice(&self) -> &'a [T] {
        if self.len == 0 {
            return &[];
        }

        // SAFETY: Non-empty views are either created from a slice or from
        // raw parts whose validity the caller of `from_raw_parts` asserted.
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Copies the viewed elements into a new owned buffer.
    pub fn to_buffer(&self) -> OwnedBuffer<T>
    where
        T: Clone,
    {
        OwnedBuffer::from_span(*self)
    }
}

impl<T> Clone for Span<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Span<'_, T> {}

impl<T> Default for Span<'_, T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for Span<'_, T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T> AsRef<[T]> for Span<'_, T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T> From<&'a [T]> for Span<'a, T> {
    fn from(slice: &'a [T]) -> Self {
        Self::new(slice)
    }
}

impl<'a, T> From<&'a Vec<T>> for Span<'a, T> {
    fn from(vec: &'a Vec<T>) -> Self {
        Self::new(vec)
    }
}

impl<T> PartialEq for Span<'_, T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T> Debug for Span<'_, T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(self.as_slice(), f)
    }
}
