//! Linear memory string implementation.
//!
//! Strings are raw bytes in linear memory with an explicit length and no
//! terminator. They are usually UTF-8, but nothing here relies on that until
//! the bytes are decoded.

use crate::{
    alloc::{Global, RawAlloc},
    ffi::{buffer::OwnedBuffer, view::Span},
};
use std::{
    borrow::Cow,
    fmt::{self, Debug, Formatter},
    ops::Deref,
    str::Utf8Error,
    string::FromUtf8Error,
};

/// A borrowed linear memory string.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq)]
pub struct StrView<'a> {
    inner: Span<'a, u8>,
}

impl<'a> StrView<'a> {
    /// Creates a view over a Rust string slice.
    pub fn new(s: &'a str) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    /// Creates a view over raw bytes.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self {
            inner: Span::new(bytes),
        }
    }

    /// Creates a view from raw parts received over the ABI.
    ///
    /// # Safety
    ///
    /// Same as [`Span::from_raw_parts`].
    pub unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Self {
        Self {
            inner: Span::from_raw_parts(ptr, len),
        }
    }

    /// Returns the length of the string in bytes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the string has no bytes.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the raw data pointer.
    pub fn as_ptr(&self) -> *const u8 {
        self.inner.as_ptr()
    }

    /// Returns the raw bytes of the string.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.inner.as_slice()
    }

    /// Decodes the string as UTF-8.
    pub fn to_str(&self) -> Result<&'a str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    /// Decodes the string as UTF-8, replacing invalid data with the
    /// replacement character (`U+FFFD`).
    pub fn to_string_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}

impl<'a> From<&'a str> for StrView<'a> {
    fn from(s: &'a str) -> Self {
        Self::new(s)
    }
}

impl Debug for StrView<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.to_string_lossy(), f)
    }
}

/// An owned linear memory string, allocated with `A`.
///
/// The empty string never allocates and points to the sentinel address `1`.
pub struct OwnedString<A: RawAlloc = Global> {
    inner: OwnedBuffer<u8, A>,
}

impl OwnedString {
    /// Creates a new string by copying a Rust string slice.
    pub fn new(s: impl AsRef<str>) -> Self {
        Self::new_in(s, Global)
    }

    /// Creates a new string by copying raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_bytes_in(bytes, Global)
    }

    /// Creates a new string by copying a borrowed view.
    pub fn from_view(view: StrView<'_>) -> Self {
        Self::from_bytes_in(view.as_bytes(), Global)
    }

    /// Adopts a string from its raw parts.
    ///
    /// # Safety
    ///
    /// Same as [`OwnedBuffer::from_raw_parts`].
    pub unsafe fn from_raw_parts(ptr: *mut u8, len: usize) -> Self {
        Self::from_raw_parts_in(ptr, len, Global)
    }

    /// Frees the memory of a leaked string. Sentinel pointers are ignored.
    ///
    /// # Safety
    ///
    /// Same as [`OwnedBuffer::drop_raw`].
    pub unsafe fn drop_raw(ptr: *mut u8, len: usize) {
        Self::drop_raw_in(ptr, len, &Global)
    }
}

impl<A> OwnedString<A>
where
    A: RawAlloc,
{
    /// Creates a new string in `alloc` by copying a Rust string slice.
    pub fn new_in(s: impl AsRef<str>, alloc: A) -> Self {
        Self::from_bytes_in(s.as_ref().as_bytes(), alloc)
    }

    /// Creates a new string in `alloc` by copying raw bytes.
    pub fn from_bytes_in(bytes: &[u8], alloc: A) -> Self {
        Self {
            inner: OwnedBuffer::from_slice_in(bytes, alloc),
        }
    }

    /// Adopts a string allocated with `alloc` from its raw parts.
    ///
    /// # Safety
    ///
    /// Same as [`OwnedBuffer::from_raw_parts_in`].
    pub unsafe fn from_raw_parts_in(ptr: *mut u8, len: usize, alloc: A) -> Self {
        Self {
            inner: OwnedBuffer::from_raw_parts_in(ptr, len, alloc),
        }
    }

    /// Frees the memory of a string leaked from `alloc`.
    ///
    /// # Safety
    ///
    /// Same as [`OwnedBuffer::drop_raw_in`].
    pub unsafe fn drop_raw_in(ptr: *mut u8, len: usize, alloc: &A) {
        OwnedBuffer::<u8, A>::drop_raw_in(ptr, len, alloc)
    }

    /// Moves the contents out of this string, leaving it empty.
    pub fn take(&mut self) -> Self
    where
        A: Default,
    {
        Self {
            inner: self.inner.take(),
        }
    }
}

impl<A> OwnedString<A>
where
    A: RawAlloc,
{
    /// Returns a borrowed view of the string.
    pub fn as_view(&self) -> StrView<'_> {
        StrView::from_bytes(self.inner.as_slice())
    }

    /// Returns the raw bytes of the string.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_slice()
    }

    /// Returns the raw data pointer.
    pub fn as_ptr(&self) -> *const u8 {
        self.inner.as_ptr()
    }

    /// Returns the length of the string in bytes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the string has no bytes.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Decodes the string as UTF-8.
    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    /// Converts the string into a Rust `String`.
    #[allow(clippy::inherent_to_string)]
    pub fn to_string(&self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.as_bytes().to_vec())
    }

    /// Converts the string into a Rust `String`, replacing invalid data with
    /// the replacement character (`U+FFFD`).
    pub fn to_string_lossy(&self) -> String {
        self.as_view().to_string_lossy().into_owned()
    }

    /// Frees the string, leaving it empty.
    pub fn release(&mut self) {
        self.inner.release();
    }

    /// Gives up ownership of the string, returning its raw parts.
    pub fn leak(self) -> (*mut u8, usize) {
        self.inner.leak()
    }

    /// Converts the string into its underlying byte buffer.
    pub fn into_buffer(self) -> OwnedBuffer<u8, A> {
        self.inner
    }
}

impl<A> Deref for OwnedString<A>
where
    A: RawAlloc,
{
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl<A> Default for OwnedString<A>
where
    A: RawAlloc + Default,
{
    fn default() -> Self {
        Self {
            inner: OwnedBuffer::new_in(A::default()),
        }
    }
}

impl<A> Clone for OwnedString<A>
where
    A: RawAlloc + Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A> From<&str> for OwnedString<A>
where
    A: RawAlloc + Default,
{
    fn from(s: &str) -> Self {
        Self::new_in(s, A::default())
    }
}

impl<A> PartialEq for OwnedString<A>
where
    A: RawAlloc,
{
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<A> Eq for OwnedString<A> where A: RawAlloc {}

impl<A> Debug for OwnedString<A>
where
    A: RawAlloc,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.as_view(), f)
    }
}
