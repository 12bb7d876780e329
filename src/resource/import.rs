//! Resources owned by the host and imported by the guest.

use super::{is_valid, RawHandle, INVALID_HANDLE};
use std::{
    any,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    mem,
};

/// The host operation releasing an imported resource handle.
pub trait ImportedResource {
    /// Releases `handle` (`[resource-drop]`).
    ///
    /// # Safety
    ///
    /// `handle` must be a live handle owned by the guest.
    unsafe fn resource_drop(handle: RawHandle);
}

/// A move-only owner of a host resource handle.
///
/// The handle can be forwarded, by moving the wrapper or extracting the raw
/// handle, but never duplicated. A wrapper that still owns a valid handle
/// releases it to the host when dropped.
pub struct ImportedHandle<R: ImportedResource> {
    handle: RawHandle,
    _resource: PhantomData<fn() -> R>,
}

impl<R> ImportedHandle<R>
where
    R: ImportedResource,
{
    /// Takes ownership of a raw handle.
    pub fn new(handle: RawHandle) -> Self {
        Self {
            handle,
            _resource: PhantomData,
        }
    }

    /// Creates a wrapper that owns nothing.
    pub fn invalid() -> Self {
        Self::new(INVALID_HANDLE)
    }

    /// Returns the raw handle.
    pub fn handle(&self) -> RawHandle {
        self.handle
    }

    /// Returns `true` if the wrapper owns a handle.
    pub fn is_valid(&self) -> bool {
        is_valid(self.handle)
    }

    /// Sets the handle of an empty wrapper.
    ///
    /// # Panics
    ///
    /// Panics if the wrapper already owns a handle.
    pub fn set_handle(&mut self, handle: RawHandle) {
        assert!(
            !self.is_valid(),
            "set a handle on a wrapper that still owns handle {}",
            self.handle,
        );
        self.handle = handle;
    }

    /// Moves the handle out into a new wrapper, leaving this one invalid.
    pub fn take(&mut self) -> Self {
        Self::new(mem::replace(&mut self.handle, INVALID_HANDLE))
    }

    /// Moves the handle of `other` into this wrapper.
    ///
    /// # Panics
    ///
    /// Panics if this wrapper still owns a handle, since overwriting it would
    /// silently leak a handle that must be released first.
    pub fn assign(&mut self, other: Self) {
        assert!(
            !self.is_valid(),
            "assigned into a wrapper that still owns handle {}",
            self.handle,
        );
        self.handle = other.into_handle();
    }

    /// Moves the handle of `other` into this wrapper if it owns nothing,
    /// otherwise hands `other` back untouched.
    pub fn try_assign(&mut self, other: Self) -> Result<(), Self> {
        if self.is_valid() {
            return Err(other);
        }
        self.handle = other.into_handle();
        Ok(())
    }

    /// Extracts the raw handle. The caller becomes responsible for it.
    pub fn into_handle(mut self) -> RawHandle {
        mem::replace(&mut self.handle, INVALID_HANDLE)
    }
}

impl<R> Default for ImportedHandle<R>
where
    R: ImportedResource,
{
    fn default() -> Self {
        Self::invalid()
    }
}

impl<R> Drop for ImportedHandle<R>
where
    R: ImportedResource,
{
    fn drop(&mut self) {
        if self.is_valid() {
            log::trace!("releasing {} handle {}", any::type_name::<R>(), self.handle);
            unsafe { R::resource_drop(self.handle) };
        }
    }
}

impl<R> Debug for ImportedHandle<R>
where
    R: ImportedResource,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_tuple("ImportedHandle").field(&self.handle).finish()
    }
}
