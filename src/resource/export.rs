//! Resources defined by the guest and exported to the host.
//!
//! An exported resource has a two-phase lifetime. The guest registers the
//! object with the host (`[resource-new]`) and later asks the host to drop its
//! handle (`[resource-drop]`). The host is the only party that knows when all
//! of its references are gone, so the object is only destroyed when the host
//! invokes the destructor callback ([`Owned::finalize`]).

use super::{is_valid, RawHandle, INVALID_HANDLE};
use std::{
    any,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    mem::{self, ManuallyDrop},
    ops::Deref,
    ptr::NonNull,
};

/// The host operations backing an exported resource type.
///
/// These are implemented by generated bindings in terms of the resource's
/// canonical ABI imports.
pub trait ExportedResource: Sized {
    /// Registers the object at address `rep` with the host, returning its
    /// new handle.
    ///
    /// # Safety
    ///
    /// `rep` must stay at a fixed address until the host finalizes it.
    unsafe fn resource_new(rep: *mut u8) -> RawHandle;

    /// Asks the host to drop `handle`. The host eventually calls
    /// [`Owned::finalize`] with the registered address.
    ///
    /// # Safety
    ///
    /// `handle` must be a live handle obtained from `resource_new`.
    unsafe fn resource_drop(handle: RawHandle);
}

/// The heap cell registered with the host. It never moves.
struct Registered<R> {
    handle: RawHandle,
    value: R,
}

/// A single owner of a guest object registered with the host.
///
/// The `Owned` pointer may move freely; the object it points to stays at the
/// address the host knows. Dropping an `Owned` requests a host-side drop but
/// does not free the object.
pub struct Owned<R: ExportedResource> {
    ptr: NonNull<Registered<R>>,
    _owns: PhantomData<Registered<R>>,
}

impl<R> Owned<R>
where
    R: ExportedResource,
{
    /// Moves `value` to a stable heap address and registers it with the host.
    pub fn new(value: R) -> Self {
        let cell = Box::new(Registered {
            handle: INVALID_HANDLE,
            value,
        });
        let ptr = NonNull::from(Box::leak(cell));

        // SAFETY: The cell is leaked and only reclaimed by `finalize`, so its
        // address is stable for as long as the host knows about it.
        unsafe {
            let handle = R::resource_new(ptr.as_ptr().cast());
            (*ptr.as_ptr()).handle = handle;
            log::trace!(
                "registered {} at {:p} as handle {}",
                any::type_name::<R>(),
                ptr,
                handle,
            );
        }

        Self {
            ptr,
            _owns: PhantomData,
        }
    }

    /// Returns the handle of the resource.
    pub fn handle(&self) -> RawHandle {
        self.cell().handle
    }

    /// Returns the address registered with the host.
    pub fn rep(&self) -> *mut u8 {
        self.ptr.as_ptr().cast()
    }

    /// Extracts the handle, transferring the responsibility of dropping it to
    /// the caller. The object stays alive until the host finalizes it.
    pub fn into_handle(self) -> RawHandle {
        let this = ManuallyDrop::new(self);

        // SAFETY: The cell is alive until finalized by the host, and it is
        // only accessed by the single `Owned` being consumed here.
        unsafe { mem::replace(&mut (*this.ptr.as_ptr()).handle, INVALID_HANDLE) }
    }

    /// Borrows the object registered at `rep`, as needed when the host calls
    /// a method on the resource.
    ///
    /// # Safety
    ///
    /// `rep` must be an address registered by [`Owned::new`] for `R` that the
    /// host has not finalized yet.
    pub unsafe fn from_rep<'a>(rep: *mut u8) -> &'a R {
        &(*rep.cast::<Registered<R>>()).value
    }

    /// The host destructor callback. Destroys the object registered at `rep`.
    ///
    /// # Safety
    ///
    /// `rep` must be an address registered by [`Owned::new`] for `R`, and it
    /// must be finalized at most once.
    pub unsafe fn finalize(rep: *mut u8) {
        log::trace!("finalizing {} at {:p}", any::type_name::<R>(), rep);
        drop(Box::from_raw(rep.cast::<Registered<R>>()));
    }

    fn cell(&self) -> &Registered<R> {
        // SAFETY: The host cannot finalize the cell while the `Owned` still
        // holds a live handle to it.
        unsafe { self.ptr.as_ref() }
    }
}

impl<R> Deref for Owned<R>
where
    R: ExportedResource,
{
    type Target = R;

    fn deref(&self) -> &Self::Target {
        &self.cell().value
    }
}

impl<R> Drop for Owned<R>
where
    R: ExportedResource,
{
    fn drop(&mut self) {
        // NOTE: The host may finalize the cell from within `resource_drop`,
        // so the handle is read before the call and the cell is not touched
        // afterwards.
        let handle = self.handle();
        if is_valid(handle) {
            log::trace!("dropping {} handle {}", any::type_name::<R>(), handle);
            unsafe { R::resource_drop(handle) };
        }
    }
}

impl<R> Debug for Owned<R>
where
    R: ExportedResource + Debug,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Owned")
            .field("handle", &self.handle())
            .field("value", &**self)
            .finish()
    }
}
