//! Raw linear memory allocation shared by all owned buffer types.
//!
//! Buffers that cross the ABI boundary are adopted on one side and released
//! on the other, so every owned type in this crate allocates and frees through
//! a [`RawAlloc`]. The default [`Global`] allocator is the same allocator that
//! backs the exported `cabi_realloc`, which is what the host uses to place
//! arguments into guest memory.

use std::{
    alloc::{self, Layout},
    ptr::NonNull,
};

/// A raw memory allocator.
///
/// # Safety
///
/// Implementations must return memory that is valid for the requested layout
/// from `allocate`, and must accept in `free` any pointer previously returned
/// by `allocate` on an equal allocator with the same layout.
pub unsafe trait RawAlloc {
    /// Allocates a block of memory for `layout`. The layout is never zero
    /// sized. Failure to allocate is fatal and never returns.
    fn allocate(&self, layout: Layout) -> NonNull<u8>;

    /// Frees a block of memory previously returned by `allocate`.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` with the same `layout` and
    /// must not have been freed already.
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The global Rust allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

unsafe impl RawAlloc for Global {
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        debug_assert_ne!(layout.size(), 0);

        // SAFETY: Callers never request zero sized layouts.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).unwrap_or_else(|| alloc::handle_alloc_error(layout))
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        alloc::dealloc(ptr.as_ptr(), layout)
    }
}

/// Returns the memory layout for an array of `len` elements.
pub(crate) fn array_layout<T>(len: usize) -> Layout {
    Layout::array::<T>(len)
        .expect("attempted to allocate a buffer that is larger than the address space.")
}

/// Allocates uninitialized storage for `len` elements of `T`.
///
/// Zero sized arrays never touch the allocator and get a dangling pointer.
pub(crate) fn alloc_array<T, A: RawAlloc>(alloc: &A, len: usize) -> NonNull<T> {
    let layout = array_layout::<T>(len);
    if layout.size() == 0 {
        return NonNull::dangling();
    }
    alloc.allocate(layout).cast()
}

/// Frees storage allocated with [`alloc_array`] without dropping elements.
///
/// # Safety
///
/// `ptr` and `len` must describe an array returned by `alloc_array` for the
/// same allocator.
pub(crate) unsafe fn free_array<T, A: RawAlloc>(alloc: &A, ptr: NonNull<T>, len: usize) {
    let layout = array_layout::<T>(len);
    if layout.size() != 0 {
        alloc.free(ptr.cast(), layout);
    }
}

/// The canonical ABI `realloc` used by the host to allocate guest memory.
///
/// A zero sized request returns `align` as the address, which is the same
/// sentinel that empty owned buffers use.
///
/// # Safety
///
/// `old_ptr` must either be unused (`old_size == 0`) or a live allocation of
/// `old_size` bytes with alignment `align` made by this function.
pub unsafe fn realloc(old_ptr: *mut u8, old_size: usize, align: usize, new_size: usize) -> *mut u8 {
    let layout;
    let ptr = if old_size == 0 {
        if new_size == 0 {
            return align as *mut u8;
        }
        layout = Layout::from_size_align(new_size, align).expect("invalid realloc layout");
        alloc::alloc(layout)
    } else {
        assert_ne!(new_size, 0, "cannot shrink a live allocation to zero bytes");
        layout = Layout::from_size_align(old_size, align).expect("invalid realloc layout");
        alloc::realloc(old_ptr, layout, new_size)
    };

    if ptr.is_null() {
        alloc::handle_alloc_error(layout);
    }
    ptr
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::Cell;

    thread_local! {
        static ALLOCATIONS: Cell<usize> = Cell::new(0);
        static FREES: Cell<usize> = Cell::new(0);
    }

    /// A global allocator wrapper that counts calls on the current thread.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct CountingAlloc;

    unsafe impl RawAlloc for CountingAlloc {
        fn allocate(&self, layout: Layout) -> NonNull<u8> {
            ALLOCATIONS.with(|count| count.set(count.get() + 1));
            Global.allocate(layout)
        }

        unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
            FREES.with(|count| count.set(count.get() + 1));
            Global.free(ptr, layout)
        }
    }

    pub fn allocations() -> usize {
        ALLOCATIONS.with(Cell::get)
    }

    pub fn frees() -> usize {
        FREES.with(Cell::get)
    }
}
