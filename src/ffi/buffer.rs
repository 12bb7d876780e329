//! Owned linear memory buffer implementation.

use crate::{
    alloc::{self, Global, RawAlloc},
    ffi::view::Span,
};
use std::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    mem::{self, ManuallyDrop, MaybeUninit},
    ops::{Deref, DerefMut},
    ptr::{self, NonNull},
    slice,
};

/// A single-owner buffer of `T` elements in linear memory, allocated with
/// `A`.
///
/// An empty buffer never allocates and points to a sentinel address equal to
/// the alignment of `T`. A non-empty buffer owns `len` initialized elements
/// and drops them, then frees the allocation, when it is released.
pub struct OwnedBuffer<T, A: RawAlloc = Global> {
    ptr: NonNull<T>,
    len: usize,
    alloc: A,
    _owns: PhantomData<T>,
}

impl<T> OwnedBuffer<T> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Allocates a buffer of `len` uninitialized slots.
    ///
    /// Slots are initialized with [`OwnedBuffer::write`] before converting
    /// the buffer with [`OwnedBuffer::assume_init`]. Running out of memory is
    /// fatal.
    pub fn allocate(len: usize) -> OwnedBuffer<MaybeUninit<T>> {
        Self::allocate_in(len, Global)
    }

    /// Creates a new buffer by copying the elements of a slice.
    pub fn from_slice(slice: &[T]) -> Self
    where
        T: Clone,
    {
        Self::from_slice_in(slice, Global)
    }

    /// Creates a new buffer by copying the elements of a borrowed view.
    pub fn from_span(span: Span<'_, T>) -> Self
    where
        T: Clone,
    {
        Self::from_slice_in(span.as_slice(), Global)
    }

    /// Adopts a buffer from its raw parts, typically received from the other
    /// side of the ABI.
    ///
    /// # Safety
    ///
    /// See [`OwnedBuffer::from_raw_parts_in`].
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize) -> Self {
        Self::from_raw_parts_in(ptr, len, Global)
    }

    /// Frees the memory of a leaked buffer without dropping its elements.
    ///
    /// # Safety
    ///
    /// See [`OwnedBuffer::drop_raw_in`].
    pub unsafe fn drop_raw(ptr: *mut T, len: usize) {
        Self::drop_raw_in(ptr, len, &Global)
    }
}

impl<T, A> OwnedBuffer<T, A>
where
    A: RawAlloc,
{
    /// Creates an empty buffer for the specified allocator.
    pub fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            alloc,
            _owns: PhantomData,
        }
    }

    /// Allocates a buffer of `len` uninitialized slots with `alloc`.
    pub fn allocate_in(len: usize, alloc: A) -> OwnedBuffer<MaybeUninit<T>, A> {
        if len == 0 {
            return OwnedBuffer::new_in(alloc);
        }

        OwnedBuffer {
            ptr: alloc::alloc_array(&alloc, len),
            len,
            alloc,
            _owns: PhantomData,
        }
    }

    /// Creates a new buffer with `alloc` by copying the elements of a slice.
    pub fn from_slice_in(slice: &[T], alloc: A) -> Self
    where
        T: Clone,
    {
        let mut buffer = Self::allocate_in(slice.len(), alloc);
        for (slot, value) in buffer.iter_mut().zip(slice) {
            *slot = MaybeUninit::new(value.clone());
        }

        // SAFETY: Every slot was written above.
        unsafe { buffer.assume_init() }
    }

    /// Adopts a buffer allocated with `alloc` from its raw parts.
    ///
    /// # Safety
    ///
    /// When `len` is non-zero, `ptr` must point to `len` initialized elements
    /// allocated by an allocator equal to `alloc` for exactly `len` elements,
    /// and ownership of them must be transferred to the new buffer.
    pub unsafe fn from_raw_parts_in(ptr: *mut T, len: usize, alloc: A) -> Self {
        if len == 0 {
            return Self::new_in(alloc);
        }

        Self {
            ptr: NonNull::new(ptr).expect("adopted a null buffer with a non-zero length"),
            len,
            alloc,
            _owns: PhantomData,
        }
    }

    /// Frees the memory of a leaked buffer without dropping its elements.
    ///
    /// This is the post-return cleanup for buffers whose elements were
    /// already moved out or never need dropping. Sentinel pointers are
    /// ignored.
    ///
    /// # Safety
    ///
    /// Same as [`OwnedBuffer::from_raw_parts_in`].
    pub unsafe fn drop_raw_in(ptr: *mut T, len: usize, alloc: &A) {
        if let Some(ptr) = NonNull::new(ptr) {
            if len > 0 && ptr != NonNull::dangling() {
                alloc::free_array(alloc, ptr, len);
            }
        }
    }

    /// Moves the contents out of this buffer, leaving it empty.
    pub fn take(&mut self) -> Self
    where
        A: Default,
    {
        mem::replace(self, Self::new_in(A::default()))
    }

    /// Returns the number of elements in the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if the buffer is in the empty sentinel state.
    pub fn is_sentinel(&self) -> bool {
        self.len == 0 && self.ptr == NonNull::dangling()
    }

    /// Returns the raw data pointer.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Returns the raw mutable data pointer.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns the buffer as a Rust slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` is either the aligned sentinel with a zero length or
        // points to `len` initialized elements owned by this buffer.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Returns the buffer as a mutable Rust slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: See `as_slice`; `&mut self` guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Returns a borrowed view of the buffer contents.
    pub fn as_span(&self) -> Span<'_, T> {
        Span::new(self.as_slice())
    }

    /// Copies the contents into a `Vec`.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.as_slice().to_vec()
    }

    /// Drops all elements and frees the allocation, leaving the buffer in the
    /// empty sentinel state. Releasing an empty buffer does nothing.
    pub fn release(&mut self) {
        if self.len == 0 {
            self.ptr = NonNull::dangling();
            return;
        }

        // NOTE: Reset before running destructors so that a panicking element
        // destructor cannot lead to a double free.
        let ptr = mem::replace(&mut self.ptr, NonNull::dangling());
        let len = mem::replace(&mut self.len, 0);

        // SAFETY: `ptr` owns `len` initialized elements allocated by
        // `self.alloc`, and the buffer no longer refers to them.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr.as_ptr(), len));
            alloc::free_array(&self.alloc, ptr, len);
        }
    }

    /// Gives up ownership of the buffer, returning its raw parts without
    /// dropping elements or freeing memory.
    ///
    /// The parts are reclaimed with [`OwnedBuffer::from_raw_parts`] or freed
    /// with [`OwnedBuffer::drop_raw`]. An empty buffer leaks the sentinel.
    pub fn leak(self) -> (*mut T, usize) {
        let this = ManuallyDrop::new(self);

        // SAFETY: `this` is never used again, so the allocator is read out
        // exactly once.
        drop(unsafe { ptr::read(&this.alloc) });
        (this.ptr.as_ptr(), this.len)
    }
}

impl<T, A> OwnedBuffer<MaybeUninit<T>, A>
where
    A: RawAlloc,
{
    /// Initializes the slot at `index`, returning a reference to the value.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn write(&mut self, index: usize, value: T) -> &mut T {
        let slot = &mut self.as_mut_slice()[index];
        *slot = MaybeUninit::new(value);

        // SAFETY: The slot was just initialized.
        unsafe { &mut *slot.as_mut_ptr() }
    }

    /// Converts the buffer into a buffer of initialized elements.
    ///
    /// # Safety
    ///
    /// Every slot must have been initialized exactly once.
    pub unsafe fn assume_init(self) -> OwnedBuffer<T, A> {
        let this = ManuallyDrop::new(self);
        OwnedBuffer {
            ptr: this.ptr.cast(),
            len: this.len,
            alloc: ptr::read(&this.alloc),
            _owns: PhantomData,
        }
    }
}

impl<T, A> Drop for OwnedBuffer<T, A>
where
    A: RawAlloc,
{
    fn drop(&mut self) {
        self.release();
    }
}

impl<T, A> Default for OwnedBuffer<T, A>
where
    A: RawAlloc + Default,
{
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, A> Clone for OwnedBuffer<T, A>
where
    T: Clone,
    A: RawAlloc + Clone,
{
    fn clone(&self) -> Self {
        Self::from_slice_in(self.as_slice(), self.alloc.clone())
    }
}

impl<T, A> Deref for OwnedBuffer<T, A>
where
    A: RawAlloc,
{
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, A> DerefMut for OwnedBuffer<T, A>
where
    A: RawAlloc,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T, A> AsRef<[T]> for OwnedBuffer<T, A>
where
    A: RawAlloc,
{
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A> From<&[T]> for OwnedBuffer<T, A>
where
    T: Clone,
    A: RawAlloc + Default,
{
    fn from(slice: &[T]) -> Self {
        Self::from_slice_in(slice, A::default())
    }
}

impl<T, A> From<Vec<T>> for OwnedBuffer<T, A>
where
    A: RawAlloc + Default,
{
    fn from(vec: Vec<T>) -> Self {
        let mut buffer = Self::allocate_in(vec.len(), A::default());
        for (slot, value) in buffer.iter_mut().zip(vec) {
            *slot = MaybeUninit::new(value);
        }

        // SAFETY: `vec` has exactly as many elements as the buffer has slots.
        unsafe { buffer.assume_init() }
    }
}

impl<T, A> PartialEq for OwnedBuffer<T, A>
where
    T: PartialEq,
    A: RawAlloc,
{
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, A> Eq for OwnedBuffer<T, A>
where
    T: Eq,
    A: RawAlloc,
{
}

impl<T, A> Debug for OwnedBuffer<T, A>
where
    T: Debug,
    A: RawAlloc,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(self.as_slice(), f)
    }
}

// SAFETY: The buffer uniquely owns its elements, like a `Vec`.
unsafe impl<T: Send, A: RawAlloc + Send> Send for OwnedBuffer<T, A> {}
unsafe impl<T: Sync, A: RawAlloc + Sync> Sync for OwnedBuffer<T, A> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::testing::{self, CountingAlloc};
    use proptest::prelude::*;
    use std::{cell::Cell, rc::Rc};

    type Counted<T> = OwnedBuffer<T, CountingAlloc>;

    /// Increments a shared counter when dropped.
    #[derive(Clone)]
    struct DropCounter(Rc<Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    proptest! {
        #[test]
        fn span_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let buffer = OwnedBuffer::<u8>::from_span(Span::new(&bytes));
            prop_assert_eq!(buffer.as_span().as_slice(), &bytes[..]);
            prop_assert_eq!(buffer.len(), bytes.len());
        }
    }

    #[test]
    fn empty_buffer_is_sentinel_without_allocating() {
        let before = testing::allocations();
        let buffer = Counted::<u64>::from_slice_in(&[], CountingAlloc);
        assert!(buffer.is_sentinel());
        assert_eq!(buffer.as_ptr() as usize, mem::align_of::<u64>());
        assert_eq!(testing::allocations(), before);
    }

    #[test]
    fn sentinel_never_equals_a_real_allocation() {
        let empty = OwnedBuffer::<u8>::new();
        let buffers = (1..=64)
            .map(|len| OwnedBuffer::<u8>::from(vec![0; len]))
            .collect::<Vec<_>>();
        for buffer in &buffers {
            assert_ne!(buffer.as_ptr(), empty.as_ptr());
        }

        let empty = OwnedBuffer::<u32>::new();
        let buffer = OwnedBuffer::from_slice(&[1u32]);
        assert_ne!(buffer.as_ptr(), empty.as_ptr());
    }

    #[test]
    fn move_transfers_without_allocating() {
        let mut first = Counted::from_slice_in(&[1u8, 2, 3], CountingAlloc);
        let data = first.as_ptr();

        let allocations = testing::allocations();
        let second = first.take();
        assert_eq!(testing::allocations(), allocations);

        assert!(first.is_sentinel());
        assert_eq!(second.as_ptr(), data);
        assert_eq!(second.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let original = OwnedBuffer::<String>::from(vec!["a".to_owned(), "b".to_owned()]);
        let copy = original.clone();
        assert_eq!(copy, original);
        assert_ne!(copy.as_ptr(), original.as_ptr());
    }

    #[test]
    fn leak_and_adopt_frees_exactly_once() {
        let frees = testing::frees();
        let allocations = testing::allocations();

        let buffer = Counted::from_slice_in(&[10u16, 20, 30], CountingAlloc);
        let (ptr, len) = buffer.leak();
        assert_eq!(testing::frees(), frees);

        let adopted = unsafe { Counted::from_raw_parts_in(ptr, len, CountingAlloc) };
        assert_eq!(adopted.as_ptr(), ptr as *const _);
        assert_eq!(adopted.as_slice(), &[10, 20, 30]);
        drop(adopted);

        assert_eq!(testing::allocations(), allocations + 1);
        assert_eq!(testing::frees(), frees + 1);
    }

    #[test]
    fn adopting_empty_parts_yields_sentinel() {
        let (ptr, len) = OwnedBuffer::<u32>::new().leak();
        assert_eq!(len, 0);
        let adopted = unsafe { OwnedBuffer::<u32>::from_raw_parts(ptr, len) };
        assert!(adopted.is_sentinel());

        let adopted = unsafe { OwnedBuffer::<u32>::from_raw_parts(ptr::null_mut(), 0) };
        assert!(adopted.is_sentinel());
    }

    #[test]
    fn release_drops_elements_once_and_is_idempotent() {
        let drops = Rc::new(Cell::new(0));
        let mut buffer = Counted::from(vec![
            DropCounter(drops.clone()),
            DropCounter(drops.clone()),
        ]);
        let frees = testing::frees();

        buffer.release();
        assert_eq!(drops.get(), 2);
        assert_eq!(testing::frees(), frees + 1);
        assert!(buffer.is_sentinel());

        buffer.release();
        drop(buffer);
        assert_eq!(drops.get(), 2);
        assert_eq!(testing::frees(), frees + 1);
    }

    #[test]
    fn drop_raw_skips_element_destructors() {
        let drops = Rc::new(Cell::new(0));
        let buffer = Counted::from(vec![DropCounter(drops.clone())]);
        let frees = testing::frees();

        let (ptr, len) = buffer.leak();
        // Move the element out before freeing the storage.
        let element = unsafe { ptr::read(ptr) };
        unsafe { Counted::<DropCounter>::drop_raw_in(ptr, len, &CountingAlloc) };
        assert_eq!(testing::frees(), frees + 1);
        assert_eq!(drops.get(), 0);

        drop(element);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn drop_raw_ignores_sentinel() {
        let frees = testing::frees();
        let (ptr, len) = Counted::<u8>::new_in(CountingAlloc).leak();
        unsafe { Counted::<u8>::drop_raw_in(ptr, len, &CountingAlloc) };
        unsafe { Counted::<u8>::drop_raw_in(ptr::null_mut(), 0, &CountingAlloc) };
        assert_eq!(testing::frees(), frees);
    }

    #[test]
    fn adopts_memory_allocated_by_the_host() {
        let values = [7u32, 8, 9];
        let ptr = unsafe {
            alloc::realloc(
                ptr::null_mut(),
                0,
                mem::align_of::<u32>(),
                values.len() * mem::size_of::<u32>(),
            )
        }
        .cast::<u32>();
        unsafe { ptr.copy_from_nonoverlapping(values.as_ptr(), values.len()) };

        let adopted = unsafe { OwnedBuffer::<u32>::from_raw_parts(ptr, values.len()) };
        assert_eq!(adopted.as_ptr(), ptr as *const u32);
        assert_eq!(adopted.as_slice(), &values);
        drop(adopted);

        let empty = unsafe { alloc::realloc(ptr::null_mut(), 0, mem::align_of::<u32>(), 0) };
        let adopted = unsafe { OwnedBuffer::<u32>::from_raw_parts(empty.cast(), 0) };
        assert!(adopted.is_sentinel());
        assert_eq!(adopted.as_ptr(), empty as *const u32);
    }

    #[test]
    fn allocate_then_initialize() {
        let mut buffer = OwnedBuffer::<String>::allocate(3);
        assert_eq!(buffer.len(), 3);
        for (index, word) in ["x", "y", "z"].iter().enumerate() {
            buffer.write(index, word.to_string());
        }

        let buffer = unsafe { buffer.assume_init() };
        assert_eq!(buffer.to_vec(), vec!["x", "y", "z"]);
    }

    #[test]
    #[should_panic]
    fn write_out_of_bounds_panics() {
        let mut buffer = OwnedBuffer::<u8>::allocate(1);
        buffer.write(1, 0);
    }

    #[test]
    fn zero_sized_elements() {
        let drops = Rc::new(Cell::new(0));

        #[derive(Clone)]
        struct Unit;
        let buffer = OwnedBuffer::<Unit>::from_slice(&[Unit, Unit, Unit]);
        assert_eq!(buffer.len(), 3);
        assert!(!buffer.is_sentinel());
        drop(buffer);

        let buffer = OwnedBuffer::<DropCounter>::from(vec![DropCounter(drops.clone())]);
        drop(buffer);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn mutation_through_slice() {
        let mut buffer = OwnedBuffer::<u8>::from_slice(&[1, 2, 3]);
        buffer[1] = 42;
        buffer.as_mut_slice().reverse();
        assert_eq!(buffer.to_vec(), vec![3, 42, 1]);
    }
}
