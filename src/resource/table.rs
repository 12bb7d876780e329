//! Mapping between integer ids and resource instances.

use std::collections::BTreeMap;

/// The id of a resource stored in a [`ResourceTable`].
pub type ResourceId = i32;

/// A table mapping ids to resource instances of type `R`.
///
/// Ids start at `1` and are handed out in strictly increasing order. An id is
/// never handed out twice by the same table, even after its resource has been
/// removed.
///
/// The table is not synchronized. It is meant to be owned by whatever needs
/// it, or declared per thread with [`resource_table!`](crate::resource_table).
#[derive(Debug)]
pub struct ResourceTable<R> {
    resources: BTreeMap<ResourceId, R>,
    last_id: ResourceId,
}

impl<R> ResourceTable<R> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
            last_id: 0,
        }
    }

    /// Moves `value` into the table and returns its new id.
    ///
    /// # Panics
    ///
    /// Panics if the table has run out of ids.
    pub fn store(&mut self, value: R) -> ResourceId {
        let id = self
            .last_id
            .checked_add(1)
            .expect("resource table ran out of ids");
        self.last_id = id;
        self.resources.insert(id, value);

        log::trace!("stored resource {}", id);
        id
    }

    /// Returns a reference to the resource with the specified id.
    pub fn lookup(&self, id: ResourceId) -> Option<&R> {
        self.resources.get(&id)
    }

    /// Returns a mutable reference to the resource with the specified id.
    pub fn lookup_mut(&mut self, id: ResourceId) -> Option<&mut R> {
        self.resources.get_mut(&id)
    }

    /// Removes the resource with the specified id, returning it.
    pub fn remove(&mut self, id: ResourceId) -> Option<R> {
        let value = self.resources.remove(&id);
        if value.is_some() {
            log::trace!("removed resource {}", id);
        }
        value
    }

    /// Returns `true` if a resource with the specified id is stored.
    pub fn contains(&self, id: ResourceId) -> bool {
        self.resources.contains_key(&id)
    }

    /// Returns the number of stored resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` if no resources are stored.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterates over the stored resources in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &R)> + '_ {
        self.resources.iter().map(|(id, value)| (*id, value))
    }
}

impl<R> Default for ResourceTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Declares a thread-local [`ResourceTable`] for bindings that must reach a
/// table from `extern "C"` entry points.
///
/// ```
/// wit_guest::resource_table! {
///     static FILES: String;
/// }
///
/// let id = FILES.with(|files| files.borrow_mut().store("a.txt".to_owned()));
/// assert_eq!(id, 1);
/// ```
#[macro_export]
macro_rules! resource_table {
    ($(#[$attr:meta])* $vis:vis static $name:ident: $ty:ty;) => {
        ::std::thread_local! {
            $(#[$attr])*
            $vis static $name: ::std::cell::RefCell<$crate::resource::ResourceTable<$ty>> =
                ::std::cell::RefCell::new($crate::resource::ResourceTable::new());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Rec {
        a: u32,
        b: i8,
    }

    #[test]
    fn store_lookup_remove() {
        let mut table = ResourceTable::new();
        let id = table.store(Rec {
            a: 0xCAFEBABE,
            b: -128,
        });
        assert_eq!(id, 1);

        let rec = table.lookup(id).unwrap();
        assert_eq!((rec.a, rec.b), (0xCAFEBABE, -128));

        assert_eq!(
            table.remove(id),
            Some(Rec {
                a: 0xCAFEBABE,
                b: -128
            })
        );
        assert!(table.lookup(id).is_none());
        assert!(table.remove(id).is_none());
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut table = ResourceTable::new();
        let ids = (0..5).map(|i| table.store(i)).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        table.remove(5);
        table.remove(2);
        assert_eq!(table.store(42), 6);
        assert_eq!(table.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![1, 3, 4, 6]);
    }

    #[test]
    fn lookup_mut_updates_in_place() {
        let mut table = ResourceTable::new();
        let id = table.store(vec![1u8]);
        table.lookup_mut(id).unwrap().push(2);
        assert_eq!(table.lookup(id), Some(&vec![1, 2]));
        assert!(table.lookup_mut(id + 1).is_none());
        assert!(table.contains(id));
        assert_eq!(table.len(), 1);
    }

    #[test]
    #[should_panic(expected = "ran out of ids")]
    fn exhausting_ids_panics() {
        let mut table = ResourceTable::new();
        table.last_id = ResourceId::MAX;
        table.store(());
    }

    resource_table! {
        static PER_THREAD: &'static str;
    }

    #[test]
    fn thread_local_tables_are_independent() {
        let id = PER_THREAD.with(|table| table.borrow_mut().store("main"));
        let other = std::thread::spawn(|| {
            PER_THREAD.with(|table| table.borrow_mut().store("other"))
        })
        .join()
        .unwrap();

        assert_eq!((id, other), (1, 1));
        assert!(PER_THREAD.with(|table| table.borrow().lookup(1) == Some(&"main")));
    }
}
