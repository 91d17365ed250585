//! Single-threaded shared handles.

use std::{
    cell::{Ref, RefCell, RefMut},
    rc::{Rc, Weak},
};

/// A single-threaded, reference-counted resource with interior mutability.
///
/// `StResource` is the handle the streaming manager uses to share a chunk between
/// its chunk table and its remesh queue. Two handles are the *same* resource only
/// if they point at the same allocation, which is how a queued job detects that
/// its chunk was unloaded and reloaded under the same key.
///
/// # Examples
///
/// ```
/// use voxel_streaming::core::StResource;
///
/// let counter = StResource::new(0);
/// let alias = counter.clone();
/// *alias.get_mut() += 1;
///
/// assert_eq!(*counter.get(), 1);
/// assert!(counter.ptr_eq(&alias));
/// assert!(!counter.ptr_eq(&StResource::new(1)));
/// ```
///
/// # Panics
/// Borrowing follows `RefCell` rules: taking `get_mut()` while any other guard on
/// the same resource is alive panics.
#[derive(Debug)]
pub struct StResource<T> {
    resource: Rc<RefCell<T>>,
}

impl<T> StResource<T> {
    /// Creates a new `StResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Rc::new(RefCell::new(resource)),
        }
    }

    /// Returns a read-only guard on the contained value.
    pub fn get(&self) -> Ref<'_, T> {
        self.resource.borrow()
    }

    /// Returns a mutable guard on the contained value.
    pub fn get_mut(&self) -> RefMut<'_, T> {
        self.resource.borrow_mut()
    }

    /// Returns `true` if both handles refer to the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.resource, &other.resource)
    }

    /// Creates a non-owning reference that does not keep the value alive.
    pub fn downgrade(&self) -> Weak<RefCell<T>> {
        Rc::downgrade(&self.resource)
    }

    /// Returns `true` if `weak` was downgraded from this very resource.
    pub fn refers_to(&self, weak: &Weak<RefCell<T>>) -> bool {
        std::ptr::eq(Rc::as_ptr(&self.resource), weak.as_ptr())
    }
}

impl<T> Clone for StResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}
