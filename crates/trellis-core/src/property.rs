//! # Observable properties
//!
//! Widgets expose their state as `Property<T>` fields. A property is a
//! cloneable handle: the widget, the application and any number of skins can
//! hold one, but only the widget's public API is expected to write.
//!
//! ```rust
//! use trellis_core::Property;
//! use std::{cell::Cell, rc::Rc};
//!
//! let value = Property::new(0.0_f64);
//! let seen = Rc::new(Cell::new(0.0));
//! let sub = value.subscribe({
//!     let seen = seen.clone();
//!     move |_old, new| seen.set(*new)
//! });
//!
//! value.set(42.0);
//! assert_eq!(seen.get(), 42.0);
//!
//! sub.release();
//! value.set(7.0);
//! assert_eq!(seen.get(), 42.0);
//! ```
//!
//! Listeners fire in subscription order, only when the value actually
//! changes, and without any internal borrow held, so a listener may read or
//! write the same property.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

type Listener<T> = Rc<dyn Fn(&T, &T)>;

pub struct Property<T: 'static>(Rc<Inner<T>>);

struct Inner<T> {
    value: RefCell<T>,
    listeners: RefCell<SmallVec<[(u64, Listener<T>); 2]>>,
    next_id: Cell<u64>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &*self.0.value.borrow())
            .field("listeners", &self.0.listeners.borrow().len())
            .finish()
    }
}

impl<T: 'static> Property<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(Inner {
            value: RefCell::new(value),
            listeners: RefCell::new(SmallVec::new()),
            next_id: Cell::new(0),
        }))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.value.borrow())
    }

    /// Stores `v` and notifies listeners with `(old, new)`. Setting an equal
    /// value is a no-op.
    pub fn set(&self, v: T)
    where
        T: Clone + PartialEq,
    {
        if *self.0.value.borrow() == v {
            return;
        }
        let old = self.0.value.replace(v.clone());
        self.notify(&old, &v);
    }

    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: Clone + PartialEq,
    {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    pub fn subscribe(&self, f: impl Fn(&T, &T) + 'static) -> Subscription {
        let id = self.0.next_id.get();
        self.0.next_id.set(id + 1);
        self.0.listeners.borrow_mut().push((id, Rc::new(f)));

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.0);
        let weak: Weak<dyn ListenerList> = weak;
        Subscription {
            source: Rc::as_ptr(&self.0) as *const () as usize,
            id,
            list: Some(weak),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.0.listeners.borrow().len()
    }

    /// Identity of the underlying property, shared by all clones.
    pub fn source_id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    fn notify(&self, old: &T, new: &T) {
        let listeners: SmallVec<[Listener<T>; 4]> = self
            .0
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for l in listeners {
            l(old, new);
        }
    }
}

trait ListenerList {
    fn remove(&self, id: u64);
}

impl<T> ListenerList for Inner<T> {
    fn remove(&self, id: u64) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }
}

/// Handle for one listener. Releasing (explicitly or by drop) detaches the
/// listener; releasing after the property is gone is a no-op.
#[must_use = "dropping a Subscription detaches its listener"]
pub struct Subscription {
    source: usize,
    id: u64,
    list: Option<Weak<dyn ListenerList>>,
}

impl Subscription {
    pub fn source_id(&self) -> usize {
        self.source
    }

    pub fn is_active(&self) -> bool {
        self.list
            .as_ref()
            .is_some_and(|w| w.strong_count() > 0)
    }

    pub fn release(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(list) = self.list.take().and_then(|w| w.upgrade()) {
            list.remove(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("source", &self.source)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

pub fn property<T>(t: T) -> Property<T> {
    Property::new(t)
}
