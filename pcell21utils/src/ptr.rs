//!
//! # Shared-Pointer Types
//!

// Std-lib
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, RwLock};

// Crates.io
use by_address::ByAddress;

///
/// # Ptr
///
/// Reference-counted, lockable pointer, used for cells shared among many parents.
///
/// Equality and hashing are *by address*, via [ByAddress].
/// Two [Ptr]s compare equal only if they point at the same allocation,
/// regardless of whether their contents happen to be equal.
/// Hierarchy walks (dependency closures, GDS export, circuit composition)
/// rely on this: a cell instantiated a hundred times is visited once,
/// and two distinct cells which share a name are never merged.
///
/// Content access goes through the inner [RwLock]:
///
/// ```text
/// let cell = ptr.read()?;   // `?` converts the [std::sync::PoisonError]
/// println!("{}", cell.name);
/// ```
///
/// Guards should be dropped before recursing into anything reachable from the pointee.
/// Walkers generally copy out what they need (e.g. a list of child [Ptr]s) first.
///
#[derive(Debug, Default)]
pub struct Ptr<T: ?Sized>(ByAddress<Arc<RwLock<T>>>);

impl<T> Ptr<T> {
    /// Pointer Constructor
    pub fn new(t: T) -> Self {
        Self(ByAddress(Arc::new(RwLock::new(t))))
    }
    /// Boolean indication of whether `a` and `b` point at the same data
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
    /// Number of live [Ptr]s to the same data
    pub fn count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}
impl<T> From<T> for Ptr<T> {
    fn from(t: T) -> Self {
        Self::new(t)
    }
}
/// Dereference straight through to the inner [RwLock], so `ptr.read()` and `ptr.write()` just work.
impl<T> Deref for Ptr<T> {
    type Target = RwLock<T>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
// The [Deref] implementation above defeats `derive` for these. They're all short.
impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        Self(ByAddress::clone(&self.0))
    }
}
impl<T> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}
impl<T> Eq for Ptr<T> {}
impl<T> Hash for Ptr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

///
/// # Pointer List
///
/// Insertion-ordered list of [Ptr]s, holding each pointee at most once.
/// Membership is by identity, as for [Ptr] itself.
///
#[derive(Debug, Clone)]
pub struct PtrList<T> {
    /// Entries, in insertion order
    ptrs: Vec<Ptr<T>>,
    /// Set of the same entries, for quick membership tests
    seen: HashSet<Ptr<T>>,
}
impl<T> PtrList<T> {
    /// Create a new and empty [PtrList]. Also available via [Default].
    pub fn new() -> Self {
        Self {
            ptrs: Vec::new(),
            seen: HashSet::new(),
        }
    }
    /// Add an owned `T`-convertible value. Returns a [Ptr] to it.
    pub fn add(&mut self, t: impl Into<T>) -> Ptr<T> {
        let ptr = Ptr::new(t.into());
        self.insert(&ptr);
        ptr
    }
    /// Insert an existing [Ptr].
    /// Returns `false`, and leaves the list unchanged, if it was already present.
    pub fn insert(&mut self, ptr: &Ptr<T>) -> bool {
        if !self.seen.insert(ptr.clone()) {
            return false;
        }
        self.ptrs.push(ptr.clone());
        true
    }
    /// Boolean indication of whether `ptr` is in the list
    pub fn contains(&self, ptr: &Ptr<T>) -> bool {
        self.seen.contains(ptr)
    }
    /// Slice of all entries, in insertion order
    pub fn as_slice(&self) -> &[Ptr<T>] {
        &self.ptrs
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Ptr<T>> {
        self.ptrs.iter()
    }
    pub fn len(&self) -> usize {
        self.ptrs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }
}
impl<T> Default for PtrList<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> From<Vec<Ptr<T>>> for PtrList<T> {
    /// Create from a vector of [Ptr]s, dropping repeats
    fn from(v: Vec<Ptr<T>>) -> Self {
        let mut list = Self::new();
        for ptr in v.iter() {
            list.insert(ptr);
        }
        list
    }
}
impl<'a, T> IntoIterator for &'a PtrList<T> {
    type Item = &'a Ptr<T>;
    type IntoIter = std::slice::Iter<'a, Ptr<T>>;
    fn into_iter(self) -> Self::IntoIter {
        self.ptrs.iter()
    }
}
