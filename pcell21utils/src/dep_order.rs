//!
//! # Dependency-Ordering Trait and Helpers
//!

// Std-lib
use std::collections::HashSet;
use std::marker::PhantomData;

///
/// # Dependency-Ordering Trait
///
/// Cell hierarchies are directed graphs: each cell "depends on" the cells it instantiates.
/// Writers of hierarchical formats want those cells *leaves first*, each exactly once.
///
/// Implementers provide `process`, which pushes the direct dependencies of a single `item`
/// onto the [DepOrderer] via `orderer.push`. The orderer handles the depth-first recursion,
/// de-duplication (by the `Item`'s own [Eq] and [Hash], typically pointer identity),
/// and cycle detection. Cycles are reported through `fail`, which receives the item
/// found to (transitively) depend on itself.
///
/// ```text
/// struct CellOrder;
/// impl DepOrder for CellOrder {
///     type Item = Ptr<Cell>;
///     type Error = MyError;
///
///     fn process(item: &Self::Item, orderer: &mut DepOrderer<Self>) -> Result<(), Self::Error> {
///         for child in children(item) {
///             orderer.push(&child)?;
///         }
///         Ok(())
///     }
///     fn fail(item: &Self::Item) -> Result<(), Self::Error> {
///         Err(MyError::cycle(item))
///     }
/// }
/// let ordered = CellOrder::order(&[top])?;
/// ```
///
pub trait DepOrder: Sized {
    /// Item Type. Typically pointers or keys to the nodes in the dependency graph.
    type Item: Clone + Eq + std::hash::Hash;
    /// Error Type
    type Error;

    /// Dependency-order all entries in `items`, plus everything they depend on
    fn order(items: &[Self::Item]) -> Result<Vec<Self::Item>, Self::Error> {
        DepOrderer::<Self>::order(items)
    }

    /// Push the direct dependencies of `item` onto `orderer`
    fn process(item: &Self::Item, orderer: &mut DepOrderer<Self>) -> Result<(), Self::Error>;
    /// Failure-handler, called with the item closing a dependency cycle
    fn fail(item: &Self::Item) -> Result<(), Self::Error>;
}

/// # Dependency Order Helper
///
/// Public solely for use in the call-signature of [DepOrder::process].
pub struct DepOrderer<P: DepOrder> {
    /// Ordered, completed items
    stack: Vec<P::Item>,
    /// Completed items, for quick membership tests
    seen: HashSet<P::Item>,
    /// Items with an open frame on the depth-first stack
    pending: HashSet<P::Item>,
    p: PhantomData<P>,
}
impl<P: DepOrder> DepOrderer<P> {
    /// Dependency-order all entries in slice `items`
    pub fn order(items: &[P::Item]) -> Result<Vec<P::Item>, P::Error> {
        let mut this = Self {
            stack: Vec::with_capacity(items.len()),
            seen: HashSet::with_capacity(items.len()),
            pending: HashSet::new(),
            p: PhantomData,
        };
        for item in items.iter() {
            this.push(item)?;
        }
        Ok(this.stack)
    }
    /// Push `item`'s dependencies, and then itself, onto the stack
    pub fn push(&mut self, item: &P::Item) -> Result<(), P::Error> {
        if self.seen.contains(item) {
            return Ok(());
        }
        // An item already pending is an ancestor of itself
        if !self.pending.insert(item.clone()) {
            return P::fail(item);
        }
        P::process(item, self)?;
        self.pending.remove(item);
        self.seen.insert(item.clone());
        self.stack.push(item.clone());
        Ok(())
    }
}
