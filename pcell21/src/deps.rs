//!
//! # Dependency Resolution
//!
//! Walks the "instantiates" graph among [Cell]s, by identity.
//!

// Local imports
use crate::{
    data::Cell,
    utils::{DepOrder, DepOrderer, Ptr, PtrList},
    LayoutError, LayoutResult,
};

/// Dependency-orderer for [Cell] pointers.
/// Children are copied out of each cell before recursing, so no lock is held while descending.
struct CellOrder;
impl DepOrder for CellOrder {
    type Item = Ptr<Cell>;
    type Error = LayoutError;

    fn process(item: &Ptr<Cell>, orderer: &mut DepOrderer<Self>) -> LayoutResult<()> {
        let children = children(&*item.read()?);
        for child in children.iter() {
            orderer.push(child)?;
        }
        Ok(())
    }
    fn fail(item: &Ptr<Cell>) -> LayoutResult<()> {
        let name = item.read()?.name.clone();
        Err(LayoutError::CyclicReference(name))
    }
}

/// Direct children of `cell`, each once, in instance order
fn children(cell: &Cell) -> PtrList<Cell> {
    let ptrs = cell.insts.iter().map(|i| i.cell.clone()).collect::<Vec<_>>();
    PtrList::from(ptrs)
}

/// Cells referenced by `root`, excluding itself.
///
/// If `recursive`, the full transitive closure, leaves first.
/// Otherwise only its direct children, in instance order.
/// Fails with [LayoutError::CyclicReference] on cycles.
pub fn dependencies(root: &Ptr<Cell>, recursive: bool) -> LayoutResult<Vec<Ptr<Cell>>> {
    if !recursive {
        let cell = root.read()?;
        return Ok(children(&cell).as_slice().to_vec());
    }
    let mut ordered = CellOrder::order(&[root.clone()])?;
    // The root always comes last
    ordered.pop();
    Ok(ordered)
}

/// Order `cells` and all of their dependencies, leaves first, each exactly once
pub fn order(cells: &[Ptr<Cell>]) -> LayoutResult<Vec<Ptr<Cell>>> {
    CellOrder::order(cells)
}

impl Cell {
    /// Cells referenced by this one. See [dependencies].
    pub fn dependencies(&self, recursive: bool) -> LayoutResult<Vec<Ptr<Cell>>> {
        let children = children(self);
        if !recursive {
            return Ok(children.as_slice().to_vec());
        }
        order(children.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Instance;

    fn leaf(name: &str) -> Ptr<Cell> {
        Ptr::new(Cell::new(name))
    }
    fn parent(name: &str, kids: &[&Ptr<Cell>]) -> Ptr<Cell> {
        let mut cell = Cell::new(name);
        for (k, kid) in kids.iter().enumerate() {
            cell.add_instance(Instance::new(format!("i{}", k), kid));
        }
        Ptr::new(cell)
    }
    fn names(ptrs: &[Ptr<Cell>]) -> LayoutResult<Vec<String>> {
        let mut rv = Vec::new();
        for p in ptrs {
            rv.push(p.read()?.name.clone());
        }
        Ok(rv)
    }

    #[test]
    fn test_leaves_first() -> LayoutResult<()> {
        let a = leaf("a");
        let b = parent("b", &[&a]);
        let c = parent("c", &[&a, &b, &a]);
        let top = parent("top", &[&c, &b]);

        assert_eq!(names(&dependencies(&top, false)?)?, vec!["c", "b"]);
        assert_eq!(names(&dependencies(&top, true)?)?, vec!["a", "b", "c"]);
        assert_eq!(names(&top.read()?.dependencies(true)?)?, vec!["a", "b", "c"]);
        assert!(dependencies(&a, true)?.is_empty());
        Ok(())
    }
    #[test]
    fn test_identity_not_name() -> LayoutResult<()> {
        // Two distinct cells sharing a name are both reported
        let a1 = leaf("a");
        let a2 = leaf("a");
        let top = parent("top", &[&a1, &a2]);
        let deps = dependencies(&top, true)?;
        assert_eq!(deps.len(), 2);
        assert!(Ptr::ptr_eq(&deps[0], &a1));
        assert!(Ptr::ptr_eq(&deps[1], &a2));
        Ok(())
    }
    #[test]
    fn test_cycle() -> LayoutResult<()> {
        let a = leaf("a");
        let b = parent("b", &[&a]);
        a.write()?.add_instance(Instance::new("back", &b));
        match dependencies(&a, true) {
            Err(LayoutError::CyclicReference(name)) => assert_eq!(name, "a"),
            other => panic!("Expected CyclicReference, got {:?}", other),
        }
        // Break the cycle, so the pointers can be dropped
        a.write()?.insts.clear();
        Ok(())
    }
}
