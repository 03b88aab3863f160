//! Object handle table
//!
//! A fixed-capacity arena of slots indexed by the small integers records use
//! to name objects. Creation takes the lowest free slot; deletion empties it.

use log::warn;

use crate::error::ReplayErrorKind;
use crate::objects::GdiObject;

#[derive(Debug, Clone, Default)]
pub struct HandleTable {
    slots: Vec<Option<GdiObject>>,
}

impl HandleTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `object` in the lowest free slot and return its handle.
    pub fn insert(&mut self, object: GdiObject) -> Result<u16, ReplayErrorKind> {
        let capacity = self.capacity();
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(ReplayErrorKind::HandleTableExhausted { capacity })?;
        self.slots[index] = Some(object);
        Ok(index as u16)
    }

    pub fn get(&self, handle: u16) -> Result<&GdiObject, ReplayErrorKind> {
        self.slots
            .get(handle as usize)
            .and_then(Option::as_ref)
            .ok_or(ReplayErrorKind::InvalidHandle { handle })
    }

    /// Empty a slot. Deleting an already empty slot only logs a warning;
    /// a handle past the end of the table is an error.
    pub fn delete(&mut self, handle: u16) -> Result<Option<GdiObject>, ReplayErrorKind> {
        let slot = self
            .slots
            .get_mut(handle as usize)
            .ok_or(ReplayErrorKind::InvalidHandle { handle })?;
        let removed = slot.take();
        if removed.is_none() {
            warn!("DeleteObject on empty handle {}", handle);
        }
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Brush, Pen};
    use std::rc::Rc;

    fn pen() -> GdiObject {
        GdiObject::Pen(Rc::new(Pen::default()))
    }

    #[test]
    fn test_lowest_free_slot_is_reused() {
        let mut table = HandleTable::new(3);
        assert_eq!(table.insert(pen()), Ok(0));
        assert_eq!(table.insert(pen()), Ok(1));
        table.delete(0).unwrap();
        assert_eq!(
            table.insert(GdiObject::Brush(Rc::new(Brush::Null))),
            Ok(0)
        );
        assert_eq!(table.get(0).map(GdiObject::kind_name), Ok("brush"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_exhausted() {
        let mut table = HandleTable::new(1);
        table.insert(pen()).unwrap();
        assert_eq!(
            table.insert(pen()),
            Err(ReplayErrorKind::HandleTableExhausted { capacity: 1 })
        );
    }

    #[test]
    fn test_empty_and_out_of_range_handles() {
        let mut table = HandleTable::new(2);
        assert_eq!(
            table.get(1).err(),
            Some(ReplayErrorKind::InvalidHandle { handle: 1 })
        );
        assert_eq!(
            table.get(5).err(),
            Some(ReplayErrorKind::InvalidHandle { handle: 5 })
        );
        assert_eq!(table.delete(1), Ok(None));
        assert_eq!(
            table.delete(9),
            Err(ReplayErrorKind::InvalidHandle { handle: 9 })
        );
    }

    #[test]
    fn test_clear() {
        let mut table = HandleTable::new(2);
        table.insert(pen()).unwrap();
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 2);
    }
}
