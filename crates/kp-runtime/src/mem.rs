//! Flat cell store addressed by byte offsets.

use kp_contracts::MEM_CELLS;

const LAST_CELL: i64 = MEM_CELLS as i64 - 1;

/// Maps a byte address to a cell index, aliasing out-of-range addresses onto the first or
/// last cell. Division truncates toward zero, so `-1..=-3` land on cell 0 as well.
#[inline]
pub fn cell_index(addr: i64) -> usize {
    let idx = addr / 4;
    if idx < 0 {
        tracing::trace!(addr, "address below cell store, using cell 0");
        0
    } else if idx > LAST_CELL {
        tracing::trace!(addr, "address past cell store, using last cell");
        LAST_CELL as usize
    } else {
        idx as usize
    }
}

/// Object-relative address; widened so `obj + off` never wraps.
#[inline]
pub fn field_addr(obj: i32, off: i32) -> i64 {
    i64::from(obj) + i64::from(off)
}

pub struct CellStore {
    cells: Box<[i32]>,
}

impl CellStore {
    pub fn new() -> Self {
        CellStore {
            cells: vec![0; MEM_CELLS].into_boxed_slice(),
        }
    }

    pub fn get(&self, addr: i32) -> i32 {
        self.cells[cell_index(i64::from(addr))]
    }

    pub fn set(&mut self, addr: i32, value: i32) {
        self.cells[cell_index(i64::from(addr))] = value;
    }

    pub fn field_get(&self, obj: i32, off: i32) -> i32 {
        self.cells[cell_index(field_addr(obj, off))]
    }

    pub fn field_set(&mut self, value: i32, obj: i32, off: i32) {
        self.cells[cell_index(field_addr(obj, off))] = value;
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.cells
    }
}

impl Default for CellStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CellStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.cells.iter().filter(|&&c| c != 0).count();
        f.debug_struct("CellStore")
            .field("cells", &self.cells.len())
            .field("nonzero", &used)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let store = CellStore::new();
        assert_eq!(store.as_slice().len(), MEM_CELLS);
        assert!(store.as_slice().iter().all(|&c| c == 0));
    }

    #[test]
    fn byte_offsets_share_a_cell() {
        let mut store = CellStore::new();
        store.set(8, 77);
        assert_eq!(store.get(8), 77);
        assert_eq!(store.get(9), 77);
        assert_eq!(store.get(11), 77);
        assert_eq!(store.get(12), 0);
    }

    #[test]
    fn negative_addresses_alias_first_cell() {
        let mut store = CellStore::new();
        store.set(-4, 5);
        assert_eq!(store.get(0), 5);
        store.set(i32::MIN, 6);
        assert_eq!(store.get(0), 6);
        assert_eq!(store.get(-1), 6);
    }

    #[test]
    fn overflowing_addresses_alias_last_cell() {
        let mut store = CellStore::new();
        store.set(4 * MEM_CELLS as i32, 9);
        assert_eq!(store.get(4 * (MEM_CELLS as i32 - 1)), 9);
        assert_eq!(store.get(i32::MAX), 9);
    }

    #[test]
    fn field_access_adds_offset_without_wrapping() {
        let mut store = CellStore::new();
        store.field_set(42, 100, 8);
        assert_eq!(store.get(108), 42);
        assert_eq!(store.field_get(104, 4), 42);

        // i32::MAX + 4 would wrap to a negative address in 32-bit arithmetic.
        store.field_set(3, i32::MAX, 4);
        assert_eq!(store.get(4 * (MEM_CELLS as i32 - 1)), 3);
        assert_eq!(store.get(0), 0);
    }
}
