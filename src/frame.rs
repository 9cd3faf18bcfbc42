// Copyright (c) 2026 rezky_nightky

use std::collections::TryReserveError;

use crate::cell::Cell;

fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>, TryReserveError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, value);
    Ok(v)
}

/// Display buffer the renderer writes into. Presentation only emits the
/// cells marked dirty since the last `clear_dirty`.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    /// Allocates a blank `width` x `height` grid, reporting allocation
    /// failure instead of aborting.
    pub fn try_new(width: u16, height: u16) -> Result<Self, TryReserveError> {
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            cells: try_filled(len, Cell::blank())?,
            dirty_all: true,
            dirty_map: try_filled(len, false)?,
            dirty: Vec::new(),
        })
    }

    #[cfg(test)]
    pub fn new(width: u16, height: u16) -> Self {
        Self::try_new(width, height).unwrap()
    }

    /// Overwrites every cell with `cell`, marking only the ones that change.
    pub fn fill(&mut self, cell: Cell) {
        for i in 0..self.cells.len() {
            self.set_index(i, cell);
        }
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn has_changes(&self) -> bool {
        self.dirty_all || !self.dirty.is_empty()
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
            self.dirty.clear();
            return;
        }

        for &i in &self.dirty {
            if let Some(v) = self.dirty_map.get_mut(i) {
                *v = false;
            }
        }
        self.dirty.clear();
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells.get(i).copied().unwrap_or_else(Cell::blank)
    }

    /// Writes `cell` at signed coordinates; anything off-grid is dropped.
    pub fn put(&mut self, x: i32, y: i32, cell: Cell) {
        let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
            return;
        };
        self.set(x, y, cell);
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.set_index(i, cell);
        }
    }

    fn set_index(&mut self, i: usize, cell: Cell) {
        if self.cells[i] == cell {
            return;
        }
        self.cells[i] = cell;
        if !self.dirty_all && !self.dirty_map[i] {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }
}
