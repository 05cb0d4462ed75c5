use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A cell position, row-major. `row` counts down from the top, `col` right from the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self { Coord { row, col } }
}

/// Which way a line runs through the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    /// Coordinate of the `pos`-th cell along line `index`.
    #[inline]
    pub fn coord(self, index: usize, pos: usize) -> Coord {
        match self {
            Axis::Row => Coord::new(index, pos),
            Axis::Column => Coord::new(pos, index),
        }
    }
}

/// Square matrix of tile values, 0 meaning empty.
///
/// Cells are stored row-major in a flat `Vec`. Slide merges keep every value a
/// power of two; chain merges write `value * chain_len`, which need not be.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<u32>,
}

impl Grid {
    /// An empty `size`x`size` grid.
    pub fn new(size: usize) -> Result<Self, EngineError> {
        if size < 2 {
            return Err(EngineError::GridTooSmall(size));
        }
        Ok(Grid { size, cells: vec![0; size * size] })
    }

    /// Build a grid from explicit rows.
    ///
    /// ```
    /// use tile_merge::engine::{Coord, Grid};
    /// let g = Grid::from_rows(vec![vec![2, 0], vec![0, 4]]).unwrap();
    /// assert_eq!(g.get(Coord::new(1, 1)).unwrap(), 4);
    /// assert_eq!(g.count_empty(), 2);
    /// ```
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, EngineError> {
        let size = rows.len();
        let mut grid = Grid::new(size)?;
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(EngineError::NotSquare { row: r, expected: size, found: row.len() });
            }
            grid.cells[r * size..(r + 1) * size].copy_from_slice(&row);
        }
        Ok(grid)
    }

    #[inline]
    pub fn size(&self) -> usize { self.size }

    #[inline]
    pub fn in_bounds(&self, coord: Coord) -> bool { coord.row < self.size && coord.col < self.size }

    pub fn check(&self, coord: Coord) -> Result<(), EngineError> {
        if self.in_bounds(coord) {
            Ok(())
        } else {
            Err(EngineError::OutOfBounds { coord, size: self.size })
        }
    }

    pub fn get(&self, coord: Coord) -> Result<u32, EngineError> {
        self.check(coord)?;
        Ok(self.cells[self.index(coord)])
    }

    pub fn set(&mut self, coord: Coord, value: u32) -> Result<(), EngineError> {
        self.check(coord)?;
        let idx = self.index(coord);
        self.cells[idx] = value;
        Ok(())
    }

    /// Unchecked read for coordinates the engine produced itself.
    #[inline]
    pub(crate) fn at(&self, coord: Coord) -> u32 {
        debug_assert!(self.in_bounds(coord));
        self.cells[self.index(coord)]
    }

    #[inline]
    pub(crate) fn put(&mut self, coord: Coord, value: u32) {
        debug_assert!(self.in_bounds(coord));
        let idx = self.index(coord);
        self.cells[idx] = value;
    }

    #[inline]
    fn index(&self, coord: Coord) -> usize { coord.row * self.size + coord.col }

    /// Iterate `(coord, value)` over every cell, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = (Coord, u32)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &v)| (Coord::new(i / size, i % size), v))
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Coord> {
        self.tiles().filter(|&(_, v)| v == 0).map(|(c, _)| c).collect()
    }

    pub fn count_empty(&self) -> usize { self.cells.iter().filter(|&&v| v == 0).count() }

    pub fn is_full(&self) -> bool { self.cells.iter().all(|&v| v != 0) }

    /// Highest tile value present, 0 on an empty grid.
    pub fn highest_tile(&self) -> u32 { self.cells.iter().copied().max().unwrap_or(0) }

    /// Smallest non-zero tile value, if any.
    pub fn lowest_tile(&self) -> Option<u32> { self.cells.iter().copied().filter(|&v| v != 0).min() }

    /// Empty every cell.
    pub fn clear(&mut self) { self.cells.iter_mut().for_each(|v| *v = 0); }

    pub fn contains(&self, value: u32) -> bool { self.cells.contains(&value) }

    /// Read line `index` along `axis` in ascending position order.
    pub fn line(&self, index: usize, axis: Axis) -> Vec<u32> {
        (0..self.size).map(|pos| self.at(axis.coord(index, pos))).collect()
    }

    pub fn set_line(&mut self, index: usize, axis: Axis, tiles: &[u32]) {
        debug_assert_eq!(tiles.len(), self.size);
        for (pos, &v) in tiles.iter().enumerate() {
            self.put(axis.coord(index, pos), v);
        }
    }

    /// Copy out as nested rows.
    pub fn rows(&self) -> Vec<Vec<u32>> { self.cells.chunks(self.size).map(|r| r.to_vec()).collect() }

    /// True when two orthogonal neighbours hold the same non-zero value.
    ///
    /// Pairs whose sum would overflow `u32` cannot merge and are skipped.
    /// Scanning right and down neighbours covers every pair.
    pub fn has_orthogonal_pair(&self) -> bool {
        for (coord, v) in self.tiles() {
            if v == 0 || v.checked_mul(2).is_none() {
                continue;
            }
            if coord.col + 1 < self.size && self.at(Coord::new(coord.row, coord.col + 1)) == v {
                return true;
            }
            if coord.row + 1 < self.size && self.at(Coord::new(coord.row + 1, coord.col)) == v {
                return true;
            }
        }
        false
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grid({:?})", self.rows())
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(self.size * 8 - 1);
        writeln!(f)?;
        for (r, row) in self.cells.chunks(self.size).enumerate() {
            if r > 0 {
                writeln!(f, "{}", rule)?;
            }
            let cells: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(val: u32) -> String {
    match val {
        0 => String::from("       "),
        x => format!("{:^7}", x),
    }
}
