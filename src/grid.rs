// src/grid.rs
use std::fmt;
use crate::drivers::DimensionError;

pub const MIN_DIMENSION: u16 = 1;
pub const MAX_DIMENSION: u16 = 64;

// pixel geometry of the cell grid
pub const LEFT_BOUND: f32 = 20.0;
pub const TOP_BOUND: f32 = 20.0;
pub const SPACING: f32 = 2.0;
pub const CELL_SIZE: f32 = 8.0;

/// Number of cells along one axis, always within `1..=64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridDimension(u16);

impl GridDimension {
    pub fn new(value: i64) -> Result<Self, DimensionError> {
        if (MIN_DIMENSION as i64..=MAX_DIMENSION as i64).contains(&value) {
            Ok(Self(value as u16))
        } else {
            Err(DimensionError::OutOfRange { value, min: MIN_DIMENSION, max: MAX_DIMENSION })
        }
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for GridDimension {
    fn default() -> Self {
        GridDimension(MAX_DIMENSION)
    }
}

impl fmt::Display for GridDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validates a dimension typed by the user. Nothing is applied here; callers act only on `Ok`.
pub fn parse_dimension(text: &str) -> Result<GridDimension, DimensionError> {
    let trimmed = text.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| DimensionError::NotANumber(trimmed.to_owned()))?;
    GridDimension::new(value)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Editable text bound to a dimension. On a rejected commit the text snaps back to the last valid value.
#[derive(Clone, Debug)]
pub struct DimensionInput {
    text: String,
    value: GridDimension,
}

impl DimensionInput {
    pub fn new(value: GridDimension) -> Self {
        Self { text: value.to_string(), value }
    }

    pub fn value(&self) -> GridDimension {
        self.value
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    // handed to the text widget while the user is typing
    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    /// Returns `Ok(Some(_))` only when the committed value differs from the current one.
    pub fn commit(&mut self) -> Result<Option<GridDimension>, DimensionError> {
        match parse_dimension(&self.text) {
            Ok(candidate) => {
                self.text = candidate.to_string();
                if candidate == self.value {
                    Ok(None)
                } else {
                    self.value = candidate;
                    Ok(Some(candidate))
                }
            }
            Err(err) => {
                self.text = self.value.to_string();
                Err(err)
            }
        }
    }
}

/// Position of one cell relative to the canvas origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl CellRect {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn overlaps(&self, other: &CellRect) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }
}

/// Row-major `columns x rows` cell layout. Any dimension change rebuilds every cell.
#[derive(Clone, Debug)]
pub struct GridLayout {
    columns: GridDimension,
    rows: GridDimension,
    cells: Vec<CellRect>,
}

impl GridLayout {
    pub fn new(columns: GridDimension, rows: GridDimension) -> Self {
        let mut layout = Self { columns, rows, cells: Vec::new() };
        layout.rebuild();
        layout
    }

    pub fn cells(&self) -> &[CellRect] {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the layout was rebuilt.
    pub fn set_dimension(&mut self, axis: Axis, value: GridDimension) -> bool {
        let slot = match axis {
            Axis::X => &mut self.columns,
            Axis::Y => &mut self.rows,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        self.rebuild();
        true
    }

    /// Index of the cell under a canvas-relative point; None in margins and gaps.
    pub fn cell_at(&self, x: f32, y: f32) -> Option<usize> {
        let pitch = CELL_SIZE + SPACING;
        let (dx, dy) = (x - LEFT_BOUND, y - TOP_BOUND);
        if dx < 0.0 || dy < 0.0 {
            return None;
        }
        let (column, row) = ((dx / pitch) as usize, (dy / pitch) as usize);
        if column >= self.columns.get() || row >= self.rows.get() {
            return None;
        }
        if dx - column as f32 * pitch >= CELL_SIZE || dy - row as f32 * pitch >= CELL_SIZE {
            return None;
        }
        Some(row * self.columns.get() + column)
    }

    /// Extent including the leading margins.
    pub fn size(&self) -> (f32, f32) {
        let span = |n: usize| n as f32 * (CELL_SIZE + SPACING) - SPACING;
        (
            LEFT_BOUND + span(self.columns.get()),
            TOP_BOUND + span(self.rows.get()),
        )
    }

    fn rebuild(&mut self) {
        let columns = self.columns.get();
        let total = columns * self.rows.get();
        log::info!("Total pixels: {total}");
        self.cells = (0..total)
            .map(|i| {
                let column = i % columns;
                let row = i / columns;
                CellRect {
                    left: LEFT_BOUND + column as f32 * (CELL_SIZE + SPACING),
                    top: TOP_BOUND + row as f32 * (CELL_SIZE + SPACING),
                    width: CELL_SIZE,
                    height: CELL_SIZE,
                }
            })
            .collect();
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(GridDimension::default(), GridDimension::default())
    }
}
