/// Position tracking for document text
///
/// Positions are (line, column) pairs. Internally everything is zero-based;
/// the build engine reports one-based locations, so the base travels with the
/// value and conversions happen explicitly at the boundary.
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The numbering convention a [`Position`] uses for its line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionBase {
    Zero,
    One,
}

/// A position in a document (line and column).
///
/// Equality and ordering compare the location, not the numbering base, so
/// `one_based(1, 1) == zero_based(0, 0)`.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    line: u32,
    column: u32,
    base: PositionBase,
}

impl Position {
    /// "No location". Sorts before every valid position.
    pub const INVALID: Position = Position {
        line: 0,
        column: 0,
        base: PositionBase::One,
    };

    /// Create a zero-based position.
    pub fn new(line: u32, column: u32) -> Self {
        Self::zero_based(line, column)
    }

    pub fn zero_based(line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            base: PositionBase::Zero,
        }
    }

    /// Create a one-based position. `(0, _)` or `(_, 0)` yields [`Position::INVALID`].
    pub fn one_based(line: u32, column: u32) -> Self {
        if line == 0 || column == 0 {
            return Self::INVALID;
        }
        Self {
            line,
            column,
            base: PositionBase::One,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn base(&self) -> PositionBase {
        self.base
    }

    pub fn is_valid(&self) -> bool {
        match self.base {
            PositionBase::Zero => true,
            PositionBase::One => self.line > 0 && self.column > 0,
        }
    }

    /// Convert to zero-based numbering (LSP convention). Invalid stays invalid.
    pub fn to_zero_based(self) -> Self {
        match self.base {
            PositionBase::Zero => self,
            PositionBase::One if !self.is_valid() => self,
            PositionBase::One => Self::zero_based(self.line - 1, self.column - 1),
        }
    }

    /// Convert to one-based numbering (build engine convention).
    pub fn to_one_based(self) -> Self {
        match self.base {
            PositionBase::One => self,
            PositionBase::Zero => Self {
                line: self.line + 1,
                column: self.column + 1,
                base: PositionBase::One,
            },
        }
    }

    fn sort_key(&self) -> (bool, u32, u32) {
        let zero = self.to_zero_based();
        (self.is_valid(), zero.line, zero.column)
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for Position {}

impl Hash for Position {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("<invalid>");
        }
        let one = self.to_one_based();
        write!(f, "{}:{}", one.line, one.column)
    }
}

/// A range between two positions, typically the image of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a zero-based range from line/column coordinates
    pub fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: Position::zero_based(start_line, start_col),
            end: Position::zero_based(end_line, end_col),
        }
    }

    pub fn to_zero_based(self) -> Self {
        Self::new(self.start.to_zero_based(), self.end.to_zero_based())
    }

    pub fn to_one_based(self) -> Self {
        Self::new(self.start.to_one_based(), self.end.to_one_based())
    }

    /// Check if a position falls within this range (end inclusive, as editors expect)
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }
}
