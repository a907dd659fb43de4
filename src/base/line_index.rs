//! Offset ↔ line/column conversion for one text snapshot.

use rustc_hash::FxHashMap;
use text_size::{TextRange, TextSize};
use thiserror::Error;

use super::position::{Position, Range};

/// Errors converting between offsets and positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("offset {offset} is outside the document (length {len})")]
    OutOfRange { offset: u32, len: u32 },

    #[error("line {line} is outside the document ({line_count} lines)")]
    LineOutOfRange { line: u32, line_count: u32 },

    #[error("column {column} is past the end of line {line} (length {line_length})")]
    ColumnOutOfRange {
        line: u32,
        column: u32,
        line_length: u32,
    },

    #[error("position does not refer to a location")]
    InvalidPosition,
}

/// A character wider than one byte, relative to its line start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct WideChar {
    start: TextSize,
    end: TextSize,
    /// Width in UTF-16 code units (1 or 2).
    units: u32,
}

impl WideChar {
    /// Bytes the character takes beyond its UTF-16 width.
    fn excess(&self) -> u32 {
        u32::from(self.end - self.start) - self.units
    }
}

/// Precomputed line starts for a text snapshot.
///
/// `\r\n`, `\n` and a lone `\r` each end a line. Lines and columns are
/// zero-based. Columns count UTF-16 code units, the unit editors and the
/// evaluation engine report; offsets are byte offsets into the text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    /// Multi-byte characters per line, in order. Lines holding only ASCII
    /// have no entry.
    wide_chars: FxHashMap<u32, Vec<WideChar>>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        let mut wide_chars: FxHashMap<u32, Vec<WideChar>> = FxHashMap::default();
        let mut line_start = TextSize::new(0);
        let mut chars = text.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            let offset = TextSize::new(i as u32);
            match c {
                '\r' | '\n' => {
                    if c == '\r' && chars.peek().is_some_and(|&(_, next)| next == '\n') {
                        chars.next();
                        line_start = offset + TextSize::new(2);
                    } else {
                        line_start = offset + TextSize::new(1);
                    }
                    line_starts.push(line_start);
                }
                c if !c.is_ascii() => {
                    let start = offset - line_start;
                    wide_chars
                        .entry(line_starts.len() as u32 - 1)
                        .or_default()
                        .push(WideChar {
                            start,
                            end: start + TextSize::of(c),
                            units: c.len_utf16() as u32,
                        });
                }
                _ => {}
            }
        }

        Self {
            line_starts,
            wide_chars,
            len: TextSize::of(text),
        }
    }

    /// Length of the indexed text.
    pub fn len(&self) -> TextSize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == TextSize::new(0)
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Span of a whole line, terminator included.
    pub fn line_range(&self, line: u32) -> Option<TextRange> {
        let start = *self.line_starts.get(line as usize)?;
        let end = self
            .line_starts
            .get(line as usize + 1)
            .copied()
            .unwrap_or(self.len);
        Some(TextRange::new(start, end))
    }

    fn wide_chars(&self, line: u32) -> &[WideChar] {
        self.wide_chars.get(&line).map_or(&[], Vec::as_slice)
    }

    /// Byte column within `line` → UTF-16 column.
    fn to_utf16_column(&self, line: u32, byte_column: TextSize) -> u32 {
        let excess: u32 = self
            .wide_chars(line)
            .iter()
            .take_while(|c| c.end <= byte_column)
            .map(WideChar::excess)
            .sum();
        u32::from(byte_column) - excess
    }

    /// UTF-16 column within `line` → byte column. A column that falls inside
    /// a surrogate pair resolves to the start of that character.
    fn to_byte_column(&self, line: u32, column: u32) -> TextSize {
        let mut byte_column = column;
        for c in self.wide_chars(line) {
            if byte_column <= u32::from(c.start) {
                break;
            }
            let past_start = byte_column - u32::from(c.start);
            if past_start < c.units {
                return c.start;
            }
            byte_column += c.excess();
        }
        TextSize::new(byte_column)
    }

    /// Length of a line in UTF-16 code units, terminator included.
    fn line_length(&self, line: u32, line_range: TextRange) -> u32 {
        self.to_utf16_column(line, line_range.len())
    }

    /// Zero-based position of an absolute offset.
    pub fn offset_to_position(&self, offset: TextSize) -> Result<Position, PositionError> {
        if offset > self.len {
            return Err(PositionError::OutOfRange {
                offset: offset.into(),
                len: self.len.into(),
            });
        }

        // Greatest line whose start is <= offset.
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let byte_column = offset - self.line_starts[line];
        let column = self.to_utf16_column(line as u32, byte_column);
        Ok(Position::zero_based(line as u32, column))
    }

    /// Absolute offset of a position (either base).
    pub fn position_to_offset(&self, position: Position) -> Result<TextSize, PositionError> {
        if !position.is_valid() {
            return Err(PositionError::InvalidPosition);
        }
        let position = position.to_zero_based();
        let line = position.line();

        let line_range = self.line_range(line).ok_or(PositionError::LineOutOfRange {
            line,
            line_count: self.line_count(),
        })?;
        let line_length = self.line_length(line, line_range);
        if position.column() > line_length {
            return Err(PositionError::ColumnOutOfRange {
                line,
                column: position.column(),
                line_length,
            });
        }

        Ok(line_range.start() + self.to_byte_column(line, position.column()))
    }

    /// Convert a span into a zero-based range.
    pub fn span_to_range(&self, span: TextRange) -> Result<Range, PositionError> {
        Ok(Range::new(
            self.offset_to_position(span.start())?,
            self.offset_to_position(span.end())?,
        ))
    }

    /// Convert a range (either base) back into a span.
    pub fn range_to_span(&self, range: Range) -> Result<TextRange, PositionError> {
        let start = self.position_to_offset(range.start)?;
        let end = self.position_to_offset(range.end)?;
        Ok(TextRange::new(start, end.max(start)))
    }

    /// Span covering the whole document.
    pub fn full_span(&self) -> TextRange {
        TextRange::up_to(self.len)
    }
}
