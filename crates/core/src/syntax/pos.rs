#[cfg(feature = "serde")]
use serde::Serialize;
use std::fmt;

/// A compact source position: the 1-based byte offset into one source text.
/// Zero is reserved for "no position" like go/token's NoPos, so that
/// synthesized nodes can be told apart from parsed ones.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Pos(u32);

impl Pos {
    pub const NONE: Pos = Pos(0);

    /// position of the byte at `offset`
    pub fn new(offset: usize) -> Self {
        Self(offset as u32 + 1)
    }
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
    /// 0-based byte offset, None for invalid positions
    pub fn offset(self) -> Option<usize> {
        if self.is_valid() {
            Some(self.0 as usize - 1)
        } else {
            None
        }
    }
    /// advance by `n` bytes. Invalid positions stay invalid.
    pub fn add(self, n: usize) -> Self {
        if self.is_valid() {
            Self(self.0 + n as u32)
        } else {
            self
        }
    }
    pub(crate) fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset() {
            Some(o) => write!(f, "@{}", o),
            None => write!(f, "@-"),
        }
    }
}

/// Half-open range `[start, end)` of positions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Region {
    pub start: Pos,
    pub end: Pos,
}

impl Region {
    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }
    pub fn empty_at(pos: Pos) -> Self {
        Self { start: pos, end: pos }
    }
    pub fn is_valid(&self) -> bool {
        self.start.is_valid() && self.end.is_valid() && self.start <= self.end
    }
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
    /// smallest region covering both. Invalid sides are ignored.
    pub fn cover(self, other: Region) -> Region {
        if !self.is_valid() {
            return other;
        }
        if !other.is_valid() {
            return self;
        }
        Region {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

/// Line start table for one source text.
#[derive(Clone, Debug, Default)]
pub struct Lines {
    starts: Vec<usize>,
}

impl Lines {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }
    /// 0-based (line, column) of a valid position
    pub fn line_col(&self, pos: Pos) -> Option<(usize, usize)> {
        let offset = pos.offset()?;
        let line = match self.starts.binary_search(&offset) {
            Ok(l) => l,
            Err(l) => l - 1,
        };
        Some((line, offset - self.starts[line]))
    }
    pub fn line(&self, pos: Pos) -> Option<usize> {
        self.line_col(pos).map(|(l, _)| l)
    }
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line).copied()
    }
    pub fn len(&self) -> usize {
        self.starts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

/// A named source text with its line table.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    pub lines: Lines,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = Lines::new(&text);
        Self {
            name: name.into(),
            text,
            lines,
        }
    }
    /// source text covered by a region, if the region lies inside the file
    pub fn slice(&self, region: Region) -> Option<&str> {
        let start = region.start.offset()?;
        let end = region.end.offset()?;
        self.text.get(start..end)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pos_validity() {
        assert!(!Pos::NONE.is_valid());
        assert_eq!(Pos::new(0).offset(), Some(0));
        assert_eq!(Pos::NONE.add(3), Pos::NONE);
        assert_eq!(Pos::new(2).add(3), Pos::new(5));
    }

    #[test]
    fn test_line_col() {
        let lines = Lines::new("ab\ncd\n\nef");
        assert_eq!(lines.line_col(Pos::new(0)), Some((0, 0)));
        assert_eq!(lines.line_col(Pos::new(2)), Some((0, 2)));
        assert_eq!(lines.line_col(Pos::new(3)), Some((1, 0)));
        assert_eq!(lines.line_col(Pos::new(7)), Some((3, 0)));
        assert_eq!(lines.line_col(Pos::NONE), None);
    }

    #[test]
    fn test_region_cover() {
        let a = Region::new(Pos::new(1), Pos::new(4));
        let b = Region::new(Pos::new(3), Pos::new(9));
        assert_eq!(a.cover(b), Region::new(Pos::new(1), Pos::new(9)));
        assert_eq!(Region::default().cover(a), a);
    }
}
