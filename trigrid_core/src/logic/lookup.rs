use crate::engine::move_list::MAX_MOVES;
use crate::logic::board::{Coord, Dot, SegmentKey};
use crate::logic::rules::trace_line;
use crate::logic::snapshot::SnapshotError;
use std::collections::HashMap;

/// One drawable line: endpoints plus the elementary segments it covers, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub from: Coord,
    pub to: Coord,
    pub segments: Vec<usize>,
}

/// Every geometrically valid line of a topology, computed once per board.
#[derive(Debug, Default)]
pub struct LineTable {
    lines: Vec<Line>,
    by_endpoints: HashMap<(Coord, Coord), usize>,
}

impl LineTable {
    pub fn build(
        dots: &[Dot],
        segment_index: &HashMap<SegmentKey, usize>,
        required_length: u8,
    ) -> Result<Self, SnapshotError> {
        let mut table = Self::default();
        for (i, a) in dots.iter().enumerate() {
            for b in dots.iter().skip(i + 1) {
                let Ok(segments) = trace_line(dots, segment_index, a, b, required_length) else {
                    continue;
                };
                let (from, to) = (a.coord(), b.coord());
                table.by_endpoints.insert(Self::endpoint_key(from, to), table.lines.len());
                table.lines.push(Line { from, to, segments });
            }
        }

        if table.lines.len() > MAX_MOVES {
            return Err(SnapshotError::TooManyLines {
                count: table.lines.len(),
                max: MAX_MOVES,
            });
        }
        Ok(table)
    }

    fn endpoint_key(a: Coord, b: Coord) -> (Coord, Coord) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Line> {
        self.lines.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }

    /// Index of the line joining `a` and `b`, in either direction.
    pub fn find(&self, a: Coord, b: Coord) -> Option<usize> {
        self.by_endpoints.get(&Self::endpoint_key(a, b)).copied()
    }
}
