use crate::engine::Move;
use std::ops::Index;

// Upper bound on lines per board; the line table refuses larger topologies.
pub const MAX_MOVES: usize = 256;

pub struct MoveList {
    pub moves: [Move; MAX_MOVES],
    pub count: usize,
}

impl Default for MoveList {
    fn default() -> Self {
        Self {
            moves: [Move::default(); MAX_MOVES],
            count: 0,
        }
    }
}

impl MoveList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mv: Move) {
        if let Some(slot) = self.moves.get_mut(self.count) {
            *slot = mv;
            self.count += 1;
        } else {
            debug_assert!(false, "MoveList overflow! Max moves: {MAX_MOVES}");
        }
    }

    pub const fn len(&self) -> usize {
        self.count
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn as_slice(&self) -> &[Move] {
        self.moves.get(0..self.count).unwrap_or(&[])
    }

    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        self.moves.get_mut(0..self.count).unwrap_or(&mut [])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Move> {
        self.as_mut_slice().iter_mut()
    }

    /// Stable, so equal keys keep generation order.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Move, &Move) -> std::cmp::Ordering,
    {
        self.as_mut_slice().sort_by(compare);
    }

    /// Moves the first move on `line` to the front, keeping the rest in order.
    pub fn promote(&mut self, line: u16) {
        let slice = self.as_mut_slice();
        if let Some(pos) = slice.iter().position(|m| m.line == line) {
            if let Some(head) = slice.get_mut(..=pos) {
                head.rotate_right(1);
            }
        }
    }

    /// Keeps the moves matching `f`, preserving order.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&Move) -> bool,
    {
        let mut kept = 0;
        for i in 0..self.count {
            let Some(&mv) = self.moves.get(i) else {
                break;
            };
            if f(&mv) {
                if let Some(slot) = self.moves.get_mut(kept) {
                    *slot = mv;
                }
                kept += 1;
            }
        }
        self.count = kept;
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, index: usize) -> &Self::Output {
        self.as_slice().get(index).unwrap_or(&self.moves[0]) // dummy instead of panic
    }
}
