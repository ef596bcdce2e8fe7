use crate::logic::board::{Board, Coord};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod eval;
pub mod move_list;
pub mod search;
pub mod tt;
pub mod zobrist;

#[cfg(test)]
mod search_test;

/// A candidate line. `line` indexes the topology's line table; `score` is
/// scratch space for move ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
    pub line: u16,
    pub score: i32,
}

impl Move {
    pub const fn same_line(&self, other: &Self) -> bool {
        self.line == other.line
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchLimit {
    /// Depth chosen from the required line length.
    #[default]
    Auto,
    Depth(u8),
    Time(u64), // milliseconds
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub depth: u8,
    pub nodes: u64,
    pub time_ms: u64,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    Progress {
        depth: u8,
        best_move: Move,
        score: i32,
    },
    Log(String),
}

pub trait Evaluator {
    fn evaluate(&self, board: &Board) -> i32;
}

pub trait Searcher {
    fn search(&mut self, board: &Board, limit: SearchLimit) -> Option<(Move, SearchStats)>;
}
