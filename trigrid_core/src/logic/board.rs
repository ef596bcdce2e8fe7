use crate::engine::zobrist::ZobristKeys;
use crate::engine::Move;
use crate::logic::lookup::{Line, LineTable};
use crate::logic::snapshot::SnapshotError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// Player two maximizes every score the engine produces.
    pub const fn is_maximizer(self) -> bool {
        matches!(self, Self::Two)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "P1"),
            Self::Two => write!(f, "P2"),
        }
    }
}

/// Lattice coordinate of a dot. Ordering is row first, then column.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Coord {
    pub r: u8,
    pub c: u8,
}

impl Coord {
    pub const fn new(r: u8, c: u8) -> Self {
        Self { r, c }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.r, self.c)
    }
}

/// Canonical identity of an elementary segment: lower dot first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentKey {
    pub a: Coord,
    pub b: Coord,
}

impl SegmentKey {
    pub fn new(p: Coord, q: Coord) -> Self {
        if p <= q {
            Self { a: p, b: q }
        } else {
            Self { a: q, b: p }
        }
    }

    #[must_use]
    pub fn canonical(self) -> Self {
        Self::new(self.a, self.b)
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}_{},{}", self.a.r, self.a.c, self.b.r, self.b.c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub r: u8,
    pub c: u8,
    pub x: f64,
    pub y: f64,
}

impl Dot {
    pub const fn coord(&self) -> Coord {
        Coord::new(self.r, self.c)
    }
}

#[derive(Debug, Clone)]
pub struct SegmentDef {
    pub key: SegmentKey,
    /// Triangles bordered by this segment (at most two).
    pub triangles: Vec<usize>,
}

/// Immutable geometry of one board: dots, segments, triangles and the
/// precomputed table of every line a player may draw.
#[derive(Debug)]
pub struct Topology {
    dots: Vec<Dot>,
    dot_index: HashMap<Coord, usize>,
    segments: Vec<SegmentDef>,
    segment_index: HashMap<SegmentKey, usize>,
    triangles: Vec<[usize; 3]>,
    lines: LineTable,
    required_line_length: u8,
    zobrist: ZobristKeys,
}

impl Topology {
    pub fn new(
        dots: Vec<Dot>,
        segments: &[SegmentKey],
        triangles: &[[SegmentKey; 3]],
        required_line_length: u8,
    ) -> Result<Self, SnapshotError> {
        if required_line_length == 0 {
            return Err(SnapshotError::ZeroLineLength);
        }

        let mut dot_index = HashMap::with_capacity(dots.len());
        for (idx, dot) in dots.iter().enumerate() {
            if dot_index.insert(dot.coord(), idx).is_some() {
                return Err(SnapshotError::DuplicateDot(dot.coord()));
            }
        }

        let mut segment_defs = Vec::with_capacity(segments.len());
        let mut segment_index = HashMap::with_capacity(segments.len());
        for key in segments {
            let key = key.canonical();
            if key.a == key.b {
                return Err(SnapshotError::DegenerateSegment(key.a));
            }
            for end in [key.a, key.b] {
                if !dot_index.contains_key(&end) {
                    return Err(SnapshotError::UnknownDot(end));
                }
            }
            if segment_index.insert(key, segment_defs.len()).is_some() {
                return Err(SnapshotError::DuplicateSegment(key));
            }
            segment_defs.push(SegmentDef {
                key,
                triangles: Vec::with_capacity(2),
            });
        }

        let mut triangle_sides = Vec::with_capacity(triangles.len());
        for (tri_idx, keys) in triangles.iter().enumerate() {
            let mut sides = [0; 3];
            for (side, key) in sides.iter_mut().zip(keys) {
                let key = key.canonical();
                *side = *segment_index
                    .get(&key)
                    .ok_or(SnapshotError::UnknownSegment(key))?;
                if let Some(def) = segment_defs.get_mut(*side) {
                    def.triangles.push(tri_idx);
                }
            }
            triangle_sides.push(sides);
        }

        let lines = LineTable::build(&dots, &segment_index, required_line_length)?;
        let zobrist = ZobristKeys::new(segment_defs.len(), triangle_sides.len());

        Ok(Self {
            dots,
            dot_index,
            segments: segment_defs,
            segment_index,
            triangles: triangle_sides,
            lines,
            required_line_length,
            zobrist,
        })
    }

    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    pub fn dot(&self, coord: Coord) -> Option<&Dot> {
        self.dot_index.get(&coord).and_then(|&idx| self.dots.get(idx))
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, idx: usize) -> Option<&SegmentDef> {
        self.segments.get(idx)
    }

    pub fn segment_id(&self, key: SegmentKey) -> Option<usize> {
        self.segment_index.get(&key.canonical()).copied()
    }

    pub const fn segment_index(&self) -> &HashMap<SegmentKey, usize> {
        &self.segment_index
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangle(&self, idx: usize) -> Option<&[usize; 3]> {
        self.triangles.get(idx)
    }

    pub const fn lines(&self) -> &LineTable {
        &self.lines
    }

    pub fn line(&self, idx: u16) -> Option<&Line> {
        self.lines.get(usize::from(idx))
    }

    pub const fn required_line_length(&self) -> u8 {
        self.required_line_length
    }

    pub const fn zobrist(&self) -> &ZobristKeys {
        &self.zobrist
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentState {
    pub owner: Option<Player>,
    /// Set once when the other player draws over this segment. Ownership
    /// stays with the first drawer.
    pub contested_by: Option<Player>,
}

impl SegmentState {
    pub const fn is_drawn(&self) -> bool {
        self.owner.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriangleState {
    pub owner: Option<Player>,
}

impl TriangleState {
    pub const fn is_filled(&self) -> bool {
        self.owner.is_some()
    }
}

/// Everything needed to take back one applied move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveUndo {
    pub points: u8,
    drawn: Vec<usize>,
    contested: Vec<usize>,
    filled: Vec<usize>,
    prev_turn: Player,
}

/// Result of simulating a move on a copy of the board.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub board: Board,
    pub points: u8,
}

/// Mutable game position on top of a shared topology.
#[derive(Debug, Clone)]
pub struct Board {
    topology: Arc<Topology>,
    segments: Vec<SegmentState>,
    triangles: Vec<TriangleState>,
    turn: Player,
    filled: [u16; 2],
    zobrist_hash: u64,
}

impl Board {
    #[must_use]
    pub fn new(topology: Arc<Topology>, turn: Player) -> Self {
        let mut board = Self {
            segments: vec![SegmentState::default(); topology.segment_count()],
            triangles: vec![TriangleState::default(); topology.triangle_count()],
            topology,
            turn,
            filled: [0; 2],
            zobrist_hash: 0,
        };
        board.zobrist_hash = board.calculate_hash();
        board
    }

    /// Builds a board from raw per-segment and per-triangle state. The caller
    /// is responsible for the filled-iff-drawn invariant.
    pub(crate) fn from_parts(
        topology: Arc<Topology>,
        segments: Vec<SegmentState>,
        triangles: Vec<TriangleState>,
        turn: Player,
    ) -> Self {
        let mut filled = [0u16; 2];
        for owner in triangles.iter().filter_map(|t| t.owner) {
            if let Some(count) = filled.get_mut(owner.index()) {
                *count += 1;
            }
        }
        let mut board = Self {
            topology,
            segments,
            triangles,
            turn,
            filled,
            zobrist_hash: 0,
        };
        board.zobrist_hash = board.calculate_hash();
        board
    }

    pub const fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub const fn turn(&self) -> Player {
        self.turn
    }

    pub fn set_turn(&mut self, turn: Player) {
        if turn != self.turn {
            self.zobrist_hash ^= self.topology.zobrist().side_key();
            self.turn = turn;
        }
    }

    pub const fn zobrist_hash(&self) -> u64 {
        self.zobrist_hash
    }

    pub fn segment(&self, idx: usize) -> SegmentState {
        self.segments.get(idx).copied().unwrap_or_default()
    }

    pub fn triangle(&self, idx: usize) -> TriangleState {
        self.triangles.get(idx).copied().unwrap_or_default()
    }

    pub fn is_drawn(&self, idx: usize) -> bool {
        self.segments.get(idx).is_some_and(SegmentState::is_drawn)
    }

    pub fn drawn_sides(&self, tri: usize) -> usize {
        self.topology
            .triangle(tri)
            .map_or(0, |sides| sides.iter().filter(|&&s| self.is_drawn(s)).count())
    }

    pub fn filled_by(&self, player: Player) -> u16 {
        self.filled.get(player.index()).copied().unwrap_or(0)
    }

    pub fn filled_count(&self) -> usize {
        self.filled.iter().map(|&n| usize::from(n)).sum()
    }

    /// Terminal once every triangle is filled.
    pub fn is_complete(&self) -> bool {
        self.filled_count() == self.topology.triangle_count()
    }

    pub fn calculate_hash(&self) -> u64 {
        let keys = self.topology.zobrist();
        let mut hash = 0;
        for (idx, state) in self.segments.iter().enumerate() {
            if let Some(owner) = state.owner {
                hash ^= keys.segment_key(idx, owner, state.contested_by);
            }
        }
        for (idx, state) in self.triangles.iter().enumerate() {
            if let Some(owner) = state.owner {
                hash ^= keys.triangle_key(idx, owner);
            }
        }
        if self.turn == Player::Two {
            hash ^= keys.side_key();
        }
        hash
    }

    /// Number of triangles `mv` would complete, without applying it.
    pub fn points_for(&self, mv: &Move) -> u8 {
        let Some(line) = self.topology.line(mv.line) else {
            return 0;
        };
        let mut completed: Vec<usize> = Vec::new();
        for &seg in line.segments.iter().filter(|&&s| !self.is_drawn(s)) {
            let Some(def) = self.topology.segment(seg) else {
                continue;
            };
            for &tri in &def.triangles {
                if self.triangle(tri).is_filled() || completed.contains(&tri) {
                    continue;
                }
                let closes = self.topology.triangle(tri).is_some_and(|sides| {
                    sides
                        .iter()
                        .all(|s| self.is_drawn(*s) || line.segments.contains(s))
                });
                if closes {
                    completed.push(tri);
                }
            }
        }
        u8::try_from(completed.len()).unwrap_or(u8::MAX)
    }

    /// Draws `mv` for `player`. Returns `None`, leaving the board untouched,
    /// when the line adds no new segment. A scoring move keeps the turn.
    pub fn apply_move(&mut self, mv: &Move, player: Player) -> Option<MoveUndo> {
        let line = self.topology.line(mv.line)?;
        let keys = self.topology.zobrist();

        let mut undo = MoveUndo {
            points: 0,
            drawn: Vec::with_capacity(line.segments.len()),
            contested: Vec::new(),
            filled: Vec::new(),
            prev_turn: self.turn,
        };

        for &seg in &line.segments {
            let Some(state) = self.segments.get_mut(seg) else {
                continue;
            };
            match state.owner {
                None => {
                    state.owner = Some(player);
                    self.zobrist_hash ^= keys.segment_key(seg, player, None);
                    undo.drawn.push(seg);
                }
                Some(owner) if owner != player && state.contested_by.is_none() => {
                    self.zobrist_hash ^= keys.segment_key(seg, owner, None)
                        ^ keys.segment_key(seg, owner, Some(player));
                    state.contested_by = Some(player);
                    undo.contested.push(seg);
                }
                Some(_) => {}
            }
        }

        if undo.drawn.is_empty() {
            self.undo_move(&undo);
            return None;
        }

        for &seg in &undo.drawn {
            let Some(def) = self.topology.segment(seg) else {
                continue;
            };
            for &tri in &def.triangles {
                let complete = self.topology.triangle(tri).is_some_and(|sides| {
                    sides
                        .iter()
                        .all(|&s| self.segments.get(s).is_some_and(SegmentState::is_drawn))
                });
                let Some(state) = self.triangles.get_mut(tri) else {
                    continue;
                };
                if complete && !state.is_filled() {
                    state.owner = Some(player);
                    self.zobrist_hash ^= keys.triangle_key(tri, player);
                    if let Some(count) = self.filled.get_mut(player.index()) {
                        *count += 1;
                    }
                    undo.filled.push(tri);
                }
            }
        }

        undo.points = u8::try_from(undo.filled.len()).unwrap_or(u8::MAX);
        let next = if undo.points > 0 {
            player
        } else {
            player.opposite()
        };
        self.set_turn(next);
        Some(undo)
    }

    pub fn undo_move(&mut self, undo: &MoveUndo) {
        let keys = self.topology.zobrist();

        for &tri in &undo.filled {
            if let Some(owner) = self.triangles.get_mut(tri).and_then(|t| t.owner.take()) {
                self.zobrist_hash ^= keys.triangle_key(tri, owner);
                if let Some(count) = self.filled.get_mut(owner.index()) {
                    *count -= 1;
                }
            }
        }
        for &seg in &undo.contested {
            if let Some(state) = self.segments.get_mut(seg) {
                if let (Some(owner), Some(by)) = (state.owner, state.contested_by.take()) {
                    self.zobrist_hash ^= keys.segment_key(seg, owner, Some(by))
                        ^ keys.segment_key(seg, owner, None);
                }
            }
        }
        for &seg in &undo.drawn {
            if let Some(owner) = self.segments.get_mut(seg).and_then(|s| s.owner.take()) {
                self.zobrist_hash ^= keys.segment_key(seg, owner, None);
            }
        }
        self.set_turn(undo.prev_turn);
    }

    /// Side-effect free simulation: the board is copied, never mutated.
    pub fn simulate(&self, mv: &Move, player: Player) -> Option<Simulation> {
        let mut board = self.clone();
        let undo = board.apply_move(mv, player)?;
        Some(Simulation {
            board,
            points: undo.points,
        })
    }

    pub fn move_for_line(&self, line: usize) -> Option<Move> {
        let def = self.topology.lines().get(line)?;
        Some(Move {
            from: def.from,
            to: def.to,
            line: u16::try_from(line).ok()?,
            score: 0,
        })
    }

    pub fn find_move(&self, from: Coord, to: Coord) -> Option<Move> {
        self.topology
            .lines()
            .find(from, to)
            .and_then(|idx| self.move_for_line(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::layout;

    fn rhombus() -> Board {
        let snapshot = layout::build(&[1, 2, 1], 1, Player::One).unwrap();
        Board::from_snapshot(&snapshot).unwrap()
    }

    fn line(board: &Board, a: (u8, u8), b: (u8, u8)) -> Move {
        board
            .find_move(Coord::new(a.0, a.1), Coord::new(b.0, b.1))
            .unwrap()
    }

    #[test]
    fn test_segment_key_is_canonical() {
        let p = Coord::new(1, 1);
        let q = Coord::new(0, 3);
        assert_eq!(SegmentKey::new(p, q), SegmentKey::new(q, p));
        assert_eq!(SegmentKey::new(p, q).a, q);
        assert_eq!(SegmentKey::new(p, q).to_string(), "0,3_1,1");
    }

    #[test]
    fn test_non_scoring_move_passes_turn() {
        let mut board = rhombus();
        let mv = line(&board, (0, 0), (1, 0));
        let undo = board.apply_move(&mv, Player::One).unwrap();
        assert_eq!(undo.points, 0);
        assert_eq!(board.turn(), Player::Two);
        assert!(board.is_drawn(board.topology().segment_id(SegmentKey::new(
            Coord::new(0, 0),
            Coord::new(1, 0)
        ))
        .unwrap()));
    }

    #[test]
    fn test_scoring_move_keeps_turn_and_fills() {
        let mut board = rhombus();
        board.apply_move(&line(&board, (0, 0), (1, 0)), Player::One);
        board.apply_move(&line(&board, (0, 0), (1, 1)), Player::Two);
        assert_eq!(board.turn(), Player::One);

        let undo = board
            .apply_move(&line(&board, (1, 0), (1, 1)), Player::One)
            .unwrap();
        assert_eq!(undo.points, 1);
        assert_eq!(board.turn(), Player::One);
        assert_eq!(board.filled_by(Player::One), 1);
        assert_eq!(board.triangle(0).owner, Some(Player::One));
        assert!(!board.is_complete());
    }

    #[test]
    fn test_undo_restores_position_and_hash() {
        let mut board = rhombus();
        board.apply_move(&line(&board, (0, 0), (1, 0)), Player::One);
        board.apply_move(&line(&board, (0, 0), (1, 1)), Player::Two);
        let before = board.clone();

        let mv = line(&board, (1, 0), (1, 1));
        let undo = board.apply_move(&mv, Player::One).unwrap();
        assert_ne!(board.zobrist_hash(), before.zobrist_hash());
        assert_eq!(board.zobrist_hash(), board.calculate_hash());

        board.undo_move(&undo);
        assert_eq!(board.zobrist_hash(), before.zobrist_hash());
        assert_eq!(board.turn(), before.turn());
        assert_eq!(board.filled_count(), 0);
        assert!(!board.is_drawn(2));
    }

    #[test]
    fn test_redrawing_a_line_is_rejected() {
        let mut board = rhombus();
        let mv = line(&board, (0, 0), (1, 0));
        board.apply_move(&mv, Player::One).unwrap();
        let hash = board.zobrist_hash();
        assert!(board.apply_move(&mv, Player::Two).is_none());
        assert_eq!(board.zobrist_hash(), hash);
        assert_eq!(board.turn(), Player::Two);
    }

    #[test]
    fn test_contest_mark_on_longer_line() {
        let snapshot = layout::build(&[3, 4, 5, 4, 3], 2, Player::One).unwrap();
        let mut board = Board::from_snapshot(&snapshot).unwrap();
        // P1 draws the left half of the middle row, P2 overlaps it by one segment.
        let first = line(&board, (2, 0), (2, 2));
        board.apply_move(&first, Player::One).unwrap();
        let second = line(&board, (2, 1), (2, 3));
        board.apply_move(&second, Player::Two).unwrap();

        let shared = board
            .topology()
            .segment_id(SegmentKey::new(Coord::new(2, 1), Coord::new(2, 2)))
            .unwrap();
        let state = board.segment(shared);
        assert_eq!(state.owner, Some(Player::One));
        assert_eq!(state.contested_by, Some(Player::Two));
        assert_eq!(board.zobrist_hash(), board.calculate_hash());
    }

    #[test]
    fn test_simulate_leaves_source_board_untouched() {
        let board = rhombus();
        let mv = line(&board, (1, 0), (1, 1));
        let sim = board.simulate(&mv, Player::One).unwrap();
        assert_eq!(sim.points, 0);
        assert!(sim.board.is_drawn(2));
        assert_eq!(sim.board.turn(), Player::Two);
        assert_eq!(board.calculate_hash(), board.zobrist_hash());
        assert_eq!(board.filled_count(), 0);
        assert!((0..board.topology().segment_count()).all(|s| !board.is_drawn(s)));
    }

    #[test]
    fn test_points_for_matches_apply() {
        let mut board = rhombus();
        board.apply_move(&line(&board, (0, 0), (1, 0)), Player::One);
        board.apply_move(&line(&board, (0, 0), (1, 1)), Player::Two);
        board.apply_move(&line(&board, (1, 0), (2, 0)), Player::One);
        board.apply_move(&line(&board, (1, 1), (2, 0)), Player::Two);

        let middle = line(&board, (1, 0), (1, 1));
        assert_eq!(board.points_for(&middle), 2);
        let undo = board.apply_move(&middle, Player::One).unwrap();
        assert_eq!(undo.points, 2);
        assert!(board.is_complete());
    }
}
