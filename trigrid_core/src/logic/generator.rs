use crate::engine::move_list::MoveList;
use crate::engine::Move;
use crate::logic::board::Board;

pub struct MoveGenerator;

impl MoveGenerator {
    /// Every line that still has at least one undrawn segment, in table order.
    pub fn generate_moves(board: &Board) -> MoveList {
        let mut moves = MoveList::new();
        for (idx, line) in board.topology().lines().iter().enumerate() {
            if line.segments.iter().all(|&s| board.is_drawn(s)) {
                continue;
            }
            let Ok(line_idx) = u16::try_from(idx) else {
                break;
            };
            moves.push(Move {
                from: line.from,
                to: line.to,
                line: line_idx,
                score: 0,
            });
        }
        moves
    }

    /// Legal moves that complete at least one triangle. `score` holds the points.
    pub fn generate_scoring_moves(board: &Board) -> MoveList {
        let mut moves = Self::generate_moves(board);
        for mv in moves.iter_mut() {
            mv.score = i32::from(board.points_for(mv));
        }
        moves.retain(|mv| mv.score > 0);
        moves
    }

    pub fn has_legal_moves(board: &Board) -> bool {
        board
            .topology()
            .lines()
            .iter()
            .any(|line| line.segments.iter().any(|&s| !board.is_drawn(s)))
    }
}
