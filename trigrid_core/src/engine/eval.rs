use crate::engine::config::EngineConfig;
use crate::engine::Evaluator;
use crate::logic::board::{Board, Player};
use std::cmp::Ordering;
use std::sync::Arc;

/// Per-player feature counts behind a static score, indexed by `Player::index`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalBreakdown {
    pub filled: [i32; 2],
    /// Triangles one side away from completion, credited to the player who
    /// set them up (and so handed the point to the opponent).
    pub threats: [i32; 2],
    pub double_threats: [i32; 2],
}

pub struct HeuristicEvaluator {
    config: Arc<EngineConfig>,
}

impl HeuristicEvaluator {
    pub const fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    pub fn breakdown(&self, board: &Board) -> EvalBreakdown {
        let topology = board.topology();
        let mut out = EvalBreakdown {
            filled: [
                i32::from(board.filled_by(Player::One)),
                i32::from(board.filled_by(Player::Two)),
            ],
            ..EvalBreakdown::default()
        };

        for tri in 0..topology.triangle_count() {
            if board.triangle(tri).is_filled() {
                continue;
            }
            let Some(sides) = topology.triangle(tri) else {
                continue;
            };

            let mut drawn = 0;
            let mut lines = [0u8; 2];
            let mut missing = None;
            for &side in sides {
                let state = board.segment(side);
                match state.owner {
                    Some(owner) => {
                        drawn += 1;
                        lines[owner.index()] += 1;
                        if let Some(by) = state.contested_by {
                            lines[by.index()] += 1;
                        }
                    }
                    None => missing = Some(side),
                }
            }
            if drawn != 2 {
                continue;
            }

            let maker = match lines[0].cmp(&lines[1]) {
                Ordering::Greater => Player::One,
                Ordering::Less => Player::Two,
                Ordering::Equal => continue,
            };
            let completes_two = missing
                .and_then(|side| topology.segment(side))
                .is_some_and(|def| {
                    def.triangles.iter().any(|&other| {
                        other != tri
                            && !board.triangle(other).is_filled()
                            && board.drawn_sides(other) == 2
                    })
                });

            out.threats[maker.index()] += 1;
            if completes_two {
                out.double_threats[maker.index()] += 1;
            }
        }
        out
    }

    pub fn terminal_score(&self, board: &Board) -> i32 {
        match board.filled_by(Player::Two).cmp(&board.filled_by(Player::One)) {
            Ordering::Greater => self.config.win_score,
            Ordering::Less => -self.config.win_score,
            Ordering::Equal => 0,
        }
    }
}

impl Evaluator for HeuristicEvaluator {
    fn evaluate(&self, board: &Board) -> i32 {
        if board.is_complete() {
            return self.terminal_score(board);
        }

        let b = self.breakdown(board);
        let (one, two) = (Player::One.index(), Player::Two.index());
        (b.filled[two] - b.filled[one]) * self.config.triangle_weight
            + (b.threats[one] - b.threats[two]) * self.config.threat_weight
            + (b.double_threats[one] - b.double_threats[two]) * self.config.double_threat_weight
    }
}
