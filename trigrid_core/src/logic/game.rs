use crate::engine::Move;
use crate::logic::board::{Board, Coord, Player};
use crate::logic::generator::MoveGenerator;
use crate::logic::rules::{validate_line, MoveError};
use crate::logic::snapshot::{BoardSnapshot, MoveData, SnapshotError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    /// `winner` is `None` on a tie.
    Finished { winner: Option<Player> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveRecord {
    Line {
        player: Player,
        line: MoveData,
        points: u8,
        hash: u64,
    },
    Pass {
        player: Player,
    },
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    pub status: GameStatus,
    pub history: Vec<MoveRecord>,
    consecutive_passes: u8,
}

impl GameState {
    pub fn new(snapshot: &BoardSnapshot) -> Result<Self, SnapshotError> {
        Ok(Self::from_board(Board::from_snapshot(snapshot)?))
    }

    #[must_use]
    pub fn from_board(board: Board) -> Self {
        let mut state = Self {
            board,
            status: GameStatus::Playing,
            history: Vec::new(),
            consecutive_passes: 0,
        };
        state.update_status();
        state
    }

    pub const fn turn(&self) -> Player {
        self.board.turn()
    }

    /// Filled triangles per player, indexed by `Player::index`.
    pub fn scores(&self) -> [u16; 2] {
        [
            self.board.filled_by(Player::One),
            self.board.filled_by(Player::Two),
        ]
    }

    pub fn to_snapshot(&self) -> BoardSnapshot {
        self.board.to_snapshot()
    }

    /// Draws the line `from -> to` for the side to move and returns the points scored.
    pub fn make_move(&mut self, from: Coord, to: Coord) -> Result<u8, MoveError> {
        if self.status != GameStatus::Playing {
            return Err(MoveError::GameOver);
        }
        let line = validate_line(&self.board, from, to)?;
        let mv = self
            .board
            .move_for_line(line)
            .ok_or(MoveError::InvalidDirection { from, to })?;
        self.play(&mv)
    }

    /// Applies a move produced by the engine or the generator.
    pub fn play(&mut self, mv: &Move) -> Result<u8, MoveError> {
        if self.status != GameStatus::Playing {
            return Err(MoveError::GameOver);
        }
        let player = self.board.turn();
        let data = self.board.move_data(mv).ok_or(MoveError::InvalidDirection {
            from: mv.from,
            to: mv.to,
        })?;
        let undo = self
            .board
            .apply_move(mv, player)
            .ok_or(MoveError::NothingToDraw)?;

        self.history.push(MoveRecord::Line {
            player,
            line: data,
            points: undo.points,
            hash: self.board.zobrist_hash(),
        });
        self.consecutive_passes = 0;
        self.update_status();
        Ok(undo.points)
    }

    /// Hands the turn over when the side to move has no legal line.
    /// Two passes in a row end the game on the current score.
    pub fn pass(&mut self) -> Result<(), MoveError> {
        if self.status != GameStatus::Playing {
            return Err(MoveError::GameOver);
        }
        let player = self.board.turn();
        self.board.set_turn(player.opposite());
        self.history.push(MoveRecord::Pass { player });
        self.consecutive_passes += 1;

        if self.consecutive_passes >= 2 {
            self.status = GameStatus::Finished {
                winner: self.leader(),
            };
        }
        Ok(())
    }

    pub fn has_legal_moves(&self) -> bool {
        MoveGenerator::has_legal_moves(&self.board)
    }

    fn leader(&self) -> Option<Player> {
        let [one, two] = self.scores();
        match one.cmp(&two) {
            std::cmp::Ordering::Greater => Some(Player::One),
            std::cmp::Ordering::Less => Some(Player::Two),
            std::cmp::Ordering::Equal => None,
        }
    }

    fn update_status(&mut self) {
        if self.board.is_complete() {
            self.status = GameStatus::Finished {
                winner: self.leader(),
            };
        }
    }
}
