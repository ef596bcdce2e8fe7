use crate::engine::config::EngineConfig;
use crate::engine::eval::HeuristicEvaluator;
use crate::engine::move_list::MoveList;
use crate::engine::tt::{TTFlag, TranspositionTable};
use crate::engine::{Evaluator, Move, SearchEvent, SearchLimit, SearchStats, Searcher};
use crate::logic::board::{Board, Player};
use crate::logic::generator::MoveGenerator;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Wider than any reachable score, including accumulated capture bonuses.
pub const INFINITY: i32 = 1_000_000_000;

const SCORE_HASH_MOVE: i32 = 2_000_000;

/// Side to move and remaining depth at a search node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ply {
    pub mover: Player,
    pub depth: u8,
}

impl Ply {
    pub const fn new(mover: Player, depth: u8) -> Self {
        Self { mover, depth }
    }

    /// The ply after a move worth `points`. Completing a triangle grants an
    /// extra move that does not consume depth.
    #[must_use]
    pub const fn after(self, points: u8) -> Self {
        if points > 0 {
            self
        } else {
            Self {
                mover: self.mover.opposite(),
                depth: self.depth.saturating_sub(1),
            }
        }
    }

    pub const fn is_maximizing(self) -> bool {
        self.mover.is_maximizer()
    }
}

/// Pushes a decided result away from zero by the remaining depth, so a win
/// found with more depth left (sooner) outranks the same win found later.
pub const fn terminal_score(score: i32, depth: u8) -> i32 {
    let depth = depth as i32;
    if score > 0 {
        score + depth
    } else if score < 0 {
        score - depth
    } else {
        0
    }
}

pub struct AlphaBetaEngine {
    config: Arc<EngineConfig>,
    evaluator: HeuristicEvaluator,
    tt: TranspositionTable,
    nodes_searched: u64,
    start_time: f64,
    time_limit: Option<f64>,
    stop: Option<Arc<AtomicBool>>,
}

impl AlphaBetaEngine {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            evaluator: HeuristicEvaluator::new(Arc::clone(&config)),
            tt: TranspositionTable::new(config.tt_size_mb),
            config,
            nodes_searched: 0,
            start_time: 0.0,
            time_limit: None,
            stop: None,
        }
    }

    pub fn update_config(&mut self, config: Arc<EngineConfig>) {
        if config.tt_size_mb != self.config.tt_size_mb {
            self.tt = TranspositionTable::new(config.tt_size_mb);
        }
        self.evaluator = HeuristicEvaluator::new(Arc::clone(&config));
        self.config = config;
    }

    /// Cooperative cancellation: once the flag is set the current search
    /// unwinds and reports the last completed depth.
    pub fn set_stop_flag(&mut self, stop: Option<Arc<AtomicBool>>) {
        self.stop = stop;
    }

    pub const fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    fn now() -> f64 {
        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            if let Some(window) = web_sys::window() {
                return window.performance().map(|p| p.now()).unwrap_or(0.0);
            }
            let global = js_sys::global();
            if let Ok(worker) = global.dyn_into::<web_sys::WorkerGlobalScope>() {
                return worker.performance().map(|p| p.now()).unwrap_or(0.0);
            }
            0.0
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::time::{SystemTime, UNIX_EPOCH};
            let since_the_epoch = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            #[allow(clippy::cast_precision_loss)]
            let time_ms = (since_the_epoch.as_secs() as f64).mul_add(
                1000.0,
                f64::from(since_the_epoch.subsec_nanos()) / 1_000_000.0,
            );
            time_ms
        }
    }

    #[allow(clippy::manual_is_multiple_of)]
    fn check_time(&self) -> bool {
        if self
            .stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return true;
        }
        if let Some(limit) = self.time_limit {
            if self.nodes_searched % 1024 == 0 && Self::now() - self.start_time > limit {
                return true;
            }
        }
        false
    }

    fn capture_bonus(&self, points: u8, mover: Player) -> i32 {
        let bonus = i32::from(points) * self.config.capture_scale;
        if mover.is_maximizer() {
            bonus
        } else {
            -bonus
        }
    }

    /// Legal moves ordered for pruning: hash move, then by points scored.
    fn ordered_moves(&self, board: &Board, hash_move: Option<Move>) -> MoveList {
        let mut moves = MoveGenerator::generate_moves(board);
        for mv in moves.iter_mut() {
            mv.score = if hash_move.is_some_and(|h| h.same_line(mv)) {
                SCORE_HASH_MOVE
            } else {
                i32::from(board.points_for(mv)) * self.config.capture_scale
            };
        }
        moves.sort_by(|a, b| b.score.cmp(&a.score));
        moves
    }

    /// Fail-soft alpha-beta over `ply`. Returns `None` when the search was
    /// interrupted by the clock or the stop flag.
    fn alpha_beta(
        &mut self,
        board: &mut Board,
        mut alpha: i32,
        mut beta: i32,
        ply: Ply,
    ) -> Option<i32> {
        self.nodes_searched += 1;

        if self.check_time() {
            return None;
        }
        debug_assert_eq!(board.turn(), ply.mover);

        let hash = board.zobrist_hash();
        let mut hash_move = None;
        if self.config.use_transposition_table {
            if let Some(entry) = self.tt.probe(hash) {
                hash_move = entry.best_move;
                if entry.depth >= ply.depth {
                    match entry.flag {
                        TTFlag::Exact => return Some(entry.score),
                        TTFlag::LowerBound => alpha = alpha.max(entry.score),
                        TTFlag::UpperBound => beta = beta.min(entry.score),
                    }
                    if alpha >= beta {
                        return Some(entry.score);
                    }
                }
            }
        }

        if board.is_complete() {
            return Some(terminal_score(self.evaluator.evaluate(board), ply.depth));
        }

        if ply.depth == 0 {
            return Some(self.quiescence(board, alpha, beta, self.config.quiescence_depth));
        }
        let moves = self.ordered_moves(board, hash_move);
        if moves.is_empty() {
            return Some(self.quiescence(board, alpha, beta, self.config.quiescence_depth));
        }

        let (alpha_orig, beta_orig) = (alpha, beta);
        let maximizing = ply.is_maximizing();
        let mut best_score = if maximizing { -INFINITY } else { INFINITY };
        let mut best_move = None;

        for mv in &moves {
            let Some(undo) = board.apply_move(mv, ply.mover) else {
                debug_assert!(false, "generated move {mv:?} drew nothing");
                continue;
            };
            let bonus = self.capture_bonus(undo.points, ply.mover);
            let result = self.alpha_beta(board, alpha - bonus, beta - bonus, ply.after(undo.points));
            board.undo_move(&undo);
            let score = bonus + result?;

            if maximizing {
                if score > best_score {
                    best_score = score;
                    best_move = Some(*mv);
                }
                alpha = alpha.max(score);
            } else {
                if score < best_score {
                    best_score = score;
                    best_move = Some(*mv);
                }
                beta = beta.min(score);
            }
            if alpha >= beta {
                break;
            }
        }

        if self.config.use_transposition_table {
            let flag = bound_flag(best_score, alpha_orig, beta_orig);
            self.tt.store(hash, best_move, best_score, ply.depth, flag);
        }
        Some(best_score)
    }

    /// Extends a leaf through scoring moves only. The mover keeps the turn
    /// along every continuation, so only its own captures are considered.
    fn quiescence(&mut self, board: &mut Board, mut alpha: i32, mut beta: i32, budget: u8) -> i32 {
        self.nodes_searched += 1;

        let hash = board.zobrist_hash();
        if self.config.use_transposition_table {
            if let Some(entry) = self.tt.probe(hash) {
                match entry.flag {
                    TTFlag::Exact => return entry.score,
                    TTFlag::LowerBound => alpha = alpha.max(entry.score),
                    TTFlag::UpperBound => beta = beta.min(entry.score),
                }
                if alpha >= beta {
                    return entry.score;
                }
            }
        }

        let stand_pat = self.evaluator.evaluate(board);
        if board.is_complete() || budget == 0 {
            return stand_pat;
        }

        let (alpha_orig, beta_orig) = (alpha, beta);
        let mover = board.turn();
        let maximizing = mover.is_maximizer();
        let mut best_score = stand_pat;
        let mut best_move = None;
        if maximizing {
            alpha = alpha.max(stand_pat);
        } else {
            beta = beta.min(stand_pat);
        }

        if alpha < beta {
            let mut captures = MoveGenerator::generate_scoring_moves(board);
            captures.sort_by(|a, b| b.score.cmp(&a.score));
            for mv in &captures {
                let Some(undo) = board.apply_move(mv, mover) else {
                    continue;
                };
                let bonus = self.capture_bonus(undo.points, mover);
                let score = bonus + self.quiescence(board, alpha - bonus, beta - bonus, budget - 1);
                board.undo_move(&undo);

                if maximizing {
                    if score > best_score {
                        best_score = score;
                        best_move = Some(*mv);
                    }
                    alpha = alpha.max(score);
                } else {
                    if score < best_score {
                        best_score = score;
                        best_move = Some(*mv);
                    }
                    beta = beta.min(score);
                }
                if alpha >= beta {
                    break;
                }
            }
        }

        if self.config.use_transposition_table {
            let flag = bound_flag(best_score, alpha_orig, beta_orig);
            self.tt.store(hash, best_move, best_score, 0, flag);
        }
        best_score
    }

    fn is_decisive(&self, score: i32) -> bool {
        score.abs() >= self.config.win_score / 2
    }

    /// Iterative deepening from `board`, reporting each completed depth
    /// through `on_event`.
    #[allow(clippy::too_many_lines)]
    pub fn search_with_events(
        &mut self,
        board: &Board,
        limit: SearchLimit,
        on_event: &mut dyn FnMut(SearchEvent),
    ) -> Option<(Move, SearchStats)> {
        self.nodes_searched = 0;
        self.start_time = Self::now();
        self.tt.clear();

        let policy_depth = EngineConfig::max_depth_for(board.topology().required_line_length());
        let (max_depth, time_limit) = match limit {
            SearchLimit::Auto => (policy_depth, None),
            SearchLimit::Depth(d) => (d.max(1), None),
            #[allow(clippy::cast_precision_loss)]
            SearchLimit::Time(ms) => (policy_depth, Some(ms as f64)),
        };
        self.time_limit = time_limit;

        let mut board = board.clone();
        let mover = board.turn();
        let maximizing = mover.is_maximizer();

        let mut root_moves = MoveGenerator::generate_moves(&board);
        if root_moves.is_empty() {
            log::info!("{mover} has no legal line");
            on_event(SearchEvent::Log(format!("{mover} has no legal line")));
            return None;
        }
        on_event(SearchEvent::Log(format!(
            "{mover} searching {} moves, max depth {max_depth}",
            root_moves.len()
        )));

        if let Some(seed) = self.config.shuffle_seed {
            root_moves
                .as_mut_slice()
                .shuffle(&mut StdRng::seed_from_u64(seed));
        }

        for mv in root_moves.iter_mut() {
            mv.score = match board.apply_move(mv, mover) {
                Some(undo) => {
                    let score =
                        self.capture_bonus(undo.points, mover) + self.evaluator.evaluate(&board);
                    board.undo_move(&undo);
                    score
                }
                None if maximizing => -INFINITY,
                None => INFINITY,
            };
        }
        if maximizing {
            root_moves.sort_by(|a, b| b.score.cmp(&a.score));
        } else {
            root_moves.sort_by(|a, b| a.score.cmp(&b.score));
        }

        let mut best: Option<(Move, i32)> = None;
        let mut completed_depth = 0;

        for depth in 1..=max_depth {
            if let Some((prev, _)) = best {
                root_moves.promote(prev.line);
            }

            let mut alpha = -INFINITY;
            let mut beta = INFINITY;
            let mut iteration_best: Option<(Move, i32)> = None;
            let mut interrupted = false;

            for mv in &root_moves {
                let Some(undo) = board.apply_move(mv, mover) else {
                    continue;
                };
                let bonus = self.capture_bonus(undo.points, mover);
                let child = Ply::new(mover, depth).after(undo.points);
                let result = self.alpha_beta(&mut board, alpha - bonus, beta - bonus, child);
                board.undo_move(&undo);

                let Some(value) = result else {
                    interrupted = true;
                    break;
                };
                let score = bonus + value;
                let improves = iteration_best.map_or(true, |(_, best_score)| {
                    if maximizing {
                        score > best_score
                    } else {
                        score < best_score
                    }
                });
                if improves {
                    iteration_best = Some((*mv, score));
                }
                if maximizing {
                    alpha = alpha.max(score);
                } else {
                    beta = beta.min(score);
                }
            }

            if interrupted {
                log::debug!("depth {depth} interrupted after {} nodes", self.nodes_searched);
                on_event(SearchEvent::Log(format!("depth {depth} interrupted")));
                // Partial results only count when no depth has completed.
                if best.is_none() && iteration_best.is_some() {
                    best = iteration_best;
                    completed_depth = depth;
                }
                break;
            }
            let Some((best_move, score)) = iteration_best else {
                break;
            };

            best = Some((best_move, score));
            completed_depth = depth;
            log::debug!(
                "depth {depth}: best {}->{} score {score} nodes {}",
                best_move.from,
                best_move.to,
                self.nodes_searched
            );
            on_event(SearchEvent::Progress {
                depth,
                best_move,
                score,
            });

            if self.is_decisive(score) {
                on_event(SearchEvent::Log(format!(
                    "forced result found at depth {depth}"
                )));
                break;
            }
        }

        let (best_move, score) = best?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let time_ms = (Self::now() - self.start_time).max(0.0) as u64;
        let stats = SearchStats {
            depth: completed_depth,
            nodes: self.nodes_searched,
            time_ms,
            score,
        };
        log::info!(
            "{mover} plays {}->{} (score {score}, depth {completed_depth}, {} nodes, {time_ms} ms)",
            best_move.from,
            best_move.to,
            stats.nodes
        );
        Some((best_move, stats))
    }
}

impl Searcher for AlphaBetaEngine {
    fn search(&mut self, board: &Board, limit: SearchLimit) -> Option<(Move, SearchStats)> {
        self.search_with_events(board, limit, &mut |_| {})
    }
}

/// Classifies a fail-soft result against the window it was searched with.
const fn bound_flag(score: i32, alpha: i32, beta: i32) -> TTFlag {
    if score <= alpha {
        TTFlag::UpperBound
    } else if score >= beta {
        TTFlag::LowerBound
    } else {
        TTFlag::Exact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ply_after_score_keeps_mover_and_depth() {
        let ply = Ply::new(Player::Two, 3);
        assert_eq!(ply.after(2), ply);
        assert_eq!(ply.after(0), Ply::new(Player::One, 2));
        assert_eq!(Ply::new(Player::One, 0).after(0).depth, 0);
    }

    #[test]
    fn test_terminal_score_prefers_faster_wins() {
        let win = EngineConfig::default().win_score;
        // Max depth 7: a win at ply 3 leaves 4 plies, a win at ply 5 leaves 2.
        assert!(terminal_score(win, 7 - 3) > terminal_score(win, 7 - 5));
        assert!(terminal_score(-win, 7 - 3) < terminal_score(-win, 7 - 5));
        assert_eq!(terminal_score(0, 4), 0);
        assert_eq!(terminal_score(win, 0), win);
    }

    #[test]
    fn test_bound_flag() {
        assert_eq!(bound_flag(5, 5, 10), TTFlag::UpperBound);
        assert_eq!(bound_flag(10, 5, 10), TTFlag::LowerBound);
        assert_eq!(bound_flag(7, 5, 10), TTFlag::Exact);
    }
}
