#[cfg(test)]
mod tests {
    use crate::engine::config::EngineConfig;
    use crate::engine::eval::HeuristicEvaluator;
    use crate::engine::search::{terminal_score, AlphaBetaEngine, Ply};
    use crate::engine::{Evaluator, SearchEvent, SearchLimit, Searcher};
    use crate::logic::board::{Board, Coord, Player};
    use crate::logic::generator::MoveGenerator;
    use crate::logic::layout::{self, BoardSize};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn board(rows: &[u8], length: u8, mover: Player) -> Board {
        Board::from_snapshot(&layout::build(rows, length, mover).unwrap()).unwrap()
    }

    fn draw(board: &mut Board, from: (u8, u8), to: (u8, u8)) {
        let mv = board
            .find_move(Coord::new(from.0, from.1), Coord::new(to.0, to.1))
            .unwrap();
        let turn = board.turn();
        board.apply_move(&mv, turn).unwrap();
    }

    fn no_tt_config() -> EngineConfig {
        EngineConfig {
            use_transposition_table: false,
            ..EngineConfig::default()
        }
    }

    /// Plain minimax with the same leaf rules as the engine and no pruning.
    struct Reference {
        config: EngineConfig,
        evaluator: HeuristicEvaluator,
    }

    impl Reference {
        fn new(config: EngineConfig) -> Self {
            Self {
                evaluator: HeuristicEvaluator::new(Arc::new(config.clone())),
                config,
            }
        }

        fn bonus(&self, points: u8, mover: Player) -> i32 {
            let bonus = i32::from(points) * self.config.capture_scale;
            if mover.is_maximizer() {
                bonus
            } else {
                -bonus
            }
        }

        fn pick(mover: Player, values: impl Iterator<Item = i32>) -> Option<i32> {
            if mover.is_maximizer() {
                values.max()
            } else {
                values.min()
            }
        }

        fn quiescence(&self, board: &Board, budget: u8) -> i32 {
            let stand_pat = self.evaluator.evaluate(board);
            if board.is_complete() || budget == 0 {
                return stand_pat;
            }
            let mover = board.turn();
            let captures = MoveGenerator::generate_scoring_moves(board);
            let values = captures.iter().filter_map(|mv| {
                let sim = board.simulate(mv, mover)?;
                Some(self.bonus(sim.points, mover) + self.quiescence(&sim.board, budget - 1))
            });
            Self::pick(mover, values.chain(std::iter::once(stand_pat))).unwrap_or(stand_pat)
        }

        fn node(&self, board: &Board, ply: Ply) -> i32 {
            if board.is_complete() {
                return terminal_score(self.evaluator.evaluate(board), ply.depth);
            }
            let moves = MoveGenerator::generate_moves(board);
            if ply.depth == 0 || moves.is_empty() {
                return self.quiescence(board, self.config.quiescence_depth);
            }
            let values = moves.iter().filter_map(|mv| {
                let sim = board.simulate(mv, ply.mover)?;
                Some(self.bonus(sim.points, ply.mover) + self.node(&sim.board, ply.after(sim.points)))
            });
            Self::pick(ply.mover, values).unwrap_or_default()
        }

        fn root(&self, board: &Board, depth: u8) -> i32 {
            let mover = board.turn();
            let moves = MoveGenerator::generate_moves(board);
            let values = moves.iter().filter_map(|mv| {
                let sim = board.simulate(mv, mover)?;
                let child = Ply::new(mover, depth).after(sim.points);
                Some(self.bonus(sim.points, mover) + self.node(&sim.board, child))
            });
            Self::pick(mover, values).unwrap_or_default()
        }
    }

    fn assert_matches_reference(board: &Board, depth: u8) {
        let config = no_tt_config();
        let reference = Reference::new(config.clone());
        let mut engine = AlphaBetaEngine::new(Arc::new(config));
        let (_, stats) = engine.search(board, SearchLimit::Depth(depth)).unwrap();
        assert_eq!(
            stats.score,
            reference.root(board, stats.depth),
            "depth {} disagrees with plain minimax",
            stats.depth
        );
    }

    #[test]
    fn test_alpha_beta_matches_minimax_on_empty_boards() {
        for mover in [Player::One, Player::Two] {
            let board = board(&[2, 3, 2], 1, mover);
            for depth in 1..=3 {
                assert_matches_reference(&board, depth);
            }
        }
    }

    #[test]
    fn test_alpha_beta_matches_minimax_midgame() {
        let mut board = board(&[2, 3, 2], 1, Player::One);
        draw(&mut board, (0, 0), (1, 0));
        draw(&mut board, (0, 0), (1, 1));
        draw(&mut board, (1, 1), (2, 1));
        for depth in 1..=4 {
            assert_matches_reference(&board, depth);
        }
    }

    #[test]
    fn test_alpha_beta_matches_minimax_rhombus() {
        let mut board = board(&[1, 2, 1], 1, Player::Two);
        draw(&mut board, (0, 0), (1, 0));
        for depth in 1..=4 {
            assert_matches_reference(&board, depth);
        }
    }

    #[test]
    fn test_extra_turn_wins_within_one_ply() {
        // P1 draws A, P2 draws B, P1 draws C; P2 can now take both triangles.
        let mut board = board(&[1, 2, 1], 1, Player::One);
        draw(&mut board, (0, 0), (1, 0));
        draw(&mut board, (0, 0), (1, 1));
        draw(&mut board, (1, 0), (2, 0));
        assert_eq!(board.turn(), Player::Two);

        let mut engine = AlphaBetaEngine::new(Arc::new(EngineConfig::default()));
        let (mv, stats) = engine.search(&board, SearchLimit::Depth(1)).unwrap();
        assert_eq!((mv.from, mv.to), (Coord::new(1, 0), Coord::new(1, 1)));
        // Only reachable if the follow-up capture costs no depth.
        assert!(stats.score >= 1_000_000, "score {}", stats.score);
    }

    #[test]
    fn test_takes_free_triangle_with_and_without_tt() {
        let mut board = board(BoardSize::Small.row_lengths(), 1, Player::One);
        draw(&mut board, (0, 0), (1, 0));
        draw(&mut board, (0, 0), (1, 1));
        assert_eq!(board.turn(), Player::One);

        let mut with_tt = AlphaBetaEngine::new(Arc::new(EngineConfig::default()));
        let mut without_tt = AlphaBetaEngine::new(Arc::new(no_tt_config()));
        let (a, _) = with_tt.search(&board, SearchLimit::Depth(2)).unwrap();
        let (b, _) = without_tt.search(&board, SearchLimit::Depth(2)).unwrap();

        assert_eq!((a.from, a.to), (Coord::new(1, 0), Coord::new(1, 1)));
        assert!(a.same_line(&b));
    }

    #[test]
    fn test_progress_per_completed_depth() {
        let board = board(&[2, 3, 2], 1, Player::Two);
        let mut engine = AlphaBetaEngine::new(Arc::new(EngineConfig::default()));
        let mut depths = Vec::new();
        let result = engine.search_with_events(&board, SearchLimit::Depth(3), &mut |event| {
            if let SearchEvent::Progress { depth, .. } = event {
                depths.push(depth);
            }
        });
        let (_, stats) = result.unwrap();
        assert_eq!(depths, (1..=stats.depth).collect::<Vec<_>>());
        assert!(stats.nodes > 0);
    }

    #[test]
    fn test_no_legal_moves_returns_none() {
        let mut board = board(&[1, 2, 1], 1, Player::One);
        for (from, to) in [((0, 0), (1, 0)), ((0, 0), (1, 1)), ((1, 0), (1, 1)), ((1, 0), (2, 0)), ((1, 1), (2, 0))] {
            draw(&mut board, from, to);
        }
        assert!(board.is_complete());
        let mut engine = AlphaBetaEngine::new(Arc::new(EngineConfig::default()));
        assert!(engine.search(&board, SearchLimit::Auto).is_none());
    }

    #[test]
    fn test_stop_flag_before_search() {
        let board = board(BoardSize::Small.row_lengths(), 1, Player::One);
        let mut engine = AlphaBetaEngine::new(Arc::new(EngineConfig::default()));
        engine.set_stop_flag(Some(Arc::new(AtomicBool::new(true))));
        assert!(engine.search(&board, SearchLimit::Depth(3)).is_none());
    }

    #[test]
    fn test_time_limit_still_returns_move() {
        let board = board(BoardSize::Small.row_lengths(), 2, Player::Two);
        let mut engine = AlphaBetaEngine::new(Arc::new(EngineConfig::default()));
        let (mv, stats) = engine.search(&board, SearchLimit::Time(200)).unwrap();
        assert!(stats.depth >= 1);
        assert!(board.topology().line(mv.line).is_some());
    }

    #[test]
    fn test_shuffle_seed_is_deterministic() {
        let board = board(&[2, 3, 2], 1, Player::One);
        let config = Arc::new(EngineConfig {
            shuffle_seed: Some(11),
            ..EngineConfig::default()
        });
        let (a, _) = AlphaBetaEngine::new(Arc::clone(&config))
            .search(&board, SearchLimit::Depth(2))
            .unwrap();
        let (b, _) = AlphaBetaEngine::new(config)
            .search(&board, SearchLimit::Depth(2))
            .unwrap();
        assert!(a.same_line(&b));
    }
}
