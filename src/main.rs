use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use trigrid_core::engine::config::EngineConfig;
use trigrid_core::engine::SearchLimit;
use trigrid_core::logic::board::Player;
use trigrid_core::logic::game::{GameState, GameStatus};
use trigrid_core::logic::layout::{self, BoardSize};
use trigrid_core::worker::{spawn_search, Output};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Size {
    Small,
    Medium,
    Large,
}

impl From<Size> for BoardSize {
    fn from(size: Size) -> Self {
        match size {
            Size::Small => Self::Small,
            Size::Medium => Self::Medium,
            Size::Large => Self::Large,
        }
    }
}

/// Plays the engine against itself on a triangle-grid board.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Board preset
    #[arg(long, value_enum, default_value_t = Size::Small)]
    size: Size,

    /// Segments every drawn line must span
    #[arg(long, default_value_t = 1)]
    line_length: u8,

    /// Fixed search depth per move (defaults to the line-length policy)
    #[arg(long, conflicts_with = "time_ms")]
    depth: Option<u8>,

    /// Wall-clock budget per move in milliseconds
    #[arg(long)]
    time_ms: Option<u64>,

    /// Seed for shuffling equally good moves
    #[arg(long)]
    seed: Option<u64>,

    /// Engine config JSON (weights as scale factors)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the move history as JSON when the game ends
    #[arg(long)]
    dump_history: bool,
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> anyhow::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            EngineConfig::load_from_json(&json)?
        }
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.shuffle_seed = args.seed;
    }
    Ok(config)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let limit = match (args.depth, args.time_ms) {
        (Some(depth), _) => SearchLimit::Depth(depth),
        (None, Some(ms)) => SearchLimit::Time(ms),
        (None, None) => SearchLimit::Auto,
    };

    let size = BoardSize::from(args.size);
    let snapshot = layout::build(size.row_lengths(), args.line_length, Player::One)?;
    let mut game = GameState::new(&snapshot)?;
    tracing::info!(
        size = ?size,
        line_length = args.line_length,
        triangles = snapshot.total_triangles,
        "Starting engine self-play"
    );

    while game.status == GameStatus::Playing {
        let mover = game.turn();
        let handle = spawn_search(game.to_snapshot(), limit, config.clone())?;
        let result = handle.wait_with(|output| match output {
            Output::Progress(progress) => tracing::debug!(
                player = %mover,
                depth = progress.depth_completed,
                score = progress.current_best_score,
                "Depth completed"
            ),
            Output::Log(line) => tracing::trace!(player = %mover, "{line}"),
            Output::Result(_) => {}
        });

        match result.best_move {
            Some(line) => {
                let points = game.make_move(line.from, line.to)?;
                let [p1, p2] = game.scores();
                tracing::info!(
                    player = %mover,
                    from = %line.from,
                    to = %line.to,
                    points,
                    depth = result.stats.map(|s| s.depth),
                    score = result.stats.map(|s| s.score),
                    "Move played ({p1}-{p2})"
                );
            }
            None => {
                tracing::info!(player = %mover, "No legal line, passing");
                game.pass()?;
            }
        }
    }

    let [p1, p2] = game.scores();
    match game.status {
        GameStatus::Finished {
            winner: Some(winner),
        } => tracing::info!(%winner, p1, p2, "Game over"),
        _ => tracing::info!(p1, p2, "Game over, tie"),
    }

    if args.dump_history {
        println!("{}", serde_json::to_string_pretty(&game.history)?);
    }
    Ok(())
}
