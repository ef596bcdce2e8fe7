use crate::engine::config::EngineConfig;
use crate::engine::search::AlphaBetaEngine;
use crate::engine::{SearchEvent, SearchLimit, SearchStats};
use crate::logic::board::Board;
use crate::logic::snapshot::{BoardSnapshot, MoveData, SnapshotError};
use gloo_worker::{HandlerId, Worker, WorkerScope};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

// Deep extra-turn chains recurse without consuming depth.
const SEARCH_STACK_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Input {
    Start(BoardSnapshot, SearchLimit, EngineConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub depth_completed: u8,
    pub current_best_move: MoveData,
    pub current_best_score: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub best_move: Option<MoveData>,
    pub stats: Option<SearchStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Output {
    Progress(ProgressEvent),
    Log(String),
    /// Sent exactly once per request, last.
    Result(SearchResult),
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn compute(
    engine: &mut AlphaBetaEngine,
    snapshot: &BoardSnapshot,
    limit: SearchLimit,
    emit: &mut dyn FnMut(Output),
) -> Result<SearchResult, SnapshotError> {
    let board = Board::from_snapshot(snapshot)?;
    emit(Output::Log("transposition table cleared".to_string()));

    let found = engine.search_with_events(&board, limit, &mut |event| match event {
        SearchEvent::Progress {
            depth,
            best_move,
            score,
        } => {
            if let Some(data) = board.move_data(&best_move) {
                emit(Output::Progress(ProgressEvent {
                    depth_completed: depth,
                    current_best_move: data,
                    current_best_score: score,
                }));
            }
        }
        SearchEvent::Log(line) => emit(Output::Log(line)),
    });

    Ok(match found {
        Some((mv, stats)) => SearchResult {
            best_move: board.move_data(&mv),
            stats: Some(stats),
        },
        None => SearchResult::default(),
    })
}

/// Runs one start request to completion. Progress and log messages go to
/// `emit` as they happen, followed by exactly one `Output::Result`. Invalid
/// snapshots and panics are reported as a result without a move.
pub fn run_request(
    slot: &mut Option<AlphaBetaEngine>,
    snapshot: &BoardSnapshot,
    limit: SearchLimit,
    config: EngineConfig,
    stop: Option<Arc<AtomicBool>>,
    emit: &mut dyn FnMut(Output),
) {
    let config = Arc::new(config);
    let engine = slot.get_or_insert_with(|| AlphaBetaEngine::new(Arc::clone(&config)));
    engine.update_config(config);
    engine.set_stop_flag(stop);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| compute(engine, snapshot, limit, emit)));
    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            log::warn!("rejected start request: {err}");
            emit(Output::Log(format!("rejected start request: {err}")));
            SearchResult::default()
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("search aborted: {message}");
            emit(Output::Log(format!("search aborted: {message}")));
            // Engine state is unknown after a panic.
            *slot = None;
            SearchResult::default()
        }
    };
    emit(Output::Result(result));
}

/// Browser worker: one engine reused across requests, one result per request.
pub struct SearchWorker {
    engine: Option<AlphaBetaEngine>,
}

impl Worker for SearchWorker {
    type Input = Input;
    type Message = ();
    type Output = Output;

    fn create(_scope: &WorkerScope<Self>) -> Self {
        Self { engine: None }
    }

    fn update(&mut self, _scope: &WorkerScope<Self>, _msg: Self::Message) {}

    fn received(&mut self, scope: &WorkerScope<Self>, msg: Self::Input, id: HandlerId) {
        match msg {
            Input::Start(snapshot, limit, config) => {
                run_request(&mut self.engine, &snapshot, limit, config, None, &mut |output| {
                    scope.respond(id, output);
                });
            }
        }
    }
}

/// A search running on its own native thread.
pub struct SearchHandle {
    events: Receiver<Output>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SearchHandle {
    pub const fn events(&self) -> &Receiver<Output> {
        &self.events
    }

    /// Asks the search to finish early. The result still arrives.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Blocks until the result arrives, passing earlier messages to `on_event`.
    pub fn wait_with(self, mut on_event: impl FnMut(&Output)) -> SearchResult {
        for output in self.events.iter() {
            if let Output::Result(result) = output {
                return result;
            }
            on_event(&output);
        }
        SearchResult::default()
    }

    pub fn wait(self) -> SearchResult {
        self.wait_with(|_| {})
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        self.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("search thread panicked");
            }
        }
    }
}

/// Starts a search for `snapshot` on a background thread.
pub fn spawn_search(
    snapshot: BoardSnapshot,
    limit: SearchLimit,
    config: EngineConfig,
) -> std::io::Result<SearchHandle> {
    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let worker_stop = Arc::clone(&stop);

    let thread = thread::Builder::new()
        .name("trigrid-search".to_string())
        .stack_size(SEARCH_STACK_BYTES)
        .spawn(move || {
            let mut engine = None;
            run_request(&mut engine, &snapshot, limit, config, Some(worker_stop), &mut |output| {
                // The receiver may already be gone; the search just runs out.
                let _ = tx.send(output);
            });
        })?;

    Ok(SearchHandle {
        events: rx,
        stop,
        thread: Some(thread),
    })
}
