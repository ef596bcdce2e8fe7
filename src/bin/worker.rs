#[cfg(target_arch = "wasm32")]
fn main() {
    use gloo_worker::Registrable;
    use trigrid_core::worker::SearchWorker;

    console_error_panic_hook::set_once();
    // Already initialised when the page reuses the worker.
    console_log::init_with_level(log::Level::Debug).ok();
    SearchWorker::registrar().register();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    eprintln!("the search worker runs in the browser; build it for wasm32-unknown-unknown");
}
