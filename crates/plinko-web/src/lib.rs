pub mod runner;

pub use runner::PlinkoRunner;

use std::cell::RefCell;

use plinko_engine::InputEvent;
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<PlinkoRunner>> = const { RefCell::new(None) };
}

/// Run `f` against the runner. Calls before `plinko_init()` are ignored and
/// yield `None`.
fn with_runner<R>(f: impl FnOnce(&mut PlinkoRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(runner) => Some(f(runner)),
            None => {
                web_sys::console::warn_1(&"plinko: not initialized, call plinko_init() first".into());
                None
            }
        }
    })
}

/// Build the board and physics world. `config_json` may be omitted or empty
/// for defaults. On error nothing is built and the message is thrown to JS.
#[wasm_bindgen]
pub fn plinko_init(config_json: Option<String>) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let runner = PlinkoRunner::from_json(config_json.as_deref().unwrap_or(""))
        .map_err(|e| JsValue::from(js_sys::Error::new(&e.to_string())))?;
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(runner);
    });
    log::info!("plinko: initialized");
    Ok(())
}

/// Advance to the host timestamp (ms). Returns the physics ticks run.
#[wasm_bindgen]
pub fn plinko_frame(timestamp_ms: f64) -> u32 {
    with_runner(|r| r.frame(timestamp_ms)).unwrap_or(0)
}

#[wasm_bindgen]
pub fn plinko_spawn_ball() {
    with_runner(|r| r.push_input(InputEvent::SpawnBall));
}

#[wasm_bindgen]
pub fn plinko_spawn_batch(count: u32, delay_ms: f64) {
    with_runner(|r| r.push_input(InputEvent::SpawnBatch { count, delay_ms }));
}

#[wasm_bindgen]
pub fn plinko_cancel_batch() {
    with_runner(|r| r.push_input(InputEvent::CancelBatch));
}

#[wasm_bindgen]
pub fn plinko_set_debug(enabled: bool) {
    with_runner(|r| r.push_input(InputEvent::SetDebug(enabled)));
}

#[wasm_bindgen]
pub fn plinko_reset() {
    with_runner(|r| r.push_input(InputEvent::Reset));
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn plinko_poses_ptr() -> *const f32 {
    with_runner(|r| r.poses_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn plinko_pose_slot_count() -> u32 {
    with_runner(|r| r.pose_slot_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn plinko_pose_floats() -> u32 {
    with_runner(|r| r.pose_floats()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn plinko_debug_ptr() -> *const f32 {
    with_runner(|r| r.debug_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn plinko_debug_vertex_count() -> u32 {
    with_runner(|r| r.debug_vertex_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn plinko_histogram_ptr() -> *const u32 {
    with_runner(|r| r.histogram_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn plinko_histogram_len() -> u32 {
    with_runner(|r| r.histogram_len()).unwrap_or(0)
}

/// Static board layout (pegs, walls, bins) as JSON.
#[wasm_bindgen]
pub fn plinko_board_json() -> String {
    with_runner(|r| r.board_json()).unwrap_or_default()
}

// ---- Stats accessors ----

#[wasm_bindgen]
pub fn plinko_active_balls() -> u32 {
    with_runner(|r| r.live_balls()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn plinko_total_spawned() -> f64 {
    with_runner(|r| r.stats().total_spawned as f64).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn plinko_total_evicted() -> f64 {
    with_runner(|r| r.stats().total_evicted as f64).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn plinko_pending_spawns() -> f64 {
    with_runner(|r| r.stats().pending_spawns as f64).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn plinko_simulated_time() -> f64 {
    with_runner(|r| r.stats().simulated_time).unwrap_or(0.0)
}
