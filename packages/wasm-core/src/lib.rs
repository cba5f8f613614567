use wasm_bindgen::prelude::*;

mod app;
pub mod backend;
mod console_log;
pub mod dom;
pub mod storage;

pub use app::ScreenRecorder;

/// Initialize the WASM module
/// This function should be called when the WASM module is first loaded
#[wasm_bindgen(start)]
pub fn init() {
    console_log::init(log::LevelFilter::Info);
}

/// Log a message to the browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    log::info!("{}", message);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
