//! Platform abstraction layer
//!
//! Browser glue for the simulation:
//! - DOM overlays that follow balloon bodies (`dom`)
//! - Canvas drawing of walls, fragments and balloons (`canvas`)
//!
//! Everything here is wasm-only; the simulation itself never touches
//! `web_sys`.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
#[cfg(target_arch = "wasm32")]
pub mod dom;

/// Turn a `JsValue` error into something `anyhow` can carry
#[cfg(target_arch = "wasm32")]
pub(crate) fn js_err(value: wasm_bindgen::JsValue) -> anyhow::Error {
    anyhow::anyhow!("{:?}", value)
}
