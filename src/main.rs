//! Balloon Pop entry point
//!
//! Mounts the simulation on the page and drives it from
//! `requestAnimationFrame`. Natively it runs a short headless demo.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use anyhow::{Context, Result};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use balloon_pop::Settings;
    use balloon_pop::audio::{AudioManager, SoundEffect};
    use balloon_pop::platform::canvas::CanvasView;
    use balloon_pop::platform::dom::{self, DomOverlay};
    use balloon_pop::sim::{Simulation, TickInput, advance};

    const ENABLE_LABEL: &str = "Enable gravity";
    const DISABLE_LABEL: &str = "Disable gravity";

    /// Page instance holding all state
    struct App {
        sim: Simulation,
        canvas: CanvasView,
        input: TickInput,
        last_time: f64,
    }

    impl App {
        fn frame(&mut self, time: f64) {
            let frame_ms = if self.last_time > 0.0 {
                (time - self.last_time) as f32
            } else {
                0.0
            };
            self.last_time = time;

            let ticks = advance(&mut self.sim, &mut self.input, frame_ms);
            if ticks > 0 {
                self.canvas.draw(&self.sim);
            }
        }
    }

    pub fn run() -> Result<()> {
        let settings = Settings::load();
        let document = dom::document()?;

        let container = dom::require(&document, &settings.container_selector)
            .context("balloon container missing")?;
        let toggle = document
            .get_element_by_id(&settings.toggle_id)
            .with_context(|| format!("toggle button #{} missing", settings.toggle_id))?;
        let counter = document.get_element_by_id(&settings.counter_id);

        let seed = js_sys::Date::now() as u64;
        let sim = Simulation::new(settings.clone(), seed);
        log::info!("Balloon Pop initialized with seed: {}", seed);

        let canvas = CanvasView::create(&document, &container, settings.width, settings.height)?;

        let mut audio = AudioManager::new();
        audio.set_muted(!settings.sound);
        let audio = Rc::new(audio);
        let popped = Rc::new(Cell::new(0u32));

        let mut overlays = Vec::with_capacity(sim.balloons().len());
        for balloon in sim.balloons() {
            let overlay = DomOverlay::create(&document, &container, balloon.color())?;
            overlays.push((balloon.id(), overlay));
        }

        let app = Rc::new(RefCell::new(App {
            sim,
            canvas,
            input: TickInput::default(),
            last_time: 0.0,
        }));

        for (id, overlay) in overlays {
            {
                let app = app.clone();
                dom::on_click(overlay.element(), move |_event| {
                    app.borrow_mut().input.pops.push(id);
                })?;
            }

            let audio = audio.clone();
            let popped = popped.clone();
            let counter = counter.clone();
            let mut a = app.borrow_mut();
            a.sim.on_explode(id, move |_balloon| {
                popped.set(popped.get() + 1);
                if let Some(el) = &counter {
                    el.set_text_content(Some(&popped.get().to_string()));
                }
                audio.play(SoundEffect::Pop);
            });
            a.sim.attach_overlay(id, Box::new(overlay));
        }

        {
            let app = app.clone();
            let audio = audio.clone();
            let label = toggle.clone();
            let enabled = Cell::new(false);
            label.set_text_content(Some(ENABLE_LABEL));
            dom::on_click(&toggle, move |_event| {
                // Two presses between ticks cancel out, like the label
                let mut a = app.borrow_mut();
                a.input.toggle_gravity = !a.input.toggle_gravity;
                drop(a);
                enabled.set(!enabled.get());
                if enabled.get() {
                    label.set_text_content(Some(DISABLE_LABEL));
                    audio.play(SoundEffect::GravityOn);
                } else {
                    label.set_text_content(Some(ENABLE_LABEL));
                    audio.play(SoundEffect::GravityOff);
                }
            })?;
        }

        app.borrow().canvas.draw(&app.borrow().sim);
        request_animation_frame(app);

        log::info!("Balloon Pop running!");
        Ok(())
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            app.borrow_mut().frame(time);
            request_animation_frame(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

    log::info!("Balloon Pop starting...");
    if let Err(e) = wasm_app::run() {
        log::error!("Setup failed: {:#}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // wasm_main is the real entry point
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use balloon_pop::Settings;
    use balloon_pop::sim::{BodyKind, Simulation, run_for};

    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    log::info!("Balloon Pop (native) headless demo, seed {}", seed);

    let settings = Settings::load();
    let mut sim = Simulation::new(settings.clone(), seed);

    run_for(&mut sim, 1000.0);
    if let Err(e) = sim.explode(0, settings.explosion) {
        log::warn!("Could not pop balloon 0: {}", e);
    }
    run_for(&mut sim, 1000.0);

    sim.toggle_gravity();
    let deadline = settings.timer_min_ms + settings.timer_spread_ms + 1000.0;
    run_for(&mut sim, deadline);

    log::info!(
        "After {:.1}s: {} popped, {} intact, {} fragments, {} bodies",
        sim.clock_ms() / 1000.0,
        sim.popped(),
        sim.intact(),
        sim.world().count_of(BodyKind::Fragment),
        sim.world().len()
    );
}
