//! Canvas view of the world
//!
//! Draws every body each frame: walls, fragments and balloon bodies. The
//! balloon's own DOM element sits on top while it is intact; once it starts
//! popping, the canvas is what shows it inflate.

use anyhow::{Context, Result};
use std::f64::consts::TAU;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement};

use super::js_err;
use crate::sim::{BodyId, BodyKind, Outline, Simulation};

const WALL_FILL: &str = "#3b4252";
const FRAGMENT_FILL: &str = "gray";
const FRAGMENT_STROKE: &str = "orange";

pub struct CanvasView {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasView {
    /// Create a `width × height` canvas inside `container`
    pub fn create(document: &Document, container: &Element, width: f32, height: f32) -> Result<Self> {
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(js_err)?
            .dyn_into()
            .map_err(|_| anyhow::anyhow!("not a canvas"))?;
        canvas.set_width(width as u32);
        canvas.set_height(height as u32);
        container.append_child(&canvas).map_err(js_err)?;

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(js_err)?
            .context("2d context unavailable")?
            .dyn_into()
            .map_err(|_| anyhow::anyhow!("not a 2d context"))?;

        Ok(Self { canvas, ctx })
    }

    pub fn draw(&self, sim: &Simulation) {
        let w = self.canvas.width() as f64;
        let h = self.canvas.height() as f64;
        self.ctx.clear_rect(0.0, 0.0, w, h);

        let world = sim.world();
        for id in world.body_ids() {
            match world.kind(id) {
                Some(BodyKind::Boundary) => self.fill_body(sim, id, WALL_FILL, None),
                Some(BodyKind::Fragment) => {
                    self.fill_body(sim, id, FRAGMENT_FILL, Some(FRAGMENT_STROKE))
                }
                _ => {}
            }
        }

        for balloon in sim.balloons() {
            if let Some(body) = balloon.body() {
                self.fill_body(sim, body, balloon.color(), None);
            }
        }
    }

    fn fill_body(&self, sim: &Simulation, id: BodyId, fill: &str, stroke: Option<&str>) {
        let world = sim.world();
        let (Some(pos), Some(outline)) = (world.position(id), world.outline(id)) else {
            return;
        };
        let angle = world.angle(id).unwrap_or_default() as f64;

        self.ctx.save();
        let _ = self.ctx.translate(pos.x as f64, pos.y as f64);
        let _ = self.ctx.rotate(angle);
        self.ctx.begin_path();
        match outline {
            Outline::Circle { radius } => {
                let _ = self.ctx.arc(0.0, 0.0, radius as f64, 0.0, TAU);
            }
            Outline::Rect { half_extents } => {
                self.ctx.rect(
                    -half_extents.x as f64,
                    -half_extents.y as f64,
                    half_extents.x as f64 * 2.0,
                    half_extents.y as f64 * 2.0,
                );
            }
        }
        self.ctx.set_fill_style_str(fill);
        self.ctx.fill();
        if let Some(stroke) = stroke {
            self.ctx.set_line_width(1.0);
            self.ctx.set_stroke_style_str(stroke);
            self.ctx.stroke();
        }
        self.ctx.restore();
    }
}
