//! Overlay surface backed by a 2D canvas context

use pdfcraft_core::annotation::TextAlign;
use pdfcraft_core::geometry::{Point, ShapeBounds};
use pdfcraft_core::overlay::{OverlaySurface, Paint, Shadow};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasSurface {
    pub fn from_canvas(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            ctx,
            width: canvas.width() as f64,
            height: canvas.height() as f64,
        })
    }
}

impl OverlaySurface for CanvasSurface {
    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
    }

    fn set_paint(&mut self, paint: Paint) {
        let color = paint.color.to_hex();
        self.ctx.set_stroke_style_str(&color);
        self.ctx.set_fill_style_str(&color);
        self.ctx.set_line_width(paint.line_width);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        match shadow {
            Some(shadow) => {
                self.ctx.set_shadow_blur(shadow.blur);
                self.ctx.set_shadow_color(shadow.color);
            }
            None => {
                self.ctx.set_shadow_blur(0.0);
                self.ctx.set_shadow_color("transparent");
            }
        }
    }

    fn stroke_polyline(&mut self, points: &[Point]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.begin_path();
        self.ctx.move_to(first.x, first.y);
        for p in rest {
            self.ctx.line_to(p.x, p.y);
        }
        self.ctx.stroke();
    }

    fn stroke_rect(&mut self, bounds: ShapeBounds) {
        self.ctx
            .stroke_rect(bounds.x, bounds.y, bounds.width, bounds.height);
    }

    fn stroke_ellipse(&mut self, center: Point, radius_x: f64, radius_y: f64) {
        self.ctx.begin_path();
        if self
            .ctx
            .ellipse(
                center.x,
                center.y,
                radius_x,
                radius_y,
                0.0,
                0.0,
                std::f64::consts::TAU,
            )
            .is_ok()
        {
            self.ctx.stroke();
        }
    }

    fn fill_rect(&mut self, bounds: ShapeBounds, opacity: f64) {
        self.ctx.save();
        self.ctx.set_global_alpha(opacity);
        self.ctx
            .fill_rect(bounds.x, bounds.y, bounds.width, bounds.height);
        self.ctx.restore();
    }

    fn fill_text(&mut self, text: &str, anchor: Point, font: &str, alignment: TextAlign) {
        self.ctx.set_font(font);
        self.ctx.set_text_align(alignment.as_str());
        // Only fails for non-finite coordinates, which annotations never carry
        let _ = self.ctx.fill_text(text, anchor.x, anchor.y);
    }
}
