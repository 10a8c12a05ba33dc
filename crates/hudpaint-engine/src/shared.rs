//! Lock-guarded drawing context for callers on several threads.

use std::f64::consts::TAU;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::context::DrawingContext;
use crate::paint::{Color, Pattern};

/// One [`DrawingContext`] behind one exclusive lock.
///
/// Every primitive method takes the lock for exactly one call. The composite
/// helpers (`draw_line`, `fill_rect`, ...) are sequences of primitives and are
/// not atomic: another caller may interleave calls between their steps and
/// observe or disturb the partial path. Use [`with`](Self::with) to run a
/// sequence under a single lock.
#[derive(Debug, Clone)]
pub struct SharedContext {
    inner: Arc<Mutex<DrawingContext>>,
}

impl SharedContext {
    pub fn new(ctx: DrawingContext) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ctx)),
        }
    }

    /// Runs `f` with the lock held for its whole duration.
    pub fn with<R>(&self, f: impl FnOnce(&mut DrawingContext) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, DrawingContext> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── primitives ────────────────────────────────────────────────────────

    pub fn save(&self) {
        self.lock().save();
    }

    pub fn restore(&self) {
        self.lock().restore();
    }

    pub fn set_source_rgba(&self, r: f64, g: f64, b: f64, a: f64) {
        self.lock().set_source_rgba(r, g, b, a);
    }

    pub fn set_source_color(&self, color: Color) {
        self.lock().set_source_color(color);
    }

    pub fn set_source(&self, pattern: Pattern) {
        self.lock().set_source(pattern);
    }

    pub fn set_line_width(&self, width: f64) {
        self.lock().set_line_width(width);
    }

    pub fn new_path(&self) {
        self.lock().new_path();
    }

    pub fn move_to(&self, x: f64, y: f64) {
        self.lock().move_to(x, y);
    }

    pub fn line_to(&self, x: f64, y: f64) {
        self.lock().line_to(x, y);
    }

    pub fn rectangle(&self, x: f64, y: f64, width: f64, height: f64) {
        self.lock().rectangle(x, y, width, height);
    }

    pub fn arc(&self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        self.lock().arc(xc, yc, radius, angle1, angle2);
    }

    pub fn close_path(&self) {
        self.lock().close_path();
    }

    pub fn fill(&self) {
        self.lock().fill();
    }

    pub fn stroke(&self) {
        self.lock().stroke();
    }

    pub fn paint(&self) {
        self.lock().paint();
    }

    pub fn translate(&self, tx: f64, ty: f64) {
        self.lock().translate(tx, ty);
    }

    pub fn reset_clip(&self) {
        self.lock().reset_clip();
    }

    // ── composites ────────────────────────────────────────────────────────

    pub fn draw_line(&self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.new_path();
        self.move_to(x1, y1);
        self.line_to(x2, y2);
        self.stroke();
    }

    pub fn stroke_rect(&self, x: f64, y: f64, width: f64, height: f64) {
        self.new_path();
        self.rectangle(x, y, width, height);
        self.stroke();
    }

    pub fn fill_rect(&self, x: f64, y: f64, width: f64, height: f64) {
        self.new_path();
        self.rectangle(x, y, width, height);
        self.fill();
    }

    pub fn fill_circle(&self, xc: f64, yc: f64, radius: f64) {
        self.new_path();
        self.arc(xc, yc, radius, 0.0, TAU);
        self.close_path();
        self.fill();
    }

    pub fn stroke_circle(&self, xc: f64, yc: f64, radius: f64) {
        self.new_path();
        self.arc(xc, yc, radius, 0.0, TAU);
        self.close_path();
        self.stroke();
    }
}

impl From<DrawingContext> for SharedContext {
    fn from(ctx: DrawingContext) -> Self {
        Self::new(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;

    fn shared(w: i32, h: i32) -> (Surface, SharedContext) {
        let surface = Surface::new(w, h);
        let ctx = DrawingContext::new(&surface).unwrap();
        (surface, SharedContext::new(ctx))
    }

    fn px(surface: &Surface, x: u32, y: u32) -> [u8; 4] {
        surface.with_bitmap(|b| b.pixel(x, y).to_rgba8()).unwrap()
    }

    #[test]
    fn composites_draw_and_leave_no_path() {
        let (surface, ctx) = shared(20, 20);
        ctx.set_source_rgba(1.0, 0.0, 0.0, 1.0);
        ctx.fill_rect(0.0, 0.0, 4.0, 4.0);
        ctx.fill_circle(12.0, 12.0, 4.0);
        ctx.set_line_width(2.0);
        ctx.draw_line(0.0, 18.0, 20.0, 18.0);
        assert_eq!(px(&surface, 2, 2), [255, 0, 0, 255]);
        assert_eq!(px(&surface, 12, 12), [255, 0, 0, 255]);
        assert_eq!(px(&surface, 10, 17), [255, 0, 0, 255]);
        assert_eq!(px(&surface, 6, 6), [0, 0, 0, 0]);
        assert!(ctx.with(|c| c.path().is_empty()));
    }

    #[test]
    fn stroke_helpers_outline_only() {
        let (surface, ctx) = shared(20, 20);
        ctx.set_source_color(Color::white());
        ctx.stroke_rect(2.0, 2.0, 10.0, 10.0);
        ctx.stroke_circle(10.0, 10.0, 6.0);
        assert_eq!(px(&surface, 7, 2)[3], 255);
        assert_eq!(px(&surface, 7, 7)[3], 0);
    }

    #[test]
    fn clones_share_one_context() {
        let (_surface, a) = shared(4, 4);
        let b = a.clone();
        a.set_line_width(6.0);
        assert_eq!(b.with(|c| c.line_width()), 6.0);
    }

    #[test]
    fn concurrent_callers_do_not_corrupt_state() {
        let (surface, ctx) = shared(32, 32);
        ctx.set_source_rgba(0.0, 0.0, 1.0, 1.0);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        // Atomic under one lock, so the rectangle is always intact.
                        ctx.with(|c| {
                            c.new_path();
                            c.rectangle(i as f64 * 8.0, 0.0, 8.0, 8.0);
                            c.fill();
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..4 {
            assert_eq!(px(&surface, i * 8 + 4, 4), [0, 0, 255, 255]);
        }
        assert_eq!(px(&surface, 4, 20), [0, 0, 0, 0]);
    }
}
