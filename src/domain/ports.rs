use chrono::{DateTime, Utc};

use super::document::{Color, Font, ImageRef, TextAlign};

/// Source of the evaluation time used for the "newly added" window.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Primitive drawing operations offered by a rendering backend.
///
/// Coordinates are page-local points with the origin at the top-left corner.
pub trait DrawingSurface {
    fn new_page(&mut self, width: f64, height: f64);
    fn draw_text(&mut self, content: &str, x: f64, y: f64, align: TextAlign, font: Font, color: Color);
    fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64, corner_radius: f64, fill: Color);
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color, width: f64);
    fn draw_image(&mut self, image: &ImageRef, x: f64, y: f64, w: f64, h: f64);
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
