//! # Graphics
//!
//! Scenes draw onto a [`Surface`]: anything that can be cleared, have images, polygons, rectangles and text drawn on it, and report its size in pixels. The update thread draws into a recording [`draw::DisplayList`]; the render thread replays it onto the window.

pub use macroquad::{
    color::{colors::*, Color},
    math::{vec2, Rect, Vec2},
};

pub mod draw;
pub mod shapes;

crate::id_impl_new!([derive(Debug, Hash, PartialOrd, Ord)] ImageId);

/// A 2d drawable surface in pixel coordinates, y pointing down.
pub trait Surface {
    /// width and height in pixels
    fn size(&self) -> Vec2;

    /// fill the whole surface with one color
    fn clear(&mut self, color: Color);

    /// draw an image stretched to `dest`, rotated by `rotation` radians (clockwise on screen) about the center of `dest`
    fn image(&mut self, image: ImageId, dest: Rect, rotation: f32);

    /// fill a convex polygon
    fn polygon(&mut self, points: &[Vec2], color: Color);

    fn rect(&mut self, rect: Rect, color: Color);

    /// draw a line of text whose top-left corner sits at `pos`
    fn text(&mut self, text: &str, pos: Vec2, font_size: u16, color: Color);
}
