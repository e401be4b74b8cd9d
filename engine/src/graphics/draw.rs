use super::{Color, ImageId, Rect, Surface, Vec2};

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Clear(Color),
    /// image id, destination rect, then rotation in radians
    Image(ImageId, Rect, f32),
    /// vertices in order, then color
    Polygon(Vec<Vec2>, Color),
    Rectangle(Rect, Color),
    /// string, top-left position, font size, then color
    Text(String, Vec2, u16, Color),
}

impl Drawable {
    pub fn draw(&self, surface: &mut dyn Surface) {
        match self {
            Drawable::Clear(color) => surface.clear(*color),
            Drawable::Image(image, dest, rotation) => surface.image(*image, *dest, *rotation),
            Drawable::Polygon(points, color) => surface.polygon(points, *color),
            Drawable::Rectangle(rect, color) => surface.rect(*rect, *color),
            Drawable::Text(text, pos, size, color) => surface.text(text, *pos, *size, *color),
        }
    }
}

/// A [`Surface`] that only remembers what was drawn on it.
///
/// This is the frame the update thread hands over to the render thread: everything a scene drew during one tick, in painter's order, at the surface size the render thread last reported.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayList {
    size: Vec2,
    drawables: Vec<Drawable>,
}

impl DisplayList {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            drawables: Vec::new(),
        }
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// draw everything recorded here onto another surface, in the order it was recorded
    pub fn replay(&self, surface: &mut dyn Surface) {
        for drawable in self.drawables.iter() {
            drawable.draw(surface);
        }
    }

    /// all the text drawn this frame, handy for checking what a scene said
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.drawables.iter().filter_map(|d| match d {
            Drawable::Text(text, ..) => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Surface for DisplayList {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, color: Color) {
        // nothing drawn before a clear can show
        self.drawables.clear();
        self.drawables.push(Drawable::Clear(color));
    }

    fn image(&mut self, image: ImageId, dest: Rect, rotation: f32) {
        self.drawables.push(Drawable::Image(image, dest, rotation));
    }

    fn polygon(&mut self, points: &[Vec2], color: Color) {
        if points.len() >= 3 {
            self.drawables.push(Drawable::Polygon(points.to_vec(), color));
        }
    }

    fn rect(&mut self, rect: Rect, color: Color) {
        self.drawables.push(Drawable::Rectangle(rect, color));
    }

    fn text(&mut self, text: &str, pos: Vec2, font_size: u16, color: Color) {
        self.drawables
            .push(Drawable::Text(text.to_owned(), pos, font_size, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{vec2, RED, WHITE};

    #[test]
    fn records_in_order() {
        let mut list = DisplayList::new(vec2(480.0, 640.0));
        list.rect(Rect::new(0.0, 0.0, 10.0, 10.0), RED);
        list.text("hi", vec2(1.0, 2.0), 20, WHITE);
        list.image(ImageId::new(3), Rect::new(5.0, 5.0, 40.0, 40.0), 0.5);

        assert_eq!(list.size(), vec2(480.0, 640.0));
        assert_eq!(
            list.drawables(),
            &[
                Drawable::Rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), RED),
                Drawable::Text("hi".to_owned(), vec2(1.0, 2.0), 20, WHITE),
                Drawable::Image(ImageId::new(3), Rect::new(5.0, 5.0, 40.0, 40.0), 0.5),
            ]
        );
    }

    #[test]
    fn clear_drops_earlier_draws() {
        let mut list = DisplayList::new(vec2(10.0, 10.0));
        list.rect(Rect::new(0.0, 0.0, 1.0, 1.0), RED);
        list.clear(WHITE);
        assert_eq!(list.drawables(), &[Drawable::Clear(WHITE)]);
    }

    #[test]
    fn degenerate_polygons_are_skipped() {
        let mut list = DisplayList::new(vec2(10.0, 10.0));
        list.polygon(&[vec2(0.0, 0.0), vec2(1.0, 1.0)], RED);
        assert!(list.is_empty());
    }

    #[test]
    fn replays_onto_another_surface() {
        let mut list = DisplayList::new(vec2(10.0, 10.0));
        list.text("one", vec2(0.0, 0.0), 10, WHITE);
        list.polygon(&[vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(0.0, 1.0)], RED);

        let mut copy = DisplayList::new(vec2(10.0, 10.0));
        list.replay(&mut copy);
        assert_eq!(copy, list);
        assert_eq!(copy.texts().collect::<Vec<_>>(), vec!["one"]);
    }
}
