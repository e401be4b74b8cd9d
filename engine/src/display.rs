//! The macroquad window as a [`Display`].

use std::collections::BTreeMap;

use macroquad::{
    input::{is_key_down, is_quit_requested, prevent_quit, KeyCode},
    shapes::{draw_rectangle, draw_triangle},
    text::draw_text,
    texture::{draw_texture_ex, DrawTextureParams, Image, Texture2D},
    window::{clear_background, next_frame, screen_height, screen_width},
};

use crate::{
    engine::{Display, DisplayEvent},
    graphics::{shapes::fan_triangles, vec2, Color, ImageId, Rect, Surface, Vec2, WHITE},
    input::{InputState, Key},
};

/// which physical key drives each [`Key`]
pub const KEY_BINDINGS: [(KeyCode, Key); 7] = [
    (KeyCode::A, Key::Left),
    (KeyCode::D, Key::Right),
    (KeyCode::S, Key::Drop),
    (KeyCode::W, Key::Rise),
    (KeyCode::Space, Key::Clench),
    (KeyCode::Escape, Key::Toggle),
    (KeyCode::R, Key::Reset),
];

/// struct to store all textures in a game
pub struct Textures {
    tex: BTreeMap<ImageId, Texture2D>,
}

impl Textures {
    pub fn new() -> Self {
        Self {
            tex: BTreeMap::new(),
        }
    }

    /// uploads `image` to the gpu under `id`, replacing whatever was there
    pub fn add_image(&mut self, id: ImageId, image: &Image) {
        self.tex.insert(id, Texture2D::from_image(image));
    }

    pub fn get_texture(&self, id: ImageId) -> Option<&Texture2D> {
        self.tex.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tex.is_empty()
    }
}

/// Draws straight to the macroquad window. Only usable from inside a `#[macroquad::main]` context.
pub struct MacroquadDisplay {
    textures: Textures,
    missing: Vec<ImageId>,
}

impl MacroquadDisplay {
    /// takes over the window's close button so the engine can shut down cleanly, and uploads `images`
    pub fn new(images: impl IntoIterator<Item = (ImageId, Image)>) -> Self {
        prevent_quit();
        let mut textures = Textures::new();
        for (id, image) in images {
            textures.add_image(id, &image);
        }
        log::info!("uploaded {} textures", textures.len());
        Self {
            textures,
            missing: Vec::new(),
        }
    }
}

impl Surface for MacroquadDisplay {
    fn size(&self) -> Vec2 {
        vec2(screen_width(), screen_height())
    }

    fn clear(&mut self, color: Color) {
        clear_background(color);
    }

    fn image(&mut self, image: ImageId, dest: Rect, rotation: f32) {
        let Some(tex) = self.textures.get_texture(image) else {
            // only complain once per image, this runs every frame
            if !self.missing.contains(&image) {
                log::warn!("{image} doesn't match any loaded texture");
                self.missing.push(image);
            }
            return;
        };
        let params = DrawTextureParams {
            dest_size: Some(vec2(dest.w, dest.h)),
            rotation,
            ..Default::default()
        };
        draw_texture_ex(tex, dest.x, dest.y, WHITE, params);
    }

    fn polygon(&mut self, points: &[Vec2], color: Color) {
        for [a, b, c] in fan_triangles(points) {
            draw_triangle(a, b, c, color);
        }
    }

    fn rect(&mut self, rect: Rect, color: Color) {
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, color);
    }

    fn text(&mut self, text: &str, pos: Vec2, font_size: u16, color: Color) {
        // macroquad puts text on its baseline; move down so `pos` is the top
        draw_text(text, pos.x, pos.y + font_size as f32, font_size as f32, color);
    }
}

impl Display for MacroquadDisplay {
    fn poll_events(&mut self) -> Vec<DisplayEvent> {
        if is_quit_requested() {
            vec![DisplayEvent::CloseRequested]
        } else {
            Vec::new()
        }
    }

    fn input(&self) -> InputState {
        KEY_BINDINGS
            .iter()
            .filter(|(code, _)| is_key_down(*code))
            .map(|(_, key)| *key)
            .collect()
    }

    async fn present(&mut self) {
        next_frame().await
    }
}
