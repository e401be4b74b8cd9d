//! The progress screen: every prize in the catalog with how many times it's been won, a page at a time.

use std::any::Any;

use crane_engine::{
    graphics::{vec2, Rect, DARKGRAY, WHITE},
    Debounce, Key, Renderable, Scene, SceneError, SceneObject, Surface, Updatable, UpdateCtx,
};

use crate::progress::Progress;

pub const COLUMNS: usize = 4;
pub const ROWS: usize = 3;
pub const PER_PAGE: usize = COLUMNS * ROWS;
const CELL_SIZE: f32 = 75.0;
const MARGIN_X: f32 = 40.0;
const MARGIN_Y: f32 = 75.0;
const FONT_SIZE: u16 = 20;
const PAGE_COOLDOWN: f64 = 0.25;

/// how many pages `prizes` prizes fill. there's always at least one, even if it's empty
pub fn page_count(prizes: usize) -> usize {
    prizes.div_ceil(PER_PAGE).max(1)
}

pub struct Gallery {
    page: usize,
    paging: Debounce,
}

impl Gallery {
    pub fn new() -> Self {
        Self {
            page: 0,
            paging: Debounce::new(PAGE_COOLDOWN),
        }
    }

    /// zero-based
    pub fn page(&self) -> usize {
        self.page
    }
}

impl Updatable<(), Progress> for Gallery {
    fn update(&mut self, ctx: &mut UpdateCtx<'_, (), Progress>) -> Result<(), SceneError> {
        let last = page_count(ctx.store.catalog().len()) - 1;
        if self.paging.pressed(ctx.input, Key::Left, ctx.now) {
            self.page = self.page.saturating_sub(1);
        } else if self.paging.pressed(ctx.input, Key::Right, ctx.now) {
            self.page = (self.page + 1).min(last);
        }
        Ok(())
    }
}

impl Renderable<(), Progress> for Gallery {
    fn render(
        &self,
        _world: &(),
        progress: &Progress,
        surface: &mut dyn Surface,
    ) -> Result<(), SceneError> {
        let catalog = progress.catalog();
        let size = surface.size();
        let step = vec2(CELL_SIZE + MARGIN_X, CELL_SIZE + MARGIN_Y);
        let origin = vec2(
            size.x / 2.0 - (COLUMNS as f32 - 0.25) * step.x / 2.0,
            size.y / 2.0 - (ROWS as f32 - 0.25) * step.y / 2.0,
        );

        let first = self.page * PER_PAGE;
        for (i, name) in catalog.names().skip(first).take(PER_PAGE).enumerate() {
            let (row, column) = (i / COLUMNS, i % COLUMNS);
            let at = origin + vec2(column as f32 * step.x, row as f32 * step.y);
            let cell = Rect::new(at.x, at.y, CELL_SIZE, CELL_SIZE);
            match catalog.picture(name) {
                Some(picture) => surface.image(picture.image, cell, 0.0),
                None => surface.rect(cell, DARKGRAY),
            }
            surface.text(name, vec2(at.x, at.y + CELL_SIZE), FONT_SIZE, WHITE);
            let count = progress.prize_count(name).to_string();
            surface.text(
                &count,
                vec2(at.x, at.y + CELL_SIZE + FONT_SIZE as f32),
                FONT_SIZE,
                WHITE,
            );
        }

        let pages = format!("Page {} / {}", self.page + 1, page_count(catalog.len()));
        surface.text(&pages, vec2(0.0, 0.0), FONT_SIZE, WHITE);
        Ok(())
    }
}

impl SceneObject<(), Progress> for Gallery {
    fn as_updatable(&mut self) -> Option<&mut dyn Updatable<(), Progress>> {
        Some(self)
    }

    fn as_renderable(&self) -> Option<&dyn Renderable<(), Progress>> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// the progress screen as a whole
pub fn progress_scene() -> Scene<(), Progress> {
    let mut scene = Scene::new();
    scene.add(Gallery::new());
    scene
}
