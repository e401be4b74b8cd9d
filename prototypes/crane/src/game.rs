//! # Game
//!
//! The whole game as one [`Simulation`]: the crane machine and the progress screen under a [`SceneManager`], the player's [`Progress`], and a rotating background behind whichever scene is showing.
//!
//! Escape flips between the two scenes and R swaps in a brand new machine. Both share one cooldown, so holding either doesn't flicker.

use crane_engine::{
    graphics::Rect, Debounce, InputState, Key, SceneError, SceneManager, Simulation, Stage,
    Surface, Tick,
};
use macroquad::rand::gen_range;

use crate::{
    config::Config, gallery::progress_scene, machine::CraneScene, progress::Progress,
    resources::Picture,
};

pub const CRANE: &str = "crane";
pub const PROGRESS: &str = "progress";

const TOGGLE_COOLDOWN: f64 = 0.25;

pub struct Game {
    manager: SceneManager<Progress>,
    progress: Progress,
    config: Config,
    cooldown: Debounce,
    backdrop: Backdrop,
}

impl Game {
    /// starts on a fresh machine
    pub fn new(config: Config, progress: Progress) -> Result<Self, SceneError> {
        let mut manager = SceneManager::new();
        manager.insert(CRANE, CraneScene::new(&config)?);
        manager.insert(PROGRESS, progress_scene());
        manager.set_current(CRANE)?;

        let backdrop = Backdrop::new(
            progress.catalog().backgrounds().to_vec(),
            config.background_interval,
        );
        Ok(Self {
            manager,
            progress,
            config,
            cooldown: Debounce::new(TOGGLE_COOLDOWN),
            backdrop,
        })
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn into_progress(self) -> Progress {
        self.progress
    }

    /// key of the scene showing
    pub fn current(&self) -> Option<&str> {
        self.manager.current()
    }

    pub fn crane(&self) -> Option<&CraneScene> {
        self.manager.get(CRANE)
    }

    pub fn background(&self) -> Option<Picture> {
        self.backdrop.current()
    }

    /// between the machine and the progress screen
    pub fn toggle(&mut self) -> Result<(), SceneError> {
        let next = if self.current() == Some(PROGRESS) {
            CRANE
        } else {
            PROGRESS
        };
        self.manager.set_current(next)?;
        log::debug!("showing {next}");
        Ok(())
    }

    /// throws the machine away, prizes and all, and shows a new one
    pub fn reset(&mut self) -> Result<(), SceneError> {
        self.manager.insert(CRANE, CraneScene::new(&self.config)?);
        self.manager.set_current(CRANE)?;
        log::info!("machine reset");
        Ok(())
    }
}

impl Simulation for Game {
    fn update(&mut self, dt: f32, now: f64, input: &InputState) -> Result<(), SceneError> {
        let mut tick = Tick {
            dt,
            now,
            input,
            store: &mut self.progress,
        };
        self.manager.update(&mut tick)?;

        if self.cooldown.pressed(input, Key::Toggle, now) {
            self.toggle()?;
        } else if self.cooldown.pressed(input, Key::Reset, now) {
            self.reset()?;
        }

        self.backdrop.update(now);
        Ok(())
    }

    fn render(&self, surface: &mut dyn Surface) -> Result<(), SceneError> {
        self.backdrop.render(surface);
        self.manager.render(&self.progress, surface)
    }
}

/// The background images, one at a time, changing every `interval` seconds.
struct Backdrop {
    pictures: Vec<Picture>,
    current: Option<usize>,
    interval: f64,
    changed_at: f64,
}

impl Backdrop {
    fn new(pictures: Vec<Picture>, interval: f64) -> Self {
        let current = (!pictures.is_empty()).then(|| gen_range(0, pictures.len()));
        Self {
            pictures,
            current,
            interval,
            changed_at: 0.0,
        }
    }

    fn current(&self) -> Option<Picture> {
        self.current.map(|idx| self.pictures[idx])
    }

    fn update(&mut self, now: f64) {
        let Some(current) = self.current else {
            return;
        };
        if now - self.changed_at < self.interval {
            return;
        }
        self.changed_at = now;
        let others = self.pictures.len() - 1;
        if others > 0 {
            // pick among the rest so the same one never shows twice in a row
            let pick = gen_range(0, others);
            self.current = Some(if pick < current { pick } else { pick + 1 });
        }
    }

    /// scaled to the surface's height and centered
    fn render(&self, surface: &mut dyn Surface) {
        let Some(picture) = self.current() else {
            return;
        };
        if picture.size.y <= 0.0 {
            return;
        }
        let size = surface.size();
        let width = size.y * picture.size.x / picture.size.y;
        let dest = Rect::new((size.x - width) / 2.0, 0.0, width, size.y);
        surface.image(picture.image, dest, 0.0);
    }
}
