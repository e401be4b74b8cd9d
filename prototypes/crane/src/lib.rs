//! # Crane
//!
//! A claw machine. Steer the claw with A and D, drop it with S, pull it back up with W, and squeeze with space. Anything that falls out of the bottom of the cabinet is yours. Escape shows what you've won so far, R gets you a fresh machine.
//!
//! Prize images are read from `resources/prizes/` and the win counters are kept in `resources/progress.json` between runs.

#![allow(clippy::new_without_default)]

use std::sync::Arc;

use crane_engine::{
    display::MacroquadDisplay, graphics::BLACK, Engine, EngineError, SceneError,
};

pub mod claw;
pub mod config;
pub mod gallery;
pub mod game;
pub mod machine;
pub mod prize;
pub mod progress;
pub mod resources;

use config::Config;
use game::Game;
use progress::{Progress, ProgressError};
use resources::ResourceError;

#[derive(Debug, thiserror::Error)]
pub enum CraneError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("couldn't build the machine: {0}")]
    Scene(#[from] SceneError),
}

/// Loads everything, plays until the window is closed, then saves progress.
///
/// Progress is saved even when the session ends on an error, as long as the game made it back from the update thread.
pub async fn run(config: Config) -> Result<(), CraneError> {
    let assets = resources::discover(&config.resource_dir)?;
    let catalog = Arc::new(assets.catalog);
    let progress = Progress::load_or_default(&config.save_path, catalog, &config);
    let game = Game::new(config.clone(), progress)?;

    let mut display = MacroquadDisplay::new(assets.images);
    let mut engine = Engine::new(game, config.target_fps, config.target_ups);
    engine.clear_color = BLACK;
    let result = engine.start(&mut display).await;

    let saved = engine
        .take_simulation()
        .map(|game| game.progress().save(&config.save_path));
    result?;
    if let Some(saved) = saved {
        saved?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crane_engine::{
        graphics::{vec2, Color, ImageId, Rect, Vec2},
        Display, DisplayEvent, DisplayList, InputState, Key, Surface,
    };
    use progress::Counters;
    use resources::Catalog;

    /// a window nobody sees, closing itself once `close_on` has been shown
    struct Cabinet {
        current: DisplayList,
        shown: Option<DisplayList>,
        frames: usize,
        input: InputState,
        close_on: &'static str,
    }

    impl Cabinet {
        fn new(close_on: &'static str) -> Self {
            Self {
                current: DisplayList::new(vec2(480.0, 640.0)),
                shown: None,
                frames: 0,
                input: InputState::new(),
                close_on,
            }
        }
    }

    impl Surface for Cabinet {
        fn size(&self) -> Vec2 {
            self.current.size()
        }
        fn clear(&mut self, color: Color) {
            self.current.clear(color)
        }
        fn image(&mut self, image: ImageId, dest: Rect, rotation: f32) {
            self.current.image(image, dest, rotation)
        }
        fn polygon(&mut self, points: &[Vec2], color: Color) {
            self.current.polygon(points, color)
        }
        fn rect(&mut self, rect: Rect, color: Color) {
            self.current.rect(rect, color)
        }
        fn text(&mut self, text: &str, pos: Vec2, font_size: u16, color: Color) {
            self.current.text(text, pos, font_size, color)
        }
    }

    impl Display for Cabinet {
        fn poll_events(&mut self) -> Vec<DisplayEvent> {
            let done = self
                .shown
                .as_ref()
                .is_some_and(|frame| frame.texts().any(|t| t == self.close_on));
            if done || self.frames > 5000 {
                vec![DisplayEvent::CloseRequested]
            } else {
                Vec::new()
            }
        }

        fn input(&self) -> InputState {
            self.input.clone()
        }

        async fn present(&mut self) {
            let frame = std::mem::replace(&mut self.current, DisplayList::new(vec2(480.0, 640.0)));
            self.shown = Some(frame);
            self.frames += 1;
        }
    }

    #[test]
    fn a_session_charges_for_a_drop_and_hands_the_game_back() {
        let config = Config {
            prize_count: 2,
            target_fps: 240.0,
            target_ups: 240.0,
            ..Default::default()
        };
        let catalog = Arc::new(Catalog::from_names(["Abra", "Zubat"]));
        let progress = Progress::new(Counters::default(), catalog, &config);
        let game = Game::new(config.clone(), progress).unwrap();

        let mut engine = Engine::new(game, config.target_fps, config.target_ups);
        let mut cabinet = Cabinet::new("Spent: $0.25");
        cabinet.input.press(Key::Drop);

        assert!(futures::executor::block_on(engine.start(&mut cabinet)).is_ok());

        let game = engine.take_simulation().unwrap();
        // drop stayed held the whole time, but one drop is one coin
        assert_eq!(game.progress().total_spent(), 0.25);

        let path = std::env::temp_dir()
            .join(format!("crane-session-{}", std::process::id()))
            .join("progress.json");
        game.progress().save(&path).unwrap();
        assert_eq!(Counters::load(&path).unwrap().spent, 0.25);
        std::fs::remove_file(&path).ok();
    }
}
