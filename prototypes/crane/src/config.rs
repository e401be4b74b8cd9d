//! Machine settings, read from `crane.json` next to the executable's working directory.
//!
//! Every field has a default, so the file only needs the ones being changed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crane_engine::{graphics::vec2, graphics::Vec2, StepMode, PIXELS_PER_METER};
use macroquad::window::Conf;
use serde::{Deserialize, Serialize};

use crate::resources;

pub const CONFIG_PATH: &str = "crane.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_fps: f32,
    pub target_ups: f32,
    /// holds `prizes/` and `backgrounds/`
    pub resource_dir: PathBuf,
    /// where win counters are kept between runs
    pub save_path: PathBuf,
    /// how many prizes a fresh machine is filled with
    pub prize_count: u32,
    /// seconds between two prizes dropping in
    pub spawn_interval: f32,
    /// what one drop of the claw costs
    pub play_price: f64,
    /// seconds before the background changes
    pub background_interval: f64,
    pub gravity: f32,
    pub physics_step: PhysicsStep,
    pub machine: MachineConfig,
    pub prize: PrizeConfig,
    /// what each prize is worth when won. anything not listed is worth 1
    pub prize_values: BTreeMap<String, f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_title: "crane".to_owned(),
            window_width: 480,
            window_height: 640,
            target_fps: 60.0,
            target_ups: 60.0,
            resource_dir: PathBuf::from("resources"),
            save_path: PathBuf::from("resources/progress.json"),
            prize_count: 30,
            spawn_interval: 0.05,
            play_price: 0.25,
            background_interval: 15.0,
            gravity: -9.81,
            physics_step: PhysicsStep::Variable,
            machine: MachineConfig::default(),
            prize: PrizeConfig::default(),
            prize_values: BTreeMap::new(),
        }
    }
}

impl Config {
    /// reads `path`, falling back to defaults if it's missing or broken
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    log::info!("loaded config from {}", path.display());
                    Self::validated(config)
                }
                Err(err) => {
                    log::warn!("{} is not valid config, using defaults: {err}", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("no config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// swaps every setting the machine can't be built or run with for its default, warning about each one
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        fallback("window_width", &mut self.window_width, defaults.window_width, |w| w > 0);
        fallback("window_height", &mut self.window_height, defaults.window_height, |h| h > 0);
        fallback("target_fps", &mut self.target_fps, defaults.target_fps, positive);
        fallback("target_ups", &mut self.target_ups, defaults.target_ups, positive);
        fallback("spawn_interval", &mut self.spawn_interval, defaults.spawn_interval, positive);
        fallback("play_price", &mut self.play_price, defaults.play_price, |p| {
            p.is_finite() && p >= 0.0
        });
        fallback(
            "background_interval",
            &mut self.background_interval,
            defaults.background_interval,
            |i| i.is_finite() && i > 0.0,
        );
        fallback("gravity", &mut self.gravity, defaults.gravity, f32::is_finite);
        fallback("physics_step", &mut self.physics_step, defaults.physics_step, |step| {
            match step {
                PhysicsStep::Variable => true,
                PhysicsStep::Fixed { hz } => positive(hz),
            }
        });

        let (machine, prize) = (&mut self.machine, &mut self.prize);
        let (dm, dp) = (defaults.machine, defaults.prize);
        fallback("machine.width", &mut machine.width, dm.width, positive);
        fallback("machine.height", &mut machine.height, dm.height, positive);
        fallback(
            "machine.boundary_thickness",
            &mut machine.boundary_thickness,
            dm.boundary_thickness,
            positive,
        );
        fallback(
            "machine.support_thickness",
            &mut machine.support_thickness,
            dm.support_thickness,
            positive,
        );
        fallback(
            "machine.drop_zone_width",
            &mut machine.drop_zone_width,
            dm.drop_zone_width,
            not_negative,
        );
        fallback("machine.rope_segments", &mut machine.rope_segments, dm.rope_segments, |n| {
            n >= 1
        });
        fallback("machine.rope_length", &mut machine.rope_length, dm.rope_length, positive);
        fallback(
            "machine.rope_thickness",
            &mut machine.rope_thickness,
            dm.rope_thickness,
            positive,
        );
        fallback("machine.speed", &mut machine.speed, dm.speed, positive);
        fallback("machine.torque", &mut machine.torque, dm.torque, not_negative);
        fallback("prize.sides", &mut prize.sides, dp.sides, |n| n >= 3);
        fallback("prize.radius", &mut prize.radius, dp.radius, positive);
        fallback("prize.density", &mut prize.density, dp.density, positive);
        fallback("prize.friction", &mut prize.friction, dp.friction, not_negative);
        fallback("prize.image_scale", &mut prize.image_scale, dp.image_scale, positive);
        fallback("prize.jitter", &mut prize.jitter, dp.jitter, not_negative);

        self.prize_values.retain(|name, value| {
            let keep = value.is_finite();
            if !keep {
                log::warn!("prize_values.{name} is {value}, counting it as 1");
            }
            keep
        });
        self
    }

    /// the middle of the window, in physics meters
    pub fn screen_center(&self) -> Vec2 {
        vec2(
            self.window_width as f32 / PIXELS_PER_METER / 2.0,
            self.window_height as f32 / PIXELS_PER_METER / 2.0,
        )
    }

    pub fn step_mode(&self) -> StepMode {
        match self.physics_step {
            PhysicsStep::Variable => StepMode::Variable,
            PhysicsStep::Fixed { hz } => StepMode::Fixed { hz },
        }
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn not_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

fn fallback<T: Copy + std::fmt::Debug>(name: &str, value: &mut T, default: T, ok: impl Fn(T) -> bool) {
    if !ok(*value) {
        log::warn!("{name} can't be {value:?}, using {default:?}");
        *value = default;
    }
}

/// the window `config` asks for, with `icon.png` from the resource directory when there is one
pub fn window_conf(config: &Config) -> Conf {
    let defaults = Conf::default();
    Conf {
        window_title: config.window_title.clone(),
        window_width: config.window_width as i32,
        window_height: config.window_height as i32,
        window_resizable: false,
        fullscreen: false,
        icon: resources::window_icon(&config.resource_dir).or(defaults.icon),
        ..defaults
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysicsStep {
    Variable,
    Fixed { hz: f32 },
}

/// Geometry of the machine, all in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub width: f32,
    pub height: f32,
    /// half-thickness of the frame walls
    pub boundary_thickness: f32,
    /// half-size of the carriage, which is also the cable's width
    pub support_thickness: f32,
    /// width of the opening prizes fall out through, on the left of the floor
    pub drop_zone_width: f32,
    pub rope_segments: usize,
    pub rope_length: f32,
    /// half-thickness of a rope segment
    pub rope_thickness: f32,
    /// how fast the carriage moves in any direction, m/s
    pub speed: f32,
    /// torque on each arm while clenching
    pub torque: f32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 20.0,
            boundary_thickness: 0.25,
            support_thickness: 0.25,
            drop_zone_width: 4.0,
            rope_segments: 20,
            rope_length: 2.0,
            rope_thickness: 0.125,
            speed: 3.0,
            torque: 8.0,
        }
    }
}

/// The prize tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrizeConfig {
    pub sides: usize,
    pub radius: f32,
    pub density: f32,
    pub friction: f32,
    /// side of the drawn image in meters
    pub image_scale: f32,
    /// prizes drop in up to this far right of the machine's center
    pub jitter: f32,
}

impl Default for PrizeConfig {
    fn default() -> Self {
        Self {
            sides: 6,
            radius: 1.0,
            density: 0.1,
            friction: 0.9,
            image_scale: 2.0,
            jitter: 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_centers_the_machine() {
        let config = Config::default();
        assert_eq!(config.screen_center(), vec2(12.0, 16.0));
        assert_eq!(config.step_mode(), StepMode::Variable);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "prize_count": 5, "machine": { "speed": 4.5 }, "physics_step": { "fixed": { "hz": 120.0 } } }"#,
        )
        .unwrap();
        assert_eq!(config.prize_count, 5);
        assert_eq!(config.machine.speed, 4.5);
        assert_eq!(config.machine.width, 20.0);
        assert_eq!(config.play_price, 0.25);
        assert_eq!(config.step_mode(), StepMode::Fixed { hz: 120.0 });
    }

    #[test]
    fn missing_or_broken_files_use_defaults() {
        let dir = std::env::temp_dir().join(format!("crane-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        assert_eq!(Config::load(&dir.join("nope.json")), Config::default());

        let broken = dir.join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert_eq!(Config::load(&broken), Config::default());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn window_follows_config() {
        let config = Config {
            window_width: 300,
            ..Default::default()
        };
        let conf = window_conf(&config);
        assert_eq!(conf.window_width, 300);
        assert_eq!(conf.window_height, 640);
        assert_eq!(conf.window_title, "crane");
        assert!(conf.icon.is_some());
    }

    #[test]
    fn unusable_settings_fall_back_one_by_one() {
        let mut config = Config {
            prize_count: 7,
            spawn_interval: 0.0,
            target_ups: f32::NAN,
            play_price: -1.0,
            physics_step: PhysicsStep::Fixed { hz: 0.0 },
            ..Default::default()
        };
        config.machine.rope_segments = 0;
        config.machine.speed = -3.0;
        config.machine.width = f32::INFINITY;
        config.prize.sides = 1;
        config.prize.radius = 0.0;
        config.prize_values.insert("Abra".to_owned(), f64::NAN);
        config.prize_values.insert("Zubat".to_owned(), 5.0);

        let config = config.validated();
        let defaults = Config::default();

        assert_eq!(config.prize_count, 7);
        assert_eq!(config.spawn_interval, defaults.spawn_interval);
        assert_eq!(config.target_ups, defaults.target_ups);
        assert_eq!(config.play_price, defaults.play_price);
        assert_eq!(config.step_mode(), StepMode::Variable);
        assert_eq!(config.machine.rope_segments, 20);
        assert_eq!(config.machine.speed, 3.0);
        assert_eq!(config.machine.width, 20.0);
        assert_eq!(config.prize.sides, 6);
        assert_eq!(config.prize.radius, 1.0);
        assert_eq!(
            config.prize_values.into_iter().collect::<Vec<_>>(),
            vec![("Zubat".to_owned(), 5.0)]
        );
    }

    #[test]
    fn negative_rates_fall_back_and_good_ones_stay() {
        let slow = Config {
            physics_step: PhysicsStep::Fixed { hz: -60.0 },
            ..Default::default()
        };
        assert_eq!(slow.validated().physics_step, PhysicsStep::Variable);

        let fast = Config {
            physics_step: PhysicsStep::Fixed { hz: 240.0 },
            ..Default::default()
        };
        assert_eq!(fast.clone().validated(), fast);
        assert_eq!(Config::default().validated(), Config::default());
    }

    #[test]
    fn loading_checks_the_file() {
        let dir = std::env::temp_dir().join(format!("crane-config-check-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("crane.json");
        std::fs::write(
            &path,
            r#"{ "machine": { "rope_segments": 0 }, "prize": { "sides": 2 }, "physics_step": { "fixed": { "hz": 0 } } }"#,
        )
        .unwrap();

        let config = Config::load(&path);
        assert_eq!(config.machine.rope_segments, 20);
        assert_eq!(config.prize.sides, 6);
        assert_eq!(config.physics_step, PhysicsStep::Variable);

        std::fs::remove_dir_all(&dir).ok();
    }
}
