//! # Prizes
//!
//! A [`Prize`] is a hexagonal token with a name, dropped into the machine by a [`PrizeSpawner`] a few at a time so they don't all land in one heap. Prizes never update themselves: the machine watches for the ones that fall out.

use std::any::Any;

use crane_engine::{
    graphics::{vec2, Vec2, GOLD},
    physics::regular_polygon_collider,
    ImageId, PhysicsWorld, Renderable, SceneError, SceneObject, Surface, Updatable, UpdateCtx,
};
use macroquad::rand::gen_range;
use rapier2d::prelude::*;

use crate::{config::PrizeConfig, progress::Progress, resources::Catalog};

pub struct Prize {
    name: String,
    image: Option<ImageId>,
    body: RigidBodyHandle,
    image_scale: f32,
}

impl Prize {
    /// drops a prize called `name` into `world` with its center at `at`
    pub fn spawn(
        world: &mut PhysicsWorld,
        name: impl Into<String>,
        image: Option<ImageId>,
        at: Vec2,
        config: &PrizeConfig,
    ) -> Result<Self, SceneError> {
        let collider = regular_polygon_collider(config.sides, config.radius)?
            .density(config.density)
            .friction(config.friction)
            .build();
        let body = world.add_body(
            RigidBodyBuilder::dynamic().translation(vector![at.x, at.y]),
            [collider],
        );
        Ok(Self {
            name: name.into(),
            image,
            body,
            image_scale: config.image_scale,
        })
    }

    /// a prize picked at random from `catalog`, or `None` if the catalog is empty
    pub fn spawn_random(
        world: &mut PhysicsWorld,
        catalog: &Catalog,
        at: Vec2,
        config: &PrizeConfig,
    ) -> Option<Result<Self, SceneError>> {
        if catalog.is_empty() {
            return None;
        }
        let name = catalog.name(gen_range(0, catalog.len()))?;
        let image = catalog.picture(name).map(|p| p.image);
        Some(Self::spawn(world, name, image, at, config))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn image(&self) -> Option<ImageId> {
        self.image
    }
}

impl Renderable<PhysicsWorld, Progress> for Prize {
    fn render(
        &self,
        world: &PhysicsWorld,
        _progress: &Progress,
        surface: &mut dyn Surface,
    ) -> Result<(), SceneError> {
        match self.image {
            Some(image) => world.render_image(self.body, image, self.image_scale, surface),
            None => world.render_body(self.body, surface, GOLD),
        }
    }
}

impl SceneObject<PhysicsWorld, Progress> for Prize {
    fn as_renderable(&self) -> Option<&dyn Renderable<PhysicsWorld, Progress>> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Adds prizes to its scene one every `interval` seconds until it runs out.
#[derive(Debug, Clone)]
pub struct PrizeSpawner {
    remaining: u32,
    interval: f32,
    countdown: f32,
    running: bool,
    drop_point: Vec2,
    config: PrizeConfig,
}

impl PrizeSpawner {
    /// an idle spawner dropping prizes at `drop_point`, plus up to `config.jitter` to the right
    pub fn new(interval: f32, drop_point: Vec2, config: PrizeConfig) -> Self {
        Self {
            remaining: 0,
            interval,
            countdown: 0.0,
            running: false,
            drop_point,
            config,
        }
    }

    /// queues `count` more prizes. a countdown already under way carries on
    pub fn add_prizes(&mut self, count: u32) {
        self.remaining += count;
        self.running = self.remaining > 0;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn countdown(&self) -> f32 {
        self.countdown
    }

    fn stop(&mut self) {
        self.remaining = 0;
        self.running = false;
        self.countdown = 0.0;
    }
}

impl Updatable<PhysicsWorld, Progress> for PrizeSpawner {
    fn update(&mut self, ctx: &mut UpdateCtx<'_, PhysicsWorld, Progress>) -> Result<(), SceneError> {
        if !self.running {
            return Ok(());
        }

        self.countdown -= ctx.dt;
        if self.countdown <= 0.0 {
            let at = self.drop_point + vec2(gen_range(0.0, self.config.jitter), 0.0);
            let Some(prize) =
                Prize::spawn_random(ctx.world, ctx.store.catalog(), at, &self.config)
            else {
                log::warn!("no prizes to drop, {} skipped", self.remaining);
                self.stop();
                return Ok(());
            };
            let prize = match prize {
                Ok(prize) => prize,
                Err(err) => {
                    self.stop();
                    return Err(err);
                }
            };
            ctx.spawn(prize);
            self.remaining -= 1;
            self.countdown = self.interval;
        }

        if self.remaining == 0 {
            self.stop();
        }
        Ok(())
    }
}

impl SceneObject<PhysicsWorld, Progress> for PrizeSpawner {
    fn as_updatable(&mut self) -> Option<&mut dyn Updatable<PhysicsWorld, Progress>> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crane_engine::{
        graphics::{draw::Drawable, Rect},
        DisplayList, InputState, ObjectId, PhysicsScene, Stage, Tick,
    };
    use std::sync::Arc;

    const INTERVAL: f32 = 0.05;

    fn setup(names: &[&str]) -> (PhysicsScene<Progress>, ObjectId, Progress) {
        let config = Config::default();
        let mut scene = PhysicsScene::new(config.gravity);
        let spawner = scene.add(PrizeSpawner::new(
            INTERVAL,
            config.screen_center(),
            config.prize.clone(),
        ));
        let catalog = Arc::new(Catalog::from_names(names.iter().copied()));
        let progress = Progress::new(Default::default(), catalog, &config);
        (scene, spawner, progress)
    }

    fn run(scene: &mut PhysicsScene<Progress>, progress: &mut Progress, dt: f32, ticks: usize) {
        let input = InputState::new();
        for i in 0..ticks {
            let mut tick = Tick {
                dt,
                now: i as f64 * dt as f64,
                input: &input,
                store: &mut *progress,
            };
            assert!(scene.update(&mut tick).is_ok());
        }
    }

    fn spawner(scene: &mut PhysicsScene<Progress>, id: ObjectId) -> &mut PrizeSpawner {
        scene.scene_mut().get_mut::<PrizeSpawner>(id).unwrap()
    }

    fn prizes(scene: &PhysicsScene<Progress>) -> usize {
        scene.scene().all::<Prize>().count()
    }

    #[test]
    fn spawns_the_requested_count_then_idles() {
        let (mut scene, id, mut progress) = setup(&["Abra", "Zubat"]);
        spawner(&mut scene, id).add_prizes(5);
        assert!(spawner(&mut scene, id).is_running());

        // a bit more than 5 intervals
        run(&mut scene, &mut progress, 0.01, 30);

        assert_eq!(prizes(&scene), 5);
        let spawner = spawner(&mut scene, id);
        assert!(!spawner.is_running());
        assert_eq!(spawner.remaining(), 0);
        assert_eq!(spawner.countdown(), 0.0);
    }

    #[test]
    fn adding_more_keeps_the_countdown() {
        let (mut scene, id, mut progress) = setup(&["Abra"]);
        spawner(&mut scene, id).add_prizes(3);
        run(&mut scene, &mut progress, 0.01, 1);
        assert_eq!(prizes(&scene), 1);
        assert_eq!(spawner(&mut scene, id).countdown(), INTERVAL);

        spawner(&mut scene, id).add_prizes(3);
        assert_eq!(spawner(&mut scene, id).countdown(), INTERVAL);
        assert_eq!(spawner(&mut scene, id).remaining(), 5);

        run(&mut scene, &mut progress, 0.01, 60);
        assert_eq!(prizes(&scene), 6);
        assert!(!spawner(&mut scene, id).is_running());
    }

    #[test]
    fn adding_nothing_stays_idle() {
        let (mut scene, id, mut progress) = setup(&["Abra"]);
        spawner(&mut scene, id).add_prizes(0);
        assert!(!spawner(&mut scene, id).is_running());
        run(&mut scene, &mut progress, 0.01, 10);
        assert_eq!(prizes(&scene), 0);
    }

    #[test]
    fn empty_catalog_gives_up() {
        let (mut scene, id, mut progress) = setup(&[]);
        spawner(&mut scene, id).add_prizes(4);
        run(&mut scene, &mut progress, 0.01, 5);
        assert_eq!(prizes(&scene), 0);
        assert!(!spawner(&mut scene, id).is_running());
    }

    #[test]
    fn an_impossible_shape_stops_only_its_spawner() {
        let (mut scene, good, mut progress) = setup(&["Abra"]);
        let flat = PrizeConfig {
            sides: 1,
            ..Default::default()
        };
        let bad = scene.add(PrizeSpawner::new(INTERVAL, vec2(12.0, 16.0), flat));
        spawner(&mut scene, bad).add_prizes(2);
        spawner(&mut scene, good).add_prizes(2);

        run(&mut scene, &mut progress, 0.01, 20);

        let bad = spawner(&mut scene, bad);
        assert!(!bad.is_running());
        assert_eq!(bad.remaining(), 0);
        assert_eq!(prizes(&scene), 2);
        assert!(!spawner(&mut scene, good).is_running());
    }

    #[test]
    fn spawned_prizes_come_from_the_catalog_and_land_near_the_drop_point() {
        let (mut scene, id, mut progress) = setup(&["Abra", "Zubat"]);
        spawner(&mut scene, id).add_prizes(4);
        run(&mut scene, &mut progress, 0.01, 1);

        let (_, prize) = scene.scene().all::<Prize>().next().unwrap();
        assert!(["Abra", "Zubat"].contains(&prize.name()));
        assert_eq!(prize.image(), None);
        let at = scene.world().position(prize.body()).unwrap();
        assert!((12.0..15.0).contains(&at.x), "{at:?}");
        assert_eq!(at.y, 16.0);
    }

    #[test]
    fn draws_the_image_when_there_is_one() {
        let (mut scene, _, progress) = setup(&["Abra"]);
        let prize = Prize::spawn(
            scene.world_mut(),
            "Abra",
            Some(ImageId::new(3)),
            vec2(5.0, 10.0),
            &PrizeConfig::default(),
        )
        .unwrap();
        let plain = Prize::spawn(
            scene.world_mut(),
            "Zubat",
            None,
            vec2(15.0, 10.0),
            &PrizeConfig::default(),
        )
        .unwrap();
        scene.add(prize);
        scene.add(plain);

        let mut list = DisplayList::new(vec2(480.0, 640.0));
        assert!(Stage::render(&scene, &progress, &mut list).is_ok());
        assert_eq!(
            list.drawables()[0],
            Drawable::Image(ImageId::new(3), Rect::new(80.0, 420.0, 40.0, 40.0), -0.0)
        );
        assert!(matches!(
            &list.drawables()[1],
            Drawable::Polygon(points, color) if points.len() == 6 && *color == GOLD
        ));
    }
}
