//! # The crane machine
//!
//! The play scene: a physics scene holding the claw, the prize spawner and every prize in the cabinet. After each tick it looks for prizes that have fallen out of the bottom of the world (through the drop zone, or anywhere else) and credits them to the player.

use std::any::Any;

use crane_engine::{
    graphics::{vec2, Vec2, WHITE},
    ObjectId, PhysicsScene, PhysicsWorld, SceneError, Stage, Surface, Tick,
};

use crate::{
    claw::Claw,
    config::{Config, PrizeConfig},
    prize::{Prize, PrizeSpawner},
    progress::Progress,
    resources::Catalog,
};

const HUD_FONT_SIZE: u16 = 20;

pub struct CraneScene {
    physics: PhysicsScene<Progress>,
    claw: ObjectId,
    spawner: ObjectId,
    drop_point: Vec2,
    prize: PrizeConfig,
}

impl CraneScene {
    /// a fresh machine: new world, new claw, and a spawner already holding `config.prize_count` prizes
    pub fn new(config: &Config) -> Result<Self, SceneError> {
        let mut physics = PhysicsScene::with_mode(config.gravity, config.step_mode());
        let center = config.screen_center();

        let mut spawner = PrizeSpawner::new(config.spawn_interval, center, config.prize.clone());
        spawner.add_prizes(config.prize_count);
        let spawner = physics.add(spawner);

        let claw = Claw::build(physics.world_mut(), center, &config.machine)?;
        let claw = physics.add(claw);

        Ok(Self {
            physics,
            claw,
            spawner,
            drop_point: center,
            prize: config.prize.clone(),
        })
    }

    /// drops the prize called `name` in at the machine's center right away, skipping the spawner
    pub fn spawn_prize(&mut self, catalog: &Catalog, name: &str) -> Result<ObjectId, SceneError> {
        let image = catalog.picture(name).map(|p| p.image);
        let prize = Prize::spawn(
            self.physics.world_mut(),
            name,
            image,
            self.drop_point,
            &self.prize,
        )?;
        Ok(self.physics.add(prize))
    }

    pub fn physics(&self) -> &PhysicsScene<Progress> {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsScene<Progress> {
        &mut self.physics
    }

    pub fn world(&self) -> &PhysicsWorld {
        self.physics.world()
    }

    pub fn claw(&self) -> Option<&Claw> {
        self.physics.scene().get(self.claw)
    }

    pub fn spawner(&self) -> Option<&PrizeSpawner> {
        self.physics.scene().get(self.spawner)
    }

    pub fn prizes(&self) -> impl Iterator<Item = (ObjectId, &Prize)> + '_ {
        self.physics.scene().all::<Prize>()
    }

    /// removes every prize below the world's zero line, and counts it as won
    fn credit_exits(&mut self, progress: &mut Progress) -> Result<(), SceneError> {
        let world = self.physics.world();
        let won: Vec<ObjectId> = self
            .prizes()
            .filter(|(_, prize)| {
                world
                    .position(prize.body())
                    .is_ok_and(|at| at.y < 0.0)
            })
            .map(|(id, _)| id)
            .collect();

        for id in won {
            let object = self.physics.remove(id)?;
            let Some(prize) = object.as_any().downcast_ref::<Prize>() else {
                continue;
            };
            self.physics.world_mut().remove_body(prize.body())?;
            progress.increment_prize(prize.name());
            log::info!(
                "won {}! that's {} of them",
                prize.name(),
                progress.prize_count(prize.name())
            );
        }
        Ok(())
    }

    fn draw_stats(&self, progress: &Progress, surface: &mut dyn Surface) {
        let lines = [
            (
                vec2(10.0, 0.0),
                format!(
                    "Unique: {} / {}",
                    progress.unique_prizes(),
                    progress.catalog().len()
                ),
            ),
            (vec2(10.0, 40.0), format!("Total: {}", progress.total_prizes())),
            (vec2(300.0, 0.0), format!("Spent: ${:.2}", progress.total_spent())),
            (vec2(300.0, 40.0), format!("Won: ${:.2}", progress.total_won())),
            (vec2(300.0, 80.0), format!("Ratio: {:.2}", progress.ratio())),
        ];
        for (pos, text) in lines.iter() {
            surface.text(text, *pos, HUD_FONT_SIZE, WHITE);
        }
    }
}

impl Stage<Progress> for CraneScene {
    fn update(&mut self, tick: &mut Tick<'_, Progress>) -> Result<(), SceneError> {
        self.physics.update(tick)?;
        self.credit_exits(tick.store)
    }

    fn render(&self, progress: &Progress, surface: &mut dyn Surface) -> Result<(), SceneError> {
        self.physics.render(progress, surface)?;
        self.draw_stats(progress, surface);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
