//! # Scenes
//!
//! A [`Scene`] is an ordered list of [`SceneObject`]s. Every tick it asks each child, in the order they were added, whether it is [`Updatable`] and updates it if so; every frame it does the same for [`Renderable`]. Later children draw over earlier ones.
//!
//! Scenes are generic over two things:
//! - `W`, the world the children live in (a physics world for a [`PhysicsScene`](crate::PhysicsScene), `()` for a plain overlay), and
//! - `S`, the game-wide store every scene shares (counters, catalogs, whatever the game needs), threaded through a [`Tick`].
//!
//! Whole scenes are [`Stage`]s, and a [`SceneManager`] is a stage that forwards to whichever registered stage is current.

use std::any::Any;
use std::collections::BTreeMap;

use crate::{error::SceneError, graphics::Surface, input::InputState};

crate::id_impl_new!([derive(Debug, Hash, PartialOrd, Ord)] ObjectId);

/// Everything a stage gets for one update tick.
pub struct Tick<'a, S> {
    /// seconds since the previous tick
    pub dt: f32,
    /// seconds since the engine started
    pub now: f64,
    pub input: &'a InputState,
    pub store: &'a mut S,
}

/// What an updating child can see and touch: the tick, its scene's world, the shared store, and a queue for adding siblings.
pub struct UpdateCtx<'a, W, S> {
    pub dt: f32,
    pub now: f64,
    pub input: &'a InputState,
    pub world: &'a mut W,
    pub store: &'a mut S,
    spawned: Vec<Box<dyn SceneObject<W, S>>>,
}

impl<'a, W, S> UpdateCtx<'a, W, S> {
    /// adds `object` to the end of the scene once every child has been updated this tick. it'll first update next tick
    pub fn spawn(&mut self, object: impl SceneObject<W, S>) {
        self.spawned.push(Box::new(object));
    }
}

/// Per-tick logic.
pub trait Updatable<W, S> {
    fn update(&mut self, ctx: &mut UpdateCtx<'_, W, S>) -> Result<(), SceneError>;
}

/// Per-frame drawing. Rendering only reads: anything that changes belongs in [`Updatable::update`].
pub trait Renderable<W, S> {
    fn render(&self, world: &W, store: &S, surface: &mut dyn Surface) -> Result<(), SceneError>;
}

/// Anything that can be added to a [`Scene`].
///
/// An object says which passes it takes part in by returning itself from [`as_updatable`](SceneObject::as_updatable) and/or [`as_renderable`](SceneObject::as_renderable); the defaults opt out of both.
pub trait SceneObject<W, S>: Any + Send {
    fn as_updatable(&mut self) -> Option<&mut dyn Updatable<W, S>> {
        None
    }

    fn as_renderable(&self) -> Option<&dyn Renderable<W, S>> {
        None
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// An ordered collection of scene objects.
pub struct Scene<W, S> {
    children: Vec<(ObjectId, Box<dyn SceneObject<W, S>>)>,
    id_max: usize,
}

impl<W: 'static, S: 'static> Scene<W, S> {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            id_max: 0,
        }
    }

    /// appends `object` after every existing child and returns the id it can be removed by
    pub fn add(&mut self, object: impl SceneObject<W, S>) -> ObjectId {
        self.add_boxed(Box::new(object))
    }

    pub fn add_boxed(&mut self, object: Box<dyn SceneObject<W, S>>) -> ObjectId {
        let id = ObjectId::new(self.id_max);
        self.id_max += 1;
        self.children.push((id, object));
        id
    }

    /// takes the object out of the scene and hands it back
    pub fn remove(&mut self, id: ObjectId) -> Result<Box<dyn SceneObject<W, S>>, SceneError> {
        let idx = self
            .children
            .iter()
            .position(|(child, _)| *child == id)
            .ok_or(SceneError::NotFound(id))?;
        Ok(self.children.remove(idx).1)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.children.iter().any(|(child, _)| *child == id)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// ids in update/render order
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.children.iter().map(|(id, _)| *id)
    }

    pub fn get<T: 'static>(&self, id: ObjectId) -> Option<&T> {
        self.children
            .iter()
            .find(|(child, _)| *child == id)
            .and_then(|(_, object)| object.as_any().downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.children
            .iter_mut()
            .find(|(child, _)| *child == id)
            .and_then(|(_, object)| object.as_any_mut().downcast_mut())
    }

    /// every child of type `T`, in order
    pub fn all<T: 'static>(&self) -> impl Iterator<Item = (ObjectId, &T)> + '_ {
        self.children
            .iter()
            .filter_map(|(id, object)| object.as_any().downcast_ref().map(|t| (*id, t)))
    }

    /// updates every updatable child in order. a child that fails is logged and skipped; the rest still run
    pub fn update(&mut self, world: &mut W, tick: &mut Tick<'_, S>) {
        let mut ctx = UpdateCtx {
            dt: tick.dt,
            now: tick.now,
            input: tick.input,
            world,
            store: &mut *tick.store,
            spawned: Vec::new(),
        };

        for (id, object) in self.children.iter_mut() {
            if let Some(updatable) = object.as_updatable() {
                if let Err(err) = updatable.update(&mut ctx) {
                    log::warn!("{id} failed to update, skipping it this tick: {err}");
                }
            }
        }

        let UpdateCtx { spawned, .. } = ctx;
        for object in spawned {
            self.add_boxed(object);
        }
    }

    /// renders every renderable child in order. a child that fails is logged and skipped; the rest still draw
    pub fn render(&self, world: &W, store: &S, surface: &mut dyn Surface) {
        for (id, object) in self.children.iter() {
            if let Some(renderable) = object.as_renderable() {
                if let Err(err) = renderable.render(world, store, surface) {
                    log::warn!("{id} failed to render, skipping it this frame: {err}");
                }
            }
        }
    }
}

/// A whole scene as far as the engine and [`SceneManager`] care.
pub trait Stage<S>: Send {
    /// an error here is fatal to the session
    fn update(&mut self, tick: &mut Tick<'_, S>) -> Result<(), SceneError>;
    fn render(&self, store: &S, surface: &mut dyn Surface) -> Result<(), SceneError>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: 'static> Stage<S> for Scene<(), S> {
    fn update(&mut self, tick: &mut Tick<'_, S>) -> Result<(), SceneError> {
        Scene::update(self, &mut (), tick);
        Ok(())
    }

    fn render(&self, store: &S, surface: &mut dyn Surface) -> Result<(), SceneError> {
        Scene::render(self, &(), store, surface);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Keeps every registered stage alive and forwards to the current one.
///
/// Switching doesn't touch the stage being switched away from; it just stops getting ticks until it's current again.
pub struct SceneManager<S> {
    scenes: BTreeMap<String, Box<dyn Stage<S>>>,
    current: Option<String>,
}

impl<S: 'static> SceneManager<S> {
    pub fn new() -> Self {
        Self {
            scenes: BTreeMap::new(),
            current: None,
        }
    }

    /// registers `stage` under `key`, handing back whatever was registered there before. the current key stays the same, so replacing the current stage switches to the new one immediately
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        stage: impl Stage<S> + 'static,
    ) -> Option<Box<dyn Stage<S>>> {
        self.scenes.insert(key.into(), Box::new(stage))
    }

    pub fn set_current(&mut self, key: &str) -> Result<(), SceneError> {
        if !self.scenes.contains_key(key) {
            return Err(SceneError::UnknownScene(key.to_owned()));
        }
        self.current = Some(key.to_owned());
        Ok(())
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.scenes.get(key)?.as_any().downcast_ref()
    }

    pub fn get_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.scenes.get_mut(key)?.as_any_mut().downcast_mut()
    }

    fn current_stage(&self) -> Option<&dyn Stage<S>> {
        let key = self.current.as_ref()?;
        self.scenes.get(key).map(|stage| stage.as_ref())
    }
}

impl<S: 'static> Stage<S> for SceneManager<S> {
    fn update(&mut self, tick: &mut Tick<'_, S>) -> Result<(), SceneError> {
        let Some(key) = self.current.as_ref() else {
            return Ok(());
        };
        match self.scenes.get_mut(key) {
            Some(stage) => stage.update(tick),
            None => Ok(()),
        }
    }

    fn render(&self, store: &S, surface: &mut dyn Surface) -> Result<(), SceneError> {
        match self.current_stage() {
            Some(stage) => stage.render(store, surface),
            None => Ok(()),
        }
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
    use crate::graphics::{draw::DisplayList, vec2, WHITE};
    use proptest::prelude::*;

    /// takes part in nothing
    struct Inert(u8);

    impl SceneObject<(), u32> for Inert {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// updates only. counts its ticks and bumps the store
    #[derive(Default)]
    struct Ticker {
        ticks: usize,
    }

    impl Updatable<(), u32> for Ticker {
        fn update(&mut self, ctx: &mut UpdateCtx<'_, (), u32>) -> Result<(), SceneError> {
            self.ticks += 1;
            *ctx.store += 1;
            Ok(())
        }
    }

    impl SceneObject<(), u32> for Ticker {
        fn as_updatable(&mut self) -> Option<&mut dyn Updatable<(), u32>> {
            Some(self)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// knows how to update but only advertises rendering
    #[derive(Default)]
    struct Painter {
        ticks: usize,
    }

    impl Updatable<(), u32> for Painter {
        fn update(&mut self, _ctx: &mut UpdateCtx<'_, (), u32>) -> Result<(), SceneError> {
            self.ticks += 1;
            Ok(())
        }
    }

    impl Renderable<(), u32> for Painter {
        fn render(&self, _: &(), store: &u32, surface: &mut dyn Surface) -> Result<(), SceneError> {
            surface.text(&format!("painter {store}"), vec2(0.0, 0.0), 10, WHITE);
            Ok(())
        }
    }

    impl SceneObject<(), u32> for Painter {
        fn as_renderable(&self) -> Option<&dyn Renderable<(), u32>> {
            Some(self)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// fails both passes
    struct Broken;

    impl Updatable<(), u32> for Broken {
        fn update(&mut self, _ctx: &mut UpdateCtx<'_, (), u32>) -> Result<(), SceneError> {
            Err(SceneError::Shape("broken".to_owned()))
        }
    }

    impl Renderable<(), u32> for Broken {
        fn render(&self, _: &(), _: &u32, _: &mut dyn Surface) -> Result<(), SceneError> {
            Err(SceneError::Shape("broken".to_owned()))
        }
    }

    impl SceneObject<(), u32> for Broken {
        fn as_updatable(&mut self) -> Option<&mut dyn Updatable<(), u32>> {
            Some(self)
        }
        fn as_renderable(&self) -> Option<&dyn Renderable<(), u32>> {
            Some(self)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// spawns a ticker the first time it updates
    struct Spawner {
        done: bool,
    }

    impl Updatable<(), u32> for Spawner {
        fn update(&mut self, ctx: &mut UpdateCtx<'_, (), u32>) -> Result<(), SceneError> {
            if !self.done {
                ctx.spawn(Ticker::default());
                self.done = true;
            }
            Ok(())
        }
    }

    impl SceneObject<(), u32> for Spawner {
        fn as_updatable(&mut self) -> Option<&mut dyn Updatable<(), u32>> {
            Some(self)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn tick(scene: &mut Scene<(), u32>, store: &mut u32) {
        let input = InputState::new();
        let mut tick = Tick {
            dt: 1.0 / 60.0,
            now: 0.0,
            input: &input,
            store,
        };
        scene.update(&mut (), &mut tick);
    }

    fn frame(scene: &Scene<(), u32>, store: &u32) -> DisplayList {
        let mut list = DisplayList::new(vec2(100.0, 100.0));
        scene.render(&(), store, &mut list);
        list
    }

    #[test]
    fn dispatch_follows_capabilities() {
        let mut scene = Scene::new();
        let ticker = scene.add(Ticker::default());
        let painter = scene.add(Painter::default());
        let mut store = 0;

        tick(&mut scene, &mut store);
        tick(&mut scene, &mut store);
        let list = frame(&scene, &store);

        assert_eq!(scene.get::<Ticker>(ticker).map(|t| t.ticks), Some(2));
        // rendering-only objects never update, even if they could
        assert_eq!(scene.get::<Painter>(painter).map(|p| p.ticks), Some(0));
        // updating-only objects never draw
        assert_eq!(list.texts().collect::<Vec<_>>(), vec!["painter 2"]);
    }

    #[test]
    fn renders_in_insertion_order() {
        let mut scene = Scene::new();
        scene.add(Painter::default());
        scene.add(Inert(0));
        scene.add(Painter::default());
        let list = frame(&scene, &7);
        assert_eq!(list.texts().collect::<Vec<_>>(), vec!["painter 7", "painter 7"]);
    }

    #[test]
    fn failing_child_does_not_stop_siblings() {
        let mut scene = Scene::new();
        scene.add(Broken);
        let ticker = scene.add(Ticker::default());
        scene.add(Painter::default());
        let mut store = 0;

        tick(&mut scene, &mut store);
        let list = frame(&scene, &store);

        assert_eq!(scene.get::<Ticker>(ticker).map(|t| t.ticks), Some(1));
        assert_eq!(store, 1);
        assert_eq!(list.texts().count(), 1);
    }

    #[test]
    fn spawned_objects_join_after_the_tick() {
        let mut scene = Scene::new();
        scene.add(Spawner { done: false });
        let mut store = 0;

        tick(&mut scene, &mut store);
        assert_eq!(scene.len(), 2);
        // the new ticker didn't run on the tick it was spawned
        assert_eq!(store, 0);

        tick(&mut scene, &mut store);
        assert_eq!(store, 1);
    }

    #[test]
    fn removing_twice_is_not_found() {
        let mut scene: Scene<(), u32> = Scene::new();
        let a = scene.add(Inert(1));
        let b = scene.add(Inert(2));

        assert!(scene.remove(a).is_ok());
        assert!(matches!(scene.remove(a), Err(SceneError::NotFound(id)) if id == a));
        assert_eq!(scene.ids().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn all_finds_children_by_type() {
        let mut scene: Scene<(), u32> = Scene::new();
        scene.add(Inert(1));
        scene.add(Ticker::default());
        scene.add(Inert(2));
        let tags: Vec<u8> = scene.all::<Inert>().map(|(_, inert)| inert.0).collect();
        assert_eq!(tags, vec![1, 2]);
    }

    #[test]
    fn manager_forwards_to_current_only() {
        let mut first: Scene<(), u32> = Scene::new();
        first.add(Ticker::default());
        let mut second: Scene<(), u32> = Scene::new();
        second.add(Painter::default());

        let mut manager = SceneManager::new();
        manager.insert("first", first);
        manager.insert("second", second);
        let input = InputState::new();
        let mut store = 0;

        // nothing current yet
        let mut tick = Tick {
            dt: 0.1,
            now: 0.0,
            input: &input,
            store: &mut store,
        };
        assert!(manager.update(&mut tick).is_ok());
        assert_eq!(*tick.store, 0);

        assert!(manager.set_current("first").is_ok());
        assert!(manager.update(&mut tick).is_ok());
        assert!(manager.update(&mut tick).is_ok());
        assert_eq!(*tick.store, 2);

        assert!(manager.set_current("second").is_ok());
        assert!(manager.update(&mut tick).is_ok());
        assert_eq!(*tick.store, 2);

        let mut list = DisplayList::new(vec2(10.0, 10.0));
        assert!(manager.render(&2, &mut list).is_ok());
        assert_eq!(list.texts().collect::<Vec<_>>(), vec!["painter 2"]);

        // switching back finds the first scene as it was left
        assert!(manager.set_current("first").is_ok());
        let first = manager.get::<Scene<(), u32>>("first");
        assert_eq!(first.map(|s| s.len()), Some(1));
        assert!(matches!(
            manager.set_current("missing"),
            Err(SceneError::UnknownScene(_))
        ));
        assert_eq!(manager.current(), Some("first"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u8>().prop_map(Op::Add),
            (0usize..32).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn add_remove_matches_model(ops in proptest::collection::vec(op(), 0..64)) {
            let mut scene: Scene<(), u32> = Scene::new();
            let mut model: Vec<(ObjectId, u8)> = Vec::new();
            let mut issued: Vec<ObjectId> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(tag) => {
                        let id = scene.add(Inert(tag));
                        model.push((id, tag));
                        issued.push(id);
                    }
                    Op::Remove(pick) => {
                        if issued.is_empty() {
                            continue;
                        }
                        let id = issued[pick % issued.len()];
                        let present = model.iter().position(|(m, _)| *m == id);
                        match (scene.remove(id), present) {
                            (Ok(_), Some(idx)) => {
                                model.remove(idx);
                            }
                            (Err(SceneError::NotFound(missing)), None) => {
                                prop_assert_eq!(missing, id);
                            }
                            (result, present) => {
                                prop_assert!(false, "remove {:?} gave {:?} with model position {:?}", id, result.is_ok(), present);
                            }
                        }
                    }
                }
                let tags: Vec<u8> = scene.all::<Inert>().map(|(_, t)| t.0).collect();
                let expected: Vec<u8> = model.iter().map(|(_, t)| *t).collect();
                prop_assert_eq!(tags, expected);
                prop_assert_eq!(scene.ids().collect::<Vec<_>>(), model.iter().map(|(id, _)| *id).collect::<Vec<_>>());
            }
        }
    }
}
