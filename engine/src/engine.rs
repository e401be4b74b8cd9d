//! # Engine
//!
//! Two loops share one session. The update loop runs on its own thread at the target tick rate: it owns the [`Simulation`], advances it with the real elapsed time, and after every tick renders it into a fresh [`DisplayList`] which it publishes for the render loop. The render loop runs on the thread that called [`Engine::start`] at the target frame rate: it polls the window, hands the latest keyboard snapshot to the update loop, and replays whatever frame was published last onto the [`Display`].
//!
//! The simulation never crosses threads while it runs, so nothing inside it needs locking. The price is that a frame can show the world one tick behind.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::{
    error::{EngineError, SceneError},
    graphics::{draw::DisplayList, Color, Surface, Vec2, WHITE},
    input::InputState,
    time::{Every, Pacer, RateMeter},
};

/// Whatever the engine runs: usually a game made of scenes.
pub trait Simulation: Send + 'static {
    /// advance by `dt` seconds. `now` is seconds since the engine started. an error ends the session
    fn update(&mut self, dt: f32, now: f64, input: &InputState) -> Result<(), SceneError>;

    /// draw the current state. an error ends the session
    fn render(&self, surface: &mut dyn Surface) -> Result<(), SceneError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// the window's close button, or the platform equivalent
    CloseRequested,
}

/// A window (or anything pretending to be one) the render loop can draw to.
#[allow(async_fn_in_trait)]
pub trait Display: Surface {
    /// window events since the last call
    fn poll_events(&mut self) -> Vec<DisplayEvent>;

    /// which keys are held right now
    fn input(&self) -> InputState;

    /// show what was drawn this frame
    async fn present(&mut self);
}

/// what the two loops share while running
struct Shared {
    running: AtomicBool,
    input: Mutex<InputState>,
    screen: Mutex<Vec2>,
    frame: Mutex<Option<Arc<DisplayList>>>,
    ups: Mutex<f32>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stops a running engine from outside the render loop.
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    /// asks the engine to stop. [`Engine::start`] returns once the update thread has finished its current tick
    pub fn stop(&self) -> Result<(), EngineError> {
        if self.shared.running.swap(false, Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EngineError::NotRunning)
        }
    }
}

type UpdateOutcome<T> = (T, Result<(), SceneError>);

pub struct Engine<T: Simulation> {
    pub target_fps: f32,
    pub target_ups: f32,
    /// what each frame is cleared to before the scene draws
    pub clear_color: Color,
    simulation: Option<T>,
    shared: Arc<Shared>,
    update_thread: Option<JoinHandle<UpdateOutcome<T>>>,
    fps: RateMeter,
    frames: u64,
}

impl<T: Simulation> Engine<T> {
    pub fn new(simulation: T, target_fps: f32, target_ups: f32) -> Self {
        Self {
            target_fps,
            target_ups,
            clear_color: WHITE,
            simulation: Some(simulation),
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                input: Mutex::new(InputState::new()),
                screen: Mutex::new(Vec2::ZERO),
                frame: Mutex::new(None),
                ups: Mutex::new(target_ups),
            }),
            update_thread: None,
            fps: RateMeter::new(target_fps),
            frames: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// the simulation, unless it's out on the update thread
    pub fn simulation(&self) -> Option<&T> {
        self.simulation.as_ref()
    }

    pub fn take_simulation(&mut self) -> Option<T> {
        self.simulation.take()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: self.shared.clone(),
        }
    }

    /// measured frames per second
    pub fn fps(&self) -> f32 {
        self.fps.rate()
    }

    /// measured updates per second
    pub fn ups(&self) -> f32 {
        *lock(&self.shared.ups)
    }

    /// frames presented since the engine was made
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs the session on `display` until the window closes, someone calls [`StopHandle::stop`], or the simulation fails.
    ///
    /// Afterwards the simulation is back in the engine, even if it failed.
    pub async fn start<D: Display>(&mut self, display: &mut D) -> Result<(), EngineError> {
        if self.is_running() || self.update_thread.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        let simulation = self.simulation.take().ok_or(EngineError::NoSimulation)?;

        *lock(&self.shared.screen) = display.size();
        *lock(&self.shared.input) = display.input();
        *lock(&self.shared.frame) = None;
        self.shared.running.store(true, Ordering::SeqCst);

        let shared = self.shared.clone();
        let target_ups = self.target_ups;
        let spawned = thread::Builder::new()
            .name("update".to_owned())
            .spawn(move || update_loop(simulation, shared, target_ups));
        match spawned {
            Ok(handle) => self.update_thread = Some(handle),
            Err(err) => {
                self.shared.running.store(false, Ordering::SeqCst);
                return Err(EngineError::Spawn(err));
            }
        }
        log::info!(
            "engine started at {} fps / {} ups",
            self.target_fps,
            self.target_ups
        );

        let mut pacer = Pacer::new(self.target_fps);
        let mut report = Every::new(Duration::from_secs(1));
        while self.is_running() {
            if display
                .poll_events()
                .contains(&DisplayEvent::CloseRequested)
            {
                log::info!("window closed");
                self.shared.running.store(false, Ordering::SeqCst);
                break;
            }
            *lock(&self.shared.input) = display.input();
            *lock(&self.shared.screen) = display.size();

            let frame = lock(&self.shared.frame).clone();
            display.clear(self.clear_color);
            if let Some(frame) = frame {
                frame.replay(display);
            }
            display.present().await;

            self.frames += 1;
            self.fps.record(pacer.wait());
            if report.ready() {
                log::debug!("{:.1} fps / {:.1} ups", self.fps(), self.ups());
            }
        }

        self.join()
    }

    /// [`start`](Engine::start) for hosts without an async runtime of their own
    pub fn start_blocking<D: Display>(&mut self, display: &mut D) -> Result<(), EngineError> {
        futures::executor::block_on(self.start(display))
    }

    /// Stops the session and waits for the update thread to finish. Only valid while running.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        self.stop_handle().stop()?;
        self.join()
    }

    fn join(&mut self) -> Result<(), EngineError> {
        let Some(handle) = self.update_thread.take() else {
            return Ok(());
        };
        let (simulation, outcome) = handle
            .join()
            .map_err(|_| EngineError::UpdateThreadPanicked)?;
        self.simulation = Some(simulation);
        log::info!("engine stopped after {} frames", self.frames);
        outcome.map_err(EngineError::from)
    }
}

fn update_loop<T: Simulation>(
    mut simulation: T,
    shared: Arc<Shared>,
    target_ups: f32,
) -> UpdateOutcome<T> {
    let started = Instant::now();
    let mut pacer = Pacer::new(target_ups);
    let mut meter = RateMeter::new(target_ups);

    while shared.running.load(Ordering::SeqCst) {
        let dt = pacer.wait();
        meter.record(dt);
        *lock(&shared.ups) = meter.rate();

        let input = lock(&shared.input).clone();
        let now = started.elapsed().as_secs_f64();
        if let Err(err) = simulation.update(dt, now, &input) {
            log::error!("update failed, stopping: {err}");
            shared.running.store(false, Ordering::SeqCst);
            return (simulation, Err(err));
        }

        let mut frame = DisplayList::new(*lock(&shared.screen));
        if let Err(err) = simulation.render(&mut frame) {
            log::error!("render failed, stopping: {err}");
            shared.running.store(false, Ordering::SeqCst);
            return (simulation, Err(err));
        }
        *lock(&shared.frame) = Some(Arc::new(frame));
    }

    (simulation, Ok(()))
}
