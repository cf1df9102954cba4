//! Frame driver.
//!
//! [`Flow`] advances a [`World`] one frame at a time: pump the asset caches, tick
//! the world, test checkpoint overlaps. It does not need a window, so hosts and
//! tests can drive it directly. [`run`] wraps it in a winit event loop natively.

use std::time::Duration;

use winit::{
    event::{KeyEvent, WindowEvent},
    keyboard::PhysicalKey,
};

use crate::{
    config::InputCode,
    context::FrameClock,
    data_structures::environment::TeardownReport,
    error::WorldError,
    world::{Interaction, World},
};

/// Installs the platform logger. Calling it more than once only prints a warning.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {}", e).into());
        }
    }
}

/// Normalizes a window event into an input code and whether it went down.
/// Key repeats are dropped, the intents are held anyway.
pub fn input_code(event: &WindowEvent) -> Option<(InputCode, bool)> {
    match event {
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    repeat: false,
                    ..
                },
            ..
        } => Some((InputCode::Key(*code), state.is_pressed())),
        WindowEvent::MouseInput { state, button, .. } => Some((InputCode::Mouse(*button), state.is_pressed())),
        _ => None,
    }
}

/// What happened during one [`Flow::step_by`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub dt: Duration,
    pub bound: usize,
    pub collisions: usize,
}

pub struct Flow {
    world: World,
    clock: FrameClock,
    frames: u64,
}

impl Flow {
    pub fn new(world: World) -> Self {
        Self {
            world,
            clock: FrameClock::new(),
            frames: 0,
        }
    }

    pub fn on_window_event(&mut self, event: &WindowEvent) -> Result<Option<Interaction>, WorldError> {
        match input_code(event) {
            Some((code, pressed)) => self.world.handle_input(code, pressed),
            None => Ok(None),
        }
    }

    /// Runs one frame with the wall-clock time since the previous one.
    pub fn step(&mut self) -> FrameReport {
        let dt = self.clock.tick();
        self.step_by(dt)
    }

    pub fn step_by(&mut self, dt: Duration) -> FrameReport {
        let bound = self.world.pump_assets();
        self.world.tick(dt);
        let collisions = self.world.detect_checkpoint_collisions();
        self.frames += 1;
        if bound > 0 || collisions > 0 {
            log::debug!("frame {}: {} bound, {} collision changes", self.frames, bound, collisions);
        }
        FrameReport { dt, bound, collisions }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn shutdown(self) -> TeardownReport {
        self.world.shutdown()
    }
}

#[cfg(not(target_arch = "wasm32"))]
struct App {
    flow: Option<Flow>,
    window: Option<std::sync::Arc<winit::window::Window>>,
}

#[cfg(not(target_arch = "wasm32"))]
impl winit::application::ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = winit::window::Window::default_attributes().with_title("explore-ngin");
        match event_loop.create_window(attributes) {
            Ok(window) => {
                window.request_redraw();
                self.window = Some(std::sync::Arc::new(window));
            }
            Err(e) => {
                log::error!("Could not create a window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(flow) = self.flow.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                flow.step();
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            other => match flow.on_window_event(&other) {
                Ok(Some(interaction)) => log::info!("{:?}", interaction),
                Ok(None) => (),
                Err(e) => log::error!("{}", e),
            },
        }
    }

    fn exiting(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(flow) = self.flow.take() {
            let report = flow.shutdown();
            log::info!("released {} entities and {} meshes", report.entities, report.meshes);
        }
    }
}

/// Opens a window and drives `flow` from its event loop until it is closed.
#[cfg(not(target_arch = "wasm32"))]
pub fn run(flow: Flow) -> anyhow::Result<()> {
    let event_loop = winit::event_loop::EventLoop::new()?;
    let mut app = App {
        flow: Some(flow),
        window: None,
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}
