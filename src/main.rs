//! Demo: a prey flock hunted by a handful of predators, with respawning
//! food and a pair of force fields, drawn with an orbit camera.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use flockgpu::prelude::*;

const PREY_COUNT: u32 = 2048;
const PREDATOR_COUNT: u32 = 16;

struct State {
    renderer: FlockRenderer,
    simulation: FlockSimulation,
    environment: FoodRespawner,
    time: Time,
}

impl State {
    fn new(window: Arc<Window>) -> Result<Self, SimulationError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(GpuError::from)?;
        let ctx = pollster::block_on(GpuContext::new(instance, Some(&surface)))?;
        drop(surface);

        let renderer = FlockRenderer::new(&ctx, window)?;

        let environment = FoodRespawner::new(24, 18.0, 20.0, 7)
            .with_force_fields(vec![
                ForceField::new(Vec3::new(12.0, 0.0, 0.0), 6.0),
                ForceField::new(Vec3::new(-12.0, 4.0, -8.0), -4.0),
            ]);

        let volume = SimulationVolume::Box {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(20.0),
        };
        let simulation = FlockSimulation::builder(volume)
            .with_species(SpeciesConfig::new(Species::Prey, PREY_COUNT).with_spawn(15.0, 2.0))
            .with_species(
                SpeciesConfig::new(Species::Predator, PREDATOR_COUNT)
                    .with_granularity(16)
                    .with_spawn(18.0, 3.0),
            )
            .with_mesh_index_count(MESH_INDEX_COUNT)
            .with_seed(42)
            .build(&ctx, &environment)?;

        Ok(Self {
            renderer,
            simulation,
            environment,
            time: Time::new(),
        })
    }

    fn frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.time.update();
        let dt = self.time.delta();
        self.environment.update(dt);
        self.simulation.step(dt, &self.environment);
        self.renderer.render(&self.simulation, dt)
    }
}

struct App {
    window: Option<Arc<Window>>,
    state: Option<State>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            state: None,
            mouse_pressed: false,
            last_mouse_pos: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("flockgpu")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

            let window = match event_loop.create_window(window_attrs) {
                Ok(window) => Arc::new(window),
                Err(e) => {
                    log::error!("Window creation failed: {}", e);
                    event_loop.exit();
                    return;
                }
            };
            match State::new(window.clone()) {
                Ok(state) => {
                    self.window = Some(window);
                    self.state = Some(state);
                }
                Err(e) => {
                    log::error!("Setup failed: {}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(state) = &mut self.state {
                    state.renderer.resize(physical_size);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;
                        if let Some(state) = &mut self.state {
                            let camera = &mut state.renderer.camera;
                            camera.yaw -= dx as f32 * 0.005;
                            camera.pitch = (camera.pitch + dy as f32 * 0.005).clamp(-1.5, 1.5);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(state) = &mut self.state {
                    let camera = &mut state.renderer.camera;
                    camera.distance = (camera.distance - scroll * 2.0).clamp(5.0, 200.0);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(state) = &mut self.state {
                    match state.frame() {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost) => {
                            state.renderer.resize(winit::dpi::PhysicalSize {
                                width: state.renderer.config.width,
                                height: state.renderer.config.height,
                            })
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => log::warn!("Render error: {:?}", e),
                    }

                    if state.time.frame() % 120 == 0 {
                        if let Some(window) = &self.window {
                            window.set_title(&format!("flockgpu - {:.0} fps", state.time.fps()));
                        }
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            eprintln!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    if let Err(e) = event_loop.run_app(&mut app) {
        eprintln!("Event loop error: {}", e);
        std::process::exit(1);
    }
}
