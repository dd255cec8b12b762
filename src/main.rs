mod blob;
mod camera;
mod config;
mod demo;
mod error;
mod field;
mod graphics;
mod particles;
mod scene;
mod sim;
mod surface;
mod tables;

use std::sync::Arc;
use std::time::Instant;

use camera::OrbitCamera;
use config::AppConfig;
use error::AppError;
use glam::{Vec3, Vec4Swizzles};
use graphics::Graphics;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scene::SceneGeometry;
use sim::{CollapseReport, Simulation};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use winit::{
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

/// Pointer travel (pixels) below which a press/release counts as a click.
const CLICK_SLOP: f32 = 4.0;

/// Everything the event loop owns besides the GPU state.
struct AppState {
    sim: Simulation,
    camera: OrbitCamera,
    scene: SceneGeometry,
    rng: StdRng,
    config: AppConfig,
    cursor: (f32, f32),
    press: Option<(f32, f32)>,
    last_frame: Instant,
    shown_title: String,
}

impl AppState {
    fn new(config: AppConfig) -> Self {
        let mut rng = match config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let aspect = config.window.width as f32 / config.window.height as f32;
        AppState {
            sim: Simulation::new(&mut rng),
            camera: OrbitCamera::new(Vec3::new(30.0, 20.0, 40.0), aspect),
            scene: SceneGeometry::default(),
            rng,
            shown_title: config.window.title.clone(),
            config,
            cursor: (0.0, 0.0),
            press: None,
            last_frame: Instant::now(),
        }
    }

    fn start_demo(&mut self) {
        if self.sim.is_playing() {
            return;
        }
        self.sim.start_demo(&mut self.rng);
    }

    fn cursor_moved(&mut self, x: f32, y: f32) {
        if self.press.is_some() {
            self.camera.drag(x - self.cursor.0, y - self.cursor.1);
        }
        self.cursor = (x, y);
    }

    /// A press that ends close to where it started is a pick, anything else a drag.
    fn released(&mut self, width: u32, height: u32) -> Option<CollapseReport> {
        let (px, py) = self.press.take()?;
        let (x, y) = self.cursor;
        if (x - px).hypot(y - py) > CLICK_SLOP {
            return None;
        }
        self.pick(x, y, width, height)
    }

    /// Collapse at the surface point under pixel (`x`, `y`), if the ray hits.
    fn pick(&mut self, x: f32, y: f32, width: u32, height: u32) -> Option<CollapseReport> {
        if width == 0 || height == 0 {
            return None;
        }
        let (origin, dir) = self.camera.screen_ray(x, y, width as f32, height as f32);
        let point = self.sim.surface.raycast(origin, dir)?;
        let report = self.sim.click(point)?;
        info!(
            collapsed = report.collapsed,
            revealed_through = report.revealed_through,
            "collapse"
        );
        Some(report)
    }

    /// Advance by the real time since the previous frame and rebuild geometry.
    fn frame(&mut self) {
        let now = Instant::now();
        let measured = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.camera.update();
        self.sim.update(self.config.simulation.frame_dt(measured));

        let view_proj = self.camera.view_proj();
        let inv_view = view_proj.inverse();
        let right = (inv_view.x_axis.xyz()).normalize_or_zero();
        let up = (inv_view.y_axis.xyz()).normalize_or_zero();
        self.scene.rebuild(&self.sim, right, up);
    }

    /// The overlay lives in the window title while a demo is running.
    fn title(&self) -> String {
        if self.sim.overlay.visible {
            format!("{} | {}", self.config.window.title, self.sim.overlay.text)
        } else {
            self.config.window.title.clone()
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    info!("Riemann collapse visualizer");
    info!("drag: orbit | wheel: zoom | click surface: collapse | P / space: play demo");

    let config = AppConfig::load()?;

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
        .build(&event_loop)?;

    let window = Arc::new(window);
    let mut graphics = pollster::block_on(Graphics::new(window.clone()))?;
    let mut app = AppState::new(config);
    {
        let (w, h) = graphics.size();
        app.camera.set_aspect(w, h);
    }

    let mut last_render = Instant::now();

    event_loop.run(move |event, target| match event {
        Event::WindowEvent {
            event: WindowEvent::RedrawRequested,
            window_id,
        } if window_id == window.id() => {
            app.frame();
            graphics.set_camera(app.camera.view_proj());
            graphics.update_geometry(&app.scene.triangles, &app.scene.lines);

            let title = app.title();
            if title != app.shown_title {
                window.set_title(&title);
                app.shown_title = title;
            }

            if let Err(e) = graphics.render() {
                error!(error = ?e, "render failed");
                if e == wgpu::SurfaceError::OutOfMemory {
                    target.exit();
                }
            }
        }
        Event::WindowEvent { ref event, window_id } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => target.exit(),
            WindowEvent::Resized(size) => {
                graphics.resize(*size);
                app.camera.set_aspect(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                app.cursor_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => app.press = Some(app.cursor),
                ElementState::Released => {
                    let (w, h) = graphics.size();
                    app.released(w, h);
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                app.camera.scroll(lines);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.logical_key.as_ref() {
                    Key::Character("p") | Key::Character("P") | Key::Named(NamedKey::Space) => {
                        app.start_demo();
                    }
                    Key::Named(NamedKey::Escape) => target.exit(),
                    _ => {}
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            if now.duration_since(last_render).as_millis() > 16 {
                // 60 FPS
                window.request_redraw();
                last_render = now;
            }
        }
        _ => {}
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::PrimeCloud;
    use crate::surface::Surface;

    const W: u32 = 800;
    const H: u32 = 600;

    /// 3x3 grid with a vertex at the origin, primes around it.
    fn test_app() -> AppState {
        let mut config = AppConfig::default();
        config.simulation.seed = Some(5);
        let mut app = AppState::new(config);
        let primes = PrimeCloud::from_positions(vec![
            Vec3::new(-2.0, 1.0, 0.0),
            Vec3::new(-20.0, 30.0, 0.0),
        ]);
        app.sim = Simulation::with_parts(Surface::with_segments(2, 2), primes);
        app.camera = OrbitCamera::new(Vec3::new(0.0, 0.0, 50.0), W as f32 / H as f32);
        app
    }

    #[test]
    fn test_center_click_hits_deformed_surface() {
        let mut app = test_app();
        app.sim.update(0.5);
        let heights: Vec<f32> = app.sim.surface.positions().iter().map(|p| p[2]).collect();
        let lowest = heights.iter().copied().fold(f32::INFINITY, f32::min);
        let highest = heights.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert!(highest > lowest);

        // a couple of pixels off centre so the ray lands inside a triangle
        let (x, y) = (W as f32 / 2.0 + 2.0, H as f32 / 2.0 - 1.0);
        let (origin, dir) = app.camera.screen_ray(x, y, W as f32, H as f32);
        let hit = app.sim.surface.raycast(origin, dir).expect("centre ray hits the surface");
        assert!(hit.x.abs() < 1.0 && hit.y.abs() < 1.0);
        assert!(hit.z >= lowest - 1e-3 && hit.z <= highest + 1e-3);

        app.press = Some((x - 1.0, y));
        app.cursor = (x, y);
        let report = app.released(W, H).expect("small move is a click");
        assert_eq!(report.collapsed, 1);
        assert_eq!(app.sim.primes.positions()[0].x, 0.0);
        assert_eq!(app.sim.primes.positions()[1], Vec3::new(-20.0, 30.0, 0.0));
        assert_eq!(app.sim.blobs.len(), 1);
    }

    #[test]
    fn test_drag_is_not_a_click() {
        let mut app = test_app();
        app.press = Some((400.0, 300.0));
        app.cursor = (400.0 + CLICK_SLOP + 1.0, 300.0);
        assert!(app.released(W, H).is_none());
        assert!(app.press.is_none());
        assert!(app.sim.blobs.is_empty());
        assert_eq!(app.sim.primes.positions()[0], Vec3::new(-2.0, 1.0, 0.0));
    }

    #[test]
    fn test_missed_ray_changes_nothing() {
        let mut app = test_app();
        app.sim.update(0.5);
        // look at empty space far above the strip
        app.camera.target = Vec3::new(0.0, 500.0, 0.0);
        let before = app.sim.primes.positions().to_vec();

        assert!(app.pick(W as f32 / 2.0, H as f32 / 2.0, W, H).is_none());
        assert!(app.sim.blobs.is_empty());
        assert_eq!(app.sim.primes.positions(), &before[..]);
        assert!(app.sim.zeros.opacity().iter().all(|&o| o == 0.0));
    }

    #[test]
    fn test_zero_sized_viewport_ignored() {
        let mut app = test_app();
        assert!(app.pick(0.0, 0.0, 0, 0).is_none());
        assert!(app.sim.blobs.is_empty());
    }

    #[test]
    fn test_play_ignored_while_running() {
        let mut app = test_app();
        app.start_demo();
        app.sim.update(1.0);
        app.start_demo();
        assert_eq!(app.sim.playback.demo_time, 1.0);
    }
}
