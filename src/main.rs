use heart_morph::config::Config;
use heart_morph::error::RenderError;
use heart_morph::renderer::{clamp_pixel_ratio, Renderer};
use heart_morph::stage::{FrameOutcome, Stage};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

enum UserEvent {
    /// Renderer finished async setup (web only; native blocks on it)
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    RendererReady(Result<Renderer, RenderError>),
}

/// Seconds on a monotonic clock
#[cfg(not(target_arch = "wasm32"))]
fn now_secs() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64()
}

#[cfg(target_arch = "wasm32")]
fn now_secs() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now() / 1000.0)
        .unwrap_or(0.0)
}

struct App {
    config: Config,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: EventLoopProxy<UserEvent>,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    stage: Option<Stage>,
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
}

impl App {
    fn new(config: Config, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            config,
            proxy,
            window: None,
            renderer: None,
            stage: None,
            dragging: false,
            cursor: None,
        }
    }

    fn surface_size(&self, window: &Window) -> PhysicalSize<u32> {
        clamp_pixel_ratio(
            window.inner_size(),
            window.scale_factor(),
            self.config.max_pixel_ratio,
        )
    }

    fn install_renderer(&mut self, event_loop: &ActiveEventLoop, result: Result<Renderer, RenderError>) {
        match result {
            Ok(mut renderer) => {
                if let Some(stage) = &self.stage {
                    stage.attach(&mut renderer);
                }
                self.renderer = Some(renderer);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            Err(e) => {
                log::error!("Failed to initialize renderer: {}", e);
                event_loop.exit();
            }
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(stage) = &mut self.stage else {
            return;
        };
        let dt = stage.tick(now_secs());

        let Some(renderer) = &mut self.renderer else {
            // renderer still coming up; timers keep running
            if let FrameOutcome::Navigate(target) = stage.idle(dt) {
                navigate(event_loop, &target);
            }
            return;
        };

        match stage.frame(dt, renderer) {
            Ok(FrameOutcome::Continue) => {}
            Ok(FrameOutcome::Navigate(target)) => navigate(event_loop, &target),
            Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                renderer.reconfigure();
            }
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("GPU out of memory, shutting down");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {}", e),
        }
    }
}

/// Leave the animation for `target`
#[cfg(not(target_arch = "wasm32"))]
fn navigate(event_loop: &ActiveEventLoop, target: &str) {
    log::info!("Animation finished, next page is {}", target);
    event_loop.exit();
}

#[cfg(target_arch = "wasm32")]
fn navigate(_event_loop: &ActiveEventLoop, target: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.location().set_href(target) {
            log::error!("Navigation to {} failed: {:?}", target, e);
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::RendererReady(result) => self.install_renderer(event_loop, result),
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title("Heart Morph")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;
            window_attributes = window_attributes.with_append(true);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let size = self.surface_size(&window);
        self.stage = Some(Stage::starting_at(
            &self.config,
            size.width,
            size.height,
            now_secs(),
        ));

        let particle_count = self.config.particle_count;

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = pollster::block_on(Renderer::new(window, size, particle_count));
            self.install_renderer(event_loop, result);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = Renderer::new(window, size, particle_count).await;
                let _ = proxy.send_event(UserEvent::RendererReady(result));
            });
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let Some(window) = self.window.clone() else {
                    return;
                };
                let size = self.surface_size(&window);
                if let (Some(stage), Some(renderer)) = (&mut self.stage, &mut self.renderer) {
                    stage.resize(size.width, size.height, renderer);
                }
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last), Some(stage)) = (self.dragging, self.cursor, &mut self.stage) {
                    stage.pointer_drag((position.x - last.x) as f32, (position.y - last.y) as f32);
                }
                self.cursor = Some(position);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / 100.0) as f32,
                };
                if let Some(stage) = &mut self.stage {
                    stage.scroll(steps);
                }
            }

            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Set up logging
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config) {
        log::error!("Event loop failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run(config: Config) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, event_loop.create_proxy());
    event_loop.run_app(&mut app)
}

// WebAssembly entry point
#[cfg(target_arch = "wasm32")]
fn main() {
    use winit::platform::web::EventLoopExtWebSys;

    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    console_log::init_with_level(log::Level::Info).expect("Failed to initialize logger");

    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let app = App::new(Config::default(), event_loop.create_proxy());
    event_loop.spawn_app(app);
}
