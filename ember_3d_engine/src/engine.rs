/// Ember3D Engine - logger hub and host frame driver
///
/// `Engine` owns the process-wide logger used by the `engine_*!` macros and
/// runs the winit event loop that drives `GraphicsManager::render_frame`.

use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Instant, SystemTime};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::graphics::{FrameTime, GraphicsManager};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::scene::Scene;
use crate::{engine_err, engine_info};

const SOURCE: &str = "ember3d::Engine";

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

// ===== APPLICATION =====

/// User code driven by the engine
///
/// `setup` runs once the window and GPU context exist. `update` runs at the
/// start of every frame, before the scene is rendered.
pub trait Application {
    fn setup(&mut self, graphics: &mut GraphicsManager, scene: &mut Scene) -> Result<()>;

    fn update(&mut self, _scene: &mut Scene, _frame: &FrameTime) {}
}

/// Builds the GPU context for a freshly created window
pub type ContextFactory = Box<dyn FnMut(Arc<Window>, &EngineConfig) -> Result<Box<dyn GpuContext>>>;

/// Graphics manager, scene and application bundled for frame stepping
///
/// The winit host wraps one of these; other hosts (tests, headless tools)
/// can call `frame` directly with their own timestamps.
pub struct FrameDriver<A: Application> {
    graphics: GraphicsManager,
    scene: Scene,
    app: A,
}

impl<A: Application> FrameDriver<A> {
    /// Create the graphics manager on `context` and run `app.setup`
    pub fn new(context: Box<dyn GpuContext>, config: &EngineConfig, mut app: A) -> Result<Self> {
        let mut graphics = GraphicsManager::new(context, config.graphics.clone())?;
        let mut scene = Scene::new(&config.title);
        app.setup(&mut graphics, &mut scene)?;
        engine_info!(SOURCE, "Application '{}' set up", config.title);
        Ok(Self { graphics, scene, app })
    }

    /// Render one frame at `timestamp` seconds
    pub fn frame(&mut self, timestamp: f64) -> Result<FrameTime> {
        let app = &mut self.app;
        self.graphics
            .render_frame(&mut self.scene, timestamp, |scene, frame| app.update(scene, frame))
    }

    pub fn graphics(&self) -> &GraphicsManager {
        &self.graphics
    }

    pub fn graphics_mut(&mut self) -> &mut GraphicsManager {
        &mut self.graphics
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn app(&self) -> &A {
        &self.app
    }
}

// ===== WINIT HOST =====

struct Running<A: Application> {
    window: Arc<Window>,
    driver: FrameDriver<A>,
}

struct Host<A: Application> {
    config: EngineConfig,
    factory: ContextFactory,
    pending_app: Option<A>,
    running: Option<Running<A>>,
    started: Instant,
    error: Option<Error>,
}

impl<A: Application> Host<A> {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let Some(app) = self.pending_app.take() else {
            return Ok(());
        };
        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = event_loop
            .create_window(attributes)
            .map_err(|e| engine_err!(SOURCE, Error::InitializationFailed(e.to_string())))?;
        let window = Arc::new(window);

        let context = (self.factory)(Arc::clone(&window), &self.config)?;
        let driver = FrameDriver::new(context, &self.config, app)?;
        window.request_redraw();
        self.started = Instant::now();
        self.running = Some(Running { window, driver });
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        self.error.get_or_insert(error);
        event_loop.exit();
    }
}

impl<A: Application> ApplicationHandler for Host<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) => {
                if let Some(running) = &self.running {
                    running.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                let timestamp = self.started.elapsed().as_secs_f64();
                let Some(running) = &mut self.running else {
                    return;
                };
                let result = running.driver.frame(timestamp);
                running.window.request_redraw();
                if let Err(e) = result {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }
}

// ===== PUBLIC API =====

/// Engine entry points
///
/// # Example
///
/// ```no_run
/// use ember_3d_engine::ember3d::{Application, Engine, EngineConfig, Result};
/// use ember_3d_engine::ember3d::graphics::GraphicsManager;
/// use ember_3d_engine::ember3d::scene::Scene;
///
/// struct Demo;
///
/// impl Application for Demo {
///     fn setup(&mut self, _graphics: &mut GraphicsManager, _scene: &mut Scene) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// # fn make_context() -> Box<dyn ember_3d_engine::ember3d::gpu::GpuContext> { unimplemented!() }
/// Engine::run(EngineConfig::default(), |_window, _config| Ok(make_context()), Demo)?;
/// # Ok::<(), ember_3d_engine::ember3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Open a window and render frames until it is closed
    ///
    /// `factory` builds the GPU context once the window exists. The first
    /// error raised by setup or by a frame stops the loop and is returned.
    pub fn run<A, F>(config: EngineConfig, factory: F, app: A) -> Result<()>
    where
        A: Application,
        F: FnMut(Arc<Window>, &EngineConfig) -> Result<Box<dyn GpuContext>> + 'static,
    {
        let event_loop = EventLoop::new()
            .map_err(|e| engine_err!(SOURCE, Error::InitializationFailed(e.to_string())))?;

        let mut host = Host {
            config,
            factory: Box::new(factory),
            pending_app: Some(app),
            running: None,
            started: Instant::now(),
            error: None,
        };
        event_loop
            .run_app(&mut host)
            .map_err(|e| engine_err!(SOURCE, "Event loop terminated: {}", e))?;

        // Drop the GPU state while the window is still alive
        if let Some(running) = host.running.take() {
            let Running { window, driver } = running;
            drop(driver);
            drop(window);
        }
        match host.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ===== LOGGER API =====

    /// Replace the global logger
    ///
    /// ```no_run
    /// use ember_3d_engine::ember3d::Engine;
    /// use ember_3d_engine::ember3d::log::{Logger, LogEntry};
    ///
    /// struct Silent;
    /// impl Logger for Silent {
    ///     fn log(&self, _entry: &LogEntry) {}
    /// }
    ///
    /// Engine::set_logger(Silent);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Log without file:line, used by engine_trace! .. engine_warn!
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log with file:line, used by engine_error!
    pub fn log_detailed(severity: LogSeverity, source: &str, message: String, file: &'static str, line: u32) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
