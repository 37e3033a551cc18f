//! Lumen demo - spins a colored triangle with the Vulkan backend
//!
//! Usage: `lumen_demo [VERTEX_SPV FRAGMENT_SPV]`
//!
//! Shader paths default to `shaders/shader.vert.spv` and
//! `shaders/shader.frag.spv` relative to the working directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use lumen_engine::lumen::device::{GraphicsDevice, Swapchain};
use lumen_engine::lumen::frame::{
    BufferManager, DrawBindings, FrameOrchestrator, IndexedGeometry, ResourceAllocator,
    UniformBufferObject,
};
use lumen_engine::lumen::{Config, Engine, Error, Result};
use lumen_engine::{engine_error, engine_info, engine_warn};
use lumen_engine_renderer_vulkan::{VulkanGraphicsDevice, VulkanSwapchain};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const WINDOW_WIDTH: u32 = 750;
const WINDOW_HEIGHT: u32 = 900;
const WINDOW_TITLE: &str = "Vulkan Application";

struct ShaderPaths {
    vertex: PathBuf,
    fragment: PathBuf,
}

impl ShaderPaths {
    fn from_args() -> Self {
        let mut args = std::env::args().skip(1);
        match (args.next(), args.next()) {
            (Some(vertex), Some(fragment)) => Self {
                vertex: vertex.into(),
                fragment: fragment.into(),
            },
            _ => Self {
                vertex: PathBuf::from("shaders/shader.vert.spv"),
                fragment: PathBuf::from("shaders/shader.frag.spv"),
            },
        }
    }
}

/// Everything that lives on the GPU
///
/// Fields drop in declaration order, so the orchestrator waits for the device
/// to go idle before the bindings and the swapchain are destroyed, and the
/// device goes last.
struct Renderer {
    orchestrator: FrameOrchestrator,
    bindings: DrawBindings,
    swapchain: VulkanSwapchain,
    device: Arc<VulkanGraphicsDevice>,
    started: Instant,
    resized: bool,
}

impl Renderer {
    fn new(window: &Window, config: &Config, shaders: &ShaderPaths) -> Result<Self> {
        let device = Arc::new(VulkanGraphicsDevice::new(window, config)?);
        let dyn_device: Arc<dyn GraphicsDevice> = device.clone();

        let geometry = IndexedGeometry::triangle();
        let allocator = ResourceAllocator::new(dyn_device.clone())?;
        let buffers = BufferManager::new(
            &allocator,
            &geometry.vertices,
            &geometry.indices,
            config.frames_in_flight,
        )?;

        let render_pass = device.create_render_pass()?;
        let pipeline = device.create_pipeline(&render_pass, &shaders.vertex, &shaders.fragment)?;
        let uniform_buffers: Vec<_> = buffers.uniform_buffers().collect();
        let descriptor_sets = device.create_descriptor_sets(&pipeline, &uniform_buffers)?;

        let size = window.inner_size();
        let swapchain = device.create_swapchain(&render_pass, size.width, size.height)?;
        let orchestrator = FrameOrchestrator::new(dyn_device, config, buffers)?;

        engine_info!(
            "lumen::demo",
            "Renderer ready: {} frames in flight, {} swapchain images",
            orchestrator.frames_in_flight(),
            swapchain.image_count()
        );

        Ok(Self {
            orchestrator,
            bindings: DrawBindings {
                render_pass,
                pipeline,
                descriptor_sets,
            },
            swapchain,
            device,
            started: Instant::now(),
            resized: false,
        })
    }

    fn render(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        // Minimized: nothing to present to
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }

        let extent = self.swapchain.extent();
        let aspect_ratio = extent.width as f32 / extent.height.max(1) as f32;
        let ubo = UniformBufferObject::rotating(self.started.elapsed().as_secs_f32(), aspect_ratio);

        match self.orchestrator.draw_frame(&mut self.swapchain, &self.bindings, Some(&ubo)) {
            Ok(outcome) if outcome.suboptimal || self.resized => self.recreate_swapchain(size),
            Ok(_) => Ok(()),
            Err(Error::SurfaceOutOfDate) => self.recreate_swapchain(size),
            Err(e) if e.is_transient() => {
                engine_warn!("lumen::demo", "Skipping frame: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn recreate_swapchain(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        self.resized = false;
        self.orchestrator.wait_idle()?;
        self.swapchain.recreate(size.width, size.height)
    }
}

#[derive(Default)]
struct App {
    // Declared before the window, the surface must not outlive it
    renderer: Option<Renderer>,
    window: Option<Window>,
    failed: bool,
}

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        engine_error!("lumen::demo", "{}", error);
        self.failed = true;
        self.shutdown_renderer();
        event_loop.exit();
    }

    fn shutdown_renderer(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            if let Err(e) = renderer.device.wait_idle() {
                engine_warn!("lumen::demo", "wait_idle at shutdown failed: {}", e);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => window,
            Err(e) => {
                self.fail(event_loop, Error::InitializationFailed(format!("window creation: {}", e)));
                return;
            }
        };

        let renderer = Engine::config()
            .and_then(|config| Renderer::new(&window, &config, &ShaderPaths::from_args()));
        self.window = Some(window);
        match renderer {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown_renderer();
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resized = true;
                }
            }
            WindowEvent::RedrawRequested => {
                let (Some(window), Some(renderer)) = (self.window.as_ref(), self.renderer.as_mut()) else {
                    return;
                };
                if let Err(e) = renderer.render(window.inner_size()) {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

fn main() -> std::process::ExitCode {
    let config = Config {
        application_name: "VulkanTriangle".to_string(),
        ..Config::default()
    };
    if let Err(e) = Engine::initialize(config) {
        eprintln!("{}", e);
        return std::process::ExitCode::FAILURE;
    }

    let mut app = App::default();
    let run = EventLoop::new().map_err(|e| e.to_string()).and_then(|event_loop| {
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut app).map_err(|e| e.to_string())
    });
    app.shutdown_renderer();
    let failed = app.failed;
    drop(app);

    #[cfg(feature = "vulkan-validation")]
    lumen_engine_renderer_vulkan::print_validation_stats_report();

    Engine::shutdown();

    match run {
        Ok(()) if !failed => std::process::ExitCode::SUCCESS,
        Ok(()) => std::process::ExitCode::FAILURE,
        Err(e) => {
            eprintln!("event loop: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
