//! File: app.rs
//! Opens the window, sets up the scene and runs the draw loop until the window is closed.

use std::any::Any;
use std::panic;
use std::path::PathBuf;
use std::time::Instant;

use glutin::dpi::LogicalSize;
use glutin::event::{Event, WindowEvent};
use glutin::event_loop::{ControlFlow, EventLoop};
use glutin::platform::run_return::EventLoopExtRunReturn;
use glutin::window::WindowBuilder;
use glutin::{Api, ContextBuilder, ContextError, CreationError, GlProfile, GlRequest, PossiblyCurrent, WindowedContext};
use thiserror::Error;

use pipeline::DriverError;

use crate::graphics::driver::GlDriver;
use crate::graphics::opengl::{self, GlTexture, TextureError};
use crate::graphics::shader::{GlShader, ShaderError};
use crate::graphics::utils;
use crate::scene::{Pulse, Scene, SceneKind};

/// Exit code for when there's no window or OpenGL context to draw in.
pub const EXIT_NO_CONTEXT: i32 = -1;
/// Exit code for every other failure.
pub const EXIT_FAILURE: i32 = 1;

const GL_VERSION: (u8, u8) = (3, 3);
const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub shader: PathBuf,
    pub texture: PathBuf,
    pub scene: SceneKind,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
    pub pulse: bool
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            shader: PathBuf::from("res/shaders/Basic.shader"),
            texture: PathBuf::from("res/textures/GojoTexture256x256.png"),
            scene: SceneKind::Quad,
            width: 960,
            height: 540,
            title: String::from("GOJO"),
            vsync: true,
            pulse: false
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to open the event loop: {0}")]
    EventLoop(String),

    #[error("failed to create window: {0}")]
    Window(#[from] CreationError),

    #[error("failed to make the OpenGL context current: {0}")]
    Context(#[source] ContextError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("failed to swap buffers: {0}")]
    Swap(#[source] ContextError)
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::EventLoop(_) | AppError::Window(_) | AppError::Context(_) => EXIT_NO_CONTEXT,
            _ => EXIT_FAILURE
        }
    }
}

type Context = WindowedContext<PossiblyCurrent>;

/// Everything a frame needs.
struct Frame<'a, 'd> {
    context: &'a Context,
    scene: &'a Scene,
    shader: &'a GlShader<'d>,
    texture: &'a GlTexture
}

impl<'a, 'd> Frame<'a, 'd> {
    fn render(&self, pulse: Option<&mut Pulse>, elapsed: f32) -> Result<(), AppError> {
        self.scene.clear()?;

        self.shader.bind()?;
        self.texture.bind(0)?;

        if let Some(pulse) = pulse {
            let [r, g, b, a] = pulse.color();
            self.shader.set_uniform_4f("u_Color", r, g, b, a)?;
            pulse.step();
        }

        self.shader.set_uniform_mat4("u_MVP", &self.scene.mvp(elapsed))?;
        self.scene.draw(self.shader)?;

        self.context.swap_buffers().map_err(AppError::Swap)
    }
}

/// winit panics instead of returning an error when there's no display to connect to.
fn open_event_loop() -> Result<EventLoop<()>, AppError> {
    panic::catch_unwind(EventLoop::new)
        .map_err(|payload| AppError::EventLoop(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic")
    }
}

fn create_context(config: &AppConfig, events: &EventLoop<()>) -> Result<Context, AppError> {
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(LogicalSize::new(config.width as f64, config.height as f64));

    let context = ContextBuilder::new()
        .with_gl(GlRequest::Specific(Api::OpenGl, GL_VERSION))
        .with_gl_profile(GlProfile::Core)
        .with_vsync(config.vsync)
        .build_windowed(window, events)?;

    let context = unsafe { context.make_current() }
        .map_err(|(_, e)| AppError::Context(e))?;

    gl::load_with(|s| context.get_proc_address(s) as *const _);

    Ok(context)
}

/// Runs the program until the window is closed.
pub fn run(config: &AppConfig) -> Result<(), AppError> {
    let mut events = open_event_loop()?;
    let context = create_context(config, &events)?;

    log::info!("OpenGL {}", utils::get_string(gl::VERSION)?);

    let driver = GlDriver;
    opengl::enable_blending()?;

    let size = context.window().inner_size();
    let mut scene = Scene::new(config.scene, size.width, size.height)?;

    let shader = GlShader::from_file(&driver, &config.shader)?;
    shader.bind()?;

    let texture = GlTexture::from_file(&config.texture)?;
    let (tex_width, tex_height) = texture.size();
    log::info!("texture {} from {} is {}x{}", texture.id(), config.texture.display(), tex_width, tex_height);

    texture.bind(0)?;
    shader.set_uniform_1i("u_Texture", 0)?;

    let [r, g, b, a] = WHITE;
    shader.set_uniform_4f("u_Color", r, g, b, a)?;
    shader.set_uniform_mat4("u_MVP", &scene.mvp(0.0))?;
    shader.unbind()?;

    let mut pulse = if config.pulse { Some(Pulse::new()) } else { None };
    let started = Instant::now();
    let mut outcome = Ok(());

    log::info!("drawing the {} scene with {}", scene.kind(), shader.path().display());

    events.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    log::info!("window closed");
                    *control_flow = ControlFlow::Exit;
                },

                WindowEvent::Resized(size) => {
                    context.resize(size);
                    scene.resize(size.width, size.height);

                    if let Err(e) = opengl::set_viewport(size.width, size.height) {
                        outcome = Err(AppError::from(e));
                        *control_flow = ControlFlow::Exit;
                    }
                },

                _ => {}
            },

            Event::MainEventsCleared => {
                let frame = Frame { context: &context, scene: &scene, shader: &shader, texture: &texture };
                let elapsed = started.elapsed().as_secs_f32();

                if let Err(e) = frame.render(pulse.as_mut(), elapsed) {
                    outcome = Err(e);
                    *control_flow = ControlFlow::Exit;
                }
            },

            _ => {}
        }
    });

    outcome
}
