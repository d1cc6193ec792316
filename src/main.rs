//! laneboard: transit line status board.
//!
//! A GPU-rendered fullscreen board showing one marquee strip per monitored
//! line plus a news ticker. Status comes from a JSON feed file that some
//! other process keeps current.
//!
//! Uses vello/wgpu for rendering and winit for the window and event loop.
//! All board work runs on the event loop thread, driven by the board's own
//! timer queue.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use vello::peniko::FontData;
use vello::util::{RenderContext, RenderSurface};
use vello::{AaConfig, Renderer, RendererOptions, Scene};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window};

use vello::wgpu;

use laneboard::config::{self, BoardConfig};
use laneboard::fonts::BoardMeasure;
use laneboard::layout::{BoardLayout, board_layout};
use laneboard::source::{FeedFile, StaticSource};
use laneboard::{Board, logging, render};

/// Transit line status board
#[derive(Parser, Debug)]
#[command(name = "laneboard", version, about = "Transit line status board")]
struct Args {
    /// Board config file (defaults to ~/.config/laneboard/board.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON status feed, re-read on every refresh
    #[arg(short, long)]
    feed: Option<PathBuf>,

    /// Start in windowed mode instead of fullscreen
    #[arg(short, long)]
    windowed: bool,

    /// Print the default config as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

#[derive(Debug)]
enum RenderState {
    Active {
        surface: Box<RenderSurface<'static>>,
        valid_surface: bool,
        window: Arc<Window>,
    },
    Suspended(Option<Arc<Window>>),
}

struct App {
    context: RenderContext,
    renderers: Vec<Option<Renderer>>,
    state: RenderState,
    scene: Scene,
    start_time: Instant,
    board: Board<BoardMeasure>,
    layout: BoardLayout,
    windowed: bool,
    font_data: Option<FontData>,
}

impl App {
    /// Recompute strips for a new window size and tell the board.
    fn relayout(&mut self, width: f64, height: f64) {
        self.layout = board_layout(
            width,
            height,
            self.board.lane_views().len(),
            self.board.config().news.enabled,
        );
        let strips: Vec<_> = self
            .board
            .lane_views()
            .iter()
            .zip(&self.layout.rows)
            .map(|(view, row)| (view.surface, row.strip))
            .collect();
        for (surface, strip) in strips {
            self.board.resize_surface(surface, strip.width(), strip.height());
        }
        if let Some(news) = self.layout.news {
            let surface = self.board.news_surface();
            self.board.resize_surface(surface, news.width(), news.height());
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.board.close();
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let RenderState::Suspended(cached_window) = &mut self.state else {
            return;
        };

        let window = match cached_window.take() {
            Some(window) => window,
            None => match create_window(event_loop, self.windowed) {
                Ok(window) => window,
                Err(e) => {
                    error!(target: "render", "could not create window: {e:#}");
                    self.shutdown(event_loop);
                    return;
                }
            },
        };

        let size = window.inner_size();
        let surface_future = self.context.create_surface(
            window.clone(),
            size.width,
            size.height,
            wgpu::PresentMode::AutoVsync,
        );
        let surface = match pollster::block_on(surface_future) {
            Ok(surface) => surface,
            Err(e) => {
                error!(target: "render", "could not create surface: {e}");
                self.shutdown(event_loop);
                return;
            }
        };

        self.renderers.resize_with(self.context.devices.len(), || None);
        if self.renderers[surface.dev_id].is_none() {
            match create_renderer(&self.context, &surface) {
                Ok(renderer) => self.renderers[surface.dev_id] = Some(renderer),
                Err(e) => {
                    error!(target: "render", "could not create renderer: {e:#}");
                    self.shutdown(event_loop);
                    return;
                }
            }
        }

        self.state = RenderState::Active {
            surface: Box::new(surface),
            valid_surface: true,
            window: window.clone(),
        };
        self.relayout(size.width as f64, size.height as f64);
        window.request_redraw();
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let RenderState::Active { window, .. } = &self.state {
            self.state = RenderState::Suspended(Some(window.clone()));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let window = match &self.state {
            RenderState::Active { window, .. } if window.id() == window_id => window.clone(),
            _ => return,
        };

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.shutdown(event_loop),

            WindowEvent::Resized(size) => {
                if let RenderState::Active {
                    surface,
                    valid_surface,
                    ..
                } = &mut self.state
                {
                    if size.width != 0 && size.height != 0 {
                        self.context.resize_surface(surface, size.width, size.height);
                        *valid_surface = true;
                    } else {
                        *valid_surface = false;
                    }
                }
                self.relayout(size.width as f64, size.height as f64);
                window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let RenderState::Active {
                    surface,
                    valid_surface: true,
                    ..
                } = &mut self.state
                else {
                    return;
                };

                self.scene.reset();
                render::render_board(
                    &mut self.scene,
                    &self.board,
                    &self.layout,
                    self.font_data.as_ref(),
                );

                let device_handle = &self.context.devices[surface.dev_id];
                let Some(renderer) = self.renderers[surface.dev_id].as_mut() else {
                    return;
                };
                let rendered = renderer.render_to_texture(
                    &device_handle.device,
                    &device_handle.queue,
                    &self.scene,
                    &surface.target_view,
                    &vello::RenderParams {
                        base_color: render::color(self.board.config().colors.board_background),
                        width: surface.config.width,
                        height: surface.config.height,
                        antialiasing_method: AaConfig::Msaa16,
                    },
                );
                if let Err(e) = rendered {
                    warn!(target: "render", "render failed: {e}");
                    return;
                }

                let surface_texture = match surface.surface.get_current_texture() {
                    Ok(texture) => texture,
                    Err(e) => {
                        warn!(target: "render", "no surface texture: {e}");
                        return;
                    }
                };

                let mut encoder = device_handle
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("Surface Blit"),
                    });
                surface.blitter.copy(
                    &device_handle.device,
                    &mut encoder,
                    &surface.target_view,
                    &surface_texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default()),
                );
                device_handle.queue.submit([encoder.finish()]);
                surface_texture.present();
                let _ = device_handle.device.poll(wgpu::PollType::Poll);
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.board.is_running() {
            return;
        }
        let fired = self.board.run_due(self.start_time.elapsed());
        if fired > 0 {
            if let RenderState::Active { window, .. } = &self.state {
                window.request_redraw();
            }
        }
        let flow = match self.board.next_deadline() {
            Some(deadline) => ControlFlow::WaitUntil(self.start_time + deadline),
            None => ControlFlow::Wait,
        };
        event_loop.set_control_flow(flow);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", BoardConfig::default().to_toml());
        return Ok(());
    }

    let _log_guard = logging::init();

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let board_config = BoardConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let measure = BoardMeasure::from_system();
    let font_data = measure.font_data().cloned();
    if font_data.is_none() {
        warn!(target: "render", "no system font found, lane text will not be drawn");
    }

    let board = match &args.feed {
        Some(path) => {
            info!(target: "feed", path = %path.display(), "using status feed");
            Board::open(board_config, measure, FeedFile::new(path))?
        }
        None => {
            warn!(target: "feed", "no --feed given, every line will show as unavailable");
            Board::open(board_config, measure, StaticSource::new())?
        }
    };

    let mut app = App {
        context: RenderContext::new(),
        renderers: vec![],
        state: RenderState::Suspended(None),
        scene: Scene::new(),
        start_time: Instant::now(),
        board,
        layout: board_layout(0.0, 0.0, 0, false),
        windowed: args.windowed,
        font_data,
    };

    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app).context("event loop failed")?;

    // run_app returned without a close event (e.g. the platform tore the loop down)
    app.board.close();
    info!(target: "board", uptime_s = app.start_time.elapsed().as_secs(), "exiting");
    Ok(())
}

fn create_window(event_loop: &ActiveEventLoop, windowed: bool) -> Result<Arc<Window>> {
    let mut attr = Window::default_attributes().with_title("laneboard");

    if !windowed {
        attr = attr.with_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        attr = attr.with_inner_size(winit::dpi::LogicalSize::new(1280, 800));
    }

    Ok(Arc::new(event_loop.create_window(attr)?))
}

fn create_renderer(render_cx: &RenderContext, surface: &RenderSurface<'_>) -> Result<Renderer> {
    Renderer::new(&render_cx.devices[surface.dev_id].device, RendererOptions::default())
        .map_err(|e| anyhow::anyhow!("{e}"))
}
