//! Overlay window creation and event handling

mod config;
mod input;
mod platform;

pub use config::WindowConfig;

use std::time::{Duration, Instant};

use tao::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{CursorIcon, Window, WindowBuilder},
};
use thiserror::Error;

use crate::interaction::{CursorHint, ModifierKey, Point, PointerButton};
use crate::renderer::{FrameOutput, Renderer, RendererError};
use platform::configure_window;
#[cfg(target_os = "macos")]
use platform::set_pass_through;

#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Failed to create window: {0}")]
    WindowCreationFailed(#[from] tao::error::OsError),
    #[error("Renderer error: {0}")]
    RendererError(#[from] RendererError),
}

/// Events delivered to the application. Positions are logical pixels in
/// window space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayEvent {
    /// A button went down outside of any egui panel
    PointerPressed { position: Point, button: PointerButton },
    PointerMoved {
        position: Point,
        primary_held: bool,
        /// The pointer is over an egui panel or egui owns the drag
        over_ui: bool,
    },
    PointerReleased { position: Point, button: PointerButton },
    KeyChanged {
        key: ModifierKey,
        pressed: bool,
        repeat: bool,
    },
    FocusChanged(bool),
    Resized(u32, u32),
}

/// Application trait for handling overlay window events
pub trait OverlayApp {
    /// Called once before the first frame with the egui context used for
    /// textures and painting.
    fn init(&mut self, _ctx: &egui::Context) {}

    /// Called each frame before drawing. `delta` is in seconds.
    fn update(&mut self, _delta: f32) {}

    /// Return true if the app wants to quit
    fn should_quit(&self) -> bool {
        false
    }

    fn on_event(&mut self, event: OverlayEvent);

    /// Build the egui frame.
    fn ui(&mut self, ctx: &egui::Context);

    /// Cursor to show when the pointer is not over an egui panel.
    fn cursor_hint(&self) -> CursorHint {
        CursorHint::Default
    }

    /// Whether something the app draws is under `position`.
    fn hit_test(&self, _position: Point) -> bool {
        true
    }

    /// When true, frames are scheduled at `target_fps` instead of waiting for input
    fn needs_continuous_update(&self) -> bool {
        false
    }
}

/// A transparent, undecorated window hosting egui content.
pub struct OverlayWindow {
    // Dropped before `window`
    renderer: Renderer,
    window: Window,
    config: WindowConfig,
    egui_ctx: egui::Context,
    pending_events: Vec<egui::Event>,
    modifiers: egui::Modifiers,
    /// Last cursor position in logical pixels
    cursor_position: Option<egui::Pos2>,
    primary_held: bool,
    is_focused: bool,
    current_cursor: CursorIcon,
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    passing_through: bool,
    start_time: Instant,
}

impl OverlayWindow {
    /// Create a new overlay window with the given configuration.
    pub fn new(event_loop: &EventLoop<()>, config: WindowConfig) -> Result<Self, WindowError> {
        let mut builder = WindowBuilder::new()
            .with_transparent(true)
            .with_decorations(false)
            .with_always_on_top(config.always_on_top)
            .with_title(&config.title);

        match (config.size, event_loop.primary_monitor()) {
            (Some((width, height)), _) => {
                builder = builder.with_inner_size(LogicalSize::new(width, height));
            }
            (None, Some(monitor)) => {
                builder = builder
                    .with_inner_size(monitor.size())
                    .with_position(monitor.position());
            }
            (None, None) => {
                log::warn!("No primary monitor reported, using a default window size");
                builder = builder.with_inner_size(LogicalSize::new(1280, 720));
            }
        }

        let window = builder.build(event_loop)?;
        configure_window(&window, config.click_through);

        let size = window.inner_size();
        let renderer = Renderer::new(&window, size.width, size.height)?;
        log::info!(
            "Overlay window created: {}x{} (scale {})",
            size.width,
            size.height,
            window.scale_factor()
        );

        Ok(Self {
            renderer,
            window,
            config,
            egui_ctx: egui::Context::default(),
            pending_events: Vec::new(),
            modifiers: egui::Modifiers::default(),
            cursor_position: None,
            primary_held: false,
            is_focused: false,
            current_cursor: CursorIcon::Default,
            passing_through: false,
            start_time: Instant::now(),
        })
    }

    pub fn egui_context(&self) -> &egui::Context {
        &self.egui_ctx
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    fn scale_factor(&self) -> f32 {
        self.window.scale_factor() as f32
    }

    fn to_logical(&self, position: PhysicalPosition<f64>) -> egui::Pos2 {
        let scale = self.scale_factor();
        egui::pos2(position.x as f32 / scale, position.y as f32 / scale)
    }

    /// Whether egui has a panel under `pos` or is tracking its own drag.
    fn is_over_ui(&self, pos: egui::Pos2) -> bool {
        self.egui_ctx.layer_id_at(pos).is_some() || self.egui_ctx.is_using_pointer()
    }

    /// Translate a tao window event, forwarding the relevant part to the app.
    fn handle_window_event<A: OverlayApp>(&mut self, event: &WindowEvent, app: &mut A) {
        match event {
            WindowEvent::Resized(size) => {
                self.renderer.resize(size.width, size.height);
                app.on_event(OverlayEvent::Resized(size.width, size.height));
            }
            WindowEvent::Focused(focused) => {
                self.is_focused = *focused;
                self.pending_events
                    .push(egui::Event::WindowFocused(*focused));
                app.on_event(OverlayEvent::FocusChanged(*focused));
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = input::egui_modifiers(*modifiers);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;

                if let Some(key) = input::egui_key(event.physical_key) {
                    self.pending_events.push(egui::Event::Key {
                        key,
                        physical_key: None,
                        pressed,
                        repeat: event.repeat,
                        modifiers: self.modifiers,
                    });
                }
                if pressed {
                    if let Some(text) = event.text {
                        if !text.chars().all(|c| c.is_control()) {
                            self.pending_events.push(egui::Event::Text(text.to_string()));
                        }
                    }
                }

                app.on_event(OverlayEvent::KeyChanged {
                    key: input::modifier_key(event.physical_key),
                    pressed,
                    repeat: event.repeat,
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                let pos = self.to_logical(*position);
                self.cursor_position = Some(pos);
                self.pending_events.push(egui::Event::PointerMoved(pos));

                let over_ui = self.is_over_ui(pos);
                app.on_event(OverlayEvent::PointerMoved {
                    position: to_point(pos),
                    primary_held: self.primary_held,
                    over_ui,
                });

                if self.config.pass_through_empty {
                    self.update_pass_through(over_ui || app.hit_test(to_point(pos)));
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor_position = None;
                self.pending_events.push(egui::Event::PointerGone);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = input::pointer_button(*button) else {
                    return;
                };
                let pressed = *state == ElementState::Pressed;
                let pos = self.cursor_position.unwrap_or_default();

                self.pending_events.push(egui::Event::PointerButton {
                    pos,
                    button: input::egui_button(button),
                    pressed,
                    modifiers: self.modifiers,
                });

                if button == PointerButton::Primary {
                    self.primary_held = pressed;
                }

                if pressed {
                    if !self.is_over_ui(pos) {
                        app.on_event(OverlayEvent::PointerPressed {
                            position: to_point(pos),
                            button,
                        });
                    }
                } else {
                    app.on_event(OverlayEvent::PointerReleased {
                        position: to_point(pos),
                        button,
                    });
                }
            }
            _ => {}
        }
    }

    /// Toggle platform click-through.
    #[allow(unused_variables)]
    fn update_pass_through(&mut self, hit: bool) {
        // Only macOS keeps delivering cursor moves to a window that ignores
        // cursor events, so this is the only place it can be undone
        #[cfg(target_os = "macos")]
        {
            let pass_through = !hit && self.is_focused;
            if pass_through != self.passing_through {
                set_pass_through(&self.window, pass_through);
                self.passing_through = pass_through;
            }
        }
    }

    fn set_cursor(&mut self, icon: CursorIcon) {
        if icon != self.current_cursor {
            self.window.set_cursor_icon(icon);
            self.current_cursor = icon;
        }
    }

    /// Run one egui frame and draw it.
    fn render<A: OverlayApp>(&mut self, app: &mut A) -> Result<(), wgpu::SurfaceError> {
        let scale_factor = self.scale_factor();
        let (width, height) = self.renderer.size();

        // screen_rect is in logical pixels
        let mut raw_input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(width as f32 / scale_factor, height as f32 / scale_factor),
            )),
            time: Some(self.start_time.elapsed().as_secs_f64()),
            predicted_dt: 1.0 / self.config.target_fps.max(1.0),
            modifiers: self.modifiers,
            events: std::mem::take(&mut self.pending_events),
            focused: self.is_focused,
            ..Default::default()
        };
        raw_input
            .viewports
            .entry(egui::ViewportId::ROOT)
            .or_default()
            .native_pixels_per_point = Some(scale_factor);

        let ctx = self.egui_ctx.clone();
        let full_output = ctx.run(raw_input, |ctx| app.ui(ctx));

        let over_ui = self
            .cursor_position
            .map(|pos| self.is_over_ui(pos))
            .unwrap_or(false);
        let cursor = if over_ui {
            input::egui_cursor(full_output.platform_output.cursor_icon)
        } else {
            input::hint_cursor(app.cursor_hint())
        };
        self.set_cursor(cursor);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        self.renderer.render(FrameOutput {
            primitives,
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        })
    }
}

fn to_point(pos: egui::Pos2) -> Point {
    Point::new(pos.x.floor() as i32, pos.y.floor() as i32)
}

/// Run the overlay event loop with an application.
///
/// This takes ownership of the window and runs until the app quits or the
/// window is closed.
pub fn run_with_app<A: OverlayApp + 'static>(
    mut overlay: OverlayWindow,
    event_loop: EventLoop<()>,
    mut app: A,
) -> ! {
    let mut last_frame = Instant::now();
    let mut initialized = false;

    event_loop.run(move |event, _, control_flow| {
        if !initialized {
            app.init(overlay.egui_context());
            initialized = true;
        }

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                *control_flow = ControlFlow::Exit;
            }

            Event::WindowEvent { event, .. } => {
                overlay.handle_window_event(&event, &mut app);
                overlay.request_redraw();
            }

            Event::MainEventsCleared => {
                let now = Instant::now();
                let delta = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                app.update(delta);

                if app.should_quit() {
                    log::info!("Application requested quit");
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                if app.needs_continuous_update() {
                    overlay.request_redraw();
                    let frame = Duration::from_secs_f32(1.0 / overlay.config.target_fps.max(1.0));
                    *control_flow = ControlFlow::WaitUntil(now + frame);
                } else {
                    *control_flow = ControlFlow::Wait;
                }
            }

            Event::RedrawRequested(_) => {
                if let Err(e) = overlay.render(&mut app) {
                    log::error!("Render error: {:?}", e);
                    match e {
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                            overlay.renderer.reconfigure();
                        }
                        wgpu::SurfaceError::OutOfMemory => {
                            *control_flow = ControlFlow::Exit;
                        }
                        _ => {}
                    }
                }
            }

            _ => (),
        }
    });
}

/// Builder for creating an OverlayWindow with a fluent API.
pub struct OverlayWindowBuilder {
    config: WindowConfig,
}

impl OverlayWindowBuilder {
    pub fn new() -> Self {
        Self {
            config: WindowConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn with_config(mut self, config: WindowConfig) -> Self {
        self.config = config;
        self
    }

    /// Fixed inner size in logical pixels instead of covering the monitor.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.size = Some((width, height));
        self
    }

    pub fn with_always_on_top(mut self, always_on_top: bool) -> Self {
        self.config.always_on_top = always_on_top;
        self
    }

    /// Set whether clicks should pass through the window entirely.
    pub fn with_click_through(mut self, click_through: bool) -> Self {
        self.config.click_through = click_through;
        self
    }

    /// Let clicks through where nothing is drawn (macOS).
    pub fn with_pass_through_empty(mut self, enabled: bool) -> Self {
        self.config.pass_through_empty = enabled;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn with_target_fps(mut self, fps: f32) -> Self {
        self.config.target_fps = fps;
        self
    }

    pub fn build(self, event_loop: &EventLoop<()>) -> Result<OverlayWindow, WindowError> {
        OverlayWindow::new(event_loop, self.config)
    }
}

impl Default for OverlayWindowBuilder {
    fn default() -> Self {
        Self::new()
    }
}
