//! # deskpet-ui
//!
//! Building blocks for a transparent desktop overlay that hosts draggable,
//! resizable media widgets.
//!
//! ## Features
//! - Fullscreen transparent, borderless, always-on-top window
//! - egui panels rendered through wgpu on top of a clear background
//! - Pointer-driven drag and corner-resize state machine for widgets
//! - Still image and animated GIF decoding with per-frame textures
//!
//! ## Example
//!
//! ```no_run
//! use deskpet_ui::{run_with_app, EventLoop, OverlayApp, OverlayEvent, OverlayWindowBuilder};
//!
//! struct Empty;
//!
//! impl OverlayApp for Empty {
//!     fn on_event(&mut self, event: OverlayEvent) {
//!         log::debug!("{:?}", event);
//!     }
//!
//!     fn ui(&mut self, ctx: &egui::Context) {
//!         egui::Window::new("Hello").show(ctx, |ui| ui.label("overlay"));
//!     }
//! }
//!
//! fn main() {
//!     let event_loop = EventLoop::new();
//!     let window = OverlayWindowBuilder::new()
//!         .with_always_on_top(true)
//!         .build(&event_loop)
//!         .expect("Failed to create window");
//!
//!     run_with_app(window, event_loop, Empty);
//! }
//! ```

pub mod animation;
pub mod interaction;
pub mod media;
mod renderer;
mod window;

// Interaction
pub use interaction::{
    CursorHint, Drawable, Geometry, InteractionLimits, InteractionMode, ModifierKey,
    OverlayWidgetController, OverlayWidgetState, Point, PointerButton, PointerEvent, Size,
};

// Media
pub use animation::Animation;
pub use media::{AnimationFrame, Media, MediaData, MediaError};

// Renderer
pub use renderer::{Renderer, RendererError};

// Window
pub use window::{
    run_with_app, OverlayApp, OverlayEvent, OverlayWindow, OverlayWindowBuilder, WindowConfig,
    WindowError,
};

// Re-export commonly used types
pub use tao::event_loop::EventLoop;
