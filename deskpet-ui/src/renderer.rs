//! wgpu + egui renderer for the overlay window

use egui_wgpu::ScreenDescriptor;
use tao::window::Window;
use thiserror::Error;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};

#[derive(Error, Debug)]
pub enum RendererError {
    #[error("Failed to create wgpu adapter")]
    AdapterCreationFailed,
    #[error("Failed to request wgpu device: {0}")]
    DeviceRequestFailed(#[from] wgpu::RequestDeviceError),
    #[error("Failed to create surface: {0}")]
    SurfaceCreationFailed(#[from] wgpu::CreateSurfaceError),
    #[error("Unsupported window handle")]
    UnsupportedWindowHandle,
}

/// Tessellated egui output for one frame.
pub struct FrameOutput {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

pub struct Renderer {
    device: Device,
    queue: Queue,
    surface: Surface<'static>,
    config: SurfaceConfiguration,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    /// Create a renderer drawing into `window`.
    ///
    /// The caller must keep `window` alive for as long as the renderer.
    pub fn new(window: &Window, width: u32, height: u32) -> Result<Self, RendererError> {
        use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // tao hands out raw-window-handle 0.5, wgpu 0.19 wants 0.6
        let window_handle =
            convert_window_handle(window.raw_window_handle()).ok_or(RendererError::UnsupportedWindowHandle)?;
        let display_handle =
            convert_display_handle(window.raw_display_handle()).ok_or(RendererError::UnsupportedWindowHandle)?;

        // SAFETY: the overlay window owns both the tao window and this renderer,
        // and drops the renderer first.
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle,
                raw_window_handle: window_handle,
            })
        }?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RendererError::AdapterCreationFailed)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("deskpet-ui device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            },
            None,
        ))?;

        let surface_caps = surface.get_capabilities(&adapter);
        // egui-wgpu expects a linear target
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(RendererError::AdapterCreationFailed)?;

        // Find best alpha mode for transparency
        let alpha_mode = if surface_caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else if surface_caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PostMultiplied)
        {
            wgpu::CompositeAlphaMode::PostMultiplied
        } else {
            surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };
        log::info!("Surface format {:?}, alpha mode {:?}", surface_format, alpha_mode);

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1);

        Ok(Self {
            device,
            queue,
            surface,
            config,
            egui_renderer,
        })
    }

    /// Resize the renderer surface.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure with the current size, after a lost surface.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Draw one egui frame over a fully transparent background.
    pub fn render(&mut self, frame: FrameOutput) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        for (id, delta) in &frame.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: frame.pixels_per_point,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Overlay Encoder"),
            });

        let user_buffers = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &frame.primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut render_pass, &frame.primitives, &screen_descriptor);
        }

        self.queue.submit(
            user_buffers
                .into_iter()
                .chain(std::iter::once(encoder.finish())),
        );
        output.present();

        for id in &frame.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        Ok(())
    }
}

fn convert_window_handle(
    handle: raw_window_handle::RawWindowHandle,
) -> Option<wgpu::rwh::RawWindowHandle> {
    use raw_window_handle::RawWindowHandle as Rwh05;
    use wgpu::rwh::RawWindowHandle as Rwh06;

    match handle {
        #[cfg(target_os = "macos")]
        Rwh05::AppKit(h) => {
            let ns_view = std::ptr::NonNull::new(h.ns_view)?;
            Some(Rwh06::AppKit(wgpu::rwh::AppKitWindowHandle::new(ns_view)))
        }
        #[cfg(target_os = "windows")]
        Rwh05::Win32(h) => {
            use std::num::NonZeroIsize;
            let mut new_handle = wgpu::rwh::Win32WindowHandle::new(NonZeroIsize::new(h.hwnd as isize)?);
            new_handle.hinstance = NonZeroIsize::new(h.hinstance as isize);
            Some(Rwh06::Win32(new_handle))
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        Rwh05::Xlib(h) => {
            let mut new_handle = wgpu::rwh::XlibWindowHandle::new(h.window);
            new_handle.visual_id = h.visual_id;
            Some(Rwh06::Xlib(new_handle))
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        Rwh05::Xcb(h) => {
            use std::num::NonZeroU32;
            let mut new_handle = wgpu::rwh::XcbWindowHandle::new(NonZeroU32::new(h.window)?);
            new_handle.visual_id = NonZeroU32::new(h.visual_id);
            Some(Rwh06::Xcb(new_handle))
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        Rwh05::Wayland(h) => {
            let surface = std::ptr::NonNull::new(h.surface)?;
            Some(Rwh06::Wayland(wgpu::rwh::WaylandWindowHandle::new(surface)))
        }
        _ => None,
    }
}

fn convert_display_handle(
    handle: raw_window_handle::RawDisplayHandle,
) -> Option<wgpu::rwh::RawDisplayHandle> {
    use raw_window_handle::RawDisplayHandle as Rdh05;
    use wgpu::rwh::RawDisplayHandle as Rdh06;

    match handle {
        #[cfg(target_os = "macos")]
        Rdh05::AppKit(_) => Some(Rdh06::AppKit(wgpu::rwh::AppKitDisplayHandle::new())),
        #[cfg(target_os = "windows")]
        Rdh05::Windows(_) => Some(Rdh06::Windows(wgpu::rwh::WindowsDisplayHandle::new())),
        #[cfg(all(unix, not(target_os = "macos")))]
        Rdh05::Xlib(h) => Some(Rdh06::Xlib(wgpu::rwh::XlibDisplayHandle::new(
            std::ptr::NonNull::new(h.display),
            h.screen,
        ))),
        #[cfg(all(unix, not(target_os = "macos")))]
        Rdh05::Xcb(h) => Some(Rdh06::Xcb(wgpu::rwh::XcbDisplayHandle::new(
            std::ptr::NonNull::new(h.connection),
            h.screen,
        ))),
        #[cfg(all(unix, not(target_os = "macos")))]
        Rdh05::Wayland(h) => {
            let display = std::ptr::NonNull::new(h.display)?;
            Some(Rdh06::Wayland(wgpu::rwh::WaylandDisplayHandle::new(display)))
        }
        _ => None,
    }
}
