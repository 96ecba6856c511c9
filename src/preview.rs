//! Floating GIF preview windows

use deskpet_ui::{Media, MediaData};
use egui::load::SizedTexture;
use egui::Id;

struct PreviewWindow {
    id: u64,
    title: String,
    media: Media,
    open: bool,
}

/// Open previews. Closing one drops its frames.
pub struct Previews {
    windows: Vec<PreviewWindow>,
    next_id: u64,
    size: u32,
}

impl Previews {
    /// `size` is the default side of a preview window.
    pub fn new(size: u32) -> Self {
        Self {
            windows: Vec::new(),
            next_id: 1,
            size,
        }
    }

    /// Open a preview of decoded media, scaled to fit the preview window.
    pub fn open(&mut self, ctx: &egui::Context, title: impl Into<String>, data: MediaData) {
        let title = title.into();
        let data = data.scaled_to_fit(self.size, self.size);
        let media = Media::upload(ctx, &format!("preview-{}", self.next_id), &data);
        log::info!("Previewing {} ({} frames)", title, data.frame_count());

        self.windows.push(PreviewWindow {
            id: self.next_id,
            title,
            media,
            open: true,
        });
        self.next_id += 1;
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_animating(&self) -> bool {
        self.windows.iter().any(|w| w.media.is_animated())
    }

    pub fn update(&mut self, delta: f32) -> bool {
        let mut changed = false;
        for window in &mut self.windows {
            changed |= window.media.update(delta);
        }
        changed
    }

    /// Close every preview window.
    pub fn close_all(&mut self) {
        self.windows.clear();
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let side = self.size as f32;
        for window in &mut self.windows {
            let (width, height) = window.media.size();
            let texture = SizedTexture::new(
                window.media.current_texture().id(),
                egui::vec2(width as f32, height as f32),
            );

            egui::Window::new(window.title.as_str())
                .id(Id::new(("preview", window.id)))
                .open(&mut window.open)
                .default_size([side, side])
                .show(ctx, |ui| {
                    ui.centered_and_justified(|ui| {
                        ui.add(egui::Image::new(texture).shrink_to_fit());
                    });
                });
        }

        let before = self.windows.len();
        self.windows.retain(|w| w.open);
        if self.windows.len() != before {
            log::debug!("Closed {} preview(s)", before - self.windows.len());
        }
    }
}
