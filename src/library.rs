//! The "Assets" panel: thumbnails of everything in the asset directory

use std::sync::mpsc::Receiver;

use deskpet_ui::media::color_image;
use deskpet_ui::MediaData;
use egui::load::SizedTexture;
use egui::{TextureHandle, TextureOptions};

use crate::actions::Action;
use crate::assets::{Asset, AssetEvent, AssetId, AssetKind, AssetStore};

struct LibraryEntry {
    id: AssetId,
    name: String,
    kind: AssetKind,
    /// Natural size, when the file decoded
    size: Option<(u32, u32)>,
    thumbnail: Option<TextureHandle>,
}

impl LibraryEntry {
    fn load(ctx: &egui::Context, asset: &Asset, thumbnail_size: u32) -> Self {
        let decoded = match asset.kind {
            // First frame is enough for a GIF thumbnail
            AssetKind::Animation | AssetKind::Image => match MediaData::still_from_path(&asset.path) {
                Ok(data) => Some(data),
                Err(e) => {
                    log::warn!("No thumbnail for {}: {}", asset.name, e);
                    None
                }
            },
            AssetKind::Video => None,
        };

        let size = decoded.as_ref().map(|data| data.dimensions());
        let thumbnail = decoded.map(|data| {
            ctx.load_texture(
                format!("thumb-{}", asset.id),
                color_image(&data.thumbnail(thumbnail_size)),
                TextureOptions::LINEAR,
            )
        });

        Self {
            id: asset.id,
            name: asset.name.clone(),
            kind: asset.kind,
            size,
            thumbnail,
        }
    }

    fn tooltip(&self) -> String {
        match self.size {
            Some((w, h)) => format!("{}\nSize: {}x{}", self.name, w, h),
            None => self.name.clone(),
        }
    }
}

pub struct AssetLibrary {
    events: Receiver<AssetEvent>,
    entries: Vec<LibraryEntry>,
    thumbnail_size: u32,
    stale: bool,
}

impl AssetLibrary {
    pub fn new(store: &mut AssetStore, thumbnail_size: u32) -> Self {
        Self {
            events: store.subscribe(),
            entries: Vec::new(),
            thumbnail_size,
            stale: true,
        }
    }

    /// Drain store notifications. Returns true when the list must be rebuilt.
    pub fn poll(&mut self) -> bool {
        if self.events.try_iter().count() > 0 {
            self.stale = true;
        }
        self.stale
    }

    /// Rebuild entries and thumbnails from the store.
    pub fn refresh(&mut self, ctx: &egui::Context, store: &AssetStore) {
        self.entries = store
            .assets()
            .iter()
            .map(|asset| LibraryEntry::load(ctx, asset, self.thumbnail_size))
            .collect();
        self.stale = false;
        log::debug!("Library refreshed with {} assets", self.entries.len());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn show(&mut self, ctx: &egui::Context) -> Option<Action> {
        let mut action = None;
        let side = self.thumbnail_size as f32;

        egui::Window::new("Assets")
            .default_pos([ctx.screen_rect().right() - 260.0, 40.0])
            .default_size([240.0, 420.0])
            .show(ctx, |ui| {
                if self.entries.is_empty() {
                    ui.label("No assets yet. Use \"Import asset\" to add some.");
                    return;
                }

                egui::ScrollArea::vertical().show(ui, |ui| {
                    for entry in &self.entries {
                        let button = match &entry.thumbnail {
                            Some(texture) => {
                                let [w, h] = texture.size();
                                let image = egui::Image::new(SizedTexture::new(
                                    texture.id(),
                                    egui::vec2(w as f32, h as f32),
                                ))
                                .max_size(egui::vec2(side, side));
                                egui::Button::image_and_text(image, entry.name.as_str())
                            }
                            None => {
                                let glyph = if entry.kind == AssetKind::Video { "▶" } else { "?" };
                                egui::Button::new(format!("{} {}", glyph, entry.name))
                            }
                        };

                        let response = ui.add(button).on_hover_text(entry.tooltip());
                        if response.clicked() {
                            action = Some(Action::AddAsset(entry.id));
                        }
                        response.context_menu(|ui| {
                            if ui.button("Delete asset").clicked() {
                                action = Some(Action::ConfirmDeleteAsset(entry.id));
                                ui.close_menu();
                            }
                        });
                    }
                });
            });

        action
    }
}
