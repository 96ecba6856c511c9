//! Application state - combines UI and business logic

use std::path::Path;
use std::time::Duration;

use deskpet_ui::{
    CursorHint, Geometry, Media, MediaData, MediaError, OverlayApp, OverlayEvent, Point,
};
use egui::{Id, LayerId, Order, Pos2};

use crate::actions::{self, Action};
use crate::assets::{AssetError, AssetId, AssetKind, AssetStore, SUPPORTED_EXTENSIONS};
use crate::config::Config;
use crate::dialogs::Dialogs;
use crate::library::AssetLibrary;
use crate::preview::Previews;
use crate::remote::{FetchedGif, RemoteFetcher};
use crate::stage::{PressOutcome, Stage, WidgetContent, WidgetId, WidgetSource};
use crate::toolbar::Toolbar;

/// Size of the text widget shown for a GIF that does not decode
const INVALID_GIF_SIZE: i32 = 200;

/// Context menu opened by a secondary press on a widget
struct WidgetMenu {
    widget: WidgetId,
    position: Pos2,
    /// Whether the widget has a file that "Delete image" can remove
    has_file: bool,
}

/// Main application state
pub struct App {
    config: Config,
    store: AssetStore,
    stage: Stage,
    library: AssetLibrary,
    toolbar: Toolbar,
    previews: Previews,
    dialogs: Dialogs,
    fetcher: RemoteFetcher,
    widget_menu: Option<WidgetMenu>,
    /// Set in `init`; textures need it
    ctx: Option<egui::Context>,
    should_quit: bool,
}

impl App {
    /// Create new app from configuration
    pub fn new(config: Config) -> Result<Self, AssetError> {
        let mut store = AssetStore::open(&config.library.assets_dir)?;
        log::info!(
            "Asset library at {} with {} assets",
            store.dir().display(),
            store.assets().len()
        );

        let library = AssetLibrary::new(&mut store, config.library.thumbnail_size);
        let toolbar = Toolbar::new(&mut store, Pos2::new(20.0, 20.0));

        Ok(Self {
            stage: Stage::new(config.overlay.limits()),
            previews: Previews::new(config.library.preview_size),
            fetcher: RemoteFetcher::new(Duration::from_secs(config.remote.timeout_secs)),
            dialogs: Dialogs::new(),
            widget_menu: None,
            ctx: None,
            should_quit: false,
            store,
            library,
            toolbar,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn dialogs(&self) -> &Dialogs {
        &self.dialogs
    }

    /// Answer the dialog on top, dispatching whatever it confirms.
    pub fn answer_dialog(&mut self, yes: bool) {
        if let Some(action) = self.dialogs.answer(yes) {
            actions::dispatch(self, action);
        }
    }

    pub fn quit(&mut self) {
        self.previews.close_all();
        self.should_quit = true;
    }

    fn context(&self) -> Option<egui::Context> {
        let ctx = self.ctx.clone();
        if ctx.is_none() {
            log::error!("egui context used before init");
        }
        ctx
    }

    /// Place an asset from the library on the overlay.
    pub fn add_asset(&mut self, id: AssetId, at: Point) -> Option<WidgetId> {
        let Some(asset) = self.store.get(id).cloned() else {
            self.dialogs.notice("Asset not found", format!("{} is no longer in the library", id));
            return None;
        };
        let ctx = self.context()?;
        let source = WidgetSource::Asset(id);

        match self.load_widget(&ctx, asset.kind, &asset.path, &asset.name) {
            Ok((content, size, resizable)) => Some(self.stage.add(
                asset.name,
                source,
                content,
                Geometry::new(at.x, at.y, size.0, size.1),
                resizable,
            )),
            Err(e) => {
                self.dialogs
                    .notice("Failed to load", format!("{}: {}", asset.name, e));
                None
            }
        }
    }

    /// Place a file that is not part of the library (the startup image).
    pub fn add_file(&mut self, path: &Path, at: Point) -> Option<WidgetId> {
        let Some(kind) = AssetKind::from_path(path) else {
            log::warn!("Unsupported file {}", path.display());
            return None;
        };
        if !path.exists() {
            log::warn!("{} not found, skipping", path.display());
            return None;
        }
        let ctx = self.context()?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match self.load_widget(&ctx, kind, path, &name) {
            Ok((content, size, resizable)) => Some(self.stage.add(
                name,
                WidgetSource::File(path.to_path_buf()),
                content,
                Geometry::new(at.x, at.y, size.0, size.1),
                resizable,
            )),
            Err(e) => {
                log::warn!("Failed to load {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Decode a file into widget content, its initial size and whether it resizes.
    fn load_widget(
        &self,
        ctx: &egui::Context,
        kind: AssetKind,
        path: &Path,
        name: &str,
    ) -> Result<(WidgetContent, (i32, i32), bool), MediaError> {
        let overlay = &self.config.overlay;
        match kind {
            AssetKind::Animation => match MediaData::gif_from_path(path) {
                Ok(data) => {
                    let (w, h) = data.dimensions();
                    let media = Media::upload(ctx, name, &data);
                    Ok((WidgetContent::Media(media), (w as i32, h as i32), true))
                }
                Err(e) => {
                    log::warn!("{} is not a valid GIF: {}", path.display(), e);
                    Ok((
                        WidgetContent::InvalidGif,
                        (INVALID_GIF_SIZE, INVALID_GIF_SIZE),
                        true,
                    ))
                }
            },
            AssetKind::Image => {
                let data = MediaData::still_from_path(path)?
                    .scaled_to_fit(overlay.image_max_size, overlay.image_max_size);
                let (w, h) = data.dimensions();
                let media = Media::upload(ctx, name, &data);
                Ok((WidgetContent::Media(media), (w as i32, h as i32), false))
            }
            AssetKind::Video => {
                let size = overlay.video_size();
                Ok((
                    WidgetContent::VideoPlaceholder {
                        name: name.to_string(),
                    },
                    (size.width, size.height),
                    false,
                ))
            }
        }
    }

    pub fn preview_asset(&mut self, id: AssetId) {
        let Some(asset) = self.store.get(id).cloned() else {
            self.dialogs.notice("File not found", format!("{} is no longer in the library", id));
            return;
        };
        if !asset.path.exists() {
            self.dialogs
                .notice("File not found", asset.path.display().to_string());
            return;
        }
        let Some(ctx) = self.context() else {
            return;
        };

        match MediaData::gif_from_path(&asset.path) {
            Ok(data) => self.previews.open(&ctx, asset.name, data),
            Err(e) => self
                .dialogs
                .notice("Preview failed", format!("{}: {}", asset.name, e)),
        }
    }

    pub fn confirm_delete_asset(&mut self, id: AssetId) {
        match self.store.get(id) {
            Some(asset) => {
                let message = format!("Are you sure you want to delete {}?", asset.name);
                self.dialogs.confirm(message, Action::DeleteAsset(id));
            }
            None => log::warn!("Delete requested for unknown {}", id),
        }
    }

    pub fn delete_asset(&mut self, id: AssetId) {
        if let Err(e) = self.store.delete(id) {
            self.dialogs.notice("Delete failed", e.to_string());
        }
    }

    pub fn remove_widget(&mut self, id: WidgetId) {
        if self.stage.remove(id).is_none() {
            log::warn!("{} is not on the overlay", id);
        }
        if self.widget_menu.as_ref().map(|m| m.widget) == Some(id) {
            self.widget_menu = None;
        }
    }

    /// Remove a widget and delete the file it shows.
    pub fn delete_widget_file(&mut self, id: WidgetId) {
        let Some(source) = self.stage.get(id).map(|w| w.source.clone()) else {
            return;
        };
        self.remove_widget(id);

        match source {
            WidgetSource::Asset(asset) => self.delete_asset(asset),
            WidgetSource::File(path) => match std::fs::remove_file(&path) {
                Ok(()) => log::info!("Deleted {}", path.display()),
                Err(e) => self
                    .dialogs
                    .notice("Delete failed", format!("{}: {}", path.display(), e)),
            },
            WidgetSource::Remote(url) => log::debug!("{} has no local file", url),
        }
    }

    pub fn import_with_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Import asset")
            .add_filter("Media", SUPPORTED_EXTENSIONS)
            .pick_file();

        if let Some(path) = picked {
            self.import(&path);
        }
    }

    /// Copy a file into the library and place it on the overlay.
    pub fn import(&mut self, path: &Path) -> Option<WidgetId> {
        match self.store.import(path) {
            Ok(asset) => {
                let at = self.config.overlay.spawn_point();
                self.add_asset(asset.id, at)
            }
            Err(e) => {
                self.dialogs.notice("Import failed", e.to_string());
                None
            }
        }
    }

    pub fn fetch_remote(&mut self, url: String, at: Point) {
        self.fetcher.fetch(url, at);
    }

    fn add_fetched(&mut self, fetched: FetchedGif) {
        let Some(ctx) = self.context() else {
            return;
        };
        let (w, h) = fetched.data.dimensions();
        let name = fetched
            .url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("remote.gif")
            .to_string();
        let media = Media::upload(&ctx, &name, &fetched.data);
        log::info!("Fetched {} ({}x{})", fetched.url, w, h);

        self.stage.add(
            name,
            WidgetSource::Remote(fetched.url),
            WidgetContent::Media(media),
            Geometry::new(fetched.position.x, fetched.position.y, w as i32, h as i32),
            false,
        );
    }

    fn show_widget_menu(&mut self, ctx: &egui::Context) -> Option<Action> {
        let menu = self.widget_menu.as_ref()?;
        let mut action = None;
        let mut close = false;

        egui::Area::new(Id::new("deskpet-widget-menu"))
            .order(Order::Foreground)
            .fixed_pos(menu.position)
            .show(ctx, |ui| {
                egui::Frame::menu(ui.style()).show(ui, |ui| {
                    if ui.button("Remove from screen").clicked() {
                        action = Some(Action::RemoveWidget(menu.widget));
                    }
                    if menu.has_file && ui.button("Delete image").clicked() {
                        action = Some(Action::DeleteWidgetFile(menu.widget));
                    }
                    if ui.button("Cancel").clicked() {
                        close = true;
                    }
                });
            });

        if action.is_some() || close {
            self.widget_menu = None;
        }
        action
    }
}

impl OverlayApp for App {
    fn init(&mut self, ctx: &egui::Context) {
        self.ctx = Some(ctx.clone());
        self.library.refresh(ctx, &self.store);

        if let Some(path) = self.config.overlay.startup_image.clone() {
            let at = self.config.overlay.spawn_point();
            self.add_file(&path, at);
        }

        for remote in self.config.remote.startup.clone() {
            let at = Point::new(remote.position[0], remote.position[1]);
            self.fetch_remote(remote.url, at);
        }
    }

    fn update(&mut self, delta: f32) {
        if self.library.poll() {
            if let Some(ctx) = self.ctx.clone() {
                self.library.refresh(&ctx, &self.store);
            }
        }
        self.toolbar.poll(&self.store);

        for result in self.fetcher.poll() {
            match result {
                Ok(fetched) => self.add_fetched(fetched),
                Err((url, e)) => self
                    .dialogs
                    .notice("Fetch failed", format!("{}: {}", url, e)),
            }
        }

        self.stage.update(delta);
        self.previews.update(delta);
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn on_event(&mut self, event: OverlayEvent) {
        match event {
            OverlayEvent::PointerPressed { position, button } => {
                self.widget_menu = None;
                if let PressOutcome::ContextMenu(widget) =
                    self.stage.pointer_pressed(position, button)
                {
                    let has_file = self
                        .stage
                        .get(widget)
                        .map(|w| !matches!(w.source, WidgetSource::Remote(_)))
                        .unwrap_or(false);
                    self.widget_menu = Some(WidgetMenu {
                        widget,
                        position: Pos2::new(position.x as f32, position.y as f32),
                        has_file,
                    });
                }
            }
            OverlayEvent::PointerMoved {
                position,
                primary_held,
                over_ui,
            } => self.stage.pointer_moved(position, primary_held, over_ui),
            OverlayEvent::PointerReleased { .. } => self.stage.pointer_released(),
            OverlayEvent::KeyChanged {
                key,
                pressed,
                repeat,
            } => self.stage.key_changed(key, pressed, repeat),
            OverlayEvent::FocusChanged(false) => self.stage.cancel(),
            OverlayEvent::FocusChanged(true) => {}
            OverlayEvent::Resized(width, height) => {
                log::debug!("Overlay resized to {}x{}", width, height);
            }
        }
    }

    fn ui(&mut self, ctx: &egui::Context) {
        self.stage
            .paint(&ctx.layer_painter(LayerId::background()));

        let mut pending = Vec::new();
        pending.extend(self.toolbar.show(ctx));
        pending.extend(self.library.show(ctx));
        pending.extend(self.show_widget_menu(ctx));
        self.previews.show(ctx);
        pending.extend(self.dialogs.show(ctx));

        for action in pending {
            actions::dispatch(self, action);
        }
    }

    fn cursor_hint(&self) -> CursorHint {
        self.stage.cursor_hint()
    }

    fn hit_test(&self, position: Point) -> bool {
        self.stage.hit_test(position)
    }

    fn needs_continuous_update(&self) -> bool {
        self.stage.is_animating() || self.previews.is_animating() || self.fetcher.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpet_ui::{InteractionMode, PointerButton, Size};
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba, RgbaImage};
    use std::path::PathBuf;

    fn write_gif(path: &Path, width: u32, height: u32, frames: usize) {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            for _ in 0..frames {
                let frame = Frame::from_parts(
                    RgbaImage::from_pixel(width, height, Rgba([0, 200, 0, 255])),
                    0,
                    0,
                    Delay::from_numer_denom_ms(100, 1),
                );
                encoder.encode_frame(frame).expect("encode");
            }
        }
        std::fs::write(path, bytes).expect("write gif");
    }

    fn app_in(dir: &Path) -> App {
        let mut config = Config::default();
        config.library.assets_dir = dir.to_path_buf();
        let mut app = App::new(config).expect("app");
        app.init(&egui::Context::default());
        app
    }

    fn asset_id(app: &App, name: &str) -> AssetId {
        app.store()
            .assets()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.id)
            .expect("asset")
    }

    #[test]
    fn test_add_gif_is_resizable_at_natural_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_gif(&dir.path().join("dance.gif"), 120, 80, 3);
        let mut app = app_in(dir.path());

        let asset = asset_id(&app, "dance.gif");
        actions::dispatch(&mut app, Action::AddAsset(asset));

        let widget = &app.stage().widgets()[0];
        assert_eq!(widget.geometry(), Geometry::new(100, 100, 120, 80));
        assert!(widget.controller().is_resizable());
        assert!(app.needs_continuous_update());
    }

    #[test]
    fn test_invalid_gif_becomes_text_widget() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("broken.gif"), b"GIF89a garbage").expect("write");
        let mut app = app_in(dir.path());

        let asset = asset_id(&app, "broken.gif");
        actions::dispatch(&mut app, Action::AddAsset(asset));

        let widget = &app.stage().widgets()[0];
        assert!(matches!(widget.content(), WidgetContent::InvalidGif));
        assert_eq!(widget.geometry().size, Size::new(200, 200));
        assert!(app.dialogs().is_empty());
    }

    #[test]
    fn test_image_is_scaled_and_drag_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        RgbaImage::new(1200, 300)
            .save(dir.path().join("banner.png"))
            .expect("save");
        let mut app = app_in(dir.path());

        let asset = asset_id(&app, "banner.png");
        actions::dispatch(&mut app, Action::AddAsset(asset));

        let widget = &app.stage().widgets()[0];
        assert_eq!(widget.geometry().size, Size::new(600, 150));
        assert!(!widget.controller().is_resizable());
    }

    #[test]
    fn test_video_is_placeholder() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("clip.mp4"), b"not decoded").expect("write");
        let mut app = app_in(dir.path());

        let asset = asset_id(&app, "clip.mp4");
        actions::dispatch(&mut app, Action::AddAsset(asset));

        let widget = &app.stage().widgets()[0];
        assert_eq!(widget.geometry(), Geometry::new(100, 100, 320, 240));
        assert!(matches!(widget.content(), WidgetContent::VideoPlaceholder { .. }));
    }

    #[test]
    fn test_delete_asset_asks_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bye.gif");
        write_gif(&path, 10, 10, 1);
        let mut app = app_in(dir.path());
        let id = asset_id(&app, "bye.gif");

        actions::dispatch(&mut app, Action::ConfirmDeleteAsset(id));
        assert!(path.exists());
        assert_eq!(app.dialogs().len(), 1);

        app.answer_dialog(false);
        assert!(path.exists());

        actions::dispatch(&mut app, Action::ConfirmDeleteAsset(id));
        app.answer_dialog(true);
        assert!(!path.exists());
        assert!(app.store().get(id).is_none());
    }

    #[test]
    fn test_import_copies_and_places_asset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source_dir = tempfile::tempdir().expect("tempdir");
        let source = source_dir.path().join("new.gif");
        write_gif(&source, 30, 40, 2);
        let mut app = app_in(&dir.path().join("assets"));

        let id = app.import(&source).expect("placed");
        assert!(dir.path().join("assets/new.gif").is_file());
        assert_eq!(
            app.stage().get(id).expect("widget").geometry(),
            Geometry::new(100, 100, 30, 40)
        );
    }

    #[test]
    fn test_context_menu_and_remove() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("keep.gif");
        write_gif(&path, 100, 100, 1);
        let mut app = app_in(dir.path());
        let asset = asset_id(&app, "keep.gif");
        actions::dispatch(&mut app, Action::AddAsset(asset));
        let id = app.stage().widgets()[0].id;

        app.on_event(OverlayEvent::PointerPressed {
            position: Point::new(150, 150),
            button: PointerButton::Secondary,
        });
        let menu = app.widget_menu.as_ref().expect("menu");
        assert_eq!(menu.widget, id);
        assert!(menu.has_file);

        actions::dispatch(&mut app, Action::RemoveWidget(id));
        assert!(app.stage().is_empty());
        assert!(app.widget_menu.is_none());
        assert!(path.exists());
    }

    #[test]
    fn test_delete_widget_file_removes_backing_asset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gone.gif");
        write_gif(&path, 60, 60, 1);
        let mut app = app_in(dir.path());
        let asset = asset_id(&app, "gone.gif");
        actions::dispatch(&mut app, Action::AddAsset(asset));
        let id = app.stage().widgets()[0].id;

        actions::dispatch(&mut app, Action::DeleteWidgetFile(id));
        assert!(app.stage().is_empty());
        assert!(!path.exists());
        assert!(app.store().assets().is_empty());
    }

    #[test]
    fn test_pointer_events_drive_widgets() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_gif(&dir.path().join("move.gif"), 200, 100, 2);
        let mut app = app_in(dir.path());
        let asset = asset_id(&app, "move.gif");
        actions::dispatch(&mut app, Action::AddAsset(asset));
        let id = app.stage().widgets()[0].id;

        app.on_event(OverlayEvent::PointerPressed {
            position: Point::new(110, 150),
            button: PointerButton::Primary,
        });
        assert_eq!(
            app.stage().get(id).expect("widget").controller().mode(),
            InteractionMode::Dragging
        );
        app.on_event(OverlayEvent::PointerMoved {
            position: Point::new(160, 170),
            primary_held: true,
            over_ui: false,
        });
        app.on_event(OverlayEvent::FocusChanged(false));

        let widget = app.stage().get(id).expect("widget");
        assert_eq!(widget.geometry().position, Point::new(150, 120));
        assert_eq!(widget.controller().mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_startup_image_is_drag_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image_path = dir.path().join("img-resources.png");
        RgbaImage::new(300, 300).save(&image_path).expect("save");

        let mut config = Config::default();
        config.library.assets_dir = dir.path().join("assets");
        config.overlay.startup_image = Some(image_path.clone());
        let mut app = App::new(config).expect("app");
        app.init(&egui::Context::default());

        let widget = &app.stage().widgets()[0];
        assert_eq!(widget.source, WidgetSource::File(PathBuf::from(&image_path)));
        assert_eq!(widget.geometry(), Geometry::new(100, 100, 600, 600));
        assert!(!widget.controller().is_resizable());
    }

    #[test]
    fn test_exit_requests_quit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app_in(dir.path());
        assert!(!app.should_quit());
        actions::dispatch(&mut app, Action::Exit);
        assert!(app.should_quit());
    }

    #[test]
    fn test_preview_of_missing_file_is_a_notice() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.gif");
        write_gif(&path, 10, 10, 2);
        let mut app = app_in(dir.path());
        let id = asset_id(&app, "missing.gif");

        std::fs::remove_file(&path).expect("remove");
        actions::dispatch(&mut app, Action::PreviewAsset(id));
        assert_eq!(app.previews.len(), 0);
        assert!(matches!(
            app.dialogs().current(),
            Some(crate::dialogs::Dialog::Notice { title, .. }) if title == "File not found"
        ));
    }
}
