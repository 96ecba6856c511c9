//! Toolbar with the GIF menu, import, remote fetch and exit

use std::sync::mpsc::Receiver;

use egui::{Id, Pos2};

use crate::actions::Action;
use crate::assets::{AssetEvent, AssetId, AssetStore};

pub struct Toolbar {
    position: Pos2,
    events: Receiver<AssetEvent>,
    /// GIF assets offered by the "Add GIF" menu
    gifs: Vec<(AssetId, String)>,
    url: String,
}

impl Toolbar {
    pub fn new(store: &mut AssetStore, position: Pos2) -> Self {
        let mut toolbar = Self {
            position,
            events: store.subscribe(),
            gifs: Vec::new(),
            url: String::new(),
        };
        toolbar.refresh(store);
        toolbar
    }

    /// Pick up store changes since the last frame.
    pub fn poll(&mut self, store: &AssetStore) {
        if self.events.try_iter().count() > 0 {
            self.refresh(store);
        }
    }

    fn refresh(&mut self, store: &AssetStore) {
        self.gifs = store
            .animations()
            .map(|asset| (asset.id, asset.name.clone()))
            .collect();
    }

    pub fn gif_entries(&self) -> &[(AssetId, String)] {
        &self.gifs
    }

    /// Action for the URL field, if it holds anything.
    fn fetch_action(&mut self) -> Option<Action> {
        let url = self.url.trim();
        if url.is_empty() {
            return None;
        }
        let action = Action::FetchRemote(url.to_string());
        self.url.clear();
        Some(action)
    }

    pub fn show(&mut self, ctx: &egui::Context) -> Option<Action> {
        let mut action = None;

        egui::Area::new(Id::new("deskpet-toolbar"))
            .fixed_pos(self.position)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.menu_button("Add GIF", |ui| {
                        if self.gifs.is_empty() {
                            ui.label("No GIFs in the library");
                        }
                        for (id, name) in &self.gifs {
                            ui.menu_button(name.as_str(), |ui| {
                                if ui.button("Preview").clicked() {
                                    action = Some(Action::PreviewAsset(*id));
                                    ui.close_menu();
                                }
                                if ui.button("Add to screen").clicked() {
                                    action = Some(Action::AddAsset(*id));
                                    ui.close_menu();
                                }
                                if ui.button("Delete").clicked() {
                                    action = Some(Action::ConfirmDeleteAsset(*id));
                                    ui.close_menu();
                                }
                            });
                        }
                    });

                    if ui.button("Import asset").clicked() {
                        action = Some(Action::ImportAsset);
                    }

                    ui.horizontal(|ui| {
                        let field = ui.add(
                            egui::TextEdit::singleline(&mut self.url)
                                .hint_text("https://…/image.gif")
                                .desired_width(180.0),
                        );
                        let submitted =
                            field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        if ui.button("Fetch GIF").clicked() || submitted {
                            action = self.fetch_action();
                        }
                    });

                    if ui.button("Exit").clicked() {
                        action = Some(Action::Exit);
                    }
                });
            });

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gif_menu_follows_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("b.gif"), b"x").expect("write");
        std::fs::write(dir.path().join("a.png"), b"x").expect("write");
        let source = tempfile::tempdir().expect("tempdir");
        std::fs::write(source.path().join("a.gif"), b"x").expect("write");

        let mut store = AssetStore::open(dir.path()).expect("open");
        let mut toolbar = Toolbar::new(&mut store, Pos2::new(20.0, 20.0));
        let names: Vec<_> = toolbar.gif_entries().iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["b.gif"]);

        store.import(&source.path().join("a.gif")).expect("import");
        toolbar.poll(&store);
        let names: Vec<_> = toolbar.gif_entries().iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["a.gif", "b.gif"]);
    }

    #[test]
    fn test_fetch_action_trims_and_clears() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = AssetStore::open(dir.path()).expect("open");
        let mut toolbar = Toolbar::new(&mut store, Pos2::ZERO);

        toolbar.url = "   ".to_string();
        assert_eq!(toolbar.fetch_action(), None);

        toolbar.url = " https://example.com/cat.gif ".to_string();
        assert_eq!(
            toolbar.fetch_action(),
            Some(Action::FetchRemote("https://example.com/cat.gif".to_string()))
        );
        assert!(toolbar.url.is_empty());
    }
}
