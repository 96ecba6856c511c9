//! Business logic - what happens when the user picks something

use crate::app::App;
use crate::assets::AssetId;
use crate::stage::WidgetId;

/// Everything a menu item, panel or dialog button can ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Place an asset on the overlay at the spawn point
    AddAsset(AssetId),
    PreviewAsset(AssetId),
    /// Ask before deleting an asset
    ConfirmDeleteAsset(AssetId),
    DeleteAsset(AssetId),
    /// Take a widget off the overlay, keeping its file
    RemoveWidget(WidgetId),
    /// Take a widget off the overlay and delete its backing file
    DeleteWidgetFile(WidgetId),
    /// Pick a file with the native dialog and import it
    ImportAsset,
    FetchRemote(String),
    Exit,
}

/// Execute one action against the application.
pub fn dispatch(app: &mut App, action: Action) {
    log::debug!("Action: {:?}", action);
    match action {
        Action::AddAsset(id) => {
            let at = app.config().overlay.spawn_point();
            app.add_asset(id, at);
        }
        Action::PreviewAsset(id) => app.preview_asset(id),
        Action::ConfirmDeleteAsset(id) => app.confirm_delete_asset(id),
        Action::DeleteAsset(id) => app.delete_asset(id),
        Action::RemoveWidget(id) => app.remove_widget(id),
        Action::DeleteWidgetFile(id) => app.delete_widget_file(id),
        Action::ImportAsset => app.import_with_dialog(),
        Action::FetchRemote(url) => {
            let at = app.config().overlay.spawn_point();
            app.fetch_remote(url, at);
        }
        Action::Exit => {
            log::info!("Action: Exit");
            app.quit();
        }
    }
}
