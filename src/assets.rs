//! The asset library: supported files in one flat directory

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};

use glob::glob;
use thiserror::Error;

/// Identifies an asset for the life of the process. The same path always maps
/// to the same id, even across rescans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Animation,
    Image,
    Video,
}

impl AssetKind {
    /// Kind for a file extension, case-insensitive. Unsupported extensions give `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "gif" => Some(Self::Animation),
            "png" | "jpg" | "jpeg" | "bmp" => Some(Self::Image),
            "mp4" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Extensions accepted by the import dialog.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["gif", "png", "jpg", "jpeg", "bmp", "mp4"];

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: AssetId,
    pub path: PathBuf,
    /// File name including extension
    pub name: String,
    pub kind: AssetKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetEvent {
    Changed,
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Bad glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Unsupported file type: {0}")]
    Unsupported(PathBuf),
    #[error("Unknown asset {0}")]
    UnknownAsset(AssetId),
}

/// Directory-backed asset list with change notification.
pub struct AssetStore {
    dir: PathBuf,
    assets: Vec<Asset>,
    ids: HashMap<PathBuf, AssetId>,
    next_id: u64,
    subscribers: Vec<Sender<AssetEvent>>,
}

impl AssetStore {
    /// Open the store at `dir`, creating the directory if needed, and scan it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut store = Self {
            dir,
            assets: Vec::new(),
            ids: HashMap::new(),
            next_id: 1,
            subscribers: Vec::new(),
        };
        store.scan()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Supported files sorted by name.
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.id == id)
    }

    pub fn animations(&self) -> impl Iterator<Item = &Asset> {
        self.assets
            .iter()
            .filter(|asset| asset.kind == AssetKind::Animation)
    }

    /// Re-read the directory.
    pub fn scan(&mut self) -> Result<(), AssetError> {
        let pattern = format!(
            "{}/*",
            glob::Pattern::escape(&self.dir.to_string_lossy())
        );

        let mut assets = Vec::new();
        for entry in glob(&pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let Some(kind) = AssetKind::from_path(&path) else {
                continue;
            };
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let id = self.id_for(&path);
            assets.push(Asset {
                id,
                path,
                name,
                kind,
            });
        }

        assets.sort_by(|a, b| a.name.cmp(&b.name));
        log::debug!("Scanned {} assets in {}", assets.len(), self.dir.display());
        self.assets = assets;
        Ok(())
    }

    /// Copy `source` into the asset directory and return the new asset.
    /// An existing file with the same name is replaced. A file that already
    /// lives in the directory is returned as is.
    pub fn import(&mut self, source: &Path) -> Result<Asset, AssetError> {
        if AssetKind::from_path(source).is_none() {
            return Err(AssetError::Unsupported(source.to_path_buf()));
        }
        let file_name = source
            .file_name()
            .ok_or_else(|| AssetError::Unsupported(source.to_path_buf()))?;

        std::fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(file_name);
        if is_same_file(source, &target) {
            // Copying a file onto itself truncates it
            log::info!("{} is already in the library", source.display());
        } else {
            std::fs::copy(source, &target)?;
            log::info!("Imported {} as {}", source.display(), target.display());
        }

        self.scan()?;
        self.notify();

        let id = self.id_for(&target);
        self.get(id)
            .cloned()
            .ok_or(AssetError::UnknownAsset(id))
    }

    /// Remove an asset's file. A file that is already gone is not an error.
    pub fn delete(&mut self, id: AssetId) -> Result<(), AssetError> {
        let asset = self.get(id).cloned().ok_or(AssetError::UnknownAsset(id))?;

        match std::fs::remove_file(&asset.path) {
            Ok(()) => log::info!("Deleted {}", asset.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("{} was already gone", asset.path.display());
            }
            Err(e) => return Err(e.into()),
        }

        self.scan()?;
        self.notify();
        Ok(())
    }

    /// Receive an [`AssetEvent::Changed`] after every import and delete.
    pub fn subscribe(&mut self) -> Receiver<AssetEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    fn notify(&mut self) {
        // Drop subscribers whose receiver is gone
        self.subscribers
            .retain(|sender| sender.send(AssetEvent::Changed).is_ok());
    }

    fn id_for(&mut self, path: &Path) -> AssetId {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = AssetId(self.next_id);
        self.next_id += 1;
        self.ids.insert(key, id);
        id
    }
}

/// Whether both paths name the same existing file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"data").expect("write");
        path
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(AssetKind::from_path(Path::new("a.GIF")), Some(AssetKind::Animation));
        assert_eq!(AssetKind::from_path(Path::new("a.jpeg")), Some(AssetKind::Image));
        assert_eq!(AssetKind::from_path(Path::new("a.Bmp")), Some(AssetKind::Image));
        assert_eq!(AssetKind::from_path(Path::new("clip.mp4")), Some(AssetKind::Video));
        assert_eq!(AssetKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(AssetKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("assets");
        let store = AssetStore::open(&dir).expect("open");
        assert!(dir.is_dir());
        assert!(store.assets().is_empty());
    }

    #[test]
    fn test_scan_sorts_and_filters() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "zebra.gif");
        touch(dir.path(), "apple.png");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "movie.mp4");
        std::fs::create_dir(dir.path().join("sub.gif")).expect("mkdir");

        let store = AssetStore::open(dir.path()).expect("open");
        let names: Vec<_> = store.assets().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["apple.png", "movie.mp4", "zebra.gif"]);
        assert_eq!(store.animations().count(), 1);
    }

    #[test]
    fn test_ids_are_stable_across_rescans() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "b.gif");
        let mut store = AssetStore::open(dir.path()).expect("open");
        let before = store.assets()[0].id;

        touch(dir.path(), "a.gif");
        store.scan().expect("scan");

        assert_eq!(store.assets()[1].name, "b.gif");
        assert_eq!(store.assets()[1].id, before);
        assert_ne!(store.assets()[0].id, before);
    }

    #[test]
    fn test_import_copies_and_notifies() {
        let source_dir = tempfile::tempdir().expect("tempdir");
        let assets_dir = tempfile::tempdir().expect("tempdir");
        let source = touch(source_dir.path(), "dance.gif");

        let mut store = AssetStore::open(assets_dir.path()).expect("open");
        let events = store.subscribe();

        let asset = store.import(&source).expect("import");
        assert_eq!(asset.name, "dance.gif");
        assert_eq!(asset.kind, AssetKind::Animation);
        assert!(assets_dir.path().join("dance.gif").is_file());
        assert!(source.is_file());
        assert_eq!(events.try_recv(), Ok(AssetEvent::Changed));
    }

    #[test]
    fn test_import_from_library_keeps_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("self.gif");
        std::fs::write(&path, b"GIF89a-original-bytes").expect("write");
        let mut store = AssetStore::open(dir.path()).expect("open");
        let id = store.assets()[0].id;

        let asset = store.import(&path).expect("import");
        assert_eq!(asset.id, id);
        assert_eq!(store.assets().len(), 1);
        assert_eq!(std::fs::read(&path).expect("read"), b"GIF89a-original-bytes");

        // Same file reached through a non-canonical path
        let indirect = dir.path().join(".").join("self.gif");
        store.import(&indirect).expect("import");
        assert_eq!(std::fs::read(&path).expect("read"), b"GIF89a-original-bytes");
    }

    #[test]
    fn test_import_rejects_unsupported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = touch(dir.path(), "doc.pdf");
        let mut store = AssetStore::open(dir.path().join("assets")).expect("open");
        assert!(matches!(store.import(&source), Err(AssetError::Unsupported(_))));
    }

    #[test]
    fn test_delete_removes_file_and_notifies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = touch(dir.path(), "gone.png");
        let mut store = AssetStore::open(dir.path()).expect("open");
        let events = store.subscribe();
        let id = store.assets()[0].id;

        store.delete(id).expect("delete");
        assert!(!path.exists());
        assert!(store.get(id).is_none());
        assert_eq!(events.try_recv(), Ok(AssetEvent::Changed));

        assert!(matches!(store.delete(id), Err(AssetError::UnknownAsset(_))));
    }

    #[test]
    fn test_delete_tolerates_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = touch(dir.path(), "twice.gif");
        let mut store = AssetStore::open(dir.path()).expect("open");
        let id = store.assets()[0].id;

        std::fs::remove_file(&path).expect("remove");
        store.delete(id).expect("missing file is tolerated");
        assert!(store.assets().is_empty());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source_dir = tempfile::tempdir().expect("tempdir");
        let source = touch(source_dir.path(), "x.png");
        let mut store = AssetStore::open(dir.path()).expect("open");

        drop(store.subscribe());
        let live = store.subscribe();
        store.import(&source).expect("import");

        assert_eq!(store.subscribers.len(), 1);
        assert_eq!(live.try_recv(), Ok(AssetEvent::Changed));
    }
}
