use std::path::Path;

/// Filesystem access needed to upload local media.
///
/// Both calls are blocking; the adapter makes them once per media send,
/// before the upload.
pub trait MediaFs: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// [`MediaFs`] over `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl MediaFs for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}
