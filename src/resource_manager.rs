use std::{io::Read, path::{Path, PathBuf}};

use crate::Result;

/// Resolves files referenced by a map, e.g. external tilesets and templates.
/// All paths are relative to the base path, which is the directory of the map
/// while it is being parsed.
pub struct ResourceManager {
    base_path: PathBuf,
    file_provider: Box<dyn Provider>,
}

impl ResourceManager {
    /// Create a new resource manager with a given data provider.
    /// Defaults the base path to the current directory (`.`).
    pub fn new<P: Provider + 'static>(file_provider: P) -> Self {
        Self {
            base_path: ".".into(),
            file_provider: Box::new(file_provider),
        }
    }

    pub fn load_bytes(&mut self, path: &Path) -> Result<Vec<u8>> {
        self.file_provider.read(&self.base_path, path)
    }

    /// Path of `path` as seen from the current working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_path.join(path)
    }

    /// Get a reference to the resource manager's base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Set the resource manager's base path.
    pub fn set_base_path(&mut self, base_path: impl Into<PathBuf>) {
        self.base_path = base_path.into();
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        ResourceManager::new(FileProvider{})
    }
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager").field("base_path", &self.base_path).finish()
    }
}

/// Trait to provide external data.
pub trait Provider {
    /// Open a file that is located at base_path/path and return its contents.
    fn read(&mut self, base_path: &Path, path: &Path) -> Result<Vec<u8>>;
}

/// [Provider] that reads the data from files on the file system.
pub struct FileProvider {}

impl Provider for FileProvider {
    fn read(&mut self, base_path: &Path, path: &Path) -> Result<Vec<u8>> {
        let path = base_path.join(path);

        let mut file = std::fs::File::open(path)?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        Ok(content)
    }
}
