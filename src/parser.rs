use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::Path;
use std::rc::{Rc, Weak};

use crate::{Error, Map, Result};
use crate::class::LazyClass;
use crate::decompress::{Decompressor, DecompressorRegistry};
use crate::json::JsonNode;
use crate::math::ivec2;
use crate::project::Project;
use crate::property::PropertyCollection;
use crate::resource_manager::ResourceManager;

/// State shared by all elements while a single map is parsed.
pub(crate) struct ParseContext<'a, J> {
    resources: &'a mut ResourceManager,
    decompressors: &'a DecompressorRegistry,
    project: Weak<Project>,
    /// Tile size of the map
    pub tile_size: ivec2,
    /// Index of the tileset currently being parsed
    pub tileset_index: usize,
    linked_files: HashMap<String, Option<Rc<J>>>,
}

impl<'a, J: JsonNode> ParseContext<'a, J> {
    pub fn new(resources: &'a mut ResourceManager, decompressors: &'a DecompressorRegistry, project: Weak<Project>) -> Self {
        Self {
            resources,
            decompressors,
            project,
            tile_size: ivec2::default(),
            tileset_index: 0,
            linked_files: HashMap::new(),
        }
    }

    /// The `properties` of `json`, with enums and classes resolved against the project.
    pub fn properties(&self, json: &J) -> PropertyCollection {
        let project = self.project.upgrade();
        PropertyCollection::from_json(json, project.as_deref().map(Project::property_types))
    }

    pub fn lazy_class(&self) -> LazyClass {
        LazyClass::new(self.project.clone())
    }

    /// Load a json file referenced by the map, e.g. an object template.
    /// Every file is read at most once per map, failures are logged and give None.
    pub fn linked_file(&mut self, path: &str) -> Option<Rc<J>> {
        if let Some(cached) = self.linked_files.get(path) {
            return cached.clone();
        }

        let loaded = match self.resources.load_bytes(Path::new(path)).and_then(|data| J::parse_bytes(&data)) {
            Ok(json) => Some(Rc::new(json)),
            Err(e) => {
                tracing::warn!("Could not load '{}': {}", path, e);
                None
            }
        };
        self.linked_files.insert(path.into(), loaded.clone());
        loaded
    }

    pub fn resources(&self) -> &ResourceManager {
        &*self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut *self.resources
    }

    pub fn decompressors(&self) -> &DecompressorRegistry {
        self.decompressors
    }
}

/// Entry point for parsing maps.
///
/// Holds the configuration that applies to all parsed maps: the codecs for
/// tile layer data, the [ResourceManager] used to read files and an optional
/// [Project] to resolve custom classes and enums.
///
/// ```no_run
/// let mut parser = tileson::Tileson::new();
/// let map = parser.parse(std::path::Path::new("test-maps/ultimate_test.json"));
/// if map.status() != tileson::ParseStatus::Ok {
///     eprintln!("{}", map.status_message());
/// }
/// ```
///
/// `J` selects the json backend, see [JsonNode].
pub struct Tileson<J: JsonNode = serde_json::Value> {
    decompressors: DecompressorRegistry,
    resources: ResourceManager,
    project: Weak<Project>,
    json: PhantomData<fn() -> J>,
}

impl Tileson {
    /// A parser using serde_json with base64, zlib and gzip support.
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser using serde_json without any codecs.
    /// Encoded tile data is left empty.
    pub fn without_default_codecs() -> Self {
        Self::with_decompressors(DecompressorRegistry::new())
    }
}

impl<J: JsonNode> Default for Tileson<J> {
    fn default() -> Self {
        Self::with_decompressors(DecompressorRegistry::with_defaults())
    }
}

impl<J: JsonNode> Tileson<J> {
    pub fn with_decompressors(decompressors: DecompressorRegistry) -> Self {
        Self {
            decompressors,
            resources: ResourceManager::default(),
            project: Weak::new(),
            json: PhantomData,
        }
    }

    /// Resolve class and enum properties of parsed maps against `project`.
    /// Only a weak reference is kept, the project has to outlive the maps.
    pub fn with_project(mut self, project: &Rc<Project>) -> Self {
        self.set_project(project);
        self
    }

    pub fn set_project(&mut self, project: &Rc<Project>) {
        self.project = Rc::downgrade(project);
    }

    /// Use `resources` to read maps and the files they reference.
    pub fn with_resource_manager(mut self, resources: ResourceManager) -> Self {
        self.resources = resources;
        self
    }

    pub fn decompressors(&self) -> &DecompressorRegistry {
        &self.decompressors
    }

    pub fn decompressors_mut(&mut self) -> &mut DecompressorRegistry {
        &mut self.decompressors
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    /// Parse the map at `path`. Files referenced by the map are looked up
    /// relative to its directory.
    ///
    /// Never fails, check the [status](Map::status) of the result.
    pub fn parse(&mut self, path: &Path) -> Map {
        tracing::debug!("Parsing map '{}'", path.display());
        match self.read_map(path) {
            Ok(data) => self.parse_bytes(&data),
            Err(e) => Map::parse_error(format!("Could not read '{}': {}", path.display(), e)),
        }
    }

    /// Like [Tileson::parse], for a map file that is compressed as a whole.
    pub fn parse_with(&mut self, path: &Path, decompressor: &dyn Decompressor) -> Map {
        match self.read_map(path) {
            Ok(data) => self.parse_bytes_with(&data, decompressor),
            Err(e) => Map::parse_error(format!("Could not read '{}': {}", path.display(), e)),
        }
    }

    /// Parse a map from memory. Referenced files are looked up relative to
    /// the base path of the [resource manager](Tileson::resources_mut).
    pub fn parse_bytes(&mut self, data: &[u8]) -> Map {
        match J::parse_bytes(data) {
            Ok(json) => self.parse_json(&json),
            Err(e) => Map::parse_error(e.to_string()),
        }
    }

    pub fn parse_bytes_with(&mut self, data: &[u8], decompressor: &dyn Decompressor) -> Map {
        match decompressor.decompress(data) {
            Ok(data) => self.parse_bytes(&data),
            Err(e) => {
                tracing::warn!("Could not decompress map with '{}': {}", decompressor.name(), e);
                Map::parse_error("Error during decompression".into())
            }
        }
    }

    /// Parse a map from an already parsed json document.
    pub fn parse_json(&mut self, json: &J) -> Map {
        let mut ctx = ParseContext::new(&mut self.resources, &self.decompressors, self.project.clone());
        Map::from_json(json, &mut ctx).unwrap_or_else(|e| Map::parse_error(e.to_string()))
    }

    /// Read a map file and make its directory the base path.
    fn read_map(&mut self, path: &Path) -> Result<Vec<u8>> {
        let file_name = path.file_name().ok_or_else(|| Error::StructureError{
            tag: "map".into(),
            msg: "Path does not name a file".into(),
        })?;
        self.resources.set_base_path(path.parent().unwrap_or(Path::new("")));
        self.resources.load_bytes(Path::new(file_name))
    }
}

impl<J: JsonNode> std::fmt::Debug for Tileson<J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tileson")
            .field("decompressors", &self.decompressors)
            .field("resources", &self.resources)
            .finish()
    }
}
