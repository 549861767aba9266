//! Tiled projects (`.tiled-project`), which define the custom enums and
//! classes that properties of maps refer to.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::Result;
use crate::class::TiledClass;
use crate::enums::EnumDefinition;
use crate::json::{JsonNode, array, field, field_or_default};
use crate::world::World;

/// The `propertyTypes` of a project.
#[derive(Debug, Clone, Default)]
pub struct PropertyTypes {
    enums: Vec<Rc<EnumDefinition>>,
    classes: Vec<TiledClass>,
    unhandled_content_found: bool,
}

impl PropertyTypes {
    /// Parse the `propertyTypes` array of `json`.
    ///
    /// All enums are read before the classes, so class members can refer to
    /// any enum. Classes can only refer to classes defined before them.
    pub fn from_json<J: JsonNode>(json: &J) -> Self {
        let mut types = PropertyTypes::default();
        let mut classes = Vec::new();

        for item in array(json, "propertyTypes") {
            let kind: Option<String> = field(item, "type");
            match kind.as_deref() {
                Some("enum") => types.enums.push(Rc::new(EnumDefinition::from_json(item))),
                Some("class") => classes.push(item),
                Some(other) => {
                    tracing::debug!("Unhandled property type kind '{}'", other);
                    types.unhandled_content_found = true;
                }
                None => {}
            }
        }

        for item in classes {
            let class = TiledClass::from_json(item, Some(&types));
            types.classes.push(class);
        }
        types
    }

    pub fn enums(&self) -> &[Rc<EnumDefinition>] {
        &self.enums
    }

    pub fn classes(&self) -> &[TiledClass] {
        &self.classes
    }

    pub fn get_enum_definition(&self, name: &str) -> Option<&Rc<EnumDefinition>> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn get_class(&self, name: &str) -> Option<&TiledClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Whether there were entries that are neither enums nor classes.
    pub fn unhandled_content_found(&self) -> bool {
        self.unhandled_content_found
    }
}

/// Raw content of a project file.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct ProjectData {
    pub automapping_rules_file: String,
    pub commands: Vec<String>,
    pub extensions_path: String,
    /// Folders as written in the file, relative to [base_path](Self::base_path).
    pub folders: Vec<String>,
    pub object_types_file: String,
    pub property_types: PropertyTypes,

    /// Directory of the project file
    pub base_path: PathBuf,
    pub folder_paths: Vec<PathBuf>,
}

/// A Tiled project.
///
/// Maps parsed with a project (see [Tileson::with_project](crate::Tileson::with_project))
/// resolve enum and class properties against its [PropertyTypes].
#[derive(Debug, Default)]
pub struct Project {
    path: PathBuf,
    folders: Vec<ProjectFolder>,
    data: ProjectData,
}

impl Project {
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with::<serde_json::Value>(path)
    }

    /// Like [Project::from_file], using `J` as json backend.
    pub fn from_file_with<J: JsonNode>(path: &Path) -> Result<Self> {
        let json = J::parse_file(path)?;
        Ok(Self::from_json(&json, path))
    }

    /// Build a project from already parsed json. `path` is the location of
    /// the project file, folders are resolved relative to its directory.
    pub fn from_json<J: JsonNode>(json: &J, path: &Path) -> Self {
        let base_path = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut data = ProjectData {
            automapping_rules_file: field_or_default(json, "automappingRulesFile"),
            // Older versions store plain strings, newer ones command objects.
            commands: array(json, "commands").into_iter().filter_map(|c| c.value()).collect(),
            extensions_path: field_or_default(json, "extensionsPath"),
            object_types_file: field_or_default(json, "objectTypesFile"),
            property_types: PropertyTypes::from_json(json),
            base_path,
            ..Default::default()
        };

        let mut folders = Vec::new();
        for folder in array(json, "folders").into_iter().filter_map(|f| f.value::<String>()) {
            let folder_path = data.base_path.join(&folder);
            match ProjectFolder::load::<J>(&folder_path) {
                Ok(loaded) => folders.push(loaded),
                Err(e) => tracing::warn!("Skipping project folder '{}': {}", folder_path.display(), e),
            }
            data.folders.push(folder);
            data.folder_paths.push(folder_path);
        }

        Self { path: path.to_path_buf(), folders, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &ProjectData {
        &self.data
    }

    pub fn folders(&self) -> &[ProjectFolder] {
        &self.folders
    }

    pub fn property_types(&self) -> &PropertyTypes {
        &self.data.property_types
    }

    pub fn get_enum_definition(&self, name: &str) -> Option<&Rc<EnumDefinition>> {
        self.data.property_types.get_enum_definition(name)
    }

    pub fn get_class(&self, name: &str) -> Option<&TiledClass> {
        self.data.property_types.get_class(name)
    }
}

/// A folder of a project with all files and sub folders in it.
///
/// If the folder contains a `.world` file, only the files listed in that
/// world are collected.
#[derive(Debug)]
pub struct ProjectFolder {
    path: PathBuf,
    world: Option<World>,
    sub_folders: Vec<ProjectFolder>,
    files: Vec<PathBuf>,
}

impl ProjectFolder {
    pub fn load<J: JsonNode>(path: &Path) -> Result<Self> {
        let mut entries = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        let world_path = entries.iter()
            .find(|p| p.is_file() && p.extension().map_or(false, |e| e == "world"));
        let world = match world_path {
            Some(world_path) => match World::from_file_with::<J>(world_path) {
                Ok(world) => Some(world),
                Err(e) => {
                    tracing::warn!("Could not parse world '{}': {}", world_path.display(), e);
                    None
                }
            },
            None => None,
        };

        let mut sub_folders = Vec::new();
        let mut files = Vec::new();
        for entry in entries {
            if entry.is_dir() {
                sub_folders.push(ProjectFolder::load::<J>(&entry)?);
            } else if entry.is_file() {
                let listed = match (&world, entry.file_name()) {
                    (Some(world), Some(name)) => world.contains(&name.to_string_lossy()),
                    (Some(_), None) => false,
                    (None, _) => true,
                };
                if listed {
                    files.push(entry);
                }
            }
        }

        Ok(Self { path: path.to_path_buf(), world, sub_folders, files })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_world_file(&self) -> bool {
        self.world.is_some()
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn sub_folders(&self) -> &[ProjectFolder] {
        &self.sub_folders
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}
