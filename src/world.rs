//! Tiled worlds (`.world`), which place several maps next to each other.

use std::path::{Path, PathBuf};

use crate::{Map, Result, Tileson};
use crate::json::{JsonNode, array, field_or_default};
use crate::math::ivec2;

/// Location of a single map inside of a [World].
#[derive(Debug, Clone, PartialEq, Default)]
#[non_exhaustive]
pub struct WorldMapData {
    /// Directory of the world file
    pub folder: PathBuf,
    /// Location of the map file, `folder/file_name`
    pub path: PathBuf,
    pub file_name: String,
    /// Size in pixels
    pub size: ivec2,
    /// Position in pixels
    pub position: ivec2,
}

impl WorldMapData {
    pub fn from_json<J: JsonNode>(folder: &Path, json: &J) -> Self {
        let file_name: String = field_or_default(json, "fileName");
        let path = if file_name.is_empty() { folder.to_path_buf() } else { folder.join(&file_name) };
        Self {
            folder: folder.to_path_buf(),
            path,
            file_name,
            size: ivec2::from_json(json, "width", "height").unwrap_or_default(),
            position: ivec2::from_json(json, "x", "y").unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct World {
    path: PathBuf,
    folder: PathBuf,
    map_data: Vec<WorldMapData>,
    maps: Vec<Map>,
    only_show_adjacent_maps: bool,
    type_: String,
}

impl World {
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with::<serde_json::Value>(path)
    }

    /// Like [World::from_file], using `J` as json backend.
    pub fn from_file_with<J: JsonNode>(path: &Path) -> Result<Self> {
        let json = J::parse_file(path)?;
        Ok(Self::from_json(&json, path))
    }

    /// Build a world from already parsed json. Map paths are relative to the
    /// directory of `path`.
    pub fn from_json<J: JsonNode>(json: &J, path: &Path) -> Self {
        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let map_data = array(json, "maps").into_iter()
            .map(|item| WorldMapData::from_json(&folder, item))
            .collect();

        Self {
            path: path.to_path_buf(),
            folder,
            map_data,
            maps: Vec::new(),
            only_show_adjacent_maps: field_or_default(json, "onlyShowAdjacentMaps"),
            type_: field_or_default(json, "type"),
        }
    }

    /// Parse all maps of this world that exist on disk and return how many were parsed.
    /// Previously loaded maps are discarded.
    ///
    /// Check the [status](Map::status) of each map, as a map that fails to parse still counts.
    pub fn load_maps<J: JsonNode>(&mut self, parser: &mut Tileson<J>) -> usize {
        self.maps.clear();
        for data in &self.map_data {
            if data.path.exists() {
                self.maps.push(parser.parse(&data.path));
            } else {
                tracing::warn!("World map '{}' does not exist", data.path.display());
            }
        }
        self.maps.len()
    }

    /// Whether a map with the given file name (including extension) is part of this world.
    pub fn contains(&self, file_name: &str) -> bool {
        self.get(file_name).is_some()
    }

    pub fn get(&self, file_name: &str) -> Option<&WorldMapData> {
        self.map_data.iter().find(|m| m.file_name == file_name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn map_data(&self) -> &[WorldMapData] {
        &self.map_data
    }

    pub fn only_show_adjacent_maps(&self) -> bool {
        self.only_show_adjacent_maps
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// Maps parsed by [World::load_maps]
    pub fn maps(&self) -> &[Map] {
        &self.maps
    }
}
