//! Wang sets, used by the terrain brushes of Tiled.

use crate::Color;
use crate::class::{LazyClass, TiledClass};
use crate::json::{JsonNode, array, field_or_default};
use crate::parser::ParseContext;
use crate::property::PropertyCollection;

#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct WangSet {
    pub name: String,
    /// Local id of the tile representing this set
    pub tile: i32,
    pub type_: String,
    pub wang_tiles: Vec<WangTile>,
    /// Before Tiled 1.5
    pub corner_colors: Vec<WangColor>,
    /// Before Tiled 1.5
    pub edge_colors: Vec<WangColor>,
    /// Since Tiled 1.5
    pub colors: Vec<WangColor>,
    pub properties: PropertyCollection,
    class: LazyClass,
}

impl WangSet {
    pub(crate) fn from_json<J: JsonNode>(json: &J, ctx: &ParseContext<J>) -> Self {
        let colors = |name: &str| -> Vec<WangColor> {
            array(json, name).into_iter().map(|c| WangColor::from_json(c, ctx)).collect()
        };

        Self {
            name: field_or_default(json, "name"),
            tile: field_or_default(json, "tile"),
            type_: field_or_default(json, "class"),
            wang_tiles: array(json, "wangtiles").into_iter().map(WangTile::from_json).collect(),
            corner_colors: colors("cornercolors"),
            edge_colors: colors("edgecolors"),
            colors: colors("colors"),
            properties: ctx.properties(json),
            class: ctx.lazy_class(),
        }
    }

    pub fn class(&self) -> Option<&TiledClass> {
        self.class.get(&self.type_, &self.properties)
    }

    pub fn get_color(&self, name: &str) -> Option<&WangColor> {
        self.colors.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct WangColor {
    pub color: Color,
    pub name: String,
    pub probability: f32,
    /// Local id of the tile representing this color
    pub tile: i32,
    pub type_: String,
    pub properties: PropertyCollection,
    class: LazyClass,
}

impl WangColor {
    pub(crate) fn from_json<J: JsonNode>(json: &J, ctx: &ParseContext<J>) -> Self {
        Self {
            color: field_or_default(json, "color"),
            name: field_or_default(json, "name"),
            probability: field_or_default(json, "probability"),
            tile: field_or_default(json, "tile"),
            type_: field_or_default(json, "class"),
            properties: ctx.properties(json),
            class: ctx.lazy_class(),
        }
    }

    pub fn class(&self) -> Option<&TiledClass> {
        self.class.get(&self.type_, &self.properties)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct WangTile {
    /// Local id of the tile, as written in the file
    pub tile_id: u32,
    /// Wang color indices, clockwise starting at the top edge
    pub wang_id: Vec<u32>,
    /// Removed in Tiled 1.5
    pub dflip: bool,
    /// Removed in Tiled 1.5
    pub hflip: bool,
    /// Removed in Tiled 1.5
    pub vflip: bool,
}

impl WangTile {
    pub(crate) fn from_json<J: JsonNode>(json: &J) -> Self {
        Self {
            tile_id: field_or_default(json, "tileid"),
            wang_id: array(json, "wangid").into_iter().filter_map(|i| i.value()).collect(),
            dflip: field_or_default(json, "dflip"),
            hflip: field_or_default(json, "hflip"),
            vflip: field_or_default(json, "vflip"),
        }
    }
}
