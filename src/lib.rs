//! tileson is a library for loading [Tiled](https://mapeditor.org) maps
//! stored in the json format.
//!
//! It parses maps together with everything they reference: embedded and
//! external tilesets, object templates and the custom classes and enums of
//! a Tiled project. Worlds and projects can be loaded on their own.
//!
//! As a starting point,
//! parse a map with a [Tileson] parser, check its [status](Map::status)
//! and inspect the [Layers](Map::layers) inside of it.
//!
//! ```no_run
//! let path = std::path::Path::new("test-maps/ultimate_test.json");
//! let mymap = tileson::Tileson::new().parse(&path);
//! assert_eq!(mymap.status(), tileson::ParseStatus::Ok, "{}", mymap.status_message());
//!
//! println!(
//!     "Map {} is {} by {} pixels.", path.display(),
//!     mymap.size.x * mymap.tile_size.x, mymap.size.y * mymap.tile_size.y
//! );
//! ```

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

#[macro_use] extern crate impl_ops;

mod errors;
mod json;
mod color;
mod decompress;
mod property;
mod enums;
mod class;
mod project;
mod world;
mod tile;
mod tileset;
mod wang;
mod layer;
mod object;
mod parser;
mod resource_manager;
pub mod math;

pub use errors::{Error, Result};
pub use json::{FromJson, JsonNode};
pub use color::{Color, FloatColor};
pub use decompress::{Decompressor, DecompressorRegistry, Base64Decompressor, ZlibDecompressor, GzipDecompressor};
pub use property::{Property, PropertyCollection, PropertyType, PropertyValue, ObjectReference, FromPropertyValue};
pub use enums::{EnumDefinition, EnumStorageType, EnumValue};
pub use class::TiledClass;
pub use project::{Project, ProjectData, ProjectFolder, PropertyTypes};
pub use world::{World, WorldMapData};
pub use tile::{Animation, Frame, Tile, TileFlipFlags, TileObject, TileRef};
pub use tileset::{FillMode, Grid, ObjectAlignment, Terrain, TileRenderSize, Tileset, TilesetType, Transformations};
pub use wang::{WangColor, WangSet, WangTile};
pub use layer::{Chunk, DrawOrder, GroupLayer, ImageLayer, Layer, LayerKind, LayerType, ObjectLayer, TileLayer};
pub use object::{Object, ObjectType, Text, TextAlignment};
pub use parser::Tileson;
pub use resource_manager::{ResourceManager, Provider, FileProvider};

use class::LazyClass;
use json::{array, field, field_or, field_or_default, parsed_or_default, required};
use layer::TileLookup;
use math::{fvec2, ivec2};
use parser::ParseContext;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Staggered,
    Hexagonal,
}

impl std::str::FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        use Orientation::*;
        match s {
            "orthogonal" => Ok(Orthogonal),
            "isometric" => Ok(Isometric),
            "staggered" => Ok(Staggered),
            "hexagonal" => Ok(Hexagonal),
            _ => Err(Error::ParseError(format!("Invalid orientation '{}'", s).into()))
        }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum Renderorder {
    #[default]
    RightDown,
    RightUp,
    LeftDown,
    LeftUp,
}

impl std::str::FromStr for Renderorder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        use Renderorder::*;
        match s {
            "right-down" => Ok(RightDown),
            "right-up" => Ok(RightUp),
            "left-down" => Ok(LeftDown),
            "left-up" => Ok(LeftUp),
            _ => Err(Error::ParseError(format!("Invalid render order '{}'", s).into()))
        }
    }
}

/// Outcome of parsing a [Map].
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum ParseStatus {
    /// The map was never parsed
    #[default]
    Undefined,
    Ok,
    /// See [Map::status_message] for details
    ParseError,
}

/// The Map struct is the top level container for all relevant data inside of a Tiled map.
/// A Map consists of [Tilesets](Tileset) and [Layers](Layer).
/// Stacking the layers in iteration order creates the final map image.
/// Each tile layer contains global ids referencing a specific tile in a tileset,
/// use [Map::tile] to look them up.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Map {
    /// Background color of this map, if any.
    pub background_color: Option<Color>,
    /// Size in tiles
    pub size: ivec2,
    /// Length of the side of a hex tile in pixels, hexagonal maps only
    pub hexside_length: i32,
    pub infinite: bool,
    pub next_layer_id: u32,
    pub next_object_id: u32,
    pub orientation: Orientation,
    pub renderorder: Renderorder,
    /// "x" or "y", staggered and hexagonal maps only
    pub stagger_axis: String,
    /// "odd" or "even", staggered and hexagonal maps only
    pub stagger_index: String,
    /// Version of Tiled that saved the map
    pub tiled_version: String,
    pub tile_size: ivec2,
    /// The "type" field, always "map"
    pub type_: String,
    /// Name of the project class of this map
    pub class_type: String,
    /// Compression level of tile layer data, -1 for the default of the algorithm
    pub compression_level: i32,
    pub parallax_origin: fvec2,

    /// The Layers that make up this map.
    /// The final map image is rendered by stacking the layers in iteration order.
    pub layers: Vec<Layer>,
    pub tilesets: Vec<Tileset>,
    /// Custom properties contained in this map.
    pub properties: PropertyCollection,

    status: ParseStatus,
    status_message: String,
    tile_map: HashMap<u32, TileRef>,
    flagged_tiles: HashMap<u32, Tile>,
    class: LazyClass,
}

impl Map {
    pub(crate) fn from_json<J: JsonNode>(json: &J, ctx: &mut ParseContext<J>) -> Result<Self> {
        let orientation: String = required(json, "map", "orientation")?;

        let mut map = Map {
            background_color: field(json, "backgroundcolor"),
            size: ivec2::new(required(json, "map", "width")?, required(json, "map", "height")?),
            hexside_length: field_or_default(json, "hexsidelength"),
            infinite: field_or_default(json, "infinite"),
            next_layer_id: field_or_default(json, "nextlayerid"),
            next_object_id: required(json, "map", "nextobjectid")?,
            orientation: orientation.parse()?,
            renderorder: parsed_or_default(json, "renderorder"),
            stagger_axis: field_or_default(json, "staggeraxis"),
            stagger_index: field_or_default(json, "staggerindex"),
            tiled_version: required(json, "map", "tiledversion")?,
            tile_size: ivec2::new(required(json, "map", "tilewidth")?, required(json, "map", "tileheight")?),
            type_: field_or_default(json, "type"),
            class_type: field_or_default(json, "class"),
            compression_level: field_or(json, "compressionlevel", -1),
            parallax_origin: fvec2::from_json_or_default(json, "parallaxoriginx", "parallaxoriginy"),
            status: ParseStatus::Ok,
            class: ctx.lazy_class(),
            ..Default::default()
        };
        ctx.tile_size = map.tile_size;

        for (index, tileset) in array(json, "tilesets").into_iter().enumerate() {
            ctx.tileset_index = index;
            map.tilesets.push(Tileset::from_json(tileset, ctx)?);
        }
        map.layers = array(json, "layers").into_iter().map(|l| Layer::from_json(l, ctx)).collect();
        map.properties = ctx.properties(json);

        map.process_data();
        Ok(map)
    }

    /// An empty map with status [ParseStatus::ParseError].
    pub(crate) fn parse_error(message: String) -> Self {
        tracing::warn!("Map could not be parsed: {}", message);
        Self {
            status: ParseStatus::ParseError,
            status_message: message,
            ..Default::default()
        }
    }

    /// Build the tile lookup and index the tile data of all layers.
    fn process_data(&mut self) {
        let Map { tilesets, layers, tile_map, flagged_tiles, size, .. } = self;

        tile_map.clear();
        flagged_tiles.clear();
        for (i, tileset) in tilesets.iter().enumerate() {
            for (j, tile) in tileset.tiles.iter().enumerate() {
                tile_map.entry(tile.gid).or_insert(TileRef::Tileset { tileset: i, tile: j });
            }
        }

        // flipped tiles are copies of their tileset tile, stored under the raw id
        let flagged: BTreeSet<u32> = LayerWalk::new(layers)
            .flat_map(|(layer, _)| layer.unique_flagged_tiles())
            .collect();
        for raw in flagged {
            let gid = TileFlipFlags::clear(raw);
            let canonical = match tile_map.get(&gid) {
                Some(TileRef::Tileset { tileset, tile }) => tilesets.get(*tileset).and_then(|t| t.tiles.get(*tile)),
                _ => None,
            };
            match canonical {
                Some(tile) => {
                    flagged_tiles.insert(raw, tile.flipped(raw));
                    tile_map.insert(raw, TileRef::Flagged(raw));
                }
                None => tracing::warn!("Flipped tile with id {} has no tileset", gid),
            }
        }

        let lookup = TileLookup { tile_map: &*tile_map, tilesets: tilesets.as_slice(), flagged_tiles: &*flagged_tiles };
        for layer in layers.iter_mut() {
            layer.create_tile_data(*size, &lookup);
        }
    }

    fn lookup(&self) -> TileLookup {
        TileLookup { tile_map: &self.tile_map, tilesets: &self.tilesets, flagged_tiles: &self.flagged_tiles }
    }

    pub fn status(&self) -> ParseStatus {
        self.status
    }

    /// Description of the problem if the status is [ParseStatus::ParseError].
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// The first layer with the given name, searching group layers too.
    pub fn get_layer(&self, name: &str) -> Option<&Layer> {
        self.iter_layers().map(|(layer, _)| layer).find(|l| l.name == name)
    }

    pub fn get_tileset(&self, name: &str) -> Option<&Tileset> {
        self.tilesets.iter().find(|t| t.name == name)
    }

    /// The tileset owning the (possibly flipped) global id `gid`.
    pub fn get_tileset_by_gid(&self, gid: u32) -> Option<&Tileset> {
        let gid = TileFlipFlags::clear(gid);
        self.tilesets.iter().find(|t| t.contains_gid(gid))
    }

    /// Tile by its global id.
    ///
    /// Ids with flip flags resolve to a flipped copy of the tileset tile,
    /// if the id is used in any tile layer of this map.
    pub fn tile(&self, gid: u32) -> Option<&Tile> {
        let lookup = self.lookup();
        lookup.resolve(lookup.get(gid)?)
    }

    /// The tile a [TileRef] of this map points to.
    pub fn resolve(&self, tile: TileRef) -> Option<&Tile> {
        self.lookup().resolve(tile)
    }

    /// The tile at a cell of a tile layer.
    pub fn tile_at(&self, layer: &Layer, x: i32, y: i32) -> Option<&Tile> {
        self.resolve(layer.get_tile_data(x, y)?)
    }

    /// Global id to tile handle mapping for all tiles of this map.
    pub fn tile_map(&self) -> &HashMap<u32, TileRef> {
        &self.tile_map
    }

    /// The project this map was parsed with, if it is still alive.
    pub fn project(&self) -> Option<Rc<Project>> {
        self.class.project().upgrade()
    }

    /// The project class named by [class_type](Self::class_type), with the map properties applied.
    pub fn class(&self) -> Option<&TiledClass> {
        self.class.get(&self.class_type, &self.properties)
    }

    /// Iterate over all the layers in this map recursively.
    /// All layers are visited in depth-first pre-order manner.
    /// The iterator yields the group layers, as well as all of their sub-layers.
    ///
    /// In addition to the layer, a number of "pops" is also returned with each item.
    /// This is the number of group layers that was left with this iteration step.
    /// Some attributes of group layers affect all containing layers.
    /// If those attributes are accumulated in a stack,
    /// then the number of pops is the number of elemets to remove from the top of the stack.
    ///
    /// # Example
    ///
    /// Rendering layers under consideration of the group opacity:
    ///
    /// ```ignore
    /// let opacities = vec![1.];
    /// for (layer, pops) in map.iter_layers() {
    ///     opacities.truncate(opacities.len() - pops);
    ///     match &layer.kind {
    ///         LayerKind::Group(_) => { opacities.push(opacities.last().unwrap() * layer.opacity) },
    ///         LayerKind::Tile(tiles) => { render_layer(tiles, opacities.last()) }
    ///         _ => {}
    ///     }
    /// }
    /// ```
    pub fn iter_layers(&self) -> impl Iterator<Item=(&Layer, usize)> {
        LayerWalk::new(&self.layers)
    }
}

/// Depth-first walk over nested layers, see [Map::iter_layers].
struct LayerWalk<'a> {
    /// Layers still to visit with their group depth, next one on top.
    pending: Vec<(&'a Layer, usize)>,
    /// Number of groups containing the position after the last yielded layer.
    open_groups: usize,
}

impl<'a> LayerWalk<'a> {
    fn new(layers: &'a [Layer]) -> Self {
        Self { pending: layers.iter().rev().map(|l| (l, 0)).collect(), open_groups: 0 }
    }
}

impl<'a> Iterator for LayerWalk<'a> {
    type Item = (&'a Layer, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (layer, depth) = self.pending.pop()?;
        let pops = self.open_groups - depth;
        self.open_groups = depth;
        if let Some(group) = layer.as_group() {
            self.pending.extend(group.layers.iter().rev().map(|l| (l, depth + 1)));
            self.open_groups += 1;
        }
        Some((layer, pops))
    }
}
