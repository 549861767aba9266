//! Layers of a map: tile layers, object groups, image layers and groups.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crate::{Color, Error, Result};
use crate::class::{LazyClass, TiledClass};
use crate::json::{JsonNode, array, field, field_or, field_or_default, parsed_or_default};
use crate::math::{fvec2, ivec2};
use crate::object::{Object, ObjectType};
use crate::parser::ParseContext;
use crate::property::PropertyCollection;
use crate::tile::{Tile, TileFlipFlags, TileObject, TileRef};
use crate::tileset::Tileset;

/// The kind of a [Layer], without its content.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum LayerType {
    #[default]
    Undefined,
    TileLayer,
    ObjectGroup,
    ImageLayer,
    Group,
}

impl std::str::FromStr for LayerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        use LayerType::*;
        match s {
            "tilelayer" => Ok(TileLayer),
            "objectgroup" => Ok(ObjectGroup),
            "imagelayer" => Ok(ImageLayer),
            "group" => Ok(Group),
            _ => Err(Error::ParseError(format!("Invalid layer type '{}'", s).into()))
        }
    }
}

/// Order in which the objects of an object group are drawn.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum DrawOrder {
    /// Sorted by y coordinate
    #[default]
    TopDown,
    /// In the order of [ObjectLayer::objects]
    Index,
}

impl std::str::FromStr for DrawOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "topdown" => Ok(DrawOrder::TopDown),
            "index" => Ok(DrawOrder::Index),
            _ => Err(Error::ParseError(format!("Invalid draw order '{}'", s).into()))
        }
    }
}

/// A layer of a map.
///
/// The fields shared by all layer types live here,
/// the content depends on the [kind](Layer::kind).
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Layer {
    pub id: u32,
    pub name: String,
    /// Name of the project class of this layer
    pub class_type: String,
    /// Offset in pixels
    pub offset: fvec2,
    pub opacity: f32,
    pub visible: bool,
    /// Position in tiles, always 0 in current Tiled versions
    pub position: ivec2,
    /// Size in tiles. Only set for tile layers.
    pub size: ivec2,
    pub parallax: fvec2,

    /// Color that is multiplied with the colors of the tiles in this layer.
    /// Defaults to opaque white, which acts as a no-op when multiplied.
    ///
    /// *Note:* Multiplication with the raw values of the [Color] struct would
    /// lead to the wrong result! The colors must first be converted to the
    /// invervall [0-1], see [Color::as_float].
    pub tint_color: Color,
    pub transparent_color: Option<Color>,
    pub properties: PropertyCollection,
    pub kind: LayerKind,
    pub(crate) class: LazyClass,
}

/// Content of a [Layer]
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub enum LayerKind {
    /// A layer containing a grid of tiles
    Tile(TileLayer),

    /// A layer containing objects.
    /// Objects are not aligned to the tile grid.
    /// They can be used for example to mark regions of interest.
    Object(ObjectLayer),

    /// A single image
    Image(ImageLayer),

    /// A layer grouping mutiple other layer together.
    /// Group Layers may be nested,
    /// forming a tree of layers.
    Group(GroupLayer),

    /// Unknown `type`
    #[default]
    Undefined,
}

impl Layer {
    /// Parse a layer. Problems with single fields are logged and leave the
    /// field at its default, the layer itself is always created.
    pub(crate) fn from_json<J: JsonNode>(json: &J, ctx: &mut ParseContext<J>) -> Self {
        let layer_type: LayerType = parsed_or_default(json, "type");
        let kind = match layer_type {
            LayerType::TileLayer => LayerKind::Tile(TileLayer::from_json(json, ctx)),
            LayerType::ObjectGroup => LayerKind::Object(ObjectLayer::from_json(json, ctx)),
            LayerType::ImageLayer => LayerKind::Image(ImageLayer::from_json(json)),
            LayerType::Group => LayerKind::Group(GroupLayer::from_json(json, ctx)),
            LayerType::Undefined => LayerKind::Undefined,
        };

        Self {
            id: field_or_default(json, "id"),
            name: field_or_default(json, "name"),
            class_type: field_or_default(json, "class"),
            offset: fvec2::from_json_or_default(json, "offsetx", "offsety"),
            opacity: field_or(json, "opacity", 1.),
            visible: field_or(json, "visible", true),
            position: ivec2::from_json_or_default(json, "x", "y"),
            size: ivec2::from_json_or_default(json, "width", "height"),
            parallax: fvec2::new(field_or(json, "parallaxx", 1.), field_or(json, "parallaxy", 1.)),
            tint_color: field(json, "tintcolor").unwrap_or(Color::from_argb(255, 255, 255, 255)),
            transparent_color: field(json, "transparentcolor"),
            properties: ctx.properties(json),
            kind,
            class: ctx.lazy_class(),
        }
    }

    pub fn layer_type(&self) -> LayerType {
        match self.kind {
            LayerKind::Tile(_) => LayerType::TileLayer,
            LayerKind::Object(_) => LayerType::ObjectGroup,
            LayerKind::Image(_) => LayerType::ImageLayer,
            LayerKind::Group(_) => LayerType::Group,
            LayerKind::Undefined => LayerType::Undefined,
        }
    }

    pub fn as_tile_layer(&self) -> Option<&TileLayer> {
        match &self.kind { LayerKind::Tile(l) => Some(l), _ => None }
    }

    pub fn as_tile_layer_mut(&mut self) -> Option<&mut TileLayer> {
        match &mut self.kind { LayerKind::Tile(l) => Some(l), _ => None }
    }

    pub fn as_object_layer(&self) -> Option<&ObjectLayer> {
        match &self.kind { LayerKind::Object(l) => Some(l), _ => None }
    }

    pub fn as_image_layer(&self) -> Option<&ImageLayer> {
        match &self.kind { LayerKind::Image(l) => Some(l), _ => None }
    }

    pub fn as_group(&self) -> Option<&GroupLayer> {
        match &self.kind { LayerKind::Group(l) => Some(l), _ => None }
    }

    /// Sub layers of a group, empty for all other layers.
    pub fn layers(&self) -> &[Layer] {
        self.as_group().map(|g| g.layers.as_slice()).unwrap_or_default()
    }

    /// Objects of an object group, empty for all other layers.
    pub fn objects(&self) -> &[Object] {
        self.as_object_layer().map(|l| l.objects.as_slice()).unwrap_or_default()
    }

    pub fn get_obj(&self, id: u32) -> Option<&Object> {
        self.objects().iter().find(|o| o.id == id)
    }

    pub fn first_obj(&self, name: &str) -> Option<&Object> {
        self.objects().iter().find(|o| o.name == name)
    }

    pub fn objects_by_name(&self, name: &str) -> Vec<&Object> {
        self.objects().iter().filter(|o| o.name == name).collect()
    }

    pub fn objects_by_type(&self, object_type: ObjectType) -> Vec<&Object> {
        self.objects().iter().filter(|o| o.object_type == object_type).collect()
    }

    /// See [TileLayer::get_tile_data].
    pub fn get_tile_data(&self, x: i32, y: i32) -> Option<TileRef> {
        self.as_tile_layer()?.get_tile_data(x, y)
    }

    pub fn get_tile_object(&self, x: i32, y: i32) -> Option<&TileObject> {
        self.as_tile_layer()?.get_tile_object(x, y)
    }

    /// Raw ids with flip flags used by this layer. Empty for anything but tile layers.
    pub fn unique_flagged_tiles(&self) -> impl Iterator<Item=u32> + '_ {
        self.as_tile_layer().into_iter().flat_map(|l| l.unique_flagged.iter().copied())
    }

    /// The project class named by [class_type](Self::class_type), with the layer properties applied.
    pub fn class(&self) -> Option<&TiledClass> {
        self.class.get(&self.class_type, &self.properties)
    }

    /// Index the tile data of this layer and all of its sub layers.
    /// Rows are as wide as the layer, or as the map for layers without size.
    pub(crate) fn create_tile_data(&mut self, map_size: ivec2, lookup: &TileLookup) {
        match &mut self.kind {
            LayerKind::Tile(layer) => {
                let width = if self.size.x > 0 { self.size.x } else { map_size.x };
                layer.create_tile_data(width, lookup);
            }
            LayerKind::Group(group) => {
                for layer in &mut group.layers {
                    layer.create_tile_data(map_size, lookup);
                }
            }
            _ => {}
        }
    }
}

/// Read-only view on the tiles of a map, used to resolve tile ids.
pub(crate) struct TileLookup<'a> {
    pub tile_map: &'a HashMap<u32, TileRef>,
    pub tilesets: &'a [Tileset],
    pub flagged_tiles: &'a HashMap<u32, Tile>,
}

impl<'a> TileLookup<'a> {
    pub fn resolve(&self, tile: TileRef) -> Option<&'a Tile> {
        match tile {
            TileRef::Tileset { tileset, tile } => self.tilesets.get(tileset)?.tiles.get(tile),
            TileRef::Flagged(raw) => self.flagged_tiles.get(&raw),
        }
    }

    pub fn get(&self, raw: u32) -> Option<TileRef> {
        self.tile_map.get(&raw).copied()
    }
}

/// A rectangular part of an infinite tile layer.
#[derive(Debug, Clone, PartialEq, Default)]
#[non_exhaustive]
pub struct Chunk {
    /// Raw tile ids, including flip flags
    pub data: Vec<u32>,
    /// Encoded data, as found in the file
    pub base64_data: String,
    /// Size in tiles
    pub size: ivec2,
    /// Position in tiles
    pub position: ivec2,
}

impl Chunk {
    fn from_json<J: JsonNode>(json: &J, encoding: &str, compression: &str, ctx: &ParseContext<J>) -> Self {
        let (data, base64_data) = read_tile_data(json, encoding, compression, ctx);
        Self {
            data,
            base64_data,
            size: ivec2::from_json_or_default(json, "width", "height"),
            position: ivec2::from_json_or_default(json, "x", "y"),
        }
    }
}

/// Read the `data` field of a tile layer or chunk, which is either an array
/// of ids or a string in the given encoding and compression.
fn read_tile_data<J: JsonNode>(json: &J, encoding: &str, compression: &str, ctx: &ParseContext<J>) -> (Vec<u32>, String) {
    let Some(data) = json.field("data") else { return Default::default() };

    if data.is_array() {
        return (data.items().into_iter().map(|id| id.value().unwrap_or_default()).collect(), String::new());
    }

    let text: String = data.value().unwrap_or_default();
    let ids = ctx.decompressors().decode_tile_data(&text, encoding, compression).unwrap_or_else(|e| {
        tracing::warn!("Could not decode tile data: {}", e);
        Vec::new()
    });
    (ids, text)
}

#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct TileLayer {
    /// Raw tile ids, including flip flags. Empty for infinite maps.
    pub data: Vec<u32>,
    /// Encoded data, as found in the file
    pub base64_data: String,
    pub encoding: String,
    pub compression: String,
    /// Content of infinite maps
    pub chunks: Vec<Chunk>,
    tile_data: HashMap<(i32, i32), Option<TileRef>>,
    tile_objects: HashMap<(i32, i32), TileObject>,
    unique_flagged: BTreeSet<u32>,
}

impl TileLayer {
    fn from_json<J: JsonNode>(json: &J, ctx: &ParseContext<J>) -> Self {
        let encoding: String = field_or_default(json, "encoding");
        let compression: String = field_or_default(json, "compression");

        let (data, base64_data) = read_tile_data(json, &encoding, &compression, ctx);
        let chunks: Vec<Chunk> = array(json, "chunks").into_iter()
            .map(|c| Chunk::from_json(c, &encoding, &compression, ctx))
            .collect();

        let unique_flagged = data.iter()
            .chain(chunks.iter().flat_map(|c| c.data.iter()))
            .copied()
            .filter(|id| !TileFlipFlags::from_gid(*id).is_empty())
            .collect();

        Self {
            data,
            base64_data,
            encoding,
            compression,
            chunks,
            tile_data: HashMap::new(),
            tile_objects: HashMap::new(),
            unique_flagged,
        }
    }

    fn create_tile_data(&mut self, width: i32, lookup: &TileLookup) {
        let TileLayer { data, chunks, tile_data, tile_objects, .. } = self;
        tile_data.clear();
        tile_objects.clear();

        let mut insert = |x: i32, y: i32, raw: u32| {
            if raw == 0 {
                return;
            }
            match lookup.get(raw).and_then(|r| Some((r, lookup.resolve(r)?))) {
                Some((tile_ref, tile)) => {
                    tile_data.insert((x, y), Some(tile_ref));
                    tile_objects.insert((x, y), TileObject::new(x, y, tile_ref, tile));
                }
                None => tracing::debug!("No tile for id {} at ({}, {})", raw, x, y),
            }
        };

        if width > 0 {
            for (i, raw) in data.iter().enumerate() {
                let i = i as i32;
                insert(i % width, i / width, *raw);
            }
        } else if !data.is_empty() {
            tracing::warn!("Tile layer without width, ignoring its data");
        }

        for chunk in chunks.iter().filter(|c| c.size.x > 0) {
            for (i, raw) in chunk.data.iter().enumerate() {
                let i = i as i32;
                insert(chunk.position.x + i % chunk.size.x, chunk.position.y + i / chunk.size.x, *raw);
            }
        }
    }

    /// The tile at the given cell, None for empty cells and cells outside of the layer.
    pub fn get_tile_data(&self, x: i32, y: i32) -> Option<TileRef> {
        self.tile_data.get(&(x, y)).copied().flatten()
    }

    /// Direct access to the tile index.
    ///
    /// Unlike [TileLayer::get_tile_data], this inserts an empty entry for cells
    /// that have no tile, which shows up in [TileLayer::tile_data].
    pub fn tile_data_entry(&mut self, x: i32, y: i32) -> &mut Option<TileRef> {
        self.tile_data.entry((x, y)).or_insert(None)
    }

    /// All indexed cells
    pub fn tile_data(&self) -> &HashMap<(i32, i32), Option<TileRef>> {
        &self.tile_data
    }

    pub fn get_tile_object(&self, x: i32, y: i32) -> Option<&TileObject> {
        self.tile_objects.get(&(x, y))
    }

    pub fn tile_objects(&self) -> &HashMap<(i32, i32), TileObject> {
        &self.tile_objects
    }

    /// Raw ids with flip flags used by this layer, in ascending order.
    pub fn unique_flagged_tiles(&self) -> &BTreeSet<u32> {
        &self.unique_flagged
    }
}

/// An ObjectLayer is a container of Objects.
/// Objects are not aligned to the tile grid,
/// and can be used to include extra information in a map.
///
/// Check the [Tiled Documentation](https://doc.mapeditor.org/en/stable/manual/objects/)
/// for more information on objects.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct ObjectLayer {
    pub draw_order: DrawOrder,
    /// Color that is used to render [Objects](Object) in this layer.
    pub color: Option<Color>,
    /// The [Objects](Object) contained in this layer
    pub objects: Vec<Object>,
}

impl ObjectLayer {
    fn from_json<J: JsonNode>(json: &J, ctx: &mut ParseContext<J>) -> Self {
        Self {
            draw_order: parsed_or_default(json, "draworder"),
            color: field(json, "color"),
            objects: array(json, "objects").into_iter().map(|o| Object::from_json(o, ctx)).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct ImageLayer {
    pub image: PathBuf,
    pub repeat_x: bool,
    pub repeat_y: bool,
}

impl ImageLayer {
    fn from_json<J: JsonNode>(json: &J) -> Self {
        Self {
            image: field_or_default(json, "image"),
            repeat_x: field_or_default(json, "repeatx"),
            repeat_y: field_or_default(json, "repeaty"),
        }
    }
}

/// A layer to group multiple sub-layers
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct GroupLayer {
    pub layers: Vec<Layer>,
}

impl GroupLayer {
    fn from_json<J: JsonNode>(json: &J, ctx: &mut ParseContext<J>) -> Self {
        Self {
            layers: array(json, "layers").into_iter().map(|l| Layer::from_json(l, ctx)).collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decompress::DecompressorRegistry;
    use crate::resource_manager::ResourceManager;
    use serde_json::{json, Value};

    fn parse(json: &Value) -> Layer {
        let mut resources = ResourceManager::default();
        let decompressors = DecompressorRegistry::with_defaults();
        let mut ctx = ParseContext::new(&mut resources, &decompressors, Default::default());
        Layer::from_json(json, &mut ctx)
    }

    #[test]
    fn test_shared_fields() {
        let layer = parse(&json!({
            "id": 4, "name": "ground", "type": "tilelayer", "class": "Ground",
            "width": 2, "height": 1, "x": 0, "y": 0, "opacity": 0.5, "visible": false,
            "offsetx": 3.5, "offsety": -2, "parallaxx": 0.5,
            "data": [1, 0]
        }));
        assert_eq!(layer.id, 4);
        assert_eq!(layer.layer_type(), LayerType::TileLayer);
        assert_eq!(layer.class_type, "Ground");
        assert_eq!(layer.opacity, 0.5);
        assert!(!layer.visible);
        assert_eq!(layer.offset, fvec2::new(3.5, -2.));
        assert_eq!(layer.parallax, fvec2::new(0.5, 1.));
        assert_eq!(layer.tint_color, Color::from_argb(255, 255, 255, 255));
        assert_eq!(layer.as_tile_layer().map(|l| l.data.clone()), Some(vec![1, 0]));
    }

    #[test]
    fn test_base64_data() {
        let layer = parse(&json!({
            "name": "encoded", "type": "tilelayer", "width": 2, "height": 2,
            "encoding": "base64", "compression": "zlib",
            "data": "eJxjZGBgYAJiZiBmAWIAAGAACw=="
        }));
        let tiles = layer.as_tile_layer().expect("tile layer");
        assert_eq!(tiles.data, vec![1, 2, 3, 4]);
        assert_eq!(tiles.base64_data, "eJxjZGBgYAJiZiBmAWIAAGAACw==");
    }

    #[test]
    fn test_unknown_compression_leaves_data_empty() {
        let layer = parse(&json!({
            "name": "zstd", "type": "tilelayer", "width": 1, "height": 1,
            "encoding": "base64", "compression": "zstd", "data": "AQAAAA=="
        }));
        let tiles = layer.as_tile_layer().expect("tile layer");
        assert!(tiles.data.is_empty());
        assert_eq!(tiles.base64_data, "AQAAAA==");
    }

    #[test]
    fn test_chunks_and_flagged_tiles() {
        let layer = parse(&json!({
            "name": "infinite", "type": "tilelayer", "width": 4, "height": 2,
            "chunks": [
                {"x": -2, "y": 0, "width": 2, "height": 1, "data": [1, 2147483650u32]},
                {"x": 0, "y": 0, "width": 2, "height": 1, "data": [2147483650u32, 0]}
            ]
        }));
        let tiles = layer.as_tile_layer().expect("tile layer");
        assert_eq!(tiles.chunks.len(), 2);
        assert_eq!(tiles.chunks[0].position, ivec2::new(-2, 0));
        assert_eq!(layer.unique_flagged_tiles().collect::<Vec<_>>(), vec![2147483650]);
    }

    #[test]
    fn test_object_group_queries() {
        let layer = parse(&json!({
            "name": "objects", "type": "objectgroup", "draworder": "index",
            "objects": [
                {"id": 1, "name": "door", "x": 0, "y": 0, "width": 16, "height": 16},
                {"id": 2, "name": "door", "x": 16, "y": 0, "point": true},
                {"id": 3, "name": "spawn", "x": 4, "y": 8, "ellipse": true, "width": 2, "height": 2}
            ]
        }));
        assert_eq!(layer.as_object_layer().map(|l| l.draw_order), Some(DrawOrder::Index));
        assert_eq!(layer.objects().len(), 3);
        assert_eq!(layer.get_obj(3).map(|o| o.name.as_str()), Some("spawn"));
        assert!(layer.get_obj(4).is_none());
        assert_eq!(layer.first_obj("door").map(|o| o.id), Some(1));
        assert_eq!(layer.objects_by_name("door").len(), 2);
        assert_eq!(layer.objects_by_type(ObjectType::Point).len(), 1);
        assert_eq!(layer.objects_by_type(ObjectType::Rectangle).len(), 1);
        assert!(layer.get_tile_data(0, 0).is_none());
    }

    #[test]
    fn test_group_and_image_layer() {
        let layer = parse(&json!({
            "name": "group", "type": "group",
            "layers": [
                {"name": "background", "type": "imagelayer", "image": "sky.png", "repeatx": true},
                {"name": "inner", "type": "group", "layers": []}
            ]
        }));
        assert_eq!(layer.layers().len(), 2);
        let image = layer.layers()[0].as_image_layer().expect("image layer");
        assert_eq!(image.image, PathBuf::from("sky.png"));
        assert!(image.repeat_x);
        assert!(!image.repeat_y);
        assert_eq!(layer.layers()[1].layer_type(), LayerType::Group);
    }

    #[test]
    fn test_unknown_layer_type() {
        let layer = parse(&json!({"name": "what", "type": "weird"}));
        assert_eq!(layer.layer_type(), LayerType::Undefined);
        assert!(layer.objects().is_empty());
    }
}
