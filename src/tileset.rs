//! Tilesets, embedded in a map or stored in external files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::{Color, Error, Result};
use crate::class::{LazyClass, TiledClass};
use crate::json::{JsonNode, array, field, field_or, field_or_default, parsed_or_default};
use crate::math::ivec2;
use crate::parser::ParseContext;
use crate::property::PropertyCollection;
use crate::tile::Tile;
use crate::wang::WangSet;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum TilesetType {
    #[default]
    Undefined,
    /// All tiles are cut out of a single image
    Image,
    /// Every tile has its own image
    ImageCollection,
}

/// Grid used for tile objects of image collection tilesets.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Grid {
    /// Either "orthogonal" or "isometric"
    pub orientation: String,
    pub size: ivec2,
}

impl Grid {
    fn from_json<J: JsonNode>(json: &J) -> Self {
        Self {
            orientation: field_or(json, "orientation", "orthogonal".into()),
            size: ivec2::from_json_or_default(json, "width", "height"),
        }
    }
}

/// Terrain definition, replaced by wang sets in Tiled 1.5.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Terrain {
    pub name: String,
    /// Local id of the tile representing this terrain
    pub tile: i32,
    pub properties: PropertyCollection,
}

impl Terrain {
    fn from_json<J: JsonNode>(json: &J, ctx: &ParseContext<J>) -> Self {
        Self {
            name: field_or_default(json, "name"),
            tile: field_or_default(json, "tile"),
            properties: ctx.properties(json),
        }
    }
}

/// Which transformations are allowed for tiles of this tileset.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct Transformations {
    pub hflip: bool,
    pub vflip: bool,
    pub rotate: bool,
    /// Whether untransformed tiles are preferred over transformed ones
    pub prefer_untransformed: bool,
}

impl Transformations {
    fn from_json<J: JsonNode>(json: &J) -> Self {
        Self {
            hflip: field_or_default(json, "hflip"),
            vflip: field_or_default(json, "vflip"),
            rotate: field_or_default(json, "rotate"),
            prefer_untransformed: field_or_default(json, "preferuntransformed"),
        }
    }
}

/// Alignment of tile objects relative to their position.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum ObjectAlignment {
    /// Bottom left for orthogonal maps, bottom for isometric maps
    #[default]
    Unspecified,
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl std::str::FromStr for ObjectAlignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        use ObjectAlignment::*;
        match s {
            "unspecified" => Ok(Unspecified),
            "topleft" => Ok(TopLeft),
            "top" => Ok(Top),
            "topright" => Ok(TopRight),
            "left" => Ok(Left),
            "center" => Ok(Center),
            "right" => Ok(Right),
            "bottomleft" => Ok(BottomLeft),
            "bottom" => Ok(Bottom),
            "bottomright" => Ok(BottomRight),
            _ => Err(Error::ParseError(format!("Invalid object alignment '{}'", s).into()))
        }
    }
}

/// The size used to render tiles of a tileset.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum TileRenderSize {
    /// Tile size of the tileset
    #[default]
    Tile,
    /// Tile size of the map
    Grid,
}

impl std::str::FromStr for TileRenderSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tile" => Ok(TileRenderSize::Tile),
            "grid" => Ok(TileRenderSize::Grid),
            _ => Err(Error::ParseError(format!("Invalid tile render size '{}'", s).into()))
        }
    }
}

/// How tiles are fit into a render size that differs from their own size.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum FillMode {
    #[default]
    Stretch,
    PreserveAspectFit,
}

impl std::str::FromStr for FillMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stretch" => Ok(FillMode::Stretch),
            "preserve-aspect-fit" => Ok(FillMode::PreserveAspectFit),
            _ => Err(Error::ParseError(format!("Invalid fill mode '{}'", s).into()))
        }
    }
}

/// A collection of tiles.
///
/// Tiles are addressed by their local id, starting at 1. A tile with local id
/// `n` has the global id `firstgid + n - 1` in the map.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Tileset {
    pub firstgid: u32,
    pub name: String,
    /// The "type" field, always "tileset"
    pub type_: String,
    /// Name of the project class of this tileset
    pub class_type: String,
    pub columns: i32,
    pub tileset_type: TilesetType,

    /// Image as written in the file
    pub image: PathBuf,
    /// Image relative to the working directory
    pub image_path: PathBuf,
    pub image_size: ivec2,

    /// Pixels between the image border and the first tile
    pub margin: i32,
    /// Pixels between neighbouring tiles
    pub spacing: i32,
    pub tile_count: u32,
    pub tile_size: ivec2,
    /// Drawing offset of all tiles in pixels
    pub tile_offset: ivec2,
    pub transparent_color: Option<Color>,
    pub grid: Option<Grid>,
    /// File of an external tileset, relative to the map
    pub source: Option<PathBuf>,

    pub tile_render_size: TileRenderSize,
    pub fill_mode: FillMode,
    pub object_alignment: ObjectAlignment,
    pub transformations: Transformations,

    pub tiles: Vec<Tile>,
    pub terrains: Vec<Terrain>,
    pub wangsets: Vec<WangSet>,
    pub properties: PropertyCollection,
    class: LazyClass,
}

impl Tileset {
    /// Parse a tileset entry of a map. External tilesets are loaded through
    /// the resource manager of `ctx`, failing to do so is an error.
    pub(crate) fn from_json<J: JsonNode>(json: &J, ctx: &mut ParseContext<J>) -> Result<Self> {
        let firstgid = field(json, "firstgid").unwrap_or_else(|| {
            tracing::warn!("Tileset without firstgid");
            1
        });
        let source: Option<PathBuf> = field(json, "source");

        let external;
        let body = match &source {
            Some(source) => {
                let data = ctx.resources_mut().load_bytes(source).map_err(|e| Error::StructureError{
                    tag: "tileset".into(),
                    msg: format!("Could not load external tileset '{}': {}", source.display(), e),
                })?;
                external = J::parse_bytes(&data)?;
                &external
            }
            None => json,
        };

        let image: PathBuf = field_or_default(body, "image");
        let image_path = if image.as_os_str().is_empty() {
            PathBuf::new()
        } else {
            // images of external tilesets are relative to the tileset file
            let relative = source.as_deref().and_then(Path::parent).map_or_else(|| image.clone(), |dir| dir.join(&image));
            ctx.resources().resolve(&relative)
        };

        let columns: Option<i32> = field(body, "columns");
        let tileset_type = match columns {
            None => TilesetType::Undefined,
            Some(c) if c > 0 => TilesetType::Image,
            Some(_) => TilesetType::ImageCollection,
        };

        let mut tileset = Tileset {
            firstgid,
            name: field_or_default(body, "name"),
            type_: field_or_default(body, "type"),
            class_type: field_or_default(body, "class"),
            columns: columns.unwrap_or_default(),
            tileset_type,
            image,
            image_path,
            image_size: ivec2::from_json_or_default(body, "imagewidth", "imageheight"),
            margin: field_or_default(body, "margin"),
            spacing: field_or_default(body, "spacing"),
            tile_count: field_or_default(body, "tilecount"),
            tile_size: ivec2::from_json_or_default(body, "tilewidth", "tileheight"),
            tile_offset: body.field("tileoffset").map(|o| ivec2::from_json_or_default(o, "x", "y")).unwrap_or_default(),
            transparent_color: field(body, "transparentcolor"),
            grid: body.field("grid").map(Grid::from_json),
            source,
            tile_render_size: parsed_or_default(body, "tilerendersize"),
            fill_mode: parsed_or_default(body, "fillmode"),
            object_alignment: parsed_or_default(body, "objectalignment"),
            transformations: body.field("transformations").map(Transformations::from_json).unwrap_or_default(),
            tiles: Vec::new(),
            terrains: array(body, "terrains").into_iter().map(|t| Terrain::from_json(t, ctx)).collect(),
            wangsets: array(body, "wangsets").into_iter().map(|w| WangSet::from_json(w, ctx)).collect(),
            properties: ctx.properties(body),
            class: ctx.lazy_class(),
        };

        if tileset.tile_count > 0 && firstgid.checked_add(tileset.tile_count - 1).is_none() {
            return Err(Error::StructureError{
                tag: "tileset".into(),
                msg: format!("Tileset '{}' does not fit into the global id range", tileset.name),
            });
        }

        let mut tiles: Vec<Tile> = array(body, "tiles").into_iter()
            .map(|t| Tile::from_json(t, &tileset, ctx))
            .collect::<Result<_>>()?;

        let present: HashSet<u32> = tiles.iter().map(|t| t.id).collect();
        for id in (1..=tileset.tile_count).filter(|id| !present.contains(id)) {
            tiles.push(Tile::missing(id, &tileset, ctx));
        }
        tileset.tiles = tiles;

        Ok(tileset)
    }

    /// Tile by its local id, starting at 1.
    pub fn get_tile(&self, id: u32) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn get_terrain(&self, name: &str) -> Option<&Terrain> {
        self.terrains.iter().find(|t| t.name == name)
    }

    pub fn get_wangset(&self, name: &str) -> Option<&WangSet> {
        self.wangsets.iter().find(|w| w.name == name)
    }

    /// Last global id belonging to this tileset.
    pub fn last_gid(&self) -> u32 {
        self.firstgid.saturating_add(self.tile_count).saturating_sub(1)
    }

    /// Whether the clean global id `gid` belongs to this tileset.
    pub fn contains_gid(&self, gid: u32) -> bool {
        self.tile_count > 0 && gid >= self.firstgid && gid <= self.last_gid()
    }

    /// Pixel offset caused by margin and spacing for the tile at `pos`,
    /// given in tiles from the upper left of the image.
    pub fn margin_spacing_offset(&self, pos: ivec2) -> ivec2 {
        if self.margin == 0 && self.spacing == 0 {
            return ivec2::new(0, 0);
        }
        pos * self.spacing + ivec2::new(self.margin, self.margin)
    }

    /// The project class named by [class_type](Self::class_type), with the tileset properties applied.
    pub fn class(&self) -> Option<&TiledClass> {
        self.class.get(&self.class_type, &self.properties)
    }
}
