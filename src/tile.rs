//! Tiles, their flip flags and animations.

use std::ops;
use std::path::PathBuf;

use crate::{Error, Result};
use crate::class::{LazyClass, TiledClass};
use crate::json::{JsonNode, array, field, field_or_default};
use crate::layer::Layer;
use crate::math::{fvec2, ivec2, Rect};
use crate::parser::ParseContext;
use crate::property::PropertyCollection;
use crate::tileset::{Tileset, TilesetType};

const GID_HORIZONTAL_FLIP_FLAG: u32 = 0x80000000;
const GID_VERTICAL_FLIP_FLAG: u32   = 0x40000000;
const GID_DIAGONAL_FLIP_FLAG: u32   = 0x20000000;

const GID_FLIP_MASK: u32 = GID_HORIZONTAL_FLIP_FLAG | GID_VERTICAL_FLIP_FLAG | GID_DIAGONAL_FLIP_FLAG;

/// Bitset describing how a tile is mirrored.
///
/// The flags use the same bits as the raw tile ids in Tiled data, so they can
/// be taken from and put back into a raw id without shifting.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Hash)]
pub struct TileFlipFlags(u32);

impl TileFlipFlags {
    pub const NONE: Self = TileFlipFlags(0);
    pub const HORIZONTAL: Self = TileFlipFlags(GID_HORIZONTAL_FLIP_FLAG);
    pub const VERTICAL: Self = TileFlipFlags(GID_VERTICAL_FLIP_FLAG);
    pub const DIAGONAL: Self = TileFlipFlags(GID_DIAGONAL_FLIP_FLAG);

    /// The flags stored in the upper bits of a raw tile id.
    pub const fn from_gid(gid: u32) -> Self {
        TileFlipFlags(gid & GID_FLIP_MASK)
    }

    /// A raw tile id with all flip bits removed.
    pub const fn clear(gid: u32) -> u32 {
        gid & !GID_FLIP_MASK
    }

    /// Split a raw tile id into the clean global id and its flags.
    pub const fn split(gid: u32) -> (u32, Self) {
        (Self::clear(gid), Self::from_gid(gid))
    }

    /// Put these flags into a clean global id.
    pub const fn apply(&self, gid: u32) -> u32 {
        Self::clear(gid) | self.0
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Whether all flags in `other` are set
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn flip_horizontal(&self) -> bool { self.contains(Self::HORIZONTAL) }
    pub fn flip_vertical(&self) -> bool { self.contains(Self::VERTICAL) }
    pub fn flip_diagonal(&self) -> bool { self.contains(Self::DIAGONAL) }
}

impl_op_ex!{| |a: &TileFlipFlags, b: &TileFlipFlags| -> TileFlipFlags { TileFlipFlags(a.0 | b.0) }}
impl_op_ex!{& |a: &TileFlipFlags, b: &TileFlipFlags| -> TileFlipFlags { TileFlipFlags(a.0 & b.0) }}

/// Handle to a tile owned by a [Map](crate::Map).
///
/// Use [Map::resolve](crate::Map::resolve) to get the tile itself.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum TileRef {
    /// A tile of `map.tilesets[tileset].tiles[tile]`
    Tileset { tileset: usize, tile: usize },
    /// A flipped copy of a tileset tile, stored under its raw id
    Flagged(u32),
}

/// A single frame of an [Animation].
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct Frame {
    /// Duration in milliseconds
    pub duration: i32,
    /// Local id of the tile to show, starting at 1
    pub tile_id: u32,
}

impl Frame {
    pub fn new(duration: i32, tile_id: u32) -> Self {
        Self { duration, tile_id }
    }

    pub(crate) fn from_json<J: JsonNode>(json: &J) -> Self {
        // tileid is 0 based in the file
        Self {
            duration: field_or_default(json, "duration"),
            tile_id: field::<u32, _>(json, "tileid").and_then(|id| id.checked_add(1)).unwrap_or(0),
        }
    }
}

/// The frames of an animated tile, together with a playback position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Animation {
    frames: Vec<Frame>,
    current_frame: usize,
    time_delta: f32,
}

impl Animation {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames, current_frame: 0, time_delta: 0. }
    }

    /// Advance the animation by `time_delta_ms` milliseconds.
    ///
    /// Moves at most one frame per call. The time exceeding the frame
    /// duration is carried over, truncated to whole milliseconds.
    pub fn update(&mut self, time_delta_ms: f32) {
        let Some(duration) = self.current_frame().map(|f| f.duration) else { return };

        self.time_delta += time_delta_ms;
        if self.time_delta >= duration as f32 {
            self.time_delta = (self.time_delta as i32).checked_rem(duration).unwrap_or(0) as f32;
            self.current_frame = self.next_frame();
        }
    }

    fn next_frame(&self) -> usize {
        if self.current_frame + 1 >= self.frames.len() { 0 } else { self.current_frame + 1 }
    }

    pub fn reset(&mut self) {
        self.current_frame = 0;
        self.time_delta = 0.;
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn set_frames(&mut self, frames: Vec<Frame>) {
        self.frames = frames;
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.get(self.current_frame)
    }

    pub fn current_frame_number(&self) -> usize {
        self.current_frame
    }

    pub fn set_current_frame(&mut self, frame: usize) {
        self.current_frame = frame;
    }

    /// Local tile id of the current frame, 0 if there is none.
    pub fn current_tile_id(&self) -> u32 {
        self.current_frame().map_or(0, |f| f.tile_id)
    }

    pub fn time_delta(&self) -> f32 {
        self.time_delta
    }

    pub fn set_time_delta(&mut self, time_delta: f32) {
        self.time_delta = time_delta;
    }

    /// Whether there are any frames
    pub fn any(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn size(&self) -> usize {
        self.frames.len()
    }
}

/// A tile of a [Tileset].
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Tile {
    /// Local id inside of the tileset, starting at 1
    pub id: u32,
    /// Global id inside of the map, without flip flags
    pub gid: u32,
    pub flip_flags: TileFlipFlags,
    /// Index of the owning tileset in [Map::tilesets](crate::Map::tilesets)
    pub tileset: usize,
    /// Image of this tile (image collection tilesets only)
    pub image: PathBuf,
    pub image_size: ivec2,
    /// Part of the image to use, defaults to the whole image
    pub sub_rect: Rect,
    /// Region of the tileset image (or own image) to draw
    pub drawing_rect: Rect,
    pub type_: String,
    pub objectgroup: Option<Box<Layer>>,
    pub animation: Animation,
    pub terrain: Vec<i32>,
    pub properties: PropertyCollection,
    /// Tile size of the map the tile belongs to
    pub map_tile_size: ivec2,
    class: LazyClass,
}

impl Tile {
    /// Parse a tile of `tileset`. Ids that do not fit into the global id range are an error.
    pub(crate) fn from_json<J: JsonNode>(json: &J, tileset: &Tileset, ctx: &mut ParseContext<J>) -> Result<Self> {
        let image_size = ivec2::from_json(json, "imagewidth", "imageheight").unwrap_or_default();
        let mut sub_rect = Rect::new(ivec2::new(0, 0), image_size);
        if let Some(x) = field(json, "x") { sub_rect.upper_left.x = x; }
        if let Some(y) = field(json, "y") { sub_rect.upper_left.y = y; }
        if let Some(width) = field(json, "width") { sub_rect.size.x = width; }
        if let Some(height) = field(json, "height") { sub_rect.size.y = height; }

        // ids are 0 based in the file, but 1 based everywhere else
        let id = match field::<u32, _>(json, "id") {
            Some(id) => id.checked_add(1).ok_or_else(|| out_of_range(tileset, id))?,
            None => {
                tracing::warn!("Tile in tileset '{}' has no id", tileset.name);
                0
            }
        };
        let raw_gid = tileset.firstgid.checked_add(id.saturating_sub(1)).ok_or_else(|| out_of_range(tileset, id))?;
        let (gid, flip_flags) = TileFlipFlags::split(raw_gid);

        let frames: Vec<_> = array(json, "animation").into_iter().map(Frame::from_json).collect();

        let mut tile = Tile {
            id,
            gid,
            flip_flags,
            tileset: ctx.tileset_index,
            image: field_or_default(json, "image"),
            image_size,
            sub_rect,
            drawing_rect: Rect::default(),
            // Tiled 1.9 renamed 'type' to 'class'
            type_: field(json, "type").or_else(|| field(json, "class")).unwrap_or_default(),
            objectgroup: json.field("objectgroup").map(|group| Box::new(Layer::from_json(group, ctx))),
            animation: Animation::new(frames),
            terrain: array(json, "terrain").into_iter().filter_map(|t| t.value()).collect(),
            properties: ctx.properties(json),
            map_tile_size: ctx.tile_size,
            class: ctx.lazy_class(),
        };
        tile.update_drawing_rect(tileset);
        Ok(tile)
    }

    /// Placeholder for a tile id that has no entry in the tileset json.
    pub(crate) fn missing(id: u32, tileset: &Tileset, ctx: &ParseContext<impl JsonNode>) -> Self {
        let mut tile = Tile {
            id,
            gid: tileset.firstgid.saturating_add(id - 1),
            tileset: ctx.tileset_index,
            map_tile_size: ctx.tile_size,
            class: ctx.lazy_class(),
            ..Default::default()
        };
        tile.update_drawing_rect(tileset);
        tile
    }

    /// A copy of this tile, flipped according to the flags of `raw_gid`.
    pub(crate) fn flipped(&self, raw_gid: u32) -> Self {
        let mut tile = self.clone();
        tile.flip_flags = TileFlipFlags::from_gid(raw_gid);
        tile
    }

    pub(crate) fn update_drawing_rect(&mut self, tileset: &Tileset) {
        self.drawing_rect = match tileset.tileset_type {
            TilesetType::Image if tileset.columns > 0 => {
                let first = tileset.firstgid;
                if self.gid < first || self.gid > tileset.last_gid() {
                    return;
                }

                let columns = tileset.columns;
                let rows = (tileset.tile_count as i32 / columns).max(1);
                let base = (self.gid - first) as i32;
                let column = base % columns;
                let row = base / columns;

                let offset = ivec2::new(column * self.map_tile_size.x, row.min(rows - 1) * self.map_tile_size.y);
                let spacing = tileset.margin_spacing_offset(ivec2::new(column, row));
                Rect::new(offset + spacing, tileset.tile_size)
            }
            TilesetType::ImageCollection => Rect::new(ivec2::new(0, 0), self.image_size),
            _ => Rect::default(),
        };
    }

    /// Position in pixels of this tile placed at the given tile coordinates.
    pub fn position(&self, x: i32, y: i32) -> fvec2 {
        fvec2::new(x as f32 * self.map_tile_size.x as f32, y as f32 * self.map_tile_size.y as f32)
    }

    /// The raw id of this tile including flip flags, as it appears in layer data.
    pub fn raw_gid(&self) -> u32 {
        self.flip_flags.apply(self.gid)
    }

    pub fn has_flip_flags(&self, flags: TileFlipFlags) -> bool {
        self.flip_flags.contains(flags)
    }

    /// The project class named by [type_](Self::type_), with the tile properties applied.
    pub fn class(&self) -> Option<&TiledClass> {
        self.class.get(&self.type_, &self.properties)
    }
}

fn out_of_range(tileset: &Tileset, id: u32) -> Error {
    Error::StructureError{
        tag: "tile".into(),
        msg: format!("Tile id {} of tileset '{}' is out of the global id range", id, tileset.name),
    }
}

/// A tile placed at a grid cell of a tile layer.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct TileObject {
    pub position_in_tile_units: ivec2,
    /// Position in pixels
    pub position: fvec2,
    pub tile: TileRef,
    pub drawing_rect: Rect,
}

impl TileObject {
    pub(crate) fn new(x: i32, y: i32, tile_ref: TileRef, tile: &Tile) -> Self {
        Self {
            position_in_tile_units: ivec2::new(x, y),
            position: tile.position(x, y),
            tile: tile_ref,
            drawing_rect: tile.drawing_rect,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_flip_flags() {
        let raw = 0xA0000007;
        let (gid, flags) = TileFlipFlags::split(raw);
        assert_eq!(gid, 7);
        assert!(flags.flip_horizontal());
        assert!(!flags.flip_vertical());
        assert!(flags.flip_diagonal());
        assert_eq!(flags, TileFlipFlags::HORIZONTAL | TileFlipFlags::DIAGONAL);
        assert_eq!(flags.apply(gid), raw);
        assert!(TileFlipFlags::from_gid(7).is_empty());
    }

    #[test]
    fn test_flip_flags_all_combinations() {
        for flags in 0..8u32 {
            let raw = (flags << 29) | 1234;
            let (gid, extracted) = TileFlipFlags::split(raw);
            assert_eq!(gid, 1234);
            assert_eq!(extracted.apply(gid), raw);
        }
    }

    #[test]
    fn test_animation_update() {
        let mut animation = Animation::new(vec![Frame::new(100, 1), Frame::new(200, 2), Frame::new(100, 3)]);
        assert!(animation.any());
        assert_eq!(animation.size(), 3);

        animation.update(99.);
        assert_eq!(animation.current_frame_number(), 0);
        assert_eq!(animation.time_delta(), 99.);

        animation.update(6.);
        assert_eq!(animation.current_frame_number(), 1);
        assert_eq!(animation.time_delta(), 5.);
        assert_eq!(animation.current_tile_id(), 2);

        animation.update(195.);
        assert_eq!(animation.current_frame_number(), 2);
        assert_eq!(animation.time_delta(), 0.);

        animation.update(100.);
        assert_eq!(animation.current_frame_number(), 0);
        assert_eq!(animation.time_delta(), 0.);

        animation.update(50.);
        animation.reset();
        assert_eq!(animation.current_frame_number(), 0);
        assert_eq!(animation.time_delta(), 0.);
    }

    #[test]
    fn test_empty_animation() {
        let mut animation = Animation::default();
        animation.update(1000.);
        assert!(animation.current_frame().is_none());
        assert_eq!(animation.current_tile_id(), 0);
        assert_eq!(animation.time_delta(), 0.);
    }

    #[test]
    fn test_frame_tile_id_from_json() {
        let frame = Frame::from_json(&serde_json::json!({"duration": 100, "tileid": 4}));
        assert_eq!(frame, Frame::new(100, 5));

        let frame = Frame::from_json(&serde_json::json!({"duration": 100, "tileid": 4294967295u32}));
        assert_eq!(frame.tile_id, 0);
    }
}
