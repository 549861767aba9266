//! Objects of object groups and templates.

use crate::Color;
use crate::class::{LazyClass, TiledClass};
use crate::json::{FromJson, JsonNode};
use crate::math::fvec2;
use crate::parser::ParseContext;
use crate::property::PropertyCollection;
use crate::tile::TileFlipFlags;

/// The shape of an [Object], derived from the fields present in its json.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum ObjectType {
    #[default]
    Undefined,
    /// A tile object, see [Object::gid]
    Object,
    Ellipse,
    Rectangle,
    Point,
    Polygon,
    Polyline,
    Text,
    /// Instance of a template that defines no shape of its own
    Template,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum TextAlignment {
    /// Unknown alignment string
    #[default]
    Unresolved,
    Left,
    Center,
    Right,
    Justify,
    Top,
    Bottom,
}

impl TextAlignment {
    fn horizontal(s: &str) -> Self {
        match s {
            "left" => TextAlignment::Left,
            "center" => TextAlignment::Center,
            "right" => TextAlignment::Right,
            "justify" => TextAlignment::Justify,
            _ => TextAlignment::Unresolved,
        }
    }

    fn vertical(s: &str) -> Self {
        match s {
            "top" => TextAlignment::Top,
            "center" => TextAlignment::Center,
            "bottom" => TextAlignment::Bottom,
            _ => TextAlignment::Unresolved,
        }
    }
}

/// Content of a text object, defaults as in Tiled.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Text {
    pub text: String,
    pub color: Color,
    /// Whether the text wraps at the object bounds
    pub wrap: bool,
    pub bold: bool,
    pub font_family: String,
    pub horizontal_alignment: TextAlignment,
    pub italic: bool,
    pub kerning: bool,
    pub pixel_size: i32,
    pub strikeout: bool,
    pub underline: bool,
    pub vertical_alignment: TextAlignment,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: Color::default(),
            wrap: false,
            bold: false,
            font_family: "sans-serif".into(),
            horizontal_alignment: TextAlignment::Left,
            italic: false,
            kerning: true,
            pixel_size: 16,
            strikeout: false,
            underline: false,
            vertical_alignment: TextAlignment::Top,
        }
    }
}

impl Text {
    fn from_json<J: JsonNode>(json: &J) -> Self {
        let default = Text::default();
        let flag = |name: &str, alternative: bool| crate::json::field_or(json, name, alternative);
        Self {
            text: crate::json::field_or_default(json, "text"),
            color: crate::json::field(json, "color").unwrap_or(default.color),
            wrap: flag("wrap", default.wrap),
            bold: flag("bold", default.bold),
            font_family: crate::json::field(json, "fontfamily").unwrap_or(default.font_family),
            horizontal_alignment: json.field("halign").and_then(JsonNode::text)
                .map_or(default.horizontal_alignment, TextAlignment::horizontal),
            italic: flag("italic", default.italic),
            kerning: flag("kerning", default.kerning),
            pixel_size: crate::json::field_or(json, "pixelsize", default.pixel_size),
            strikeout: flag("strikeout", default.strikeout),
            underline: flag("underline", default.underline),
            vertical_alignment: json.field("valign").and_then(JsonNode::text)
                .map_or(default.vertical_alignment, TextAlignment::vertical),
        }
    }
}

/// Fields of an object instance, falling back to its template.
struct Fields<'a, J> {
    instance: &'a J,
    template: Option<&'a J>,
}

impl<'a, J: JsonNode> Fields<'a, J> {
    fn node(&self, name: &str) -> Option<&'a J> {
        self.instance.field(name).or_else(|| self.template?.field(name))
    }

    fn get<T: FromJson>(&self, name: &str) -> Option<T> {
        self.node(name)?.value()
    }

    fn has(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    fn points(&self, name: &str) -> Vec<fvec2> {
        self.node(name)
            .map(|points| points.items().into_iter().map(|p| fvec2::from_json_or_default(p, "x", "y")).collect())
            .unwrap_or_default()
    }
}

/// An element of an [ObjectLayer](crate::ObjectLayer).
/// Objects do not need to be aligned to the normal tile grid.
/// Objects can have different shapes,
/// (e.g. rect, ellipse, text).
/// See [ObjectType] for more info.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Object {
    pub id: u32,
    pub name: String,
    /// The class of this object, called type before Tiled 1.9
    pub type_: String,
    /// Position in pixels
    pub position: fvec2,
    /// Size in pixels
    pub size: fvec2,
    /// Rotation in degrees, clockwise
    pub rotation: f32,
    pub visible: bool,
    /// Global id of the tile of a tile object, without flip flags
    pub gid: u32,
    pub flip_flags: TileFlipFlags,
    pub ellipse: bool,
    pub point: bool,
    /// Points relative to [position](Self::position)
    pub polygon: Vec<fvec2>,
    /// Points relative to [position](Self::position)
    pub polyline: Vec<fvec2>,
    pub text: Option<Text>,
    /// Template file, relative to the map
    pub template: String,
    pub object_type: ObjectType,
    pub properties: PropertyCollection,
    class: LazyClass,
}

impl Object {
    /// Parse an object. If it references a template that can be loaded, all
    /// fields missing in `json` are taken from the template object.
    pub(crate) fn from_json<J: JsonNode>(json: &J, ctx: &mut ParseContext<J>) -> Self {
        let template: String = crate::json::field_or_default(json, "template");
        let template_file = if template.is_empty() { None } else { ctx.linked_file(&template) };
        let fields = Fields {
            instance: json,
            template: template_file.as_deref().and_then(|t| t.field("object")),
        };

        let (gid, flip_flags) = TileFlipFlags::split(fields.get("gid").unwrap_or_default());
        let ellipse = fields.get("ellipse").unwrap_or_default();
        let point = fields.get("point").unwrap_or_default();

        let object_type = if point {
            ObjectType::Point
        } else if ellipse {
            ObjectType::Ellipse
        } else if fields.has("polygon") {
            ObjectType::Polygon
        } else if fields.has("polyline") {
            ObjectType::Polyline
        } else if fields.has("text") {
            ObjectType::Text
        } else if gid > 0 {
            ObjectType::Object
        } else if !template.is_empty() {
            ObjectType::Template
        } else {
            ObjectType::Rectangle
        };

        if object_type != ObjectType::Template {
            let missing: Vec<_> = ["id", "name", "rotation", "visible", "x", "y", "width", "height"].into_iter()
                .filter(|name| !fields.has(name))
                .collect();
            if !missing.is_empty() {
                tracing::debug!("Object is missing the fields {:?}", missing);
            }
        }

        // template properties first, so the instance overrides them
        let mut properties = fields.template.map(|t| ctx.properties(t)).unwrap_or_default();
        for property in ctx.properties(json).iter() {
            properties.add(property.clone());
        }

        Self {
            id: fields.get("id").unwrap_or_default(),
            name: fields.get("name").unwrap_or_default(),
            type_: fields.get("type").or_else(|| fields.get("class")).unwrap_or_default(),
            position: fvec2::new(fields.get("x").unwrap_or_default(), fields.get("y").unwrap_or_default()),
            size: fvec2::new(fields.get("width").unwrap_or_default(), fields.get("height").unwrap_or_default()),
            rotation: fields.get("rotation").unwrap_or_default(),
            visible: fields.get("visible").unwrap_or(true),
            gid,
            flip_flags,
            ellipse,
            point,
            polygon: fields.points("polygon"),
            polyline: fields.points("polyline"),
            text: fields.node("text").map(Text::from_json),
            template,
            object_type,
            properties,
            class: ctx.lazy_class(),
        }
    }

    pub fn has_flip_flags(&self, flags: TileFlipFlags) -> bool {
        self.flip_flags.contains(flags)
    }

    /// The project class named by [type_](Self::type_), with the object properties applied.
    pub fn class(&self) -> Option<&TiledClass> {
        self.class.get(&self.type_, &self.properties)
    }
}
