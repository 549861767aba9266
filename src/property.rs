//! This module provides functionality for custom
//! [properties](https://doc.mapeditor.org/en/stable/reference/json-map-format/#property)

use std::path::PathBuf;

use crate::{Color, Error, Result};
use crate::class::TiledClass;
use crate::enums::EnumValue;
use crate::json::{JsonNode, array, field, field_or_default};
use crate::project::PropertyTypes;

/// Declared type of a [Property].
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum PropertyType {
    #[default]
    Undefined,
    Color,
    File,
    Int,
    Boolean,
    Float,
    String,
    Class,
    Enum,
    Object,
}

impl From<&str> for PropertyType {
    fn from(s: &str) -> Self {
        use PropertyType::*;
        match s {
            "color" => Color,
            "file" => File,
            "int" => Int,
            "bool" => Boolean,
            "float" => Float,
            "string" => String,
            "class" => Class,
            "object" => Object,
            _ => Undefined,
        }
    }
}

/// Reference type to an object stored in the map.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct ObjectReference(pub u32);

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    #[default]
    Undefined,
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Color(Color),
    File(PathBuf),
    Object(ObjectReference),
    Enum(EnumValue),
    Class(TiledClass),
}

/// Conversion out of a [PropertyValue], used by the typed getters.
pub trait FromPropertyValue: Sized {
    fn from_value(value: &PropertyValue) -> Option<Self>;
}

macro_rules! from_property_value {
    ($T:ty, $variant:ident) => {
        impl FromPropertyValue for $T {
            fn from_value(value: &PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

from_property_value!(String, String);
from_property_value!(i64, Int);
from_property_value!(f64, Float);
from_property_value!(bool, Bool);
from_property_value!(Color, Color);
from_property_value!(PathBuf, File);
from_property_value!(ObjectReference, Object);
from_property_value!(EnumValue, Enum);
from_property_value!(TiledClass, Class);

impl FromPropertyValue for i32 {
    fn from_value(value: &PropertyValue) -> Option<Self> {
        i64::from_value(value).and_then(|v| i32::try_from(v).ok())
    }
}

impl FromPropertyValue for f32 {
    fn from_value(value: &PropertyValue) -> Option<Self> {
        f64::from_value(value).map(|v| v as f32)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub type_: PropertyType,
    /// Name of the enum or class this property is an instance of, if any.
    pub property_type: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue, type_: PropertyType) -> Self {
        Self { name: name.into(), type_, property_type: String::new(), value }
    }

    /// Parse a property from its json object.
    /// Enum and class values are resolved against `schema` when given.
    pub fn from_json<J: JsonNode>(json: &J, schema: Option<&PropertyTypes>) -> Result<Self> {
        let name: String = field(json, "name").ok_or_else(|| Error::StructureError{
            tag: "property".into(),
            msg: "Property is missing a name!".into(),
        })?;

        // Tiled uses 'propertyType' inside of class members
        let property_type = field(json, "propertytype")
            .or_else(|| field(json, "propertyType"))
            .unwrap_or_default();

        let type_name: String = field_or_default(json, "type");
        let mut property = Property {
            name,
            type_: PropertyType::from(type_name.as_str()),
            property_type,
            value: PropertyValue::Undefined,
        };
        if property.type_ == PropertyType::Undefined {
            tracing::debug!("Property '{}' has unknown type '{}'", property.name, type_name);
        }

        if let Some(value) = json.field("value") {
            property.set_value_by_type(value, schema);
        }
        Ok(property)
    }

    /// Replace the value by reading `json` according to the declared type.
    /// Int and string properties with a property type are promoted to enums.
    pub fn set_value_by_type<J: JsonNode>(&mut self, json: &J, schema: Option<&PropertyTypes>) {
        use PropertyType as T;
        use PropertyValue as V;

        let enum_definition = match self.type_ {
            T::Int | T::String | T::Enum => schema.and_then(|s| s.get_enum_definition(&self.property_type)).cloned(),
            _ => None,
        };
        if let Some(def) = enum_definition {
            let value = match (json.value::<u32>(), json.text()) {
                (Some(number), _) => EnumValue::from_u32(number, Some(def)),
                (_, Some(text)) => EnumValue::from_names(text, Some(def)),
                _ => EnumValue::from_u32(0, Some(def)),
            };
            self.type_ = T::Enum;
            self.value = V::Enum(value);
            return;
        }

        self.value = match self.type_ {
            T::Color => V::Color(json.value().unwrap_or_default()),
            T::File => V::File(json.value().unwrap_or_default()),
            T::Int => V::Int(json.value().unwrap_or_default()),
            T::Boolean => V::Bool(json.value().unwrap_or_default()),
            T::Float => V::Float(json.value().unwrap_or_default()),
            T::String => V::String(json.value().unwrap_or_default()),
            T::Class => {
                match schema.and_then(|s| s.get_class(&self.property_type)) {
                    Some(base) => {
                        let mut class = base.clone();
                        class.update_from_json(json, schema);
                        V::Class(class)
                    }
                    None => V::Undefined,
                }
            }
            T::Object => V::Object(ObjectReference(json.value().unwrap_or_default())),
            T::Enum | T::Undefined => json.text().map_or(V::Undefined, |t| V::String(t.into())),
        };
    }

    /// The value converted to `T`, None if the value has another type.
    pub fn get<T: FromPropertyValue>(&self) -> Option<T> {
        T::from_value(&self.value)
    }
}

/// Name to [Property] mapping. Iteration follows insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyCollection {
    properties: Vec<Property>
}

impl PropertyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `properties` array of any json object that supports properties.
    /// Malformed entries are skipped.
    pub(crate) fn from_json<J: JsonNode>(json: &J, schema: Option<&PropertyTypes>) -> Self {
        let mut collection = PropertyCollection::new();
        collection.add_from_json(json, schema);
        collection
    }

    /// Add all entries of the `properties` array of `json`,
    /// replacing existing properties with the same name.
    pub(crate) fn add_from_json<J: JsonNode>(&mut self, json: &J, schema: Option<&PropertyTypes>) {
        for item in array(json, "properties") {
            match Property::from_json(item, schema) {
                Ok(property) => { self.add(property); },
                Err(e) => tracing::warn!("Skipping property: {}", e),
            }
        }
    }

    /// Add a property, replacing any existing property of the same name.
    pub fn add(&mut self, property: Property) -> &mut Property {
        let index = match self.properties.iter().position(|p| p.name == property.name) {
            Some(index) => {
                self.properties[index] = property;
                index
            }
            None => {
                self.properties.push(property);
                self.properties.len() - 1
            }
        };
        &mut self.properties[index]
    }

    pub fn remove(&mut self, name: &str) {
        self.properties.retain(|p| p.name != name);
    }

    /// Set the value of an existing property. Does nothing if there is none with that name.
    pub fn set_value(&mut self, name: &str, value: PropertyValue) {
        if let Some(property) = self.get_property_mut(name) {
            property.value = value;
        }
    }

    /// Overwrite the property stored under `name`, or add it.
    pub fn set_property(&mut self, name: &str, mut property: Property) {
        property.name = name.into();
        self.add(property);
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.get_property(name).is_some()
    }

    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn get_property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// The value of the named property converted to `T`,
    /// or the default if it does not exist or has another type.
    pub fn get_value<T: FromPropertyValue + Default>(&self, name: &str) -> T {
        self.get_property(name).and_then(Property::get::<T>).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item=&Property> {
        self.properties.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item=&mut Property> {
        self.properties.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_properties() -> Result<()> {
        let json = json!({"properties": [
            {"name": "hp", "type": "int", "value": 12},
            {"name": "speed", "type": "float", "value": 1.5},
            {"name": "alive", "type": "bool", "value": true},
            {"name": "tint", "type": "color", "value": "#ffaa07ff"},
            {"name": "script", "type": "file", "value": "scripts/door.lua"},
            {"name": "target", "type": "object", "value": 7},
            {"name": "title", "type": "string", "value": "Door"},
        ]});

        let properties = PropertyCollection::from_json(&json, None);
        assert_eq!(properties.len(), 7);
        assert_eq!(properties.get_value::<i32>("hp"), 12);
        assert_eq!(properties.get_value::<f32>("speed"), 1.5);
        assert!(properties.get_value::<bool>("alive"));
        assert_eq!(properties.get_value::<Color>("tint"), "#ffaa07ff");
        assert_eq!(properties.get_value::<PathBuf>("script"), PathBuf::from("scripts/door.lua"));
        assert_eq!(properties.get_value::<ObjectReference>("target"), ObjectReference(7));
        assert_eq!(properties.get_value::<String>("title"), "Door");

        // missing or mismatching types give the default
        assert_eq!(properties.get_value::<i32>("title"), 0);
        assert_eq!(properties.get_value::<String>("nothing"), "");
        Ok(())
    }

    #[test]
    fn test_insertion_order_and_replace() {
        let mut properties = PropertyCollection::new();
        properties.add(Property::new("a", PropertyValue::Int(1), PropertyType::Int));
        properties.add(Property::new("b", PropertyValue::Int(2), PropertyType::Int));
        properties.add(Property::new("a", PropertyValue::Int(3), PropertyType::Int));

        let names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(properties.get_value::<i64>("a"), 3);

        properties.set_value("b", PropertyValue::Int(5));
        properties.set_value("c", PropertyValue::Int(5));
        assert_eq!(properties.get_value::<i64>("b"), 5);
        assert!(!properties.has_property("c"));

        properties.remove("a");
        assert_eq!(properties.len(), 1);
    }

    #[test]
    fn test_malformed_property_is_skipped() {
        let json = json!({"properties": [
            {"type": "int", "value": 12},
            {"name": "ok", "type": "int", "value": 1},
        ]});
        let properties = PropertyCollection::from_json(&json, None);
        assert_eq!(properties.len(), 1);
        assert!(properties.has_property("ok"));
    }

    #[test]
    fn test_unknown_type() -> Result<()> {
        let property = Property::from_json(&json!({"name": "x", "type": "vector", "value": "1,2"}), None)?;
        assert_eq!(property.type_, PropertyType::Undefined);
        assert_eq!(property.get::<String>().as_deref(), Some("1,2"));
        Ok(())
    }

    #[test]
    fn test_enum_without_project() -> Result<()> {
        let property = Property::from_json(
            &json!({"name": "e", "type": "int", "propertytype": "Flags", "value": 3}),
            None
        )?;
        // unresolved enums keep their plain value
        assert_eq!(property.type_, PropertyType::Int);
        assert_eq!(property.property_type, "Flags");
        assert_eq!(property.get::<i32>(), Some(3));
        assert!(property.get::<EnumValue>().is_none());
        Ok(())
    }
}
