//! Custom class types defined in a Tiled project, and their lazy lookup
//! from map elements that carry a `class` name.

use std::cell::OnceCell;
use std::rc::Weak;

use crate::json::{JsonNode, array, field_or_default};
use crate::project::{Project, PropertyTypes};
use crate::property::{FromPropertyValue, Property, PropertyCollection};

/// A class from the `propertyTypes` of a project.
/// The members hold the default values of the class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TiledClass {
    pub id: u32,
    pub name: String,
    pub type_: String,
    pub members: PropertyCollection,
}

impl TiledClass {
    /// Parse a class definition. Member types refering to other enums or
    /// classes are resolved against `schema`.
    pub fn from_json<J: JsonNode>(json: &J, schema: Option<&PropertyTypes>) -> Self {
        let mut members = PropertyCollection::new();
        for item in array(json, "members") {
            match Property::from_json(item, schema) {
                Ok(member) => { members.add(member); },
                Err(e) => tracing::warn!("Skipping class member: {}", e),
            }
        }

        Self {
            id: field_or_default(json, "id"),
            name: field_or_default(json, "name"),
            type_: field_or_default(json, "type"),
            members,
        }
    }

    pub fn get_member(&self, name: &str) -> Option<&Property> {
        self.members.get_property(name)
    }

    pub fn get<T: FromPropertyValue + Default>(&self, name: &str) -> T {
        self.members.get_value(name)
    }

    /// Override members with the values of a json object,
    /// e.g. the `value` of a class typed property.
    pub fn update_from_json<J: JsonNode>(&mut self, json: &J, schema: Option<&PropertyTypes>) {
        for member in self.members.iter_mut() {
            if let Some(value) = json.field(&member.name) {
                member.set_value_by_type(value, schema);
            }
        }
    }

    /// Override members with properties of the same name and type.
    pub fn update_from_properties(&mut self, properties: &PropertyCollection) {
        for member in self.members.iter_mut() {
            match properties.get_property(&member.name) {
                Some(property) if property.type_ == member.type_ => *member = property.clone(),
                _ => {}
            }
        }
    }
}

/// Memoized lookup of the [TiledClass] named by an element's `class` field.
///
/// The class is cloned from the project on the first successful access,
/// overlaid with the element's properties and cached from then on. The cache is not thread-safe.
#[derive(Debug, Clone, Default)]
pub(crate) struct LazyClass {
    project: Weak<Project>,
    class: OnceCell<TiledClass>,
}

impl LazyClass {
    pub(crate) fn new(project: Weak<Project>) -> Self {
        Self { project, class: OnceCell::new() }
    }

    /// A miss is not remembered, the next call looks the class up again.
    pub(crate) fn get(&self, name: &str, properties: &PropertyCollection) -> Option<&TiledClass> {
        if let Some(class) = self.class.get() {
            return Some(class);
        }
        let project = self.project.upgrade()?;
        let mut class = project.get_class(name)?.clone();
        class.update_from_properties(properties);
        Some(self.class.get_or_init(|| class))
    }

    pub(crate) fn project(&self) -> &Weak<Project> {
        &self.project
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::property::{PropertyType, PropertyValue};
    use serde_json::json;
    use std::path::Path;
    use std::rc::Rc;

    fn class_json() -> serde_json::Value {
        json!({
            "id": 1,
            "name": "Monster",
            "type": "class",
            "members": [
                {"name": "hp", "type": "int", "value": 10},
                {"name": "name", "type": "string", "value": "Slime"},
                {"name": "speed", "type": "float", "value": 0.5}
            ]
        })
    }

    #[test]
    fn test_parse_class() {
        let class = TiledClass::from_json(&class_json(), None);
        assert_eq!(class.name, "Monster");
        assert_eq!(class.members.len(), 3);
        assert_eq!(class.get::<i32>("hp"), 10);
        assert_eq!(class.get::<String>("name"), "Slime");
    }

    #[test]
    fn test_update_from_json() {
        let mut class = TiledClass::from_json(&class_json(), None);
        class.update_from_json(&json!({"hp": 99, "unknown": true}), None);
        assert_eq!(class.get::<i32>("hp"), 99);
        assert_eq!(class.get::<String>("name"), "Slime");
        assert!(class.get_member("unknown").is_none());
    }

    #[test]
    fn test_update_from_properties_matches_type() {
        let mut class = TiledClass::from_json(&class_json(), None);
        let mut properties = PropertyCollection::new();
        properties.add(Property::new("hp", PropertyValue::Int(50), PropertyType::Int));
        properties.add(Property::new("name", PropertyValue::Int(1), PropertyType::Int));

        class.update_from_properties(&properties);
        assert_eq!(class.get::<i32>("hp"), 50);
        assert_eq!(class.get::<String>("name"), "Slime");
    }

    #[test]
    fn test_lazy_class_without_project() {
        let lazy = LazyClass::default();
        assert!(lazy.get("Monster", &PropertyCollection::new()).is_none());
        assert!(lazy.get("Monster", &PropertyCollection::new()).is_none());
    }

    #[test]
    fn test_lazy_class_lookup_miss_is_not_cached() {
        let project = Rc::new(Project::from_json(
            &json!({"propertyTypes": [class_json()]}),
            Path::new("game.tiled-project"),
        ));
        let lazy = LazyClass::new(Rc::downgrade(&project));
        let mut properties = PropertyCollection::new();
        properties.add(Property::new("hp", PropertyValue::Int(3), PropertyType::Int));

        assert!(lazy.get("Goblin", &properties).is_none());

        let first = lazy.get("Monster", &properties).expect("Monster class");
        assert_eq!(first.get::<i32>("hp"), 3);
        let second = lazy.get("Monster", &properties).expect("cached class");
        assert!(std::ptr::eq(first, second));
    }
}
