//! Custom enum types defined in a Tiled project.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::json::{JsonNode, array, field, field_or_default};

/// How values of an enum are written to the map file.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum EnumStorageType {
    #[default]
    Unspecified,
    Int,
    String,
}

/// Schema of an enum from the `propertyTypes` of a project.
///
/// Value 0 is always called `None`. Plain enums number their values
/// 0, 1, 2, ..., flag enums use the bits 1, 2, 4, ...
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumDefinition {
    pub id: u32,
    pub name: String,
    pub storage_type: EnumStorageType,
    pub values_as_flags: bool,
    values: BTreeMap<u32, String>,
    max_value: u32,
}

impl EnumDefinition {
    pub fn from_json<J: JsonNode>(json: &J) -> Self {
        let storage: String = field_or_default(json, "storageType");
        let mut definition = EnumDefinition {
            id: field_or_default(json, "id"),
            name: field_or_default(json, "name"),
            storage_type: match storage.as_str() {
                "int" => EnumStorageType::Int,
                "string" => EnumStorageType::String,
                _ => EnumStorageType::Unspecified,
            },
            values_as_flags: field_or_default(json, "valuesAsFlags"),
            values: BTreeMap::new(),
            max_value: 0,
        };

        if json.field("values").map_or(false, |v| v.is_array()) {
            definition.values.insert(0, "None".into());
            let mut counter: u32 = if definition.values_as_flags { 1 } else { 0 };
            for item in array(json, "values") {
                definition.values.insert(counter, item.value().unwrap_or_default());
                counter = if definition.values_as_flags { counter << 1 } else { counter + 1 };
            }
            definition.max_value = counter;
        }
        definition
    }

    /// Numeric value of the named entry, 0 if the name is unknown.
    pub fn value_of(&self, name: &str) -> u32 {
        self.values.iter().find(|(_, n)| *n == name).map_or(0, |(v, _)| *v)
    }

    /// Name of the entry with exactly the value `num`.
    pub fn name_of(&self, num: u32) -> Option<&str> {
        self.values.get(&num).map(String::as_str)
    }

    /// Names of all entries contained in `num`.
    /// For flag enums these are all set bits, otherwise the single matching entry.
    pub fn names_of(&self, num: u32) -> Vec<&str> {
        if self.values_as_flags {
            self.values.iter()
                .filter(|(flag, _)| **flag != 0 && num & **flag == **flag)
                .map(|(_, name)| name.as_str())
                .collect()
        } else {
            self.name_of(num).into_iter().collect()
        }
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.values.values().any(|n| n == name)
    }

    pub fn contains_value(&self, num: u32) -> bool {
        self.values.contains_key(&num)
    }

    /// The value following the last defined entry.
    pub fn max_value(&self) -> u32 {
        self.max_value
    }
}

/// Instance of an enum, stored as number together with its definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumValue {
    value: u32,
    definition: Option<Rc<EnumDefinition>>,
}

impl EnumValue {
    pub fn from_u32(value: u32, definition: Option<Rc<EnumDefinition>>) -> Self {
        Self { value, definition }
    }

    /// Build a value from a comma separated list of entry names.
    pub fn from_names(names: &str, definition: Option<Rc<EnumDefinition>>) -> Self {
        let value = match &definition {
            Some(def) => names.split(',')
                .filter(|n| !n.is_empty())
                .fold(0, |acc, n| acc | def.value_of(n.trim())),
            None => 0,
        };
        Self { value, definition }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn definition(&self) -> Option<&EnumDefinition> {
        self.definition.as_deref()
    }

    fn is_flags(&self) -> bool {
        self.definition.as_ref().map_or(false, |d| d.values_as_flags)
    }

    /// Whether all bits of `flags` are set. Plain enums compare for equality instead.
    pub fn has_flag_value(&self, flags: u32) -> bool {
        if self.is_flags() {
            return self.value & flags == flags;
        }
        self.value == flags
    }

    /// Whether any bit of `flags` is set. Plain enums compare for equality instead.
    pub fn has_any_flag_value(&self, flags: u32) -> bool {
        if self.is_flags() {
            return self.value & flags != 0;
        }
        self.value == flags
    }

    pub fn has_flag<T: Into<u32>>(&self, flags: T) -> bool {
        self.has_flag_value(flags.into())
    }

    pub fn has_any_flag<T: Into<u32>>(&self, flags: T) -> bool {
        self.has_any_flag_value(flags.into())
    }

    /// Name of a single valued enum, empty if there is none.
    pub fn value_name(&self) -> &str {
        self.definition.as_ref().and_then(|d| d.name_of(self.value)).unwrap_or_default()
    }

    pub fn value_names(&self) -> Vec<&str> {
        self.definition.as_ref().map(|d| d.names_of(self.value)).unwrap_or_default()
    }

    pub fn contains_value_name(&self, name: &str) -> bool {
        match &self.definition {
            Some(def) if def.values_as_flags => def.names_of(self.value).contains(&name),
            Some(def) => def.contains_name(name) && def.value_of(name) == self.value,
            None => false,
        }
    }
}
