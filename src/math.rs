//! Simple math primitives for pixel and tile coordinates.

use std::ops;

use crate::json::{JsonNode, field, field_or_default};

macro_rules! define_vector {
    ($name:ident $T:ty) => {
        #[derive(Debug, PartialEq, Copy, Clone, Default)]
        #[allow(non_camel_case_types)]
        pub struct $name {
            pub x: $T,
            pub y: $T,
        }

        impl $name {
            pub fn new(x: $T, y: $T) -> Self { Self { x, y } }

            /// Read a vector from two sibling fields of a json object.
            /// Returns None unless both fields are present.
            pub(crate) fn from_json<J: JsonNode>(json: &J, x_field: &str, y_field: &str) -> Option<Self> {
                Some(Self::new(field(json, x_field)?, field(json, y_field)?))
            }

            /// Like [Self::from_json], but missing fields are zero.
            pub(crate) fn from_json_or_default<J: JsonNode>(json: &J, x_field: &str, y_field: &str) -> Self {
                Self::new(field_or_default(json, x_field), field_or_default(json, y_field))
            }
        }

        impl_op_ex!{+ |a: &$name, b: &$name| -> $name { $name::new(a.x + b.x, a.y + b.y )}}
        impl_op_ex!{- |a: &$name, b: &$name| -> $name { $name::new(a.x - b.x, a.y - b.y )}}
        impl_op_ex!{* |a: &$name, b: &$name| -> $name { $name::new(a.x * b.x, a.y * b.y )}}
    };
}

// Define vector of integers
define_vector!{ivec2 i32}
impl_op_ex_commutative!{* |a: &ivec2, f: &i32| -> ivec2 { ivec2::new(a.x * f, a.y * f )}}
impl Eq for ivec2 {}

// Define vector of floats
define_vector!{fvec2 f32}
impl_op_ex_commutative!{* |a: &fvec2, f: &f32| -> fvec2 { fvec2::new(a.x * f, a.y * f )}}

impl From<ivec2> for fvec2 {
    fn from(v: ivec2) -> Self {
        fvec2::new(v.x as f32, v.y as f32)
    }
}

/// Struct that defines a rectangle given by its upper left corner and extends.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct Rect {
    pub upper_left: ivec2,
    pub size: ivec2,
}

impl Rect {
    pub fn new(upper_left: ivec2, size: ivec2) -> Self { Self { upper_left, size } }

    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(ivec2::new(x, y), ivec2::new(width, height))
    }
}
