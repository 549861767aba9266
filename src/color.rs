use crate::{Error, Result};
use crate::json::{FromJson, JsonNode};

/// An 8 bit RGB color with alpha value.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Color(u32);

impl Color {
    pub fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color(
              (a as u32) << 24
            | (r as u32) << 16
            | (g as u32) << 8
            | (b as u32) << 0
        )
    }

    pub fn alpha(&self) -> u8 { ((self.0 >> 24) & 0xFF) as u8 }
    pub fn red(&self)   -> u8 { ((self.0 >> 16) & 0xFF) as u8 }
    pub fn green(&self) -> u8 { ((self.0 >>  8) & 0xFF) as u8 }
    pub fn blue(&self)  -> u8 { ((self.0 >>  0) & 0xFF) as u8 }

    pub fn to_u32(&self) -> u32 { self.0 }

    /// The channels of this color in the interval [0, 1].
    pub fn as_float(&self) -> FloatColor {
        FloatColor {
            r: self.red() as f32 / 255.,
            g: self.green() as f32 / 255.,
            b: self.blue() as f32 / 255.,
            a: self.alpha() as f32 / 255.,
        }
    }
}

/// Opaque black
impl Default for Color {
    fn default() -> Self {
        Color::from_argb(255, 0, 0, 0)
    }
}

impl std::str::FromStr for Color {
    type Err = Error;

    /// Parse a color from a hex string, either `#AARRGGBB` or `#RRGGBB`.
    ///
    /// ```
    /// let red: tileson::Color = "#FF0000".parse()?;
    /// assert_eq!(red.red(), 255);
    /// assert_eq!(red.blue(), 0);
    /// assert_eq!(red.alpha(), 255);
    /// # Ok::<(),tileson::Error>(())
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        use Error::*;
        let make_error = || ParseError(format!("Invalid color string, expected #AARRGGBB, got '{}'", s).into());

        let s = s
            .strip_prefix('#')
            .ok_or_else(make_error)?;

        match s.len() {
            8 => {
                let [a, r, g, b] = u32::from_str_radix(s, 16)?.to_be_bytes();
                Ok(Color::from_argb(a, r, g, b))
            },
            6 => {
                let [_, r, g, b] = u32::from_str_radix(s, 16)?.to_be_bytes();
                Ok(Color::from_argb(255, r, g, b))
            },
            _ => Err(make_error())
        }
    }
}

impl PartialEq<str> for Color {
    fn eq(&self, other: &str) -> bool {
        other.parse::<Color>().map_or(false, |c| c == *self)
    }
}

impl PartialEq<&str> for Color {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl FromJson for Color {
    fn from_json<J: JsonNode>(node: &J) -> Option<Self> {
        let text = node.text()?;
        match text.parse() {
            Ok(color) => Some(color),
            Err(e) => {
                tracing::warn!("Ignoring color value: {}", e);
                None
            }
        }
    }
}

/// A color with float channels, see [Color::as_float].
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct FloatColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_color_parsing() -> Result<()> {
        assert_eq!(Color::from_argb(255,255,255,255), "#FFFFFFFF".parse::<Color>()?);
        assert_eq!(Color::from_argb(255,  0,255,255),   "#00FFFF".parse::<Color>()?);

        let color: Color = "#ffaa07ff".parse()?;
        assert_eq!((color.red(), color.green(), color.blue(), color.alpha()), (170, 7, 255, 255));
        assert_eq!(color, "#ffaa07ff");
        assert!(color != "#ffaa07fe");

        // missing hashtag (#)
        assert!("00FFFF".parse::<Color>().is_err());

        // not enough components
        assert!("#FFFF".parse::<Color>().is_err());

        // too many components
        assert!("#FF00FF00FF".parse::<Color>().is_err());

        // invalid hex
        assert!("#FQ00FF".parse::<Color>().is_err());
        Ok(())
    }

    #[test]
    fn test_float_color() -> Result<()> {
        let color: Color = "#ff336699".parse()?;
        let float = color.as_float();
        assert_eq!(float.a, 1.);
        assert!((float.r - 0.2).abs() < 1e-6);
        assert!((float.g - 0.4).abs() < 1e-6);
        assert!((float.b - 0.6).abs() < 1e-6);
        assert_eq!(Color::default().as_float(), FloatColor{r: 0., g: 0., b: 0., a: 1.});
        Ok(())
    }
}
