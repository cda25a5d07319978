//! The open options record accepted by every drawing operation.

/// An RGBA color, straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Whether the color paints nothing.
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Parse a CSS-style color value.
    ///
    /// Accepts `#rgb`, `#rrggbb`, `rgb(r,g,b)`, `rgba(r,g,b,a)`, the named
    /// colors generators actually emit, and `none`/`transparent`. Returns
    /// `None` for anything unrecognized; callers fall back to their
    /// default paint rather than faulting.
    pub fn parse(s: &str) -> Option<Color> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        if let Some(body) = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
        {
            return Self::parse_rgb_fn(body.strip_suffix(')')?);
        }
        match s.to_ascii_lowercase().as_str() {
            "none" | "transparent" => Some(Color::TRANSPARENT),
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "red" => Some(Color::rgb(255, 0, 0)),
            "green" => Some(Color::rgb(0, 128, 0)),
            "blue" => Some(Color::rgb(0, 0, 255)),
            "yellow" => Some(Color::rgb(255, 255, 0)),
            "orange" => Some(Color::rgb(255, 165, 0)),
            "purple" => Some(Color::rgb(128, 0, 128)),
            "pink" => Some(Color::rgb(255, 192, 203)),
            "brown" => Some(Color::rgb(165, 42, 42)),
            "gray" | "grey" => Some(Color::rgb(128, 128, 128)),
            "lightgray" | "lightgrey" => Some(Color::rgb(211, 211, 211)),
            "darkgray" | "darkgrey" => Some(Color::rgb(169, 169, 169)),
            "cyan" | "aqua" => Some(Color::rgb(0, 255, 255)),
            "magenta" | "fuchsia" => Some(Color::rgb(255, 0, 255)),
            "lime" => Some(Color::rgb(0, 255, 0)),
            "navy" => Some(Color::rgb(0, 0, 128)),
            "teal" => Some(Color::rgb(0, 128, 128)),
            "olive" => Some(Color::rgb(128, 128, 0)),
            "maroon" => Some(Color::rgb(128, 0, 0)),
            "silver" => Some(Color::rgb(192, 192, 192)),
            "gold" => Some(Color::rgb(255, 215, 0)),
            "skyblue" => Some(Color::rgb(135, 206, 235)),
            "lightblue" => Some(Color::rgb(173, 216, 230)),
            "salmon" => Some(Color::rgb(250, 128, 114)),
            "tan" => Some(Color::rgb(210, 180, 140)),
            "beige" => Some(Color::rgb(245, 245, 220)),
            "ivory" => Some(Color::rgb(255, 255, 240)),
            "khaki" => Some(Color::rgb(240, 230, 140)),
            "coral" => Some(Color::rgb(255, 127, 80)),
            "tomato" => Some(Color::rgb(255, 99, 71)),
            "crimson" => Some(Color::rgb(220, 20, 60)),
            "indigo" => Some(Color::rgb(75, 0, 130)),
            "violet" => Some(Color::rgb(238, 130, 238)),
            "lavender" => Some(Color::rgb(230, 230, 250)),
            "turquoise" => Some(Color::rgb(64, 224, 208)),
            "forestgreen" => Some(Color::rgb(34, 139, 34)),
            "darkgreen" => Some(Color::rgb(0, 100, 0)),
            "lightgreen" => Some(Color::rgb(144, 238, 144)),
            "darkblue" => Some(Color::rgb(0, 0, 139)),
            "royalblue" => Some(Color::rgb(65, 105, 225)),
            "steelblue" => Some(Color::rgb(70, 130, 180)),
            "saddlebrown" => Some(Color::rgb(139, 69, 19)),
            "sienna" => Some(Color::rgb(160, 82, 45)),
            "chocolate" => Some(Color::rgb(210, 105, 30)),
            "hotpink" => Some(Color::rgb(255, 105, 180)),
            "deeppink" => Some(Color::rgb(255, 20, 147)),
            "darkred" => Some(Color::rgb(139, 0, 0)),
            "wheat" => Some(Color::rgb(245, 222, 179)),
            "snow" => Some(Color::rgb(255, 250, 250)),
            _ => None,
        }
    }

    fn parse_hex(hex: &str) -> Option<Color> {
        match hex.len() {
            3 => {
                let v = u16::from_str_radix(hex, 16).ok()?;
                let r = ((v >> 8) & 0xf) as u8;
                let g = ((v >> 4) & 0xf) as u8;
                let b = (v & 0xf) as u8;
                Some(Color::rgb(r << 4 | r, g << 4 | g, b << 4 | b))
            }
            6 => {
                let v = u32::from_str_radix(hex, 16).ok()?;
                Some(Color::rgb(
                    ((v >> 16) & 0xff) as u8,
                    ((v >> 8) & 0xff) as u8,
                    (v & 0xff) as u8,
                ))
            }
            _ => None,
        }
    }

    fn parse_rgb_fn(body: &str) -> Option<Color> {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |s: &str| -> Option<u8> {
            let v: f64 = s.parse().ok()?;
            Some(v.clamp(0.0, 255.0).round() as u8)
        };
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = if parts.len() == 4 {
            let v: f64 = parts[3].parse().ok()?;
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        } else {
            255
        };
        Some(Color { r, g, b, a })
    }
}

/// Options accepted by every drawing operation.
///
/// This is an open record: programs may pass any keys, and only the ones
/// below are recognized. Defaults when a key is absent: stroke black,
/// fill none, roughness 1, stroke width 1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawOptions {
    /// Stroke color. `None` means the default (black).
    pub stroke: Option<Color>,

    /// Fill color. `None` means no fill.
    pub fill: Option<Color>,

    /// Sketchiness of the stroke. 0 disables jitter.
    pub roughness: Option<f64>,

    /// Stroke width in canvas units.
    pub stroke_width: Option<f64>,
}

impl DrawOptions {
    /// Effective stroke paint, `None` when the stroke is explicitly `'none'`.
    pub fn stroke_paint(&self) -> Option<Color> {
        match self.stroke {
            Some(c) if c.is_transparent() => None,
            Some(c) => Some(c),
            None => Some(Color::BLACK),
        }
    }

    /// Effective fill paint, if any.
    pub fn fill_paint(&self) -> Option<Color> {
        self.fill.filter(|c| !c.is_transparent())
    }

    /// Effective roughness.
    pub fn roughness(&self) -> f64 {
        self.roughness.unwrap_or(1.0).max(0.0)
    }

    /// Effective stroke width.
    pub fn stroke_width(&self) -> f64 {
        self.stroke_width.unwrap_or(1.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex() {
        assert_eq!(Color::parse("#ff0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("#f00"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("#1a2b3c"), Some(Color::rgb(0x1a, 0x2b, 0x3c)));
    }

    #[test]
    fn parses_rgb_functions() {
        assert_eq!(Color::parse("rgb(1, 2, 3)"), Some(Color::rgb(1, 2, 3)));
        assert_eq!(
            Color::parse("rgba(255,0,0,0.2)"),
            Some(Color {
                r: 255,
                g: 0,
                b: 0,
                a: 51
            })
        );
    }

    #[test]
    fn parses_names_case_insensitive() {
        assert_eq!(Color::parse("Red"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("SKYBLUE"), Some(Color::rgb(135, 206, 235)));
    }

    #[test]
    fn none_is_transparent() {
        assert!(Color::parse("none").unwrap().is_transparent());
        assert!(Color::parse("transparent").unwrap().is_transparent());
    }

    #[test]
    fn unknown_is_rejected() {
        assert_eq!(Color::parse("blurple"), None);
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("rgb(1,2)"), None);
    }

    #[test]
    fn default_paints() {
        let opts = DrawOptions::default();
        assert_eq!(opts.stroke_paint(), Some(Color::BLACK));
        assert_eq!(opts.fill_paint(), None);

        let none_stroke = DrawOptions {
            stroke: Some(Color::TRANSPARENT),
            ..Default::default()
        };
        assert_eq!(none_stroke.stroke_paint(), None);
    }
}
