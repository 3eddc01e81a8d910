use crate::error::Error;
use crate::pal::RGB;
use arrayvec::ArrayVec;
use std::fmt;
use std::str::FromStr;

/// A color written as `#rgb`, `#rrggbb` or `#rrggbbaa`
///
/// This is the canonical key of a color bucket. Formatting without alpha always produces
/// the 7-character lowercase form (`#f80000`), and parsing that string gives back the same color.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct HexColor {
    /// The color channels
    pub rgb: RGB,
    /// Present only if the string had 8 hex digits
    pub alpha: Option<u8>,
}

impl HexColor {
    /// Opaque color, formatted without alpha
    #[inline]
    #[must_use]
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { rgb: RGB::new(r, g, b), alpha: None }
    }
}

impl From<RGB> for HexColor {
    #[inline]
    fn from(rgb: RGB) -> Self {
        Self { rgb, alpha: None }
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let RGB { r, g, b } = self.rgb;
        write!(f, "#{r:02x}{g:02x}{b:02x}")?;
        if let Some(a) = self.alpha {
            write!(f, "{a:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for HexColor {
    type Err = Error;

    /// Leading `#` is optional. Short form `#abc` means `#aabbcc`.
    fn from_str(s: &str) -> Result<Self, Error> {
        let digits = s.strip_prefix('#').unwrap_or(s).as_bytes();
        let mut nibbles = ArrayVec::<u8, 8>::new();
        for &d in digits {
            let n = (d as char).to_digit(16).ok_or(Error::InvalidColor)?;
            nibbles.try_push(n as u8).map_err(|_| Error::InvalidColor)?;
        }

        let mut channels = ArrayVec::<u8, 4>::new();
        match nibbles.len() {
            3 => channels.extend(nibbles.iter().map(|&n| n << 4 | n)),
            6 | 8 => channels.extend(nibbles.chunks_exact(2).map(|pair| pair[0] << 4 | pair[1])),
            _ => return Err(Error::InvalidColor),
        }

        Ok(Self {
            rgb: RGB::new(channels[0], channels[1], channels[2]),
            alpha: channels.get(3).copied(),
        })
    }
}

#[test]
fn formats_lowercase_padded() {
    assert_eq!("#f80000", HexColor::new(248, 0, 0).to_string());
    assert_eq!("#000a0b", HexColor::new(0, 10, 11).to_string());
    let with_alpha = HexColor { rgb: RGB::new(1, 2, 3), alpha: Some(0x80) };
    assert_eq!("#01020380", with_alpha.to_string());
}

#[test]
fn parses_all_lengths() {
    assert_eq!(HexColor::new(0xf8, 0, 0), "#f80000".parse().unwrap());
    assert_eq!(HexColor::new(0xf8, 0, 0), "F80000".parse().unwrap());
    assert_eq!(HexColor::new(0xaa, 0xbb, 0xcc), "#abc".parse().unwrap());

    let c: HexColor = "#11223344".parse().unwrap();
    assert_eq!(RGB::new(0x11, 0x22, 0x33), c.rgb);
    assert_eq!(Some(0x44), c.alpha);
}

#[test]
fn rejects_garbage() {
    for bad in ["", "#", "#ab", "#abcd", "#abcde", "#1234567", "#123456789", "#ggg", "+f+f+f", "#12 456", "#ünï"] {
        assert_eq!(Err(Error::InvalidColor), bad.parse::<HexColor>(), "{bad}");
    }
}

#[test]
fn round_trip() {
    for v in (0..=255u8).step_by(7) {
        let c = HexColor::new(v, 255 - v, v / 3);
        assert_eq!(c, c.to_string().parse().unwrap());
    }
}
