use crate::hex::HexColor;

/// 8-bit RGBA in sRGB. This is the pixel format of the input images.
pub type RGBA = rgb::RGBA<u8>;

/// 8-bit RGB of a quantized color
pub type RGB = rgb::RGB<u8>;

/// 256 levels per channel, i.e. no posterization
pub const MAX_PRECISION: u16 = 256;

/// Upper limit of [`Attributes::palette()`][crate::Attributes::palette] size
pub const MAX_PALETTE_COLORS: usize = 256;

/// Pixels with alpha below this are treated as transparent and not counted
pub const DEFAULT_MIN_OPACITY: u8 = 128;

/// Maps every channel value to the lower edge of its bucket.
///
/// With `precision` levels the bucket of `v` is `v * precision / 256`, and its representative
/// is the floor of the bucket's lower bound `level * 256 / precision`. For powers of two that's
/// exactly `floor(v / step) * step` with `step = 256 / precision`.
#[must_use]
pub(crate) fn posterize_lut(precision: u16) -> [u8; 256] {
    debug_assert!((1..=MAX_PRECISION).contains(&precision));
    let precision = u32::from(precision);
    let mut lut = [0; 256];
    for (v, out) in (0u32..).zip(lut.iter_mut()) {
        let level = v * precision / 256;
        *out = (level * 256 / precision) as u8;
    }
    lut
}

/// Histogram key: the quantized color packed as `0xRRGGBB`.
///
/// Numeric order of keys is the same as lexicographic order of their hex strings.
#[inline(always)]
pub(crate) fn pack(rgb: RGB) -> u32 {
    u32::from(rgb.r) << 16 | u32::from(rgb.g) << 8 | u32::from(rgb.b)
}

#[inline(always)]
pub(crate) fn unpack(key: u32) -> RGB {
    let [_, r, g, b] = key.to_be_bytes();
    RGB::new(r, g, b)
}

/// One of the dominant colors of an image
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ColorCount {
    /// `#rrggbb`, lowercase
    pub color: String,
    /// The channels encoded by `color`
    #[cfg_attr(feature = "serde", serde(serialize_with = "rgb_triple"))]
    pub rgb: RGB,
    /// Number of opaque pixels that fell into this color's bucket
    pub count: u64,
    /// Share of all opaque pixels, 0-100, rounded to 2 decimal places
    pub percentage: f64,
}

impl ColorCount {
    pub(crate) fn new(key: u32, count: u64, total: u64) -> Self {
        Self::from_rgb(unpack(key), count, total)
    }

    pub(crate) fn from_rgb(rgb: RGB, count: u64, total: u64) -> Self {
        debug_assert!(count > 0 && count <= total);
        let color = HexColor::from(rgb).to_string();
        debug_assert_eq!(Ok(HexColor::from(rgb)), color.parse());
        Self { color, rgb, count, percentage: percentage(count, total) }
    }

    /// The color as a parsed hex color
    #[inline]
    #[must_use]
    pub fn hex(&self) -> HexColor {
        HexColor::from(self.rgb)
    }
}

/// `count / total * 100`, with 2 decimal places
#[inline]
pub(crate) fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.;
    }
    let pct = count as f64 / total as f64 * 100.;
    (pct * 100.).round() / 100.
}

#[cfg(feature = "serde")]
fn rgb_triple<S: serde::Serializer>(rgb: &RGB, serializer: S) -> Result<S::Ok, S::Error> {
    serde::Serialize::serialize(&[rgb.r, rgb.g, rgb.b], serializer)
}

#[test]
fn lut_powers_of_two() {
    let lut = posterize_lut(32);
    assert_eq!(0, lut[0]);
    assert_eq!(0, lut[7]);
    assert_eq!(8, lut[8]);
    assert_eq!(248, lut[255]);

    let identity = posterize_lut(MAX_PRECISION);
    assert!(identity.iter().enumerate().all(|(i, &v)| i == v as usize));

    let one = posterize_lut(1);
    assert!(one.iter().all(|&v| v == 0));

    for precision in [2, 4, 8, 16, 64, 128] {
        let step = 256 / precision;
        let lut = posterize_lut(precision as u16);
        for v in 0..=255usize {
            assert_eq!(v / step * step, lut[v] as usize);
        }
    }
}

#[test]
fn lut_other_precisions() {
    for precision in 1..=MAX_PRECISION {
        let lut = posterize_lut(precision);
        let mut levels = lut.to_vec();
        levels.dedup();
        assert_eq!(precision as usize, levels.len());
        assert!(lut.windows(2).all(|w| w[0] <= w[1]));
        assert!(lut.iter().enumerate().all(|(v, &q)| q as usize <= v));
    }
    let lut = posterize_lut(3);
    assert_eq!([0, 85, 170], [lut[0], lut[100], lut[255]]);
}

#[test]
fn pack_order_matches_hex_order() {
    let a = RGB::new(0x0f, 0xff, 0xff);
    let b = RGB::new(0x10, 0x00, 0x00);
    assert!(pack(a) < pack(b));
    assert!(HexColor::from(a).to_string() < HexColor::from(b).to_string());
    assert_eq!(a, unpack(pack(a)));
}

#[test]
fn percentages() {
    assert_eq!(100., percentage(2, 2));
    assert_eq!(33.33, percentage(1, 3));
    assert_eq!(66.67, percentage(2, 3));
    assert_eq!(0., percentage(0, 0));
}

#[test]
#[cfg(feature = "serde")]
fn serializes_rgb_as_triple() {
    let json = serde_json::to_string(&[ColorCount::new(0xf80000, 2, 2)]).unwrap();
    assert_eq!(r##"[{"color":"#f80000","rgb":[248,0,0],"count":2,"percentage":100.0}]"##, json);
}
