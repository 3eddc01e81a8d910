//! Finds the dominant colors of an RGBA image.
//!
//! Every channel of every opaque pixel is posterized to a fixed number of levels, the resulting
//! colors are counted, and the most frequent ones are returned with their share of the image.
//! This is a lot simpler than median cut or k-means, but it's fast, exact, and deterministic,
//! which is what a color-breakdown view needs.
//!
//! ```rust,ignore
//! let pixels: &[u8] = canvas_image_data();
//! for c in colorcount::quantize(pixels, width, height, 20, 32)? {
//!     println!("{} {:>6.2}%", c.color, c.percentage);
//! }
//! ```
//!
//! For more control, configure [`Attributes`], or collect colors of several images in a [`Histogram`].
//! [`Attributes::palette`] groups similar shades with median cut instead of listing them separately.
//! [`Treemap`] lays the result out as rectangles sized by frequency.
#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

mod attr;
mod error;
mod hex;
mod hist;
mod image;
mod labels;
mod mediancut;
mod pal;
mod quant;
mod treemap;

#[cfg(not(feature = "threads"))]
mod rayoff;

pub use attr::Attributes;
pub use error::Error;
pub use hex::HexColor;
pub use hist::{Histogram, HistogramEntry};
pub use image::Image;
pub use labels::LabelColors;
pub use pal::{ColorCount, DEFAULT_MIN_OPACITY, MAX_PALETTE_COLORS, MAX_PRECISION, RGB, RGBA};
pub use quant::QuantizationResult;
pub use treemap::{Treemap, TreemapTile, GOLDEN_RATIO};

/// Use [`Attributes`] instead
#[must_use]
pub fn new() -> Attributes {
    Attributes::new()
}

/// Most frequent colors of a flat `[r, g, b, a, …]` buffer, the whole pipeline in one call.
///
/// * `max_colors`: at most this many colors are returned; 0 returns none.
/// * `color_precision`: levels per channel, 1-256. 256 counts exact colors, 32 merges channel values in steps of 8.
///
/// Pixels with alpha < 128 are ignored, and percentages are relative to the remaining pixels.
/// Trailing bytes that don't make a whole pixel are ignored, and so are pixels past `width * height`.
///
/// Fails only if `color_precision` is out of range, or memory runs out.
pub fn quantize(pixels: &[u8], width: usize, height: usize, max_colors: usize, color_precision: u16) -> Result<Vec<ColorCount>, Error> {
    let mut attr = Attributes::new();
    attr.set_max_colors(max_colors)?;
    attr.set_color_precision(color_precision)?;
    let image = attr.new_image_bytes(pixels, width, height);
    Ok(attr.quantize(&image)?.into_colors())
}

#[cfg(test)]
fn distinct_colors(pixels: &[u8], width: usize, height: usize, precision: u16) -> usize {
    let mut attr = Attributes::new();
    attr.set_color_precision(precision).unwrap();
    attr.quantize(&attr.new_image_bytes(pixels, width, height)).unwrap().distinct_colors()
}

#[cfg(test)]
fn noise(len: usize, mut seed: u32) -> Vec<u8> {
    (0..len).map(|_| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        seed as u8
    }).collect()
}

#[test]
fn two_red_pixels() {
    let res = quantize(&[255, 0, 0, 255, 255, 0, 0, 255], 2, 1, 20, 32).unwrap();
    assert_eq!(vec![ColorCount {
        color: "#f80000".into(),
        rgb: RGB::new(248, 0, 0),
        count: 2,
        percentage: 100.,
    }], res);
}

#[test]
fn transparent_pixel_not_in_denominator() {
    let res = quantize(&[255, 0, 0, 255, 0, 0, 0, 0], 2, 1, 20, 32).unwrap();
    assert_eq!(1, res.len());
    assert_eq!(1, res[0].count);
    assert_eq!(100., res[0].percentage);
}

#[test]
fn all_transparent() {
    let mut px = noise(10 * 10 * 4, 7);
    for a in px.iter_mut().skip(3).step_by(4) {
        *a %= 128;
    }
    assert!(quantize(&px, 10, 10, 20, 32).unwrap().is_empty());
    assert!(quantize(&[], 0, 0, 20, 32).unwrap().is_empty());
    assert!(quantize(&px, 0, 10, 20, 32).unwrap().is_empty());
}

#[test]
fn bad_precision() {
    assert_eq!(Err(Error::ValueOutOfRange), quantize(&[0; 4], 1, 1, 20, 0));
    assert_eq!(Err(Error::ValueOutOfRange), quantize(&[0; 4], 1, 1, 20, 257));
}

#[test]
fn partial_pixel_ignored() {
    let res = quantize(&[0, 0, 255, 255, 0, 0, 255], 2, 1, 20, 256).unwrap();
    assert_eq!(1, res.len());
    assert_eq!(("#0000ff", 1), (res[0].color.as_str(), res[0].count));
}

#[test]
fn truncation_law() {
    let px = noise(64 * 64 * 4, 99);
    let all = quantize(&px, 64, 64, usize::MAX, 8).unwrap();
    assert!(all.len() > 40);
    for k in [0, 1, 2, 5, 20, 40, all.len(), all.len() + 10] {
        let res = quantize(&px, 64, 64, k, 8).unwrap();
        assert!(res.len() <= k);
        assert_eq!(k.min(all.len()), res.len());
        assert_eq!(&all[..res.len()], &res[..]);
    }
}

#[test]
fn percentage_sum_bound() {
    let px = noise(50 * 40 * 4, 3);
    for precision in [1, 2, 4, 8, 32, 256] {
        for max_colors in [1, 5, 20, usize::MAX] {
            let res = quantize(&px, 50, 40, max_colors, precision).unwrap();
            let sum: f64 = res.iter().map(|c| c.percentage).sum();
            let rounding = 0.005 * res.len() as f64 + 1e-9;
            assert!(sum <= 100. + rounding, "{sum}");
            assert!(res.iter().all(|c| c.count > 0));

            let opaque = px.chunks_exact(4).filter(|p| p[3] >= 128).count() as u64;
            if res.len() == distinct_colors(&px, 50, 40, precision) {
                assert_eq!(opaque, res.iter().map(|c| c.count).sum::<u64>());
                assert!((sum - 100.).abs() <= rounding);
            }
        }
    }
}

#[test]
fn deterministic() {
    let px = noise(32 * 32 * 4, 1234);
    let a = quantize(&px, 32, 32, 50, 4).unwrap();
    let b = quantize(&px, 32, 32, 50, 4).unwrap();
    assert_eq!(a, b);
    assert!(a.windows(2).all(|w| w[0].count > w[1].count || (w[0].count == w[1].count && w[0].color < w[1].color)));
}

#[test]
fn monotonic_coarsening() {
    let px = noise(40 * 40 * 4, 42);
    let mut prev = usize::MAX;
    for precision in [256, 128, 64, 32, 16, 8, 4, 2, 1] {
        let n = distinct_colors(&px, 40, 40, precision);
        assert!(n <= prev, "{precision}: {n} > {prev}");
        prev = n;
    }
    assert_eq!(1, prev);
}

#[test]
fn palette_covers_all_opaque_pixels() {
    let px = noise(32 * 32 * 4, 77);
    let opaque = px.chunks_exact(4).filter(|p| p[3] >= 128).count() as u64;
    let attr = Attributes::new();
    let img = attr.new_image_bytes(&px, 32, 32);

    for colors in [2, 10, 64] {
        let res = attr.palette(&img, colors).unwrap();
        assert_eq!(colors, res.colors().len());
        assert_eq!(opaque, res.colors().iter().map(|c| c.count).sum::<u64>());
        assert!(res.colors().windows(2).all(|w| w[0].count >= w[1].count));
        let sum: f64 = res.colors().iter().map(|c| c.percentage).sum();
        assert!((sum - 100.).abs() <= 0.005 * colors as f64 + 1e-9, "{sum}");
    }
    assert_eq!(attr.palette(&img, 10).unwrap().colors(), attr.palette(&img, 10).unwrap().colors());
}

#[test]
fn hex_round_trip() {
    let px = noise(16 * 16 * 4, 5);
    for precision in [3, 7, 32, 100, 256] {
        for c in quantize(&px, 16, 16, usize::MAX, precision).unwrap() {
            let parsed: HexColor = c.color.parse().unwrap();
            assert_eq!(c.rgb, parsed.rgb);
            assert_eq!(None, parsed.alpha);
            assert_eq!(c.hex(), parsed);
        }
    }
}

#[test]
fn send() {
    fn is_send<T: Send>() {}
    is_send::<Attributes>();
    is_send::<Histogram>();
    is_send::<QuantizationResult>();
    is_send::<Image<'static>>();
}
