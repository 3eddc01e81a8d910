use crate::attr::Attributes;
use crate::error::*;
use crate::image::{Image, PixelsSource};
use crate::pal::{pack, posterize_lut, RGB, RGBA};
use crate::quant::QuantizationResult;
use std::cell::RefCell;
use std::collections::HashMap;

#[cfg(not(feature = "threads"))]
use crate::rayoff::*;
#[cfg(feature = "threads")]
use rayon::prelude::*;
#[cfg(feature = "threads")]
use thread_local::ThreadLocal;

/// Pixels counted per parallel job. Smaller batches spread better across threads,
/// but every thread's partial counts have to be merged afterwards.
const PIXELS_PER_BATCH: usize = 1 << 16;

/// Number of pixels in a given color for [`Histogram::add_colors()`]
///
/// Used for building a histogram manually. Otherwise see [`Histogram::add_image()`]
#[derive(Debug, Copy, Clone)]
pub struct HistogramEntry {
    /// The color. It will be posterized and checked for opacity like image pixels.
    pub color: RGBA,
    /// Number of occurrences
    pub count: u32,
}

/// Counts colors of one or more images
///
/// If you're counting one image at a time, see [`Attributes::quantize`] instead
pub struct Histogram {
    lut: [u8; 256],
    min_opacity: u8,
    counts: ColorCounts,
}

/// The key is the posterized RGB packed to `0xRRGGBB`
#[derive(Default)]
pub(crate) struct ColorCounts {
    pub(crate) hashmap: HashMap<u32, u64, U32Hasher>,
    pub(crate) opaque_pixels: u64,
}

impl ColorCounts {
    #[inline(always)]
    fn add(&mut self, lut: &[u8; 256], min_opacity: u8, px: RGBA, count: u64) {
        if px.a < min_opacity || count == 0 {
            return;
        }
        let key = pack(RGB::new(lut[px.r as usize], lut[px.g as usize], lut[px.b as usize]));
        *self.hashmap.entry(key).or_insert(0) += count;
        self.opaque_pixels += count;
    }

    fn merge(&mut self, other: ColorCounts) -> Result<(), Error> {
        self.hashmap.try_reserve(other.hashmap.len().saturating_sub(self.hashmap.len() / 2))?;
        for (key, count) in other.hashmap {
            *self.hashmap.entry(key).or_insert(0) += count;
        }
        self.opaque_pixels += other.opaque_pixels;
        Ok(())
    }
}

impl Histogram {
    /// Creates histogram object that will be used to collect color statistics from multiple images.
    ///
    /// All options should be set on `attr` before the histogram object is created. Options changed later will not have effect.
    #[inline]
    #[must_use]
    pub fn new(attr: &Attributes) -> Self {
        Self {
            lut: posterize_lut(attr.color_precision()),
            min_opacity: attr.min_opacity(),
            counts: ColorCounts::default(),
        }
    }

    /// Counts opaque pixels of the image.
    ///
    /// Only the first `width * height` pixels are counted. Shorter buffers are counted as far as they go.
    #[inline(never)]
    pub fn add_image(&mut self, attr: &Attributes, image: &Image<'_>) -> Result<(), Error> {
        let pixels = image.pixel_count();
        if pixels == 0 {
            return Ok(());
        }

        // most photos have far fewer distinct colors than pixels
        self.counts.hashmap.try_reserve((pixels / 8).min(1 << 16))?;

        match &image.px {
            PixelsSource::Pixels(px) => self.add_batches(&px[..pixels])?,
            PixelsSource::Bytes(bytes) => self.add_batches(&bytes[..pixels * 4])?,
        }

        attr.verbose_print(format!("  counted {} opaque pixels in {} colors so far", self.counts.opaque_pixels, self.counts.hashmap.len()));
        Ok(())
    }

    fn add_batches<T: PixelData>(&mut self, data: &[T]) -> Result<(), Error> {
        let lut = &self.lut;
        let min_opacity = self.min_opacity;

        let tls = ThreadLocal::new();
        data.par_chunks(PIXELS_PER_BATCH * T::PER_PIXEL).for_each(|batch| {
            let counts = tls.get_or(|| RefCell::new(ColorCounts::default()));
            let mut counts = counts.borrow_mut();
            T::for_each_pixel(batch, |px| counts.add(lut, min_opacity, px, 1));
        });

        for partial in tls.into_iter() {
            self.counts.merge(partial.into_inner())?;
        }
        Ok(())
    }

    /// Alternative to `add_image()`. Instead of counting colors in an image, it directly takes an array of colors and their counts.
    ///
    /// This function is only useful if you already have a histogram of the image from another source.
    #[inline(never)]
    pub fn add_colors(&mut self, entries: &[HistogramEntry]) -> Result<(), Error> {
        self.counts.hashmap.try_reserve(entries.len())?;
        for e in entries {
            self.counts.add(&self.lut, self.min_opacity, e.color, e.count.into());
        }
        Ok(())
    }

    /// Number of opaque pixels counted so far
    #[inline]
    #[must_use]
    pub fn opaque_pixels(&self) -> u64 {
        self.counts.opaque_pixels
    }

    /// Number of distinct posterized colors counted so far
    #[inline]
    #[must_use]
    pub fn distinct_colors(&self) -> usize {
        self.counts.hashmap.len()
    }

    /// Rank all colors added to the histogram.
    ///
    /// Uses `max_colors` from `attr`. The histogram can be reused afterwards.
    #[inline]
    pub fn quantize(&self, attr: &Attributes) -> Result<QuantizationResult, Error> {
        QuantizationResult::new(attr, &self.counts)
    }

    /// Median cut of all colors added to the histogram into at most `colors` representative colors, 2-256.
    ///
    /// Unlike [`Histogram::quantize`], each returned color is the average of a group of similar colors,
    /// and together they account for every opaque pixel.
    #[inline]
    pub fn palette(&self, attr: &Attributes, colors: usize) -> Result<QuantizationResult, Error> {
        QuantizationResult::with_palette(attr, &self.counts, colors)
    }
}

/// Element of a pixel buffer: a whole pixel, or one byte of a flat RGBA buffer
trait PixelData: Sync + Sized {
    const PER_PIXEL: usize;
    /// `batch` is a whole number of pixels
    fn for_each_pixel(batch: &[Self], f: impl FnMut(RGBA));
}

impl PixelData for RGBA {
    const PER_PIXEL: usize = 1;

    #[inline(always)]
    fn for_each_pixel(batch: &[Self], f: impl FnMut(RGBA)) {
        batch.iter().copied().for_each(f);
    }
}

impl PixelData for u8 {
    const PER_PIXEL: usize = 4;

    #[inline(always)]
    fn for_each_pixel(batch: &[Self], mut f: impl FnMut(RGBA)) {
        debug_assert_eq!(0, batch.len() % 4);
        for c in batch.chunks_exact(4) {
            f(RGBA::new(c[0], c[1], c[2], c[3]));
        }
    }
}

// Simple deterministic hasher for the color hashmap
impl std::hash::BuildHasher for U32Hasher {
    type Hasher = Self;
    #[inline(always)]
    fn build_hasher(&self) -> Self {
        Self(0)
    }
}

#[derive(Default)]
pub(crate) struct U32Hasher(pub u32);
impl std::hash::Hasher for U32Hasher {
    // magic constant from fxhash. For a single 32-bit key that's all it needs!
    #[inline(always)]
    fn finish(&self) -> u64 { u64::from(self.0).wrapping_mul(0x517cc1b727220a95) }
    #[inline(always)]
    fn write_u32(&mut self, i: u32) { self.0 = i; }

    fn write(&mut self, _bytes: &[u8]) { unimplemented!() }
}

#[test]
fn counts_posterized_opaque_pixels() {
    let attr = Attributes::new();
    let mut hist = Histogram::new(&attr);
    let px = [
        RGBA::new(255, 0, 0, 255),
        RGBA::new(250, 3, 7, 128),
        RGBA::new(255, 0, 0, 127),
        RGBA::new(0, 0, 0, 0),
        RGBA::new(9, 9, 9, 200),
    ];
    hist.add_image(&attr, &attr.new_image_borrowed(&px, 5, 1)).unwrap();
    assert_eq!(3, hist.opaque_pixels());
    assert_eq!(2, hist.distinct_colors());
    assert_eq!(Some(&2), hist.counts.hashmap.get(&0xf80000));
    assert_eq!(Some(&1), hist.counts.hashmap.get(&0x080808));
}

#[test]
fn bytes_and_pixels_agree() {
    let attr = Attributes::new();
    let bytes: Vec<u8> = (0..4 * 300u32).map(|i| (i * 37 % 256) as u8).collect();
    let px: Vec<RGBA> = bytes.chunks_exact(4).map(|c| RGBA::new(c[0], c[1], c[2], c[3])).collect();

    let mut a = Histogram::new(&attr);
    a.add_image(&attr, &attr.new_image_bytes(&bytes, 20, 15)).unwrap();
    let mut b = Histogram::new(&attr);
    b.add_image(&attr, &attr.new_image(px, 20, 15)).unwrap();

    assert_eq!(a.opaque_pixels(), b.opaque_pixels());
    assert_eq!(a.counts.hashmap, b.counts.hashmap);
}

#[test]
fn batches_merge() {
    let attr = Attributes::new();
    let width = 1000;
    let height = PIXELS_PER_BATCH * 3 / width + 1;
    let px: Vec<RGBA> = (0..width * height).map(|i| RGBA::new((i % 2 * 255) as u8, 0, 0, 255)).collect();

    let mut hist = Histogram::new(&attr);
    hist.add_image(&attr, &attr.new_image_borrowed(&px, width, height)).unwrap();
    assert_eq!((width * height) as u64, hist.opaque_pixels());
    assert_eq!(2, hist.distinct_colors());
    let red = hist.counts.hashmap[&0xf80000];
    let black = hist.counts.hashmap[&0];
    assert_eq!((width * height / 2) as u64, red);
    assert_eq!(red + black, hist.opaque_pixels());
}

#[test]
fn add_colors_and_images_accumulate() {
    let mut attr = Attributes::new();
    attr.set_color_precision(256).unwrap();
    let mut hist = Histogram::new(&attr);

    hist.add_colors(&[
        HistogramEntry { color: RGBA::new(1, 2, 3, 255), count: 10 },
        HistogramEntry { color: RGBA::new(1, 2, 3, 255), count: 5 },
        HistogramEntry { color: RGBA::new(4, 5, 6, 10), count: 100 },
        HistogramEntry { color: RGBA::new(7, 8, 9, 255), count: 0 },
    ]).unwrap();
    assert_eq!(15, hist.opaque_pixels());
    assert_eq!(1, hist.distinct_colors());

    let bitmap = [1u8, 2, 3, 255, 200, 200, 200, 255];
    hist.add_image(&attr, &attr.new_image_bytes(&bitmap, 2, 1)).unwrap();
    assert_eq!(17, hist.opaque_pixels());
    assert_eq!(2, hist.distinct_colors());
    assert_eq!(16, hist.counts.hashmap[&0x010203]);
}
