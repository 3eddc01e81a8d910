use crate::attr::Attributes;
use crate::error::*;
use crate::hist::ColorCounts;
use crate::mediancut::{mediancut, HistItem};
use crate::pal::{pack, unpack, ColorCount, MAX_PALETTE_COLORS};
use crate::treemap::{Treemap, TreemapTile};
use std::cmp::Reverse;
use std::fmt;

/// Ranked colors, computed from [`Attributes::quantize()`] or [`Histogram::quantize()`][crate::Histogram::quantize],
/// or a median-cut palette from [`Attributes::palette()`]
#[derive(Clone)]
pub struct QuantizationResult {
    colors: Vec<ColorCount>,
    distinct_colors: usize,
    opaque_pixels: u64,
}

impl QuantizationResult {
    pub(crate) fn new(attr: &Attributes, counts: &ColorCounts) -> Result<Self, Error> {
        let opaque_pixels = counts.opaque_pixels;
        let distinct_colors = counts.hashmap.len();
        let max_colors = attr.max_colors();

        // all-transparent or empty images have nothing to divide by
        if opaque_pixels == 0 || max_colors == 0 {
            return Ok(Self { colors: Vec::new(), distinct_colors, opaque_pixels });
        }

        let mut ranked = Vec::new();
        ranked.try_reserve_exact(distinct_colors)?;
        ranked.extend(counts.hashmap.iter().map(|(&key, &count)| (key, count)));

        // keys are unique, so ties on count are broken by hex order and the result is deterministic
        let order = |&(key, count): &(u32, u64)| (Reverse(count), key);
        if ranked.len() > max_colors {
            ranked.select_nth_unstable_by_key(max_colors, order);
            ranked.truncate(max_colors);
        }
        ranked.sort_unstable_by_key(order);

        let mut colors = Vec::new();
        colors.try_reserve_exact(ranked.len())?;
        colors.extend(ranked.into_iter().map(|(key, count)| ColorCount::new(key, count, opaque_pixels)));

        attr.verbose_print(format!(
            "  kept {} of {} colors, covering {:0.2}% of {} opaque pixels",
            colors.len(),
            distinct_colors,
            colors.iter().map(|c| c.count).sum::<u64>() as f64 / opaque_pixels as f64 * 100.,
            opaque_pixels,
        ));

        Ok(Self { colors, distinct_colors, opaque_pixels })
    }

    /// Median cut of the counted colors into at most `target_colors` boxes, each represented by
    /// its pixel-weighted average color.
    pub(crate) fn with_palette(attr: &Attributes, counts: &ColorCounts, target_colors: usize) -> Result<Self, Error> {
        if !(2..=MAX_PALETTE_COLORS).contains(&target_colors) {
            return Err(ValueOutOfRange);
        }
        let opaque_pixels = counts.opaque_pixels;
        let distinct_colors = counts.hashmap.len();
        if opaque_pixels == 0 {
            return Ok(Self { colors: Vec::new(), distinct_colors, opaque_pixels });
        }

        let mut items = Vec::new();
        items.try_reserve_exact(distinct_colors)?;
        items.extend(counts.hashmap.iter().map(|(&key, &count)| HistItem { color: unpack(key), count }));
        // hashmap order depends on how the counts were merged
        items.sort_unstable_by_key(|a| pack(a.color));

        let palette = mediancut(&mut items, target_colors)?;
        let mut colors = Vec::new();
        colors.try_reserve_exact(palette.len())?;
        colors.extend(palette.into_iter().map(|(rgb, count)| ColorCount::from_rgb(rgb, count, opaque_pixels)));
        // two boxes can average to the same color, so the sort has to be stable
        colors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.color.cmp(&b.color)));

        attr.verbose_print(format!("  median cut {} colors into {} boxes", distinct_colors, colors.len()));

        Ok(Self { colors, distinct_colors, opaque_pixels })
    }

    /// Colors ordered from the most to the least frequent.
    ///
    /// Colors with equal counts are ordered by their hex string.
    #[inline]
    #[must_use]
    pub fn colors(&self) -> &[ColorCount] {
        &self.colors
    }

    /// Takes the colors out of the result
    #[inline]
    #[must_use]
    pub fn into_colors(self) -> Vec<ColorCount> {
        self.colors
    }

    /// The most frequent color, if there were any opaque pixels
    #[inline]
    #[must_use]
    pub fn dominant(&self) -> Option<&ColorCount> {
        self.colors.first()
    }

    /// Number of distinct posterized colors seen, before limiting to `max_colors`
    #[inline]
    #[must_use]
    pub fn distinct_colors(&self) -> usize {
        self.distinct_colors
    }

    /// Number of pixels that were opaque enough to be counted. Percentages are relative to this.
    #[inline]
    #[must_use]
    pub fn opaque_pixels(&self) -> u64 {
        self.opaque_pixels
    }

    /// Lays out the colors as treemap tiles
    #[inline]
    #[must_use]
    pub fn treemap(&self, treemap: &Treemap) -> Vec<TreemapTile<'_>> {
        treemap.layout(&self.colors)
    }
}

impl fmt::Debug for QuantizationResult {
    #[cold]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuantizationResult")
            .field("colors", &self.colors.len())
            .field("distinct_colors", &self.distinct_colors)
            .field("opaque_pixels", &self.opaque_pixels)
            .finish()
    }
}

#[test]
fn ties_by_hex() {
    use crate::{Histogram, HistogramEntry, RGBA};

    let mut attr = Attributes::new();
    attr.set_color_precision(256).unwrap();
    attr.set_max_colors(3).unwrap();
    let mut hist = Histogram::new(&attr);
    hist.add_colors(&[
        HistogramEntry { color: RGBA::new(0, 0, 9, 255), count: 2 },
        HistogramEntry { color: RGBA::new(0, 0, 3, 255), count: 2 },
        HistogramEntry { color: RGBA::new(9, 0, 0, 255), count: 1 },
        HistogramEntry { color: RGBA::new(0, 0, 1, 255), count: 5 },
        HistogramEntry { color: RGBA::new(0, 1, 0, 255), count: 1 },
    ]).unwrap();

    let res = hist.quantize(&attr).unwrap();
    let hex: Vec<_> = res.colors().iter().map(|c| c.color.as_str()).collect();
    assert_eq!(["#000001", "#000003", "#000009"], &hex[..]);
    assert_eq!(5, res.distinct_colors());
    assert_eq!(11, res.opaque_pixels());
    assert_eq!(Some("#000001"), res.dominant().map(|c| c.color.as_str()));

    attr.set_max_colors(5).unwrap();
    let res = hist.quantize(&attr).unwrap();
    let hex: Vec<_> = res.colors().iter().map(|c| c.color.as_str()).collect();
    assert_eq!(["#000001", "#000003", "#000009", "#000100", "#090000"], &hex[..]);
}

#[test]
fn empty() {
    let attr = Attributes::new();
    let res = crate::Histogram::new(&attr).quantize(&attr).unwrap();
    assert!(res.colors().is_empty());
    assert!(res.dominant().is_none());
    assert_eq!(0, res.opaque_pixels());
}

#[test]
fn palette_of_two_clusters() {
    use crate::RGBA;

    let mut attr = Attributes::new();
    attr.set_color_precision(256).unwrap();
    let reds = (0..20u8).map(|i| RGBA::new(200 + i, i, 10, 255));
    let blues = (0..20u8).map(|i| RGBA::new(5, 10 + i, 220 + i, 255));
    let img = attr.new_image(reds.chain(blues).collect::<Vec<_>>(), 40, 1);

    let res = attr.palette(&img, 2).unwrap();
    assert_eq!(40, res.opaque_pixels());
    assert_eq!(40, res.distinct_colors());
    let summary: Vec<_> = res.colors().iter().map(|c| (c.color.as_str(), c.count, c.percentage)).collect();
    assert_eq!(vec![("#0514e6", 20, 50.), ("#d20a0a", 20, 50.)], summary);
}

#[test]
fn palette_settings() {
    use crate::RGBA;

    let attr = Attributes::new();
    let img = attr.new_image(vec![RGBA::new(1, 2, 3, 255); 4], 2, 2);
    assert_eq!(Err(ValueOutOfRange), attr.palette(&img, 0).map(|_| ()));
    assert_eq!(Err(ValueOutOfRange), attr.palette(&img, 1).map(|_| ()));
    assert_eq!(Err(ValueOutOfRange), attr.palette(&img, MAX_PALETTE_COLORS + 1).map(|_| ()));

    let res = attr.palette(&img, MAX_PALETTE_COLORS).unwrap();
    assert_eq!(1, res.colors().len());
    assert_eq!(("#000000", 4), (res.colors()[0].color.as_str(), res.colors()[0].count));

    let transparent = attr.new_image(vec![RGBA::new(1, 2, 3, 0); 4], 2, 2);
    assert!(attr.palette(&transparent, 10).unwrap().colors().is_empty());
    assert_eq!(None, attr.dominant_color(&transparent).unwrap());
}

#[test]
fn dominant_color_of_largest_group() {
    use crate::RGBA;

    let mut attr = Attributes::new();
    attr.set_color_precision(256).unwrap();
    let mut px = vec![RGBA::new(10, 200, 30, 255); 30];
    px.extend([RGBA::new(250, 250, 250, 255); 10]);
    px.extend([RGBA::new(0, 0, 0, 100); 50]);
    let img = attr.new_image(px, 90, 1);

    let dominant = attr.dominant_color(&img).unwrap().unwrap();
    assert_eq!("#0ac81e", dominant.color);
    assert_eq!(30, dominant.count);
    assert_eq!(75., dominant.percentage);
}
