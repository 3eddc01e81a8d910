//! Squarified treemap of ranked colors
//!
//! Each color gets a rectangle with area proportional to its pixel count. Tiles are packed in rows
//! along the shorter side of the remaining space, and a row keeps growing for as long as that
//! doesn't make its worst aspect ratio worse (Bruls, Huizing, van Wijk, "Squarified Treemaps").

use crate::error::Error;
use crate::pal::ColorCount;
use std::fmt::Write;

/// Aspect ratio the tiles aim for
pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// Size and spacing of a treemap
#[derive(Debug, Clone, PartialEq)]
pub struct Treemap {
    width: f64,
    height: f64,
    padding: f64,
    ratio: f64,
}

/// A color and the rectangle it occupies
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TreemapTile<'a> {
    /// The color this tile stands for
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub entry: &'a ColorCount,
    /// Left edge
    pub x0: f64,
    /// Top edge
    pub y0: f64,
    /// Right edge
    pub x1: f64,
    /// Bottom edge
    pub y1: f64,
}

impl TreemapTile<'_> {
    /// `x1 - x0`
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// `y1 - y0`
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
struct Rect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Rect {
    /// Shrinks by `d` on every side. If that would flip it inside out, it collapses to its centre line.
    fn inset(self, d: f64) -> Self {
        let (mut x0, mut y0, mut x1, mut y1) = (self.x0 + d, self.y0 + d, self.x1 - d, self.y1 - d);
        if x1 < x0 {
            x0 = (x0 + x1) / 2.;
            x1 = x0;
        }
        if y1 < y0 {
            y0 = (y0 + y1) / 2.;
            y1 = y0;
        }
        Self { x0, y0, x1, y1 }
    }
}

impl Treemap {
    /// Treemap filling `width`×`height`, with 2 units of padding and tiles close to the golden ratio
    pub fn new(width: f64, height: f64) -> Result<Self, Error> {
        if !(width.is_finite() && height.is_finite() && width >= 0. && height >= 0.) {
            return Err(Error::ValueOutOfRange);
        }
        Ok(Self { width, height, padding: 2., ratio: GOLDEN_RATIO })
    }

    /// Gap around the outside and between tiles
    pub fn set_padding(&mut self, padding: f64) -> Result<(), Error> {
        if !(padding.is_finite() && padding >= 0.) {
            return Err(Error::ValueOutOfRange);
        }
        self.padding = padding;
        Ok(())
    }

    /// Target width:height (or height:width) of tiles, at least 1
    pub fn set_ratio(&mut self, ratio: f64) -> Result<(), Error> {
        if !(ratio.is_finite() && ratio >= 1.) {
            return Err(Error::ValueOutOfRange);
        }
        self.ratio = ratio;
        Ok(())
    }

    /// Width of the whole treemap, padding included
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height of the whole treemap
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// One tile per color, in the same order as `colors`
    #[must_use]
    pub fn layout<'a>(&self, colors: &'a [ColorCount]) -> Vec<TreemapTile<'a>> {
        // tiles are inset by half the padding each, so the outer edge needs only the other half
        let half = self.padding / 2.;
        let area = Rect { x0: 0., y0: 0., x1: self.width, y1: self.height }.inset(self.padding - half);

        let values: Vec<f64> = colors.iter().map(|c| c.count as f64).collect();
        let mut rects = vec![area; values.len()];
        squarify(&values, area, self.ratio, &mut rects);

        colors.iter().zip(rects).map(|(entry, rect)| {
            let Rect { x0, y0, x1, y1 } = rect.inset(half);
            TreemapTile { entry, x0, y0, x1, y1 }
        }).collect()
    }

    /// SVG document with a labelled, filled rectangle for each color
    #[must_use]
    pub fn render_svg(&self, colors: &[ColorCount]) -> String {
        let mut svg = String::new();
        // writing to a String can't fail
        let _ = self.write_svg(&mut svg, colors);
        svg
    }

    fn write_svg(&self, out: &mut String, colors: &[ColorCount]) -> std::fmt::Result {
        writeln!(out, r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">"#, self.width, self.height)?;
        for tile in self.layout(colors) {
            let ColorCount { color, rgb, percentage, .. } = tile.entry;
            writeln!(out, r#"  <g transform="translate({},{})">"#, tile.x0, tile.y0)?;
            writeln!(out, r#"    <rect width="{}" height="{}" fill="{color}"/>"#, tile.width(), tile.height())?;
            writeln!(out, "    <title>{color} ({percentage}%)\nRGB: {}, {}, {}</title>", rgb.r, rgb.g, rgb.b)?;
            writeln!(out, r#"    <text x="4" y="14" fill="white" font-size="10px">{color}</text>"#)?;
            writeln!(out, "  </g>")?;
        }
        writeln!(out, "</svg>")
    }
}

/// Positions `values` inside `rect`, writing each one's rectangle to `out`
fn squarify(values: &[f64], mut rect: Rect, ratio: f64, out: &mut [Rect]) {
    debug_assert_eq!(values.len(), out.len());
    let n = values.len();
    let mut remaining: f64 = values.iter().sum();
    let mut i0 = 0;
    let mut i1 = 0;

    while i0 < n {
        let dx = rect.x1 - rect.x0;
        let dy = rect.y1 - rect.y0;

        // skip zero-sized entries at the start of a row
        let mut row_sum;
        loop {
            row_sum = values[i1];
            i1 += 1;
            if row_sum != 0. || i1 >= n {
                break;
            }
        }
        let mut min_value = row_sum;
        let mut max_value = row_sum;
        let alpha = (dy / dx).max(dx / dy) / (remaining * ratio);
        let mut beta = row_sum * row_sum * alpha;
        let mut min_ratio = (max_value / beta).max(beta / min_value);

        while i1 < n {
            let value = values[i1];
            row_sum += value;
            min_value = min_value.min(value);
            max_value = max_value.max(value);
            beta = row_sum * row_sum * alpha;
            let new_ratio = (max_value / beta).max(beta / min_value);
            if new_ratio > min_ratio {
                row_sum -= value;
                break;
            }
            min_ratio = new_ratio;
            i1 += 1;
        }

        let row = i0..i1;
        if dx < dy {
            // row spans the full width, stacked from the top
            let y1 = if remaining > 0. { rect.y0 + dy * row_sum / remaining } else { rect.y1 };
            dice(&values[row.clone()], Rect { y1, ..rect }, &mut out[row]);
            rect.y0 = y1;
        } else {
            // row spans the full height, stacked from the left
            let x1 = if remaining > 0. { rect.x0 + dx * row_sum / remaining } else { rect.x1 };
            slice(&values[row.clone()], Rect { x1, ..rect }, &mut out[row]);
            rect.x0 = x1;
        }
        remaining -= row_sum;
        i0 = i1;
    }
}

/// Side by side, left to right
fn dice(values: &[f64], rect: Rect, out: &mut [Rect]) {
    let total: f64 = values.iter().sum();
    let k = if total > 0. { (rect.x1 - rect.x0) / total } else { 0. };
    let mut x = rect.x0;
    for (&v, o) in values.iter().zip(out) {
        let x0 = x;
        x += v * k;
        *o = Rect { x0, y0: rect.y0, x1: x, y1: rect.y1 };
    }
}

/// Stacked, top to bottom
fn slice(values: &[f64], rect: Rect, out: &mut [Rect]) {
    let total: f64 = values.iter().sum();
    let k = if total > 0. { (rect.y1 - rect.y0) / total } else { 0. };
    let mut y = rect.y0;
    for (&v, o) in values.iter().zip(out) {
        let y0 = y;
        y += v * k;
        *o = Rect { x0: rect.x0, y0, x1: rect.x1, y1: y };
    }
}

#[cfg(test)]
fn entry(count: u64, total: u64) -> ColorCount {
    ColorCount::new(count as u32, count, total)
}

#[test]
fn single_tile_fills_padded_box() {
    let colors = [entry(1, 1)];
    let tiles = Treemap::new(100., 50.).unwrap().layout(&colors);
    assert_eq!(1, tiles.len());
    assert_eq!((2., 2., 98., 48.), (tiles[0].x0, tiles[0].y0, tiles[0].x1, tiles[0].y1));
}

#[test]
fn areas_proportional_to_counts() {
    let counts = [50u64, 20, 12, 8, 5, 3, 1, 1];
    let total = counts.iter().sum();
    let colors: Vec<_> = counts.iter().map(|&c| entry(c, total)).collect();

    let mut tm = Treemap::new(300., 200.).unwrap();
    tm.set_padding(0.).unwrap();
    let tiles = tm.layout(&colors);
    assert_eq!(colors.len(), tiles.len());

    let area: f64 = tiles.iter().map(|t| t.width() * t.height()).sum();
    assert!((area - 300. * 200.).abs() < 1e-6);
    for (t, &c) in tiles.iter().zip(&counts) {
        assert!(t.x0 >= 0. && t.y0 >= 0. && t.x1 <= 300. + 1e-9 && t.y1 <= 200. + 1e-9);
        let expected = 300. * 200. * c as f64 / total as f64;
        assert!((t.width() * t.height() - expected).abs() < 1e-6, "{t:?} {expected}");
    }

    // tiles don't overlap
    for (i, a) in tiles.iter().enumerate() {
        for b in &tiles[i + 1..] {
            let overlap_x = a.x1.min(b.x1) - a.x0.max(b.x0);
            let overlap_y = a.y1.min(b.y1) - a.y0.max(b.y0);
            assert!(overlap_x <= 1e-9 || overlap_y <= 1e-9, "{a:?} {b:?}");
        }
    }
}

#[test]
fn rows_run_along_shorter_side() {
    let colors = [entry(1, 2), entry(1, 2)];
    let mut tm = Treemap::new(100., 10.).unwrap();
    tm.set_padding(0.).unwrap();
    let tiles = tm.layout(&colors);
    // wide box: two 50x10 tiles next to each other
    assert_eq!((0., 50.), (tiles[0].x0, tiles[0].x1));
    assert_eq!((50., 100.), (tiles[1].x0, tiles[1].x1));
    assert!(tiles.iter().all(|t| t.y0 == 0. && t.y1 == 10.));
}

#[test]
fn tiny_tiles_collapse() {
    let colors = [entry(1000, 1001), entry(1, 1001)];
    let mut tm = Treemap::new(20., 20.).unwrap();
    tm.set_padding(4.).unwrap();
    let tiles = tm.layout(&colors);
    assert!(tiles.iter().all(|t| t.width() >= 0. && t.height() >= 0.));
    assert_eq!(0., tiles[1].width().min(tiles[1].height()));
}

#[test]
fn settings() {
    assert!(Treemap::new(-1., 1.).is_err());
    assert!(Treemap::new(1., f64::NAN).is_err());
    let mut tm = Treemap::new(0., 0.).unwrap();
    assert!(tm.set_padding(-1.).is_err());
    assert!(tm.set_ratio(0.5).is_err());
    tm.set_ratio(1.).unwrap();
    assert!(tm.layout(&[]).is_empty());
}

#[test]
fn svg() {
    let colors = [ColorCount::new(0xf80000, 2, 2)];
    let svg = Treemap::new(40., 30.).unwrap().render_svg(&colors);
    assert!(svg.starts_with("<svg "));
    assert!(svg.contains(r#"width="40" height="30""#));
    assert!(svg.contains(r##"<rect width="36" height="26" fill="#f80000"/>"##));
    assert!(svg.contains("(100%)\nRGB: 248, 0, 0"));
    assert!(svg.trim_end().ends_with("</svg>"));
}

#[test]
#[cfg(feature = "serde")]
fn tiles_serialize_flat() {
    let colors = [entry(1, 1)];
    let tiles = Treemap::new(100., 50.).unwrap().layout(&colors);
    assert_eq!(serde_json::json!([{
        "color": "#000001", "rgb": [0, 0, 1], "count": 1, "percentage": 100.0,
        "x0": 2.0, "y0": 2.0, "x1": 98.0, "y1": 48.0,
    }]), serde_json::to_value(&tiles).unwrap());
}
