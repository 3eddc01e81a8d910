use crate::error::Error;
use crate::pal::{pack, RGB};

/// A posterized color and the number of opaque pixels in it
#[derive(Debug, Copy, Clone)]
pub(crate) struct HistItem {
    pub color: RGB,
    pub count: u64,
}

impl HistItem {
    #[inline(always)]
    fn chan(&self, chan: usize) -> u8 {
        match chan {
            0 => self.color.r,
            1 => self.color.g,
            _ => self.color.b,
        }
    }
}

struct MedianCutter<'hist> {
    boxes: Vec<MBox<'hist>>,
    target_colors: usize,
}

struct MBox<'hist> {
    /// Histogram entries that fell into this bucket
    colors: &'hist mut [HistItem],
    /// Pixel-weighted average of the colors, rounded
    avg_color: RGB,
    /// Mean squared difference from the average, per channel
    variance: [f64; 3],
    /// Number of pixels in the box
    population: u64,
}

impl<'hist> MBox<'hist> {
    fn new(hist: &'hist mut [HistItem]) -> Self {
        debug_assert!(!hist.is_empty());
        let population = hist.iter().map(|a| a.count).sum::<u64>();
        let avg_color = weighed_average_color(hist, population);
        let variance = Self::box_variance(hist, avg_color, population);
        Self { colors: hist, avg_color, variance, population }
    }

    fn box_variance(hist: &[HistItem], avg: RGB, population: u64) -> [f64; 3] {
        let mut variance = [0f64; 3];
        if population == 0 {
            return variance;
        }
        let avg = [avg.r, avg.g, avg.b];
        for a in hist {
            for (chan, (v, &mean)) in variance.iter_mut().zip(&avg).enumerate() {
                let diff = f64::from(a.chan(chan)) - f64::from(mean);
                *v += diff * diff * a.count as f64;
            }
        }
        variance.map(|v| v / population as f64)
    }

    /// Channel with the widest spread of pixels
    fn widest_channel(&self) -> usize {
        let [r, g, b] = self.variance;
        if r >= g && r >= b { 0 } else if g >= b { 1 } else { 2 }
    }

    /// Sum of squared errors of the widest channel
    fn spread(&self) -> f64 {
        self.population as f64 * self.variance[self.widest_channel()]
    }

    /// Sorts along the widest channel and cuts where half of the pixels are on each side
    fn split(mut self) -> [Self; 2] {
        debug_assert!(self.colors.len() > 1);
        let chan = self.widest_channel();
        // packed color keeps the order total, so equal inputs always split the same way
        self.colors.sort_unstable_by_key(|a| (a.chan(chan), pack(a.color)));

        let mut below = 0;
        let half_reached = self.colors.iter().position(|a| {
            below += a.count;
            below * 2 >= self.population
        });
        let break_at = half_reached.map_or(1, |i| i + 1).clamp(1, self.colors.len() - 1);

        let (left, right) = self.colors.split_at_mut(break_at);
        [MBox::new(left), MBox::new(right)]
    }
}

impl<'hist> MedianCutter<'hist> {
    fn new(hist: &'hist mut [HistItem], target_colors: usize) -> Result<Self, Error> {
        let mut boxes = Vec::new();
        boxes.try_reserve_exact(target_colors)?;
        if !hist.is_empty() {
            boxes.push(MBox::new(hist));
        }
        Ok(Self { boxes, target_colors })
    }

    fn cut(mut self) -> Vec<(RGB, u64)> {
        while self.boxes.len() < self.target_colors {
            // the most populous boxes are split first, so that big areas get their shades,
            // and the last quarter goes to boxes with the widest spread, to catch small distinct details
            let fraction_done = self.boxes.len() as f64 / self.target_colors as f64;
            let Some(bi) = self.take_best_splittable_box(fraction_done < 0.75) else {
                break;
            };
            self.boxes.extend(bi.split());
        }

        self.boxes.iter().map(|b| (b.avg_color, b.population)).collect()
    }

    fn take_best_splittable_box(&mut self, by_population: bool) -> Option<MBox<'hist>> {
        self.boxes.iter().enumerate()
            .filter(|(_, b)| b.colors.len() > 1)
            .map(|(i, b)| {
                let score = if by_population { b.population as f64 } else { b.spread() };
                (i, score)
            })
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| self.boxes.swap_remove(i))
    }
}

/// Representative colors of `hist` and the number of pixels each stands for.
///
/// Returns fewer than `target_colors` when there aren't enough distinct colors to split.
#[inline(never)]
pub(crate) fn mediancut(hist: &mut [HistItem], target_colors: usize) -> Result<Vec<(RGB, u64)>, Error> {
    Ok(MedianCutter::new(hist, target_colors)?.cut())
}

fn weighed_average_color(hist: &[HistItem], population: u64) -> RGB {
    if population == 0 {
        return RGB::default();
    }
    let mut sum = [0u64; 3];
    for a in hist {
        for (chan, s) in sum.iter_mut().enumerate() {
            *s += u64::from(a.chan(chan)) * a.count;
        }
    }
    let [r, g, b] = sum.map(|s| ((s + population / 2) / population) as u8);
    RGB::new(r, g, b)
}

#[cfg(test)]
fn item(r: u8, g: u8, b: u8, count: u64) -> HistItem {
    HistItem { color: RGB::new(r, g, b), count }
}

#[test]
fn fewer_colors_than_boxes() {
    let mut hist = [item(8, 0, 0, 3), item(0, 8, 0, 2), item(0, 0, 8, 1)];
    let mut pal = mediancut(&mut hist, 10).unwrap();
    pal.sort_by_key(|&(_, count)| std::cmp::Reverse(count));
    assert_eq!(vec![
        (RGB::new(8, 0, 0), 3),
        (RGB::new(0, 8, 0), 2),
        (RGB::new(0, 0, 8), 1),
    ], pal);
}

#[test]
fn splits_widest_channel() {
    // red spans the whole range, green and blue barely move
    let mut hist: Vec<_> = (0..=255u8).step_by(8).map(|r| item(r, 100 + r % 3, 50, 1)).collect();
    let pal = mediancut(&mut hist, 2).unwrap();
    assert_eq!(2, pal.len());
    assert_eq!(32, pal.iter().map(|&(_, c)| c).sum::<u64>());
    let (dark, light) = if pal[0].0.r < pal[1].0.r { (pal[0], pal[1]) } else { (pal[1], pal[0]) };
    assert_eq!((16, 16), (dark.1, light.1));
    assert!(dark.0.r < 128 && light.0.r >= 128, "{pal:?}");
}

#[test]
fn average_is_weighted() {
    let hist = [item(0, 0, 0, 3), item(100, 200, 40, 1)];
    assert_eq!(RGB::new(25, 50, 10), weighed_average_color(&hist, 4));
}

#[test]
fn one_color_per_box_at_most() {
    let mut hist = [item(1, 1, 1, 1000)];
    assert_eq!(vec![(RGB::new(1, 1, 1), 1000)], mediancut(&mut hist, 5).unwrap());
    assert!(mediancut(&mut [], 5).unwrap().is_empty());
}
