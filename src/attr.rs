use crate::error::Error;
use crate::hist::Histogram;
use crate::image::Image;
use crate::pal::{ColorCount, DEFAULT_MIN_OPACITY, MAX_PRECISION, RGBA};
use crate::quant::QuantizationResult;
use std::sync::Arc;

/// Starting point and settings for the quantization process
#[derive(Clone)]
pub struct Attributes {
    max_colors: usize,
    color_precision: u16,
    min_opacity: u8,

    log_callback: Option<Arc<dyn Fn(&Attributes, &str) + Send + Sync>>,
    log_flush_callback: Option<Arc<dyn Fn(&Attributes) + Send + Sync>>,
}

impl Attributes {
    /// New handle for library configuration
    ///
    /// Defaults: 20 colors, 32 levels per channel, pixels with alpha < 128 ignored.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_colors: 20,
            color_precision: 32,
            min_opacity: DEFAULT_MIN_OPACITY,
            log_callback: None,
            log_flush_callback: None,
        }
    }

    /// Make an image from RGBA pixels.
    ///
    /// The `pixels` argument can be `Vec<RGBA>`, or `Box<[RGBA]>` or `&[RGBA]`.
    /// See [`Attributes::new_image_borrowed`] for a non-copying alternative.
    #[inline]
    pub fn new_image<VecRGBA>(&self, pixels: VecRGBA, width: usize, height: usize) -> Image<'static> where VecRGBA: Into<Box<[RGBA]>> {
        Image::new(self, pixels, width, height)
    }

    /// Describe dimensions of a slice of RGBA pixels
    #[inline]
    pub fn new_image_borrowed<'pixels>(&self, bitmap: &'pixels [RGBA], width: usize, height: usize) -> Image<'pixels> {
        Image::new_borrowed(self, bitmap, width, height)
    }

    /// Describe dimensions of a flat `[r, g, b, a, r, g, b, a, …]` buffer, such as canvas image data.
    ///
    /// Trailing bytes that don't form a whole pixel are ignored.
    #[inline]
    pub fn new_image_bytes<'pixels>(&self, bytes: &'pixels [u8], width: usize, height: usize) -> Image<'pixels> {
        Image::new_bytes(self, bytes, width, height)
    }

    /// Count colors in the image and rank them
    pub fn quantize(&self, image: &Image<'_>) -> Result<QuantizationResult, Error> {
        let mut hist = Histogram::new(self);
        hist.add_image(self, image)?;
        hist.quantize(self)
    }

    /// Reduce the image to a palette of at most `colors` representative colors (2-256), using median cut.
    ///
    /// The colors are ordered by the number of pixels they stand for. Opacity and color precision
    /// settings apply the same way as in [`Attributes::quantize`], but `max_colors` doesn't.
    pub fn palette(&self, image: &Image<'_>, colors: usize) -> Result<QuantizationResult, Error> {
        let mut hist = Histogram::new(self);
        hist.add_image(self, image)?;
        hist.palette(self, colors)
    }

    /// The color representing the largest group of similar pixels, if the image has any opaque pixels.
    ///
    /// This is the first color of a 5-color [`Attributes::palette`], so unlike [`QuantizationResult::dominant`]
    /// it's an average of similar shades rather than the single most frequent one.
    pub fn dominant_color(&self, image: &Image<'_>) -> Result<Option<ColorCount>, Error> {
        Ok(self.palette(image, 5)?.into_colors().into_iter().next())
    }

    /// Upper limit on the number of colors returned. 0 is allowed and gives an empty result.
    #[inline]
    pub fn set_max_colors(&mut self, colors: usize) -> Result<(), Error> {
        self.max_colors = colors;
        Ok(())
    }

    /// Number of levels kept per channel, 1-256.
    ///
    /// 256 keeps every value as-is. 32 (the default) groups channel values in steps of 8.
    /// Low values like 4 or 8 merge similar tones into one color.
    #[inline]
    pub fn set_color_precision(&mut self, levels: u16) -> Result<(), Error> {
        if !(1..=MAX_PRECISION).contains(&levels) {
            return Err(Error::ValueOutOfRange);
        }
        if levels < 4 {
            self.verbose_print("  warning: color precision set very low");
        }
        self.color_precision = levels;
        Ok(())
    }

    /// Pixels with alpha lower than this are skipped, 1-255. The default is 128.
    #[inline]
    pub fn set_min_opacity(&mut self, alpha: u8) -> Result<(), Error> {
        if alpha == 0 {
            return Err(Error::ValueOutOfRange);
        }
        self.min_opacity = alpha;
        Ok(())
    }

    /// Return max number of colors set
    #[inline(always)]
    #[must_use]
    pub fn max_colors(&self) -> usize {
        self.max_colors
    }

    /// Levels per channel
    #[inline(always)]
    #[must_use]
    pub fn color_precision(&self) -> u16 {
        self.color_precision
    }

    /// Lowest alpha counted as opaque
    #[inline(always)]
    #[must_use]
    pub fn min_opacity(&self) -> u8 {
        self.min_opacity
    }

    /// Set callback function to be called every time the library wants to print a message.
    ///
    /// To share data with the callback, use `Arc` or `Atomic*` types and `move ||` closures.
    #[inline]
    pub fn set_log_callback<F: Fn(&Attributes, &str) + Send + Sync + 'static>(&mut self, callback: F) {
        self.verbose_printf_flush();
        self.log_callback = Some(Arc::new(callback));
    }

    /// Callback for flushing output (if you buffer messages, that's the time to flush those buffers)
    #[inline]
    pub fn set_log_flush_callback<F: Fn(&Attributes) + Send + Sync + 'static>(&mut self, callback: F) {
        self.verbose_printf_flush();
        self.log_flush_callback = Some(Arc::new(callback));
    }

    #[inline(always)]
    pub(crate) fn verbose_print(self: &Attributes, msg: impl AsRef<str>) {
        fn _print(a: &Attributes, msg: &str) {
            if let Some(f) = &a.log_callback {
                f(a, msg);
            }
        }
        _print(self, msg.as_ref());
    }

    #[inline]
    pub(crate) fn verbose_printf_flush(self: &Attributes) {
        if let Some(f) = &self.log_flush_callback {
            f(self);
        }
    }
}

impl Drop for Attributes {
    fn drop(&mut self) {
        self.verbose_printf_flush();
    }
}

impl Default for Attributes {
    #[inline(always)]
    fn default() -> Attributes {
        Attributes::new()
    }
}

#[test]
fn getset() {
    let mut a = Attributes::new();
    assert_eq!(20, a.max_colors());
    assert_eq!(32, a.color_precision());
    assert_eq!(128, a.min_opacity());

    a.set_max_colors(0).unwrap();
    assert_eq!(0, a.max_colors());

    a.set_color_precision(256).unwrap();
    assert_eq!(256, a.color_precision());
    a.set_color_precision(1).unwrap();
    assert!(a.set_color_precision(0).is_err());
    assert!(a.set_color_precision(257).is_err());
    assert_eq!(1, a.color_precision());

    a.set_min_opacity(255).unwrap();
    assert!(a.set_min_opacity(0).is_err());
    assert_eq!(255, a.min_opacity());
}

#[test]
fn logs_warnings() {
    use std::sync::Mutex;

    let log = Arc::new(Mutex::new(Vec::<String>::new()));
    let mut a = Attributes::new();
    let sink = log.clone();
    a.set_log_callback(move |_, msg| sink.lock().unwrap().push(msg.to_owned()));
    a.set_color_precision(2).unwrap();
    a.set_color_precision(64).unwrap();

    let log = log.lock().unwrap();
    assert_eq!(1, log.len());
    assert!(log[0].contains("precision"));
}

#[test]
fn flushes_on_drop() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let flushes = Arc::new(AtomicUsize::new(0));
    let mut a = Attributes::new();
    let counter = flushes.clone();
    a.set_log_flush_callback(move |_| { counter.fetch_add(1, Ordering::SeqCst); });
    let copy = a.clone();
    drop(a);
    drop(copy);
    assert_eq!(2, flushes.load(Ordering::SeqCst));
}
