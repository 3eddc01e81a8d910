use crate::attr::Attributes;
use crate::pal::RGBA;
use std::borrow::Cow;

pub(crate) enum PixelsSource<'pixels> {
    Pixels(Cow<'pixels, [RGBA]>),
    /// Always a whole number of pixels
    Bytes(&'pixels [u8]),
}

/// Describes image dimensions for the library.
pub struct Image<'pixels> {
    pub(crate) px: PixelsSource<'pixels>,
    width: usize,
    height: usize,
}

impl<'pixels> Image<'pixels> {
    /// Makes an image from RGBA pixels.
    ///
    /// See [`Attributes::new_image`]
    #[inline]
    pub fn new<VecRGBA>(attr: &Attributes, pixels: VecRGBA, width: usize, height: usize) -> Image<'static> where VecRGBA: Into<Box<[RGBA]>> {
        let pixels: Box<[RGBA]> = pixels.into();
        Image::new_internal(attr, PixelsSource::Pixels(Cow::Owned(pixels.into_vec())), width, height)
    }

    /// Describe dimensions of a slice of RGBA pixels.
    ///
    /// See [`Attributes::new_image_borrowed`]
    #[inline]
    pub fn new_borrowed(attr: &Attributes, bitmap: &'pixels [RGBA], width: usize, height: usize) -> Self {
        Self::new_internal(attr, PixelsSource::Pixels(Cow::Borrowed(bitmap)), width, height)
    }

    /// Describe dimensions of a flat RGBA byte buffer.
    ///
    /// See [`Attributes::new_image_bytes`]
    pub fn new_bytes(attr: &Attributes, bytes: &'pixels [u8], width: usize, height: usize) -> Self {
        let whole = bytes.len() / 4 * 4;
        if whole != bytes.len() {
            attr.verbose_print(format!("  ignoring {} trailing byte(s) after the last whole pixel", bytes.len() - whole));
        }
        Self::new_internal(attr, PixelsSource::Bytes(&bytes[..whole]), width, height)
    }

    fn new_internal(attr: &Attributes, px: PixelsSource<'pixels>, width: usize, height: usize) -> Self {
        let img = Self { px, width, height };
        let available = img.available_pixels();
        match width.checked_mul(height) {
            Some(area) if area <= available => {},
            _ => attr.verbose_print(format!(
                "  buffer has {available} pixels, which is not enough for {width}x{height}; only {available} will be counted",
            )),
        }
        img
    }

    #[inline]
    fn available_pixels(&self) -> usize {
        match &self.px {
            PixelsSource::Pixels(p) => p.len(),
            PixelsSource::Bytes(b) => b.len() / 4,
        }
    }

    /// Number of pixels that will be scanned: `width * height`, or fewer if the buffer is too short
    #[must_use]
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width.saturating_mul(self.height).min(self.available_pixels())
    }

    /// Width of the image in pixels
    #[must_use]
    #[inline(always)]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the image in pixels
    #[must_use]
    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height
    }
}

#[test]
fn send() {
    fn is_send<T: Send>() {}
    fn is_sync<T: Sync>() {}
    is_send::<Image<'static>>();
    is_sync::<Image<'static>>();
}

#[test]
fn truncates_to_whole_pixels() {
    let attr = Attributes::new();
    let bytes = [255u8; 4 * 3 + 2];

    let img = attr.new_image_bytes(&bytes, 3, 1);
    assert_eq!(3, img.pixel_count());
    assert!(matches!(img.px, PixelsSource::Bytes(b) if b.len() == 12));

    let img = attr.new_image_bytes(&bytes, 2, 1);
    assert_eq!(2, img.pixel_count());

    let img = attr.new_image_bytes(&bytes, 5, 5);
    assert_eq!(3, img.pixel_count());

    let img = attr.new_image_bytes(&bytes[..3], 1, 1);
    assert_eq!(0, img.pixel_count());
}

#[test]
fn takes_rgba() {
    let attr = Attributes::new();
    let px = vec![RGBA::new(1, 2, 3, 255); 8];

    assert_eq!(8, attr.new_image_borrowed(&px, 4, 2).pixel_count());
    assert_eq!(8, attr.new_image(px.clone(), 8, 1).pixel_count());
    assert_eq!(8, attr.new_image(&px[..], 9, 1).pixel_count());
    assert_eq!(0, attr.new_image(px, 0, 100).pixel_count());
    assert_eq!(0, attr.new_image_borrowed(&[], usize::MAX, usize::MAX).pixel_count());
}

#[test]
fn logs_short_buffers() {
    use std::sync::{Arc, Mutex};

    let log = Arc::new(Mutex::new(Vec::<String>::new()));
    let mut attr = Attributes::new();
    let sink = log.clone();
    attr.set_log_callback(move |_, msg| sink.lock().unwrap().push(msg.to_owned()));

    let bytes = [0u8; 9];
    attr.new_image_bytes(&bytes, 2, 1);
    attr.new_image_bytes(&bytes[..8], 2, 1);
    attr.new_image_bytes(&bytes[..8], 3, 1);

    let log = log.lock().unwrap();
    assert_eq!(2, log.len());
    assert!(log[0].contains("trailing"));
    assert!(log[1].contains("not enough"));
}
