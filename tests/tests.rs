use colorcount::*;

/// Left half red, right quarter translucent blue, the rest a green gradient
fn test_png(width: usize, height: usize) -> Vec<u8> {
    let mut px = Vec::with_capacity(width * height);
    for _y in 0..height {
        for x in 0..width {
            px.push(if x < width / 2 {
                RGBA::new(250, 10, 10, 255)
            } else if x >= width * 3 / 4 {
                RGBA::new(0, 0, 255, 60)
            } else {
                RGBA::new(0, (x * 255 / width) as u8, 0, 255)
            });
        }
    }
    lodepng::encode32(&px, width, height).unwrap()
}

#[test]
fn decoded_png() {
    let png = test_png(64, 32);
    let bitmap = lodepng::decode32(&png).unwrap();

    let mut attr = new();
    attr.set_max_colors(3).unwrap();
    let img = attr.new_image_borrowed(&bitmap.buffer, bitmap.width, bitmap.height);
    let res = attr.quantize(&img).unwrap();

    // 32 columns of red, 16 columns of green in 8-wide steps
    assert_eq!(48 * 32, res.opaque_pixels());
    let red = res.dominant().unwrap();
    assert_eq!("#f80808", red.color);
    assert_eq!(RGB::new(248, 8, 8), red.rgb);
    assert_eq!(32 * 32, red.count);
    assert_eq!(66.67, red.percentage);
    assert_eq!(3, res.colors().len());
    assert!(res.distinct_colors() > 3);
    assert!(res.colors().iter().all(|c| c.rgb.r == 0 || c.color == "#f80808"));
}

#[test]
fn median_cut_palette_of_png() {
    let png = test_png(64, 32);
    let bitmap = lodepng::decode32(&png).unwrap();
    let attr = Attributes::new();
    let img = attr.new_image_borrowed(&bitmap.buffer, bitmap.width, bitmap.height);

    let res = attr.palette(&img, 2).unwrap();
    assert_eq!(2, res.colors().len());
    let (red, green) = (&res.colors()[0], &res.colors()[1]);
    assert_eq!(("#f80808", 32 * 32, 66.67), (red.color.as_str(), red.count, red.percentage));
    assert_eq!((0, 16 * 32), (green.rgb.r, green.count));
    assert!(green.rgb.g > 100 && green.rgb.b == 0, "{green:?}");

    let dominant = attr.dominant_color(&img).unwrap().unwrap();
    assert_eq!(red, &dominant);
}

#[test]
fn bytes_like_canvas_data() {
    let png = test_png(40, 10);
    let bitmap = lodepng::decode32(&png).unwrap();
    let bytes: Vec<u8> = bitmap.buffer.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect();

    let from_fn = quantize(&bytes, 40, 10, 20, 32).unwrap();
    let attr = Attributes::new();
    let from_attr = attr.quantize(&attr.new_image_borrowed(&bitmap.buffer, 40, 10)).unwrap();
    assert_eq!(from_fn, from_attr.colors());

    // a stray extra byte doesn't change anything
    let mut padded = bytes.clone();
    padded.push(255);
    assert_eq!(from_fn, quantize(&padded, 40, 10, 20, 32).unwrap());
}

#[test]
fn lower_opacity_threshold_counts_translucent() {
    let png = test_png(40, 10);
    let bitmap = lodepng::decode32(&png).unwrap();

    let mut attr = Attributes::new();
    attr.set_min_opacity(50).unwrap();
    let res = attr.quantize(&attr.new_image_borrowed(&bitmap.buffer, 40, 10)).unwrap();
    assert_eq!(400, res.opaque_pixels());
    let blue = res.colors().iter().find(|c| c.color == "#0000f8").unwrap();
    assert_eq!(100, blue.count);
    assert_eq!(25., blue.percentage);
}

#[test]
fn histogram_of_several_images() {
    let attr = Attributes::new();
    let red = [RGBA::new(255, 0, 0, 255); 6];
    let white = vec![255u8; 4 * 2];

    let mut hist = Histogram::new(&attr);
    hist.add_image(&attr, &attr.new_image_borrowed(&red, 3, 2)).unwrap();
    hist.add_image(&attr, &attr.new_image_bytes(&white, 2, 1)).unwrap();
    hist.add_colors(&[HistogramEntry { color: RGBA::new(255, 255, 255, 255), count: 4 }]).unwrap();

    let res = hist.quantize(&attr).unwrap();
    assert_eq!(12, res.opaque_pixels());
    let summary: Vec<_> = res.colors().iter().map(|c| (c.color.as_str(), c.count, c.percentage)).collect();
    assert_eq!(vec![("#f80000", 6, 50.), ("#f8f8f8", 6, 50.)], summary);
}

#[test]
fn treemap_of_result() {
    let px = [
        RGBA::new(255, 0, 0, 255), RGBA::new(255, 0, 0, 255), RGBA::new(255, 0, 0, 255),
        RGBA::new(0, 0, 255, 255),
    ];
    let attr = Attributes::new();
    let res = attr.quantize(&attr.new_image_borrowed(&px, 2, 2)).unwrap();

    let mut tm = Treemap::new(120., 80.).unwrap();
    tm.set_padding(0.).unwrap();
    let tiles = res.treemap(&tm);
    assert_eq!(2, tiles.len());
    assert_eq!("#f80000", tiles[0].entry.color);
    let area = |t: &TreemapTile<'_>| t.width() * t.height();
    assert!((area(&tiles[0]) - 3. * area(&tiles[1])).abs() < 1e-6);

    let svg = tm.render_svg(res.colors());
    assert_eq!(2, svg.matches("<rect ").count());
    assert!(svg.contains(r##"fill="#0000f8""##));
}

#[test]
fn label_colors_are_hex() {
    let mut labels = LabelColors::new();
    let c = labels.color_for("person");
    let parsed: HexColor = c.to_string().parse().unwrap();
    assert_eq!(c, parsed);
}
