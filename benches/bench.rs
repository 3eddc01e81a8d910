#![feature(test)]

extern crate test;
use test::Bencher;

use colorcount::*;

fn canvas(width: usize, height: usize) -> Vec<u8> {
    let mut seed = 0x9e3779b9u32;
    (0..width * height * 4).map(|i| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        // mostly opaque, with smooth-ish color runs
        if i % 4 == 3 { 200 | seed as u8 } else { (i / 97) as u8 ^ (seed as u8 & 15) }
    }).collect()
}

#[bench]
fn histogram(b: &mut Bencher) {
    let px = canvas(1024, 768);
    let attr = Attributes::new();
    b.iter(|| {
        let mut hist = Histogram::new(&attr);
        hist.add_image(&attr, &attr.new_image_bytes(&px, 1024, 768)).unwrap();
        hist
    });
}

#[bench]
fn quantize_p32(b: &mut Bencher) {
    let px = canvas(1024, 768);
    b.iter(|| quantize(&px, 1024, 768, 20, 32).unwrap());
}

#[bench]
fn quantize_p256(b: &mut Bencher) {
    let px = canvas(1024, 768);
    b.iter(|| quantize(&px, 1024, 768, 20, 256).unwrap());
}

#[bench]
fn treemap(b: &mut Bencher) {
    let px = canvas(512, 512);
    let colors = quantize(&px, 512, 512, 200, 32).unwrap();
    let tm = Treemap::new(800., 600.).unwrap();
    b.iter(|| tm.layout(&colors).len());
}
