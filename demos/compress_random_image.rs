// Compress a random smooth image at several ranks and report the quality.

use ndarray::Array3;
use svd_image_compression::prelude::*;

pub fn main() {
    let (height, width) = (64, 48);
    let mut rng = rand::thread_rng();

    // A smooth gradient with some noise compresses well at low rank.
    let noise: Array3<f64> = random_image((height, width), ValueDomain::Normalized, &mut rng);
    let image = Array3::from_shape_fn((height, width, 3), |(row, col, channel)| {
        let gradient = (row as f64 / height as f64 + col as f64 / width as f64) / 2.0;
        let tint = [1.0, 0.8, 0.6][channel];
        0.9 * gradient * tint + 0.1 * noise[[row, col, channel]]
    });

    let compressor = ChannelCompressor::new(ValueDomain::Normalized);
    let decomposed = compressor.decompose_image(image.view()).unwrap();

    println!("Shape: {}x{}", height, width);
    for &k in [0, 1, 2, 5, 10, 20, decomposed.max_rank()].iter() {
        let compressed = decomposed.reconstruct(k).unwrap();
        let metrics = compressed.metrics(image.view()).unwrap();
        println!(
            "rank {:>3}: ratio {:>8.3}  psnr {:>8.3} dB  ssim {:.4}",
            k, compressed.compression_ratio, metrics.psnr, metrics.ssim
        );
    }

    let red = &decomposed.channels()[0];
    if let Some(term) = red.get(0) {
        println!("Leading red singular value: {:.2}", term.singular_value);
    }

    println!("Success.")
}
