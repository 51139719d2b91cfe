//! Color quantization: images in, K-color images out

use crate::model::{fit_kmeans, KMeansModel, KMeansParams, RunState};
use anyhow::Context;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::Array2;
use plotters::prelude::*;
use std::path::Path;
use tracing::{debug, info};

const SWATCH_BACKGROUND: Rgb<u8> = Rgb([30, 30, 30]);

/// How 8-bit channels are mapped into point coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelScale {
    /// Keep 0..=255
    #[default]
    Byte,
    /// Divide by 255 so every coordinate lies in 0..=1
    Unit,
}

impl ChannelScale {
    fn to_byte_factor(self) -> f64 {
        match self {
            ChannelScale::Byte => 1.0,
            ChannelScale::Unit => 255.0,
        }
    }
}

/// Summary of one quantization run
#[derive(Debug, Clone)]
pub struct CompressionReport {
    pub width: u32,
    pub height: u32,
    /// Centroid colors, index = cluster label
    pub palette: Vec<Rgb<u8>>,
    pub iterations: usize,
    pub cost: f64,
    pub state: RunState,
    pub seed: u64,
}

impl CompressionReport {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Flatten an image into an `(width * height, 3)` matrix, row-major, R,G,B columns
pub fn image_to_points(img: &RgbImage, scale: ChannelScale) -> Array2<f64> {
    let factor = scale.to_byte_factor();
    let n_pixels = img.width() as usize * img.height() as usize;
    let raw = img.as_raw();
    Array2::from_shape_fn((n_pixels, 3), |(i, c)| raw[i * 3 + c] as f64 / factor)
}

/// Round centroids back to 8-bit colors
pub fn centroid_colors(centroids: &Array2<f64>, scale: ChannelScale) -> Vec<Rgb<u8>> {
    let factor = scale.to_byte_factor();
    centroids
        .outer_iter()
        .map(|row| {
            let mut channels = [0u8; 3];
            for (dst, &v) in channels.iter_mut().zip(row.iter()) {
                *dst = (v * factor).round().clamp(0.0, 255.0) as u8;
            }
            Rgb(channels)
        })
        .collect()
}

/// Rebuild an image where pixel `i` takes the color of centroid `labels[i]`
pub fn points_to_image(
    model: &KMeansModel,
    width: u32,
    height: u32,
    scale: ChannelScale,
) -> crate::Result<RgbImage> {
    let expected = width as usize * height as usize;
    if model.labels.len() != expected {
        anyhow::bail!(
            "label count {} does not match image size {}x{}",
            model.labels.len(),
            width,
            height
        );
    }

    let palette = centroid_colors(&model.centroids, scale);
    Ok(RgbImage::from_fn(width, height, |x, y| {
        let i = y as usize * width as usize + x as usize;
        palette[model.labels[i]]
    }))
}

/// Quantize an in-memory image to `params.n_clusters` colors
pub fn quantize(
    img: &RgbImage,
    params: &KMeansParams,
    scale: ChannelScale,
) -> crate::Result<(RgbImage, CompressionReport)> {
    let (width, height) = img.dimensions();
    let points = image_to_points(img, scale);
    debug!(width, height, k = params.n_clusters, "quantizing image");

    let model = fit_kmeans(&points, params)?;
    let output = points_to_image(&model, width, height, scale)?;

    let report = CompressionReport {
        width,
        height,
        palette: centroid_colors(&model.centroids, scale),
        iterations: model.iterations,
        cost: model.cost,
        state: model.state,
        seed: model.seed,
    };
    Ok((output, report))
}

/// Decode `input`, quantize it and encode the result to `output`
///
/// The output format follows the file extension of `output`.
pub fn compress_image<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    params: &KMeansParams,
    scale: ChannelScale,
) -> crate::Result<(RgbImage, RgbImage, CompressionReport)> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let original = load_rgb(input)?;
    let (compressed, report) = quantize(&original, params, scale)?;

    compressed
        .save(output)
        .with_context(|| format!("cannot write image {}", output.display()))?;
    info!(output = %output.display(), colors = report.palette.len(), "compressed image saved");

    Ok((original, compressed, report))
}

/// Decode any supported raster file into 8-bit RGB
pub fn load_rgb<P: AsRef<Path>>(path: P) -> crate::Result<RgbImage> {
    let path = path.as_ref();
    let img = image::open(path).with_context(|| format!("cannot read image {}", path.display()))?;
    Ok(img.to_rgb8())
}

/// Grid of palette tiles, `cols` per row, optionally numbered by cluster index
pub fn palette_swatch(
    palette: &[Rgb<u8>],
    tile: u32,
    cols: u32,
    annotate: bool,
) -> crate::Result<RgbImage> {
    let cols = cols.max(1);
    let rows = (palette.len() as u32).div_ceil(cols).max(1);
    let mut img = RgbImage::from_pixel(cols * tile, rows * tile, SWATCH_BACKGROUND);

    for (k, &color) in palette.iter().enumerate() {
        let (r, c) = (k as u32 / cols, k as u32 % cols);
        for y in r * tile..(r + 1) * tile {
            for x in c * tile..(c + 1) * tile {
                img.put_pixel(x, y, color);
            }
        }
    }

    if annotate {
        let labels: Vec<_> = (0..palette.len() as u32)
            .map(|k| {
                let (r, c) = (k / cols, k % cols);
                let at = ((c * tile + 4) as i32, (r * tile + tile / 2) as i32);
                (k.to_string(), at, (tile / 3).max(8))
            })
            .collect();
        overlay_labels(&mut img, &labels)?;
    }
    Ok(img)
}

/// Place two images next to each other at a common height
///
/// `captions` are drawn in the top-left corner of each half.
pub fn side_by_side(
    left: &RgbImage,
    right: &RgbImage,
    captions: Option<[&str; 2]>,
) -> crate::Result<RgbImage> {
    let target_h = left.height().max(right.height());
    let left = fit_height(left, target_h);
    let right = fit_height(right, target_h);

    let mut out = RgbImage::new(left.width() + right.width(), target_h);
    imageops::replace(&mut out, &left, 0, 0);
    imageops::replace(&mut out, &right, left.width() as i64, 0);

    if let Some([left_caption, right_caption]) = captions {
        let labels = [
            (left_caption.to_string(), (10, 10), 20),
            (right_caption.to_string(), (left.width() as i32 + 10, 10), 20),
        ];
        overlay_labels(&mut out, &labels)?;
    }
    Ok(out)
}

/// Draw white text straight into the pixel buffer: (text, top-left, font size)
fn overlay_labels(img: &mut RgbImage, labels: &[(String, (i32, i32), u32)]) -> crate::Result<()> {
    if labels.is_empty() {
        return Ok(());
    }
    let dims = img.dimensions();
    let area = BitMapBackend::with_buffer(&mut **img, dims).into_drawing_area();
    for (text, at, size) in labels {
        area.draw(&Text::new(
            text.as_str(),
            *at,
            ("sans-serif", *size).into_font().color(&WHITE),
        ))?;
    }
    area.present()?;
    debug!(count = labels.len(), "text overlays drawn");
    Ok(())
}

fn fit_height(img: &RgbImage, target_h: u32) -> RgbImage {
    if img.height() == target_h || img.height() == 0 {
        return img.clone();
    }
    let scale = target_h as f64 / img.height() as f64;
    let width = ((img.width() as f64 * scale).round() as u32).max(1);
    imageops::resize(img, width, target_h, FilterType::Triangle)
}

/// Square split into red, green, blue and yellow quadrants
pub fn test_pattern(size: u32) -> RgbImage {
    let half = size / 2;
    RgbImage::from_fn(size, size, |x, y| match (x < half, y < half) {
        (true, true) => Rgb([255, 0, 0]),
        (false, true) => Rgb([0, 255, 0]),
        (true, false) => Rgb([0, 0, 255]),
        (false, false) => Rgb([255, 255, 0]),
    })
}
