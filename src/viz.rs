//! Visualization functions using Plotters for 2D clustering runs
//!
//! Points are projected onto the canvas through a [`Viewport`] and drawn in
//! backend pixel coordinates. Animations are GIF files with one frame per
//! recorded assign step.

use crate::model::KMeansModel;
use anyhow::Context;
use ndarray::{Array1, Array2, ArrayView1};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use tracing::{debug, info};

const BACKGROUND: RGBColor = RGBColor(30, 30, 30);
const SUBTITLE: RGBColor = RGBColor(200, 200, 200);

/// Color palette for clusters, reused modulo its length
pub const PALETTE: [RGBColor; 30] = [
    RGBColor(230, 25, 75),
    RGBColor(60, 180, 75),
    RGBColor(255, 225, 25),
    RGBColor(0, 130, 200),
    RGBColor(245, 130, 48),
    RGBColor(145, 30, 180),
    RGBColor(70, 240, 240),
    RGBColor(240, 50, 230),
    RGBColor(210, 245, 60),
    RGBColor(250, 190, 190),
    RGBColor(0, 128, 128),
    RGBColor(230, 190, 255),
    RGBColor(170, 110, 40),
    RGBColor(255, 250, 200),
    RGBColor(128, 0, 0),
    RGBColor(170, 255, 195),
    RGBColor(128, 128, 0),
    RGBColor(255, 215, 180),
    RGBColor(0, 0, 128),
    RGBColor(128, 128, 128),
    RGBColor(255, 20, 147),
    RGBColor(50, 205, 50),
    RGBColor(255, 140, 0),
    RGBColor(138, 43, 226),
    RGBColor(0, 255, 255),
    RGBColor(255, 105, 180),
    RGBColor(34, 139, 34),
    RGBColor(255, 69, 0),
    RGBColor(72, 61, 139),
    RGBColor(255, 192, 203),
];

pub fn palette_color(cluster: usize) -> RGBColor {
    PALETTE[cluster % PALETTE.len()]
}

/// Rendering options shared by still images and animations
#[derive(Debug, Clone, Copy)]
pub struct FrameStyle {
    /// Draw captions (needs a system font)
    pub annotate: bool,
    /// Canvas size in pixels
    pub size: (u32, u32),
    /// Margin between the data bounding box and the canvas edge
    pub pad: i32,
    pub point_radius: i32,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            annotate: true,
            size: (900, 700),
            pad: 40,
            point_radius: 3,
        }
    }
}

/// Linear map from the data bounding box onto the canvas, y pointing up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub width: u32,
    pub height: u32,
    pub pad: i32,
}

impl Viewport {
    /// Bounding box of the first two columns of `points`.
    ///
    /// An axis with zero extent is widened by one unit.
    pub fn fit(points: &Array2<f64>, width: u32, height: u32, pad: i32) -> Self {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points.outer_iter() {
            min_x = min_x.min(p[0]);
            max_x = max_x.max(p[0]);
            min_y = min_y.min(p[1]);
            max_y = max_y.max(p[1]);
        }
        if points.nrows() == 0 {
            (min_x, min_y, max_x, max_y) = (0.0, 0.0, 1.0, 1.0);
        }

        if max_x - min_x == 0.0 {
            max_x = min_x + 1.0;
        }
        if max_y - min_y == 0.0 {
            max_y = min_y + 1.0;
        }

        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            width,
            height,
            pad,
        }
    }

    pub fn to_canvas(&self, x: f64, y: f64) -> (i32, i32) {
        let pad = self.pad as f64;
        let sx = (self.width as f64 - 2.0 * pad) / (self.max_x - self.min_x);
        let sy = (self.height as f64 - 2.0 * pad) / (self.max_y - self.min_y);

        let cx = pad + (x - self.min_x) * sx;
        let cy = self.height as f64 - (pad + (y - self.min_y) * sy);
        (cx.round() as i32, cy.round() as i32)
    }

    pub fn project(&self, point: &ArrayView1<f64>) -> (i32, i32) {
        self.to_canvas(point[0], point[1])
    }
}

/// Everything drawn on one canvas
pub struct Scene<'a> {
    pub points: &'a Array2<f64>,
    pub labels: &'a Array1<usize>,
    /// Centroid positions over time, oldest first
    pub trail: Vec<&'a Array2<f64>>,
    pub centroids: &'a Array2<f64>,
    pub caption: Vec<String>,
}

fn draw_cross<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    (x, y): (i32, i32),
    size: i32,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let style = WHITE.stroke_width(2);
    area.draw(&PathElement::new(vec![(x - size, y), (x + size, y)], style))?;
    area.draw(&PathElement::new(vec![(x, y - size), (x, y + size)], style))?;
    Ok(())
}

fn draw_scene<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    viewport: &Viewport,
    scene: &Scene<'_>,
    style: &FrameStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    area.fill(&BACKGROUND)?;

    for (point, &label) in scene.points.outer_iter().zip(scene.labels.iter()) {
        let color = palette_color(label);
        area.draw(&Circle::new(
            viewport.project(&point),
            style.point_radius,
            color.filled(),
        ))?;
    }

    // centroid trajectories
    for step in scene.trail.windows(2) {
        for (from, to) in step[0].outer_iter().zip(step[1].outer_iter()) {
            area.draw(&PathElement::new(
                vec![viewport.project(&from), viewport.project(&to)],
                WHITE.stroke_width(1),
            ))?;
        }
    }

    for centroid in scene.centroids.outer_iter() {
        draw_cross(area, viewport.project(&centroid), 8)?;
    }

    if style.annotate {
        let mut y = 20;
        for (i, line) in scene.caption.iter().enumerate() {
            let (size, color) = if i == 0 { (28, WHITE) } else { (20, SUBTITLE) };
            area.draw(&Text::new(
                line.clone(),
                (20, y),
                ("sans-serif", size).into_font().color(&color),
            ))?;
            y += size + 12;
        }
    }

    Ok(())
}

/// GIF canvas with an explicit lifecycle: create, draw frames, finish
pub struct Animator {
    area: DrawingArea<BitMapBackend<'static>, Shift>,
    viewport: Viewport,
    style: FrameStyle,
    frames: usize,
}

impl Animator {
    pub fn create<P: AsRef<Path>>(
        path: P,
        viewport: Viewport,
        delay_ms: u32,
        style: FrameStyle,
    ) -> crate::Result<Self> {
        let path = path.as_ref();
        let backend = BitMapBackend::gif(path, (viewport.width, viewport.height), delay_ms)
            .with_context(|| format!("cannot create animation {}", path.display()))?;
        Ok(Self {
            area: backend.into_drawing_area(),
            viewport,
            style,
            frames: 0,
        })
    }

    /// Draw the scene and append it as the next frame
    pub fn draw_frame(&mut self, scene: &Scene<'_>) -> crate::Result<()> {
        draw_scene(&self.area, &self.viewport, scene, &self.style)?;
        self.area.present()?;
        self.frames += 1;
        Ok(())
    }

    /// Close the animation, returning the number of frames written
    pub fn finish(self) -> crate::Result<usize> {
        let frames = self.frames;
        drop(self.area);
        Ok(frames)
    }
}

/// Write one GIF frame per recorded iteration plus a closing frame
///
/// # Arguments
/// * `points` - 2D points the model was fitted on
/// * `model` - Model fitted with history recording enabled
/// * `output_path` - Path of the GIF file
/// * `delay_ms` - Time each frame stays on screen
pub fn render_animation<P: AsRef<Path>>(
    points: &Array2<f64>,
    model: &KMeansModel,
    output_path: P,
    delay_ms: u32,
    style: &FrameStyle,
) -> crate::Result<usize> {
    if model.history.is_empty() {
        anyhow::bail!("model was fitted without iteration history");
    }

    let (width, height) = style.size;
    let viewport = Viewport::fit(points, width, height, style.pad);
    let mut animator = Animator::create(output_path.as_ref(), viewport, delay_ms, *style)?;
    let header = format!("Clusters K={} | Points: {}", model.n_clusters, points.nrows());

    for (h, snapshot) in model.history.iter().enumerate() {
        let scene = Scene {
            points,
            labels: &snapshot.labels,
            trail: model.history[..=h].iter().map(|s| &s.centroids).collect(),
            centroids: &snapshot.centroids,
            caption: vec![
                format!("Iteration {}/{}", snapshot.iteration, model.iterations),
                header.clone(),
            ],
        };
        animator.draw_frame(&scene)?;
        debug!(iteration = snapshot.iteration, "frame rendered");
    }

    animator.draw_frame(&final_scene(points, model, header))?;
    let frames = animator.finish()?;
    info!(frames, path = %output_path.as_ref().display(), "animation saved");
    Ok(frames)
}

fn final_scene<'a>(points: &'a Array2<f64>, model: &'a KMeansModel, header: String) -> Scene<'a> {
    let mut trail: Vec<&Array2<f64>> = if model.history.is_empty() {
        vec![&model.initial_centroids]
    } else {
        model.history.iter().map(|s| &s.centroids).collect()
    };
    trail.push(&model.centroids);

    Scene {
        points,
        labels: &model.labels,
        trail,
        centroids: &model.centroids,
        caption: vec![
            format!("Finished ({:?}) after {} iterations", model.state, model.iterations),
            header,
            format!("Cost: {:.3}", model.cost),
        ],
    }
}

/// Create a PNG of the final clustering with centroid trajectories
pub fn create_cluster_visualization<P: AsRef<Path>>(
    points: &Array2<f64>,
    model: &KMeansModel,
    output_path: P,
    style: &FrameStyle,
) -> crate::Result<()> {
    let output_path = output_path.as_ref();
    let (width, height) = style.size;
    let viewport = Viewport::fit(points, width, height, style.pad);

    let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
    let header = format!("Clusters K={} | Points: {}", model.n_clusters, points.nrows());
    draw_scene(&root, &viewport, &final_scene(points, model, header), style)?;
    root.present()?;
    info!(path = %output_path.display(), "cluster plot saved");

    Ok(())
}

/// Create a simple bar chart of cluster sizes
pub fn create_cluster_size_chart<P: AsRef<Path>>(
    model: &KMeansModel,
    output_path: P,
    style: &FrameStyle,
) -> crate::Result<()> {
    let output_path = output_path.as_ref();
    let cluster_sizes = model.cluster_sizes();
    let max_size = *cluster_sizes.iter().max().unwrap_or(&1) as f64;

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(10);
    if style.annotate {
        builder
            .caption("Cluster Sizes", ("sans-serif", 30))
            .x_label_area_size(40)
            .y_label_area_size(50);
    }
    let mut chart =
        builder.build_cartesian_2d(0f64..(model.n_clusters as f64), 0f64..(max_size * 1.1))?;

    if style.annotate {
        chart
            .configure_mesh()
            .x_desc("Cluster ID")
            .y_desc("Number of Points")
            .axis_desc_style(("sans-serif", 15))
            .draw()?;
    }

    chart.draw_series(cluster_sizes.iter().enumerate().map(|(cluster_id, &size)| {
        Rectangle::new(
            [
                (cluster_id as f64 + 0.1, 0.0),
                (cluster_id as f64 + 0.9, size as f64),
            ],
            palette_color(cluster_id).filled(),
        )
    }))?;

    root.present()?;
    info!(path = %output_path.display(), "cluster size chart saved");

    Ok(())
}

/// Print cluster statistics to console
pub fn print_cluster_statistics(points: &Array2<f64>, model: &KMeansModel) {
    println!("\n=== Cluster Statistics ===");
    println!("Number of clusters: {}", model.n_clusters);
    println!("Total points: {}", points.nrows());
    println!("Iterations: {} ({:?})", model.iterations, model.state);
    println!("Within-cluster sum of squares: {:.4}", model.cost);

    let silhouette_score = model.compute_silhouette_sample(points, 500);
    println!("Silhouette score (sample): {:.3}", silhouette_score);

    println!("\nCluster sizes:");
    for (i, &size) in model.cluster_sizes().iter().enumerate() {
        let percentage = (size as f64 / points.nrows() as f64) * 100.0;
        println!("  Cluster {}: {} points ({:.1}%)", i, size, percentage);
    }

    println!("\nCentroids:");
    for (i, centroid) in model.centroids.outer_iter().enumerate() {
        let coords: Vec<String> = centroid.iter().map(|v| format!("{:.4}", v)).collect();
        println!("  {:7} | {}", i, coords.join(", "));
    }
}
