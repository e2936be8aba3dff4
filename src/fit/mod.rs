mod color;
mod font;
mod layout;

use std::path::Path;

use serde::Serialize;

use crate::error::FontLoadError;
use crate::geometry::{BoundingBox, PixelRect};

pub use color::{BackgroundSampler, LUMINANCE_THRESHOLD, Rgb, Rgba, text_color_for};
pub use font::{FontCache, FontFace, TextExtent, TextMeasure};
pub use layout::{best_font_size, fits, wrap_text};

/// Sizing knobs for [`plan`]. Defaults: sizes 4..=100, 5px padding, fill alpha 160.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    pub min_font_size: u32,
    pub max_font_size: u32,
    pub padding: i32,
    pub fill_alpha: u8,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_font_size: 4,
            max_font_size: 100,
            padding: 5,
            fill_alpha: 160,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedLine {
    pub text: String,
    /// Top-left draw origin.
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Everything the drawing side needs for one bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderPlan {
    pub fill_rect: PixelRect,
    pub fill: Rgba,
    pub font_size: u32,
    pub lines: Vec<PlacedLine>,
    pub text_color: Rgb,
}

pub fn plan<M, S>(
    bbox: &BoundingBox,
    text: &str,
    measure: &M,
    sampler: &S,
    config: &FitConfig,
) -> RenderPlan
where
    M: TextMeasure + ?Sized,
    S: BackgroundSampler + ?Sized,
{
    let rect = bbox.to_pixels();

    let sample_x = (rect.x_min as i64 + rect.x_max as i64).div_euclid(2);
    let sample_y = rect.y_max as i64 + 1;
    let background = sampler.sample(sample_x, sample_y).unwrap_or(Rgb::BLACK);

    let inset = config.padding.saturating_mul(2);
    let max_width = rect.width().saturating_sub(inset).max(1);
    let max_height = rect.height().saturating_sub(inset).max(1);

    let font_size = best_font_size(
        text,
        measure,
        max_width,
        max_height,
        config.min_font_size,
        config.max_font_size.max(config.min_font_size),
    );
    let block = layout::layout_block(text, measure, font_size, max_width);

    let mut y = rect
        .y_min
        .saturating_add(max_height.saturating_sub(block.total_height).div_euclid(2));
    let lines = block
        .lines
        .into_iter()
        .map(|(text, extent)| {
            let line = PlacedLine {
                text,
                x: rect
                    .x_min
                    .saturating_add(max_width.saturating_sub(extent.width).div_euclid(2)),
                y,
                width: extent.width,
                height: extent.height,
            };
            y = y.saturating_add(extent.height);
            line
        })
        .collect();

    RenderPlan {
        fill_rect: rect,
        fill: background.with_alpha(config.fill_alpha),
        font_size,
        lines,
        text_color: text_color_for(background),
    }
}

/// [`plan`] with the font resolved through `cache`.
pub fn plan_with_font_path<S>(
    bbox: &BoundingBox,
    text: &str,
    font_path: &Path,
    sampler: &S,
    config: &FitConfig,
    cache: &FontCache,
) -> Result<RenderPlan, FontLoadError>
where
    S: BackgroundSampler + ?Sized,
{
    let font = cache.load(font_path)?;
    Ok(plan(bbox, text, &font, sampler, config))
}

/// One bubble to fit: its rectangle and the text to place in it.
#[derive(Debug, Clone)]
pub struct PlanJob<'a> {
    pub bbox: BoundingBox,
    pub text: &'a str,
}

/// Plans every job, spread across worker threads. Output order matches `jobs`.
pub fn plan_all<M, S>(
    jobs: &[PlanJob<'_>],
    measure: &M,
    sampler: &S,
    config: &FitConfig,
) -> Vec<RenderPlan>
where
    M: TextMeasure + Sync + ?Sized,
    S: BackgroundSampler + Sync + ?Sized,
{
    let workers = num_cpus::get().max(1).min(jobs.len());
    if workers <= 1 {
        return jobs
            .iter()
            .map(|job| plan(&job.bbox, job.text, measure, sampler, config))
            .collect();
    }

    let chunk = jobs.len().div_ceil(workers);
    std::thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .chunks(chunk)
            .map(|batch| {
                scope.spawn(move || {
                    batch
                        .iter()
                        .map(|job| plan(&job.bbox, job.text, measure, sampler, config))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(plans) => plans,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
