use anyhow::{Context, Result};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::cluster::{Cluster, cluster};
use crate::detect::{TextDetector, ingest};
use crate::fit::{FitConfig, FontCache, FontFace, PlanJob, RenderPlan, plan_all};
use crate::fonts::FontResolver;
use crate::render::{rasterize, render_svg};
use crate::settings::Settings;
use crate::translate::{Translate, TranslationOutcome, translate_batch};

/// What to draw for a bubble whose translation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Draw the placeholder text in place of the translation.
    #[default]
    Placeholder,
    /// Leave the bubble untouched.
    Skip,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub source_lang: String,
    pub target_lang: String,
    pub proximity_threshold: f32,
    pub fit: FitConfig,
    pub failure_policy: FailurePolicy,
    pub placeholder: String,
    /// Skips the per-language lookup when set.
    pub font_path: Option<PathBuf>,
    pub output_format: ImageFormat,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings, source_lang: &str, target_lang: &str) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            proximity_threshold: settings.proximity_threshold,
            fit: settings.fit,
            failure_policy: settings.failure_policy,
            placeholder: settings.placeholder.clone(),
            font_path: None,
            output_format: ImageFormat::Png,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterFailure {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Encoded output image.
    pub image: Vec<u8>,
    pub clusters: Vec<Cluster>,
    /// One entry per cluster; `None` when nothing was drawn for it.
    pub plans: Vec<Option<RenderPlan>>,
    pub failures: Vec<ClusterFailure>,
}

impl PipelineOutput {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Detects, clusters, translates and redraws the text of one image.
///
/// Only undecodable input and output encoding errors abort the call. Font and
/// translation problems are recorded per cluster in
/// [`PipelineOutput::failures`] and the remaining bubbles still render.
pub fn translate_image(
    image_bytes: &[u8],
    detector: &dyn TextDetector,
    translator: &dyn Translate,
    fonts: &FontResolver,
    cache: &FontCache,
    options: &PipelineOptions,
) -> Result<PipelineOutput> {
    let image =
        image::load_from_memory(image_bytes).with_context(|| "failed to decode input image")?;
    let detections = detector
        .detect(&image)
        .with_context(|| "text detection failed")?;
    let regions = ingest(detections);
    let clusters = cluster(&regions, options.proximity_threshold);
    info!(
        "{} regions merged into {} bubbles",
        regions.len(),
        clusters.len()
    );

    let texts: Vec<String> = clusters.iter().map(|c| c.text.clone()).collect();
    let outcomes = translate_batch(
        translator,
        &texts,
        &options.source_lang,
        &options.target_lang,
    );

    let mut failures = Vec::new();
    let mut pending: Vec<(usize, &str)> = Vec::new();
    for (index, outcome) in outcomes.iter().enumerate() {
        match outcome {
            TranslationOutcome::Ok(text) => pending.push((index, text.as_str())),
            TranslationOutcome::Failed(reason) => {
                warn!("bubble {}: translation failed: {}", index, reason);
                failures.push(ClusterFailure {
                    index,
                    reason: format!("translation failed: {}", reason),
                });
                if options.failure_policy == FailurePolicy::Placeholder {
                    pending.push((index, options.placeholder.as_str()));
                }
            }
        }
    }

    let mut plans: Vec<Option<RenderPlan>> = vec![None; clusters.len()];
    let font = match load_font(fonts, cache, options) {
        Ok(font) => Some(font),
        Err(reason) => {
            warn!(
                "no usable font, leaving {} bubbles unrendered: {}",
                pending.len(),
                reason
            );
            for (index, _) in &pending {
                failures.push(ClusterFailure {
                    index: *index,
                    reason: reason.clone(),
                });
            }
            None
        }
    };

    if let Some(font) = &font {
        let jobs: Vec<PlanJob<'_>> = pending
            .iter()
            .map(|&(index, text)| PlanJob {
                bbox: clusters[index].bbox,
                text,
            })
            .collect();
        let fitted = plan_all(&jobs, font, &image, &options.fit);
        for (&(index, _), plan) in pending.iter().zip(fitted) {
            debug!(
                "bubble {}: size {} with {} lines",
                index,
                plan.font_size,
                plan.lines.len()
            );
            plans[index] = Some(plan);
        }
    }
    failures.sort_by_key(|failure| failure.index);

    let drawn: Vec<RenderPlan> = plans.iter().flatten().cloned().collect();
    let svg = render_svg(&image, &drawn, font.as_ref())?;
    let encoded = rasterize(&svg, font.as_ref(), options.output_format)?;

    Ok(PipelineOutput {
        image: encoded,
        clusters,
        plans,
        failures,
    })
}

fn load_font(
    fonts: &FontResolver,
    cache: &FontCache,
    options: &PipelineOptions,
) -> std::result::Result<FontFace, String> {
    let path = match &options.font_path {
        Some(path) => path.clone(),
        None => fonts
            .resolve(&options.target_lang)
            .map_err(|err| err.to_string())?,
    };
    cache.load(&path).map_err(|err| err.to_string())
}
