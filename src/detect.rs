use anyhow::{Context, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::cluster::{Cluster, TextRegion, cluster};
use crate::geometry::Polygon;

/// One detection as reported by an OCR engine, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub polygon: Vec<[f32; 2]>,
    pub text: String,
}

/// Source of text detections for an image. The OCR model stays behind this
/// trait; callers own the handle and reuse it across images.
pub trait TextDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>>;
}

/// Detections recorded ahead of time in a JSON file:
/// `[{"polygon": [[x, y], ...], "text": "..."}]`.
#[derive(Debug, Clone, Default)]
pub struct RegionsFile {
    detections: Vec<RawDetection>,
}

impl RegionsFile {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self { detections }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read regions: {}", path.display()))?;
        let detections: Vec<RawDetection> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse regions: {}", path.display()))?;
        debug!("loaded {} detections from {}", detections.len(), path.display());
        Ok(Self { detections })
    }

    pub fn detections(&self) -> &[RawDetection] {
        &self.detections
    }
}

impl TextDetector for RegionsFile {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>> {
        Ok(self.detections.clone())
    }
}

/// Turns raw detections into regions, dropping any with unusable polygons.
pub fn ingest(detections: Vec<RawDetection>) -> Vec<TextRegion> {
    ingest_indexed(detections)
        .into_iter()
        .map(|(_, region)| region)
        .collect()
}

/// Like [`ingest`], keeping each surviving region's index in `detections`.
pub fn ingest_indexed(detections: Vec<RawDetection>) -> Vec<(usize, TextRegion)> {
    detections
        .into_iter()
        .enumerate()
        .filter_map(|(idx, detection)| match Polygon::from_pairs(&detection.polygon) {
            Ok(polygon) => Some((idx, TextRegion::new(polygon, detection.text))),
            Err(err) => {
                warn!("skipping detection {}: {}", idx, err);
                None
            }
        })
        .collect()
}

/// Ingests and clusters `detections`. Cluster members index into
/// `detections` itself, so dropped entries leave gaps.
pub fn cluster_detections(
    detections: Vec<RawDetection>,
    proximity_threshold: f32,
) -> Vec<Cluster> {
    let (sources, regions): (Vec<usize>, Vec<TextRegion>) =
        ingest_indexed(detections).into_iter().unzip();
    let mut clusters = cluster(&regions, proximity_threshold);
    for bubble in &mut clusters {
        for member in &mut bubble.members {
            *member = sources[*member];
        }
    }
    clusters
}
