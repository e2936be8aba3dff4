pub mod cluster;
pub mod detect;
pub mod error;
pub mod fit;
pub mod fonts;
pub mod geometry;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod settings;
pub mod translate;

pub use cluster::{Cluster, DEFAULT_PROXIMITY_THRESHOLD, TextRegion, cluster, cluster_polygons};
pub use detect::{
    RawDetection, RegionsFile, TextDetector, cluster_detections, ingest, ingest_indexed,
};
pub use error::{FontLoadError, GeometryError};
pub use fit::{
    BackgroundSampler, FitConfig, FontCache, FontFace, PlacedLine, RenderPlan, Rgb, Rgba,
    TextExtent, TextMeasure, plan, plan_all, plan_with_font_path,
};
pub use fonts::FontResolver;
pub use geometry::{BoundingBox, PixelRect, Point, Polygon};
pub use pipeline::{
    ClusterFailure, FailurePolicy, PipelineOptions, PipelineOutput, translate_image,
};
pub use translate::{Passthrough, Translate, TranslationOutcome, TranslationTable};
