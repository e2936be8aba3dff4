use serde::Serialize;

use crate::error::GeometryError;
use crate::geometry::{BoundingBox, Polygon};

pub const DEFAULT_PROXIMITY_THRESHOLD: f32 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    pub polygon: Polygon,
    pub text: String,
}

impl TextRegion {
    pub fn new(polygon: Polygon, text: impl Into<String>) -> Self {
        Self {
            polygon,
            text: text.into(),
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        self.polygon.bbox()
    }
}

/// One speech bubble: the union of its member regions and their joined text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub bbox: BoundingBox,
    pub text: String,
    /// Input indices of the merged regions, in merge order.
    pub members: Vec<usize>,
}

impl Cluster {
    fn seed(index: usize, bbox: BoundingBox, text: &str) -> Self {
        Self {
            bbox,
            text: text.to_string(),
            members: vec![index],
        }
    }

    fn absorb(&mut self, index: usize, bbox: &BoundingBox, text: &str) {
        self.bbox = self.bbox.union(bbox);
        self.text.push(' ');
        self.text.push_str(text);
        self.members.push(index);
    }

    pub fn source_count(&self) -> usize {
        self.members.len()
    }
}

/// Greedily merges regions whose boxes are within `proximity_threshold`.
///
/// Each cluster is seeded with the first unclaimed region. Candidates are
/// tested against the cluster's running rectangle, and every merge restarts
/// the scan because the grown rectangle may now reach regions skipped
/// earlier. Output order follows seed order.
pub fn cluster(regions: &[TextRegion], proximity_threshold: f32) -> Vec<Cluster> {
    let threshold = proximity_threshold.max(0.0);
    let boxes: Vec<BoundingBox> = regions.iter().map(TextRegion::bbox).collect();
    let mut claimed = vec![false; regions.len()];
    let mut clusters = Vec::new();

    for seed in 0..regions.len() {
        if claimed[seed] {
            continue;
        }
        claimed[seed] = true;
        let mut current = Cluster::seed(seed, boxes[seed], &regions[seed].text);

        let mut idx = seed + 1;
        while idx < regions.len() {
            if !claimed[idx] && current.bbox.is_close(&boxes[idx], threshold) {
                claimed[idx] = true;
                current.absorb(idx, &boxes[idx], &regions[idx].text);
                idx = seed + 1;
            } else {
                idx += 1;
            }
        }
        clusters.push(current);
    }

    clusters
}

/// Validates raw point lists paired with their texts, then clusters them.
pub fn cluster_polygons(
    polygons: &[Vec<[f32; 2]>],
    texts: &[String],
    proximity_threshold: f32,
) -> Result<Vec<Cluster>, GeometryError> {
    if polygons.len() != texts.len() {
        return Err(GeometryError::LengthMismatch {
            polygons: polygons.len(),
            texts: texts.len(),
        });
    }
    let regions = polygons
        .iter()
        .zip(texts)
        .map(|(points, text)| Ok(TextRegion::new(Polygon::from_pairs(points)?, text.clone())))
        .collect::<Result<Vec<_>, GeometryError>>()?;
    Ok(cluster(&regions, proximity_threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x0: f32, y0: f32, x1: f32, y1: f32, text: &str) -> TextRegion {
        let polygon = Polygon::from_pairs(&[[x0, y0], [x1, y0], [x1, y1], [x0, y1]]).unwrap();
        TextRegion::new(polygon, text)
    }

    fn hi_there() -> Vec<TextRegion> {
        vec![
            region(0.0, 0.0, 50.0, 20.0, "Hi"),
            region(55.0, 0.0, 100.0, 20.0, "There"),
        ]
    }

    #[test]
    fn empty_input_yields_no_clusters() {
        assert!(cluster(&[], DEFAULT_PROXIMITY_THRESHOLD).is_empty());
    }

    #[test]
    fn single_region_is_its_own_cluster() {
        let regions = vec![region(3.0, 4.0, 10.0, 12.0, "solo")];
        let clusters = cluster(&regions, 30.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].text, "solo");
        assert_eq!(clusters[0].members, vec![0]);
        assert_eq!(clusters[0].bbox, BoundingBox::new(3.0, 4.0, 10.0, 12.0));
    }

    #[test]
    fn adjacent_regions_merge_under_wide_threshold() {
        let clusters = cluster(&hi_there(), 10.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].bbox, BoundingBox::new(0.0, 0.0, 100.0, 20.0));
        assert_eq!(clusters[0].text, "Hi There");
    }

    #[test]
    fn adjacent_regions_stay_apart_under_narrow_threshold() {
        // 50 + 2 < 55
        let clusters = cluster(&hi_there(), 2.0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].text, "Hi");
        assert_eq!(clusters[1].text, "There");
    }

    #[test]
    fn zero_threshold_merges_only_touching_boxes() {
        let regions = vec![
            region(0.0, 0.0, 10.0, 10.0, "a"),
            region(10.0, 0.0, 20.0, 10.0, "b"),
            region(21.0, 0.0, 30.0, 10.0, "c"),
        ];
        let clusters = cluster(&regions, 0.0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].text, "a b");
        assert_eq!(clusters[1].text, "c");
    }

    #[test]
    fn merge_restarts_scan_to_pick_up_skipped_regions() {
        // "far" is out of reach of the seed but reachable once "bridge" is merged.
        let regions = vec![
            region(0.0, 0.0, 10.0, 10.0, "seed"),
            region(36.0, 0.0, 50.0, 10.0, "far"),
            region(15.0, 0.0, 30.0, 10.0, "bridge"),
        ];
        let clusters = cluster(&regions, 8.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].text, "seed bridge far");
        assert_eq!(clusters[0].members, vec![0, 2, 1]);
        assert_eq!(clusters[0].bbox, BoundingBox::new(0.0, 0.0, 50.0, 10.0));
    }

    #[test]
    fn every_region_lands_in_exactly_one_cluster() {
        let regions: Vec<TextRegion> = (0..12)
            .map(|i| {
                let x = ((i * 37) % 200) as f32;
                let y = ((i * 53) % 160) as f32;
                region(x, y, x + 18.0, y + 9.0, &format!("r{}", i))
            })
            .collect();
        for threshold in [0.0, 5.0, 20.0, 60.0] {
            let clusters = cluster(&regions, threshold);
            let total: usize = clusters.iter().map(Cluster::source_count).sum();
            assert_eq!(total, regions.len());
            let mut seen: Vec<usize> = clusters.iter().flat_map(|c| c.members.clone()).collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..regions.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn larger_threshold_never_adds_clusters() {
        // a row of 10px boxes separated by widening gaps
        let gaps = [1.0, 3.0, 6.0, 12.0, 24.0, 48.0];
        let mut regions = vec![region(0.0, 0.0, 10.0, 10.0, "w")];
        let mut x = 10.0;
        for gap in gaps {
            x += gap;
            regions.push(region(x, 0.0, x + 10.0, 10.0, "w"));
            x += 10.0;
        }
        let mut previous = usize::MAX;
        for threshold in [0.0, 2.0, 5.0, 10.0, 20.0, 40.0, 80.0] {
            let count = cluster(&regions, threshold).len();
            let expected = 1 + gaps.iter().filter(|gap| **gap > threshold).count();
            assert_eq!(count, expected, "threshold {}", threshold);
            assert!(count <= previous);
            previous = count;
        }
        assert_eq!(previous, 1);
    }

    #[test]
    fn negative_threshold_behaves_like_zero() {
        let regions = vec![
            region(0.0, 0.0, 10.0, 10.0, "a"),
            region(10.0, 0.0, 20.0, 10.0, "b"),
        ];
        assert_eq!(cluster(&regions, -5.0).len(), 1);
    }

    #[test]
    fn cluster_polygons_checks_lengths_and_geometry() {
        let polygons = vec![vec![[0.0, 0.0], [5.0, 0.0], [5.0, 5.0]]];
        let err = cluster_polygons(&polygons, &[], 30.0).unwrap_err();
        assert_eq!(
            err,
            GeometryError::LengthMismatch {
                polygons: 1,
                texts: 0
            }
        );

        let bad = vec![vec![[0.0, 0.0], [5.0, 0.0]]];
        let err = cluster_polygons(&bad, &["x".to_string()], 30.0).unwrap_err();
        assert_eq!(err, GeometryError::DegeneratePolygon(2));

        let ok = cluster_polygons(&polygons, &["x".to_string()], 30.0).unwrap();
        assert_eq!(ok.len(), 1);
    }
}
