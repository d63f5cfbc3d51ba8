//! Candidate area deduplication and overlap resolution.

use std::collections::{HashMap, HashSet};

use unicode_normalization::UnicodeNormalization;

use crate::config::OptimizerSettings;
use crate::model::{AreaKind, BBox, ContentArea};

/// Deduplicates and spatially de-conflicts raw candidate areas.
///
/// Overlap resolution is a single-shot heuristic: one downward shift, then
/// one rightward shift, accepted whether or not it still collides.
#[derive(Debug, Clone, Default)]
pub struct ContentAreaOptimizer {
    settings: OptimizerSettings,
}

impl ContentAreaOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    /// Dedup, order by `(priority, top)`, then resolve overlaps per page.
    pub fn optimize(&self, candidates: Vec<ContentArea>) -> Vec<ContentArea> {
        let mut areas = dedup(candidates);
        areas.sort_by(|a, b| {
            a.priority.cmp(&b.priority).then(
                a.bbox
                    .y0
                    .partial_cmp(&b.bbox.y0)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });

        let mut used: HashMap<u32, Vec<BBox>> = HashMap::new();
        for area in &mut areas {
            // Sections cover the whole page; they never move and never block.
            if area.kind == AreaKind::Section {
                continue;
            }
            let positions = used.entry(area.page).or_default();
            let placed = self.place(area.bbox, positions);
            if placed != area.bbox {
                log::debug!(
                    "Area {} shifted from {:?} to {:?}",
                    area.id,
                    area.bbox,
                    placed
                );
                if area.source_bbox.is_none() {
                    area.source_bbox = Some(area.bbox);
                }
                area.bbox = placed;
            }
            positions.push(placed);
        }

        areas
    }

    fn place(&self, bbox: BBox, used: &[BBox]) -> BBox {
        let collides = |candidate: &BBox| used.iter().any(|u| candidate.intersects(u));

        if !collides(&bbox) {
            return bbox;
        }
        let down = bbox.translate(0.0, self.settings.shift_y);
        if !collides(&down) {
            return down;
        }
        let placed = down.translate(self.settings.shift_x, 0.0);
        if collides(&placed) {
            log::debug!("Residual overlap accepted at {:?}", placed);
        }
        placed
    }
}

/// Lower-cased, trimmed, compatibility-normalized form used for dedup.
pub fn normalized_key(text: &str) -> String {
    text.nfkc().collect::<String>().trim().to_lowercase()
}

/// Keep the first area of each normalized text.
fn dedup(candidates: Vec<ContentArea>) -> Vec<ContentArea> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|area| {
            let keep = seen.insert(normalized_key(&area.text));
            if !keep {
                log::debug!("Dropping duplicate area {} ({:?})", area.id, area.text);
            }
            keep
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType, TextStyle};

    fn area(id: &str, text: &str, bbox: [f32; 4], priority: u32, page: u32) -> ContentArea {
        ContentArea {
            id: id.to_string(),
            kind: AreaKind::Field,
            field_type: FieldType::Custom,
            section: None,
            text: text.to_string(),
            form_field: "custom".to_string(),
            bbox: BBox::new(bbox[0], bbox[1], bbox[2], bbox[3]),
            source_bbox: None,
            page,
            confidence: 0.8,
            priority,
            original_style: TextStyle::default(),
            is_required: false,
        }
    }

    #[test]
    fn test_dedup_keeps_first() {
        let out = ContentAreaOptimizer::default().optimize(vec![
            area("a", "Jane Doe", [0.0, 0.0, 10.0, 10.0], 1, 1),
            area("b", "  jane doe ", [0.0, 100.0, 10.0, 110.0], 1, 1),
            area("c", "JANE DOE", [0.0, 200.0, 10.0, 210.0], 1, 2),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn test_overlap_shifted_down() {
        let out = ContentAreaOptimizer::default().optimize(vec![
            area("second", "acme", [10.0, 10.0, 110.0, 30.0], 2, 1),
            area("first", "jane", [0.0, 0.0, 100.0, 20.0], 1, 1),
        ]);
        assert_eq!(out[0].id, "first");
        assert_eq!(out[0].bbox, BBox::new(0.0, 0.0, 100.0, 20.0));
        assert_eq!(out[1].bbox, BBox::new(10.0, 30.0, 110.0, 50.0));
        assert_eq!(out[1].source_bbox, Some(BBox::new(10.0, 10.0, 110.0, 30.0)));
        assert!(!out[0].bbox.intersects(&out[1].bbox));
    }

    #[test]
    fn test_second_shift_moves_right() {
        let out = ContentAreaOptimizer::default().optimize(vec![
            area("a", "one", [0.0, 0.0, 100.0, 20.0], 1, 1),
            area("b", "two", [0.0, 25.0, 100.0, 45.0], 2, 1),
            area("c", "three", [0.0, 5.0, 100.0, 25.0], 3, 1),
        ]);
        let c = out.iter().find(|a| a.id == "c").unwrap();
        // Down by 20 still hits "b", then right by 20; residual overlap accepted.
        assert_eq!(c.bbox, BBox::new(20.0, 25.0, 120.0, 45.0));
    }

    #[test]
    fn test_overlap_only_within_page() {
        let out = ContentAreaOptimizer::default().optimize(vec![
            area("a", "one", [0.0, 0.0, 100.0, 20.0], 1, 1),
            area("b", "two", [0.0, 0.0, 100.0, 20.0], 2, 2),
        ]);
        assert!(out.iter().all(|a| a.source_bbox.is_none()));
    }

    #[test]
    fn test_sections_do_not_block_fields() {
        let mut section = area("s", "experience", [0.0, 0.0, 612.0, 792.0], 6, 1);
        section.kind = AreaKind::Section;
        let out = ContentAreaOptimizer::default().optimize(vec![
            section,
            area("f", "acme", [10.0, 10.0, 50.0, 20.0], 7, 1),
        ]);
        assert!(out.iter().all(|a| a.source_bbox.is_none()));
        assert_eq!(out[0].id, "s");
    }

    #[test]
    fn test_priority_non_decreasing() {
        let out = ContentAreaOptimizer::default().optimize(vec![
            area("d", "d", [0.0, 300.0, 10.0, 310.0], 12, 1),
            area("a", "a", [0.0, 100.0, 10.0, 110.0], 1, 1),
            area("c", "c", [0.0, 200.0, 10.0, 210.0], 7, 1),
            area("b", "b", [0.0, 50.0, 10.0, 60.0], 99, 1),
        ]);
        let priorities: Vec<_> = out.iter().map(|a| a.priority).collect();
        assert_eq!(priorities, vec![1, 7, 12, 99]);
    }
}
