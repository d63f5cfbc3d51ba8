//! Placement of repeated section entries beyond the template's slots.
//!
//! A template usually shows one visual slot per repeatable section, e.g.
//! one job under "Experience" whose fields address `experience[0].*`. When
//! the form data holds entries the template has no slot for, the expander
//! stacks a copy of the last slot group below it for each of them. Copies are only placed while
//! they stay above the bottom margin and clear of other field areas; there
//! is no pagination.

use std::collections::{BTreeMap, BTreeSet};

use super::resolve::normalize_path;
use crate::config::ExpanderSettings;
use crate::model::{AreaKind, BBox, ContentArea, FormData, SectionKind};

/// A repeatable section with entries the template has no slot for.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionOverflow {
    pub section: SectionKind,
    /// Entries in form data
    pub entries: usize,
    /// Distinct entry indices the template addresses
    pub slots: usize,
    /// Entry indices below `entries` that no slot addresses, ascending
    pub unslotted: Vec<usize>,
}

impl SectionOverflow {
    pub fn message(&self) -> String {
        format!(
            "section '{}' has {} entries but the template shows {} slot(s) (unslotted: {:?})",
            self.section, self.entries, self.slots, self.unslotted
        )
    }
}

/// Extra areas to draw and the sections that could not be fully placed.
#[derive(Debug, Clone, Default)]
pub struct ExpansionPlan {
    /// Stacked copies; drawn without redaction
    pub areas: Vec<ContentArea>,
    pub warnings: Vec<String>,
}

/// Detect → locate → stack.
#[derive(Debug, Clone, Default)]
pub struct DynamicSectionExpander {
    settings: ExpanderSettings,
}

impl DynamicSectionExpander {
    pub fn new(settings: ExpanderSettings) -> Self {
        Self { settings }
    }

    /// Repeatable sections with entries that no template slot addresses.
    ///
    /// Gaps count: slots `[0]` and `[2]` leave entry 1 unslotted.
    pub fn overflows(&self, areas: &[ContentArea], form: &FormData) -> Vec<SectionOverflow> {
        self.settings
            .repeatable
            .iter()
            .filter_map(|&section| {
                let entries = form.entry_count(section.as_str());
                let slots = slot_indices(areas, section);
                // A section with no slots at all is not part of this template.
                if slots.is_empty() {
                    return None;
                }
                let unslotted: Vec<usize> =
                    (0..entries).filter(|i| !slots.contains(i)).collect();
                (!unslotted.is_empty()).then_some(SectionOverflow {
                    section,
                    entries,
                    slots: slots.len(),
                    unslotted,
                })
            })
            .collect()
    }

    /// Plan stacked copies for every overflowing section.
    ///
    /// `page_heights` gives the height of each page in points.
    pub fn expand(
        &self,
        areas: &[ContentArea],
        form: &FormData,
        page_heights: &BTreeMap<u32, f32>,
    ) -> ExpansionPlan {
        let mut plan = ExpansionPlan::default();

        for overflow in self.overflows(areas, form) {
            log::debug!("Expanding: {}", overflow.message());
            let placed = self.stack_section(areas, &overflow, page_heights, &mut plan.areas);
            let missing = overflow.unslotted.len() - placed;
            if missing > 0 {
                let warning = format!(
                    "{}; {} extra entr{} not placed (no room on page)",
                    overflow.message(),
                    missing,
                    if missing == 1 { "y" } else { "ies" }
                );
                log::warn!("{}", warning);
                plan.warnings.push(warning);
            }
        }

        plan
    }

    /// Stack one copy of the last slot group per unslotted entry, in index
    /// order; returns how many were placed.
    fn stack_section(
        &self,
        areas: &[ContentArea],
        overflow: &SectionOverflow,
        page_heights: &BTreeMap<u32, f32>,
        placed_areas: &mut Vec<ContentArea>,
    ) -> usize {
        let section = overflow.section;
        let Some(&last) = slot_indices(areas, section).iter().next_back() else {
            return 0;
        };

        let group: Vec<&ContentArea> = areas
            .iter()
            .filter(|a| a.kind == AreaKind::Field && addresses(a, section) == Some(last))
            .collect();
        let Some(first) = group.first() else {
            return 0;
        };
        let page = first.page;
        let group: Vec<&ContentArea> = group.into_iter().filter(|a| a.page == page).collect();

        let Some(extent) = group
            .iter()
            .map(|a| a.bbox)
            .reduce(|acc, b| acc.union(&b))
        else {
            return 0;
        };
        let Some(&page_height) = page_heights.get(&page) else {
            return 0;
        };
        let floor = page_height - self.settings.bottom_margin;
        let step = extent.height() + self.settings.entry_spacing;

        // Field areas outside the group that copies must not cover.
        let obstacles: Vec<BBox> = areas
            .iter()
            .filter(|a| {
                a.page == page
                    && a.kind == AreaKind::Field
                    && !group.iter().any(|g| g.id == a.id)
            })
            .map(|a| a.bbox)
            .collect();

        let mut placed = 0;
        for (n, &entry) in overflow.unslotted.iter().enumerate() {
            let dy = (n + 1) as f32 * step;
            let moved = extent.translate(0.0, dy);
            if moved.y1 > floor || obstacles.iter().any(|o| moved.intersects(o)) {
                break;
            }

            for area in &group {
                let mut copy = (*area).clone();
                copy.id = format!("{}_x{}", area.id, entry);
                copy.form_field = reindex(&area.form_field, section, last, entry);
                copy.bbox = area.bbox.translate(0.0, dy);
                copy.source_bbox = None;
                placed_areas.push(copy);
            }
            placed += 1;
        }
        placed
    }
}

/// Entry index of `section` addressed by an area, if any of its paths do.
fn addresses(area: &ContentArea, section: SectionKind) -> Option<usize> {
    area.form_paths().find_map(|path| {
        let normalized = normalize_path(path);
        let mut segments = normalized.split('.');
        if segments.next()? != section.as_str() {
            return None;
        }
        segments.next()?.parse().ok()
    })
}

/// Distinct entry indices of `section` addressed by fillable areas.
fn slot_indices(areas: &[ContentArea], section: SectionKind) -> BTreeSet<usize> {
    areas
        .iter()
        .filter(|a| a.kind == AreaKind::Field && a.is_fillable())
        .filter_map(|a| addresses(a, section))
        .collect()
}

/// Point every path addressing `section[from]` at `section[to]`.
fn reindex(form_field: &str, section: SectionKind, from: usize, to: usize) -> String {
    form_field
        .split_whitespace()
        .map(|path| {
            let normalized = normalize_path(path);
            let mut segments = normalized.splitn(3, '.');
            match (segments.next(), segments.next(), segments.next()) {
                (Some(head), Some(index), rest)
                    if head == section.as_str() && index.parse::<usize>().ok() == Some(from) =>
                {
                    match rest {
                        Some(rest) => format!("{}.{}.{}", head, to, rest),
                        None => format!("{}.{}", head, to),
                    }
                }
                _ => path.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType, TextStyle};

    fn field(id: &str, form_field: &str, bbox: [f32; 4]) -> ContentArea {
        ContentArea {
            id: id.to_string(),
            kind: AreaKind::Field,
            field_type: FieldType::Company,
            section: None,
            text: id.to_string(),
            form_field: form_field.to_string(),
            bbox: BBox::new(bbox[0], bbox[1], bbox[2], bbox[3]),
            source_bbox: None,
            page: 1,
            confidence: 0.8,
            priority: 7,
            original_style: TextStyle::default(),
            is_required: false,
        }
    }

    fn jobs(n: usize) -> FormData {
        let entries: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"company":"C{}","position":"P{}"}}"#, i, i))
            .collect();
        FormData::from_json_str(&format!(r#"{{"experience":[{}]}}"#, entries.join(","))).unwrap()
    }

    fn template() -> Vec<ContentArea> {
        vec![
            field("p1_f0", "personalInfo.email", [72.0, 40.0, 300.0, 52.0]),
            field("p1_f3", "experience[0].company", [72.0, 200.0, 250.0, 212.0]),
            field("p1_f4", "experience[0].position", [72.0, 214.0, 250.0, 226.0]),
        ]
    }

    fn heights() -> BTreeMap<u32, f32> {
        BTreeMap::from([(1, 792.0)])
    }

    #[test]
    fn test_overflow_detection() {
        let expander = DynamicSectionExpander::default();
        assert!(expander.overflows(&template(), &jobs(1)).is_empty());

        let overflows = expander.overflows(&template(), &jobs(3));
        assert_eq!(
            overflows,
            vec![SectionOverflow {
                section: SectionKind::Experience,
                entries: 3,
                slots: 1,
                unslotted: vec![1, 2],
            }]
        );
    }

    #[test]
    fn test_stack_copies() {
        let plan = DynamicSectionExpander::default().expand(&template(), &jobs(3), &heights());
        assert!(plan.warnings.is_empty());
        assert_eq!(plan.areas.len(), 4);

        // Group height 26 + spacing 6.
        let company_1 = plan.areas.iter().find(|a| a.id == "p1_f3_x1").unwrap();
        assert_eq!(company_1.form_field, "experience.1.company");
        assert_eq!(company_1.bbox, BBox::new(72.0, 232.0, 250.0, 244.0));

        let position_2 = plan.areas.iter().find(|a| a.id == "p1_f4_x2").unwrap();
        assert_eq!(position_2.form_field, "experience.2.position");
        assert_eq!(position_2.bbox.y0, 214.0 + 64.0);
    }

    fn gapped_template() -> Vec<ContentArea> {
        vec![
            field("p1_f3", "experience[0].company", [72.0, 200.0, 250.0, 212.0]),
            field("p1_f5", "experience[2].company", [72.0, 232.0, 250.0, 244.0]),
        ]
    }

    #[test]
    fn test_gap_in_slots_is_filled() {
        let expander = DynamicSectionExpander::default();
        let overflows = expander.overflows(&gapped_template(), &jobs(3));
        assert_eq!(overflows.len(), 1);
        assert_eq!(overflows[0].slots, 2);
        assert_eq!(overflows[0].unslotted, vec![1]);

        let plan = expander.expand(&gapped_template(), &jobs(3), &heights());
        assert!(plan.warnings.is_empty());
        assert_eq!(plan.areas.len(), 1);
        // Stacked below the last slot, addressing the entry it skipped.
        assert_eq!(plan.areas[0].id, "p1_f5_x1");
        assert_eq!(plan.areas[0].form_field, "experience.1.company");
        assert_eq!(plan.areas[0].bbox.y0, 232.0 + 18.0);
    }

    #[test]
    fn test_gap_and_tail_entries_are_both_stacked() {
        let plan =
            DynamicSectionExpander::default().expand(&gapped_template(), &jobs(4), &heights());
        assert!(plan.warnings.is_empty());
        let fields: Vec<&str> = plan.areas.iter().map(|a| a.form_field.as_str()).collect();
        assert_eq!(fields, vec!["experience.1.company", "experience.3.company"]);
        assert_eq!(plan.areas[1].bbox.y0, 232.0 + 36.0);
    }

    #[test]
    fn test_gap_within_entry_count_is_an_overflow() {
        // Two slots and two entries, but entry 1 has nowhere to go.
        let overflows = DynamicSectionExpander::default().overflows(&gapped_template(), &jobs(2));
        assert_eq!(overflows.len(), 1);
        assert_eq!(overflows[0].unslotted, vec![1]);
    }

    #[test]
    fn test_stops_at_obstacle() {
        let mut areas = template();
        areas.push(field("p1_f9", "education[0].institution", [72.0, 270.0, 250.0, 282.0]));
        let plan = DynamicSectionExpander::default().expand(&areas, &jobs(3), &heights());
        assert_eq!(plan.areas.len(), 2);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("1 extra entry not placed"));
    }

    #[test]
    fn test_stops_at_bottom_margin() {
        let heights = BTreeMap::from([(1, 250.0)]);
        let plan = DynamicSectionExpander::default().expand(&template(), &jobs(2), &heights);
        assert!(plan.areas.is_empty());
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn test_reindex() {
        assert_eq!(
            reindex("experience[0].company experience[0].dates", SectionKind::Experience, 0, 2),
            "experience.2.company experience.2.dates"
        );
        assert_eq!(
            reindex("education[0].degree", SectionKind::Experience, 0, 2),
            "education[0].degree"
        );
    }
}
