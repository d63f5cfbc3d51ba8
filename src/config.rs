//! Engine configuration.
//!
//! All heuristics that decide *what* a region means live here as data:
//! the ordered classification table, the section header table, the
//! field-to-form-path mapping, and the geometry constants. The engine
//! compiles this once at construction and never mutates it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{FieldType, SectionKind, CUSTOM_FIELD};

/// Complete configuration of a [`crate::TemplateEngine`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ordered span classification rules
    pub classifier: PatternTable,
    /// Section header rules
    pub sections: SectionTable,
    /// Field type to form path mapping
    pub mapping: FieldMapping,
    /// Overlap resolution constants
    pub optimizer: OptimizerSettings,
    /// Span filtering
    pub extraction: ExtractionSettings,
    /// Repeated-entry placement
    pub expander: ExpanderSettings,
}

impl EngineConfig {
    /// Parse a configuration from JSON; omitted sections keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid config: {}", e)))
    }

    /// Load a configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}

/// One classification rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub field_type: FieldType,
    /// Any match selects this rule (tested against lower-cased text)
    pub patterns: Vec<String>,
    /// Any match vetoes this rule
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Added to the base confidence
    #[serde(default)]
    pub confidence_bonus: f32,
}

impl FieldRule {
    fn new(field_type: FieldType, patterns: &[&str], confidence_bonus: f32) -> Self {
        Self {
            field_type,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            exclude: Vec::new(),
            confidence_bonus,
        }
    }

    fn excluding(mut self, exclude: &[&str]) -> Self {
        self.exclude = exclude.iter().map(|p| p.to_string()).collect();
        self
    }
}

/// Ordered classification table; the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternTable {
    pub rules: Vec<FieldRule>,
}

impl Default for PatternTable {
    fn default() -> Self {
        use FieldType::*;

        let rules = vec![
            FieldRule::new(Email, &[r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}"], 0.1),
            FieldRule::new(
                Phone,
                &[
                    r"(?:\+?\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}",
                    r"^(?:phone|tel|mobile|cell)\b\s*:?",
                ],
                0.1,
            ),
            FieldRule::new(
                Website,
                &[
                    r"https?://",
                    r"\bwww\.",
                    r"linkedin\.com",
                    r"github\.com",
                    r"^(?:website|portfolio)\b",
                ],
                0.0,
            ),
            FieldRule::new(
                Dates,
                &[
                    r"\b(?:19|20)\d{2}\s*(?:-|–|—|to)\s*(?:(?:19|20)\d{2}|present|current|now)\b",
                    r"\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+(?:19|20)\d{2}\b",
                    r"\b\d{1,2}/(?:19|20)\d{2}\b",
                ],
                0.0,
            ),
            FieldRule::new(
                Summary,
                &[
                    r"^(?:professional\s+)?summary\s*:\s*\S",
                    r"\blorem ipsum\b",
                    r"^(?:i am|i'm)\s+an?\s",
                    r"\b(?:passionate|motivated|results-driven|detail-oriented|seasoned)\b",
                ],
                0.05,
            ),
            FieldRule::new(
                Experience,
                &[
                    r"\b\d+\+?\s+years?\s+(?:of\s+)?experience\b",
                    r"\bresponsible for\b",
                    r"^[•▪●◦*–-]\s*\w+",
                ],
                0.05,
            ),
            FieldRule::new(
                Institution,
                &[r"\b(?:university|college|institute|school|academy|polytechnic)\b"],
                0.0,
            ),
            FieldRule::new(
                Degree,
                &[
                    r"\b(?:bachelor|master|doctor|associate)(?:'s)?\b",
                    r"\b(?:ph\.?d|mba|bsc|msc|b\.sc|m\.sc|b\.a\.|m\.a\.|b\.s\.|m\.s\.|b\.eng|m\.eng)",
                    r"\b(?:degree|diploma)\b",
                ],
                0.0,
            ),
            FieldRule::new(
                Company,
                &[
                    r"\b(?:inc|llc|ltd|corp|corporation|gmbh|plc)\b\.?",
                    r"\bcompany name\b",
                    r"\b(?:technologies|solutions|systems|labs|consulting)\b",
                ],
                0.0,
            ),
            FieldRule::new(
                Position,
                &[
                    r"\b(?:engineer|developer|manager|designer|analyst|consultant|director|intern|specialist|coordinator|architect|administrator|scientist|officer|assistant)\b",
                    r"\bjob title\b",
                    r"^position\b",
                ],
                0.0,
            ),
            FieldRule::new(
                Skills,
                &[
                    r"^skills?\s*:",
                    r"\b(?:python|java|javascript|typescript|rust|golang|sql|html|css|react|docker|kubernetes|aws|excel)\b",
                    r"\bproficient in\b",
                ],
                0.0,
            ),
            FieldRule::new(
                Location,
                &[
                    r"^[a-z][a-z .'-]+,\s*[a-z]{2}(?:\s+\d{5})?$",
                    r"^[a-z][a-z .'-]+,\s*[a-z][a-z ]+$",
                    r"^(?:address|location|city)\b",
                ],
                0.0,
            ),
            FieldRule::new(
                Name,
                &[
                    r"^(?:your|full|first|candidate)\s+name$",
                    r"^[a-z][a-z.'-]+(?:\s+[a-z][a-z.'-]+){1,2}$",
                ],
                0.0,
            )
            .excluding(&[
                r"\b(?:experience|education|skills?|summary|profile|objective|projects?|certifications?|languages?|references|contact|volunteer(?:ing)?|interests|awards|achievements|history|employment|about|work|professional|technical|personal|hobbies|publications)\b",
            ]),
        ];

        Self { rules }
    }
}

/// One section header rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRule {
    pub section: SectionKind,
    /// Tested case-insensitively in multi-line mode against page text
    pub patterns: Vec<String>,
}

/// Section header table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionTable {
    pub rules: Vec<SectionRule>,
}

/// A header that occupies a whole line, optionally followed by a colon.
fn header_line(alternatives: &str) -> String {
    format!(r"^[ \t]*(?:{})[ \t]*:?[ \t]*$", alternatives)
}

impl Default for SectionTable {
    fn default() -> Self {
        use SectionKind::*;

        let table: [(SectionKind, &[&str]); 11] = [
            (
                Summary,
                &[
                    "professional summary|summary",
                    "professional profile|profile",
                    "career objective|objective",
                    "about me",
                ],
            ),
            (
                Experience,
                &[
                    "work experience|professional experience|experience",
                    "employment history|work history|employment",
                    "career history",
                ],
            ),
            (Education, &["education|academic background", "qualifications"]),
            (
                Skills,
                &[
                    "technical skills|core skills|key skills|skills",
                    "core competencies|competencies",
                    "expertise",
                ],
            ),
            (Projects, &["personal projects|key projects|projects"]),
            (
                Certifications,
                &[
                    "licenses (?:&|and) certifications|certifications?",
                    "courses|training",
                ],
            ),
            (Languages, &["languages"]),
            (
                Volunteer,
                &[
                    "volunteer experience|volunteering|volunteer",
                    "community (?:service|involvement)",
                ],
            ),
            (Awards, &["awards|honou?rs|achievements"]),
            (Interests, &["interests|hobbies"]),
            (References, &["references"]),
        ];

        let rules = table
            .iter()
            .map(|(section, alternatives)| SectionRule {
                section: *section,
                patterns: alternatives.iter().map(|a| header_line(a)).collect(),
            })
            .collect();

        Self { rules }
    }
}

/// Field type to form path mapping, plus placement priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Destination path(s); space-separated paths share one region
    pub paths: BTreeMap<FieldType, String>,
    /// Field types that must be filled for a template to be compatible
    pub required: Vec<FieldType>,
    /// Lower is placed first
    pub priorities: BTreeMap<FieldType, u32>,
    /// Priority of types missing from `priorities`
    pub default_priority: u32,
}

impl Default for FieldMapping {
    fn default() -> Self {
        use FieldType::*;

        let paths = [
            (Name, "personalInfo.firstName personalInfo.lastName"),
            (Email, "personalInfo.email"),
            (Phone, "personalInfo.phone"),
            (Location, "personalInfo.location"),
            (Website, "personalInfo.website"),
            (Summary, "summary"),
            (Experience, "experience[0].description"),
            (Company, "experience[0].company"),
            (Position, "experience[0].position"),
            (Institution, "education[0].institution"),
            (Degree, "education[0].degree"),
            (Dates, "experience[0].dates"),
            (Skills, "skills"),
            (SectionHeader, CUSTOM_FIELD),
            (Custom, CUSTOM_FIELD),
        ]
        .into_iter()
        .map(|(ft, path)| (ft, path.to_string()))
        .collect();

        let priorities = [
            (Name, 1),
            (Email, 2),
            (Phone, 3),
            (Location, 4),
            (Summary, 5),
            (SectionHeader, 6),
            (Company, 7),
            (Position, 8),
            (Institution, 9),
            (Degree, 10),
            (Dates, 11),
            (Skills, 12),
        ]
        .into_iter()
        .collect();

        Self {
            paths,
            required: vec![Name, Email],
            priorities,
            default_priority: 99,
        }
    }
}

/// Overlap resolution constants, in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Downward shift applied on the first collision
    pub shift_y: f32,
    /// Rightward shift applied when the downward shift still collides
    pub shift_x: f32,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            shift_y: 20.0,
            shift_x: 20.0,
        }
    }
}

/// Span filtering applied before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Spans with fewer trimmed characters are ignored
    pub min_span_chars: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self { min_span_chars: 2 }
    }
}

/// Repeated-entry placement constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderSettings {
    /// Vertical gap between stacked entries, in points
    pub entry_spacing: f32,
    /// Stacked entries never extend below this distance from the page bottom
    pub bottom_margin: f32,
    /// Sections whose form data holds an array of entries
    pub repeatable: Vec<SectionKind>,
}

impl Default for ExpanderSettings {
    fn default() -> Self {
        use SectionKind::*;
        Self {
            entry_spacing: 6.0,
            bottom_margin: 36.0,
            repeatable: vec![
                Experience,
                Education,
                Projects,
                Skills,
                Certifications,
                Languages,
                Volunteer,
            ],
        }
    }
}
