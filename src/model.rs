//! Data model shared by the selector, client, controller and view.
//!
//! [`ExtractionResult`] mirrors the JSON body of a successful `/extract`
//! response. Allergen and nutrient maps are kept keyed by their wire strings
//! so the export reproduces exactly what the service sent; the closed sets the
//! UI displays are the [`Allergen`] and [`Nutrient`] enums.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The only media type accepted into staged state.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

// ── Staged file ──────────────────────────────────────────────────────────

/// A validated PDF awaiting submission.
///
/// Only [`crate::selector::FileSelector`] constructs these, after checking
/// the declared media type.
#[derive(Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub(crate) name: String,
    pub(crate) media_type: String,
    pub(crate) content: Bytes,
}

impl StagedFile {
    /// Display name (the original file name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type; always [`PDF_MEDIA_TYPE`].
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Cheap handle to the file content.
    pub fn content(&self) -> Bytes {
        self.content.clone()
    }

    /// Size in megabytes with two decimals, as shown next to the file name.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size() as f64 / 1024.0 / 1024.0)
    }
}

impl fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.size())
            .finish()
    }
}

// ── Extraction result ────────────────────────────────────────────────────

/// How the service obtained text from the PDF.
///
/// `"ocr"` marks a scanned document. Every other value (`"text"`,
/// `"text_extraction"` or anything newer) is reported as text extraction and
/// keeps the service's spelling for the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProcessingMethod {
    /// Pages were rasterised and OCR'd (scanned PDF).
    Ocr,
    /// Embedded text layer was read directly.
    Text(String),
}

impl ProcessingMethod {
    /// Text extraction under the short wire name `"text"`.
    pub fn text() -> Self {
        ProcessingMethod::Text("text".to_string())
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcessingMethod::Ocr => "OCR (Scanned PDF)",
            ProcessingMethod::Text(_) => "Text Extraction",
        }
    }

    /// The value exactly as the service sent it.
    pub fn as_str(&self) -> &str {
        match self {
            ProcessingMethod::Ocr => "ocr",
            ProcessingMethod::Text(wire) => wire,
        }
    }
}

impl From<String> for ProcessingMethod {
    fn from(wire: String) -> Self {
        if wire == "ocr" {
            ProcessingMethod::Ocr
        } else {
            ProcessingMethod::Text(wire)
        }
    }
}

impl From<ProcessingMethod> for String {
    fn from(method: ProcessingMethod) -> Self {
        match method {
            ProcessingMethod::Ocr => "ocr".to_string(),
            ProcessingMethod::Text(wire) => wire,
        }
    }
}

/// Normalised successful response of the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub processing_method: ProcessingMethod,

    /// Allergen key → presence. Missing keys mean "not detected".
    #[serde(default)]
    pub allergens: BTreeMap<String, bool>,

    /// Nutrient key → display value. Missing or null means "not found".
    #[serde(default)]
    pub nutritional_values: BTreeMap<String, Option<String>>,

    /// Outer `None` when the key was absent, `Some(None)` for an explicit null.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub raw_text_preview: Option<Option<String>>,

    /// Any further fields the service returned, kept for the export.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl ExtractionResult {
    /// A result with no allergens flagged and no nutrition values.
    pub fn new(processing_method: ProcessingMethod) -> Self {
        Self {
            processing_method,
            allergens: BTreeMap::new(),
            nutritional_values: BTreeMap::new(),
            raw_text_preview: None,
            extra: BTreeMap::new(),
        }
    }

    /// Presence flag for an allergen; absent keys are `false`.
    pub fn allergen(&self, allergen: Allergen) -> bool {
        self.allergens.get(allergen.key()).copied().unwrap_or(false)
    }

    /// Value for a nutrient; missing, null and blank values are `None`.
    pub fn nutrient(&self, nutrient: Nutrient) -> Option<&str> {
        self.nutritional_values
            .get(nutrient.key())
            .and_then(|v| v.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    /// Preview text when present and non-empty.
    pub fn preview(&self) -> Option<&str> {
        self.raw_text_preview
            .as_ref()
            .and_then(Option::as_deref)
            .filter(|p| !p.trim().is_empty())
    }
}

// ── Closed key sets ──────────────────────────────────────────────────────

/// The ten allergens every report shows, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Allergen {
    Gluten,
    Egg,
    Crustaceans,
    Fish,
    Peanut,
    Soy,
    Milk,
    TreeNuts,
    Celery,
    Mustard,
}

impl Allergen {
    pub const ALL: [Allergen; 10] = [
        Allergen::Gluten,
        Allergen::Egg,
        Allergen::Crustaceans,
        Allergen::Fish,
        Allergen::Peanut,
        Allergen::Soy,
        Allergen::Milk,
        Allergen::TreeNuts,
        Allergen::Celery,
        Allergen::Mustard,
    ];

    /// JSON key used by the service.
    pub fn key(self) -> &'static str {
        match self {
            Allergen::Gluten => "gluten",
            Allergen::Egg => "egg",
            Allergen::Crustaceans => "crustaceans",
            Allergen::Fish => "fish",
            Allergen::Peanut => "peanut",
            Allergen::Soy => "soy",
            Allergen::Milk => "milk",
            Allergen::TreeNuts => "tree_nuts",
            Allergen::Celery => "celery",
            Allergen::Mustard => "mustard",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Allergen::Gluten => "Gluten",
            Allergen::Egg => "Egg",
            Allergen::Crustaceans => "Crustaceans",
            Allergen::Fish => "Fish",
            Allergen::Peanut => "Peanut",
            Allergen::Soy => "Soy",
            Allergen::Milk => "Milk",
            Allergen::TreeNuts => "Tree Nuts",
            Allergen::Celery => "Celery",
            Allergen::Mustard => "Mustard",
        }
    }
}

/// The six nutrition values every report shows, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Nutrient {
    Energy,
    Fat,
    Carbohydrate,
    Sugar,
    Protein,
    Sodium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 6] = [
        Nutrient::Energy,
        Nutrient::Fat,
        Nutrient::Carbohydrate,
        Nutrient::Sugar,
        Nutrient::Protein,
        Nutrient::Sodium,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Nutrient::Energy => "energy",
            Nutrient::Fat => "fat",
            Nutrient::Carbohydrate => "carbohydrate",
            Nutrient::Sugar => "sugar",
            Nutrient::Protein => "protein",
            Nutrient::Sodium => "sodium",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Nutrient::Energy => "Energy",
            Nutrient::Fat => "Fat",
            Nutrient::Carbohydrate => "Carbohydrate",
            Nutrient::Sugar => "Sugar",
            Nutrient::Protein => "Protein",
            Nutrient::Sodium => "Sodium",
        }
    }
}
