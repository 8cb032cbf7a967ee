//! Result presentation: map an [`ExtractionResult`] to display rows and
//! export it as JSON.
//!
//! [`render`] always emits one row per allergen and one per nutrient, in a
//! fixed order, whatever keys the service actually returned. Missing
//! allergens read "Not detected"; missing or empty nutrients read
//! "Not found".

use crate::error::ExtractError;
use crate::model::{Allergen, ExtractionResult, Nutrient};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the JSON export artifact.
pub const EXPORT_FILE_NAME: &str = "extraction-results.json";

/// Shown for a nutrient the service did not find.
pub const NOT_FOUND: &str = "Not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllergenStatus {
    Present,
    NotDetected,
}

impl AllergenStatus {
    pub fn text(self) -> &'static str {
        match self {
            AllergenStatus::Present => "Present",
            AllergenStatus::NotDetected => "Not detected",
        }
    }

    fn marker(self) -> &'static str {
        match self {
            AllergenStatus::Present => "⚠",
            AllergenStatus::NotDetected => "✓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllergenRow {
    pub allergen: Allergen,
    pub label: &'static str,
    pub status: AllergenStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutritionRow {
    pub nutrient: Nutrient,
    pub label: &'static str,
    /// The service's value, or [`NOT_FOUND`].
    pub value: String,
}

/// Everything the results screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayModel {
    pub processing_method: &'static str,
    pub allergens: Vec<AllergenRow>,
    pub nutrition: Vec<NutritionRow>,
    /// Present only for a non-empty `raw_text_preview`.
    pub preview: Option<String>,
}

impl DisplayModel {
    pub fn allergen(&self, allergen: Allergen) -> Option<&AllergenRow> {
        self.allergens.iter().find(|r| r.allergen == allergen)
    }

    pub fn nutrient(&self, nutrient: Nutrient) -> Option<&NutritionRow> {
        self.nutrition.iter().find(|r| r.nutrient == nutrient)
    }
}

/// Pure mapping from a result to its display rows.
pub fn render(result: &ExtractionResult) -> DisplayModel {
    let allergens = Allergen::ALL
        .iter()
        .map(|&allergen| AllergenRow {
            allergen,
            label: allergen.label(),
            status: if result.allergen(allergen) {
                AllergenStatus::Present
            } else {
                AllergenStatus::NotDetected
            },
        })
        .collect();

    let nutrition = Nutrient::ALL
        .iter()
        .map(|&nutrient| NutritionRow {
            nutrient,
            label: nutrient.label(),
            value: result.nutrient(nutrient).unwrap_or(NOT_FOUND).to_string(),
        })
        .collect();

    DisplayModel {
        processing_method: result.processing_method.label(),
        allergens,
        nutrition,
        preview: result.preview().map(str::to_string),
    }
}

impl fmt::Display for DisplayModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Extraction Complete")?;
        writeln!(f, "Processing method: {}", self.processing_method)?;
        writeln!(f)?;

        writeln!(f, "Allergens")?;
        for row in &self.allergens {
            writeln!(
                f,
                "  {} {:<12} {}",
                row.status.marker(),
                row.label,
                row.status.text()
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Nutritional Values")?;
        for row in &self.nutrition {
            writeln!(f, "  {:<13} {}", row.label, row.value)?;
        }

        if let Some(ref preview) = self.preview {
            writeln!(f)?;
            writeln!(f, "Text Preview")?;
            for line in preview.lines() {
                writeln!(f, "  {line}")?;
            }
        }
        Ok(())
    }
}

/// Serialise the full result as indented JSON.
///
/// Map keys are emitted in sorted order, so the same result always yields
/// the same bytes.
pub fn export_json(result: &ExtractionResult) -> Result<String, ExtractError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Write [`export_json`] output to `dir/extraction-results.json`.
pub async fn write_export(
    result: &ExtractionResult,
    dir: impl AsRef<Path>,
) -> Result<PathBuf, ExtractError> {
    let path = dir.as_ref().join(EXPORT_FILE_NAME);
    let json = export_json(result)?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|source| ExtractError::Export {
            path: path.clone(),
            source,
        })?;
    info!("exported results to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProcessingMethod;
    use serde_json::json;

    fn sample() -> ExtractionResult {
        serde_json::from_value(json!({
            "processing_method": "text",
            "allergens": { "gluten": true },
            "nutritional_values": { "energy": "250kcal" }
        }))
        .unwrap()
    }

    #[test]
    fn sample_scenario_rows() {
        let view = render(&sample());
        assert_eq!(view.processing_method, "Text Extraction");

        assert_eq!(view.allergens.len(), 10);
        for row in &view.allergens {
            let expected = if row.allergen == Allergen::Gluten {
                AllergenStatus::Present
            } else {
                AllergenStatus::NotDetected
            };
            assert_eq!(row.status, expected, "{}", row.label);
        }

        assert_eq!(view.nutrition.len(), 6);
        assert_eq!(view.nutrient(Nutrient::Energy).unwrap().value, "250kcal");
        for row in view.nutrition.iter().filter(|r| r.nutrient != Nutrient::Energy) {
            assert_eq!(row.value, "Not found", "{}", row.label);
        }
        assert!(view.preview.is_none());
    }

    #[test]
    fn empty_result_still_renders_every_row() {
        let view = render(&ExtractionResult::new(ProcessingMethod::Ocr));
        assert_eq!(view.processing_method, "OCR (Scanned PDF)");
        let labels: Vec<_> = view.allergens.iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            [
                "Gluten", "Egg", "Crustaceans", "Fish", "Peanut", "Soy", "Milk", "Tree Nuts",
                "Celery", "Mustard"
            ]
        );
        assert!(view.allergens.iter().all(|r| r.status == AllergenStatus::NotDetected));
        assert!(view.nutrition.iter().all(|r| r.value == NOT_FOUND));
    }

    #[test]
    fn preview_shown_only_when_non_empty() {
        let mut r = sample();
        r.raw_text_preview = Some(Some(String::new()));
        assert!(render(&r).preview.is_none());

        r.raw_text_preview = Some(Some("Ingredients: wheat flour".into()));
        let view = render(&r);
        assert_eq!(view.preview.as_deref(), Some("Ingredients: wheat flour"));
        assert!(view.to_string().contains("Text Preview"));
    }

    #[test]
    fn text_report_lists_rows() {
        let text = render(&sample()).to_string();
        assert!(text.contains("Gluten       Present"));
        assert!(text.contains("Mustard      Not detected"));
        assert!(text.contains("Energy        250kcal"));
        assert!(text.contains("Sodium        Not found"));
        assert!(!text.contains("Text Preview"));
    }

    #[test]
    fn export_is_indented_and_stable() {
        let mut r = sample();
        r.allergens.insert("milk".into(), false);
        r.nutritional_values.insert("fat".into(), None);
        r.raw_text_preview = Some(Some("preview".into()));

        let first = export_json(&r).unwrap();
        assert!(first.contains("\n  \"allergens\": {\n    \"gluten\": true"));

        let parsed: ExtractionResult = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed, r);
        assert_eq!(export_json(&parsed).unwrap(), first);
    }

    #[test]
    fn export_keeps_service_spelling_and_null_preview() {
        let r: ExtractionResult = serde_json::from_str(
            r#"{"allergens":{"gluten":true},"nutritional_values":{"energy":"1 kJ"},"raw_text_preview":null,"processing_method":"text_extraction"}"#,
        )
        .unwrap();
        assert_eq!(render(&r).processing_method, "Text Extraction");

        let exported: serde_json::Value = serde_json::from_str(&export_json(&r).unwrap()).unwrap();
        assert_eq!(exported["processing_method"], "text_extraction");
        assert_eq!(exported.get("raw_text_preview"), Some(&serde_json::Value::Null));
        assert_eq!(
            exported,
            json!({
                "allergens": { "gluten": true },
                "nutritional_values": { "energy": "1 kJ" },
                "raw_text_preview": null,
                "processing_method": "text_extraction"
            })
        );
    }

    #[tokio::test]
    async fn write_export_uses_fixed_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(&sample(), dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), EXPORT_FILE_NAME);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, export_json(&sample()).unwrap());

        let err = write_export(&sample(), dir.path().join("missing/dir"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Export { .. }));
    }
}
