use serde::{Deserialize, Serialize};

use super::category::Category;
use crate::error::{GuidanceError, Result};

/// Variant-specific fields of a content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDetails {
    ScriptureVerse { surah: u32, ayah: u32 },
    Supplication { title: String },
    NarratedSaying { book: String, number: String },
}

impl ItemDetails {
    pub fn category(&self) -> Category {
        match self {
            ItemDetails::ScriptureVerse { .. } => Category::Scripture,
            ItemDetails::Supplication { .. } => Category::Supplication,
            ItemDetails::NarratedSaying { .. } => Category::NarratedSaying,
        }
    }
}

/// A record owned by the content store. The retrieval core only reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    pub original_text: String,
    pub translation: String,
    pub citation: String,
    pub details: ItemDetails,
}

impl ContentItem {
    pub fn category(&self) -> Category {
        self.details.category()
    }
}

/// An item that has not been assigned a store id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub original_text: String,
    pub translation: String,
    pub citation: String,
    pub details: ItemDetails,
}

/// One line of an import file (JSON Lines)
///
/// Which optional fields are required depends on the target category.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRecord {
    #[serde(alias = "arabic_text")]
    pub original_text: String,
    pub translation: String,
    #[serde(default)]
    pub citation: Option<String>,
    #[serde(default)]
    pub surah: Option<u32>,
    #[serde(default)]
    pub ayah: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub book: Option<String>,
    #[serde(default, alias = "hadith_number")]
    pub number: Option<String>,
}

impl ImportRecord {
    pub fn into_item(self, category: Category) -> Result<NewItem> {
        if self.translation.trim().is_empty() {
            return Err(GuidanceError::validation("translation must not be empty"));
        }

        let (details, default_citation) = match category {
            Category::Scripture => {
                let (surah, ayah) = match (self.surah, self.ayah) {
                    (Some(s), Some(a)) => (s, a),
                    _ => {
                        return Err(GuidanceError::validation(
                            "scripture records need surah and ayah",
                        ))
                    }
                };
                (
                    ItemDetails::ScriptureVerse { surah, ayah },
                    Some(format!("Quran {}:{}", surah, ayah)),
                )
            }
            Category::Supplication => {
                let title = self.title.unwrap_or_else(|| "Supplication".to_string());
                (ItemDetails::Supplication { title }, None)
            }
            Category::NarratedSaying => {
                let (book, number) = match (self.book, self.number) {
                    (Some(b), Some(n)) => (b, n),
                    _ => {
                        return Err(GuidanceError::validation(
                            "narrated-saying records need book and number",
                        ))
                    }
                };
                let citation = format!("{} {}", book, number);
                (ItemDetails::NarratedSaying { book, number }, Some(citation))
            }
        };

        let citation = self
            .citation
            .filter(|c| !c.trim().is_empty())
            .or(default_citation)
            .ok_or_else(|| GuidanceError::validation("citation is required"))?;

        Ok(NewItem {
            original_text: self.original_text,
            translation: self.translation,
            citation,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> ImportRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_scripture_citation_default() {
        let item = record(r#"{"arabic_text":"...","translation":"Indeed, with hardship comes ease","surah":94,"ayah":6}"#)
            .into_item(Category::Scripture)
            .unwrap();
        assert_eq!(item.citation, "Quran 94:6");
        assert_eq!(item.details.category(), Category::Scripture);
    }

    #[test]
    fn test_scripture_requires_position() {
        let err = record(r#"{"original_text":"...","translation":"text"}"#)
            .into_item(Category::Scripture)
            .unwrap_err();
        assert!(matches!(err, GuidanceError::Validation(_)));
    }

    #[test]
    fn test_supplication_needs_citation() {
        let missing = record(r#"{"original_text":"...","translation":"O Allah"}"#)
            .into_item(Category::Supplication);
        assert!(missing.is_err());

        let item = record(r#"{"original_text":"...","translation":"O Allah","citation":"Abu Dawud 1525","title":"Anxiety"}"#)
            .into_item(Category::Supplication)
            .unwrap();
        assert_eq!(item.details, ItemDetails::Supplication { title: "Anxiety".into() });
    }

    #[test]
    fn test_narrated_saying_citation() {
        let item = record(r#"{"original_text":"...","translation":"t","book":"Sahih Muslim","hadith_number":"2999"}"#)
            .into_item(Category::NarratedSaying)
            .unwrap();
        assert_eq!(item.citation, "Sahih Muslim 2999");
    }
}
