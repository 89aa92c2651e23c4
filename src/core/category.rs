use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GuidanceError;

/// Content category. Each category owns exactly one vector collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Scripture,
    Supplication,
    NarratedSaying,
}

impl Category {
    /// Registration order. Fusion breaks distance ties in this order.
    pub const ALL: [Category; 3] = [
        Category::Scripture,
        Category::Supplication,
        Category::NarratedSaying,
    ];

    /// Collection name, also used as the snapshot file stem
    pub fn name(self) -> &'static str {
        match self {
            Category::Scripture => "scripture",
            Category::Supplication => "supplication",
            Category::NarratedSaying => "narrated-saying",
        }
    }

    /// Human-facing label
    pub fn label(self) -> &'static str {
        match self {
            Category::Scripture => "Quran",
            Category::Supplication => "Dua",
            Category::NarratedSaying => "Hadith",
        }
    }

    pub fn rank(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = GuidanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scripture" | "quran" | "verse" => Ok(Category::Scripture),
            "supplication" | "dua" => Ok(Category::Supplication),
            "narrated-saying" | "narrated_saying" | "hadith" => Ok(Category::NarratedSaying),
            other => Err(GuidanceError::validation(format!(
                "unknown category '{}' (expected scripture, supplication or narrated-saying)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order() {
        let ranks: Vec<usize> = Category::ALL.iter().map(|c| c.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Quran".parse::<Category>().unwrap(), Category::Scripture);
        assert_eq!("dua".parse::<Category>().unwrap(), Category::Supplication);
        assert_eq!(
            "narrated-saying".parse::<Category>().unwrap(),
            Category::NarratedSaying
        );
        assert!("poetry".parse::<Category>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Category::NarratedSaying).unwrap();
        assert_eq!(json, "\"narrated-saying\"");
    }
}
