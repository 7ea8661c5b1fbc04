// Model variant selection
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One way of computing the modeled index, identified by its log column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariant {
    pub column: String,
    pub label: String,
}

impl ModelVariant {
    pub fn new(column: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VariantSelection {
    #[value(name = "first")]
    #[serde(rename = "first")]
    FirstOnly,
    #[value(name = "second")]
    #[serde(rename = "second")]
    SecondOnly,
    Both,
}

impl VariantSelection {
    /// Picks the enabled variants, first before second.
    pub fn select<'a>(&self, first: &'a ModelVariant, second: &'a ModelVariant) -> Vec<&'a ModelVariant> {
        match self {
            VariantSelection::FirstOnly => vec![first],
            VariantSelection::SecondOnly => vec![second],
            VariantSelection::Both => vec![first, second],
        }
    }

    pub fn is_both(&self) -> bool {
        matches!(self, VariantSelection::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_preserves_order() {
        let biot = ModelVariant::new("dstBiot", "Biot-Savart");
        let dps = ModelVariant::new("dstRam", "DPS");

        let picked = VariantSelection::Both.select(&biot, &dps);
        assert_eq!(picked, vec![&biot, &dps]);

        let picked = VariantSelection::SecondOnly.select(&biot, &dps);
        assert_eq!(picked, vec![&dps]);
    }

    #[test]
    fn test_deserializes_short_names() {
        let parsed: VariantSelection = serde_json::from_str("\"first\"").unwrap();
        assert_eq!(parsed, VariantSelection::FirstOnly);
        let parsed: VariantSelection = serde_json::from_str("\"both\"").unwrap();
        assert_eq!(parsed, VariantSelection::Both);
    }
}
