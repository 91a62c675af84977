//! The fixed five-stage pipeline the backend reports progress against.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{WireError, WireResult};

/// Number of pipeline layers.
pub const LAYER_COUNT: u8 = 5;

/// One of the five pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Classify what kind of document the user needs.
    IntentUnderstanding,
    /// Interview the user until enough requirements are known.
    RequirementGathering,
    /// Retrieve related material from the knowledge base.
    RagSearch,
    /// Render the final document.
    DocumentGeneration,
    /// Check the generated document.
    QualityValidation,
}

impl Layer {
    /// All layers in pipeline order.
    pub const ALL: [Layer; 5] = [
        Layer::IntentUnderstanding,
        Layer::RequirementGathering,
        Layer::RagSearch,
        Layer::DocumentGeneration,
        Layer::QualityValidation,
    ];

    /// Look up a layer by its 1-based number.
    pub fn from_number(number: u8) -> Option<Layer> {
        match number {
            1..=LAYER_COUNT => Some(Layer::ALL[usize::from(number - 1)]),
            _ => None,
        }
    }

    /// Convert a wire integer, rejecting anything outside 1..=5.
    pub fn try_from_wire(value: i64) -> WireResult<Layer> {
        u8::try_from(value)
            .ok()
            .and_then(Layer::from_number)
            .ok_or(WireError::InvalidLayer { layer: value })
    }

    /// 1-based position in the pipeline.
    pub fn number(self) -> u8 {
        match self {
            Layer::IntentUnderstanding => 1,
            Layer::RequirementGathering => 2,
            Layer::RagSearch => 3,
            Layer::DocumentGeneration => 4,
            Layer::QualityValidation => 5,
        }
    }

    /// Human readable title.
    pub fn title(self) -> &'static str {
        match self {
            Layer::IntentUnderstanding => "Intent understanding",
            Layer::RequirementGathering => "Requirement gathering",
            Layer::RagSearch => "RAG search",
            Layer::DocumentGeneration => "Document generation",
            Layer::QualityValidation => "Quality validation",
        }
    }

    /// The following layer, if any.
    pub fn next(self) -> Option<Layer> {
        Layer::from_number(self.number() + 1)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.title())
    }
}

/// Status of a single layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    #[default]
    Pending,
    #[serde(alias = "in_progress", alias = "running")]
    Active,
    #[serde(alias = "done", alias = "complete")]
    Completed,
    #[serde(alias = "failed")]
    Error,
}

impl fmt::Display for LayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LayerStatus::Pending => "pending",
            LayerStatus::Active => "active",
            LayerStatus::Completed => "completed",
            LayerStatus::Error => "error",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_numbers_round_trip() {
        for layer in Layer::ALL {
            assert_eq!(Layer::from_number(layer.number()), Some(layer));
        }
        assert_eq!(Layer::from_number(0), None);
        assert_eq!(Layer::from_number(6), None);
    }

    #[test]
    fn test_wire_layer_validation() {
        assert_eq!(Layer::try_from_wire(3), Ok(Layer::RagSearch));
        assert_eq!(
            Layer::try_from_wire(-1),
            Err(WireError::InvalidLayer { layer: -1 })
        );
        assert!(Layer::try_from_wire(300).is_err());
    }

    #[test]
    fn test_next_stops_at_last_layer() {
        assert_eq!(
            Layer::IntentUnderstanding.next(),
            Some(Layer::RequirementGathering)
        );
        assert_eq!(Layer::QualityValidation.next(), None);
    }

    #[test]
    fn test_status_aliases() {
        let status: LayerStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, LayerStatus::Active);
        let status: LayerStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(status, LayerStatus::Completed);
        assert_eq!(serde_json::to_string(&LayerStatus::Error).unwrap(), "\"error\"");
    }
}
