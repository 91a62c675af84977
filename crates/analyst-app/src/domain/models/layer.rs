use analyst_types::Layer;
use analyst_types::LayerStatus;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// State of one pipeline layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerEntry {
    pub number: u8,
    pub status: LayerStatus,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LayerEntry {
    pub fn pending(number: u8) -> LayerEntry {
        return LayerEntry {
            number,
            status: LayerStatus::Pending,
            data: None,
            error: None,
        };
    }

    pub fn layer(&self) -> Option<Layer> {
        return Layer::from_number(self.number);
    }

    pub fn title(&self) -> &'static str {
        return self.layer().map(Layer::title).unwrap_or("Unknown");
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerTransition {
    pub layer: u8,
    pub from: LayerStatus,
    pub to: LayerStatus,
    pub at: DateTime<Utc>,
}

/// Serializable copy of the layer store, kept with each saved session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub current_layer: u8,
    pub layers: Vec<LayerEntry>,
    #[serde(default)]
    pub history: Vec<LayerTransition>,
}
