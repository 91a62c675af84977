#[cfg(test)]
#[path = "layer_store_test.rs"]
mod tests;

use analyst_types::Layer;
use analyst_types::LayerStatus;
use analyst_types::LAYER_COUNT;
use chrono::Utc;
use serde_json::Value;

use crate::domain::models::LayerEntry;
use crate::domain::models::LayerSnapshot;
use crate::domain::models::LayerTransition;

/// The five pipeline layers of the current session.
///
/// Layer numbers are taken as `i64` so wire values can be passed straight
/// through; anything outside `1..=5` is ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerStore {
    current_layer: u8,
    layers: Vec<LayerEntry>,
    history: Vec<LayerTransition>,
}

impl Default for LayerStore {
    fn default() -> LayerStore {
        return LayerStore {
            current_layer: 1,
            layers: (1..=LAYER_COUNT).map(LayerEntry::pending).collect(),
            history: vec![],
        };
    }
}

impl LayerStore {
    pub fn new() -> LayerStore {
        return LayerStore::default();
    }

    fn index(n: i64) -> Option<usize> {
        if n < 1 || n > i64::from(LAYER_COUNT) {
            return None;
        }
        return Some((n - 1) as usize);
    }

    pub fn current_layer(&self) -> u8 {
        return self.current_layer;
    }

    pub fn current(&self) -> Layer {
        return Layer::from_number(self.current_layer).unwrap_or(Layer::IntentUnderstanding);
    }

    pub fn layers(&self) -> &[LayerEntry] {
        return &self.layers;
    }

    pub fn get(&self, n: i64) -> Option<&LayerEntry> {
        return LayerStore::index(n).map(|idx| return &self.layers[idx]);
    }

    pub fn status(&self, n: i64) -> Option<LayerStatus> {
        return self.get(n).map(|entry| return entry.status);
    }

    pub fn history(&self) -> &[LayerTransition] {
        return &self.history;
    }

    pub fn completed_layers(&self) -> Vec<u8> {
        return self
            .layers
            .iter()
            .filter(|entry| return entry.status == LayerStatus::Completed)
            .map(|entry| return entry.number)
            .collect();
    }

    /// Fraction of completed layers, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        return self.completed_layers().len() as f64 / f64::from(LAYER_COUNT);
    }

    pub fn is_complete(&self) -> bool {
        return self.completed_layers().len() == usize::from(LAYER_COUNT);
    }

    fn transition(&mut self, idx: usize, to: LayerStatus) {
        let entry = &mut self.layers[idx];
        if entry.status == to {
            return;
        }

        self.history.push(LayerTransition {
            layer: entry.number,
            from: entry.status,
            to,
            at: Utc::now(),
        });
        entry.status = to;
    }

    pub fn set_current_layer(&mut self, n: i64) {
        let Some(idx) = LayerStore::index(n) else {
            tracing::debug!(layer = n, "ignoring out of range layer");
            return;
        };

        self.current_layer = self.layers[idx].number;
        if self.layers[idx].status != LayerStatus::Completed {
            self.transition(idx, LayerStatus::Active);
        }
    }

    pub fn complete_layer(&mut self, n: i64) {
        let Some(idx) = LayerStore::index(n) else {
            tracing::debug!(layer = n, "ignoring out of range layer");
            return;
        };

        self.transition(idx, LayerStatus::Completed);
        self.layers[idx].error = None;
        if n < i64::from(LAYER_COUNT) {
            self.set_current_layer(n + 1);
        }
    }

    pub fn fail_layer(&mut self, n: i64, message: Option<String>) {
        let Some(idx) = LayerStore::index(n) else {
            return;
        };

        self.transition(idx, LayerStatus::Error);
        self.layers[idx].error = message;
    }

    /// Apply a status reported by the backend.
    pub fn update_layer_status(&mut self, n: i64, status: LayerStatus) {
        match status {
            LayerStatus::Completed => self.complete_layer(n),
            LayerStatus::Error => self.fail_layer(n, None),
            LayerStatus::Active => self.set_current_layer(n),
            LayerStatus::Pending => {
                if let Some(idx) = LayerStore::index(n) {
                    self.transition(idx, LayerStatus::Pending);
                }
            }
        }
    }

    pub fn set_layer_data(&mut self, n: i64, data: Option<Value>) {
        if let Some(idx) = LayerStore::index(n) {
            self.layers[idx].data = data;
        }
    }

    pub fn reset(&mut self) {
        *self = LayerStore::default();
    }

    pub fn snapshot(&self) -> LayerSnapshot {
        return LayerSnapshot {
            current_layer: self.current_layer,
            layers: self.layers.clone(),
            history: self.history.clone(),
        };
    }

    /// Load a saved snapshot. Entries with unknown layer numbers are dropped.
    pub fn restore(&mut self, snapshot: &LayerSnapshot) {
        self.reset();
        for entry in &snapshot.layers {
            if let Some(idx) = LayerStore::index(i64::from(entry.number)) {
                self.layers[idx] = entry.clone();
            }
        }
        if LayerStore::index(i64::from(snapshot.current_layer)).is_some() {
            self.current_layer = snapshot.current_layer;
        }
        self.history = snapshot.history.clone();
    }
}
