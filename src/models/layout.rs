use serde::{Deserialize, Serialize};

/// Desktop panel sizing, in percent of the available width.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutState {
    #[serde(default)]
    pub panels: Vec<f64>,
}

impl LayoutState {
    pub fn is_valid(&self) -> bool {
        self.panels
            .iter()
            .all(|size| size.is_finite() && (0.0..=100.0).contains(size))
    }
}
