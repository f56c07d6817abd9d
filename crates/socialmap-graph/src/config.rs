use crate::drag::DragMode;
use crate::edge_router::RouterConfig;
use crate::error::GraphError;
use crate::layout::LayoutConfig;
use crate::region::RegionLayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Viewer settings. Every section defaults, so a partial file only overrides
/// the fields it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub regions: RegionLayoutConfig,
    pub layout: LayoutConfig,
    pub router: RouterConfig,
    pub drag_mode: DragMode,
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path).map_err(|source| GraphError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        tracing::info!("Loaded viewer config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(content)?)
    }
}
