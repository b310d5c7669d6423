//! Page description files
//!
//! A page is a vertical stack of sections. Each section is revealed as a
//! whole, or item by item when it lists `items`:
//!
//! ```toml
//! [page]
//! name = "agency"
//! width = 1280
//!
//! [defaults]
//! threshold = 0.1
//!
//! [[section]]
//! id = "team"
//! height = 900
//! items = 4
//! columns = 4
//!
//! [section.reveal]
//! cascade_step_ms = 100
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use unveil_reveal::{ConfigError, RevealConfig, RevealConfigSpec};

// =============================================================================
// Page
// =============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PageConfig {
    pub page: PageMetadata,
    /// Reveal settings every section starts from
    #[serde(default)]
    pub defaults: RevealConfigSpec,
    #[serde(default, rename = "section")]
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PageMetadata {
    pub name: String,
    #[serde(default = "default_width")]
    pub width: f32,
}

fn default_width() -> f32 {
    1280.0
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    pub id: String,
    pub height: f32,
    /// Number of list items revealed in sequence
    #[serde(default)]
    pub items: Option<usize>,
    #[serde(default = "default_columns")]
    pub columns: usize,
    /// Item height; defaults to an even split of the section's rows
    #[serde(default)]
    pub item_height: Option<f32>,
    /// Numbers counted up by the section's items once revealed
    #[serde(default)]
    pub count_to: Vec<u64>,
    #[serde(default)]
    pub reveal: RevealConfigSpec,
}

fn default_columns() -> usize {
    1
}

impl SectionConfig {
    /// Number of revealed elements: the items, or the section itself.
    /// Counters imply one item each when `items` is not given.
    pub fn element_count(&self) -> usize {
        match self.items {
            Some(items) => items,
            None if !self.count_to.is_empty() => self.count_to.len(),
            None => 1,
        }
    }

    pub fn is_list(&self) -> bool {
        self.items.is_some() || !self.count_to.is_empty()
    }

    /// The section's reveal settings layered over the page defaults
    pub fn reveal_config(&self, defaults: &RevealConfigSpec) -> Result<RevealConfig, ConfigError> {
        defaults.overlay(&self.reveal).build()
    }
}

impl PageConfig {
    /// Load a page description from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("No page description found at {}", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: PageConfig = toml::from_str(content)?;

        if config.page.width <= 0.0 {
            anyhow::bail!("page width must be positive, got {}", config.page.width);
        }
        for section in &config.sections {
            if section.height < 0.0 {
                anyhow::bail!("section '{}' has a negative height", section.id);
            }
            if section.columns == 0 {
                anyhow::bail!("section '{}' needs at least one column", section.id);
            }
        }

        Ok(config)
    }

    pub fn total_height(&self) -> f32 {
        self.sections.iter().map(|s| s.height).sum()
    }
}
