// Editor settings. Every field has a default, so an empty `{}` (or no file at
// all) gives the stock editor. The library never touches the filesystem; the
// binary reads the file and hands the text to `from_json`.
use std::time::Duration;

use serde::Deserialize;

use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::history::MAX_HISTORY;
use crate::vectorize::TraceOptions;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Raster wand tolerance, 0..=100.
    pub tolerance: u8,
    /// Vector wand tolerance, 0..=100.
    pub vector_tolerance: u8,
    pub fill_color: String,
    pub max_history: usize,
    pub trace_timeout_ms: u64,
    pub trace: TraceOptions,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tolerance: 20,
            vector_tolerance: 10,
            fill_color: "#00D4AA".to_string(),
            max_history: MAX_HISTORY,
            trace_timeout_ms: 10_000,
            trace: TraceOptions::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tolerance > 100 || self.vector_tolerance > 100 {
            return Err(Error::Config("tolerance must be between 0 and 100".into()));
        }
        if self.trace.colors == 0 {
            return Err(Error::Config("trace.colors must be at least 1".into()));
        }
        self.fill()?;
        Ok(())
    }

    pub fn fill(&self) -> Result<Rgb> {
        Rgb::from_hex(&self.fill_color)
            .ok_or_else(|| Error::Config(format!("fill_color `{}` is not a hex color", self.fill_color)))
    }

    pub fn trace_timeout(&self) -> Duration {
        Duration::from_millis(self.trace_timeout_ms)
    }
}
