use serde::Deserialize;

use crate::error::{BridgeError, Result};

/// Page-level settings for the bridge. Every field has a default so an
/// empty JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// CSS selector of the canvas that hosts the WebGL2 context.
    pub canvas_selector: String,
    /// Global function returning a promise of the rendering module.
    pub module_factory: String,
    pub context: ContextAttributes,
    /// Pixels per line when a wheel event reports its delta in lines.
    pub line_height_px: f64,
    pub log_level: String,
    /// Log the unmasked GPU vendor and renderer after context creation.
    pub log_renderer_info: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            canvas_selector: "#glcanvas".to_string(),
            module_factory: "createRustSkiaModule".to_string(),
            context: ContextAttributes::default(),
            line_height_px: 16.0,
            log_level: "info".to_string(),
            log_renderer_info: true,
        }
    }
}

/// Attributes passed to `getContext("webgl2", ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContextAttributes {
    pub antialias: bool,
    pub depth: bool,
    pub stencil: bool,
    pub alpha: bool,
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self {
            antialias: true,
            depth: true,
            stencil: true,
            alpha: true,
        }
    }
}

impl BridgeConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.line_height_px.is_finite() || self.line_height_px <= 0.0 {
            return Err(BridgeError::Config(format!(
                "line_height_px must be a positive number, got {}",
                self.line_height_px
            )));
        }
        if self.canvas_selector.trim().is_empty() {
            return Err(BridgeError::Config("canvas_selector is empty".to_string()));
        }
        self.level()?;
        Ok(())
    }

    /// Resolves `log_level` into a [`log::Level`].
    pub fn level(&self) -> Result<log::Level> {
        self.log_level
            .parse::<log::Level>()
            .map_err(|_| BridgeError::Config(format!("unknown log level `{}`", self.log_level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = BridgeConfig::from_json("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.canvas_selector, "#glcanvas");
        assert!(config.context.antialias && config.context.stencil);
    }

    #[test]
    fn partial_context_keeps_other_attributes() {
        let config =
            BridgeConfig::from_json(r#"{"context": {"alpha": false}, "line_height_px": 20}"#)
                .unwrap();
        assert!(!config.context.alpha);
        assert!(config.context.depth);
        assert_eq!(config.line_height_px, 20.0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            BridgeConfig::from_json(r#"{"line_height_px": 0}"#),
            Err(BridgeError::Config(_))
        ));
        assert!(matches!(
            BridgeConfig::from_json(r#"{"log_level": "loud"}"#),
            Err(BridgeError::Config(_))
        ));
        assert!(matches!(
            BridgeConfig::from_json("not json"),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let config = BridgeConfig::from_json(r#"{"log_level": "DEBUG"}"#).unwrap();
        assert_eq!(config.level().unwrap(), log::Level::Debug);
    }
}
