//! Run configuration.

use serde::{Deserialize, Serialize};
use url::Url;
use url::form_urlencoded;

use crate::error::ConfigError;
use crate::mask::OutlineStyle;
use crate::projection::Margin;
use crate::status::Retention;

/// How results are projected, outlined, and reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fraction of each raster viewport the locality may occupy.
    pub margin: Margin,
    /// Border drawn over each clipped raster.
    pub outline: OutlineStyle,
    /// Status feed retention.
    pub retention: Retention,
    /// Append `t=<millis>` to raster URLs so regenerated products are
    /// refetched.
    pub cache_bust: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            margin: Margin::default(),
            outline: OutlineStyle::default(),
            retention: Retention::Latest,
            cache_bust: true,
        }
    }
}

impl AnalysisConfig {
    /// Check the fields `serde` cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let o = &self.outline;
        if !o.width.is_finite() || o.width < 0.0 {
            return Err(ConfigError::OutlineWidth(o.width));
        }
        if !(0.0..=1.0).contains(&o.opacity) {
            return Err(ConfigError::OutlineOpacity(o.opacity));
        }
        if o.color.trim().is_empty() {
            return Err(ConfigError::OutlineColor);
        }
        if matches!(self.retention, Retention::History { capacity: 0 }) {
            return Err(ConfigError::HistoryCapacity);
        }
        Ok(())
    }
}

/// Where the two backend endpoints live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Origin the paths are resolved against. Empty means same-origin
    /// relative URLs (the browser default).
    pub base_url: String,
    /// Path of the boundary lookup.
    pub boundary_path: String,
    /// Path of the product generator.
    pub process_path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            boundary_path: String::from("/get_locality_geojson"),
            process_path: String::from("/process"),
        }
    }
}

impl EndpointConfig {
    /// Configuration for a backend at `base_url`.
    #[must_use]
    pub fn with_base(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Boundary lookup URL for `locality`, with the name form-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BaseUrl`] if the base URL is set but invalid.
    pub fn boundary_url(&self, locality: &str) -> Result<String, ConfigError> {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("name", locality)
            .finish();
        let path = format!("{}?{query}", self.boundary_path);
        self.resolve(&path)
    }

    /// Product generator URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BaseUrl`] if the base URL is set but invalid.
    pub fn process_url(&self) -> Result<String, ConfigError> {
        self.resolve(&self.process_path)
    }

    /// Resolve a server-relative URL (such as a raster path) against the
    /// base URL. Absolute URLs pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BaseUrl`] if the base URL is set but invalid.
    pub fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
        if self.base_url.is_empty() {
            return Ok(reference.to_owned());
        }
        let base = Url::parse(&self.base_url).map_err(|e| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        base.join(reference)
            .map(String::from)
            .map_err(|e| ConfigError::BaseUrl {
                url: self.base_url.clone(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.margin, Margin::FULL);
        assert!(config.cache_bust);
    }

    #[test]
    fn rejects_bad_outline() {
        let mut config = AnalysisConfig::default();
        config.outline.opacity = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::OutlineOpacity(1.5)));

        let mut config = AnalysisConfig::default();
        config.outline.width = -1.0;
        assert_eq!(config.validate(), Err(ConfigError::OutlineWidth(-1.0)));

        let mut config = AnalysisConfig::default();
        config.outline.color = String::from(" ");
        assert_eq!(config.validate(), Err(ConfigError::OutlineColor));
    }

    #[test]
    fn rejects_empty_history() {
        let config = AnalysisConfig {
            retention: Retention::History { capacity: 0 },
            ..AnalysisConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::HistoryCapacity));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"margin":1.0,"outline":{"width":5.0}}"#).unwrap();
        assert_eq!(config.margin, Margin::FULL);
        assert!((config.outline.width - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.outline.color, "#ffffff");
        assert_eq!(config.retention, Retention::Latest);
    }

    #[test]
    fn out_of_range_margin_fails_to_deserialize() {
        assert!(serde_json::from_str::<AnalysisConfig>(r#"{"margin":0.0}"#).is_err());
    }

    #[test]
    fn relative_boundary_url_is_encoded() {
        let endpoints = EndpointConfig::default();
        assert_eq!(
            endpoints.boundary_url("Saint-Denis & Co").unwrap(),
            "/get_locality_geojson?name=Saint-Denis+%26+Co"
        );
        assert_eq!(endpoints.process_url().unwrap(), "/process");
    }

    #[test]
    fn absolute_urls_with_base() {
        let endpoints = EndpointConfig::with_base("http://localhost:5000");
        assert_eq!(
            endpoints.boundary_url("Springfield").unwrap(),
            "http://localhost:5000/get_locality_geojson?name=Springfield"
        );
        assert_eq!(
            endpoints.resolve("/static/outputs/a.gif").unwrap(),
            "http://localhost:5000/static/outputs/a.gif"
        );
        assert_eq!(
            endpoints.resolve("https://cdn.example.org/b.gif").unwrap(),
            "https://cdn.example.org/b.gif"
        );
    }

    #[test]
    fn invalid_base_url() {
        let endpoints = EndpointConfig::with_base("not a url");
        assert!(matches!(
            endpoints.process_url(),
            Err(ConfigError::BaseUrl { .. })
        ));
    }
}
