//! AURA client core library
//!
//! Collects patient parameters and a microbiology report, submits them to the
//! AURA analysis backend and renders the antimicrobial recommendation.

pub mod error;
pub mod models;
pub mod services;
pub mod telemetry;
pub mod ui;

/// Application configuration
pub mod config {
    use std::path::Path;

    use serde::Deserialize;
    use validator::Validate;

    use crate::error::SettingsError;
    use crate::models::ParameterCatalog;
    use crate::services::report::EntryMode;

    pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

    #[derive(Debug, Clone, Default, Deserialize, Validate)]
    #[serde(default)]
    pub struct Settings {
        #[validate]
        pub backend: BackendSettings,
        pub analysis: AnalysisSettings,
        pub logging: LoggingSettings,
        pub catalog: ParameterCatalog,
    }

    #[derive(Debug, Clone, Deserialize, Validate)]
    #[serde(default)]
    pub struct BackendSettings {
        #[validate(url)]
        pub base_url: String,
        #[validate(range(min = 1, max = 600))]
        pub request_timeout_secs: u64,
        #[validate(range(min = 1, max = 60))]
        pub health_timeout_secs: u64,
    }

    impl Default for BackendSettings {
        fn default() -> Self {
            Self {
                base_url: DEFAULT_BASE_URL.to_string(),
                request_timeout_secs: 60,
                health_timeout_secs: 5,
            }
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(default)]
    pub struct AnalysisSettings {
        /// Ask the backend to include debug output.
        pub debug: bool,
        pub entry_mode: EntryMode,
    }

    impl Default for AnalysisSettings {
        fn default() -> Self {
            Self {
                debug: true,
                entry_mode: EntryMode::Text,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LogFormat {
        #[default]
        Pretty,
        Json,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(default)]
    pub struct LoggingSettings {
        pub format: LogFormat,
        pub filter: String,
    }

    impl Default for LoggingSettings {
        fn default() -> Self {
            Self {
                format: LogFormat::Pretty,
                filter: "info".to_string(),
            }
        }
    }

    impl Settings {
        /// Validates ranges, the backend URL and the option catalog.
        pub fn check(&self) -> Result<(), SettingsError> {
            self.validate()?;

            let url = url::Url::parse(&self.backend.base_url).map_err(|e| SettingsError::BaseUrl {
                url: self.backend.base_url.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(SettingsError::BaseUrl {
                    url: self.backend.base_url.clone(),
                    reason: format!("unsupported scheme {:?}", url.scheme()),
                });
            }

            if self.catalog.syndromes.is_empty() {
                return Err(SettingsError::EmptyCatalog);
            }
            Ok(())
        }
    }

    /// Load configuration from the default locations
    pub fn load_config() -> Result<Settings, SettingsError> {
        load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(path: Option<&Path>) -> Result<Settings, SettingsError> {
        // Start with default settings
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Override with environment-specific settings
        let env = std::env::var("AURA_ENV").unwrap_or_else(|_| "development".into());
        builder = builder
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Override with environment variables
        let settings: Settings = builder
            .add_source(
                config::Environment::with_prefix("AURA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.check()?;
        Ok(settings)
    }

}
