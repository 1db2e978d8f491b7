//! Shared configuration loader for the META Schema toolchain.
//!
//! `defaults/metaschema.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top of those
//! defaults via [`Loader`] before deserializing into [`MetaschemaConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use metaschema_parser::metaschema::parsing::FlushPolicy;
use metaschema_parser::metaschema::ParseOptions;
use serde::Deserialize;
use std::path::Path;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/metaschema.default.toml");

/// Top-level configuration consumed by META Schema applications.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaschemaConfig {
    pub parser: ParserConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Mirrors the knobs of [`ParseOptions`].
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ParserConfig {
    pub diagnostics: FlushPolicy,
    pub token_descriptors: bool,
    pub parse_table: bool,
}

impl From<ParserConfig> for ParseOptions {
    fn from(config: ParserConfig) -> Self {
        ParseOptions {
            flush_policy: config.diagnostics,
            token_descriptors: config.token_descriptors,
            parse_table: config.parse_table,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<MetaschemaConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<MetaschemaConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.parser.diagnostics, FlushPolicy::Buffered);
        assert!(!config.parser.token_descriptors);
        assert!(!config.parser.parse_table);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn defaults_match_parse_options() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(ParseOptions::from(config.parser), ParseOptions::default());
    }

    #[rstest]
    #[case("parser.diagnostics", "immediate")]
    #[case("output.format", "yaml")]
    #[case("logging.filter", "metaschema_parser=trace")]
    fn supports_overrides(#[case] key: &str, #[case] value: &str) {
        let config = Loader::new()
            .set_override(key, value)
            .expect("override to apply")
            .build()
            .expect("config to build");
        match key {
            "parser.diagnostics" => assert_eq!(config.parser.diagnostics, FlushPolicy::Immediate),
            "output.format" => assert_eq!(config.output.format, OutputFormat::Yaml),
            _ => assert_eq!(config.logging.filter, value),
        }
    }

    #[test]
    fn layers_user_files() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[parser]\nparse_table = true\n\n[output]\npretty = false").unwrap();

        let config = Loader::new().with_file(file.path()).build().unwrap();
        assert!(config.parser.parse_table);
        assert!(!config.output.pretty);
        assert_eq!(config.output.format, OutputFormat::Json);

        let options = ParseOptions::from(config.parser);
        assert!(options.parse_table);
        assert_eq!(options.flush_policy, FlushPolicy::Buffered);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = Loader::new().with_file("does/not/exist.toml").build();
        assert!(result.is_err());
    }

    #[test]
    fn optional_file_may_be_absent() {
        let config = Loader::new()
            .with_optional_file("does/not/exist.toml")
            .build()
            .unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn rejects_unknown_flush_policy() {
        let result = Loader::new()
            .set_override("parser.diagnostics", "eventually")
            .unwrap()
            .build();
        assert!(result.is_err());
    }
}
