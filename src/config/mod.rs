use crate::results::writer::{validate_output_dir_name, DEFAULT_OUTPUT_DIR_NAME};
use crate::results::MergePolicyKind;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Result-log parser settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// Settings for the statistical comparison that consumes the parser's output
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// How the parser treats a line that is not a result line.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedLinePolicy {
    /// Abort the run, reporting the line number
    #[default]
    Fail,
    /// Log the line and move on
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Name of the directory created next to the log
    #[serde(default = "default_output_dir_name")]
    pub output_dir_name: String,

    /// How repeated (mutant, input) results are combined
    #[serde(default)]
    pub merge_policy: MergePolicyKind,

    #[serde(default)]
    pub unmatched_lines: UnmatchedLinePolicy,
}

/// Parameters of the downstream significance test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Significance level, e.g. 0.05
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,

    /// Number of the program's qubits used as inputs
    #[serde(default = "default_input_qubits")]
    pub input_qubits: usize,

    /// Indices of the qubits that are measured
    #[serde(default = "default_measured_qubits")]
    pub measured_qubits: Vec<usize>,
}

impl ParserConfig {
    pub fn validate(&self) -> Result<()> {
        validate_output_dir_name(&self.output_dir_name)?;
        Ok(())
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            anyhow::bail!(
                "significance_level must be between 0 and 1 (exclusive), got {}",
                self.significance_level
            );
        }
        if self.measured_qubits.is_empty() {
            anyhow::bail!("measured_qubits must name at least one qubit");
        }
        let distinct: BTreeSet<_> = self.measured_qubits.iter().collect();
        if distinct.len() != self.measured_qubits.len() {
            anyhow::bail!(
                "measured_qubits contains duplicates: {:?}",
                self.measured_qubits
            );
        }
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir_name() -> String {
    DEFAULT_OUTPUT_DIR_NAME.to_string()
}

fn default_significance_level() -> f64 {
    0.05
}

fn default_input_qubits() -> usize {
    7
}

fn default_measured_qubits() -> Vec<usize> {
    vec![0, 1]
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            output_dir_name: default_output_dir_name(),
            merge_policy: MergePolicyKind::default(),
            unmatched_lines: UnmatchedLinePolicy::default(),
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            significance_level: default_significance_level(),
            input_qubits: default_input_qubits(),
            measured_qubits: default_measured_qubits(),
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if not found
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(Self::default_config_path);

        let config: Config = match config_path {
            Some(ref path) if path.exists() => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config from {:?}", path))?;
                toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config from {:?}", path))?
            }
            _ => Config::default(),
        };

        config
            .parser
            .validate()
            .context("Invalid [parser] configuration")?;
        config
            .analyzer
            .validate()
            .context("Invalid [analyzer] configuration")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(Self::default_config_path)
            .context("No config path available")?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = self.to_toml()?;
        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Write the default configuration, refusing to replace an existing file.
    ///
    /// Returns the path that was written.
    pub fn init(path: Option<&Path>) -> Result<PathBuf> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(Self::default_config_path)
            .context("No config path available")?;

        if config_path.exists() {
            anyhow::bail!("Config file already exists: {:?}", config_path);
        }

        Config::default().save(Some(&config_path))?;
        Ok(config_path)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "mutant-counts", "mutant-counts")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Default value tests
    // =========================================================================

    #[test]
    fn test_default_parser_config() {
        let config = ParserConfig::default();
        assert_eq!(config.output_dir_name, "json_results");
        assert_eq!(config.merge_policy, MergePolicyKind::LastWriteWins);
        assert_eq!(config.unmatched_lines, UnmatchedLinePolicy::Fail);
    }

    #[test]
    fn test_default_analyzer_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.significance_level, 0.05);
        assert_eq!(config.input_qubits, 7);
        assert_eq!(config.measured_qubits, vec![0, 1]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_general_config() {
        let config = GeneralConfig::default();
        assert_eq!(config.log_level, "info");
    }

    // =========================================================================
    // Analyzer validation tests
    // =========================================================================

    #[test]
    fn test_validate_significance_bounds() {
        for level in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let config = AnalyzerConfig {
                significance_level: level,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted {level}");
        }
    }

    #[test]
    fn test_validate_measured_qubits() {
        let empty = AnalyzerConfig {
            measured_qubits: vec![],
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let duplicated = AnalyzerConfig {
            measured_qubits: vec![0, 2, 0],
            ..Default::default()
        };
        let err = duplicated.validate().unwrap_err();
        assert!(err.to_string().contains("duplicates"));
    }

    #[test]
    fn test_validate_output_dir_name() {
        assert!(ParserConfig::default().validate().is_ok());
        for name in ["../x", "/abs", "a/b", "", ".."] {
            let config = ParserConfig {
                output_dir_name: name.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted {name:?}");
        }
    }

    // =========================================================================
    // Config parsing tests
    // =========================================================================

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
[general]
log_level = "debug"

[parser]
merge_policy = "sum_counts"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.parser.merge_policy, MergePolicyKind::SumCounts);
        // Defaults should still apply
        assert_eq!(config.parser.output_dir_name, "json_results");
        assert_eq!(config.parser.unmatched_lines, UnmatchedLinePolicy::Fail);
        assert_eq!(config.analyzer.significance_level, 0.05);
    }

    #[test]
    fn test_parse_analyzer_section() {
        let toml = r#"
[analyzer]
significance_level = 0.01
input_qubits = 3
measured_qubits = [4, 5, 6]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.analyzer.significance_level, 0.01);
        assert_eq!(config.analyzer.input_qubits, 3);
        assert_eq!(config.analyzer.measured_qubits, vec![4, 5, 6]);
    }

    #[test]
    fn test_parse_unmatched_lines() {
        let toml = r#"
[parser]
unmatched_lines = "skip"
output_dir_name = "counts"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.parser.unmatched_lines, UnmatchedLinePolicy::Skip);
        assert_eq!(config.parser.output_dir_name, "counts");
    }

    #[test]
    fn test_parse_unknown_policy_fails() {
        let toml = r#"
[parser]
merge_policy = "average"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    // =========================================================================
    // File I/O tests
    // =========================================================================

    #[test]
    fn test_config_load_nonexistent() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::remove_file(temp_file.path()).unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_load_valid_file() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        let toml_content = r#"
[general]
log_level = "warn"

[parser]
unmatched_lines = "skip"

[analyzer]
measured_qubits = [1]
"#;

        std::fs::write(temp_file.path(), toml_content).unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.parser.unmatched_lines, UnmatchedLinePolicy::Skip);
        assert_eq!(config.analyzer.measured_qubits, vec![1]);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        std::fs::write(temp_file.path(), "invalid {{{{ toml").unwrap();

        let result = Config::load(Some(temp_file.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load_rejects_invalid_analyzer() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[analyzer]\nsignificance_level = 2.0\n").unwrap();

        let err = Config::load(Some(temp_file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("significance_level"));
    }

    #[test]
    fn test_config_load_rejects_escaping_output_dir() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[parser]\noutput_dir_name = \"../elsewhere\"\n").unwrap();

        let err = Config::load(Some(temp_file.path())).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("[parser]"));
        assert!(message.contains("../elsewhere"));
    }

    #[test]
    fn test_config_save_roundtrip() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        let config = Config {
            general: GeneralConfig {
                log_level: "debug".to_string(),
            },
            parser: ParserConfig {
                output_dir_name: "out".to_string(),
                merge_policy: MergePolicyKind::SumCounts,
                unmatched_lines: UnmatchedLinePolicy::Skip,
            },
            analyzer: AnalyzerConfig {
                significance_level: 0.1,
                input_qubits: 2,
                measured_qubits: vec![3],
            },
        };

        config.save(Some(temp_file.path())).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("merge_policy = \"sum_counts\""));
        assert!(content.contains("unmatched_lines = \"skip\""));

        let loaded = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_save_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("subdir").join("config.toml");

        let config = Config::default();
        config.save(Some(&config_path)).unwrap();

        assert!(config_path.exists());
    }

    #[test]
    fn test_config_init_writes_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let written = Config::init(Some(&config_path)).unwrap();
        assert_eq!(written, config_path);

        let loaded = Config::load(Some(&config_path)).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_config_init_refuses_existing_file() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[general]\nlog_level = \"warn\"\n").unwrap();

        let err = Config::init(Some(temp_file.path())).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(
            std::fs::read_to_string(temp_file.path()).unwrap(),
            "[general]\nlog_level = \"warn\"\n"
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("config.toml"));
    }
}
