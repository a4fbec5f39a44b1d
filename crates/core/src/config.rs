use serde::{Deserialize, Serialize};

pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".java", ".py", ".cpp", ".c", ".h", ".hpp", ".js", ".ts", ".xml", ".json",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub matching: MatchingConfig,
    pub report: ReportConfig,
    pub tools: Vec<ToolConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub extensions: Vec<String>,
    /// Globs matched against paths relative to the scan root.
    pub exclude: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum filename similarity for a fuzzy match.
    pub name_threshold: f64,
    /// A merge directory missing from the expected tree borrows the first
    /// expected directory whose path similarity exceeds this.
    pub path_threshold: f64,
    /// Fuzzy matches scoring below this are tagged `name_mismatch`.
    pub clean_match_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            name_threshold: crate::matcher::DEFAULT_NAME_THRESHOLD,
            path_threshold: 0.8,
            clean_match_threshold: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: Option<String>,
    pub write_diffs: bool,
    pub worst_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            write_diffs: true,
            worst_limit: 10,
        }
    }
}

/// An external merge tool invoked once per scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    pub program: String,
    /// Supports `{left}`, `{base}`, `{right}`, `{output}` and `{scenario}`.
    #[serde(default)]
    pub args: Vec<String>,
    /// Nested folder (relative to the output) the tool writes into; its
    /// files are moved up to the output root after a run.
    #[serde(default)]
    pub flatten_from: Option<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("MERGESCORE")
            .separator("__")
            .try_parsing(true),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

/// Trims entries, drops blanks and adds a missing leading dot (`java` -> `.java`).
pub fn normalize_extensions<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.as_ref().trim())
        .filter(|e| !e.is_empty())
        .map(|e| {
            if e.starts_with('.') {
                e.to_string()
            } else {
                format!(".{e}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_file_fails_and_defaults_hold() {
        let cfg = load(Some("does/not/exist")).err();
        assert!(cfg.is_some(), "explicit missing file is an error");

        let cfg = AppConfig::default();
        assert_eq!(cfg.scan.extensions.len(), DEFAULT_EXTENSIONS.len());
        assert_eq!(cfg.matching.name_threshold, 0.6);
        assert_eq!(cfg.matching.path_threshold, 0.8);
        assert_eq!(cfg.matching.clean_match_threshold, 0.9);
        assert!(cfg.report.write_diffs);
    }

    #[test]
    fn loads_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.toml");
        std::fs::write(
            &path,
            r#"
            [scan]
            extensions = [".java"]

            [matching]
            name_threshold = 0.75

            [[tools]]
            name = "JDime"
            program = "java"
            args = ["-jar", "jdime.jar", "{left}", "{base}", "{right}", "-o", "{output}"]
            "#,
        )
        .unwrap();
        let cfg = load(path.to_str()).unwrap();
        assert_eq!(cfg.scan.extensions, vec![".java".to_string()]);
        assert!(cfg.scan.exclude.is_empty());
        assert_eq!(cfg.matching.name_threshold, 0.75);
        assert_eq!(cfg.matching.path_threshold, 0.8);
        assert_eq!(cfg.tools.len(), 1);
        assert_eq!(cfg.tools[0].args.len(), 7);
        assert_eq!(cfg.report.worst_limit, 10);
    }

    #[test]
    fn extensions_gain_a_leading_dot() {
        assert_eq!(
            normalize_extensions(&["java", ".py", " ", "ts "]),
            vec![".java", ".py", ".ts"]
        );
    }
}
