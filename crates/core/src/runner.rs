//! Merge-tool runners: produce a merge tree for each scenario.

use crate::config::{normalize_extensions, ToolConfig};
use crate::error::RunnerError;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// One three-way merge case: `left`, `base` and `right` trees plus the
/// directory the tool's output goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeScenario {
    pub name: String,
    pub left: PathBuf,
    pub base: PathBuf,
    pub right: PathBuf,
    pub output: PathBuf,
}

impl MergeScenario {
    pub fn new(name: &str, dir: &Path, output_root: &Path) -> Self {
        Self {
            name: name.to_string(),
            left: dir.join("left"),
            base: dir.join("base"),
            right: dir.join("right"),
            output: output_root.join(name),
        }
    }
}

/// Scenario folders under `root` (sorted), i.e. subdirectories holding a
/// `left` or `right` tree. Outputs go to `output_root/<scenario>`.
pub fn discover_scenarios(root: &Path, output_root: &Path) -> std::io::Result<Vec<MergeScenario>> {
    let mut scenarios = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() || !(path.join("left").is_dir() || path.join("right").is_dir()) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => scenarios.push(MergeScenario::new(&name, &path, output_root)),
            Err(name) => debug!("Skipping non UTF-8 scenario {name:?}"),
        }
    }
    scenarios.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scenarios)
}

pub trait MergeToolRunner: Send + Sync {
    fn name(&self) -> &str;
    /// Runs the tool on one scenario and returns the directory holding the
    /// produced files.
    fn run(&self, scenario: &MergeScenario) -> Result<PathBuf, RunnerError>;
}

/// Runs an external program with placeholder-expanded arguments.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    tool: ToolConfig,
    extensions: Vec<String>,
}

impl CommandRunner {
    pub fn new(tool: ToolConfig) -> Self {
        let extensions = normalize_extensions(&tool.extensions);
        Self { tool, extensions }
    }

    fn args(&self, scenario: &MergeScenario) -> Vec<String> {
        self.tool
            .args
            .iter()
            .map(|arg| expand(arg, scenario))
            .collect()
    }

    /// Moves files out of the nested folder the tool wrote into, then drops
    /// that folder's top-level directory.
    fn flatten(&self, output: &Path, nested: &str) -> Result<(), RunnerError> {
        let src = output.join(nested);
        if !src.is_dir() {
            return Ok(());
        }
        let relocate = |path: &Path, source| RunnerError::Relocate {
            path: path.to_path_buf(),
            source,
        };
        for entry in WalkDir::new(&src).sort_by_file_name() {
            let entry = entry.map_err(|e| relocate(&src, e.into()))?;
            if !entry.file_type().is_file() || !self.wanted(entry.file_name().to_str()) {
                continue;
            }
            let dest = output.join(entry.file_name());
            fs::rename(entry.path(), &dest).map_err(|e| relocate(entry.path(), e))?;
            debug!("Moved {} to {}", entry.path().display(), dest.display());
        }
        let top = Path::new(nested)
            .components()
            .next()
            .map(|c| output.join(c))
            .unwrap_or(src);
        fs::remove_dir_all(&top).map_err(|e| relocate(&top, e))
    }

    /// The nested folder is later removed, so it must name a real folder
    /// strictly inside the output directory.
    fn check_nested(nested: &str) -> Result<(), RunnerError> {
        let plain = Path::new(nested)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if nested.is_empty() || !plain {
            return Err(RunnerError::InvalidFlatten(nested.to_string()));
        }
        Ok(())
    }

    fn wanted(&self, name: Option<&str>) -> bool {
        match name {
            Some(name) => {
                self.extensions.is_empty()
                    || self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
            }
            None => false,
        }
    }
}

impl MergeToolRunner for CommandRunner {
    fn name(&self) -> &str {
        &self.tool.name
    }

    fn run(&self, scenario: &MergeScenario) -> Result<PathBuf, RunnerError> {
        if let Some(nested) = &self.tool.flatten_from {
            Self::check_nested(nested)?;
        }
        fs::create_dir_all(&scenario.output).map_err(|source| RunnerError::CreateOutput {
            path: scenario.output.clone(),
            source,
        })?;
        info!("[{}] Running scenario {}", self.tool.name, scenario.name);

        let output = Command::new(&self.tool.program)
            .args(self.args(scenario))
            .output()
            .map_err(|source| RunnerError::Spawn {
                program: self.tool.program.clone(),
                source,
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                warn!("[{}] {}", self.tool.name, stderr.trim());
            }
            return Err(RunnerError::Failed {
                tool: self.tool.name.clone(),
                scenario: scenario.name.clone(),
                status: output.status,
            });
        }

        if let Some(nested) = &self.tool.flatten_from {
            self.flatten(&scenario.output, nested)?;
        }
        Ok(scenario.output.clone())
    }
}

/// Scenario names a batch run produced output for, and those it failed on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Runs every scenario in order. A failing scenario is logged and the batch
/// moves on.
pub fn run_all(runner: &dyn MergeToolRunner, scenarios: &[MergeScenario]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for scenario in scenarios {
        match runner.run(scenario) {
            Ok(dir) => {
                info!("[{}] {} -> {}", runner.name(), scenario.name, dir.display());
                outcome.succeeded.push(scenario.name.clone());
            }
            Err(err) => {
                error!("[{}] {}: {err}", runner.name(), scenario.name);
                outcome.failed.push(scenario.name.clone());
            }
        }
    }
    outcome
}

fn expand(arg: &str, scenario: &MergeScenario) -> String {
    arg.replace("{left}", &scenario.left.to_string_lossy())
        .replace("{base}", &scenario.base.to_string_lossy())
        .replace("{right}", &scenario.right.to_string_lossy())
        .replace("{output}", &scenario.output.to_string_lossy())
        .replace("{scenario}", &scenario.name)
}

#[derive(Default, Clone)]
pub struct RunnerRegistry {
    runners: HashMap<String, Arc<dyn MergeToolRunner>>,
}

impl RunnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(tools: &[ToolConfig]) -> Self {
        tools.iter().fold(Self::new(), |registry, tool| {
            registry.with_runner(&tool.name, Arc::new(CommandRunner::new(tool.clone())))
        })
    }

    pub fn with_runner(mut self, name: &str, runner: Arc<dyn MergeToolRunner>) -> Self {
        self.runners.insert(name.to_string(), runner);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn MergeToolRunner>, RunnerError> {
        self.runners
            .get(name)
            .cloned()
            .ok_or_else(|| RunnerError::UnknownTool(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.runners.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}
