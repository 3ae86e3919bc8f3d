use auth_policy::{Action, ResourcePolicy, ResourcePolicySpec};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use telemetry::TelemetryConfig;
use tracing::{debug, info};

use crate::error::{ConfigError, Result};

pub const DEFAULT_ENV_PREFIX: &str = "GUARD";

/// Root configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub telemetry: TelemetryConfig,
    pub resources: BTreeMap<String, ResourcePolicySpec>,
}

impl GuardConfig {
    /// Compile every resource, stopping at the first invalid one.
    ///
    /// A compiled policy must resolve every canonical action.
    pub fn compile(&self) -> Result<BTreeMap<String, ResourcePolicy>> {
        self.resources
            .iter()
            .map(|(name, spec)| compile_resource(name, spec).map(|policy| (name.clone(), policy)))
            .collect()
    }

    /// Every invalid resource, for reporting all problems at once
    pub fn validate(&self) -> Vec<ConfigError> {
        self.resources
            .iter()
            .filter_map(|(name, spec)| compile_resource(name, spec).err())
            .collect()
    }
}

fn compile_resource(name: &str, spec: &ResourcePolicySpec) -> Result<ResourcePolicy> {
    let compiled = spec.compile(name).and_then(|policy| {
        policy.validate(Action::CANONICAL.iter())?;
        Ok(policy)
    });
    compiled.map_err(|source| ConfigError::Policy {
        resource: name.to_string(),
        source,
    })
}

#[derive(Debug, Clone)]
enum Source {
    File { path: PathBuf, required: bool },
    Inline { content: String, format: FileFormat },
}

/// Layered configuration loader
#[derive(Debug, Clone)]
pub struct ConfigEngine {
    sources: Vec<Source>,
    env_prefix: Option<String>,
}

impl Default for ConfigEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigEngine {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            env_prefix: Some(DEFAULT_ENV_PREFIX.to_string()),
        }
    }

    /// Required file; format inferred from the extension
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(Source::File {
            path: path.into(),
            required: true,
        });
        self
    }

    pub fn with_optional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(Source::File {
            path: path.into(),
            required: false,
        });
        self
    }

    pub fn with_yaml(mut self, content: impl Into<String>) -> Self {
        self.sources.push(Source::Inline {
            content: content.into(),
            format: FileFormat::Yaml,
        });
        self
    }

    pub fn with_toml(mut self, content: impl Into<String>) -> Self {
        self.sources.push(Source::Inline {
            content: content.into(),
            format: FileFormat::Toml,
        });
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    pub fn load(&self) -> Result<GuardConfig> {
        let mut builder = Config::builder();
        for source in &self.sources {
            builder = match source {
                Source::File { path, required } => {
                    debug!(path = %path.display(), required, "Adding configuration file");
                    builder.add_source(File::from(path.as_path()).required(*required))
                }
                Source::Inline { content, format } => {
                    builder.add_source(File::from_str(content, *format))
                }
            };
        }
        if let Some(ref prefix) = self.env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: GuardConfig = builder.build()?.try_deserialize()?;
        info!(resources = config.resources.len(), "Loaded policy configuration");
        Ok(config)
    }
}
