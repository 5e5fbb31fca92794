//! Pipeline configuration: paths, run id, artifacts and the ordered stage list.
//!
//! Passed explicitly at construction; nothing here is process-wide state.
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "steeltrace.yaml";

pub const DEFAULT_RUN_ID: &str = "2025Q1-ACME-0001";

/// Artifacts sealed by the evidence stage, in leaf order
pub const DEFAULT_ARTIFACTS: &[&str] = &[
    "raga/kpis.json",
    "raga/explain.json",
    "ontology/validation.log",
    "ontology/linaje.ttl",
    "ops/gate_report.json",
    "eee/eee_report.json",
    "xbrl/informe.xbrl",
    "xbrl/validation.log",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base directory every relative path resolves against
    pub root_dir: PathBuf,
    pub history_path: PathBuf,
    pub slo_report_path: PathBuf,
    pub evidence_dir: PathBuf,
    pub run_id: String,
    pub artifacts: Vec<String>,
    pub stages: Vec<StageSpec>,
}

/// Static description of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,

    /// Human label shown next to failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Governance role shown next to failures (e.g. "Notary (Crypto)")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_artifact: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_sec: Option<f64>,

    pub target: StageTarget,
}

/// How a stage is invoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageTarget {
    /// External process; exit code 0 means ok
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// In-process evidence sealing over `PipelineConfig::artifacts`
    Evidence,
}

impl StageSpec {
    pub fn command(name: &str, program: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            role: None,
            output_artifact: None,
            timeout_sec: None,
            target: StageTarget::Command {
                program: program.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
            },
        }
    }

    pub fn evidence(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            role: None,
            output_artifact: None,
            timeout_sec: None,
            target: StageTarget::Evidence,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn with_output(mut self, artifact: &str) -> Self {
        self.output_artifact = Some(PathBuf::from(artifact));
        self
    }

    pub fn with_timeout_sec(mut self, secs: f64) -> Self {
        self.timeout_sec = Some(secs);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_sec.and_then(|s| Duration::try_from_secs_f64(s).ok())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            history_path: PathBuf::from("ops/slo_history.jsonl"),
            slo_report_path: PathBuf::from("ops/slo_report.json"),
            evidence_dir: PathBuf::from("evidence"),
            run_id: DEFAULT_RUN_ID.to_string(),
            artifacts: DEFAULT_ARTIFACTS.iter().map(|a| a.to_string()).collect(),
            stages: default_stages(),
        }
    }
}

/// The six compliance-report stages, in execution order.
pub fn default_stages() -> Vec<StageSpec> {
    vec![
        StageSpec::command("MCP.ingest", "python3", &["scripts/mcp_ingest.py"])
            .with_label("1. Recolección y Limpieza")
            .with_role("Data Steward (Automated)")
            .with_output("data/dq_report.json"),
        StageSpec::command("SHACL.validate", "python3", &["scripts/shacl_validate.py"])
            .with_label("2. Verificación de Reglas (SHACL)")
            .with_role("Ontology Guardian (Automated)")
            .with_output("ontology/validation.log"),
        StageSpec::command("RAGA.compute", "python3", &["scripts/raga_compute.py"])
            .with_label("3. Análisis Inteligente (RAGA)")
            .with_role("AI Analyst (RAGA)")
            .with_output("raga/explain.json"),
        StageSpec::command("EEE.gate", "python3", &["scripts/eee_gate.py"])
            .with_label("4. Control de Calidad AI (Gate)")
            .with_role("Compliance Officer (Automated Gate)")
            .with_output("ops/gate_report.json"),
        StageSpec::command("XBRL.generate", "python3", &["scripts/xbrl_generate.py"])
            .with_label("5. Creación del Reporte Oficial")
            .with_role("Reporting Agent")
            .with_output("xbrl/informe.xbrl"),
        StageSpec::evidence("EVIDENCE.build")
            .with_label("6. Sellado de Seguridad")
            .with_role("Notary (Crypto)")
            .with_output("evidence/evidence_manifest.json"),
    ]
}

impl PipelineConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// `STEELTRACE_CONFIG`, else `steeltrace.yaml` if present, else defaults;
    /// then `STEELTRACE_RUN_ID` overrides the run id.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = match std::env::var_os("STEELTRACE_CONFIG") {
            Some(path) => Self::load(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        let config = config.with_run_id_override(std::env::var("STEELTRACE_RUN_ID").ok());
        config.validate()?;
        Ok(config)
    }

    /// Replace the run id unless the override is missing or blank
    pub fn with_run_id_override(mut self, run_id: Option<String>) -> Self {
        if let Some(id) = run_id.filter(|id| !id.trim().is_empty()) {
            self.run_id = id;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run_id.trim().is_empty() {
            return Err(ConfigError::Invalid("run_id must not be empty".into()));
        }
        if self.run_id.contains(|c: char| c == '/' || c == '\\') {
            return Err(ConfigError::Invalid(format!(
                "run_id '{}' must not contain path separators",
                self.run_id
            )));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if stage.name.trim().is_empty() {
                return Err(ConfigError::Invalid("stage name must not be empty".into()));
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate stage name '{}'",
                    stage.name
                )));
            }
            if let Some(secs) = stage.timeout_sec {
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "stage '{}' timeout_sec must be a positive number",
                        stage.name
                    )));
                }
            }
            if let StageTarget::Command { program, .. } = &stage.target {
                if program.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "stage '{}' has an empty program",
                        stage.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve a configured path against `root_dir`
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }

    pub fn history_file(&self) -> PathBuf {
        self.resolve(&self.history_path)
    }

    pub fn slo_report_file(&self) -> PathBuf {
        self.resolve(&self.slo_report_path)
    }

    pub fn evidence_root(&self) -> PathBuf {
        self.resolve(&self.evidence_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.stages.len(), 6);
        assert_eq!(config.artifacts.len(), 8);
        assert_eq!(config.stages.last().unwrap().target, StageTarget::Evidence);
    }

    #[test]
    fn test_yaml_overrides_and_defaults() {
        let yaml = r#"
root_dir: /srv/steeltrace
run_id: 2025Q2-ACME-0007
artifacts: ["raga/kpis.json"]
stages:
  - name: ingest
    timeout_sec: 30
    target: { kind: command, program: python3, args: [scripts/mcp_ingest.py] }
  - name: seal
    target: { kind: evidence }
"#;
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.run_id, "2025Q2-ACME-0007");
        assert_eq!(config.stages.len(), 2);
        assert_eq!(config.stages[0].timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.history_path, PathBuf::from("ops/slo_history.jsonl"));
        assert_eq!(
            config.history_file(),
            PathBuf::from("/srv/steeltrace/ops/slo_history.jsonl")
        );
    }

    #[test]
    fn test_duplicate_stage_names_rejected() {
        let yaml = r#"
stages:
  - name: a
    target: { kind: evidence }
  - name: a
    target: { kind: evidence }
"#;
        let err = PipelineConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let mut config = PipelineConfig::default();
        config.stages[0].timeout_sec = Some(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_run_id_override() {
        let config = PipelineConfig::default().with_run_id_override(Some("2026Q3-X".into()));
        assert_eq!(config.run_id, "2026Q3-X");
        let config = config.with_run_id_override(Some("  ".into()));
        assert_eq!(config.run_id, "2026Q3-X");
        let config = config.with_run_id_override(None);
        assert_eq!(config.run_id, "2026Q3-X");
    }

    #[test]
    fn test_run_id_with_separator_rejected() {
        let config = PipelineConfig::default().with_run_id_override(Some("../escape".into()));
        assert!(config.validate().is_err());
    }
}
