use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::{ConfigError, Destination};

/// Which monitoring provider a metric reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Windowed response-time history (UptimeRobot)
    UptimeRobot,
    /// Per-region ping results
    Regional,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::UptimeRobot => "uptimerobot",
            ProviderKind::Regional => "regional",
        }
    }

    /// Reduction used when a metric does not pick one.
    pub fn default_aggregation(&self) -> Aggregation {
        match self {
            ProviderKind::UptimeRobot => Aggregation::PassThrough,
            ProviderKind::Regional => Aggregation::FilteredMean,
        }
    }
}

/// How samples in a minute bucket are reduced to one point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Every sample is already one point
    PassThrough,
    /// Drop down samples, average the rest
    FilteredMean,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDocument {
    metrics: Vec<RawMetric>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawMetric {
    name: Option<String>,
    uptimerobot: Option<UptimeRobotBlock>,
    regional: Option<RegionalBlock>,
    statuspage: Option<StatuspageBlock>,
    aggregation: Option<Aggregation>,
}

#[derive(Debug, Clone, Deserialize)]
struct UptimeRobotBlock {
    #[serde(deserialize_with = "string_or_number")]
    monitor: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RegionalBlock {
    #[serde(deserialize_with = "string_or_number")]
    monitor: String,
    #[serde(default)]
    regions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatuspageBlock {
    page: String,
    metric: String,
}

/// Monitor ids are often written as bare numbers in the document.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

/// One monitor bound to one status page metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    pub name: String,
    pub provider: ProviderKind,
    pub monitor: String,
    /// Regions queried independently (regional provider only)
    pub regions: Vec<String>,
    pub destination: Destination,
    pub aggregation: Aggregation,
}

/// The loaded metric document
///
/// Keeps the document as it was read next to the validated definitions, so it
/// can be echoed back by the HTTP surface unchanged.
#[derive(Debug, Clone)]
pub struct Config {
    document: Value,
    metrics: Vec<MetricDefinition>,
}

impl Config {
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn metrics(&self) -> &[MetricDefinition] {
        &self.metrics
    }

    pub fn uses(&self, provider: ProviderKind) -> bool {
        self.metrics.iter().any(|m| m.provider == provider)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let document: Value =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_document(document)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let document =
            serde_json::to_value(table).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_document(document)
    }

    pub fn from_document(document: Value) -> Result<Self, ConfigError> {
        let raw: RawDocument = serde_json::from_value(document.clone())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        let metrics = raw
            .metrics
            .into_iter()
            .enumerate()
            .map(|(index, metric)| resolve_metric(index, metric))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { document, metrics })
    }
}

fn resolve_metric(index: usize, raw: RawMetric) -> Result<MetricDefinition, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidMetric {
        index,
        reason: reason.to_string(),
    };

    let (provider, monitor, regions) = match (raw.uptimerobot, raw.regional) {
        (Some(block), None) => (ProviderKind::UptimeRobot, block.monitor, Vec::new()),
        (None, Some(block)) => (ProviderKind::Regional, block.monitor, block.regions),
        (None, None) => return Err(invalid("missing provider block (uptimerobot or regional)")),
        (Some(_), Some(_)) => return Err(invalid("only one provider block is allowed")),
    };

    if monitor.trim().is_empty() {
        return Err(invalid("monitor id is empty"));
    }
    if regions.iter().any(|r| r.trim().is_empty()) {
        return Err(invalid("region codes must not be empty"));
    }

    let statuspage = raw
        .statuspage
        .ok_or_else(|| invalid("missing statuspage block"))?;
    if statuspage.page.trim().is_empty() || statuspage.metric.trim().is_empty() {
        return Err(invalid("statuspage page and metric must not be empty"));
    }

    let aggregation = raw
        .aggregation
        .unwrap_or_else(|| provider.default_aggregation());

    Ok(MetricDefinition {
        name: raw
            .name
            .unwrap_or_else(|| format!("{}:{monitor}", provider.name())),
        provider,
        monitor,
        regions,
        destination: Destination {
            page: statuspage.page,
            metric: statuspage.metric,
        },
        aggregation,
    })
}

/// Read the metric document, choosing the format by file extension.
pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        Config::from_toml_str(&content)
    } else {
        Config::from_json_str(&content)
    }
    .inspect(|config| trace!("loaded config: {config:?}"))
}
