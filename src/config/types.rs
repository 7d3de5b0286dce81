use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use webpforge_common::paths::default_source_extensions;
use webpforge_common::Quality;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl Config {
    /// Directories scanned for originals: the explicit `paths` if any, else `base_dir`.
    pub fn source_roots(&self) -> Vec<PathBuf> {
        if self.source.paths.is_empty() {
            vec![self.source.base_dir.clone()]
        } else {
            self.source.paths.clone()
        }
    }

    /// Lower-cased source extensions, never including `svg` or `webp`.
    pub fn source_extensions(&self) -> Vec<String> {
        let configured: Vec<String> = if self.source.extensions.is_empty() {
            default_source_extensions()
                .iter()
                .map(|e| e.to_string())
                .collect()
        } else {
            self.source.extensions.clone()
        };

        let mut extensions: Vec<String> = Vec::new();
        for ext in configured {
            let ext = ext.trim_start_matches('.').to_lowercase();
            if ext.is_empty() || ext == "svg" || ext == "webp" || extensions.contains(&ext) {
                continue;
            }
            extensions.push(ext);
        }
        extensions
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Root of the upload tree; metadata keys are relative to it
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Directories to scan instead of `base_dir` (must lie inside it for metadata lookups)
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Original extensions to convert (default: jpg, jpeg, png)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_extensions() -> Vec<String> {
    default_source_extensions()
        .iter()
        .map(|e| e.to_string())
        .collect()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            paths: Vec::new(),
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QualityConfig {
    /// Replaces the 82 baseline for every lossy encode
    #[serde(default)]
    pub encoder_default: Option<Quality>,

    /// WebP-specific quality, applied after `encoder_default`
    #[serde(default)]
    pub webp: Option<Quality>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub cwebp_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    /// No metadata: only main artifacts are generated
    #[default]
    None,
    /// SQLite database managed by webpforge
    Sqlite,
    /// JSON object keyed by relative path
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub backend: MetadataBackend,

    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Scheduling niceness applied before a run (default: 19, lowest priority)
    #[serde(default = "default_niceness")]
    pub niceness: i32,

    /// Stop after this many conversions in one run
    #[serde(default)]
    pub max_files: Option<usize>,
}

fn default_niceness() -> i32 {
    19
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            niceness: default_niceness(),
            max_files: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Hourly,
    TwiceDaily,
    #[default]
    Daily,
    Weekly,
}

impl Recurrence {
    pub fn interval(self) -> chrono::Duration {
        match self {
            Self::Hourly => chrono::Duration::hours(1),
            Self::TwiceDaily => chrono::Duration::hours(12),
            Self::Daily => chrono::Duration::days(1),
            Self::Weekly => chrono::Duration::weeks(1),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Local time of day of the first run, "HH:MM" (default: "03:00")
    #[serde(default = "default_schedule_time")]
    pub time: String,

    #[serde(default)]
    pub recurrence: Recurrence,
}

fn default_schedule_time() -> String {
    "03:00".to_string()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time: default_schedule_time(),
            recurrence: Recurrence::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Delete derived artifacts as soon as their original disappears (daemon only)
    #[serde(default)]
    pub enabled: bool,
}
