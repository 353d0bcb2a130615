use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub providers: ProviderSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub aggregation: AggregationSettings,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Endpoints and credentials for every external collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub places: PlacesSettings,
    #[serde(default)]
    pub geocoding: GeocodingSettings,
    #[serde(default)]
    pub encyclopedia: EncyclopediaSettings,
    #[serde(default)]
    pub knowledge_graph: KnowledgeGraphSettings,
    #[serde(default)]
    pub generative: GenerativeSettings,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            places: PlacesSettings::default(),
            geocoding: GeocodingSettings::default(),
            encyclopedia: EncyclopediaSettings::default(),
            knowledge_graph: KnowledgeGraphSettings::default(),
            generative: GenerativeSettings::default(),
        }
    }
}

fn default_user_agent() -> String {
    format!("landmark-narrator/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacesSettings {
    #[serde(default = "default_places_url")]
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for PlacesSettings {
    fn default() -> Self {
        Self {
            base_url: default_places_url(),
            api_key: None,
        }
    }
}

fn default_places_url() -> String { "https://api.foursquare.com/v3".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingSettings {
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
        }
    }
}

fn default_geocoding_url() -> String { "https://nominatim.openstreetmap.org".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct EncyclopediaSettings {
    #[serde(default = "default_encyclopedia_api_url")]
    pub api_url: String,
    #[serde(default = "default_encyclopedia_rest_url")]
    pub rest_url: String,
}

impl Default for EncyclopediaSettings {
    fn default() -> Self {
        Self {
            api_url: default_encyclopedia_api_url(),
            rest_url: default_encyclopedia_rest_url(),
        }
    }
}

fn default_encyclopedia_api_url() -> String { "https://en.wikipedia.org/w/api.php".to_string() }
fn default_encyclopedia_rest_url() -> String { "https://en.wikipedia.org/api/rest_v1".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeGraphSettings {
    #[serde(default = "default_knowledge_graph_url")]
    pub api_url: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for KnowledgeGraphSettings {
    fn default() -> Self {
        Self {
            api_url: default_knowledge_graph_url(),
            language: default_language(),
        }
    }
}

fn default_knowledge_graph_url() -> String { "https://www.wikidata.org/w/api.php".to_string() }
fn default_language() -> String { "en".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct GenerativeSettings {
    #[serde(default = "default_generative_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for GenerativeSettings {
    fn default() -> Self {
        Self {
            base_url: default_generative_url(),
            api_key: None,
            model: default_model(),
        }
    }
}

fn default_generative_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_model() -> String { "gpt-4o-mini".to_string() }

/// Discovery and selection knobs
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_search_radius")]
    pub search_radius_m: u32,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    #[serde(default = "default_threshold")]
    pub significance_threshold: u8,
    #[serde(default = "default_true")]
    pub area_fallback_enabled: bool,
    #[serde(default = "default_true")]
    pub scoring_enabled: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            search_radius_m: default_search_radius(),
            search_limit: default_search_limit(),
            significance_threshold: default_threshold(),
            area_fallback_enabled: true,
            scoring_enabled: true,
        }
    }
}

fn default_search_radius() -> u32 { 1000 }
fn default_search_limit() -> u32 { 10 }
fn default_threshold() -> u8 { 30 }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationSettings {
    #[serde(default = "default_encyclopedia_results")]
    pub encyclopedia_results: u32,
    #[serde(default = "default_knowledge_graph_results")]
    pub knowledge_graph_results: u32,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            encyclopedia_results: default_encyclopedia_results(),
            knowledge_graph_results: default_knowledge_graph_results(),
        }
    }
}

fn default_encyclopedia_results() -> u32 { 3 }
fn default_knowledge_graph_results() -> u32 { 1 }

/// Per-call deadlines in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_search_ms")]
    pub search_ms: u64,
    #[serde(default = "default_signal_ms")]
    pub signal_ms: u64,
    #[serde(default = "default_aggregation_ms")]
    pub aggregation_ms: u64,
    #[serde(default = "default_generation_ms")]
    pub generation_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            search_ms: default_search_ms(),
            signal_ms: default_signal_ms(),
            aggregation_ms: default_aggregation_ms(),
            generation_ms: default_generation_ms(),
        }
    }
}

fn default_search_ms() -> u64 { 8000 }
fn default_signal_ms() -> u64 { 3000 }
fn default_aggregation_ms() -> u64 { 4000 }
fn default_generation_ms() -> u64 { 15000 }

impl TimeoutSettings {
    pub fn search(&self) -> Duration {
        Duration::from_millis(self.search_ms)
    }

    pub fn signal(&self) -> Duration {
        Duration::from_millis(self.signal_ms)
    }

    pub fn aggregation(&self) -> Duration {
        Duration::from_millis(self.aggregation_ms)
    }

    pub fn generation(&self) -> Duration {
        Duration::from_millis(self.generation_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml, then config/local.toml)
    /// 3. Environment variables (prefixed with NARRATOR__)
    /// 4. Well-known credential variables (FOURSQUARE_API_KEY, OPENAI_API_KEY)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., NARRATOR__PIPELINE__SIGNIFICANCE_THRESHOLD -> pipeline.significance_threshold
            .add_source(environment())
            .build()?;

        apply_credential_overrides(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        apply_credential_overrides(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("NARRATOR")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Pick up provider credentials from their conventional variable names
fn apply_credential_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let places_key = env::var("FOURSQUARE_API_KEY").ok().filter(|k| !k.trim().is_empty());
    let generative_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());

    let mut builder = Config::builder().add_source(settings);

    if let Some(key) = places_key {
        builder = builder.set_override("providers.places.api_key", key)?;
    }
    if let Some(key) = generative_key {
        builder = builder.set_override("providers.generative.api_key", key)?;
    }

    builder.build()
}
