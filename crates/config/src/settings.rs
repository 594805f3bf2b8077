use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub room: RoomSettings,
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// Caps and timeouts governing room admission and lifecycle.
#[derive(Debug, Deserialize, Clone)]
pub struct RoomSettings {
    pub max_participants_per_room: usize,
    pub max_rooms: usize,
    pub room_timeout_seconds: u64,
    pub idle_connection_timeout_seconds: u64,
}

/// Configuration for the ASR + Translation stage. Mirrors
/// `babblefish_pipeline::PipelineConfig` field for field; kept separate so
/// the pipeline crate has no compile-time dependency on `config`.
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineSettings {
    pub asr_backend: String,
    pub whisper_model_path: Option<String>,
    pub translation_backend: String,
    pub translation_endpoint: Option<String>,
    pub language: Option<String>,
    pub pipeline_permits: usize,
    pub utterance_hard_cap_seconds: f64,
    pub utterance_deadline_ms: Option<u64>,
    pub device: String,
    pub compute_type: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        // Best-effort: a missing .env is normal in production, where config
        // arrives as real environment variables.
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::default().separator("__").prefix("BABBLEFISH"))
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("room.max_participants_per_room", 10)?
            .set_default("room.max_rooms", 100)?
            .set_default("room.room_timeout_seconds", 3600)?
            .set_default("room.idle_connection_timeout_seconds", 60)?
            .set_default("pipeline.asr_backend", "deterministic")?
            .set_default("pipeline.whisper_model_path", "models/ggml-base.en.bin")?
            .set_default("pipeline.translation_backend", "identity")?
            .set_default("pipeline.translation_endpoint", None::<String>)?
            .set_default("pipeline.language", None::<String>)?
            .set_default("pipeline.pipeline_permits", 1)?
            .set_default("pipeline.utterance_hard_cap_seconds", 30.0)?
            .set_default("pipeline.utterance_deadline_ms", 15_000)?
            .set_default("pipeline.device", "cpu")?
            .set_default("pipeline.compute_type", "default")?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("failed to load default settings")
    }
}
