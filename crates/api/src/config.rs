use std::path::PathBuf;
use std::time::Duration;

use boardcast_pipeline::{PipelineConfig, RetryPolicy};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In
/// production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory holding the job/result data files.
    pub data_dir: PathBuf,
    /// Directory uploaded photos are written to.
    pub uploads_dir: PathBuf,
    /// Directory synthesized audio is written to and served from.
    pub audio_dir: PathBuf,
    /// Gemini API key for vision analysis.
    pub gemini_api_key: String,
    /// Cloud Text-to-Speech API key.
    pub tts_api_key: String,
    /// Primary vision model variant.
    pub vision_model: String,
    /// Conservative fallback model variant for the final retry attempt.
    pub vision_fallback_model: Option<String>,
    /// Linear backoff base between vision attempts, in seconds.
    pub vision_retry_base_secs: u64,
    /// Voice used when an upload carries no selector.
    pub default_voice: String,
    /// When set, job-change notifications go to this URL instead of the
    /// in-process bus (split worker/gateway deployments).
    pub notify_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                   |
    /// |--------------------------|---------------------------|
    /// | `HOST`                   | `0.0.0.0`                 |
    /// | `PORT`                   | `3000`                    |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`   |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                      |
    /// | `DATA_DIR`               | `data`                    |
    /// | `UPLOADS_DIR`            | `public/uploads`          |
    /// | `AUDIO_OUTPUT_DIR`       | `public/audio`            |
    /// | `GEMINI_API_KEY`         | *(empty)*                 |
    /// | `GOOGLE_TTS_API_KEY`     | *(empty)*                 |
    /// | `VISION_MODEL`           | `gemini-3-flash-preview`  |
    /// | `VISION_FALLBACK_MODEL`  | `gemini-1.5-flash`        |
    /// | `VISION_RETRY_BASE_SECS` | `2`                       |
    /// | `TTS_VOICE`              | `ja-JP-Neural2-B`         |
    /// | `NOTIFY_URL`             | *(unset)*                 |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".into()));
        let uploads_dir =
            PathBuf::from(std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "public/uploads".into()));
        let audio_dir = PathBuf::from(
            std::env::var("AUDIO_OUTPUT_DIR").unwrap_or_else(|_| "public/audio".into()),
        );

        let gemini_api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        if gemini_api_key.is_empty() {
            tracing::warn!("GEMINI_API_KEY is not set; vision calls will be rejected upstream");
        }
        let tts_api_key = std::env::var("GOOGLE_TTS_API_KEY").unwrap_or_default();

        let vision_model = std::env::var("VISION_MODEL")
            .unwrap_or_else(|_| "gemini-3-flash-preview".into());
        let vision_fallback_model = match std::env::var("VISION_FALLBACK_MODEL") {
            Ok(v) if v.is_empty() => None,
            Ok(v) => Some(v),
            Err(_) => Some("gemini-1.5-flash".into()),
        };

        let vision_retry_base_secs: u64 = std::env::var("VISION_RETRY_BASE_SECS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("VISION_RETRY_BASE_SECS must be a valid u64");

        let default_voice =
            std::env::var("TTS_VOICE").unwrap_or_else(|_| "ja-JP-Neural2-B".into());

        let notify_url = std::env::var("NOTIFY_URL").ok().filter(|s| !s.is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            data_dir,
            uploads_dir,
            audio_dir,
            gemini_api_key,
            tts_api_key,
            vision_model,
            vision_fallback_model,
            vision_retry_base_secs,
            default_voice,
            notify_url,
        }
    }

    /// Pipeline configuration derived from the server configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            audio_dir: self.audio_dir.clone(),
            default_voice: self.default_voice.clone(),
            retry: RetryPolicy {
                attempts: 3,
                base_delay: Duration::from_secs(self.vision_retry_base_secs),
                primary_model: self.vision_model.clone(),
                fallback_model: self.vision_fallback_model.clone(),
            },
        }
    }
}
