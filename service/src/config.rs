use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default Google OAuth token endpoint used when `GOOGLE_TOKEN_URL` is not set.
pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Default Google Docs API base URL.
pub const DEFAULT_GOOGLE_DOCS_BASE_URL: &str = "https://docs.googleapis.com/v1";
/// Default Google Slides API base URL.
pub const DEFAULT_GOOGLE_SLIDES_BASE_URL: &str = "https://slides.googleapis.com/v1";
/// Default Google Drive API base URL.
pub const DEFAULT_GOOGLE_DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
/// Default OpenAI-compatible text generation base URL.
pub const DEFAULT_TEXT_GENERATION_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Number of worker tasks draining the job queue
    #[arg(long, env, default_value_t = 4)]
    pub worker_count: usize,

    /// Maximum number of accepted jobs waiting for a worker
    #[arg(long, env, default_value_t = 64)]
    pub job_queue_capacity: usize,

    /// Seconds after which a job's progress record is evicted
    #[arg(long, env, default_value_t = 3600)]
    pub job_ttl_secs: u64,

    /// Seconds between progress eviction sweeps
    #[arg(long, env, default_value_t = 300)]
    pub sweep_interval_secs: u64,

    /// The Google OAuth client ID used to refresh the document credential.
    #[arg(long, env)]
    google_client_id: Option<String>,

    /// The Google OAuth client secret used to refresh the document credential.
    #[arg(long, env)]
    google_client_secret: Option<String>,

    /// The Google OAuth token endpoint.
    #[arg(long, env, default_value = DEFAULT_GOOGLE_TOKEN_URL)]
    google_token_url: String,

    /// Key of the stored Google credential used for document and slide calls.
    #[arg(long, env, default_value = "default")]
    google_account: String,

    /// The base URL of the Google Docs API.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_GOOGLE_DOCS_BASE_URL)]
    google_docs_base_url: String,

    /// The base URL of the Google Slides API.
    #[arg(long, env, default_value = DEFAULT_GOOGLE_SLIDES_BASE_URL)]
    google_slides_base_url: String,

    /// The base URL of the Google Drive API (template deck copies).
    #[arg(long, env, default_value = DEFAULT_GOOGLE_DRIVE_BASE_URL)]
    google_drive_base_url: String,

    /// Path of the JSON file holding persisted OAuth credentials.
    #[arg(long, env, default_value = "data/credentials.json")]
    credential_path: String,

    /// Hex-encoded 32 byte key used to encrypt credentials at rest.
    #[arg(long, env)]
    credential_encryption_key: Option<String>,

    /// The base URL of the transcript retrieval service.
    #[arg(long, env)]
    transcript_base_url: Option<String>,

    /// The API key to use when calling the transcript retrieval service.
    #[arg(long, env)]
    transcript_api_key: Option<String>,

    /// The base URL of the OpenAI-compatible text generation API.
    #[arg(long, env, default_value = DEFAULT_TEXT_GENERATION_BASE_URL)]
    text_generation_base_url: String,

    /// The API key to use when calling the text generation API.
    #[arg(long, env)]
    text_generation_api_key: Option<String>,

    /// The model name sent with every text generation request.
    #[arg(long, env, default_value = "gpt-4o")]
    text_generation_model: String,

    /// The Google Slides template deck copied for each presentation.
    #[arg(long, env)]
    slides_template_id: Option<String>,

    /// Object ID of the title slide inside the template deck.
    #[arg(long, env)]
    slides_title_layout_id: Option<String>,

    /// Object ID of the content slide inside the template deck.
    #[arg(long, env)]
    slides_content_layout_id: Option<String>,

    /// Directory holding persisted job results, one JSON file per pipeline kind.
    #[arg(long, env, default_value = "data/artifacts")]
    artifact_store_path: String,

    /// Maximum number of mutations sent in one document batch update.
    #[arg(long, env, default_value_t = 100)]
    pub document_batch_size: usize,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or("127.0.0.1")
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn google_client_id(&self) -> Option<String> {
        self.google_client_id.clone()
    }

    pub fn google_client_secret(&self) -> Option<String> {
        self.google_client_secret.clone()
    }

    pub fn google_token_url(&self) -> &str {
        &self.google_token_url
    }

    pub fn google_account(&self) -> &str {
        &self.google_account
    }

    pub fn google_docs_base_url(&self) -> &str {
        &self.google_docs_base_url
    }

    pub fn google_slides_base_url(&self) -> &str {
        &self.google_slides_base_url
    }

    pub fn google_drive_base_url(&self) -> &str {
        &self.google_drive_base_url
    }

    pub fn credential_path(&self) -> &str {
        &self.credential_path
    }

    pub fn credential_encryption_key(&self) -> Option<String> {
        self.credential_encryption_key.clone()
    }

    pub fn transcript_base_url(&self) -> Option<String> {
        self.transcript_base_url.clone()
    }

    pub fn transcript_api_key(&self) -> Option<String> {
        self.transcript_api_key.clone()
    }

    pub fn text_generation_base_url(&self) -> &str {
        &self.text_generation_base_url
    }

    pub fn text_generation_api_key(&self) -> Option<String> {
        self.text_generation_api_key.clone()
    }

    pub fn text_generation_model(&self) -> &str {
        &self.text_generation_model
    }

    /// Template deck and layout slide IDs, present only when all three are configured.
    pub fn slides_template(&self) -> Option<(String, String, String)> {
        match (
            &self.slides_template_id,
            &self.slides_title_layout_id,
            &self.slides_content_layout_id,
        ) {
            (Some(deck), Some(title), Some(content)) => {
                Some((deck.clone(), title.clone(), content.clone()))
            }
            _ => None,
        }
    }

    pub fn artifact_store_path(&self) -> &str {
        &self.artifact_store_path
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}
