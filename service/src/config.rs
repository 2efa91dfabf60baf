use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;

/// Default parking service base URL used when `PARKING_SERVICE_URL` is not set.
pub const DEFAULT_PARKING_SERVICE_URL: &str = "https://parkora.crn.si/api/v1/parking";
/// Default reservation service base URL used when `RESERVATION_SERVICE_URL` is not set.
pub const DEFAULT_RESERVATION_SERVICE_URL: &str = "https://reservation-service:8000";
/// Default user service base URL used when `USER_SERVICE_URL` is not set.
pub const DEFAULT_USER_SERVICE_URL: &str = "https://parkora.crn.si/api/v1/user";

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
        default_value = "http://localhost:5173,https://parkora.crn.si"
    )]
    pub allowed_origins: Vec<String>,

    /// The public origin of this application (e.g. https://parkora.crn.si).
    /// Used to build the OIDC redirect URI and the post-logout target. When unset
    /// the origin is derived from each request's forwarded headers.
    #[arg(long, env)]
    public_origin: Option<String>,

    /// Base URL of the parking service.
    #[arg(long, env, default_value = DEFAULT_PARKING_SERVICE_URL)]
    parking_service_url: String,

    /// Base URL of the reservation service.
    #[arg(long, env, default_value = DEFAULT_RESERVATION_SERVICE_URL)]
    reservation_service_url: String,

    /// Base URL of the user service.
    #[arg(long, env, default_value = DEFAULT_USER_SERVICE_URL)]
    user_service_url: String,

    /// Timeout in seconds applied to every outbound HTTP request
    #[arg(long, env, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

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

    /// Builds a configuration from an explicit argument list instead of the process
    /// arguments. Environment variables still apply.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Config::parse_from(args)
    }

    pub fn public_origin(&self) -> Option<&str> {
        self.public_origin
            .as_deref()
            .map(|origin| origin.trim_end_matches('/'))
    }

    pub fn set_public_origin(mut self, public_origin: String) -> Self {
        self.public_origin = Some(public_origin);
        self
    }

    pub fn parking_service_url(&self) -> &str {
        &self.parking_service_url
    }

    pub fn set_parking_service_url(mut self, url: String) -> Self {
        self.parking_service_url = url;
        self
    }

    pub fn reservation_service_url(&self) -> &str {
        &self.reservation_service_url
    }

    pub fn set_reservation_service_url(mut self, url: String) -> Self {
        self.reservation_service_url = url;
        self
    }

    pub fn user_service_url(&self) -> &str {
        &self.user_service_url
    }

    pub fn set_user_service_url(mut self, url: String) -> Self {
        self.user_service_url = url;
        self
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }
}
