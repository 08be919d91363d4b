use std::{env, io::Write};

use chrono::Duration;
use log::*;
use mp_common::Secret;
use payrail_tools::PayrailConfig as PayrailApiConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_MP_HOST: &str = "127.0.0.1";
const DEFAULT_MP_PORT: u16 = 8450;
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::seconds(10);
/// The default platform fee, in basis points (250 = 2.5%).
const DEFAULT_PLATFORM_FEE_BPS: i64 = 250;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How long the server waits for in-flight requests to complete on shutdown.
    pub shutdown_grace: Duration,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The platform fee withheld from every captured payment, in basis points.
    pub fee_bps: i64,
    /// Payrail gateway configuration
    pub payrail: PayrailConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MP_HOST.to_string(),
            port: DEFAULT_MP_PORT,
            database_url: String::default(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            fee_bps: DEFAULT_PLATFORM_FEE_BPS,
            payrail: PayrailConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MP_HOST").ok().unwrap_or_else(|| DEFAULT_MP_HOST.into());
        let port = env::var("MP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MP_PORT. {e} Using the default, {DEFAULT_MP_PORT}, instead."
                    );
                    DEFAULT_MP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MP_PORT);
        let database_url = env::var("MP_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MP_DATABASE_URL is not set. Please set it to the URL for the Matchpay database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to \
                 the default configuration."
            );
            AuthConfig::default()
        });
        let payrail = PayrailConfig::from_env_or_defaults();
        let use_x_forwarded_for =
            env::var("MP_USE_X_FORWARDED_FOR").map(|s| &s == "1" || &s == "true").unwrap_or(false);
        let use_forwarded = env::var("MP_USE_FORWARDED").map(|s| &s == "1" || &s == "true").unwrap_or(false);
        let fee_bps = parse_fee_bps(env::var("MP_PLATFORM_FEE_BPS").ok());
        let shutdown_grace = configure_shutdown_grace();
        Self { host, port, database_url, shutdown_grace, auth, use_x_forwarded_for, use_forwarded, fee_bps, payrail }
    }
}

/// Parses the platform fee, falling back to the default on anything that is not a whole number of basis points
/// between 0 and 10000.
fn parse_fee_bps(value: Option<String>) -> i64 {
    let Some(s) = value else {
        info!("🪛️ MP_PLATFORM_FEE_BPS is not set. Using the default of {DEFAULT_PLATFORM_FEE_BPS} bps.");
        return DEFAULT_PLATFORM_FEE_BPS;
    };
    match s.parse::<i64>() {
        Ok(bps) if (0..=10_000).contains(&bps) => bps,
        Ok(bps) => {
            warn!(
                "🪛️ MP_PLATFORM_FEE_BPS must be between 0 and 10000, but was {bps}. Using the default of \
                 {DEFAULT_PLATFORM_FEE_BPS} bps instead."
            );
            DEFAULT_PLATFORM_FEE_BPS
        },
        Err(e) => {
            warn!(
                "🪛️ {s} is not a valid value for MP_PLATFORM_FEE_BPS. {e} Using the default of \
                 {DEFAULT_PLATFORM_FEE_BPS} bps instead."
            );
            DEFAULT_PLATFORM_FEE_BPS
        },
    }
}

fn configure_shutdown_grace() -> Duration {
    env::var("MP_SHUTDOWN_GRACE")
        .map_err(|_| {
            info!(
                "🪛️ MP_SHUTDOWN_GRACE is not set. Using the default value of {}s.",
                DEFAULT_SHUTDOWN_GRACE.num_seconds()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::seconds)
                .map_err(|e| warn!("🪛️ Invalid configuration value for MP_SHUTDOWN_GRACE. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_SHUTDOWN_GRACE)
}

//-------------------------------------------------  PayrailConfig  ----------------------------------------------------
/// Server-side view of the Payrail gateway configuration: the REST client settings plus the webhook verification
/// secret, which the API client itself never needs.
#[derive(Clone, Debug, Default)]
pub struct PayrailConfig {
    /// Base URL of the Payrail REST API, e.g. "https://api.payrail.example"
    pub base_url: String,
    pub key_id: String,
    pub key_secret: Secret<String>,
    /// Secret used to verify the signature on webhook deliveries.
    pub webhook_secret: Secret<String>,
    // If false, then webhook HMAC signatures are not checked and every delivery is accepted
    pub hmac_checks: bool,
}

impl PayrailConfig {
    pub fn from_env_or_defaults() -> Self {
        let api_config = PayrailApiConfig::new_from_env_or_default();
        let webhook_secret = env::var("MP_PAYRAIL_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ MP_PAYRAIL_WEBHOOK_SECRET is not set. Please set it to the webhook signing secret configured on \
                 the Payrail dashboard."
            );
            String::default()
        });
        let webhook_secret = Secret::new(webhook_secret);
        let hmac_checks = env::var("MP_PAYRAIL_HMAC_CHECKS").map(|s| &s != "0" && &s != "false").unwrap_or(true);
        if !hmac_checks {
            warn!(
                "🚨️ Webhook HMAC checks are disabled. Anyone who can reach this server can forge payment captures. \
                 Do not run production like this."
            );
        }
        Self {
            base_url: api_config.base_url,
            key_id: api_config.key_id,
            key_secret: api_config.key_secret,
            webhook_secret,
            hmac_checks,
        }
    }

    pub fn payrail_api_config(&self) -> PayrailApiConfig {
        PayrailApiConfig {
            base_url: self.base_url.clone(),
            key_id: self.key_id.clone(),
            key_secret: self.key_secret.clone(),
        }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The symmetric secret used to sign and verify access tokens. It must be shared with the auth collaborator
    /// that issues tokens on login.
    pub jwt_signing_key: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT signing key has not been set. I'm using a random value for this session. DO NOT operate \
             on production like this since every issued token dies with this process. 🚨️🚨️🚨️"
        );
        let key: String = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_signing_key": key }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT signing key for this session was written to {}. If this is a production \
                         instance, you are doing it wrong! Set the MP_JWT_SIGNING_KEY environment variable instead. \
                         🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT signing key to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT signing key. ");
            },
        }
        Self { jwt_signing_key: Secret::new(key) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let key = env::var("MP_JWT_SIGNING_KEY")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [MP_JWT_SIGNING_KEY]")))?;
        if key.len() < 32 {
            warn!("🪛️ MP_JWT_SIGNING_KEY is shorter than 32 bytes. Tokens are only as strong as this secret.");
        }
        Ok(Self { jwt_signing_key: Secret::new(key) })
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep
/// this as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
