//! Process configuration (§6.3, §10.3). Read once in `main`, never
//! re-consulted by any component after construction — every engine and
//! handler receives the values it needs through its constructor.

use anyhow::{bail, Context, Result};
use database_layer::PoolSettings;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub listen: SocketAddr,
    pub management_listen: SocketAddr,
    pub database_url: String,
    pub run_migrations: bool,
    pub debug: bool,
    pub jwk_kek_path: String,
    pub jwt_issuer: String,
    pub public_kuura_domain: String,
    pub token_code_secret: Vec<u8>,
    pub log_format: telemetry::LogFormat,
    pub rust_log: String,
    pub pool: PoolSettings,
    pub shutdown_timeout: Duration,
}

impl Settings {
    /// Loads `.env` (if present) then the process environment, validating
    /// every required variable before either listener binds (§7: fatal
    /// startup errors).
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .set_default("LISTEN", "0.0.0.0:4000")?
            .set_default("MANAGEMENT_LISTEN", "0.0.0.0:4001")?
            .set_default("RUN_MIGRATIONS", false)?
            .set_default("DEBUG", false)?
            .set_default("JWK_KEK_PATH", "/var/kuura/.kek")?
            .set_default("RUST_LOG", "info,kuura=debug")?
            .set_default("DB_MAX_CONNECTIONS", 4)?
            .set_default("DB_MIN_CONNECTIONS", 1)?
            .set_default("DB_IDLE_TIMEOUT_SECS", 30 * 60)?
            .set_default("DB_MAX_LIFETIME_SECS", 60 * 60)?
            .set_default("DB_ACQUIRE_TIMEOUT_SECS", 5)?
            .set_default("SHUTDOWN_TIMEOUT_SECS", 10)?
            .add_source(config::Environment::default());
        let raw = builder.build().context("failed to assemble configuration sources")?;

        let listen: String = raw.get("LISTEN")?;
        let management_listen: String = raw.get("MANAGEMENT_LISTEN")?;
        let debug: bool = raw.get("DEBUG")?;

        let database_url: String = raw
            .get("DATABASE_URL")
            .context("DATABASE_URL is required")?;
        let jwt_issuer: String = raw
            .get("JWT_ISSUER")
            .context("JWT_ISSUER is required")?;
        let public_kuura_domain: String = raw
            .get("PUBLIC_KUURA_DOMAIN")
            .context("PUBLIC_KUURA_DOMAIN is required")?;
        let token_code_secret: String = raw
            .get("TOKEN_CODE_SECRET")
            .context("TOKEN_CODE_SECRET is required")?;

        let log_format = match raw.get::<String>("LOG_FORMAT") {
            Ok(value) => telemetry::LogFormat::parse(&value)
                .with_context(|| format!("invalid LOG_FORMAT {value:?}, expected pretty|json"))?,
            Err(_) => telemetry::LogFormat::default_for_debug(debug),
        };

        Ok(Self {
            listen: listen.parse().context("invalid LISTEN address")?,
            management_listen: management_listen.parse().context("invalid MANAGEMENT_LISTEN address")?,
            database_url,
            run_migrations: raw.get("RUN_MIGRATIONS")?,
            debug,
            jwk_kek_path: raw.get("JWK_KEK_PATH")?,
            jwt_issuer,
            public_kuura_domain,
            token_code_secret: token_code_secret.into_bytes(),
            log_format,
            rust_log: raw.get("RUST_LOG")?,
            pool: PoolSettings {
                max_connections: raw.get("DB_MAX_CONNECTIONS")?,
                min_connections: raw.get("DB_MIN_CONNECTIONS")?,
                idle_timeout: Duration::from_secs(raw.get("DB_IDLE_TIMEOUT_SECS")?),
                max_lifetime: Duration::from_secs(raw.get("DB_MAX_LIFETIME_SECS")?),
                acquire_timeout: Duration::from_secs(raw.get("DB_ACQUIRE_TIMEOUT_SECS")?),
            },
            shutdown_timeout: Duration::from_secs(raw.get("SHUTDOWN_TIMEOUT_SECS")?),
        })
    }

    /// Reads the 32-byte key-encryption key from [`Self::jwk_kek_path`].
    /// Fatal (§7) if the file is missing or not exactly 32 bytes.
    pub fn load_kek(&self) -> Result<[u8; 32]> {
        let bytes = std::fs::read(&self.jwk_kek_path)
            .with_context(|| format!("failed to read KEK file at {}", self.jwk_kek_path))?;
        if bytes.len() != 32 {
            bail!("KEK file at {} must contain exactly 32 bytes, found {}", self.jwk_kek_path, bytes.len());
        }
        let mut kek = [0u8; 32];
        kek.copy_from_slice(&bytes);
        Ok(kek)
    }
}
