use std::path::PathBuf;

use crate::store::Digest;

pub const DATA_FILE_PATH_VAR: &str = "DATA_FILE_PATH";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// Location of the persisted secrets mapping. Required.
    pub data_file_path: PathBuf,
    /// Set via SECRETS_PORT env var. Default: 8080.
    pub port: u16,
    /// Digest used to derive ids. Set via SECRETS_DIGEST (md5 | sha256). Default: md5.
    pub digest: Digest,
    /// Request body limit in bytes. Set via SECRETS_MAX_BODY_BYTES. Default: 1 MiB.
    pub max_body_bytes: usize,
}

const DEFAULT_LOG_FILTER: &str = "secretdrop=debug,tower_http=debug";

/// Subscriber settings, read before anything else logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `RUST_LOG` directives.
    pub filter: String,
    /// `LOG_FORMAT=json` switches to JSON lines.
    pub json: bool,
}

/// Loads `.env` first so `RUST_LOG` / `LOG_FORMAT` set there take effect.
pub fn log_settings() -> LogSettings {
    dotenvy::dotenv().ok();
    log_settings_from(|key| std::env::var(key).ok())
}

pub fn log_settings_from(lookup: impl Fn(&str) -> Option<String>) -> LogSettings {
    LogSettings {
        filter: lookup("RUST_LOG")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        json: lookup("LOG_FORMAT").is_some_and(|f| f.trim().eq_ignore_ascii_case("json")),
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a `Config` from an arbitrary variable source.
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
    let data_file_path = match lookup(DATA_FILE_PATH_VAR) {
        Some(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => anyhow::bail!(
            "environment variable {} has not been set; please set it to the secrets file path",
            DATA_FILE_PATH_VAR
        ),
    };

    let digest = match lookup("SECRETS_DIGEST") {
        Some(d) if !d.trim().is_empty() => d.parse::<Digest>()?,
        _ => Digest::default(),
    };
    if digest == Digest::Md5 {
        tracing::debug!("using md5 ids; set SECRETS_DIGEST=sha256 for stronger ids");
    }

    Ok(Config {
        data_file_path,
        port: parse_or(&lookup, "SECRETS_PORT", DEFAULT_PORT),
        digest,
        max_body_bytes: parse_or(&lookup, "SECRETS_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
    })
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}
