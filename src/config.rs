use serde::Deserialize;

const PLACEHOLDER_ACCESS_KEY: &str = "CHANGE_ME_ACCESS_TOKEN_KEY";
const PLACEHOLDER_REFRESH_KEY: &str = "CHANGE_ME_REFRESH_TOKEN_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// When unset the service falls back to an in-process cache.
    pub redis_url: Option<String>,
    pub access_token_key: String,
    pub refresh_token_key: String,
    /// Lifetime of access tokens in seconds.
    /// Set via ACCESS_TOKEN_AGE env var. Default: 1800.
    pub access_token_age: i64,
    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|name| std::env::var(name).ok())
}

/// Build a config from an arbitrary variable source.
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let production = lookup("OPENMUSIC_ENV")
        .or_else(|| lookup("RUST_ENV"))
        .map(|v| v == "production")
        .unwrap_or(false);

    let access_token_key =
        lookup("ACCESS_TOKEN_KEY").unwrap_or_else(|| PLACEHOLDER_ACCESS_KEY.into());
    let refresh_token_key =
        lookup("REFRESH_TOKEN_KEY").unwrap_or_else(|| PLACEHOLDER_REFRESH_KEY.into());

    for (name, value, placeholder) in [
        ("ACCESS_TOKEN_KEY", &access_token_key, PLACEHOLDER_ACCESS_KEY),
        ("REFRESH_TOKEN_KEY", &refresh_token_key, PLACEHOLDER_REFRESH_KEY),
    ] {
        if value == placeholder {
            if production {
                anyhow::bail!(
                    "{} is still the insecure placeholder. \
                     Set a proper secret before running in production.",
                    name
                );
            }
            eprintln!("⚠️  {} is not set, using insecure placeholder.", name);
        }
    }

    if access_token_key == refresh_token_key {
        anyhow::bail!("ACCESS_TOKEN_KEY and REFRESH_TOKEN_KEY must be different secrets");
    }

    Ok(Config {
        port: lookup("OPENMUSIC_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000),
        database_url: lookup("DATABASE_URL")
            .unwrap_or_else(|| "postgres://localhost/openmusic".into()),
        redis_url: lookup("REDIS_URL").filter(|v| !v.trim().is_empty()),
        access_token_key,
        refresh_token_key,
        access_token_age: lookup("ACCESS_TOKEN_AGE")
            .and_then(|v| v.parse().ok())
            .filter(|age: &i64| *age > 0)
            .unwrap_or(1800),
        log_json: lookup("OPENMUSIC_LOG_JSON")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    })
}
