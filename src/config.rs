use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;

use crate::registration::services::DEFAULT_PROFILES_TABLE;

#[derive(Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: SecretString,
    /// Client-side request timeout; `None` waits as long as the service does.
    pub timeout: Option<Duration>,
}

#[derive(Debug)]
pub struct AppConfig {
    pub supabase: SupabaseConfig,
    pub profiles_table: String,
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = get("SUPABASE_URL").context("SUPABASE_URL is not set")?;
        let anon_key = get("SUPABASE_ANON_KEY").context("SUPABASE_ANON_KEY is not set")?;
        let timeout = match get("SUPABASE_TIMEOUT_SECS") {
            Some(v) => Some(Duration::from_secs(
                v.parse::<u64>()
                    .with_context(|| format!("SUPABASE_TIMEOUT_SECS is not a number: {v}"))?,
            )),
            None => None,
        };
        let supabase = SupabaseConfig {
            url,
            anon_key: SecretString::from(anon_key),
            timeout,
        };
        let host = get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = get("APP_PORT").unwrap_or_else(|| "8080".into());
        let listen_addr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("invalid listen address {host}:{port}"))?;
        Ok(Self {
            supabase,
            profiles_table: get("PROFILES_TABLE").unwrap_or_else(|| DEFAULT_PROFILES_TABLE.into()),
            listen_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(cfg.supabase.url, "https://demo.supabase.co");
        assert_eq!(cfg.supabase.anon_key.expose_secret(), "anon");
        assert_eq!(cfg.supabase.timeout, None);
        assert_eq!(cfg.profiles_table, "user_profiles");
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "http://localhost:54321"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("APP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("invalid listen address"));
    }

    #[test]
    fn missing_url_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("SUPABASE_ANON_KEY", "anon")])).unwrap_err();
        assert!(err.to_string().contains("SUPABASE_URL"));
    }

    #[test]
    fn timeout_and_table_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "http://localhost:54321"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("SUPABASE_TIMEOUT_SECS", "15"),
            ("PROFILES_TABLE", "profiles_v2"),
        ]))
        .unwrap();
        assert_eq!(cfg.supabase.timeout, Some(Duration::from_secs(15)));
        assert_eq!(cfg.profiles_table, "profiles_v2");
    }

    #[test]
    fn debug_does_not_leak_key() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "http://localhost:54321"),
            ("SUPABASE_ANON_KEY", "very-secret-key"),
        ]))
        .unwrap();
        assert!(!format!("{cfg:?}").contains("very-secret-key"));
    }
}
