//! Runtime feature flags

use std::collections::BTreeMap;

use crate::config::Config;

/// Flag gating the causal boost pass
pub const CAUSAL_BOOST_FLAG: &str = "causal_boost";

/// Prefix of environment variables that override configured flags
pub const FEATURE_ENV_PREFIX: &str = "MEMRANK_FEATURE_";

/// Runtime feature flag check
pub trait FeatureGate: Send + Sync {
    fn is_enabled(&self, flag: &str, identity: Option<&str>) -> bool;
}

/// Always answers the same way
#[derive(Debug, Clone, Copy)]
pub struct StaticFeatureGate(pub bool);

impl FeatureGate for StaticFeatureGate {
    fn is_enabled(&self, _flag: &str, _identity: Option<&str>) -> bool {
        self.0
    }
}

/// Flags from the `[features]` config table.
///
/// Resolution order: `MEMRANK_FEATURE_<FLAG>` environment variable, then the
/// config table, then enabled. The identity is accepted for interface
/// compatibility; flags here are global.
#[derive(Debug, Clone, Default)]
pub struct ConfigFeatureGate {
    flags: BTreeMap<String, bool>,
    read_env: bool,
}

impl ConfigFeatureGate {
    pub fn new(flags: BTreeMap<String, bool>) -> Self {
        Self {
            flags,
            read_env: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.features.clone())
    }

    /// Ignore environment overrides
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    fn env_override(&self, flag: &str) -> Option<bool> {
        if !self.read_env {
            return None;
        }
        let key = env_key(flag);
        let raw = std::env::var(&key).ok()?;
        let parsed = parse_flag(&raw);
        if parsed.is_none() {
            tracing::warn!("Ignoring {}={:?}: expected true/false/1/0", key, raw);
        }
        parsed
    }
}

impl FeatureGate for ConfigFeatureGate {
    fn is_enabled(&self, flag: &str, _identity: Option<&str>) -> bool {
        self.env_override(flag)
            .or_else(|| self.flags.get(flag).copied())
            .unwrap_or(true)
    }
}

/// Environment variable name for a flag
pub fn env_key(flag: &str) -> String {
    let suffix: String = flag
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{FEATURE_ENV_PREFIX}{suffix}")
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key() {
        assert_eq!(env_key("causal_boost"), "MEMRANK_FEATURE_CAUSAL_BOOST");
        assert_eq!(env_key("a-b.c"), "MEMRANK_FEATURE_A_B_C");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_config_gate_defaults_on() {
        let gate = ConfigFeatureGate::default();
        assert!(gate.is_enabled("anything", None));
    }

    #[test]
    fn test_config_gate_reads_flags() {
        let mut flags = BTreeMap::new();
        flags.insert(CAUSAL_BOOST_FLAG.to_string(), false);
        let gate = ConfigFeatureGate::new(flags).without_env();
        assert!(!gate.is_enabled(CAUSAL_BOOST_FLAG, Some("session-1")));
        assert!(gate.is_enabled("other", None));
    }

    #[test]
    fn test_static_gate() {
        assert!(StaticFeatureGate(true).is_enabled(CAUSAL_BOOST_FLAG, None));
        assert!(!StaticFeatureGate(false).is_enabled(CAUSAL_BOOST_FLAG, None));
    }
}
