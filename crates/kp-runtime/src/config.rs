//! Runtime configuration and its resolution from files, environment and explicit choices.

use std::path::{Path, PathBuf};

use kp_contracts::{ENV_CONFIG, ENV_PROFILE};
use kp_profiles::{BoolConvention, HexCase, ProfileCaps, ProfileId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub profile: ProfileId,

    /// Overrides the profile's hex digit case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex_case: Option<HexCase>,

    /// Overrides the profile's boolean display convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_convention: Option<BoolConvention>,
}

impl RuntimeConfig {
    pub fn for_profile(profile: ProfileId) -> Self {
        RuntimeConfig {
            profile,
            ..RuntimeConfig::default()
        }
    }

    pub fn caps(&self) -> ProfileCaps {
        let base = self.profile.caps();
        ProfileCaps {
            bool_convention: self.bool_convention.unwrap_or(base.bool_convention),
            hex_case: self.hex_case.unwrap_or(base.hex_case),
        }
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| RuntimeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_slice(&bytes)
    }

    /// Resolves the effective configuration. Precedence, highest first:
    /// explicit profile, `KP_RT_PROFILE`, the config file's profile, `kforth`.
    /// The config file is the explicit path if given, else `KP_RT_CONFIG`.
    pub fn resolve(profile: Option<ProfileId>, config_path: Option<&Path>) -> Result<Self> {
        let env_profile = std::env::var(ENV_PROFILE).ok();
        let env_config = std::env::var_os(ENV_CONFIG).map(PathBuf::from);
        resolve_with_env(profile, config_path, env_profile.as_deref(), env_config.as_deref())
    }

    /// Environment-only resolution for callers that cannot report errors (the C ABI).
    /// Invalid settings are logged and replaced by the default profile.
    pub fn from_env_or_default() -> Self {
        or_default(Self::resolve(None, None))
    }
}

fn or_default(resolved: Result<RuntimeConfig>) -> RuntimeConfig {
    match resolved {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "invalid runtime environment, using defaults");
            RuntimeConfig::default()
        }
    }
}

fn parse_profile_env(raw: &str) -> Result<ProfileId> {
    ProfileId::parse(raw).ok_or_else(|| RuntimeError::UnknownProfile {
        value: raw.trim().to_string(),
    })
}

fn resolve_with_env(
    cli_profile: Option<ProfileId>,
    cli_config: Option<&Path>,
    env_profile: Option<&str>,
    env_config: Option<&Path>,
) -> Result<RuntimeConfig> {
    let mut config = match cli_config.or(env_config) {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };

    let env_profile = env_profile
        .filter(|raw| !raw.trim().is_empty())
        .map(parse_profile_env)
        .transpose()?;

    if let Some(profile) = cli_profile.or(env_profile) {
        config.profile = profile;
    }
    tracing::debug!(profile = %config.profile, "resolved runtime config");
    Ok(config)
}
