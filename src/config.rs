//! Arena construction settings.

use std::env::{self, VarError};

/// Environment variable holding the arena size in bytes. Accepts decimal or `0x`-prefixed hex.
pub const ARENA_SIZE_ENV_FLAG: &str = "RALLOC_ARENA_SIZE";
/// Environment variable enabling allocator logging. If set to any value, logging is enabled.
pub const LOG_ENV_FLAG: &str = "RALLOC_LOG";

/// Arena size used when nothing else is configured.
pub const DEFAULT_ARENA_SIZE: usize = 1024;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("Environment variable {0} is not valid unicode")]
  NotUnicode(&'static str),
  #[error("Invalid value for {key}: {value:?}")]
  InvalidSize { key: &'static str, value: String },
}

/// Settings for [`ArenaAllocator::with_config`](crate::ArenaAllocator::with_config).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
  /// Total arena capacity in bytes, headers included.
  pub total_size: usize,
  /// Turn on allocator logging when the arena is built.
  pub logging: bool,
}

impl Default for ArenaConfig {
  fn default() -> Self {
    Self {
      total_size: DEFAULT_ARENA_SIZE,
      logging: false,
    }
  }
}

impl ArenaConfig {
  pub fn new(total_size: usize) -> Self {
    Self {
      total_size,
      ..Self::default()
    }
  }

  pub fn with_total_size(
    mut self,
    total_size: usize,
  ) -> Self {
    self.total_size = total_size;
    self
  }

  pub fn with_logging(
    mut self,
    logging: bool,
  ) -> Self {
    self.logging = logging;
    self
  }

  /// Builds a config from [`ARENA_SIZE_ENV_FLAG`] and [`LOG_ENV_FLAG`], falling back to the defaults.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Some(size) = read_env(ARENA_SIZE_ENV_FLAG)? {
      config.total_size = parse_size(&size).ok_or(ConfigError::InvalidSize {
        key: ARENA_SIZE_ENV_FLAG,
        value: size,
      })?;
    }

    config.logging = env_present(LOG_ENV_FLAG);
    Ok(config)
  }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
  match env::var(key) {
    Ok(val) => Ok(Some(val)),
    Err(VarError::NotPresent) => Ok(None),
    Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(key)),
  }
}

fn env_present(key: &str) -> bool {
  // Don't care about the value, just if it's set
  match env::var(key) {
    Ok(_) | Err(VarError::NotUnicode(_)) => true,
    Err(VarError::NotPresent) => false,
  }
}

fn parse_size(value: &str) -> Option<usize> {
  let value = value.trim();
  match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
    Some(hex) => usize::from_str_radix(hex, 16).ok(),
    None => value.parse().ok(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_size() {
    assert_eq!(parse_size("1024"), Some(1024));
    assert_eq!(parse_size(" 2048 "), Some(2048));
    assert_eq!(parse_size("0x400"), Some(1024));
    assert_eq!(parse_size("0X10"), Some(16));
    assert_eq!(parse_size("ten"), None);
    assert_eq!(parse_size("-4"), None);
  }

  #[test]
  fn test_builder() {
    let config = ArenaConfig::default()
      .with_total_size(4096)
      .with_logging(true);

    assert_eq!(config.total_size, 4096);
    assert!(config.logging);
    assert_eq!(ArenaConfig::new(64).total_size, 64);
    assert!(!ArenaConfig::new(64).logging);
  }

  // The only test touching these variables, so it cannot race with itself.
  #[test]
  fn test_from_env() {
    unsafe {
      env::set_var(ARENA_SIZE_ENV_FLAG, "0x800");
      env::set_var(LOG_ENV_FLAG, "");
    }
    let config = ArenaConfig::from_env().expect("Failed to read config");
    assert_eq!(config.total_size, 2048);
    assert!(config.logging);

    unsafe {
      env::set_var(ARENA_SIZE_ENV_FLAG, "lots");
    }
    assert_eq!(
      ArenaConfig::from_env(),
      Err(ConfigError::InvalidSize {
        key: ARENA_SIZE_ENV_FLAG,
        value: "lots".to_string(),
      })
    );

    unsafe {
      env::remove_var(ARENA_SIZE_ENV_FLAG);
      env::remove_var(LOG_ENV_FLAG);
    }
    assert_eq!(ArenaConfig::from_env(), Ok(ArenaConfig::default()));
  }
}
