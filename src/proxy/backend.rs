//! Backend identities and targets.
//!
//! # Responsibilities
//! - Name the two backend roles and their provenance labels
//! - Hold the immutable base URLs built at configuration load

use url::Url;

use crate::config::BackendsConfig;

/// Which of the two deployed backends a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendRole {
    Primary,
    Fallback,
}

impl BackendRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendRole::Primary => "primary",
            BackendRole::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for BackendRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend actually produced a response.
///
/// `FallbackEmergency` marks the one-shot retry taken after the primary,
/// believed healthy, failed at forward time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedBy {
    Primary,
    Fallback,
    FallbackEmergency,
}

impl ServedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServedBy::Primary => "primary",
            ServedBy::Fallback => "fallback",
            ServedBy::FallbackEmergency => "fallback-emergency",
        }
    }

    /// Provenance of a response served by the planned target itself.
    pub fn planned(role: BackendRole) -> Self {
        match role {
            BackendRole::Primary => ServedBy::Primary,
            BackendRole::Fallback => ServedBy::Fallback,
        }
    }
}

impl std::fmt::Display for ServedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured backend: role plus immutable base URL.
#[derive(Debug, Clone)]
pub struct BackendTarget {
    pub role: BackendRole,
    pub base_url: Url,
}

impl BackendTarget {
    pub fn new(role: BackendRole, base_url: Url) -> Self {
        Self { role, base_url }
    }
}

/// The two targets that exist for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct BackendSet {
    pub primary: BackendTarget,
    pub fallback: BackendTarget,
}

impl BackendSet {
    /// Build both targets from validated configuration.
    pub fn from_config(config: &BackendsConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            primary: BackendTarget::new(BackendRole::Primary, Url::parse(&config.primary_url)?),
            fallback: BackendTarget::new(BackendRole::Fallback, Url::parse(&config.fallback_url)?),
        })
    }
}
