//! Permission specification attached to a tool definition.
//!
//! The registry evaluates these specs together with live usage counters
//! (sliding one-hour window and per-session totals) when gating a call.

use serde::{Deserialize, Serialize};

/// Coarse access level for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// Any role may call the tool (subject to deny lists and rate limits).
    #[default]
    Public,
    /// Only roles in `allowed_roles` may call the tool.
    Restricted,
    /// Nobody may call the tool.
    Disabled,
}

/// Per-tool call quotas. `None` means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Maximum calls per session within a sliding one-hour window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_calls_per_hour: Option<u32>,
    /// Maximum cumulative calls per session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_calls_per_session: Option<u32>,
}

impl RateLimit {
    pub fn per_hour(max: u32) -> Self {
        Self {
            max_calls_per_hour: Some(max),
            max_calls_per_session: None,
        }
    }

    pub fn per_session(max: u32) -> Self {
        Self {
            max_calls_per_hour: None,
            max_calls_per_session: Some(max),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_calls_per_hour.is_none() && self.max_calls_per_session.is_none()
    }
}

/// Declarative permission spec for a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionSpec {
    #[serde(default)]
    pub level: PermissionLevel,
    /// Roles granted access when `level` is `Restricted`.
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    /// Roles denied access regardless of level.
    #[serde(default)]
    pub denied_roles: Vec<String>,
    /// When non-empty, only these models may invoke the tool.
    #[serde(default)]
    pub allowed_models: Vec<String>,
    #[serde(default)]
    pub rate_limit: RateLimit,
}

impl PermissionSpec {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn restricted_to(roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            level: PermissionLevel::Restricted,
            allowed_roles: roles.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_denied_role(mut self, role: impl Into<String>) -> Self {
        self.denied_roles.push(role.into());
        self
    }

    pub fn with_allowed_model(mut self, model: impl Into<String>) -> Self {
        self.allowed_models.push(model.into());
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Static role check: deny list first, then the level.
    pub fn role_allowed(&self, role: &str) -> bool {
        if self.denied_roles.iter().any(|r| r == role) {
            return false;
        }
        match self.level {
            PermissionLevel::Public => true,
            PermissionLevel::Restricted => self.allowed_roles.iter().any(|r| r == role),
            PermissionLevel::Disabled => false,
        }
    }

    /// Static model check: empty allow list means any model.
    pub fn model_allowed(&self, model_id: &str) -> bool {
        self.allowed_models.is_empty() || self.allowed_models.iter().any(|m| m == model_id)
    }
}
