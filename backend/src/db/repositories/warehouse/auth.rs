//! How the service authenticates to the warehouse.
//!
//! The strategy is picked once at startup and injected into the repository.
//! Hosted deployments receive a per-user token from the platform proxy on
//! every request; local runs use a token from the environment or a named
//! profile in `dashboard.toml`.

use std::fmt;

use crate::db::repo_config::WarehouseSettings;
use crate::db::repository::{QueryContext, RepositoryError, RepositoryResult};

/// Header the hosting platform injects with the end user's access token.
pub const FORWARDED_TOKEN_HEADER: &str = "x-forwarded-access-token";

/// Profile used when none is named.
pub const DEFAULT_PROFILE: &str = "default";

/// Credentials resolved from a local profile.
#[derive(Clone, PartialEq, Eq)]
pub struct ProfileCredentials {
    pub name: String,
    pub token: Option<String>,
}

impl fmt::Debug for ProfileCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileCredentials")
            .field("name", &self.name)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Use the token forwarded with each request.
    Forwarded,
    /// Use fixed credentials; request headers are ignored.
    Profile(ProfileCredentials),
}

impl AuthStrategy {
    /// Choose the strategy from warehouse settings (env overrides already applied).
    ///
    /// An explicit `auth` value wins. Otherwise hosted deployments use
    /// forwarded tokens and everything else uses a profile.
    pub fn from_settings(settings: &WarehouseSettings) -> RepositoryResult<Self> {
        let mode = settings
            .auth
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        match mode.as_deref() {
            Some("forwarded") => Ok(Self::Forwarded),
            Some("profile") => Ok(Self::Profile(Self::profile_credentials(settings))),
            Some(other) => Err(RepositoryError::configuration(format!(
                "Unknown warehouse auth mode '{}': expected 'forwarded' or 'profile'",
                other
            ))),
            None if settings.hosted => Ok(Self::Forwarded),
            None => Ok(Self::Profile(Self::profile_credentials(settings))),
        }
    }

    fn profile_credentials(settings: &WarehouseSettings) -> ProfileCredentials {
        let name = settings
            .profile
            .clone()
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        let token = settings.token.clone().or_else(|| {
            settings
                .profiles
                .get(&name)
                .and_then(|profile| profile.token.clone())
        });
        ProfileCredentials { name, token }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Forwarded => "forwarded",
            Self::Profile(_) => "profile",
        }
    }

    /// The secret to present for one request, if any.
    ///
    /// Forwarded auth without a forwarded token is an authentication error.
    pub fn resolve_token(&self, ctx: &QueryContext) -> RepositoryResult<Option<String>> {
        match self {
            Self::Forwarded => ctx
                .forwarded_token()
                .map(|token| Some(token.to_string()))
                .ok_or_else(|| {
                    RepositoryError::authentication(format!(
                        "Request carries no '{}' header",
                        FORWARDED_TOKEN_HEADER
                    ))
                }),
            Self::Profile(creds) => Ok(creds.token.clone()),
        }
    }
}
