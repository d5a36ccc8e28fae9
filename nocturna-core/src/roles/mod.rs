//! Role lookup and classification.
//!
//! The backend identifies roles by number; the client branches on the role
//! *description*. [`RoleResolver`] maps between the two through one cached
//! fetch of the role list, and classifies users into a [`Role`] once so
//! screens never recompute flags on their own.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::cache::{CachePolicy, TtlCache};
use crate::clock::Clock;
use crate::models::RoleRecord;
use crate::{NocturnaError, Result};

/// Who the signed-in user is, as far as the UI is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Regular customer.
    Regular,
    /// Manages venues and buys advertising.
    VenueOwner,
    /// Moderates venues, reviews and users.
    Admin,
}

impl Role {
    /// Backend description of the administrator role.
    pub const ADMIN_DESCRIPTION: &'static str = "Administrador";
    /// Backend description of the venue owner role.
    pub const VENUE_OWNER_DESCRIPTION: &'static str = "Usuario Comercio";
    /// Backend description of the regular role.
    pub const REGULAR_DESCRIPTION: &'static str = "Usuario";

    /// Classify a backend role description.
    ///
    /// Matching is case-insensitive. Unknown descriptions are `Regular`.
    pub fn from_description(description: &str) -> Self {
        let lower = description.trim().to_lowercase();
        if lower.starts_with("admin") {
            Self::Admin
        } else if ["comercio", "propietario", "dueño", "dueno"]
            .iter()
            .any(|marker| lower.contains(marker))
        {
            Self::VenueOwner
        } else {
            Self::Regular
        }
    }

    /// Canonical backend description, used to look up the id on registration.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Regular => Self::REGULAR_DESCRIPTION,
            Self::VenueOwner => Self::VENUE_OWNER_DESCRIPTION,
            Self::Admin => Self::ADMIN_DESCRIPTION,
        }
    }

    /// True for [`Role::Admin`].
    pub fn is_admin(&self) -> bool {
        *self == Self::Admin
    }

    /// True for [`Role::VenueOwner`].
    pub fn is_venue_owner(&self) -> bool {
        *self == Self::VenueOwner
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Where the role list comes from.
#[async_trait]
pub trait RoleSource: Send + Sync {
    /// Fetch every role known to the backend.
    async fn list_roles(&self) -> Result<Vec<RoleRecord>>;
}

/// Cached role lookups.
pub struct RoleResolver {
    source: Arc<dyn RoleSource>,
    cache: TtlCache<(), Arc<Vec<RoleRecord>>>,
    refresh: Mutex<()>,
}

impl RoleResolver {
    /// Create a resolver with an explicit cache policy and clock.
    pub fn new(source: Arc<dyn RoleSource>, policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            cache: TtlCache::new(policy, clock),
            refresh: Mutex::new(()),
        }
    }

    /// Full role list, fetched at most once per cache lifetime.
    ///
    /// Concurrent callers that find the cache empty share one fetch.
    pub async fn roles(&self) -> Result<Arc<Vec<RoleRecord>>> {
        if let Some(roles) = self.cache.get(&()) {
            return Ok(roles);
        }

        let _guard = self.refresh.lock().await;
        if let Some(roles) = self.cache.get(&()) {
            return Ok(roles);
        }

        tracing::debug!("fetching role list");
        let roles = Arc::new(self.source.list_roles().await?);
        self.cache.insert((), roles.clone());
        Ok(roles)
    }

    /// Numeric id of the role with the given description.
    pub async fn id_for(&self, description: &str) -> Result<i64> {
        let roles = self.roles().await?;
        roles
            .iter()
            .find(|r| r.description.eq_ignore_ascii_case(description.trim()))
            .map(|r| r.id)
            .ok_or_else(|| NocturnaError::not_found("role", description))
    }

    /// Description of the role with the given id.
    pub async fn description_for(&self, id: i64) -> Result<String> {
        let roles = self.roles().await?;
        roles
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.description.clone())
            .ok_or_else(|| NocturnaError::not_found("role", id.to_string()))
    }

    /// Classify a role id, degrading to [`Role::Regular`] when the lookup fails.
    pub async fn role_for(&self, id: i64) -> Role {
        match self.description_for(id).await {
            Ok(description) => Role::from_description(&description),
            Err(err) => {
                tracing::warn!(role_id = id, "role lookup failed, treating as regular: {err}");
                Role::Regular
            }
        }
    }

    /// Numeric id to register a user with the given role.
    pub async fn id_for_role(&self, role: Role) -> Result<i64> {
        match self.id_for(role.description()).await {
            Ok(id) => Ok(id),
            Err(NocturnaError::NotFound { .. }) => {
                // Descriptions vary between deployments; fall back to classification.
                let roles = self.roles().await?;
                roles
                    .iter()
                    .find(|r| Role::from_description(&r.description) == role)
                    .map(|r| r.id)
                    .ok_or_else(|| NocturnaError::not_found("role", role.description()))
            }
            Err(err) => Err(err),
        }
    }

    /// Drop the cached list; the next lookup fetches again.
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}
