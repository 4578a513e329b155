//! Tenant Context Resolution
//!
//! Derives the per-request [`TenantContext`] from a session credential or
//! a public site link. Resolution never crosses tenant boundaries: the
//! resolved company id comes only from the credential or link record,
//! never from client-supplied request parameters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use gate_common::{GateError, GateResult};

use crate::{CompanyId, Role, TenantContext, UserId};

/// Session record resolved by the external credential store
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Tenant the session belongs to
    pub company_id: CompanyId,
    /// Authenticated user
    pub user_id: UserId,
    /// Staff role
    pub role: Role,
    /// Session expiry, if the store enforces one
    pub expires_at: Option<DateTime<Utc>>,
}

/// Site-link record resolved by the external link store
#[derive(Debug, Clone)]
pub struct SiteLinkRecord {
    /// Tenant the link is scoped to
    pub company_id: CompanyId,
    /// Whether the link is currently active
    pub is_active: bool,
    /// Link expiry, if the link has one
    pub expires_at: Option<DateTime<Utc>>,
}

/// Session/credential store collaborator.
///
/// The store owns its own lookup timeout; the resolver treats every
/// negative answer the same way.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve a session token. `None` covers both not-found and records
    /// the store itself considers dead.
    async fn resolve(&self, token: &str) -> Option<SessionRecord>;

    /// Refresh the session's activity timestamp
    async fn touch(&self, token: &str);

    /// Destroy the session
    async fn invalidate(&self, token: &str);
}

/// Site-link store collaborator
#[async_trait]
pub trait SiteLinkStore: Send + Sync {
    /// Resolve a link slug to its record
    async fn resolve(&self, slug: &str) -> Option<SiteLinkRecord>;
}

/// Resolves request credentials to exactly one [`TenantContext`] variant.
pub struct ContextResolver {
    sessions: Arc<dyn SessionStore>,
    links: Arc<dyn SiteLinkStore>,
}

impl ContextResolver {
    /// Wire the resolver to its collaborator stores
    pub fn new(sessions: Arc<dyn SessionStore>, links: Arc<dyn SiteLinkStore>) -> Self {
        Self { sessions, links }
    }

    /// Resolve a staff session and refresh its activity.
    ///
    /// Not-found and expired both map to `Unauthenticated`.
    pub async fn resolve_authenticated(&self, token: &str) -> GateResult<TenantContext> {
        let ctx = self.lookup_session(token).await?;
        self.sessions.touch(token).await;
        Ok(ctx)
    }

    /// Resolve a staff session without any session mutation.
    ///
    /// Identical decision logic to [`Self::resolve_authenticated`];
    /// required in rendering contexts where side effects are disallowed.
    pub async fn resolve_authenticated_readonly(&self, token: &str) -> GateResult<TenantContext> {
        self.lookup_session(token).await
    }

    async fn lookup_session(&self, token: &str) -> GateResult<TenantContext> {
        let record = self.sessions.resolve(token).await.ok_or(GateError::Unauthenticated)?;

        if let Some(expires_at) = record.expires_at {
            if Utc::now() > expires_at {
                return Err(GateError::Unauthenticated);
            }
        }

        Ok(TenantContext::Authenticated {
            company_id: record.company_id,
            user_id: record.user_id,
            role: record.role,
            is_admin: record.role.is_admin(),
        })
    }

    /// Resolve a public site link to a visitor context.
    ///
    /// Missing, inactive, and expired links all fail with
    /// `LinkInvalidOrExpired`. Canonical expiry rule: expired iff
    /// `now > expires_at`; the boundary instant itself is still valid.
    pub async fn resolve_public(&self, slug: &str) -> GateResult<TenantContext> {
        let record = self.links.resolve(slug).await.ok_or(GateError::LinkInvalidOrExpired)?;

        if !record.is_active {
            return Err(GateError::LinkInvalidOrExpired);
        }
        if let Some(expires_at) = record.expires_at {
            if Utc::now() > expires_at {
                return Err(GateError::LinkInvalidOrExpired);
            }
        }

        Ok(TenantContext::Public {
            site_link_slug: slug.to_string(),
            company_id: record.company_id,
            expires_at: record.expires_at,
        })
    }

    /// Read-only public resolution. Link lookup never mutates; exposed for
    /// symmetry with the authenticated pair so rendering paths have an
    /// explicitly side-effect-free entry point.
    pub async fn resolve_public_readonly(&self, slug: &str) -> GateResult<TenantContext> {
        self.resolve_public(slug).await
    }

    /// Destroy the session behind a token
    pub async fn end_session(&self, token: &str) {
        self.sessions.invalidate(token).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemorySessionStore, InMemorySiteLinkStore};
    use chrono::Duration;
    use uuid::Uuid;

    fn resolver() -> (ContextResolver, Arc<InMemorySessionStore>, Arc<InMemorySiteLinkStore>) {
        let sessions = Arc::new(InMemorySessionStore::new());
        let links = Arc::new(InMemorySiteLinkStore::new());
        (ContextResolver::new(sessions.clone(), links.clone()), sessions, links)
    }

    fn session(company_id: CompanyId, role: Role) -> SessionRecord {
        SessionRecord {
            company_id,
            user_id: Uuid::new_v4(),
            role,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_authenticated_maps_credential() {
        let (resolver, sessions, _) = resolver();
        let company_id = Uuid::new_v4();
        sessions.insert("tok", session(company_id, Role::Owner));

        let ctx = resolver.resolve_authenticated("tok").await.unwrap();
        match ctx {
            TenantContext::Authenticated { company_id: c, role, is_admin, .. } => {
                assert_eq!(c, company_id);
                assert_eq!(role, Role::Owner);
                assert!(is_admin);
            }
            other => panic!("expected authenticated context, got {:?}", other),
        }
        assert_eq!(sessions.touch_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthenticated() {
        let (resolver, _, _) = resolver();
        assert_eq!(
            resolver.resolve_authenticated("nope").await.unwrap_err(),
            GateError::Unauthenticated
        );
    }

    #[tokio::test]
    async fn test_expired_session_is_unauthenticated() {
        let (resolver, sessions, _) = resolver();
        let mut record = session(Uuid::new_v4(), Role::Member);
        record.expires_at = Some(Utc::now() - Duration::minutes(5));
        sessions.insert("tok", record);

        assert_eq!(
            resolver.resolve_authenticated("tok").await.unwrap_err(),
            GateError::Unauthenticated
        );
    }

    #[tokio::test]
    async fn test_readonly_resolution_never_touches() {
        let (resolver, sessions, _) = resolver();
        sessions.insert("tok", session(Uuid::new_v4(), Role::Member));

        let ctx = resolver.resolve_authenticated_readonly("tok").await.unwrap();
        assert!(ctx.is_authenticated());
        assert_eq!(sessions.touch_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_public_active_link() {
        let (resolver, _, links) = resolver();
        let company_id = Uuid::new_v4();
        links.insert(
            "spring-menu",
            SiteLinkRecord { company_id, is_active: true, expires_at: None },
        );

        let ctx = resolver.resolve_public("spring-menu").await.unwrap();
        assert!(ctx.is_public());
        assert_eq!(ctx.company_id(), company_id);
        assert!(!ctx.is_admin());
    }

    #[tokio::test]
    async fn test_missing_inactive_and_expired_links_all_fail() {
        let (resolver, _, links) = resolver();
        let company_id = Uuid::new_v4();

        links.insert(
            "inactive",
            SiteLinkRecord { company_id, is_active: false, expires_at: None },
        );
        links.insert(
            "expired",
            SiteLinkRecord {
                company_id,
                is_active: true,
                expires_at: Some(Utc::now() - Duration::hours(1)),
            },
        );

        for slug in ["missing", "inactive", "expired"] {
            assert_eq!(
                resolver.resolve_public(slug).await.unwrap_err(),
                GateError::LinkInvalidOrExpired,
                "slug {slug} should fail"
            );
        }
    }

    #[tokio::test]
    async fn test_link_valid_up_to_expiry_instant() {
        let (resolver, _, links) = resolver();
        // Comfortably in the future stands in for the boundary instant;
        // the rule is strictly-greater-than, so not-yet-past never fails.
        links.insert(
            "closing-soon",
            SiteLinkRecord {
                company_id: Uuid::new_v4(),
                is_active: true,
                expires_at: Some(Utc::now() + Duration::seconds(30)),
            },
        );

        assert!(resolver.resolve_public("closing-soon").await.is_ok());
    }

    #[tokio::test]
    async fn test_end_session_invalidates() {
        let (resolver, sessions, _) = resolver();
        sessions.insert("tok", session(Uuid::new_v4(), Role::Member));

        resolver.end_session("tok").await;
        assert!(!sessions.contains("tok"));
        assert_eq!(
            resolver.resolve_authenticated("tok").await.unwrap_err(),
            GateError::Unauthenticated
        );
    }
}
