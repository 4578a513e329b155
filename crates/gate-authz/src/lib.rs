//! OpenGate Request Authorization
//!
//! Request-scoped authorization core for a multi-tenant platform:
//! - Origin validation for state-changing requests
//! - Shared-secret checks for machine-to-machine routes
//! - Tenant context resolution (staff session or public site link)
//! - Tenant-boundary resource access decisions
//! - Audit event construction
//!
//! # Architecture
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       REQUEST GATE                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  Request ──► Origin/Secret ──► Context ──► Access ──► Audit  │
//! │                  Guard         Resolver    Validator         │
//! │                    │              │            │             │
//! │                    ▼              ▼            ▼             │
//! │               allow-list     session/link  tenant-id         │
//! │               + correlation  stores        comparison        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every check is terminal: the first rejection ends the request and the
//! caller maps it to a response status. Nothing here retries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use gate_common::{GateResult, RequestCorrelationId};

pub mod access;
pub mod audit;
pub mod context;
pub mod origin;
pub mod secret;
pub mod store;

pub use access::{AccessPolicy, AccessValidator};
pub use audit::{AuditEmitter, AuditEvent, AuditSink, MemoryAuditSink};
pub use context::{ContextResolver, SessionRecord, SessionStore, SiteLinkRecord, SiteLinkStore};
pub use origin::OriginGuard;
pub use secret::{RouteLog, SecretGuard};
pub use store::{InMemorySessionStore, InMemorySiteLinkStore};

// =============================================================================
// Core Types
// =============================================================================

/// Company (tenant) ID
pub type CompanyId = Uuid;

/// User ID
pub type UserId = Uuid;

/// Staff role within a company
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    /// Company owner, full administrative rights
    Owner,
    /// Regular staff member
    Member,
    /// Read-only staff member
    Viewer,
}

impl Role {
    /// Whether this role carries administrative rights
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Owner)
    }
}

/// Resolved identity + tenant information for one request.
///
/// Exactly one variant is active per request. Created by the context
/// resolver, dropped at request end, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantContext {
    /// Staff member with a valid session
    Authenticated {
        /// Tenant the session belongs to
        company_id: CompanyId,
        /// Authenticated user
        user_id: UserId,
        /// Staff role
        role: Role,
        /// Administrative rights, derived from the role at resolution
        is_admin: bool,
    },
    /// Visitor arriving through a public site link
    Public {
        /// Slug of the link that granted access
        site_link_slug: String,
        /// Tenant the link is scoped to
        company_id: CompanyId,
        /// Link expiry, if the link has one
        expires_at: Option<DateTime<Utc>>,
    },
}

impl TenantContext {
    /// Tenant id of this context. Total over both variants; every
    /// tenant-scoped query downstream keys off this value.
    pub fn company_id(&self) -> CompanyId {
        match self {
            TenantContext::Authenticated { company_id, .. } => *company_id,
            TenantContext::Public { company_id, .. } => *company_id,
        }
    }

    /// Whether this context carries administrative rights.
    /// Public contexts never do.
    pub fn is_admin(&self) -> bool {
        match self {
            TenantContext::Authenticated { is_admin, .. } => *is_admin,
            TenantContext::Public { .. } => false,
        }
    }

    /// Whether this is a staff session context
    pub fn is_authenticated(&self) -> bool {
        matches!(self, TenantContext::Authenticated { .. })
    }

    /// Whether this is a public site-link context
    pub fn is_public(&self) -> bool {
        matches!(self, TenantContext::Public { .. })
    }

    /// Read-only projection for rendering paths
    pub fn view(&self) -> ContextView {
        match self {
            TenantContext::Authenticated { company_id, user_id, role, .. } => {
                ContextView::Staff {
                    company_id: *company_id,
                    user_id: *user_id,
                    role: *role,
                }
            }
            TenantContext::Public { site_link_slug, company_id, .. } => ContextView::Visitor {
                company_id: *company_id,
                site_link_slug: site_link_slug.clone(),
            },
        }
    }
}

/// Read-only projection of a [`TenantContext`].
///
/// Exposes identity and company fields only; carries no session handle and
/// no mutation capability, so rendering paths that hold one cannot cause
/// side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextView {
    /// Projection of an authenticated context
    Staff {
        /// Tenant id
        company_id: CompanyId,
        /// User id
        user_id: UserId,
        /// Staff role
        role: Role,
    },
    /// Projection of a public context
    Visitor {
        /// Tenant id
        company_id: CompanyId,
        /// Link slug
        site_link_slug: String,
    },
}

impl ContextView {
    /// Tenant id of the projected context
    pub fn company_id(&self) -> CompanyId {
        match self {
            ContextView::Staff { company_id, .. } => *company_id,
            ContextView::Visitor { company_id, .. } => *company_id,
        }
    }
}

/// Outcome of a resource access check.
///
/// Never partially applied: either the whole operation proceeds or it is
/// rejected before any side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether the operation may proceed
    pub allowed: bool,
    /// Internal reason label for audit trails; never shown to the caller
    pub reason: Option<String>,
}

/// Outcome of a session-ending mutation: an HTTP-style redirect the
/// boundary relays verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEnd {
    /// Redirect status (`303`-equivalent)
    pub redirect_status: u16,
    /// Location the boundary should redirect to
    pub location: String,
}

// =============================================================================
// Request Gate
// =============================================================================

/// Deployment configuration for the request gate
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Public base URL of the deployment; the origin allow-list derives
    /// from it
    pub public_base_url: String,
    /// Additional trusted origins beyond the public base URL
    pub extra_trusted_origins: Vec<String>,
    /// Shared secret for machine-to-machine (scheduled job) routes
    pub job_secret: String,
    /// Allow admins to cross tenant boundaries. Off by default.
    pub admin_cross_tenant_access: bool,
    /// Where a terminated session is redirected to
    pub login_location: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000".to_string(),
            extra_trusted_origins: Vec::new(),
            job_secret: String::new(),
            admin_cross_tenant_access: false,
            login_location: "/login".to_string(),
        }
    }
}

/// Front door of the authorization core.
///
/// Wires the guards in request order: origin or secret guard first, then
/// tenant context resolution, then resource access validation. The first
/// failing check is returned and nothing after it runs.
pub struct RequestGate {
    /// Origin allow-list guard
    origin: OriginGuard,
    /// Machine-to-machine secret guard
    secret: SecretGuard,
    /// Session / site-link resolution
    resolver: ContextResolver,
    /// Tenant boundary checks
    access: AccessValidator,
    /// Audit event emission
    audit: AuditEmitter,
    /// Config
    config: GateConfig,
}

impl RequestGate {
    /// Build a gate from deployment config and its external collaborators.
    pub fn new(
        config: GateConfig,
        sessions: Arc<dyn SessionStore>,
        links: Arc<dyn SiteLinkStore>,
        audit_sink: Arc<dyn AuditSink>,
    ) -> GateResult<Self> {
        let origin = OriginGuard::new(&config.public_base_url, &config.extra_trusted_origins)?;
        let secret = SecretGuard::new(config.job_secret.clone());
        let resolver = ContextResolver::new(sessions, links);
        let access = AccessValidator::new(AccessPolicy {
            admin_cross_tenant_access: config.admin_cross_tenant_access,
        });
        let audit = AuditEmitter::new(audit_sink);

        Ok(Self { origin, secret, resolver, access, audit, config })
    }

    /// Issue the correlation id for a freshly arrived request
    pub fn begin_request(&self) -> RequestCorrelationId {
        self.origin.issue_correlation_id()
    }

    /// Gate a state-changing staff operation on a tenant-scoped resource.
    ///
    /// Origin guard, then session resolution, then write-access assertion.
    /// The caller must perform the mutation only on `Ok`.
    pub async fn authorize_staff_mutation(
        &self,
        origin_header: Option<&str>,
        session_token: &str,
        resource_company_id: CompanyId,
    ) -> GateResult<TenantContext> {
        self.origin.assert_origin(origin_header)?;
        let ctx = self.resolver.resolve_authenticated(session_token).await?;
        self.access.assert_resource_access(&ctx, resource_company_id)?;
        Ok(ctx)
    }

    /// Resolve a public site-link visit to a read-only view.
    pub async fn authorize_public_view(&self, slug: &str) -> GateResult<ContextView> {
        let ctx = self.resolver.resolve_public_readonly(slug).await?;
        Ok(ctx.view())
    }

    /// Gate and perform the logout-shaped mutation.
    ///
    /// Origin rejection is terminal and leaves the session untouched. With
    /// a trusted origin the session is invalidated (idempotently, an
    /// already-dead session still redirects) and the caller answers with
    /// the returned redirect.
    pub async fn end_session(
        &self,
        origin_header: Option<&str>,
        session_token: &str,
        request_id: &RequestCorrelationId,
    ) -> GateResult<SessionEnd> {
        self.origin.assert_origin(origin_header)?;

        if let Ok(ctx) = self.resolver.resolve_authenticated_readonly(session_token).await {
            self.resolver.end_session(session_token).await;
            if let TenantContext::Authenticated { user_id, .. } = &ctx {
                self.audit
                    .emit(
                        AuditEvent::new("session.end", "session", user_id.to_string(), request_id)
                            .with_detail("company_id", ctx.company_id().to_string()),
                    )
                    .await;
            }
        }

        Ok(SessionEnd {
            redirect_status: 303,
            location: self.config.login_location.clone(),
        })
    }

    /// Gate a machine-to-machine route behind the shared job secret.
    pub fn require_job_secret(
        &self,
        presented: Option<&str>,
        route_label: &str,
    ) -> GateResult<RouteLog> {
        self.secret.require_secret(presented, route_label)
    }

    /// The resolver, for read-only rendering paths
    pub fn resolver(&self) -> &ContextResolver {
        &self.resolver
    }

    /// The access validator, for callers that check without the full gate
    pub fn access(&self) -> &AccessValidator {
        &self.access
    }

    /// The audit emitter
    pub fn audit(&self) -> &AuditEmitter {
        &self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate_common::GateError;

    fn gate_with_stores() -> (RequestGate, Arc<InMemorySessionStore>, Arc<MemoryAuditSink>) {
        let sessions = Arc::new(InMemorySessionStore::new());
        let links = Arc::new(InMemorySiteLinkStore::new());
        let sink = Arc::new(MemoryAuditSink::new());
        let config = GateConfig {
            public_base_url: "https://app.example.com".to_string(),
            job_secret: "job-secret".to_string(),
            ..Default::default()
        };
        let gate = RequestGate::new(config, sessions.clone(), links, sink.clone()).unwrap();
        (gate, sessions, sink)
    }

    fn staff_session(company_id: CompanyId) -> SessionRecord {
        SessionRecord {
            company_id,
            user_id: Uuid::new_v4(),
            role: Role::Member,
            expires_at: None,
        }
    }

    #[test]
    fn test_context_predicates_total_over_both_variants() {
        let auth = TenantContext::Authenticated {
            company_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: Role::Owner,
            is_admin: true,
        };
        let public = TenantContext::Public {
            site_link_slug: "spring-menu".to_string(),
            company_id: Uuid::new_v4(),
            expires_at: None,
        };

        assert!(auth.is_authenticated() && !auth.is_public());
        assert!(public.is_public() && !public.is_authenticated());
        assert!(auth.is_admin());
        assert!(!public.is_admin());
        assert_ne!(auth.company_id(), public.company_id());
    }

    #[test]
    fn test_view_projects_identity_fields_only() {
        let company_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let ctx = TenantContext::Authenticated {
            company_id,
            user_id,
            role: Role::Viewer,
            is_admin: false,
        };

        match ctx.view() {
            ContextView::Staff { company_id: c, user_id: u, role } => {
                assert_eq!(c, company_id);
                assert_eq!(u, user_id);
                assert_eq!(role, Role::Viewer);
            }
            other => panic!("unexpected projection: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_staff_mutation_full_path() {
        let (gate, sessions, _) = gate_with_stores();
        let company_id = Uuid::new_v4();
        sessions.insert("tok", staff_session(company_id));

        let ctx = gate
            .authorize_staff_mutation(Some("https://app.example.com"), "tok", company_id)
            .await
            .unwrap();
        assert_eq!(ctx.company_id(), company_id);
    }

    #[tokio::test]
    async fn test_staff_mutation_rejects_foreign_origin_before_resolution() {
        let (gate, sessions, _) = gate_with_stores();
        let company_id = Uuid::new_v4();
        sessions.insert("tok", staff_session(company_id));

        let err = gate
            .authorize_staff_mutation(Some("https://evil.example.net"), "tok", company_id)
            .await
            .unwrap_err();
        assert_eq!(err, GateError::OriginRejected);
        // Session activity must not have been refreshed
        assert_eq!(sessions.touch_count(), 0);
    }

    #[tokio::test]
    async fn test_staff_mutation_rejects_cross_tenant() {
        let (gate, sessions, _) = gate_with_stores();
        sessions.insert("tok", staff_session(Uuid::new_v4()));

        let err = gate
            .authorize_staff_mutation(Some("https://app.example.com"), "tok", Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err, GateError::AccessDenied);
    }

    #[tokio::test]
    async fn test_end_session_foreign_origin_leaves_session_alone() {
        let (gate, sessions, sink) = gate_with_stores();
        sessions.insert("tok", staff_session(Uuid::new_v4()));
        let request_id = gate.begin_request();

        let err = gate
            .end_session(Some("http://app.example.com"), "tok", &request_id)
            .await
            .unwrap_err();
        assert_eq!(err, GateError::OriginRejected);
        assert!(sessions.contains("tok"));
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_end_session_invalidates_and_redirects() {
        let (gate, sessions, sink) = gate_with_stores();
        sessions.insert("tok", staff_session(Uuid::new_v4()));
        let request_id = gate.begin_request();

        let end = gate
            .end_session(Some("https://app.example.com"), "tok", &request_id)
            .await
            .unwrap();
        assert_eq!(end.redirect_status, 303);
        assert_eq!(end.location, "/login");
        assert!(!sessions.contains("tok"));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, "session.end");
        assert_eq!(events[0].request_id, request_id);
    }

    #[tokio::test]
    async fn test_job_secret_gates_before_operation() {
        let (gate, _, _) = gate_with_stores();
        let mut side_effect_ran = false;

        if gate.require_job_secret(Some("wrong"), "export-runner").is_ok() {
            side_effect_ran = true;
        }
        assert!(!side_effect_ran);

        let log = gate.require_job_secret(Some("job-secret"), "export-runner").unwrap();
        assert_eq!(log.route(), "export-runner");
    }
}
