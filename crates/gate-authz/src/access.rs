//! Resource Access Validation
//!
//! Tenant-boundary decisions for resource-scoped operations.

use gate_common::{GateError, GateResult};

use crate::{AccessDecision, CompanyId, TenantContext};

/// Platform access policy
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    /// Allow admin contexts to cross tenant boundaries. Off by default;
    /// this is an explicit deployment decision, never assumed.
    pub admin_cross_tenant_access: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self { admin_cross_tenant_access: false }
    }
}

/// Decides whether a resolved context may touch a tenant-scoped resource.
///
/// The read and write entry points run the same decision logic through a
/// single code path; the policies cannot diverge.
pub struct AccessValidator {
    policy: AccessPolicy,
}

impl AccessValidator {
    /// Create a validator under the given policy
    pub fn new(policy: AccessPolicy) -> Self {
        Self { policy }
    }

    fn decide(&self, ctx: &TenantContext, resource_company_id: CompanyId) -> AccessDecision {
        if ctx.company_id() == resource_company_id {
            return AccessDecision { allowed: true, reason: None };
        }

        if ctx.is_admin() && self.policy.admin_cross_tenant_access {
            return AccessDecision {
                allowed: true,
                reason: Some("cross-tenant admin access".to_string()),
            };
        }

        AccessDecision {
            allowed: false,
            reason: Some("tenant mismatch".to_string()),
        }
    }

    /// Decision for a state-changing operation
    pub fn validate_resource_access(
        &self,
        ctx: &TenantContext,
        resource_company_id: CompanyId,
    ) -> AccessDecision {
        self.decide(ctx, resource_company_id)
    }

    /// Decision for a read-only operation. Referentially identical to
    /// [`Self::validate_resource_access`].
    pub fn validate_resource_read(
        &self,
        ctx: &TenantContext,
        resource_company_id: CompanyId,
    ) -> AccessDecision {
        self.decide(ctx, resource_company_id)
    }

    /// The mutating-operation gate: must succeed before any write.
    ///
    /// A failed assertion aborts the operation with no partial effects.
    /// The denial carries no hint of whether the resource exists.
    pub fn assert_resource_access(
        &self,
        ctx: &TenantContext,
        resource_company_id: CompanyId,
    ) -> GateResult<()> {
        let decision = self.decide(ctx, resource_company_id);
        if decision.allowed {
            Ok(())
        } else {
            tracing::warn!(
                company_id = %ctx.company_id(),
                "resource access denied"
            );
            Err(GateError::AccessDenied)
        }
    }

    /// Read-path assertion with the same decision logic
    pub fn assert_resource_read(
        &self,
        ctx: &TenantContext,
        resource_company_id: CompanyId,
    ) -> GateResult<()> {
        let decision = self.decide(ctx, resource_company_id);
        if decision.allowed {
            Ok(())
        } else {
            Err(GateError::AccessDenied)
        }
    }
}
