//! Submission permission evaluator.
//!
//! Every call site (handlers, views, services) asks here instead of
//! re-deriving role checks. Edit and delete share one rule table.

use uuid::Uuid;

use crate::types::Role;

/// Everything needed to decide whether an actor may touch a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionContext {
    pub actor_role: Role,
    pub actor_user_id: Uuid,
    pub actor_org_id: Uuid,
    pub resource_owner_user_id: Uuid,
    pub resource_owner_org_id: Uuid,
}

/// Mutating capabilities gated by [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Edit,
    Delete,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Edit => "edit",
            Capability::Delete => "delete",
        }
    }
}

/// Rule table for mutations, first match wins:
/// 1. Admin: allow
/// 2. Director within the resource's organization: allow
/// 3. Analyst who owns the resource: allow
/// 4. deny
pub fn can_mutate(ctx: &PermissionContext) -> bool {
    match ctx.actor_role {
        Role::Admin => true,
        Role::Director => ctx.actor_org_id == ctx.resource_owner_org_id,
        Role::Analyst => ctx.actor_user_id == ctx.resource_owner_user_id,
    }
}

pub fn authorize(capability: Capability, ctx: &PermissionContext) -> bool {
    match capability {
        Capability::Edit | Capability::Delete => can_mutate(ctx),
    }
}

pub fn can_edit(ctx: &PermissionContext) -> bool {
    authorize(Capability::Edit, ctx)
}

pub fn can_delete(ctx: &PermissionContext) -> bool {
    authorize(Capability::Delete, ctx)
}

/// Whether the viewer may read the sensitive annotation (and its history).
///
/// Directors see annotations across organizations; analysts only on their
/// own submissions.
pub fn can_view_sensitive(ctx: &PermissionContext) -> bool {
    match ctx.actor_role {
        Role::Admin | Role::Director => true,
        Role::Analyst => ctx.actor_user_id == ctx.resource_owner_user_id,
    }
}

/// Analysts may neither add nor change sensitive annotations.
pub fn can_set_sensitive_info(role: Role) -> bool {
    !matches!(role, Role::Analyst)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Role; 3] = [Role::Admin, Role::Director, Role::Analyst];

    fn ctx(role: Role, user: Uuid, org: Uuid, owner: Uuid, owner_org: Uuid) -> PermissionContext {
        PermissionContext {
            actor_role: role,
            actor_user_id: user,
            actor_org_id: org,
            resource_owner_user_id: owner,
            resource_owner_org_id: owner_org,
        }
    }

    #[test]
    fn admin_allowed_everywhere() {
        let (me, other, org_a, org_b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        for (owner, owner_org) in [(me, org_a), (other, org_a), (other, org_b), (me, org_b)] {
            let c = ctx(Role::Admin, me, org_a, owner, owner_org);
            assert!(can_edit(&c));
            assert!(can_delete(&c));
        }
    }

    #[test]
    fn director_scoped_to_resource_org() {
        let (me, other, org_a, org_b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert!(can_edit(&ctx(Role::Director, me, org_a, other, org_a)));
        assert!(can_delete(&ctx(Role::Director, me, org_a, other, org_a)));
        // Own submission recorded under another organization is still denied.
        assert!(!can_edit(&ctx(Role::Director, me, org_a, me, org_b)));
        assert!(!can_delete(&ctx(Role::Director, me, org_a, other, org_b)));
    }

    #[test]
    fn analyst_scoped_to_authorship() {
        let (me, colleague, org_a, org_b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert!(can_edit(&ctx(Role::Analyst, me, org_a, me, org_a)));
        assert!(!can_edit(&ctx(Role::Analyst, me, org_a, colleague, org_a)));
        assert!(!can_delete(&ctx(Role::Analyst, me, org_a, colleague, org_a)));
        assert!(can_delete(&ctx(Role::Analyst, me, org_a, me, org_b)));
    }

    #[test]
    fn edit_and_delete_always_agree() {
        let users = [Uuid::new_v4(), Uuid::new_v4()];
        let orgs = [Uuid::new_v4(), Uuid::new_v4()];
        for role in ROLES {
            for owner in users {
                for owner_org in orgs {
                    let c = ctx(role, users[0], orgs[0], owner, owner_org);
                    assert_eq!(can_edit(&c), can_delete(&c), "{:?}", c);
                }
            }
        }
    }

    #[test]
    fn scenario_same_org_analysts_and_director() {
        let o1 = Uuid::new_v4();
        let (a1, a2, d1, admin) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        assert!(!can_edit(&ctx(Role::Analyst, a1, o1, a2, o1)));
        assert!(can_edit(&ctx(Role::Director, d1, o1, a2, o1)));
        assert!(can_edit(&ctx(Role::Admin, admin, Uuid::new_v4(), a2, o1)));
        assert!(can_edit(&ctx(Role::Analyst, a1, o1, a1, o1)));
    }

    #[test]
    fn sensitive_visibility() {
        let (me, other, org_a, org_b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert!(can_view_sensitive(&ctx(Role::Director, me, org_a, other, org_b)));
        assert!(can_view_sensitive(&ctx(Role::Analyst, me, org_a, me, org_a)));
        assert!(!can_view_sensitive(&ctx(Role::Analyst, me, org_a, other, org_a)));
        assert!(!can_set_sensitive_info(Role::Analyst));
        assert!(can_set_sensitive_info(Role::Director));
    }
}
