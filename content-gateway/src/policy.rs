// SPDX-License-Identifier: PMPL-1.0-or-later
// Role-based access control for the admin console
//
// Reading published content needs no role. Everything else is checked
// against the grant table before any request reaches the backend.

use crate::error::{GatewayError, Result};
use crate::models::{ArticleKind, Profile, Role};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadDrafts,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ReadDrafts => "read drafts of",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// A role's privileges over one article kind
#[derive(Debug, Clone)]
pub struct Grant {
    pub role: Role,
    pub kind: ArticleKind,
    pub actions: Vec<Action>,
}

/// Grant table
#[derive(Debug, Clone)]
pub struct Policy {
    grants: Vec<Grant>,
}

const ALL_ACTIONS: [Action; 4] = [
    Action::ReadDrafts,
    Action::Create,
    Action::Update,
    Action::Delete,
];

impl Default for Policy {
    fn default() -> Self {
        let full = |role, kind| Grant {
            role,
            kind,
            actions: ALL_ACTIONS.to_vec(),
        };

        Self {
            grants: vec![
                full(Role::Admin, ArticleKind::News),
                full(Role::Admin, ArticleKind::Project),
                full(Role::NewsEditor, ArticleKind::News),
                full(Role::ProjectEditor, ArticleKind::Project),
            ],
        }
    }
}

impl Policy {
    pub fn new(grants: Vec<Grant>) -> Self {
        Self { grants }
    }

    /// Check if role has privilege
    pub fn can(&self, role: Role, action: Action, kind: ArticleKind) -> bool {
        self.grants
            .iter()
            .any(|g| g.role == role && g.kind == kind && g.actions.contains(&action))
    }

    /// Fail with `Unauthenticated` or `Forbidden` unless the actor may act.
    pub fn authorize(&self, actor: Option<&Profile>, action: Action, kind: ArticleKind) -> Result<()> {
        let profile = actor.ok_or(GatewayError::Unauthenticated)?;
        if self.can(profile.role, action, kind) {
            Ok(())
        } else {
            tracing::info!(
                user = %profile.id,
                role = %profile.role,
                %action,
                %kind,
                "Admin action denied"
            );
            Err(GatewayError::Forbidden {
                role: profile.role,
                action,
                kind,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile(role: Role) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "editor@agency.example".to_string(),
            role,
        }
    }

    #[test]
    fn test_admin_has_every_privilege() {
        let policy = Policy::default();
        for kind in [ArticleKind::News, ArticleKind::Project] {
            for action in ALL_ACTIONS {
                assert!(policy.can(Role::Admin, action, kind));
            }
        }
    }

    #[test]
    fn test_editors_limited_to_their_kind() {
        let policy = Policy::default();

        assert!(policy.can(Role::NewsEditor, Action::Create, ArticleKind::News));
        assert!(policy.can(Role::NewsEditor, Action::Delete, ArticleKind::News));
        assert!(!policy.can(Role::NewsEditor, Action::Update, ArticleKind::Project));

        assert!(policy.can(Role::ProjectEditor, Action::Update, ArticleKind::Project));
        assert!(!policy.can(Role::ProjectEditor, Action::ReadDrafts, ArticleKind::News));
    }

    #[test]
    fn test_authorize_requires_sign_in() {
        let policy = Policy::default();
        assert!(matches!(
            policy.authorize(None, Action::Create, ArticleKind::News),
            Err(GatewayError::Unauthenticated)
        ));
    }

    #[test]
    fn test_authorize_reports_forbidden_role() {
        let policy = Policy::default();
        let editor = profile(Role::ProjectEditor);

        let err = policy
            .authorize(Some(&editor), Action::Delete, ArticleKind::News)
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Forbidden {
                role: Role::ProjectEditor,
                action: Action::Delete,
                kind: ArticleKind::News,
            }
        ));
        assert_eq!(err.to_string(), "Role project_editor may not delete news articles");
    }

    #[test]
    fn test_custom_grant_table() {
        let policy = Policy::new(vec![Grant {
            role: Role::NewsEditor,
            kind: ArticleKind::News,
            actions: vec![Action::ReadDrafts],
        }]);

        assert!(policy.can(Role::NewsEditor, Action::ReadDrafts, ArticleKind::News));
        assert!(!policy.can(Role::NewsEditor, Action::Create, ArticleKind::News));
        assert!(!policy.can(Role::Admin, Action::Create, ArticleKind::News));
    }
}
