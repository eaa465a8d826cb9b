//! Resolves the calling user into a role-aware `Viewer` and derives the
//! row scopes list endpoints filter by.
//!
//! Authentication happens upstream; handlers receive a `user_id` and trust it.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::company::HrRow;
use crate::models::user::User;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ViewerQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Candidate,
    Hr,
    Staff,
    Guest,
}

/// Which rows of a table the viewer may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Only(Uuid),
    Nothing,
}

impl Scope {
    /// Bind value for `($1::uuid IS NULL OR col = $1)` style filters.
    /// `Nothing` must be short-circuited before querying.
    pub fn filter_id(self) -> Option<Uuid> {
        match self {
            Scope::Only(id) => Some(id),
            Scope::All | Scope::Nothing => None,
        }
    }

    /// Whether a single row keyed by `id` is visible under this scope.
    pub fn permits(self, id: Uuid) -> bool {
        match self {
            Scope::All => true,
            Scope::Only(allowed) => allowed == id,
            Scope::Nothing => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Viewer {
    pub user: User,
    pub candidate_id: Option<Uuid>,
    pub hr: Option<HrRow>,
}

impl Viewer {
    pub fn role(&self) -> Role {
        if self.candidate_id.is_some() {
            Role::Candidate
        } else if self.hr.is_some() {
            Role::Hr
        } else if self.user.is_staff {
            Role::Staff
        } else {
            Role::Guest
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.user.is_staff {
            Ok(())
        } else {
            Err(AppError::Forbidden("Staff access required".to_string()))
        }
    }

    pub fn require_hr(&self) -> Result<&HrRow, AppError> {
        self.hr
            .as_ref()
            .ok_or_else(|| AppError::Forbidden("Only HR managers can do this".to_string()))
    }

    pub fn require_candidate(&self) -> Result<Uuid, AppError> {
        self.candidate_id
            .ok_or_else(|| AppError::Forbidden("Only candidates can do this".to_string()))
    }

    /// Candidates and resumes: staff see all, candidates their own.
    pub fn candidate_scope(&self) -> Scope {
        if self.user.is_staff {
            Scope::All
        } else {
            self.candidate_id.map_or(Scope::Nothing, Scope::Only)
        }
    }

    /// Vacancies: HR managers see their company's, everyone else all.
    pub fn vacancy_company_scope(&self) -> Scope {
        match &self.hr {
            Some(hr) => Scope::Only(hr.company_id),
            None => Scope::All,
        }
    }

    /// HR records: staff see all, others only their own user's.
    pub fn hr_user_scope(&self) -> Scope {
        if self.user.is_staff {
            Scope::All
        } else {
            Scope::Only(self.user.id)
        }
    }

    /// Discipline feedback: HR managers see what they wrote.
    pub fn feedback_scope(&self) -> Scope {
        self.hr.as_ref().map_or(Scope::Nothing, |hr| Scope::Only(hr.id))
    }

    /// True when the viewer may modify the given candidate.
    pub fn can_edit_candidate(&self, candidate_id: Uuid) -> bool {
        self.user.is_staff || self.candidate_id == Some(candidate_id)
    }
}

pub async fn resolve_viewer(pool: &PgPool, user_id: Uuid) -> Result<Viewer, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let candidate_id: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM candidates WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    let hr = sqlx::query_as::<_, HrRow>("SELECT * FROM hrs WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(Viewer {
        user,
        candidate_id,
        hr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn viewer(is_staff: bool, candidate: bool, hr: bool) -> Viewer {
        let user_id = Uuid::new_v4();
        Viewer {
            user: User {
                id: user_id,
                email: "someone@example.com".to_string(),
                is_staff,
                created_at: Utc::now(),
            },
            candidate_id: candidate.then(Uuid::new_v4),
            hr: hr.then(|| HrRow {
                id: Uuid::new_v4(),
                user_id,
                company_id: Uuid::new_v4(),
            }),
        }
    }

    #[test]
    fn test_staff_sees_all_candidates() {
        assert_eq!(viewer(true, false, false).candidate_scope(), Scope::All);
    }

    #[test]
    fn test_candidate_sees_only_self() {
        let v = viewer(false, true, false);
        assert_eq!(v.candidate_scope(), Scope::Only(v.candidate_id.unwrap()));
        assert_eq!(v.role(), Role::Candidate);
    }

    #[test]
    fn test_guest_sees_no_candidates() {
        let v = viewer(false, false, false);
        assert_eq!(v.candidate_scope(), Scope::Nothing);
        assert_eq!(v.role(), Role::Guest);
    }

    #[test]
    fn test_hr_vacancies_scoped_to_company() {
        let v = viewer(false, false, true);
        let company_id = v.hr.as_ref().unwrap().company_id;
        assert_eq!(v.vacancy_company_scope(), Scope::Only(company_id));
        assert_eq!(viewer(false, true, false).vacancy_company_scope(), Scope::All);
    }

    #[test]
    fn test_feedback_scope_requires_hr() {
        assert_eq!(viewer(true, false, false).feedback_scope(), Scope::Nothing);
        let v = viewer(false, false, true);
        assert_eq!(v.feedback_scope(), Scope::Only(v.hr.as_ref().unwrap().id));
    }

    #[test]
    fn test_role_guards() {
        let hr = viewer(false, false, true);
        assert!(hr.require_hr().is_ok());
        assert!(hr.require_candidate().is_err());
        assert!(hr.require_staff().is_err());
        assert!(viewer(true, false, false).require_staff().is_ok());
    }

    #[test]
    fn test_can_edit_candidate() {
        let v = viewer(false, true, false);
        assert!(v.can_edit_candidate(v.candidate_id.unwrap()));
        assert!(!v.can_edit_candidate(Uuid::new_v4()));
        assert!(viewer(true, false, false).can_edit_candidate(Uuid::new_v4()));
    }

    #[test]
    fn test_candidate_cannot_see_another_candidate() {
        let alice = viewer(false, true, false);
        let bob = viewer(false, true, false);
        let alice_id = alice.candidate_id.unwrap();
        let bob_id = bob.candidate_id.unwrap();

        assert!(alice.candidate_scope().permits(alice_id));
        assert!(!bob.candidate_scope().permits(alice_id));
        assert!(bob.candidate_scope().permits(bob_id));
        assert!(viewer(true, false, false).candidate_scope().permits(alice_id));
        assert!(!viewer(false, false, true).candidate_scope().permits(alice_id));
    }

    #[test]
    fn test_scope_filter_id() {
        let id = Uuid::new_v4();
        assert_eq!(Scope::Only(id).filter_id(), Some(id));
        assert_eq!(Scope::All.filter_id(), None);
    }
}
