// Plain CRUD over the recruiting entities. Every handler resolves the caller
// through `access` and filters rows by the caller's role.

pub mod candidates;
pub mod companies;
pub mod feedback;
pub mod hrs;
pub mod profile;
pub mod resumes;
pub mod skills;
pub mod users;
pub mod vacancies;
