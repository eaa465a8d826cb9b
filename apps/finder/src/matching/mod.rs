// Candidate/vacancy matching: snapshot loading, scoring, ranking, and the
// recommendation endpoints built on them.

pub mod handlers;
pub mod profile;
pub mod ranking;
pub mod scoring;
