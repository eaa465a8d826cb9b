pub mod candidate;
pub mod company;
pub mod maturity;
pub mod resume;
pub mod skill;
pub mod user;
pub mod vacancy;
