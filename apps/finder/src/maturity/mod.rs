// Digital-maturity questionnaire: tier aggregation, the transactional
// answer-write/recompute command, and its HTTP handlers.

pub mod aggregator;
pub mod handlers;
pub mod submission;
