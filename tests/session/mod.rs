//! Document session tests: lifecycle, lookups, suggestions, concurrency and
//! the workspace of open documents.

pub mod tests_concurrency;
pub mod tests_lifecycle;
pub mod tests_lookup;
