//! Test utilities
//!
//! Census fixtures shared by unit and integration tests.


pub use fixtures::{CourseFixture, census_batch, census_dataset, mixed_records, three_records};
