//! Shared test utilities for domain testing
//!
//! This crate provides reusable test infrastructure for all domain crates:
//! - `TestDataBuilder`: Deterministic test data generation
//! - `TestStore`: In-memory backing store with seeding helpers
//! - `init_test_tracing`: Development-mode tracing and color-eyre reports for test binaries
//! - `assertions`: `Outcome` assertion helpers
//!
//! # Usage
//!
//! ```rust,ignore
//! use test_utils::{TestDataBuilder, TestStore};
//!
//! #[tokio::test]
//! async fn my_handler_test() {
//!     let store = TestStore::new().with_rows(vec![department]);
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let user_id = builder.user_id();
//!     let team_code = builder.code("CREW", 1);
//! }
//! ```

use std::sync::Once;

use core_config::Environment;
use database::{Entity, Store};
use uuid::Uuid;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded random data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// This is the recommended way to create a builder for consistent test data.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_material");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a unique user ID for testing
    pub fn user_id(&self) -> Uuid {
        self.id("user")
    }

    /// Deterministic id for a labelled record
    ///
    /// The same builder and label always give the same id; different labels
    /// give different ids.
    pub fn id(&self, label: &str) -> Uuid {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        label.hash(&mut hasher);
        let high = hasher.finish();
        label.len().hash(&mut hasher);
        let low = hasher.finish();

        Uuid::from_u64_pair(high, low)
    }

    /// Generate a unique name for testing
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("my_test");
    /// let name = builder.name("crew", "main");
    /// // Returns: "test-crew-12345-main"
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Short business code such as `"MAT-4821-01"`
    pub fn code(&self, prefix: &str, n: u32) -> String {
        format!("{}-{:04}-{:02}", prefix, self.seed % 10_000, n)
    }
}

/// In-memory store pre-filled for a test
#[derive(Clone, Default)]
pub struct TestStore {
    store: Store,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows of one entity type.
    ///
    /// Panics if seeding fails; only for use in tests.
    pub fn with_rows<E: Entity>(self, rows: Vec<E>) -> Self {
        if let Err(err) = self.store.seed(rows) {
            panic!("failed to seed {}: {}", E::NAME, err);
        }
        self
    }

    pub fn store(&self) -> Store {
        self.store.clone()
    }

    /// Committed rows of `E`, query filters not applied
    pub fn row_count<E: Entity>(&self) -> usize {
        self.store
            .row_count::<E>()
            .unwrap_or_else(|err| panic!("failed to count {}: {}", E::NAME, err))
    }
}

static TRACING: Once = Once::new();

/// Install development tracing and the color-eyre report hook once per test
/// binary.
///
/// Honours `RUST_LOG`, e.g. `RUST_LOG=database=debug` to see query plans.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        core_config::tracing::install_color_eyre();
        core_config::tracing::init_tracing(&Environment::Development);
    });
}

/// Test assertion helpers
pub mod assertions {
    use mediator::Outcome;
    use uuid::Uuid;

    /// Assert that two UUIDs are equal with a nice error message
    pub fn assert_uuid_eq(actual: Uuid, expected: Uuid, context: &str) {
        assert_eq!(
            actual, expected,
            "{}: expected UUID {}, got {}",
            context, expected, actual
        );
    }

    /// Assert that an outcome succeeded and return its payload
    pub fn assert_success<T: std::fmt::Debug>(outcome: Outcome<T>, context: &str) -> T {
        assert!(
            outcome.is_success(),
            "{}: expected success, got failure '{}' {:?}",
            context,
            outcome.message(),
            outcome.errors()
        );
        outcome
            .into_data()
            .unwrap_or_else(|| panic!("{}: successful outcome without data", context))
    }

    /// Assert that an outcome failed with exactly `message`
    pub fn assert_failure<T: std::fmt::Debug>(outcome: &Outcome<T>, message: &str) {
        assert!(
            outcome.is_failure(),
            "expected failure '{}', got success {:?}",
            message,
            outcome.data()
        );
        assert_eq!(outcome.message(), message);
        assert!(outcome.data().is_none());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediator::Outcome;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.user_id(), builder2.user_id());
        assert_eq!(builder1.name("crew", "test"), builder2.name("crew", "test"));
        assert_eq!(builder1.code("MAT", 1), builder2.code("MAT", 1));
    }

    #[test]
    fn test_data_builder_from_name() {
        let builder1 = TestDataBuilder::from_test_name("my_test");
        let builder2 = TestDataBuilder::from_test_name("my_test");

        assert_eq!(builder1.user_id(), builder2.user_id());
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        // Different test names should generate different data
        assert_ne!(builder1.user_id(), builder2.user_id());
    }

    #[test]
    fn test_ids_differ_per_label() {
        let builder = TestDataBuilder::new(7);
        assert_ne!(builder.id("team"), builder.id("member"));
        assert_eq!(builder.id("team"), builder.id("team"));
    }

    #[test]
    fn test_code_format() {
        assert_eq!(TestDataBuilder::new(123_456).code("MAT", 3), "MAT-3456-03");
    }

    #[test]
    fn test_outcome_assertions() {
        let data = assertions::assert_success(Outcome::success(5), "number");
        assert_eq!(data, 5);

        assertions::assert_failure(&Outcome::<i32>::failure("Crew not found"), "Crew not found");
    }

    #[test]
    fn test_init_test_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();

        let report = eyre::eyre!("store unavailable");
        assert!(format!("{:?}", report).contains("store unavailable"));
    }
}
