//! Shared primitive types used across the entire engine.

/// A stable, unique identifier for a customer record.
pub type CustomerId = String;

/// A monetary amount in the dataset's currency. No currency semantics.
pub type Money = f64;

/// A percentage in [0, 100] (or [-100, 100] for NPS).
pub type Percent = f64;

/// Default minimum bucket population for a rate to be decision-grade.
pub const DEFAULT_MIN_SAMPLE_SIZE: usize = 50;
