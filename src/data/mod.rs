//! Dataset sources
//!
//! The recommender is fitted from a `DatasetSource`, which yields the full
//! movie catalog and ratings table in memory. The CSV source is what the
//! server uses in production; the in-memory `Dataset` backs tests and any
//! caller that already holds the tables.
use crate::{
    error::AppResult,
    models::{Movie, Rating},
};

pub mod csv_source;

pub use csv_source::CsvDatasetSource;

/// Catalog and ratings loaded fully into memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub movies: Vec<Movie>,
    pub ratings: Vec<Rating>,
}

impl Dataset {
    pub fn new(movies: Vec<Movie>, ratings: Vec<Rating>) -> Self {
        Self { movies, ratings }
    }
}

/// Trait for anything that can produce a `Dataset`
///
/// Schema problems must surface as `AppError::DataSchema` rather than being
/// coerced into defaults.
#[cfg_attr(test, mockall::automock)]
pub trait DatasetSource: Send + Sync {
    fn load(&self) -> AppResult<Dataset>;

    /// Source name for logging
    fn name(&self) -> String;
}

impl DatasetSource for Dataset {
    fn load(&self) -> AppResult<Dataset> {
        Ok(self.clone())
    }

    fn name(&self) -> String {
        "in-memory".to_string()
    }
}
