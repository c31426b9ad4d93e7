//! Bar sources: Yahoo chart API, CSV files, synthetic generators, and the
//! scheduled feed that pushes their bars to the UI.

pub mod circuit_breaker;
pub mod csv_io;
pub mod feed;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

use std::path::Path;
use std::sync::Arc;

pub use circuit_breaker::CircuitBreaker;
pub use csv_io::{read_bars, write_bars, CsvProvider};
pub use feed::{FeedCommand, FeedHandle, FeedOptions, FeedUpdate};
pub use provider::{BarProvider, DataError, DataSource, FetchResult};
pub use synthetic::{sample_bars, SampleProvider, SyntheticProvider};
pub use yahoo::YahooProvider;

/// Build the provider for a configured source. `csv_dir` is only used by `Csv`.
pub fn provider_for(source: DataSource, seed: u64, csv_dir: &Path) -> Result<Box<dyn BarProvider>, DataError> {
    Ok(match source {
        DataSource::Yahoo => Box::new(YahooProvider::new(Arc::new(CircuitBreaker::default_provider()))?),
        DataSource::Csv => Box::new(CsvProvider::new(csv_dir)),
        DataSource::Synthetic => Box::new(SyntheticProvider::new(seed)),
        DataSource::Sample => Box::new(SampleProvider),
    })
}
