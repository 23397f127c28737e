//! Batch loading of requirement sets from a data source.

mod batch;
mod simulated;
mod source;

pub use batch::BatchLoader;
pub use simulated::SimulatedSource;
pub use source::DataSource;
