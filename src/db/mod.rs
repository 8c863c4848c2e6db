mod repository;
mod schema;

pub use repository::{PurgeCounts, Repository};
