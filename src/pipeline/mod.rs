mod enrich;
mod export;
mod fallback;
mod merge;
mod refresh;

pub use export::export_snapshot;
pub use refresh::{Pipeline, RefreshReport};
