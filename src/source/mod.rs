mod client;
mod comments;
#[cfg(test)]
pub mod testing;

pub use client::{HnClient, ItemSource};
pub use comments::fetch_comment_tree;
