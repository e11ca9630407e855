mod client;
mod graphql;
pub mod pagination;
pub mod rate_limit;
pub mod transport;

#[cfg(test)]
pub mod testing;

pub use client::{GithubClient, Repository};
pub use transport::Transport;
