//! Concrete identity resolvers.
//!
//! Each submodule wraps a single external API and implements
//! [`IdentityResolver`](super::IdentityResolver) and
//! [`ImageFetcher`](super::ImageFetcher).

pub mod tmdb;

pub use tmdb::TmdbProvider;
