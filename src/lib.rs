//! Cache-first data access for a paginated species catalog.
//!
//! This crate is the data layer behind a catalog browser: it decides between
//! the persistent local cache and the remote HTTP API, keeps the cache valid
//! across schema changes, and drives an infinite-scroll pagination state
//! machine with error recovery and manual refresh. It exposes no rendering or
//! CLI surface; a presentation layer consumes the [`Repository`] operations
//! and observes [`pagination::ListState`].
//!
//! # Example
//!
//! ```ignore
//! let config = Config::load(None)?;
//! let store = Arc::new(Store::open(&config.cache_path()?)?);
//! let client = CatalogClient::new(&config)?;
//! let repo = Arc::new(Repository::new(client, store));
//!
//! let coordinator = PaginationCoordinator::new(Arc::clone(&repo), config.page_size);
//! coordinator.load_initial().await;
//!
//! let detail = repo.detail("fernfox", false).await?;
//! repo.toggle_favorite(detail.id, &detail.key)?;
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod pagination;
pub mod store;

pub use catalog::{
  Ability, Attribute, CatalogClient, Category, DetailRecord, FavoriteRecord, ListItem, PageResult,
  RemoteSource, Repository,
};
pub use config::{Config, ConfigError};
pub use error::{Error, ErrorKind, LoadError, Result};
pub use pagination::{ListEvent, ListState, PaginationCoordinator};
pub use store::Store;
