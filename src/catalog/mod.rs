pub mod api_types;
pub mod client;
pub mod repository;
pub mod types;

pub use client::{CatalogClient, RemoteSource};
pub use repository::Repository;
pub use types::{Ability, Attribute, Category, DetailRecord, FavoriteRecord, ListItem, PageResult};
