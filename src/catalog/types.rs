use serde::{Deserialize, Serialize};

/// A single entry of the paginated catalog list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
  /// Stable catalog identifier, unique across all cached pages.
  pub key: String,
  /// Zero-based page this item was last fetched under.
  pub page: u32,
  /// Opaque locator from the remote; carries the numeric identity.
  pub url: String,
  /// Whether the item is currently in the favorites set.
  pub is_favorite: bool,
}

impl ListItem {
  pub fn new(key: impl Into<String>, page: u32, url: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      page,
      url: url.into(),
      is_favorite: false,
    }
  }

  /// Numeric catalog identity, parsed from the trailing path segment of `url`.
  ///
  /// The remote encodes it as `.../catalog/items/{id}/`; returns `None` when
  /// the locator carries no numeric segment.
  pub fn catalog_id(&self) -> Option<i64> {
    self
      .url
      .split('/')
      .rev()
      .find(|segment| !segment.is_empty())
      .and_then(|segment| segment.parse().ok())
  }

  /// Locator for the display artwork of this entry, derived from the id.
  pub fn artwork_ref(&self) -> Option<String> {
    self.catalog_id().map(|id| format!("artwork/{}.png", id))
  }
}

/// A named category of a catalog entry, ordered by slot.
///
/// Slot 1 is the primary category and determines presentation styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub slot: u32,
  pub name: String,
}

/// A named numeric stat. Detail records carry one entry per attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
  pub name: String,
  pub value: i64,
}

/// A named ability of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
  pub name: String,
  pub slot: u32,
  pub is_hidden: bool,
}

/// Full detail record for one catalog entry.
///
/// Structured sub-objects are always typed in memory; serialization only
/// happens at the store boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRecord {
  pub id: i64,
  pub key: String,
  pub height: i64,
  pub weight: i64,
  pub base_experience: i64,
  /// Ordered by slot; slot 1 first.
  pub categories: Vec<Category>,
  /// Ordered, no duplicate names.
  pub attributes: Vec<Attribute>,
  pub abilities: Vec<Ability>,
  /// Locator of the evolution chain, when the remote provides one.
  pub evolution_ref: Option<String>,
}

impl DetailRecord {
  /// The slot-1 category, used for primary styling.
  pub fn primary_category(&self) -> Option<&Category> {
    self.categories.iter().find(|c| c.slot == 1)
  }
}

/// A favorites-set entry. Display order is `added_at_epoch_ms` descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteRecord {
  pub id: i64,
  pub key: String,
  pub added_at_epoch_ms: i64,
}

/// One page of list items as returned by the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
  pub items: Vec<ListItem>,
  /// Total entries in the remote catalog, for cross-validation.
  pub total_count: i64,
}
