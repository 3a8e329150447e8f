//! Serde-deserializable types matching the remote catalog API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;
use std::collections::HashSet;

use super::types::{Ability, Attribute, Category, DetailRecord, ListItem, PageResult};

// ============================================================================
// Paginated list endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiPageResponse {
  #[serde(default)]
  pub count: i64,
  pub next: Option<String>,
  pub previous: Option<String>,
  #[serde(default)]
  pub results: Vec<ApiListEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ApiListEntry {
  pub name: String,
  pub url: String,
}

// ============================================================================
// Detail endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiNamedRef {
  pub name: String,
  #[serde(default)]
  pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiCategorySlot {
  pub slot: u32,
  #[serde(rename = "type")]
  pub category: ApiNamedRef,
}

#[derive(Debug, Deserialize)]
pub struct ApiAttributeSlot {
  #[serde(rename = "base_stat")]
  pub base_value: i64,
  pub stat: ApiNamedRef,
}

#[derive(Debug, Deserialize)]
pub struct ApiAbilitySlot {
  #[serde(default)]
  pub slot: u32,
  #[serde(default)]
  pub is_hidden: bool,
  pub ability: ApiNamedRef,
}

#[derive(Debug, Deserialize)]
pub struct ApiDetailResponse {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub height: i64,
  #[serde(default)]
  pub weight: i64,
  #[serde(default)]
  pub base_experience: i64,
  #[serde(default)]
  pub types: Vec<ApiCategorySlot>,
  #[serde(default)]
  pub stats: Vec<ApiAttributeSlot>,
  #[serde(default)]
  pub abilities: Vec<ApiAbilitySlot>,
  pub species: Option<ApiNamedRef>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiPageResponse {
  /// Convert into a typed page, tagging every item with the page it was
  /// fetched under.
  pub fn into_page(self, page: u32) -> PageResult {
    PageResult {
      items: self
        .results
        .into_iter()
        .map(|entry| ListItem::new(entry.name, page, entry.url))
        .collect(),
      total_count: self.count,
    }
  }
}

impl ApiDetailResponse {
  pub fn into_record(self) -> DetailRecord {
    let mut categories: Vec<Category> = self
      .types
      .into_iter()
      .map(|t| Category {
        slot: t.slot,
        name: t.category.name,
      })
      .collect();
    categories.sort_by_key(|c| c.slot);

    // One attribute per name; the remote occasionally repeats stat entries
    let mut seen = HashSet::new();
    let attributes: Vec<Attribute> = self
      .stats
      .into_iter()
      .filter(|s| seen.insert(s.stat.name.clone()))
      .map(|s| Attribute {
        name: s.stat.name,
        value: s.base_value,
      })
      .collect();

    let mut abilities: Vec<Ability> = self
      .abilities
      .into_iter()
      .map(|a| Ability {
        name: a.ability.name,
        slot: a.slot,
        is_hidden: a.is_hidden,
      })
      .collect();
    abilities.sort_by_key(|a| a.slot);

    let evolution_ref = self.species.and_then(|s| {
      if s.url.is_empty() {
        None
      } else {
        Some(s.url)
      }
    });

    DetailRecord {
      id: self.id,
      key: self.name,
      height: self.height,
      weight: self.weight,
      base_experience: self.base_experience,
      categories,
      attributes,
      abilities,
      evolution_ref,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const DETAIL_JSON: &str = r#"{
    "id": 4,
    "name": "emberwolf",
    "height": 6,
    "weight": 85,
    "base_experience": 62,
    "types": [
      {"slot": 2, "type": {"name": "ridge", "url": ""}},
      {"slot": 1, "type": {"name": "ember", "url": ""}}
    ],
    "stats": [
      {"base_stat": 39, "stat": {"name": "hp", "url": ""}},
      {"base_stat": 52, "stat": {"name": "attack", "url": ""}},
      {"base_stat": 43, "stat": {"name": "attack", "url": ""}}
    ],
    "abilities": [
      {"slot": 1, "is_hidden": false, "ability": {"name": "blaze", "url": ""}},
      {"slot": 3, "is_hidden": true, "ability": {"name": "solar-power", "url": ""}}
    ],
    "species": {"name": "emberwolf", "url": "https://catalog.test/api/species/4/"}
  }"#;

  #[test]
  fn test_detail_categories_sorted_by_slot() {
    let api: ApiDetailResponse = serde_json::from_str(DETAIL_JSON).unwrap();
    let record = api.into_record();
    assert_eq!(record.categories[0].name, "ember");
    assert_eq!(record.categories[1].name, "ridge");
    assert_eq!(record.primary_category().unwrap().name, "ember");
  }

  #[test]
  fn test_detail_attributes_deduplicated_first_wins() {
    let api: ApiDetailResponse = serde_json::from_str(DETAIL_JSON).unwrap();
    let record = api.into_record();
    assert_eq!(record.attributes.len(), 2);
    assert_eq!(record.attributes[1].name, "attack");
    assert_eq!(record.attributes[1].value, 52);
  }

  #[test]
  fn test_detail_evolution_ref_from_species() {
    let api: ApiDetailResponse = serde_json::from_str(DETAIL_JSON).unwrap();
    let record = api.into_record();
    assert_eq!(
      record.evolution_ref.as_deref(),
      Some("https://catalog.test/api/species/4/")
    );
  }

  #[test]
  fn test_detail_missing_optional_fields() {
    let api: ApiDetailResponse =
      serde_json::from_str(r#"{"id": 9, "name": "tideback"}"#).unwrap();
    let record = api.into_record();
    assert_eq!(record.key, "tideback");
    assert!(record.categories.is_empty());
    assert!(record.evolution_ref.is_none());
  }

  #[test]
  fn test_page_response_tags_items_with_page() {
    let api: ApiPageResponse = serde_json::from_str(
      r#"{
        "count": 1302,
        "next": "https://catalog.test/api/catalog/items?offset=40&limit=20",
        "previous": null,
        "results": [
          {"name": "fernfox", "url": "https://catalog.test/api/catalog/items/1/"},
          {"name": "emberwolf", "url": "https://catalog.test/api/catalog/items/4/"}
        ]
      }"#,
    )
    .unwrap();

    let page = api.into_page(1);
    assert_eq!(page.total_count, 1302);
    assert_eq!(page.items.len(), 2);
    assert!(page.items.iter().all(|i| i.page == 1));
    assert_eq!(page.items[0].key, "fernfox");
  }
}
