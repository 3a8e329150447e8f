//! Cache-first repository over the remote source and the local store.
//!
//! Single entry point for the presentation layer: list pages, detail lookups,
//! and the favorites set. Reads prefer the local store; the network is only
//! consulted on a miss or an explicit refresh, and every successful fetch is
//! written back best-effort.

use chrono::Utc;
use std::sync::Arc;

use crate::error::Result;
use crate::store::Store;

use super::client::RemoteSource;
use super::types::{DetailRecord, ListItem};

pub struct Repository<R: RemoteSource> {
  remote: R,
  store: Arc<Store>,
}

impl<R: RemoteSource> Repository<R> {
  /// The store handle is injected so its lifetime stays with the caller;
  /// the repository itself holds no cached state.
  pub fn new(remote: R, store: Arc<Store>) -> Self {
    Self { remote, store }
  }

  /// One page of list items, cache-first.
  ///
  /// With `force_refresh = false` a cached page is returned without touching
  /// the network, so repeated calls for the same page fetch at most once.
  /// A failed cache write after a successful fetch is logged and swallowed;
  /// the fetched items are still returned.
  pub async fn list_page(&self, page: u32, force_refresh: bool) -> Result<Vec<ListItem>> {
    if !force_refresh {
      let cached = self.store.get_page(page)?;
      if !cached.is_empty() {
        tracing::debug!(page, items = cached.len(), "serving page from cache");
        return Ok(cached);
      }
    }

    let fetched = self.remote.fetch_page(page).await?;
    let mut items = fetched.items;

    if let Err(err) = self.store.put_page(&items) {
      tracing::warn!(page, %err, "failed to cache fetched page");
    }
    self.annotate_favorites(&mut items);

    Ok(items)
  }

  /// Full detail record for a key, cache-first with the same policy as
  /// [`Repository::list_page`].
  pub async fn detail(&self, key: &str, force_refresh: bool) -> Result<DetailRecord> {
    if !force_refresh {
      if let Some(cached) = self.store.get_detail(key)? {
        tracing::debug!(key, "serving detail from cache");
        return Ok(cached);
      }
    }

    let record = self.remote.fetch_detail(key).await?;

    if let Err(err) = self.store.put_detail(&record) {
      tracing::warn!(key, %err, "failed to cache fetched detail");
    }

    Ok(record)
  }

  /// Flip the favorite state for an id. Returns the new state. Two calls in
  /// sequence restore the original state.
  pub fn toggle_favorite(&self, id: i64, key: &str) -> Result<bool> {
    if self.store.is_favorite(id)? {
      self.store.remove_favorite(id)?;
      Ok(false)
    } else {
      self
        .store
        .add_favorite(id, key, Utc::now().timestamp_millis())?;
      Ok(true)
    }
  }

  /// Favorited items joined with their cached list rows, most recently added
  /// first, each annotated `is_favorite = true`.
  pub fn favorites(&self) -> Result<Vec<ListItem>> {
    self.store.list_favorite_items()
  }

  /// Best-effort favorite annotation for freshly fetched items. A store read
  /// failure leaves the flags unset rather than failing the fetch.
  fn annotate_favorites(&self, items: &mut [ListItem]) {
    match self.store.favorite_keys() {
      Ok(keys) => {
        for item in items.iter_mut() {
          item.is_favorite = keys.contains(&item.key);
        }
      }
      Err(err) => tracing::warn!(%err, "failed to annotate favorites"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::types::PageResult;
  use crate::error::Error;
  use async_trait::async_trait;
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicUsize, Ordering};

  struct MockRemote {
    pages: HashMap<u32, Vec<ListItem>>,
    detail: Option<DetailRecord>,
    fail: bool,
    page_calls: AtomicUsize,
    detail_calls: AtomicUsize,
  }

  impl MockRemote {
    fn with_pages(pages: HashMap<u32, Vec<ListItem>>) -> Self {
      Self {
        pages,
        detail: None,
        fail: false,
        page_calls: AtomicUsize::new(0),
        detail_calls: AtomicUsize::new(0),
      }
    }

    fn failing() -> Self {
      Self {
        pages: HashMap::new(),
        detail: None,
        fail: true,
        page_calls: AtomicUsize::new(0),
        detail_calls: AtomicUsize::new(0),
      }
    }
  }

  #[async_trait]
  impl RemoteSource for MockRemote {
    async fn fetch_page(&self, page: u32) -> Result<PageResult> {
      self.page_calls.fetch_add(1, Ordering::SeqCst);
      if self.fail {
        return Err(Error::Connection("remote disabled".into()));
      }
      Ok(PageResult {
        items: self.pages.get(&page).cloned().unwrap_or_default(),
        total_count: 1302,
      })
    }

    async fn fetch_detail(&self, key: &str) -> Result<DetailRecord> {
      self.detail_calls.fetch_add(1, Ordering::SeqCst);
      if self.fail {
        return Err(Error::Connection("remote disabled".into()));
      }
      self
        .detail
        .clone()
        .ok_or_else(|| Error::NotFound(key.to_string()))
    }
  }

  fn item(key: &str, page: u32) -> ListItem {
    ListItem::new(key, page, format!("https://catalog.test/api/catalog/items/{}/", key))
  }

  fn detail_record(id: i64, key: &str) -> DetailRecord {
    DetailRecord {
      id,
      key: key.into(),
      height: 7,
      weight: 69,
      base_experience: 64,
      categories: vec![],
      attributes: vec![],
      abilities: vec![],
      evolution_ref: None,
    }
  }

  fn repo(remote: MockRemote) -> Repository<MockRemote> {
    Repository::new(remote, Arc::new(Store::open_in_memory().unwrap()))
  }

  #[tokio::test]
  async fn test_cold_start_fetches_exactly_once() {
    let mut pages = HashMap::new();
    pages.insert(0, vec![item("fernfox", 0)]);
    let repo = repo(MockRemote::with_pages(pages));

    let items = repo.list_page(0, false).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(repo.remote.page_calls.load(Ordering::SeqCst), 1);

    // Second read is served from cache
    let items = repo.list_page(0, false).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(repo.remote.page_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_cached_page_never_touches_network() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    store.put_page(&[item("fernfox", 2)]).unwrap();

    // A remote that fails on any call proves the short-circuit
    let repo = Repository::new(MockRemote::failing(), store);

    let items = repo.list_page(2, false).await.unwrap();
    assert_eq!(items[0].key, "fernfox");
    assert_eq!(repo.remote.page_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_force_refresh_bypasses_and_overwrites_cache() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    store.put_page(&[item("stale-entry", 0)]).unwrap();

    let mut pages = HashMap::new();
    pages.insert(0, vec![item("fernfox", 0), item("emberwolf", 0)]);
    let repo = Repository::new(MockRemote::with_pages(pages), Arc::clone(&store));

    let items = repo.list_page(0, true).await.unwrap();
    assert_eq!(repo.remote.page_calls.load(Ordering::SeqCst), 1);
    assert_eq!(items.len(), 2);

    // Cache now holds the fresh result alongside the stale key
    let cached = store.get_page(0).unwrap();
    assert!(cached.iter().any(|i| i.key == "fernfox"));
  }

  #[tokio::test]
  async fn test_remote_error_surfaces_on_cache_miss() {
    let repo = repo(MockRemote::failing());
    let err = repo.list_page(0, false).await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
  }

  #[tokio::test]
  async fn test_detail_cache_first() {
    let mut remote = MockRemote::with_pages(HashMap::new());
    remote.detail = Some(detail_record(1, "fernfox"));
    let repo = repo(remote);

    let record = repo.detail("fernfox", false).await.unwrap();
    assert_eq!(record.id, 1);
    assert_eq!(repo.remote.detail_calls.load(Ordering::SeqCst), 1);

    let record = repo.detail("fernfox", false).await.unwrap();
    assert_eq!(record.id, 1);
    assert_eq!(repo.remote.detail_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_fetch_survives_cache_write_failure() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    store.close();

    let mut pages = HashMap::new();
    pages.insert(0, vec![item("fernfox", 0)]);
    let repo = Repository::new(MockRemote::with_pages(pages), store);

    // Availability over cache completeness: the write fails, the read succeeds
    let items = repo.list_page(0, true).await.unwrap();
    assert_eq!(items.len(), 1);
  }

  #[tokio::test]
  async fn test_toggle_favorite_is_involutive() {
    let repo = repo(MockRemote::with_pages(HashMap::new()));
    repo.store.put_page(&[item("fernfox", 0)]).unwrap();

    assert!(repo.toggle_favorite(1, "fernfox").unwrap());
    assert!(repo.store.is_favorite(1).unwrap());
    assert_eq!(repo.favorites().unwrap().len(), 1);
    assert!(repo.favorites().unwrap()[0].is_favorite);

    assert!(!repo.toggle_favorite(1, "fernfox").unwrap());
    assert!(!repo.store.is_favorite(1).unwrap());
    assert!(repo.favorites().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_fresh_fetch_annotated_with_favorites() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    store.add_favorite(1, "fernfox", 1_000).unwrap();

    let mut pages = HashMap::new();
    pages.insert(0, vec![item("fernfox", 0), item("emberwolf", 0)]);
    let repo = Repository::new(MockRemote::with_pages(pages), store);

    let items = repo.list_page(0, false).await.unwrap();
    assert!(items.iter().find(|i| i.key == "fernfox").unwrap().is_favorite);
    assert!(!items.iter().find(|i| i.key == "emberwolf").unwrap().is_favorite);
  }
}
