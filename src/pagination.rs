//! Infinite-scroll pagination state machine driven by the repository.
//!
//! The state machine is a pure reducer `(ListState, ListEvent) -> ListState`
//! so every transition is unit-testable without an async harness. The
//! [`PaginationCoordinator`] is the thin wrapper around it: it applies the
//! guard flags, drives [`Repository::list_page`], and publishes every
//! transition on a watch channel for the presentation layer to observe.
//!
//! Guard flags are the only in-flight protection: a stale response cannot
//! corrupt newer state because a second same-scope operation never starts
//! while one is pending. No request cancellation is needed.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::catalog::client::RemoteSource;
use crate::catalog::repository::Repository;
use crate::catalog::types::ListItem;
use crate::error::LoadError;

/// Observable list-view state. A projection of the cache and the remote, not
/// a source of truth.
#[derive(Debug, Clone)]
pub struct ListState {
  /// Items accumulated across all loaded pages, in page order.
  pub items: Vec<ListItem>,
  /// An initial load or refresh is in flight.
  pub is_loading: bool,
  /// A load-more is in flight.
  pub is_loading_more: bool,
  /// Trailing error of the most recent failed operation. Never set while
  /// destroying already-accumulated items.
  pub error: Option<LoadError>,
  /// Highest page currently folded into `items`.
  pub current_page: u32,
  /// False once a batch smaller than the page size arrives.
  pub has_more: bool,
}

impl Default for ListState {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      is_loading: false,
      is_loading_more: false,
      error: None,
      current_page: 0,
      has_more: true,
    }
  }
}

impl ListState {
  fn is_busy(&self) -> bool {
    self.is_loading || self.is_loading_more
  }
}

/// Everything that can happen to the list state.
#[derive(Debug)]
pub enum ListEvent {
  /// An initial load started.
  InitialStarted,
  /// A manual refresh started; the projection resets.
  RefreshStarted,
  /// A load of the next page started.
  MoreStarted,
  /// A page arrived. `has_more` is precomputed from the batch size.
  PageLoaded {
    page: u32,
    items: Vec<ListItem>,
    has_more: bool,
  },
  /// The initial load or refresh failed. Prior items are kept.
  InitialFailed(LoadError),
  /// A load-more failed. Prior items and page are kept.
  MoreFailed(LoadError),
}

/// Pure state transition. The reducer never performs I/O.
pub fn reduce(mut state: ListState, event: ListEvent) -> ListState {
  match event {
    ListEvent::InitialStarted => {
      state.is_loading = true;
      state.error = None;
      state
    }
    ListEvent::RefreshStarted => ListState {
      is_loading: true,
      ..ListState::default()
    },
    ListEvent::MoreStarted => {
      state.is_loading_more = true;
      state.error = None;
      state
    }
    ListEvent::PageLoaded {
      page,
      items,
      has_more,
    } => {
      if state.is_loading_more {
        state.items.extend(items);
      } else {
        // Initial load or refresh replaces the projection
        state.items = items;
      }
      state.current_page = page;
      state.has_more = has_more;
      state.is_loading = false;
      state.is_loading_more = false;
      state.error = None;
      state
    }
    ListEvent::InitialFailed(err) => {
      state.is_loading = false;
      state.error = Some(err);
      state
    }
    ListEvent::MoreFailed(err) => {
      state.is_loading_more = false;
      state.error = Some(err);
      state
    }
  }
}

/// Drives paging against the repository with at most one list request in
/// flight at a time.
pub struct PaginationCoordinator<R: RemoteSource> {
  repo: Arc<Repository<R>>,
  page_size: u32,
  state: Mutex<ListState>,
  watch_tx: watch::Sender<ListState>,
}

impl<R: RemoteSource> PaginationCoordinator<R> {
  pub fn new(repo: Arc<Repository<R>>, page_size: u32) -> Self {
    let (watch_tx, _) = watch::channel(ListState::default());
    Self {
      repo,
      page_size,
      state: Mutex::new(ListState::default()),
      watch_tx,
    }
  }

  /// Observe state transitions. The receiver always holds the latest state.
  pub fn subscribe(&self) -> watch::Receiver<ListState> {
    self.watch_tx.subscribe()
  }

  /// Snapshot of the current state.
  pub async fn state(&self) -> ListState {
    self.state.lock().await.clone()
  }

  /// Load page zero, cache-first. No-op while any list request is in flight,
  /// so concurrent triggers collapse into a single fetch.
  pub async fn load_initial(&self) {
    if !self.try_start(ListEvent::InitialStarted).await {
      tracing::debug!("initial load already in flight");
      return;
    }

    let event = match self.repo.list_page(0, false).await {
      Ok(items) => self.page_loaded(0, items),
      Err(err) => ListEvent::InitialFailed(LoadError::from(&err)),
    };
    self.apply(event).await;
  }

  /// Load the next page and append it. No-op while busy or exhausted.
  pub async fn load_more(&self) {
    let next_page = {
      let mut state = self.state.lock().await;
      if state.is_busy() || !state.has_more {
        return;
      }
      let next_page = state.current_page + 1;
      *state = reduce(state.clone(), ListEvent::MoreStarted);
      let _ = self.watch_tx.send(state.clone());
      next_page
    };

    let event = match self.repo.list_page(next_page, false).await {
      Ok(items) => self.page_loaded(next_page, items),
      Err(err) => ListEvent::MoreFailed(LoadError::from(&err)),
    };
    self.apply(event).await;
  }

  /// Reset the projection and reload page zero from the network, bypassing
  /// the cache. Suppressed while an initial load is in flight (same scope).
  pub async fn refresh(&self) {
    if !self.try_start(ListEvent::RefreshStarted).await {
      tracing::debug!("refresh suppressed, load already in flight");
      return;
    }

    let event = match self.repo.list_page(0, true).await {
      Ok(items) => self.page_loaded(0, items),
      Err(err) => ListEvent::InitialFailed(LoadError::from(&err)),
    };
    self.apply(event).await;
  }

  /// Set the guard flag under the lock, before any await point. Returns
  /// false when another request already holds it.
  async fn try_start(&self, event: ListEvent) -> bool {
    let mut state = self.state.lock().await;
    if state.is_busy() {
      return false;
    }
    *state = reduce(state.clone(), event);
    let _ = self.watch_tx.send(state.clone());
    true
  }

  async fn apply(&self, event: ListEvent) {
    let mut state = self.state.lock().await;
    *state = reduce(state.clone(), event);
    let _ = self.watch_tx.send(state.clone());
  }

  /// A batch strictly smaller than the page size is the termination signal.
  fn page_loaded(&self, page: u32, items: Vec<ListItem>) -> ListEvent {
    let has_more = items.len() as u32 >= self.page_size;
    ListEvent::PageLoaded {
      page,
      items,
      has_more,
    }
  }
}
