use std::{
  cell::RefCell,
  collections::HashSet,
  fmt,
  hash::Hash,
  sync::atomic::{AtomicBool, AtomicU64, Ordering},
};

use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::{
  config::SafeSetConfig,
  error::{BoxError, SafeSetError},
  event::{ChangeEvent, ChangeKind},
  subscriber::{BoxedSubscriber, FallibleFn, InfallibleFn, Subscriber},
  subscription::{SubscriptionId, Subscribers},
};

// ============================================================================
// Set identity
// ============================================================================

/// Process-unique identity of a set, passed to subscribers as the sender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetId(u64);

impl SetId {
  pub(crate) fn next() -> Self {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    Self(NEXT.fetch_add(1, Ordering::Relaxed))
  }

  #[inline]
  pub fn as_raw(self) -> u64 { self.0 }
}

impl fmt::Display for SetId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "set-{}", self.0) }
}

// ============================================================================
// Re-entrancy tracking
// ============================================================================

thread_local! {
  // Sets whose subscribers are being invoked on this thread.
  static DISPATCHING: RefCell<SmallVec<[SetId; 4]>> = RefCell::new(SmallVec::new());
}

/// Marks `set` as dispatching on the current thread until dropped, including
/// when a subscriber unwinds.
struct DispatchScope {
  set: SetId,
}

impl DispatchScope {
  fn enter(set: SetId) -> Self {
    DISPATCHING.with(|sets| sets.borrow_mut().push(set));
    Self { set }
  }
}

impl Drop for DispatchScope {
  fn drop(&mut self) {
    let _ = DISPATCHING.try_with(|sets| {
      let mut sets = sets.borrow_mut();
      if let Some(pos) = sets.iter().rposition(|s| *s == self.set) {
        sets.remove(pos);
      }
    });
  }
}

fn ensure_not_dispatching(set: SetId) -> Result<(), SafeSetError> {
  let reentrant = DISPATCHING
    .try_with(|sets| sets.borrow().contains(&set))
    .unwrap_or(false);
  if reentrant {
    Err(SafeSetError::Reentrant { set })
  } else {
    Ok(())
  }
}

// ============================================================================
// SafeSet
// ============================================================================

struct Inner<T> {
  elements: HashSet<T>,
  subscribers: Subscribers<T>,
}

/// SafeSet: a thread-safe set of unique elements that notifies subscribers of
/// every change.
///
/// # Locking
///
/// A single reader/writer lock guards both the elements and the subscriber
/// list:
///
/// - Mutations (`add_one`, `add_many`, `remove_one`, `remove_many`, `clear`)
///   hold the write lock across check, update and notification, so events of
///   different calls never interleave and are ordered by lock acquisition.
/// - Reads (`snapshot`, `len`, `contains`, ...) take the read lock and return
///   copies; nothing inside the set is ever handed out by reference.
/// - `subscribe` and `unsubscribe` take the write lock, so a new subscriber
///   gets its initial state and then every later event exactly once.
///
/// The lock does not poison: a panicking subscriber unwinds through the
/// mutating call and leaves the set usable.
///
/// # Dispatch
///
/// Subscribers run synchronously on the mutating thread, in registration
/// order, while the write lock is held. The first failing subscriber stops the
/// dispatch and its error is returned; the mutation is kept.
///
/// ## Re-Entrancy Policy
///
/// A subscriber must not call back into the set that is notifying it. Such a
/// call fails with [`SafeSetError::Reentrant`] instead of deadlocking. Other
/// sets may be used freely.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use safeset::prelude::*;
///
/// let set = SafeSet::new();
/// let kinds = Arc::new(Mutex::new(vec![]));
/// let c_kinds = kinds.clone();
///
/// set
///   .subscribe(move |_, event: &ChangeEvent<i32>| c_kinds.lock().unwrap().push(event.kind))
///   .unwrap();
///
/// assert!(set.add_one(1).unwrap());
/// assert!(!set.add_one(1).unwrap());
/// assert!(set.remove_one(&1).unwrap());
///
/// assert_eq!(
///   *kinds.lock().unwrap(),
///   vec![ChangeKind::NoChange, ChangeKind::Added, ChangeKind::AlreadyPresent, ChangeKind::Removed]
/// );
/// ```
pub struct SafeSet<T> {
  id: SetId,
  config: SafeSetConfig,
  released: AtomicBool,
  state: RwLock<Option<Inner<T>>>,
}

impl<T: Eq + Hash + Clone> SafeSet<T> {
  /// Create an empty set that delivers the initial state to new subscribers.
  pub fn new() -> Self { Self::with_config(SafeSetConfig::default()) }

  pub fn with_config(config: SafeSetConfig) -> Self { Self::from_items(std::iter::empty(), config) }

  /// Create a set pre-seeded with `items`. No events are emitted for them.
  pub fn from_items(items: impl IntoIterator<Item = T>, config: SafeSetConfig) -> Self {
    let inner = Inner { elements: items.into_iter().collect(), subscribers: Subscribers::default() };
    Self {
      id: SetId::next(),
      config,
      released: AtomicBool::new(false),
      state: RwLock::new(Some(inner)),
    }
  }

  #[inline]
  pub fn id(&self) -> SetId { self.id }

  #[inline]
  pub fn config(&self) -> SafeSetConfig { self.config }

  /// True once `release` has been called.
  #[inline]
  pub fn is_released(&self) -> bool { self.released.load(Ordering::Acquire) }

  // --------------------------------------------------------------------------
  // Mutations
  // --------------------------------------------------------------------------

  /// Insert `item`. Returns `true` if it was not present.
  ///
  /// Emits `Added` or `AlreadyPresent` with `[item]`.
  pub fn add_one(&self, item: T) -> Result<bool, SafeSetError> {
    self.mutate(|elements| {
      let inserted = elements.insert(item.clone());
      let kind = if inserted { ChangeKind::Added } else { ChangeKind::AlreadyPresent };
      (inserted, ChangeEvent::new(vec![item], kind))
    })
  }

  /// Insert every absent item of `items`.
  ///
  /// Emits one `Added` event carrying only the items actually inserted, in
  /// input order. The event is emitted even when nothing was inserted.
  pub fn add_many(&self, items: impl IntoIterator<Item = T>) -> Result<(), SafeSetError> {
    self.mutate(|elements| {
      let added = items
        .into_iter()
        .filter(|item| elements.insert(item.clone()))
        .collect();
      ((), ChangeEvent::new(added, ChangeKind::Added))
    })
  }

  /// Remove `item`. Returns `true` if it was present.
  ///
  /// Emits `Removed` or `NotFound` with `[item]`.
  pub fn remove_one(&self, item: &T) -> Result<bool, SafeSetError> {
    self.mutate(|elements| {
      let removed = elements.remove(item);
      let kind = if removed { ChangeKind::Removed } else { ChangeKind::NotFound };
      (removed, ChangeEvent::new(vec![item.clone()], kind))
    })
  }

  /// Remove every present item of `items`.
  ///
  /// Emits one `Removed` event carrying only the items actually removed, in
  /// input order. The event is emitted even when nothing was removed.
  pub fn remove_many(&self, items: impl IntoIterator<Item = T>) -> Result<(), SafeSetError> {
    self.mutate(|elements| {
      let removed = items
        .into_iter()
        .filter(|item| elements.remove(item))
        .collect();
      ((), ChangeEvent::new(removed, ChangeKind::Removed))
    })
  }

  /// Remove everything. Emits `Cleared` with no items.
  pub fn clear(&self) -> Result<(), SafeSetError> {
    self.mutate(|elements| {
      elements.clear();
      ((), ChangeEvent::cleared())
    })
  }

  // --------------------------------------------------------------------------
  // Reads
  // --------------------------------------------------------------------------

  /// Point-in-time copy of all elements, in no particular order.
  pub fn snapshot(&self) -> Result<Vec<T>, SafeSetError> {
    self.read(|inner| inner.elements.iter().cloned().collect())
  }

  pub fn len(&self) -> Result<usize, SafeSetError> { self.read(|inner| inner.elements.len()) }

  pub fn is_empty(&self) -> Result<bool, SafeSetError> { self.read(|inner| inner.elements.is_empty()) }

  pub fn contains(&self, item: &T) -> Result<bool, SafeSetError> {
    self.read(|inner| inner.elements.contains(item))
  }

  pub fn subscriber_count(&self) -> Result<usize, SafeSetError> {
    self.read(|inner| inner.subscribers.len())
  }

  // --------------------------------------------------------------------------
  // Subscriptions
  // --------------------------------------------------------------------------

  /// Register a closure that cannot fail.
  pub fn subscribe<F>(&self, callback: F) -> Result<SubscriptionId, SafeSetError>
  where
    F: FnMut(SetId, &ChangeEvent<T>) + Send + Sync + 'static,
  {
    self.subscribe_with(InfallibleFn(callback))
  }

  /// Register a closure whose errors abort the dispatch they occur in.
  pub fn try_subscribe<F>(&self, callback: F) -> Result<SubscriptionId, SafeSetError>
  where
    F: FnMut(SetId, &ChangeEvent<T>) -> Result<(), BoxError> + Send + Sync + 'static,
  {
    self.subscribe_with(FallibleFn(callback))
  }

  /// Register `subscriber`.
  ///
  /// When the set emits its initial state, the subscriber first receives a
  /// `NoChange` event with the current contents, and only then joins the
  /// dispatch list. Both steps happen under the write lock, so no mutation
  /// can slip in between. If that first delivery fails, the subscriber is not
  /// registered and the error is returned.
  pub fn subscribe_with<S>(&self, subscriber: S) -> Result<SubscriptionId, SafeSetError>
  where
    S: Subscriber<T> + 'static,
  {
    let mut subscriber: BoxedSubscriber<T> = Box::new(subscriber);
    self.write(|inner| {
      let id = inner.subscribers.reserve_id();
      if self.config.emit_initial_state {
        let event = ChangeEvent::initial(inner.elements.iter().cloned().collect());
        let _scope = DispatchScope::enter(self.id);
        if let Err(source) = subscriber.on_change(self.id, &event) {
          warn!(set = %self.id, subscription = %id, error = %source, "initial state delivery failed");
          return Err(SafeSetError::Subscriber { subscription: id, source });
        }
      }
      inner.subscribers.insert(id, subscriber);
      debug!(set = %self.id, subscription = %id, "subscribed");
      Ok(id)
    })
  }

  /// Stop delivering events to `subscription`.
  ///
  /// Returns `false` if it was not registered; calling twice is harmless.
  pub fn unsubscribe(&self, subscription: SubscriptionId) -> Result<bool, SafeSetError> {
    // Dropped after the lock is released.
    let removed = self.write(|inner| Ok(inner.subscribers.remove(subscription)))?;
    if removed.is_some() {
      debug!(set = %self.id, subscription = %subscription, "unsubscribed");
    }
    Ok(removed.is_some())
  }

  // --------------------------------------------------------------------------
  // Release
  // --------------------------------------------------------------------------

  /// Drop the contents and every subscriber. Any later operation fails with
  /// [`SafeSetError::Released`].
  pub fn release(&self) -> Result<(), SafeSetError> {
    ensure_not_dispatching(self.id)?;
    let inner = {
      let mut state = self.state.write();
      let inner = state.take().ok_or(SafeSetError::Released)?;
      self.released.store(true, Ordering::Release);
      inner
    };
    debug!(
      set = %self.id,
      elements = inner.elements.len(),
      subscribers = inner.subscribers.len(),
      "released"
    );
    Ok(())
  }

  // --------------------------------------------------------------------------
  // Lock helpers
  // --------------------------------------------------------------------------

  fn read<R>(&self, f: impl FnOnce(&Inner<T>) -> R) -> Result<R, SafeSetError> {
    ensure_not_dispatching(self.id)?;
    let state = self.state.read();
    state.as_ref().map(f).ok_or(SafeSetError::Released)
  }

  fn write<R>(
    &self, f: impl FnOnce(&mut Inner<T>) -> Result<R, SafeSetError>,
  ) -> Result<R, SafeSetError> {
    ensure_not_dispatching(self.id)?;
    let mut state = self.state.write();
    let inner = state.as_mut().ok_or(SafeSetError::Released)?;
    f(inner)
  }

  /// Apply `op` and notify every subscriber, all under the write lock.
  fn mutate<R>(
    &self, op: impl FnOnce(&mut HashSet<T>) -> (R, ChangeEvent<T>),
  ) -> Result<R, SafeSetError> {
    self.write(|inner| {
      let previous = (self.config.include_previous && !inner.subscribers.is_empty())
        .then(|| inner.elements.iter().cloned().collect());
      let (result, event) = op(&mut inner.elements);
      let event = event.with_previous(previous);
      trace!(set = %self.id, kind = event.kind.as_str(), items = event.items.len(), "changed");
      self.dispatch(&mut inner.subscribers, &event)?;
      Ok(result)
    })
  }

  fn dispatch(
    &self, subscribers: &mut Subscribers<T>, event: &ChangeEvent<T>,
  ) -> Result<(), SafeSetError> {
    if subscribers.is_empty() {
      return Ok(());
    }
    let _scope = DispatchScope::enter(self.id);
    subscribers.broadcast(self.id, event).map_err(|(subscription, source)| {
      warn!(
        set = %self.id,
        subscription = %subscription,
        kind = event.kind.as_str(),
        error = %source,
        "subscriber failed"
      );
      SafeSetError::Subscriber { subscription, source }
    })
  }
}

impl<T: Eq + Hash + Clone> Default for SafeSet<T> {
  fn default() -> Self { Self::new() }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for SafeSet<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    Self::from_items(iter, SafeSetConfig::default())
  }
}

impl<T: fmt::Debug> fmt::Debug for SafeSet<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut s = f.debug_struct("SafeSet");
    s.field("id", &self.id).field("config", &self.config);
    // Never block: the caller may be a subscriber of this very set.
    match self.state.try_read() {
      Some(state) => match state.as_ref() {
        Some(inner) => s
          .field("elements", &inner.elements)
          .field("subscribers", &inner.subscribers.len()),
        None => s.field("released", &true),
      },
      None => s.field("elements", &"<locked>"),
    };
    s.finish()
  }
}
