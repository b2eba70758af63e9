use std::fmt;

use smallvec::SmallVec;

use crate::{
  error::BoxError,
  event::ChangeEvent,
  set::SetId,
  subscriber::{BoxedSubscriber, Subscriber},
};

/// Handle returned by `subscribe`, used to unsubscribe later.
///
/// Ids are unique within one set and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(usize);

impl SubscriptionId {
  #[cfg(test)]
  pub(crate) fn from_raw(id: usize) -> Self { Self(id) }

  #[inline]
  pub fn as_raw(self) -> usize { self.0 }
}

impl fmt::Display for SubscriptionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// Registered subscribers of a set, kept in registration order.
///
/// # Design
///
/// - **SmallVec Optimization**: Uses `SmallVec<[_; 2]>` to avoid heap
///   allocation for the common case of 0-2 subscribers.
/// - **Pre-allocation Pattern**: `reserve_id()` + `insert()` let a subscriber
///   be handed its initial state before it becomes visible to dispatch.
pub(crate) struct Subscribers<T> {
  next_id: usize,
  items: SmallVec<[(SubscriptionId, BoxedSubscriber<T>); 2]>,
}

impl<T> Default for Subscribers<T> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<T> Subscribers<T> {
  /// Reserve the next id without registering anything.
  #[inline]
  pub fn reserve_id(&mut self) -> SubscriptionId {
    let id = SubscriptionId(self.next_id);
    self.next_id += 1;
    id
  }

  /// Register a subscriber under an id obtained from `reserve_id()`.
  #[inline]
  pub fn insert(&mut self, id: SubscriptionId, subscriber: BoxedSubscriber<T>) {
    self.items.push((id, subscriber));
  }

  /// Register a subscriber and return its id.
  #[cfg(test)]
  pub fn add(&mut self, subscriber: BoxedSubscriber<T>) -> SubscriptionId {
    let id = self.reserve_id();
    self.insert(id, subscriber);
    id
  }

  /// Remove a subscriber by id. Returns it if it was registered.
  pub fn remove(&mut self, id: SubscriptionId) -> Option<BoxedSubscriber<T>> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  #[cfg(test)]
  pub fn contains(&self, id: SubscriptionId) -> bool { self.items.iter().any(|(i, _)| *i == id) }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Deliver `event` to every subscriber in registration order.
  ///
  /// Stops at the first failing subscriber and returns its id with the error.
  pub fn broadcast(
    &mut self, sender: SetId, event: &ChangeEvent<T>,
  ) -> Result<(), (SubscriptionId, BoxError)> {
    for (id, subscriber) in self.items.iter_mut() {
      subscriber
        .on_change(sender, event)
        .map_err(|err| (*id, err))?;
    }
    Ok(())
  }
}
