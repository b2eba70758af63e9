//! Subscriber trait and closure adapters
//!
//! A subscriber consumes the change events of a set. Callbacks are invoked
//! synchronously on the mutating thread while the set's write lock is held.

use crate::{error::BoxError, event::ChangeEvent, set::SetId};

// ============================================================================
// Subscriber Trait
// ============================================================================

/// Consumer of a set's change events.
///
/// Returning an error stops the current dispatch; the error reaches the caller
/// of the mutating operation.
pub trait Subscriber<T>: Send + Sync {
  fn on_change(&mut self, sender: SetId, event: &ChangeEvent<T>) -> Result<(), BoxError>;
}

/// Boxed subscriber stored by a set.
pub type BoxedSubscriber<T> = Box<dyn Subscriber<T>>;

// ============================================================================
// Closure adapters
// ============================================================================

/// Adapter for a closure that cannot fail.
pub struct InfallibleFn<F>(pub F);

impl<T, F> Subscriber<T> for InfallibleFn<F>
where
  F: FnMut(SetId, &ChangeEvent<T>) + Send + Sync,
{
  #[inline]
  fn on_change(&mut self, sender: SetId, event: &ChangeEvent<T>) -> Result<(), BoxError> {
    (self.0)(sender, event);
    Ok(())
  }
}

/// Adapter for a closure that reports failures through its result.
pub struct FallibleFn<F>(pub F);

impl<T, F> Subscriber<T> for FallibleFn<F>
where
  F: FnMut(SetId, &ChangeEvent<T>) -> Result<(), BoxError> + Send + Sync,
{
  #[inline]
  fn on_change(&mut self, sender: SetId, event: &ChangeEvent<T>) -> Result<(), BoxError> {
    (self.0)(sender, event)
  }
}

impl<T, S: Subscriber<T> + ?Sized> Subscriber<T> for Box<S> {
  #[inline]
  fn on_change(&mut self, sender: SetId, event: &ChangeEvent<T>) -> Result<(), BoxError> {
    (**self).on_change(sender, event)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::event::ChangeKind;

  #[test]
  fn infallible_adapter_always_succeeds() {
    let mut seen = Vec::new();
    {
      let mut sub = InfallibleFn(|_: SetId, e: &ChangeEvent<i32>| seen.extend(e.items.iter().copied()));
      sub
        .on_change(SetId::next(), &ChangeEvent::new(vec![1, 2], ChangeKind::Added))
        .unwrap();
    }
    assert_eq!(seen, vec![1, 2]);
  }

  #[test]
  fn fallible_adapter_forwards_errors() {
    let mut sub = FallibleFn(|_: SetId, e: &ChangeEvent<i32>| -> Result<(), BoxError> {
      if e.kind == ChangeKind::Cleared {
        Err("cleared".into())
      } else {
        Ok(())
      }
    });
    assert!(sub.on_change(SetId::next(), &ChangeEvent::new(vec![1], ChangeKind::Added)).is_ok());
    let err = sub.on_change(SetId::next(), &ChangeEvent::cleared()).unwrap_err();
    assert_eq!(err.to_string(), "cleared");
  }
}
