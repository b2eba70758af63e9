//! Error types returned by [`SafeSet`](crate::set::SafeSet) operations.
//!
//! Duplicate adds and missing removes are not errors: they are reported
//! through [`ChangeKind`](crate::event::ChangeKind) and the boolean results of
//! the single-item operations.

use thiserror::Error;

use crate::{set::SetId, subscription::SubscriptionId};

/// Boxed error a fallible subscriber may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by a [`SafeSet`](crate::set::SafeSet).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SafeSetError {
  /// The set was released; no further operations are accepted.
  #[error("safe set resource already released")]
  Released,

  /// A subscriber called back into the set that is dispatching to it.
  #[error("re-entrant call into safe set {set} from one of its subscribers")]
  Reentrant {
    /// The set that was re-entered.
    set: SetId,
  },

  /// A subscriber failed while handling a change event.
  ///
  /// The mutation that produced the event has already been applied.
  #[error("subscriber {subscription} failed: {source}")]
  Subscriber {
    /// The failing subscription.
    subscription: SubscriptionId,
    /// The error returned by the subscriber.
    #[source]
    source: BoxError,
  },
}

impl SafeSetError {
  /// Returns a short stable label (snake_case) for use in logs.
  ///
  /// ```
  /// use safeset::SafeSetError;
  ///
  /// assert_eq!(SafeSetError::Released.as_label(), "safe_set_released");
  /// ```
  pub fn as_label(&self) -> &'static str {
    match self {
      SafeSetError::Released => "safe_set_released",
      SafeSetError::Reentrant { .. } => "safe_set_reentrant",
      SafeSetError::Subscriber { .. } => "safe_set_subscriber_failed",
    }
  }

  /// True if the set can no longer be used.
  pub fn is_released(&self) -> bool { matches!(self, SafeSetError::Released) }
}
