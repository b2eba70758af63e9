//! Construction-time configuration of a [`SafeSet`](crate::set::SafeSet).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options fixed when a set is built.
///
/// ```
/// use safeset::SafeSetConfig;
///
/// let config = SafeSetConfig::default().emit_initial_state(false).include_previous(true);
/// assert!(!config.emits_initial_state());
/// assert!(config.includes_previous());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SafeSetConfig {
  /// Deliver a `NoChange` event with the current contents to every new
  /// subscriber before it is registered.
  pub emit_initial_state: bool,
  /// Attach a copy of the contents before the change to every mutation event.
  pub include_previous: bool,
}

impl Default for SafeSetConfig {
  fn default() -> Self { Self { emit_initial_state: true, include_previous: false } }
}

impl SafeSetConfig {
  #[must_use]
  pub fn emit_initial_state(mut self, enabled: bool) -> Self {
    self.emit_initial_state = enabled;
    self
  }

  #[must_use]
  pub fn include_previous(mut self, enabled: bool) -> Self {
    self.include_previous = enabled;
    self
  }

  #[inline]
  pub fn emits_initial_state(&self) -> bool { self.emit_initial_state }

  #[inline]
  pub fn includes_previous(&self) -> bool { self.include_previous }
}
