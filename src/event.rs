//! Change notifications delivered to subscribers.

/// Classification of a single notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
  /// Items were inserted into the set.
  Added,
  /// The single item passed to `add_one` was already present.
  AlreadyPresent,
  /// Items were removed from the set.
  Removed,
  /// The single item passed to `remove_one` was not present.
  NotFound,
  /// The set was emptied.
  Cleared,
  /// Synthetic delivery of the current contents to a new subscriber.
  NoChange,
}

impl ChangeKind {
  /// True for kinds that report an actual change of the contents.
  ///
  /// `Added` and `Removed` count even when a batch delta turned out empty.
  pub fn is_mutation(self) -> bool {
    matches!(self, ChangeKind::Added | ChangeKind::Removed | ChangeKind::Cleared)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      ChangeKind::Added => "added",
      ChangeKind::AlreadyPresent => "already_present",
      ChangeKind::Removed => "removed",
      ChangeKind::NotFound => "not_found",
      ChangeKind::Cleared => "cleared",
      ChangeKind::NoChange => "no_change",
    }
  }
}

/// What changed and how.
///
/// `items` holds copies of the affected elements: the inserted or removed
/// delta, the single probed item for `AlreadyPresent`/`NotFound`, the whole
/// contents for `NoChange`, and nothing for `Cleared`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent<T> {
  pub items: Vec<T>,
  pub kind: ChangeKind,
  /// Contents before the change, when the set is configured to include them.
  pub previous: Option<Vec<T>>,
}

impl<T> ChangeEvent<T> {
  #[inline]
  pub fn new(items: Vec<T>, kind: ChangeKind) -> Self { Self { items, kind, previous: None } }

  #[inline]
  pub fn cleared() -> Self { Self::new(Vec::new(), ChangeKind::Cleared) }

  #[inline]
  pub fn initial(items: Vec<T>) -> Self { Self::new(items, ChangeKind::NoChange) }

  #[must_use]
  pub fn with_previous(mut self, previous: Option<Vec<T>>) -> Self {
    self.previous = previous;
    self
  }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }
}
