//! # safeset: a thread-safe, observable set
//!
//! [`SafeSet`] is a set of unique elements that many threads may read and
//! mutate concurrently. Every mutation is reported to the registered
//! subscribers as a [`ChangeEvent`], synchronously and under the same lock
//! that protects the elements.
//!
//! ## Quick Start
//!
//! ```rust
//! use safeset::prelude::*;
//!
//! let set = SafeSet::new();
//! set
//!   .subscribe(|sender, event: &ChangeEvent<u32>| println!("{sender}: {:?} {:?}", event.kind, event.items))
//!   .unwrap();
//!
//! set.add_many([1, 2]).unwrap();
//! set.remove_one(&1).unwrap();
//! assert_eq!(set.snapshot().unwrap(), vec![2]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SafeSet`] | The container and its lock discipline |
//! | [`ChangeEvent`] / [`ChangeKind`] | What changed and how |
//! | [`Subscriber`] | Consumer of change events |
//! | [`SubscriptionId`] | Handle to cancel a subscription |
//! | [`SafeSetConfig`] | Construction-time options |
//!
//! ## Feature Flags
//!
//! - **`serde`**: `Serialize`/`Deserialize` for [`SafeSetConfig`]
//!
//! [`SafeSet`]: set::SafeSet
//! [`ChangeEvent`]: event::ChangeEvent
//! [`ChangeKind`]: event::ChangeKind
//! [`Subscriber`]: subscriber::Subscriber
//! [`SubscriptionId`]: subscription::SubscriptionId
//! [`SafeSetConfig`]: config::SafeSetConfig

pub mod config;
pub mod error;
pub mod event;
pub mod prelude;
pub mod set;
pub mod subscriber;
pub mod subscription;

// Re-export the prelude module
pub use prelude::*;

#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
