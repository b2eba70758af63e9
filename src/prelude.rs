//! Prelude module for convenient imports

pub use crate::{
  config::SafeSetConfig,
  error::{BoxError, SafeSetError},
  event::{ChangeEvent, ChangeKind},
  set::{SafeSet, SetId},
  subscriber::{BoxedSubscriber, FallibleFn, InfallibleFn, Subscriber},
  subscription::SubscriptionId,
};
