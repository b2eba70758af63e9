//! Property-based invariant tests for SafeSet.
//!
//! For any sequence of operations:
//!
//! 1. `snapshot()` never contains duplicates.
//! 2. Return values and events match a plain `HashSet` model.
//! 3. Exactly one event is emitted per mutating call.
//! 4. A mirror rebuilt from the events equals the final contents.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex},
};

use proptest::prelude::*;
use safeset::prelude::*;

#[derive(Clone, Debug)]
enum Op {
  AddOne(u8),
  AddMany(Vec<u8>),
  RemoveOne(u8),
  RemoveMany(Vec<u8>),
  Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
  prop_oneof![
    4 => any::<u8>().prop_map(Op::AddOne),
    2 => proptest::collection::vec(any::<u8>(), 0..8).prop_map(Op::AddMany),
    4 => any::<u8>().prop_map(Op::RemoveOne),
    2 => proptest::collection::vec(any::<u8>(), 0..8).prop_map(Op::RemoveMany),
    1 => Just(Op::Clear),
  ]
}

/// Expected event for `op` applied to `model`, updating the model.
fn apply_model(model: &mut HashSet<u8>, op: &Op) -> ChangeEvent<u8> {
  match op {
    Op::AddOne(v) => {
      let kind = if model.insert(*v) { ChangeKind::Added } else { ChangeKind::AlreadyPresent };
      ChangeEvent::new(vec![*v], kind)
    }
    Op::AddMany(vs) => {
      ChangeEvent::new(vs.iter().copied().filter(|v| model.insert(*v)).collect(), ChangeKind::Added)
    }
    Op::RemoveOne(v) => {
      let kind = if model.remove(v) { ChangeKind::Removed } else { ChangeKind::NotFound };
      ChangeEvent::new(vec![*v], kind)
    }
    Op::RemoveMany(vs) => {
      ChangeEvent::new(vs.iter().copied().filter(|v| model.remove(v)).collect(), ChangeKind::Removed)
    }
    Op::Clear => {
      model.clear();
      ChangeEvent::cleared()
    }
  }
}

proptest! {
  #[test]
  fn events_and_contents_follow_the_model(ops in proptest::collection::vec(op_strategy(), 0..64)) {
    let set = SafeSet::with_config(SafeSetConfig::default().emit_initial_state(false));
    let log = Arc::new(Mutex::new(vec![]));
    let c_log = log.clone();
    set.subscribe(move |_, event: &ChangeEvent<u8>| c_log.lock().unwrap().push(event.clone())).unwrap();

    let mut model = HashSet::new();
    let mut expected_events = vec![];
    for op in &ops {
      let before = model.clone();
      expected_events.push(apply_model(&mut model, op));
      match op {
        Op::AddOne(v) => prop_assert_eq!(set.add_one(*v).unwrap(), !before.contains(v)),
        Op::AddMany(vs) => set.add_many(vs.clone()).unwrap(),
        Op::RemoveOne(v) => prop_assert_eq!(set.remove_one(v).unwrap(), before.contains(v)),
        Op::RemoveMany(vs) => set.remove_many(vs.clone()).unwrap(),
        Op::Clear => set.clear().unwrap(),
      }

      let snapshot = set.snapshot().unwrap();
      let unique: HashSet<u8> = snapshot.iter().copied().collect();
      prop_assert_eq!(unique.len(), snapshot.len());
      prop_assert_eq!(&unique, &model);
    }

    prop_assert_eq!(&*log.lock().unwrap(), &expected_events);
  }

  #[test]
  fn initial_state_matches_contents(items in proptest::collection::vec(any::<u16>(), 0..32)) {
    let set: SafeSet<u16> = items.iter().copied().collect();
    let log = Arc::new(Mutex::new(vec![]));
    let c_log = log.clone();
    set.subscribe(move |_, event: &ChangeEvent<u16>| c_log.lock().unwrap().push(event.clone())).unwrap();

    let log = log.lock().unwrap();
    prop_assert_eq!(log.len(), 1);
    prop_assert_eq!(log[0].kind, ChangeKind::NoChange);
    let delivered: HashSet<u16> = log[0].items.iter().copied().collect();
    prop_assert_eq!(delivered.len(), log[0].items.len());
    prop_assert_eq!(delivered, items.into_iter().collect::<HashSet<_>>());
  }
}
