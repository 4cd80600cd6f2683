//! Property-based tests for the playback controller
//!
//! Uses proptest to check queue bookkeeping against a plain `Vec` model and
//! to check state machine invariants under arbitrary command/signal mixes.

mod common;

use common::{item, names, Harness};
use proptest::prelude::*;
use segue_playback::{EndOfItemRule, EngineFailure, PlaybackConfig, PlaybackState};
use std::time::Duration;

// ===== Helpers =====

const NAMES: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Clone)]
enum QueueOp {
    Insert(usize, usize),
    DequeueAt(usize),
    DequeueByValue(usize),
    Move(usize, usize),
}

fn queue_op() -> impl Strategy<Value = QueueOp> {
    prop_oneof![
        (0..NAMES.len(), 0usize..12).prop_map(|(name, index)| QueueOp::Insert(name, index)),
        (0usize..12).prop_map(QueueOp::DequeueAt),
        (0..NAMES.len()).prop_map(QueueOp::DequeueByValue),
        (0usize..12, 0usize..12).prop_map(|(from, to)| QueueOp::Move(from, to)),
    ]
}

#[derive(Debug, Clone)]
enum Step {
    Play,
    Pause,
    Stop,
    Next,
    Current,
    Previous,
    BeginSeek,
    Seek(f64),
    EndSeek,
    Enqueue(usize),
    DequeueAt(usize),
    Clear,
    Ready,
    Fail,
    Stall,
    ReachEnd,
    ExpireGrant,
    Tick,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Play),
        Just(Step::Pause),
        Just(Step::Stop),
        Just(Step::Next),
        Just(Step::Current),
        Just(Step::Previous),
        Just(Step::BeginSeek),
        (-2.0f64..3.0).prop_map(Step::Seek),
        Just(Step::EndSeek),
        (0..NAMES.len()).prop_map(Step::Enqueue),
        (0usize..6).prop_map(Step::DequeueAt),
        Just(Step::Clear),
        Just(Step::Ready),
        Just(Step::Fail),
        Just(Step::Stall),
        Just(Step::ReachEnd),
        Just(Step::ExpireGrant),
        Just(Step::Tick),
    ]
}

fn end_rule() -> impl Strategy<Value = EndOfItemRule> {
    prop_oneof![
        Just(EndOfItemRule::PlayNext),
        Just(EndOfItemRule::Stop),
        Just(EndOfItemRule::Repeat),
    ]
}

fn apply(h: &mut Harness, step: &Step) {
    let has_sink = !h.engine.lock().unwrap().sinks.is_empty();

    match step {
        Step::Play => h.controller.play(),
        Step::Pause => h.controller.pause(),
        Step::Stop => h.controller.stop(),
        Step::Next => {
            h.controller.play_next_item();
        }
        Step::Current => {
            h.controller.play_current_item();
        }
        Step::Previous => {
            h.controller.play_previous_item();
        }
        Step::BeginSeek => h.controller.begin_seeking(),
        Step::Seek(progress) => h.controller.seek_to_progress(*progress, None),
        Step::EndSeek => h.controller.end_seeking(),
        Step::Enqueue(name) => h.controller.enqueue(item(NAMES[*name])),
        Step::DequeueAt(index) => {
            h.controller.dequeue_at(*index);
        }
        Step::Clear => h.controller.clear(),
        Step::Ready if has_sink => h.ready(),
        Step::Fail if has_sink => h.fail(EngineFailure::ItemFailed("boom".into())),
        Step::Stall if has_sink => h.stall(),
        Step::ReachEnd if has_sink => h.reach_end(),
        Step::ExpireGrant => {
            let notice = h.grants.lock().unwrap().notices.pop();
            if let Some(notice) = notice {
                notice.expire();
                h.pump();
            }
        }
        Step::Tick => h.controller.tick(),
        Step::Ready | Step::Fail | Step::Stall | Step::ReachEnd => {}
    }
}

// ===== Property Tests =====

proptest! {
    /// Property: snapshot mirrors a Vec model after any edit sequence
    #[test]
    fn snapshot_matches_model(ops in prop::collection::vec(queue_op(), 1..40)) {
        let mut h = Harness::new();
        let mut model: Vec<&str> = Vec::new();

        for op in ops {
            match op {
                QueueOp::Insert(name, index) => {
                    h.controller.insert(item(NAMES[name]), index);
                    model.insert(index.min(model.len()), NAMES[name]);
                }
                QueueOp::DequeueAt(index) => {
                    let removed = h.controller.dequeue_at(index);
                    prop_assert_eq!(removed.is_some(), index < model.len());
                    if index < model.len() {
                        model.remove(index);
                    }
                }
                QueueOp::DequeueByValue(name) => {
                    let removed = h.controller.dequeue_by_value(&item(NAMES[name]));
                    let position = model.iter().position(|n| *n == NAMES[name]);
                    prop_assert_eq!(removed.is_some(), position.is_some());
                    if let Some(position) = position {
                        model.remove(position);
                    }
                }
                QueueOp::Move(from, to) => {
                    let moved = h.controller.move_item(from, to);
                    prop_assert_eq!(moved, from < model.len() && to < model.len());
                    if moved {
                        let name = model.remove(from);
                        model.insert(to, name);
                    }
                }
            }

            prop_assert_eq!(names(&h.controller.snapshot()), model.clone());
        }
    }

    /// Property: selection keeps naming the same entry across edits that spare it
    #[test]
    fn selection_survives_unrelated_edits(
        initial in 2usize..8,
        selected in 0usize..8,
        ops in prop::collection::vec(queue_op(), 1..20)
    ) {
        let mut h = Harness::new();
        for i in 0..initial {
            h.controller.enqueue(item(&format!("seed{}", i)));
        }
        let selected = selected % initial;
        for _ in 0..=selected {
            h.controller.play_next_item();
        }
        let target = format!("seed{}", selected);

        for op in ops {
            if let QueueOp::DequeueAt(index) = op {
                if h.controller.queue().current_index() == Some(index) {
                    continue;
                }
            }
            match op {
                QueueOp::Insert(name, index) => h.controller.insert(item(NAMES[name]), index),
                QueueOp::DequeueAt(index) => {
                    h.controller.dequeue_at(index);
                }
                QueueOp::DequeueByValue(name) => {
                    h.controller.dequeue_by_value(&item(NAMES[name]));
                }
                QueueOp::Move(from, to) => {
                    h.controller.move_item(from, to);
                }
            }

            let current = h.controller.currently_playing_item().map(|i| i.display_name().to_string());
            prop_assert_eq!(current.as_deref(), Some(target.as_str()));
        }
    }

    /// Property: seeks always land inside the item
    #[test]
    fn seek_position_is_clamped(progress in -10.0f64..10.0, duration in 1u64..10_000) {
        let mut h = Harness::with_items(&["a"]);
        h.set_duration(Some(Duration::from_secs(duration)));
        h.start_playing();

        h.controller.seek_to_progress(progress, None);

        let position = h.engine.lock().unwrap().position;
        prop_assert!(position <= Duration::from_secs(duration));
        prop_assert!((0.0..=1.0).contains(&h.controller.progress()));
    }

    /// Property: state machine invariants hold under arbitrary input
    #[test]
    fn controller_invariants_hold(
        rule in end_rule(),
        steps in prop::collection::vec(step(), 1..60)
    ) {
        let mut h = Harness::with_config(PlaybackConfig {
            end_of_item_rule: rule,
            ..PlaybackConfig::default()
        });
        h.enqueue(&["a", "b", "c"]);

        let mut last_generation = h.controller.generation();

        for step in &steps {
            apply(&mut h, step);

            let state = h.controller.state();
            let queue = h.controller.queue();

            // Cursor stays in range
            prop_assert!(queue.current_index().map_or(true, |i| i < queue.len()));

            // Generation never goes backwards
            prop_assert!(h.controller.generation() >= last_generation);
            last_generation = h.controller.generation();

            // Progress is normalized
            let progress = h.controller.progress();
            prop_assert!((0.0..=1.0).contains(&progress));

            // Grant is held while audio runs and never while idle
            if state.is_active() {
                prop_assert!(h.controller.background_held());
            }
            if matches!(
                state,
                PlaybackState::Paused
                    | PlaybackState::Stopped
                    | PlaybackState::Done
                    | PlaybackState::Unknown
            ) {
                prop_assert!(!h.controller.background_held());
            }
            let begun = h.grants_begun();
            let ended = h.grants_ended();
            prop_assert!(begun == ended || begun == ended + 1);

            // Error is never a resting state
            prop_assert_ne!(state, PlaybackState::Error);
        }
    }
}
