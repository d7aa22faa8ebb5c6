//! Property tests for the command-history invariant set.
//!
//! Random sequences of execute/undo/redo/clear are thrown at a session and
//! the manager's structural invariants are checked after every step:
//!
//! - the undo stack never exceeds `max_history`
//! - a successful execute leaves the redo stack empty
//! - the provenance log only ever grows
//! - reverted entries never outnumber recorded entries
//! - `can_undo`/`can_redo` agree with the stack depths

mod common;

use bindkit::session::CurationSession;
use proptest::prelude::*;

use common::session;

/// One step of a randomly generated editing session.
#[derive(Clone, Debug)]
enum Step {
    /// Try to add series `s<n>` (fails if it exists — also worth testing).
    Add(u8),
    /// Try to remove series `s<n>`.
    Remove(u8),
    Undo,
    Redo,
    Clear,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0u8..6).prop_map(Step::Add),
        2 => (0u8..6).prop_map(Step::Remove),
        2 => Just(Step::Undo),
        2 => Just(Step::Redo),
        1 => Just(Step::Clear),
    ]
}

fn apply_step(session: &mut CurationSession, step: &Step) -> bool {
    match step {
        Step::Add(n) => session.apply(common::add(&format!("s{n}"))),
        Step::Remove(n) => session.apply(common::remove(&format!("s{n}"))),
        Step::Undo => session.undo(),
        Step::Redo => session.redo(),
        Step::Clear => {
            session.history_mut().clear();
            true
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn invariants_hold_under_random_editing(
        max_history in 0usize..6,
        steps in prop::collection::vec(arb_step(), 1..60)
    ) {
        let mut s = session(max_history);
        let mut recorded_before = 0;

        for step in &steps {
            let executed = matches!(step, Step::Add(_) | Step::Remove(_));
            let ok = apply_step(&mut s, step);
            let history = s.history();

            // 1. Bounded undo stack.
            prop_assert!(
                history.undo_depth() <= max_history,
                "undo depth {} exceeds bound {max_history}",
                history.undo_depth()
            );

            // 2. Linear history: a successful execute clears redo.
            if executed && ok {
                prop_assert_eq!(history.redo_depth(), 0);
            }

            // 3. Append-only provenance.
            let recorded = history.provenance().len();
            prop_assert!(recorded >= recorded_before, "provenance shrank");
            recorded_before = recorded;

            // 4. Flag accounting.
            prop_assert!(history.provenance().reverted_count() <= recorded);
            prop_assert_eq!(
                history.provenance().active_count() + history.provenance().reverted_count(),
                recorded
            );

            // 5. Predicates agree with depths.
            prop_assert_eq!(history.can_undo(), history.undo_depth() > 0);
            prop_assert_eq!(history.can_redo(), history.redo_depth() > 0);
        }
    }

    #[test]
    fn undo_then_redo_is_a_dataset_round_trip(
        series in prop::collection::vec("[a-z]{1,8}", 1..8)
    ) {
        let mut s = session(16);
        for name in &series {
            // Duplicates in the generated list simply fail; ignore those.
            s.apply(common::add(name));
        }
        let before = s.dataset().clone();

        if s.undo() {
            prop_assert!(s.redo(), "redo must replay a just-undone command");
            prop_assert_eq!(s.dataset(), &before);
        }
    }

    #[test]
    fn every_successful_execute_appends_exactly_one_entry(
        steps in prop::collection::vec((0u8..4, prop::bool::ANY), 1..40)
    ) {
        let mut s = session(8);
        for (n, remove) in steps {
            let before = s.history().provenance().len();
            let ok = if remove {
                s.apply(common::remove(&format!("s{n}")))
            } else {
                s.apply(common::add(&format!("s{n}")))
            };
            let after = s.history().provenance().len();
            prop_assert_eq!(after - before, usize::from(ok));
        }
    }
}
