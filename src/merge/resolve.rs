//! Conflict policy.
//!
//! [`decide`] is the whole policy table as a pure function of what the
//! destination already holds and the caller's [`Policy`]:
//!
//! | existing            | policy      | decision         |
//! |---------------------|-------------|------------------|
//! | absent              | any         | `Insert`         |
//! | identical           | any         | `SkipIdentical`  |
//! | different           | `report`    | `Report`         |
//! | different           | `skip`      | `Skip`           |
//! | different           | `overwrite` | `Overwrite`      |
//! | different           | `fail`      | `Abort`          |
//!
//! The import dispatcher applies the decision to the tree and feeds the
//! bookkeeping into an [`Outcome`].

use super::equivalence::Comparison;
use crate::model::{ComponentKind, Conflict, ImportResult, Policy};

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// What the destination holds under the incoming component's name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Existing {
    Absent,
    /// Present and structurally identical.
    Identical,
    /// Present and different (or, for name-only kinds, present at all).
    Different,
}

impl Existing {
    /// Classify from an optional structural comparison. `None` means the
    /// kind is compared by name only, so presence alone is a difference.
    #[must_use]
    pub fn classify(present: bool, comparison: Option<&Comparison>) -> Self {
        match (present, comparison) {
            (false, _) => Self::Absent,
            (true, Some(c)) if c.equivalent => Self::Identical,
            (true, _) => Self::Different,
        }
    }
}

/// The action for one incoming component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Nothing by that name; add it.
    Insert,
    /// Already present and identical; do nothing, record nothing.
    SkipIdentical,
    /// Record the conflict, change nothing.
    Report,
    /// Leave the existing component, note the label as skipped.
    Skip,
    /// Replace the existing component where it stands.
    Overwrite,
    /// Record the conflict, mark the import failed, stop.
    Abort,
}

impl Decision {
    /// `true` if a [`Conflict`] is recorded.
    #[must_use]
    pub const fn records_conflict(self) -> bool {
        matches!(self, Self::Report | Self::Abort)
    }

    /// `true` if the destination tree changes.
    #[must_use]
    pub const fn mutates(self) -> bool {
        matches!(self, Self::Insert | Self::Overwrite)
    }
}

/// The policy table.
#[must_use]
pub const fn decide(existing: Existing, policy: Policy) -> Decision {
    match (existing, policy) {
        (Existing::Absent, _) => Decision::Insert,
        (Existing::Identical, _) => Decision::SkipIdentical,
        (Existing::Different, Policy::Report) => Decision::Report,
        (Existing::Different, Policy::Skip) => Decision::Skip,
        (Existing::Different, Policy::Overwrite) => Decision::Overwrite,
        (Existing::Different, Policy::Fail) => Decision::Abort,
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Accumulates the effects of a sequence of decisions into an
/// [`ImportResult`].
#[derive(Debug, Default)]
pub struct Outcome {
    result: ImportResult,
    aborted: bool,
}

impl Outcome {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Book one decision. `conflict` is only built when the decision
    /// records one; `label` only when the decision skips.
    pub fn record(
        &mut self,
        decision: Decision,
        kind: ComponentKind,
        conflict: impl FnOnce() -> Conflict,
        label: impl FnOnce() -> String,
    ) {
        match decision {
            Decision::Insert | Decision::Overwrite => self.result.imported.bump(kind),
            Decision::SkipIdentical => {}
            Decision::Report => self.result.conflicts.push(conflict()),
            Decision::Skip => self.result.skipped.push(label()),
            Decision::Abort => {
                self.result.conflicts.push(conflict());
                self.result.success = false;
                self.aborted = true;
            }
        }
    }

    /// Count inserted rungs, which have no [`ComponentKind`].
    pub const fn add_rungs(&mut self, count: usize) {
        self.result.imported.rungs += count;
    }

    /// Note a label as skipped outside the policy table (an identical
    /// import target).
    pub fn note_skipped(&mut self, label: String) {
        self.result.skipped.push(label);
    }

    /// `true` once an [`Decision::Abort`] was booked.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// The accumulated result.
    ///
    /// For read-only analysis, success means "no conflicts"; otherwise it
    /// is only lost through an abort.
    #[must_use]
    pub fn finish(mut self, read_only: bool) -> ImportResult {
        if read_only {
            self.result.success = self.result.conflicts.is_empty();
        }
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConflictKind;

    fn conflict() -> Conflict {
        Conflict {
            category: ComponentKind::DataType,
            name: "Alpha".to_owned(),
            kind: ConflictKind::DefinitionMismatch,
            description: String::new(),
            source_detail: String::new(),
            target_detail: String::new(),
        }
    }

    #[test]
    fn absent_always_inserts() {
        for policy in Policy::ALL {
            assert_eq!(decide(Existing::Absent, policy), Decision::Insert);
        }
    }

    #[test]
    fn identical_always_skips_silently() {
        for policy in Policy::ALL {
            let d = decide(Existing::Identical, policy);
            assert_eq!(d, Decision::SkipIdentical);
            assert!(!d.records_conflict());
            assert!(!d.mutates());
        }
    }

    #[test]
    fn different_follows_policy() {
        assert_eq!(decide(Existing::Different, Policy::Report), Decision::Report);
        assert_eq!(decide(Existing::Different, Policy::Skip), Decision::Skip);
        assert_eq!(
            decide(Existing::Different, Policy::Overwrite),
            Decision::Overwrite
        );
        assert_eq!(decide(Existing::Different, Policy::Fail), Decision::Abort);
    }

    #[test]
    fn classify_treats_name_only_presence_as_different() {
        assert_eq!(Existing::classify(false, None), Existing::Absent);
        assert_eq!(Existing::classify(true, None), Existing::Different);
        let same = Comparison {
            equivalent: true,
            existing: String::new(),
            incoming: String::new(),
        };
        assert_eq!(Existing::classify(true, Some(&same)), Existing::Identical);
    }

    #[test]
    fn outcome_books_each_decision() {
        let mut outcome = Outcome::new();
        let kind = ComponentKind::DataType;
        outcome.record(Decision::Insert, kind, conflict, || "UDT:A".into());
        outcome.record(Decision::Overwrite, kind, conflict, || "UDT:B".into());
        outcome.record(Decision::Skip, kind, conflict, || "UDT:C".into());
        outcome.record(Decision::SkipIdentical, kind, conflict, || "UDT:D".into());
        outcome.record(Decision::Report, kind, conflict, || "UDT:E".into());
        assert!(!outcome.is_aborted());

        let result = outcome.finish(false);
        assert!(result.success);
        assert_eq!(result.imported.udts, 2);
        assert_eq!(result.skipped, vec!["UDT:C".to_owned()]);
        assert_eq!(result.conflict_count(), 1);
    }

    #[test]
    fn abort_fails_the_result() {
        let mut outcome = Outcome::new();
        outcome.record(
            Decision::Abort,
            ComponentKind::DataType,
            conflict,
            String::new,
        );
        assert!(outcome.is_aborted());
        let result = outcome.finish(false);
        assert!(!result.success);
        assert_eq!(result.conflicts, vec![conflict()]);
    }

    #[test]
    fn read_only_success_tracks_conflicts() {
        let mut outcome = Outcome::new();
        outcome.record(
            Decision::Report,
            ComponentKind::Tag,
            conflict,
            String::new,
        );
        assert!(!outcome.finish(true).success);
        assert!(Outcome::new().finish(true).success);
    }
}
