use super::script::ChangeScript;
use super::set::MigrationSet;
use crate::error::{Result, StrataError};

/// What reconciliation decided for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPlan {
    /// History and codebase have the same length; nothing to do.
    UpToDate,
    /// No history yet; every script is pending.
    Bootstrap,
    /// The first `applied` scripts are in history; the rest are pending.
    Resume { applied: usize },
}

impl MigrationPlan {
    /// Scripts this plan would apply, in order.
    pub fn pending<'a>(&self, set: &'a MigrationSet) -> &'a [ChangeScript] {
        let scripts = set.scripts();
        match self {
            MigrationPlan::UpToDate => &[],
            MigrationPlan::Bootstrap => scripts,
            MigrationPlan::Resume { applied } => &scripts[*applied..],
        }
    }
}

/// Compare applied identifiers (ascending) against the known scripts.
///
/// History must be a prefix of the codebase. Longer history, history that shares
/// no first entry with the codebase, or history that departs from it partway are
/// all fatal and never repaired.
pub fn plan(history: &[i64], set: &MigrationSet) -> Result<MigrationPlan> {
    let scripts = set.scripts();

    if history.len() == scripts.len() {
        return Ok(MigrationPlan::UpToDate);
    }

    if history.len() > scripts.len() {
        return Err(StrataError::HistoryAhead {
            applied: history.len(),
            known: scripts.len(),
        });
    }

    if history.is_empty() {
        return Ok(MigrationPlan::Bootstrap);
    }

    let matched = history
        .iter()
        .zip(scripts)
        .take_while(|(applied, script)| **applied == script.identifier())
        .count();

    if matched == 0 {
        return Err(StrataError::NoCommonMigration {
            applied: history[0],
            known: scripts[0].identifier(),
        });
    }

    if matched < history.len() {
        return Err(StrataError::HistoryDiverged {
            position: matched,
            applied: history[matched],
            expected: scripts[matched].identifier(),
        });
    }

    Ok(MigrationPlan::Resume { applied: matched })
}

/// Whether the latest applied identifier is the latest known one.
///
/// Only the last entries are compared; interior gaps are the job of [`plan`].
pub fn is_latest(latest_applied: Option<i64>, set: &MigrationSet) -> bool {
    match (latest_applied, set.latest()) {
        (None, None) => true,
        (Some(applied), Some(script)) => applied == script.identifier(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(ids: &[i64]) -> MigrationSet {
        let scripts = ids
            .iter()
            .map(|id| {
                ChangeScript::parse(format!("core/{}-step.sql", id), "-- migrate up\nSELECT 1;")
                    .unwrap()
            })
            .collect();
        MigrationSet::new(scripts).unwrap()
    }

    fn pending_ids(history: &[i64], set: &MigrationSet) -> Vec<i64> {
        plan(history, set)
            .unwrap()
            .pending(set)
            .iter()
            .map(|s| s.identifier())
            .collect()
    }

    #[test]
    fn test_prefix_history_returns_suffix() {
        let set = set_of(&[1, 2, 3, 4, 5]);

        for len in 0..=5 {
            let history: Vec<i64> = (1..=len as i64).collect();
            let expected: Vec<i64> = ((len as i64 + 1)..=5).collect();
            assert_eq!(pending_ids(&history, &set), expected, "history length {len}");
        }
    }

    #[test]
    fn test_empty_history_is_bootstrap() {
        let set = set_of(&[10, 20]);
        assert_eq!(plan(&[], &set).unwrap(), MigrationPlan::Bootstrap);
    }

    #[test]
    fn test_equal_length_is_up_to_date() {
        let set = set_of(&[10, 20]);
        assert_eq!(plan(&[10, 20], &set).unwrap(), MigrationPlan::UpToDate);
        assert!(MigrationPlan::UpToDate.pending(&set).is_empty());

        let empty = MigrationSet::default();
        assert_eq!(plan(&[], &empty).unwrap(), MigrationPlan::UpToDate);
    }

    #[test]
    fn test_longer_history_is_fatal() {
        let set = set_of(&[1, 2]);
        for history in [&[1, 2, 3][..], &[7, 8, 9][..], &[1, 2, 3, 4][..]] {
            let err = plan(history, &set).unwrap_err();
            assert!(matches!(err, StrataError::HistoryAhead { known: 2, .. }));
        }

        let err = plan(&[1], &MigrationSet::default()).unwrap_err();
        assert!(matches!(err, StrataError::HistoryAhead { applied: 1, known: 0 }));
    }

    #[test]
    fn test_first_mismatch_is_no_common_migration() {
        let set = set_of(&[1, 2, 3]);
        let err = plan(&[5], &set).unwrap_err();
        assert!(matches!(
            err,
            StrataError::NoCommonMigration { applied: 5, known: 1 }
        ));
    }

    #[test]
    fn test_interior_divergence_is_fatal() {
        let set = set_of(&[1, 2, 3, 4]);
        let err = plan(&[1, 3], &set).unwrap_err();
        assert!(matches!(
            err,
            StrataError::HistoryDiverged { position: 1, applied: 3, expected: 2 }
        ));
    }

    #[test]
    fn test_is_latest() {
        let set = set_of(&[1, 2, 3]);
        assert!(is_latest(Some(3), &set));
        assert!(!is_latest(Some(2), &set));
        assert!(!is_latest(None, &set));

        let empty = MigrationSet::default();
        assert!(is_latest(None, &empty));
        assert!(!is_latest(Some(1), &empty));
    }
}
