//! Count-based rollback for multi-target applies.
//!
//! A profile change that must be pushed to every object using the profile
//! is applied target by target. The targets that succeeded are remembered
//! so a failure part way through can undo exactly those, newest first.

use std::fmt::Debug;

use sonic_sai::{SaiError, SaiResult};

use crate::error_log;

/// Targets already updated, in application order.
pub(crate) struct ApplyLog<T> {
    source: &'static str,
    applied: Vec<T>,
}

impl<T: Copy + Debug> ApplyLog<T> {
    pub(crate) fn new(source: &'static str) -> Self {
        Self {
            source,
            applied: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, target: T) {
        self.applied.push(target);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.applied.len()
    }

    /// Undoes every recorded step, last first. A failing undo is logged
    /// and the remaining steps are still attempted.
    pub(crate) fn rollback(self, mut undo: impl FnMut(T) -> SaiResult<()>) {
        for target in self.applied.into_iter().rev() {
            if let Err(e) = undo(target) {
                error_log!(self.source, target = ?target, error = %e, "rollback step failed");
            }
        }
    }
}

/// Runs `apply` on every target in order. On the first failure the
/// targets already done are undone and the failure is returned.
pub(crate) fn apply_all<T: Copy + Debug>(
    source: &'static str,
    targets: &[T],
    mut apply: impl FnMut(T) -> SaiResult<()>,
    undo: impl FnMut(T) -> SaiResult<()>,
) -> Result<(), SaiError> {
    let mut log = ApplyLog::new(source);
    for &target in targets {
        if let Err(e) = apply(target) {
            log.rollback(undo);
            return Err(e);
        }
        log.record(target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[test]
    fn test_failure_undoes_prefix_in_reverse() {
        let undone = RefCell::new(Vec::new());
        let result = apply_all(
            "test",
            &[1, 2, 3, 4],
            |t| {
                if t == 3 {
                    Err(SaiError::invalid_parameter("boom"))
                } else {
                    Ok(())
                }
            },
            |t| {
                undone.borrow_mut().push(t);
                Ok(())
            },
        );
        assert!(result.is_err());
        assert_eq!(undone.into_inner(), vec![2, 1]);
    }

    #[test]
    fn test_undo_failure_does_not_stop_rollback() {
        let mut log = ApplyLog::new("test");
        for t in [1, 2, 3] {
            log.record(t);
        }
        assert_eq!(log.len(), 3);

        let mut seen = Vec::new();
        log.rollback(|t| {
            seen.push(t);
            if t == 2 {
                Err(SaiError::not_found("x"))
            } else {
                Ok(())
            }
        });
        assert_eq!(seen, vec![3, 2, 1]);
    }

    #[test]
    fn test_success_undoes_nothing() {
        let mut undone = 0;
        apply_all("test", &[1, 2], |_| Ok(()), |_| {
            undone += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(undone, 0);
    }
}
