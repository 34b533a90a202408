use std::collections::HashSet;

use crate::error::{BatchError, ErrorKind};

/// Decides whether a failed item may be left out of its chunk.
pub trait SkipPolicy {
    /// Returns `Ok(true)` when the item should be skipped, `Ok(false)` when the error is not
    /// skippable at all, and `Err(BatchError::SkipLimitExceeded)` when it would be skippable
    /// but the step has already skipped as many items as allowed.
    ///
    /// `skip_count` is the number of items skipped so far, excluding this one.
    fn should_skip(&self, error: &BatchError, skip_count: usize) -> Result<bool, BatchError>;
}

/// Never skips: every processor error fails the step.
#[derive(Default, Debug, Clone, Copy)]
pub struct NeverSkipPolicy;

impl SkipPolicy for NeverSkipPolicy {
    fn should_skip(&self, _error: &BatchError, _skip_count: usize) -> Result<bool, BatchError> {
        Ok(false)
    }
}

/// Skips errors of the designated kinds until `skip_limit` items have been skipped.
#[derive(Debug, Clone)]
pub struct LimitCheckingSkipPolicy {
    skip_limit: usize,
    skippable: HashSet<ErrorKind>,
}

impl LimitCheckingSkipPolicy {
    pub fn new(skip_limit: usize) -> Self {
        Self {
            skip_limit,
            skippable: HashSet::new(),
        }
    }

    pub fn skip_on(mut self, kind: ErrorKind) -> Self {
        self.skippable.insert(kind);
        self
    }

    pub fn skip_limit(&self) -> usize {
        self.skip_limit
    }

    pub fn is_skippable(&self, error: &BatchError) -> bool {
        self.skippable.contains(&error.kind())
    }
}

impl SkipPolicy for LimitCheckingSkipPolicy {
    fn should_skip(&self, error: &BatchError, skip_count: usize) -> Result<bool, BatchError> {
        if !self.is_skippable(error) {
            return Ok(false);
        }

        if skip_count < self.skip_limit {
            Ok(true)
        } else {
            Err(BatchError::SkipLimitExceeded {
                limit: self.skip_limit,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{BatchError, ErrorKind};

    use super::{LimitCheckingSkipPolicy, NeverSkipPolicy, SkipPolicy};

    #[test]
    fn never_skip_should_refuse_everything() {
        let error = BatchError::invalid_item("Maxime_Nienow", "not allowed");

        assert!(!NeverSkipPolicy.should_skip(&error, 0).unwrap());
    }

    #[test]
    fn limit_checking_should_skip_designated_kind_until_limit() {
        let policy = LimitCheckingSkipPolicy::new(1).skip_on(ErrorKind::InvalidItem);
        let error = BatchError::invalid_item("Maxime_Nienow", "not allowed");

        assert!(policy.should_skip(&error, 0).unwrap());
        assert!(matches!(
            policy.should_skip(&error, 1),
            Err(BatchError::SkipLimitExceeded { limit: 1 })
        ));
    }

    #[test]
    fn limit_checking_should_not_skip_other_kinds() {
        let policy = LimitCheckingSkipPolicy::new(10).skip_on(ErrorKind::InvalidItem);
        let error = BatchError::ItemProcessor("boom".to_string());

        assert!(!policy.should_skip(&error, 0).unwrap());
    }

    #[test]
    fn zero_limit_should_fail_on_first_skippable_error() {
        let policy = LimitCheckingSkipPolicy::new(0).skip_on(ErrorKind::Validation);
        let error = BatchError::Validation("Author is inactive".to_string());

        assert!(policy.should_skip(&error, 0).is_err());
    }
}
