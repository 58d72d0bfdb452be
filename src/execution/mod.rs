//! Query execution engine.
//!
//! Evaluates planned media queries against an `Environment`.

use crate::environment::Environment;
use crate::media::MediaQuery;
use crate::Result;

/// Outcome of evaluating a media query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// OR of every condition; `false` for a query without conditions.
    pub matches: bool,
    /// Each rendered condition with its own result, in query order.
    pub conditions: Vec<ConditionOutcome>,
}

/// One condition string and what the environment said about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionOutcome {
    pub condition: String,
    pub matches: bool,
}

impl Evaluation {
    /// The conditions that matched.
    pub fn matched(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .iter()
            .filter(|outcome| outcome.matches)
            .map(|outcome| outcome.condition.as_str())
    }
}

/// Evaluate a media query against an environment.
///
/// Every condition is evaluated, even after one matched, so an environment
/// rejecting a condition string always surfaces as an error.
pub fn execute<E: Environment + ?Sized>(env: &E, query: &MediaQuery) -> Result<Evaluation> {
    let mut evaluation = Evaluation::default();
    for condition in query.condition_strings() {
        let matches = env.evaluate(&condition)?;
        tracing::trace!(%condition, matches, "evaluated condition");
        evaluation.matches |= matches;
        evaluation.conditions.push(ConditionOutcome { condition, matches });
    }
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MemoryEnvironment;
    use crate::media;
    use crate::Error;

    #[test]
    fn test_or_across_conditions() {
        let env = MemoryEnvironment::new(600.0);
        let query = media::parse("(max-width: 575.8px), (min-width: 576px)").unwrap();
        let evaluation = execute(&env, &query).unwrap();
        assert!(evaluation.matches);
        assert_eq!(evaluation.matched().collect::<Vec<_>>(), vec!["(min-width: 576px)"]);
        assert_eq!(evaluation.conditions.len(), 2);
    }

    #[test]
    fn test_empty_query_is_false() {
        let env = MemoryEnvironment::new(600.0);
        let evaluation = execute(&env, &MediaQuery::none()).unwrap();
        assert!(!evaluation.matches);
        assert!(evaluation.conditions.is_empty());
    }

    #[test]
    fn test_environment_errors_propagate() {
        let env = MemoryEnvironment::new(600.0);
        let query = media::parse("all, (min-width: 10vw)").unwrap();
        let err = execute(&env, &query).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLength(_)));
    }
}
