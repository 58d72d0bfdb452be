//! Live bindings: keep a query's boolean current as the environment changes.
//!
//! A `Binding` is either `Unbound` or `Bound { query, subscriptions, current }`.
//! Binding registers one environment listener per distinct condition string.
//! Rebinding diffs the new strings against the registered ones, so identical
//! inputs cause no listener churn. Dropping the binding unsubscribes.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::environment::{Environment, Listener, ListenerId};
use crate::execution;
use crate::media::MediaQuery;
use crate::query::Query;
use crate::{Breakpoints, Result};

type OnChange = Box<dyn Fn(bool) + Send + Sync>;

/// A query bound to an environment, publishing every flip to `on_change`.
pub struct Binding<E: Environment> {
    inner: Arc<BindingInner<E>>,
}

struct BindingInner<E: Environment> {
    env: Arc<E>,
    on_change: OnChange,
    phase: Mutex<Phase>,
}

enum Phase {
    Unbound,
    Bound(Bound),
}

struct Bound {
    query: MediaQuery,
    subscriptions: Vec<Subscription>,
    /// last published value
    current: bool,
}

struct Subscription {
    condition: String,
    id: ListenerId,
}

impl<E: Environment> Binding<E> {
    /// Build `query`, evaluate it and subscribe to its conditions.
    ///
    /// `on_change` is not called for the initial value; read it with
    /// `matches()`. Nothing stays registered if this fails.
    pub fn bind<F>(env: Arc<E>, breakpoints: &Breakpoints, query: &Query, on_change: F) -> Result<Self>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let binding = Self {
            inner: Arc::new(BindingInner {
                env,
                on_change: Box::new(on_change),
                phase: Mutex::new(Phase::Unbound),
            }),
        };
        binding.rebind(breakpoints, query)?;
        Ok(binding)
    }

    /// Switch to a new map or query.
    ///
    /// Conditions present before and after keep their listeners. If the
    /// binding was bound and its value changed, `on_change` fires once.
    /// On error the previous state is left untouched.
    pub fn rebind(&self, breakpoints: &Breakpoints, query: &Query) -> Result<()> {
        let env = &self.inner.env;
        let media = breakpoints.media_query(query)?;
        let evaluation = execution::execute(&**env, &media)?;
        let wanted: Vec<String> = evaluation
            .conditions
            .iter()
            .map(|outcome| outcome.condition.clone())
            .collect();

        let mut phase = self.inner.phase.lock();

        let mut added = Vec::new();
        {
            let existing: &[Subscription] = match &*phase {
                Phase::Bound(bound) => &bound.subscriptions,
                Phase::Unbound => &[],
            };
            for condition in &wanted {
                if existing.iter().any(|sub| &sub.condition == condition) {
                    continue;
                }
                match env.add_listener(condition, self.listener()) {
                    Ok(id) => added.push(Subscription { condition: condition.clone(), id }),
                    Err(err) => {
                        for sub in added {
                            env.remove_listener(sub.id);
                        }
                        return Err(err);
                    }
                }
            }
        }

        let (previous, old) = match std::mem::replace(&mut *phase, Phase::Unbound) {
            Phase::Bound(bound) => (Some(bound.current), bound.subscriptions),
            Phase::Unbound => (None, Vec::new()),
        };

        let (added_count, mut removed) = (added.len(), 0usize);
        let mut subscriptions = Vec::with_capacity(wanted.len());
        for sub in old {
            if wanted.contains(&sub.condition) {
                subscriptions.push(sub);
            } else {
                env.remove_listener(sub.id);
                removed += 1;
            }
        }
        subscriptions.extend(added);

        let matches = evaluation.matches;
        *phase = Phase::Bound(Bound { query: media, subscriptions, current: matches });
        drop(phase);

        tracing::debug!(added = added_count, removed, matches, "bound media query");
        if previous.is_some_and(|previous| previous != matches) {
            tracing::debug!(matches, "publishing binding change");
            (self.inner.on_change)(matches);
        }
        Ok(())
    }

    /// Release every listener. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        self.inner.unsubscribe();
    }

    /// Last published value; `false` once unsubscribed.
    pub fn matches(&self) -> bool {
        match &*self.inner.phase.lock() {
            Phase::Bound(bound) => bound.current,
            Phase::Unbound => false,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(&*self.inner.phase.lock(), Phase::Bound(_))
    }

    /// Subscribed condition strings.
    pub fn conditions(&self) -> Vec<String> {
        match &*self.inner.phase.lock() {
            Phase::Bound(bound) => bound.subscriptions.iter().map(|sub| sub.condition.clone()).collect(),
            Phase::Unbound => Vec::new(),
        }
    }

    /// The bound media query, if any.
    pub fn query(&self) -> Option<MediaQuery> {
        match &*self.inner.phase.lock() {
            Phase::Bound(bound) => Some(bound.query.clone()),
            Phase::Unbound => None,
        }
    }

    pub fn environment(&self) -> &Arc<E> {
        &self.inner.env
    }

    /// Listener closures only hold a weak reference, so the environment
    /// never keeps a dropped binding alive.
    fn listener(&self) -> Listener {
        let weak: Weak<BindingInner<E>> = Arc::downgrade(&self.inner);
        Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.refresh();
            }
        })
    }
}

impl<E: Environment> BindingInner<E> {
    fn refresh(&self) {
        let mut phase = self.phase.lock();
        let Phase::Bound(bound) = &mut *phase else {
            return;
        };
        match execution::execute(&*self.env, &bound.query) {
            Ok(evaluation) if evaluation.matches != bound.current => {
                let matches = evaluation.matches;
                bound.current = matches;
                drop(phase);
                tracing::debug!(matches, "publishing binding change");
                (self.on_change)(matches);
            }
            Ok(_) => {}
            Err(err) => tracing::error!(%err, "re-evaluating bound media query failed"),
        }
    }

    fn unsubscribe(&self) {
        let previous = std::mem::replace(&mut *self.phase.lock(), Phase::Unbound);
        let Phase::Bound(bound) = previous else {
            return;
        };
        for sub in &bound.subscriptions {
            self.env.remove_listener(sub.id);
        }
        tracing::debug!(released = bound.subscriptions.len(), "unsubscribed binding");
    }
}

impl<E: Environment> Drop for Binding<E> {
    fn drop(&mut self) {
        self.inner.unsubscribe();
    }
}

impl<E: Environment> std::fmt::Debug for Binding<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("bound", &self.is_bound())
            .field("matches", &self.matches())
            .field("conditions", &self.conditions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MemoryEnvironment;
    use crate::model::BreakpointMap;

    fn recorder() -> (Arc<Mutex<Vec<bool>>>, impl Fn(bool) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |value| sink.lock().push(value))
    }

    #[test]
    fn test_bind_evaluates_without_publishing() {
        let env = Arc::new(MemoryEnvironment::new(800.0));
        let (seen, on_change) = recorder();
        let binding = Binding::bind(env.clone(), &Breakpoints::default(), &Query::only("md"), on_change).unwrap();

        assert!(binding.matches());
        assert!(binding.is_bound());
        assert!(seen.lock().is_empty());
        assert_eq!(env.listener_count(), 1);
    }

    #[test]
    fn test_publishes_only_on_flips() {
        let env = Arc::new(MemoryEnvironment::new(800.0));
        let (seen, on_change) = recorder();
        let binding = Binding::bind(env.clone(), &Breakpoints::default(), &Query::up("md"), on_change).unwrap();

        env.resize(900.0);
        env.resize(700.0);
        env.resize(600.0);
        env.resize(1000.0);
        assert_eq!(*seen.lock(), vec![false, true]);
        assert!(binding.matches());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let env = Arc::new(MemoryEnvironment::new(800.0));
        let (seen, on_change) = recorder();
        let binding = Binding::bind(env.clone(), &Breakpoints::default(), &Query::only("md"), on_change).unwrap();

        binding.unsubscribe();
        binding.unsubscribe();
        assert_eq!(env.listener_count(), 0);
        assert!(!binding.matches());
        assert!(binding.conditions().is_empty());

        env.resize(100.0);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_failed_bind_leaves_nothing_registered() {
        let env = Arc::new(MemoryEnvironment::new(800.0));
        let map = BreakpointMap::new().with("sm", 400).with("md", "40vw");
        let err = Binding::bind(env.clone(), &Breakpoints::new(map), &Query::only("sm"), |_| {});
        assert!(err.is_err());
        assert_eq!(env.listener_count(), 0);
    }

    #[test]
    fn test_failed_rebind_keeps_previous_state() {
        let env = Arc::new(MemoryEnvironment::new(800.0));
        let breakpoints = Breakpoints::default();
        let binding = Binding::bind(env.clone(), &breakpoints, &Query::only("md"), |_| {}).unwrap();

        assert!(binding.rebind(&breakpoints, &Query::only("huge")).is_err());
        assert_eq!(binding.conditions(), vec!["(min-width: 768px) and (max-width: 991.8px)"]);
        assert_eq!(env.listener_count(), 1);
    }

    #[test]
    fn test_listener_survives_only_while_binding_lives() {
        let env = Arc::new(MemoryEnvironment::new(800.0));
        {
            let _binding = Binding::bind(env.clone(), &Breakpoints::default(), &Query::only("md"), |_| {}).unwrap();
            assert_eq!(env.listener_count(), 1);
        }
        assert_eq!(env.listener_count(), 0);
    }
}
