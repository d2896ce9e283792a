//! Reducer assembled from per-type cases.

use std::collections::HashMap;

use crate::action::Action;
use crate::traits::Reducer;

type CaseFn<S> = Box<dyn Fn(&mut S, &Action)>;
type MatcherFn = Box<dyn Fn(&Action) -> bool>;

/// Maps action types to case functions.
///
/// Lookup order: an exact `add_case` for the action type, then the first
/// `add_matcher` whose predicate accepts the action. Anything else leaves
/// the state untouched.
pub struct CaseReducer<S> {
    cases: HashMap<String, CaseFn<S>>,
    matchers: Vec<(MatcherFn, CaseFn<S>)>,
}

impl<S> CaseReducer<S> {
    pub fn new() -> Self {
        Self {
            cases: HashMap::new(),
            matchers: Vec::new(),
        }
    }

    /// Register the case for one action type. A later call for the same type replaces it.
    pub fn add_case<F>(mut self, action_type: impl AsRef<str>, case: F) -> Self
    where
        F: Fn(&mut S, &Action) + 'static,
    {
        self.cases
            .insert(action_type.as_ref().to_string(), Box::new(case));
        self
    }

    pub fn add_matcher<P, F>(mut self, matcher: P, case: F) -> Self
    where
        P: Fn(&Action) -> bool + 'static,
        F: Fn(&mut S, &Action) + 'static,
    {
        self.matchers.push((Box::new(matcher), Box::new(case)));
        self
    }

    fn find_case(&self, action: &Action) -> Option<&CaseFn<S>> {
        self.cases.get(&action.action_type).or_else(|| {
            self.matchers
                .iter()
                .find(|(matcher, _)| matcher(action))
                .map(|(_, case)| case)
        })
    }
}

impl<S> Default for CaseReducer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Reducer<S> for CaseReducer<S> {
    fn reduce(&self, state: &mut S, action: &Action) {
        if let Some(case) = self.find_case(action) {
            case(state, action);
        }
    }
}
