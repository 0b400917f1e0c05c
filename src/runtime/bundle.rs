//! Two-leg bundle join.
//!
//! A sub-bundle resolves through two independent fetches started
//! together: its versioned config and its versioned entry script. The
//! join fires the completion exactly once, when the second leg arrives,
//! carrying the first-observed error if either leg failed.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use super::resolve::{AssetValue, BundleAssets, Completion, ResolveError};

struct JoinState<'a> {
    arrived: u8,
    config: Option<Value>,
    error: Option<ResolveError>,
    completion: Option<Completion<'a>>,
}

/// The synchronization point between the two legs.
pub struct BundleJoin<'a> {
    state: Rc<RefCell<JoinState<'a>>>,
}

impl<'a> BundleJoin<'a> {
    pub fn new(completion: Completion<'a>) -> Self {
        Self {
            state: Rc::new(RefCell::new(JoinState {
                arrived: 0,
                config: None,
                error: None,
                completion: Some(completion),
            })),
        }
    }

    /// Continuation for the config fetch.
    pub fn config_leg(&self) -> impl FnOnce(Result<Value, ResolveError>) + 'a {
        let state = Rc::clone(&self.state);
        move |result| match result {
            Ok(config) => arrive(&state, Some(config), None),
            Err(error) => arrive(&state, None, Some(error)),
        }
    }

    /// Continuation for the entry-script fetch.
    pub fn script_leg(&self) -> impl FnOnce(Result<(), ResolveError>) + 'a {
        let state = Rc::clone(&self.state);
        move |result| arrive(&state, None, result.err())
    }
}

fn arrive<'a>(state: &Rc<RefCell<JoinState<'a>>>, config: Option<Value>, error: Option<ResolveError>) {
    let fire = {
        let mut state = state.borrow_mut();
        state.arrived += 1;
        if state.config.is_none() {
            state.config = config;
        }
        if state.error.is_none() {
            state.error = error;
        }
        if state.arrived == 2 {
            state.completion.take()
        } else {
            None
        }
    };

    // Invoked outside the borrow: the completion may re-enter resolution.
    if let Some(completion) = fire {
        let outcome = {
            let mut state = state.borrow_mut();
            match state.error.take() {
                Some(error) => Err(error),
                None => Ok(AssetValue::Bundle(BundleAssets {
                    config: state.config.take().unwrap_or(Value::Null),
                })),
            }
        };
        completion(outcome);
    }
}
