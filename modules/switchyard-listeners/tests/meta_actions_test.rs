//! Subscribing and unsubscribing by dispatching add/remove actions.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use switchyard_common::Config;
use switchyard_listeners::{
    add_listener_action, remove_listener_action, AddListenerMeta, Listener, ListenerError,
    ListenerMiddleware, ListenerOptions, Subscription,
};
use switchyard_store::{Action, ActionRecorder, Store};

const ADD: &str = "actionListenerMiddleware/add";
const REMOVE: &str = "actionListenerMiddleware/remove";

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct TestState {
    reduced: Vec<String>,
}

type Log = Rc<RefCell<Vec<String>>>;

struct Harness {
    store: Store<TestState>,
    listeners: ListenerMiddleware<TestState>,
    recorder: ActionRecorder,
    log: Log,
}

fn harness_with(listeners: ListenerMiddleware<TestState>) -> Harness {
    let recorder = ActionRecorder::new();
    let store = Store::new(
        |s: &mut TestState, a: &Action| s.reduced.push(a.action_type.clone()),
        TestState::default(),
    )
    .with_middleware(listeners.clone())
    .with_middleware(recorder.clone());

    Harness {
        store,
        listeners,
        recorder,
        log: Rc::new(RefCell::new(Vec::new())),
    }
}

fn harness() -> Harness {
    harness_with(ListenerMiddleware::new())
}

fn recording(name: &'static str, log: &Log) -> Listener<TestState> {
    let log = log.clone();
    Listener::new(move |_, _| {
        log.borrow_mut().push(name.to_string());
        Ok(())
    })
}

impl Harness {
    fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

// =========================================================================
// Add
// =========================================================================

#[test]
fn add_action_subscribes_and_returns_a_subscription() {
    let h = harness();
    let listener = recording("L", &h.log);

    let result = h
        .store
        .dispatch(add_listener_action("Z", listener.clone(), None).unwrap())
        .unwrap();
    let subscription = result.into_value::<Subscription>().unwrap();
    assert_eq!(subscription.action_type(), "Z");

    h.store.dispatch(Action::new("Z")).unwrap();
    assert_eq!(h.calls(), vec!["L"]);

    assert!(subscription.unsubscribe());
    h.store.dispatch(Action::new("Z")).unwrap();
    assert_eq!(h.calls(), vec!["L"]);
}

#[test]
fn add_action_is_forwarded_without_meta() {
    let h = harness();

    h.store
        .dispatch(add_listener_action("Z", recording("L", &h.log), None).unwrap())
        .unwrap();

    let recorded = h.recorder.actions();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].action_type, ADD);
    assert_eq!(recorded[0].payload, json!({"type": "Z"}));
    assert!(!recorded[0].has_meta);
    assert_eq!(h.store.get_state().reduced, vec![ADD]);
}

#[test]
fn add_action_carries_options() {
    let h = harness();
    let options = ListenerOptions::new()
        .with_once(true)
        .with_prevent_propagation(true);

    h.store
        .dispatch(add_listener_action("Z", recording("L", &h.log), Some(options)).unwrap())
        .unwrap();
    h.store.dispatch(Action::new("Z")).unwrap();
    h.store.dispatch(Action::new("Z")).unwrap();

    assert_eq!(h.calls(), vec!["L"]);
    // First Z was stopped, second went through
    assert_eq!(h.store.get_state().reduced, vec![ADD, "Z"]);
}

#[test]
fn adding_the_same_listener_twice_keeps_one_entry() {
    let h = harness();
    let listener = recording("L", &h.log);

    for _ in 0..2 {
        h.store
            .dispatch(add_listener_action("Z", listener.clone(), None).unwrap())
            .unwrap();
    }

    assert_eq!(h.listeners.listener_count("Z").unwrap(), 1);
    h.store.dispatch(Action::new("Z")).unwrap();
    assert_eq!(h.calls(), vec!["L"]);
}

#[test]
fn add_actions_are_not_delivered_to_listeners() {
    let h = harness();
    h.listeners
        .add_listener(ADD, recording("watcher", &h.log), ListenerOptions::new())
        .unwrap();

    h.store
        .dispatch(add_listener_action("Z", recording("L", &h.log), None).unwrap())
        .unwrap();

    assert!(h.calls().is_empty());
}

// =========================================================================
// Remove
// =========================================================================

#[test]
fn remove_action_unsubscribes_and_is_forwarded_with_meta() {
    let h = harness();
    let listener = recording("L", &h.log);
    h.listeners
        .add_listener("Z", listener.clone(), ListenerOptions::new())
        .unwrap();

    let result = h
        .store
        .dispatch(remove_listener_action("Z", listener.clone()).unwrap())
        .unwrap();

    assert!(!h.listeners.has_listener("Z", &listener).unwrap());
    assert_eq!(result.as_action().unwrap().action_type, REMOVE);

    let recorded = h.recorder.actions();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].action_type, REMOVE);
    assert!(recorded[0].has_meta);

    h.store.dispatch(Action::new("Z")).unwrap();
    assert!(h.calls().is_empty());
}

#[test]
fn remove_action_for_unknown_listener_still_goes_through() {
    let h = harness();

    h.store
        .dispatch(remove_listener_action("Z", recording("L", &h.log)).unwrap())
        .unwrap();

    assert_eq!(h.store.get_state().reduced, vec![REMOVE]);
}

#[test]
fn remove_actions_are_delivered_to_their_listeners() {
    let h = harness();
    h.listeners
        .add_listener(REMOVE, recording("watcher", &h.log), ListenerOptions::new())
        .unwrap();

    h.store
        .dispatch(remove_listener_action("Z", recording("L", &h.log)).unwrap())
        .unwrap();

    assert_eq!(h.calls(), vec!["watcher"]);
}

// =========================================================================
// Malformed
// =========================================================================

#[test]
fn add_action_without_meta_is_rejected() {
    let h = harness();

    let err = h
        .store
        .dispatch(Action::new(ADD).with_payload(json!({"type": "Z"})))
        .unwrap_err();

    let err = err.downcast_ref::<ListenerError>().unwrap();
    assert_eq!(
        *err,
        ListenerError::MalformedMeta {
            action_type: ADD.to_string(),
            reason: "meta is missing".to_string(),
        }
    );
    assert!(h.recorder.is_empty());
}

#[test]
fn add_action_for_another_state_type_is_rejected() {
    let h = harness();
    let foreign = Action::new(ADD)
        .with_payload(json!({"type": "Z"}))
        .with_meta(AddListenerMeta::<u32> {
            listener: Listener::new(|_, _| Ok(())),
            options: None,
        });

    let err = h.store.dispatch(foreign).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ListenerError>(),
        Some(ListenerError::MalformedMeta { .. })
    ));
    assert_eq!(h.listeners.listener_count("Z").unwrap(), 0);
}

#[test]
fn add_action_without_a_target_type_is_rejected() {
    let h = harness();
    let action = Action::new(ADD).with_payload(json!({"kind": "Z"}));

    let err = h.store.dispatch(action).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ListenerError>(),
        Some(ListenerError::TypeResolution(_))
    ));
}

// =========================================================================
// Namespaces
// =========================================================================

#[test]
fn configured_namespace_replaces_the_default() {
    let config = Config::from_lookup(|key| match key {
        "SWITCHYARD_LISTENER_NAMESPACE" => Some("bus".to_string()),
        _ => None,
    })
    .unwrap();
    let h = harness_with(ListenerMiddleware::from_config(&config));
    let listener = recording("L", &h.log);
    assert_eq!(h.listeners.meta_actions().add_type(), "bus/add");

    // A default-namespace add is just another action here
    let result = h
        .store
        .dispatch(add_listener_action("Z", listener.clone(), None).unwrap())
        .unwrap();
    assert!(result.is_action());
    assert_eq!(h.listeners.listener_count("Z").unwrap(), 0);

    let action = h.listeners.add_action("Z", listener.clone(), None).unwrap();
    let subscription = h
        .store
        .dispatch(action)
        .unwrap()
        .into_value::<Subscription>()
        .unwrap();
    assert!(subscription.is_active());

    h.store.dispatch(Action::new("Z")).unwrap();
    assert_eq!(h.calls(), vec!["L"]);

    let remove = h.listeners.remove_action("Z", listener.clone()).unwrap();
    assert_eq!(remove.action_type, "bus/remove");
    h.store.dispatch(remove).unwrap();
    assert!(!subscription.is_active());
}

#[test]
fn two_middlewares_keep_separate_registries() {
    let first = ListenerMiddleware::<TestState>::new();
    let second = ListenerMiddleware::<TestState>::with_namespace("second");
    let recorder = ActionRecorder::new();
    let store = Store::new(
        |s: &mut TestState, a: &Action| s.reduced.push(a.action_type.clone()),
        TestState::default(),
    )
    .with_middleware(first.clone())
    .with_middleware(second.clone())
    .with_middleware(recorder.clone());
    let log: Log = Rc::new(RefCell::new(Vec::new()));

    store
        .dispatch(second.add_action("Z", recording("second", &log), None).unwrap())
        .unwrap();
    first
        .add_listener("Z", recording("first", &log), ListenerOptions::new())
        .unwrap();

    store.dispatch(Action::new("Z")).unwrap();

    assert_eq!(*log.borrow(), vec!["first", "second"]);
    assert_eq!(first.listener_count("Z").unwrap(), 1);
    assert_eq!(second.listener_count("Z").unwrap(), 1);
    assert_eq!(recorder.action_types(), vec!["second/add", "Z"]);
}
