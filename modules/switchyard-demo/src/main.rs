use anyhow::Result;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use switchyard_common::Config;
use switchyard_listeners::{Listener, ListenerMiddleware, ListenerOptions, Subscription};
use switchyard_store::{Action, ActionCreator, ActionRecorder, CaseReducer, Store};

#[derive(Debug, Clone, Default)]
struct Todos {
    items: Vec<String>,
    audit: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("switchyard=info".parse()?))
        .init();

    info!("Switchyard demo starting...");

    let config = Config::from_env()?;
    config.log_summary();

    let added = ActionCreator::new("todos/added");
    let cleared = ActionCreator::new("todos/cleared");

    let reducer = CaseReducer::new()
        .add_case(&added, |todos: &mut Todos, action: &Action| {
            if let Some(text) = action.payload["text"].as_str() {
                todos.items.push(text.to_string());
            }
        })
        .add_case(&cleared, |todos: &mut Todos, _: &Action| todos.items.clear())
        .add_matcher(
            |action| action.action_type.starts_with("audit/"),
            |todos: &mut Todos, action: &Action| todos.audit.push(action.action_type.clone()),
        );

    let listeners: ListenerMiddleware<Todos> = ListenerMiddleware::from_config(&config);
    let recorder = ActionRecorder::new();
    let store = Store::new(reducer, Todos::default())
        .with_config(&config.store_config())
        .with_middleware(listeners.clone())
        .with_middleware(recorder.clone());

    // Runs on the first todo only
    listeners.add_listener(
        &added,
        Listener::new(|action, _| {
            info!(text = %action.payload["text"], "First todo of the session");
            Ok(())
        }),
        ListenerOptions::new().with_once(true),
    )?;

    // Every todo triggers a nested audit action
    listeners.add_listener(
        &added,
        Listener::new(|_, api| {
            let pending = api.with_state(|todos: &Todos| todos.items.len()) + 1;
            api.dispatch(Action::new("audit/saved").with_payload(json!({ "pending": pending })))?;
            Ok(())
        }),
        ListenerOptions::new(),
    )?;

    // Long lists cannot be cleared
    listeners.add_listener(
        &cleared,
        Listener::new(|_, api| {
            let count = api.with_state(|todos: &Todos| todos.items.len());
            info!(count, "Refusing to clear a long list");
            Ok(())
        }),
        ListenerOptions::new()
            .with_prevent_propagation(true)
            .with_condition(|_, todos: &Todos| todos.items.len() > 2),
    )?;

    // Subscribe through the store itself
    let watcher = Listener::new(|_, api| {
        info!(depth = api.depth(), "List cleared");
        Ok(())
    });
    let subscription = store
        .dispatch(listeners.add_action(&cleared, watcher, None)?)?
        .into_value::<Subscription>();

    for text in ["milk", "eggs"] {
        store.dispatch(added.create(json!({ "text": text })))?;
    }
    store.dispatch(cleared.create(json!(null)))?;

    for text in ["bread", "jam", "tea"] {
        store.dispatch(added.create(json!({ "text": text })))?;
    }
    store.dispatch(cleared.create(json!(null)))?;
    info!(items = ?store.with_state(|todos| todos.items.clone()), "Clear was blocked");

    if let Some(subscription) = &subscription {
        info!(?subscription, "Unsubscribing watcher");
        subscription.unsubscribe();
    }

    let state = store.get_state();
    info!(
        items = state.items.len(),
        audit = state.audit.len(),
        recorded = recorder.len(),
        "Demo finished"
    );
    println!("{}", serde_json::to_string_pretty(&recorder.actions())?);

    Ok(())
}
