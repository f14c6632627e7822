//! Application state and prop reconciliation.
//!
//! [`AppState`] is what UI collaborators render from. The runtime publishes
//! every change on a `tokio::sync::watch` channel.

use serde::Serialize;
use serde_json::Value;

use crate::context::RuntimeContext;
use crate::error::Result;
use crate::protocol::{Partial, Props, View, Visit};

/// Current page, layout and global props.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AppState {
    /// URL of the current page; `None` before the first visit.
    pub url: Option<String>,
    /// Current page.
    pub page: Option<View>,
    /// Current layout.
    pub layout: Option<View>,
    /// Global props.
    pub globals: Props,
}

impl AppState {
    /// Apply a full navigation.
    ///
    /// The page is replaced. The layout keeps its props (reconciled with the
    /// new ones) when its name is unchanged, otherwise it is replaced.
    pub(crate) fn apply_visit<R>(&mut self, visit: Visit, request_url: String, reconcile: R) -> Result<()>
    where
        R: Fn(Props, Props) -> Result<Props>,
    {
        self.url = Some(visit.url.unwrap_or(request_url));
        self.page = Some(visit.page);

        self.layout = match (self.layout.take(), visit.layout) {
            (Some(current), Some(next)) if current.name == next.name => Some(View {
                name: next.name,
                props: reconcile(current.props, next.props)?,
            }),
            (_, next) => next,
        };

        let globals = std::mem::take(&mut self.globals);
        self.globals = reconcile(globals, visit.globals)?;
        Ok(())
    }

    /// Apply a prop update. Groups targeting an absent view are ignored.
    pub(crate) fn apply_partial<R>(&mut self, partial: Partial, reconcile: R) -> Result<()>
    where
        R: Fn(Props, Props) -> Result<Props>,
    {
        if let (Some(props), Some(page)) = (partial.page_props, self.page.as_mut()) {
            page.props = reconcile(std::mem::take(&mut page.props), props)?;
        }
        if let (Some(props), Some(layout)) = (partial.layout_props, self.layout.as_mut()) {
            layout.props = reconcile(std::mem::take(&mut layout.props), props)?;
        }
        if let Some(props) = partial.globals {
            let globals = std::mem::take(&mut self.globals);
            self.globals = reconcile(globals, props)?;
        }
        Ok(())
    }
}

/// Recursive merge of `partial` into `base`.
///
/// Objects present on both sides are merged key by key; any other value in
/// `partial` replaces the one in `base`.
pub fn merge_props(mut base: Props, partial: Props) -> Props {
    for (key, value) in partial {
        let merged = match (base.remove(&key), value) {
            (Some(Value::Object(current)), Value::Object(next)) => {
                Value::Object(merge_props(current, next))
            }
            (_, value) => value,
        };
        base.insert(key, merged);
    }
    base
}

/// Default `"propsReconciler"` service.
pub fn reconcile_props(_ctx: &RuntimeContext, (base, partial): (Props, Props)) -> Props {
    merge_props(base, partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Props {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn merge(base: Props, partial: Props) -> Result<Props> {
        Ok(merge_props(base, partial))
    }

    fn visit(page: &str, layout: Option<(&str, Value)>) -> Visit {
        Visit {
            url: None,
            page: View::new(page, Props::new()),
            layout: layout.map(|(name, p)| View::new(name, props(p))),
            globals: Props::new(),
            effects: Vec::new(),
        }
    }

    #[test]
    fn test_merge_nested() {
        let merged = merge_props(
            props(json!({"user": {"name": "Ada", "role": "admin"}, "count": 1})),
            props(json!({"user": {"role": "owner"}, "count": 2, "new": true})),
        );
        assert_eq!(
            Value::Object(merged),
            json!({"user": {"name": "Ada", "role": "owner"}, "count": 2, "new": true})
        );
    }

    #[test]
    fn test_merge_replaces_non_objects() {
        let merged = merge_props(
            props(json!({"list": [1, 2], "user": {"a": 1}})),
            props(json!({"list": [3], "user": null})),
        );
        assert_eq!(Value::Object(merged), json!({"list": [3], "user": null}));
    }

    #[test]
    fn test_visit_keeps_same_layout_props() {
        let mut state = AppState::default();
        state.apply_visit(visit("Home", Some(("App", json!({"menu": "open"})))), "/".into(), merge).unwrap();
        state.apply_visit(visit("Users", Some(("App", json!({"title": "Users"})))), "/users".into(), merge).unwrap();

        let layout = state.layout.unwrap();
        assert_eq!(layout.name, "App");
        assert_eq!(Value::Object(layout.props), json!({"menu": "open", "title": "Users"}));
        assert_eq!(state.page.unwrap().name, "Users");
        assert_eq!(state.url.as_deref(), Some("/users"));
    }

    #[test]
    fn test_visit_replaces_other_layout() {
        let mut state = AppState::default();
        state.apply_visit(visit("Home", Some(("App", json!({"menu": "open"})))), "/".into(), merge).unwrap();
        state.apply_visit(visit("Login", Some(("Guest", json!({})))), "/login".into(), merge).unwrap();
        assert_eq!(state.layout.as_ref().map(|l| l.props.len()), Some(0));

        state.apply_visit(visit("Bare", None), "/bare".into(), merge).unwrap();
        assert!(state.layout.is_none());
    }

    #[test]
    fn test_visit_prefers_payload_url() {
        let mut state = AppState::default();
        let mut v = visit("Home", None);
        v.url = Some("/home".into());
        state.apply_visit(v, "/".into(), merge).unwrap();
        assert_eq!(state.url.as_deref(), Some("/home"));
    }

    #[test]
    fn test_partial_reconciles_present_groups() {
        let mut state = AppState::default();
        state.apply_visit(visit("Home", Some(("App", json!({"a": 1})))), "/".into(), merge).unwrap();

        state.apply_partial(
            Partial {
                page_props: Some(props(json!({"count": 3}))),
                layout_props: None,
                globals: Some(props(json!({"user": "ada"}))),
                effects: Vec::new(),
            },
            merge,
        )
        .unwrap();

        assert_eq!(Value::Object(state.page.clone().unwrap().props), json!({"count": 3}));
        assert_eq!(Value::Object(state.layout.clone().unwrap().props), json!({"a": 1}));
        assert_eq!(Value::Object(state.globals.clone()), json!({"user": "ada"}));
    }

    #[test]
    fn test_partial_without_page_is_ignored() {
        let mut state = AppState::default();
        state.apply_partial(
            Partial {
                page_props: Some(props(json!({"count": 3}))),
                ..Partial::default()
            },
            merge,
        )
        .unwrap();
        assert!(state.page.is_none());
    }
}
