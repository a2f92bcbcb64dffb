//! Collection rendering: one component per item.
//!
//! Each instance receives the item under the class's collection parameter
//! (see [`ComponentClass::collection_parameter`]) along with
//! `<param>_counter`, counting from 1, and `<param>_iteration`, an object with
//! `index`, `size`, `first` and `last`. Shared arguments come from `extra`;
//! the per-item values win over them.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use trellis_render::Html;

use crate::class::ComponentClass;
use crate::component::{json_type, Component};
use crate::error::ComponentError;
use crate::view::View;

/// Renders `class` once per item into `view` and concatenates the results.
///
/// An empty `items` slice renders nothing. The first failing item aborts the
/// whole collection.
pub fn render_collection(
    view: &View,
    class: &Arc<ComponentClass>,
    items: &[Value],
    extra: &Value,
) -> Result<Html, ComponentError> {
    let shared = match extra {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(ComponentError::InvalidArguments {
                class: class.name().to_string(),
                found: json_type(other).to_string(),
            })
        }
    };
    let param = class.collection_parameter();
    let size = items.len();

    let mut out = Html::empty();
    for (index, item) in items.iter().enumerate() {
        let mut args = shared.clone();
        args.insert(param.clone(), item.clone());
        args.insert(format!("{param}_counter"), json!(index + 1));
        args.insert(
            format!("{param}_iteration"),
            json!({
                "index": index,
                "size": size,
                "first": index == 0,
                "last": index + 1 == size,
            }),
        );

        let mut component = Component::new(class.clone(), Value::Object(args))?;
        out.push(&view.render(&mut component)?);
    }
    tracing::debug!(component = class.name(), size, "rendered collection");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Runtime;

    fn product() -> Arc<ComponentClass> {
        ComponentClass::builder("ProductComponent")
            .template(
                "jinja",
                "{{ product_counter }}.{{ product }}{{ tag }}{% if not product_iteration.last %},{% endif %}",
            )
            .build()
            .unwrap()
    }

    #[test]
    fn renders_each_item_with_counters() {
        let runtime = Runtime::new();
        let html = render_collection(
            &runtime.view(),
            &product(),
            &[json!("a"), json!("b"), json!("c")],
            &json!({"tag": "!"}),
        )
        .unwrap();
        assert_eq!(html.as_str(), "1.a!,2.b!,3.c!");
    }

    #[test]
    fn empty_collection_renders_nothing() {
        let runtime = Runtime::new();
        let html = render_collection(&runtime.view(), &product(), &[], &Value::Null).unwrap();
        assert!(html.is_empty());
    }

    #[test]
    fn item_wins_over_shared_argument() {
        let runtime = Runtime::new();
        let html = render_collection(
            &runtime.view(),
            &product(),
            &[json!("x")],
            &json!({"product": "shadowed", "tag": ""}),
        )
        .unwrap();
        assert_eq!(html.as_str(), "1.x");
    }

    #[test]
    fn non_object_extra_is_rejected() {
        let runtime = Runtime::new();
        let err = render_collection(&runtime.view(), &product(), &[json!(1)], &json!([1])).unwrap_err();
        assert!(matches!(err, ComponentError::InvalidArguments { found, .. } if found == "an array"));
    }
}
