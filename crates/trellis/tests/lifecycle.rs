//! Render callbacks, aborts and rescue handlers.

mod common;

use std::sync::{Arc, Mutex};

use serde_json::json;
use thiserror::Error;
use trellis::{
    Component, ComponentClass, ComponentError, Flow, HookError, Html, Markup, RenderState, Runtime,
};

#[derive(Debug, Error)]
#[error("record {0} not found")]
struct NotFound(u32);

#[derive(Debug, Error)]
#[error("lookup failed")]
struct LookupFailed(#[source] NotFound);

fn render(component: &mut Component) -> Result<Html, ComponentError> {
    common::init_tracing();
    Runtime::new().render(component)
}

#[test]
fn callbacks_run_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (a, b, c, d) = (log.clone(), log.clone(), log.clone(), log.clone());
    let class = ComponentClass::builder("Probe")
        .call(|_| Ok(Html::safe("body")))
        .before_render(move |_| {
            a.lock().unwrap().push("before");
            Ok(Flow::Continue)
        })
        .around_render(move |component, next| {
            b.lock().unwrap().push("around:in");
            let html = next.run(component)?;
            b.lock().unwrap().push("around:out");
            Ok(Html::safe(format!("<div>{}</div>", html.as_str())))
        })
        .around_render(move |component, next| {
            c.lock().unwrap().push("inner");
            next.run(component)
        })
        .after_render(move |_, html| {
            d.lock().unwrap().push("after");
            Ok(html)
        })
        .build()
        .unwrap();

    let mut component = Component::new(class, json!({})).unwrap();
    assert_eq!(render(&mut component).unwrap().as_str(), "<div>body</div>");
    assert_eq!(
        *log.lock().unwrap(),
        ["before", "around:in", "inner", "around:out", "after"]
    );
    assert_eq!(component.state(), RenderState::Done);
}

#[test]
fn before_render_can_abort() {
    let class = ComponentClass::builder("Probe")
        .template("txt", "never")
        .before_render(|_| Ok(Flow::Abort))
        .build()
        .unwrap();
    let mut component = Component::new(class, json!({})).unwrap();
    assert!(render(&mut component).unwrap().is_empty());
    assert_eq!(component.state(), RenderState::Aborted);
}

#[test]
fn around_hook_that_skips_next_aborts() {
    let class = ComponentClass::builder("Probe")
        .template("txt", "never")
        .around_render(|_, _next| Ok(Html::safe("ignored")))
        .build()
        .unwrap();
    let mut component = Component::new(class, json!({})).unwrap();
    assert!(render(&mut component).unwrap().is_empty());
    assert_eq!(component.state(), RenderState::Aborted);
}

#[test]
fn render_if_skips_rendering() {
    let class = ComponentClass::builder("Alert")
        .template("jinja", "{{ message }}")
        .render_if(|c| c.arg("message").is_some_and(|m| !m.is_null()))
        .build()
        .unwrap();
    let runtime = Runtime::new();

    let mut hidden = Component::new(class.clone(), json!({"message": null})).unwrap();
    assert!(runtime.render(&mut hidden).unwrap().is_empty());

    let mut shown = Component::new(class, json!({"message": "hi"})).unwrap();
    assert_eq!(runtime.render(&mut shown).unwrap().as_str(), "hi");
}

#[test]
fn before_render_errors_propagate() {
    let class = ComponentClass::builder("Probe")
        .template("txt", "never")
        .before_render(|_| Err(HookError::before("not allowed").into()))
        .build()
        .unwrap();
    let mut component = Component::new(class, json!({})).unwrap();
    let err = render(&mut component).unwrap_err();
    assert!(matches!(err, ComponentError::Hook(_)));
    assert_eq!(component.state(), RenderState::Aborted);
}

#[test]
fn preamble_and_postamble_wrap_output() {
    let class = ComponentClass::builder("Probe")
        .template("txt", "body")
        .output_preamble(|_| Markup::from(Html::safe("<section>")))
        .output_postamble(|_| Markup::from("</section>"))
        .build()
        .unwrap();
    let mut component = Component::new(class, json!({})).unwrap();
    assert_eq!(
        render(&mut component).unwrap().as_str(),
        "<section>body&lt;&#x2f;section&gt;"
    );
}

#[test]
fn after_render_transforms_output() {
    let class = ComponentClass::builder("Probe")
        .template("txt", "body")
        .after_render(|_, html| Ok(Html::safe(html.as_str().to_uppercase())))
        .after_render(|_, html| Ok(Html::safe(format!("{}!", html.as_str()))))
        .build()
        .unwrap();
    let mut component = Component::new(class, json!({})).unwrap();
    assert_eq!(render(&mut component).unwrap().as_str(), "BODY!");
}

// ============================================================================
// Rescue
// ============================================================================

#[test]
fn rescue_handles_matching_errors() {
    let class = ComponentClass::builder("Record")
        .call(|scope| {
            let id = scope.arg("id").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            Err(ComponentError::custom(NotFound(id)))
        })
        .rescue_from::<NotFound, _>(|err, _| Ok(Html::escape(&format!("missing #{}", err.0))))
        .build()
        .unwrap();
    let mut component = Component::new(class, json!({"id": 7})).unwrap();
    assert_eq!(render(&mut component).unwrap().as_str(), "missing #7");
    assert_eq!(component.state(), RenderState::Done);
}

#[test]
fn rescue_walks_the_source_chain() {
    let class = ComponentClass::builder("Record")
        .call(|_| Err(ComponentError::custom(LookupFailed(NotFound(3)))))
        .rescue_from::<NotFound, _>(|err, _| Ok(Html::escape(&format!("gone {}", err.0))))
        .build()
        .unwrap();
    let mut component = Component::new(class, json!({})).unwrap();
    assert_eq!(render(&mut component).unwrap().as_str(), "gone 3");
}

#[test]
fn latest_rescue_handler_wins() {
    let class = ComponentClass::builder("Record")
        .call(|_| Err(ComponentError::custom(NotFound(1))))
        .rescue_from::<NotFound, _>(|_, _| Ok(Html::safe("first")))
        .rescue_from::<NotFound, _>(|_, _| Ok(Html::safe("second")))
        .build()
        .unwrap();
    let mut component = Component::new(class, json!({})).unwrap();
    assert_eq!(render(&mut component).unwrap().as_str(), "second");
}

#[test]
fn unmatched_errors_are_reraised() {
    let class = ComponentClass::builder("Record")
        .call(|_| Err(ComponentError::custom(LookupFailed(NotFound(1)))))
        .rescue_from::<std::io::Error, _>(|_, _| Ok(Html::safe("io")))
        .build()
        .unwrap();
    let mut component = Component::new(class, json!({})).unwrap();
    let err = render(&mut component).unwrap_err();
    assert!(matches!(err, ComponentError::Custom(_)));
    assert_eq!(component.state(), RenderState::Aborted);
}

#[test]
fn rescue_handler_errors_propagate() {
    let class = ComponentClass::builder("Record")
        .call(|_| Err(ComponentError::custom(NotFound(1))))
        .rescue_from::<NotFound, _>(|_, _| Err(ComponentError::custom(LookupFailed(NotFound(2)))))
        .build()
        .unwrap();
    let mut component = Component::new(class, json!({})).unwrap();
    let err = render(&mut component).unwrap_err();
    assert_eq!(err.to_string(), "lookup failed");
}

#[test]
fn template_errors_can_be_rescued() {
    let class = ComponentClass::builder("Broken")
        .template("jinja", "{{ missing_filter | nope }}")
        .rescue_from::<trellis_render::RenderError, _>(|_, _| Ok(Html::safe("fallback")))
        .build()
        .unwrap();
    let mut component = Component::new(class, json!({})).unwrap();
    assert_eq!(render(&mut component).unwrap().as_str(), "fallback");
}
