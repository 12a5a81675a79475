//! End-to-end preview lifecycle tests: activation, fault containment,
//! teardown, event dispatch, timers, and multi-context isolation.

use kitbash_core::snippet::FragmentSet;
use kitbash_core::{
    defaults, PreviewController, PreviewHub, PreviewLimits, PreviewState, PreviewStatus,
    ScriptPhase,
};

fn fragments(markup: &str, style: &str, script: &str) -> FragmentSet {
    FragmentSet::new(markup, style, script)
}

#[test]
fn test_activation_renders_scoped_markup() {
    let mut preview = PreviewController::default();
    let status = preview.activate(&fragments(
        r#"<button class="btn">Go</button>"#,
        ".btn { color: red; }",
        "",
    ));

    assert_eq!(status, PreviewStatus::Ok);
    assert_eq!(preview.state(), PreviewState::Active);

    let token = preview.token().unwrap().to_string();
    let html = preview.html().unwrap();
    assert!(html.contains(&format!("data-kb=\"{}\"", token)));
    assert!(html.contains(r#"<button class="btn">Go</button>"#));
    assert!(html.contains("<style>"));
    assert_eq!(preview.html().unwrap(), html);
}

#[test]
fn test_activation_runs_the_script_against_the_surface() {
    let mut preview = PreviewController::default();
    let status = preview.activate(&fragments(
        r#"<p class="msg">placeholder</p>"#,
        "",
        "container.set_text('.msg', 'scripted')\nprint('booted')",
    ));

    assert!(status.is_ok());
    assert!(preview.html().unwrap().contains(r#"<p class="msg">scripted</p>"#));
    assert_eq!(preview.output(), vec!["booted".to_string()]);
}

#[test]
fn test_render_fault_when_markup_exceeds_limits() {
    let limits = PreviewLimits {
        max_depth: 2,
        ..PreviewLimits::default()
    };
    let mut preview = PreviewController::new(limits);
    let status = preview.activate(&fragments("<div><div><div>deep</div></div></div>", "", ""));

    assert!(matches!(status, PreviewStatus::RenderFault { .. }));
    assert_eq!(preview.html(), None);
    assert_eq!(preview.dispatch("click", "div", None).unwrap(), 0);
    assert_eq!(preview.tick(1000), 0);
}

#[test]
fn test_script_fault_keeps_the_surface_live() {
    let mut preview = PreviewController::default();
    let status = preview.activate(&fragments(
        r#"<button class="btn">Go</button>"#,
        "",
        "container.on('.btn', 'click', function() print('still bound') end)\nerror('setup exploded')",
    ));

    match &status {
        PreviewStatus::ScriptFault { message } => assert!(message.contains("setup exploded")),
        other => panic!("expected a script fault, got {:?}", other),
    }
    // Nothing presentable, but the instance is alive: the handler bound
    // before the fault still fires against the surviving surface.
    assert_eq!(preview.html(), None);
    assert_eq!(preview.dispatch("click", ".btn", None).unwrap(), 1);
    assert_eq!(preview.output(), vec!["still bound".to_string()]);
}

#[test]
fn test_handler_fault_does_not_change_status() {
    let mut preview = PreviewController::default();
    let status = preview.activate(&fragments(
        r#"<button class="btn">Go</button>"#,
        "",
        "container.on('.btn', 'click', function() error('handler exploded') end)",
    ));
    assert!(status.is_ok());

    assert_eq!(preview.dispatch("click", ".btn", None).unwrap(), 1);
    assert!(preview.status().is_ok());
    assert!(preview.html().is_some());

    let diagnostics = preview.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].phase, ScriptPhase::Handler);
    assert!(diagnostics[0].message.contains("handler exploded"));
}

#[test]
fn test_teardown_makes_stale_callbacks_harmless() {
    let mut preview = PreviewController::default();
    preview.activate(&fragments(
        r#"<p class="msg">hi</p>"#,
        "",
        "container.defer(500, function()\n\
           print('timer ran, wrote ' .. tostring(container.set_text('.msg', 'late')))\n\
         end)",
    ));

    preview.teardown();
    assert_eq!(preview.state(), PreviewState::TornDown);
    assert_eq!(preview.html(), None);

    // The stale timer still fires; its surface write lands nowhere.
    assert_eq!(preview.tick(500), 1);
    assert_eq!(preview.output(), vec!["timer ran, wrote 0".to_string()]);
    assert!(preview.diagnostics().is_empty());
    assert_eq!(preview.dispatch("click", ".msg", None).unwrap(), 0);
}

#[test]
fn test_activate_replaces_the_previous_instance() {
    let mut preview = PreviewController::default();
    preview.activate(&fragments(
        r#"<button class="alpha">A</button>"#,
        "",
        "container.on('.alpha', 'click', function() print('from first instance') end)",
    ));
    let first_token = preview.token().unwrap().to_string();
    assert_eq!(preview.dispatch("click", ".alpha", None).unwrap(), 1);

    preview.activate(&fragments(r#"<button class="alpha">B</button>"#, "", ""));
    let second_token = preview.token().unwrap().to_string();

    assert_ne!(first_token, second_token);
    let html = preview.html().unwrap();
    assert!(html.contains(">B<"));
    assert!(!html.contains(">A<"));
    // First instance's bindings and output died with it.
    assert_eq!(preview.dispatch("click", ".alpha", None).unwrap(), 0);
    assert!(preview.output().is_empty());
}

#[test]
fn test_refresh_rebuilds_from_the_fragments() {
    let set = fragments(
        r#"<p class="msg">original</p>"#,
        "",
        "container.on('.msg', 'click', function() container.set_text('.msg', 'mutated') end)",
    );
    let mut preview = PreviewController::default();
    preview.activate(&set);

    preview.dispatch("click", ".msg", None).unwrap();
    assert!(preview.html().unwrap().contains("mutated"));

    let status = preview.refresh(&set);
    assert!(status.is_ok());
    let html = preview.html().unwrap();
    assert!(html.contains("original"));
    assert!(!html.contains("mutated"));
}

#[test]
fn test_hub_contexts_are_independent() {
    let hub = PreviewHub::default();
    hub.activate(
        "card-1",
        &fragments(
            r#"<p class="msg">one</p>"#,
            "",
            "container.on('.msg', 'click', function() container.set_text('.msg', 'one clicked') end)",
        ),
    );
    hub.activate("card-2", &fragments(r#"<p class="msg">two</p>"#, "", ""));
    assert_eq!(hub.len(), 2);

    hub.dispatch("card-1", "click", ".msg", None).unwrap();
    assert!(hub.html("card-1").unwrap().contains("one clicked"));
    assert!(hub.html("card-2").unwrap().contains(">two<"));
}

#[test]
fn test_hub_close_is_final_and_unknown_contexts_are_quiet() {
    let hub = PreviewHub::default();
    hub.activate("card-1", &fragments("<p>x</p>", "", ""));
    hub.activate("card-2", &fragments("<p>y</p>", "", ""));

    hub.close("card-1");
    assert_eq!(hub.len(), 1);
    assert_eq!(hub.html("card-1"), None);
    assert_eq!(hub.status("card-1"), None);
    assert_eq!(hub.dispatch("card-1", "click", "p", None).unwrap(), 0);
    assert!(hub.html("card-2").is_some());

    // Closing again, or closing something that never existed, does nothing.
    hub.close("card-1");
    hub.close("never-existed");
    assert_eq!(hub.tick("never-existed", 100), 0);
    assert!(hub.output("never-existed").is_empty());
}

#[test]
fn test_builtin_snippets_activate_cleanly() {
    let mut preview = PreviewController::default();
    for snippet in defaults::snippets() {
        let status = preview.activate(&snippet.fragments);
        assert!(
            status.is_ok(),
            "built-in snippet {} failed to activate: {}",
            snippet.id,
            status
        );
        assert!(preview.html().is_some());
    }
}

#[test]
fn test_slider_snippet_reacts_to_input() {
    let slider = defaults::snippets()
        .into_iter()
        .find(|s| s.id == "slider-range")
        .unwrap();

    let mut preview = PreviewController::default();
    assert!(preview.activate(&slider.fragments).is_ok());

    let invoked = preview.dispatch("input", "#volumeSlider", Some("72")).unwrap();
    assert_eq!(invoked, 1);

    let html = preview.html().unwrap();
    assert!(html.contains(r#"<span id="slider-value">72</span>"#));
    assert!(html.contains("linear-gradient(to right"));
}

#[test]
fn test_button_group_switches_active_segment() {
    let group = defaults::snippets()
        .into_iter()
        .find(|s| s.id == "btn-group")
        .unwrap();

    let mut preview = PreviewController::default();
    assert!(preview.activate(&group.fragments).is_ok());
    assert!(preview
        .html()
        .unwrap()
        .contains(r#"<button id="seg-day" class="btn-segment active">"#));

    preview.dispatch("click", "#seg-week", None).unwrap();

    let html = preview.html().unwrap();
    assert!(html.contains(r#"<button id="seg-day" class="btn-segment">"#));
    assert!(html.contains(r#"<button id="seg-week" class="btn-segment active">"#));
}
