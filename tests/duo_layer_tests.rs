//! Integration tests for duo layers: leader and sticky policies.

use keymodes::mode::MODE_OFF;
use keymodes::{CompilationContext, DuoLayer, FromEvent, LayerHint, Mapping, ToEvent};

fn has_exit_side_effects(mapping: &Mapping, name: &str) -> bool {
    mapping
        .to
        .contains(&ToEvent::set_variable(name, MODE_OFF))
}

#[test]
fn test_sticky_layer_persists_until_escape_set_key() {
    let mut ctx = CompilationContext::new();
    let mut layer = DuoLayer::new(&mut ctx, "d", "k")
        .unwrap()
        .sticky(["escape", "tab"])
        .unwrap();
    layer.add_mapping(Mapping::from_key("s").unwrap().to_key("s").unwrap());
    layer.add_mapping(Mapping::from_key("v").unwrap().to_key("v").unwrap());

    let groups = layer.compile();
    let manipulators = &groups[1].manipulators;

    // Two ordinary mapped keys must NOT exit the layer
    assert!(!has_exit_side_effects(&manipulators[0], "duo-layer-d-k"));
    assert!(!has_exit_side_effects(&manipulators[1], "duo-layer-d-k"));

    // The escape set (escape, tab) must exit it
    let tab_exit = manipulators
        .iter()
        .find(|m| {
            m.from
                == FromEvent::Key {
                    key: "tab".to_string(),
                    modifiers: vec![],
                }
        })
        .expect("tab must be mapped as an escape key");
    assert!(has_exit_side_effects(tab_exit, "duo-layer-d-k"));
    // Exit only: no primary action before the side effects
    assert_eq!(
        tab_exit.to[0],
        ToEvent::set_variable("duo-layer-d-k", MODE_OFF)
    );
}

#[test]
fn test_leader_layer_exits_after_any_mapping() {
    let mut ctx = CompilationContext::new();
    let mut layer = DuoLayer::new(&mut ctx, "a", "s").unwrap().leader();
    layer.add_mapping(
        Mapping::from_key("j")
            .unwrap()
            .to(ToEvent::shifted("open_bracket").unwrap()),
    );
    layer.add_mapping(
        Mapping::from_key("k")
            .unwrap()
            .to(ToEvent::shifted("close_bracket").unwrap()),
    );

    let groups = layer.compile();
    for mapping in &groups[1].manipulators {
        assert!(
            has_exit_side_effects(mapping, "duo-layer-a-s"),
            "leader layers are globally one-shot"
        );
    }
}

#[test]
fn test_layer_groups_follow_mode_shape() {
    let mut ctx = CompilationContext::new();
    let mut layer = DuoLayer::new(&mut ctx, "i", "o")
        .unwrap()
        .sticky(["escape", "caps_lock", "return_or_enter", "tab"])
        .unwrap()
        .notification(LayerHint::Text("app navigation".to_string()));
    layer.add_mapping(Mapping::from_key("l").unwrap().to_shell(
        r#"/bin/zsh -c "~/.local/bin/keybindstate next""#,
    ));

    let groups = layer.compile();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].description, "duo-layer-i-o: activate with i+o");
    assert_eq!(groups[1].description, "Key assignments for duo-layer-i-o");
    assert_eq!(groups[2].description, "Escape duo-layer-i-o");

    // Trigger shows the explicit hint
    assert_eq!(
        groups[0].manipulators[0].to[1],
        ToEvent::show_notification("duo-layer-i-o-mode-notification", "app navigation")
    );
    // 1 mapping + 4 escape-set keys
    assert_eq!(groups[1].manipulators.len(), 5);
}

#[test]
fn test_layer_compile_is_idempotent() {
    let mut ctx = CompilationContext::new();
    let mut layer = DuoLayer::new(&mut ctx, "w", "e").unwrap();
    layer.add_mapping(Mapping::from_key("t").unwrap().to_app("Iterm"));

    assert_eq!(layer.compile(), layer.compile());
}

#[test]
fn test_shell_actions_pass_through_unmodified() {
    let command = r#"/bin/zsh -c "~/.local/bin/keybindstate switch 'Google Chrome'""#;
    let mut ctx = CompilationContext::new();
    let mut layer = DuoLayer::new(&mut ctx, "w", "e").unwrap();
    layer.add_mapping(Mapping::from_key("g").unwrap().to_shell(command));

    let groups = layer.compile();
    let ToEvent::Shell { command: emitted } = &groups[1].manipulators[0].to[0] else {
        panic!("expected a shell action");
    };
    assert_eq!(emitted, command);
}
