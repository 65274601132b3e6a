//! Example configuration: a launcher mode, a stateful app-switch layer, a
//! window-management layer, and a right-hand symbol layer, rendered as the
//! daemon's JSON schema on stdout.

use anyhow::Result;
use keymodes::models::{hyper, mapping_table};
use keymodes::{
    compile_all, CompilationContext, Condition, DuoLayer, LayerHint, Mapping, Mode, ModeConfig,
    ProfileParameters, RuleGroup, RuleSource, ToEvent,
};

fn keybindstate(subcommand: &str) -> String {
    format!(r#"/bin/zsh -c "~/.local/bin/keybindstate {}""#, subcommand)
}

fn launcher_mode(ctx: &mut CompilationContext) -> Result<Mode> {
    let mut mode = Mode::new(
        ctx,
        ModeConfig::new("launcher", "Start programs")
            .hint("t=ITerm, f/b=Firefox, g=Chrome, s=Slack, Esc=nothing")
            .wholly_one_shot(),
    )?;
    mode.add_trigger(Mapping::simultaneous(["a", "l"])?);
    mode.add_trigger(Mapping::simultaneous(["a", ";"])?);
    mode.add_mappings(mapping_table(
        &[
            ("t", "ITerm"),
            ("g", "Google Chrome"),
            ("f", "Firefox"),
            ("b", "Firefox"),
            ("s", "Slack"),
        ],
        |key, app| Ok(Mapping::from_key(key)?.to_app(app)),
    )?);
    Ok(mode)
}

fn apps_layer(ctx: &mut CompilationContext) -> Result<DuoLayer> {
    let mut layer = DuoLayer::named(ctx, "w", "e", "apps-mode")?
        .leader()
        .notification(LayerHint::Auto);
    layer.add_mappings(mapping_table(
        &[
            ("t", "switch 'Iterm'"),
            ("g", "switch 'Google Chrome'"),
            ("f", "switch 'Firefox'"),
            ("n", "next"),
            ("p", "prev"),
            ("l", "last"),
        ],
        |key, subcommand| Ok(Mapping::from_key(key)?.to_shell(keybindstate(subcommand))),
    )?);
    Ok(layer)
}

fn window_mode(ctx: &mut CompilationContext) -> Result<Mode> {
    let mut mode = Mode::new(
        ctx,
        ModeConfig::new("window", "Window management")
            .hint("c: center | h/l: halves | m: maximize | r: restore")
            .wholly_one_shot(),
    )?;
    mode.add_trigger(Mapping::from_event(hyper("w")?));
    mode.add_mappings(mapping_table(
        &[
            ("c", "center"),
            ("h", "left-half"),
            ("l", "right-half"),
            ("m", "maximize"),
            ("r", "restore"),
        ],
        |key, action| {
            Ok(Mapping::from_key(key)?.to_shell(format!(
                "open -g raycast://extensions/raycast/window-management/{}",
                action
            )))
        },
    )?);
    Ok(mode)
}

fn symbol_layer(ctx: &mut CompilationContext) -> Result<DuoLayer> {
    let mut layer = DuoLayer::new(ctx, "d", "k")?
        .sticky(["escape", "caps_lock", "return_or_enter", "tab"])?
        .notification(LayerHint::Text(
            "j:{ k:} l:[ ;:] u:( i:)".to_string(),
        ))
        .when(Condition::app_matches("^.*firefox.*$")?.negate());
    layer.add_mappings(mapping_table(
        &[
            ("j", ToEvent::shifted("open_bracket")?),
            ("k", ToEvent::shifted("close_bracket")?),
            ("l", ToEvent::key("open_bracket")?),
            (";", ToEvent::key("close_bracket")?),
            ("u", ToEvent::shifted("9")?),
            ("i", ToEvent::shifted("0")?),
        ],
        |key, event| Ok(Mapping::from_key(key)?.to(event.clone())),
    )?);
    Ok(layer)
}

fn main() -> Result<()> {
    let mut ctx = CompilationContext::new();

    let caps_lock = RuleGroup {
        description: "CapsLock for lots of things".to_string(),
        conditions: vec![],
        manipulators: vec![Mapping::from_key("caps_lock")?
            .to_if_alone_key("a")?
            .held_down_threshold(60)],
    };

    let sources: Vec<RuleSource> = vec![
        caps_lock.into(),
        launcher_mode(&mut ctx)?.into(),
        apps_layer(&mut ctx)?.into(),
        window_mode(&mut ctx)?.into(),
        symbol_layer(&mut ctx)?.into(),
    ];

    let compiled = compile_all(&mut ctx, sources)?.with_parameters(ProfileParameters {
        to_if_held_down_threshold_ms: Some(110),
        ..ProfileParameters::default()
    });

    println!("{}", compiled.to_json()?);
    Ok(())
}
