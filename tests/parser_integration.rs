//! End-to-end parsing of the fixture characters.

use std::path::{Path, PathBuf};

use caspar::model::{Argument, Mutability, StateKind, VariableType};
use caspar::modules::{CharacterModule, DefinesModule};
use caspar::parser::diag::DiagnosticCode;
use caspar::parser::{ParseOptions, parse_character, parse_metadata_only};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn standard_modules() -> Vec<Box<dyn CharacterModule>> {
    caspar::modules::standard_modules()
}

#[test]
fn parses_ryu_end_to_end() {
    let outcome = parse_character(&fixture("ryu.casp"), &standard_modules(), &ParseOptions::default())
        .expect("ryu.casp parses");
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    let ch = &outcome.character;

    assert_eq!(ch.metadata.name(), "Ryu");
    assert_eq!(ch.metadata.author(), "Test");
    assert_eq!(ch.metadata.get("EditorName"), Some("Ryu (Demo)"));

    // Variables: order, types, raw defaults.
    let names: Vec<&String> = ch.variables.keys().collect();
    assert_eq!(
        names,
        vec!["Health", "WalkSpeed", "TauntLine", "Hurtbox", "MaxJumps", "_EngineSlot"]
    );
    assert_eq!(ch.variables["Health"].value, "1000");
    assert_eq!(ch.variables["TauntLine"].value, "\"Come on!\"");
    assert_eq!(ch.variables["Hurtbox"].var_type, VariableType::Box);
    assert_eq!(ch.variables["Hurtbox"].subtype.as_deref(), Some("Standing"));
    assert_eq!(ch.variables["MaxJumps"].mutability, Mutability::Define);
    assert_eq!(ch.variables["_EngineSlot"].mutability, Mutability::Internal);

    // States.
    assert_eq!(ch.states["5H"].parent.as_deref(), Some("Standing"));
    assert_eq!(ch.states["Fireball"].kind, StateKind::Helper);
    assert_eq!(
        ch.states["Fireball"].transition_flags,
        vec!["NoCancel", "Projectile"]
    );
    let idle_phases: Vec<&String> = ch.states["Idle"].phases.keys().collect();
    assert_eq!(idle_phases, vec!["Init", "Action"]);

    // Nested instruction arguments survive intact.
    let attack = &ch.states["5H"].phases["Action"][0];
    assert_eq!(attack.name, "Attack");
    match &attack.args[0] {
        Argument::Call(set) => {
            assert_eq!(set.name, "Set");
            match &set.args[1] {
                Argument::Call(scale) => assert_eq!(scale.name, "Scale"),
                other => panic!("expected Scale call, got {other:?}"),
            }
        }
        other => panic!("expected Set call, got {other:?}"),
    }
    assert_eq!(attack.args[1], Argument::Str("heavy,slash".into()));

    // Module transforms: claimed blocks present, others absent.
    assert_eq!(
        outcome.character.transformed_data["Graphics"]["Defines"]["GRAPHICS_Scale"],
        serde_json::json!(3000)
    );
    assert_eq!(
        outcome.character.transformed_data["Core"]["Defines"]["CORE_Gravity"],
        serde_json::json!(980)
    );
    assert!(
        !outcome.character.transformed_data.contains_key("Anims"),
        "no Anims block: key must be absent, not null"
    );
}

#[test]
fn parsing_twice_is_byte_identical() {
    let path = fixture("ryu.casp");
    let first = parse_character(&path, &standard_modules(), &ParseOptions::default()).unwrap();
    let second = parse_character(&path, &standard_modules(), &ParseOptions::default()).unwrap();
    let a = caspar::writer::json::to_json_string(&first.character).unwrap();
    let b = caspar::writer::json::to_json_string(&second.character).unwrap();
    assert_eq!(a, b);
}

#[test]
fn metadata_fast_path() {
    let meta = parse_metadata_only(&fixture("ryu.casp")).unwrap();
    assert_eq!(meta.name(), "Ryu");
    assert_eq!(meta.skeleton(), None);
}

#[test]
fn strict_mode_passes_on_clean_file_with_idle() {
    let outcome = parse_character(
        &fixture("ryu.casp"),
        &standard_modules(),
        &ParseOptions { strict: true },
    )
    .expect("clean file passes strict mode");
    assert!(outcome.character.states.contains_key("Idle"));
}

#[test]
fn module_failure_never_aborts_parse() {
    struct Exploding;
    impl CharacterModule for Exploding {
        fn name(&self) -> &str {
            "Exploding"
        }
        fn transform_defines(
            &self,
            _defines: &caspar::model::SpecblockDefines,
        ) -> anyhow::Result<Option<serde_json::Value>> {
            anyhow::bail!("boom")
        }
    }

    let modules: Vec<Box<dyn CharacterModule>> = vec![
        Box::new(Exploding),
        Box::new(DefinesModule::new("Graphics", "Graphics")),
    ];
    let outcome = parse_character(&fixture("ryu.casp"), &modules, &ParseOptions::default())
        .expect("warning only");
    assert!(
        outcome
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::ModuleTransformFailure)
    );
    assert!(!outcome.character.transformed_data.contains_key("Exploding"));
    assert!(outcome.character.transformed_data.contains_key("Graphics"));
}

#[test]
fn shared_across_threads_after_assembly() {
    let outcome = parse_character(&fixture("ryu.casp"), &standard_modules(), &ParseOptions::default())
        .unwrap();
    let character = std::sync::Arc::new(outcome.character);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ch = std::sync::Arc::clone(&character);
            std::thread::spawn(move || ch.states["Idle"].phases["Action"].len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}
