use std::cell::RefCell;
use std::rc::Rc;

use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;
use crate::arena::MemoryPool;
use crate::parser::parse;
use crate::runtime::{EvaluateContext, NailangRuntime, RuntimeErrorKind, large_context};

#[derive(Debug, Clone, PartialEq)]
struct Light {
    name: String,
    intensity: f64,
    enabled: bool,
}

impl Light {
    fn new(name: &str, intensity: f64) -> Self {
        Self {
            name: name.to_string(),
            intensity,
            enabled: true,
        }
    }
}

fn light_handler() -> AutoVarHandler<Light> {
    let mut handler = AutoVarHandler::new("Light");
    handler.add_direct_member("Name", |light: &Light| Arg::from(light.name.clone()));
    handler.add_proxy_member(
        "Intensity",
        |light: &Light| Arg::FP(light.intensity),
        |light: &mut Light, value| match value.get_fp() {
            Some(v) if v >= 0.0 => {
                light.intensity = v;
                true
            }
            _ => false,
        },
    );
    handler
        .add_proxy_member(
            "Enabled",
            |light: &Light| Arg::Bool(light.enabled),
            |light: &mut Light, value| value.get_bool().map(|v| light.enabled = v).is_some(),
        )
        .set_const(true);
    handler.set_extend_indexer(|lights: &[Light], index| match index {
        Arg::Str(name) => lights.iter().position(|light| light.name == *name),
        _ => None,
    });
    handler
}

fn scene() -> (Rc<AutoVarHandler<Light>>, Rc<RefCell<Light>>, Rc<RefCell<Vec<Light>>>) {
    let handler = Rc::new(light_handler());
    let key = Rc::new(RefCell::new(Light::new("key", 1.0)));
    let all = Rc::new(RefCell::new(vec![Light::new("key", 1.0), Light::new("fill", 0.5)]));
    (handler, key, all)
}

// ============================================================================
// Single objects
// ============================================================================

#[test]
fn reads_members() {
    let (handler, key, _) = scene();
    let var = handler.create_var(&key);
    assert_eq!(var.query(Query::Member("Name")), Ok(Some(Arg::str("key"))));
    assert_eq!(var.query(Query::Member("Intensity")), Ok(Some(Arg::FP(1.0))));
    assert_eq!(var.query(Query::Member("Missing")), Ok(None));
    assert_eq!(var.query(Query::Index(&Arg::Int(0))), Ok(None));
    assert_eq!(var.to_display_string(), "[Light]");
    assert_eq!(var.handler().describe_type().name, "Light");
}

#[test]
fn proxy_members_validate_writes() {
    let (handler, key, _) = scene();
    let var = handler.create_var(&key);
    assert_eq!(var.assign_member("Intensity", Arg::Int(3)), Ok(AssignOutcome::Assigned));
    assert_eq!(key.borrow().intensity, 3.0);
    assert_eq!(
        var.assign_member("Intensity", Arg::FP(-1.0)),
        Err(QueryError::Rejected("Intensity".to_string()))
    );
    assert_eq!(key.borrow().intensity, 3.0);
}

#[test]
fn read_only_members_and_handles() {
    let (handler, key, _) = scene();
    let var = handler.create_var(&key);
    assert_eq!(
        var.assign_member("Enabled", Arg::Bool(false)),
        Err(QueryError::NotAssignable("Light.Enabled".to_string()))
    );
    assert!(matches!(var.assign_member("Name", Arg::str("x")), Err(QueryError::NotAssignable(_))));
    assert!(matches!(var.assign_member("Missing", Arg::Int(1)), Err(QueryError::NoMember { .. })));

    let frozen = handler.create_const_var(&key);
    assert!(matches!(frozen.assign_member("Intensity", Arg::Int(1)), Err(QueryError::NotAssignable(_))));
    assert!(key.borrow().enabled);
}

#[test]
fn whole_object_assignment() {
    let (handler, key, _) = scene();
    let var = handler.create_var(&key);
    assert_eq!(var.assign(Arg::Int(1)), Ok(AssignOutcome::NotSupported));

    let mut handler = light_handler();
    handler.set_assigner(|light, value| match value {
        Arg::Str(name) => {
            light.name = name.into_owned();
            Ok(())
        }
        other => Err(format!("cannot rename to [{}]", other.type_name())),
    });
    let handler = Rc::new(handler);
    let var = handler.create_var(&key);
    assert_eq!(var.assign(Arg::str("rim")), Ok(AssignOutcome::Assigned));
    assert_eq!(key.borrow().name, "rim");
    assert_eq!(var.assign(Arg::Int(1)), Err(QueryError::Host("cannot rename to [int]".to_string())));
    assert!(matches!(handler.create_const_var(&key).assign(Arg::str("x")), Err(QueryError::NotAssignable(_))));
}

#[test]
fn released_and_busy_objects() {
    let (handler, key, _) = scene();
    let var = handler.create_var(&key);
    {
        let _guard = key.borrow_mut();
        assert_eq!(var.query(Query::Member("Name")), Err(QueryError::Busy));
    }
    drop(key);
    assert_eq!(var.query(Query::Member("Name")), Err(QueryError::Released));
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn array_length_and_indexing() {
    let (handler, _, all) = scene();
    let lights = handler.create_array_var(&all);
    assert_eq!(lights.query(Query::Member("Length")), Ok(Some(Arg::Uint(2))));
    assert_eq!(lights.to_display_string(), "[Light; 2]");

    let Ok(Some(Arg::Custom(last))) = lights.query(Query::Index(&Arg::Int(-1))) else {
        panic!("expected an element handle");
    };
    assert_eq!(last.slot, VarSlot::Element(1));
    assert_eq!(last.query(Query::Member("Name")), Ok(Some(Arg::str("fill"))));

    let Ok(Some(Arg::Custom(by_name))) = lights.query(Query::Index(&Arg::str("fill"))) else {
        panic!("expected an element handle");
    };
    assert_eq!(by_name, last);

    assert_eq!(
        lights.query(Query::Index(&Arg::Uint(2))),
        Err(QueryError::IndexOutOfBound { index: 2, len: 2 })
    );
    assert_eq!(lights.query(Query::Index(&Arg::str("none"))), Err(QueryError::IndexType("string")));
}

#[test]
fn array_elements_write_through() {
    let (handler, _, all) = scene();
    let lights = handler.create_array_var(&all);
    assert_eq!(lights.assign(Arg::Int(1)), Err(QueryError::ArrayAssign));
    assert_eq!(lights.assign_member("Intensity", Arg::Int(1)), Err(QueryError::ArrayAssign));
    lights.element(0).assign_member("Intensity", Arg::FP(0.25)).unwrap();
    assert_eq!(all.borrow()[0].intensity, 0.25);
    // Elements removed by the host report an out of bound access.
    all.borrow_mut().clear();
    assert!(matches!(
        lights.element(1).query(Query::Member("Name")),
        Err(QueryError::IndexOutOfBound { index: 1, len: 0 })
    ));
}

#[test]
fn bidirectional_index() {
    assert_eq!(bidir_index(3, &Arg::Int(-3)), Ok(0));
    assert_eq!(bidir_index(3, &Arg::Uint(2)), Ok(2));
    assert_eq!(bidir_index(3, &Arg::Int(-4)), Err(QueryError::IndexOutOfBound { index: -4, len: 3 }));
    assert_eq!(bidir_index(0, &Arg::Int(0)), Err(QueryError::IndexOutOfBound { index: 0, len: 0 }));
    assert_eq!(bidir_index(1, &Arg::FP(0.0)), Err(QueryError::IndexType("fp")));
}

// ============================================================================
// Scripts
// ============================================================================

#[test]
fn scripts_read_and_write_host_objects() {
    let (handler, key, all) = scene();
    let pool = MemoryPool::new();
    let block = parse(
        &pool,
        indoc! {r#"
            name = light.Name;
            count = lights.Length;
            fill = lights["fill"];
            dim = fill.Intensity;
            light.Intensity = 4;
            fill.Intensity = 2;
            light = 3;
        "#},
        "scene.nl",
    )
    .unwrap();
    let mut runtime = NailangRuntime::new(&pool, large_context());
    {
        let mut root = runtime.root().borrow_mut();
        root.set_arg("light", Arg::Custom(handler.create_var(&key)), true);
        root.set_arg("lights", Arg::Custom(handler.create_array_var(&all)), true);
    }
    runtime.execute(block, None).unwrap();

    let root = runtime.root().borrow();
    assert_eq!(root.lookup_arg("name"), Some(Arg::str("key")));
    assert_eq!(root.lookup_arg("count"), Some(Arg::Uint(2)));
    assert_eq!(root.lookup_arg("dim"), Some(Arg::FP(0.5)));
    assert_eq!(key.borrow().intensity, 4.0);
    assert_eq!(all.borrow()[1].intensity, 2.0);
    // No assigner: the object stays in place.
    assert!(matches!(root.lookup_arg("light"), Some(Arg::Custom(_))));
}

#[test]
fn script_errors_from_host_objects() {
    let (handler, key, _) = scene();
    let pool = MemoryPool::new();
    let block = parse(&pool, "light.Intensity = -1;", "scene.nl").unwrap();
    let mut runtime = NailangRuntime::new(&pool, large_context());
    runtime
        .root()
        .borrow_mut()
        .set_arg("light", Arg::Custom(handler.create_var(&key)), true);
    let err = runtime.execute(block, None).unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::Query(QueryError::Rejected("Intensity".to_string())));
}
