use std::cell::RefCell;
use std::rc::Rc;

use indoc::indoc;
use nailang::custom_var::{AutoVarHandler, QueryError};
use nailang::runtime::{Arg, HostError, NailangHost, RuntimeErrorKind};
use nailang::{Engine, EngineOptions, Error};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq)]
struct Lens {
    focus: f64,
    model: String,
}

#[derive(Debug)]
struct Camera {
    fov: f64,
    lens: Rc<RefCell<Lens>>,
}

fn lens_handler() -> Rc<AutoVarHandler<Lens>> {
    let mut handler = AutoVarHandler::new("Lens");
    handler.add_proxy_member(
        "Focus",
        |lens: &Lens| Arg::FP(lens.focus),
        |lens: &mut Lens, value| match value.get_fp() {
            Some(v) if v > 0.0 => {
                lens.focus = v;
                true
            }
            _ => false,
        },
    );
    handler.add_direct_member("Model", |lens: &Lens| Arg::from(lens.model.clone()));
    handler.set_extend_indexer(|lenses: &[Lens], index| match index {
        Arg::Str(model) => lenses.iter().position(|lens| lens.model == *model),
        _ => None,
    });
    Rc::new(handler)
}

fn camera_handler(lenses: Rc<AutoVarHandler<Lens>>) -> Rc<AutoVarHandler<Camera>> {
    let mut handler = AutoVarHandler::new("Camera");
    handler.add_proxy_member(
        "Fov",
        |camera: &Camera| Arg::FP(camera.fov),
        |camera: &mut Camera, value| value.get_fp().map(|v| camera.fov = v).is_some(),
    );
    handler.add_auto_member("Lens", move |camera: &Camera| lenses.create_var(&camera.lens));
    Rc::new(handler)
}

/// Exposes `$PickLens(model)` over a shared lens collection.
struct LensShop {
    handler: Rc<AutoVarHandler<Lens>>,
    stock: Rc<RefCell<Vec<Lens>>>,
}

impl<'a> NailangHost<'a> for LensShop {
    fn call_function(&mut self, name: &str, args: &[Arg<'a>]) -> Result<Option<Arg<'a>>, HostError> {
        if name != "PickLens" {
            return Ok(None);
        }
        let [Arg::Str(model)] = args else {
            return Err(HostError("PickLens expects a model name".to_string()));
        };
        let position = self.stock.borrow().iter().position(|lens| lens.model == *model);
        let all = self.handler.create_array_var(&self.stock);
        Ok(Some(position.map_or(Arg::Empty, |i| Arg::Custom(all.element(i)))))
    }
}

fn stock() -> Rc<RefCell<Vec<Lens>>> {
    Rc::new(RefCell::new(vec![
        Lens {
            focus: 35.0,
            model: "wide".to_string(),
        },
        Lens {
            focus: 85.0,
            model: "portrait".to_string(),
        },
    ]))
}

// ======== Nested host objects ========

#[test]
fn nested_members_read_and_write() {
    let lenses = lens_handler();
    let cameras = camera_handler(lenses.clone());
    let lens = Rc::new(RefCell::new(Lens {
        focus: 50.0,
        model: "normal".to_string(),
    }));
    let camera = Rc::new(RefCell::new(Camera { fov: 60.0, lens: lens.clone() }));

    let pool = EngineOptions::default().new_pool();
    let mut engine = Engine::new(&pool, EngineOptions::default(), |env| {
        env.register("camera", cameras.create_var(&camera));
    });
    engine
        .run_source(
            indoc! {r#"
                model = camera.Lens.Model;
                camera.Fov = camera.Fov / 2;
                camera.Lens.Focus += 10;
            "#},
            "camera.nl",
        )
        .unwrap();

    assert_eq!(engine.get_root("model"), Some(Arg::str("normal")));
    assert_eq!(camera.borrow().fov, 30.0);
    assert_eq!(lens.borrow().focus, 60.0);
}

#[test]
fn rejected_member_write_surfaces_as_query_error() {
    let lenses = lens_handler();
    let lens = Rc::new(RefCell::new(Lens {
        focus: 50.0,
        model: "normal".to_string(),
    }));
    let pool = EngineOptions::default().new_pool();
    let mut engine = Engine::new(&pool, EngineOptions::default(), |env| {
        env.register("lens", lenses.create_var(&lens));
    });
    let Err(Error::Runtime(err)) = engine.run_source("lens.Focus = 0;", "lens.nl") else {
        panic!("expected a runtime error");
    };
    assert_eq!(err.kind, RuntimeErrorKind::Query(QueryError::Rejected("Focus".to_string())));
    assert_eq!(lens.borrow().focus, 50.0);
}

// ======== Arrays and host functions ========

#[test]
fn arrays_index_by_position_and_name() {
    let lenses = lens_handler();
    let stock = stock();
    let pool = EngineOptions::default().new_pool();
    let mut engine = Engine::new(&pool, EngineOptions::default(), |env| {
        env.register("stock", lenses.create_array_var(&stock));
    });
    engine
        .run_source(
            indoc! {r#"
                count = stock.Length;
                lastLens = stock[-1];
                last = lastLens.Model;
                portrait = stock["portrait"];
                portrait.Focus = 90;
            "#},
            "stock.nl",
        )
        .unwrap_or_else(|err| panic!("{err}"));

    assert_eq!(engine.get_root("count"), Some(Arg::Uint(2)));
    assert_eq!(engine.get_root("last"), Some(Arg::str("portrait")));
    assert_eq!(stock.borrow()[1].focus, 90.0);
}

#[test]
fn host_function_returns_host_object() {
    let lenses = lens_handler();
    let stock = stock();
    let shop = LensShop {
        handler: lenses.clone(),
        stock: stock.clone(),
    };
    let pool = EngineOptions::default().new_pool();
    let mut engine = Engine::new(&pool, EngineOptions::default(), |_| {}).with_host(shop);
    engine
        .run_source(
            indoc! {r#"
                wide = $PickLens("wide");
                wide.Focus *= 2;
                none = $PickLens("fisheye") ?? "missing";
            "#},
            "shop.nl",
        )
        .unwrap_or_else(|err| panic!("{err}"));

    assert_eq!(stock.borrow()[0].focus, 70.0);
    assert_eq!(engine.get_root("none"), Some(Arg::str("missing")));

    let Err(Error::Runtime(err)) = engine.run_source("$PickLens(1);", "shop.nl") else {
        panic!("expected a host error");
    };
    assert_eq!(err.kind, RuntimeErrorKind::Host("PickLens expects a model name".to_string()));
}
