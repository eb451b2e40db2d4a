use super::container;
use fxhash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use twig::dom::{memory, Event};
use twig::{
    connect, connect_with, elm, h, with_idempotent_state, with_state, Component, Dispatcher,
    Props, State, Store, Updates, Value, Vdom, VdomError,
};

#[test]
fn state_survives_until_the_parent_re_renders() {
    let states: Rc<RefCell<Vec<State<u32>>>> = Default::default();
    let s = states.clone();
    let child = with_state(0u32, move |_: &Props, state: &State<u32>| {
        s.borrow_mut().push(state.clone());
        h("em", (), state.get())
    });
    let parent = Component::new(move |_: &Props| h("div", (), h(&child, (), ())));

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(&parent, (), &root).unwrap();
    let state = states.borrow().last().cloned().unwrap();
    state.set(9).unwrap();
    assert_eq!(root.inner_html(), "<div><em>9</em></div>");

    vdom.updater(&parent, id).update(()).unwrap();
    assert_eq!(root.inner_html(), "<div><em>0</em></div>");
    // The old instance's ref was taken over by the new one's at the same
    // position, so it no longer re-renders anything.
    assert!(!state.is_mounted());
    state.set(3).unwrap();
    assert_eq!(root.inner_html(), "<div><em>0</em></div>");
}

#[test]
fn state_changes_from_event_handlers() {
    let counter = with_state(0i64, |_: &Props, count: &State<i64>| {
        let count_ = count.clone();
        h(
            "button",
            Props::new().on("click", move |_: &Event| {
                count_.update(|n| *n += 1).unwrap();
            }),
            count.get(),
        )
    });

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(&counter, (), &root).unwrap();
    vdom.flush();
    let button = vdom.dom_node(id).unwrap();

    button.dispatch("click");
    assert_eq!(root.inner_html(), "<button>1</button>");
    vdom.flush();
    button.dispatch("click");
    vdom.flush();
    button.dispatch("click");
    assert_eq!(root.inner_html(), "<button>3</button>");
}

#[test]
fn keyed_state_survives_parent_re_renders() {
    let states: Rc<RefCell<FxHashMap<String, State<i32>>>> = Default::default();
    let s = states.clone();
    let item = with_idempotent_state(0, move |props: &Props, state: &State<i32>| {
        let key = props.get("key").map(|k| k.to_string()).unwrap_or_default();
        s.borrow_mut().insert(key.clone(), state.clone());
        h("li", (), (key, "=", state.get()))
    });

    let keys = Rc::new(RefCell::new(vec!["a", "b"]));
    let k = keys.clone();
    let list = Component::new(move |_: &Props| {
        let items: Vec<_> = k
            .borrow()
            .iter()
            .map(|key| h(&item, Props::new().attr("key", *key), ()))
            .collect();
        h("ul", (), items)
    });

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(&list, (), &root).unwrap();
    vdom.flush();
    let state = |key: &str| states.borrow()[key].clone();

    state("a").set(5).unwrap();
    state("b").set(7).unwrap();
    assert_eq!(root.inner_html(), "<ul><li>a=5</li><li>b=7</li></ul>");

    vdom.updater(&list, id).update(()).unwrap();
    assert_eq!(root.inner_html(), "<ul><li>a=5</li><li>b=7</li></ul>");

    memory::reset_mutations();
    vdom.updater(&list, id).update(()).unwrap();
    assert_eq!(memory::mutations().total(), 0);

    // Dropping `b` forgets its state once the removal is flushed.
    keys.borrow_mut().pop();
    vdom.updater(&list, id).update(()).unwrap();
    vdom.flush();
    keys.borrow_mut().push("b");
    vdom.updater(&list, id).update(()).unwrap();
    assert_eq!(root.inner_html(), "<ul><li>a=5</li><li>b=0</li></ul>");
}

#[derive(Clone, Debug, PartialEq)]
struct App {
    count: i64,
    title: String,
}

#[test]
fn connected_components_follow_their_slice() {
    let store = Store::new(App {
        count: 0,
        title: "t".into(),
    });
    let renders = Rc::new(Cell::new(0));
    let r = renders.clone();
    let view = connect(
        &store,
        |app: &App| app.count,
        move |_: &Props, count: &i64| {
            r.set(r.get() + 1);
            h("output", (), *count)
        },
    );

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(&view, (), &root).unwrap();
    assert_eq!(store.subscriber_count(), 0);
    vdom.flush();
    assert_eq!(store.subscriber_count(), 1);

    store.update(|app| app.count += 2);
    assert_eq!(root.inner_html(), "<output>2</output>");
    assert_eq!(renders.get(), 2);

    // Outside the slice: nothing re-renders.
    store.update(|app| app.title = "u".into());
    assert_eq!(renders.get(), 2);

    vdom.unmount(id).unwrap();
    vdom.flush();
    assert_eq!(store.subscriber_count(), 0);
    store.update(|app| app.count += 1);
    assert_eq!(renders.get(), 2);
}

#[test]
fn connect_with_a_custom_predicate() {
    let store = Store::new(0i64);
    let even = connect_with(
        &store,
        |n: &i64| *n,
        |old: &i64, new: &i64| old % 2 != new % 2,
        |_: &Props, n: &i64| h("i", (), *n),
    );

    let root = container();
    let vdom = Vdom::new();
    vdom.mount(&even, (), &root).unwrap();
    vdom.flush();

    store.set(2);
    assert_eq!(root.inner_html(), "<i>0</i>");
    store.set(3);
    assert_eq!(root.inner_html(), "<i>3</i>");
}

#[test]
fn elm_programs_dispatch_from_handlers() {
    let updates = Updates::new()
        .on("add", |n: &i64, args: &[Value]| n + args.first().and_then(Value::as_int).unwrap_or(1))
        .on("reset", |_: &i64, _: &[Value]| 0);
    let program = elm(0i64, updates, |n: &i64, dispatch: &Dispatcher<i64>| {
        let add = dispatch.clone();
        let reset = dispatch.clone();
        h(
            "div",
            (),
            (
                h("button", Props::new().attr("id", "add").on("click", move |_: &Event| {
                    add.dispatch("add", &[]).unwrap();
                }), "+"),
                h("button", Props::new().attr("id", "reset").on("click", move |_: &Event| {
                    reset.dispatch("reset", &[]).unwrap();
                }), "0"),
                h("output", (), *n),
            ),
        )
    });

    let root = container();
    let vdom = Vdom::new();
    let id = program.mount(&vdom, &root).unwrap();
    assert_eq!(program.root(), Some(id));
    vdom.flush();

    let buttons = root.children()[0].children();
    buttons[0].dispatch("click");
    vdom.flush();
    buttons[0].dispatch("click");
    vdom.flush();
    program.dispatcher().dispatch("add", &[Value::from(40)]).unwrap();
    assert_eq!(program.model(), 42);
    assert!(root.inner_html().ends_with("<output>42</output></div>"));

    buttons[1].dispatch("click");
    assert_eq!(program.model(), 0);
    assert!(root.inner_html().ends_with("<output>0</output></div>"));

    assert_eq!(
        program.dispatcher().dispatch("undo", &[]),
        Err(VdomError::UnknownAction("undo".into()))
    );
}
