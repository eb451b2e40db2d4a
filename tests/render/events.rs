use super::container;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use twig::dom::{memory, Event};
use twig::{h, Component, Props, Updater, Value, Vdom};

#[test]
fn listeners_attach_on_flush() {
    let clicks = Rc::new(Cell::new(0));
    let c = clicks.clone();
    let button = h(
        "button",
        Props::new().on("click", move |_: &Event| c.set(c.get() + 1)),
        "+",
    );

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(button, (), &root).unwrap();
    let dom = vdom.dom_node(id).unwrap();
    assert_eq!(root.inner_html(), "<button>+</button>");

    dom.dispatch("click");
    assert_eq!(clicks.get(), 0);
    assert_eq!(dom.listener_count("click"), 0);

    vdom.flush();
    assert_eq!(dom.listener_count("click"), 1);
    dom.dispatch("click");
    assert_eq!(clicks.get(), 1);
}

#[test]
fn event_names_are_lower_cased() {
    let seen = Rc::new(Cell::new(false));
    let s = seen.clone();
    let root = container();
    let vdom = Vdom::new();
    let id = vdom
        .mount(
            h("input", Props::new().attr("onKeyDown", twig::Handler::new(move |_| s.set(true))), ()),
            (),
            &root,
        )
        .unwrap();
    vdom.flush();

    let input = vdom.dom_node(id).unwrap();
    assert_eq!(root.inner_html(), "<input>");
    input.dispatch("keydown");
    assert!(seen.get());
}

#[test]
fn events_bubble_to_ancestors() {
    let from_li = Rc::new(Cell::new(false));
    let f = from_li.clone();
    let root = container();
    let vdom = Vdom::new();
    let id = vdom
        .mount(
            h(
                "ul",
                Props::new().on("click", move |e: &Event| f.set(e.target().tag_name() == Some("li"))),
                h("li", (), "x"),
            ),
            (),
            &root,
        )
        .unwrap();
    vdom.flush();

    let li = vdom.dom_node(vdom.children(id).unwrap()[0]).unwrap();
    li.dispatch("click");
    assert!(from_li.get());
}

#[test]
fn re_rendering_swaps_listeners() {
    let last = Rc::new(Cell::new(0));
    let l = last.clone();
    let comp = Component::new(move |props: &Props| {
        let n = props.get("n").and_then(|v| v.as_int()).unwrap_or(0);
        let l = l.clone();
        h("button", Props::new().attr("n", n).on("click", move |_| l.set(n)), n)
    });

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(&comp, Props::new().attr("n", 1), &root).unwrap();
    vdom.flush();
    let button = vdom.dom_node(id).unwrap();

    vdom.updater(&comp, id).update(Props::new().attr("n", 2)).unwrap();
    assert_eq!(root.inner_html(), r#"<button n="2">2</button>"#);
    // The old handler stays attached until the swap is flushed.
    button.dispatch("click");
    assert_eq!(last.get(), 1);

    memory::reset_mutations();
    vdom.flush();
    let mutations = memory::mutations();
    assert_eq!((mutations.listeners_removed, mutations.listeners_added), (1, 1));
    assert_eq!(button.listener_count("click"), 1);
    button.dispatch("click");
    assert_eq!(last.get(), 2);
}

#[test]
fn removed_nodes_lose_their_listeners() {
    let clicks = Rc::new(Cell::new(0));
    let c = clicks.clone();
    let root = container();
    let vdom = Vdom::new();
    let id = vdom
        .mount(
            h("a", Props::new().on("click", move |_| c.set(c.get() + 1)), "go"),
            (),
            &root,
        )
        .unwrap();
    vdom.flush();
    let a = vdom.dom_node(id).unwrap();

    vdom.unmount(id).unwrap();
    assert_eq!(a.listener_count("click"), 1);
    vdom.flush();
    assert_eq!(a.listener_count("click"), 0);

    a.dispatch("click");
    assert_eq!(clicks.get(), 0);
}

#[test]
fn handlers_can_update_their_own_tree() {
    let updater: Rc<RefCell<Option<Updater>>> = Default::default();
    let u = updater.clone();
    let counter = Component::new(move |props: &Props| {
        let n = props.get("count").and_then(Value::as_int).unwrap_or(0);
        let u = u.clone();
        let on_click = move |_: &Event| {
            if let Some(updater) = &*u.borrow() {
                updater.update(Props::new().attr("count", n + 1)).unwrap();
            }
        };
        h("button", Props::new().attr("count", n).on("click", on_click), n)
    });

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(&counter, (), &root).unwrap();
    *updater.borrow_mut() = Some(vdom.updater(&counter, id));
    vdom.flush();

    let button = vdom.dom_node(id).unwrap();
    button.dispatch("click");
    assert_eq!(root.inner_html(), r#"<button count="1">1</button>"#);

    vdom.flush();
    button.dispatch("click");
    assert_eq!(root.inner_html(), r#"<button count="2">2</button>"#);
    updater.borrow_mut().take();
}

#[test]
fn one_handler_under_two_spellings_fires_once() {
    let clicks = Rc::new(Cell::new(0));
    let c = clicks.clone();
    let handler = twig::Handler::new(move |_| c.set(c.get() + 1));
    let root = container();
    let vdom = Vdom::new();
    let id = vdom
        .mount(
            h(
                "button",
                Props::new().attr("onClick", handler.clone()).attr("onclick", handler),
                "once",
            ),
            (),
            &root,
        )
        .unwrap();
    vdom.flush();

    let button = vdom.dom_node(id).unwrap();
    assert_eq!(button.listener_count("click"), 1);
    button.dispatch("click");
    assert_eq!(clicks.get(), 1);
}
