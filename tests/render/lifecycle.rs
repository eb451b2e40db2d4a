use super::{container, Log};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use twig::{h, on_mount, on_unmount, on_update, Component, Lifecycle, Props, Value, Vdom, VdomError};

fn named(tag: &'static str, log: &Log) -> Component {
    let (m, u) = (log.clone(), log.clone());
    let base = Component::new(move |props: &Props| h(tag, (), props.children().to_vec()));
    on_unmount(
        move |_: &Lifecycle, _: &[Value]| u.push(format!("unmount {}", tag)),
        on_mount(move |_: &Lifecycle, _: &[Value]| m.push(format!("mount {}", tag)), base),
    )
}

#[test]
fn mount_hooks_wait_for_flush_and_run_in_preorder() {
    let log = Log::default();
    let (a, b, c, d) = (
        named("section", &log),
        named("header", &log),
        named("h1", &log),
        named("footer", &log),
    );
    let tree = h(&a, (), (h(&b, (), h(&c, (), ())), h(&d, (), ())));

    let root = container();
    let vdom = Vdom::new();
    vdom.mount(tree, (), &root).unwrap();
    assert_eq!(
        root.inner_html(),
        "<section><header><h1></h1></header><footer></footer></section>"
    );
    assert_eq!(log.len(), 0);
    assert_eq!(vdom.pending(), 4);

    assert_eq!(vdom.flush(), 4);
    assert_eq!(
        log.take(),
        ["mount section", "mount header", "mount h1", "mount footer"]
    );
    assert_eq!(vdom.flush(), 0);
}

#[test]
fn the_mount_hook_sees_the_inserted_node() {
    let seen = Rc::new(Cell::new(false));
    let s = seen.clone();
    let comp = on_mount(
        move |cx: &Lifecycle, _: &[Value]| {
            let vdom = cx.vdom().upgrade().unwrap();
            s.set(vdom.dom_node(cx.node()).as_ref() == Some(cx.dom()) && cx.dom().parent().is_some());
        },
        Component::new(|_: &Props| h("canvas", (), ())),
    );

    let root = container();
    let vdom = Vdom::new();
    vdom.mount(&comp, (), &root).unwrap();
    vdom.flush();
    assert!(seen.get());
}

#[test]
fn removed_items_unmount_exactly_once() {
    let unmounted = Rc::new(Cell::new(0));
    let u = unmounted.clone();
    let item = on_unmount(
        move |_: &Lifecycle, _: &[Value]| u.set(u.get() + 1),
        Component::new(|props: &Props| h("li", (), props.children().to_vec())),
    );

    let count = Rc::new(Cell::new(3));
    let c = count.clone();
    let list = Component::new(move |_: &Props| {
        h("ul", (), (0..c.get()).map(|i| h(&item, (), i)).collect::<Vec<_>>())
    });

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(&list, (), &root).unwrap();
    vdom.flush();

    count.set(2);
    vdom.updater(&list, id).update(()).unwrap();
    assert_eq!(root.inner_html(), "<ul><li>0</li><li>1</li></ul>");
    assert_eq!(unmounted.get(), 0);

    vdom.flush();
    assert_eq!(unmounted.get(), 1);
    vdom.flush();
    assert_eq!(unmounted.get(), 1);

    vdom.unmount(id).unwrap();
    vdom.flush();
    assert_eq!(unmounted.get(), 3);
}

#[test]
fn replaced_nodes_unmount_and_the_replacement_mounts() {
    let log = Log::default();
    let (p, div) = (named("p", &log), named("div", &log));
    let flip = Rc::new(Cell::new(false));
    let f = flip.clone();
    let comp = Component::new(move |_: &Props| if f.get() { h(&div, (), ()) } else { h(&p, (), ()) });

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(&comp, (), &root).unwrap();
    vdom.flush();
    log.take();

    flip.set(true);
    vdom.updater(&comp, id).update(()).unwrap();
    vdom.flush();
    assert_eq!(log.take(), ["unmount p", "mount div"]);
}

#[test]
fn update_hooks_run_synchronously_on_patches_only() {
    let updates = Rc::new(Cell::new(0));
    let u = updates.clone();
    let comp = on_update(
        move |_: &Lifecycle, _: &[Value]| u.set(u.get() + 1),
        Component::new(|_: &Props| h("p", (), ())),
    );

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(&comp, (), &root).unwrap();
    assert_eq!(updates.get(), 0);

    vdom.updater(&comp, id).update(()).unwrap();
    assert_eq!(updates.get(), 1);
    vdom.updater(&comp, id).update(()).unwrap();
    assert_eq!(updates.get(), 2);
    assert_eq!(vdom.pending(), 0);
}

#[test]
fn the_vdom_is_busy_while_rendering() {
    let result = Rc::new(Cell::new(None));
    let r = result.clone();
    let comp = on_update(
        move |cx: &Lifecycle, _: &[Value]| {
            let vdom = cx.vdom().upgrade().unwrap();
            r.set(Some(vdom.unmount(cx.node())));
        },
        Component::new(|_: &Props| h("p", (), ())),
    );

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(&comp, (), &root).unwrap();
    vdom.updater(&comp, id).update(()).unwrap();

    assert_eq!(result.take(), Some(Err(VdomError::Busy)));
    assert!(vdom.contains(id));
}

#[test]
fn hooks_may_re_render_while_flushing() {
    let rendered = Rc::new(Cell::new(0));
    let r = rendered.clone();
    let comp = Component::new(move |_: &Props| {
        r.set(r.get() + 1);
        h("span", (), r.get())
    });
    let c = comp.clone();
    let comp = on_mount(
        move |cx: &Lifecycle, _: &[Value]| {
            let vdom = cx.vdom().upgrade().unwrap();
            vdom.updater(&c, cx.node()).update(()).unwrap();
            // Already flushing: this is a no-op.
            assert_eq!(vdom.flush(), 0);
        },
        comp,
    );

    let root = container();
    let vdom = Vdom::new();
    vdom.mount(&comp, (), &root).unwrap();
    vdom.flush();
    assert_eq!(root.inner_html(), "<span>2</span>");
    assert_eq!(rendered.get(), 2);
}

#[test]
fn flushing_through_a_weak_handle() {
    let mounted = Rc::new(Cell::new(false));
    let m = mounted.clone();
    let comp = on_mount(
        move |_: &Lifecycle, _: &[Value]| m.set(true),
        Component::new(|_: &Props| h("p", (), ())),
    );

    let root = container();
    let vdom = Vdom::new();
    let weak = vdom.weak();
    vdom.mount(&comp, (), &root).unwrap();
    assert_eq!(weak.flush(), Ok(1));
    assert!(mounted.get());

    drop(vdom);
    assert_eq!(weak.flush(), Err(VdomError::Dropped));
}

#[test]
fn stacked_hooks_of_one_kind_run_inner_first() {
    let log = Log::default();
    let (a, b) = (log.clone(), log.clone());
    let comp = on_mount(
        move |_: &Lifecycle, _: &[Value]| a.push("a"),
        on_mount(
            move |_: &Lifecycle, _: &[Value]| b.push("b"),
            Component::new(|_: &Props| h("nav", (), ())),
        ),
    );

    let root = container();
    let vdom = Vdom::new();
    vdom.mount(&comp, (), &root).unwrap();
    assert_eq!(vdom.flush(), 2);
    assert_eq!(log.take(), ["b", "a"]);
}

#[test]
fn hooks_receive_the_forwarded_args() {
    let seen: Rc<RefCell<Vec<Value>>> = Default::default();
    let s = seen.clone();
    let comp = on_update(
        move |_: &Lifecycle, args: &[Value]| s.borrow_mut().extend_from_slice(args),
        Component::new(|_: &Props| h("p", (), ())),
    );

    let root = container();
    let vdom = Vdom::new();
    let id = vdom.mount(&comp, (), &root).unwrap();
    vdom.updater(&comp, id)
        .update_with_args((), &[Value::from("step"), Value::from(2)])
        .unwrap();
    assert_eq!(*seen.borrow(), [Value::from("step"), Value::from(2)]);
}

#[test]
fn a_panicking_hook_does_not_stall_later_flushes() {
    let bad = on_mount(
        |_: &Lifecycle, _: &[Value]| panic!("mount failed"),
        Component::new(|_: &Props| h("p", (), ())),
    );
    let mounted = Rc::new(Cell::new(false));
    let m = mounted.clone();
    let good = on_mount(
        move |_: &Lifecycle, _: &[Value]| m.set(true),
        Component::new(|_: &Props| h("p", (), ())),
    );

    let root = container();
    let vdom = Vdom::new();
    vdom.mount(&bad, (), &root).unwrap();
    let result = panic::catch_unwind(AssertUnwindSafe(|| vdom.flush()));
    assert!(result.is_err());

    let other = container();
    vdom.mount(&good, (), &other).unwrap();
    assert_eq!(vdom.flush(), 1);
    assert!(mounted.get());
    assert_eq!(vdom.pending(), 0);
}
