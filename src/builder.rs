//! The hyperscript builder: `h(tag_or_component, props, children)`.
//!
//! ## Example
//!
//! ```
//! use twig::{h, Component, Props};
//!
//! let greeting = Component::new(|props: &Props| {
//!     h("h1", (), h("span", Props::new().attr("id", 123), props.children().to_vec()))
//! });
//!
//! let node = h(&greeting, (), ("hello ", "world"));
//! assert_eq!(node.tag_name(), Some("h1"));
//! ```

use crate::vnode::{Props, VNode, Value};
use std::fmt;
use std::rc::Rc;

/// A component: a function from props (and optional forwarded arguments) to
/// either a node or a further component.
///
/// Components are called eagerly by `h`; rendered trees never contain them.
#[derive(Clone)]
pub struct Component(Rc<dyn Fn(&Props, &[Value]) -> Rendered>);

impl Component {
    /// A component that only looks at its props.
    pub fn new<F, R>(f: F) -> Component
    where
        F: 'static + Fn(&Props) -> R,
        R: Into<Rendered>,
    {
        Component(Rc::new(move |props, _args| f(props).into()))
    }

    /// A component that also receives the positional arguments forwarded by
    /// `Updater::update_with_args`.
    pub fn with_args<F, R>(f: F) -> Component
    where
        F: 'static + Fn(&Props, &[Value]) -> R,
        R: Into<Rendered>,
    {
        Component(Rc::new(move |props, args| f(props, args).into()))
    }

    /// Call the component once, without resolving what it returns.
    #[inline]
    pub fn call(&self, props: &Props, args: &[Value]) -> Rendered {
        (self.0)(props, args)
    }

    /// Call the component and keep calling whatever components it returns
    /// until a node comes out.
    pub fn invoke(&self, props: &Props, args: &[Value]) -> VNode {
        resolve(self.call(props, args), props)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Component({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// What a component returns.
#[derive(Debug)]
pub enum Rendered {
    Node(VNode),
    /// A higher-order component handed back a further component; it is
    /// called with the same props and children.
    Component(Component),
}

impl From<VNode> for Rendered {
    #[inline]
    fn from(node: VNode) -> Rendered {
        Rendered::Node(node)
    }
}

impl From<Component> for Rendered {
    #[inline]
    fn from(component: Component) -> Rendered {
        Rendered::Component(component)
    }
}

pub(crate) fn resolve(mut rendered: Rendered, props: &Props) -> VNode {
    loop {
        match rendered {
            Rendered::Node(node) => return node,
            Rendered::Component(component) => rendered = component.call(props, &[]),
        }
    }
}

/// The first argument to `h`: a tag name or a component.
#[derive(Clone, Debug)]
pub enum Tag {
    Name(Rc<str>),
    Component(Component),
}

impl From<&str> for Tag {
    #[inline]
    fn from(name: &str) -> Tag {
        Tag::Name(name.into())
    }
}

impl From<String> for Tag {
    #[inline]
    fn from(name: String) -> Tag {
        Tag::Name(name.into())
    }
}

impl From<Component> for Tag {
    #[inline]
    fn from(component: Component) -> Tag {
        Tag::Component(component)
    }
}

impl From<&Component> for Tag {
    #[inline]
    fn from(component: &Component) -> Tag {
        Tag::Component(component.clone())
    }
}

/// A single child argument, before normalization.
#[derive(Debug)]
pub enum Child {
    Node(VNode),
    /// A string, number or boolean. Runs of these are coalesced into one
    /// text node.
    Primitive(String),
    /// An inline list of children, spliced in place.
    List(Vec<Child>),
}

impl From<VNode> for Child {
    #[inline]
    fn from(node: VNode) -> Child {
        Child::Node(node)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(children: Vec<T>) -> Child {
        Child::List(children.into_iter().map(Into::into).collect())
    }
}

/// `None` contributes nothing.
impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(child: Option<T>) -> Child {
        match child {
            Some(child) => child.into(),
            None => Child::List(vec![]),
        }
    }
}

macro_rules! primitive_child {
    ( $( $ty:ty ),* ) => {
        $(
            impl From<$ty> for Child {
                #[inline]
                fn from(p: $ty) -> Child {
                    Child::Primitive(p.to_string())
                }
            }
        )*
    }
}

primitive_child!(&str, String, &String, i32, i64, u32, u64, usize, f32, f64, bool, char);

/// Anything that can be the children argument of `h`.
pub trait IntoChildren {
    fn into_children(self) -> Vec<Child>;
}

impl IntoChildren for () {
    #[inline]
    fn into_children(self) -> Vec<Child> {
        vec![]
    }
}

impl<T: Into<Child>> IntoChildren for Vec<T> {
    fn into_children(self) -> Vec<Child> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Child>> IntoChildren for Option<T> {
    fn into_children(self) -> Vec<Child> {
        self.into_iter().map(Into::into).collect()
    }
}

macro_rules! single_child {
    ( $( $ty:ty ),* ) => {
        $(
            impl IntoChildren for $ty {
                #[inline]
                fn into_children(self) -> Vec<Child> {
                    vec![self.into()]
                }
            }
        )*
    }
}

single_child!(Child, VNode, &str, String, &String, i32, i64, u32, u64, usize, f32, f64, bool, char);

macro_rules! tuple_children {
    ( $( ( $( $name:ident ),* ) )* ) => {
        $(
            #[allow(non_snake_case)]
            impl<$( $name: Into<Child> ),*> IntoChildren for ( $( $name, )* ) {
                fn into_children(self) -> Vec<Child> {
                    let ( $( $name, )* ) = self;
                    vec![ $( $name.into() ),* ]
                }
            }
        )*
    }
}

tuple_children! {
    (A)
    (A, B)
    (A, B, C)
    (A, B, C, D)
    (A, B, C, D, E)
    (A, B, C, D, E, F)
    (A, B, C, D, E, F, G)
    (A, B, C, D, E, F, G, H)
}

/// Flatten inline lists and coalesce every run of primitives into a single
/// text node.
pub(crate) fn normalize(children: Vec<Child>) -> Vec<VNode> {
    fn walk(children: Vec<Child>, out: &mut Vec<VNode>, text: &mut Option<String>) {
        for child in children {
            match child {
                Child::Node(node) => {
                    if let Some(t) = text.take() {
                        out.push(VNode::text(t));
                    }
                    out.push(node);
                }
                Child::Primitive(p) => text.get_or_insert_with(String::new).push_str(&p),
                Child::List(list) => walk(list, out, text),
            }
        }
    }

    let mut out = Vec::with_capacity(children.len());
    let mut text = None;
    walk(children, &mut out, &mut text);
    if let Some(t) = text {
        out.push(VNode::text(t));
    }
    out
}

/// Build a virtual node.
///
/// With a tag name, this returns an element with the given props and the
/// normalized children. With a component, the component is called right
/// away with the props and a `children` entry holding the normalized
/// children; if it returns a further component, that one is called the same
/// way, until a node comes out.
pub fn h<T, P, C>(tag: T, props: P, children: C) -> VNode
where
    T: Into<Tag>,
    P: Into<Props>,
    C: IntoChildren,
{
    let mut props = props.into();
    let children = normalize(children.into_children());
    match tag.into() {
        Tag::Name(name) => {
            // Caller-supplied children in the props never reach elements.
            props.take_children();
            VNode::element(&name, props, children)
        }
        Tag::Component(component) => component.invoke(&props.with_children(children), &[]),
    }
}
