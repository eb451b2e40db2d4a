use crate::arena::NodeId;
use crate::dom;
use crate::hooks::Hooks;
use crate::traversal::Traverse;
use crate::vdom::VdomWeak;
use fxhash::FxHashMap;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// What a virtual node renders to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// An element with the given tag name, such as `"div"` or `"svg"`.
    Element(Rc<str>),

    /// A text node. Its content is stored under the `value` prop.
    Text,
}

impl Kind {
    /// An element kind for the given tag name.
    #[inline]
    pub fn element(tag_name: &str) -> Kind {
        Kind::Element(tag_name.into())
    }

    /// The element's tag name, or `None` for text.
    #[inline]
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Kind::Element(tag) => Some(tag),
            Kind::Text => None,
        }
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        *self == Kind::Text
    }
}

/// An event handler.
///
/// Handlers compare equal only when they are the same allocation, so a
/// closure re-created on every render counts as a change.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&dom::Event)>);

impl Handler {
    /// Wrap a closure as an event handler.
    pub fn new<F>(f: F) -> Handler
    where
        F: 'static + Fn(&dom::Event),
    {
        Handler(Rc::new(f))
    }

    /// Invoke the handler.
    #[inline]
    pub fn call(&self, event: &dom::Event) {
        (self.0)(event)
    }

    /// The address of the handler's closure, used as its identity.
    #[inline]
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Handler) -> bool {
        self.addr() == other.addr()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handler(0x{:x})", self.addr())
    }
}

/// A prop value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Props whose key starts with `on` and whose value is a handler become
    /// event listeners, never attributes.
    Handler(Handler),
}

impl Value {
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }
}

/// The string form used for attribute values and text content.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Handler(_) => f.write_str("function"),
        }
    }
}

macro_rules! value_from {
    ( $( $ty:ty => |$v:ident| $e:expr ; )* ) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from($v: $ty) -> Value {
                    $e
                }
            }
        )*
    }
}

value_from! {
    &str => |s| Value::Str(s.to_string());
    String => |s| Value::Str(s);
    &String => |s| Value::Str(s.clone());
    i32 => |n| Value::Int(n.into());
    i64 => |n| Value::Int(n);
    u32 => |n| Value::Int(n.into());
    usize => |n| Value::Int(n as i64);
    f32 => |x| Value::Float(x.into());
    f64 => |x| Value::Float(x);
    bool => |b| Value::Bool(b);
    Handler => |h| Value::Handler(h);
}

/// A node's prop bag.
///
/// When a component is invoked, its props also carry the normalized children
/// it was given; those are never part of a rendered node's props.
#[derive(Clone, Default)]
pub struct Props {
    values: FxHashMap<String, Value>,
    children: Vec<VNode>,
}

impl Props {
    #[inline]
    pub fn new() -> Props {
        Props::default()
    }

    /// Builder-style insert.
    pub fn attr<K, V>(mut self, key: K, value: V) -> Props
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Builder-style listener registration: `.on("click", f)` is stored
    /// under the `onclick` key.
    pub fn on<F>(self, event: &str, f: F) -> Props
    where
        F: 'static + Fn(&dom::Event),
    {
        self.attr(format!("on{}", event), Handler::new(f))
    }

    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<Value>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of values, not counting children.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The children handed to a component invocation.
    #[inline]
    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    /// Overlay `other` onto `self`: `other`'s values win, and its children
    /// replace ours.
    pub fn extend(&mut self, other: Props) {
        self.values.extend(other.values);
        self.children = other.children;
    }

    /// Same keys, and pairwise equal values.
    pub fn shallow_eq(&self, other: &Props) -> bool {
        self.values == other.values
    }

    pub(crate) fn with_children(mut self, children: Vec<VNode>) -> Props {
        self.children = children;
        self
    }

    pub(crate) fn take_children(&mut self) -> Vec<VNode> {
        std::mem::take(&mut self.children)
    }

    /// A copy without event handlers.
    pub(crate) fn attributes_only(&self) -> Props {
        Props {
            values: self
                .values
                .iter()
                .filter(|(_, v)| v.as_handler().is_none())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            children: vec![],
        }
    }
}

impl From<()> for Props {
    #[inline]
    fn from(_: ()) -> Props {
        Props::new()
    }
}

impl<K, V> std::iter::FromIterator<(K, V)> for Props
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Props {
        Props {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            children: vec![],
        }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut map = f.debug_map();
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        for k in keys {
            map.entry(k, &self.values[k]);
        }
        if !self.children.is_empty() {
            map.entry(&"children", &self.children);
        }
        map.finish()
    }
}

/// A handle through which an application, or a combinator, can find the live
/// node that a virtual node was rendered into.
///
/// Attach it with `VNode::with_ref`. The reconciler binds it when the node is
/// rendered and unbinds it when the node is discarded.
#[derive(Clone, Default)]
pub struct NodeRef(Rc<RefCell<Option<(VdomWeak, NodeId)>>>);

impl NodeRef {
    #[inline]
    pub fn new() -> NodeRef {
        NodeRef::default()
    }

    /// The bound node, if the referenced node is currently rendered.
    pub fn get(&self) -> Option<NodeId> {
        self.0.borrow().as_ref().map(|(_, id)| *id)
    }

    /// The virtual DOM the referenced node is rendered by.
    pub fn vdom(&self) -> Option<VdomWeak> {
        self.0.borrow().as_ref().map(|(vdom, _)| vdom.clone())
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.0.borrow().is_some()
    }

    pub(crate) fn bind(&self, vdom: &VdomWeak, id: NodeId) {
        *self.0.borrow_mut() = Some((vdom.clone(), id));
    }

    pub(crate) fn unbind(&self) {
        *self.0.borrow_mut() = None;
    }

    #[inline]
    pub(crate) fn ptr_eq(&self, other: &NodeRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.get()).finish()
    }
}

/// A virtual DOM node: the description of an element or text node, built by
/// `h` and consumed by rendering.
#[derive(Clone, Debug)]
pub struct VNode {
    pub(crate) kind: Kind,
    pub(crate) props: Props,
    pub(crate) children: Vec<VNode>,
    pub(crate) hooks: Hooks,
    pub(crate) refs: SmallVec<[NodeRef; 1]>,
}

impl VNode {
    /// An element node. Prefer `h`, which also normalizes children and
    /// resolves components.
    pub fn element(tag_name: &str, mut props: Props, children: Vec<VNode>) -> VNode {
        debug_assert!(props.children.is_empty());
        props.children = vec![];
        VNode {
            kind: Kind::element(tag_name),
            props,
            children,
            hooks: Hooks::default(),
            refs: SmallVec::new(),
        }
    }

    /// A text node.
    pub fn text<T: Into<String>>(value: T) -> VNode {
        VNode {
            kind: Kind::Text,
            props: Props::new().attr("value", value.into()),
            children: vec![],
            hooks: Hooks::default(),
            refs: SmallVec::new(),
        }
    }

    /// Attach a `NodeRef` that will be bound to this node once rendered.
    pub fn with_ref(mut self, node_ref: NodeRef) -> VNode {
        if !self.refs.iter().any(|r| r.ptr_eq(&node_ref)) {
            self.refs.push(node_ref);
        }
        self
    }

    #[inline]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    #[inline]
    pub fn tag_name(&self) -> Option<&str> {
        self.kind.tag_name()
    }

    #[inline]
    pub fn props(&self) -> &Props {
        &self.props
    }

    #[inline]
    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    /// A text node's content.
    pub fn text_value(&self) -> Option<&str> {
        match self.kind {
            Kind::Text => Some(self.props.get("value").and_then(Value::as_str).unwrap_or("")),
            Kind::Element(_) => None,
        }
    }

    #[inline]
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Depth-first, preorder iteration over this node and its descendants.
    #[inline]
    pub fn traverse(&self) -> Traverse<'_> {
        Traverse::new(self)
    }
}
