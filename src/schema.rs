//! The schema tree: an arena of nodes addressed by [`NodeId`].
//!
//! `NodeId` is the identity the rest of this crate caches against: two arena
//! slots with identical `Kind`s are still two distinct cache keys,
//! which is what lets the same named record type, reused at two field
//! positions, iterate independently per position.

use serde_json::Value as Json;

/// The reserved user-property key under which generator directives live.
pub const DIRECTIVE_KEY: &str = "arg.properties";

/// Identifies a node within a [`Schema`] arena by its index.
///
/// This is the "schema-node identity" used for keying the options/regex/
/// iterator caches: it is stable for the lifetime of the [`Schema`], and two
/// structurally-identical nodes placed at different tree positions always
/// receive different `NodeId`s.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the raw arena index backing this id.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named field of a [`Kind::Record`].
#[derive(Clone, Debug)]
pub struct Field {
    /// The field's declared name.
    pub name: String,
    /// The schema of the field's value.
    pub schema: NodeId,
}

/// Decimal logical-type metadata attached to a `bytes` or `fixed` node.
#[derive(Copy, Clone, Debug)]
pub struct DecimalMeta {
    /// Total number of decimal digits, P >= 1.
    pub precision: u32,
    /// Number of digits right of the decimal point, 0 <= S <= P.
    pub scale: u32,
}

/// The shape of a single schema node, excluding its directives.
#[derive(Clone, Debug)]
pub enum Kind {
    /// The Avro `null` type.
    Null,
    /// The Avro `boolean` type.
    Boolean,
    /// The Avro `int` (32-bit signed) type.
    Int,
    /// The Avro `long` (64-bit signed) type.
    Long,
    /// The Avro `float` (32-bit IEEE) type.
    Float,
    /// The Avro `double` (64-bit IEEE) type.
    Double,
    /// The Avro `bytes` type, optionally carrying a `decimal` logical type.
    Bytes(Option<DecimalMeta>),
    /// The Avro `string` type.
    String,
    /// The Avro `fixed` type of the given byte size, optionally carrying a
    /// `decimal` logical type.
    Fixed {
        /// Declared size in bytes.
        size: usize,
        /// `decimal` logical-type metadata, if any.
        decimal: Option<DecimalMeta>,
    },
    /// The Avro `enum` type, with its ordered symbol list.
    Enum {
        /// Symbols in declaration order.
        symbols: Vec<String>,
    },
    /// The Avro `array` type.
    Array {
        /// Schema of the array's elements.
        items: NodeId,
    },
    /// The Avro `map` type. Keys are always strings.
    Map {
        /// Schema of the map's values.
        values: NodeId,
    },
    /// The Avro `record` type, with its ordered fields.
    Record {
        /// Fields in declaration order.
        fields: Vec<Field>,
    },
    /// The Avro `union` type, with its ordered member schemas.
    Union {
        /// Member schemas in declaration order.
        members: Vec<NodeId>,
    },
}

impl Kind {
    /// A short, stable name for this kind, used only in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Int => "int",
            Kind::Long => "long",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::Bytes(_) => "bytes",
            Kind::String => "string",
            Kind::Fixed { .. } => "fixed",
            Kind::Enum { .. } => "enum",
            Kind::Array { .. } => "array",
            Kind::Map { .. } => "map",
            Kind::Record { .. } => "record",
            Kind::Union { .. } => "union",
        }
    }
}

/// A single arena entry: a schema variant plus its raw, unparsed directive
/// JSON (if any). The directive resolver (`crate::directive`) lazily parses
/// and validates `directives` on first visit, caching the result.
#[derive(Clone, Debug)]
pub struct Node {
    /// The schema variant.
    pub kind: Kind,
    /// The raw JSON value of the `arg.properties` user-property, if present.
    pub directives: Option<Json>,
}

/// An Avro schema tree, stored as an arena of [`Node`]s.
///
/// Built either directly (see [`SchemaBuilder`]) or, with the
/// `apache-avro-interop` feature, converted from a parsed
/// [`apache_avro::Schema`](https://docs.rs/apache-avro) via
/// `crate::apache_avro_interop::from_apache_avro`.
#[derive(Clone, Debug)]
pub struct Schema {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Schema {
    /// The root node's id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Looks up a node by id.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this schema's builder (an internal
    /// invariant; `NodeId`s are never handed out across `Schema` instances by
    /// this crate's own APIs).
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Total number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty (never true for a [`Schema`] built via
    /// [`SchemaBuilder`], which always has at least a root node).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Incrementally builds a [`Schema`] arena.
///
/// Nodes are pushed depth-first; a parent referring to a child must push the
/// child first and capture its [`NodeId`], following the same "children
/// before parent" discipline as an arena-based AST builder.
///
/// ```
/// use avrogen::schema::{SchemaBuilder, Kind};
///
/// let mut b = SchemaBuilder::new();
/// let item = b.push(Kind::Int, None);
/// let array = b.push(Kind::Array { items: item }, None);
/// let schema = b.finish(array);
/// assert_eq!(schema.root(), array);
/// ```
#[derive(Default, Debug)]
pub struct SchemaBuilder {
    nodes: Vec<Node>,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Pushes a new node, returning its freshly assigned identity.
    pub fn push(&mut self, kind: Kind, directives: Option<Json>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, directives });
        id
    }

    /// Finalizes the arena. `root` need not be the first node pushed and is
    /// recorded as-is; by convention callers push children before parents
    /// and pass the last-pushed id (the outermost node) as `root`.
    pub fn finish(self, root: NodeId) -> Schema {
        debug_assert!(root.0 < self.nodes.len());
        Schema {
            nodes: self.nodes,
            root,
        }
    }
}
