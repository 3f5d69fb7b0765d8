//! The tree-node model ("codelets") produced by the front end.
//!
//! A [`Codelet`] is one node of a compiled program tree: an optional arity
//! annotation plus a [`Node`] payload. The tree is immutable once loaded;
//! the weaver only reads it.
//!
//! The JSON encoding is internally tagged on `"kind"`:
//!
//! ```json
//! { "kind": "call", "arity": "1",
//!   "function": { "kind": "id", "name": "f", "reftype": "get", "scope": "global" },
//!   "arguments": { "kind": "int", "value": "3" } }
//! ```

use serde::{de, Deserialize, Deserializer};

use crate::arity::Arity;

/// One node of the program tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Codelet {
    #[serde(default)]
    pub arity: Option<Arity>,
    #[serde(flatten)]
    pub node: Node,
}

/// Whether an identifier is read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefType {
    Get,
    Set,
}

/// Where an identifier lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Local,
}

/// Node payloads, keyed by the front end's `"kind"` names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    /// String literal.
    String { value: String },

    /// Integer literal, carried as decimal text.
    Int { value: String },

    /// Character literal, carried as a one-character string.
    Char { value: String },

    /// Boolean literal. The front end writes `"true"`/`"false"`; a JSON
    /// boolean is accepted too.
    Bool {
        #[serde(deserialize_with = "bool_literal")]
        value: bool,
    },

    /// Identifier reference. Globals have no slot; locals do.
    Id {
        name: String,
        reftype: RefType,
        scope: Scope,
        #[serde(default)]
        slot: Option<usize>,
    },

    /// Function literal with its parameter and local-slot counts.
    Lambda {
        nargs: usize,
        nlocals: usize,
        body: Box<Codelet>,
    },

    /// Call of a computed callee on an argument expression.
    Call {
        function: Box<Codelet>,
        arguments: Box<Codelet>,
    },

    /// Ordered sequence; leaves the concatenation of its parts' values.
    Seq { body: Vec<Codelet> },

    If {
        test: Box<Codelet>,
        then: Box<Codelet>,
        #[serde(rename = "else")]
        otherwise: Box<Codelet>,
    },

    And { lhs: Box<Codelet>, rhs: Box<Codelet> },

    Or { lhs: Box<Codelet>, rhs: Box<Codelet> },

    /// Invocation of a built-in by name.
    Syscall { name: String, arguments: Box<Codelet> },

    /// A built-in used as a first-class value.
    Sysfn { name: String },

    /// Loop over a query.
    For { query: Box<Codelet> },

    /// Query: bind `pattern` to each element of `streamable`.
    In {
        pattern: Box<Codelet>,
        streamable: Box<Codelet>,
        #[serde(rename = "streamSlot")]
        stream_slot: usize,
    },

    /// Query: run `body` on every iteration of `query`.
    Do { query: Box<Codelet>, body: Box<Codelet> },

    /// Query: loop forever.
    Nonstop,

    /// Query: `while` (sense true) or `until` (sense false) with an exit result.
    Wuntil {
        sense: bool,
        query: Box<Codelet>,
        test: Box<Codelet>,
        result: Box<Codelet>,
    },

    /// Query: run `result` once `query` is exhausted.
    Afterwards { query: Box<Codelet>, result: Box<Codelet> },

    Binding {
        #[serde(alias = "LHS")]
        lhs: Box<Codelet>,
        #[serde(alias = "RHS")]
        rhs: Box<Codelet>,
    },

    Assign {
        #[serde(alias = "LHS")]
        lhs: Box<Codelet>,
        #[serde(alias = "RHS")]
        rhs: Box<Codelet>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolLiteral {
    Bool(bool),
    Text(String),
}

fn bool_literal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match BoolLiteral::deserialize(deserializer)? {
        BoolLiteral::Bool(value) => Ok(value),
        BoolLiteral::Text(text) => match text.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(de::Error::invalid_value(
                de::Unexpected::Str(&text),
                &"\"true\" or \"false\"",
            )),
        },
    }
}

impl Codelet {
    /// A node without an arity annotation.
    pub fn new(node: Node) -> Self {
        Codelet { arity: None, node }
    }

    /// Attach an arity annotation.
    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = Some(arity);
        self
    }

    /// The declared arity, or [`Arity::UNKNOWN`] when none was recorded.
    pub fn arity(&self) -> Arity {
        self.arity.unwrap_or_default()
    }

    /// The `"kind"` name of this node.
    pub fn kind(&self) -> &'static str {
        match &self.node {
            Node::String { .. } => "string",
            Node::Int { .. } => "int",
            Node::Char { .. } => "char",
            Node::Bool { .. } => "bool",
            Node::Id { .. } => "id",
            Node::Lambda { .. } => "lambda",
            Node::Call { .. } => "call",
            Node::Seq { .. } => "seq",
            Node::If { .. } => "if",
            Node::And { .. } => "and",
            Node::Or { .. } => "or",
            Node::Syscall { .. } => "syscall",
            Node::Sysfn { .. } => "sysfn",
            Node::For { .. } => "for",
            Node::In { .. } => "in",
            Node::Do { .. } => "do",
            Node::Nonstop => "nonstop",
            Node::Wuntil { .. } => "wuntil",
            Node::Afterwards { .. } => "afterwards",
            Node::Binding { .. } => "binding",
            Node::Assign { .. } => "assign",
        }
    }

    /// Number of local slots this tree touches outside nested lambdas:
    /// the highest local slot index plus one.
    ///
    /// Used to size the frame of a top-level expression that is run as if
    /// it were the body of a zero-argument function.
    pub fn local_slot_count(&self) -> usize {
        let mut count = 0;
        self.visit_slots(&mut |slot| count = count.max(slot + 1));
        count
    }

    fn visit_slots(&self, seen: &mut impl FnMut(usize)) {
        match &self.node {
            Node::String { .. }
            | Node::Int { .. }
            | Node::Char { .. }
            | Node::Bool { .. }
            | Node::Sysfn { .. }
            | Node::Nonstop
            | Node::Lambda { .. } => {}
            Node::Id { scope, slot, .. } => {
                if let (Scope::Local, Some(slot)) = (scope, slot) {
                    seen(*slot);
                }
            }
            Node::Call {
                function,
                arguments,
            } => {
                function.visit_slots(seen);
                arguments.visit_slots(seen);
            }
            Node::Seq { body } => body.iter().for_each(|c| c.visit_slots(seen)),
            Node::If {
                test,
                then,
                otherwise,
            } => {
                test.visit_slots(seen);
                then.visit_slots(seen);
                otherwise.visit_slots(seen);
            }
            Node::And { lhs, rhs }
            | Node::Or { lhs, rhs }
            | Node::Binding { lhs, rhs }
            | Node::Assign { lhs, rhs } => {
                lhs.visit_slots(seen);
                rhs.visit_slots(seen);
            }
            Node::Syscall { arguments, .. } => arguments.visit_slots(seen),
            Node::For { query } => query.visit_slots(seen),
            Node::In {
                pattern,
                streamable,
                stream_slot,
            } => {
                seen(*stream_slot);
                pattern.visit_slots(seen);
                streamable.visit_slots(seen);
            }
            Node::Do { query, body } => {
                query.visit_slots(seen);
                body.visit_slots(seen);
            }
            Node::Wuntil {
                query,
                test,
                result,
                ..
            } => {
                query.visit_slots(seen);
                test.visit_slots(seen);
                result.visit_slots(seen);
            }
            Node::Afterwards { query, result } => {
                query.visit_slots(seen);
                result.visit_slots(seen);
            }
        }
    }

    // Constructors used by hosts and tests that build trees directly.

    pub fn string(value: impl Into<String>) -> Self {
        Codelet::new(Node::String {
            value: value.into(),
        })
        .with_arity(Arity::exactly(1))
    }

    pub fn int(value: i64) -> Self {
        Codelet::new(Node::Int {
            value: value.to_string(),
        })
        .with_arity(Arity::exactly(1))
    }

    pub fn char(value: char) -> Self {
        Codelet::new(Node::Char {
            value: value.to_string(),
        })
        .with_arity(Arity::exactly(1))
    }

    pub fn bool(value: bool) -> Self {
        Codelet::new(Node::Bool { value }).with_arity(Arity::exactly(1))
    }

    pub fn global(name: impl Into<String>) -> Self {
        Codelet::new(Node::Id {
            name: name.into(),
            reftype: RefType::Get,
            scope: Scope::Global,
            slot: None,
        })
        .with_arity(Arity::exactly(1))
    }

    pub fn local(name: impl Into<String>, slot: usize) -> Self {
        Codelet::new(Node::Id {
            name: name.into(),
            reftype: RefType::Get,
            scope: Scope::Local,
            slot: Some(slot),
        })
        .with_arity(Arity::exactly(1))
    }

    pub fn lambda(nargs: usize, nlocals: usize, body: Codelet) -> Self {
        Codelet::new(Node::Lambda {
            nargs,
            nlocals,
            body: Box::new(body),
        })
        .with_arity(Arity::exactly(1))
    }

    pub fn call(function: Codelet, arguments: Codelet) -> Self {
        Codelet::new(Node::Call {
            function: Box::new(function),
            arguments: Box::new(arguments),
        })
    }

    pub fn seq(body: Vec<Codelet>) -> Self {
        Codelet::new(Node::Seq { body })
    }

    pub fn if_then_else(test: Codelet, then: Codelet, otherwise: Codelet) -> Self {
        Codelet::new(Node::If {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    pub fn syscall(name: impl Into<String>, arguments: Codelet) -> Self {
        Codelet::new(Node::Syscall {
            name: name.into(),
            arguments: Box::new(arguments),
        })
    }

    pub fn sysfn(name: impl Into<String>) -> Self {
        Codelet::new(Node::Sysfn { name: name.into() }).with_arity(Arity::exactly(1))
    }
}
