//! The instruction graph: an arena of [`Runlet`]s addressed by [`NodeId`].
//!
//! Nodes are appended by the weaver and never removed, except for the
//! scratch entry nodes the engine appends around a single run (see
//! [`Graph::truncate`]). Successor edges are plain indices, so loops and
//! recursion need no shared ownership.
//!
//! # Placeholders
//!
//! A loop head must be referenced before the node it stands for exists.
//! [`Graph::placeholder`] allocates a forward-reference node; nodes added
//! with a placeholder successor register themselves as its trackers. When
//! [`Graph::resolve`] binds the placeholder, every tracker is relinked to
//! the final target, following chains of resolved placeholders. After
//! weaving, no resolved placeholder is reachable from live code.

use std::fmt;
use std::ops::Index;

use crate::builtins::{BuiltinId, Catalog};
use crate::globals::GlobalId;
use crate::value::Value;

/// Index of a node in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in its graph's arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One executable instruction node.
#[derive(Debug, Clone, PartialEq)]
pub enum Runlet {
    /// Forward reference, bound by [`Graph::resolve`].
    Placeholder {
        target: Option<NodeId>,
        trackers: Vec<NodeId>,
    },

    /// Stop the trampoline, optionally dumping the value stack.
    Halt { print: bool },

    PushConstant { value: Value, next: NodeId },

    /// Push a global's value; fails while it is unassigned.
    PushGlobal { global: GlobalId, next: NodeId },

    /// Push a local of the running frame.
    PushLocal { slot: usize, next: NodeId },

    PopIntoLocal { slot: usize, next: NodeId },

    /// Assign a global from the top of the value stack.
    PopIntoGlobal { global: GlobalId, next: NodeId },

    /// Callable descriptor. Executing it pushes itself as a value.
    /// Top-level bindings have no successor.
    FunctionTemplate {
        arity: usize,
        locals: usize,
        entry: NodeId,
        next: Option<NodeId>,
    },

    /// Call a statically known function template.
    Call { function: NodeId, next: NodeId },

    /// Pop a callee and dispatch on its kind.
    CallDynamic { next: NodeId },

    /// Discard the frame and resume at its saved return node. Halts when
    /// no frame is active.
    Return,

    /// Pop a boolean and branch.
    Fork { then: NodeId, otherwise: NodeId },

    /// Short-circuit `and`: on true pop and run `rhs`, else keep the value.
    And { rhs: NodeId, next: NodeId },

    /// Short-circuit `or`: on false pop and run `rhs`, else keep the value.
    Or { rhs: NodeId, next: NodeId },

    /// Start a value-stack layer.
    Lock { next: NodeId },

    /// End a value-stack layer, keeping its values.
    Unlock { next: NodeId },

    /// Unlock after checking the layer holds exactly `expected` values.
    UnlockChecked { expected: usize, next: NodeId },

    /// Unlock after checking the layer holds exactly one value.
    UnlockSingle { next: NodeId },

    /// Unlock and store the layer size in the argument-count register.
    CountAndUnlock { next: NodeId },

    /// Advance the stream held in a local slot.
    IterateSlot {
        slot: usize,
        on_value: NodeId,
        on_exhausted: NodeId,
    },

    /// Run a built-in body.
    Builtin { builtin: BuiltinId, next: NodeId },
}

impl Runlet {
    /// Outgoing edges, in declaration order.
    pub fn successors(&self) -> Vec<NodeId> {
        match self {
            Runlet::Placeholder { target, .. } => target.iter().copied().collect(),
            Runlet::Halt { .. } | Runlet::Return => Vec::new(),
            Runlet::FunctionTemplate { entry, next, .. } => {
                std::iter::once(*entry).chain(*next).collect()
            }
            Runlet::Call { function, next } => vec![*function, *next],
            Runlet::Fork { then, otherwise } => vec![*then, *otherwise],
            Runlet::And { rhs, next } | Runlet::Or { rhs, next } => vec![*rhs, *next],
            Runlet::IterateSlot {
                on_value,
                on_exhausted,
                ..
            } => vec![*on_value, *on_exhausted],
            Runlet::PushConstant { next, .. }
            | Runlet::PushGlobal { next, .. }
            | Runlet::PushLocal { next, .. }
            | Runlet::PopIntoLocal { next, .. }
            | Runlet::PopIntoGlobal { next, .. }
            | Runlet::CallDynamic { next }
            | Runlet::Lock { next }
            | Runlet::Unlock { next }
            | Runlet::UnlockChecked { next, .. }
            | Runlet::UnlockSingle { next }
            | Runlet::CountAndUnlock { next }
            | Runlet::Builtin { next, .. } => vec![*next],
        }
    }

    /// Mutable successor slots. Placeholder targets are excluded; they are
    /// managed by [`Graph::resolve`].
    fn successor_slots(&mut self) -> Vec<&mut NodeId> {
        match self {
            Runlet::Placeholder { .. } | Runlet::Halt { .. } | Runlet::Return => Vec::new(),
            Runlet::FunctionTemplate { entry, next, .. } => {
                std::iter::once(entry).chain(next.as_mut()).collect()
            }
            Runlet::Call { function, next } => vec![function, next],
            Runlet::Fork { then, otherwise } => vec![then, otherwise],
            Runlet::And { rhs, next } | Runlet::Or { rhs, next } => vec![rhs, next],
            Runlet::IterateSlot {
                on_value,
                on_exhausted,
                ..
            } => vec![on_value, on_exhausted],
            Runlet::PushConstant { next, .. }
            | Runlet::PushGlobal { next, .. }
            | Runlet::PushLocal { next, .. }
            | Runlet::PopIntoLocal { next, .. }
            | Runlet::PopIntoGlobal { next, .. }
            | Runlet::CallDynamic { next }
            | Runlet::Lock { next }
            | Runlet::Unlock { next }
            | Runlet::UnlockChecked { next, .. }
            | Runlet::UnlockSingle { next }
            | Runlet::CountAndUnlock { next }
            | Runlet::Builtin { next, .. } => vec![next],
        }
    }
}

/// Arena of instruction nodes.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Runlet>,
}

impl Graph {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes, placeholders included. The next [`Graph::add`]
    /// returns a node with this index.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node at `id`, or `None` when `id` belongs to a larger graph.
    pub fn get(&self, id: NodeId) -> Option<&Runlet> {
        self.nodes.get(id.index())
    }

    /// Drop every node at index `len` or above.
    ///
    /// Nothing that stays may refer to a dropped node: only nodes appended
    /// after `len` was read, and not captured in a value, can go. Pending
    /// placeholders forget trackers that were dropped.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.nodes.len() {
            return;
        }
        self.nodes.truncate(len);
        for runlet in &mut self.nodes {
            if let Runlet::Placeholder {
                target: None,
                trackers,
            } = runlet
            {
                trackers.retain(|tracker| tracker.index() < len);
            }
        }
    }

    /// Append a node. Successors that are resolved placeholders are
    /// replaced by their final target; unresolved ones record the new node
    /// as a tracker.
    pub fn add(&mut self, mut runlet: Runlet) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for slot in runlet.successor_slots() {
            *slot = self.follow(*slot);
            self.track(*slot, id);
        }
        self.nodes.push(runlet);
        id
    }

    /// Allocate an unresolved forward reference.
    pub fn placeholder(&mut self) -> NodeId {
        self.add(Runlet::Placeholder {
            target: None,
            trackers: Vec::new(),
        })
    }

    /// Final node reached from `id` through resolved placeholders.
    pub fn follow(&self, mut id: NodeId) -> NodeId {
        while let Some(Runlet::Placeholder {
            target: Some(target),
            ..
        }) = self.nodes.get(id.index())
        {
            id = *target;
        }
        id
    }

    /// True when `id` is a placeholder that has not been resolved yet.
    pub fn is_unresolved(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(id.index()),
            Some(Runlet::Placeholder { target: None, .. })
        )
    }

    /// Bind `placeholder` to `target` and relink every node that refers
    /// to it.
    ///
    /// Returns false, changing nothing, when `placeholder` is not an
    /// unresolved placeholder or when `target` leads back to it (a loop
    /// with no instruction in it).
    pub fn resolve(&mut self, placeholder: NodeId, target: NodeId) -> bool {
        let target = self.follow(target);
        if target == placeholder {
            return false;
        }
        let trackers = match self.nodes.get_mut(placeholder.index()) {
            Some(Runlet::Placeholder {
                target: slot @ None,
                trackers,
            }) => {
                *slot = Some(target);
                std::mem::take(trackers)
            }
            _ => return false,
        };
        for tracker in trackers {
            self.relink(tracker);
        }
        true
    }

    fn relink(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.index()) else {
            return;
        };
        let mut runlet = std::mem::replace(node, Runlet::Return);
        for slot in runlet.successor_slots() {
            *slot = self.follow(*slot);
            self.track(*slot, id);
        }
        self.nodes[id.index()] = runlet;
    }

    fn track(&mut self, id: NodeId, tracker: NodeId) {
        if let Some(Runlet::Placeholder {
            target: None,
            trackers,
        }) = self.nodes.get_mut(id.index())
        {
            if !trackers.contains(&tracker) {
                trackers.push(tracker);
            }
        }
    }

    /// Every node reachable from `entry`, in depth-first preorder.
    pub fn reachable(&self, entry: NodeId) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut pending = vec![entry];
        while let Some(id) = pending.pop() {
            let Some(runlet) = self.nodes.get(id.index()) else {
                continue;
            };
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            order.push(id);
            pending.extend(runlet.successors().into_iter().rev());
        }
        order
    }

    /// One-line description of a node, used in graph dumps and traces.
    pub fn short_title(&self, id: NodeId, catalog: &Catalog) -> String {
        let Some(runlet) = self.get(id) else {
            return format!("Missing {id}");
        };
        match runlet {
            Runlet::Placeholder { target: None, .. } => "Jump ?".to_string(),
            Runlet::Placeholder {
                target: Some(target),
                ..
            } => format!("Jump {target}"),
            Runlet::Halt { print: true } => "Halt (print)".to_string(),
            Runlet::Halt { print: false } => "Halt".to_string(),
            Runlet::PushConstant { value, .. } => format!("PushQ {}", value.show()),
            Runlet::PushGlobal { global, .. } => format!("PushGlobal {global}"),
            Runlet::PushLocal { slot, .. } => format!("PushLocal {slot}"),
            Runlet::PopIntoLocal { slot, .. } => format!("PopLocal {slot}"),
            Runlet::PopIntoGlobal { global, .. } => format!("PopGlobal {global}"),
            Runlet::FunctionTemplate { arity, locals, .. } => {
                format!("Function {arity}/{locals}")
            }
            Runlet::Call { .. } => "Call".to_string(),
            Runlet::CallDynamic { .. } => "CallS".to_string(),
            Runlet::Return => "Return".to_string(),
            Runlet::Fork { .. } => "Fork".to_string(),
            Runlet::And { .. } => "And".to_string(),
            Runlet::Or { .. } => "Or".to_string(),
            Runlet::Lock { .. } => "Lock".to_string(),
            Runlet::Unlock { .. } => "Unlock".to_string(),
            Runlet::UnlockChecked { expected, .. } => format!("CheckedUnlock {expected}"),
            Runlet::UnlockSingle { .. } => "UnlockSingle".to_string(),
            Runlet::CountAndUnlock { .. } => "CountAndUnlock".to_string(),
            Runlet::IterateSlot { slot, .. } => format!("Iterate {slot}"),
            Runlet::Builtin { builtin, .. } => format!("Sys{}", catalog.name(*builtin)),
        }
    }
}

impl Index<NodeId> for Graph {
    type Output = Runlet;

    fn index(&self, id: NodeId) -> &Runlet {
        &self.nodes[id.index()]
    }
}
