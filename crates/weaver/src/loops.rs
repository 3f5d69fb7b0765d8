//! Loops: `for` over a query.
//!
//! A query is woven in three parts that share one loop head:
//!
//! - `init`: set-up code run once, continuing at the head
//! - `body`: the per-iteration code, continuing at the head
//! - `next`: code at the head that either runs another iteration
//!   (continuing at `body`) or leaves the loop
//!
//! The head is a placeholder until `next` exists, then resolved to it.

use nutmeg_common::{Codelet, Node};
use nutmeg_vm::{NodeId, Runlet};

use crate::error::WeaveError;
use crate::weave::{local_slot, Weaver};

impl Weaver<'_> {
    pub(crate) fn weave_for(&mut self, query: &Codelet, k: NodeId) -> Result<NodeId, WeaveError> {
        let head = self.graph.placeholder();
        let init = self.weave_loop_init(query, head)?;
        let body = self.weave_loop_body(query, head)?;
        let next = self.weave_loop_next(query, body, k)?;
        if !self.graph.resolve(head, next) {
            return Err(WeaveError::EmptyLoop);
        }
        Ok(self.graph.follow(init))
    }

    fn weave_loop_init(&mut self, query: &Codelet, k: NodeId) -> Result<NodeId, WeaveError> {
        match &query.node {
            Node::In {
                streamable,
                stream_slot,
                ..
            } => {
                let store = self.add(Runlet::PopIntoLocal {
                    slot: *stream_slot,
                    next: k,
                });
                let stream = self.resolve_builtin("stream")?;
                let start = self.add(Runlet::Builtin {
                    builtin: stream,
                    next: store,
                });
                self.weave1(streamable, start)
            }
            Node::Do { query, .. }
            | Node::Wuntil { query, .. }
            | Node::Afterwards { query, .. } => self.weave_loop_init(query, k),
            Node::Nonstop => Ok(k),
            _ => Err(WeaveError::NotIterable {
                kind: query.kind(),
            }),
        }
    }

    fn weave_loop_body(&mut self, query: &Codelet, k: NodeId) -> Result<NodeId, WeaveError> {
        match &query.node {
            Node::In { .. } | Node::Nonstop => Ok(k),
            Node::Do { query, body } => {
                let after = self.weave(body, k)?;
                self.weave_loop_body(query, after)
            }
            Node::Wuntil { query, .. } | Node::Afterwards { query, .. } => {
                self.weave_loop_body(query, k)
            }
            _ => Err(WeaveError::NotIterable {
                kind: query.kind(),
            }),
        }
    }

    /// `ok` continues the loop; `fail` leaves it.
    fn weave_loop_next(
        &mut self,
        query: &Codelet,
        ok: NodeId,
        fail: NodeId,
    ) -> Result<NodeId, WeaveError> {
        match &query.node {
            Node::In {
                pattern,
                stream_slot,
                ..
            } => {
                let slot = local_slot(pattern)?;
                let bind = self.add(Runlet::PopIntoLocal { slot, next: ok });
                Ok(self.add(Runlet::IterateSlot {
                    slot: *stream_slot,
                    on_value: bind,
                    on_exhausted: fail,
                }))
            }
            Node::Do { query, .. } => self.weave_loop_next(query, ok, fail),
            Node::Nonstop => Ok(ok),
            Node::Wuntil {
                sense,
                query,
                test,
                result,
            } => {
                let exit = self.weave(result, fail)?;
                let fork = if *sense {
                    Runlet::Fork {
                        then: ok,
                        otherwise: exit,
                    }
                } else {
                    Runlet::Fork {
                        then: exit,
                        otherwise: ok,
                    }
                };
                let fork = self.add(fork);
                let checked = self.weave(test, fork)?;
                self.weave_loop_next(query, checked, fail)
            }
            Node::Afterwards { query, result } => {
                let exit = self.weave(result, fail)?;
                self.weave_loop_next(query, ok, exit)
            }
            _ => Err(WeaveError::NotIterable {
                kind: query.kind(),
            }),
        }
    }
}
