use crate::error::{NnError, Result};
use crate::graph::node::{Edge, NodeId};

/// Restartable cursor over a neuron's incoming edges.
///
/// A fresh cursor is not positioned: call [`EdgeCursor::move_to_first`]
/// before reading. Once [`EdgeCursor::step_next`] runs past the last edge the
/// cursor is invalid again until the next `move_to_first`.
#[derive(Debug, Clone)]
pub struct EdgeCursor<'a> {
    edges: &'a [Edge],
    position: Option<usize>,
}

impl<'a> EdgeCursor<'a> {
    pub(crate) fn new(edges: &'a [Edge]) -> Self {
        EdgeCursor { edges, position: None }
    }

    /// Returns `false` (and stays invalid) when there are no edges.
    pub fn move_to_first(&mut self) -> bool {
        self.position = if self.edges.is_empty() { None } else { Some(0) };
        self.position.is_some()
    }

    /// Advances to the next edge; `Ok(false)` means the edges are exhausted.
    pub fn step_next(&mut self) -> Result<bool> {
        let position = self.position.ok_or(NnError::InvalidCursor)?;
        if position + 1 == self.edges.len() {
            self.position = None;
            Ok(false)
        } else {
            self.position = Some(position + 1);
            Ok(true)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.position.is_some()
    }

    pub fn weight(&self) -> Result<f64> {
        self.current().map(|edge| edge.weight())
    }

    pub fn node(&self) -> Result<NodeId> {
        self.current().map(|edge| edge.source())
    }

    fn current(&self) -> Result<&'a Edge> {
        self.position
            .and_then(|p| self.edges.get(p))
            .ok_or(NnError::InvalidCursor)
    }
}
