use std::fmt;

/// Layer index reserved for the bias ("shift") node.
pub const BIAS_LAYER: usize = usize::MAX;

/// Diagnostic position of a node: which layer it belongs to and where in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeLabel {
    pub layer: usize,
    pub position: usize,
}

impl NodeLabel {
    pub fn new(layer: usize, position: usize) -> Self {
        NodeLabel { layer, position }
    }

    pub fn bias() -> Self {
        NodeLabel { layer: BIAS_LAYER, position: 0 }
    }

    pub fn is_bias(&self) -> bool {
        self.layer == BIAS_LAYER
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bias() {
            write!(f, "(bias)")
        } else {
            write!(f, "({},{})", self.layer, self.position)
        }
    }
}
