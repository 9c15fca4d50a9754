//! Graphviz DOT view of a network, produced by one full traversal.
//!
//! Nodes are numbered in the order the traversal discovers them and prefixed
//! with their kind (`I` input, `H` hidden, `O` output). Input and output
//! nodes with a non-empty debug label get an explicit `label`; edges carry
//! their weight at full precision. The output is meant for visualization
//! only and cannot be loaded back.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;

use crate::error::Result;
use crate::graph::{NeuronGraph, NodeId, NodeKind};
use crate::network::network::Network;

pub fn to_dot(network: &Network) -> Result<String> {
    let graph = network.graph();
    let mut names: HashMap<NodeId, String> = HashMap::new();
    let mut body = String::new();

    network.traverse_network(|weight, input, output| {
        let output_name = node_name(graph, &mut names, &mut body, output);
        let input_name = node_name(graph, &mut names, &mut body, input);
        // Writing to a String cannot fail.
        let _ = writeln!(body, "{input_name} -> {output_name} [label=\"{weight}\"]");
        true
    })?;

    Ok(format!("digraph G {{\n{body}}}\n"))
}

pub fn write_dot<W: Write>(network: &Network, mut writer: W) -> Result<()> {
    writer.write_all(to_dot(network)?.as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn save_dot(network: &Network, path: &str) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_dot(network, std::io::BufWriter::new(file))
}

/// Name of `id`, registering it (and emitting its label line) on first sight.
fn node_name(
    graph: &NeuronGraph,
    names: &mut HashMap<NodeId, String>,
    body: &mut String,
    id: NodeId,
) -> String {
    if let Some(name) = names.get(&id) {
        return name.clone();
    }
    let kind = graph.kind(id);
    let prefix = match kind {
        NodeKind::Input => "I",
        NodeKind::Hidden => "H",
        NodeKind::Output => "O",
    };
    let name = format!("{prefix}{}", names.len());
    let label = graph.debug_label(id);
    if kind != NodeKind::Hidden && !label.is_empty() {
        let _ = writeln!(body, "{name} [label=\"{prefix}, {label}\"]");
    }
    names.insert(id, name.clone());
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::builder::sigmoid_perceptron;

    #[test]
    fn one_line_per_edge() {
        let net = sigmoid_perceptron(0.5, 0.5, 2, 1, &[2], 5).unwrap();
        let dot = to_dot(&net).unwrap();
        assert!(dot.starts_with("digraph G {\n"));
        assert!(dot.trim_end().ends_with('}'));
        assert_eq!(dot.matches(" -> ").count(), net.weights_count());
        assert!(dot.contains("-> O0"));
    }

    #[test]
    fn weights_are_printed_at_full_precision() {
        let net = sigmoid_perceptron(0.5, 0.5, 1, 1, &[], 5).unwrap();
        let dot = to_dot(&net).unwrap();
        for (_, _, w) in net.weights().unwrap() {
            assert!(dot.contains(&format!("[label=\"{w}\"]")));
        }
    }

    #[test]
    fn bias_is_labelled_with_its_value() {
        let net = sigmoid_perceptron(0.5, 0.5, 1, 1, &[], 5).unwrap();
        let dot = to_dot(&net).unwrap();
        // The bias is the first input discovered from the output.
        assert!(dot.contains("I1 [label=\"I, 1\"]"));
    }

    #[test]
    fn write_dot_emits_same_text() {
        let net = sigmoid_perceptron(0.5, 0.5, 2, 2, &[], 8).unwrap();
        let mut buf = Vec::new();
        write_dot(&net, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), to_dot(&net).unwrap());
    }
}
