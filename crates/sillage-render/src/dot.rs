use sillage_types::{EdgeRecord, GraphSnapshot, NodeRecord};
use std::fmt;

use crate::RenderOptions;

const NODE_FONTSIZE: u32 = 13;
const EDGE_FONTSIZE: u32 = 8;
const EDGE_FONTCOLOR: &str = "#999999";

/// Shown in place of a return value the call never produced.
const NO_RETURN: &str = "⊥";

/// A call graph laid out as Graphviz DOT text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDescription {
    source: String,
}

impl GraphDescription {
    pub fn from_snapshot(snapshot: &GraphSnapshot, options: &RenderOptions) -> Self {
        Self {
            source: Digraph { snapshot, options }.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.source.into_bytes()
    }
}

impl fmt::Display for GraphDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Digraph<'a> {
    snapshot: &'a GraphSnapshot,
    options: &'a RenderOptions,
}

impl fmt::Display for Digraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fontname = escape_quoted(&self.options.fontname);
        writeln!(f, "digraph {{")?;
        writeln!(
            f,
            "  graph [bgcolor=transparent dpi={} fontname=\"{fontname}\"];",
            self.options.dpi
        )?;
        writeln!(f, "  node [fontname=\"{fontname}\"];")?;
        writeln!(f, "  edge [fontname=\"{fontname}\"];")?;

        for node in &self.snapshot.nodes {
            writeln!(
                f,
                "  {} [label=\"{}\" shape=Mrecord fontsize={NODE_FONTSIZE}];",
                node.id,
                NodeLabel {
                    node,
                    show_null_returns: self.options.show_null_returns,
                },
            )?;
        }
        for edge in &self.snapshot.edges {
            writeln!(
                f,
                "  {} -> {} [label={} fontsize={EDGE_FONTSIZE} fontcolor=\"{EDGE_FONTCOLOR}\"];",
                edge.src,
                edge.dst,
                EdgeLabel(edge),
            )?;
        }
        writeln!(f, "}}")
    }
}

/// `{ name(args) | key: value | ret: value }` in record syntax.
struct NodeLabel<'a> {
    node: &'a NodeRecord,
    show_null_returns: bool,
}

impl fmt::Display for NodeLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node;
        write!(
            f,
            "{{ {}({})",
            escape_record(&node.function),
            escape_record(&node.arguments)
        )?;
        for aux in &node.auxiliary {
            write!(
                f,
                " | {}: {}",
                escape_record(&aux.key),
                escape_record(&aux.value)
            )?;
        }
        match &node.return_value {
            Some(value) => write!(f, " | ret: {}", escape_record(value))?,
            None if self.show_null_returns => write!(f, " | ret: {NO_RETURN}")?,
            None => {}
        }
        f.write_str(" }")
    }
}

/// HTML-like label: call order, then an up arrow and the return order.
struct EdgeLabel<'a>(&'a EdgeRecord);

impl fmt::Display for EdgeLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edge = self.0;
        match edge.return_order {
            Some(order) => write!(f, "<{} (&#8593; {order})>", edge.call_order),
            None => write!(f, "<{} (&#8593; ?)>", edge.call_order),
        }
    }
}

/// Escapes the characters record labels treat as structure, plus the
/// quote that would end the DOT string.
fn escape_record(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' | '}' | '|' | '<' | '>' | '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text placed inside a double-quoted DOT string.
fn escape_quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
