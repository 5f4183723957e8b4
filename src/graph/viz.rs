use std::collections::HashMap;

use crate::core::package::PackageId;

/// Renderings are advisory inspection output; children appear in edge
/// declaration order because that is the order the emitted artifacts carry.
pub fn render_tree(
    roots: &[PackageId],
    edges: &HashMap<PackageId, Vec<PackageId>>,
    labels: &HashMap<PackageId, String>,
) -> String {
    let mut out = String::new();
    for (idx, root) in roots.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(label_for(root, labels));
        out.push('\n');
        render_tree_children(root, edges, labels, "", &mut out);
    }
    out
}

pub fn render_flat(
    roots: &[PackageId],
    edges: &HashMap<PackageId, Vec<PackageId>>,
    labels: &HashMap<PackageId, String>,
) -> String {
    let mut out = String::new();
    for (idx, root) in roots.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(label_for(root, labels));
        out.push('\n');
        render_flat_children(root, edges, labels, 1, &mut out);
    }
    out
}

pub fn render_dot(
    nodes: &[PackageId],
    edges: &HashMap<PackageId, Vec<PackageId>>,
    labels: &HashMap<PackageId, String>,
) -> String {
    let mut out = String::from("digraph arachne {\n");
    for node in nodes {
        let escaped = escape_dot_label(label_for(node, labels));
        out.push_str(&format!("  \"{}\" [label=\"{}\"];\n", node.as_str(), escaped));
    }
    for from in nodes {
        if let Some(deps) = edges.get(from) {
            for dep in deps {
                out.push_str(&format!(
                    "  \"{}\" -> \"{}\";\n",
                    from.as_str(),
                    dep.as_str()
                ));
            }
        }
    }
    out.push_str("}\n");
    out
}

fn render_tree_children(
    node: &PackageId,
    edges: &HashMap<PackageId, Vec<PackageId>>,
    labels: &HashMap<PackageId, String>,
    prefix: &str,
    out: &mut String,
) {
    let children = edges.get(node).cloned().unwrap_or_default();
    for (idx, child) in children.iter().enumerate() {
        let is_last = idx + 1 == children.len();
        out.push_str(prefix);
        out.push_str(if is_last { "`-- " } else { "|-- " });
        out.push_str(label_for(child, labels));
        out.push('\n');
        let mut next_prefix = prefix.to_string();
        if is_last {
            next_prefix.push_str("    ");
        } else {
            next_prefix.push_str("|   ");
        }
        render_tree_children(child, edges, labels, &next_prefix, out);
    }
}

fn render_flat_children(
    node: &PackageId,
    edges: &HashMap<PackageId, Vec<PackageId>>,
    labels: &HashMap<PackageId, String>,
    depth: usize,
    out: &mut String,
) {
    let children = edges.get(node).cloned().unwrap_or_default();
    for child in children {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(label_for(&child, labels));
        out.push('\n');
        render_flat_children(&child, edges, labels, depth + 1, out);
    }
}

fn label_for<'a>(node: &'a PackageId, labels: &'a HashMap<PackageId, String>) -> &'a str {
    labels.get(node).map(String::as_str).unwrap_or(node.as_str())
}

fn escape_dot_label(label: &str) -> String {
    label.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::core::package::PackageId;
    use crate::graph::viz::{render_dot, render_tree};

    fn fixture() -> (
        Vec<PackageId>,
        HashMap<PackageId, Vec<PackageId>>,
        HashMap<PackageId, String>,
    ) {
        let util = PackageId::new("util");
        let lib_a = PackageId::new("lib_a");
        let mut edges = HashMap::new();
        edges.insert(lib_a.clone(), vec![util.clone()]);
        let mut labels = HashMap::new();
        labels.insert(util.clone(), "util (0.1.0)".to_string());
        labels.insert(lib_a.clone(), "lib_a (0.1.0)".to_string());
        (vec![lib_a, util], edges, labels)
    }

    #[test]
    fn tree_rendering_nests_dependencies_under_roots() {
        let (nodes, edges, labels) = fixture();
        let roots = vec![nodes[0].clone()];
        let out = render_tree(&roots, &edges, &labels);
        assert_eq!(out, "lib_a (0.1.0)\n`-- util (0.1.0)\n");
    }

    #[test]
    fn dot_rendering_lists_every_node_and_edge() {
        let (nodes, edges, labels) = fixture();
        let out = render_dot(&nodes, &edges, &labels);
        assert!(out.starts_with("digraph arachne {"));
        assert!(out.contains("\"lib_a\" [label=\"lib_a (0.1.0)\"];"));
        assert!(out.contains("\"lib_a\" -> \"util\";"));
    }
}
