use std::collections::HashMap;

use vexc_base::{Diagnostic, Position};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Topologically sorts the local-package dependency graph so every
/// package precedes its dependents. `edges` maps a package name to the
/// local package names it imports. Detects cycles with a three-color
/// DFS; the returned diagnostic names at least two packages on the
/// cycle, per 4.3's requirement.
pub fn topo_sort(roots: &[String], edges: &HashMap<String, Vec<String>>) -> Result<Vec<String>, Diagnostic> {
    let mut color: HashMap<&str, Color> = HashMap::new();
    let mut order = Vec::new();
    let mut stack: Vec<String> = Vec::new();

    for root in roots {
        visit(root, edges, &mut color, &mut order, &mut stack)?;
    }
    Ok(order)
}

fn visit<'a>(
    name: &'a str,
    edges: &'a HashMap<String, Vec<String>>,
    color: &mut HashMap<&'a str, Color>,
    order: &mut Vec<String>,
    stack: &mut Vec<String>,
) -> Result<(), Diagnostic> {
    match color.get(name) {
        Some(Color::Black) => return Ok(()),
        Some(Color::Gray) => {
            let cycle_start = stack.iter().position(|n| n == name).unwrap_or(0);
            let mut cycle: Vec<String> = stack[cycle_start..].to_vec();
            cycle.push(name.to_string());
            return Err(Diagnostic::error("VEX-PKG-CYCLE", Position::synthetic())
                .with_param("cycle", cycle.join(" -> "))
                .with_message(format!("import cycle detected: {}", cycle.join(" -> "))));
        }
        _ => {}
    }

    color.insert(name, Color::Gray);
    stack.push(name.to_string());

    if let Some(deps) = edges.get(name) {
        for dep in deps {
            visit(dep, edges, color, order, stack)?;
        }
    }

    stack.pop();
    color.insert(name, Color::Black);
    order.push(name.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn orders_dependencies_before_dependents() {
        let e = edges(&[("a", &["b"]), ("b", &[])]);
        let order = topo_sort(&["a".to_string()], &e).unwrap();
        assert_eq!(order, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn detects_a_direct_cycle() {
        let e = edges(&[("a", &["b"]), ("b", &["a"])]);
        let err = topo_sort(&["a".to_string()], &e).unwrap_err();
        assert_eq!(err.code, "VEX-PKG-CYCLE");
    }

    #[test]
    fn detects_a_back_edge_cycle_like_the_spec_example() {
        // a -> b, then adding b -> a.
        let e = edges(&[("a", &["b"]), ("b", &["a"])]);
        assert!(topo_sort(&["a".to_string()], &e).is_err());
    }

    #[test]
    fn shared_dependency_visited_once() {
        let e = edges(&[("a", &["c"]), ("b", &["c"]), ("c", &[])]);
        let order = topo_sort(&["a".to_string(), "b".to_string()], &e).unwrap();
        assert_eq!(order.iter().filter(|n| n.as_str() == "c").count(), 1);
        assert!(order.iter().position(|n| n == "c").unwrap() < order.iter().position(|n| n == "a").unwrap());
    }
}
