use vexc_types::Type;

/// Renders a resolved `Type` as a Target (Go) type expression. `Unknown`
/// left unresolved by inference becomes `any`, per §4.6's rule for
/// function parameters inference left untyped.
pub fn render_type(ty: &Type) -> String {
    match ty {
        Type::Int => "int".to_string(),
        Type::Float => "float64".to_string(),
        Type::String => "string".to_string(),
        Type::Bool => "bool".to_string(),
        Type::SymbolType => "string".to_string(),
        Type::List(elem) => format!("[]{}", render_type(elem)),
        Type::Map(k, v) => format!("map[{}]{}", render_type(k), render_type(v)),
        Type::Function(params, result) => {
            let rendered_params: Vec<String> = params.iter().map(render_type).collect();
            format!("func({}) {}", rendered_params.join(", "), render_type(result))
        }
        Type::Unknown(_) => "any".to_string(),
        Type::Named(name) => name.clone(),
    }
}

/// The zero value literal for a type, used when `when`/`unless` in
/// expression position need a value for the implicit absent branch.
pub fn zero_value(ty: &Type) -> String {
    match ty {
        Type::Int => "0".to_string(),
        Type::Float => "0.0".to_string(),
        Type::String => "\"\"".to_string(),
        Type::Bool => "false".to_string(),
        Type::SymbolType => "\"\"".to_string(),
        Type::List(elem) => format!("[]{}{{}}", render_type(elem)),
        Type::Map(k, v) => format!("map[{}]{}{{}}", render_type(k), render_type(v)),
        Type::Function(..) => "nil".to_string(),
        Type::Unknown(_) => "nil".to_string(),
        Type::Named(name) => format!("{}{{}}", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_primitive_types() {
        assert_eq!(render_type(&Type::Int), "int");
        assert_eq!(render_type(&Type::Float), "float64");
        assert_eq!(render_type(&Type::String), "string");
        assert_eq!(render_type(&Type::Bool), "bool");
    }

    #[test]
    fn renders_list_and_map_types() {
        assert_eq!(render_type(&Type::List(Box::new(Type::Int))), "[]int");
        assert_eq!(
            render_type(&Type::Map(Box::new(Type::String), Box::new(Type::Int))),
            "map[string]int"
        );
    }

    #[test]
    fn unknown_renders_as_any() {
        assert_eq!(render_type(&Type::Unknown(3)), "any");
    }

    #[test]
    fn zero_values_match_type() {
        assert_eq!(zero_value(&Type::Int), "0");
        assert_eq!(zero_value(&Type::Bool), "false");
        assert_eq!(zero_value(&Type::String), "\"\"");
    }
}
