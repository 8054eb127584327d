//! Inspection of generated JSON Logic.
//!
//! Rules are not evaluated here. These helpers only find which data fields
//! an expression reads so they can be checked against the catalog.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::catalog::FieldCatalog;

/// Every field name read through a `var` operator anywhere in `logic`.
///
/// Handles the `{"var": "x"}`, `{"var": ["x", default]}` and dotted-path
/// forms. For dotted paths the full path is reported. Empty names (which
/// read the whole data object) are skipped.
pub fn referenced_fields(logic: &Value) -> BTreeSet<String> {
    let mut fields = BTreeSet::new();
    collect_vars(logic, &mut fields);
    fields
}

fn collect_vars(node: &Value, out: &mut BTreeSet<String>) {
    match node {
        Value::Object(map) => {
            for (op, args) in map {
                if op == "var" {
                    if let Some(name) = var_name(args) {
                        out.insert(name);
                    }
                }
                collect_vars(args, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_vars(item, out);
            }
        }
        _ => {}
    }
}

fn var_name(args: &Value) -> Option<String> {
    let first = match args {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let name = match first {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!name.is_empty()).then_some(name)
}

/// Field names used by a rule that are not catalog identifiers.
///
/// Considers both the declared `used_fields` and every `var` in `logic`.
/// The result is sorted and deduplicated.
pub fn unrecognized_fields(
    logic: &Value,
    used_fields: &[String],
    catalog: &FieldCatalog,
) -> Vec<String> {
    let mut names = referenced_fields(logic);
    names.extend(used_fields.iter().cloned());
    names
        .into_iter()
        .filter(|name| !catalog.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldDescriptor;
    use serde_json::json;

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_fields(
            "test",
            vec![
                FieldDescriptor::new("Bureau Score", "bureau_score", "Bureau"),
                FieldDescriptor::new("Overdue Amount", "overdue_amount", "Bureau"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_nested_vars_collected() {
        let logic = json!({
            "and": [
                {"<": [{"var": "bureau_score"}, 600]},
                {"or": [
                    {">": [{"var": ["overdue_amount", 0]}, 50000]},
                    {"in": [{"var": "applicant.city"}, ["A", "B"]]}
                ]}
            ]
        });
        let fields: Vec<String> = referenced_fields(&logic).into_iter().collect();
        assert_eq!(fields, vec!["applicant.city", "bureau_score", "overdue_amount"]);
    }

    #[test]
    fn test_empty_var_and_scalars_ignored() {
        assert!(referenced_fields(&json!({"var": ""})).is_empty());
        assert!(referenced_fields(&json!(true)).is_empty());
        assert!(referenced_fields(&Value::Null).is_empty());
    }

    #[test]
    fn test_unrecognized_from_logic_and_used_fields() {
        let logic = json!({"and": [
            {"<": [{"var": "bureau_score"}, 600]},
            {">": [{"var": "credit_score"}, 1]}
        ]});
        let used = vec!["bureau_score".to_string(), "cibil".to_string()];
        assert_eq!(
            unrecognized_fields(&logic, &used, &catalog()),
            vec!["cibil", "credit_score"]
        );
    }

    #[test]
    fn test_all_known_fields() {
        let logic = json!({"<": [{"var": "bureau_score"}, 600]});
        let used = vec!["bureau_score".to_string()];
        assert!(unrecognized_fields(&logic, &used, &catalog()).is_empty());
    }
}
