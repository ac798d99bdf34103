use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use nodeflow_core::error::{NodeflowError, Result};
use nodeflow_core::types::{FunctionSchema, OpKind, ParamSchema, ReturnSchema, ValueType};

/// One structural manifest file (`ops.toml`, `progress_ops.toml` or
/// `stream_ops.toml`): an array of unit declarations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackFile {
    #[serde(default, rename = "op")]
    pub ops: Vec<UnitManifest>,
}

/// A declared operation unit. The declared parameter and return types are
/// the "annotations" the introspector resolves; `impl` binds the unit to
/// a compiled callable (defaulting to the unit name).
#[derive(Debug, Clone, Deserialize)]
pub struct UnitManifest {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default, rename = "impl")]
    pub binding: Option<String>,
    #[serde(default, rename = "param")]
    pub params: Vec<ParamManifest>,
    #[serde(default)]
    pub returns: Option<ReturnsManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamManifest {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub default: Option<toml::Value>,
    /// Admissible values, required when `type = "literal"`.
    #[serde(default)]
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnsManifest {
    #[serde(rename = "type")]
    pub ty: String,
    /// The tagged multi-key dict marker: declaring `keys` expands the
    /// unit into one return descriptor per key.
    #[serde(default)]
    pub keys: Option<Vec<String>>,
}

impl UnitManifest {
    /// The callable this unit binds to.
    pub fn binding(&self) -> &str {
        self.binding.as_deref().unwrap_or(&self.name)
    }

    /// Resolve declared types into a `FunctionSchema`. Any unresolvable
    /// declaration is a manifest error; the loader skips the unit.
    pub fn to_schema(&self, kind: OpKind, filepath: &Path) -> Result<FunctionSchema> {
        let mut params = Vec::with_capacity(self.params.len());
        for param in &self.params {
            let ty = ValueType::parse(&param.ty).ok_or_else(|| {
                NodeflowError::Manifest(format!(
                    "unit '{}' parameter '{}' has unknown type '{}'",
                    self.name, param.name, param.ty
                ))
            })?;

            let literal_values = match (ty, &param.values) {
                (ValueType::Literal, Some(values)) => Some(values.clone()),
                (ValueType::Literal, None) => {
                    return Err(NodeflowError::Manifest(format!(
                        "unit '{}' literal parameter '{}' declares no values",
                        self.name, param.name
                    )))
                }
                (_, Some(_)) => {
                    return Err(NodeflowError::Manifest(format!(
                        "unit '{}' parameter '{}' declares values but is not a literal",
                        self.name, param.name
                    )))
                }
                (_, None) => None,
            };

            params.push(ParamSchema {
                name: param.name.clone(),
                ty,
                default: param.default.as_ref().map(to_json).transpose()?,
                literal_values,
            });
        }

        let returns = match &self.returns {
            None => vec![ReturnSchema::result(ValueType::Any)],
            Some(returns) => {
                let ty = ValueType::parse(&returns.ty).ok_or_else(|| {
                    NodeflowError::Manifest(format!(
                        "unit '{}' has unknown return type '{}'",
                        self.name, returns.ty
                    ))
                })?;
                match &returns.keys {
                    None => vec![ReturnSchema::result(ty)],
                    Some(keys) => {
                        if ty != ValueType::Dict {
                            return Err(NodeflowError::Manifest(format!(
                                "unit '{}' declares return keys on non-dict type '{}'",
                                self.name, returns.ty
                            )));
                        }
                        if keys.is_empty() {
                            return Err(NodeflowError::Manifest(format!(
                                "unit '{}' declares an empty return key list",
                                self.name
                            )));
                        }
                        keys.iter()
                            .map(|k| ReturnSchema::new(k.clone(), ValueType::Any))
                            .collect()
                    }
                }
            }
        };

        Ok(FunctionSchema {
            name: self.name.clone(),
            kind,
            params,
            returns,
            docstring: self.doc.clone(),
            filepath: filepath.display().to_string(),
        })
    }
}

fn to_json(value: &toml::Value) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| NodeflowError::Manifest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_plain_unit() {
        let file: PackFile = toml::from_str(
            r#"
[[op]]
name = "add"
doc = "Add two numbers."

[[op.param]]
name = "a"
type = "float"

[[op.param]]
name = "b"
type = "float"
default = 1.0

[op.returns]
type = "float"
"#,
        )
        .unwrap();

        let unit = &file.ops[0];
        assert_eq!(unit.binding(), "add");

        let schema = unit
            .to_schema(OpKind::Plain, Path::new("nodepacks/basic/ops.toml"))
            .unwrap();
        assert_eq!(schema.params.len(), 2);
        assert_eq!(schema.params[1].default, Some(json!(1.0)));
        assert_eq!(schema.returns[0].name, "result");
        assert_eq!(schema.returns[0].ty, ValueType::Float);
        assert_eq!(schema.filepath, "nodepacks/basic/ops.toml");
    }

    #[test]
    fn multi_key_returns_expand() {
        let file: PackFile = toml::from_str(
            r#"
[[op]]
name = "split_name"

[[op.param]]
name = "name"
type = "str"

[op.returns]
type = "dict"
keys = ["first", "last"]
"#,
        )
        .unwrap();

        let schema = file.ops[0]
            .to_schema(OpKind::Plain, Path::new("x"))
            .unwrap();
        let names: Vec<_> = schema.returns.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["first", "last"]);
        assert!(schema.is_multi_output());
    }

    #[test]
    fn literal_requires_values() {
        let file: PackFile = toml::from_str(
            r#"
[[op]]
name = "pick"

[[op.param]]
name = "choice"
type = "literal"
"#,
        )
        .unwrap();
        assert!(file.ops[0].to_schema(OpKind::Plain, Path::new("x")).is_err());
    }

    #[test]
    fn unknown_type_is_a_manifest_error() {
        let file: PackFile = toml::from_str(
            r#"
[[op]]
name = "weird"

[[op.param]]
name = "x"
type = "complex"
"#,
        )
        .unwrap();
        let err = file.ops[0]
            .to_schema(OpKind::Plain, Path::new("x"))
            .unwrap_err();
        assert!(err.to_string().contains("unknown type"));
    }

    #[test]
    fn explicit_binding() {
        let file: PackFile = toml::from_str(
            r#"
[[op]]
name = "plus"
impl = "add"
"#,
        )
        .unwrap();
        assert_eq!(file.ops[0].binding(), "add");
        let schema = file.ops[0]
            .to_schema(OpKind::Plain, Path::new("x"))
            .unwrap();
        assert_eq!(schema.returns[0].ty, ValueType::Any);
    }
}
