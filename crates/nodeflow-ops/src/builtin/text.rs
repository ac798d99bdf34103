use nodeflow_core::error::Result;
use nodeflow_core::ops::{OpInputs, PlainOp};
use serde_json::{json, Value};

pub struct ConcatOp;

impl PlainOp for ConcatOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        let mut out = inputs.req_str("a")?.to_string();
        out.push_str(inputs.req_str("b")?);
        Ok(Value::String(out))
    }
}

pub struct UppercaseOp;

impl PlainOp for UppercaseOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        Ok(Value::String(inputs.req_str("text")?.to_uppercase()))
    }
}

pub struct LowercaseOp;

impl PlainOp for LowercaseOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        Ok(Value::String(inputs.req_str("text")?.to_lowercase()))
    }
}

/// Split a full name into `{first, last}`. The first whitespace-separated
/// token is `first`; everything after it is `last` (empty for a single
/// token).
pub struct SplitNameOp;

impl PlainOp for SplitNameOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        let name = inputs.req_str("name")?.trim();
        let mut parts = name.splitn(2, char::is_whitespace);
        let first = parts.next().unwrap_or("");
        let last = parts.next().unwrap_or("").trim_start();
        Ok(json!({ "first": first, "last": last }))
    }
}

/// Substitute `value` for the first `{}` placeholder in `template`.
pub struct TemplateOp;

impl PlainOp for TemplateOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        let template = inputs.req_str("template")?;
        let value = inputs.req_str("value")?;
        Ok(Value::String(template.replacen("{}", value, 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn inputs(pairs: &[(&str, &str)]) -> OpInputs {
        let mut map = Map::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), json!(v));
        }
        OpInputs::new(map)
    }

    #[test]
    fn concat() {
        let v = ConcatOp
            .invoke(inputs(&[("a", "Hello "), ("b", "World")]))
            .unwrap();
        assert_eq!(v, json!("Hello World"));
    }

    #[test]
    fn split_name_two_tokens() {
        let v = SplitNameOp
            .invoke(inputs(&[("name", "Ada Lovelace")]))
            .unwrap();
        assert_eq!(v["first"], "Ada");
        assert_eq!(v["last"], "Lovelace");
    }

    #[test]
    fn split_name_single_token() {
        let v = SplitNameOp.invoke(inputs(&[("name", "Ada")])).unwrap();
        assert_eq!(v["first"], "Ada");
        assert_eq!(v["last"], "");
    }

    #[test]
    fn template_substitution() {
        let v = TemplateOp
            .invoke(inputs(&[("template", "Hi {}!"), ("value", "Ada")]))
            .unwrap();
        assert_eq!(v, json!("Hi Ada!"));
    }
}
