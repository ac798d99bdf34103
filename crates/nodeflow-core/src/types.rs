use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Declared type of an operation parameter or return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Float,
    Str,
    Bool,
    List,
    Dict,
    Image,
    Literal,
    Any,
}

impl ValueType {
    /// Parse a wire type tag. `object` is accepted as an alias for `dict`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::Str),
            "bool" => Some(Self::Bool),
            "list" => Some(Self::List),
            "dict" | "object" => Some(Self::Dict),
            "image" => Some(Self::Image),
            "literal" => Some(Self::Literal),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Dict => "dict",
            Self::Image => "image",
            Self::Literal => "literal",
            Self::Any => "any",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Self::parse(&tag)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown type tag '{}'", tag)))
    }
}

/// Which invocation shape an operation has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Plain,
    Progress,
    Stream,
}

/// One declared parameter of an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal_values: Option<Vec<String>>,
}

impl ParamSchema {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            literal_values: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_literal_values(mut self, values: Vec<String>) -> Self {
        self.literal_values = Some(values);
        self
    }
}

/// One declared output of an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ValueType,
}

impl ReturnSchema {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// The single-output descriptor used when a unit declares no returns.
    pub fn result(ty: ValueType) -> Self {
        Self::new("result", ty)
    }
}

/// Immutable description of one registered operation.
///
/// Built once per registry build and never mutated thereafter. The JSON
/// form carries `is_progress_node` / `is_stream_node` only for the
/// non-plain kinds, which is why serialization is written out by hand.
#[derive(Debug, Clone)]
pub struct FunctionSchema {
    pub name: String,
    pub kind: OpKind,
    pub params: Vec<ParamSchema>,
    pub returns: Vec<ReturnSchema>,
    pub docstring: String,
    pub filepath: String,
}

impl FunctionSchema {
    pub fn param(&self, name: &str) -> Option<&ParamSchema> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Whether the operation declares multiple independently-addressable
    /// output keys.
    pub fn is_multi_output(&self) -> bool {
        self.returns.len() > 1
    }
}

impl Serialize for FunctionSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let fields = if self.kind == OpKind::Plain { 5 } else { 6 };
        let mut s = serializer.serialize_struct("FunctionSchema", fields)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("params", &self.params)?;
        s.serialize_field("returns", &self.returns)?;
        s.serialize_field("docstring", &self.docstring)?;
        s.serialize_field("filepath", &self.filepath)?;
        match self.kind {
            OpKind::Plain => {}
            OpKind::Progress => s.serialize_field("is_progress_node", &true)?,
            OpKind::Stream => s.serialize_field("is_stream_node", &true)?,
        }
        s.end()
    }
}
