// Strongly-typed type graph. No serde_json::Value here.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNode {
    Null,
    Boolean,
    Integer(NumericConstraints),
    Number(NumericConstraints),
    String(StringConstraints),
    Array {
        items: Option<Box<TypeNode>>, // `None` is rejected by the emitter
        additional_items: bool,       // "additional items" marker, also rejected
        constraints: ArrayConstraints,
    },
    Object {
        properties: IndexMap<String, TypeNode>, // sorted at emission, not here
        required: Option<Vec<String>>,
    },
    Enum(Vec<String>), // non-empty, string literals only
    Reference(String), // raw pointer text, resolved against the flattened table
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub value: OrderedFloat<f64>,
    pub exclusive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumericConstraints {
    pub minimum: Option<Bound>,
    pub maximum: Option<Bound>,
    pub multiple_of: Option<OrderedFloat<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringConstraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>, // carried, not interpreted
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayConstraints {
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
}

impl TypeNode {
    pub fn kind(&self) -> &'static str {
        match self {
            TypeNode::Null => "null",
            TypeNode::Boolean => "boolean",
            TypeNode::Integer(_) => "integer",
            TypeNode::Number(_) => "number",
            TypeNode::String(_) => "string",
            TypeNode::Array { .. } => "array",
            TypeNode::Object { .. } => "object",
            TypeNode::Enum(_) => "enum",
            TypeNode::Reference(_) => "reference",
        }
    }

    /// Homogeneous array with the given item type.
    pub fn array_of(item: TypeNode) -> Self {
        TypeNode::Array {
            items: Some(Box::new(item)),
            additional_items: false,
            constraints: ArrayConstraints::default(),
        }
    }
}

impl NumericConstraints {
    pub fn is_empty(&self) -> bool {
        self.minimum.is_none() && self.maximum.is_none() && self.multiple_of.is_none()
    }
}

impl StringConstraints {
    pub fn has_length(&self) -> bool {
        self.min_length.is_some() || self.max_length.is_some()
    }
}

impl ArrayConstraints {
    pub fn has_count(&self) -> bool {
        self.min_items.is_some() || self.max_items.is_some()
    }

    /// Anything the array validator call has to enforce.
    pub fn is_empty(&self) -> bool {
        !self.has_count() && !self.unique_items
    }
}
