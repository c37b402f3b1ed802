//! [`TreeNode`] for parsed JSON.

use std::borrow::Cow;
use std::slice;

use jsontree::Value;

use crate::tree::TreeNode;

/// A node of a [`Value`] tree, or an attribute synthesized from a container.
///
/// Object members are tagged with their key, so `child::x` selects the member `x`. Everything
/// else is tagged with its kind: `object`, `array`, `string`, `number`, `bool` or `null`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum JsonNode<'a> {
    Value {
        key: Option<&'a str>,
        value: &'a Value,
    },
    Attribute(Attribute),
}

/// The attributes of objects and arrays. Scalars have none.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// Number of members or elements.
    Size(usize),
    Empty(bool),
}

const CONTAINER_ATTRIBUTES: &[&str] = &["size", "empty"];

impl<'a> JsonNode<'a> {
    pub fn root(value: &'a Value) -> Self {
        JsonNode::Value { key: None, value }
    }

    /// The underlying value; `None` for attributes.
    pub fn value(&self) -> Option<&'a Value> {
        match self {
            JsonNode::Value { value, .. } => Some(value),
            JsonNode::Attribute(_) => None,
        }
    }

    /// The member key this node was reached through.
    pub fn key(&self) -> Option<&'a str> {
        match self {
            JsonNode::Value { key, .. } => *key,
            JsonNode::Attribute(_) => None,
        }
    }

    /// The node as a value, attributes becoming a number or a bool.
    pub fn to_value(&self) -> Cow<'a, Value> {
        match *self {
            JsonNode::Value { value, .. } => Cow::Borrowed(value),
            JsonNode::Attribute(Attribute::Size(n)) => Cow::Owned(Value::Number(n as f64)),
            JsonNode::Attribute(Attribute::Empty(b)) => Cow::Owned(Value::Bool(b)),
        }
    }
}

pub enum JsonChildren<'a> {
    Leaf,
    Object(indexmap::map::Iter<'a, String, Value>),
    Array(slice::Iter<'a, Value>),
}

impl<'a> Iterator for JsonChildren<'a> {
    type Item = JsonNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            JsonChildren::Leaf => None,
            JsonChildren::Object(members) => members.next().map(|(key, value)| JsonNode::Value {
                key: Some(key.as_str()),
                value,
            }),
            JsonChildren::Array(elements) => elements
                .next()
                .map(|value| JsonNode::Value { key: None, value }),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            JsonChildren::Leaf => (0, Some(0)),
            JsonChildren::Object(members) => members.size_hint(),
            JsonChildren::Array(elements) => elements.size_hint(),
        }
    }
}

impl<'a> TreeNode for JsonNode<'a> {
    type Children = JsonChildren<'a>;

    const HAS_ATTRIBUTES: bool = true;

    fn tag(&self) -> &str {
        match self {
            JsonNode::Value { key: Some(key), .. } => key,
            JsonNode::Value { key: None, value } => value.kind_desc(),
            JsonNode::Attribute(Attribute::Size(_)) => "size",
            JsonNode::Attribute(Attribute::Empty(_)) => "empty",
        }
    }

    fn children(&self) -> JsonChildren<'a> {
        match self.value() {
            Some(Value::Object(members)) => JsonChildren::Object(members.iter()),
            Some(Value::Array(elements)) => JsonChildren::Array(elements.iter()),
            _ => JsonChildren::Leaf,
        }
    }

    fn attribute(&self, name: &str) -> Option<Self> {
        let len = self.value()?.len()?;
        match name {
            "size" => Some(JsonNode::Attribute(Attribute::Size(len))),
            "empty" => Some(JsonNode::Attribute(Attribute::Empty(len == 0))),
            _ => None,
        }
    }

    fn attribute_names(&self) -> &'static [&'static str] {
        match self.value() {
            Some(value) if value.is_container() => CONTAINER_ATTRIBUTES,
            _ => &[],
        }
    }
}
