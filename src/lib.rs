//! Axis-based path queries over arbitrary trees.
//!
//! A [`Path`] is a list of steps such as `child::x/descendant::*[2]` (or abbreviated, `x//*[2]`).
//! Any tree can be queried by implementing [`TreeNode`]; [`JsonNode`] does so for
//! [`jsontree::Value`].
//!
//! ```
//! use treepath::{select, JsonNode, Path};
//!
//! let value = jsontree::from_str(r#"{"x": [1, 2, 3], "y": "hi"}"#).unwrap();
//! let path = Path::parse("child::x/child::*").unwrap();
//! let matches: Vec<String> = select(&path, JsonNode::root(&value))
//!     .unwrap()
//!     .iter()
//!     .map(|node| node.to_value().to_string())
//!     .collect();
//! assert_eq!(matches, ["1", "2", "3"]);
//! ```

mod edit_distance;
mod error;
mod json;
mod parser;
mod path;
mod query;
mod spanned;
mod tree;

pub use error::{PathError, QueryError};
pub use json::{Attribute, JsonChildren, JsonNode};
pub use path::{Axis, AxisName, NameId, NameTable, NodeTest, Path, Predicate};
pub use query::{select, Query};
pub use tree::TreeNode;
