//! Path expressions: a sequence of axis steps, each with a node test and an optional positional
//! predicate.

use std::fmt;

use indexmap::IndexSet;

use crate::error::PathError;

/// The thirteen XPath axes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AxisName {
    Ancestor,
    AncestorOrSelf,
    Attribute,
    Child,
    Descendant,
    DescendantOrSelf,
    Following,
    FollowingSibling,
    Namespace,
    Parent,
    Preceding,
    PrecedingSibling,
    SelfAxis,
}

impl AxisName {
    pub const ALL: [AxisName; 13] = [
        AxisName::Ancestor,
        AxisName::AncestorOrSelf,
        AxisName::Attribute,
        AxisName::Child,
        AxisName::Descendant,
        AxisName::DescendantOrSelf,
        AxisName::Following,
        AxisName::FollowingSibling,
        AxisName::Namespace,
        AxisName::Parent,
        AxisName::Preceding,
        AxisName::PrecedingSibling,
        AxisName::SelfAxis,
    ];

    /// Spellings of [`AxisName::ALL`], in the same order.
    pub const NAMES: [&'static str; 13] = [
        "ancestor",
        "ancestor-or-self",
        "attribute",
        "child",
        "descendant",
        "descendant-or-self",
        "following",
        "following-sibling",
        "namespace",
        "parent",
        "preceding",
        "preceding-sibling",
        "self",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AxisName::Ancestor => "ancestor",
            AxisName::AncestorOrSelf => "ancestor-or-self",
            AxisName::Attribute => "attribute",
            AxisName::Child => "child",
            AxisName::Descendant => "descendant",
            AxisName::DescendantOrSelf => "descendant-or-self",
            AxisName::Following => "following",
            AxisName::FollowingSibling => "following-sibling",
            AxisName::Namespace => "namespace",
            AxisName::Parent => "parent",
            AxisName::Preceding => "preceding",
            AxisName::PrecedingSibling => "preceding-sibling",
            AxisName::SelfAxis => "self",
        }
    }

    pub fn from_name(name: &str) -> Option<AxisName> {
        Self::NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self::ALL[i])
    }
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

index_vec::define_index_type! {
    pub struct NameId = usize;
}

/// Interned node-test names. Each distinct literal is stored once per path; steps refer to it by
/// [`NameId`], so matching a node is an integer comparison once the node's tag has been looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    names: IndexSet<String>,
}

impl NameTable {
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(i) = self.names.get_index_of(name) {
            return NameId::from_usize(i);
        }
        let (i, _) = self.names.insert_full(name.to_owned());
        NameId::from_usize(i)
    }

    /// The id of `name`, if some step tests for it.
    pub fn lookup(&self, name: &str) -> Option<NameId> {
        self.names.get_index_of(name).map(NameId::from_usize)
    }

    pub fn resolve(&self, id: NameId) -> Option<&str> {
        self.names.get_index(id.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeTest {
    /// `*`
    Wildcard,
    /// `node()`
    Node,
    Name(NameId),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// `[n]`, 1-based.
    Position(usize),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Axis {
    pub name: AxisName,
    pub test: NodeTest,
    pub predicate: Option<Predicate>,
}

/// A parsed path expression.
///
/// The empty path selects the root it is evaluated against. `absolute` only records whether the
/// text started with `/`: evaluation always starts at the root handed to the evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    pub(crate) absolute: bool,
    pub(crate) steps: Vec<Axis>,
    pub(crate) names: NameTable,
}

impl Path {
    /// Parse either the verbose (`child::a/descendant::*`) or the abbreviated (`a//*`) syntax.
    pub fn parse(text: &str) -> Result<Path, PathError> {
        crate::parser::parse_path(text)
    }

    /// An empty relative path, to be extended with [`Path::step`].
    pub fn new() -> Path {
        Path::default()
    }

    /// Append a step. `test` is `*`, `node()` or a literal name.
    pub fn step(mut self, axis: AxisName, test: &str) -> Path {
        let test = match test {
            "*" => NodeTest::Wildcard,
            "node()" => NodeTest::Node,
            name => NodeTest::Name(self.names.intern(name)),
        };
        self.steps.push(Axis {
            name: axis,
            test,
            predicate: None,
        });
        self
    }

    /// Restrict the last step to its `n`-th match. Does nothing on an empty path.
    pub fn nth(mut self, n: usize) -> Path {
        if let Some(last) = self.steps.last_mut() {
            last.predicate = Some(Predicate::Position(n));
        }
        self
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn steps(&self) -> &[Axis] {
        &self.steps
    }

    pub fn names(&self) -> &NameTable {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::str::FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// The verbose form: `/child::a/descendant-or-self::node()[2]`.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str(if self.absolute { "/" } else { "." });
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 || self.absolute {
                f.write_str("/")?;
            }
            write!(f, "{}::", step.name)?;
            match step.test {
                NodeTest::Wildcard => f.write_str("*")?,
                NodeTest::Node => f.write_str("node()")?,
                NodeTest::Name(id) => {
                    let name = self.names.resolve(id).unwrap_or_default();
                    if is_plain_name(name) {
                        f.write_str(name)?;
                    } else if name.contains('"') {
                        write!(f, "'{name}'")?;
                    } else {
                        write!(f, "\"{name}\"")?;
                    }
                }
            }
            if let Some(Predicate::Position(n)) = step.predicate {
                write!(f, "[{n}]")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_names_round_trip() {
        for (axis, name) in AxisName::ALL.iter().zip(AxisName::NAMES) {
            assert_eq!(axis.as_str(), name);
            assert_eq!(AxisName::from_name(name), Some(*axis));
        }
        assert_eq!(AxisName::from_name("sibling"), None);
        assert_eq!(AxisName::from_name("Child"), None);
    }

    #[test]
    fn names_are_interned_once() {
        let mut names = NameTable::default();
        let a = names.intern("a");
        let b = names.intern("b");
        assert_ne!(a, b);
        assert_eq!(names.intern("a"), a);
        assert_eq!(names.len(), 2);
        assert_eq!(names.lookup("b"), Some(b));
        assert_eq!(names.lookup("c"), None);
        assert_eq!(names.resolve(a), Some("a"));
    }

    #[test]
    fn builder_matches_parser() {
        let built = Path::new()
            .step(AxisName::Child, "x")
            .step(AxisName::Descendant, "*")
            .step(AxisName::SelfAxis, "node()")
            .nth(2);
        assert_eq!(built, Path::parse("child::x/descendant::*/self::node()[2]").unwrap());
    }

    #[test]
    fn display_is_verbose() {
        assert_eq!(Path::new().to_string(), ".");
        assert_eq!(Path::parse("/").unwrap().to_string(), "/");
        assert_eq!(
            Path::parse("/a//b[1]/@size").unwrap().to_string(),
            "/child::a/descendant-or-self::node()/child::b[1]/attribute::size"
        );
        assert_eq!(
            Path::parse(r#"child::"a b"/child::'say "hi"'"#).unwrap().to_string(),
            r#"child::"a b"/child::'say "hi"'"#
        );
    }
}
