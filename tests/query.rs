//! End-to-end queries over JSON documents and over a tree whose nodes know their parents.

use std::collections::HashSet;
use std::rc::Rc;

use jsontree::{from_str, Value};
use proptest::prelude::*;
use treepath::{select, AxisName, JsonNode, Path, Query, QueryError, TreeNode};

fn run(path: &str, json: &str) -> Result<Vec<String>, QueryError> {
    let path = Path::parse(path).unwrap();
    let value = from_str(json).unwrap();
    let nodes = select(&path, JsonNode::root(&value))?;
    Ok(nodes.iter().map(|n| n.to_value().to_string()).collect())
}

#[test]
fn self_matches_root_kind() {
    assert_eq!(run("self::object", r#"{"a":1}"#).unwrap(), [r#"{"a":1}"#]);
    assert_eq!(run("self::node()", "3").unwrap(), ["3"]);
    assert!(run("self::string", "3").unwrap().is_empty());
}

#[test]
fn child_wildcard_in_container_order() {
    assert_eq!(run("child::*", r#"{"a":1,"b":2,"c":3}"#).unwrap(), ["1", "2", "3"]);
    assert_eq!(run("*", r#"{"c":3,"a":1}"#).unwrap(), ["3", "1"]);
    assert!(run("child::*", r#""leaf""#).unwrap().is_empty());
}

#[test]
fn descendant_visits_each_node_once() {
    let json = "[[1,[2]],3]";
    assert_eq!(
        run("descendant::*", json).unwrap(),
        ["[1,[2]]", "1", "[2]", "2", "3"]
    );
    assert_eq!(
        run("descendant-or-self::*", json).unwrap(),
        ["[[1,[2]],3]", "[1,[2]]", "1", "[2]", "2", "3"]
    );
}

#[test]
fn parent_of_root_is_empty() {
    assert!(run("parent::*", r#"{"a":1}"#).unwrap().is_empty());
    assert!(run("..", "[]").unwrap().is_empty());
}

#[test]
fn member_then_elements() {
    let json = r#"{"x":[1,2,3],"y":"hi"}"#;
    assert_eq!(run("child::x", json).unwrap(), ["[1,2,3]"]);
    assert_eq!(run("child::x/child::*", json).unwrap(), ["1", "2", "3"]);
    assert_eq!(run("x/*", json).unwrap(), ["1", "2", "3"]);
    assert_eq!(run("/child::y", json).unwrap(), [r#""hi""#]);
}

#[test]
fn tags_are_keys_or_kinds() {
    let json = r#"{"a":{"name":1},"name":2}"#;
    assert_eq!(run("descendant::name", json).unwrap(), ["1", "2"]);
    assert_eq!(run("child::number", r#"[1,"x",2]"#).unwrap(), ["1", "2"]);
    assert_eq!(run("child::string", r#"[1,"x",2]"#).unwrap(), [r#""x""#]);
    assert_eq!(run(r#"child::"two words""#, r#"{"two words":true}"#).unwrap(), ["true"]);
}

#[test]
fn results_follow_traversal_order() {
    // `//name` checks the root's members before descending, so this is not document order.
    let json = r#"{"a":{"name":1},"name":2}"#;
    assert_eq!(run("//name", json).unwrap(), ["2", "1"]);
}

#[test]
fn results_are_not_deduplicated() {
    let json = r#"{"a":1,"b":2}"#;
    assert_eq!(run("child::*/parent::*", json).unwrap(), [json, json]);
    assert_eq!(run("a/..", json).unwrap(), [json]);
}

#[test]
fn sibling_axes() {
    let json = r#"{"a":{"p":1},"b":[2,3],"c":4}"#;
    assert_eq!(run("a/following-sibling::*", json).unwrap(), ["[2,3]", "4"]);
    assert_eq!(
        run("c/preceding-sibling::*", json).unwrap(),
        [r#"{"p":1}"#, "[2,3]"]
    );
    assert_eq!(run("c/preceding-sibling::*[1]", json).unwrap(), [r#"{"p":1}"#]);
    assert_eq!(run("b/*[1]/following-sibling::*", json).unwrap(), ["3"]);
    assert!(run("following-sibling::*", json).unwrap().is_empty());
}

#[test]
fn following_and_preceding_cover_other_subtrees() {
    let json = r#"{"a":{"p":1},"b":[2,3],"c":4}"#;
    assert_eq!(
        run("a/p/following::*", json).unwrap(),
        ["[2,3]", "2", "3", "4"]
    );
    assert_eq!(
        run("c/preceding::*", json).unwrap(),
        [r#"{"p":1}"#, "1", "[2,3]", "2", "3"]
    );
    assert_eq!(
        run("b/*[2]/preceding::*", json).unwrap(),
        [r#"{"p":1}"#, "1", "2"]
    );
    assert!(run("following::*", json).unwrap().is_empty());
}

#[test]
fn ancestors_nearest_first() {
    let json = r#"{"a":{"p":1}}"#;
    assert_eq!(
        run("descendant::p/ancestor::*", json).unwrap(),
        [r#"{"p":1}"#, json]
    );
    assert_eq!(
        run("descendant::p/ancestor-or-self::*", json).unwrap(),
        ["1", r#"{"p":1}"#, json]
    );
    assert_eq!(run("descendant::p/ancestor::*[2]", json).unwrap(), [json]);
}

#[test]
fn container_attributes() {
    assert_eq!(run("attribute::size", "[1,2]").unwrap(), ["2"]);
    assert_eq!(run("@*", "{}").unwrap(), ["0", "true"]);
    assert_eq!(
        run("descendant-or-self::*/@empty", r#"{"a":[],"b":[1]}"#).unwrap(),
        ["false", "true", "false"]
    );
    assert!(run("child::*/@size", "[1]").unwrap().is_empty());
    assert!(run("@length", "[1]").unwrap().is_empty());
}

#[test]
fn attributes_have_an_owner_but_no_siblings() {
    assert_eq!(run("@size/parent::*", "[1,2]").unwrap(), ["[1,2]"]);
    assert!(run("@size/following-sibling::*", "[1,2]").unwrap().is_empty());
}

#[test]
fn namespace_axis_is_an_error() {
    assert_eq!(
        run("namespace::*", "{}"),
        Err(QueryError::UnsupportedAxis(AxisName::Namespace))
    );
    // Only raised once the axis is actually reached.
    assert_eq!(run("child::*/namespace::*", "{}").unwrap(), Vec::<String>::new());
}

#[test]
fn positional_predicates() {
    assert_eq!(run("child::*[2]", "[10,20,30]").unwrap(), ["20"]);
    assert!(run("child::*[4]", "[10,20,30]").unwrap().is_empty());
    assert_eq!(run("*/*[1]", "[[1,2],[3,4]]").unwrap(), ["1", "3"]);
    assert_eq!(run("child::number[2]", r#"[1,"x",2]"#).unwrap(), ["2"]);
}

#[test]
fn query_is_lazy() {
    let value: Value = (0..10_000i32).map(Value::from).collect();
    let path = Path::parse("descendant::*").unwrap();

    let first: Vec<_> = Query::new(&path, JsonNode::root(&value))
        .with_step_limit(20)
        .take(3)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(first.len(), 3);

    let all = Query::new(&path, JsonNode::root(&value))
        .with_step_limit(20)
        .collect::<Result<Vec<_>, _>>();
    assert_eq!(all, Err(QueryError::StepLimitExceeded(20)));
}

/// A tree stored in a flat arena, whose nodes can find their parents.
struct Arena {
    tags: Vec<&'static str>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

#[derive(Clone)]
struct Handle {
    arena: Rc<Arena>,
    id: usize,
}

impl TreeNode for Handle {
    type Children = std::vec::IntoIter<Handle>;

    const KNOWS_PARENT: bool = true;

    fn tag(&self) -> &str {
        self.arena.tags[self.id]
    }

    fn children(&self) -> Self::Children {
        self.arena.children[self.id]
            .iter()
            .map(|&id| Handle {
                arena: Rc::clone(&self.arena),
                id,
            })
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn parent(&self) -> Option<Self> {
        self.arena.parents[self.id].map(|id| Handle {
            arena: Rc::clone(&self.arena),
            id,
        })
    }
}

/// html(head(title), body(p, p))
fn document() -> Rc<Arena> {
    Rc::new(Arena {
        tags: vec!["html", "head", "title", "body", "p", "p"],
        parents: vec![None, Some(0), Some(1), Some(0), Some(3), Some(3)],
        children: vec![vec![1, 3], vec![2], vec![], vec![4, 5], vec![], vec![]],
    })
}

fn ids(path: &str, start: usize) -> Result<Vec<usize>, QueryError> {
    let path = Path::parse(path).unwrap();
    let start = Handle {
        arena: document(),
        id: start,
    };
    Ok(select(&path, start)?.iter().map(|h| h.id).collect())
}

#[test]
fn intrinsic_parents_reach_above_the_start() {
    assert_eq!(ids("parent::*", 2).unwrap(), [1]);
    assert_eq!(ids("ancestor::*", 2).unwrap(), [1, 0]);
    assert_eq!(ids("ancestor-or-self::node()", 2).unwrap(), [2, 1, 0]);
    assert_eq!(ids("../../body/p", 2).unwrap(), [4, 5]);
}

#[test]
fn routes_are_used_when_known() {
    assert_eq!(ids("head/following-sibling::*", 0).unwrap(), [3]);
    assert_eq!(ids("body/p[2]/ancestor::*", 0).unwrap(), [3, 0]);
    assert_eq!(ids("//p/preceding::*", 0).unwrap(), [1, 2, 1, 2, 4]);
}

#[test]
fn trees_without_attributes_reject_the_attribute_axis() {
    assert_eq!(
        ids("@*", 0),
        Err(QueryError::UnsupportedAxis(AxisName::Attribute))
    );
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i32..1000).prop_map(Value::from),
        "[a-z]{0,4}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-c]{1,2}", inner), 0..6)
                .prop_map(|members| members.into_iter().collect()),
        ]
    })
}

fn count_nodes(value: &Value) -> usize {
    1 + match value {
        Value::Object(members) => members.values().map(count_nodes).sum(),
        Value::Array(elements) => elements.iter().map(count_nodes).sum(),
        _ => 0,
    }
}

fn addresses(nodes: &[JsonNode<'_>]) -> Vec<*const Value> {
    nodes
        .iter()
        .filter_map(|n| n.value())
        .map(|v| v as *const Value)
        .collect()
}

proptest! {
    /// descendant::* yields every node below the root exactly once
    #[test]
    fn descendant_is_complete(value in arb_value()) {
        let path = Path::parse("descendant::*").unwrap();
        let nodes = select(&path, JsonNode::root(&value)).unwrap();
        prop_assert_eq!(nodes.len(), count_nodes(&value) - 1);

        let distinct: HashSet<_> = addresses(&nodes).into_iter().collect();
        prop_assert_eq!(distinct.len(), nodes.len());
        prop_assert!(!distinct.contains(&(&value as *const Value)));
    }

    /// descendant-or-self::node() is the root followed by descendant::node()
    #[test]
    fn descendant_or_self_prepends_root(value in arb_value()) {
        let root = JsonNode::root(&value);
        let with_self = select(&Path::parse("descendant-or-self::node()").unwrap(), root).unwrap();
        let without = select(&Path::parse("descendant::node()").unwrap(), root).unwrap();

        let mut expected = vec![&value as *const Value];
        expected.extend(addresses(&without));
        prop_assert_eq!(addresses(&with_self), expected);
    }

    /// Every node found by descendant::* has the root among its ancestors
    #[test]
    fn ancestors_end_at_root(value in arb_value()) {
        let nodes = select(&Path::parse("descendant::*").unwrap(), JsonNode::root(&value)).unwrap();
        let ancestors = select(
            &Path::parse("descendant::*/ancestor::node()").unwrap(),
            JsonNode::root(&value),
        )
        .unwrap();
        let roots = addresses(&ancestors)
            .into_iter()
            .filter(|a| std::ptr::eq(*a, &value))
            .count();
        prop_assert_eq!(roots, nodes.len());
    }
}
