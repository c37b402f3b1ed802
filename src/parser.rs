//! Parser for path expressions.
//!
//! Both surface syntaxes go through one grammar: the verbose form (`child::a/descendant::*`) is
//! the abbreviated form (`a//*`) with every step spelled out.
//!
//! ```text
//! path  := ('/' | '//')? step (('/' | '//') step)* | '/' | ''
//! step  := '.' | '..' | '@' test pred* | axis '::' test pred* | test pred*
//! test  := '*' | name '()' | name | '"' chars '"' | '\'' chars '\''
//! pred  := '[' digits ']'
//! ```
//!
//! Parsing yields a raw syntax tree that keeps axis and function names as text. [`lower`] then
//! resolves axis names, checks node tests and interns names into the [`Path`].

use chumsky::prelude::*;
use tracing::*;

use crate::edit_distance;
use crate::error::PathError;
use crate::path::{Axis, AxisName, NodeTest, Path, Predicate};
use crate::spanned::Spanned;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAxis {
    /// Written out as `name::`, not yet validated.
    Named(String),
    /// Implied by an abbreviation, or `child` for a bare node test.
    Implied(AxisName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTest {
    Wildcard,
    Name(String),
    /// `name()`
    Function(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStep {
    pub axis: Spanned<RawAxis>,
    pub test: Spanned<RawTest>,
    pub predicates: Vec<Spanned<usize>>,
}

impl RawStep {
    /// `.` and `..`.
    fn abbreviated(axis: AxisName, span: SimpleSpan) -> RawStep {
        RawStep {
            axis: Spanned::new(RawAxis::Implied(axis), span),
            test: Spanned::new(RawTest::Function("node".to_string()), span),
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sep {
    /// `/`
    Child,
    /// `//`
    Deep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPath {
    pub leading: Option<Sep>,
    pub steps: Vec<(Sep, RawStep)>,
}

pub fn parser<'a>() -> impl Parser<'a, &'a str, RawPath, extra::Err<Rich<'a, char>>> {
    let plain = any()
        .filter(|c: &char| c.is_alphanumeric() || *c == '_' || *c == '-')
        .repeated()
        .at_least(1)
        .to_slice()
        .labelled("name");

    let quoted = choice((
        none_of("\"")
            .repeated()
            .to_slice()
            .delimited_by(just('"'), just('"')),
        none_of("'")
            .repeated()
            .to_slice()
            .delimited_by(just('\''), just('\'')),
    ))
    .labelled("quoted name");

    let test = choice((
        just('*').to(RawTest::Wildcard),
        plain
            .clone()
            .then_ignore(just("()"))
            .map(|name: &str| RawTest::Function(name.to_string())),
        plain.clone().map(|name: &str| RawTest::Name(name.to_string())),
        quoted.map(|name: &str| RawTest::Name(name.to_string())),
    ))
    .map_with(|val, e| Spanned::new(val, e.span()))
    .labelled("node test");

    let predicate = text::int(10)
        .try_map(|digits: &str, span| match digits.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(Rich::custom(span, "position must be a positive integer")),
        })
        .padded()
        .delimited_by(just('['), just(']'))
        .map_with(|n, e| Spanned::new(n, e.span()))
        .labelled("positional predicate");

    let predicates = predicate.repeated().collect::<Vec<_>>();

    let axis = plain
        .map_with(|name: &str, e| Spanned::new(RawAxis::Named(name.to_string()), e.span()))
        .then_ignore(just("::"))
        .labelled("axis");

    let step = choice((
        just("..").map_with(|_, e| RawStep::abbreviated(AxisName::Parent, e.span())),
        just('.').map_with(|_, e| RawStep::abbreviated(AxisName::SelfAxis, e.span())),
        just('@')
            .map_with(|_, e| Spanned::new(RawAxis::Implied(AxisName::Attribute), e.span()))
            .or(axis)
            .then(test.clone())
            .then(predicates.clone())
            .map(|((axis, test), predicates)| RawStep {
                axis,
                test,
                predicates,
            }),
        test.then(predicates).map(|(test, predicates)| RawStep {
            axis: Spanned::new(RawAxis::Implied(AxisName::Child), test.span),
            test,
            predicates,
        }),
    ))
    .boxed()
    .labelled("step");

    let sep = choice((just("//").to(Sep::Deep), just('/').to(Sep::Child))).padded();

    let relative = step
        .clone()
        .then(sep.clone().then(step).repeated().collect::<Vec<_>>());

    sep.or_not()
        .then(relative.or_not())
        .try_map(|(leading, relative), span| {
            let steps = match relative {
                Some((first, rest)) => {
                    let mut steps = vec![(leading.unwrap_or(Sep::Child), first)];
                    steps.extend(rest);
                    steps
                }
                None if leading == Some(Sep::Deep) => {
                    return Err(Rich::custom(span, "expected a step after `//`"));
                }
                None => Vec::new(),
            };
            Ok(RawPath { leading, steps })
        })
        .padded()
        .then_ignore(end())
        .labelled("path")
}

/// Parse and lower `text`, reporting the first problem found.
#[instrument(level = "debug")]
pub fn parse_path(text: &str) -> Result<Path, PathError> {
    let raw = parser().parse(text).into_result().map_err(|errors| {
        match errors.first() {
            Some(e) => PathError::Syntax {
                message: e.to_string(),
                span: jsontree::Span::new(e.span().start, e.span().end),
            },
            None => PathError::Syntax {
                message: "invalid path expression".to_string(),
                span: jsontree::Span::new(0, text.len()),
            },
        }
    })?;
    trace!(?raw);
    lower(raw)
}

/// Resolve axis names and node tests, interning names.
pub fn lower(raw: RawPath) -> Result<Path, PathError> {
    let mut path = Path {
        absolute: raw.leading.is_some(),
        ..Path::default()
    };

    for (sep, step) in raw.steps {
        if sep == Sep::Deep {
            path.steps.push(Axis {
                name: AxisName::DescendantOrSelf,
                test: NodeTest::Node,
                predicate: None,
            });
        }

        let name = match &step.axis.val {
            RawAxis::Implied(axis) => *axis,
            RawAxis::Named(name) => {
                AxisName::from_name(name).ok_or_else(|| PathError::BadAxisName {
                    name: name.clone(),
                    span: step.axis.to_span(),
                    suggestion: edit_distance::find_best_match_for_name(
                        &AxisName::NAMES,
                        name,
                        Some(3),
                    ),
                })?
            }
        };

        let test = match &step.test.val {
            RawTest::Wildcard => NodeTest::Wildcard,
            RawTest::Name(name) => NodeTest::Name(path.names.intern(name)),
            RawTest::Function(f) if f == "node" => NodeTest::Node,
            RawTest::Function(f) => {
                return Err(PathError::BadAxisTest {
                    test: format!("{f}()"),
                    span: step.test.to_span(),
                })
            }
        };

        let predicate = match step.predicates.as_slice() {
            [] => None,
            [n] => Some(Predicate::Position(n.val)),
            [_, extra, ..] => {
                return Err(PathError::Syntax {
                    message: "a step takes at most one predicate".to_string(),
                    span: extra.to_span(),
                })
            }
        };

        path.steps.push(Axis {
            name,
            test,
            predicate,
        });
    }

    Ok(path)
}
