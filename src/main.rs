use std::io::{self, Write as _};
use std::ops::Range;
use std::path::PathBuf;

use anyhow::{bail, Context};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use clap::Parser as ClapParser;
use confique::Config as _;
use jsontree::{JsonError, ParserConfig, PrintOptions, Span};
use tracing::*;
use treepath::{JsonNode, Path, PathError, Query};

use crate::config::Config;

mod config;
mod logging;

#[derive(Debug, ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// A TOML configuration file. Ignored if it does not exist.
    #[arg(long, default_value = "treepath.toml")]
    config: PathBuf,
    /// Escape every non-ASCII character in the output.
    #[arg(long)]
    ascii: bool,
    /// Print each match indented over multiple lines.
    #[arg(long)]
    pretty: bool,
    /// Print the number of matches instead of the matches.
    #[arg(long)]
    count: bool,
    /// Print the matches of each file as one JSON array, serialized by `serde_json`.
    #[arg(long, conflicts_with = "count")]
    json: bool,
    /// A path expression, e.g. `child::x/descendant::*` or `x//*`.
    path: String,
    /// JSON files to query.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

type DiagnosticReport<'a> = Report<'a, (&'a String, Range<usize>)>;

fn main() -> anyhow::Result<()> {
    logging::setup_logging();

    let cli = Args::parse();

    debug!(?cli);

    let config = Config::builder()
        .file(&cli.config)
        .load()
        .with_context(|| format!("failed to load config `{}`", cli.config.display()))?;

    debug!(?config);

    let src_id = "<path>".to_string();
    let path = match Path::parse(&cli.path) {
        Ok(path) => path,
        Err(e) => {
            path_report(&src_id, &cli.path, &e).eprint((&src_id, Source::from(&cli.path)))?;
            bail!("invalid path expression `{}`", cli.path);
        }
    };

    debug!(%path);

    let mut options = PrintOptions::from(&config.print);
    if cli.pretty {
        options = PrintOptions {
            ascii_only: options.ascii_only,
            ..PrintOptions::pretty()
        };
    }
    if cli.ascii {
        options.ascii_only = true;
    }

    let run = Run {
        path: &path,
        options,
        parser_config: ParserConfig {
            max_depth: config.max_depth,
        },
        step_limit: config.step_limit,
        count: cli.count,
        json: cli.json,
        label_counts: cli.files.len() > 1,
    };

    let mut failed = 0;
    for file in &cli.files {
        if let Err(e) = run.query_file(file) {
            error!("{e:#}");
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} of {} input files could not be queried", cli.files.len());
    }

    Ok(())
}

struct Run<'p> {
    path: &'p Path,
    options: PrintOptions,
    parser_config: ParserConfig,
    step_limit: Option<u64>,
    count: bool,
    json: bool,
    label_counts: bool,
}

impl Run<'_> {
    #[instrument(skip(self))]
    fn query_file(&self, file: &std::path::Path) -> anyhow::Result<()> {
        let bytes = std::fs::read(file)
            .with_context(|| format!("failed to read file `{}`", file.display()))?;

        let text = jsontree::normalize_bytes(&bytes)
            .with_context(|| format!("failed to normalize `{}`", file.display()))?;

        let src_id = file.display().to_string();
        let value = match jsontree::lex(&text)
            .and_then(|tokens| jsontree::parse_tokens_with(&tokens, &self.parser_config))
        {
            Ok(value) => value,
            Err(e) => {
                json_report(&src_id, &e).eprint((&src_id, Source::from(&text)))?;
                bail!("failed to parse `{src_id}`: {e}");
            }
        };

        let mut query = Query::new(self.path, JsonNode::root(&value));
        if let Some(limit) = self.step_limit {
            query = query.with_step_limit(limit);
        }

        let mut stdout = io::stdout().lock();
        let mut matches = 0usize;
        let mut collected = Vec::new();
        for node in query {
            let node = node.with_context(|| format!("failed to query `{src_id}`"))?;
            matches += 1;
            if self.json {
                collected.push(node.to_value());
            } else if !self.count {
                writeln!(stdout, "{}", node.to_value().display(self.options))?;
            }
        }

        if self.json {
            serde_json::to_writer(&mut stdout, &collected)?;
            writeln!(stdout)?;
        }

        debug!(matches);

        if self.count {
            if self.label_counts {
                writeln!(stdout, "{src_id}: {matches}")?;
            } else {
                writeln!(stdout, "{matches}")?;
            }
        }

        Ok(())
    }
}

/// `ariadne` counts characters, path spans count bytes.
fn char_range(text: &str, span: Span) -> Range<usize> {
    let chars_before = |byte: usize| text.char_indices().take_while(|&(i, _)| i < byte).count();
    chars_before(span.lo)..chars_before(span.hi)
}

fn path_report<'a>(src_id: &'a String, text: &str, e: &PathError) -> DiagnosticReport<'a> {
    let range = char_range(text, e.span());
    let mut report = Report::build(ReportKind::Error, src_id, range.start)
        .with_message("invalid path expression")
        .with_label(
            Label::new((src_id, range))
                .with_message(e.to_string())
                .with_color(Color::Red),
        );
    match e {
        PathError::BadAxisName {
            suggestion: Some(suggestion),
            ..
        } => {
            report.set_help(format!(
                "did you mean {} instead?",
                suggestion.fg(Color::Blue)
            ));
        }
        PathError::BadAxisName { .. } => {
            report.set_note(format!(
                "known axes are: {}",
                treepath::AxisName::NAMES.join(", ")
            ));
        }
        PathError::BadAxisTest { .. } => {
            report.set_note(format!(
                "the only supported node test function is {}",
                "node()".fg(Color::Blue)
            ));
        }
        PathError::Syntax { .. } => {}
    }
    report.finish()
}

/// Normalized JSON text is ASCII, so byte spans are character spans.
fn json_report<'a>(src_id: &'a String, e: &JsonError) -> DiagnosticReport<'a> {
    let span = e.span().unwrap_or_default();
    Report::build(ReportKind::Error, src_id, span.lo)
        .with_message("failed to parse JSON")
        .with_label(
            Label::new((src_id, span.into_range()))
                .with_message(e.to_string())
                .with_color(Color::Red),
        )
        .finish()
}
