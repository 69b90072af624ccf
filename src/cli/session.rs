//! Line-oriented staging session
//!
//! Each line is one command against a [`Workspace`]. Node references are a
//! full UUID or an unambiguous prefix of one.

use std::io::{BufRead, Write};
use std::str::FromStr;

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, Workspace};
use crate::cli::{CliError, CliResult};
use crate::domain::{forest_tree, DisplayNode, Forest, NodeId};
use crate::infrastructure::InfraError;

pub const HELP: &str = "\
commands:
  add <value> [parent]     add a node to scratch (under parent, else as root)
  edit <node> <value>      change the value of a scratch node
  remove <node>            delete a scratch node with its subtree
  copy <node>              copy a store node into scratch
  apply                    merge scratch into store, clear scratch
  reset                    reseed store, clear scratch
  show [store|scratch|all] print trees (default: all)
  help                     this text
quote values containing spaces: add \"new node\" or add 'new node'
escape a quote with a backslash: add \"say \\\"hi\\\"\"";

/// Which forest(s) `show` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTarget {
    Store,
    Scratch,
    All,
}

/// One parsed session line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Add { value: String, parent: Option<String> },
    Edit { node: String, value: String },
    Remove { node: String },
    Copy { node: String },
    Apply,
    Reset,
    Show(ViewTarget),
    Help,
}

/// Split a line into words with shell quoting rules.
pub fn tokenize(line: &str) -> CliResult<Vec<String>> {
    shell_words::split(line)
        .map_err(|e| CliError::InvalidArgs(format!("cannot parse '{line}': {e}")))
}

impl FromStr for SessionCommand {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(line)?;
        let mut args = tokens.into_iter();
        let Some(verb) = args.next() else {
            return Err(CliError::Usage("empty command".to_string()));
        };
        let rest: Vec<String> = args.collect();

        let usage = |text: &str| CliError::Usage(format!("usage: {text}"));
        let command = match (verb.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("add", [value]) => SessionCommand::Add {
                value: value.clone(),
                parent: None,
            },
            ("add", [value, parent]) => SessionCommand::Add {
                value: value.clone(),
                parent: Some(parent.clone()),
            },
            ("add", _) => return Err(usage("add <value> [parent]")),
            ("edit", [node, value]) => SessionCommand::Edit {
                node: node.clone(),
                value: value.clone(),
            },
            ("edit", _) => return Err(usage("edit <node> <value>")),
            ("remove", [node]) => SessionCommand::Remove { node: node.clone() },
            ("remove", _) => return Err(usage("remove <node>")),
            ("copy", [node]) => SessionCommand::Copy { node: node.clone() },
            ("copy", _) => return Err(usage("copy <node>")),
            ("apply", []) => SessionCommand::Apply,
            ("reset", []) => SessionCommand::Reset,
            ("show", []) => SessionCommand::Show(ViewTarget::All),
            ("show", [target]) => match target.to_ascii_lowercase().as_str() {
                "store" => SessionCommand::Show(ViewTarget::Store),
                "scratch" => SessionCommand::Show(ViewTarget::Scratch),
                "all" => SessionCommand::Show(ViewTarget::All),
                _ => return Err(usage("show [store|scratch|all]")),
            },
            ("help", _) => SessionCommand::Help,
            (other, _) => {
                return Err(CliError::Usage(format!(
                    "unknown command '{other}', try 'help'"
                )))
            }
        };
        Ok(command)
    }
}

/// Resolve a node reference against `forest`.
///
/// A full UUID is returned as is, even when absent, so the forest operation
/// reports it. Anything else must be a non-empty prefix of exactly one
/// identifier.
pub fn resolve_node(forest: &Forest, reference: &str) -> CliResult<NodeId> {
    if reference.is_empty() {
        return Err(CliError::InvalidArgs("empty node reference".to_string()));
    }
    if let Ok(id) = reference.parse::<NodeId>() {
        return Ok(id);
    }
    let prefix = reference.to_ascii_lowercase();
    let matches: Vec<NodeId> = forest
        .iter()
        .map(|(_, node)| node.id())
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CliError::InvalidArgs(format!("no node matches '{reference}'"))),
        _ => Err(CliError::InvalidArgs(format!(
            "'{reference}' is ambiguous ({} nodes match)",
            matches.len()
        ))),
    }
}

/// Counters of a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub executed: usize,
    pub failed: usize,
}

/// A workspace driven by session commands, writing results to `out`.
pub struct Session<W: Write> {
    workspace: Workspace,
    out: W,
    json: bool,
    strict: bool,
}

impl<W: Write> Session<W> {
    pub fn new(workspace: Workspace, out: W) -> Self {
        let json = workspace.settings().json;
        let strict = workspace.settings().strict;
        Self {
            workspace,
            out,
            json,
            strict,
        }
    }

    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Execute every line of `reader`.
    ///
    /// Failing commands are reported and skipped; in strict mode the first
    /// failure ends the session with that error.
    #[instrument(level = "debug", skip_all)]
    pub fn run(&mut self, reader: impl BufRead) -> CliResult<SessionSummary> {
        let mut summary = SessionSummary::default();
        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| InfraError::io("read session input", e))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            summary.executed += 1;
            if let Err(e) = self.execute_line(trimmed) {
                summary.failed += 1;
                warn!("line {}: {}", number + 1, e);
                self.write(&format!("error: line {}: {}", number + 1, e.user_message()))?;
                if self.strict {
                    return Err(e);
                }
            }
        }
        debug!("session finished: {:?}", summary);
        Ok(summary)
    }

    pub fn execute_line(&mut self, line: &str) -> CliResult<()> {
        let command: SessionCommand = line.parse()?;
        self.execute(command)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn execute(&mut self, command: SessionCommand) -> CliResult<()> {
        match command {
            SessionCommand::Add { value, parent } => {
                let parent = parent
                    .map(|p| resolve_node(self.workspace.scratch(), &p))
                    .transpose()?;
                let id = self.workspace.add(&value, parent)?;
                self.write(&format!("added {value} [{id}]"))
            }
            SessionCommand::Edit { node, value } => {
                let id = resolve_node(self.workspace.scratch(), &node)?;
                self.workspace.edit(Some(id), &value)?;
                self.write(&format!("edited [{}] to {value}", id.short()))
            }
            SessionCommand::Remove { node } => {
                let id = resolve_node(self.workspace.scratch(), &node)?;
                if self.workspace.remove(Some(id))? {
                    self.write(&format!("removed [{}] with its subtree", id.short()))
                } else {
                    self.write(&format!("nothing removed: {id} is not in scratch"))
                }
            }
            SessionCommand::Copy { node } => {
                let id = resolve_node(self.workspace.store(), &node)?;
                self.workspace.copy_from_store(id)?;
                self.write(&format!("copied [{}] to scratch", id.short()))
            }
            SessionCommand::Apply => {
                let report = self.workspace.apply()?;
                self.write(&format!("applied: {report}"))
            }
            SessionCommand::Reset => {
                self.workspace.reset()?;
                self.write("reset: store reseeded, scratch cleared")
            }
            SessionCommand::Show(target) => {
                if matches!(target, ViewTarget::Store | ViewTarget::All) {
                    let view = self.workspace.store_view();
                    self.write_view("store", &view)?;
                }
                if matches!(target, ViewTarget::Scratch | ViewTarget::All) {
                    let view = self.workspace.scratch_view();
                    self.write_view("scratch", &view)?;
                }
                Ok(())
            }
            SessionCommand::Help => self.write(HELP),
        }
    }

    fn write_view(&mut self, title: &str, nodes: &[DisplayNode]) -> CliResult<()> {
        let text = render_view(title, nodes, self.json)?;
        self.write(text.trim_end())
    }

    fn write(&mut self, text: &str) -> CliResult<()> {
        writeln!(self.out, "{text}")
            .map_err(|e| InfraError::io("write session output", e))?;
        Ok(())
    }
}

/// Render a view as a text tree, or as JSON `{ "<title>": [...] }`.
pub fn render_view(title: &str, nodes: &[DisplayNode], json: bool) -> CliResult<String> {
    if !json {
        return Ok(forest_tree(title, nodes).to_string());
    }
    let render_failed = |e: serde_json::Error| -> CliError {
        ApplicationError::OperationFailed {
            context: format!("render {title} view as json"),
            source: Box::new(e),
        }
        .into()
    };
    let mut object = serde_json::Map::new();
    object.insert(
        title.to_string(),
        serde_json::to_value(nodes).map_err(render_failed)?,
    );
    serde_json::to_string_pretty(&serde_json::Value::Object(object)).map_err(render_failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("add a", vec!["add", "a"])]
    #[case("  edit   x   y ", vec!["edit", "x", "y"])]
    #[case("add \"new node\" abc", vec!["add", "new node", "abc"])]
    #[case("add \"\"", vec!["add", ""])]
    #[case("add 'a b'", vec!["add", "a b"])]
    #[case(r#"add "a\"b""#, vec!["add", "a\"b"])]
    #[case(r"add a\ b", vec!["add", "a b"])]
    fn given_line_when_tokenizing_then_splits_words(#[case] line: &str, #[case] expected: Vec<&str>) {
        assert_eq!(tokenize(line).unwrap(), expected);
    }

    #[test]
    fn given_unterminated_quote_when_tokenizing_then_invalid_args() {
        assert!(matches!(tokenize("add \"oops"), Err(CliError::InvalidArgs(_))));
        assert!(matches!(tokenize("add 'oops"), Err(CliError::InvalidArgs(_))));
    }

    #[rstest]
    #[case("add x", SessionCommand::Add { value: "x".into(), parent: None })]
    #[case("ADD x p", SessionCommand::Add { value: "x".into(), parent: Some("p".into()) })]
    #[case("remove n", SessionCommand::Remove { node: "n".into() })]
    #[case("copy n", SessionCommand::Copy { node: "n".into() })]
    #[case("apply", SessionCommand::Apply)]
    #[case("reset", SessionCommand::Reset)]
    #[case("show", SessionCommand::Show(ViewTarget::All))]
    #[case("show scratch", SessionCommand::Show(ViewTarget::Scratch))]
    #[case("help me", SessionCommand::Help)]
    fn given_valid_line_when_parsing_then_command(#[case] line: &str, #[case] expected: SessionCommand) {
        assert_eq!(line.parse::<SessionCommand>().unwrap(), expected);
    }

    #[rstest]
    #[case("add")]
    #[case("edit only-node")]
    #[case("apply now")]
    #[case("show everything")]
    #[case("frobnicate")]
    fn given_malformed_line_when_parsing_then_usage_error(#[case] line: &str) {
        assert!(matches!(line.parse::<SessionCommand>(), Err(CliError::Usage(_))));
    }

    #[test]
    fn given_prefix_when_resolving_then_unique_match_or_error() {
        let mut forest = Forest::new();
        let id = NodeId::new_v4();
        forest.insert(id, None, "a", false, &[]).unwrap();

        assert_eq!(resolve_node(&forest, &id.short()).unwrap(), id);
        assert_eq!(resolve_node(&forest, &id.to_string()).unwrap(), id);
        assert!(matches!(
            resolve_node(&forest, "zzzz"),
            Err(CliError::InvalidArgs(_))
        ));
    }

    #[test]
    fn given_shared_prefix_when_resolving_then_ambiguous() {
        let mut forest = Forest::new();
        let a: NodeId = "aaaaaaaa-0000-4000-8000-000000000001".parse().unwrap();
        let b: NodeId = "aaaaaaaa-0000-4000-8000-000000000002".parse().unwrap();
        forest.insert(a, None, "a", false, &[]).unwrap();
        forest.insert(b, None, "b", false, &[]).unwrap();

        let err = resolve_node(&forest, "aaaa").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn given_empty_reference_with_single_node_when_resolving_then_rejected() {
        let mut forest = Forest::new();
        forest.insert(NodeId::new_v4(), None, "a", false, &[]).unwrap();

        let err = resolve_node(&forest, "").unwrap_err();
        assert!(matches!(err, CliError::InvalidArgs(_)));
        assert!(err.to_string().contains("empty node reference"));
    }

    #[test]
    fn given_nodes_when_rendering_json_then_keyed_by_title() {
        let nodes = vec![DisplayNode {
            id: "x".into(),
            label: "a".into(),
            tombstoned: false,
            children: vec![],
        }];
        let text = render_view("store", &nodes, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["store"][0]["label"], "a");
    }
}
