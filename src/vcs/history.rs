/// Commit history reconstruction
///
/// The backend reports a branch's ancestry as `rev-list --parents` lines.
/// These are loaded into an arena keyed by commit id with explicit parent
/// links, then each commit is diffed against its first parent to produce
/// its file-change list. The root commit has no parent and keeps an empty
/// list.
use crate::errors::{RepoError, Result};
use crate::vcs::{Action, Commit, FileChange};
use std::collections::HashMap;

/// A commit in the graph, linked to its parents by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitNode {
    pub id: String,
    pub parents: Vec<String>,
}

impl CommitNode {
    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

/// Parse `rev-list --parents` output; one commit per line, id first
pub fn parse_rev_list(raw: &str) -> Result<Vec<CommitNode>> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut ids = line.split_whitespace();
            let id = ids
                .next()
                .ok_or_else(|| RepoError::Backend(format!("Malformed log line: {:?}", line)))?;
            if !id.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(RepoError::Backend(format!(
                    "Unexpected commit id in log: {:?}",
                    id
                )));
            }
            Ok(CommitNode {
                id: id.to_string(),
                parents: ids.map(str::to_string).collect(),
            })
        })
        .collect()
}

/// Parse NUL-separated `diff-tree --name-status -z` output
pub fn parse_name_status(raw: &str) -> Result<Vec<(String, Action)>> {
    let mut changes = Vec::new();
    let mut fields = raw.split('\0').filter(|f| !f.is_empty());

    while let Some(status) = fields.next() {
        let mut next_path = || {
            fields.next().map(str::to_string).ok_or_else(|| {
                RepoError::Backend(format!("Missing path after status {:?}", status))
            })
        };

        match status.chars().next() {
            Some('A') => changes.push((next_path()?, Action::Add)),
            Some('M') | Some('T') => changes.push((next_path()?, Action::Modify)),
            Some('D') => changes.push((next_path()?, Action::Delete)),
            Some('R') => {
                let from = next_path()?;
                let to = next_path()?;
                changes.push((from, Action::Delete));
                changes.push((to, Action::Add));
            }
            Some('C') => {
                let _source = next_path()?;
                changes.push((next_path()?, Action::Add));
            }
            _ => {
                return Err(RepoError::Backend(format!(
                    "Unknown diff status {:?}",
                    status
                )))
            }
        }
    }

    Ok(changes)
}

/// Arena of commits reachable from a branch, in oldest-first order
#[derive(Debug, Clone, Default)]
pub struct CommitGraph {
    nodes: HashMap<String, CommitNode>,
    order: Vec<String>,
}

impl CommitGraph {
    pub fn from_nodes(nodes: Vec<CommitNode>) -> Self {
        let mut graph = CommitGraph::default();
        for node in nodes {
            if graph.nodes.contains_key(&node.id) {
                continue;
            }
            graph.order.push(node.id.clone());
            graph.nodes.insert(node.id.clone(), node);
        }
        graph
    }

    /// Nodes in history order
    pub fn iter(&self) -> impl Iterator<Item = &CommitNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }
}

/// Something that can diff a commit against its parent
pub trait DiffSource {
    /// Raw `--name-status -z` output for `parent..commit`
    fn name_status(&self, parent: &str, commit: &str) -> Result<String>;
}

pub struct HistoryBuilder<'a, D: DiffSource + ?Sized> {
    source: &'a D,
}

impl<'a, D: DiffSource + ?Sized> HistoryBuilder<'a, D> {
    pub fn new(source: &'a D) -> Self {
        Self { source }
    }

    /// Build annotated commits for every node of the graph, oldest first
    pub fn build(&self, graph: &CommitGraph) -> Result<Vec<Commit>> {
        graph.iter().map(|node| self.build_commit(node)).collect()
    }

    fn build_commit(&self, node: &CommitNode) -> Result<Commit> {
        let files = match node.first_parent() {
            Some(parent) => {
                let raw = self.source.name_status(parent, &node.id)?;
                parse_name_status(&raw)?
                    .into_iter()
                    .map(|(path, action)| FileChange::new(path, action).in_commit(&node.id))
                    .collect()
            }
            None => Vec::new(),
        };

        Ok(Commit {
            id: node.id.clone(),
            files,
        })
    }
}
