//! Hydration scenarios: server markup plus the claim script a render pass runs.
//!
//! ```toml
//! name = "swap"
//! container = "body"
//! server = [{ element = "p" }, { text = "hi" }]
//! claims = [{ text = "hi" }, { element = "p" }]
//! expect = ['"hi"@0', "<p>@1"]
//! moves = 1
//! ```

use hydrate::debug::child_outline;
use hydrate::{
    ClaimNodes, DomArena, DomError, DomPatch, HtmlTagHydration, HydrationConfig,
    HydrationSession, NodeKey, ReorderStats,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::diff_lines;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub config: HydrationConfig,
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default)]
    pub server: Vec<ServerNode>,
    #[serde(default)]
    pub claims: Vec<Claim>,
    /// Expected child outline of the container after hydration.
    #[serde(default)]
    pub expect: Vec<String>,
    /// Expected number of reorder moves.
    #[serde(default)]
    pub moves: Option<usize>,
    /// Expected number of server nodes left unclaimed.
    #[serde(default)]
    pub detached: Option<usize>,
}

fn default_container() -> String {
    "body".to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ServerNode {
    Element {
        element: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
    },
    Text {
        text: String,
    },
    Comment {
        comment: String,
    },
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HtmlTagKind {
    Html,
    Svg,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Claim {
    Element {
        element: String,
        #[serde(default)]
        attributes: Vec<String>,
    },
    Svg {
        svg: String,
        #[serde(default)]
        attributes: Vec<String>,
    },
    Text {
        text: String,
    },
    Space {
        space: bool,
    },
    Comment {
        comment: String,
    },
    HtmlTag {
        html_tag: HtmlTagKind,
    },
}

#[derive(Debug)]
pub enum ScenarioError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
    UnsupportedFormat(PathBuf),
    Dom(DomError),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::Io { path, source } => write!(f, "failed to read {path:?}: {source}"),
            ScenarioError::Parse { path, message } => {
                write!(f, "failed to parse {path:?}: {message}")
            }
            ScenarioError::UnsupportedFormat(path) => {
                write!(f, "unsupported scenario format {path:?}; use .toml or .json")
            }
            ScenarioError::Dom(err) => write!(f, "dom error: {err}"),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl From<DomError> for ScenarioError {
    fn from(err: DomError) -> Self {
        ScenarioError::Dom(err)
    }
}

/// Load a scenario from a `.toml` or `.json` file.
pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let content = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |message: String| ScenarioError::Parse {
        path: path.to_path_buf(),
        message,
    };
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| parse_error(err.to_string())),
        Some("json") => serde_json::from_str(&content).map_err(|err| parse_error(err.to_string())),
        _ => Err(ScenarioError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load every scenario in `dir`, sorted by file name.
pub fn load_scenario_dir(dir: &Path) -> Result<Vec<(PathBuf, Scenario)>, ScenarioError> {
    let entries = fs::read_dir(dir).map_err(|source| ScenarioError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| ScenarioError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("toml" | "json")
        ) {
            paths.push(path);
        }
    }
    paths.sort();
    paths
        .into_iter()
        .map(|path| load_scenario(&path).map(|scenario| (path, scenario)))
        .collect()
}

#[derive(Clone, Debug)]
pub struct ScenarioOutcome {
    /// Child outline of the container after hydration.
    pub outline: Vec<String>,
    /// Every mutation made after the server markup was built.
    pub patches: Vec<DomPatch>,
    pub stats: ReorderStats,
    /// Server nodes no claim matched.
    pub detached: usize,
}

enum Mount {
    Node(NodeKey),
    Html(HtmlTagHydration),
}

/// Build the server markup, run the claim script, mount every claimed node
/// and end the session.
pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioOutcome, ScenarioError> {
    let mut arena = DomArena::new();
    let container = arena.create_element(&scenario.container);
    for node in &scenario.server {
        let key = build_server_node(&mut arena, node)?;
        arena.append_child(container, key)?;
    }
    arena.take_patches();

    let mut session = HydrationSession::new(scenario.config.clone());
    session.start(&mut arena);
    let mut nodes = ClaimNodes::children(&arena, container)?;
    let mut mounts = Vec::with_capacity(scenario.claims.len());
    for claim in &scenario.claims {
        let mount = match claim {
            Claim::Element {
                element,
                attributes,
            } => Mount::Node(nodes.claim_element(&mut arena, element, &as_strs(attributes))?),
            Claim::Svg { svg, attributes } => {
                Mount::Node(nodes.claim_svg_element(&mut arena, svg, &as_strs(attributes))?)
            }
            Claim::Text { text } => Mount::Node(nodes.claim_text(&mut arena, text)?),
            Claim::Space { .. } => Mount::Node(nodes.claim_space(&mut arena)?),
            Claim::Comment { comment } => Mount::Node(nodes.claim_comment(&mut arena, comment)?),
            Claim::HtmlTag { html_tag } => Mount::Html(nodes.claim_html_tag(
                &mut arena,
                session.config(),
                *html_tag == HtmlTagKind::Svg,
            )?),
        };
        mounts.push(mount);
    }
    let detached = nodes.detach_unclaimed(&mut arena)?;

    for mount in &mounts {
        match mount {
            Mount::Node(key) => session.append(&mut arena, container, *key)?,
            Mount::Html(html) => html.mount(&mut session, &mut arena, container, None)?,
        }
    }
    let stats = session.stats();
    session.end(&mut arena);
    log::debug!(
        target: "hydrate.scenario",
        "{}: moved={} detached={detached}",
        scenario.name,
        stats.moved
    );

    Ok(ScenarioOutcome {
        outline: child_outline(&arena, container)?,
        patches: arena.take_patches(),
        stats,
        detached,
    })
}

fn build_server_node(arena: &mut DomArena, node: &ServerNode) -> Result<NodeKey, DomError> {
    Ok(match node {
        ServerNode::Element {
            element,
            attributes,
        } => {
            let key = arena.create_element(element);
            for (name, value) in attributes {
                arena.set_attribute(key, name, Some(value.clone()))?;
            }
            key
        }
        ServerNode::Text { text } => arena.create_text(text),
        ServerNode::Comment { comment } => arena.create_comment(comment),
    })
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

/// Compare an outcome against the scenario's expectations.
pub fn check_outcome(scenario: &Scenario, outcome: &ScenarioOutcome) -> Result<(), String> {
    let mut problems = Vec::new();
    if !scenario.expect.is_empty() && scenario.expect != outcome.outline {
        problems.push(format!(
            "outline mismatch:\n{}",
            diff_lines(&scenario.expect, &outcome.outline)
        ));
    }
    if let Some(moves) = scenario.moves {
        if moves != outcome.stats.moved {
            problems.push(format!(
                "expected {moves} moves, got {}",
                outcome.stats.moved
            ));
        }
    }
    if let Some(detached) = scenario.detached {
        if detached != outcome.detached {
            problems.push(format!(
                "expected {detached} detached nodes, got {}",
                outcome.detached
            ));
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(format!("{}: {}", scenario.name, problems.join("\n")))
    }
}
