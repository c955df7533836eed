//! Plain-text edge files.
//!
//! ```text
//! type: edges
//! prob: 0.9
//! # comment
//! 0 1
//! 1 2 0.95
//! 2 3 directed
//! ```
//!
//! The first line names the file type, the second gives the default link
//! reliability. Each remaining line holds two node ids, optionally
//! followed by a per-link reliability and the `directed` flag, which adds
//! a second, parallel link for the reverse direction. Node ids above
//! [`MAX_NODE_ID`] are rejected as malformed.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::LoadError;
use crate::graph::{Edge, Graph, MAX_NODE_ID};

static TYPE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*type\s*:?\s*(\S*)").expect("Invalid type header regex"));

static PROB_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*prob\s*:\s*(\S+)").expect("Invalid prob header regex"));

/// Load an edge file from disk
pub fn load_edge_file(path: &Path) -> Result<Graph, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = parse_edge_list(&content)?;
    log::info!("Loaded {} edges from {}", graph.edge_count(), path.display());
    Ok(graph)
}

/// Parse edge-file content. Nothing is returned unless every line parses.
pub fn parse_edge_list(content: &str) -> Result<Graph, LoadError> {
    let mut lines = content.lines();

    let header = lines.next().unwrap_or_default();
    let file_type = TYPE_HEADER
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(LoadError::MissingTypeHeader)?;
    if file_type != "edges" {
        return Err(LoadError::UnknownFileType(header.to_string()));
    }

    let prob_line = lines.next().unwrap_or_default();
    let default_reliability = PROB_HEADER
        .captures(prob_line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|p| (0.0..=1.0).contains(p))
        .ok_or_else(|| LoadError::MissingProbability(prob_line.to_string()))?;

    let mut edges = Vec::new();
    for (offset, raw) in lines.enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // headers take lines 1 and 2
        let line_number = offset + 3;
        let parsed = parse_edge_line(line, default_reliability).ok_or_else(|| {
            LoadError::MalformedLine {
                line: line_number,
                content: raw.to_string(),
            }
        })?;
        edges.push(Edge::with_reliability(parsed.a, parsed.b, parsed.reliability));
        if parsed.directed {
            edges.push(Edge::with_reliability(parsed.b, parsed.a, parsed.reliability));
        }
    }

    if edges.is_empty() {
        return Err(LoadError::Empty("edge list".to_string()));
    }
    Ok(Graph::from_edges(edges))
}

struct EdgeLine {
    a: usize,
    b: usize,
    reliability: f64,
    directed: bool,
}

fn parse_edge_line(line: &str, default_reliability: f64) -> Option<EdgeLine> {
    let content = line.split('#').next().unwrap_or_default();
    let mut tokens = content.split_whitespace();
    let a = parse_node_id(tokens.next()?)?;
    let b = parse_node_id(tokens.next()?)?;

    let mut reliability = default_reliability;
    let mut directed = false;
    for token in tokens {
        if token.eq_ignore_ascii_case("directed") || token == "d" {
            directed = true;
        } else if !directed {
            reliability = token.parse::<f64>().ok().filter(|p| (0.0..=1.0).contains(p))?;
        } else {
            return None;
        }
    }

    Some(EdgeLine {
        a,
        b,
        reliability,
        directed,
    })
}

fn parse_node_id(token: &str) -> Option<usize> {
    token.parse::<usize>().ok().filter(|&id| id <= MAX_NODE_ID)
}
