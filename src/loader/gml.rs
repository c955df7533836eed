//! GML topology files.
//!
//! Reads the `graph [ node [ id N ] edge [ source A target B ] ]`
//! subset of GML. Node ids may be arbitrary integers; they are mapped to
//! dense indices in order of declaration. Edge attributes:
//!
//! - `reliability`, or `packet_loss` (fraction or percentage, converted
//!   to `1 - loss`); otherwise the caller's default applies
//! - `cost`; defaults to 1
//! - `directed 1` adds a second, parallel link for the reverse direction

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::graph::{Edge, Graph, DEFAULT_COST};

/// A node declared in a GML file
#[derive(Debug, Clone)]
pub struct GmlNode {
    pub id: u32,
    pub label: Option<String>,
    pub attributes: HashMap<String, String>,
}

/// An edge declared in a GML file
#[derive(Debug, Clone)]
pub struct GmlEdge {
    pub source: u32,
    pub target: u32,
    pub attributes: HashMap<String, String>,
}

/// A parsed GML document
#[derive(Debug, Clone)]
pub struct GmlGraph {
    pub nodes: Vec<GmlNode>,
    pub edges: Vec<GmlEdge>,
    pub attributes: HashMap<String, String>,
}

/// Token types for GML parsing
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Identifier(String),
    Number(String),
    String(String),
    LeftBracket,
    RightBracket,
    Eof,
}

fn gml_error(message: impl Into<String>) -> LoadError {
    LoadError::Gml(message.into())
}

struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Lexer {
    fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();
        Self {
            input: chars,
            position: 0,
            current_char,
        }
    }

    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current_char, Some(ch) if ch.is_whitespace()) {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.current_char {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn read_string(&mut self) -> Result<String, LoadError> {
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    if let Some(escaped) = self.current_char {
                        match escaped {
                            'n' => result.push('\n'),
                            't' => result.push('\t'),
                            '\\' => result.push('\\'),
                            '"' => result.push('"'),
                            other => {
                                result.push('\\');
                                result.push(other);
                            }
                        }
                        self.advance();
                    }
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(gml_error("Unterminated string literal"))
    }

    fn read_word(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-' | '+' | '%') {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn next_token(&mut self) -> Result<Token, LoadError> {
        loop {
            self.skip_whitespace();

            return match self.current_char {
                None => Ok(Token::Eof),
                Some('#') => {
                    self.skip_comment();
                    continue;
                }
                Some('[') => {
                    self.advance();
                    Ok(Token::LeftBracket)
                }
                Some(']') => {
                    self.advance();
                    Ok(Token::RightBracket)
                }
                Some('"') => Ok(Token::String(self.read_string()?)),
                Some(ch) if ch.is_alphabetic() || ch == '_' => {
                    Ok(Token::Identifier(self.read_word()))
                }
                Some(ch) if ch.is_numeric() || ch == '-' || ch == '+' => {
                    Ok(Token::Number(self.read_word()))
                }
                Some(ch) => Err(gml_error(format!("Unexpected character: '{}'", ch))),
            };
        }
    }
}

struct Parser {
    lexer: Lexer,
    current_token: Token,
}

impl Parser {
    fn new(mut lexer: Lexer) -> Result<Self, LoadError> {
        let current_token = lexer.next_token()?;
        Ok(Self {
            lexer,
            current_token,
        })
    }

    fn advance(&mut self) -> Result<(), LoadError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<(), LoadError> {
        match &self.current_token {
            Token::Identifier(id) if id == expected => self.advance(),
            other => Err(gml_error(format!(
                "Expected identifier '{}', found {:?}",
                expected, other
            ))),
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), LoadError> {
        if self.current_token == token {
            self.advance()
        } else {
            Err(gml_error(format!(
                "Expected {:?}, found {:?}",
                token, self.current_token
            )))
        }
    }

    fn parse_value(&mut self) -> Result<String, LoadError> {
        match &self.current_token {
            Token::Identifier(val) | Token::Number(val) | Token::String(val) => {
                let value = val.clone();
                self.advance()?;
                Ok(value)
            }
            other => Err(gml_error(format!("Expected value, found {:?}", other))),
        }
    }

    /// Skip a nested `key [ ... ]` block such as `graphics [ ... ]`
    fn skip_block(&mut self) -> Result<(), LoadError> {
        self.expect(Token::LeftBracket)?;
        let mut depth = 1;
        while depth > 0 {
            match self.current_token {
                Token::LeftBracket => depth += 1,
                Token::RightBracket => depth -= 1,
                Token::Eof => return Err(gml_error("Unterminated block")),
                _ => {}
            }
            self.advance()?;
        }
        Ok(())
    }

    /// `key value` pairs up to the closing bracket; nested blocks are skipped
    fn parse_attributes(&mut self, context: &str) -> Result<HashMap<String, String>, LoadError> {
        let mut attributes = HashMap::new();
        while self.current_token != Token::RightBracket {
            let key = match &self.current_token {
                Token::Identifier(key) => key.clone(),
                other => {
                    return Err(gml_error(format!(
                        "Expected attribute name in {}, found {:?}",
                        context, other
                    )))
                }
            };
            self.advance()?;
            if self.current_token == Token::LeftBracket {
                log::debug!("Skipping nested '{}' block in {}", key, context);
                self.skip_block()?;
                continue;
            }
            let value = self.parse_value()?;
            attributes.insert(key, value);
        }
        self.expect(Token::RightBracket)?;
        Ok(attributes)
    }

    fn parse_node(&mut self) -> Result<GmlNode, LoadError> {
        self.expect_identifier("node")?;
        self.expect(Token::LeftBracket)?;
        let mut attributes = self.parse_attributes("node")?;

        let id = attributes
            .remove("id")
            .ok_or_else(|| gml_error("Node missing required 'id' attribute"))?;
        let id = id
            .parse::<u32>()
            .map_err(|_| gml_error(format!("Invalid node id: {}", id)))?;
        let label = attributes.remove("label");

        Ok(GmlNode {
            id,
            label,
            attributes,
        })
    }

    fn parse_edge(&mut self) -> Result<GmlEdge, LoadError> {
        self.expect_identifier("edge")?;
        self.expect(Token::LeftBracket)?;
        let mut attributes = self.parse_attributes("edge")?;

        let mut endpoint = |key: &str| -> Result<u32, LoadError> {
            let value = attributes
                .remove(key)
                .ok_or_else(|| gml_error(format!("Edge missing required '{}' attribute", key)))?;
            value
                .parse::<u32>()
                .map_err(|_| gml_error(format!("Invalid edge {}: {}", key, value)))
        };
        let source = endpoint("source")?;
        let target = endpoint("target")?;

        Ok(GmlEdge {
            source,
            target,
            attributes,
        })
    }

    fn parse_graph(&mut self) -> Result<GmlGraph, LoadError> {
        // Optional leading document attributes such as `Creator "..."`
        while let Token::Identifier(keyword) = &self.current_token {
            if keyword == "graph" {
                break;
            }
            self.advance()?;
            self.parse_value()?;
        }

        self.expect_identifier("graph")?;
        self.expect(Token::LeftBracket)?;

        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut attributes = HashMap::new();

        while self.current_token != Token::RightBracket {
            match &self.current_token {
                Token::Identifier(keyword) if keyword == "node" => nodes.push(self.parse_node()?),
                Token::Identifier(keyword) if keyword == "edge" => edges.push(self.parse_edge()?),
                Token::Identifier(keyword) => {
                    let key = keyword.clone();
                    self.advance()?;
                    if self.current_token == Token::LeftBracket {
                        self.skip_block()?;
                    } else {
                        let value = self.parse_value()?;
                        attributes.insert(key, value);
                    }
                }
                other => {
                    return Err(gml_error(format!(
                        "Expected keyword in graph, found {:?}",
                        other
                    )))
                }
            }
        }

        self.expect(Token::RightBracket)?;

        Ok(GmlGraph {
            nodes,
            edges,
            attributes,
        })
    }
}

/// Parse GML text
pub fn parse_gml(content: &str) -> Result<GmlGraph, LoadError> {
    let mut parser = Parser::new(Lexer::new(content))?;
    parser.parse_graph()
}

/// Load a GML file and build the reliability graph from it
pub fn load_gml_file(path: &Path, default_reliability: f64) -> Result<Graph, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = gml_to_graph(&parse_gml(&content)?, default_reliability)?;
    log::info!(
        "Loaded {} edges over {} nodes from {}",
        graph.edge_count(),
        graph.node_count(),
        path.display()
    );
    Ok(graph)
}

/// Convert a parsed GML document into a graph with dense node indices
pub fn gml_to_graph(gml: &GmlGraph, default_reliability: f64) -> Result<Graph, LoadError> {
    let mut index_of: HashMap<u32, usize> = HashMap::new();
    for node in &gml.nodes {
        let next = index_of.len();
        if index_of.insert(node.id, next).is_some() {
            return Err(gml_error(format!("Duplicate node ID: {}", node.id)));
        }
    }

    let mut edges = Vec::with_capacity(gml.edges.len());
    for gml_edge in &gml.edges {
        let a = *index_of
            .get(&gml_edge.source)
            .ok_or(LoadError::UnknownNode(gml_edge.source))?;
        let b = *index_of
            .get(&gml_edge.target)
            .ok_or(LoadError::UnknownNode(gml_edge.target))?;

        let reliability = edge_reliability(&gml_edge.attributes, default_reliability)?;
        let cost = match gml_edge.attributes.get("cost") {
            Some(value) => value
                .parse::<f64>()
                .map_err(|_| gml_error(format!("Invalid edge cost: {}", value)))?,
            None => DEFAULT_COST,
        };

        edges.push(Edge::new(a, b, reliability, cost));
        if is_directed(&gml_edge.attributes) {
            edges.push(Edge::new(b, a, reliability, cost));
        }
    }

    if edges.is_empty() {
        return Err(LoadError::Empty("GML graph".to_string()));
    }
    Ok(Graph::from_edges_with_nodes(edges, index_of.len()))
}

fn edge_reliability(
    attributes: &HashMap<String, String>,
    default_reliability: f64,
) -> Result<f64, LoadError> {
    let reliability = if let Some(value) = attributes.get("reliability") {
        value
            .parse::<f64>()
            .map_err(|_| gml_error(format!("Invalid edge reliability: {}", value)))?
    } else if let Some(value) = attributes.get("packet_loss") {
        let loss = match value.strip_suffix('%') {
            Some(percentage) => percentage.parse::<f64>().map(|p| p / 100.0),
            None => value.parse::<f64>(),
        }
        .map_err(|_| gml_error(format!("Invalid packet_loss: {}", value)))?;
        1.0 - loss
    } else {
        default_reliability
    };

    if !(0.0..=1.0).contains(&reliability) {
        return Err(gml_error(format!(
            "Edge reliability {} outside [0, 1]",
            reliability
        )));
    }
    Ok(reliability)
}

fn is_directed(attributes: &HashMap<String, String>) -> bool {
    attributes
        .get("directed")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RING: &str = r#"
Creator "test"
graph [
  directed 0
  node [ id 10 label "a" ]
  node [ id 20 label "b" graphics [ x 1.0 y 2.0 ] ]
  node [ id 30 ]
  edge [ source 10 target 20 reliability 0.95 ]
  edge [ source 20 target 30 packet_loss "5%" ]
  edge [ source 30 target 10 cost 4 ]
]
"#;

    #[test]
    fn test_parse_document() {
        let gml = parse_gml(RING).unwrap();
        assert_eq!(gml.nodes.len(), 3);
        assert_eq!(gml.edges.len(), 3);
        assert_eq!(gml.nodes[0].label.as_deref(), Some("a"));
        assert!(!gml.nodes[1].attributes.contains_key("graphics"));
        assert_eq!(gml.attributes.get("directed").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_convert_to_dense_graph() {
        let graph = gml_to_graph(&parse_gml(RING).unwrap(), 0.9).unwrap();
        assert_eq!(graph.node_count(), 3);
        let edges = graph.edges();
        assert_eq!(edges[0].nodes(), (0, 1));
        assert_eq!(edges[0].reliability(), 0.95);
        assert!((edges[1].reliability() - 0.95).abs() < 1e-12);
        assert_eq!(edges[2].nodes(), (0, 2));
        assert_eq!(edges[2].reliability(), 0.9);
        assert_eq!(edges[2].cost(), 4.0);
    }

    #[test]
    fn test_directed_edge_is_doubled() {
        let doc = "graph [ node [ id 0 ] node [ id 1 ] edge [ source 0 target 1 directed 1 ] ]";
        let graph = gml_to_graph(&parse_gml(doc).unwrap(), 0.5).unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edges()[0].nodes(), graph.edges()[1].nodes());
    }

    #[test]
    fn test_isolated_node_counts_wherever_declared() {
        let links = "edge [ source 0 target 1 reliability 1 ] edge [ source 1 target 2 reliability 1 ]";
        for order in [[0, 1, 2, 3], [3, 0, 1, 2]] {
            let nodes: String = order.iter().map(|id| format!("node [ id {} ] ", id)).collect();
            let doc = format!("graph [ {}{} ]", nodes, links);
            let mut graph = gml_to_graph(&parse_gml(&doc).unwrap(), 0.5)
                .unwrap()
                .with_seed(3);
            assert_eq!(graph.node_count(), 4);
            assert_eq!(graph.estimate_reliability(200, true).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_undeclared_node() {
        let doc = "graph [ node [ id 0 ] edge [ source 0 target 7 ] ]";
        assert!(matches!(
            gml_to_graph(&parse_gml(doc).unwrap(), 0.5),
            Err(LoadError::UnknownNode(7))
        ));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_gml("graph [ node [ id 0 ]").is_err());
        assert!(parse_gml("graph [ node [ label \"x\" ] ]").is_err());
        assert!(parse_gml("graph [ edge [ source 0 ] ]").is_err());
        assert!(parse_gml("graph [ node [ id \"unterminated ] ]").is_err());
        assert!(parse_gml("graph [ @ ]").is_err());
    }

    #[test]
    fn test_duplicate_node_and_bad_reliability() {
        let doc = "graph [ node [ id 0 ] node [ id 0 ] edge [ source 0 target 0 ] ]";
        assert!(gml_to_graph(&parse_gml(doc).unwrap(), 0.5).is_err());
        let doc = "graph [ node [ id 0 ] node [ id 1 ] edge [ source 0 target 1 reliability 3 ] ]";
        assert!(gml_to_graph(&parse_gml(doc).unwrap(), 0.5).is_err());
    }
}
