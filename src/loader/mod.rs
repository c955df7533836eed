//! Edge-source ingestion.
//!
//! Loaders read a complete edge set before building the graph, so a
//! failing source never yields a partially populated graph.

pub mod edge_list;
pub mod gml;

use std::path::Path;

pub use edge_list::{load_edge_file, parse_edge_list};
pub use gml::{gml_to_graph, load_gml_file, parse_gml, GmlEdge, GmlGraph, GmlNode};

use crate::error::LoadError;
use crate::graph::Graph;

/// Load a network, choosing the format from the file extension:
/// `.gml` files use the GML loader with `default_reliability` for links
/// that carry none, anything else is read as an edge list.
pub fn load_graph(path: &Path, default_reliability: f64) -> Result<Graph, LoadError> {
    let is_gml = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("gml"));
    if is_gml {
        load_gml_file(path, default_reliability)
    } else {
        load_edge_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_dispatch_by_extension() {
        let mut gml = Builder::new().suffix(".gml").tempfile().unwrap();
        write!(gml, "graph [ node [ id 4 ] node [ id 9 ] edge [ source 4 target 9 ] ]").unwrap();
        let graph = load_graph(gml.path(), 0.7).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges()[0].reliability(), 0.7);

        let mut nwk = Builder::new().suffix(".nwk").tempfile().unwrap();
        write!(nwk, "type: edges\nprob: 0.6\n0 1\n").unwrap();
        let graph = load_graph(nwk.path(), 0.7).unwrap();
        assert_eq!(graph.edges()[0].reliability(), 0.6);
    }
}
