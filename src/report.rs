//! Report generation for optimizer runs and percolation sweeps.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use crate::aco::{AcoConfig, AcoOutcome};
use crate::graph::{EdgeSummary, Graph};
use crate::percolation::PercolationSurface;

/// Where and when a report was produced
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub source: String,
    pub total_nodes: usize,
    pub total_edges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ReportMetadata {
    pub fn new(source: &Path, graph: &Graph, seed: Option<u64>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            source: source.display().to_string(),
            total_nodes: graph.node_count(),
            total_edges: graph.edge_count(),
            seed,
        }
    }
}

/// Everything written after an optimizer run
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    pub metadata: ReportMetadata,
    pub parameters: AcoConfig,
    pub outcome: AcoOutcome,
    /// Learned selection probability of every link
    pub pheromones: Vec<EdgeSummary>,
}

/// Write any serializable report as pretty JSON
pub fn write_json<T: Serialize>(report: &T, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Human-readable summary of an optimizer run
pub fn format_optimization_text(report: &OptimizationReport) -> String {
    let outcome = &report.outcome;
    let mut lines: Vec<String> = Vec::new();

    lines.push("=".repeat(60));
    lines.push("          NETWORK RELIABILITY OPTIMIZATION".to_string());
    lines.push("=".repeat(60));
    lines.push(format!("Generated: {}", report.metadata.generated_at));
    lines.push(format!("Network:   {}", report.metadata.source));
    lines.push(format!(
        "Size:      {} nodes, {} links",
        report.metadata.total_nodes, report.metadata.total_edges
    ));
    lines.push(format!(
        "Search:    Nmax={} ants={} maxLinks={} b={} rho={}",
        report.parameters.iterations,
        report.parameters.ants,
        report.parameters.max_links,
        report.parameters.reward_exponent,
        report.parameters.rho
    ));
    lines.push(String::new());

    lines.push("Links chosen by the best ant:".to_string());
    for (index, (low, high)) in outcome.best_edge_indices.iter().zip(&outcome.best_links) {
        lines.push(format!("  #{:<4} {} {}", index, low, high));
    }
    lines.push(String::new());
    lines.push(format!("Cost:        {}", outcome.best_cost));
    lines.push(format!(
        "Reliability: {} (from {} simulations)",
        outcome.final_reliability, outcome.final_trials
    ));
    lines.push(String::new());

    lines.push("All links:".to_string());
    for summary in &report.pheromones {
        lines.push(format!(
            "  {} {} tau: {:.4}",
            summary.low, summary.high, summary.selection_probability
        ));
    }

    lines.join("\n") + "\n"
}

pub fn write_optimization_text(report: &OptimizationReport, output_path: &Path) -> Result<()> {
    fs::write(output_path, format_optimization_text(report))
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;
    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

/// Write the percolation table (one row per removed-link count)
pub fn write_percolation_table(surface: &PercolationSurface, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(output_path, surface.to_table())
        .with_context(|| {
            format!("Failed to write percolation table to {}", output_path.display())
        })?;
    log::info!("Percolation table written to {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;
    use tempfile::TempDir;

    fn sample_report() -> OptimizationReport {
        let graph = Graph::from_edges(vec![
            Edge::with_reliability(0, 1, 0.9),
            Edge::with_reliability(1, 2, 0.9),
        ]);
        OptimizationReport {
            metadata: ReportMetadata::new(Path::new("net.nwk"), &graph, Some(4)),
            parameters: AcoConfig::default(),
            outcome: AcoOutcome {
                best_edge_indices: vec![0, 1],
                best_links: vec![(0, 1), (1, 2)],
                best_cost: 2.0,
                best_reliability: 0.81,
                final_reliability: 0.8105,
                final_trials: 100_000,
                history: vec![0.8, 0.81],
                iterations_run: 2,
                evaluations: 39,
            },
            pheromones: graph.pheromone_summary(),
        }
    }

    #[test]
    fn test_text_report_lists_links() {
        let text = format_optimization_text(&sample_report());
        assert!(text.contains("Links chosen by the best ant:"));
        assert!(text.contains("  #0    0 1"));
        assert!(text.contains("Reliability: 0.8105 (from 100000 simulations)"));
        assert!(text.contains("  1 2 tau: 0.5000"));
    }

    #[test]
    fn test_json_report_round_trips_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        write_json(&sample_report(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["metadata"]["total_nodes"], 3);
        assert_eq!(value["outcome"]["best_links"][1][0], 1);
        assert_eq!(value["parameters"]["ants"], 20);
    }

    #[test]
    fn test_percolation_table_creates_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("percolation.plot");
        let surface = PercolationSurface {
            probabilities: vec![0.0, 0.5],
            rows: vec![vec![0.0, 1.0]],
        };
        write_percolation_table(&surface, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0 1 \n");
    }
}
