// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Validation report rendering

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use super::repair::RepairReport;
use super::types::{CheckPass, ValidationReport};

/// Renders validation and repair reports
pub struct ValidationReporter;

impl ValidationReporter {
    pub fn to_json(report: &ValidationReport) -> Result<String> {
        serde_json::to_string_pretty(report).context("Failed to serialize validation report")
    }

    /// Write JSON report
    pub fn write_json(report: &ValidationReport, path: impl AsRef<Path>) -> Result<()> {
        let json = Self::to_json(report)?;
        fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write report: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn to_markdown(report: &ValidationReport, title: &str) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {title}\n\n"));
        md.push_str(&format!(
            "**Status:** {}\n\n",
            if report.is_valid { "valid" } else { "invalid" }
        ));
        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Vertices:** {}\n", report.vertex_count));
        md.push_str(&format!("- **Edges:** {}\n", report.edge_count));
        md.push_str(&format!("- **Faces:** {}\n", report.face_count));
        md.push_str(&format!("- **Errors:** {}\n", report.errors.len()));
        md.push_str(&format!("- **Warnings:** {}\n\n", report.warnings.len()));

        for pass in CheckPass::ALL {
            let findings = report.findings_for(pass);
            if findings.is_empty() {
                continue;
            }
            md.push_str(&format!("### {}\n\n", pass.as_str()));
            for finding in findings {
                let kind = if report.errors.iter().any(|e| e == finding) {
                    "error"
                } else {
                    "warning"
                };
                md.push_str(&format!("- {kind}: {finding}\n"));
            }
            md.push('\n');
        }
        md
    }

    /// Write Markdown report
    pub fn write_markdown(report: &ValidationReport, title: &str, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), Self::to_markdown(report, title))
            .with_context(|| format!("Failed to write report: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Print terminal summary
    pub fn print_summary(report: &ValidationReport) {
        Self::print_summary_with_verbose(report, false)
    }

    /// Print terminal summary; warnings are listed only in verbose mode
    pub fn print_summary_with_verbose(report: &ValidationReport, verbose: bool) {
        println!("\n{}", "═".repeat(60).white());
        println!("{}", "Mesh Validation".bold());
        println!("{}", "═".repeat(60).white());
        println!(
            "  {} {} vertices, {} edges, {} faces",
            "Mesh:".white(),
            report.vertex_count.to_string().cyan(),
            report.edge_count.to_string().cyan(),
            report.face_count.to_string().cyan()
        );
        println!(
            "  {} {}",
            "Status:".white(),
            if report.is_valid {
                "valid".green()
            } else {
                "invalid".red()
            }
        );
        println!(
            "  {} {}",
            "Errors:".white(),
            if report.errors.is_empty() {
                report.errors.len().to_string().green()
            } else {
                report.errors.len().to_string().red()
            }
        );
        println!(
            "  {} {}",
            "Warnings:".white(),
            report.warnings.len().to_string().yellow()
        );

        if !report.errors.is_empty() {
            println!("\n{}", "Errors".red().bold());
            println!("{}", "─".repeat(60).white());
            for error in &report.errors {
                println!("  {} {}", "✗".red(), error);
            }
        }
        if verbose && !report.warnings.is_empty() {
            println!("\n{}", "Warnings".yellow().bold());
            println!("{}", "─".repeat(60).white());
            for warning in &report.warnings {
                println!("  {} {}", "!".yellow(), warning);
            }
        }
        println!("{}", "═".repeat(60).white());
    }

    pub fn print_repair(report: &RepairReport) {
        println!("\n{}", "Repair".bold());
        println!("{}", "─".repeat(60).white());
        let rows = [
            ("Faces with bad indices", report.faces_out_of_range),
            ("Repeated corners", report.repeated_corners),
            ("Degenerate faces", report.degenerate_faces),
            ("Invalid edges", report.invalid_edges),
            ("Cleared normals", report.cleared_normals),
            ("Cleared uvs", report.cleared_uvs),
            ("Welded vertices", report.welded_vertices),
            ("Orphans removed", report.orphans_removed),
        ];
        for (label, count) in rows {
            let value = if count > 0 {
                count.to_string().yellow()
            } else {
                count.to_string().green()
            };
            println!("  {:<24} {}", label.white(), value);
        }
        let total = if report.is_clean() {
            "nothing to fix".green()
        } else {
            format!("{} fixes", report.total()).cyan()
        };
        println!("  {} {}", "Total:".bold(), total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::types::PassFindings;

    fn sample() -> ValidationReport {
        let mut report = ValidationReport::new(4, 4, 1);
        let mut topology = PassFindings::new(CheckPass::Topology);
        topology.error("face 0 references vertex 9 (mesh has 4 vertices)");
        report.absorb(topology);
        let mut uv = PassFindings::new(CheckPass::Uv);
        uv.warning("vertex 1 uv (1.500, 0.000) is outside [0, 1]");
        report.absorb(uv);
        report
    }

    #[test]
    fn test_markdown_groups_by_pass() {
        let md = ValidationReporter::to_markdown(&sample(), "Mesh Report");
        assert!(md.starts_with("# Mesh Report"));
        assert!(md.contains("**Status:** invalid"));
        assert!(md.contains("### topology\n\n- error: [topology] face 0"));
        assert!(md.contains("### uv\n\n- warning: [uv] vertex 1"));
        assert!(!md.contains("### normals"));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        ValidationReporter::write_json(&sample(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: ValidationReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, sample());
    }
}
