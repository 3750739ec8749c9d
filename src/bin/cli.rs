// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyedit CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use polyedit::csg::BooleanOp;
use polyedit::validation::{MeshValidator, ValidationReporter};
use polyedit::{repair, KernelConfig, Mesh};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polyedit")]
#[command(about = "Polyedit - polygon mesh validation, repair and CSG", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./polyedit.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a mesh and print the findings
    Validate {
        /// Input mesh (JSON)
        input: PathBuf,

        /// Enable every warning category
        #[arg(long)]
        strict: bool,

        /// Write the report as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,

        /// Write the report as Markdown
        #[arg(long, value_name = "FILE")]
        markdown: Option<PathBuf>,
    },

    /// Repair a mesh and write the result
    Repair {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Do not weld coincident vertices
        #[arg(long)]
        no_weld: bool,

        /// Keep vertices no face references
        #[arg(long)]
        keep_orphans: bool,
    },

    /// Triangulate every face
    Triangulate {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Combine two solids
    Boolean {
        #[arg(value_enum)]
        op: OpArg,

        /// Left operand
        a: PathBuf,

        /// Right operand
        b: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Close difference cuts with the cutter's inner faces
        #[arg(long)]
        cap: bool,

        /// Validate the result
        #[arg(long)]
        validate: bool,
    },

    /// Print mesh statistics
    Stats { input: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum OpArg {
    Union,
    Intersection,
    Difference,
    Xor,
}

impl From<OpArg> for BooleanOp {
    fn from(op: OpArg) -> Self {
        match op {
            OpArg::Union => BooleanOp::Union,
            OpArg::Intersection => BooleanOp::Intersection,
            OpArg::Difference => BooleanOp::Difference,
            OpArg::Xor => BooleanOp::Xor,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => {
            let mut config = KernelConfig::from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
        None => KernelConfig::load()?,
    };

    match cli.command {
        Commands::Validate {
            input,
            strict,
            json,
            markdown,
        } => validate_command(&config, &input, strict, json, markdown, cli.verbose),
        Commands::Repair {
            input,
            output,
            no_weld,
            keep_orphans,
        } => repair_command(&config, &input, &output, no_weld, keep_orphans),
        Commands::Triangulate { input, output } => triangulate_command(&input, &output),
        Commands::Boolean {
            op,
            a,
            b,
            output,
            cap,
            validate,
        } => boolean_command(&config, op.into(), &a, &b, &output, cap, validate),
        Commands::Stats { input } => stats_command(&input),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_mesh(path: &Path) -> Result<Mesh> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read mesh: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse mesh: {:?}", path))
}

fn write_mesh(mesh: &Mesh, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(mesh).context("Failed to serialize mesh")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write mesh: {:?}", path))?;
    println!(
        "{} {} ({} vertices, {} faces)",
        "Wrote".green(),
        path.display(),
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(())
}

fn validate_command(
    config: &KernelConfig,
    input: &Path,
    strict: bool,
    json: Option<PathBuf>,
    markdown: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let mesh = read_mesh(input)?;
    let mut validation = config.validation.clone();
    if strict {
        validation.warn_missing_attributes = true;
    }
    let report = MeshValidator::new(validation).validate(&mesh);

    ValidationReporter::print_summary_with_verbose(&report, verbose || strict);
    if let Some(path) = json {
        ValidationReporter::write_json(&report, &path)?;
    }
    if let Some(path) = markdown {
        let title = format!("Validation of {}", input.display());
        ValidationReporter::write_markdown(&report, &title, &path)?;
    }

    if !report.is_valid {
        std::process::exit(1);
    }
    Ok(())
}

fn repair_command(
    config: &KernelConfig,
    input: &Path,
    output: &Path,
    no_weld: bool,
    keep_orphans: bool,
) -> Result<()> {
    let mut mesh = read_mesh(input)?;
    let mut options = config.repair_options();
    if no_weld {
        options.weld_tolerance = None;
    }
    options.remove_orphans = !keep_orphans;

    let report = repair(&mut mesh, &options)?;
    ValidationReporter::print_repair(&report);
    write_mesh(&mesh, output)
}

fn triangulate_command(input: &Path, output: &Path) -> Result<()> {
    let mesh = read_mesh(input)?;
    let triangulated = mesh.triangulated()?;
    println!(
        "{} {} faces into {} triangles",
        "Triangulated".cyan(),
        mesh.face_count(),
        triangulated.face_count()
    );
    write_mesh(&triangulated, output)
}

fn boolean_command(
    config: &KernelConfig,
    op: BooleanOp,
    a: &Path,
    b: &Path,
    output: &Path,
    cap: bool,
    validate: bool,
) -> Result<()> {
    let left = read_mesh(a)?;
    let right = read_mesh(b)?;

    let mut engine = config.boolean_engine();
    let mut options = engine.options().clone();
    options.cap_difference |= cap;
    options.validate_result |= validate;
    engine.set_options(options);

    let result = engine.apply(op, &left, &right)?;
    let stats = &result.stats;
    println!("{} {}", "Operation:".bold(), op.to_string().cyan());
    println!(
        "  {} inside {}, outside {}, unknown {}",
        "A:".white(),
        stats.a.inside,
        stats.a.outside,
        stats.a.unknown
    );
    println!(
        "  {} inside {}, outside {}, unknown {}",
        "B:".white(),
        stats.b.inside,
        stats.b.outside,
        stats.b.unknown
    );
    println!(
        "  {} {} welded, {} degenerate, {} duplicate",
        "Cleanup:".white(),
        stats.welded_vertices,
        stats.degenerate_faces,
        stats.duplicate_faces
    );

    if let Some(report) = &result.report {
        ValidationReporter::print_summary(report);
    }
    write_mesh(&result.mesh, output)?;

    if result.report.as_ref().is_some_and(|r| !r.is_valid) {
        bail!("{} result is not a valid mesh", op);
    }
    Ok(())
}

fn stats_command(input: &Path) -> Result<()> {
    let mesh = read_mesh(input)?;
    let (vertices, edges, faces) = mesh.counts();
    let area: f64 = mesh.face_ids().filter_map(|id| mesh.face_area(id)).sum();
    let boundary = mesh.boundary_vertices().iter().filter(|b| **b).count();
    let triangles = mesh.faces().iter().filter(|f| f.len() == 3).count();
    let bbox = mesh.bounding_box();

    println!("{}", "Mesh Statistics".bold());
    println!("{}", "─".repeat(40).white());
    println!("  {:<18} {}", "Vertices:".white(), vertices.to_string().cyan());
    println!("  {:<18} {}", "Edges:".white(), edges.to_string().cyan());
    println!("  {:<18} {}", "Faces:".white(), faces.to_string().cyan());
    println!("  {:<18} {}", "Triangles:".white(), triangles.to_string().cyan());
    println!("  {:<18} {}", "Boundary vertices:".white(), boundary.to_string().cyan());
    println!("  {:<18} {:.6}", "Surface area:".white(), area);
    if !bbox.is_empty() {
        let size = bbox.size();
        println!(
            "  {:<18} {:.4} x {:.4} x {:.4}",
            "Bounds:".white(),
            size.x,
            size.y,
            size.z
        );
    }
    Ok(())
}
