//! densemesh CLI - batch operations on dense reconstruction meshes
//!
//! Every command reads one mesh (`.obj` or `.bin`), optionally writes one,
//! and prints a one-line summary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use densemesh_geom::{Aabb3, Hexahedron};
use densemesh_math::Point3;
use densemesh_mesh::{Mesh, NoProgress, SubdivisionCriterion};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod mesh_io;

use config::Config;
use mesh_io::{load_mesh, save_mesh, summary};

#[derive(Parser)]
#[command(name = "densemesh")]
#[command(about = "Dense reconstruction mesh tools", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file with [subdivision], [smoothing] and [filter] tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display information about a mesh file
    Info {
        /// Mesh file (.obj or .bin)
        file: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Convert between formats (determined by extension: .obj, .bin)
    Convert {
        input: PathBuf,
        output: PathBuf,
    },
    /// Remove points no triangle uses
    Clean {
        input: PathBuf,
        output: PathBuf,
    },
    /// Remove triangles with overly long edges
    FilterEdges {
        input: PathBuf,
        output: PathBuf,
        /// Maximum longest edge as a multiple of the mean longest edge;
        /// triangles exactly at the limit are removed too
        #[arg(long)]
        ratio: Option<f64>,
    },
    /// Laplacian smoothing of point positions
    Smooth {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        iterations: Option<usize>,
        /// Ignore neighbours farther than this
        #[arg(long)]
        max_neighbor_distance: Option<f64>,
    },
    /// Split triangles until every edge is short enough
    Subdivide {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        max_edge_length: Option<f64>,
        /// Stop once the mesh has this many points
        #[arg(long)]
        max_points: Option<usize>,
    },
    /// Keep only the largest connected component
    LargestComponent {
        input: PathBuf,
        output: PathBuf,
    },
    /// Keep triangles inside a box (or drop them with --exclude)
    Crop {
        input: PathBuf,
        output: PathBuf,
        /// Six numbers `min_x,min_y,min_z,max_x,max_y,max_z` or 24 corner coordinates
        #[arg(long, allow_hyphen_values = true)]
        hexahedron: String,
        /// Remove the triangles inside instead
        #[arg(long)]
        exclude: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { file, json } => {
            show_info(&file, json)?;
        }
        Commands::Convert { input, output } => {
            let mesh = load_mesh(&input)?;
            finish(&output, &mesh)?;
        }
        Commands::Clean { input, output } => {
            let mut mesh = load_mesh(&input)?;
            let remap = mesh.remove_free_points();
            let removed = remap.iter().filter(|r| r.is_none()).count();
            info!(removed, "removed free points");
            finish(&output, &mesh)?;
        }
        Commands::FilterEdges {
            input,
            output,
            ratio,
        } => {
            let ratio = ratio.unwrap_or(config.filter.edge_ratio);
            if !(ratio.is_finite() && ratio > 0.0) {
                anyhow::bail!("--ratio must be positive, got {}", ratio);
            }
            let mut mesh = load_mesh(&input)?;
            let removed = mesh.filter_triangles_with_excessive_edge_length(ratio);
            info!(removed, ratio, "filtered triangles");
            finish(&output, &mesh)?;
        }
        Commands::Smooth {
            input,
            output,
            iterations,
            max_neighbor_distance,
        } => {
            let iterations = iterations.unwrap_or(config.smoothing.iterations);
            let max_dist = max_neighbor_distance.or(config.smoothing.max_neighbor_distance);
            let mut mesh = load_mesh(&input)?;
            mesh.laplacian_smooth_iterations(iterations, max_dist);
            finish(&output, &mesh)?;
        }
        Commands::Subdivide {
            input,
            output,
            max_edge_length,
            max_points,
        } => {
            let mut settings = config.subdivision.clone();
            if let Some(len) = max_edge_length {
                settings.criterion = SubdivisionCriterion::MaxEdgeLength(len);
            }
            if let Some(n) = max_points {
                settings.max_points = n;
            }
            let mut mesh = load_mesh(&input)?;
            let outcome = mesh
                .subdivide(&settings, &NoProgress)
                .context("subdivision failed")?;
            info!(passes = outcome.passes, new_points = outcome.new_points, "subdivided");
            finish(&output, &mesh)?;
        }
        Commands::LargestComponent { input, output } => {
            let mut mesh = load_mesh(&input)?;
            let ids = mesh.largest_connected_component_triangle_ids();
            mesh.retain_triangle_ids(&ids)?;
            mesh.remove_free_points();
            finish(&output, &mesh)?;
        }
        Commands::Crop {
            input,
            output,
            hexahedron,
            exclude,
        } => {
            let hexa = parse_hexahedron(&hexahedron)?;
            let mut mesh = load_mesh(&input)?;
            let removed = if exclude {
                mesh.remove_triangles_in_hexahedra(&[hexa])
            } else {
                mesh.remove_triangles_outside_hexahedron(&hexa)
            };
            mesh.remove_free_points();
            info!(removed, exclude, "cropped");
            finish(&output, &mesh)?;
        }
    }

    Ok(())
}

fn finish(output: &Path, mesh: &Mesh) -> Result<()> {
    save_mesh(output, mesh)?;
    println!("{}", summary(output, mesh));
    Ok(())
}

fn parse_hexahedron(text: &str) -> Result<Hexahedron> {
    let values = text
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid hexahedron '{}'", text))?;
    match values.len() {
        6 => {
            let min = Point3::new(values[0], values[1], values[2]);
            let max = Point3::new(values[3], values[4], values[5]);
            if min.x > max.x || min.y > max.y || min.z > max.z {
                anyhow::bail!("box minimum must not exceed its maximum");
            }
            Ok(Hexahedron::from_aabb(&Aabb3::new(min, max)))
        }
        24 => {
            let mut corners = [Point3::origin(); 8];
            for (corner, xyz) in corners.iter_mut().zip(values.chunks(3)) {
                *corner = Point3::new(xyz[0], xyz[1], xyz[2]);
            }
            Ok(Hexahedron::new(corners))
        }
        n => anyhow::bail!("hexahedron needs 6 or 24 numbers, got {}", n),
    }
}

#[derive(Debug, Serialize)]
struct InfoReport {
    points: usize,
    triangles: usize,
    dead_triangles: usize,
    bounds: Option<[[f64; 3]; 2]>,
    edges: usize,
    boundary_edges: usize,
    non_manifold_edges: usize,
    mean_longest_edge: f64,
    largest_component: usize,
}

impl InfoReport {
    fn new(mesh: &Mesh) -> Self {
        let dead_triangles = mesh.triangles().iter().filter(|t| !t.alive).count();
        if mesh.triangle_count() == 0 {
            return Self {
                points: mesh.point_count(),
                triangles: 0,
                dead_triangles,
                bounds: None,
                edges: 0,
                boundary_edges: 0,
                non_manifold_edges: 0,
                mean_longest_edge: 0.0,
                largest_component: 0,
            };
        }
        let bb = mesh.bounding_box();
        let edges = mesh.extract_undirected_edges();
        Self {
            points: mesh.point_count(),
            triangles: mesh.triangle_count(),
            dead_triangles,
            bounds: Some([[bb.min.x, bb.min.y, bb.min.z], [bb.max.x, bb.max.y, bb.max.z]]),
            edges: edges.len(),
            boundary_edges: edges.boundary_edge_count(),
            non_manifold_edges: edges.non_manifold_edges().count(),
            mean_longest_edge: mesh.average_max_edge_length(),
            largest_component: mesh.largest_connected_component_triangle_ids().len(),
        }
    }
}

fn show_info(file: &Path, json: bool) -> Result<()> {
    let mesh = load_mesh(file)?;
    let report = InfoReport::new(&mesh);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", summary(file, &mesh));
    let Some([min, max]) = report.bounds else {
        return Ok(());
    };
    println!(
        "  Bounds: ({:.4}, {:.4}, {:.4}) - ({:.4}, {:.4}, {:.4})",
        min[0], min[1], min[2], max[0], max[1], max[2]
    );
    println!("  Edges: {} ({} boundary)", report.edges, report.boundary_edges);
    println!("  Non-manifold edges: {}", report.non_manifold_edges);
    println!("  Mean longest edge: {:.6}", report.mean_longest_edge);
    println!("  Largest component: {} triangles", report.largest_component);
    if report.dead_triangles > 0 {
        println!("  Dead triangles: {}", report.dead_triangles);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ratio_help_mentions_limit() {
        let cmd = Cli::command();
        let filter = cmd.find_subcommand("filter-edges").unwrap();
        let ratio = filter.get_arguments().find(|a| a.get_id() == "ratio").unwrap();
        let help = ratio.get_help().unwrap().to_string();
        assert!(help.contains("exactly at the limit are removed"), "{help}");
    }

    #[test]
    fn test_parse_crop() {
        let cli = Cli::try_parse_from([
            "densemesh",
            "crop",
            "in.obj",
            "out.bin",
            "--hexahedron",
            "-1,-1,-1,1,1,1",
            "--exclude",
        ])
        .unwrap();
        match cli.command {
            Commands::Crop {
                hexahedron, exclude, ..
            } => {
                assert_eq!(hexahedron, "-1,-1,-1,1,1,1");
                assert!(exclude);
            }
            _ => panic!("expected crop"),
        }
    }

    #[test]
    fn test_box_hexahedron() {
        let h = parse_hexahedron("-1, -1, -1, 1, 1, 1").unwrap();
        assert!(h.contains_point(&Point3::origin()));
        assert!(!h.contains_point(&Point3::new(2.0, 0.0, 0.0)));
        assert!(parse_hexahedron("1,1,1,-1,-1,-1").is_err());
    }

    #[test]
    fn test_corner_hexahedron() {
        let text = "0,0,0, 1,0,0, 1,1,0, 0,1,0, 0,0,1, 1,0,1, 1,1,1, 0,1,1";
        let h = parse_hexahedron(text).unwrap();
        assert_eq!(h.corners[6], Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_info_report() {
        let mesh = Mesh::from_indexed(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
        .unwrap();
        let report = InfoReport::new(&mesh);
        assert_eq!(report.triangles, 2);
        assert_eq!(report.edges, 5);
        assert_eq!(report.boundary_edges, 4);
        assert_eq!(report.largest_component, 2);
        assert_eq!(report.bounds, Some([[0.0, 0.0, 0.0], [1.0, 1.0, 0.0]]));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["non_manifold_edges"], 0);
    }

    #[test]
    fn test_bad_hexahedron() {
        assert!(parse_hexahedron("1,2,3").is_err());
        assert!(parse_hexahedron("a,b,c,d,e,f").is_err());
    }
}
