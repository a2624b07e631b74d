//! conflat CLI - spectral conformal flattening from the command line.
//!
//! Usage: conflat <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `conflat --help` for available commands. Set `RUST_LOG=debug` to
//! trace the inverse iteration.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use conflat::algo::parameterize::{
    build_conformal_energy, conformal_energy_triplets, energy_of, spectral_conformal,
    SolverBackend, SpectralOptions,
};
use conflat::io;
use conflat::io::solution;
use conflat::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh};

#[derive(Parser)]
#[command(name = "conflat")]
#[command(author, version, about = "Spectral conformal flattening CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Flatten a mesh with boundary
    Flatten {
        /// Input mesh file
        input: PathBuf,

        /// Output file (.obj gets texture coordinates, .txt gets uv records)
        output: PathBuf,

        /// Diagonal shift of the inverse iteration
        #[arg(long, default_value = "1e-8")]
        shift: f64,

        /// Eigen-residual tolerance
        #[arg(short, long, default_value = "1e-10")]
        tolerance: f64,

        /// Maximum number of inverse iterations
        #[arg(short = 'n', long, default_value = "500")]
        max_iterations: usize,

        /// Seed of the start vector
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Always use conjugate gradient (default: dense Cholesky for small meshes only)
        #[arg(long, conflicts_with = "dense")]
        cg: bool,

        /// Always use dense Cholesky, whatever the mesh size
        #[arg(long)]
        dense: bool,

        /// Write the flattened surface itself (z = 0) instead of texture coordinates
        #[arg(long)]
        planar: bool,

        /// Fail if the iteration does not converge
        #[arg(long)]
        require_convergence: bool,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Export the conformal energy matrix as `T re im row col` records
    Energy {
        /// Input mesh file
        input: PathBuf,

        /// Output text file
        output: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Flatten {
            input,
            output,
            shift,
            tolerance,
            max_iterations,
            seed,
            cg,
            dense,
            planar,
            require_convergence,
            sequential,
        } => {
            let backend = if cg {
                SolverBackend::conjugate_gradient()
            } else if dense {
                SolverBackend::Cholesky
            } else {
                SolverBackend::Auto
            };
            let options = SpectralOptions::default()
                .with_shift(shift)
                .with_tolerance(tolerance)
                .with_max_iterations(max_iterations)
                .with_seed(seed)
                .with_backend(backend)
                .with_parallel(!sequential)
                .with_require_convergence(require_convergence);
            cmd_flatten(&input, &output, &options, planar)?;
        }

        Commands::Energy { input, output } => {
            cmd_energy(&input, &output)?;
        }
    }

    Ok(())
}

fn load(input: &Path) -> Result<HalfEdgeMesh, Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
    Ok(mesh)
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Edges: {}", mesh.num_edges());

    let mut min_area = f64::MAX;
    let mut max_area = 0.0_f64;
    for fid in mesh.face_ids() {
        let area = mesh.face_area(fid);
        min_area = min_area.min(area);
        max_area = max_area.max(area);
    }
    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Face area range: [{:.6e}, {:.6e}]", min_area, max_area);

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    let loops = mesh.boundary_loops();
    if loops.is_empty() {
        println!("Topology: Closed (no boundary), cannot be flattened");
    } else {
        let lengths: Vec<String> = loops.iter().map(|l| l.len().to_string()).collect();
        println!(
            "Topology: Open ({} boundary loop(s), edges per loop: {})",
            loops.len(),
            lengths.join(", ")
        );
    }

    if mesh.has_degenerate_faces(1e-14) {
        println!("Warning: degenerate faces present; cotangent weights will not be finite");
    }

    Ok(())
}

fn cmd_flatten(
    input: &Path,
    output: &Path,
    options: &SpectralOptions,
    planar: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load(input)?;

    let mode = if options.parallel { "parallel" } else { "sequential" };
    println!("Flattening ({})...", mode);

    let start = Instant::now();
    let flattening = spectral_conformal(&mesh, options)?;
    let elapsed = start.elapsed();

    let solver = match flattening.backend {
        SolverBackend::ConjugateGradient { .. } => "conjugate gradient",
        _ => "cholesky",
    };
    println!(
        "Done ({}): {} iterations, eigenvalue {:.3e}, residual {:.3e} ({:.2?})",
        solver, flattening.iterations, flattening.eigenvalue, flattening.residual, elapsed
    );
    if !flattening.converged {
        eprintln!("Warning: inverse iteration did not converge; result is approximate");
    }

    let is_text = output
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("txt"));

    if is_text {
        let mut writer = BufWriter::new(File::create(output)?);
        solution::write_flattening(&mut writer, &flattening.uv)?;
        writer.flush()?;
    } else if planar {
        let (_, faces) = to_face_vertex(&mesh);
        let flat: HalfEdgeMesh = build_from_triangles(&flattening.uv.to_points3(), &faces)?;
        io::save(&flat, output)?;
    } else {
        io::obj::save_with_uvs(&mesh, &flattening.uv, output)?;
    }
    println!("Saved: {}", output.display());

    Ok(())
}

fn cmd_energy(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load(input)?;

    let start = Instant::now();
    let triplets = conformal_energy_triplets(&mesh, true);
    let mut writer = BufWriter::new(File::create(output)?);
    solution::write_triplets(&mut writer, &triplets)?;
    writer.flush()?;

    let ec = build_conformal_energy(&mesh, true);
    let ones = conflat::nalgebra::DVector::from_element(
        mesh.num_vertices(),
        conflat::num_complex::Complex64::new(1.0, 0.0),
    );
    println!(
        "Energy: {} triplets, {} non-zeros, hermitian defect {:.2e}, constant energy {:.2e} ({:.2?})",
        triplets.len(),
        ec.nnz(),
        ec.hermitian_defect(),
        energy_of(&ec, &ones).abs(),
        start.elapsed()
    );
    println!("Saved: {}", output.display());

    Ok(())
}
