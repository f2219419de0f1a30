//! Texture 3D Baker CLI
//!
//! Bake a mesh into a volumetric texture atlas.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use texture3d_baker::export::{write_metadata, write_png};
use texture3d_baker::slicing::{compute_bounds, plan_slices};
use texture3d_baker::{
    load_obj, AtlasLayout, AtlasMetadata, BakeConfig, BakeMode, Baker, CancelToken, LogProgress,
    SceneObject, SliceStorage, SoftwareRenderer,
};

#[derive(Parser)]
#[command(name = "texture3d-baker")]
#[command(author, version, about = "Bake a mesh into a volumetric texture atlas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render depth slices of a mesh and pack them into an atlas
    Bake {
        /// Input mesh (Wavefront OBJ)
        #[arg(short, long)]
        mesh: PathBuf,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// JSON config file (size_x, size_y, size_z, bake_mode)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Slice width in pixels
        #[arg(long)]
        size_x: Option<u32>,

        /// Slice height in pixels
        #[arg(long)]
        size_y: Option<u32>,

        /// Number of slices
        #[arg(long)]
        size_z: Option<u32>,

        /// What to capture per slice
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Layout sidecar path (defaults to the output path with a .json extension)
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Do not write the layout sidecar
        #[arg(long)]
        no_metadata: bool,

        /// Keep intermediate slices in memory instead of a temporary directory
        #[arg(long)]
        in_memory: bool,

        /// Render the background with the world color instead of transparent
        #[arg(long)]
        opaque_film: bool,

        /// Directory to create the temporary slice directory in
        #[arg(long)]
        scratch_dir: Option<PathBuf>,
    },

    /// Show the atlas layout chosen for a slice count
    Layout {
        /// Number of slices
        slices: u32,

        /// Slice width in pixels
        #[arg(long, default_value = "256")]
        size_x: u32,

        /// Slice height in pixels
        #[arg(long, default_value = "256")]
        size_y: u32,
    },

    /// Show the bounds and slice plan for a mesh
    Info {
        /// Input mesh (Wavefront OBJ)
        #[arg(short, long)]
        mesh: PathBuf,

        /// Number of slices
        #[arg(long, default_value = "256")]
        size_z: u32,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Diffuse color with alpha
    Diffuse,
    /// Encoded normals
    Normal,
    /// Combined render output
    Combined,
}

impl From<ModeArg> for BakeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Diffuse => BakeMode::Diffuse,
            ModeArg::Normal => BakeMode::Normal,
            ModeArg::Combined => BakeMode::Other,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Bake {
            mesh,
            output,
            config,
            size_x,
            size_y,
            size_z,
            mode,
            metadata,
            no_metadata,
            in_memory,
            opaque_film,
            scratch_dir,
        } => {
            let mut bake_config = match &config {
                Some(path) => BakeConfig::from_json_file(path)?,
                None => BakeConfig::default(),
            };
            if let Some(size_x) = size_x {
                bake_config.size_x = size_x;
            }
            if let Some(size_y) = size_y {
                bake_config.size_y = size_y;
            }
            if let Some(size_z) = size_z {
                bake_config.size_z = size_z;
            }
            if let Some(mode) = mode {
                bake_config = bake_config.with_mode(mode.into());
            }

            let metadata_path = if no_metadata {
                None
            } else {
                Some(metadata.unwrap_or_else(|| output.with_extension("json")))
            };
            let storage = if in_memory {
                SliceStorage::Memory
            } else {
                SliceStorage::TempDir
            };

            let mut baker = Baker::new(bake_config).with_storage(storage);
            if let Some(dir) = scratch_dir {
                baker = baker.with_scratch_dir(dir);
            }

            bake(&mesh, &output, metadata_path.as_deref(), &baker, opaque_film)?;
        }
        Commands::Layout {
            slices,
            size_x,
            size_y,
        } => {
            show_layout(slices, size_x, size_y)?;
        }
        Commands::Info { mesh, size_z } => {
            show_mesh_info(&mesh, size_z)?;
        }
    }

    Ok(())
}

fn bake(
    mesh_path: &Path,
    output_path: &Path,
    metadata_path: Option<&Path>,
    baker: &Baker,
    opaque_film: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading mesh from {:?}...", mesh_path);
    let mesh = load_obj(mesh_path)?;
    println!(
        "  {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    let name = mesh_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mesh".to_string());
    let selection = vec![SceneObject::mesh(name, mesh.clone())];
    let mut renderer = SoftwareRenderer::new(mesh).with_film_transparent(!opaque_film);

    let config = baker.config();
    println!("Baking with config:");
    println!("  - Slice size: {}x{}", config.size_x, config.size_y);
    println!("  - Slices: {}", config.size_z);
    println!("  - Mode: {}", config.bake_mode);

    let output = baker.bake_selection(
        &selection,
        &mut renderer,
        &mut LogProgress::default(),
        &CancelToken::new(),
    )?;

    let layout = output.layout();
    println!(
        "  Atlas: {}x{} ({} cols x {} rows)",
        layout.atlas_width, layout.atlas_height, layout.cols, layout.rows
    );
    for warning in output.warnings() {
        println!("  Warning: {}", warning);
    }

    let bytes = write_png(&output.atlas, output_path)?;
    println!("Exported atlas ({} bytes) to {:?}", bytes, output_path);

    if let Some(path) = metadata_path {
        write_metadata(&AtlasMetadata::new(&layout, config.bake_mode), path)?;
        println!("  Layout: {:?}", path);
    }

    Ok(())
}

fn show_layout(slices: u32, size_x: u32, size_y: u32) -> Result<(), Box<dyn std::error::Error>> {
    let layout = AtlasLayout::for_slices(slices, size_x, size_y)?;
    println!("Slices: {}", slices);
    println!("  Rows: {}", layout.rows);
    println!("  Cols: {}", layout.cols);
    println!("  Atlas: {}x{}", layout.atlas_width, layout.atlas_height);

    Ok(())
}

fn show_mesh_info(mesh_path: &Path, size_z: u32) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading mesh from {:?}...", mesh_path);
    let mesh = load_obj(mesh_path)?;
    let bounds = compute_bounds(&mesh)?;
    let plan = plan_slices(bounds, size_z as usize);

    println!("\nMesh Info:");
    println!("  Vertices: {}", mesh.vertex_count());
    println!("  Triangles: {}", mesh.triangle_count());
    println!("  Loose points: {}", mesh.points.len());
    println!("  Bounds min: {:?}", bounds.min);
    println!("  Bounds max: {:?}", bounds.max);
    println!("  Camera position: {:?}", plan.camera.position);
    println!("  Ortho scale: {}", plan.camera.ortho_scale);
    if let (Some(first), Some(last)) = (plan.slices.first(), plan.slices.last()) {
        println!(
            "  Slices: {} from depth {} to {}",
            plan.num_slices(),
            first.depth,
            last.depth
        );
    }

    Ok(())
}
