use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use raytracer_bvh::{BuildOptions, BvhConfig, GpuBuffers, SceneState};

/// Build a BVH and light table for a glTF scene and dump the GPU buffers
#[derive(Parser, Debug)]
#[command(name = "bvh-build", version)]
struct Args {
    /// glTF or GLB scene; the built-in demo scene is used when omitted
    scene: Option<PathBuf>,

    /// Largest triangle count a leaf may hold
    #[arg(long, default_value_t = BvhConfig::MAX_LEAF_TRIS, value_parser = clap::value_parser!(u32).range(1..))]
    max_leaf_tris: u32,

    /// Scene to extract when the file holds several
    #[arg(long)]
    scene_index: Option<usize>,

    /// Directory that receives one .bin file per buffer
    #[arg(long, short)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = BuildOptions::with_max_leaf_tris(args.max_leaf_tris);

    let scene = match &args.scene {
        Some(path) => SceneState::load_from_gltf(path, args.scene_index, options)
            .with_context(|| format!("Failed to load scene from {:?}", path))?,
        None => {
            info!("No scene given, using the default scene");
            SceneState::with_options(options)
        }
    };

    let buffers = GpuBuffers::from_scene(&scene.model, &scene.tree);
    info!(
        "{} nodes, {} lights, {} buffer bytes",
        scene.tree.nodes.len(),
        scene.tree.lights.len(),
        buffers.total_bytes()
    );

    if let Some(out) = &args.out {
        buffers
            .write_to_dir(out)
            .with_context(|| format!("Failed to write buffers to {:?}", out))?;
    }

    Ok(())
}
