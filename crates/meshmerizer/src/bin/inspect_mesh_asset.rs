//! Decode an uploaded mesh asset and print a JSON summary.
//!
//! Useful for checking assets that fail to produce a mesh: the summary lists
//! every header block, the level of detail that was chosen, and the outcome
//! of decoding the geometry and the convex hulls separately.
//!
//! Run: `cargo run -p meshmerizer --features test-tools --bin inspect_mesh_asset -- <asset> [sx sy sz]`

use std::env;
use std::fs;

use glam::Vec3;
use meshmerizer::{Meshmerizer, MeshmerizerConfig};
use meshmerizer_decode::{AssetHeader, DEFAULT_MAX_DECOMPRESSED_BYTES, decode_mesh_asset};
use serde_json::{Value, json};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("Usage: inspect_mesh_asset <asset> [sx sy sz]");
        std::process::exit(2);
    };
    let scale = match parse_scale(&args[2..]) {
        Ok(scale) => scale,
        Err(e) => {
            eprintln!("Invalid scale: {e}");
            std::process::exit(2);
        }
    };

    let payload = match fs::read(path) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("Failed to read {path}: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("Read {} bytes from {path}", payload.len());

    match summarize(&payload, scale) {
        Ok(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Failed to serialize summary: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Failed to decode {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn parse_scale(args: &[String]) -> Result<Vec3, String> {
    match args {
        [] => Ok(Vec3::ONE),
        [x, y, z] => {
            let parse = |s: &String| s.parse::<f32>().map_err(|e| format!("'{s}': {e}"));
            Ok(Vec3::new(parse(x)?, parse(y)?, parse(z)?))
        }
        _ => Err("expected three components".to_string()),
    }
}

fn summarize(payload: &[u8], scale: Vec3) -> Result<Value, meshmerizer_decode::DecodeError> {
    let header = AssetHeader::parse(payload)?;
    let blocks: Vec<Value> = header
        .block_names()
        .map(|name| match header.block(name) {
            Ok(Some(block)) => json!({ "name": name, "offset": block.offset, "size": block.size }),
            Ok(None) => json!({ "name": name }),
            Err(e) => json!({ "name": name, "error": e.to_string() }),
        })
        .collect();

    let decoded = decode_mesh_asset(payload, scale, DEFAULT_MAX_DECOMPRESSED_BYTES)?;
    let geometry = match &decoded.geometry {
        Ok(mesh) => {
            let bounds = mesh.bounds().map(|b| {
                json!({ "min": b.min.to_array(), "max": b.max.to_array() })
            });
            json!({
                "vertices": mesh.vertex_count(),
                "triangles": mesh.triangle_count(),
                "welded_vertices": mesh.welded().vertex_count(),
                "bounds": bounds,
            })
        }
        Err(e) => json!({ "error": e.to_string() }),
    };
    let hulls = match &decoded.hulls {
        None => Value::Null,
        Some(Ok(hulls)) => {
            let hull_sizes: Option<Vec<usize>> = hulls
                .hulls
                .as_ref()
                .map(|list| list.iter().map(Vec::len).collect());
            json!({
                "bounding_hull_points": hulls.bounding_hull.as_ref().map(Vec::len),
                "hulls": hull_sizes,
            })
        }
        Some(Err(e)) => json!({ "error": e.to_string() }),
    };

    // Build through the engine as well, to show what a caller would get.
    let engine = Meshmerizer::new(MeshmerizerConfig {
        cache_sculpt_maps: false,
        ..MeshmerizerConfig::default()
    });
    let shape = meshmerizer::ShapeDescriptor::uploaded_mesh(
        meshmerizer::MeshShape {
            asset: meshmerizer::AssetId::default(),
            data: Some(payload.to_vec()),
        },
        scale,
    )
    .with_physical(true);
    let engine_result = match engine.try_create_mesh(&shape, false) {
        Ok(mesh) => json!({ "vertices": mesh.vertex_count(), "triangles": mesh.triangle_count() }),
        Err(e) => json!({ "error": e.to_string(), "retryable": e.is_retryable() }),
    };

    Ok(json!({
        "body_start": header.body_start(),
        "blocks": blocks,
        "lod": decoded.lod,
        "geometry": geometry,
        "convex": hulls,
        "engine": engine_result,
    }))
}
