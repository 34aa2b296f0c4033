//! Render command - index an OSM extract and render tiles in-process.

use std::path::PathBuf;
use std::time::Instant;

use tileforge::config::{validate_zoom, RendererSettings};
use tileforge::osm::PbfWaySource;
use tileforge::server::{self, AppContext};
use tracing::info;

use super::common::ListenArgs;
use crate::error::CliError;
use crate::runner::{shutdown_signal, CliRunner};

/// Arguments for the render command.
pub struct RenderArgs {
    pub listen: ListenArgs,
    pub osm_file: Option<PathBuf>,
    pub max_zoom: Option<u32>,
    pub detail_zoom: Option<u32>,
}

/// Run the render command.
pub fn run(runner: CliRunner, args: RenderArgs) -> Result<(), CliError> {
    runner.log_startup("render");
    let config = runner.config();

    let addr = args.listen.address(&config.server)?;
    let static_dir = args.listen.static_dir(&config.server);
    let tls = args.listen.tls_listener(&config.server)?;
    let osm_file = args
        .osm_file
        .or_else(|| config.renderer.osm_file.clone())
        .ok_or_else(|| {
            CliError::Config(
                "No OSM file given. Pass one on the command line or set \
                 [renderer] osm_file in config.ini."
                    .to_string(),
            )
        })?;
    let (max_zoom, detail_zoom) =
        resolve_zooms(args.max_zoom, args.detail_zoom, &config.renderer)?;

    println!("Indexing {} (max zoom {})...", osm_file.display(), max_zoom);
    let started = Instant::now();
    let source = PbfWaySource::new(&osm_file);
    let context = AppContext::in_process(max_zoom, detail_zoom, |builder| {
        source.build_index(builder)
    })?;
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "Spatial index ready");
    println!("Indexed in {:.1}s", started.elapsed().as_secs_f64());

    println!("Static files from {}", static_dir.display());
    println!("Listening on http://{}", addr);
    if let Some(tls) = &tls {
        println!("Listening on https://{}", tls.addr);
    }
    println!("Press Ctrl+C to stop");

    runner.block_on(async move {
        server::serve(addr, tls, context, &static_dir, shutdown_signal())
            .await
            .map_err(CliError::Serve)
    })
}

/// Resolve the indexed depth and detail zoom: CLI > config.
fn resolve_zooms(
    max_zoom: Option<u32>,
    detail_zoom: Option<u32>,
    settings: &RendererSettings,
) -> Result<(u32, u32), CliError> {
    let max_zoom = validate_zoom("max_zoom", max_zoom.unwrap_or(settings.max_zoom))?;
    let detail_zoom = validate_zoom("detail_zoom", detail_zoom.unwrap_or(settings.detail_zoom))?;

    if detail_zoom > max_zoom {
        return Err(CliError::Config(format!(
            "detail zoom {} exceeds max zoom {}",
            detail_zoom, max_zoom
        )));
    }
    Ok((max_zoom, detail_zoom))
}
