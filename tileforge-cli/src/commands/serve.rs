//! Serve command - serve tiles from a metatile tree.

use std::path::PathBuf;
use std::sync::Arc;

use tileforge::config::parse_duration;
use tileforge::renderd::RenderdClient;
use tileforge::server::{self, AppContext, MetatileBackend};
use tracing::{info, warn};

use super::common::{resolve_map, ListenArgs};
use crate::error::CliError;
use crate::runner::{shutdown_signal, CliRunner};

/// Arguments for the serve command.
pub struct ServeArgs {
    pub listen: ListenArgs,
    pub data_dir: Option<PathBuf>,
    pub map: Option<String>,
    pub renderd: Option<String>,
    pub no_renderd: bool,
    pub expiration: Option<String>,
}

/// Run the serve command.
pub fn run(runner: CliRunner, args: ServeArgs) -> Result<(), CliError> {
    runner.log_startup("serve");
    let config = runner.config();

    // Resolve settings: CLI > config
    let addr = args.listen.address(&config.server)?;
    let static_dir = args.listen.static_dir(&config.server);
    let tls = args.listen.tls_listener(&config.server)?;
    let data_dir = args
        .data_dir
        .unwrap_or_else(|| config.metatiles.directory.clone());
    let map = resolve_map(args.map, &config.metatiles)?;
    let expiration = match args.expiration {
        Some(value) => parse_duration(&value).map_err(|e| CliError::Config(e.to_string()))?,
        None => config.metatiles.tile_expiration,
    };
    let socket = if args.no_renderd {
        None
    } else {
        args.renderd.or_else(|| config.renderd.socket.clone())
    };

    let mut backend = MetatileBackend::new(&data_dir, &map).with_expiration(expiration);

    match socket {
        Some(socket) => {
            let client = RenderdClient::new(&socket, &map).with_timeout(config.renderd.timeout);
            client.check_reachable()?;
            info!(endpoint = %client.endpoint(), map = %map, "renderd reachable");
            println!("Rendering missing tiles through {}", client.endpoint());
            backend = backend.with_renderer(Arc::new(client));
        }
        None => {
            warn!("No renderd configured, missing tiles will return 404");
            println!("No renderd configured: missing tiles will return 404");
        }
    }

    if let Some(expiration) = expiration {
        info!(expiration_secs = expiration.as_secs(), "Stale tile refresh enabled");
    }

    println!("Serving {} from {}", map, data_dir.display());
    println!("Static files from {}", static_dir.display());
    println!("Listening on http://{}", addr);
    if let Some(tls) = &tls {
        println!("Listening on https://{}", tls.addr);
    }
    println!("Press Ctrl+C to stop");

    let context = AppContext::metatiles(backend);
    runner.block_on(async move {
        server::serve(addr, tls, context, &static_dir, shutdown_signal())
            .await
            .map_err(CliError::Serve)
    })
}
