//! tileforge CLI - Command-line interface
//!
//! Serves map tiles over HTTP, either from a mod_tile metatile tree or
//! rendered in-process from an OSM extract.

mod commands;
mod error;
mod runner;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::common::ListenArgs;
use commands::{init, locate, render, serve};
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "tileforge")]
#[command(version, about = "Slippy-map tile server", long_about = None)]
struct Cli {
    /// Config file (default: ~/.tileforge/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Listener flags shared by the serving commands.
#[derive(Args, Debug, Clone, Default)]
struct ListenFlags {
    /// Listen host (overrides [server] host)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides [server] port)
    #[arg(long)]
    port: Option<u16>,

    /// Directory served for paths outside /tile/
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// HTTPS port (overrides [server] tls_port)
    #[arg(long)]
    tls_port: Option<u16>,

    /// PEM certificate chain; HTTPS needs both this and --tls-key
    #[arg(long)]
    tls_cert: Option<PathBuf>,

    /// PEM private key
    #[arg(long)]
    tls_key: Option<PathBuf>,
}

impl From<ListenFlags> for ListenArgs {
    fn from(flags: ListenFlags) -> Self {
        ListenArgs {
            host: flags.host,
            port: flags.port,
            static_dir: flags.static_dir,
            tls_port: flags.tls_port,
            tls_cert: flags.tls_cert,
            tls_key: flags.tls_key,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tiles from a metatile tree, rendering missing ones through renderd
    Serve {
        #[command(flatten)]
        listen: ListenFlags,

        /// Root of the metatile tree
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Map name
        #[arg(long)]
        map: Option<String>,

        /// renderd address: host:port or Unix socket path
        #[arg(long, conflicts_with = "no_renderd")]
        renderd: Option<String>,

        /// Never contact renderd, even if one is configured
        #[arg(long)]
        no_renderd: bool,

        /// Re-render tiles older than this in the background (e.g. 168h, 0 disables)
        #[arg(long)]
        expiration: Option<String>,
    },

    /// Index an OSM extract and render tiles in-process
    Render {
        #[command(flatten)]
        listen: ListenFlags,

        /// OSM PBF extract (overrides [renderer] osm_file)
        osm_file: Option<PathBuf>,

        /// Deepest indexed zoom level
        #[arg(long)]
        max_zoom: Option<u32>,

        /// Zoom level from which minor ways are indexed
        #[arg(long)]
        detail_zoom: Option<u32>,
    },

    /// Show the metatile file and slot holding a tile
    Locate {
        /// Zoom level
        z: u32,
        /// Tile column
        x: u32,
        /// Tile row
        y: u32,

        /// Root of the metatile tree
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Map name
        #[arg(long)]
        map: Option<String>,
    },

    /// Write a config file with default values
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        e.exit();
    }
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => init::run(config_path, force),
        Commands::Serve {
            listen,
            data_dir,
            map,
            renderd,
            no_renderd,
            expiration,
        } => {
            let runner = CliRunner::new(config_path, cli.verbose)?;
            serve::run(
                runner,
                serve::ServeArgs {
                    listen: listen.into(),
                    data_dir,
                    map,
                    renderd,
                    no_renderd,
                    expiration,
                },
            )
        }
        Commands::Render {
            listen,
            osm_file,
            max_zoom,
            detail_zoom,
        } => {
            let runner = CliRunner::new(config_path, cli.verbose)?;
            render::run(
                runner,
                render::RenderArgs {
                    listen: listen.into(),
                    osm_file,
                    max_zoom,
                    detail_zoom,
                },
            )
        }
        Commands::Locate {
            z,
            x,
            y,
            data_dir,
            map,
        } => {
            let runner = CliRunner::new(config_path, cli.verbose)?;
            locate::run(
                runner,
                locate::LocateArgs {
                    z,
                    x,
                    y,
                    data_dir,
                    map,
                },
            )
        }
    }
}
