//! Blocking renderd client.

use super::error::RenderdError;
use super::protocol::{RenderCommand, RenderRequest, RenderResponse, FRAME_SIZE};
use crate::coord::Tile;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Something that can render tiles on request.
///
/// Implementations block until the daemon confirms the metatile is on
/// disk or the request fails.
pub trait RenderDaemon: Send + Sync {
    /// Ask for `tile` to be rendered with the given command.
    fn request_render(&self, tile: &Tile, command: RenderCommand) -> Result<(), RenderdError>;
}

/// Where renderd listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderdEndpoint {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl RenderdEndpoint {
    /// Resolve an endpoint string.
    ///
    /// Anything that resolves as a TCP address (`127.0.0.1:7654`,
    /// `renderd:7654`) is TCP; everything else is a local socket path.
    pub fn parse(address: &str) -> Self {
        if let Ok(addr) = address.parse::<SocketAddr>() {
            return Self::Tcp(addr);
        }
        if let Some(addr) = address
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
        {
            return Self::Tcp(addr);
        }
        Self::Unix(PathBuf::from(address))
    }
}

impl std::fmt::Display for RenderdEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{}", addr),
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// Client talking to one renderd instance for one map.
#[derive(Debug, Clone)]
pub struct RenderdClient {
    endpoint: RenderdEndpoint,
    map_name: String,
    timeout: Option<Duration>,
}

impl RenderdClient {
    /// Create a client without a deadline.
    pub fn new(address: &str, map_name: impl Into<String>) -> Self {
        Self {
            endpoint: RenderdEndpoint::parse(address),
            map_name: map_name.into(),
            timeout: None,
        }
    }

    /// Set the connect/read/write deadline. `None` or zero waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn endpoint(&self) -> &RenderdEndpoint {
        &self.endpoint
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check that the daemon is reachable.
    ///
    /// TCP endpoints are connected to and dropped; socket endpoints must
    /// exist on disk.
    pub fn check_reachable(&self) -> Result<(), RenderdError> {
        match &self.endpoint {
            RenderdEndpoint::Tcp(addr) => self.connect_tcp(addr).map(drop),
            RenderdEndpoint::Unix(path) => std::fs::metadata(path)
                .map(drop)
                .map_err(|e| self.transport(e)),
        }
    }

    fn transport(&self, source: io::Error) -> RenderdError {
        RenderdError::Transport {
            endpoint: self.endpoint.to_string(),
            source,
        }
    }

    fn connect_tcp(&self, addr: &SocketAddr) -> Result<TcpStream, RenderdError> {
        let stream = match self.timeout {
            Some(timeout) => TcpStream::connect_timeout(addr, timeout),
            None => TcpStream::connect(addr),
        }
        .map_err(|e| self.transport(e))?;
        stream
            .set_read_timeout(self.timeout)
            .and_then(|_| stream.set_write_timeout(self.timeout))
            .map_err(|e| self.transport(e))?;
        Ok(stream)
    }

    #[cfg(unix)]
    fn exchange_unix(
        &self,
        path: &std::path::Path,
        frame: &[u8; FRAME_SIZE],
    ) -> Result<RenderResponse, RenderdError> {
        let mut stream =
            std::os::unix::net::UnixStream::connect(path).map_err(|e| self.transport(e))?;
        stream
            .set_read_timeout(self.timeout)
            .and_then(|_| stream.set_write_timeout(self.timeout))
            .map_err(|e| self.transport(e))?;
        self.exchange(&mut stream, frame)
    }

    #[cfg(not(unix))]
    fn exchange_unix(
        &self,
        path: &std::path::Path,
        _frame: &[u8; FRAME_SIZE],
    ) -> Result<RenderResponse, RenderdError> {
        Err(RenderdError::UnsupportedEndpoint(path.display().to_string()))
    }

    fn exchange<S: Read + Write>(
        &self,
        stream: &mut S,
        frame: &[u8; FRAME_SIZE],
    ) -> Result<RenderResponse, RenderdError> {
        stream.write_all(frame).map_err(|e| self.transport(e))?;
        stream.flush().map_err(|e| self.transport(e))?;

        let mut response = [0u8; FRAME_SIZE];
        let mut received = 0;
        while received < FRAME_SIZE {
            match stream.read(&mut response[received..]) {
                Ok(0) => break,
                Ok(n) => received += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.transport(e)),
            }
        }
        if received < FRAME_SIZE {
            return Err(RenderdError::ShortRead { received });
        }

        Ok(RenderResponse::decode(&response))
    }
}

impl RenderDaemon for RenderdClient {
    fn request_render(&self, tile: &Tile, command: RenderCommand) -> Result<(), RenderdError> {
        let frame = RenderRequest::new(*tile, self.map_name.as_str(), command).encode()?;

        debug!(
            endpoint = %self.endpoint,
            z = tile.z,
            x = tile.x,
            y = tile.y,
            command = ?command,
            "Requesting render"
        );

        let response = match &self.endpoint {
            RenderdEndpoint::Tcp(addr) => {
                let mut stream = self.connect_tcp(addr)?;
                self.exchange(&mut stream, &frame)?
            }
            RenderdEndpoint::Unix(path) => self.exchange_unix(path, &frame)?,
        };

        response.check()
    }
}
