use std::io::ErrorKind;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::{RadioTransport, Reception};

/// Large enough for the biggest AP1200 frame (1044 bytes) with headroom.
const RECV_BUFFER_SIZE: usize = 2048;

/// How long a transmission waits on one station before giving up on it.
const SEND_TIMEOUT: Duration = Duration::from_millis(100);

/// Shared-medium radio simulation over Unix datagram sockets.
///
/// A medium is a directory. Every station binds `<medium>/<label>.sock`, and a
/// transmission is delivered to every other station socket in the directory,
/// the way every receiver in range hears a radio transmission. Stations that
/// are gone or not draining their socket simply miss the frame.
pub struct DatagramRadio {
    socket: UnixDatagram,
    medium: PathBuf,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl DatagramRadio {
    /// Default permission mode for station sockets.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// File extension that marks a station socket on the medium.
    pub const SOCKET_EXTENSION: &'static str = "sock";
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Join a medium as station `label`, creating the medium directory if needed.
    ///
    /// If a stale socket with the same label exists it is replaced. A socket
    /// still owned by a live station, or any other kind of file at that path,
    /// is left alone and reported as a bind error.
    pub fn join(medium: impl AsRef<Path>, label: &str) -> Result<Self> {
        let medium = medium.as_ref().to_path_buf();
        std::fs::create_dir_all(&medium).map_err(|source| TransportError::Medium {
            path: medium.clone(),
            source,
        })?;

        let path = medium.join(format!("{label}.{}", Self::SOCKET_EXTENSION));
        let path_bytes = path.as_os_str().len();
        if path_bytes >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len: path_bytes,
                max: Self::MAX_PATH_LEN,
            });
        }

        let bind_err = |source| TransportError::Bind {
            path: path.clone(),
            source,
        };

        if let Ok(metadata) = std::fs::symlink_metadata(&path) {
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            if station_is_live(&path).map_err(bind_err)? {
                return Err(bind_err(std::io::Error::new(
                    ErrorKind::AddrInUse,
                    "a live station already uses this label",
                )));
            }
            debug!(?path, "removing stale station socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let socket = UnixDatagram::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE))
            .map_err(bind_err)?;
        socket.set_write_timeout(Some(SEND_TIMEOUT)).map_err(bind_err)?;
        let created = std::fs::symlink_metadata(&path).map_err(bind_err)?;

        info!(?path, "joined radio medium");

        Ok(Self {
            socket,
            medium,
            path,
            created_inode: Some((created.dev(), created.ino())),
        })
    }

    /// Socket paths of every other station currently on the medium.
    pub fn stations(&self) -> Result<Vec<PathBuf>> {
        let medium_err = |source| TransportError::Medium {
            path: self.medium.clone(),
            source,
        };

        let mut stations = Vec::new();
        for entry in std::fs::read_dir(&self.medium).map_err(medium_err)? {
            let entry = entry.map_err(medium_err)?;
            let path = entry.path();
            if path == self.path
                || path.extension().and_then(|ext| ext.to_str()) != Some(Self::SOCKET_EXTENSION)
            {
                continue;
            }
            match entry.file_type() {
                Ok(kind) if kind.is_socket() => stations.push(path),
                _ => continue,
            }
        }
        stations.sort();
        Ok(stations)
    }

    /// The medium directory.
    pub fn medium(&self) -> &Path {
        &self.medium
    }

    /// This station's socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RadioTransport for DatagramRadio {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        let stations = self.stations()?;
        trace!(len = frame.len(), stations = stations.len(), "broadcasting frame");

        for station in stations {
            match self.socket.send_to(frame, &station) {
                Ok(_) => {}
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::ConnectionRefused
                            | ErrorKind::NotFound
                            | ErrorKind::WouldBlock
                            | ErrorKind::TimedOut
                    ) =>
                {
                    debug!(?station, %err, "station missed transmission");
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }

    fn receive(&mut self, timeout: Option<Duration>) -> Result<Reception> {
        // A zero read timeout is rejected by the OS.
        let timeout = timeout.map(|t| t.max(Duration::from_millis(1)));
        self.socket.set_read_timeout(timeout)?;

        let mut buf = [0u8; RECV_BUFFER_SIZE];
        loop {
            match self.socket.recv(&mut buf) {
                Ok(n) => {
                    trace!(len = n, "caught transmission");
                    return Ok(Reception::new(Bytes::copy_from_slice(&buf[..n]), 0));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(Reception::empty());
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl Drop for DatagramRadio {
    fn drop(&mut self) {
        if let Some((expected_dev, expected_ino)) = self.created_inode {
            if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
                if metadata.file_type().is_socket()
                    && metadata.dev() == expected_dev
                    && metadata.ino() == expected_ino
                {
                    debug!(path = ?self.path, "leaving radio medium");
                    let _ = std::fs::remove_file(&self.path);
                } else {
                    debug!(
                        path = ?self.path,
                        "station path identity changed; skipping cleanup"
                    );
                }
            }
        }
    }
}

/// Whether some station is still bound to the socket at `path`.
fn station_is_live(path: &Path) -> std::io::Result<bool> {
    let probe = UnixDatagram::unbound()?;
    match probe.connect(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::ConnectionRefused => Ok(false),
        Err(err) => Err(err),
    }
}

impl std::fmt::Debug for DatagramRadio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatagramRadio")
            .field("path", &self.path)
            .finish()
    }
}
