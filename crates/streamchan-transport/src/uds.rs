use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// `sockaddr_un.sun_path` is 108 bytes on Linux and 104 elsewhere.
#[cfg(target_os = "linux")]
const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
const MAX_PATH_LEN: usize = 104;

/// A Unix domain socket listener that removes its socket file on drop.
///
/// Stale sockets left behind by a crashed process are replaced on bind;
/// any other kind of file at the path is left untouched and reported.
pub struct SocketListener {
    listener: UnixListener,
    path: PathBuf,
    inode: (u64, u64),
}

impl SocketListener {
    /// Permission mode applied to the socket file: owner read/write only.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;

    /// Bind and listen on `path` with [`SocketListener::DEFAULT_SOCKET_MODE`].
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Self::bind_with_mode(path, Self::DEFAULT_SOCKET_MODE)
    }

    /// Bind and listen on `path`, then set the socket file's mode.
    pub fn bind_with_mode(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = path.as_os_str().len();
        if len >= MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len,
                max: MAX_PATH_LEN,
            });
        }

        let bind_err = |source| TransportError::Bind {
            path: path.clone(),
            source,
        };

        if let Ok(metadata) = std::fs::symlink_metadata(&path) {
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            debug!(?path, "replacing stale socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).map_err(bind_err)?;
        let metadata = std::fs::symlink_metadata(&path).map_err(bind_err)?;

        info!(?path, "listening on unix domain socket");

        Ok(Self {
            listener,
            inode: (metadata.dev(), metadata.ino()),
            path,
        })
    }

    /// Accept the next connection (blocking).
    pub fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "accepted connection");
        Ok(stream)
    }

    /// Accept a pending connection without blocking.
    ///
    /// Returns `Ok(None)` when no client is waiting. The returned stream is
    /// always in blocking mode.
    pub fn try_accept(&self) -> Result<Option<UnixStream>> {
        self.listener.set_nonblocking(true)?;
        let accepted = self.listener.accept();
        self.listener.set_nonblocking(false)?;

        match accepted {
            Ok((stream, _addr)) => {
                stream.set_nonblocking(false)?;
                debug!(path = ?self.path, "accepted connection");
                Ok(Some(stream))
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// The path this listener is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SocketListener {
    fn drop(&mut self) {
        let Ok(metadata) = std::fs::symlink_metadata(&self.path) else {
            return;
        };
        if metadata.file_type().is_socket() && (metadata.dev(), metadata.ino()) == self.inode {
            debug!(path = ?self.path, "removing socket file");
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Connect to a listening Unix domain socket (blocking).
pub fn connect_unix(path: impl AsRef<Path>) -> Result<UnixStream> {
    let path = path.as_ref();
    let stream = UnixStream::connect(path).map_err(|source| TransportError::Connect {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(?path, "connected to unix domain socket");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "streamchan-uds-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn bind_accept_connect() {
        let dir = scratch_dir("roundtrip");
        let sock_path = dir.join("test.sock");

        let listener = SocketListener::bind(&sock_path).unwrap();
        assert!(sock_path.exists());

        let path_clone = sock_path.clone();
        let handle = std::thread::spawn(move || {
            let mut client = connect_unix(&path_clone).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        handle.join().unwrap();

        drop(listener);
        assert!(!sock_path.exists(), "socket file should be removed on drop");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn path_too_long() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        let result = SocketListener::bind(&long_path);
        assert!(matches!(result, Err(TransportError::PathTooLong { .. })));
    }

    #[test]
    fn rebinding_replaces_stale_socket() {
        let dir = scratch_dir("stale");
        let sock_path = dir.join("stale.sock");

        let first = SocketListener::bind(&sock_path).unwrap();
        std::mem::forget(first);
        assert!(sock_path.exists());

        let second = SocketListener::bind(&sock_path);
        assert!(second.is_ok());

        drop(second);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn refuses_to_replace_regular_file() {
        let dir = scratch_dir("file");
        let sock_path = dir.join("not-a-socket.sock");
        std::fs::write(&sock_path, b"regular-file").unwrap();

        let result = SocketListener::bind(&sock_path);
        assert!(matches!(result, Err(TransportError::Bind { .. })));
        assert!(sock_path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn connect_to_missing_socket_fails() {
        let dir = scratch_dir("missing");
        let result = connect_unix(dir.join("nobody.sock"));
        assert!(matches!(result, Err(TransportError::Connect { .. })));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn try_accept_without_client_returns_none() {
        let dir = scratch_dir("try");
        let sock_path = dir.join("try.sock");
        let listener = SocketListener::bind(&sock_path).unwrap();

        assert!(listener.try_accept().unwrap().is_none());

        let _client = connect_unix(&sock_path).unwrap();
        let accepted = listener.try_accept().unwrap();
        assert!(accepted.is_some());

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn socket_file_is_owner_only_by_default() {
        let dir = scratch_dir("mode");
        let sock_path = dir.join("mode.sock");
        let listener = SocketListener::bind(&sock_path).unwrap();

        let mode = std::fs::metadata(&sock_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, SocketListener::DEFAULT_SOCKET_MODE);

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn explicit_mode_is_applied() {
        let dir = scratch_dir("mode-explicit");
        let sock_path = dir.join("shared.sock");
        let listener = SocketListener::bind_with_mode(&sock_path, 0o660).unwrap();

        let mode = std::fs::metadata(&sock_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o660);

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
