//! File operations: open/read/write/pread/pwrite/sync/close, each a plain
//! async function any actor body can `.await` directly.

use std::path::Path;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::status::Status;

fn map_io_err(e: std::io::Error) -> Status {
    match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Status::invalid("path rejected by the OS"),
        std::io::ErrorKind::UnexpectedEof => Status::closed("unexpected end of file"),
        _ => Status::io("filesystem operation failed"),
    }
}

/// Open (creating if needed) a file for reading and writing.
pub async fn open(path: impl AsRef<Path>) -> Result<File, Status> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .await
        .map_err(map_io_err)
}

/// Read up to `max_len` bytes from the file's current position.
pub async fn read(file: &mut File, max_len: usize) -> Result<Vec<u8>, Status> {
    let mut buf = vec![0u8; max_len];
    let n = file.read(&mut buf).await.map_err(map_io_err)?;
    buf.truncate(n);
    Ok(buf)
}

/// Append bytes at the file's current position.
pub async fn write(file: &mut File, bytes: &[u8]) -> Result<usize, Status> {
    file.write_all(bytes).await.map_err(map_io_err)?;
    Ok(bytes.len())
}

/// Positioned read that doesn't disturb the file's cursor for other
/// concurrent operations against the same handle.
///
/// On Unix this is a real `pread(2)` via `nix`, run on the blocking pool so
/// the syscall never stalls the executor thread. Elsewhere it falls back to
/// a seek/restore pair.
#[cfg(unix)]
pub async fn pread(file: &File, offset: u64, max_len: usize) -> Result<Vec<u8>, Status> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    tokio::task::spawn_blocking(move || {
        let mut buf = vec![0u8; max_len];
        let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) };
        let n = nix::sys::uio::pread(borrowed, &mut buf, offset as i64).map_err(|_| Status::io("pread failed"))?;
        buf.truncate(n);
        Ok(buf)
    })
    .await
    .unwrap_or_else(|_| Err(Status::io("pread task panicked")))
}

#[cfg(not(unix))]
pub async fn pread(file: &mut File, offset: u64, max_len: usize) -> Result<Vec<u8>, Status> {
    let original = file.stream_position().await.map_err(map_io_err)?;
    file.seek(std::io::SeekFrom::Start(offset)).await.map_err(map_io_err)?;
    let result = read(file, max_len).await;
    file.seek(std::io::SeekFrom::Start(original)).await.map_err(map_io_err)?;
    result
}

/// Positioned write, same cursor-preserving behavior as [`pread`].
#[cfg(unix)]
pub async fn pwrite(file: &File, offset: u64, bytes: &[u8]) -> Result<usize, Status> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let owned = bytes.to_vec();
    tokio::task::spawn_blocking(move || {
        let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) };
        nix::sys::uio::pwrite(borrowed, &owned, offset as i64).map_err(|_| Status::io("pwrite failed"))
    })
    .await
    .unwrap_or_else(|_| Err(Status::io("pwrite task panicked")))
}

#[cfg(not(unix))]
pub async fn pwrite(file: &mut File, offset: u64, bytes: &[u8]) -> Result<usize, Status> {
    let original = file.stream_position().await.map_err(map_io_err)?;
    file.seek(std::io::SeekFrom::Start(offset)).await.map_err(map_io_err)?;
    let result = write(file, bytes).await;
    file.seek(std::io::SeekFrom::Start(original)).await.map_err(map_io_err)?;
    result
}

/// Flush file contents and metadata to durable storage.
pub async fn sync(file: &mut File) -> Status {
    match file.sync_all().await {
        Ok(()) => Status::OK,
        Err(e) => map_io_err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_roundtrips() {
        let dir = std::env::temp_dir().join(format!("moterun-fs-test-{}", std::process::id()));
        let mut file = open(&dir).await.unwrap();
        write(&mut file, b"hello world").await.unwrap();
        file.seek(std::io::SeekFrom::Start(0)).await.unwrap();
        let got = read(&mut file, 32).await.unwrap();
        assert_eq!(&got, b"hello world");
        let _ = tokio::fs::remove_file(&dir).await;
    }

    #[tokio::test]
    async fn pread_preserves_cursor() {
        let dir = std::env::temp_dir().join(format!("moterun-fs-pread-{}", std::process::id()));
        let mut file = open(&dir).await.unwrap();
        write(&mut file, b"0123456789").await.unwrap();
        let before = file.stream_position().await.unwrap();
        let slice = pread(&file, 2, 3).await.unwrap();
        assert_eq!(&slice, b"234");
        assert_eq!(file.stream_position().await.unwrap(), before);
        let _ = tokio::fs::remove_file(&dir).await;
    }

    #[tokio::test]
    async fn pwrite_does_not_move_cursor() {
        let dir = std::env::temp_dir().join(format!("moterun-fs-pwrite-{}", std::process::id()));
        let mut file = open(&dir).await.unwrap();
        write(&mut file, b"0123456789").await.unwrap();
        let before = file.stream_position().await.unwrap();
        pwrite(&file, 0, b"AB").await.unwrap();
        assert_eq!(file.stream_position().await.unwrap(), before);
        file.seek(std::io::SeekFrom::Start(0)).await.unwrap();
        let got = read(&mut file, 10).await.unwrap();
        assert_eq!(&got, b"AB23456789");
        let _ = tokio::fs::remove_file(&dir).await;
    }
}
