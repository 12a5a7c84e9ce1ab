//! TCP and UDP networking: connect/accept/send/recv, each a plain async
//! function an actor body calls directly instead of going through a
//! dedicated network-actor indirection.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs, UdpSocket};

use crate::status::Status;

fn map_io_err(e: std::io::Error) -> Status {
    match e.kind() {
        std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted => {
            Status::closed("connection closed by peer")
        }
        std::io::ErrorKind::WouldBlock => Status::would_block("socket not ready"),
        _ => Status::io("network operation failed"),
    }
}

/// Open a TCP connection to `addr`.
pub async fn tcp_connect(addr: impl ToSocketAddrs) -> Result<TcpStream, Status> {
    TcpStream::connect(addr).await.map_err(map_io_err)
}

/// Bind a TCP listener, the prerequisite for [`tcp_accept`].
pub async fn bind(addr: impl ToSocketAddrs) -> Result<TcpListener, Status> {
    TcpListener::bind(addr).await.map_err(map_io_err)
}

/// Accept one incoming TCP connection.
pub async fn tcp_accept(listener: &TcpListener) -> Result<TcpStream, Status> {
    listener.accept().await.map(|(stream, _)| stream).map_err(map_io_err)
}

/// Read up to `max_len` bytes from a connected TCP stream.
pub async fn recv(stream: &mut TcpStream, max_len: usize) -> Result<Vec<u8>, Status> {
    let mut buf = vec![0u8; max_len];
    let n = stream.read(&mut buf).await.map_err(map_io_err)?;
    if n == 0 {
        return Err(Status::closed("peer shut down the connection"));
    }
    buf.truncate(n);
    Ok(buf)
}

/// Write the full buffer to a connected TCP stream.
pub async fn send(stream: &mut TcpStream, bytes: &[u8]) -> Result<usize, Status> {
    stream.write_all(bytes).await.map_err(map_io_err)?;
    Ok(bytes.len())
}

/// Bind a UDP socket, the prerequisite for [`udp_send_to`]/[`udp_recv_from`].
pub async fn udp_bind(addr: impl ToSocketAddrs) -> Result<UdpSocket, Status> {
    UdpSocket::bind(addr).await.map_err(map_io_err)
}

/// Send one datagram to `addr`. Unlike TCP, there is no connection to
/// shut down on failure — each call is independent.
pub async fn udp_send_to(socket: &UdpSocket, bytes: &[u8], addr: impl ToSocketAddrs) -> Result<usize, Status> {
    socket.send_to(bytes, addr).await.map_err(map_io_err)
}

/// Receive one datagram, up to `max_len` bytes, reporting the sender's
/// address alongside the payload.
pub async fn udp_recv_from(socket: &UdpSocket, max_len: usize) -> Result<(Vec<u8>, std::net::SocketAddr), Status> {
    let mut buf = vec![0u8; max_len];
    let (n, from) = socket.recv_from(&mut buf).await.map_err(map_io_err)?;
    buf.truncate(n);
    Ok((buf, from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_accept_exchange_bytes() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let mut conn = tcp_accept(&listener).await.unwrap();
            let data = recv(&mut conn, 16).await.unwrap();
            send(&mut conn, &data).await.unwrap();
        });

        let mut client = tcp_connect(addr).await.unwrap();
        send(&mut client, b"ping").await.unwrap();
        let echoed = recv(&mut client, 16).await.unwrap();
        assert_eq!(&echoed, b"ping");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn udp_send_and_recv_round_trip() {
        let server = udp_bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();
        let client = udp_bind("127.0.0.1:0").await.unwrap();
        let client_addr = client.local_addr().unwrap();

        udp_send_to(&client, b"hello", server_addr).await.unwrap();
        let (data, from) = udp_recv_from(&server, 16).await.unwrap();
        assert_eq!(&data, b"hello");
        assert_eq!(from, client_addr);
    }
}
