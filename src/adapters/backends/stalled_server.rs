//! One-shot HTTP server that writes part of a response and then stalls.
//!
//! Used to exercise cancellation while a body is being read.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Starts a server that answers a single request with `status`, the given
/// content type, and a chunked body containing only `partial`, then holds the
/// connection open without sending more. Returns the base URL.
pub(crate) async fn serve_partial(status: u16, content_type: &str, partial: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status} Partial\r\ncontent-type: {content_type}\r\ntransfer-encoding: chunked\r\n\r\n{:x}\r\n{partial}\r\n",
        partial.len()
    );

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 16 * 1024];
        let _ = socket.read(&mut request).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        std::future::pending::<()>().await;
    });

    format!("http://{addr}")
}
