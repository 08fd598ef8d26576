//! An HTTP/1.1 server answering one request per connection.
//!
//! Connections are accepted on the tokio runtime and served on its blocking
//! pool. Every blocking worker creates one `ResponseWriter` and `reset`s it for
//! each following request. Try:
//!
//! ```text
//! curl -i http://127.0.0.1:8080/
//! curl -i http://127.0.0.1:8080/teapot
//! curl -i http://127.0.0.1:8080/empty
//! printf 'GET /echo HTTP/1.1\r\nHost: x\r\n\r\nping' | nc 127.0.0.1 8080
//! ```

use std::cell::RefCell;
use std::error::Error;
use std::io;
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};

use bytes::BytesMut;
use http::{HeaderValue, header};
use micro_writer::connection::StreamSink;
use micro_writer::writer::ResponseWriter;
use tokio::net::TcpListener;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const MAX_HEAD_SIZE: usize = 8 * 1024;
const MAX_HEADERS: usize = 64;

type Writer = ResponseWriter<StreamSink<TcpStream>>;

thread_local! {
    static WRITER: RefCell<Option<Writer>> = const { RefCell::new(None) };
}

#[derive(Debug)]
struct RequestHead {
    method: String,
    path: String,
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        tokio::spawn(async move {
            let stream = match into_blocking(tcp_stream) {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(cause = %e, %remote_addr, "can't take over the connection");
                    return;
                }
            };

            if let Err(e) = tokio::task::spawn_blocking(move || handle_connection(stream)).await {
                error!(cause = %e, %remote_addr, "connection worker failed");
            }
        });
    }
}

fn into_blocking(tcp_stream: tokio::net::TcpStream) -> io::Result<TcpStream> {
    let stream = tcp_stream.into_std()?;
    stream.set_nonblocking(false)?;
    Ok(stream)
}

fn handle_connection(mut stream: TcpStream) {
    let (head, read_buf) = match read_head(&mut stream) {
        Ok(Some(head_and_rest)) => head_and_rest,
        Ok(None) => {
            info!("connection closed before sending a request");
            return;
        }
        Err(e) => {
            warn!(cause = %e, "can't read request head");
            return;
        }
    };

    let sink = StreamSink::builder(stream).read_buf(read_buf.freeze()).build();
    WRITER.with_borrow_mut(|pooled| {
        let mut writer = match pooled.take() {
            Some(mut writer) => {
                // the previous connection of this worker is dropped here
                writer.reset(sink);
                writer
            }
            None => ResponseWriter::new(sink),
        };

        serve(&head, &mut writer);
        *pooled = Some(writer);
    });
}

fn serve(head: &RequestHead, writer: &mut Writer) {
    writer.headers_mut().insert(header::CONNECTION, HeaderValue::from_static("close"));

    if let Err(e) = route(head, writer) {
        error!(cause = %e, path = %head.path, "handle request error");
        // the status can only change while nothing was sent
        writer.set_status(500);
    }

    if !writer.sink().is_hijacked() {
        writer.write_header_now();
        if let Err(e) = writer.sink_mut().finish() {
            warn!(cause = %e, "failed to finish response");
        }
        if let Some(conn) = writer.sink_mut().get_mut() {
            let _ = conn.shutdown(Shutdown::Both);
        }
    }

    info!(
        method = %head.method,
        path = %head.path,
        status = writer.status().as_u16(),
        size = ?writer.size(),
        "request completed"
    );
}

fn route(head: &RequestHead, writer: &mut Writer) -> Result<(), Box<dyn Error + Send + Sync>> {
    match head.path.as_str() {
        "/" => {
            writer.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            writer.write_str("Hello World!\r\n")?;
        }
        "/teapot" => {
            // a handler may change its mind as long as nothing was written
            writer.set_status(500);
            writer.set_status(418);
            writer.write_str("I'm a teapot\r\n")?;
        }
        "/empty" => {
            writer.set_status(204);
            writer.write_header_now();
        }
        "/echo" => {
            writer.set_status(101);
            let mut hijacked = writer.hijack()?;
            hijacked.conn.write_all(b"HTTP/1.1 101 Switching Protocols\r\nconnection: upgrade\r\nupgrade: echo\r\n\r\n")?;
            hijacked.conn.write_all(&hijacked.read_buf)?;

            let mut buf = [0u8; 1024];
            let n = hijacked.conn.read(&mut buf)?;
            hijacked.conn.write_all(&buf[..n])?;
            hijacked.conn.flush()?;
        }
        _ => {
            writer.set_status(404);
            writer.write_str("Not Found\r\n")?;
        }
    }
    Ok(())
}

/// Reads until a complete request head, returning it with the bytes read past it.
fn read_head(stream: &mut TcpStream) -> io::Result<Option<(RequestHead, BytesMut)>> {
    let mut buf = BytesMut::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut request = httparse::Request::new(&mut headers);
        match request.parse(&buf) {
            Ok(httparse::Status::Complete(head_len)) => {
                let head = RequestHead {
                    method: request.method.unwrap_or("GET").to_string(),
                    path: request.path.unwrap_or("/").to_string(),
                };
                let rest = buf.split_off(head_len);
                return Ok(Some((head, rest)));
            }
            Ok(httparse::Status::Partial) if buf.len() < MAX_HEAD_SIZE => {}
            Ok(httparse::Status::Partial) => return Err(io::Error::new(ErrorKind::InvalidData, "request head too large")),
            Err(e) => return Err(io::Error::new(ErrorKind::InvalidData, e)),
        }
    }
}
