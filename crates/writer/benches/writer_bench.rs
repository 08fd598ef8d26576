use criterion::{Criterion, criterion_group, criterion_main};
use http::{HeaderMap, HeaderValue, StatusCode, header};
use micro_writer::connection::StreamSink;
use micro_writer::sink::ResponseSink;
use micro_writer::writer::ResponseWriter;
use std::hint::black_box;
use std::io;
use std::io::Cursor;

// Sink that drops everything, isolates the writer bookkeeping
struct NullSink {
    headers: HeaderMap,
}

impl ResponseSink for NullSink {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        black_box(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }
}

fn bench_writer_bookkeeping(c: &mut Criterion) {
    let mut writer = ResponseWriter::new(NullSink { headers: HeaderMap::new() });

    c.bench_function("writer_reset_and_write", |b| {
        b.iter(|| {
            let sink = writer.reset(NullSink { headers: HeaderMap::new() });
            black_box(sink);
            writer.set_status(201);
            writer.write_str("Hello ").unwrap();
            writer.write(b"World!").unwrap();
            black_box(writer.size());
        });
    });
}

fn bench_stream_sink_response(c: &mut Criterion) {
    c.bench_function("stream_sink_fixed_length_response", |b| {
        b.iter(|| {
            let mut writer = ResponseWriter::new(StreamSink::new(Cursor::new(Vec::with_capacity(128))));
            writer.headers_mut().insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
            writer.write_str("Hello World!").unwrap();
            writer.sink_mut().finish().unwrap();
            black_box(writer.into_sink());
        });
    });

    c.bench_function("stream_sink_chunked_response", |b| {
        b.iter(|| {
            let mut writer = ResponseWriter::new(StreamSink::new(Cursor::new(Vec::with_capacity(128))));
            for _ in 0..8 {
                writer.write(b"chunk of data").unwrap();
            }
            writer.sink_mut().finish().unwrap();
            black_box(writer.into_sink());
        });
    });
}

criterion_group!(benches, bench_writer_bookkeeping, bench_stream_sink_response);
criterion_main!(benches);
