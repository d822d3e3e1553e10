//! Performance benchmarks for the tinyws codec.
//!
//! Run with: `cargo bench`

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use tinyws::connection::{BufferedTransport, Session};
use tinyws::protocol::mask::{apply_mask, apply_mask_from};
use tinyws::protocol::{
    ClientRequest, Frame, FrameFlags, FrameParser, HeaderFlags, OpCode, ServerResponse,
    build_with_mask, encoded_size, generate_accept, validate_header,
};
use tinyws::Config;

const MASK: [u8; 4] = [0x37, 0xfa, 0x21, 0x3d];

// =============================================================================
// Frame Parsing Benchmarks
// =============================================================================

fn create_frame(payload_size: usize, mask: Option<[u8; 4]>) -> Vec<u8> {
    let payload = vec![0xAB; payload_size];
    let flags = FrameFlags::new(OpCode::Binary).with_mask(mask.is_some());
    let mut buf = vec![0u8; encoded_size(mask.is_some(), payload_size as u64) as usize];
    build_with_mask(&mut buf, flags, &payload, mask.unwrap_or_default()).unwrap();
    buf
}

fn parse(parser: &mut FrameParser, data: &[u8]) -> Option<Frame> {
    let mut view = data;
    parser.execute(&mut view).unwrap()
}

fn bench_frame_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_parsing");
    let mut parser = FrameParser::new();

    for (name, size) in [("small_10b", 10), ("medium_1kb", 1024), ("large_64kb", 65536)] {
        let unmasked = create_frame(size, None);
        let masked = create_frame(size, Some(MASK));

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("{name}_unmasked"), |b| {
            b.iter(|| parse(&mut parser, black_box(&unmasked)))
        });
        group.bench_function(format!("{name}_masked"), |b| {
            b.iter(|| parse(&mut parser, black_box(&masked)))
        });
    }

    // Same 64 KB masked frame delivered in 1500-byte reads
    let masked = create_frame(65536, Some(MASK));
    group.throughput(Throughput::Bytes(65536));
    group.bench_function("large_64kb_chunked_1500", |b| {
        b.iter(|| {
            let mut out = None;
            for chunk in masked.chunks(1500) {
                let mut view = black_box(chunk);
                if let Some(frame) = parser.execute(&mut view).unwrap() {
                    out = Some(frame);
                }
            }
            out
        })
    });

    group.finish();
}

// =============================================================================
// Frame Building Benchmarks
// =============================================================================

fn bench_frame_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_building");

    for (name, size) in [("small_10b", 10usize), ("medium_1kb", 1024), ("large_64kb", 65536)] {
        let payload = vec![0xAB; size];
        let mut buf = vec![0u8; encoded_size(true, size as u64) as usize];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("{name}_unmasked"), |b| {
            let flags = FrameFlags::new(OpCode::Binary);
            b.iter(|| build_with_mask(&mut buf, flags, black_box(&payload), [0; 4]))
        });
        group.bench_function(format!("{name}_masked"), |b| {
            let flags = FrameFlags::new(OpCode::Binary).with_mask(true);
            b.iter(|| build_with_mask(&mut buf, flags, black_box(&payload), MASK))
        });
    }

    group.finish();
}

// =============================================================================
// Masking Benchmarks
// =============================================================================

fn bench_masking(c: &mut Criterion) {
    let mut group = c.benchmark_group("masking");

    for size in [64usize, 1024, 65536] {
        let mut data = vec![0xAB; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(format!("apply_mask_{size}"), |b| {
            b.iter(|| apply_mask(black_box(&mut data), black_box(MASK)))
        });
        group.bench_function(format!("apply_mask_from_phase3_{size}"), |b| {
            b.iter(|| apply_mask_from(black_box(&mut data), black_box(MASK), 3))
        });
    }

    group.finish();
}

// =============================================================================
// Handshake Benchmarks
// =============================================================================

fn bench_handshake(c: &mut Criterion) {
    let mut group = c.benchmark_group("handshake");
    let key = "dGhlIHNhbXBsZSBub25jZQ==";

    group.bench_function("generate_accept", |b| {
        b.iter(|| generate_accept(black_box(key)))
    });

    group.bench_function("validate_request_headers", |b| {
        let headers: [(&[u8], &[u8]); 5] = [
            (b"Host", b"example.com"),
            (b"Upgrade", b"websocket"),
            (b"Connection", b"keep-alive, Upgrade"),
            (b"Sec-WebSocket-Key", key.as_bytes()),
            (b"Sec-WebSocket-Version", b"13"),
        ];
        b.iter(|| {
            let mut flags = HeaderFlags::EMPTY;
            for (name, value) in headers {
                validate_header(&mut flags, black_box(name), black_box(value));
            }
            flags
        })
    });

    group.bench_function("write_request", |b| {
        let request = ClientRequest::new("/chat", "example.com", key).with_protocol("chat");
        let mut buf = Vec::with_capacity(256);
        b.iter(|| {
            buf.clear();
            request.write(&mut buf)
        })
    });

    group.bench_function("write_response", |b| {
        let response = ServerResponse::for_key("tinyws", key, None);
        let mut buf = Vec::with_capacity(256);
        b.iter(|| {
            buf.clear();
            response.write(&mut buf)
        })
    });

    let mut client = Session::client(BufferedTransport::new(), Config::default());
    client.connect("/chat", "example.com", None).unwrap();
    let request = client.transport_mut().take();

    group.bench_function("server_session_upgrade", |b| {
        b.iter(|| {
            let mut server = Session::server(BufferedTransport::new(), Config::default());
            let mut view = black_box(&request[..]);
            server.feed(&mut view).unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_parsing,
    bench_frame_building,
    bench_masking,
    bench_handshake
);
criterion_main!(benches);
