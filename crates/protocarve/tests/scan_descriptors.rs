//! End-to-end scanning of synthetic binaries.

mod common;

use common::{decode, descriptor, descriptor_with_deps, elf_header, embed};
use pretty_assertions::assert_eq;
use protocarve::{
    CollectingObserver, DiscardReason, NullObserver, Scanner, ScannerConfig, WireErrorKind,
};

#[test]
fn extracts_every_embedded_descriptor() {
    let records = vec![
        descriptor("acme/users/v1/user.proto", "acme.users.v1", "User"),
        descriptor_with_deps(
            "acme/orders/v1/order.proto",
            "acme.orders.v1",
            "Order",
            &["acme/users/v1/user.proto", "google/protobuf/timestamp.proto"],
        ),
    ];
    let (blob, ranges) = embed(&records);

    let results = Scanner::new().scan(&blob);

    assert_eq!(results.len(), 2);
    for (result, (expected, range)) in results.iter().zip(records.iter().zip(&ranges)) {
        assert_eq!(&result.range, range);
        assert_eq!(result.as_bytes(), expected.as_slice());
    }

    let order = decode(results[1].as_bytes());
    assert_eq!(order.name(), "acme/orders/v1/order.proto");
    assert_eq!(order.dependency.len(), 2);
    assert_eq!(order.message_type[0].name(), "Order");
}

#[test]
fn buffer_without_marker_yields_nothing() {
    let mut blob = elf_header();
    blob.extend_from_slice(&[0x0A; 32]);
    blob.extend_from_slice(b"protobuf .prot proto");

    let mut observer = CollectingObserver::new();
    assert!(Scanner::new().locate(&blob, &mut observer).is_empty());
    assert!(observer.markers.is_empty());
}

#[test]
fn record_ends_at_out_of_range_field_number() {
    let mut blob = vec![0xFF, 0xFF];
    let start = blob.len();
    blob.extend_from_slice(&[0x0A, 0x09]);
    blob.extend_from_slice(b"foo.proto");
    blob.extend_from_slice(&[0x12, 0x03]);
    blob.extend_from_slice(b"foo");
    blob.extend_from_slice(&[0x18, 0x96, 0x01]); // field 3 varint
    blob.extend_from_slice(&[0x25, 0x01, 0x02, 0x03, 0x04]); // field 4 fixed32
    blob.extend_from_slice(&[0x29, 1, 2, 3, 4, 5, 6, 7, 8]); // field 5 fixed64
    let end = blob.len();
    // Tag for field 0
    blob.extend_from_slice(&[0x02, 0x0A, 0x0A, 0x0A]);

    let ranges = Scanner::new().locate(&blob, NullObserver);
    assert_eq!(ranges, vec![start..end]);
    assert_eq!(ranges[0].len(), end - start);
}

#[test]
fn adjacent_descriptors_are_split_at_second_name() {
    let first = descriptor("a/first.proto", "a", "First");
    let second = descriptor("b/second.proto", "b", "Second");

    let mut blob = elf_header();
    let start = blob.len();
    blob.extend_from_slice(&first);
    blob.extend_from_slice(&second);
    blob.push(0x00);

    let results = Scanner::new().scan(&blob);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].range, start..start + first.len());
    assert_eq!(
        results[1].range,
        start + first.len()..start + first.len() + second.len()
    );
    assert_eq!(decode(results[0].as_bytes()).name(), "a/first.proto");
    assert_eq!(decode(results[1].as_bytes()).name(), "b/second.proto");
}

#[test]
fn truncated_record_is_skipped_and_scan_continues() {
    let mut blob = elf_header();
    let bad_start = blob.len();
    blob.extend_from_slice(&[0x0A, 0x09]);
    blob.extend_from_slice(b"bad.proto");
    // message_type claiming 65535 bytes
    blob.extend_from_slice(&[0x22, 0xFF, 0xFF, 0x03, b'x', b'y']);

    let good = descriptor("good/ok.proto", "good", "Ok");
    let good_start = blob.len();
    blob.extend_from_slice(&good);
    blob.push(0x00);

    let mut observer = CollectingObserver::new();
    let ranges = Scanner::new().locate(&blob, &mut observer);

    assert_eq!(ranges, vec![good_start..good_start + good.len()]);
    assert_eq!(observer.records, ranges);

    let malformed: Vec<_> = observer.malformed().collect();
    assert_eq!(malformed.len(), 1);
    assert_eq!(malformed[0].start, bad_start);
    assert_eq!(malformed[0].consumed, 11);
    assert_eq!(malformed[0].source.kind, WireErrorKind::Truncated);
    assert_eq!(observer.diagnostics[0].marker, bad_start + 5);
}

#[test]
fn ten_byte_filename_resolves_to_true_tag() {
    // "abcd.proto" is 10 bytes, so its length prefix is 0x0A like the tag
    let record = descriptor("abcd.proto", "abcd", "Coincidence");
    assert_eq!(&record[..2], &[0x0A, 0x0A]);

    let (blob, ranges) = embed(&[record.clone()]);
    let results = Scanner::new().scan(&blob);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].range, ranges[0]);
    assert_eq!(decode(results[0].as_bytes()).name(), "abcd.proto");
}

#[test]
fn stray_markers_are_reported_not_fatal() {
    let mut blob = elf_header();
    blob.extend_from_slice(b"failed to load config.proto\0");
    let record = descriptor("svc/api.proto", "svc", "Request");
    let start = blob.len();
    blob.extend_from_slice(&record);
    blob.extend_from_slice(b"\0\0see api.proto for details\0");

    let mut observer = CollectingObserver::new();
    let ranges = Scanner::new().locate(&blob, &mut observer);

    assert_eq!(ranges, vec![start..start + record.len()]);
    assert_eq!(observer.markers.len(), 3);
    assert_eq!(observer.diagnostics.len(), 2);
    assert!(observer
        .diagnostics
        .iter()
        .all(|d| d.reason == DiscardReason::MissingTag));
}

#[test]
fn max_results_stops_early() {
    let records: Vec<_> = (0..4)
        .map(|i| descriptor(&format!("pkg/file_{i}.proto"), "pkg", "M"))
        .collect();
    let (blob, ranges) = embed(&records);

    let scanner = Scanner::with_config(ScannerConfig::new().max_results(3));
    let results = scanner.scan(&blob);

    assert_eq!(results.len(), 3);
    assert_eq!(results[2].range, ranges[2]);
}

#[test]
fn scanning_is_idempotent() {
    let records = vec![
        descriptor("x/one.proto", "x", "One"),
        descriptor("x/two.proto", "x", "Two"),
    ];
    let (blob, _) = embed(&records);
    let scanner = Scanner::new();

    assert_eq!(scanner.scan(&blob), scanner.scan(&blob));
}

#[test]
fn ranges_are_ordered_and_disjoint_on_noise() {
    // Deterministic noise sprinkled with markers and tag bytes
    let mut state: u32 = 0x2545_F491;
    let mut blob = Vec::with_capacity(64 * 1024);
    while blob.len() < 64 * 1024 {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        match state % 97 {
            0 => blob.extend_from_slice(b".proto"),
            1..=4 => blob.push(0x0A),
            _ => blob.push(state as u8),
        }
    }

    let ranges = Scanner::new().locate(&blob, NullObserver);

    for pair in ranges.windows(2) {
        assert!(pair[0].end <= pair[1].start);
    }
    for range in &ranges {
        assert!(!range.is_empty());
        assert!(range.end <= blob.len());
    }
    assert_eq!(ranges, Scanner::new().locate(&blob, NullObserver));
}
