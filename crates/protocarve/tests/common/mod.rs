//! Shared fixtures: real `FileDescriptorProto` encodings embedded in
//! binary-looking padding.

#![allow(dead_code)]

use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};

/// Encodes a small but realistic descriptor
pub fn descriptor(name: &str, package: &str, message: &str) -> Vec<u8> {
    descriptor_with_deps(name, package, message, &[])
}

/// Encodes a descriptor that imports `deps`
pub fn descriptor_with_deps(name: &str, package: &str, message: &str, deps: &[&str]) -> Vec<u8> {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: Some(package.to_string()),
        dependency: deps.iter().map(|d| d.to_string()).collect(),
        message_type: vec![DescriptorProto {
            name: Some(message.to_string()),
            field: vec![
                FieldDescriptorProto {
                    name: Some("id".to_string()),
                    number: Some(1),
                    label: Some(Label::Optional as i32),
                    r#type: Some(Type::Uint64 as i32),
                    json_name: Some("id".to_string()),
                    ..Default::default()
                },
                FieldDescriptorProto {
                    name: Some("display_name".to_string()),
                    number: Some(2),
                    label: Some(Label::Optional as i32),
                    r#type: Some(Type::String as i32),
                    json_name: Some("displayName".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
    .encode_to_vec()
}

/// Decodes an extracted record back into a descriptor
pub fn decode(bytes: &[u8]) -> FileDescriptorProto {
    FileDescriptorProto::decode(bytes).expect("record should decode as FileDescriptorProto")
}

/// Something shaped like the start of an ELF image, free of `0x0A` bytes
pub fn elf_header() -> Vec<u8> {
    let mut out = b"\x7fELF\x02\x01\x01".to_vec();
    out.resize(64, 0);
    out
}

/// Lays out `records` with zero padding and returns the blob and each
/// record's range
pub fn embed(records: &[Vec<u8>]) -> (Vec<u8>, Vec<std::ops::Range<usize>>) {
    let mut blob = elf_header();
    blob.extend_from_slice(b"GCC: (GNU) 13.2.0\0");
    let mut ranges = Vec::new();

    for record in records {
        blob.extend_from_slice(&[0u8; 16]);
        let start = blob.len();
        blob.extend_from_slice(record);
        ranges.push(start..blob.len());
    }

    blob.extend_from_slice(&[0u8; 32]);
    (blob, ranges)
}
