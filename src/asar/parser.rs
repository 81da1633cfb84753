//! Low-level ASAR header parser.
//!
//! An archive starts with two Chromium pickles: an 8-byte size pickle that
//! holds the length of the header pickle, then the header pickle carrying the
//! JSON index as a length-prefixed string. File payloads follow the header
//! pickle, and every `offset` in the index is relative to that point.
//!
//! ## Parsing Strategy
//!
//! 1. Read the fixed 16-byte [`Prologue`]
//! 2. Decode the JSON index and classify every node as a directory or file
//! 3. Flatten the tree into [`FileEntry`] values with absolute offsets
//!
//! Node classification happens once in step 2; later stages match on
//! [`Node`] instead of inspecting JSON.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::structures::*;

/// Decode the prologue and JSON index of an archive buffer.
///
/// # Errors
///
/// Returns [`Error::MalformedIndex`] if the prologue is truncated, the
/// declared lengths do not fit in the buffer, the JSON is invalid, the
/// top-level `"files"` object is missing, or any file node lacks a valid
/// `offset` or `size`.
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    let prologue = Prologue::from_bytes(bytes)?;

    // Payloads begin right after the header pickle.
    let base_offset = PROLOGUE_WIDTH + u64::from(prologue.header_size);

    if base_offset < Prologue::SIZE as u64 {
        return Err(Error::malformed(format!(
            "header of {} bytes is shorter than its own length fields",
            prologue.header_size
        )));
    }
    if base_offset > bytes.len() as u64 {
        return Err(Error::malformed(format!(
            "header ends at byte {} but the archive is only {} bytes",
            base_offset,
            bytes.len()
        )));
    }

    // Bytes 8..16 are not trusted: the index is the first JSON value in the
    // header region, and whatever follows it is alignment padding.
    let header_end = usize::try_from(base_offset)
        .map_err(|_| Error::malformed("index size exceeds addressable memory"))?;
    let mut stream =
        serde_json::Deserializer::from_slice(&bytes[Prologue::SIZE..header_end]).into_iter::<Value>();
    let value = match stream.next() {
        Some(Ok(value)) => value,
        Some(Err(e)) => return Err(Error::malformed(format!("invalid JSON: {e}"))),
        None => return Err(Error::malformed("invalid JSON: index is empty")),
    };
    // Bounded by header_size, which is a u32.
    let json_len = stream.byte_offset() as u32;

    let files = value
        .get("files")
        .ok_or_else(|| Error::malformed("index has no top-level \"files\" object"))?;
    let root = decode_directory("", files, 1)?;

    tracing::debug!(
        header_size = prologue.header_size,
        json_len,
        base_offset,
        "decoded archive header"
    );

    Ok(Header {
        index_size: prologue.header_size,
        json_len,
        base_offset,
        root,
    })
}

/// Decode the value of a `"files"` key into its named children.
fn decode_directory(path: &str, value: &Value, depth: usize) -> Result<BTreeMap<String, Node>> {
    if depth > MAX_DEPTH {
        return Err(Error::malformed(format!(
            "{}: directories nested deeper than {MAX_DEPTH} levels",
            display_path(path)
        )));
    }

    let children = value.as_object().ok_or_else(|| {
        Error::malformed(format!("{}: \"files\" is not an object", display_path(path)))
    })?;

    children
        .iter()
        .map(|(name, child)| {
            let child_path = format!("{path}/{name}");
            // A '/' inside a name would flatten onto another node's path.
            if name.is_empty() || name.contains('/') {
                return Err(Error::malformed(format!("{child_path}: invalid file name {name:?}")));
            }
            let node = decode_node(&child_path, child, depth)?;
            Ok((name.clone(), node))
        })
        .collect()
}

fn decode_node(path: &str, value: &Value, depth: usize) -> Result<Node> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::malformed(format!("{path}: node is not an object")))?;

    if let Some(files) = object.get("files") {
        return decode_directory(path, files, depth + 1).map(Node::Directory);
    }

    Ok(Node::File(FileNode {
        offset: read_u64(object, "offset", path)?,
        size: read_u64(object, "size", path)?,
        executable: object
            .get("executable")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }))
}

/// Read an unsigned field stored either as a decimal string or a JSON integer.
///
/// `asar` writes `offset` as a string (it may exceed 2^53) and `size` as an
/// integer.
fn read_u64(object: &Map<String, Value>, key: &str, path: &str) -> Result<u64> {
    let invalid = |found: &dyn std::fmt::Display| {
        Error::malformed(format!("{path}: invalid \"{key}\" value {found}"))
    };

    match object.get(key) {
        Some(Value::String(s)) => s.parse::<u64>().map_err(|_| invalid(&format!("{s:?}"))),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| invalid(n)),
        Some(other) => Err(invalid(other)),
        None => Err(Error::malformed(format!("{path}: missing \"{key}\""))),
    }
}

/// Flatten a decoded tree into entries with absolute offsets, in pre-order.
///
/// # Errors
///
/// Returns [`Error::MalformedIndex`] if `base_offset + offset` overflows.
pub fn flatten(
    root: &BTreeMap<String, Node>,
    base_offset: u64,
    archive_id: u64,
) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    flatten_into(root, "", base_offset, archive_id, &mut entries)?;
    Ok(entries)
}

fn flatten_into(
    children: &BTreeMap<String, Node>,
    prefix: &str,
    base_offset: u64,
    archive_id: u64,
    out: &mut Vec<FileEntry>,
) -> Result<()> {
    for (name, node) in children {
        let path = format!("{prefix}/{name}");
        match node {
            Node::Directory(grandchildren) => {
                flatten_into(grandchildren, &path, base_offset, archive_id, out)?;
            }
            Node::File(file) => {
                let offset = base_offset.checked_add(file.offset).ok_or_else(|| {
                    Error::malformed(format!("{path}: offset {} overflows", file.offset))
                })?;
                out.push(FileEntry {
                    archive_id,
                    path,
                    offset,
                    size: file.size,
                    executable: file.executable,
                });
            }
        }
    }
    Ok(())
}

/// Walk `logical_path` through the directory tree.
///
/// Empty components are skipped, so `a/b`, `/a/b` and `a//b` are the same
/// path. Returns the canonical `/`-prefixed path of the file reached.
///
/// # Errors
///
/// - [`Error::PathNotFound`] naming the first component that does not resolve
/// - [`Error::NotAFile`] if the path ends at a directory
pub fn resolve_path(root: &BTreeMap<String, Node>, logical_path: &str) -> Result<String> {
    let mut children = Some(root);
    let mut current: Option<&Node> = None;
    let mut canonical = String::new();

    for component in logical_path.split('/').filter(|c| !c.is_empty()) {
        // A file has no "files" map, so nothing below it resolves.
        let node = children
            .and_then(|map| map.get(component))
            .ok_or_else(|| Error::PathNotFound {
                path: logical_path.to_string(),
                component: component.to_string(),
            })?;

        canonical.push('/');
        canonical.push_str(component);
        children = match node {
            Node::Directory(map) => Some(map),
            Node::File(_) => None,
        };
        current = Some(node);
    }

    match current {
        Some(Node::File(_)) => Ok(canonical),
        _ => Err(Error::NotAFile(display_path(logical_path).to_string())),
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_archive, sample_archive};

    fn malformed(bytes: &[u8]) -> String {
        match decode_header(bytes) {
            Err(Error::MalformedIndex(reason)) => reason,
            other => panic!("expected MalformedIndex, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_sample_header() {
        let bytes = sample_archive();
        let header = decode_header(&bytes).unwrap();

        assert_eq!(header.base_offset, u64::from(header.index_size) + PROLOGUE_WIDTH);
        assert_eq!(header.root.len(), 3);
        assert!(header.root["lib"].is_directory());
        assert_eq!(
            header.root["run.sh"],
            Node::File(FileNode {
                offset: 13,
                size: 2,
                executable: true
            })
        );
    }

    #[test]
    fn test_flatten_pre_order() {
        let bytes = sample_archive();
        let header = decode_header(&bytes).unwrap();
        let entries = flatten(&header.root, header.base_offset, 7).unwrap();

        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            ["/hello.txt", "/lib/a.js", "/lib/deep/b.bin", "/run.sh"]
        );
        assert_eq!(entries[2].offset, header.base_offset + 10);
        assert_eq!(entries[2].size, 3);
        assert!(entries.iter().all(|e| e.archive_id == 7));
    }

    #[test]
    fn test_paths_preserve_case_and_bytes() {
        let bytes = build_archive(
            r#"{"files":{"Dir Name":{"files":{"Ünïcode.TXT":{"offset":"0","size":0}}}}}"#,
            b"",
        );
        let header = decode_header(&bytes).unwrap();
        let entries = flatten(&header.root, header.base_offset, 0).unwrap();
        assert_eq!(entries[0].path, "/Dir Name/Ünïcode.TXT");
    }

    #[test]
    fn test_integer_offset_and_string_size() {
        let bytes = build_archive(r#"{"files":{"a":{"offset":2,"size":"3"}}}"#, b"xxabc");
        let header = decode_header(&bytes).unwrap();
        assert_eq!(
            header.root["a"],
            Node::File(FileNode {
                offset: 2,
                size: 3,
                executable: false
            })
        );
    }

    #[test]
    fn test_truncated_prologue() {
        let bytes = sample_archive();
        malformed(&bytes[..10]);
    }

    #[test]
    fn test_index_length_past_end() {
        let mut bytes = build_archive(r#"{"files":{}}"#, b"");
        bytes[4..8].copy_from_slice(&1000u32.to_le_bytes());
        assert!(malformed(&bytes).contains("only"));
    }

    #[test]
    fn test_header_shorter_than_length_fields() {
        let mut bytes = build_archive(r#"{"files":{}}"#, b"");
        bytes[4..8].copy_from_slice(&4u32.to_le_bytes());
        assert!(malformed(&bytes).contains("shorter than its own length fields"));
    }

    #[test]
    fn test_reserved_prologue_bytes_ignored() {
        let mut bytes = build_archive(r#"{"files":{"a":{"offset":"1","size":2}}}"#, b"xyz");
        bytes[0..4].fill(0);
        bytes[8..16].fill(0);

        let header = decode_header(&bytes).unwrap();
        let entries = flatten(&header.root, header.base_offset, 0).unwrap();
        assert_eq!(header.json_len as usize, r#"{"files":{"a":{"offset":"1","size":2}}}"#.len());
        assert_eq!(entries[0].offset, header.base_offset + 1);
    }

    #[test]
    fn test_index_ignores_trailing_padding() {
        // 12-byte index in a 20-byte header region leaves 8 bytes of zeros.
        let mut bytes = build_archive(r#"{"files":{}}"#, b"");
        bytes[4..8].copy_from_slice(&28u32.to_le_bytes());
        bytes.extend_from_slice(&[0; 8]);

        let header = decode_header(&bytes).unwrap();
        assert_eq!(header.json_len, 12);
        assert_eq!(header.base_offset, 36);
    }

    #[test]
    fn test_empty_index_region() {
        let mut bytes = vec![0u8; 16];
        bytes[4..8].copy_from_slice(&8u32.to_le_bytes());
        assert!(malformed(&bytes).starts_with("invalid JSON"));
    }

    #[test]
    fn test_invalid_json() {
        let bytes = build_archive(r#"{"files":{"a":"#, b"");
        assert!(malformed(&bytes).starts_with("invalid JSON"));
    }

    #[test]
    fn test_missing_files_key() {
        let bytes = build_archive(r#"{"entries":{}}"#, b"");
        assert!(malformed(&bytes).contains("\"files\""));
    }

    #[test]
    fn test_files_not_an_object() {
        let bytes = build_archive(r#"{"files":[1,2]}"#, b"");
        malformed(&bytes);
    }

    #[test]
    fn test_leaf_missing_offset() {
        let bytes = build_archive(r#"{"files":{"d":{"files":{"x":{"size":1}}}}}"#, b"a");
        let reason = malformed(&bytes);
        assert!(reason.contains("/d/x"));
        assert!(reason.contains("offset"));
    }

    #[test]
    fn test_leaf_missing_size() {
        let bytes = build_archive(r#"{"files":{"x":{"offset":"0"}}}"#, b"a");
        assert!(malformed(&bytes).contains("size"));
    }

    #[test]
    fn test_leaf_bad_numbers() {
        for index in [
            r#"{"files":{"x":{"offset":"-1","size":1}}}"#,
            r#"{"files":{"x":{"offset":"ten","size":1}}}"#,
            r#"{"files":{"x":{"offset":"0","size":1.5}}}"#,
            r#"{"files":{"x":{"offset":"0","size":-4}}}"#,
            r#"{"files":{"x":{"offset":null,"size":1}}}"#,
        ] {
            malformed(&build_archive(index, b"a"));
        }
    }

    #[test]
    fn test_names_that_collide_when_flattened() {
        let bytes = build_archive(
            r#"{"files":{
                "a/b":{"offset":"0","size":1},
                "a":{"files":{"b":{"offset":"1","size":1}}}
            }}"#,
            b"xy",
        );
        assert!(malformed(&bytes).contains("\"a/b\""));
    }

    #[test]
    fn test_empty_name() {
        let bytes = build_archive(r#"{"files":{"d":{"files":{"":{"offset":"0","size":1}}}}}"#, b"x");
        assert!(malformed(&bytes).contains("/d/"));
    }

    #[test]
    fn test_unpacked_leaf_is_malformed() {
        let bytes = build_archive(r#"{"files":{"x.node":{"size":10,"unpacked":true}}}"#, b"");
        malformed(&bytes);
    }

    #[test]
    fn test_depth_limit() {
        let mut index = String::from(r#"{"files":"#);
        for _ in 0..MAX_DEPTH {
            index.push_str(r#"{"d":{"files":"#);
        }
        index.push_str("{}");
        for _ in 0..MAX_DEPTH {
            index.push_str("}}");
        }
        index.push('}');

        let bytes = build_archive(&index, b"");
        assert!(malformed(&bytes).contains("nested deeper"));
    }

    #[test]
    fn test_offset_overflow() {
        let bytes = build_archive(
            r#"{"files":{"x":{"offset":"18446744073709551615","size":1}}}"#,
            b"",
        );
        let header = decode_header(&bytes).unwrap();
        let err = flatten(&header.root, header.base_offset, 0).unwrap_err();
        assert!(matches!(err, Error::MalformedIndex(_)));
    }

    #[test]
    fn test_resolve_path() {
        let header = decode_header(&sample_archive()).unwrap();

        assert_eq!(resolve_path(&header.root, "lib/deep/b.bin").unwrap(), "/lib/deep/b.bin");
        assert_eq!(resolve_path(&header.root, "/lib//a.js").unwrap(), "/lib/a.js");
    }

    #[test]
    fn test_resolve_missing_component() {
        let header = decode_header(&sample_archive()).unwrap();

        match resolve_path(&header.root, "/lib/deep/missing.txt") {
            Err(Error::PathNotFound { component, .. }) => assert_eq!(component, "missing.txt"),
            other => panic!("expected PathNotFound, got {other:?}"),
        }
        match resolve_path(&header.root, "/nope/a.js") {
            Err(Error::PathNotFound { component, .. }) => assert_eq!(component, "nope"),
            other => panic!("expected PathNotFound, got {other:?}"),
        }
        match resolve_path(&header.root, "/hello.txt/inner") {
            Err(Error::PathNotFound { component, .. }) => assert_eq!(component, "inner"),
            other => panic!("expected PathNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_directory() {
        let header = decode_header(&sample_archive()).unwrap();

        assert!(matches!(resolve_path(&header.root, "/lib"), Err(Error::NotAFile(_))));
        assert!(matches!(resolve_path(&header.root, "/"), Err(Error::NotAFile(_))));
    }
}
