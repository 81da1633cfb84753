//! Archive builders shared by the unit tests in `src/` and the integration
//! tests in this directory.

use byteorder::{LittleEndian, WriteBytesExt};

/// Assemble an archive from raw index text and payload bytes, laid out the
/// way `asar pack` writes it.
pub fn build_archive(index: &str, payload: &[u8]) -> Vec<u8> {
    let json = index.as_bytes();
    let padded = json.len().div_ceil(4) * 4;
    let header_size = (8 + padded) as u32;

    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(4).unwrap();
    out.write_u32::<LittleEndian>(header_size).unwrap();
    out.write_u32::<LittleEndian>(header_size - 4).unwrap();
    out.write_u32::<LittleEndian>(json.len() as u32).unwrap();
    out.extend_from_slice(json);
    out.resize(16 + padded, 0);
    out.extend_from_slice(payload);
    out
}

/// Index and payload with a nested tree:
///
/// ```text
/// /hello.txt        "world"
/// /lib/a.js         "alpha"
/// /lib/deep/b.bin   [0, 1, 2]
/// /run.sh           "#!"      (executable)
/// ```
pub fn sample_archive() -> Vec<u8> {
    let index = r#"{"files":{
        "hello.txt":{"offset":"0","size":5},
        "lib":{"files":{
            "a.js":{"offset":"5","size":5},
            "deep":{"files":{"b.bin":{"offset":"10","size":3}}}
        }},
        "run.sh":{"offset":"13","size":2,"executable":true}
    }}"#;
    let mut payload = b"worldalpha".to_vec();
    payload.extend_from_slice(&[0, 1, 2]);
    payload.extend_from_slice(b"#!");
    build_archive(index, &payload)
}
