//! Minimal writer for binary glTF 2.0 containers.

use serde_json::{Value, json};

const MAGIC: u32 = 0x4654_6C67; // "glTF"
const VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Encode a GLB file consisting of a single JSON chunk.
pub fn encode_json_only(document: &Value) -> Vec<u8> {
    let mut chunk = document.to_string().into_bytes();
    // JSON chunks are padded with spaces to a 4-byte boundary.
    while chunk.len() % 4 != 0 {
        chunk.push(b' ');
    }

    let total = HEADER_LEN + CHUNK_HEADER_LEN + chunk.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&MAGIC.to_le_bytes());
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&chunk);
    out
}

/// An empty but valid scene.
pub fn minimal_scene() -> Vec<u8> {
    encode_json_only(&json!({
        "asset": { "version": "2.0", "generator": "modelvault reference engine" },
        "scene": 0,
        "scenes": [{ "nodes": [] }],
    }))
}

/// Check the GLB header: magic, version 2, and a length field matching the buffer.
pub fn is_glb(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_LEN {
        return false;
    }
    let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    word(0) == MAGIC && word(4) == VERSION && word(8) as usize == bytes.len()
}
