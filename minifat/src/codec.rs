//! 二进制编解码，纯函数，不做I/O。

use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

use crate::config::{CLUSTER_SIZE, ENTRY_SIZE};
use crate::{Block, EntryRecord, Error, Result};

pub fn encode_i32_le(n: i32) -> [u8; 4] {
    n.to_le_bytes()
}

pub fn decode_i32_le(bytes: [u8; 4]) -> i32 {
    i32::from_le_bytes(bytes)
}

pub fn encode_i32_array(ints: &[i32]) -> Vec<u8> {
    ints.iter().flat_map(|&n| encode_i32_le(n)).collect()
}

/// 末尾不足4字节的部分被忽略
pub fn decode_i32_array(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|b| decode_i32_le([b[0], b[1], b[2], b[3]]))
        .collect()
}

pub fn encode_entry(entry: &EntryRecord) -> Result<[u8; ENTRY_SIZE]> {
    let mut buf = [0; ENTRY_SIZE];
    entry.write(&mut Cursor::new(buf.as_mut_slice()))?;
    Ok(buf)
}

pub fn decode_entry(bytes: &[u8; ENTRY_SIZE]) -> Result<EntryRecord> {
    Ok(EntryRecord::read(&mut Cursor::new(bytes.as_slice()))?)
}

pub fn encode_entries(entries: &[EntryRecord]) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(entries.len() * ENTRY_SIZE);
    for entry in entries {
        bytes.extend_from_slice(&encode_entry(entry)?);
    }
    Ok(bytes)
}

/// 逐条解码，遇到终止符即停止，其后的字节一概不看
pub fn decode_entries(bytes: &[u8]) -> Result<Vec<EntryRecord>> {
    let mut entries = Vec::with_capacity(bytes.len() / ENTRY_SIZE);
    for chunk in bytes.chunks_exact(ENTRY_SIZE) {
        let mut raw = [0; ENTRY_SIZE];
        raw.copy_from_slice(chunk);
        let entry = decode_entry(&raw)?;
        if entry.is_terminator() {
            break;
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// 按块切分，最后一块以0补齐。空输入不产生任何块。
pub fn chunk(bytes: &[u8]) -> Vec<Block> {
    bytes
        .chunks(CLUSTER_SIZE)
        .map(|piece| {
            let mut block = [0; CLUSTER_SIZE];
            block[..piece.len()].copy_from_slice(piece);
            block
        })
        .collect()
}

/// 以`\0`结尾的字节串
pub fn encode_string(s: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(s.len() + 1);
    bytes.extend_from_slice(s.as_bytes());
    bytes.push(b'\0');
    bytes
}

/// 读到第一个`\0`为止；没有`\0`时取全部字节
pub fn decode_string(bytes: &[u8]) -> Result<String> {
    let end = bytes.iter().position(|&b| b == b'\0').unwrap_or(bytes.len());
    String::from_utf8(bytes[..end].to_vec())
        .map_err(|e| Error::Corrupt(format!("string is not UTF-8: {e}")))
}
