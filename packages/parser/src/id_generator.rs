use crc32fast::Hasher;

fn crc_hex(value: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn file_url(path: &str) -> String {
    if path.starts_with("file://") {
        path.to_string()
    } else {
        format!("file://{}", path)
    }
}

/// Generate a file address from its absolute path using CRC32
pub fn get_document_id(path: &str) -> String {
    crc_hex(&file_url(path))
}

/// Generate a component address from its declaring file and name
pub fn get_component_id(path: &str, name: &str) -> String {
    crc_hex(&format!("{}#{}", file_url(path), name))
}
