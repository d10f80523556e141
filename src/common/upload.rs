use std::path::Path;
use std::sync::Arc;

/// Raw image bytes handed over by the upload layer together with what the
/// client declared about them. The bytes are shared, so every stage can
/// decode the same payload again without copying or rewinding anything.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    filename: String,
    declared_len: u64,
    bytes: Arc<[u8]>,
}

impl ImageUpload {
    pub fn new(
        filename: impl Into<String>,
        declared_len: u64,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            declared_len,
            bytes: bytes.into(),
        }
    }

    /// Uses the actual payload length as the declared length.
    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let declared_len = bytes.len() as u64;
        Self::new(filename, declared_len, bytes)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn declared_len(&self) -> u64 {
        self.declared_len
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lower-cased extension of the declared filename, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloning_upload_shares_byte_buffer() {
        let u1 = ImageUpload::from_bytes("shirt.png", vec![1, 2, 3]);
        let u2 = u1.clone();
        assert!(Arc::ptr_eq(&u1.bytes, &u2.bytes));
        assert_eq!(u2.declared_len(), 3);
    }

    #[test]
    fn extension_is_lower_cased() {
        let upload = ImageUpload::from_bytes("Photo.JPEG", vec![]);
        assert_eq!(upload.extension().as_deref(), Some("jpeg"));
        assert_eq!(ImageUpload::from_bytes("noext", vec![]).extension(), None);
    }
}
