use encoding_rs::Encoding;
use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{Handle, SerializableHandle};

use crate::translation::error::TranslationResult;

/// 序列化文档
///
/// `document_encoding` 非空且可识别时，按该编码输出字节。
pub fn serialize_document(document: &Handle, document_encoding: &str) -> TranslationResult<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = document.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default())?;

    if !document_encoding.is_empty() {
        if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
            if encoding != encoding_rs::UTF_8 {
                let s: &str = &String::from_utf8_lossy(&buf);
                let (data, _, _) = encoding.encode(s);
                buf = data.to_vec();
            }
        }
    }

    Ok(buf)
}
