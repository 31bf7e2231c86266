use encoding_rs::Encoding;
use markup5ever_rcdom::RcDom;

use crate::parsers::html::{get_charset, html_to_dom, serialize_document};
use crate::translation::{
    BatchTranslator, DecorationHook, RunStats, TranslationResult, TranslationService,
};

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

/// 文档处理选项
#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    /// 强制使用的输入编码；未指定时读取 `<meta charset>`，否则按 UTF-8
    pub encoding: Option<String>,
    /// 不输出提示信息
    pub silent: bool,
}

/// 编码处理器
pub struct EncodingProcessor;

impl EncodingProcessor {
    pub fn new() -> Self {
        Self
    }

    /// 解析文档并确定其编码
    ///
    /// 显式指定的有效编码优先；其次是文档声明的编码；最后回退到 UTF-8。
    pub fn process_encoding(&self, input_data: &[u8], input_encoding: Option<&str>) -> (RcDom, String) {
        if let Some(label) = input_encoding {
            if let Some(encoding) = Encoding::for_label_no_replacement(label.as_bytes()) {
                let name = encoding.name().to_string();
                return (html_to_dom(input_data, &name), name);
            }
            tracing::warn!("忽略无法识别的编码: {}", label);
        }

        let mut document_encoding = "utf-8".to_string();
        let mut dom = html_to_dom(input_data, &document_encoding);

        if let Some(html_charset) = get_charset(&dom.document) {
            if let Some(document_charset) = Encoding::for_label_no_replacement(html_charset.as_bytes()) {
                if document_charset != encoding_rs::UTF_8 {
                    document_encoding = document_charset.name().to_string();
                    dom = html_to_dom(input_data, &document_encoding);
                }
            }
        }

        (dom, document_encoding)
    }
}

impl Default for EncodingProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// 翻译一个完整的HTML文档
///
/// 返回以原编码序列化的文档和本次运行的统计。
pub async fn translate_document<C, H>(
    service: &TranslationService<C, H>,
    input_data: &[u8],
    options: &DocumentOptions,
) -> TranslationResult<(Vec<u8>, RunStats)>
where
    C: BatchTranslator,
    H: DecorationHook,
{
    let (dom, document_encoding) =
        EncodingProcessor::new().process_encoding(input_data, options.encoding.as_deref());
    tracing::debug!("文档编码: {}", document_encoding);

    let stats = service.translate_dom(&dom).await?;
    let output = serialize_document(&dom.document, &document_encoding)?;

    Ok((output, stats))
}

/// Prints an error message to stderr
pub fn print_error_message(msg: &str) {
    eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
}

/// Prints an info message to stderr, keeping stdout for the document
pub fn print_info_message(msg: &str) {
    eprintln!("{msg}");
}
