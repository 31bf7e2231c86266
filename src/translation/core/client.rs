//! 批量翻译接口客户端
//!
//! 每个批次发送一次 `POST {"texts": [...]}`，响应数组与请求按位置一一对应。
//! 客户端不做重试；每次请求受单批次超时约束。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::translation::config::TranslationConfig;
use crate::translation::error::{TranslationError, TranslationResult};

/// 单条翻译结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationItem {
    /// 纯文本，直接写入文本节点
    Plain(String),
    /// HTML片段，解析后替换文本节点
    HtmlFragment(String),
}

impl TranslationItem {
    pub fn content(&self) -> &str {
        match self {
            TranslationItem::Plain(content) | TranslationItem::HtmlFragment(content) => content,
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, TranslationItem::HtmlFragment(_))
    }
}

/// 请求体
#[derive(Debug, Serialize)]
pub struct TranslateRequest<'a> {
    pub texts: &'a [String],
}

/// 响应体
#[derive(Debug, Deserialize)]
pub struct TranslateResponse {
    #[serde(default, alias = "translated_texts")]
    pub translations: Option<Vec<WireItem>>,
}

/// 响应数组元素：裸字符串或带类型的对象
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireItem {
    Bare(String),
    Typed {
        #[serde(rename = "type")]
        kind: WireKind,
        content: String,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireKind {
    Plain,
    Html,
}

impl From<WireItem> for TranslationItem {
    fn from(item: WireItem) -> Self {
        match item {
            // 裸字符串含有标记或实体时按HTML处理
            WireItem::Bare(content) if content.contains('<') || content.contains('&') => {
                TranslationItem::HtmlFragment(content)
            }
            WireItem::Bare(content) => TranslationItem::Plain(content),
            WireItem::Typed {
                kind: WireKind::Plain,
                content,
            } => TranslationItem::Plain(content),
            WireItem::Typed {
                kind: WireKind::Html,
                content,
            } => TranslationItem::HtmlFragment(content),
        }
    }
}

impl TranslateResponse {
    /// 校验长度并转换为翻译结果
    pub fn into_items(self, expected: usize) -> TranslationResult<Vec<TranslationItem>> {
        let items = self.translations.ok_or(TranslationError::ResponseMismatch {
            expected,
            actual: 0,
        })?;
        if items.len() != expected {
            return Err(TranslationError::ResponseMismatch {
                expected,
                actual: items.len(),
            });
        }
        Ok(items.into_iter().map(TranslationItem::from).collect())
    }
}

/// 批量翻译能力
///
/// 实现方只负责一次请求/响应交换，批次的拆分、并发和DOM更新由流水线处理。
#[allow(async_fn_in_trait)]
pub trait BatchTranslator {
    async fn translate_batch(&self, texts: &[String]) -> TranslationResult<Vec<TranslationItem>>;
}

/// 基于 reqwest 的HTTP实现
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    client: reqwest::Client,
    api_url: String,
    request_timeout: Duration,
}

impl HttpTranslator {
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("HTTP客户端创建失败: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            request_timeout: config.request_timeout,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn exchange(&self, texts: &[String]) -> TranslationResult<Vec<TranslationItem>> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&TranslateRequest { texts })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslationError::TransportError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        let parsed: TranslateResponse = serde_json::from_slice(&body)?;
        parsed.into_items(texts.len())
    }
}

impl BatchTranslator for HttpTranslator {
    async fn translate_batch(&self, texts: &[String]) -> TranslationResult<Vec<TranslationItem>> {
        tracing::debug!("发送翻译请求到 {}: {} 项", self.api_url, texts.len());
        tokio::time::timeout(self.request_timeout, self.exchange(texts)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str, expected: usize) -> TranslationResult<Vec<TranslationItem>> {
        serde_json::from_str::<TranslateResponse>(json)
            .unwrap()
            .into_items(expected)
    }

    #[test]
    fn typed_items_are_decoded() {
        let items = parse(
            r#"{"translations":[{"type":"plain","content":"Bonjour"},{"type":"html","content":"<b>Monde</b>"}]}"#,
            2,
        )
        .unwrap();
        assert_eq!(
            items,
            vec![
                TranslationItem::Plain("Bonjour".to_string()),
                TranslationItem::HtmlFragment("<b>Monde</b>".to_string()),
            ]
        );
    }

    #[test]
    fn legacy_field_and_bare_strings_are_accepted() {
        let items = parse(r#"{"translated_texts":["Bonjour","<i>Monde</i>","A &amp; B"]}"#, 3).unwrap();
        assert_eq!(items[0], TranslationItem::Plain("Bonjour".to_string()));
        assert!(items[1].is_html());
        assert!(items[2].is_html());
        assert_eq!(items[2].content(), "A &amp; B");
    }

    #[test]
    fn missing_or_short_array_is_a_mismatch() {
        assert!(matches!(
            parse(r#"{"error":"nope"}"#, 2),
            Err(TranslationError::ResponseMismatch {
                expected: 2,
                actual: 0
            })
        ));
        assert!(matches!(
            parse(r#"{"translations":["x"]}"#, 2),
            Err(TranslationError::ResponseMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    /// 裸字符串写回后的文本与按 innerHTML 解析的结果一致
    #[test]
    fn bare_strings_apply_like_inner_html() {
        use crate::parsers::html::{find_nodes, html_to_dom};
        use crate::translation::core::engine::{apply_batch, NoopDecorationHook};
        use crate::translation::pipeline::{locate_text_leaves, split_into_batches};
        use crate::translation::tree::{DomTree, RcDomTree};

        let cases = [
            ("a < b", true, "a < b"),
            ("a & b", true, "a & b"),
            ("Tom &amp; Jerry", true, "Tom & Jerry"),
            ("x > y", false, "x > y"),
        ];
        for (bare, is_html, expected) in cases {
            let json = serde_json::json!({ "translations": [bare] }).to_string();
            let items = parse(&json, 1).unwrap();
            assert_eq!(items[0].is_html(), is_html, "{}", bare);

            let dom = html_to_dom(b"<p>original</p>", "utf-8");
            let leaves = locate_text_leaves(&RcDomTree, &dom.document, &TranslationConfig::default());
            let batch = split_into_batches(leaves, 1).remove(0);
            apply_batch(&RcDomTree, &batch, items, &NoopDecorationHook).unwrap();

            let p = find_nodes(&dom.document, &["html", "body", "p"]).remove(0);
            let text: String = RcDomTree
                .children(&p)
                .iter()
                .filter_map(|child| RcDomTree.text(child))
                .collect();
            assert_eq!(text, expected, "{}", bare);
        }
    }

    #[test]
    fn request_body_shape() {
        let texts = vec!["Hello".to_string(), "World".to_string()];
        let body = serde_json::to_value(TranslateRequest { texts: &texts }).unwrap();
        assert_eq!(body, serde_json::json!({"texts": ["Hello", "World"]}));
    }
}
