//! 触发消息
//!
//! 宿主（扩展弹窗、命令行等）通过 `{"action": "translate"}` 请求翻译当前页面，
//! 得到 `{"status": "success"}` 或 `{"status": "error", "message": ...}`。
//! 批次级失败不影响回复状态。

use serde::{Deserialize, Serialize};

use crate::translation::core::client::BatchTranslator;
use crate::translation::core::engine::DecorationHook;
use crate::translation::core::service::{RunStats, TranslationService};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::tree::DomTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TriggerAction {
    #[serde(rename = "translate", alias = "TRANSLATE_PAGE")]
    Translate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TriggerMessage {
    pub action: TriggerAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TriggerReply {
    Success,
    Error { message: String },
}

impl From<&TranslationResult<RunStats>> for TriggerReply {
    fn from(result: &TranslationResult<RunStats>) -> Self {
        match result {
            Ok(_) => TriggerReply::Success,
            Err(error) => TriggerReply::Error {
                message: error.to_string(),
            },
        }
    }
}

/// 解析触发消息，未知动作或格式错误返回 `InvalidTrigger`
pub fn parse_trigger(raw: &str) -> TranslationResult<TriggerMessage> {
    serde_json::from_str(raw).map_err(|e| TranslationError::InvalidTrigger(e.to_string()))
}

/// 处理一条原始触发消息并返回回复
pub async fn handle_trigger<C, H, T>(
    service: &TranslationService<C, H>,
    tree: &T,
    root: &T::Node,
    raw: &str,
) -> TriggerReply
where
    C: BatchTranslator,
    H: DecorationHook,
    T: DomTree,
{
    let message = match parse_trigger(raw) {
        Ok(message) => message,
        Err(error) => {
            tracing::warn!("忽略无效的触发消息: {}", error);
            return TriggerReply::Error {
                message: error.to_string(),
            };
        }
    };

    match message.action {
        TriggerAction::Translate => {
            tracing::info!("收到翻译请求");
            TriggerReply::from(&service.run(tree, root).await)
        }
    }
}
