// 集成测试公共模块
//
// 提供HTML夹具、DOM辅助函数、假翻译客户端和本地模拟翻译接口

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use markup5ever_rcdom::{Handle, RcDom};
use serde::Deserialize;

use page_translator::parsers::html::parse_fragment_nodes;
use page_translator::parsers::{html_to_dom, serialize_document};
use page_translator::translation::{
    BatchTranslator, TranslationConfig, TranslationItem, TranslationResult,
};

/// HTML测试辅助
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    pub fn dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8")
    }

    pub fn render(dom: &RcDom) -> String {
        String::from_utf8(serialize_document(&dom.document, "utf-8").unwrap()).unwrap()
    }

    /// 模拟页面脚本在 `parent` 末尾追加内容
    pub fn append_html(parent: &Handle, html: &str) {
        for node in parse_fragment_nodes(html) {
            node.parent.set(Some(Rc::downgrade(parent)));
            parent.children.borrow_mut().push(node);
        }
    }

    pub fn hello_world_page() -> &'static str {
        "<html><head><title>Greeting</title></head><body><p>Hello</p><p>World</p></body></html>"
    }

    pub fn mixed_page() -> &'static str {
        r#"<html><body>
            <h1>Welcome</h1>
            <p>First paragraph</p>
            <script>var greeting = "Hello";</script>
            <style>p { color: red; }</style>
            <pre>let x = 1;</pre>
            <code>fn main() {}</code>
            <textarea>draft</textarea>
            <div><span>Nested text</span></div>
            <p>   </p>
            <p>Last paragraph</p>
        </body></html>"#
    }

    /// 生成包含 `count` 个段落的页面
    pub fn paragraphs(count: usize) -> String {
        let body: String = (0..count).map(|i| format!("<p>Text {}</p>", i)).collect();
        format!("<html><body>{}</body></html>", body)
    }
}

pub fn test_config(api_url: &str, batch_size: usize, max_concurrent_requests: usize) -> TranslationConfig {
    TranslationConfig {
        api_url: api_url.to_string(),
        batch_size,
        max_concurrent_requests,
        request_timeout: Duration::from_secs(5),
        ..TranslationConfig::default()
    }
}

fn dictionary() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("Hello", "Bonjour"),
        ("World", "Monde"),
        ("Welcome", "Bienvenue"),
    ])
}

/// 查表翻译，未知文本加上 `[fr] ` 前缀
pub fn translate_text(text: &str) -> String {
    match dictionary().get(text) {
        Some(translated) => translated.to_string(),
        None => format!("[fr] {}", text),
    }
}

/// 进程内的假翻译客户端
#[derive(Default)]
pub struct DictionaryTranslator {
    pub requests: RefCell<Vec<Vec<String>>>,
    pub in_flight: Cell<usize>,
    pub peak_in_flight: Cell<usize>,
    pub delay: Option<Duration>,
    /// 这些批次（按请求序号）返回少一项的结果
    pub short_batches: Vec<usize>,
}

impl BatchTranslator for DictionaryTranslator {
    async fn translate_batch(&self, texts: &[String]) -> TranslationResult<Vec<TranslationItem>> {
        let request_no = {
            let mut requests = self.requests.borrow_mut();
            requests.push(texts.to_vec());
            requests.len() - 1
        };
        self.in_flight.set(self.in_flight.get() + 1);
        self.peak_in_flight
            .set(self.peak_in_flight.get().max(self.in_flight.get()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.set(self.in_flight.get() - 1);

        let mut items: Vec<TranslationItem> = texts
            .iter()
            .map(|text| TranslationItem::Plain(translate_text(text)))
            .collect();
        if self.short_batches.contains(&request_no) {
            items.pop();
        }
        Ok(items)
    }
}

/// 模拟接口的响应方式
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// 按字典翻译，返回 `{"type":"plain"}` 项
    Dictionary,
    /// 以旧字段名返回裸字符串
    LegacyStrings,
    /// 把每个文本包成 `<b>` HTML片段
    Html,
    /// 少返回一项
    Truncated,
    /// 返回指定状态码
    Status(u16),
    /// 原样返回此响应体
    RawBody(&'static str),
}

#[derive(Debug, Deserialize)]
struct RequestBody {
    texts: Vec<String>,
}

pub struct MockState {
    behavior: MockBehavior,
    delay: Duration,
    requests: Mutex<Vec<Vec<String>>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// 绑定在 127.0.0.1 随机端口上的模拟翻译接口
pub struct MockEndpoint {
    pub url: String,
    state: Arc<MockState>,
}

impl MockEndpoint {
    pub async fn start(behavior: MockBehavior) -> Self {
        Self::start_with_delay(behavior, Duration::ZERO).await
    }

    pub async fn start_with_delay(behavior: MockBehavior, delay: Duration) -> Self {
        let state = Arc::new(MockState {
            behavior,
            delay,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/api/translate", post(translate_handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}/api/translate", addr),
            state,
        }
    }

    pub fn requests(&self) -> Vec<Vec<String>> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.state.peak_in_flight.load(Ordering::SeqCst)
    }
}

async fn translate_handler(
    State(state): State<Arc<MockState>>,
    Json(body): Json<RequestBody>,
) -> Response {
    state.requests.lock().unwrap().push(body.texts.clone());
    let current = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.peak_in_flight.fetch_max(current, Ordering::SeqCst);

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    state.in_flight.fetch_sub(1, Ordering::SeqCst);

    match &state.behavior {
        MockBehavior::Dictionary => {
            let items: Vec<_> = body
                .texts
                .iter()
                .map(|text| serde_json::json!({"type": "plain", "content": translate_text(text)}))
                .collect();
            Json(serde_json::json!({ "translations": items })).into_response()
        }
        MockBehavior::LegacyStrings => {
            let items: Vec<String> = body.texts.iter().map(|text| translate_text(text)).collect();
            Json(serde_json::json!({ "translated_texts": items })).into_response()
        }
        MockBehavior::Html => {
            let items: Vec<_> = body
                .texts
                .iter()
                .map(|text| {
                    serde_json::json!({
                        "type": "html",
                        "content": format!("<b title=\"term\">{}</b>", translate_text(text))
                    })
                })
                .collect();
            Json(serde_json::json!({ "translations": items })).into_response()
        }
        MockBehavior::Truncated => {
            let mut items: Vec<String> = body.texts.iter().map(|text| translate_text(text)).collect();
            items.pop();
            Json(serde_json::json!({ "translations": items })).into_response()
        }
        MockBehavior::Status(code) => {
            let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, "mock failure").into_response()
        }
        MockBehavior::RawBody(raw) => (StatusCode::OK, *raw).into_response(),
    }
}
