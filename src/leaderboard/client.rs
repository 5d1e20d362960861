use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::{parse_leaders, LeaderEntry, LeaderboardError, ScoreSubmission};

fn network_error(value: JsValue) -> LeaderboardError {
    LeaderboardError::NetworkError {
        message: value.as_string().unwrap_or_else(|| format!("{value:?}")),
    }
}

/// 通过浏览器 `fetch` 访问排行榜服务。
#[derive(Debug, Clone)]
pub struct LeaderboardClient {
    url: String,
}

impl LeaderboardClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch_leaders(&self) -> Result<Vec<LeaderEntry>, LeaderboardError> {
        let init = RequestInit::new();
        init.set_method("GET");
        let body = self.send(&init).await?;
        parse_leaders(&body)
    }

    /// 提交成绩并返回更新后的排行榜。
    pub async fn submit_score(
        &self,
        submission: &ScoreSubmission,
    ) -> Result<Vec<LeaderEntry>, LeaderboardError> {
        let payload =
            serde_json::to_string(submission).map_err(|error| LeaderboardError::NetworkError {
                message: error.to_string(),
            })?;
        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&JsValue::from_str(&payload));
        let body = self.send(&init).await?;
        parse_leaders(&body)
    }

    async fn send(&self, init: &RequestInit) -> Result<String, LeaderboardError> {
        let result = self.send_inner(init).await;
        if let Err(error) = &result {
            log::warn!(target: "leaderboard", "{} {}", self.url, error);
        }
        result
    }

    async fn send_inner(&self, init: &RequestInit) -> Result<String, LeaderboardError> {
        let request = Request::new_with_str_and_init(&self.url, init).map_err(network_error)?;
        let window = web_sys::window().ok_or_else(|| LeaderboardError::NetworkError {
            message: "no browser window available".into(),
        })?;

        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(network_error)?;
        let response: Response = response.dyn_into().map_err(network_error)?;
        if !response.ok() {
            return Err(LeaderboardError::NetworkError {
                message: format!("server responded with status {}", response.status()),
            });
        }

        let text = JsFuture::from(response.text().map_err(network_error)?)
            .await
            .map_err(network_error)?;
        text.as_string()
            .ok_or_else(|| LeaderboardError::MalformedResponse {
                message: "response body is not text".into(),
            })
    }
}
