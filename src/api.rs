use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::api_url;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Budget, ChatReply, ChatRequest, Credentials, Expense, ExpenseId, ExpenseUpdate, Insights,
    InsightsRequest, MonthlyTrends, NewBudget, OtpRequest, SignupRequest, TokenResponse,
};

/// Which conversational endpoint a chat message goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatScope {
    /// `POST /chat?expense_id=<group>`: questions about one uploaded receipt.
    Receipt(String),
    /// `POST /chat` from the receipt panel before any upload succeeded.
    Unscoped,
    /// `POST /chat/` from the assistant page.
    Assistant,
}

impl ChatScope {
    pub fn for_batch(batch: Option<&str>) -> Self {
        match batch {
            Some(group) => ChatScope::Receipt(group.to_string()),
            None => ChatScope::Unscoped,
        }
    }
}

#[async_trait(?Send)]
pub trait FinanceApi {
    /// Payload of a receipt upload (`web_sys::File` in the browser).
    type Upload;

    async fn list_expenses(&self, skip: usize, limit: usize) -> ApiResult<Vec<Expense>>;
    async fn get_expense(&self, id: ExpenseId) -> ApiResult<Expense>;
    async fn update_expense(&self, id: ExpenseId, update: &ExpenseUpdate) -> ApiResult<Expense>;
    async fn upload_receipt(&self, file: Self::Upload) -> ApiResult<Vec<Expense>>;
    async fn chat(&self, message: &str, scope: ChatScope) -> ApiResult<ChatReply>;

    async fn list_budgets(&self) -> ApiResult<Vec<Budget>>;
    /// Budgets for the dashboard overview, read from `/budgets/`.
    async fn budget_overview(&self) -> ApiResult<Vec<Budget>>;
    async fn create_budget(&self, budget: &NewBudget) -> ApiResult<()>;
    async fn insights(&self, request: &InsightsRequest) -> ApiResult<Insights>;
    async fn monthly_trends(&self) -> ApiResult<MonthlyTrends>;

    async fn login(&self, credentials: &Credentials) -> ApiResult<TokenResponse>;
    async fn signup(&self, request: &SignupRequest) -> ApiResult<()>;
    async fn verify_otp(&self, request: &OtpRequest) -> ApiResult<()>;
}

/// `gloo-net` client for the Ladder API.
#[derive(Clone, PartialEq, Default)]
pub struct HttpApi {
    token: Option<String>,
}

impl HttpApi {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
            None => builder,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(Request::get(&api_url(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(Request::post(&api_url(path)))
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.authorize(Request::put(&api_url(path)))
    }
}

fn with_json<T: Serialize>(builder: RequestBuilder, body: &T) -> ApiResult<Request> {
    builder
        .json(body)
        .map_err(|e| ApiError::Transport(e.to_string()))
}

async fn send(request: Request) -> ApiResult<Response> {
    dispatch(request, true).await
}

// Auth endpoints answer 401 for bad credentials; that is a rejection, not an
// expired session.
async fn send_public(request: Request) -> ApiResult<Response> {
    dispatch(request, false).await
}

async fn dispatch(request: Request, guarded: bool) -> ApiResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if response.ok() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    log::debug!("{} -> {}: {}", response.url(), status, body);
    if guarded {
        Err(ApiError::from_status(status, &body))
    } else {
        Err(ApiError::rejected(status, &body))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn build(builder: RequestBuilder) -> ApiResult<Request> {
    builder
        .build()
        .map_err(|e| ApiError::Transport(e.to_string()))
}

#[async_trait(?Send)]
impl FinanceApi for HttpApi {
    type Upload = web_sys::File;

    async fn list_expenses(&self, skip: usize, limit: usize) -> ApiResult<Vec<Expense>> {
        let skip = skip.to_string();
        let limit = limit.to_string();
        let request = build(
            self.get("/expenses")
                .query([("skip", skip.as_str()), ("limit", limit.as_str())]),
        )?;
        decode(send(request).await?).await
    }

    async fn get_expense(&self, id: ExpenseId) -> ApiResult<Expense> {
        let request = build(self.get(&format!("/expenses/{}", id)))?;
        decode(send(request).await?).await
    }

    async fn update_expense(&self, id: ExpenseId, update: &ExpenseUpdate) -> ApiResult<Expense> {
        let request = with_json(self.put(&format!("/expenses/{}", id)), update)?;
        decode(send(request).await?).await
    }

    async fn upload_receipt(&self, file: web_sys::File) -> ApiResult<Vec<Expense>> {
        let form = web_sys::FormData::new().map_err(|e| ApiError::Transport(format!("{:?}", e)))?;
        form.append_with_blob("file", &file)
            .map_err(|e| ApiError::Transport(format!("{:?}", e)))?;
        let request = self
            .post("/expenses/receipt")
            .body(form)
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        decode(send(request).await?).await
    }

    async fn chat(&self, message: &str, scope: ChatScope) -> ApiResult<ChatReply> {
        let builder = match &scope {
            ChatScope::Receipt(group) => self.post("/chat").query([("expense_id", group.as_str())]),
            ChatScope::Unscoped => self.post("/chat"),
            ChatScope::Assistant => self.post("/chat/"),
        };
        let body = ChatRequest {
            message: message.to_string(),
        };
        let request = with_json(builder, &body)?;
        decode(send(request).await?).await
    }

    async fn list_budgets(&self) -> ApiResult<Vec<Budget>> {
        let request = build(self.get("/budgets"))?;
        decode(send(request).await?).await
    }

    async fn budget_overview(&self) -> ApiResult<Vec<Budget>> {
        let request = build(self.get("/budgets/"))?;
        decode(send(request).await?).await
    }

    async fn create_budget(&self, budget: &NewBudget) -> ApiResult<()> {
        let request = with_json(self.post("/budgets"), budget)?;
        send(request).await.map(|_| ())
    }

    async fn insights(&self, request: &InsightsRequest) -> ApiResult<Insights> {
        let request = with_json(self.post("/ai/insights"), request)?;
        decode(send(request).await?).await
    }

    async fn monthly_trends(&self) -> ApiResult<MonthlyTrends> {
        let request = build(self.get("/trends/monthly"))?;
        decode(send(request).await?).await
    }

    async fn login(&self, credentials: &Credentials) -> ApiResult<TokenResponse> {
        let request = with_json(Request::post(&api_url("/auth/login")), credentials)?;
        decode(send_public(request).await?).await
    }

    async fn signup(&self, request: &SignupRequest) -> ApiResult<()> {
        let request = with_json(Request::post(&api_url("/auth/signup")), request)?;
        send_public(request).await.map(|_| ())
    }

    async fn verify_otp(&self, request: &OtpRequest) -> ApiResult<()> {
        let request = with_json(Request::post(&api_url("/auth/verify-otp")), request)?;
        send_public(request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_scope_for_batch() {
        assert_eq!(
            ChatScope::for_batch(Some("grp-1")),
            ChatScope::Receipt("grp-1".to_string())
        );
        assert_eq!(ChatScope::for_batch(None), ChatScope::Unscoped);
    }
}
