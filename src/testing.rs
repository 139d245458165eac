//! In-memory stand-in for the Ladder API used by the controller tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::api::{ChatScope, FinanceApi};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Budget, ChatReply, Credentials, Expense, ExpenseId, ExpenseUpdate, Insights, InsightsRequest,
    MonthlyTrends, NewBudget, OtpRequest, SignupRequest, TokenResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    List,
    Get,
    Update,
    Upload,
    Chat,
    ListBudgets,
    BudgetOverview,
    CreateBudget,
    Insights,
    Trends,
    Login,
    Signup,
    VerifyOtp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { skip: usize, limit: usize },
    Get(ExpenseId),
    Update(ExpenseId, ExpenseUpdate),
    Upload(String),
    Chat(String, ChatScope),
    ListBudgets,
    BudgetOverview,
    CreateBudget(NewBudget),
    Insights,
    Trends,
    Login(String),
    Signup(String),
    VerifyOtp(String, String),
}

#[derive(Default)]
pub struct FakeApi {
    pub expenses: RefCell<Vec<Expense>>,
    pub budgets: RefCell<Vec<Budget>>,
    pub insights: RefCell<Insights>,
    pub trends: RefCell<MonthlyTrends>,
    /// Records created by the next successful receipt uploads, in order.
    pub receipt_batches: RefCell<VecDeque<Vec<Expense>>>,
    pub calls: RefCell<Vec<Call>>,
    failures: RefCell<HashMap<Endpoint, VecDeque<ApiError>>>,
}

pub fn expense(id: ExpenseId, description: &str, amount: &str) -> Expense {
    Expense {
        id,
        description: description.to_string(),
        amount: Decimal::from_str(amount).unwrap(),
        category: None,
        date: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        receipt_group_id: None,
    }
}

impl FakeApi {
    pub fn with_expenses(count: usize) -> Self {
        let api = Self::default();
        *api.expenses.borrow_mut() = (1..=count as ExpenseId)
            .map(|i| expense(i, &format!("Expense {}", i), "10.00"))
            .collect();
        api
    }

    /// Makes the next call to `endpoint` fail with `error`.
    pub fn fail_next(&self, endpoint: Endpoint, error: ApiError) {
        self.failures
            .borrow_mut()
            .entry(endpoint)
            .or_default()
            .push_back(error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn list_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::List { .. }))
            .collect()
    }

    fn record(&self, endpoint: Endpoint, call: Call) -> ApiResult<()> {
        self.calls.borrow_mut().push(call);
        match self
            .failures
            .borrow_mut()
            .get_mut(&endpoint)
            .and_then(|q| q.pop_front())
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn not_found() -> ApiError {
    ApiError::Rejected {
        status: 404,
        detail: Some("Expense not found".to_string()),
    }
}

#[async_trait(?Send)]
impl FinanceApi for FakeApi {
    type Upload = String;

    async fn list_expenses(&self, skip: usize, limit: usize) -> ApiResult<Vec<Expense>> {
        self.record(Endpoint::List, Call::List { skip, limit })?;
        Ok(self
            .expenses
            .borrow()
            .iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_expense(&self, id: ExpenseId) -> ApiResult<Expense> {
        self.record(Endpoint::Get, Call::Get(id))?;
        self.expenses
            .borrow()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn update_expense(&self, id: ExpenseId, update: &ExpenseUpdate) -> ApiResult<Expense> {
        self.record(Endpoint::Update, Call::Update(id, update.clone()))?;
        let mut expenses = self.expenses.borrow_mut();
        let expense = expenses.iter_mut().find(|e| e.id == id).ok_or_else(not_found)?;
        expense.description = update.description.clone();
        expense.amount = update.amount;
        expense.category = update.category.clone();
        expense.date = update.date.naive_utc();
        Ok(expense.clone())
    }

    async fn upload_receipt(&self, file: String) -> ApiResult<Vec<Expense>> {
        self.record(Endpoint::Upload, Call::Upload(file))?;
        let created = self.receipt_batches.borrow_mut().pop_front().unwrap_or_default();
        let mut expenses = self.expenses.borrow_mut();
        for (i, e) in created.iter().enumerate() {
            expenses.insert(i, e.clone());
        }
        Ok(created)
    }

    async fn chat(&self, message: &str, scope: ChatScope) -> ApiResult<ChatReply> {
        self.record(Endpoint::Chat, Call::Chat(message.to_string(), scope))?;
        Ok(ChatReply {
            message: format!("re: {}", message),
        })
    }

    async fn list_budgets(&self) -> ApiResult<Vec<Budget>> {
        self.record(Endpoint::ListBudgets, Call::ListBudgets)?;
        Ok(self.budgets.borrow().clone())
    }

    async fn budget_overview(&self) -> ApiResult<Vec<Budget>> {
        self.record(Endpoint::BudgetOverview, Call::BudgetOverview)?;
        Ok(self.budgets.borrow().clone())
    }

    async fn create_budget(&self, budget: &NewBudget) -> ApiResult<()> {
        self.record(Endpoint::CreateBudget, Call::CreateBudget(budget.clone()))?;
        self.budgets.borrow_mut().push(Budget {
            id: None,
            category: budget.category.clone(),
            amount: budget.amount,
            end_date: budget.end_date.naive_utc(),
        });
        Ok(())
    }

    async fn insights(&self, _request: &InsightsRequest) -> ApiResult<Insights> {
        self.record(Endpoint::Insights, Call::Insights)?;
        Ok(self.insights.borrow().clone())
    }

    async fn monthly_trends(&self) -> ApiResult<MonthlyTrends> {
        self.record(Endpoint::Trends, Call::Trends)?;
        Ok(self.trends.borrow().clone())
    }

    async fn login(&self, credentials: &Credentials) -> ApiResult<TokenResponse> {
        self.record(Endpoint::Login, Call::Login(credentials.email.clone()))?;
        Ok(TokenResponse {
            access_token: format!("token-for-{}", credentials.email),
        })
    }

    async fn signup(&self, request: &SignupRequest) -> ApiResult<()> {
        self.record(Endpoint::Signup, Call::Signup(request.email.clone()))
    }

    async fn verify_otp(&self, request: &OtpRequest) -> ApiResult<()> {
        self.record(
            Endpoint::VerifyOtp,
            Call::VerifyOtp(request.email.clone(), request.code.clone()),
        )
    }
}
