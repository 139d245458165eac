//! Custom budgets: the list and the "create budget" dialog.

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, InputEvent};
use yew::prelude::*;

use crate::api::{FinanceApi, HttpApi};
use crate::error::{ApiError, ApiResult, FailureKind};
use crate::format::{format_currency, format_short_date};
use crate::host::{BrowserHost, PageHost};
use crate::layout::{icon_plus, modal, page_shell};
use crate::models::{Budget, NewBudget};

pub const LOADING_MESSAGE: &str = "Loading budgets...";
pub const EMPTY_MESSAGE: &str = "No custom budgets created yet.";
pub const LOAD_FAILED: &str = "Could not load budgets.";
pub const CREATED: &str = "Budget created successfully!";
pub const CREATE_UNAVAILABLE: &str = "An error occurred while creating the budget.";

#[derive(Debug, Clone, PartialEq)]
pub enum BudgetList {
    Loading,
    Loaded(Vec<Budget>),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetField {
    Category,
    Amount,
    EndDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetForm {
    pub category: String,
    pub amount: String,
    pub end_date: String,
}

impl BudgetForm {
    pub fn set(&mut self, field: BudgetField, value: String) {
        match field {
            BudgetField::Category => self.category = value,
            BudgetField::Amount => self.amount = value,
            BudgetField::EndDate => self.end_date = value,
        }
    }

    /// The budget starts at `now`.
    pub fn to_new_budget(&self, now: DateTime<Utc>) -> Result<NewBudget, String> {
        let amount = Decimal::from_str(self.amount.trim())
            .map_err(|_| "Please enter a valid amount.".to_string())?;
        let end = NaiveDate::parse_from_str(self.end_date.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| "Please enter a valid date.".to_string())?;
        Ok(NewBudget {
            category: self.category.trim().to_string(),
            amount,
            start_date: now,
            end_date: Utc.from_utc_datetime(&end),
        })
    }
}

#[derive(Debug)]
pub struct BudgetsController {
    list: BudgetList,
    pub form: BudgetForm,
    dialog_open: bool,
    saving: bool,
    expired: bool,
}

impl Default for BudgetsController {
    fn default() -> Self {
        Self {
            list: BudgetList::Loading,
            form: BudgetForm::default(),
            dialog_open: false,
            saving: false,
            expired: false,
        }
    }
}

impl BudgetsController {
    pub fn list(&self) -> &BudgetList {
        &self.list
    }

    pub fn dialog_open(&self) -> bool {
        self.dialog_open
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn open_dialog(&mut self) {
        self.dialog_open = true;
    }

    pub fn close_dialog(&mut self) {
        self.dialog_open = false;
    }

    fn finish_load(&mut self, result: ApiResult<Vec<Budget>>) -> Result<(), ApiError> {
        match result {
            Ok(budgets) => {
                self.list = BudgetList::Loaded(budgets);
                Ok(())
            }
            Err(err) => {
                log::error!("error fetching budgets: {}", err);
                self.list = BudgetList::Failed;
                Err(err)
            }
        }
    }

    fn expire(&mut self) -> bool {
        !std::mem::replace(&mut self.expired, true)
    }
}

fn expire_session<H: PageHost + ?Sized>(ctl: &RefCell<BudgetsController>, host: &H) {
    if ctl.borrow_mut().expire() {
        host.session_expired();
    }
}

pub async fn load_budgets<A, H>(ctl: &RefCell<BudgetsController>, api: &A, host: &H)
where
    A: FinanceApi + ?Sized,
    H: PageHost + ?Sized,
{
    {
        let mut ctl = ctl.borrow_mut();
        if ctl.expired {
            return;
        }
        ctl.list = BudgetList::Loading;
    }
    host.refresh();
    let result = api.list_budgets().await;
    let outcome = ctl.borrow_mut().finish_load(result);
    if matches!(outcome, Err(ApiError::Unauthorized)) {
        expire_session(ctl, host);
    }
    host.refresh();
}

pub async fn create_budget<A, H>(
    ctl: &RefCell<BudgetsController>,
    api: &A,
    host: &H,
    now: DateTime<Utc>,
) where
    A: FinanceApi + ?Sized,
    H: PageHost + ?Sized,
{
    let prepared = {
        let mut ctl = ctl.borrow_mut();
        if ctl.expired || ctl.saving {
            return;
        }
        let prepared = ctl.form.to_new_budget(now);
        ctl.saving = prepared.is_ok();
        prepared
    };
    let budget = match prepared {
        Ok(budget) => budget,
        Err(reason) => {
            host.notify(&reason);
            return;
        }
    };
    host.refresh();

    let result = api.create_budget(&budget).await;
    ctl.borrow_mut().saving = false;
    match result {
        Ok(()) => {
            log::info!("created budget for {}", budget.category);
            {
                let mut ctl = ctl.borrow_mut();
                ctl.form = BudgetForm::default();
                ctl.dialog_open = false;
            }
            host.notify(CREATED);
            load_budgets(ctl, api, host).await;
        }
        Err(err) => {
            match err.kind() {
                FailureKind::SessionExpired => expire_session(ctl, host),
                FailureKind::Rejected => {
                    host.notify(&err.reason_or("Error", "Could not create budget."))
                }
                FailureKind::Unavailable => {
                    log::error!("error creating budget: {}", err);
                    host.notify(CREATE_UNAVAILABLE);
                }
            }
            host.refresh();
        }
    }
}

fn budget_row(budget: &Budget) -> Html {
    html! {
        <div class="flex items-center justify-between gap-4 py-4 px-4 hover:bg-slate-50">
            <div>
                <p class="text-base font-medium text-foreground">{ budget.category.clone() }</p>
                <p class="text-sm text-muted-foreground">{ format!("Ends on {}", format_short_date(&budget.end_date)) }</p>
            </div>
            <div class="text-base font-medium text-foreground">{ format_currency(budget.amount) }</div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct BudgetsPageProps {
    pub on_session_expired: Callback<()>,
}

#[function_component(BudgetsPage)]
pub fn budgets_page(props: &BudgetsPageProps) -> Html {
    let api = use_context::<HttpApi>().unwrap_or_default();
    let ctl: Rc<RefCell<BudgetsController>> = use_mut_ref(BudgetsController::default);
    let force_update = use_force_update();

    let host = BrowserHost::new(
        Callback::from(move |_| force_update.force_update()),
        props.on_session_expired.clone(),
    );

    {
        let ctl = ctl.clone();
        let api = api.clone();
        let host = host.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    load_budgets(&ctl, &api, &host).await;
                });
                || ()
            },
            (),
        );
    }

    let (list, form, dialog_open, saving) = {
        let ctl = ctl.borrow();
        (
            ctl.list().clone(),
            ctl.form.clone(),
            ctl.dialog_open(),
            ctl.is_saving(),
        )
    };

    let field_input = |field: BudgetField| {
        let ctl = ctl.clone();
        let host = host.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            ctl.borrow_mut().form.set(field, input.value());
            host.refresh();
        })
    };

    let on_open = {
        let ctl = ctl.clone();
        let host = host.clone();
        Callback::from(move |_: MouseEvent| {
            ctl.borrow_mut().open_dialog();
            host.refresh();
        })
    };

    let on_close = {
        let ctl = ctl.clone();
        let host = host.clone();
        Callback::from(move |_: MouseEvent| {
            ctl.borrow_mut().close_dialog();
            host.refresh();
        })
    };

    let on_submit = {
        let ctl = ctl.clone();
        let api = api.clone();
        let host = host.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let (ctl, api, host) = (ctl.clone(), api.clone(), host.clone());
            spawn_local(async move {
                create_budget(&ctl, &api, &host, Utc::now()).await;
            });
        })
    };

    let body = match &list {
        BudgetList::Loading => html! {
            <p class="text-center text-muted-foreground py-4">{ LOADING_MESSAGE }</p>
        },
        BudgetList::Failed => html! {
            <p class="text-center text-red-500 py-4">{ LOAD_FAILED }</p>
        },
        BudgetList::Loaded(budgets) if budgets.is_empty() => html! {
            <p class="text-center text-muted-foreground py-4">{ EMPTY_MESSAGE }</p>
        },
        BudgetList::Loaded(budgets) => html! {
            <div class="divide-y divide-border">
                { for budgets.iter().map(budget_row) }
            </div>
        },
    };

    let dialog = if dialog_open {
        modal(
            "Create Budget",
            on_close,
            html! {
                <form class="space-y-3" onsubmit={on_submit}>
                    <div class="space-y-1">
                        <label class="text-[12px] font-bold text-muted-foreground">{"Category"}</label>
                        <input type="text" required=true value={form.category} oninput={field_input(BudgetField::Category)} class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-[13px] text-[#173E63] border-none" />
                    </div>
                    <div class="space-y-1">
                        <label class="text-[12px] font-bold text-muted-foreground">{"Amount"}</label>
                        <input type="number" step="0.01" required=true value={form.amount} oninput={field_input(BudgetField::Amount)} class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-[13px] text-[#173E63] border-none" />
                    </div>
                    <div class="space-y-1">
                        <label class="text-[12px] font-bold text-muted-foreground">{"End Date"}</label>
                        <input type="date" required=true value={form.end_date} oninput={field_input(BudgetField::EndDate)} class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-[13px] text-[#173E63] border-none" />
                    </div>
                    <button type="submit" disabled={saving} class="w-full bg-[#173E63] text-white py-2 rounded-[10px] text-[12px] font-bold">
                        { if saving { "Saving..." } else { "Save Budget" } }
                    </button>
                </form>
            },
        )
    } else {
        html! {}
    };

    html! {
        <>
            { page_shell(
                "Budgets",
                html! {
                    <button onclick={on_open} class="flex items-center gap-2 bg-[#173E63] text-white px-4 py-2 rounded-[10px] text-[12px] font-bold">
                        { icon_plus() }
                        <span>{"Create Budget"}</span>
                    </button>
                },
                html! {
                    <div class="bg-card rounded-[10px] border border-border overflow-hidden">
                        { body }
                    </div>
                },
            ) }
            { dialog }
        </>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::recording::RecordingHost;
    use crate::testing::{Call, Endpoint, FakeApi};
    use futures::executor::block_on;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn filled_form() -> BudgetForm {
        BudgetForm {
            category: " Groceries ".into(),
            amount: "250.00".into(),
            end_date: "2024-03-31".into(),
        }
    }

    #[test]
    fn test_form_builds_budget() {
        let budget = filled_form().to_new_budget(now()).unwrap();
        assert_eq!(budget.category, "Groceries");
        assert_eq!(budget.amount, Decimal::new(25000, 2));
        assert_eq!(budget.start_date, now());
        assert_eq!(
            budget.end_date,
            Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_form_rejects_bad_input() {
        let mut form = filled_form();
        form.set(BudgetField::Amount, "lots".into());
        assert_eq!(
            form.to_new_budget(now()),
            Err("Please enter a valid amount.".to_string())
        );
        form.set(BudgetField::Amount, "10".into());
        form.set(BudgetField::EndDate, String::new());
        assert_eq!(
            form.to_new_budget(now()),
            Err("Please enter a valid date.".to_string())
        );
    }

    #[test]
    fn test_load_states() {
        let ctl = RefCell::new(BudgetsController::default());
        let api = FakeApi::default();
        let host = RecordingHost::default();
        block_on(load_budgets(&ctl, &api, &host));
        assert_eq!(ctl.borrow().list(), &BudgetList::Loaded(Vec::new()));

        api.fail_next(Endpoint::ListBudgets, ApiError::Transport("down".into()));
        block_on(load_budgets(&ctl, &api, &host));
        assert_eq!(ctl.borrow().list(), &BudgetList::Failed);
        assert_eq!(host.expirations.get(), 0);
    }

    #[test]
    fn test_create_success_resets_and_reloads() {
        let ctl = RefCell::new(BudgetsController::default());
        let api = FakeApi::default();
        let host = RecordingHost::default();
        ctl.borrow_mut().open_dialog();
        ctl.borrow_mut().form = filled_form();

        block_on(create_budget(&ctl, &api, &host, now()));

        assert_eq!(host.notices(), vec![CREATED]);
        let ctl = ctl.borrow();
        assert!(!ctl.dialog_open());
        assert_eq!(ctl.form, BudgetForm::default());
        match ctl.list() {
            BudgetList::Loaded(budgets) => assert_eq!(budgets[0].category, "Groceries"),
            other => panic!("unexpected list state {:?}", other),
        }
        assert_eq!(api.calls().last(), Some(&Call::ListBudgets));
    }

    #[test]
    fn test_create_rejection_keeps_dialog() {
        let ctl = RefCell::new(BudgetsController::default());
        let api = FakeApi::default();
        let host = RecordingHost::default();
        ctl.borrow_mut().open_dialog();
        ctl.borrow_mut().form = filled_form();
        api.fail_next(
            Endpoint::CreateBudget,
            ApiError::Rejected {
                status: 400,
                detail: Some("Budget already exists".into()),
            },
        );

        block_on(create_budget(&ctl, &api, &host, now()));
        assert_eq!(host.notices(), vec!["Error: Budget already exists"]);
        assert!(ctl.borrow().dialog_open());
        assert_eq!(ctl.borrow().form, filled_form());
        assert!(!ctl.borrow().is_saving());
    }

    #[test]
    fn test_create_transport_failure() {
        let ctl = RefCell::new(BudgetsController::default());
        let api = FakeApi::default();
        let host = RecordingHost::default();
        ctl.borrow_mut().form = filled_form();
        api.fail_next(Endpoint::CreateBudget, ApiError::Transport("reset".into()));
        block_on(create_budget(&ctl, &api, &host, now()));
        assert_eq!(host.notices(), vec![CREATE_UNAVAILABLE]);
    }

    #[test]
    fn test_invalid_form_sends_nothing() {
        let ctl = RefCell::new(BudgetsController::default());
        let api = FakeApi::default();
        let host = RecordingHost::default();
        block_on(create_budget(&ctl, &api, &host, now()));
        assert!(api.calls().is_empty());
        assert_eq!(host.notices(), vec!["Please enter a valid amount."]);
    }

    #[test]
    fn test_unauthorized_list_expires_once() {
        let ctl = RefCell::new(BudgetsController::default());
        let api = FakeApi::default();
        let host = RecordingHost::default();
        api.fail_next(Endpoint::ListBudgets, ApiError::Unauthorized);
        block_on(load_budgets(&ctl, &api, &host));
        block_on(load_budgets(&ctl, &api, &host));
        assert_eq!(host.expirations.get(), 1);
        assert_eq!(api.calls().len(), 1);
    }
}
