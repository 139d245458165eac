//! Spending overview: category chart, budget progress and the monthly trend.
//!
//! The three sources are fetched together and shown all-or-nothing.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::{FinanceApi, HttpApi};
use crate::config::{INSIGHT_PROVIDER, INSIGHT_WINDOW_DAYS};
use crate::error::ApiError;
use crate::format::format_currency;
use crate::host::{BrowserHost, PageHost};
use crate::layout::page_shell;
use crate::models::{Budget, CategorySpend, Insights, InsightsRequest, MonthlyTotal, MonthlyTrends};

pub const INSIGHTS_FAILED: &str = "Could not load insight data.";
pub const BUDGETS_FAILED: &str = "Could not load budget data.";
pub const TRENDS_FAILED: &str = "Could not load trend data.";
pub const NO_CATEGORY_DATA: &str = "No spending data for chart.";
pub const NO_BUDGETS: &str = "No budgets set. Go to the Budgets page to create one.";
pub const NO_TREND_DATA: &str = "Not enough data for a monthly trend chart.";

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub insights: Insights,
    pub budgets: Vec<Budget>,
    pub trends: MonthlyTrends,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DashboardState {
    #[default]
    Loading,
    Ready(DashboardData),
    Failed,
    /// The session ended; nothing more is requested.
    Expired,
}

pub fn insights_request(now: DateTime<Utc>) -> InsightsRequest {
    InsightsRequest {
        start_date: now - Duration::days(INSIGHT_WINDOW_DAYS),
        end_date: now,
        ai_provider: INSIGHT_PROVIDER.to_string(),
    }
}

pub async fn load_dashboard<A, H>(
    state: &RefCell<DashboardState>,
    api: &A,
    host: &H,
    now: DateTime<Utc>,
) where
    A: FinanceApi + ?Sized,
    H: PageHost + ?Sized,
{
    if *state.borrow() == DashboardState::Expired {
        return;
    }
    *state.borrow_mut() = DashboardState::Loading;
    host.refresh();

    let request = insights_request(now);
    let (insights, budgets, trends) = futures::join!(
        api.insights(&request),
        api.budget_overview(),
        api.monthly_trends()
    );

    let next = match (insights, budgets, trends) {
        (Ok(insights), Ok(budgets), Ok(trends)) => DashboardState::Ready(DashboardData {
            insights,
            budgets,
            trends,
        }),
        (insights, budgets, trends) => {
            let errors: Vec<ApiError> = [insights.err(), budgets.err(), trends.err()]
                .into_iter()
                .flatten()
                .collect();
            if errors.iter().any(ApiError::is_unauthorized) {
                DashboardState::Expired
            } else {
                for err in &errors {
                    log::error!("dashboard error: {}", err);
                }
                DashboardState::Failed
            }
        }
    };
    let expired = next == DashboardState::Expired;
    *state.borrow_mut() = next;
    if expired {
        host.session_expired();
    }
    host.refresh();
}

/// One column of a bar chart; `height` is a percentage of the tallest bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub height: f64,
}

fn relative_height(value: Decimal, max: Decimal) -> f64 {
    if max > Decimal::ZERO {
        (value / max * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
    } else {
        0.0
    }
}

pub fn category_bars(categories: &[CategorySpend]) -> Vec<Bar> {
    let max = categories
        .iter()
        .map(|c| c.amount)
        .fold(Decimal::ZERO, Decimal::max);
    categories
        .iter()
        .map(|c| Bar {
            label: c.category.clone(),
            height: relative_height(c.amount, max),
        })
        .collect()
}

fn month_label(month: u32) -> String {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .map(|name| name.to_string())
        .unwrap_or_else(|| month.to_string())
}

pub fn trend_bars(data: &[MonthlyTotal]) -> Vec<Bar> {
    let max = data
        .iter()
        .map(|d| d.total_spent)
        .fold(Decimal::ZERO, Decimal::max);
    data.iter()
        .map(|d| Bar {
            label: month_label(d.month),
            height: relative_height(d.total_spent, max),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetProgress {
    pub name: String,
    pub spent: Decimal,
    pub total: Decimal,
    /// Share of the budget used, capped at 100.
    pub percent: f64,
}

impl BudgetProgress {
    fn new(name: &str, spent: Decimal, total: Decimal) -> Self {
        Self {
            name: name.to_string(),
            spent,
            total,
            percent: relative_height(spent, total).min(100.0),
        }
    }
}

/// "Total Budget" first (when any budget exists), then every top category
/// that has a budget of its own.
pub fn budget_progress(
    total_spent: Decimal,
    budgets: &[Budget],
    categories: &[CategorySpend],
) -> Vec<BudgetProgress> {
    let by_category: HashMap<&str, Decimal> = budgets
        .iter()
        .map(|b| (b.category.as_str(), b.amount))
        .collect();
    let total_budget: Decimal = budgets.iter().map(|b| b.amount).sum();

    let mut bars = Vec::new();
    if total_budget > Decimal::ZERO {
        bars.push(BudgetProgress::new("Total Budget", total_spent, total_budget));
    }
    bars.extend(categories.iter().filter_map(|c| {
        by_category
            .get(c.category.as_str())
            .map(|total| BudgetProgress::new(&c.category, c.amount, *total))
    }));
    bars
}

fn empty_note(text: &'static str) -> Html {
    html! { <p class="text-center text-muted-foreground col-span-full">{ text }</p> }
}

fn error_note(text: &'static str) -> Html {
    html! { <p class="text-center text-red-500 col-span-full">{ text }</p> }
}

fn bar_chart(bars: &[Bar], empty: &'static str) -> Html {
    if bars.is_empty() {
        return empty_note(empty);
    }
    html! {
        <div class="flex items-end gap-3 h-48">
            { for bars.iter().map(|bar| html! {
                <div class="flex-1 flex flex-col items-center justify-end h-full">
                    <div class="w-3/4 bg-[#B2CBDE] rounded-t-md" style={format!("height: {:.1}%", bar.height)}></div>
                    <p class="text-xs font-medium text-slate-500 truncate pt-2">{ bar.label.clone() }</p>
                </div>
            }) }
        </div>
    }
}

fn progress_list(items: &[BudgetProgress]) -> Html {
    if items.is_empty() {
        return empty_note(NO_BUDGETS);
    }
    html! {
        <div class="space-y-4">
            { for items.iter().map(|item| html! {
                <div>
                    <div class="flex justify-between items-baseline mb-1">
                        <p class="font-semibold text-foreground">{ item.name.clone() }</p>
                        <p class="text-sm font-bold text-[#173E63]">{ format!("{:.0}%", item.percent) }</p>
                    </div>
                    <div class="w-full bg-slate-200 rounded-full h-2.5">
                        <div class="bg-[#173E63] h-2.5 rounded-full" style={format!("width: {:.1}%", item.percent)}></div>
                    </div>
                    <p class="text-sm text-muted-foreground mt-1 text-right">
                        { format!("{} / {}", format_currency(item.spent), format_currency(item.total)) }
                    </p>
                </div>
            }) }
        </div>
    }
}

fn card(title: &'static str, body: Html) -> Html {
    html! {
        <div class="bg-card rounded-[10px] p-6 border border-border">
            <h3 class="font-bold text-foreground text-lg mb-4">{ title }</h3>
            { body }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct DashboardPageProps {
    pub on_session_expired: Callback<()>,
}

#[function_component(DashboardPage)]
pub fn dashboard_page(props: &DashboardPageProps) -> Html {
    let api = use_context::<HttpApi>().unwrap_or_default();
    let state: Rc<RefCell<DashboardState>> = use_mut_ref(DashboardState::default);
    let force_update = use_force_update();

    let host = BrowserHost::new(
        Callback::from(move |_| force_update.force_update()),
        props.on_session_expired.clone(),
    );

    {
        let state = state.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    load_dashboard(&state, &api, &host, Utc::now()).await;
                });
                || ()
            },
            (),
        );
    }

    let (categories, budgets, trends) = match &*state.borrow() {
        DashboardState::Loading | DashboardState::Expired => (
            empty_note("Loading chart..."),
            empty_note("Loading budgets..."),
            empty_note("Loading trends..."),
        ),
        DashboardState::Failed => (
            error_note(INSIGHTS_FAILED),
            error_note(BUDGETS_FAILED),
            error_note(TRENDS_FAILED),
        ),
        DashboardState::Ready(data) => (
            bar_chart(&category_bars(&data.insights.top_categories), NO_CATEGORY_DATA),
            progress_list(&budget_progress(
                data.insights.total_spent,
                &data.budgets,
                &data.insights.top_categories,
            )),
            bar_chart(&trend_bars(&data.trends.data), NO_TREND_DATA),
        ),
    };

    html! {
        { page_shell(
            "Dashboard",
            html! {},
            html! {
                <>
                    <div class="grid grid-cols-1 lg:grid-cols-2 gap-6">
                        { card("Spending by Category", categories) }
                        { card("Budget Overview", budgets) }
                    </div>
                    { card("Monthly Trends", trends) }
                </>
            }
        ) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::recording::RecordingHost;
    use crate::testing::{Call, Endpoint, FakeApi};
    use chrono::TimeZone;
    use futures::executor::block_on;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn spend(category: &str, amount: &str) -> CategorySpend {
        CategorySpend {
            category: category.to_string(),
            amount: dec(amount),
        }
    }

    fn budget(category: &str, amount: &str) -> Budget {
        Budget {
            id: None,
            category: category.to_string(),
            amount: dec(amount),
            end_date: chrono::NaiveDate::from_ymd_opt(2024, 12, 31)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_insights_window() {
        let now = Utc.with_ymd_and_hms(2024, 5, 31, 8, 0, 0).unwrap();
        let request = insights_request(now);
        assert_eq!(request.end_date, now);
        assert_eq!(
            request.start_date,
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
        );
        assert_eq!(request.ai_provider, "gemini");
    }

    #[test]
    fn test_category_bars_scale_to_max() {
        let bars = category_bars(&[spend("Food", "200"), spend("Fuel", "50")]);
        assert_eq!(bars[0].height, 100.0);
        assert_eq!(bars[1].height, 25.0);
        assert_eq!(bars[1].label, "Fuel");
        assert!(category_bars(&[]).is_empty());
    }

    #[test]
    fn test_zero_max_gives_flat_bars() {
        let bars = category_bars(&[spend("Food", "0")]);
        assert_eq!(bars[0].height, 0.0);
    }

    #[test]
    fn test_trend_labels() {
        let data = vec![
            MonthlyTotal {
                month: 1,
                total_spent: dec("10"),
            },
            MonthlyTotal {
                month: 12,
                total_spent: dec("40"),
            },
        ];
        let bars = trend_bars(&data);
        assert_eq!(bars[0].label, "Jan");
        assert_eq!(bars[0].height, 25.0);
        assert_eq!(bars[1].label, "Dec");
        assert_eq!(month_label(13), "13");
    }

    #[test]
    fn test_budget_progress() {
        let budgets = vec![budget("Food", "100"), budget("Travel", "300")];
        let categories = vec![spend("Food", "150"), spend("Games", "20")];
        let bars = budget_progress(dec("170"), &budgets, &categories);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].name, "Total Budget");
        assert_eq!(bars[0].total, dec("400"));
        assert_eq!(bars[0].percent, 42.5);
        assert_eq!(bars[1].name, "Food");
        // overspent budgets are clamped
        assert_eq!(bars[1].percent, 100.0);
    }

    #[test]
    fn test_budget_progress_empty() {
        assert!(budget_progress(dec("50"), &[], &[spend("Food", "50")]).is_empty());
    }

    #[test]
    fn test_load_all_sources() {
        let state = RefCell::new(DashboardState::default());
        let api = FakeApi::default();
        api.insights.borrow_mut().top_categories = vec![spend("Food", "12")];
        api.budgets.borrow_mut().push(budget("Food", "100"));
        let host = RecordingHost::default();

        block_on(load_dashboard(&state, &api, &host, Utc::now()));

        assert_eq!(
            api.calls(),
            vec![Call::Insights, Call::BudgetOverview, Call::Trends]
        );
        match &*state.borrow() {
            DashboardState::Ready(data) => {
                assert_eq!(data.budgets.len(), 1);
                assert_eq!(data.insights.top_categories.len(), 1);
            }
            other => panic!("unexpected state {:?}", other),
        };
    }

    #[test]
    fn test_any_failure_fails_everything() {
        let state = RefCell::new(DashboardState::default());
        let api = FakeApi::default();
        api.fail_next(Endpoint::Trends, ApiError::Transport("down".into()));
        let host = RecordingHost::default();

        block_on(load_dashboard(&state, &api, &host, Utc::now()));
        assert_eq!(*state.borrow(), DashboardState::Failed);
        assert_eq!(host.expirations.get(), 0);
    }

    #[test]
    fn test_unauthorized_expires_session() {
        let state = RefCell::new(DashboardState::default());
        let api = FakeApi::default();
        api.fail_next(Endpoint::BudgetOverview, ApiError::Unauthorized);
        let host = RecordingHost::default();

        block_on(load_dashboard(&state, &api, &host, Utc::now()));
        assert_eq!(*state.borrow(), DashboardState::Expired);
        assert_eq!(host.expirations.get(), 1);

        block_on(load_dashboard(&state, &api, &host, Utc::now()));
        assert_eq!(api.calls().len(), 3);
    }
}
