use std::str::FromStr;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::error::{ApiError, ApiResult, FailureKind};
use crate::format::format_input_date;
use crate::models::{Expense, ExpenseId, ExpenseUpdate};

pub const FETCH_FAILED: &str = "Could not fetch expense details.";
pub const FETCH_UNAVAILABLE: &str = "An error occurred while fetching expense details.";
pub const UPDATE_UNAVAILABLE: &str = "An error occurred while updating the expense.";

/// Form contents as typed; parsed only on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub id: ExpenseId,
    pub description: String,
    pub amount: String,
    pub category: String,
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Description,
    Amount,
    Category,
    Date,
}

impl ExpenseDraft {
    pub fn from_expense(expense: &Expense) -> Self {
        Self {
            id: expense.id,
            description: expense.description.clone(),
            amount: expense.amount.normalize().to_string(),
            category: expense.category.clone().unwrap_or_default(),
            date: format_input_date(&expense.date),
        }
    }

    pub fn set(&mut self, field: DraftField, value: String) {
        match field {
            DraftField::Description => self.description = value,
            DraftField::Amount => self.amount = value,
            DraftField::Category => self.category = value,
            DraftField::Date => self.date = value,
        }
    }

    pub fn to_update(&self) -> Result<ExpenseUpdate, String> {
        let amount = Decimal::from_str(self.amount.trim())
            .map_err(|_| "Please enter a valid amount.".to_string())?;
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| "Please enter a valid date.".to_string())?;
        let category = self.category.trim();
        Ok(ExpenseUpdate {
            description: self.description.clone(),
            amount,
            category: (!category.is_empty()).then(|| category.to_string()),
            date: Utc.from_utc_datetime(&date),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Closed,
    Loading(ExpenseId),
    Open(ExpenseDraft),
    Submitting(ExpenseDraft),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    Opened,
    Saved,
    Stale,
    Failed(String),
    Unauthorized,
}

#[derive(Debug, Default)]
pub struct Editor {
    state: EditorState,
}

impl Editor {
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        matches!(self.state, EditorState::Open(_) | EditorState::Submitting(_))
    }

    #[cfg(test)]
    pub fn draft(&self) -> Option<&ExpenseDraft> {
        match &self.state {
            EditorState::Open(d) | EditorState::Submitting(d) => Some(d),
            _ => None,
        }
    }

    pub fn begin_edit(&mut self, id: ExpenseId) {
        self.state = EditorState::Loading(id);
    }

    pub fn finish_fetch(&mut self, id: ExpenseId, result: ApiResult<Expense>) -> EditorOutcome {
        if self.state != EditorState::Loading(id) {
            return EditorOutcome::Stale;
        }
        match result {
            Ok(expense) => {
                self.state = EditorState::Open(ExpenseDraft::from_expense(&expense));
                EditorOutcome::Opened
            }
            Err(err) => {
                self.state = EditorState::Closed;
                match err.kind() {
                    FailureKind::SessionExpired => EditorOutcome::Unauthorized,
                    FailureKind::Rejected => EditorOutcome::Failed(FETCH_FAILED.to_string()),
                    FailureKind::Unavailable => {
                        EditorOutcome::Failed(FETCH_UNAVAILABLE.to_string())
                    }
                }
            }
        }
    }

    pub fn set_field(&mut self, field: DraftField, value: String) {
        if let EditorState::Open(draft) = &mut self.state {
            draft.set(field, value);
        }
    }

    /// Moves `Open -> Submitting` and yields the request to send. A draft that
    /// does not parse stays open and the reason is returned.
    pub fn begin_submit(&mut self) -> Result<Option<(ExpenseId, ExpenseUpdate)>, String> {
        let draft = match &self.state {
            EditorState::Open(draft) => draft.clone(),
            _ => return Ok(None),
        };
        let update = draft.to_update()?;
        let id = draft.id;
        self.state = EditorState::Submitting(draft);
        Ok(Some((id, update)))
    }

    pub fn finish_submit(&mut self, id: ExpenseId, result: ApiResult<Expense>) -> EditorOutcome {
        let submitting = matches!(&self.state, EditorState::Submitting(d) if d.id == id);
        match result {
            Ok(_) => {
                if submitting {
                    self.state = EditorState::Closed;
                }
                EditorOutcome::Saved
            }
            Err(ApiError::Unauthorized) => {
                self.state = EditorState::Closed;
                EditorOutcome::Unauthorized
            }
            Err(err) => {
                if !submitting {
                    return EditorOutcome::Stale;
                }
                if let EditorState::Submitting(draft) = std::mem::take(&mut self.state) {
                    self.state = EditorState::Open(draft);
                }
                let message = match err.kind() {
                    FailureKind::Unavailable => UPDATE_UNAVAILABLE.to_string(),
                    _ => err.reason_or("Update failed", "Could not update expense."),
                };
                EditorOutcome::Failed(message)
            }
        }
    }

    pub fn close(&mut self) {
        self.state = EditorState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::expense;

    fn open_editor() -> Editor {
        let mut editor = Editor::default();
        editor.begin_edit(4);
        let mut e = expense(4, "Taxi", "18.2");
        e.category = Some("Transport".into());
        assert_eq!(editor.finish_fetch(4, Ok(e)), EditorOutcome::Opened);
        editor
    }

    #[test]
    fn test_fetch_populates_typed_fields() {
        let editor = open_editor();
        let draft = editor.draft().unwrap();
        assert_eq!(draft.description, "Taxi");
        assert_eq!(draft.amount, "18.2");
        assert_eq!(draft.category, "Transport");
        assert_eq!(draft.date, "2024-01-01");
        assert!(editor.is_visible());
    }

    #[test]
    fn test_fetch_failure_closes() {
        let mut editor = Editor::default();
        editor.begin_edit(9);
        let outcome = editor.finish_fetch(
            9,
            Err(ApiError::Rejected {
                status: 404,
                detail: None,
            }),
        );
        assert_eq!(outcome, EditorOutcome::Failed(FETCH_FAILED.to_string()));
        assert_eq!(editor.state(), &EditorState::Closed);
    }

    #[test]
    fn test_last_fetch_wins() {
        let mut editor = Editor::default();
        editor.begin_edit(1);
        editor.begin_edit(2);
        assert_eq!(
            editor.finish_fetch(1, Ok(expense(1, "a", "1"))),
            EditorOutcome::Stale
        );
        assert_eq!(
            editor.finish_fetch(2, Ok(expense(2, "b", "2"))),
            EditorOutcome::Opened
        );
        assert_eq!(editor.draft().unwrap().id, 2);
    }

    #[test]
    fn test_submit_success_closes() {
        let mut editor = open_editor();
        editor.set_field(DraftField::Amount, "20".into());
        let (id, update) = editor.begin_submit().unwrap().unwrap();
        assert_eq!(id, 4);
        assert_eq!(update.amount, Decimal::from(20));
        assert!(matches!(editor.state(), EditorState::Submitting(_)));

        let outcome = editor.finish_submit(4, Ok(expense(4, "Taxi", "20")));
        assert_eq!(outcome, EditorOutcome::Saved);
        assert_eq!(editor.state(), &EditorState::Closed);
    }

    #[test]
    fn test_submit_failure_reopens_with_detail() {
        let mut editor = open_editor();
        editor.begin_submit().unwrap();
        let outcome = editor.finish_submit(
            4,
            Err(ApiError::Rejected {
                status: 400,
                detail: Some("Date cannot be in the future".into()),
            }),
        );
        assert_eq!(
            outcome,
            EditorOutcome::Failed("Update failed: Date cannot be in the future".into())
        );
        assert!(matches!(editor.state(), EditorState::Open(_)));
    }

    #[test]
    fn test_submit_transport_failure() {
        let mut editor = open_editor();
        editor.begin_submit().unwrap();
        let outcome = editor.finish_submit(4, Err(ApiError::Transport("reset".into())));
        assert_eq!(outcome, EditorOutcome::Failed(UPDATE_UNAVAILABLE.into()));
        assert!(matches!(editor.state(), EditorState::Open(_)));
    }

    #[test]
    fn test_invalid_amount_stays_open() {
        let mut editor = open_editor();
        editor.set_field(DraftField::Amount, "twelve".into());
        assert_eq!(
            editor.begin_submit(),
            Err("Please enter a valid amount.".to_string())
        );
        assert!(matches!(editor.state(), EditorState::Open(_)));
    }

    #[test]
    fn test_empty_category_is_sent_as_none() {
        let mut editor = open_editor();
        editor.set_field(DraftField::Category, "  ".into());
        let (_, update) = editor.begin_submit().unwrap().unwrap();
        assert_eq!(update.category, None);
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut editor = open_editor();
        editor.set_field(DraftField::Description, "changed".into());
        editor.close();
        assert_eq!(editor.state(), &EditorState::Closed);
        assert!(editor.draft().is_none());
        assert_eq!(editor.begin_submit(), Ok(None));
    }
}
