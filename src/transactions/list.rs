//! Offset/limit cursor over `/expenses` and the table view derived from it.

use crate::error::{ApiError, ApiResult};
use crate::format::{format_long_date, format_outflow};
use crate::models::{Expense, ExpenseId};

pub const LOADING_MESSAGE: &str = "Loading...";
pub const EMPTY_MESSAGE: &str = "No transactions found.";
pub const ERROR_MESSAGE: &str = "Could not load transactions. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Replace,
    Append,
}

/// One page fetch handed out by the cursor. Completing it with a response
/// that belongs to an older generation is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub skip: usize,
    pub limit: usize,
    pub mode: LoadMode,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
    Failed,
    Unauthorized,
}

#[derive(Debug)]
pub struct PageCursor {
    limit: usize,
    offset: usize,
    rows: Vec<Expense>,
    status: ListStatus,
    has_more: bool,
    append_failed: bool,
    in_flight: bool,
    generation: u64,
}

impl PageCursor {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            offset: 0,
            rows: Vec::new(),
            status: ListStatus::Loading,
            has_more: false,
            append_failed: false,
            in_flight: false,
            generation: 0,
        }
    }

    #[cfg(test)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Expense] {
        &self.rows
    }

    pub fn has_more(&self) -> bool {
        self.has_more && self.status == ListStatus::Loaded
    }

    pub fn begin_initial(&mut self) -> PageRequest {
        self.generation += 1;
        self.offset = 0;
        self.rows.clear();
        self.status = ListStatus::Loading;
        self.has_more = false;
        self.append_failed = false;
        self.in_flight = true;
        PageRequest {
            skip: 0,
            limit: self.limit,
            mode: LoadMode::Replace,
            generation: self.generation,
        }
    }

    /// Advances the window by one page. Returns `None` while another page is
    /// loading or when the control is hidden, so appends never interleave.
    pub fn begin_more(&mut self) -> Option<PageRequest> {
        if self.in_flight || !self.has_more() {
            return None;
        }
        self.offset += self.limit;
        self.append_failed = false;
        self.in_flight = true;
        Some(PageRequest {
            skip: self.offset,
            limit: self.limit,
            mode: LoadMode::Append,
            generation: self.generation,
        })
    }

    pub fn complete(&mut self, request: PageRequest, result: ApiResult<Vec<Expense>>) -> Completion {
        if request.generation != self.generation {
            log::debug!("dropping stale page at offset {}", request.skip);
            return Completion::Stale;
        }
        self.in_flight = false;

        match result {
            Ok(page) => {
                // A full page implies more may exist.
                self.has_more = page.len() == self.limit;
                match request.mode {
                    LoadMode::Replace => self.rows = page,
                    LoadMode::Append => self.rows.extend(page),
                }
                self.status = ListStatus::Loaded;
                Completion::Applied
            }
            Err(err) => {
                if request.mode == LoadMode::Append {
                    // Keep the window a prefix of the collection.
                    self.offset = self.offset.saturating_sub(self.limit);
                    self.append_failed = true;
                } else {
                    self.rows.clear();
                    self.has_more = false;
                    self.status = ListStatus::Failed;
                }
                match err {
                    ApiError::Unauthorized => Completion::Unauthorized,
                    other => {
                        log::error!("could not load transactions: {}", other);
                        Completion::Failed
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub id: ExpenseId,
    pub date: String,
    pub description: String,
    pub category: String,
    pub amount: String,
}

impl From<&Expense> for RowView {
    fn from(expense: &Expense) -> Self {
        Self {
            id: expense.id,
            date: format_long_date(&expense.date),
            description: expense.description.clone(),
            category: expense
                .category
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "Uncategorized".to_string()),
            amount: format_outflow(expense.amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableBody {
    Placeholder(&'static str),
    Empty(&'static str),
    Error(&'static str),
    Rows(Vec<RowView>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub body: TableBody,
    /// Shown under the rows after a failed "load more".
    pub footer_error: Option<&'static str>,
    pub show_load_more: bool,
    pub loading_more: bool,
}

pub fn table_view(cursor: &PageCursor) -> TableView {
    let body = match cursor.status {
        ListStatus::Loading => TableBody::Placeholder(LOADING_MESSAGE),
        ListStatus::Failed => TableBody::Error(ERROR_MESSAGE),
        ListStatus::Loaded if cursor.rows.is_empty() => TableBody::Empty(EMPTY_MESSAGE),
        ListStatus::Loaded => TableBody::Rows(cursor.rows.iter().map(RowView::from).collect()),
    };
    TableView {
        body,
        footer_error: cursor.append_failed.then_some(ERROR_MESSAGE),
        show_load_more: cursor.has_more(),
        loading_more: cursor.in_flight && cursor.status == ListStatus::Loaded,
    }
}
