mod editor;
mod list;
mod page;
mod receipt;

use std::cell::RefCell;

pub use editor::{DraftField, Editor, EditorOutcome, EditorState};
pub use list::{table_view, Completion, PageCursor, PageRequest, RowView, TableBody};
pub use page::TransactionsPage;
pub use receipt::{ReceiptPanel, UploadOutcome};

use crate::api::FinanceApi;
use crate::chat::ChatOutcome;
use crate::host::PageHost;
use crate::models::ExpenseId;

#[derive(Debug)]
pub struct TransactionController {
    pub list: PageCursor,
    pub editor: Editor,
    pub receipt: ReceiptPanel,
    expired: bool,
}

impl TransactionController {
    pub fn new(page_size: usize) -> Self {
        Self {
            list: PageCursor::new(page_size),
            editor: Editor::default(),
            receipt: ReceiptPanel::default(),
            expired: false,
        }
    }

    /// After a 401 the page issues no further requests.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    fn expire(&mut self) -> bool {
        !std::mem::replace(&mut self.expired, true)
    }
}

fn expire_session<H: PageHost + ?Sized>(ctl: &RefCell<TransactionController>, host: &H) {
    if ctl.borrow_mut().expire() {
        host.session_expired();
    }
}

async fn fetch_page<A, H>(ctl: &RefCell<TransactionController>, api: &A, host: &H, request: PageRequest)
where
    A: FinanceApi + ?Sized,
    H: PageHost + ?Sized,
{
    host.refresh();
    let result = api.list_expenses(request.skip, request.limit).await;
    let completion = ctl.borrow_mut().list.complete(request, result);
    if completion == Completion::Unauthorized {
        expire_session(ctl, host);
    }
    host.refresh();
}

pub async fn load_initial<A, H>(ctl: &RefCell<TransactionController>, api: &A, host: &H)
where
    A: FinanceApi + ?Sized,
    H: PageHost + ?Sized,
{
    let request = {
        let mut ctl = ctl.borrow_mut();
        if ctl.is_expired() {
            return;
        }
        ctl.list.begin_initial()
    };
    fetch_page(ctl, api, host, request).await;
}

pub async fn load_more<A, H>(ctl: &RefCell<TransactionController>, api: &A, host: &H)
where
    A: FinanceApi + ?Sized,
    H: PageHost + ?Sized,
{
    let request = {
        let mut ctl = ctl.borrow_mut();
        if ctl.is_expired() {
            return;
        }
        ctl.list.begin_more()
    };
    if let Some(request) = request {
        fetch_page(ctl, api, host, request).await;
    }
}

pub async fn open_editor<A, H>(ctl: &RefCell<TransactionController>, api: &A, host: &H, id: ExpenseId)
where
    A: FinanceApi + ?Sized,
    H: PageHost + ?Sized,
{
    {
        let mut ctl = ctl.borrow_mut();
        if ctl.is_expired() {
            return;
        }
        ctl.editor.begin_edit(id);
    }
    let result = api.get_expense(id).await;
    let outcome = ctl.borrow_mut().editor.finish_fetch(id, result);
    match outcome {
        EditorOutcome::Failed(message) => host.notify(&message),
        EditorOutcome::Unauthorized => expire_session(ctl, host),
        _ => {}
    }
    host.refresh();
}

pub async fn submit_edit<A, H>(ctl: &RefCell<TransactionController>, api: &A, host: &H)
where
    A: FinanceApi + ?Sized,
    H: PageHost + ?Sized,
{
    let submission = {
        let mut ctl = ctl.borrow_mut();
        if ctl.is_expired() {
            return;
        }
        ctl.editor.begin_submit()
    };
    let (id, update) = match submission {
        Ok(Some(submission)) => submission,
        Ok(None) => return,
        Err(reason) => {
            host.notify(&reason);
            return;
        }
    };
    host.refresh();

    let result = api.update_expense(id, &update).await;
    let outcome = ctl.borrow_mut().editor.finish_submit(id, result);
    match outcome {
        EditorOutcome::Saved => {
            log::info!("expense {} updated, reloading", id);
            load_initial(ctl, api, host).await;
            return;
        }
        EditorOutcome::Failed(message) => host.notify(&message),
        EditorOutcome::Unauthorized => expire_session(ctl, host),
        _ => {}
    }
    host.refresh();
}

/// Uploads the selected receipt. Returns `true` when the file was accepted so
/// the caller can clear its file input.
pub async fn upload_receipt<A, H>(
    ctl: &RefCell<TransactionController>,
    api: &A,
    host: &H,
    file: Option<A::Upload>,
) -> bool
where
    A: FinanceApi + ?Sized,
    H: PageHost + ?Sized,
{
    let Some(file) = file else {
        return false;
    };
    let ticket = {
        let mut ctl = ctl.borrow_mut();
        if ctl.is_expired() {
            return false;
        }
        ctl.receipt.begin_upload()
    };
    host.refresh();

    let result = api.upload_receipt(file).await;
    let outcome = ctl.borrow_mut().receipt.finish_upload(ticket, result);
    match outcome {
        UploadOutcome::Created(_) => {
            load_initial(ctl, api, host).await;
            true
        }
        UploadOutcome::Failed(message) => {
            host.notify(message);
            host.refresh();
            false
        }
        UploadOutcome::Unauthorized => {
            expire_session(ctl, host);
            host.refresh();
            false
        }
    }
}

pub async fn send_receipt_chat<A, H>(ctl: &RefCell<TransactionController>, api: &A, host: &H, input: &str)
where
    A: FinanceApi + ?Sized,
    H: PageHost + ?Sized,
{
    let request = {
        let mut ctl = ctl.borrow_mut();
        if ctl.is_expired() {
            return;
        }
        ctl.receipt.begin_chat(input)
    };
    let Some((message, scope)) = request else {
        return;
    };
    host.refresh();

    let result = api.chat(&message, scope).await;
    let outcome = ctl.borrow_mut().receipt.finish_chat(result);
    if outcome == ChatOutcome::Unauthorized {
        expire_session(ctl, host);
    }
    host.refresh();
}
