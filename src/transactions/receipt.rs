use crate::api::ChatScope;
use crate::chat::{ChatOutcome, Speaker, Transcript};
use crate::error::{ApiResult, FailureKind};
use crate::models::{ChatReply, Expense};

pub const UPLOAD_FAILED: &str = "Failed to process receipt. Please try again.";
pub const UPLOAD_UNAVAILABLE: &str = "An error occurred while processing the receipt.";
pub const CHAT_FAILED: &str = "Error sending message.";
pub const CHAT_UNAVAILABLE: &str = "Could not connect to the chat service.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Created(usize),
    Failed(&'static str),
    Unauthorized,
}

/// Upload issued from one opening of the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
}

#[derive(Debug, Default)]
pub struct ReceiptPanel {
    open: bool,
    chat_visible: bool,
    uploading: bool,
    batch: Option<String>,
    transcript: Transcript,
    generation: u64,
}

impl ReceiptPanel {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn chat_visible(&self) -> bool {
        self.chat_visible
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn batch(&self) -> Option<&str> {
        self.batch.as_deref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn open(&mut self) {
        self.generation += 1;
        self.open = true;
        self.chat_visible = false;
        self.uploading = false;
        self.batch = None;
        self.transcript.clear();
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn begin_upload(&mut self) -> UploadTicket {
        self.uploading = true;
        UploadTicket {
            generation: self.generation,
        }
    }

    /// Applies an upload result. A result from an earlier opening of the
    /// dialog still reports its outcome but leaves the current surface alone.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: ApiResult<Vec<Expense>>,
    ) -> UploadOutcome {
        let current = ticket.generation == self.generation;
        if current {
            self.uploading = false;
        }
        match result {
            Ok(created) if !current => {
                log::debug!("receipt from a closed dialog produced {} expenses", created.len());
                UploadOutcome::Created(created.len())
            }
            Ok(created) => {
                self.chat_visible = true;
                self.transcript.push(
                    Speaker::System,
                    format!("Created {} expenses from the receipt.", created.len()),
                );
                self.batch = created.first().and_then(|e| e.receipt_group_id.clone());
                log::info!(
                    "receipt produced {} expenses (group {:?})",
                    created.len(),
                    self.batch
                );
                UploadOutcome::Created(created.len())
            }
            Err(err) => match err.kind() {
                FailureKind::SessionExpired => UploadOutcome::Unauthorized,
                FailureKind::Rejected => {
                    log::error!("failed to process receipt: {}", err);
                    UploadOutcome::Failed(UPLOAD_FAILED)
                }
                FailureKind::Unavailable => {
                    log::error!("error processing receipt: {}", err);
                    UploadOutcome::Failed(UPLOAD_UNAVAILABLE)
                }
            },
        }
    }

    pub fn begin_chat(&mut self, input: &str) -> Option<(String, ChatScope)> {
        let message = input.trim();
        if message.is_empty() {
            return None;
        }
        self.transcript.push(Speaker::User, message);
        self.transcript.begin_request();
        Some((message.to_string(), ChatScope::for_batch(self.batch())))
    }

    pub fn finish_chat(&mut self, result: ApiResult<ChatReply>) -> ChatOutcome {
        self.transcript.end_request();
        match result {
            Ok(reply) => {
                self.transcript.push(Speaker::Assistant, reply.message);
                ChatOutcome::Replied
            }
            Err(err) => {
                let line = match err.kind() {
                    FailureKind::SessionExpired => return ChatOutcome::Unauthorized,
                    FailureKind::Rejected => CHAT_FAILED,
                    FailureKind::Unavailable => CHAT_UNAVAILABLE,
                };
                log::error!("receipt chat failed: {}", err);
                self.transcript.push(Speaker::Error, line);
                ChatOutcome::Failed
            }
        }
    }
}
