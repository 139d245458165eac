use std::cell::RefCell;

use wasm_bindgen_futures::spawn_local;
use web_sys::InputEvent;
use yew::prelude::*;

use crate::api::{ChatScope, FinanceApi, HttpApi};
use crate::error::{ApiResult, FailureKind};
use crate::host::{BrowserHost, PageHost};
use crate::layout::page_shell;
use crate::models::ChatReply;

pub const GREETING: &str = "Hello there! How can I help you with your expenses today?";
pub const ASSISTANT_UNAVAILABLE: &str =
    "I'm having trouble connecting to my brain right now. Please try again in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
    System,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub speaker: Speaker,
    pub text: String,
}

/// Append-only conversation log plus the number of replies still awaited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    lines: Vec<ChatLine>,
    pending: usize,
}

impl Transcript {
    pub fn lines(&self) -> &[ChatLine] {
        &self.lines
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.lines.push(ChatLine {
            speaker,
            text: text.into(),
        });
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.pending = 0;
    }

    pub fn begin_request(&mut self) {
        self.pending += 1;
    }

    pub fn end_request(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    /// The "thinking" indicator stays up while any reply is outstanding.
    pub fn is_thinking(&self) -> bool {
        self.pending > 0
    }

    #[cfg(test)]
    pub fn count(&self, speaker: Speaker) -> usize {
        self.lines.iter().filter(|l| l.speaker == speaker).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Replied,
    Failed,
    Unauthorized,
}

#[derive(Debug)]
pub struct AssistantChat {
    transcript: Transcript,
    expired: bool,
}

impl AssistantChat {
    pub fn new() -> Self {
        let mut transcript = Transcript::default();
        transcript.push(Speaker::Assistant, GREETING);
        Self {
            transcript,
            expired: false,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn begin_send(&mut self, input: &str) -> Option<String> {
        let message = input.trim();
        if message.is_empty() || self.expired {
            return None;
        }
        self.transcript.push(Speaker::User, message);
        self.transcript.begin_request();
        Some(message.to_string())
    }

    pub fn finish_send(&mut self, result: ApiResult<ChatReply>) -> ChatOutcome {
        self.transcript.end_request();
        match result {
            Ok(reply) => {
                self.transcript.push(Speaker::Assistant, reply.message);
                ChatOutcome::Replied
            }
            Err(err) => match err.kind() {
                FailureKind::SessionExpired => {
                    self.expired = true;
                    ChatOutcome::Unauthorized
                }
                FailureKind::Rejected => {
                    self.transcript
                        .push(Speaker::Error, err.reason_or("Error", "Something went wrong."));
                    ChatOutcome::Failed
                }
                FailureKind::Unavailable => {
                    log::error!("chat request failed: {}", err);
                    self.transcript.push(Speaker::Error, ASSISTANT_UNAVAILABLE);
                    ChatOutcome::Failed
                }
            },
        }
    }
}

impl Default for AssistantChat {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn send_assistant_message<A, H>(
    chat: &RefCell<AssistantChat>,
    api: &A,
    host: &H,
    input: &str,
) where
    A: FinanceApi + ?Sized,
    H: PageHost + ?Sized,
{
    let Some(message) = chat.borrow_mut().begin_send(input) else {
        return;
    };
    host.refresh();
    let result = api.chat(&message, ChatScope::Assistant).await;
    let outcome = chat.borrow_mut().finish_send(result);
    if outcome == ChatOutcome::Unauthorized {
        host.session_expired();
    }
    host.refresh();
}

pub fn transcript_view(transcript: &Transcript) -> Html {
    html! {
        <>
            { for transcript.lines().iter().map(chat_line) }
            if transcript.is_thinking() {
                <div class="flex items-start gap-4 typing-indicator">
                    <div class="size-10 flex-shrink-0 rounded-full bg-gray-200"></div>
                    <div class="mt-1 rounded-lg rounded-tl-none bg-white p-3 shadow-sm">
                        <p class="text-gray-500">{"AI is thinking..."}</p>
                    </div>
                </div>
            }
        </>
    }
}

fn chat_line(line: &ChatLine) -> Html {
    match line.speaker {
        Speaker::User => html! {
            <div class="flex items-start justify-end gap-4">
                <div class="mt-1 rounded-lg rounded-tr-none bg-primary p-3 text-white">
                    <p>{ line.text.clone() }</p>
                </div>
            </div>
        },
        Speaker::System => html! {
            <div class="text-sm text-gray-500 p-2">{ line.text.clone() }</div>
        },
        Speaker::Assistant | Speaker::Error => {
            let (bubble, text) = if line.speaker == Speaker::Error {
                ("bg-red-100", "text-red-800")
            } else {
                ("bg-white", "text-gray-800")
            };
            html! {
                <div class="flex items-start gap-4">
                    <div class="size-10 flex-shrink-0 rounded-full bg-gray-200"></div>
                    <div class={classes!("mt-1", "rounded-lg", "rounded-tl-none", "p-3", "shadow-sm", bubble)}>
                        <p class={text}>{ line.text.clone() }</p>
                    </div>
                </div>
            }
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct ChatPageProps {
    pub on_session_expired: Callback<()>,
}

#[function_component(ChatPage)]
pub fn chat_page(props: &ChatPageProps) -> Html {
    let api = use_context::<HttpApi>().unwrap_or_default();
    let chat = use_mut_ref(AssistantChat::new);
    let force_update = use_force_update();
    let message = use_state(String::new);

    let host = BrowserHost::new(
        Callback::from(move |_| force_update.force_update()),
        props.on_session_expired.clone(),
    );

    let transcript = chat.borrow().transcript().clone();

    let on_submit = {
        let message = message.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let text = (*message).clone();
            message.set(String::new());
            let chat = chat.clone();
            let api = api.clone();
            let host = host.clone();
            spawn_local(async move {
                send_assistant_message(&chat, &api, &host, &text).await;
            });
        })
    };

    let on_input = {
        let message = message.clone();
        Callback::from(move |e: InputEvent| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            message.set(input.value());
        })
    };

    html! {
        { page_shell(
            "Assistant",
            html! {},
            html! {
                <div class="flex flex-col h-[70vh] bg-card rounded-[10px] border border-border">
                    <div id="chat-messages" class="flex-1 overflow-y-auto p-6 space-y-4">
                        { transcript_view(&transcript) }
                    </div>
                    <form class="flex gap-3 p-4 border-t border-border" onsubmit={on_submit}>
                        <input
                            class="flex-1 px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                            placeholder="Ask about your spending..."
                            value={(*message).clone()}
                            oninput={on_input}
                        />
                        <button type="submit" class="bg-primary text-primary-foreground px-4 rounded-lg font-semibold">{"Send"}</button>
                    </form>
                </div>
            }
        ) }
    }
}
