use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, InputEvent};
use yew::prelude::*;

use super::{
    load_initial, load_more, open_editor, send_receipt_chat, submit_edit, table_view,
    upload_receipt, DraftField, EditorState, RowView, TableBody, TransactionController,
};
use crate::api::HttpApi;
use crate::chat::transcript_view;
use crate::config::TRANSACTIONS_PAGE_SIZE;
use crate::host::{BrowserHost, PageHost};
use crate::layout::{icon_plus, modal, page_shell};

type Shared = Rc<RefCell<TransactionController>>;

#[derive(Properties, PartialEq)]
pub struct TransactionsPageProps {
    pub on_session_expired: Callback<()>,
}

#[function_component(TransactionsPage)]
pub fn transactions_page(props: &TransactionsPageProps) -> Html {
    let api = use_context::<HttpApi>().unwrap_or_default();
    let ctl: Shared = use_mut_ref(|| TransactionController::new(TRANSACTIONS_PAGE_SIZE));
    let force_update = use_force_update();
    let chat_input = use_state(String::new);
    let file_input = use_node_ref();

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
                    load_initial(&ctl, &api, &host).await;
                });
                || ()
            },
            (),
        );
    }

    let view = table_view(&ctl.borrow().list);
    let editor_state = ctl.borrow().editor.state().clone();
    let (receipt_open, chat_visible, uploading, transcript) = {
        let ctl = ctl.borrow();
        (
            ctl.receipt.is_open(),
            ctl.receipt.chat_visible(),
            ctl.receipt.is_uploading(),
            ctl.receipt.transcript().clone(),
        )
    };

    let on_load_more = {
        let ctl = ctl.clone();
        let api = api.clone();
        let host = host.clone();
        Callback::from(move |_: MouseEvent| {
            let (ctl, api, host) = (ctl.clone(), api.clone(), host.clone());
            spawn_local(async move {
                load_more(&ctl, &api, &host).await;
            });
        })
    };

    let on_edit = {
        let ctl = ctl.clone();
        let api = api.clone();
        let host = host.clone();
        Callback::from(move |id| {
            let (ctl, api, host) = (ctl.clone(), api.clone(), host.clone());
            spawn_local(async move {
                open_editor(&ctl, &api, &host, id).await;
            });
        })
    };

    let field_input = |field: DraftField| {
        let ctl = ctl.clone();
        let host = host.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            ctl.borrow_mut().editor.set_field(field, input.value());
            host.refresh();
        })
    };

    let on_save = {
        let ctl = ctl.clone();
        let api = api.clone();
        let host = host.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let (ctl, api, host) = (ctl.clone(), api.clone(), host.clone());
            spawn_local(async move {
                submit_edit(&ctl, &api, &host).await;
            });
        })
    };

    let on_cancel_edit = {
        let ctl = ctl.clone();
        let host = host.clone();
        Callback::from(move |_: MouseEvent| {
            ctl.borrow_mut().editor.close();
            host.refresh();
        })
    };

    let on_open_receipt = {
        let ctl = ctl.clone();
        let host = host.clone();
        let chat_input = chat_input.clone();
        Callback::from(move |_: MouseEvent| {
            ctl.borrow_mut().receipt.open();
            chat_input.set(String::new());
            host.refresh();
        })
    };

    let on_close_receipt = {
        let ctl = ctl.clone();
        let host = host.clone();
        Callback::from(move |_: MouseEvent| {
            ctl.borrow_mut().receipt.close();
            host.refresh();
        })
    };

    let on_upload = {
        let ctl = ctl.clone();
        let api = api.clone();
        let host = host.clone();
        let file_input = file_input.clone();
        Callback::from(move |_: MouseEvent| {
            let input = file_input.cast::<HtmlInputElement>();
            let file = input
                .as_ref()
                .and_then(|input| input.files())
                .and_then(|files| files.get(0));
            let (ctl, api, host) = (ctl.clone(), api.clone(), host.clone());
            spawn_local(async move {
                if upload_receipt(&ctl, &api, &host, file).await {
                    if let Some(input) = input {
                        input.set_value("");
                    }
                }
            });
        })
    };

    let on_chat_submit = {
        let ctl = ctl.clone();
        let api = api.clone();
        let host = host.clone();
        let chat_input = chat_input.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let text = (*chat_input).clone();
            chat_input.set(String::new());
            let (ctl, api, host) = (ctl.clone(), api.clone(), host.clone());
            spawn_local(async move {
                send_receipt_chat(&ctl, &api, &host, &text).await;
            });
        })
    };

    let on_chat_input = {
        let chat_input = chat_input.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            chat_input.set(input.value());
        })
    };

    let body = match &view.body {
        TableBody::Placeholder(text) | TableBody::Empty(text) => html! {
            <tr><td colspan="5" class="px-8 py-6 text-center text-muted-foreground">{ *text }</td></tr>
        },
        TableBody::Error(text) => html! {
            <tr><td colspan="5" class="px-8 py-6 text-center text-red-500">{ *text }</td></tr>
        },
        TableBody::Rows(rows) => html! {
            <>
                { for rows.iter().map(|row| table_row(row, on_edit.clone())) }
            </>
        },
    };

    let edit_dialog = match &editor_state {
        EditorState::Open(draft) | EditorState::Submitting(draft) => {
            let submitting = matches!(editor_state, EditorState::Submitting(_));
            modal(
                "Edit Expense",
                on_cancel_edit.clone(),
                html! {
                    <form class="space-y-3" onsubmit={on_save}>
                        <div class="space-y-1">
                            <label class="text-[12px] font-bold text-muted-foreground">{"Description"}</label>
                            <input type="text" value={draft.description.clone()} oninput={field_input(DraftField::Description)} class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-[13px] text-[#173E63] border-none" />
                        </div>
                        <div class="space-y-1">
                            <label class="text-[12px] font-bold text-muted-foreground">{"Amount"}</label>
                            <input type="number" step="0.01" value={draft.amount.clone()} oninput={field_input(DraftField::Amount)} class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-[13px] text-[#173E63] border-none" />
                        </div>
                        <div class="space-y-1">
                            <label class="text-[12px] font-bold text-muted-foreground">{"Category"}</label>
                            <input type="text" placeholder="Uncategorized" value={draft.category.clone()} oninput={field_input(DraftField::Category)} class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-[13px] text-[#173E63] border-none" />
                        </div>
                        <div class="space-y-1">
                            <label class="text-[12px] font-bold text-muted-foreground">{"Date"}</label>
                            <input type="date" value={draft.date.clone()} oninput={field_input(DraftField::Date)} class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-[13px] text-[#173E63] border-none" />
                        </div>
                        <div class="flex gap-3 pt-2">
                            <button type="submit" disabled={submitting} class="flex-1 bg-[#173E63] text-white py-2 rounded-[10px] text-[12px] font-bold">
                                { if submitting { "Saving..." } else { "Save Changes" } }
                            </button>
                            <button type="button" onclick={on_cancel_edit} class="flex-1 bg-[#B2CBDE] text-[#173E63] py-2 rounded-[10px] text-[12px] font-bold">{"Cancel"}</button>
                        </div>
                    </form>
                },
            )
        }
        _ => html! {},
    };

    let receipt_dialog = if receipt_open {
        modal(
            "Upload Receipt",
            on_close_receipt,
            html! {
                <div class="space-y-4">
                    <div class="flex gap-3 items-center">
                        <input ref={file_input} type="file" accept="image/*" class="flex-1 text-[12px]" />
                        <button type="button" onclick={on_upload} disabled={uploading} class="bg-[#173E63] text-white px-4 py-2 rounded-[10px] text-[12px] font-bold">
                            { if uploading { "Processing..." } else { "Upload" } }
                        </button>
                    </div>
                    if chat_visible {
                        <div class="border-t border-border pt-4">
                            <div class="h-64 overflow-y-auto space-y-3 mb-3">
                                { transcript_view(&transcript) }
                            </div>
                            <form class="flex gap-2" onsubmit={on_chat_submit}>
                                <input
                                    class="flex-1 px-3 py-2 bg-input border border-input rounded-lg text-[13px]"
                                    placeholder="Ask about this receipt..."
                                    value={(*chat_input).clone()}
                                    oninput={on_chat_input}
                                />
                                <button type="submit" class="bg-primary text-primary-foreground px-4 rounded-lg text-[12px] font-semibold">{"Send"}</button>
                            </form>
                        </div>
                    }
                </div>
            },
        )
    } else {
        html! {}
    };

    html! {
        <>
            { page_shell(
                "Transactions",
                html! {
                    <button onclick={on_open_receipt} class="flex items-center gap-2 bg-[#173E63] text-white px-4 py-2 rounded-[10px] text-[12px] font-bold">
                        { icon_plus() }
                        <span>{"Upload Receipt"}</span>
                    </button>
                },
                html! {
                    <div class="bg-card rounded-2xl shadow-md border border-border overflow-hidden">
                        <div class="overflow-x-auto">
                            <table class="w-full text-left border-collapse">
                                <thead>
                                    <tr class="bg-muted text-muted-foreground text-[10px] uppercase tracking-widest">
                                        <th class="px-8 py-4 font-bold">{"Date"}</th>
                                        <th class="px-8 py-4 font-bold">{"Description"}</th>
                                        <th class="px-8 py-4 font-bold">{"Category"}</th>
                                        <th class="px-8 py-4 font-bold">{"Amount"}</th>
                                        <th class="px-8 py-4 font-bold">{"Action"}</th>
                                    </tr>
                                </thead>
                                <tbody class="divide-y divide-border">
                                    { body }
                                </tbody>
                            </table>
                        </div>
                        {
                            if let Some(error) = view.footer_error {
                                html! { <p class="px-8 py-3 text-sm text-red-500">{ error }</p> }
                            } else { html!{} }
                        }
                        if view.show_load_more {
                            <div class="p-4 flex justify-center border-t border-border">
                                <button onclick={on_load_more} disabled={view.loading_more} class="bg-[#B2CBDE] text-[#173E63] px-6 py-2 rounded-[10px] text-[12px] font-bold">
                                    { if view.loading_more { "Loading..." } else { "Load More" } }
                                </button>
                            </div>
                        }
                    </div>
                },
            ) }
            { edit_dialog }
            { receipt_dialog }
        </>
    }
}

fn table_row(row: &RowView, on_edit: Callback<i64>) -> Html {
    let id = row.id;
    html! {
        <tr key={id} class="text-sm hover:bg-muted/40 transition-colors group">
            <td class="px-8 py-4 text-muted-foreground">{ row.date.clone() }</td>
            <td class="px-8 py-4 text-foreground">{ row.description.clone() }</td>
            <td class="px-8 py-4">
                <span class="bg-secondary text-secondary-foreground px-3 py-1 rounded-full text-[10px] font-bold">{ row.category.clone() }</span>
            </td>
            <td class="px-8 py-4 font-semibold text-red-600">{ row.amount.clone() }</td>
            <td class="px-8 py-4">
                <button type="button" class="text-[#173E63] text-[12px] font-bold hover:underline" onclick={Callback::from(move |_| on_edit.emit(id))}>{"Edit"}</button>
            </td>
        </tr>
    }
}
