mod api;
mod auth;
mod budgets;
mod chat;
mod config;
mod dashboard;
mod error;
mod format;
mod host;
mod layout;
mod models;
mod session;
mod transactions;

#[cfg(test)]
mod testing;

use yew::prelude::*;

use crate::api::HttpApi;
use crate::auth::{AuthScreen, AuthSurface};
use crate::budgets::BudgetsPage;
use crate::chat::ChatPage;
use crate::dashboard::DashboardPage;
use crate::layout::{Layout, Page};
use crate::session::{guard, BrowserStore};
use crate::transactions::TransactionsPage;

#[derive(Clone, Copy, PartialEq)]
enum Surface {
    SignedOut(AuthSurface),
    SignedIn(Page),
}

#[function_component(App)]
fn app() -> Html {
    let token = use_state(|| guard(&BrowserStore));
    let signed_in = token.is_some();
    let surface = use_state(move || {
        if signed_in {
            Surface::SignedIn(Page::Chat)
        } else {
            Surface::SignedOut(AuthSurface::Login)
        }
    });

    let to_login = {
        let token = token.clone();
        let surface = surface.clone();
        Callback::from(move |_| {
            token.set(None);
            surface.set(Surface::SignedOut(AuthSurface::Login));
        })
    };

    let on_logout = {
        let to_login = to_login.clone();
        Callback::from(move |_| {
            auth::logout(&BrowserStore);
            to_login.emit(());
        })
    };

    let on_select = {
        let surface = surface.clone();
        Callback::from(move |page: Page| surface.set(Surface::SignedIn(page)))
    };

    let on_navigate = {
        let surface = surface.clone();
        Callback::from(move |next: AuthSurface| surface.set(Surface::SignedOut(next)))
    };

    let on_signed_in = {
        let token = token.clone();
        let surface = surface.clone();
        Callback::from(move |access_token: String| {
            token.set(Some(access_token));
            surface.set(Surface::SignedIn(Page::Chat));
        })
    };

    let (active_page, token) = match (*surface, (*token).clone()) {
        (Surface::SignedIn(page), Some(token)) => (page, token),
        (current, _) => {
            let current = match current {
                Surface::SignedOut(auth) => auth,
                Surface::SignedIn(_) => AuthSurface::Login,
            };
            return html! {
                <AuthScreen surface={current} on_navigate={on_navigate} on_signed_in={on_signed_in} />
            };
        }
    };

    let content = match active_page {
        Page::Chat => html! { <ChatPage on_session_expired={to_login.clone()} /> },
        Page::Dashboard => html! { <DashboardPage on_session_expired={to_login.clone()} /> },
        Page::Budgets => html! { <BudgetsPage on_session_expired={to_login.clone()} /> },
        Page::Transactions => {
            html! { <TransactionsPage on_session_expired={to_login.clone()} /> }
        }
    };

    html! {
        <ContextProvider<HttpApi> context={HttpApi::new(Some(token))}>
            <Layout active_page={active_page} on_select={on_select} on_logout={on_logout}>
                { content }
            </Layout>
        </ContextProvider<HttpApi>>
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    console_error_panic_hook::set_once();
    yew::Renderer::<App>::new().render();
}
