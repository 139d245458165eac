//! Login, signup and e-mail verification.

use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, InputEvent};
use yew::prelude::*;

use crate::api::{FinanceApi, HttpApi};
use crate::error::FailureKind;
use crate::host::{BrowserHost, PageHost};
use crate::models::{Credentials, OtpRequest, SignupRequest};
use crate::session::{BrowserStore, CredentialStore};

pub const LOGIN_UNAVAILABLE: &str = "An error occurred during login. Please try again.";
pub const SIGNUP_UNAVAILABLE: &str = "An error occurred during signup. Please try again.";
pub const OTP_UNAVAILABLE: &str = "An error occurred during verification. Please try again.";
pub const OTP_EMAIL_MISSING: &str =
    "Could not find email for verification. Please sign up again.";
pub const VERIFIED: &str = "Verification successful! You can now log in.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthSurface {
    Login,
    Signup,
    VerifyOtp,
}

/// Where the app goes after an auth form was submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthStep {
    Stay,
    Show(AuthSurface),
    SignedIn(String),
}

pub async fn login<A, S, H>(api: &A, store: &S, host: &H, credentials: &Credentials) -> AuthStep
where
    A: FinanceApi + ?Sized,
    S: CredentialStore + ?Sized,
    H: PageHost + ?Sized,
{
    match api.login(credentials).await {
        Ok(reply) => {
            store.set_token(&reply.access_token);
            log::info!("signed in as {}", credentials.email);
            AuthStep::SignedIn(reply.access_token)
        }
        Err(err) if err.kind() == FailureKind::Unavailable => {
            log::error!("login error: {}", err);
            host.notify(LOGIN_UNAVAILABLE);
            AuthStep::Stay
        }
        Err(err) => {
            host.notify(&err.reason_or("Login failed", "Invalid credentials"));
            AuthStep::Stay
        }
    }
}

pub async fn signup<A, S, H>(api: &A, store: &S, host: &H, request: &SignupRequest) -> AuthStep
where
    A: FinanceApi + ?Sized,
    S: CredentialStore + ?Sized,
    H: PageHost + ?Sized,
{
    match api.signup(request).await {
        Ok(()) => {
            store.set_otp_email(&request.email);
            AuthStep::Show(AuthSurface::VerifyOtp)
        }
        Err(err) if err.kind() == FailureKind::Unavailable => {
            log::error!("signup error: {}", err);
            host.notify(SIGNUP_UNAVAILABLE);
            AuthStep::Stay
        }
        Err(err) => {
            host.notify(&err.reason_or("Signup failed", "Could not create account"));
            AuthStep::Stay
        }
    }
}

/// The line shown above the code field, when the signup email is known.
pub fn otp_prompt<S: CredentialStore + ?Sized>(store: &S) -> Option<String> {
    store
        .otp_email()
        .map(|email| format!("We've sent a 6-digit code to {}.", email))
}

pub async fn verify_otp<A, S, H>(api: &A, store: &S, host: &H, code: &str) -> AuthStep
where
    A: FinanceApi + ?Sized,
    S: CredentialStore + ?Sized,
    H: PageHost + ?Sized,
{
    let Some(email) = store.otp_email() else {
        host.notify(OTP_EMAIL_MISSING);
        return AuthStep::Show(AuthSurface::Signup);
    };
    let request = OtpRequest {
        email,
        code: code.trim().to_string(),
    };
    match api.verify_otp(&request).await {
        Ok(()) => {
            host.notify(VERIFIED);
            store.clear_otp_email();
            AuthStep::Show(AuthSurface::Login)
        }
        Err(err) if err.kind() == FailureKind::Unavailable => {
            log::error!("OTP verification error: {}", err);
            host.notify(OTP_UNAVAILABLE);
            AuthStep::Stay
        }
        Err(err) => {
            host.notify(&err.reason_or("Verification failed", "Invalid or expired OTP"));
            AuthStep::Stay
        }
    }
}

pub fn logout<S: CredentialStore + ?Sized>(store: &S) {
    store.clear_token();
    log::info!("signed out");
}

#[derive(Properties, PartialEq)]
pub struct AuthScreenProps {
    pub surface: AuthSurface,
    pub on_navigate: Callback<AuthSurface>,
    pub on_signed_in: Callback<String>,
}

fn text_input(label: &'static str, kind: &'static str, value: &UseStateHandle<String>) -> Html {
    let oninput = {
        let value = value.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            value.set(input.value());
        })
    };
    html! {
        <div class="space-y-1">
            <label class="text-sm font-medium text-foreground">{ label }</label>
            <input
                type={kind}
                required=true
                class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                value={(**value).clone()}
                oninput={oninput}
            />
        </div>
    }
}

#[function_component(AuthScreen)]
pub fn auth_screen(props: &AuthScreenProps) -> Html {
    let username = use_state(String::new);
    let email = use_state(String::new);
    let password = use_state(String::new);
    let code = use_state(String::new);
    let loading = use_state(|| false);

    let surface = props.surface;

    let on_submit = {
        let username = username.clone();
        let email = email.clone();
        let password = password.clone();
        let code = code.clone();
        let loading = loading.clone();
        let on_navigate = props.on_navigate.clone();
        let on_signed_in = props.on_signed_in.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let api = HttpApi::default();
            let host = BrowserHost::new(Callback::from(|_| ()), Callback::from(|_| ()));
            let username = (*username).clone();
            let email = (*email).clone();
            let password = (*password).clone();
            let code = (*code).clone();
            let loading = loading.clone();
            let on_navigate = on_navigate.clone();
            let on_signed_in = on_signed_in.clone();

            loading.set(true);
            spawn_local(async move {
                let step = match surface {
                    AuthSurface::Login => {
                        let credentials = Credentials { email, password };
                        login(&api, &BrowserStore, &host, &credentials).await
                    }
                    AuthSurface::Signup => {
                        let request = SignupRequest {
                            username,
                            email,
                            password,
                        };
                        signup(&api, &BrowserStore, &host, &request).await
                    }
                    AuthSurface::VerifyOtp => verify_otp(&api, &BrowserStore, &host, &code).await,
                };
                loading.set(false);
                match step {
                    AuthStep::Stay => {}
                    AuthStep::Show(next) => on_navigate.emit(next),
                    AuthStep::SignedIn(token) => on_signed_in.emit(token),
                }
            });
        })
    };

    let go_to = |target: AuthSurface| {
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: MouseEvent| on_navigate.emit(target))
    };

    let (title, subtitle, action) = match surface {
        AuthSurface::Login => ("Welcome back", "Sign in to continue.".to_string(), "Login"),
        AuthSurface::Signup => (
            "Create account",
            "Start tracking your expenses.".to_string(),
            "Sign up",
        ),
        AuthSurface::VerifyOtp => (
            "Verify your email",
            otp_prompt(&BrowserStore).unwrap_or_default(),
            "Verify",
        ),
    };

    html! {
        <div class="min-h-screen flex items-center justify-center bg-background">
            <div class="w-full max-w-md bg-card border border-border rounded-2xl shadow-lg p-8">
                <div class="text-center mb-6">
                    <h1 class="text-2xl font-bold text-foreground">{ title }</h1>
                    <p class="text-sm text-muted-foreground mt-2">{ subtitle }</p>
                </div>

                <form class="space-y-4" onsubmit={on_submit}>
                    if surface == AuthSurface::Signup {
                        { text_input("Username", "text", &username) }
                    }
                    if surface == AuthSurface::VerifyOtp {
                        { text_input("Verification Code", "text", &code) }
                    } else {
                        { text_input("Email", "email", &email) }
                        { text_input("Password", "password", &password) }
                    }

                    <button
                        type="submit"
                        class="w-full bg-primary text-primary-foreground py-2 rounded-lg font-semibold hover:opacity-90 transition-opacity"
                        disabled={*loading}
                    >
                        { if *loading { "Please wait..." } else { action } }
                    </button>
                </form>

                <div class="mt-6 text-center text-sm text-muted-foreground">
                    {
                        match surface {
                            AuthSurface::Login => html! {
                                <>
                                    {"No account?"}
                                    <button class="ml-2 text-primary font-semibold" onclick={go_to(AuthSurface::Signup)}>{"Sign up"}</button>
                                </>
                            },
                            _ => html! {
                                <>
                                    {"Already have an account?"}
                                    <button class="ml-2 text-primary font-semibold" onclick={go_to(AuthSurface::Login)}>{"Login"}</button>
                                </>
                            },
                        }
                    }
                </div>
            </div>
        </div>
    }
}
