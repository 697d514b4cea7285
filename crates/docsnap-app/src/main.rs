// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocSnap — photograph a paper document, mark its corners, and download a
// rectified, cleaned-up scan.
//
// Entry point. Initialises logging and services, creates the editing session,
// and launches the Dioxus UI.

mod pages;
mod services;

use dioxus::prelude::*;

use docsnap_session::Session;

use pages::acquire::Acquire;
use pages::edit::Edit;
use pages::preview::Preview;

use services::app_services::AppServices;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("DocSnap starting");

    dioxus::launch(app);
}

/// Top-level route enum.
#[derive(Debug, Clone, Routable, PartialEq)]
enum Route {
    #[layout(Shell)]
    #[route("/")]
    Acquire {},
    #[route("/edit")]
    Edit {},
    #[route("/result")]
    Preview {},
}

/// Root component.
fn app() -> Element {
    let svc = use_hook(AppServices::init);

    // Services and the single editing session are shared with every page
    use_context_provider(|| svc.clone());
    use_context_provider(|| Signal::new(svc.new_session()));

    rsx! {
        Router::<Route> {}
    }
}

/// Header, error banner, and the current page.
#[component]
fn Shell() -> Element {
    rsx! {
        div { class: "app-container",
            style: "display: flex; flex-direction: column; height: 100vh; font-family: system-ui, -apple-system, sans-serif;",

            header {
                style: "display: flex; align-items: center; gap: 12px; padding: 10px 16px; border-bottom: 1px solid #e0e0e0; background: #fafafa;",
                span { style: "font-size: 18px; font-weight: 600;", "DocSnap" }
                StepLabel {}
            }

            ErrorBanner {}

            div { class: "page-content",
                style: "flex: 1; overflow-y: auto; padding: 16px;",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn StepLabel() -> Element {
    let session = use_context::<Signal<Session>>();
    let label = match session.read().state() {
        docsnap_session::SessionState::Empty => "1. Choose a photo",
        docsnap_session::SessionState::Editing => "2. Mark the corners",
        docsnap_session::SessionState::Result => "3. Download",
    };
    rsx! {
        span { style: "color: #666; font-size: 14px;", "{label}" }
    }
}

/// Shows the session's last error until dismissed.
#[component]
fn ErrorBanner() -> Element {
    let mut session = use_context::<Signal<Session>>();
    let Some(err) = session.read().error().cloned() else {
        return rsx! {};
    };
    let color = match err.severity {
        docsnap_core::human_errors::Severity::Transient => "#ff9500",
        docsnap_core::human_errors::Severity::ActionRequired => "#007aff",
        docsnap_core::human_errors::Severity::Permanent => "#ff3b30",
    };

    rsx! {
        div {
            style: "margin: 12px 16px 0; padding: 12px; border-radius: 8px; border-left: 4px solid {color}; background: #f7f7f7;",
            strong { "{err.message}" }
            p { style: "margin: 4px 0 0; color: #555; font-size: 14px;", "{err.suggestion}" }
            button {
                style: "margin-top: 8px; padding: 4px 12px; border-radius: 6px; border: 1px solid #ccc; background: white;",
                onclick: move |_| session.write().clear_error(),
                "Dismiss"
            }
        }
    }
}
