// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview page — show the finished scan and offer it for download.

use dioxus::prelude::*;

use docsnap_bridge::data_url;
use docsnap_session::Session;

use crate::Route;
use crate::services::app_services::AppServices;

#[component]
pub fn Preview() -> Element {
    let svc = use_context::<AppServices>();
    let mut session = use_context::<Signal<Session>>();
    let mut saved_to = use_signal(|| Option::<String>::None);
    let nav = navigator();

    // Re-encoded only when the output changes
    let preview = use_memo(move || {
        session
            .read()
            .output()
            .map(|output| (data_url("image/png", output.png_bytes()), output.width(), output.height(), output.file_name().to_string()))
    });

    let Some((src, width, height, file_name)) = preview() else {
        return rsx! {
            p { style: "text-align: center; color: #aaa; margin: 48px 0;", "Nothing scanned yet." }
            p { style: "text-align: center;", Link { to: Route::Edit {}, "Back to the corners" } }
        };
    };

    rsx! {
        div {
            img {
                src: "{src}",
                style: "display: block; max-width: 100%; max-height: 65vh; border: 1px solid #ddd; background: white;",
            }
            p { style: "color: #666; font-size: 14px;", "{file_name} ({width}\u{00D7}{height})" }

            div { style: "display: flex; gap: 8px; margin-top: 16px; flex-wrap: wrap;",
                button {
                    style: "flex: 2; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white;",
                    onclick: {
                        let svc = svc.clone();
                        move |_| {
                            if let Ok(Some(path)) = session.write().save_result(svc.bridge()) {
                                saved_to.set(Some(path.display().to_string()));
                            }
                        }
                    },
                    "Download PNG"
                }
                button {
                    style: "flex: 1; padding: 12px; border-radius: 8px; border: 1px solid #ccc; background: white;",
                    onclick: move |_| {
                        session.write().back_to_editing();
                        nav.push(Route::Edit {});
                    },
                    "Adjust Corners"
                }
                button {
                    style: "flex: 1; padding: 12px; border-radius: 8px; border: 1px solid #ff3b30; color: #ff3b30; background: white;",
                    onclick: move |_| {
                        session.write().start_over();
                        tracing::debug!(live_urls = svc.live_urls(), "session released");
                        nav.push(Route::Acquire {});
                    },
                    "New Scan"
                }
            }

            if let Some(ref path) = *saved_to.read() {
                p { style: "margin-top: 12px; color: #666; font-size: 14px; text-align: center;",
                    "Saved to {path}"
                }
            }
        }
    }
}
