// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Acquire page — choose an image file or capture one from the camera.

use dioxus::prelude::*;

use docsnap_bridge::NativeFilePicker;
use docsnap_session::{Readiness, Session};

use crate::Route;
use crate::services::app_services::AppServices;

#[component]
pub fn Acquire() -> Element {
    let svc = use_context::<AppServices>();
    let mut session = use_context::<Signal<Session>>();
    let mut camera_ready = use_signal(|| false);
    let nav = navigator();

    let camera_active = session.read().camera_active();

    rsx! {
        div {
            h1 { "Scan a document" }
            p { style: "color: #666;", "Load a photo of a page, or take one with the camera." }

            // File picker
            button {
                style: "width: 100%; padding: 16px; border-radius: 12px; border: 2px dashed #007aff; color: #007aff; background: white; font-size: 16px; margin: 16px 0 8px;",
                disabled: camera_active,
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        let picked = match svc.bridge().pick_image() {
                            Ok(Some(file)) => file,
                            Ok(None) => return,
                            Err(err) => {
                                session.write().report(err);
                                return;
                            }
                        };
                        if session.write().load_file(picked).is_ok() {
                            nav.push(Route::Edit {});
                        }
                    }
                },
                "Choose Image"
            }

            // Camera
            if !camera_active {
                button {
                    style: "width: 100%; padding: 16px; border-radius: 12px; border: 1px solid #ccc; background: white; font-size: 16px;",
                    onclick: {
                        let svc = svc.clone();
                        move |_| {
                            camera_ready.set(false);
                            if session.write().start_camera(svc.bridge()).is_err() {
                                return;
                            }
                            let Some(mut gate) = session.read().camera_gate() else {
                                return;
                            };
                            spawn(async move {
                                if gate.wait().await == Readiness::Ready {
                                    camera_ready.set(true);
                                }
                            });
                        }
                    },
                    "\u{1F4F7} Use Camera"
                }
            } else {
                div {
                    style: "padding: 16px; border-radius: 12px; border: 1px solid #ccc; background: #111; color: #eee; text-align: center;",
                    p {
                        if *camera_ready.read() { "Camera ready." } else { "Starting camera..." }
                    }
                    div { style: "display: flex; gap: 8px; justify-content: center;",
                        button {
                            style: "padding: 10px 20px; border-radius: 8px; border: none; background: #007aff; color: white;",
                            disabled: !*camera_ready.read(),
                            onclick: move |_| {
                                if session.write().capture().is_ok() {
                                    camera_ready.set(false);
                                    nav.push(Route::Edit {});
                                }
                            },
                            "Capture"
                        }
                        button {
                            style: "padding: 10px 20px; border-radius: 8px; border: 1px solid #ccc; background: white;",
                            onclick: move |_| {
                                session.write().cancel_camera();
                                camera_ready.set(false);
                            },
                            "Cancel"
                        }
                    }
                }
            }

            // Resume an image already loaded
            if session.read().image().is_some() {
                p { style: "margin-top: 16px; text-align: center;",
                    Link { to: Route::Edit {}, "Continue editing the current image" }
                }
            }
        }
    }
}
