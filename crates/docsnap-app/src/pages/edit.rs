// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit page — drag the four corner handles over the loaded image, adjust the
// filters, and run the scan.

use dioxus::prelude::*;

use docsnap_core::{Binarize, CONTRAST_MAX, CONTRAST_MIN, FilterParameters, SHARPNESS_MAX};
use docsnap_session::{PointerInput, Session, SessionState};

use crate::Route;
use crate::services::app_services::AppServices;

#[component]
pub fn Edit() -> Element {
    let mut session = use_context::<Signal<Session>>();
    let nav = navigator();

    let Some(url) = session.read().image().map(|image| image.url().to_string()) else {
        return rsx! {
            p { style: "text-align: center; color: #aaa; margin: 48px 0;", "No image loaded yet." }
            p { style: "text-align: center;", Link { to: Route::Acquire {}, "Choose an image" } }
        };
    };
    let processing = session.read().is_processing();

    rsx! {
        div {
            // Image with corner overlay
            div {
                style: "position: relative; display: inline-block; max-width: 100%; user-select: none;",
                img {
                    src: "{url}",
                    draggable: false,
                    style: "display: block; max-width: 100%; max-height: 65vh;",
                    onresize: move |evt| {
                        if let Ok(size) = evt.get_content_box_size() {
                            session.write().on_display_resize(size.width, size.height);
                        }
                    },
                }
                CornerOverlay {}
                div {
                    style: "position: absolute; inset: 0; cursor: crosshair;",
                    onmousedown: move |evt| {
                        let p = evt.element_coordinates();
                        session.write().grab_at((p.x, p.y));
                    },
                    onmousemove: move |evt| {
                        if session.read().dragging().is_some() {
                            let p = evt.element_coordinates();
                            session.write().move_to((p.x, p.y));
                        }
                    },
                    onmouseup: move |_| session.write().up(),
                    onmouseleave: move |_| session.write().up(),
                }
            }

            FilterControls {}

            // Actions
            div { style: "display: flex; gap: 8px; margin-top: 16px; flex-wrap: wrap;",
                button {
                    style: "flex: 1; padding: 12px; border-radius: 8px; border: 1px solid #ccc; background: white;",
                    disabled: processing,
                    onclick: move |_| session.write().reset_corners(),
                    "Reset Corners"
                }
                button {
                    style: "flex: 1; padding: 12px; border-radius: 8px; border: 1px solid #ccc; background: white;",
                    disabled: processing,
                    onclick: move |_| {
                        nav.push(Route::Acquire {});
                    },
                    "Different Image"
                }
                button {
                    style: "flex: 2; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white;",
                    disabled: processing,
                    onclick: move |_| {
                        let Ok(job) = session.write().begin_processing() else {
                            return;
                        };
                        spawn(async move {
                            let outcome = job.run().await;
                            let finished = session.write().finish_processing(outcome);
                            if finished.is_ok() && session.read().state() == SessionState::Result {
                                nav.push(Route::Preview {});
                            }
                        });
                    },
                    if processing { "Processing..." } else { "Scan" }
                }
            }
        }
    }
}

/// Quadrilateral and handles drawn over the image in display coordinates.
#[component]
fn CornerOverlay() -> Element {
    let session = use_context::<Signal<Session>>();
    let Some(points) = session.read().display_corners() else {
        return rsx! {};
    };
    let outline = points
        .iter()
        .map(|p| format!("{:.1},{:.1}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");

    rsx! {
        svg {
            style: "position: absolute; inset: 0; width: 100%; height: 100%; pointer-events: none; overflow: visible;",
            polygon {
                points: "{outline}",
                fill: "rgba(0, 122, 255, 0.12)",
                stroke: "#007aff",
                stroke_width: "2",
            }
            for p in points {
                circle {
                    cx: "{p.x}",
                    cy: "{p.y}",
                    r: "10",
                    fill: "white",
                    stroke: "#007aff",
                    stroke_width: "3",
                }
            }
        }
    }
}

#[component]
fn FilterControls() -> Element {
    let svc = use_context::<AppServices>();
    let session = use_context::<Signal<Session>>();
    let filters = session.read().filters();

    rsx! {
        div { style: "display: grid; grid-template-columns: auto 1fr auto; gap: 8px 12px; align-items: center; margin-top: 16px; max-width: 520px;",
            label { "Contrast" }
            input {
                r#type: "range",
                min: "{CONTRAST_MIN}",
                max: "{CONTRAST_MAX}",
                value: "{filters.contrast}",
                oninput: {
                    let svc = svc.clone();
                    move |evt: FormEvent| {
                        if let Ok(contrast) = evt.value().parse::<u32>() {
                            apply(session, &svc, FilterParameters::new(contrast, filters.sharpness, filters.binarize));
                        }
                    }
                },
            }
            span { "{filters.contrast}%" }

            label { "Sharpness" }
            input {
                r#type: "range",
                min: "0",
                max: "{SHARPNESS_MAX}",
                value: "{filters.sharpness}",
                oninput: {
                    let svc = svc.clone();
                    move |evt: FormEvent| {
                        if let Ok(sharpness) = evt.value().parse::<u32>() {
                            apply(session, &svc, FilterParameters::new(filters.contrast, sharpness, filters.binarize));
                        }
                    }
                },
            }
            span { "{filters.sharpness}%" }

            label { "Black & white" }
            select {
                value: "{filters.binarize.label()}",
                onchange: move |evt: FormEvent| {
                    if let Some(binarize) = Binarize::from_label(&evt.value()) {
                        apply(session, &svc, FilterParameters::new(filters.contrast, filters.sharpness, binarize));
                    }
                },
                for level in Binarize::ALL {
                    option { value: level.label(), selected: level == filters.binarize, "{level.label()}" }
                }
            }
            span {}
        }
    }
}

/// Use new filter values now and remember them for the next launch.
fn apply(mut session: Signal<Session>, svc: &AppServices, filters: FilterParameters) {
    session.write().set_filters(filters);
    svc.remember_filters(filters);
}
