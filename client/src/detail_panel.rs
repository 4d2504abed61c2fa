use std::rc::Rc;

use leptos::prelude::*;
use leakmap_shared::colors::{RiskLevel, rgba_css};
use web_sys::{PointerEvent, WheelEvent};

use crate::map_view::{MapModel, ZoomButton, view_box_point};
use crate::render_loop::{FrameLoop, now_ms};

fn risk_accent(risk: Option<RiskLevel>) -> String {
    match risk {
        Some(level) => {
            let (r, g, b) = level.color();
            rgba_css(r, g, b, 1.0)
        }
        None => "#5a5860".to_string(),
    }
}

/// Drill-down card for the selected district: its own outline with
/// independent pan/zoom, plus the metric summary.
#[component]
pub fn DetailPanelView() -> impl IntoView {
    let MapModel(model) = expect_context();
    let detail_viewport = model.with_untracked(|m| m.config().detail_viewport);

    let title = Memo::new(move |_| {
        model.with(|m| m.detail().map(|d| d.canonical().to_owned()).unwrap_or_default())
    });
    let summary = Memo::new(move |_| model.with(|m| m.detail().map(|d| d.summary().clone())));
    let transform = Memo::new(move |_| {
        model.with(|m| m.detail().map(|d| d.transform()).unwrap_or_default())
    });
    let paths = Memo::new(move |_| {
        model.with(|m| {
            m.detail()
                .map(|d| {
                    d.geometry()
                        .paths()
                        .iter()
                        .map(|p| p.d.clone())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        })
    });
    let fill = Memo::new(move |_| {
        summary.with(|s| {
            let accent = s.as_ref().and_then(|s| s.risk);
            match accent {
                Some(level) => {
                    let (r, g, b) = level.color();
                    rgba_css(r, g, b, 0.75)
                }
                None => "rgba(148,163,184,0.6)".to_string(),
            }
        })
    });

    let svg_ref = NodeRef::<leptos::svg::Svg>::new();
    let frames = Rc::new(FrameLoop::new(move |now| {
        model.try_update(|m| m.tick(now)).unwrap_or(false)
    }));

    let on_pointer_down = move |e: PointerEvent| {
        if let Some(svg) = svg_ref.get_untracked() {
            let (x, y) = view_box_point(&svg, &e, detail_viewport);
            model.update(|m| {
                if let Some(detail) = m.detail_mut() {
                    detail.pointer_down(x, y);
                }
            });
        }
    };
    let on_pointer_move = move |e: PointerEvent| {
        if let Some(svg) = svg_ref.get_untracked() {
            let (x, y) = view_box_point(&svg, &e, detail_viewport);
            model.update(|m| {
                if let Some(detail) = m.detail_mut() {
                    detail.pointer_drag(x, y);
                }
            });
        }
    };
    let on_pointer_end = move |_: PointerEvent| {
        model.update(|m| {
            if let Some(detail) = m.detail_mut() {
                detail.pointer_up();
            }
        });
    };
    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        if let Some(svg) = svg_ref.get_untracked() {
            let (x, y) = view_box_point(&svg, &e, detail_viewport);
            model.update(|m| {
                if let Some(detail) = m.detail_mut() {
                    detail.zoom_at(e.delta_y(), x, y);
                }
            });
        }
    };

    let zoom_in = {
        let frames = frames.clone();
        move |_| {
            model.update(|m| {
                if let Some(detail) = m.detail_mut() {
                    detail.zoom_in(now_ms());
                }
            });
            frames.start();
        }
    };
    let zoom_out = {
        let frames = frames.clone();
        move |_| {
            model.update(|m| {
                if let Some(detail) = m.detail_mut() {
                    detail.zoom_out(now_ms());
                }
            });
            frames.start();
        }
    };
    let reset = move |_| {
        model.update(|m| {
            if let Some(detail) = m.detail_mut() {
                detail.reset();
            }
        })
    };

    view! {
        <div style="position: absolute; top: 10px; left: 10px; width: 300px; max-width: calc(100% - 20px); z-index: 20; background: #13161f; border: 1px solid #282c3e; border-radius: 8px; box-shadow: 0 8px 24px rgba(0,0,0,0.55); overflow: hidden;">
            <div style="display: flex; align-items: center; justify-content: space-between; padding: 9px 12px; border-bottom: 1px solid rgba(40,44,62,0.6);">
                <div style="display: flex; align-items: center; gap: 8px; min-width: 0;">
                    <span style={move || format!(
                        "width: 8px; height: 8px; border-radius: 50%; flex-shrink: 0; background: {};",
                        risk_accent(summary.get().and_then(|s| s.risk))
                    )} />
                    <span style="font-size: 0.9rem; font-weight: 700; color: #e2e0d8; white-space: nowrap; overflow: hidden; text-overflow: ellipsis;">
                        {move || title.get()}
                    </span>
                </div>
                <button
                    title="Close"
                    style="background: none; border: none; color: #9a9590; cursor: pointer; font-size: 1rem; line-height: 1;"
                    on:click=move |_| model.update(|m| m.close_detail())
                >
                    "\u{2715}"
                </button>
            </div>

            <div style="position: relative; background: #0f1117;">
                <svg
                    node_ref=svg_ref
                    viewBox=format!("0 0 {} {}", detail_viewport.width, detail_viewport.height)
                    style="display: block; width: 100%; height: auto; touch-action: none; cursor: grab;"
                    on:pointerdown=on_pointer_down
                    on:pointermove=on_pointer_move
                    on:pointerup=on_pointer_end
                    on:pointerleave=on_pointer_end
                    on:wheel=on_wheel
                >
                    <g transform=move || transform.get().svg_transform()>
                        <For
                            each={move || paths.get().into_iter().enumerate().collect::<Vec<_>>()}
                            key=|(idx, d)| (*idx, d.len())
                            children=move |(_, d)| view! {
                                <path
                                    d=d
                                    fill=move || fill.get()
                                    stroke="#1e40af"
                                    stroke-width=1.5
                                    vector-effect="non-scaling-stroke"
                                />
                            }
                        />
                    </g>
                </svg>
                <div style="position: absolute; top: 6px; right: 6px; display: flex; gap: 4px;">
                    <ZoomButton label="+" title="Zoom in" on_press=zoom_in />
                    <ZoomButton label="\u{2212}" title="Zoom out" on_press=zoom_out />
                    <ZoomButton label="\u{21BA}" title="Reset view" on_press=reset />
                </div>
            </div>

            <div style="padding: 6px 12px 10px;">
                {move || summary.get().map(|s| {
                    s.rows()
                        .into_iter()
                        .map(|(label, value)| view! {
                            <div style="display: flex; align-items: center; justify-content: space-between; padding: 5px 0; border-bottom: 1px solid rgba(40,44,62,0.4);">
                                <span style="font-size: 0.74rem; color: #9a9590;">{label}</span>
                                <span style="font-size: 0.74rem; color: #e2e0d8; font-family: 'JetBrains Mono', monospace; font-variant-numeric: tabular-nums;">
                                    {value}
                                </span>
                            </div>
                        })
                        .collect_view()
                })}
            </div>
        </div>
    }
}
