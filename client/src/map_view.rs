use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use leakmap_shared::colors::{legend_entries, rgba_css};
use leakmap_shared::{
    AliasMap, ChoroplethModel, MapConfig, MapStatus, MetricRecord, NameReconciler,
    SelectionCallback, ValueFormatter, ViewportSize,
};
use wasm_bindgen::JsCast;
use web_sys::{PointerEvent, WheelEvent};

use crate::detail_panel::DetailPanelView;
use crate::loader::{boundary_url as resolve_boundary_url, fetch_boundaries, report_dropped, report_load};
use crate::render_loop::{FrameLoop, now_ms};

/// Shared model handle for the map and its detail panel.
#[derive(Clone, Copy)]
pub(crate) struct MapModel(pub RwSignal<ChoroplethModel>);

/// Zoom/pan input uses viewBox units; tooltips use container pixels.
pub(crate) fn local_point(el: &web_sys::Element, e: &web_sys::MouseEvent) -> (f64, f64) {
    let rect = el.get_bounding_client_rect();
    (
        e.client_x() as f64 - rect.left(),
        e.client_y() as f64 - rect.top(),
    )
}

pub(crate) fn view_box_point(
    el: &web_sys::Element,
    e: &web_sys::MouseEvent,
    viewport: ViewportSize,
) -> (f64, f64) {
    let rect = el.get_bounding_client_rect();
    let k = if rect.width() > 0.0 {
        viewport.width / rect.width()
    } else {
        1.0
    };
    (
        (e.client_x() as f64 - rect.left()) * k,
        (e.client_y() as f64 - rect.top()) * k,
    )
}

/// Embeddable district choropleth.
///
/// Fetches the boundary dataset once on mount, colours each district by the
/// `metrics` ratio, ranks the three worst and opens a detail panel on click.
/// `on_select` receives the metrics-vocabulary name of the clicked district.
#[component]
pub fn ChoroplethMap(
    #[prop(into)] metrics: Signal<Vec<MetricRecord>>,
    #[prop(optional, into)] boundary_url: Option<String>,
    #[prop(optional, into)] active: MaybeProp<String>,
    #[prop(optional, into)] on_select: Option<Callback<String>>,
    #[prop(optional)] formatter: Option<ValueFormatter>,
    #[prop(optional)] aliases: Option<AliasMap>,
    #[prop(optional)] config: Option<MapConfig>,
) -> impl IntoView {
    let config = config.unwrap_or_default();
    let viewport = config.viewport;
    let keys = config.name_keys.clone();
    let reconciler = aliases
        .map(NameReconciler::new)
        .unwrap_or_else(NameReconciler::with_builtin_aliases);

    let mut initial = ChoroplethModel::new(config, reconciler);
    initial.set_formatter(formatter);
    initial.set_selection_callback(on_select.map(|cb| {
        Arc::new(move |name: &str| cb.run(name.to_owned())) as SelectionCallback
    }));
    let model = RwSignal::new(initial);
    provide_context(MapModel(model));

    let url = resolve_boundary_url(boundary_url.as_deref());
    wasm_bindgen_futures::spawn_local(async move {
        let result = fetch_boundaries(&url, &keys).await;
        report_load(&result, &url);
        let dropped = model.try_update(|m| {
            m.finish_load(result);
            m.dropped().to_vec()
        });
        if let Some(dropped) = dropped {
            report_dropped(&dropped);
        }
    });

    Effect::new(move || {
        let records = metrics.get();
        model.update(|m| m.set_metrics(records));
    });
    Effect::new(move || {
        let name = active.get();
        model.update(|m| m.set_active(name.as_deref()));
    });

    let status = Memo::new(move |_| model.with(|m| m.status()));
    let revision = Memo::new(move |_| model.with(|m| m.geometry_revision()));
    let transform = Memo::new(move |_| model.with(|m| m.transform()));
    let tooltip = Memo::new(move |_| model.with(|m| m.tooltip()));
    let badges = Memo::new(move |_| model.with(|m| m.badges()));
    let labels = Memo::new(move |_| model.with(|m| m.labels()));
    let dragging = Memo::new(move |_| model.with(|m| m.is_dragging()));
    let detail_open = Memo::new(move |_| {
        model.with(|m| m.detail().map(|d| d.canonical().to_owned()))
    });

    let container_ref = NodeRef::<leptos::html::Div>::new();
    let svg_ref = NodeRef::<leptos::svg::Svg>::new();

    let frames = Rc::new(FrameLoop::new(move |now| {
        model.try_update(|m| m.tick(now)).unwrap_or(false)
    }));

    let on_pointer_down = move |e: PointerEvent| {
        if let Some(svg) = svg_ref.get_untracked() {
            let (x, y) = view_box_point(&svg, &e, viewport);
            model.update(|m| m.pointer_down(x, y));
        }
    };

    let on_pointer_move = move |e: PointerEvent| {
        let drag = svg_ref
            .get_untracked()
            .map(|svg| view_box_point(&svg, &e, viewport));
        let anchor = container_ref
            .get_untracked()
            .map(|el| local_point(&el, &e));
        model.update(|m| {
            if let Some((x, y)) = drag {
                m.pointer_drag(x, y);
            }
            if let Some((x, y)) = anchor {
                m.pointer_move(x, y);
            }
        });
    };

    let on_pointer_up = move |_: PointerEvent| model.update(|m| m.pointer_up());

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        if let Some(svg) = svg_ref.get_untracked() {
            let (x, y) = view_box_point(&svg, &e, viewport);
            model.update(|m| m.zoom_at(e.delta_y(), x, y));
        }
    };

    let zoom_in = {
        let frames = frames.clone();
        move |_| {
            model.update(|m| m.zoom_in(now_ms()));
            frames.start();
        }
    };
    let zoom_out = {
        let frames = frames.clone();
        move |_| {
            model.update(|m| m.zoom_out(now_ms()));
            frames.start();
        }
    };
    let reset = move |_| model.update(|m| m.reset_view());

    view! {
        <div
            class="leakmap"
            node_ref=container_ref
            style="position: relative; width: 100%; background: #0f1117; border: 1px solid #282c3e; border-radius: 8px; overflow: hidden; font-family: 'Inter', system-ui, sans-serif;"
        >
            <svg
                node_ref=svg_ref
                viewBox=format!("0 0 {} {}", viewport.width, viewport.height)
                style=move || format!(
                    "display: block; width: 100%; height: auto; touch-action: none; user-select: none; cursor: {};",
                    if dragging.get() { "grabbing" } else { "grab" }
                )
                on:pointerdown=on_pointer_down
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
                on:pointerleave=move |_: PointerEvent| model.update(|m| m.pointer_up())
                on:wheel=on_wheel
            >
                <g transform=move || transform.get().svg_transform()>
                    <For
                        each=move || {
                            revision.track();
                            model.with_untracked(|m| {
                                m.paths()
                                    .iter()
                                    .map(|p| (revision.get_untracked(), p.feature, p.d.clone()))
                                    .collect::<Vec<_>>()
                            })
                        }
                        key=|(rev, feature, _)| (*rev, *feature)
                        children=move |(_, feature, d)| view! { <RegionPath feature=feature d=d /> }
                    />
                    <For
                        each=move || labels.get()
                        key=|label| label.canonical.clone()
                        children=move |label| {
                            let (x, y) = label.position;
                            view! {
                                <text
                                    x=x
                                    y=y
                                    text-anchor="middle"
                                    dominant-baseline="middle"
                                    pointer-events="none"
                                    font-size=move || 9.0 / transform.get().scale
                                    fill="#1f2937"
                                    style="font-weight: 600; paint-order: stroke; stroke: rgba(255,255,255,0.7); stroke-width: 0.6px;"
                                >
                                    {label.canonical}
                                </text>
                            }
                        }
                    />
                    <For
                        each=move || badges.get()
                        key=|badge| (badge.rank, badge.canonical.clone(), badge.ratio_label.clone())
                        children=move |badge| {
                            let (x, y) = badge.position;
                            let text = format!("{} {}", badge.rank_label, badge.ratio_label);
                            view! {
                                <g
                                    pointer-events="none"
                                    transform=move || format!(
                                        "translate({x:.2},{y:.2}) scale({:.4})",
                                        1.0 / transform.get().scale
                                    )
                                >
                                    <rect x=-24 y=-9 width=48 height=18 rx=9 fill="#111827" stroke="#ef4444" stroke-width=1 />
                                    <text
                                        text-anchor="middle"
                                        dominant-baseline="central"
                                        font-size=10
                                        fill="#f9fafb"
                                        style="font-family: 'JetBrains Mono', monospace; font-weight: 700;"
                                    >
                                        {text}
                                    </text>
                                </g>
                            }
                        }
                    />
                </g>
            </svg>

            {move || match status.get() {
                MapStatus::Loading => Some(view! {
                    <div style="position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; color: #9a9590; font-size: 0.85rem;">
                        "Loading map…"
                    </div>
                }.into_any()),
                MapStatus::Unavailable(message) => Some(view! {
                    <div style="position: absolute; inset: 0; display: flex; flex-direction: column; align-items: center; justify-content: center; gap: 6px; background: #0f1117;">
                        <span style="color: #f87171; font-weight: 700; font-size: 0.9rem;">"Map unavailable"</span>
                        <span style="color: #9a9590; font-size: 0.72rem; font-family: 'JetBrains Mono', monospace;">{message}</span>
                    </div>
                }.into_any()),
                MapStatus::Ready => None,
            }}

            {move || tooltip.get().map(|tip| view! {
                <div
                    style:left=format!("{}px", tip.anchor.x + 14.0)
                    style:top=format!("{}px", tip.anchor.y - 10.0)
                    style="position: absolute; pointer-events: none; z-index: 10; background: #161921; border: 1px solid #282c3e; border-radius: 6px; padding: 7px 10px; box-shadow: 0 4px 16px rgba(0,0,0,0.5); min-width: 120px;"
                >
                    <div style="font-size: 0.8rem; font-weight: 700; color: #e2e0d8;">{tip.name}</div>
                    <div style="font-size: 0.7rem; color: #9a9590; margin-top: 3px; display: flex; justify-content: space-between; gap: 10px;">
                        <span>"Ratio"</span>
                        <span style="font-family: 'JetBrains Mono', monospace; color: #e2e0d8;">{tip.ratio_label}</span>
                    </div>
                    {tip.loss_label.map(|loss| view! {
                        <div style="font-size: 0.7rem; color: #9a9590; margin-top: 2px; display: flex; justify-content: space-between; gap: 10px;">
                            <span>"Est. loss"</span>
                            <span style="font-family: 'JetBrains Mono', monospace; color: #f5c542;">{loss}</span>
                        </div>
                    })}
                </div>
            })}

            <div style="position: absolute; top: 10px; right: 10px; display: flex; flex-direction: column; gap: 4px; z-index: 5;">
                <ZoomButton label="+" title="Zoom in" on_press=zoom_in />
                <ZoomButton label="\u{2212}" title="Zoom out" on_press=zoom_out />
                <ZoomButton label="\u{21BA}" title="Reset view" on_press=reset />
            </div>

            <Legend />

            {move || detail_open.get().map(|_| view! { <DetailPanelView /> })}
        </div>
    }
}

#[component]
fn RegionPath(feature: usize, d: String) -> impl IntoView {
    let MapModel(model) = expect_context();
    let style = Memo::new(move |_| model.with(|m| m.region_style(feature)));

    let on_enter = move |e: PointerEvent| {
        let anchor = e
            .current_target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            .and_then(|el| el.closest(".leakmap").ok().flatten())
            .map(|container| local_point(&container, &e));
        if let Some((x, y)) = anchor {
            model.update(|m| m.pointer_enter(feature, x, y));
        }
    };

    view! {
        <path
            d=d
            fill=move || style.get().fill.css()
            stroke=move || style.get().stroke.css()
            stroke-width=move || style.get().stroke.width
            stroke-linejoin="round"
            vector-effect="non-scaling-stroke"
            style=move || {
                if style.get().stroke.glow {
                    "cursor: pointer; filter: drop-shadow(0 0 3px rgba(30,64,175,0.85));"
                } else {
                    "cursor: pointer;"
                }
            }
            on:pointerenter=on_enter
            on:pointerleave=move |_: PointerEvent| model.update(|m| m.pointer_leave(feature))
            on:click=move |_| model.update(|m| {
                m.click(feature);
            })
        />
    }
}

#[component]
pub(crate) fn ZoomButton(
    label: &'static str,
    title: &'static str,
    on_press: impl Fn(web_sys::MouseEvent) + 'static,
) -> impl IntoView {
    view! {
        <button
            title=title
            style="width: 28px; height: 28px; background: #13161f; border: 1px solid #282c3e; border-radius: 6px; cursor: pointer; color: #e2e0d8; font-size: 1rem; line-height: 1; display: flex; align-items: center; justify-content: center;"
            on:click=on_press
        >
            {label}
        </button>
    }
}

#[component]
fn Legend() -> impl IntoView {
    view! {
        <div style="position: absolute; left: 10px; bottom: 10px; background: rgba(19,22,31,0.9); border: 1px solid #282c3e; border-radius: 6px; padding: 6px 9px; display: flex; flex-direction: column; gap: 3px; z-index: 5;">
            {legend_entries()
                .into_iter()
                .map(|(level, range, (r, g, b))| view! {
                    <div style="display: flex; align-items: center; gap: 6px; font-size: 0.68rem; color: #c8c4bc;">
                        <span style={format!("width: 10px; height: 10px; border-radius: 2px; background: {};", rgba_css(r, g, b, 0.85))} />
                        <span>{level.label()}</span>
                        <span style="margin-left: auto; color: #7a7670; font-family: 'JetBrains Mono', monospace;">{range}</span>
                    </div>
                })
                .collect_view()}
        </div>
    }
}
