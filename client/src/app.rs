use leptos::prelude::*;
use leakmap_shared::MetricRecord;

use std::cell::RefCell;

use crate::map_view::ChoroplethMap;

const REFRESH_INTERVAL_MS: u32 = 15_000;
const SELECTION_LOG_LEN: usize = 8;

/// Sample host payload. Names are in metrics-dataset spelling.
const SAMPLE_METRICS: &str = r#"[
    { "name": "Anantapur", "ratio": 0.62, "subCaseCount": 41, "subOfficeCount": 9, "transactionCount": 5120, "estimatedLoss": 184500000 },
    { "name": "Nellore", "ratio": 0.95, "subCaseCount": 6, "subOfficeCount": 7, "transactionCount": 3890, "estimatedLoss": 4100000 },
    { "name": "Kadapa", "ratio": 0.71, "subCaseCount": 22, "subOfficeCount": 8, "transactionCount": 2975, "estimatedLoss": 61200000 },
    { "name": "Kurnool", "ratio": 0.58, "subCaseCount": 37, "subOfficeCount": 11, "transactionCount": 4410, "estimatedLoss": 97300000 },
    { "name": "Guntur", "ratio": 0.88, "subCaseCount": 12, "subOfficeCount": 13, "transactionCount": 6702, "estimatedLoss": 28800000 },
    { "name": "Krishna", "ratio": 0.91, "subCaseCount": 9, "subOfficeCount": 12, "transactionCount": 7015 },
    { "name": "Visakhapatnam", "ratio": 0.67, "subCaseCount": 29, "subOfficeCount": 10, "transactionCount": 8120, "estimatedLoss": 132000000 },
    { "name": "Chittoor" }
]"#;

pub(crate) fn sample_metrics() -> Result<Vec<MetricRecord>, String> {
    serde_json::from_str(SAMPLE_METRICS).map_err(|e| format!("parse error: {e}"))
}

/// Shift every ratio `step` places along the list. Stands in for a host
/// refresh that changes values without changing the district set.
pub(crate) fn rotate_ratios(records: &[MetricRecord], step: usize) -> Vec<MetricRecord> {
    let ratios: Vec<Option<f64>> = records.iter().map(|r| r.ratio).collect();
    let len = ratios.len().max(1);
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| MetricRecord {
            ratio: ratios[(idx + step) % len],
            ..record.clone()
        })
        .collect()
}

struct RefreshBinding {
    _interval: gloo_timers::callback::Interval,
}

thread_local! {
    static REFRESH_BINDING: RefCell<Option<RefreshBinding>> = const { RefCell::new(None) };
}

/// Demo host page around the embeddable map.
#[component]
pub fn App() -> impl IntoView {
    let base = match sample_metrics() {
        Ok(records) => records,
        Err(e) => {
            web_sys::console::warn_1(&format!("sample metrics unavailable: {e}").into());
            Vec::new()
        }
    };
    let names: Vec<String> = base.iter().map(|r| r.name.clone()).collect();
    let base = StoredValue::new(base);

    let metrics: RwSignal<Vec<MetricRecord>> = RwSignal::new(base.get_value());
    let active: RwSignal<Option<String>> = RwSignal::new(None);
    let selections: RwSignal<Vec<String>> = RwSignal::new(Vec::new());
    let live: RwSignal<bool> = RwSignal::new(false);
    let refresh_step: RwSignal<usize> = RwSignal::new(0);

    REFRESH_BINDING.with(move |slot| {
        let interval = gloo_timers::callback::Interval::new(REFRESH_INTERVAL_MS, move || {
            if !live.get_untracked() {
                return;
            }
            refresh_step.update(|s| *s += 1);
            let step = refresh_step.get_untracked();
            metrics.set(base.with_value(|records| rotate_ratios(records, step)));
        });
        *slot.borrow_mut() = Some(RefreshBinding {
            _interval: interval,
        });
    });

    let on_select = move |name: String| {
        selections.update(|log| {
            log.insert(0, name);
            log.truncate(SELECTION_LOG_LEN);
        });
    };

    view! {
        <div style="min-height: 100vh; background: #0b0d12; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif; padding: 20px; box-sizing: border-box;">
            <div style="max-width: 1100px; margin: 0 auto; display: flex; flex-direction: column; gap: 14px;">
                <div style="display: flex; align-items: center; justify-content: space-between; gap: 12px; flex-wrap: wrap;">
                    <div>
                        <div style="font-size: 1.1rem; font-weight: 700;">"Revenue leakage by district"</div>
                        <div style="font-size: 0.74rem; color: #9a9590;">"Declared-to-expected ratio; lower is worse."</div>
                    </div>
                    <div style="display: flex; align-items: center; gap: 10px; font-size: 0.78rem;">
                        <label style="display: flex; align-items: center; gap: 6px; color: #9a9590;">
                            "Highlight"
                            <select
                                style="background: #13161f; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 6px; padding: 4px 6px;"
                                on:change=move |e| {
                                    let value = event_target_value(&e);
                                    active.set((!value.is_empty()).then_some(value));
                                }
                            >
                                <option value="">"None"</option>
                                {names
                                    .into_iter()
                                    .map(|name| { let value = name.clone(); view! { <option value=value>{name}</option> } })
                                    .collect_view()}
                            </select>
                        </label>
                        <label style="display: flex; align-items: center; gap: 6px; color: #9a9590; cursor: pointer;">
                            <input
                                type="checkbox"
                                prop:checked=move || live.get()
                                on:change=move |_| live.update(|v| *v = !*v)
                            />
                            "Live refresh"
                        </label>
                    </div>
                </div>

                <ChoroplethMap
                    metrics=metrics
                    active=Signal::derive(move || active.get())
                    on_select=Callback::new(on_select)
                />

                <div style="background: #13161f; border: 1px solid #282c3e; border-radius: 8px; padding: 10px 12px;">
                    <div style="font-size: 0.72rem; color: #9a9590; text-transform: uppercase; letter-spacing: 0.06em; margin-bottom: 6px;">
                        "Selections"
                    </div>
                    <Show
                        when=move || !selections.with(Vec::is_empty)
                        fallback=|| view! { <div style="font-size: 0.78rem; color: #5a5860;">"Click a district."</div> }
                    >
                        <For
                            each={move || selections.get().into_iter().enumerate().collect::<Vec<_>>()}
                            key=|(idx, name)| (*idx, name.clone())
                            children=|(_, name)| view! {
                                <div style="font-size: 0.8rem; font-family: 'JetBrains Mono', monospace; padding: 2px 0;">{name}</div>
                            }
                        />
                    </Show>
                </div>
            </div>
        </div>
    }
}
