//! 変換履歴リスト

use leptos::*;

use crate::models::{AlertKind, HistoryEntry};
use crate::ConverterContext;

#[component]
pub fn HistoryList() -> impl IntoView {
    let ctx = use_context::<ConverterContext>().expect("ConverterContext not found");
    let history = move || ctx.watch(|m| m.history());

    let on_clear = move |_| {
        ctx.manager().clear_history();
        ctx.notify(AlertKind::Success, "History cleared");
        ctx.refresh();
    };

    view! {
        <section class="history">
            <div class="history-header">
                <h3>"Recent conversions"</h3>
                <button class="btn small" on:click=on_clear disabled=move || history().is_empty()>
                    "Clear"
                </button>
            </div>
            <div class="history-list">
                {move || {
                    let entries = history();
                    if entries.is_empty() {
                        view! {
                            <div class="placeholder">
                                <span class="emoji">"📝"</span>
                                <p>"No history yet. Convert some images!"</p>
                            </div>
                        }.into_view()
                    } else {
                        entries.into_iter().map(|entry| view! {
                            <HistoryItem entry=entry />
                        }).collect_view()
                    }
                }}
            </div>
        </section>
    }
}

#[component]
fn HistoryItem(entry: HistoryEntry) -> impl IntoView {
    let ctx = use_context::<ConverterContext>().expect("ConverterContext not found");
    let id = entry.id;
    let info = entry.info();

    // 表示中のリストから取ったIDでも、念のため引き直す
    let on_view = move |_| match ctx.manager().entry(id) {
        Ok(found) => ctx.viewing.set(Some(found)),
        Err(e) => ctx.notify(AlertKind::Error, e.to_string()),
    };
    let on_download = move |_| ctx.finish(ctx.manager().download_entry(id), "Image downloaded!");

    view! {
        <div class="history-item">
            <div class="history-preview">
                <img src=entry.data_url.clone() alt="History item" />
            </div>
            <div class="history-info">
                <span class="time">{entry.timestamp.clone()}</span>
                <span class="meta">{format!("{} • {}", info.dimensions_label(), info.format.label())}</span>
                <span class="meta">{info.size_label()}</span>
            </div>
            <div class="history-actions">
                <button class="btn small primary-outline" on:click=on_view>"🔍 View Original"</button>
                <button class="btn small" on:click=on_download>"⬇️"</button>
            </div>
        </div>
    }
}
