//! 履歴の元画像ビューワ（モーダル）

use leptos::*;

use crate::ConverterContext;

#[component]
pub fn ImageViewer() -> impl IntoView {
    let ctx = use_context::<ConverterContext>().expect("ConverterContext not found");
    let close = move |_: web_sys::MouseEvent| ctx.viewing.set(None);

    view! {
        {move || ctx.viewing.get().map(|entry| {
            let id = entry.id;
            let summary = entry.info().summary();
            view! {
                // 背景クリックで閉じる
                <div class="image-viewer" on:click=close>
                    <div class="viewer-content" on:click=|ev: web_sys::MouseEvent| ev.stop_propagation()>
                        <button class="close-viewer" on:click=close>"×"</button>
                        <img class="viewer-img" src=entry.data_url.clone() alt="Original" />
                        <div class="viewer-footer">
                            <span class="viewer-meta">{summary}</span>
                            <button
                                class="btn primary"
                                on:click=move |_| ctx.finish(ctx.manager().download_entry(id), "Image downloaded!")
                            >
                                "⬇️ Download"
                            </button>
                        </div>
                    </div>
                </div>
            }
        })}
    }
}
