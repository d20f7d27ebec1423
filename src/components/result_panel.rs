//! 変換結果パネル（プレビュー・情報・Base64出力・ダウンロード/コピー）

use leptos::*;

use crate::models::Mode;
use crate::ConverterContext;

#[component]
pub fn ResultPanel() -> impl IntoView {
    let ctx = use_context::<ConverterContext>().expect("ConverterContext not found");
    let result = move || ctx.watch(|m| m.result());
    let info = move || ctx.watch(|m| m.result_info());
    let show_output = move || ctx.watch(|m| m.mode()) == Mode::Encode;

    let on_download = move |_| ctx.finish(ctx.manager().download_current(), "Image downloaded!");
    // コピーは変換中でも受け付ける（busyフラグとは独立）
    let on_copy = move |_| {
        let manager = ctx.manager();
        spawn_local(async move {
            let outcome = manager.copy_base64().await;
            ctx.finish(outcome, "Base64 copied to clipboard!");
        });
    };

    view! {
        <section class=move || if result().is_some() { "result show" } else { "result" }>
            <div class="preview">
                {move || match result() {
                    Some(r) => view! { <img src=r.data_url() alt="Result" /> }.into_view(),
                    None => view! {
                        <div class="placeholder">
                            <span class="emoji">"🖼️"</span>
                            <p>"Your result will appear here"</p>
                        </div>
                    }.into_view(),
                }}
            </div>

            {move || info().map(|info| view! {
                <div class="image-info">
                    <div class="info-item">
                        <span class="label">"Dimensions"</span>
                        <span class="value">{info.dimensions_label()}</span>
                    </div>
                    <div class="info-item">
                        <span class="label">"Format"</span>
                        <span class="value">{info.format.label()}</span>
                    </div>
                    <div class="info-item">
                        <span class="label">"Size"</span>
                        <span class="value">{info.size_label()}</span>
                    </div>
                </div>
            })}

            // エンコードモードのみBase64を表示
            {move || result().filter(|_| show_output()).map(|r| view! {
                <div class="base64-output">
                    <label>"Base64 output"</label>
                    <textarea readonly prop:value=r.base64().to_string()></textarea>
                </div>
            })}

            <div class="actions">
                <button class="btn primary" on:click=on_download disabled=move || result().is_none()>
                    "⬇️ Download"
                </button>
                <button class="btn" on:click=on_copy disabled=move || result().is_none()>
                    "📋 Copy Base64"
                </button>
            </div>
        </section>
    }
}
