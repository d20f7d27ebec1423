//! Base64 → 画像 タブ

use leptos::*;

use crate::converter::pipeline::SAMPLE_PNG_BASE64;
use crate::models::AlertKind;
use crate::ConverterContext;

#[component]
pub fn DecodeView() -> impl IntoView {
    let ctx = use_context::<ConverterContext>().expect("ConverterContext not found");
    let (input, set_input) = create_signal(String::new());

    let on_decode = move |_| {
        let text = input.get_untracked();
        ctx.run("Image converted successfully!", move |m| async move {
            m.decode(&text).await.map(|_| ())
        });
    };

    let on_example = move |_| {
        set_input.set(SAMPLE_PNG_BASE64.to_string());
        ctx.notify(AlertKind::Success, "Example loaded!");
    };

    let on_clear = move |_| {
        set_input.set(String::new());
        ctx.manager().clear_result();
        ctx.refresh();
    };

    view! {
        <div class="tab-content active" id="decode">
            <div class="input-group">
                <textarea
                    class="base64-input"
                    placeholder="Paste a Base64 string or a data:image/...;base64,... URL"
                    prop:value=move || input.get()
                    on:input=move |ev| set_input.set(event_target_value(&ev))
                ></textarea>
                <span class="char-count">{move || format!("{} characters", input.with(|s| s.len()))}</span>
            </div>
            <div class="actions">
                <button class="btn primary" on:click=on_decode disabled=move || ctx.busy.get()>
                    {move || if ctx.busy.get() { "Converting..." } else { "Convert to Image" }}
                </button>
                <button class="btn" on:click=on_example>"Load Example"</button>
                <button class="btn" on:click=on_clear>"Clear"</button>
            </div>
        </div>
    }
}
