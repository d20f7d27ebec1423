//! 画像 → Base64 タブ

use leptos::*;
use web_sys::{File, HtmlInputElement};

use crate::error::ConvertError;
use crate::models::{is_image_mime, AlertKind, ImageFormat, UploadedFile};
use crate::platform::browser::read_file_as_data_url;
use crate::utils::log_trace::log_error;
use crate::utils::quality_from_percent;
use crate::ConverterContext;

#[component]
pub fn EncodeView() -> impl IntoView {
    let ctx = use_context::<ConverterContext>().expect("ConverterContext not found");
    let config = ctx.manager().config().clone();
    let file_ref = create_node_ref::<html::Input>();

    let (format, set_format) = create_signal(config.default_format);
    let (quality, set_quality) = create_signal(config.default_quality);
    let (dragging, set_dragging) = create_signal(false);

    let upload = move || ctx.watch(|m| m.upload());

    // 選択・ドロップされたファイルを読み込む
    let handle_file = move |file: Option<File>| {
        let Some(file) = file else {
            return;
        };
        let mime = file.type_();
        if !is_image_mime(&mime) {
            ctx.notify(AlertKind::Error, ConvertError::NotAnImage(mime).to_string());
            return;
        }
        spawn_local(async move {
            match read_file_as_data_url(&file).await {
                Ok(data_url) => match UploadedFile::new(file.name(), file.type_(), data_url) {
                    Ok(uploaded) => {
                        ctx.manager().set_upload(uploaded);
                        ctx.notify(AlertKind::Success, "Image uploaded successfully!");
                    }
                    Err(e) => ctx.notify(AlertKind::Error, e.to_string()),
                },
                Err(e) => {
                    log_error("encode", &format!("ファイル読み込み失敗: {}", e));
                    ctx.notify(AlertKind::Error, "Failed to upload image");
                }
            }
            ctx.refresh();
        });
    };

    let on_file_change = move |ev: web_sys::Event| {
        let input: HtmlInputElement = event_target(&ev);
        handle_file(input.files().and_then(|files| files.get(0)));
    };

    let on_drop = move |ev: web_sys::DragEvent| {
        ev.prevent_default();
        set_dragging.set(false);
        handle_file(ev.data_transfer().and_then(|dt| dt.files()).and_then(|files| files.get(0)));
    };

    let on_zone_click = move |_| {
        if let Some(input) = file_ref.get() {
            input.click();
        }
    };

    let on_encode = move |_| {
        let target = format.get_untracked();
        let q = quality_from_percent(quality.get_untracked());
        ctx.run("Image encoded successfully!", move |m| async move {
            m.encode(target, q).await.map(|_| ())
        });
    };

    let on_clear = move |_| {
        if let Some(input) = file_ref.get() {
            input.set_value("");
        }
        ctx.manager().clear_upload();
        ctx.refresh();
    };

    view! {
        <div class="tab-content active" id="encode">
            <div
                class=move || if dragging.get() { "upload-zone dragging" } else { "upload-zone" }
                on:click=on_zone_click
                on:dragover=move |ev: web_sys::DragEvent| {
                    ev.prevent_default();
                    set_dragging.set(true);
                }
                on:dragleave=move |_: web_sys::DragEvent| set_dragging.set(false)
                on:drop=on_drop
            >
                {move || match upload() {
                    Some(file) => view! {
                        <img class="upload-preview" src=file.data_url.clone() alt="Preview" />
                        <p class="upload-name">{file.name.clone()}</p>
                    }.into_view(),
                    None => view! {
                        <span class="emoji">"📁"</span>
                        <p>"Click or drop an image here"</p>
                    }.into_view(),
                }}
            </div>
            <input type="file" accept="image/*" class="hidden" node_ref=file_ref on:change=on_file_change />

            {move || upload().map(|_| view! {
                <div class="format-options">
                    <div class="option">
                        <label>"Format"</label>
                        <select on:change=move |ev| {
                            if let Some(f) = ImageFormat::from_subtype(&event_target_value(&ev)) {
                                set_format.set(f);
                            }
                        }>
                            {ImageFormat::ENCODE_TARGETS.into_iter().map(|f| view! {
                                <option value=f.as_str() selected=move || format.get() == f>{f.label()}</option>
                            }).collect_view()}
                        </select>
                    </div>
                    // 可逆フォーマットでは品質指定は無効
                    <div
                        class="option"
                        style=move || if format.get().is_lossy() { "opacity: 1" } else { "opacity: 0.5; pointer-events: none" }
                    >
                        <label>"Quality: " {move || quality.get()}</label>
                        <input
                            type="range"
                            min="0"
                            max="100"
                            prop:value=move || quality.get().to_string()
                            on:input=move |ev| {
                                if let Ok(q) = event_target_value(&ev).parse::<u8>() {
                                    set_quality.set(q);
                                }
                            }
                        />
                    </div>
                </div>
                <div class="actions">
                    <button class="btn primary" on:click=on_encode disabled=move || ctx.busy.get()>
                        {move || if ctx.busy.get() { "Encoding..." } else { "Convert to Base64" }}
                    </button>
                    <button class="btn" on:click=on_clear>"Clear"</button>
                </div>
            })}
        </div>
    }
}
