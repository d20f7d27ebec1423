//! 通知バナー

use leptos::*;

use crate::models::Alert;
use crate::ConverterContext;

/// 成功・エラー通知（一定時間で自動的に消える）
#[component]
pub fn AlertStack() -> impl IntoView {
    let ctx = use_context::<ConverterContext>().expect("ConverterContext not found");

    view! {
        <div class="alert-container">
            <For
                each=move || ctx.alerts.get()
                key=|alert| alert.id
                children=move |alert: Alert| view! {
                    <div class=alert.class()>
                        <span>{alert.icon()}</span>
                        <span>{alert.message.clone()}</span>
                    </div>
                }
            />
        </div>
    }
}
