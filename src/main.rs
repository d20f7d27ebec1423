mod components;
mod converter;
mod error;
mod models;
mod platform;
mod utils;
mod views;

use std::future::Future;
use std::rc::Rc;

use leptos::*;

use components::{AlertStack, HistoryList, ImageViewer, ResultPanel};
use converter::ConversionManager;
use error::ConvertError;
use models::{Alert, AlertKind, HistoryEntry, Mode};
use platform::{BrowserHost, BrowserStore};
use utils::log_trace::{clear_logs, download_logs, log_info, log_warn};
use utils::settings::load_settings;
use views::{DecodeView, EncodeView};

pub type Manager = ConversionManager<BrowserHost, BrowserStore>;

// ============================================
// アプリ全体のコンテキスト
// ============================================

/// マネージャと描画用シグナルをまとめたコンテキスト
///
/// マネージャの状態はシグナルではないので、操作の後に `refresh` で
/// `revision` を進めて依存するビューを再描画させる。
#[derive(Clone, Copy)]
pub struct ConverterContext {
    manager: StoredValue<Rc<Manager>>,
    revision: RwSignal<u64>,
    alert_seq: StoredValue<u64>,
    pub alerts: RwSignal<Vec<Alert>>,
    /// 「元画像を表示」で開いている履歴エントリ
    pub viewing: RwSignal<Option<HistoryEntry>>,
    /// 変換処理中
    pub busy: RwSignal<bool>,
}

impl ConverterContext {
    fn new(manager: Manager) -> Self {
        Self {
            manager: store_value(Rc::new(manager)),
            revision: create_rw_signal(0),
            alert_seq: store_value(0),
            alerts: create_rw_signal(Vec::new()),
            viewing: create_rw_signal(None),
            busy: create_rw_signal(false),
        }
    }

    pub fn manager(&self) -> Rc<Manager> {
        self.manager.get_value()
    }

    /// マネージャの状態を読む（リアクティブに追跡される）
    pub fn watch<T>(&self, f: impl FnOnce(&Manager) -> T) -> T {
        let _ = self.revision.get();
        self.manager.with_value(|m| f(m))
    }

    pub fn refresh(&self) {
        self.revision.update(|r| *r += 1);
    }

    /// 通知バナーを出し、一定時間後に消す
    pub fn notify(&self, kind: AlertKind, message: impl Into<String>) {
        self.alert_seq.update_value(|id| *id += 1);
        let id = self.alert_seq.get_value();
        self.alerts.update(|alerts| {
            alerts.push(Alert {
                id,
                kind,
                message: message.into(),
            })
        });

        let alerts = self.alerts;
        let delay = self.manager.with_value(|m| m.config().alert_dismiss_ms);
        spawn_local(async move {
            gloo::timers::future::TimeoutFuture::new(delay).await;
            alerts.update(|list| list.retain(|a| a.id != id));
        });
    }

    /// 操作結果を通知して再描画する
    pub fn finish<T>(&self, outcome: Result<T, ConvertError>, success: &str) {
        match outcome {
            Ok(_) => self.notify(AlertKind::Success, success),
            Err(e) => {
                log_warn("ui", &format!("{:?}: {}", e.kind(), e));
                self.notify(AlertKind::Error, e.to_string());
            }
        }
        self.refresh();
    }

    /// 非同期の変換操作を実行する（実行中は二重に走らせない）
    pub fn run<F, Fut>(self, success: &'static str, op: F)
    where
        F: FnOnce(Rc<Manager>) -> Fut + 'static,
        Fut: Future<Output = Result<(), ConvertError>> + 'static,
    {
        if self.busy.get_untracked() {
            return;
        }
        self.busy.set(true);
        let manager = self.manager();
        spawn_local(async move {
            let outcome = op(manager).await;
            self.busy.set(false);
            self.finish(outcome, success);
        });
    }
}

// ============================================
// メインアプリ（タブ切り替え）
// ============================================

#[component]
fn App() -> impl IntoView {
    let store = BrowserStore::open();
    let config = load_settings(&store);
    let ctx = ConverterContext::new(ConversionManager::new(BrowserHost, store, config));
    provide_context(ctx);

    let mode = move || ctx.watch(|m| m.mode());
    let switch_to = move |next: Mode| {
        if mode() != next {
            ctx.manager().switch_mode(next);
            ctx.refresh();
        }
    };

    view! {
        <div class="app">
            <header class="app-header">
                <h1>"Base64 Image Converter"</h1>
                <nav class="tabs">
                    <button
                        class=move || if mode() == Mode::Decode { "tab active" } else { "tab" }
                        on:click=move |_| switch_to(Mode::Decode)
                    >
                        {Mode::Decode.label()}
                    </button>
                    <button
                        class=move || if mode() == Mode::Encode { "tab active" } else { "tab" }
                        on:click=move |_| switch_to(Mode::Encode)
                    >
                        {Mode::Encode.label()}
                    </button>
                </nav>
            </header>

            <main class="container">
                {move || match mode() {
                    Mode::Decode => view! { <DecodeView /> }.into_view(),
                    Mode::Encode => view! { <EncodeView /> }.into_view(),
                }}
                <ResultPanel />
                <HistoryList />
            </main>

            <footer class="app-footer">
                <span class="version">{format!("v{}", env!("CARGO_PKG_VERSION"))}</span>
                <button class="btn small" on:click=move |_| download_logs()>"ログ保存"</button>
                <button class="btn small" on:click=move |_| clear_logs()>"ログ消去"</button>
            </footer>

            <ImageViewer />
            <AlertStack />
        </div>
    }
}

fn main() {
    console_error_panic_hook::set_once();
    log_info("app", &format!("Converter {} loaded", env!("CARGO_PKG_VERSION")));
    mount_to_body(App);
}
