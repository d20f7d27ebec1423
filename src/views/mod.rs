//! ビューモジュール（タブごとの入力画面）

pub mod decode_view;
pub mod encode_view;

pub use decode_view::DecodeView;
pub use encode_view::EncodeView;
