//! UIコンポーネントモジュール

pub mod alert_stack;
pub mod history_list;
pub mod image_viewer;
pub mod result_panel;

pub use alert_stack::AlertStack;
pub use history_list::HistoryList;
pub use image_viewer::ImageViewer;
pub use result_panel::ResultPanel;
