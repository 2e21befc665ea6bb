pub mod converter_page;
pub mod history_api;
pub mod util;

pub use converter_page::ConverterPageSource;
pub use history_api::HistoryApiSource;
