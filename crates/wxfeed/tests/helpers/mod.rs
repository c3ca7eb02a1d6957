pub mod history_server;

pub use history_server::HistoryServer;
