pub mod config;
pub mod explain;
pub mod folders;
pub mod rank;

pub use config::ConfigCommand;
pub use explain::ExplainCommand;
pub use folders::FoldersCommand;
pub use rank::RankCommand;
