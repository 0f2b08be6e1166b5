mod config;
mod embed;
mod ingest;
mod process;
mod search;
mod status;

pub use config::ConfigCommand;
pub use embed::EmbedArgs;
pub use ingest::IngestArgs;
pub use process::ProcessArgs;
pub use search::SearchArgs;

pub use config::handle_config;
pub use embed::handle_embed;
pub use ingest::handle_ingest;
pub use process::handle_process;
pub use search::handle_search;
pub use status::handle_status;
