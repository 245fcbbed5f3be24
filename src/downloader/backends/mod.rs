// Media backends

pub mod itags;
pub mod ytdlp;

pub use ytdlp::YtDlpBackend;
