// Downloader module - URL classification, stream selection and downloads

pub mod backends;
pub mod errors;
pub mod format_selector;
pub mod models;
pub mod naming;
pub mod orchestrator;
pub mod traits;
pub mod url_classifier;
pub mod utils;

pub use errors::{DownloadError, ExtractionError, ExtractionKind};
pub use format_selector::{FormatSelector, ResolvedSelections, Selection};
pub use models::{DownloadEvent, DownloadProgress, Playlist, QualityTier, Stream, StreamKind, Target, Video};
pub use orchestrator::{Downloader, LoadedTarget};
pub use traits::{MediaBackend, ProgressEmitter};
pub use url_classifier::{classify, TargetUrl};
