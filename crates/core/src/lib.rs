pub mod error;
pub mod fetch;
pub mod metadata;
pub mod parse;
pub mod preview;
pub mod resolve;
pub mod validate;

pub use error::{ErrorKind, PreviewError, Result};
pub use fetch::{DEFAULT_USER_AGENT, FetchConfig, FetchedDocument, Fetcher};
pub use metadata::{ExtractedFields, extract};
pub use parse::{Document, Element};
pub use preview::{PreviewConfig, PreviewConfigBuilder, PreviewRequest, PreviewResult, Previewer, get_preview};
pub use resolve::resolve;
pub use validate::{UrlPolicy, ValidUrl, is_private_ip, normalize};
pub use url::Url;
