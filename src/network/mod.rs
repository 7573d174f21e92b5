// * Fetch boundary: the only surface the pipeline uses to obtain page content.

pub mod client;
pub mod errors;
pub mod fetcher;

pub use client::FastClient;
pub use errors::FetchError;
pub use fetcher::{html_to_markdown, FetchFuture, PageFetcher, RawPage};
