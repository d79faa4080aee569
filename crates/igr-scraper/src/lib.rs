pub mod browser_pool;
pub mod dom;
pub mod error;
pub mod form;
pub mod grid;
pub mod matcher;
pub mod pagination;
pub mod progress;
pub(crate) mod retry;
pub mod session;
pub mod site;
pub mod strategy;
pub mod translate;
pub mod verify;

pub use browser_pool::{BrowserPool, LaunchSettings, PageLease};
pub use dom::{BrowserPage, FrameRef};
pub use error::ScrapeError;
pub use progress::{Progress, ProgressEvent, Stage};
pub use session::{prepare, PreparedRequest, RateScraper, Session};
pub use site::{ScraperSettings, SiteProfile};
pub use translate::Translator;
