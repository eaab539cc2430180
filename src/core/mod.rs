//! Crawlers, upstream access and record flattening.

pub mod api;
pub mod auth;
pub mod bill_crawler;
pub mod detail_crawler;
pub mod export;
pub mod flatten;
pub mod http;
pub mod logging;
pub mod models;
pub mod pipeline;

pub use api::{ApiClient, BillsApi, CredentialedFetcher};
pub use auth::TokenProvider;
pub use bill_crawler::crawl_bills;
pub use detail_crawler::{crawl_details, pending_bill_ids};
pub use export::{export_bill_details, write_csv};
pub use flatten::{BillRow, COLUMNS, flatten, flatten_documents};
pub use models::{
    BearerToken, BillDetail, BillsPage, CrawlReport, CrawlerKind, Credentials, SourceIdentity,
    StopReason,
};
pub use pipeline::{CrawlPlan, run_crawl, run_plan};
