//! API clients for SEO data providers

pub mod seo_data;

pub use seo_data::{SeoDataClient, SeoDataError};
