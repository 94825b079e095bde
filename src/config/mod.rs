//! Configuration module

mod site;

pub use site::HighlightConfig;
pub use site::PortfolioConfig;
pub use site::RelationsConfig;
pub use site::SiteConfig;
pub use site::SitemapConfig;
pub use site::TagConfig;
pub use site::TagGroupConfig;
pub use site::PALETTE;
