//! Scraping backends for the supported torrent index sites.
//!
//! Each backend hides its own page format, mirror handling and timeouts
//! behind the `Backend` trait.

mod http;
mod rutor;
mod tparser;
mod yohoho;

pub use rutor::RutorBackend;
pub use tparser::TParserBackend;
pub use yohoho::YohohoBackend;

use std::sync::Arc;

use tracing::info;

use crate::config::BackendsConfig;
use crate::search::{Backend, BackendError};

/// Factory function to create the enabled backends from config, in a fixed
/// order (rutor, yohoho, tparser).
pub fn create_backends(config: &BackendsConfig) -> Result<Vec<Arc<dyn Backend>>, BackendError> {
    let mut backends: Vec<Arc<dyn Backend>> = Vec::new();

    if config.rutor.enabled {
        info!("Initializing rutor backend at {}", config.rutor.url);
        backends.push(Arc::new(RutorBackend::new(config.rutor.clone())?));
    }
    if config.yohoho.enabled {
        info!("Initializing yohoho backend at {}", config.yohoho.url);
        backends.push(Arc::new(YohohoBackend::new(config.yohoho.clone())?));
    }
    if config.tparser.enabled {
        info!(
            "Initializing tparser backend ({} shards)",
            config.tparser.shards.len()
        );
        backends.push(Arc::new(TParserBackend::new(config.tparser.clone())?));
    }

    Ok(backends)
}
