use chrono::Utc;
use crawl_logging::crawl_info;
use recipe_core::ParserVersion;

use crate::store::{CrawlStore, StoreError};

/// Puts every finished target processed by an older parser back in the
/// queue. Targets never processed (version 0) and current ones are left as
/// they are. Returns how many targets were reset.
pub async fn reset_outdated_targets(
    store: &dyn CrawlStore,
    latest: ParserVersion,
) -> Result<usize, StoreError> {
    let now = Utc::now();
    let mut reset = 0;
    for mut target in store.outdated_targets(latest).await? {
        if target.reset_for_reprocessing(latest, now) {
            store.update_target(&target).await?;
            reset += 1;
        }
    }
    crawl_info!("Reset {reset} targets for parser version {}", latest.0);
    Ok(reset)
}
