use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

use crate::router::RouteIndex;

/// Route index that can be replaced wholesale while requests are in flight.
///
/// Readers take a snapshot with [`load`](Self::load) and keep matching
/// against it even if a new index is stored meanwhile. There is no
/// incremental update: a rebuild always produces a complete index.
#[derive(Debug, Clone)]
pub struct SharedRouteIndex {
    inner: Arc<ArcSwap<RouteIndex>>,
}

impl SharedRouteIndex {
    #[must_use]
    pub fn new(index: RouteIndex) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(index)),
        }
    }

    #[must_use]
    pub fn load(&self) -> Arc<RouteIndex> {
        self.inner.load_full()
    }

    pub fn store(&self, index: RouteIndex) {
        let routes_count = index.len();
        self.inner.store(Arc::new(index));
        info!(routes_count, "Route index swapped");
    }
}
