//! Collaborators shared by every duel task and open-world action.

use std::sync::Arc;

use tracing::warn;

use crate::api::{ActionCollector, KillFeedEntry, Notifier};
use crate::config::RuntimeConfig;
use crate::events::EventBus;
use crate::guard::TransactionGuard;
use crate::oracle::OracleManager;
use crate::store::Store;

#[derive(Clone)]
pub(crate) struct RuntimeContext {
    pub store: Arc<dyn Store>,
    pub guard: TransactionGuard,
    pub oracles: OracleManager,
    pub config: RuntimeConfig,
    pub events: EventBus,
    pub collector: Arc<dyn ActionCollector>,
    pub notifier: Arc<dyn Notifier>,
}

impl RuntimeContext {
    /// Deliver a kill-feed entry. Failures are logged and never affect state.
    pub async fn notify(&self, entry: KillFeedEntry) {
        if let Err(err) = self.notifier.notify(entry).await {
            warn!(target: "runtime::notify", error = %err, "kill feed delivery failed");
        }
    }
}
