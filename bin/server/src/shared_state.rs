use std::sync::Arc;

use minigraph_executor::Executor;

pub struct ServerSharedState {
    pub executor: Executor,
}

impl ServerSharedState {
    pub fn new(executor: Executor) -> Arc<Self> {
        Arc::new(Self { executor })
    }
}
