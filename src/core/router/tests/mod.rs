//! Orchestrator tests


use std::sync::Arc;

use crate::core::providers::MockProvider;
use crate::core::router::{Orchestrator, OrchestratorBuilder};

/// Mock providers registered with priorities 1, 2, 3, ...
fn with_mocks(mocks: &[&Arc<MockProvider>]) -> OrchestratorBuilder {
    mocks
        .iter()
        .enumerate()
        .fold(Orchestrator::builder(), |builder, (i, mock)| {
            builder.provider((*mock).clone(), i as u32 + 1)
        })
}

fn mock(id: &str) -> Arc<MockProvider> {
    Arc::new(MockProvider::new(id))
}

fn failing(id: &str, status: u16) -> Arc<MockProvider> {
    Arc::new(MockProvider::new(id).failing_with_status(status))
}
