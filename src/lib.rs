use std::sync::Arc;

use crate::{
    agent::{
        agent::{AgentHandle, PageAgent},
        error::AgentError,
    },
    cli::config::AppConfig,
    dom::document::SharedDocument,
    store::{adapter::StoreAdapter, store::KeyValueStore},
    trace::logger::TraceLogger,
};

pub mod agent;
pub mod cli;
pub mod dom;
pub mod field;
pub mod page;
pub mod snapshot;
pub mod store;
pub mod trace;

/// Attach a page agent to a freshly loaded document and start it on the
/// current tokio runtime.
///
/// Timing comes from `config.agent`; the decision journal is written to
/// `config.trace.path` when set.
pub fn launch<S: KeyValueStore + 'static>(
    doc: SharedDocument,
    store: StoreAdapter<S>,
    page_url: &str,
    config: &AppConfig,
) -> Result<(tokio::task::JoinHandle<Result<(), AgentError>>, AgentHandle), AgentError> {
    let tracer = match config.trace.path.as_deref() {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };

    let (agent, handle) = PageAgent::new(doc, store, page_url, config.agent.to_agent_config())?;
    let task = agent.with_tracer(Arc::new(tracer)).spawn();
    Ok((task, handle))
}
