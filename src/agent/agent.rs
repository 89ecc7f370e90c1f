use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::{
    agent::{
        agent_model::{AgentConfig, Notice, PageAgentState, PageEvent, SaveOutcome, TRACKED_EVENTS},
        error::AgentError,
        scheduler::RetryDecision,
    },
    dom::document::SharedDocument,
    field::enumerate::enumerate_fields,
    page::{
        eligibility::is_eligible,
        page_id::{PageIdentifier, page_host},
    },
    snapshot::{builder::build_snapshot, reconcile::reconcile, snapshot_model::now_millis},
    store::{adapter::StoreAdapter, store::KeyValueStore},
    trace::{logger::TraceLogger, trace::TraceEvent},
};

// ============================================================================
// Host-side handle
// ============================================================================

/// What the hosting page keeps after spawning an agent.
///
/// Dropping the handle tears the page down: the agent saves once more and
/// stops, as it does on `unload`.
pub struct AgentHandle {
    events: UnboundedSender<PageEvent>,
    notices: UnboundedReceiver<Notice>,
    // Never sent on; the agent watches for it closing.
    _alive: oneshot::Sender<()>,
}

impl AgentHandle {
    /// Returns `false` once the agent has stopped.
    pub fn send(&self, event: PageEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn request_restore(&self) -> bool {
        self.send(PageEvent::RestoreRequested)
    }

    pub fn unload(&self) -> bool {
        self.send(PageEvent::Unload)
    }

    pub async fn next_notice(&mut self) -> Option<Notice> {
        self.notices.recv().await
    }

    pub fn try_notice(&mut self) -> Option<Notice> {
        self.notices.try_recv().ok()
    }
}

enum Wake {
    Event(PageEvent),
    Teardown,
    Autosave,
    Rebind,
    Retry,
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

// ============================================================================
// PageAgent
// ============================================================================

/// Saves and restores the form fields of one loaded document.
///
/// All work happens on the agent's own task: listeners and the mutation
/// observer only enqueue `PageEvent`s, and the three timers (autosave,
/// rebind, restore retry) are deadlines raced in `run`.
pub struct PageAgent<S: KeyValueStore> {
    doc: SharedDocument,
    store: StoreAdapter<S>,
    config: AgentConfig,
    page_url: String,
    page_id: PageIdentifier,
    host: String,
    state: PageAgentState,
    events_tx: UnboundedSender<PageEvent>,
    events_rx: UnboundedReceiver<PageEvent>,
    host_gone: oneshot::Receiver<()>,
    notices: UnboundedSender<Notice>,
    tracer: Arc<TraceLogger>,
}

impl<S: KeyValueStore + 'static> PageAgent<S> {
    pub fn new(
        doc: SharedDocument,
        store: StoreAdapter<S>,
        page_url: &str,
        config: AgentConfig,
    ) -> Result<(PageAgent<S>, AgentHandle), AgentError> {
        let page_id = PageIdentifier::from_url(page_url)?;
        let host = page_host(page_url)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (alive_tx, alive_rx) = oneshot::channel();

        let agent = PageAgent {
            doc,
            store,
            state: PageAgentState::new(&config),
            config,
            page_url: page_url.to_string(),
            page_id,
            host,
            events_tx: events_tx.clone(),
            events_rx,
            host_gone: alive_rx,
            notices: notice_tx,
            tracer: Arc::new(TraceLogger::disabled()),
        };
        let handle = AgentHandle {
            events: events_tx,
            notices: notice_rx,
            _alive: alive_tx,
        };
        Ok((agent, handle))
    }

    pub fn with_tracer(mut self, tracer: Arc<TraceLogger>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn page_id(&self) -> &PageIdentifier {
        &self.page_id
    }

    pub fn state(&self) -> &PageAgentState {
        &self.state
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Spawn `run` on the current tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<(), AgentError>> {
        tokio::spawn(self.run())
    }

    /// Check eligibility and, if eligible, bind listeners and arm the
    /// mutation observer. Returns whether the page is eligible.
    pub async fn init(&mut self) -> Result<bool, AgentError> {
        let sites = self.store.eligible_sites().await?;
        self.state.eligible = is_eligible(&self.host, &sites);
        if !self.state.eligible {
            tracing::debug!(host = %self.host, "site not protected, agent inert");
            return Ok(false);
        }

        self.bind_fields();

        if !self.state.observer_armed {
            self.doc.lock().observe_mutations(self.events_tx.clone());
            self.state.observer_armed = true;
        }

        tracing::info!(page = %self.page_id, "form saver active");
        Ok(true)
    }

    /// Attach autosave listeners to fields not bound yet. Returns how many
    /// fields were newly bound.
    pub fn bind_fields(&mut self) -> usize {
        let mut doc = self.doc.lock();
        let mut newly_bound = 0;
        for node in enumerate_fields(&doc) {
            if !self.state.bound.insert(node) {
                continue;
            }
            match doc.add_listener(node, &TRACKED_EVENTS, self.events_tx.clone()) {
                Ok(()) => newly_bound += 1,
                Err(e) => {
                    self.state.bound.remove(&node);
                    tracing::warn!(?node, error = %e, "could not bind field");
                }
            }
        }
        tracing::debug!(newly_bound, total = self.state.bound.len(), "fields bound");
        newly_bound
    }

    /// Capture the page and persist it unless every field is blank.
    pub async fn save_now(&mut self) -> Result<SaveOutcome, AgentError> {
        if !self.state.eligible {
            return Ok(SaveOutcome::Ineligible);
        }

        let snapshot = {
            let doc = self.doc.lock();
            let fields = enumerate_fields(&doc);
            build_snapshot(&doc, &fields, &self.page_url, now_millis())
        };

        let Some(snapshot) = snapshot else {
            tracing::debug!(page = %self.page_id, "form is blank, not saving");
            return Ok(SaveOutcome::Empty);
        };

        let count = snapshot.len();
        self.store.save_page(&self.page_id, snapshot).await?;

        tracing::info!(page = %self.page_id, fields = count, "form data saved");
        self.tracer
            .log(&TraceEvent::now(&self.page_id, "save").with_fields(count));
        Ok(SaveOutcome::Saved(count))
    }

    /// Restore the saved snapshot onto the current fields.
    ///
    /// `explicit` marks a user-requested restore: only then is a missing
    /// snapshot reported.
    pub async fn restore(&mut self, explicit: bool) -> Result<usize, AgentError> {
        if !self.state.eligible {
            return Ok(0);
        }

        let Some(saved) = self.store.page_snapshot(&self.page_id).await? else {
            if explicit {
                self.notify(Notice::NothingToRestore);
            }
            tracing::debug!(page = %self.page_id, explicit, "no saved data");
            return Ok(0);
        };

        let restored = {
            let mut doc = self.doc.lock();
            let fields = enumerate_fields(&doc);
            reconcile(&mut doc, &fields, &saved)
        };

        if restored > 0 {
            tracing::info!(page = %self.page_id, restored, "form data restored");
            self.notify(Notice::Restored(restored));
        }
        self.tracer.log(
            &TraceEvent::now(&self.page_id, "restore")
                .with_fields(restored)
                .with_detail(if explicit { "manual" } else { "automatic" }),
        );
        Ok(restored)
    }

    /// One step of the restore-retry chain.
    async fn attempt_restore(&mut self) {
        let attempt = self.state.retry.begin_attempt();
        let field_count = enumerate_fields(&self.doc.lock()).len();

        if field_count == 0 {
            match self.state.retry.miss(Instant::now()) {
                RetryDecision::Retry => {
                    tracing::debug!(attempt, "no fields yet, retrying restore");
                }
                RetryDecision::GiveUp => {
                    tracing::debug!(attempt, "no fields appeared, giving up restore");
                    self.tracer.log(
                        &TraceEvent::now(&self.page_id, "restore_gave_up").with_attempt(attempt),
                    );
                }
            }
            return;
        }

        if let Err(e) = self.restore(false).await {
            tracing::warn!(page = %self.page_id, error = %e, "automatic restore failed");
        }
    }

    fn notify(&self, notice: Notice) {
        // Nobody listening is fine.
        let _ = self.notices.send(notice);
    }

    /// Drive the agent until the page unloads or its handle is dropped.
    /// Ineligible pages return at once without touching the document or the
    /// store.
    pub async fn run(mut self) -> Result<(), AgentError> {
        if !self.init().await? {
            return Ok(());
        }
        self.attempt_restore().await;

        loop {
            let wake = tokio::select! {
                // Queued events are handled before a teardown is noticed.
                biased;
                event = self.events_rx.recv() => match event {
                    Some(event) => Wake::Event(event),
                    None => Wake::Teardown,
                },
                _ = &mut self.host_gone => Wake::Teardown,
                _ = wait_for(self.state.autosave.deadline()) => Wake::Autosave,
                _ = wait_for(self.state.rebind.deadline()) => Wake::Rebind,
                _ = wait_for(self.state.retry.deadline()) => Wake::Retry,
            };

            match wake {
                Wake::Event(PageEvent::Field { .. }) => {
                    self.state.autosave.arm(Instant::now());
                }
                Wake::Event(PageEvent::DomMutated) => {
                    self.state.rebind.arm(Instant::now());
                }
                Wake::Event(PageEvent::RestoreRequested) => {
                    if let Err(e) = self.restore(true).await {
                        tracing::warn!(page = %self.page_id, error = %e, "manual restore failed");
                        self.notify(Notice::RestoreFailed(e.to_string()));
                    }
                }
                Wake::Event(PageEvent::Unload) | Wake::Teardown => {
                    // Pending timers die with the document; save what is there now.
                    if let Err(e) = self.save_now().await {
                        tracing::warn!(page = %self.page_id, error = %e, "save on unload failed");
                    }
                    break;
                }
                Wake::Autosave => {
                    self.state.autosave.fire();
                    if let Err(e) = self.save_now().await {
                        tracing::warn!(page = %self.page_id, error = %e, "autosave failed");
                    }
                }
                Wake::Rebind => {
                    self.state.rebind.fire();
                    self.bind_fields();
                }
                Wake::Retry => self.attempt_restore().await,
            }
        }

        self.tracer.flush().await;
        tracing::debug!(page = %self.page_id, "agent stopped");
        Ok(())
    }
}
