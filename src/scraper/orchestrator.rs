use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::scraper::extractor::extract_listing;
use crate::scraper::pacing::PacingPolicy;
use crate::scraper::source::{ListingSource, SourceError};
use crate::session::registry::{SessionRegistry, SharedSession};

/// Drives one extraction session end-to-end. Spawned as a background task;
/// this function is the only writer of the session's state, and every
/// failure lands in that state rather than escaping the task.
pub async fn run_session<S: ListingSource>(
    registry: SessionRegistry,
    session_id: Uuid,
    mut source: S,
    pacing: PacingPolicy,
    max_retries: u32,
) {
    let Some(session) = registry.get(&session_id).await else {
        warn!("session {} is not registered, nothing to run", session_id);
        return;
    };

    let query = {
        let mut state = session.write().await;
        state.mark_running();
        state.query.clone()
    };

    info!(
        "session {}: extracting \"{}\" in \"{}\" (max {})",
        session_id, query.keywords, query.location, query.max_results
    );

    if let Err(e) = source.open().await {
        fail_session(&session, format!("failed to open listing source: {}", e)).await;
        return;
    }

    if let Err(e) = source.search(&query.keywords, &query.location).await {
        fail_session(
            &session,
            format!("search for \"{}\" failed: {}", query.keywords, e),
        )
        .await;
        return;
    }

    let items = match source.list_items(query.max_results).await {
        Ok(items) => items,
        Err(e) => {
            fail_session(&session, format!("could not enumerate results: {}", e)).await;
            return;
        }
    };

    {
        let mut state = session.write().await;
        state.set_total(items.len());
    }
    info!(
        "session {}: {} result(s) available",
        session_id,
        items.len()
    );

    for item in &items {
        // Cancellation is cooperative and only honored between items, so an
        // in-flight extraction always finishes.
        if session.read().await.cancel_requested {
            let completed = {
                let mut state = session.write().await;
                state.cancel();
                state.completed
            };
            info!(
                "session {}: cancelled after {} record(s)",
                session_id, completed
            );
            return;
        }

        sleep(pacing.next_delay()).await;

        let mut attempts = 0;
        loop {
            match extract_listing(&mut source, item).await {
                Ok(Some(listing)) => {
                    let mut state = session.write().await;
                    state.push_record(listing);
                    debug!(
                        "session {}: item {} extracted ({}/{})",
                        session_id, item.index, state.completed, state.total
                    );
                    break;
                }
                Ok(None) => {
                    debug!(
                        "session {}: item {} has no name, skipping",
                        session_id, item.index
                    );
                    break;
                }
                Err(SourceError::Throttled(reason)) if attempts < max_retries => {
                    attempts += 1;
                    warn!(
                        "session {}: item {} throttled ({}), retry {}/{}",
                        session_id, item.index, reason, attempts, max_retries
                    );
                    sleep(pacing.next_delay()).await;
                }
                Err(SourceError::Throttled(reason)) => {
                    warn!(
                        "session {}: item {} still throttled after {} retries ({}), skipping",
                        session_id, item.index, max_retries, reason
                    );
                    break;
                }
                Err(e) => {
                    fail_session(
                        &session,
                        format!("extraction aborted at item {}: {}", item.index, e),
                    )
                    .await;
                    return;
                }
            }
        }
    }

    let completed = {
        let mut state = session.write().await;
        state.complete();
        state.completed
    };
    info!(
        "session {}: completed with {} record(s)",
        session_id, completed
    );
}

async fn fail_session(session: &SharedSession, message: String) {
    error!("{}", message);
    let mut state = session.write().await;
    state.fail(message);
}
