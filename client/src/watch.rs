use std::time::Duration;

use chrono::Local;
use futures::stream::{BoxStream, StreamExt};
use larder_common::alerts::{auto_delete_summary, ExpiryAlert};
use larder_common::events::ChangeEvent;
use tracing::{debug, warn};

use crate::alerts::AlertScheduler;
use crate::events::subscribe_changes;
use crate::session::Session;

/// Something the watch loop wants the user to see.
#[derive(Debug, Clone)]
pub enum Notice {
    Alert(ExpiryAlert),
    /// Summary of items the auto-expire sweep just trashed.
    AutoDeleted(String),
    Refreshed { active: usize, trash: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub poll_every: Duration,
    /// Run the auto-expire sweep after every refresh.
    pub auto_delete: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        WatchOptions {
            poll_every: Duration::from_secs(60),
            auto_delete: true,
        }
    }
}

async fn next_event(events: &mut Option<BoxStream<'static, ChangeEvent>>) -> Option<ChangeEvent> {
    match events {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

/// Keep `session` fresh until the process stops.
///
/// Refreshes on every poll tick and on every change event from the server.
/// If the event socket cannot be opened or drops, polling carries on alone.
pub async fn watch<F>(session: &mut Session, options: WatchOptions, mut notify: F)
where
    F: FnMut(Notice),
{
    let mut scheduler = AlertScheduler::new();
    let mut events = match subscribe_changes(&session.api().events_url()).await {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!(error = %e, "change events unavailable; polling only");
            None
        }
    };

    let mut ticker = tokio::time::interval(options.poll_every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        let notices = tokio::select! {
            _ = ticker.tick() => cycle(session, &mut scheduler, options.auto_delete).await,
            event = next_event(&mut events) => match event {
                Some(event) => {
                    debug!(kind = ?event.kind, "change event");
                    if let Err(e) = session.refresh_affected(&event).await {
                        warn!(error = %e, "refresh after change event failed");
                        continue;
                    }
                    evaluate(session, &mut scheduler, options.auto_delete).await
                }
                None => {
                    warn!("change event stream closed; polling only");
                    events = None;
                    continue;
                }
            },
        };

        for notice in notices {
            notify(notice);
        }
    }
}

/// One full refresh, sweep and alert pass.
pub async fn cycle(
    session: &mut Session,
    scheduler: &mut AlertScheduler,
    auto_delete: bool,
) -> Vec<Notice> {
    if let Err(e) = session.refresh().await {
        warn!(error = %e, "refresh failed");
        return Vec::new();
    }
    evaluate(session, scheduler, auto_delete).await
}

/// Sweep and alert over what the session currently holds.
async fn evaluate(
    session: &mut Session,
    scheduler: &mut AlertScheduler,
    auto_delete: bool,
) -> Vec<Notice> {
    let mut notices = Vec::new();
    let now = Local::now();
    if auto_delete {
        let moved = session.auto_expire_sweep(&now).await;
        if let Some(summary) = auto_delete_summary(moved.as_slice()) {
            notices.push(Notice::AutoDeleted(summary));
        }
    }
    notices.push(Notice::Refreshed {
        active: session.active().len(),
        trash: session.trash().len(),
    });
    notices.extend(
        scheduler
            .due(session.active(), &now, auto_delete)
            .into_iter()
            .map(Notice::Alert),
    );
    notices
}
