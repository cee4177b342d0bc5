use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::{ClientError, PlatformPoller};
use crate::domain::models::platform::PlatformStatus;

pub const POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const CONNECTED_CLOSE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardView {
    /// Name and agent entry. Carries the message of a failed submission.
    Form { error: Option<String> },
    /// `qr` is `None` while the loading visual is shown.
    AwaitingScan { platform_id: String, qr: Option<String> },
    Connected { platform_id: String },
    Closed,
}

/// A spawned polling loop. Dropping the handle cancels the loop.
pub struct PollTimer {
    task: JoinHandle<()>,
}

impl PollTimer {
    fn spawn<F>(task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self { task: tokio::spawn(task) }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Default)]
struct Timers {
    status: Option<PollTimer>,
    qr: Option<PollTimer>,
}

fn lock(timers: &Mutex<Timers>) -> MutexGuard<'_, Timers> {
    timers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Form, then QR scan with status polling, then a short "connected" screen.
pub struct ConnectionWizard {
    poller: Arc<dyn PlatformPoller>,
    view: Arc<watch::Sender<WizardView>>,
    timers: Arc<Mutex<Timers>>,
}

impl ConnectionWizard {
    pub fn new(poller: Arc<dyn PlatformPoller>) -> Self {
        let (view, _) = watch::channel(WizardView::Form { error: None });
        Self {
            poller,
            view: Arc::new(view),
            timers: Arc::new(Mutex::new(Timers::default())),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WizardView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> WizardView {
        self.view.borrow().clone()
    }

    /// Number of polling loops still alive.
    pub fn active_timers(&self) -> usize {
        let timers = lock(&self.timers);
        [&timers.status, &timers.qr]
            .into_iter()
            .filter(|t| t.as_ref().is_some_and(PollTimer::is_running))
            .count()
    }

    /// Creates the platform and, on success, moves on to the scan step.
    pub async fn submit(&self, name: &str, agent_id: &str) -> Result<String, ClientError> {
        match self.poller.create_platform(name, agent_id).await {
            Ok(platform_id) => {
                self.start_polling(&platform_id);
                Ok(platform_id)
            }
            Err(e) => {
                self.view.send_replace(WizardView::Form { error: Some(e.to_string()) });
                Err(e)
            }
        }
    }

    pub fn start_polling(&self, platform_id: &str) {
        info!("Polling platform {}", platform_id);
        self.view.send_replace(WizardView::AwaitingScan { platform_id: platform_id.to_string(), qr: None });

        let qr = self.spawn_qr_timer(platform_id);
        let status = self.spawn_status_timer(platform_id);

        let previous = {
            let mut timers = lock(&self.timers);
            std::mem::replace(&mut *timers, Timers { status: Some(status), qr: Some(qr) })
        };
        drop(previous);
    }

    /// Drops the shown QR and polls for a fresh one against the same platform.
    pub fn refresh_qr(&self) {
        let platform_id = match &*self.view.borrow() {
            WizardView::AwaitingScan { platform_id, .. } => platform_id.clone(),
            _ => return,
        };

        self.view.send_replace(WizardView::AwaitingScan { platform_id: platform_id.clone(), qr: None });

        let fresh = self.spawn_qr_timer(&platform_id);
        let previous = lock(&self.timers).qr.replace(fresh);
        drop(previous);
    }

    pub fn close(&self) {
        let timers = std::mem::take(&mut *lock(&self.timers));
        drop(timers);
        self.view.send_replace(WizardView::Closed);
    }

    fn spawn_qr_timer(&self, platform_id: &str) -> PollTimer {
        let poller = self.poller.clone();
        let view = self.view.clone();
        let platform_id = platform_id.to_string();

        PollTimer::spawn(async move {
            let mut ticker = interval_at(Instant::now() + POLL_INTERVAL, POLL_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match poller.fetch_qr(&platform_id).await {
                    Ok(Some(qr)) => {
                        view.send_if_modified(|current| match current {
                            WizardView::AwaitingScan { platform_id: shown, qr: slot } if *shown == platform_id => {
                                *slot = Some(qr);
                                true
                            }
                            _ => false,
                        });
                        break;
                    }
                    Ok(None) => {}
                    Err(e) => debug!("QR poll for {} failed: {}", platform_id, e),
                }
            }
        })
    }

    fn spawn_status_timer(&self, platform_id: &str) -> PollTimer {
        let poller = self.poller.clone();
        let view = self.view.clone();
        let timers = self.timers.clone();
        let platform_id = platform_id.to_string();

        PollTimer::spawn(async move {
            let mut ticker = interval_at(Instant::now() + POLL_INTERVAL, POLL_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match poller.fetch_status(&platform_id).await {
                    Ok(PlatformStatus::Working) => break,
                    Ok(_) => {}
                    Err(e) => debug!("Status poll for {} failed: {}", platform_id, e),
                }
            }

            let qr_timer = lock(&timers).qr.take();
            drop(qr_timer);

            info!("Platform {} connected", platform_id);
            view.send_replace(WizardView::Connected { platform_id });
            sleep(CONNECTED_CLOSE_DELAY).await;
            view.send_replace(WizardView::Closed);
        })
    }
}

impl Drop for ConnectionWizard {
    fn drop(&mut self) {
        let timers = std::mem::take(&mut *lock(&self.timers));
        drop(timers);
    }
}
