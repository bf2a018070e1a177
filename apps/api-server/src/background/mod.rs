//! Periodic deletion of expired posts.
//!
//! Reads already hide expired posts; the sweep only reclaims storage.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use wall_core::PostService;

/// Running expiry sweep. Dropping it leaves the job scheduled; call
/// [`ExpirySweep::stop`] to halt it.
pub struct ExpirySweep {
    scheduler: JobScheduler,
}

impl ExpirySweep {
    /// Schedule `posts.purge_expired()` on a six-field cron `schedule`
    /// (seconds first) and start ticking.
    pub async fn start(schedule: &str, posts: PostService) -> Result<Self, JobSchedulerError> {
        let job = Job::new_async(schedule, move |_id, _lock| {
            let posts = posts.clone();
            Box::pin(async move {
                match posts.purge_expired().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!(removed, "Expired posts swept"),
                    Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
                }
            })
        })?;

        let scheduler = JobScheduler::new().await?;
        let job_id = scheduler.add(job).await?;
        scheduler.start().await?;
        tracing::info!(schedule = %schedule, job_id = %job_id, "Expiry sweep scheduled");

        Ok(Self { scheduler })
    }

    pub async fn stop(mut self) -> Result<(), JobSchedulerError> {
        self.scheduler.shutdown().await?;
        tracing::info!("Expiry sweep stopped");
        Ok(())
    }
}
