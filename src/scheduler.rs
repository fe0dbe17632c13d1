use tokio_cron_scheduler::{Job, JobScheduler};

use std::time::Duration;
use tracing::{error, info};

use crate::core::leaderboard::{CenterLeaderboard, Leaderboards};
use crate::error::BoardResult;

pub struct Scheduler {
    scheduler: JobScheduler,
    leaderboards: Leaderboards,
}

pub enum JobProcess<'schedule> {
    WarmCache,
    RefreshCache(&'schedule str),
}

impl Scheduler {
    pub async fn new(leaderboards: Leaderboards) -> BoardResult<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Scheduler {
            scheduler,
            leaderboards,
        })
    }

    pub async fn add_job(&self, job_process: JobProcess<'_>) -> BoardResult<uuid::Uuid> {
        let job = match job_process {
            JobProcess::WarmCache => warm_cache_job(self.leaderboards.clone())?,
            JobProcess::RefreshCache(schedule) => {
                refresh_cache_job(schedule, self.leaderboards.clone())?
            }
        };
        Ok(self.scheduler.add(job).await?)
    }

    pub async fn start(&self) -> BoardResult<()> {
        Ok(self.scheduler.start().await?)
    }

    pub async fn shutdown(&mut self) -> BoardResult<()> {
        Ok(self.scheduler.shutdown().await?)
    }
}

//////////////////
// Jobs definition
//////////////////

fn warm_cache_job(leaderboards: Leaderboards) -> BoardResult<Job> {
    let job = Job::new_one_shot_async(Duration::from_secs(0), move |_uuid, _l| {
        let leaderboards = leaderboards.clone();
        Box::pin(async move {
            let center = leaderboards.refresh().await;
            info!("Cache warmed up with {} students.", center.total_students);
        })
    })?;
    Ok(job)
}

fn refresh_cache_job(schedule: &str, leaderboards: Leaderboards) -> BoardResult<Job> {
    let job = Job::new_async(schedule, move |uuid, mut l| {
        let leaderboards = leaderboards.clone();
        Box::pin(async move {
            let center = leaderboards.refresh().await;
            info!("{}", refresh_summary(&center, leaderboards.snapshot_age()));

            // Query the next execution time for this job
            let next_tick = l.next_tick_for_job(uuid).await;
            match next_tick {
                Ok(Some(ts)) => info!("Next refresh of student directory at {:?}", ts),
                _ => error!("Could not get next tick for refresh cache job"),
            }
        })
    })?;
    Ok(job)
}

fn refresh_summary(center: &CenterLeaderboard, snapshot_age: Option<chrono::Duration>) -> String {
    let cached = match snapshot_age {
        Some(age) => format!("cached snapshot is {}s old", age.num_seconds()),
        None => "cache is cold".to_string(),
    };
    match center.leaderboard.first() {
        Some(leader) => format!(
            "{} students ranked, center leader is {} with {} pts ({cached}).",
            center.total_students, leader.student.full_name, leader.student.total_behavior_points
        ),
        None => format!("No ranking data after refresh ({cached})."),
    }
}
