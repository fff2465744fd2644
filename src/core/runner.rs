use crate::core::Job;
use crate::utils::error::Result;
use crate::utils::monitor::ResourceMonitor;

pub struct JobRunner<J: Job> {
    job: J,
    monitor: ResourceMonitor,
}

impl<J: Job> JobRunner<J> {
    pub fn new(job: J) -> Self {
        Self::new_with_monitoring(job, false)
    }

    pub fn new_with_monitoring(job: J, monitor_enabled: bool) -> Self {
        Self {
            job,
            monitor: ResourceMonitor::new(monitor_enabled),
        }
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    pub fn run(&self) -> Result<String> {
        let name = self.job.name();
        tracing::info!("🚀 Starting job '{}'", name);

        tracing::debug!("📥 Extracting inputs...");
        let input = self.job.extract()?;
        self.monitor.log_stats("extract");

        tracing::debug!("⚙️ Computing...");
        let output = self.job.transform(input)?;
        self.monitor.log_stats("transform");

        tracing::debug!("💾 Writing outputs...");
        let location = self.job.load(output)?;
        self.monitor.log_stats("load");

        tracing::info!("✅ Job '{}' finished, output at {}", name, location);
        if self.monitor.is_enabled() {
            self.monitor.log_final_stats();
        }

        Ok(location)
    }
}
