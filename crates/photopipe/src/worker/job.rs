use crate::media::RecordId;

/// A request to run one processing stage for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageJob {
    pub id: String,
    /// Job name of the stage, e.g. `extract_base_metadata`.
    pub name: String,
    pub record_id: RecordId,
}

impl StageJob {
    pub fn new(name: &str, record_id: RecordId) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            record_id,
        }
    }

    /// Rebuilds a job that was persisted earlier, keeping its id.
    pub fn restore(id: String, name: String, record_id: RecordId) -> Self {
        Self {
            id,
            name,
            record_id,
        }
    }
}

#[derive(Debug)]
pub struct JobResult {
    pub job_id: String,
    pub name: String,
    pub record_id: RecordId,
    pub success: bool,
    pub error: Option<String>,
}

impl JobResult {
    pub fn success(job: &StageJob) -> Self {
        Self {
            job_id: job.id.clone(),
            name: job.name.clone(),
            record_id: job.record_id,
            success: true,
            error: None,
        }
    }

    pub fn failure(job: &StageJob, error: String) -> Self {
        Self {
            job_id: job.id.clone(),
            name: job.name.clone(),
            record_id: job.record_id,
            success: false,
            error: Some(error),
        }
    }
}
