//! Ordered processing stages and their sparse state codes.

use crate::processor::pipelines;

use super::error::StateError;

pub const INITIAL: i32 = 0;
pub const BASE_METADATA: i32 = 5;
pub const QUICK_THUMBNAIL: i32 = 10;
pub const PLAY_MEDIA: i32 = 15;
pub const METADATA: i32 = 20;
pub const CATEGORIES: i32 = 25;
pub const GROUPS: i32 = 30;

/// Job every new record starts with.
pub const INITIAL_JOB: &str = "initial_state";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub code: i32,
    pub name: &'static str,
    /// Job name that runs this stage.
    pub job: &'static str,
    /// Processor identifiers, `None` for stages that only hand over.
    pub processors: Option<&'static [&'static str]>,
}

impl Stage {
    pub const fn new(
        code: i32,
        name: &'static str,
        job: &'static str,
        processors: Option<&'static [&'static str]>,
    ) -> Self {
        Self {
            code,
            name,
            job,
            processors,
        }
    }
}

const STANDARD_STAGES: [Stage; 7] = [
    Stage::new(INITIAL, "INITIAL", INITIAL_JOB, None),
    Stage::new(
        BASE_METADATA,
        "BASE_METADATA",
        "extract_base_metadata",
        Some(pipelines::BASE_METADATA),
    ),
    Stage::new(
        QUICK_THUMBNAIL,
        "QUICK_THUMBNAIL",
        "generate_quick_thumbnail",
        Some(pipelines::QUICK_THUMBNAIL),
    ),
    Stage::new(PLAY_MEDIA, "PLAY_MEDIA", "generate_play", Some(pipelines::PLAY_MEDIA)),
    Stage::new(METADATA, "METADATA", "calculate_metadata", Some(pipelines::METADATA)),
    Stage::new(CATEGORIES, "CATEGORIES", "categorize", Some(pipelines::CATEGORIES)),
    Stage::new(GROUPS, "GROUPS", "group", Some(pipelines::GROUPS)),
];

/// Stages in execution order. Codes strictly increase.
#[derive(Debug, Clone)]
pub struct StageTable {
    stages: Vec<Stage>,
}

impl StageTable {
    pub fn new(stages: Vec<Stage>) -> Result<Self, StateError> {
        if stages.is_empty() {
            return Err(StateError::InvalidStageTable("no stages".to_string()));
        }
        for pair in stages.windows(2) {
            if pair[1].code <= pair[0].code {
                return Err(StateError::InvalidStageTable(format!(
                    "stage {} ({}) does not follow {} ({})",
                    pair[1].name, pair[1].code, pair[0].name, pair[0].code
                )));
            }
        }
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].iter().any(|s| s.job == stage.job) {
                return Err(StateError::InvalidStageTable(format!(
                    "job '{}' is used twice",
                    stage.job
                )));
            }
        }
        Ok(Self { stages })
    }

    pub fn standard() -> Self {
        Self {
            stages: STANDARD_STAGES.to_vec(),
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// The stage with `code` and the one after it.
    pub fn lookup(&self, code: i32) -> Option<(&Stage, Option<&Stage>)> {
        let index = self.stages.iter().position(|s| s.code == code)?;
        Some((&self.stages[index], self.stages.get(index + 1)))
    }

    pub fn by_job(&self, job: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.job == job)
    }
}
