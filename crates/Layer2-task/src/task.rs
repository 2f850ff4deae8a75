//! Task definition and types

use crate::state::TaskStatus;
use chrono::{DateTime, Utc};
use inkdraft_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on chapters in a single workflow
pub const MAX_CHAPTERS: u32 = 200;

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a new random TaskId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from string form
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Which generation workflow a task runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    GenerateAll,
    BatchGenerateChapters,
    AnalyzeBook,
    GenerateName,
    RewriteAnalysis,
    Custom,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskKind::GenerateAll => "generate-all",
            TaskKind::BatchGenerateChapters => "batch-generate-chapters",
            TaskKind::AnalyzeBook => "analyze-book",
            TaskKind::GenerateName => "generate-name",
            TaskKind::RewriteAnalysis => "rewrite-analysis",
            TaskKind::Custom => "custom",
        };
        write!(f, "{}", name)
    }
}

/// Workflow inputs, one concrete shape per kind
///
/// The store treats this as opaque; only the executor interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TaskParams {
    /// Full novel: outline, characters, then every chapter
    GenerateAll {
        genre: String,
        theme: String,
        protagonist: String,
        chapter_count: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        world_settings: Option<String>,
    },

    /// Chapters only, against an existing outline
    BatchGenerateChapters {
        outline: String,
        characters: String,
        start_chapter: u32,
        count: u32,
    },

    /// Consistency / plot analysis of a manuscript
    AnalyzeBook { manuscript: String },

    /// Title / name suggestions
    GenerateName {
        genre: String,
        theme: String,
        count: u32,
    },

    /// Rewrite an earlier analysis with new instructions
    RewriteAnalysis {
        analysis: String,
        instructions: String,
    },

    /// One free-form prompt
    Custom { prompt: String },
}

impl TaskParams {
    /// Reject values the workflow planner cannot honor. Everything here comes
    /// straight off the HTTP request body, so ranges are checked before a
    /// task record is ever created.
    pub fn validate(&self) -> Result<()> {
        match self {
            TaskParams::GenerateAll { chapter_count, .. } => {
                check_chapter_count(*chapter_count)
            }
            TaskParams::BatchGenerateChapters {
                start_chapter,
                count,
                ..
            } => {
                check_chapter_count(*count)?;
                if *start_chapter == 0 {
                    return Err(Error::InvalidInput(
                        "start_chapter must be at least 1".into(),
                    ));
                }
                if start_chapter.checked_add(*count).is_none() {
                    return Err(Error::InvalidInput(format!(
                        "chapter range {}..{}+{} overflows",
                        start_chapter, start_chapter, count
                    )));
                }
                Ok(())
            }
            TaskParams::GenerateName { count, .. } => {
                if !(1..=100).contains(count) {
                    return Err(Error::InvalidInput(format!(
                        "name count must be between 1 and 100, got {}",
                        count
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// The kind tag for this parameter shape
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskParams::GenerateAll { .. } => TaskKind::GenerateAll,
            TaskParams::BatchGenerateChapters { .. } => TaskKind::BatchGenerateChapters,
            TaskParams::AnalyzeBook { .. } => TaskKind::AnalyzeBook,
            TaskParams::GenerateName { .. } => TaskKind::GenerateName,
            TaskParams::RewriteAnalysis { .. } => TaskKind::RewriteAnalysis,
            TaskParams::Custom { .. } => TaskKind::Custom,
        }
    }
}

fn check_chapter_count(count: u32) -> Result<()> {
    if count == 0 || count > MAX_CHAPTERS {
        return Err(Error::InvalidInput(format!(
            "chapter count must be between 1 and {}, got {}",
            MAX_CHAPTERS, count
        )));
    }
    Ok(())
}

/// One generated chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub number: u32,
    pub title: String,
    pub content: String,
}

/// Output of one workflow phase, merged into the task result
#[derive(Debug, Clone)]
pub enum PhaseOutput {
    Outline(String),
    Characters(String),
    Chapter(Chapter),
    Analysis(String),
    Names(Vec<String>),
    Text(String),
}

/// Accumulated task output, one shape per kind
///
/// Updated incrementally so partial progress survives a pause.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TaskOutput {
    Novel {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outline: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        characters: Option<String>,
        chapters: Vec<Chapter>,
    },
    Chapters { chapters: Vec<Chapter> },
    Analysis { text: String },
    Names { names: Vec<String> },
    Text { text: String },
}

impl TaskOutput {
    /// Empty output shell for a kind
    fn empty_for(kind: TaskKind) -> Self {
        match kind {
            TaskKind::GenerateAll => TaskOutput::Novel {
                outline: None,
                characters: None,
                chapters: Vec::new(),
            },
            TaskKind::BatchGenerateChapters => TaskOutput::Chapters {
                chapters: Vec::new(),
            },
            TaskKind::AnalyzeBook | TaskKind::RewriteAnalysis => TaskOutput::Analysis {
                text: String::new(),
            },
            TaskKind::GenerateName => TaskOutput::Names { names: Vec::new() },
            TaskKind::Custom => TaskOutput::Text {
                text: String::new(),
            },
        }
    }

    /// Merge one phase's output in place
    fn absorb(&mut self, phase: PhaseOutput) {
        match (self, phase) {
            (TaskOutput::Novel { outline, .. }, PhaseOutput::Outline(text)) => {
                *outline = Some(text);
            }
            (TaskOutput::Novel { characters, .. }, PhaseOutput::Characters(text)) => {
                *characters = Some(text);
            }
            (TaskOutput::Novel { chapters, .. }, PhaseOutput::Chapter(chapter))
            | (TaskOutput::Chapters { chapters }, PhaseOutput::Chapter(chapter)) => {
                chapters.push(chapter);
            }
            (TaskOutput::Analysis { text }, PhaseOutput::Analysis(new_text)) => {
                *text = new_text;
            }
            (TaskOutput::Names { names }, PhaseOutput::Names(new_names)) => {
                names.extend(new_names);
            }
            (TaskOutput::Text { text }, PhaseOutput::Text(new_text)) => {
                *text = new_text;
            }
            (output, phase) => {
                // Kind mismatch is a programming error in the workflow table,
                // not a user-visible failure; keep the record consistent.
                tracing::warn!(?phase, ?output, "phase output does not match task output shape");
            }
        }
    }
}

/// Structured progress record polled by clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    /// Current step name (e.g., "outline", "chapter-3")
    pub step: String,

    /// 0-100, never decreasing while processing
    pub percentage: u8,

    /// Human-readable message
    pub message: String,

    /// Phases completed so far; the resume point
    pub cursor: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            step: "created".to_string(),
            percentage: 0,
            message: "Waiting to start".to_string(),
            cursor: 0,
        }
    }
}

/// A background generation task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier, never reused
    pub id: TaskId,

    /// Human-readable label, immutable after creation
    pub name: String,

    /// Current lifecycle state
    pub status: TaskStatus,

    /// Ordering hint: higher runs first when consumers drain in order
    pub priority: i32,

    /// Progress record
    pub progress: Progress,

    /// Workflow inputs (carries the kind tag)
    pub params: TaskParams,

    /// Accumulated output, present once the first phase lands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskOutput>,

    /// Last failure message, set only when status is Failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Claim generation, bumped on every `pending -> processing` transition.
    /// Identifies the one run whose writes the store accepts; a run holding
    /// an older generation has been superseded.
    #[serde(skip)]
    pub generation: u64,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending task
    pub fn new(name: impl Into<String>, params: TaskParams) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            name: name.into(),
            status: TaskStatus::Pending,
            priority: 0,
            progress: Progress::default(),
            params,
            result: None,
            error: None,
            generation: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The workflow kind, derived from the params shape
    pub fn kind(&self) -> TaskKind {
        self.params.kind()
    }

    /// Merge a phase output into the result and advance the cursor
    pub(crate) fn merge_output(&mut self, phase: PhaseOutput) {
        let kind = self.kind();
        self.result
            .get_or_insert_with(|| TaskOutput::empty_for(kind))
            .absorb(phase);
        self.progress.cursor += 1;
        self.updated_at = Utc::now();
    }
}
