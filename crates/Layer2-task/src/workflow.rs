//! Workflow plans and prompt construction
//!
//! A workflow is an ordered list of phases. One phase = one LLM call = one
//! checkpoint: the executor persists after each phase and re-checks for
//! external pause/delete before the next. Batch chapter jobs get one phase
//! per chapter, so pausing stops within a single chapter's granularity.

use crate::task::{Chapter, PhaseOutput, Task, TaskOutput, TaskParams};
use inkdraft_provider::{CompletionOptions, Message};

/// One checkpointed step of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Novel outline
    Outline,

    /// Character profiles
    Characters,

    /// One chapter, by number
    Chapter(u32),

    /// Manuscript analysis
    Analyze,

    /// Title/name suggestions
    Names,

    /// Rewrite of an earlier analysis
    Rewrite,

    /// Free-form prompt
    Custom,
}

impl Phase {
    /// Step name shown in progress records
    pub fn step_name(&self) -> String {
        match self {
            Phase::Outline => "outline".to_string(),
            Phase::Characters => "characters".to_string(),
            Phase::Chapter(n) => format!("chapter-{}", n),
            Phase::Analyze => "analyze".to_string(),
            Phase::Names => "names".to_string(),
            Phase::Rewrite => "rewrite".to_string(),
            Phase::Custom => "custom".to_string(),
        }
    }
}

/// Ordered phase list for a task
#[derive(Debug, Clone)]
pub struct WorkflowPlan {
    pub phases: Vec<Phase>,
}

impl WorkflowPlan {
    /// Build the plan for a parameter shape. Deterministic: the same params
    /// always yield the same phase list, which is what makes the progress
    /// cursor a valid resume point.
    pub fn for_params(params: &TaskParams) -> Self {
        let phases = match params {
            TaskParams::GenerateAll { chapter_count, .. } => {
                let mut phases = vec![Phase::Outline, Phase::Characters];
                phases.extend((1..=*chapter_count).map(Phase::Chapter));
                phases
            }
            TaskParams::BatchGenerateChapters {
                start_chapter,
                count,
                ..
            } => (*start_chapter..start_chapter.saturating_add(*count))
                .map(Phase::Chapter)
                .collect(),
            TaskParams::AnalyzeBook { .. } => vec![Phase::Analyze],
            TaskParams::GenerateName { .. } => vec![Phase::Names],
            TaskParams::RewriteAnalysis { .. } => vec![Phase::Rewrite],
            TaskParams::Custom { .. } => vec![Phase::Custom],
        };
        Self { phases }
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

const SYSTEM_PROMPT: &str =
    "You are a professional novelist and editor. Answer with the requested \
     content only, no preamble.";

/// Build the messages for one phase, given the task's params and whatever
/// earlier phases already produced.
pub fn build_messages(phase: Phase, task: &Task) -> Vec<Message> {
    let user = match (phase, &task.params) {
        (
            Phase::Outline,
            TaskParams::GenerateAll {
                genre,
                theme,
                protagonist,
                chapter_count,
                world_settings,
            },
        ) => {
            let mut prompt = format!(
                "Write a {} chapter outline for a {} novel.\nTheme: {}\nProtagonist: {}\n",
                chapter_count, genre, theme, protagonist
            );
            if let Some(world) = world_settings {
                prompt.push_str(&format!("World settings: {}\n", world));
            }
            prompt.push_str("Give one short paragraph per chapter.");
            prompt
        }

        (Phase::Characters, TaskParams::GenerateAll { protagonist, .. }) => {
            format!(
                "Based on this outline:\n\n{}\n\nWrite character profiles for the \
                 protagonist {} and the main supporting cast.",
                outline_so_far(task),
                protagonist
            )
        }

        (Phase::Chapter(number), TaskParams::GenerateAll { genre, theme, .. }) => {
            format!(
                "Outline:\n{}\n\nCharacters:\n{}\n\nWrite chapter {} of this {} novel \
                 (theme: {}). Start with the chapter title on its own line.",
                outline_so_far(task),
                characters_so_far(task),
                number,
                genre,
                theme
            )
        }

        (
            Phase::Chapter(number),
            TaskParams::BatchGenerateChapters {
                outline,
                characters,
                ..
            },
        ) => {
            format!(
                "Outline:\n{}\n\nCharacters:\n{}\n\nWrite chapter {}. Start with the \
                 chapter title on its own line.",
                outline, characters, number
            )
        }

        (Phase::Analyze, TaskParams::AnalyzeBook { manuscript }) => {
            format!(
                "Analyze this manuscript for plot holes, inconsistent character \
                 behavior, and pacing problems:\n\n{}",
                manuscript
            )
        }

        (
            Phase::Names,
            TaskParams::GenerateName {
                genre,
                theme,
                count,
            },
        ) => {
            format!(
                "Suggest {} titles for a {} novel about {}. One per line, nothing else.",
                count, genre, theme
            )
        }

        (
            Phase::Rewrite,
            TaskParams::RewriteAnalysis {
                analysis,
                instructions,
            },
        ) => {
            format!(
                "Rewrite this analysis.\n\nAnalysis:\n{}\n\nInstructions: {}",
                analysis, instructions
            )
        }

        (Phase::Custom, TaskParams::Custom { prompt }) => prompt.clone(),

        // Plans are built from the same params they are executed against, so
        // a mismatched pair cannot occur through the public API.
        (phase, _) => phase.step_name(),
    };

    vec![Message::system(SYSTEM_PROMPT), Message::user(user)]
}

/// Completion options per phase: structural output runs cooler, chapter
/// prose gets the largest output budget
pub fn options_for(phase: Phase) -> CompletionOptions {
    match phase {
        Phase::Outline | Phase::Analyze | Phase::Rewrite | Phase::Names => {
            CompletionOptions::precise()
        }
        Phase::Chapter(_) => CompletionOptions::default().with_max_tokens(8192),
        Phase::Characters | Phase::Custom => CompletionOptions::default(),
    }
}

/// Convert raw completion text into the phase's structured output
pub fn parse_output(phase: Phase, text: String) -> PhaseOutput {
    match phase {
        Phase::Outline => PhaseOutput::Outline(text),
        Phase::Characters => PhaseOutput::Characters(text),
        Phase::Chapter(number) => PhaseOutput::Chapter(parse_chapter(number, text)),
        Phase::Analyze | Phase::Rewrite => PhaseOutput::Analysis(text),
        Phase::Names => PhaseOutput::Names(
            text.lines()
                .map(|line| line.trim().trim_start_matches(['-', '*', ' ']).to_string())
                .filter(|line| !line.is_empty())
                .collect(),
        ),
        Phase::Custom => PhaseOutput::Text(text),
    }
}

/// First non-empty line becomes the title, the rest the body
fn parse_chapter(number: u32, text: String) -> Chapter {
    let mut lines = text.lines();
    let title = lines
        .by_ref()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().trim_start_matches('#').trim().to_string())
        .unwrap_or_else(|| format!("Chapter {}", number));
    let content = lines.collect::<Vec<_>>().join("\n").trim().to_string();

    Chapter {
        number,
        title,
        content,
    }
}

fn outline_so_far(task: &Task) -> &str {
    match &task.result {
        Some(TaskOutput::Novel {
            outline: Some(outline),
            ..
        }) => outline,
        _ => "",
    }
}

fn characters_so_far(task: &Task) -> &str {
    match &task.result {
        Some(TaskOutput::Novel {
            characters: Some(characters),
            ..
        }) => characters,
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[test]
    fn test_generate_all_plan_shape() {
        let params = TaskParams::GenerateAll {
            genre: "scifi".to_string(),
            theme: "first contact".to_string(),
            protagonist: "Juno".to_string(),
            chapter_count: 3,
            world_settings: None,
        };
        let plan = WorkflowPlan::for_params(&params);

        assert_eq!(
            plan.phases,
            vec![
                Phase::Outline,
                Phase::Characters,
                Phase::Chapter(1),
                Phase::Chapter(2),
                Phase::Chapter(3),
            ]
        );
    }

    #[test]
    fn test_batch_plan_numbers_from_start() {
        let params = TaskParams::BatchGenerateChapters {
            outline: "o".to_string(),
            characters: "c".to_string(),
            start_chapter: 5,
            count: 3,
        };
        let plan = WorkflowPlan::for_params(&params);

        assert_eq!(
            plan.phases,
            vec![Phase::Chapter(5), Phase::Chapter(6), Phase::Chapter(7)]
        );
    }

    #[test]
    fn test_options_per_phase() {
        assert_eq!(options_for(Phase::Outline).temperature, 0.3);
        assert_eq!(options_for(Phase::Chapter(1)).max_tokens, 8192);
        assert_eq!(
            options_for(Phase::Custom).temperature,
            CompletionOptions::default().temperature
        );
    }

    #[test]
    fn test_chapter_prompt_carries_earlier_output() {
        let params = TaskParams::GenerateAll {
            genre: "fantasy".to_string(),
            theme: "loss".to_string(),
            protagonist: "Edda".to_string(),
            chapter_count: 1,
            world_settings: None,
        };
        let mut task = Task::new("t", params);
        task.merge_output(PhaseOutput::Outline("THE-OUTLINE".to_string()));
        task.merge_output(PhaseOutput::Characters("THE-CAST".to_string()));

        let messages = build_messages(Phase::Chapter(1), &task);
        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.contains("THE-OUTLINE"));
        assert!(messages[1].content.contains("THE-CAST"));
    }

    #[test]
    fn test_parse_chapter_title_and_body() {
        let chapter = parse_chapter(2, "# The Storm\n\nRain fell.\nMore rain.".to_string());
        assert_eq!(chapter.number, 2);
        assert_eq!(chapter.title, "The Storm");
        assert_eq!(chapter.content, "Rain fell.\nMore rain.");
    }

    #[test]
    fn test_parse_names_strips_bullets() {
        let output = parse_output(Phase::Names, "- First Light\n* Second Sun\n\nThird\n".into());
        match output {
            PhaseOutput::Names(names) => {
                assert_eq!(names, vec!["First Light", "Second Sun", "Third"]);
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }
}
