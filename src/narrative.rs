//! Narrative generation: ~10 independent prompt → text calls per paper.
//!
//! Calls run strictly in sequence. Nothing here consumes another call's
//! output except the architecture walk-through, which optionally reads the
//! Method section text and the extracted main figure as multimodal input.
//! A failed call degrades its section to empty — the page is still built.

use crate::config::Language;
use crate::gemini::GeminiClient;
use crate::prompts;
use crate::richtext::clean_response;
use std::path::Path;
use tracing::{info, warn};

/// The generated text blocks composing the final document's prose.
///
/// Every field is a cleaned HTML fragment; an empty string means that
/// section's call failed and its slot renders empty.
#[derive(Debug, Clone, Default)]
pub struct NarrativeBundle {
    pub viral_title: String,
    pub hook_intro: String,
    pub problem_statement: String,
    pub solution_overview: String,
    pub architecture_description: String,
    pub key_innovations: String,
    pub applications: String,
    pub ten_questions: String,
    pub reviewer_perspective: String,
    pub improvements: String,
}

/// Run every narrative call for one paper.
pub async fn generate_narrative(
    gemini: &GeminiClient,
    language: Language,
    title: &str,
    abstract_text: &str,
    method_text: Option<&str>,
    main_figure: Option<&Path>,
) -> NarrativeBundle {
    let mut bundle = NarrativeBundle::default();

    let sections: [(&str, String, &mut String); 4] = [
        (
            "viral title",
            prompts::viral_title(language, title, abstract_text),
            &mut bundle.viral_title,
        ),
        (
            "hook intro",
            prompts::hook_intro(language, title, abstract_text),
            &mut bundle.hook_intro,
        ),
        (
            "problem statement",
            prompts::problem_statement(language, title, abstract_text),
            &mut bundle.problem_statement,
        ),
        (
            "solution overview",
            prompts::solution_overview(language, title, abstract_text),
            &mut bundle.solution_overview,
        ),
    ];
    for (i, (name, prompt, slot)) in sections.into_iter().enumerate() {
        info!("  [{}/10] Generating {name}…", i + 1);
        *slot = run_call(gemini, name, &prompt).await;
    }

    info!("  [5/10] Generating architecture walk-through…");
    bundle.architecture_description = generate_architecture(
        gemini,
        language,
        title,
        abstract_text,
        method_text,
        main_figure,
    )
    .await;

    let tail: [(&str, String, &mut String); 5] = [
        (
            "key innovations",
            prompts::key_innovations(language, title, abstract_text),
            &mut bundle.key_innovations,
        ),
        (
            "applications",
            prompts::applications(language, title, abstract_text),
            &mut bundle.applications,
        ),
        (
            "ten questions",
            prompts::ten_questions(language, title, abstract_text),
            &mut bundle.ten_questions,
        ),
        (
            "reviewer perspective",
            prompts::reviewer_perspective(language, title, abstract_text),
            &mut bundle.reviewer_perspective,
        ),
        (
            "improvement directions",
            prompts::improvement_directions(language, title, abstract_text),
            &mut bundle.improvements,
        ),
    ];
    for (i, (name, prompt, slot)) in tail.into_iter().enumerate() {
        info!("  [{}/10] Generating {name}…", i + 6);
        *slot = run_call(gemini, name, &prompt).await;
    }

    bundle
}

async fn run_call(gemini: &GeminiClient, name: &str, prompt: &str) -> String {
    match gemini.generate_text(prompt).await {
        Ok(text) => clean_response(&text),
        Err(e) => {
            warn!("{name} generation failed, leaving section empty: {e}");
            String::new()
        }
    }
}

/// The one multimodal call: Method text + main figure feed the walk-through.
///
/// Falls back from multimodal to text-only before giving up, so a rejected
/// image upload costs fidelity, not the section.
async fn generate_architecture(
    gemini: &GeminiClient,
    language: Language,
    title: &str,
    abstract_text: &str,
    method_text: Option<&str>,
    main_figure: Option<&Path>,
) -> String {
    let prompt = prompts::architecture(language, title, abstract_text, method_text);

    if let Some(figure_path) = main_figure {
        match std::fs::read(figure_path) {
            Ok(png_bytes) => {
                let multimodal_prompt = format!("{prompt}{}", prompts::figure_note(language));
                match gemini
                    .generate_text_with_image(&multimodal_prompt, &png_bytes)
                    .await
                {
                    Ok(text) => return clean_response(&text),
                    Err(e) => {
                        warn!("Multimodal architecture call failed, retrying text-only: {e}")
                    }
                }
            }
            Err(e) => warn!("Could not read main figure {}: {e}", figure_path.display()),
        }
    }

    run_call(gemini, "architecture description", &prompt).await
}
