//! Prompt/context encoding.
//!
//! Renders the recent conversation plus a synthesized tutor instruction into
//! the single string a backend consumes. Encoding is pure: given the same
//! profile, style, and turn sequence, the output is identical.

use lingo_chat::{Turn, TutorProfile};

/// Which textual framing a backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Plain `role: content` transcript lines (remote endpoint).
    RolePrefix,
    /// `<|im_start|>`/`<|im_end|>`-delimited chat template (local server).
    ChatML,
}

/// Synthesize the tutor system prompt for a session.
///
/// The 5-point pedagogical directive is only attached for the remote
/// backend; the local model gets the short persona line.
pub fn system_prompt(profile: &TutorProfile, with_pedagogy: bool) -> String {
    let mut prompt = format!(
        "You are a friendly {} language teacher. The student is at {} level and wants to practice: {}. ",
        profile.language, profile.level, profile.topic
    );
    if with_pedagogy {
        prompt.push_str(&format!(
            "Please:\n\
             1. Respond naturally in {}\n\
             2. Correct mistakes gently and provide explanations\n\
             3. Use appropriate vocabulary for their level\n\
             4. Encourage conversation and ask follow-up questions\n\
             5. Provide examples and practice exercises when helpful\n",
            profile.language
        ));
    }
    prompt
}

/// Encode the system prompt and turns into a backend-ready context string.
///
/// `turns` is assumed to already be windowed to the most recent N; the
/// encoder does not truncate.
pub fn encode(style: PromptStyle, profile: &TutorProfile, turns: &[Turn]) -> String {
    match style {
        PromptStyle::RolePrefix => encode_role_prefix(profile, turns),
        PromptStyle::ChatML => encode_chatml(profile, turns),
    }
}

fn encode_role_prefix(profile: &TutorProfile, turns: &[Turn]) -> String {
    let mut out = format!("system: {}", system_prompt(profile, true));
    for turn in turns {
        out.push_str(&format!("{}: {}\n", turn.role, turn.content));
    }
    out.push_str("assistant: ");
    out
}

fn encode_chatml(profile: &TutorProfile, turns: &[Turn]) -> String {
    let mut out = format!(
        "<|im_start|>system\n{}<|im_end|>\n",
        system_prompt(profile, false)
    );
    for turn in turns {
        out.push_str(&format!(
            "<|im_start|>{}\n{}<|im_end|>\n",
            turn.role, turn.content
        ));
    }
    // Left open on purpose: the model generates until its stop sequence.
    out.push_str("<|im_start|>assistant\n");
    out
}
