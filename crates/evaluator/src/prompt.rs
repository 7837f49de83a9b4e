//! Rendering genome traits into model messages.

use natsel_core::{Genome, ReasoningStyle, Task};

/// Instruction line for each reasoning strategy.
pub fn style_instruction(style: ReasoningStyle) -> &'static str {
    match style {
        ReasoningStyle::ChainOfThought => {
            "Think the problem through as a chain of thought before answering."
        }
        ReasoningStyle::StepByStep => {
            "Work in explicit numbered steps and only then state your answer."
        }
        ReasoningStyle::Analogical => {
            "Relate the problem to a similar one you know, then adapt its solution."
        }
        ReasoningStyle::DebateSelf => {
            "Argue for and against your candidate answer before committing."
        }
        ReasoningStyle::FirstPrinciples => {
            "Reduce the problem to fundamental facts and rebuild the answer from them."
        }
        ReasoningStyle::Elimination => {
            "Enumerate the plausible answers and eliminate the wrong ones first."
        }
    }
}

fn risk_instruction(risk_tolerance: f64) -> &'static str {
    if risk_tolerance >= 0.66 {
        "When unsure, commit to your single best guess rather than hedging."
    } else if risk_tolerance >= 0.33 {
        "Balance decisiveness against caution when you are unsure."
    } else {
        "When unsure, prefer conservative, widely accepted answers."
    }
}

/// Assemble the system message for one genome.
pub fn render_system_message(genome: &Genome) -> String {
    format!(
        "{}\n\nReasoning approach: {}\n{}\n",
        genome.system_prompt,
        style_instruction(genome.reasoning_style),
        risk_instruction(genome.risk_tolerance),
    )
}

const PREDICTION_PROMPT: &str = "You are being tested on your predictive ability. You will be asked a question.

FIRST: Predict how confident you are that you can answer correctly.
THEN: Provide your answer.

Respond in EXACTLY this format:
Confidence: <number 0-100>%
Answer: <your answer>

Be honest about your confidence. Overconfidence is penalized.

Question: ";

/// Assemble the user message for one task.
pub fn render_user_prompt(task: &Task) -> String {
    format!("{PREDICTION_PROMPT}{}", task.prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use natsel_core::{TaskType, TraitSpace};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_system_message_includes_style_and_persona() {
        let space = TraitSpace::default();
        let mut rng = StdRng::seed_from_u64(1);
        let genome = Genome::random(&mut rng, &space);
        let msg = render_system_message(&genome);
        assert!(msg.contains(&genome.system_prompt));
        assert!(msg.contains("Reasoning approach:"));
    }

    #[test]
    fn test_user_prompt_demands_confidence_format() {
        let task = Task::new("t01", TaskType::Trivia, "What is 2+2?", "4", 0.1);
        let msg = render_user_prompt(&task);
        assert!(msg.contains("Confidence: <number 0-100>%"));
        assert!(msg.ends_with("What is 2+2?"));
    }

    #[test]
    fn test_each_style_has_a_distinct_instruction() {
        let mut seen = std::collections::HashSet::new();
        for style in ReasoningStyle::ALL {
            assert!(seen.insert(style_instruction(style)));
        }
    }
}
