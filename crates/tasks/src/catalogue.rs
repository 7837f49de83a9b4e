//! Built-in task catalogue and the custom tasks-file loader.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use natsel_core::{Task, TaskType};

use crate::TaskBankError;

/// The built-in catalogue: 42 prediction tasks across three types.
///
/// Trivia tasks mix calibration anchors (easy, agents should be confident)
/// with obscure and commonly-wrong facts. Estimation tasks range from
/// anchors to Fermi problems. Reasoning tasks are classic cognitive traps,
/// formal logic, and multi-step puzzles.
pub fn builtin_catalogue() -> Vec<Task> {
    let t = |id, prompt, truth, difficulty| Task::new(id, TaskType::Trivia, prompt, truth, difficulty);
    let e = |id, prompt, truth, difficulty| Task::new(id, TaskType::Estimation, prompt, truth, difficulty);
    let r = |id, prompt, truth, difficulty| Task::new(id, TaskType::Reasoning, prompt, truth, difficulty);

    vec![
        // Trivia: easy anchors
        t("t01", "What is the chemical symbol for gold?", "Au", 0.1),
        t("t02", "What planet is closest to the Sun?", "Mercury", 0.1),
        // Trivia: medium
        t("t03", "What is the capital of Australia?", "Canberra", 0.4),
        t("t04", "In what year was the Treaty of Westphalia signed?", "1648", 0.7),
        t("t05", "What is the second most abundant element in Earth's crust by mass?", "Silicon", 0.6),
        // Trivia: hard, obscure facts that LLMs often get wrong
        t("t06", "What is the smallest country in Africa by land area?", "Seychelles", 0.8),
        t("t07", "Who was the first person to observe Saturn's rings (though he didn't know what they were)?", "Galileo", 0.7),
        t("t08", "What is the only letter that doesn't appear in any U.S. state name?", "Q", 0.8),
        t("t09", "In what year did the last confirmed smallpox case occur?", "1978", 0.9),
        t("t10", "What is the longest river entirely within one country?", "Yangtze", 0.8),
        // Trivia: trick / commonly-wrong
        t("t11", "How many time zones does China officially use?", "1", 0.8),
        t("t12", "What fruit is the most produced in the world by weight?", "Tomato", 0.7),
        t("t13", "Which has more neurons: a human brain or a dog's brain?", "Human", 0.3),
        t("t14", "What color is a polar bear's skin (not fur)?", "Black", 0.7),
        t("t15", "What country has the most islands?", "Sweden", 0.8),
        // Estimation: easy anchors
        e("e01", "Estimate the number of bones in the adult human body.", "206", 0.3),
        e("e02", "Estimate the boiling point of water at sea level in Fahrenheit.", "212", 0.2),
        // Estimation: medium
        e("e03", "Estimate the population of Nigeria in millions (nearest 10).", "220", 0.6),
        e("e04", "Estimate the depth of the Mariana Trench in meters (nearest 500).", "11000", 0.6),
        e("e05", "Estimate the number of airports in the United States (nearest 1000).", "19000", 0.8),
        // Estimation: Fermi problems
        e("e06", "Estimate the number of piano tuners in Chicago (nearest 50).", "200", 0.9),
        e("e07", "Estimate the total length of all roads in the US in millions of miles (nearest integer).", "4", 0.9),
        e("e08", "Estimate the number of golf balls that fit in a school bus (nearest 10000).", "500000", 0.9),
        e("e09", "Estimate the weight of all ants on Earth compared to all humans. Is the total ant biomass heavier? Answer the ratio (ant mass / human mass) to nearest 0.1.", "0.1", 0.9),
        e("e10", "Estimate the number of satellites currently orbiting Earth (nearest 1000).", "10000", 0.8),
        // Estimation: counterintuitive
        e("e11", "Estimate the average distance between stars in the Milky Way in light-years (nearest integer).", "5", 0.8),
        e("e12", "Estimate the number of grains of sand on all of Earth's beaches, as a power of 10 (e.g., answer '18' for 10^18).", "18", 0.9),
        // Reasoning: classic cognitive traps
        r("r01", "A bat and a ball cost $1.10 in total. The bat costs $1.00 more than the ball. How much does the ball cost in cents?", "5", 0.5),
        r("r02", "If it takes 5 machines 5 minutes to make 5 widgets, how many minutes would it take 100 machines to make 100 widgets?", "5", 0.5),
        r("r03", "In a lake, there is a patch of lily pads. Every day, the patch doubles in size. If it takes 48 days for the patch to cover the entire lake, how many days would it take for the patch to cover half the lake?", "47", 0.4),
        // Reasoning: formal logic
        r("r04", "If all roses are flowers and some flowers fade quickly, can we conclude that some roses fade quickly? Answer Yes or No.", "No", 0.7),
        r("r05", "All cats are animals. Some animals are dogs. Therefore, some cats are dogs. Is this argument valid? Answer Yes or No.", "No", 0.7),
        r("r06", "If no fish are birds, and some birds can swim, can we conclude that some things that swim are not fish? Answer Yes or No.", "Yes", 0.8),
        // Reasoning: math traps
        r("r07", "Is 91 prime? Answer Yes or No.", "No", 0.7),
        r("r08", "What is 17 * 23? Answer with just the number.", "391", 0.6),
        r("r09", "A train leaves at 2:00 PM going 60 mph. Another leaves the same station at 3:00 PM going 90 mph in the same direction. At what time does the second train catch the first? Answer in HH:MM PM format.", "5:00 PM", 0.7),
        // Reasoning: spatial / counterfactual
        r("r10", "I have a drawer with 10 black socks and 10 white socks. It's dark and I can't see. What is the minimum number of socks I must pull out to guarantee a matching pair?", "3", 0.5),
        r("r11", "You are in a race and you pass the person in second place. What place are you in now?", "2", 0.5),
        r("r12", "A man is looking at a photograph. Someone asks 'Who is in the picture?' He replies: 'Brothers and sisters I have none, but that man's father is my father's son.' Who is in the picture?", "His son", 0.8),
        // Reasoning: multi-step
        r("r13", "You have 12 coins, one of which is counterfeit and either heavier or lighter than the rest. Using a balance scale exactly 3 times, can you always identify the counterfeit coin AND determine whether it is heavier or lighter? Answer Yes or No.", "Yes", 0.9),
        r("r14", "There are three boxes: one contains only apples, one contains only oranges, and one contains both. All labels are wrong. You can pick one fruit from one box. From which box should you pick to determine all labels? Answer: the box labeled 'Both', 'Apples', or 'Oranges'.", "Both", 0.8),
        r("r15", "If you have a 4-minute hourglass and a 7-minute hourglass, how do you measure exactly 9 minutes? Answer with the total time measured.", "9", 0.9),
    ]
}

/// One entry of a custom tasks file.
#[derive(Debug, Deserialize)]
struct TaskFileEntry {
    prompt: String,
    ground_truth: String,
    #[serde(default = "default_task_type")]
    task_type: TaskType,
    #[serde(default = "default_difficulty")]
    difficulty: f64,
    #[serde(default)]
    task_id: Option<String>,
}

fn default_task_type() -> TaskType {
    TaskType::Reasoning
}

fn default_difficulty() -> f64 {
    0.5
}

/// Load a custom task catalogue from a JSON file.
///
/// The file holds an array of objects with required `prompt` and
/// `ground_truth` fields and optional `task_type`, `difficulty`, and
/// `task_id`. Missing ids are assigned `custom_NNN`.
pub fn load_tasks(path: impl AsRef<Path>) -> Result<Vec<Task>, TaskBankError> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let entries: Vec<TaskFileEntry> = serde_json::from_str(&raw)?;

    if entries.is_empty() {
        return Err(TaskBankError::EmptyCatalogue);
    }

    let mut tasks = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let id = entry.task_id.unwrap_or_else(|| format!("custom_{:03}", i + 1));
        let task = Task::new(id, entry.task_type, entry.prompt, entry.ground_truth, entry.difficulty);
        if !(0.0..=1.0).contains(&task.difficulty) {
            return Err(TaskBankError::InvalidDifficulty { id: task.id, value: task.difficulty });
        }
        tasks.push(task);
    }

    if tasks.len() < 10 {
        warn!(count = tasks.len(), "small task catalogue; evolution needs 15-20 tasks to be meaningful");
    }
    info!(count = tasks.len(), path = %path.as_ref().display(), "loaded custom task catalogue");
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalogue_shape() {
        let tasks = builtin_catalogue();
        assert_eq!(tasks.len(), 42);
        let count = |ty| tasks.iter().filter(|t| t.task_type == ty).count();
        assert_eq!(count(TaskType::Trivia), 15);
        assert_eq!(count(TaskType::Estimation), 12);
        assert_eq!(count(TaskType::Reasoning), 15);
    }

    #[test]
    fn test_builtin_difficulties_in_range() {
        for task in builtin_catalogue() {
            assert!((0.0..=1.0).contains(&task.difficulty), "{}", task.id);
        }
    }

    #[test]
    fn test_load_tasks_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"prompt": "What is 2+2?", "ground_truth": "4"}},
               {{"prompt": "Capital of France?", "ground_truth": "Paris", "task_type": "trivia", "difficulty": 0.2, "task_id": "q2"}}]"#
        )
        .unwrap();

        let tasks = load_tasks(file.path()).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id.as_str(), "custom_001");
        assert_eq!(tasks[0].task_type, TaskType::Reasoning);
        assert_eq!(tasks[0].difficulty, 0.5);
        assert_eq!(tasks[1].id.as_str(), "q2");
        assert_eq!(tasks[1].task_type, TaskType::Trivia);
    }

    #[test]
    fn test_load_tasks_rejects_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"prompt": "no truth here"}}]"#).unwrap();
        assert!(matches!(load_tasks(file.path()), Err(TaskBankError::Json(_))));
    }

    #[test]
    fn test_load_tasks_rejects_bad_difficulty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"prompt": "p", "ground_truth": "g", "difficulty": 1.5}}]"#).unwrap();
        assert!(matches!(load_tasks(file.path()), Err(TaskBankError::InvalidDifficulty { .. })));
    }

    #[test]
    fn test_load_tasks_rejects_empty_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        assert!(matches!(load_tasks(file.path()), Err(TaskBankError::EmptyCatalogue)));
    }
}
