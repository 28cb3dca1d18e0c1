use super::{AgentProfile, Stage, StageTask};
use crate::config::{AgentSettings, ConfigError, ModelEndpoint};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::sync::Arc;

/// Section titles the documenter must produce, in template order.
pub const DOC_SECTIONS: [&str; 4] = [
    "Purpose of the Function",
    "Performance Analysis",
    "Security and Test Status",
    "Final Code",
];

const DOC_TEMPLATE: &str = "## 🛠️ Purpose of the Function\n\
(1-2 clear sentences explaining the purpose)\n\n\
## ⚡ Performance Analysis\n\
- **Time:** O(...)\n\
- **Space:** O(...)\n\n\
## 🛡️ Security and Test Status\n\
(A short summary of the try-except or edge case protections added by the tester)\n\n\
## 💻 Final Code\n\
```python\n[CODE HERE]\n```";

const CODER_ROLE: &str = "Senior Python Architect and Algorithm Expert";
const CODER_GOAL: &str = "Write industry-standard code that solves the user problem with the \
    lowest Time and Space Complexity.";
const CODER_BACKSTORY: &str = "You are a top-tier software architect. Your core principles are \
    Clean Code and SOLID rules. You ABSOLUTELY follow these rules:\n\
    1. You always add 'Type Hinting' to the code (e.g., def func(data: list) -> dict:).\n\
    2. When designing algorithms, you consider optimizations like Dynamic Programming or \
    memoization.\n\
    3. You never use conversational phrases like 'Here is your code' or 'I understand'. \
    You focus directly on the solution.\n\
    4. You explicitly declare required libraries (imports) at the very top of the code.";

const TESTER_ROLE: &str = "Senior QA and Defensive Programming Expert";
const TESTER_GOAL: &str = "Take the developer's code, ruthlessly review it, and add armor \
    (try-except, type checking) to prevent crashes.";
const TESTER_BACKSTORY: &str = "You are a highly meticulous and 'paranoid' test engineer sworn \
    to prevent systems from crashing. When reviewing the code from the developer, you ABSOLUTELY \
    fix the following edge cases:\n\
    1. 'Timeout' and 'Connection Error' possibilities in scraping or network operations.\n\
    2. The possibility of empty lists ([]), None, or invalid data types being passed to \
    functions.\n\
    3. Adding logging mechanisms or descriptive error messages (raise ValueError) to the code.\n\
    You wrap the developer's code with safety blocks without breaking its core logic.";

const DOCUMENTER_ROLE: &str = "Technical Documentation Robot";
const DOCUMENTER_GOAL: &str = "Produce a professional Markdown document for the tested final \
    code, adhering strictly to a rigid template.";
const DOCUMENTER_RULES: &str = "You are a documentation robot with zero creativity, 100% \
    obedient to the rules. You take the safe code from the tester agent and report it WITHOUT \
    EVER DEVIATING from the template below:\n\
    RULE 1: Never repeat the same word or sentence twice.\n\
    RULE 2: Your output must strictly be in this Markdown template:\n";

/// The three agents of the crew, one per stage.
#[derive(Debug, Clone)]
pub struct CrewProfiles {
    pub coder: AgentProfile,
    pub tester: AgentProfile,
    pub documenter: AgentProfile,
}

impl CrewProfiles {
    pub fn standard(
        endpoint: Arc<ModelEndpoint>,
        settings: &AgentSettings,
    ) -> Result<Self, ConfigError> {
        if settings.max_iter == 0 {
            return Err(ConfigError::ZeroMaxIter);
        }

        let profile = |stage, role: &str, goal: &str, backstory: String| AgentProfile {
            stage,
            role: role.to_string(),
            goal: goal.to_string(),
            backstory,
            allow_delegation: false,
            max_iter: settings.max_iter,
            verbose: settings.verbose,
            endpoint: Arc::clone(&endpoint),
        };

        Ok(Self {
            coder: profile(
                Stage::Code,
                CODER_ROLE,
                CODER_GOAL,
                CODER_BACKSTORY.to_string(),
            ),
            tester: profile(
                Stage::Test,
                TESTER_ROLE,
                TESTER_GOAL,
                TESTER_BACKSTORY.to_string(),
            ),
            documenter: profile(
                Stage::Document,
                DOCUMENTER_ROLE,
                DOCUMENTER_GOAL,
                format!("{DOCUMENTER_RULES}{DOC_TEMPLATE}"),
            ),
        })
    }

    pub fn get(&self, stage: Stage) -> &AgentProfile {
        match stage {
            Stage::Code => &self.coder,
            Stage::Test => &self.tester,
            Stage::Document => &self.documenter,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentProfile> {
        Stage::ORDER.into_iter().map(move |stage| self.get(stage))
    }
}

/// Build the three tasks for one request. Only the coder task sees the request.
pub fn tasks_for(request: &str) -> [StageTask; 3] {
    [
        StageTask {
            stage: Stage::Code,
            description: format!("Write optimized code fulfilling this user request: '{request}'"),
            expected_output: "An optimized and clean code block using Type Hinting.".to_string(),
        },
        StageTask {
            stage: Stage::Test,
            description: "Take the developer's code. Add try-except blocks and error checks, \
                          considering potential network errors, empty data, and type mismatches."
                .to_string(),
            expected_output: "A safe, final code block protected against edge cases.".to_string(),
        },
        StageTask {
            stage: Stage::Document,
            description: "Take the safe code from the tester agent and exactly fill out the \
                          provided Markdown template. Never repeat yourself and do not deviate \
                          from the template."
                .to_string(),
            expected_output: "A repetition-free Markdown document that perfectly matches the \
                              specified template."
                .to_string(),
        },
    ]
}

/// Template sections with no matching markdown heading in `document`.
pub fn missing_sections(document: &str) -> Vec<&'static str> {
    let headings = heading_texts(document);

    DOC_SECTIONS
        .iter()
        .copied()
        .filter(|section| {
            let section = section.to_lowercase();
            !headings.iter().any(|h| h.contains(&section))
        })
        .collect()
}

/// Lowercased text of every ATX or setext heading. Code blocks never
/// contribute, so a `# comment` in a Python fence is not a heading.
fn heading_texts(document: &str) -> Vec<String> {
    let mut headings = Vec::new();
    let mut current: Option<String> = None;

    for event in Parser::new(document) {
        match event {
            Event::Start(Tag::Heading { .. }) => current = Some(String::new()),
            Event::End(TagEnd::Heading(_)) => {
                if let Some(text) = current.take() {
                    headings.push(text.to_lowercase());
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.push_str(&text);
                }
            }
            _ => {}
        }
    }
    headings
}
