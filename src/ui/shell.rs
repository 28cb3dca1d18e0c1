use anyhow::Result;
use crossterm::style::{Color, Stylize};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::markdown::MarkdownRenderer;
use super::spinner::{Spinner, SpinnerSink};
use crate::agents::crew::Crew;
use crate::config::UIConfig;

pub const PROMPT: &str = "Assign Task:";
const SEPARATOR_WIDTH: usize = 50;
const WORKING_MESSAGE: &str =
    "Agents are working (Architecture Design -> Security Testing -> Documentation)...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    AwaitingInput,
    ShuttingDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Task(String),
}

impl Command {
    /// Only a bare `q` (any case) quits; everything else, the empty line
    /// included, is a task.
    pub fn parse(line: &str) -> Self {
        if line.to_lowercase() == "q" {
            Command::Quit
        } else {
            Command::Task(line.to_string())
        }
    }
}

/// Line-oriented front end: read a task, run the crew, print the document.
pub struct Shell<R, W> {
    crew: Crew,
    input: R,
    output: W,
    renderer: MarkdownRenderer,
    color: bool,
    spinner: Option<SpinnerSink>,
    state: ShellState,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(crew: Crew, input: R, output: W, ui: &UIConfig) -> Self {
        Self {
            crew,
            input,
            output,
            renderer: MarkdownRenderer::new(ui.color),
            color: ui.color,
            spinner: ui.spinner.then(SpinnerSink::terminal).flatten(),
            state: ShellState::AwaitingInput,
        }
    }

    /// Draw the busy indicator on `sink` instead of the terminal
    pub fn with_spinner(mut self, sink: SpinnerSink) -> Self {
        self.spinner = Some(sink);
        self
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub async fn run(&mut self) -> Result<()> {
        self.banner()?;
        while self.state == ShellState::AwaitingInput {
            self.step().await?;
        }
        Ok(())
    }

    /// One prompt/response cycle
    pub async fn step(&mut self) -> Result<ShellState> {
        let command = match self.read_line().await? {
            Some(line) => Command::parse(&line),
            None => {
                tracing::debug!("stdin closed");
                Command::Quit
            }
        };

        match command {
            Command::Quit => {
                self.say("System Shutting Down...", Color::Red)?;
                self.state = ShellState::ShuttingDown;
            }
            Command::Task(task) => self.dispatch(&task).await?,
        }
        Ok(self.state)
    }

    async fn dispatch(&mut self, task: &str) -> Result<()> {
        let spinner = match &self.spinner {
            Some(sink) => Spinner::start(sink.clone(), WORKING_MESSAGE),
            None => Spinner::disabled(),
        };
        let result = self.crew.process_request(task).await;
        spinner.stop().await;
        let document = result?;

        writeln!(self.output)?;
        self.say("Final Documentation and Code:", Color::Green)?;
        write!(self.output, "{}", self.renderer.render(&document))?;
        self.separator()?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        if self.color {
            write!(self.output, "{} ", PROMPT.with(Color::Cyan).bold())?;
        } else {
            write!(self.output, "{PROMPT} ")?;
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.strip_suffix('\n').unwrap_or(&line);
        let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
        Ok(Some(trimmed.to_string()))
    }

    fn banner(&mut self) -> Result<()> {
        self.say("🤖 3-Agent Senior Software Team Active!", Color::Green)?;
        if self.color {
            writeln!(self.output, "   - To exit: {}\n", "'q'".with(Color::Red).bold())?;
        } else {
            writeln!(self.output, "   - To exit: 'q'\n")?;
        }
        self.separator()
    }

    fn separator(&mut self) -> Result<()> {
        writeln!(self.output, "{}", "-".repeat(SEPARATOR_WIDTH))?;
        Ok(())
    }

    fn say(&mut self, text: &str, color: Color) -> Result<()> {
        if self.color {
            writeln!(self.output, "{}", text.with(color).bold())?;
        } else {
            writeln!(self.output, "{text}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::profiles::CrewProfiles;
    use crate::config::{AgentSettings, CrewConfig};
    use crate::providers::scripted::ScriptedProvider;
    use crate::providers::ProviderError;
    use crate::ui::spinner::tests::Capture;
    use std::sync::Arc;

    const DOC: &str = "## 🛠️ Purpose of the Function\nReverses a string.\n\n\
        ## ⚡ Performance Analysis\n- **Time:** O(n)\n- **Space:** O(n)\n\n\
        ## 🛡️ Security and Test Status\nValidates input.\n\n\
        ## 💻 Final Code\n```python\ndef reverse(s: str) -> str:\n    return s[::-1]\n```";

    fn plain_ui() -> UIConfig {
        UIConfig {
            spinner: false,
            color: false,
        }
    }

    fn shell<'a>(input: &'a [u8], provider: Arc<ScriptedProvider>) -> Shell<&'a [u8], Vec<u8>> {
        let endpoint = Arc::new(CrewConfig::default().model_endpoint().unwrap());
        let profiles = CrewProfiles::standard(endpoint, &AgentSettings::default()).unwrap();
        let crew = Crew::new(profiles, provider).unwrap();
        Shell::new(crew, input, Vec::new(), &plain_ui())
    }

    fn output_of(shell: Shell<&[u8], Vec<u8>>) -> String {
        String::from_utf8(shell.into_output()).unwrap()
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("q"), Command::Quit);
        assert_eq!(Command::parse("Q"), Command::Quit);
        assert_eq!(Command::parse(" q"), Command::Task(" q".to_string()));
        assert_eq!(Command::parse("quit"), Command::Task("quit".to_string()));
        assert_eq!(Command::parse(""), Command::Task(String::new()));
    }

    #[tokio::test]
    async fn test_quit_never_calls_pipeline() {
        for input in [&b"q\n"[..], &b"Q\r\n"[..]] {
            let provider = Arc::new(ScriptedProvider::new());
            let mut shell = shell(input, provider.clone());

            shell.run().await.unwrap();

            assert_eq!(shell.state(), ShellState::ShuttingDown);
            assert!(provider.requests().is_empty());
            let output = output_of(shell);
            assert!(output.contains("3-Agent Senior Software Team Active!"));
            assert!(output.contains("Assign Task: "));
            assert!(output.ends_with("System Shutting Down...\n"));
        }
    }

    #[tokio::test]
    async fn test_task_then_quit() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_text("code")
                .with_text("safe")
                .with_text(DOC),
        );
        let mut shell = shell(
            b"write a function that reverses a string\nq\n",
            provider.clone(),
        );

        shell.run().await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 3);
        let coder_prompt = &requests[0].messages[1].content;
        assert!(coder_prompt.contains("write a function that reverses a string"));

        let output = output_of(shell);
        assert!(output.contains("Final Documentation and Code:\n"));
        assert!(output.contains("Purpose of the Function"));
        assert!(output.contains("│ def reverse(s: str) -> str:"));
        assert!(!output.contains("## "));
        assert_eq!(output.matches(PROMPT).count(), 2);
    }

    #[tokio::test]
    async fn test_end_of_input_shuts_down() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut shell = shell(b"", provider.clone());

        assert_eq!(shell.step().await.unwrap(), ShellState::ShuttingDown);
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_line_is_forwarded() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_text("a")
                .with_text("b")
                .with_text("c"),
        );
        let mut shell = shell(b"\n", provider.clone());

        assert_eq!(shell.step().await.unwrap(), ShellState::AwaitingInput);
        assert_eq!(provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_spinner_runs_while_crew_works() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_text("code")
                .with_text("safe")
                .with_text(DOC),
        );
        let capture = Capture::default();
        let mut shell =
            shell(b"reverse a string\n", provider).with_spinner(SpinnerSink::new(capture.clone()));

        shell.step().await.unwrap();

        let drawn = capture.text();
        assert!(drawn.contains(WORKING_MESSAGE));
        // Cleared before the document is printed
        assert!(drawn.ends_with("\u{1b}[?25h"));
        let output = output_of(shell);
        assert!(!output.contains(WORKING_MESSAGE));
        assert!(output.contains("Final Documentation and Code:"));
    }

    #[tokio::test]
    async fn test_pipeline_error_propagates() {
        let provider = Arc::new(ScriptedProvider::new().with_error(ProviderError::Api {
            status: 503,
            body: "loading model".into(),
        }));
        let mut shell = shell(b"sort numbers\nq\n", provider.clone());

        let err = shell.run().await.unwrap_err();
        assert!(err.to_string().contains("coder stage failed"));
        assert_eq!(shell.state(), ShellState::AwaitingInput);

        let output = output_of(shell);
        assert!(!output.contains("Final Documentation and Code:"));
        assert!(!output.contains("System Shutting Down..."));
    }
}
