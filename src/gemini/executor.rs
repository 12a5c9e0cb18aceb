//! Command executor: turns an [`InvocationRequest`] into one gemini run.
//!
//! - builds the argv for a new or resumed session
//! - materializes an optional system prompt into a scoped temp file
//! - runs the process through the injected [`ProcessRunner`]
//! - decodes the output and reconciles the session id

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use thiserror::Error;

use super::process::{GeminiCommand, Invocation, ProcessOutput, ProcessRunner};
use super::response::{parse_output, ParsedOutput};
use super::sessions::SessionDirectory;

/// Environment variable gemini reads its system prompt file path from.
pub const DEFAULT_SYSTEM_PROMPT_ENV: &str = "GEMINI_SYSTEM_MD";

/// Resume token meaning "most recently active session".
pub const DEFAULT_LATEST_TOKEN: &str = "latest";

/// File name of the system prompt inside its temporary directory.
pub const SYSTEM_PROMPT_FILE_NAME: &str = "system.md";

/// Which conversation a request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTarget {
    New,
    /// Continue a session by full or abbreviated id; `None` means latest.
    Resume(Option<String>),
}

/// One call into the gemini CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub prompt: String,
    pub target: SessionTarget,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub cwd: Option<PathBuf>,
}

impl InvocationRequest {
    pub fn new(prompt: impl Into<String>, target: SessionTarget) -> Self {
        Self {
            prompt: prompt.into(),
            target,
            model: None,
            system_prompt: None,
            cwd: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub fn with_cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }
}

/// Normalized outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub response_text: String,
    /// `None` when neither the tool nor the session listing named a session.
    pub session_id: Option<String>,
}

/// Failure to get a usable answer out of gemini.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare system prompt file: {0}")]
    SystemPrompt(#[source] io::Error),
    #[error("gemini reported an error: {message}")]
    Reported { message: String, stderr: String },
    #[error("gemini exited with {}", exit_status(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl ExecutionError {
    /// Captured stderr of the failed process, when there was any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            ExecutionError::Reported { stderr, .. } | ExecutionError::NonZeroExit { stderr, .. } => {
                let stderr = stderr.trim();
                (!stderr.is_empty()).then_some(stderr)
            }
            ExecutionError::Spawn { .. } | ExecutionError::SystemPrompt(_) => None,
        }
    }
}

/// A system prompt written to `<tmp>/gemini-mcp-XXXX/system.md`.
///
/// The directory is removed by [`SystemPromptFile::remove`] or on drop,
/// whichever comes first.
pub struct SystemPromptFile {
    dir: TempDir,
    path: PathBuf,
}

impl SystemPromptFile {
    pub async fn create(contents: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("gemini-mcp-").tempdir()?;
        let path = dir.path().join(SYSTEM_PROMPT_FILE_NAME);
        tokio::fs::write(&path, contents).await?;
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file and its directory. Errors are logged and dropped.
    pub fn remove(self) {
        let dir = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::debug!(dir = %dir.display(), error = %e, "failed to remove system prompt dir");
        }
    }
}

/// Static knobs for building invocations.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub command: GeminiCommand,
    /// Model used when a request does not name one.
    pub default_model: Option<String>,
    pub system_prompt_env: String,
    pub latest_token: String,
}

impl ExecutorSettings {
    pub fn new(command: GeminiCommand) -> Self {
        Self {
            command,
            default_model: None,
            system_prompt_env: DEFAULT_SYSTEM_PROMPT_ENV.to_string(),
            latest_token: DEFAULT_LATEST_TOKEN.to_string(),
        }
    }
}

/// Runs gemini for new and resumed conversations.
#[derive(Clone)]
pub struct Executor {
    runner: Arc<dyn ProcessRunner>,
    directory: SessionDirectory,
    settings: ExecutorSettings,
}

impl Executor {
    pub fn new(runner: Arc<dyn ProcessRunner>, settings: ExecutorSettings) -> Self {
        let directory = SessionDirectory::new(Arc::clone(&runner), settings.command.clone());
        Self {
            runner,
            directory,
            settings,
        }
    }

    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    pub async fn execute(
        &self,
        request: &InvocationRequest,
    ) -> Result<InvocationResult, ExecutionError> {
        match &request.target {
            SessionTarget::New => self.run_new(request).await,
            SessionTarget::Resume(hint) => self.run_resume(request, hint.as_deref()).await,
        }
    }

    /// Start a new session.
    ///
    /// When gemini does not report a session id, the newest entry of the
    /// session listing is taken instead.
    pub async fn run_new(
        &self,
        request: &InvocationRequest,
    ) -> Result<InvocationResult, ExecutionError> {
        let invocation = self.build_invocation(request, None);
        let parsed = self
            .run_invocation(invocation, request.system_prompt.as_deref())
            .await?;

        let session_id = match parsed.session_id {
            Some(id) => Some(id),
            None => {
                tracing::debug!("no session_id in output, falling back to session listing");
                self.directory.resolve_latest(request.cwd.as_deref()).await
            }
        };

        Ok(InvocationResult {
            response_text: parsed.response,
            session_id,
        })
    }

    /// Continue the session named by `hint`, or the latest one.
    ///
    /// The hint is passed to gemini verbatim. Only the session id gemini
    /// itself reports is returned; the listing is not consulted.
    pub async fn run_resume(
        &self,
        request: &InvocationRequest,
        hint: Option<&str>,
    ) -> Result<InvocationResult, ExecutionError> {
        let target = hint
            .filter(|h| !h.is_empty())
            .unwrap_or(self.settings.latest_token.as_str());
        let invocation = self.build_invocation(request, Some(target));
        let parsed = self
            .run_invocation(invocation, request.system_prompt.as_deref())
            .await?;

        Ok(InvocationResult {
            response_text: parsed.response,
            session_id: parsed.session_id,
        })
    }

    /// `<command> <prompt> --output-format json [-m <model>] [-r <target>]`
    pub fn build_invocation(&self, request: &InvocationRequest, resume: Option<&str>) -> Invocation {
        let mut invocation = self
            .settings
            .command
            .invocation()
            .arg(request.prompt.as_str())
            .arg("--output-format")
            .arg("json");

        let model = request
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or(self.settings.default_model.as_deref());
        if let Some(model) = model {
            invocation = invocation.arg("-m").arg(model);
        }
        if let Some(target) = resume {
            invocation = invocation.arg("-r").arg(target);
        }

        invocation.current_dir(request.cwd.clone())
    }

    async fn run_invocation(
        &self,
        invocation: Invocation,
        system_prompt: Option<&str>,
    ) -> Result<ParsedOutput, ExecutionError> {
        let system_file = match system_prompt {
            Some(text) => Some(
                SystemPromptFile::create(text)
                    .await
                    .map_err(ExecutionError::SystemPrompt)?,
            ),
            None => None,
        };

        let invocation = match &system_file {
            Some(file) => invocation.env(
                self.settings.system_prompt_env.as_str(),
                file.path().to_string_lossy(),
            ),
            None => invocation,
        };

        let result = self.runner.run(&invocation).await;

        if let Some(file) = system_file {
            file.remove();
        }

        let output = result.map_err(|source| ExecutionError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        interpret(output)
    }
}

/// A non-zero exit is only a failure when stdout carries no response.
fn interpret(output: ProcessOutput) -> Result<ParsedOutput, ExecutionError> {
    let parsed = parse_output(&output.stdout);
    if output.success || parsed.has_response_field {
        if !output.stderr.trim().is_empty() {
            tracing::debug!(stderr = %output.stderr.trim(), "gemini wrote to stderr");
        }
        return Ok(parsed);
    }

    tracing::warn!(code = ?output.code, "gemini exited unsuccessfully");
    match parsed.error {
        Some(message) => Err(ExecutionError::Reported {
            message,
            stderr: output.stderr,
        }),
        None => Err(ExecutionError::NonZeroExit {
            code: output.code,
            stderr: output.stderr,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::sessions::LIST_SESSIONS_FLAG;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    const LISTING: &str = "  1. hello (..) [aaaa0001]\n  2. code (..) [bbbb0002]\n  3. test (..) [ffff0003]\n";

    /// What the runner saw for one call, including the system prompt file
    /// as it existed while the process "ran".
    #[derive(Debug, Clone)]
    struct Seen {
        invocation: Invocation,
        system_prompt: Option<(PathBuf, String)>,
    }

    /// Answers listing calls with `listing` and everything else with `reply`.
    struct ScriptedRunner {
        listing: String,
        reply: Box<dyn Fn() -> io::Result<ProcessOutput> + Send + Sync>,
        seen: Mutex<Vec<Seen>>,
    }

    impl ScriptedRunner {
        fn new(
            listing: &str,
            reply: impl Fn() -> io::Result<ProcessOutput> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                listing: listing.to_string(),
                reply: Box::new(reply),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn stdout(listing: &str, stdout: &'static str) -> Arc<Self> {
            Self::new(listing, move || Ok(success(stdout)))
        }

        fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }

        fn listing_calls(&self) -> usize {
            self.seen()
                .iter()
                .filter(|s| s.invocation.args.iter().any(|a| a == LIST_SESSIONS_FLAG))
                .count()
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
            let system_prompt = invocation.env.get(DEFAULT_SYSTEM_PROMPT_ENV).map(|p| {
                let path = PathBuf::from(p);
                let contents = std::fs::read_to_string(&path).unwrap();
                (path, contents)
            });
            self.seen.lock().unwrap().push(Seen {
                invocation: invocation.clone(),
                system_prompt,
            });

            if invocation.args.iter().any(|a| a == LIST_SESSIONS_FLAG) {
                Ok(success(&self.listing))
            } else {
                (self.reply)()
            }
        }
    }

    fn success(stdout: &str) -> ProcessOutput {
        ProcessOutput {
            code: Some(0),
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn failure(code: i32, stdout: &str, stderr: &str) -> ProcessOutput {
        ProcessOutput {
            code: Some(code),
            success: false,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    fn executor(runner: Arc<ScriptedRunner>) -> Executor {
        Executor::new(runner, ExecutorSettings::new(GeminiCommand::parse("gemini").unwrap()))
    }

    #[tokio::test]
    async fn new_session_uses_reported_session_id() {
        let runner = ScriptedRunner::stdout(LISTING, r#"{"response":"Hi","session_id":"sid1"}"#);
        let result = executor(runner.clone())
            .execute(&InvocationRequest::new("hello", SessionTarget::New))
            .await
            .unwrap();

        assert_eq!(
            result,
            InvocationResult {
                response_text: "Hi".to_string(),
                session_id: Some("sid1".to_string()),
            }
        );
        assert_eq!(runner.listing_calls(), 0);
    }

    #[tokio::test]
    async fn new_session_falls_back_to_latest_listed() {
        let runner = ScriptedRunner::stdout(LISTING, r#"{"response":"Hi"}"#);
        let result = executor(runner.clone())
            .run_new(&InvocationRequest::new("hello", SessionTarget::New))
            .await
            .unwrap();

        assert_eq!(result.response_text, "Hi");
        assert_eq!(result.session_id.as_deref(), Some("ffff0003"));
        assert_eq!(runner.listing_calls(), 1);
    }

    #[tokio::test]
    async fn new_session_plain_text_output() {
        let runner = ScriptedRunner::stdout(LISTING, "plain answer");
        let result = executor(runner)
            .run_new(&InvocationRequest::new("hello", SessionTarget::New))
            .await
            .unwrap();

        assert_eq!(result.response_text, "plain answer");
        assert_eq!(result.session_id.as_deref(), Some("ffff0003"));
    }

    #[tokio::test]
    async fn new_session_without_any_sessions_has_no_id() {
        let runner = ScriptedRunner::stdout("No previous sessions found.\n", r#"{"response":"Hi"}"#);
        let result = executor(runner)
            .run_new(&InvocationRequest::new("hello", SessionTarget::New))
            .await
            .unwrap();
        assert_eq!(result.session_id, None);
    }

    #[tokio::test]
    async fn new_session_argv_shape() {
        let runner = ScriptedRunner::stdout(LISTING, r#"{"response":"ok","session_id":"s"}"#);
        let request = InvocationRequest::new("hello", SessionTarget::New)
            .with_model(Some("gemini-2.5-pro".to_string()))
            .with_cwd(Some(PathBuf::from("/work")));
        executor(runner.clone()).execute(&request).await.unwrap();

        let seen = runner.seen();
        assert_eq!(seen.len(), 1);
        let invocation = &seen[0].invocation;
        assert_eq!(invocation.program, "gemini");
        assert_eq!(
            invocation.args,
            ["hello", "--output-format", "json", "-m", "gemini-2.5-pro"]
        );
        assert_eq!(invocation.cwd.as_deref(), Some(Path::new("/work")));
        assert!(invocation.env.is_empty());
    }

    #[tokio::test]
    async fn fallback_listing_runs_in_request_cwd() {
        let runner = ScriptedRunner::stdout(LISTING, r#"{"response":"ok"}"#);
        let request =
            InvocationRequest::new("hello", SessionTarget::New).with_cwd(Some(PathBuf::from("/proj")));
        executor(runner.clone()).execute(&request).await.unwrap();

        let seen = runner.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].invocation.args, [LIST_SESSIONS_FLAG]);
        assert_eq!(seen[1].invocation.cwd.as_deref(), Some(Path::new("/proj")));
    }

    #[tokio::test]
    async fn default_model_applies_only_when_request_has_none() {
        let mut settings = ExecutorSettings::new(GeminiCommand::parse("gemini").unwrap());
        settings.default_model = Some("flash".to_string());
        let exec = Executor::new(ScriptedRunner::stdout(LISTING, "x"), settings);

        let plain = exec.build_invocation(&InvocationRequest::new("p", SessionTarget::New), None);
        assert_eq!(plain.args, ["p", "--output-format", "json", "-m", "flash"]);

        let explicit = exec.build_invocation(
            &InvocationRequest::new("p", SessionTarget::New).with_model(Some("pro".to_string())),
            None,
        );
        assert_eq!(explicit.args, ["p", "--output-format", "json", "-m", "pro"]);
    }

    #[tokio::test]
    async fn blank_request_model_is_ignored() {
        let exec = Executor::new(
            ScriptedRunner::stdout(LISTING, "x"),
            ExecutorSettings::new(GeminiCommand::parse("gemini").unwrap()),
        );
        let invocation = exec.build_invocation(
            &InvocationRequest::new("hi", SessionTarget::New).with_model(Some(String::new())),
            None,
        );
        assert_eq!(invocation.args, ["hi", "--output-format", "json"]);

        let mut settings = ExecutorSettings::new(GeminiCommand::parse("gemini").unwrap());
        settings.default_model = Some("flash".to_string());
        let exec = Executor::new(ScriptedRunner::stdout(LISTING, "x"), settings);
        let invocation = exec.build_invocation(
            &InvocationRequest::new("hi", SessionTarget::New).with_model(Some("  ".to_string())),
            None,
        );
        assert_eq!(invocation.args, ["hi", "--output-format", "json", "-m", "flash"]);
    }

    #[tokio::test]
    async fn base_args_precede_prompt() {
        let settings = ExecutorSettings::new(GeminiCommand::parse("npx -y @google/gemini-cli").unwrap());
        let exec = Executor::new(ScriptedRunner::stdout(LISTING, "x"), settings);
        let invocation = exec.build_invocation(&InvocationRequest::new("p", SessionTarget::New), Some("latest"));
        assert_eq!(invocation.program, "npx");
        assert_eq!(
            invocation.args,
            ["-y", "@google/gemini-cli", "p", "--output-format", "json", "-r", "latest"]
        );
    }

    #[tokio::test]
    async fn prompt_with_quotes_reaches_process_unchanged() {
        let prompt = "He said \"hi\" and 'bye'\\n\nsecond line $HOME `pwd`";
        let runner = ScriptedRunner::stdout(LISTING, r#"{"response":"ok","session_id":"s"}"#);
        executor(runner.clone())
            .run_new(&InvocationRequest::new(prompt, SessionTarget::New))
            .await
            .unwrap();

        let invocation = &runner.seen()[0].invocation;
        assert_eq!(invocation.args[0], prompt);
        let words = shlex::split(&invocation.to_shell_line()).unwrap();
        assert_eq!(words[1], prompt);
    }

    #[tokio::test]
    async fn resume_passes_hint_verbatim_without_fallback() {
        let runner = ScriptedRunner::stdout(LISTING, r#"{"response":"again"}"#);
        let request = InvocationRequest::new("more", SessionTarget::Resume(Some("bbbb".to_string())));
        let result = executor(runner.clone()).execute(&request).await.unwrap();

        assert_eq!(result.response_text, "again");
        assert_eq!(result.session_id, None);
        assert_eq!(runner.listing_calls(), 0);
        assert_eq!(
            runner.seen()[0].invocation.args,
            ["more", "--output-format", "json", "-r", "bbbb"]
        );
    }

    #[tokio::test]
    async fn resume_without_hint_targets_latest() {
        let runner = ScriptedRunner::stdout(LISTING, r#"{"response":"ok","session_id":"cafe"}"#);
        let result = executor(runner.clone())
            .execute(&InvocationRequest::new("more", SessionTarget::Resume(None)))
            .await
            .unwrap();

        assert_eq!(result.session_id.as_deref(), Some("cafe"));
        assert_eq!(&runner.seen()[0].invocation.args[3..], &["-r", "latest"]);
    }

    #[tokio::test]
    async fn resume_with_empty_hint_targets_latest() {
        let runner = ScriptedRunner::stdout(LISTING, r#"{"response":"ok"}"#);
        executor(runner.clone())
            .execute(&InvocationRequest::new("more", SessionTarget::Resume(Some(String::new()))))
            .await
            .unwrap();
        assert_eq!(&runner.seen()[0].invocation.args[3..], &["-r", "latest"]);
    }

    #[tokio::test]
    async fn custom_latest_token() {
        let mut settings = ExecutorSettings::new(GeminiCommand::parse("gemini").unwrap());
        settings.latest_token = "1".to_string();
        let runner = ScriptedRunner::stdout(LISTING, r#"{"response":"ok"}"#);
        Executor::new(runner.clone(), settings)
            .execute(&InvocationRequest::new("more", SessionTarget::Resume(None)))
            .await
            .unwrap();
        assert_eq!(&runner.seen()[0].invocation.args[3..], &["-r", "1"]);
    }

    #[tokio::test]
    async fn system_prompt_file_exists_during_run_and_is_removed_after() {
        let runner = ScriptedRunner::stdout(LISTING, r#"{"response":"ok","session_id":"s"}"#);
        let request = InvocationRequest::new("hello", SessionTarget::New)
            .with_system_prompt(Some("You are terse.\nAnswer in one line.".to_string()));
        executor(runner.clone()).execute(&request).await.unwrap();

        let seen = runner.seen();
        let (path, contents) = seen[0].system_prompt.clone().expect("system prompt env var set");
        assert_eq!(contents, "You are terse.\nAnswer in one line.");
        assert_eq!(path.file_name().unwrap(), SYSTEM_PROMPT_FILE_NAME);
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn system_prompt_file_removed_when_process_fails_to_start() {
        let runner = ScriptedRunner::new(LISTING, || {
            Err(io::Error::new(io::ErrorKind::NotFound, "No such file or directory"))
        });
        let request = InvocationRequest::new("hello", SessionTarget::New)
            .with_system_prompt(Some("sys".to_string()));
        let err = executor(runner.clone()).execute(&request).await.unwrap_err();

        assert!(matches!(err, ExecutionError::Spawn { .. }));
        assert!(err.to_string().contains("failed to run gemini"));
        let (path, _) = runner.seen()[0].system_prompt.clone().unwrap();
        assert!(!path.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn concurrent_system_prompt_files_do_not_collide() {
        let first = SystemPromptFile::create("one").await.unwrap();
        let second = SystemPromptFile::create("two").await.unwrap();
        assert_ne!(first.path(), second.path());
        assert_eq!(std::fs::read_to_string(first.path()).unwrap(), "one");
        assert_eq!(std::fs::read_to_string(second.path()).unwrap(), "two");

        let dir = first.path().parent().unwrap().to_path_buf();
        first.remove();
        assert!(!dir.exists());
        assert!(second.path().exists());
    }

    #[tokio::test]
    async fn custom_system_prompt_env_name() {
        let mut settings = ExecutorSettings::new(GeminiCommand::parse("gemini").unwrap());
        settings.system_prompt_env = "MY_SYSTEM_FILE".to_string();
        let runner = ScriptedRunner::stdout(LISTING, r#"{"response":"ok","session_id":"s"}"#);
        Executor::new(runner.clone(), settings)
            .execute(
                &InvocationRequest::new("hello", SessionTarget::New)
                    .with_system_prompt(Some("sys".to_string())),
            )
            .await
            .unwrap();

        let env = &runner.seen()[0].invocation.env;
        assert!(env.contains_key("MY_SYSTEM_FILE"));
        assert!(!env.contains_key(DEFAULT_SYSTEM_PROMPT_ENV));
    }

    #[tokio::test]
    async fn non_zero_exit_without_output_is_error_with_stderr() {
        let runner = ScriptedRunner::new(LISTING, || Ok(failure(1, "", "Error: not authenticated\n")));
        let err = executor(runner)
            .execute(&InvocationRequest::new("hello", SessionTarget::New))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::NonZeroExit { code: Some(1), .. }));
        assert_eq!(err.to_string(), "gemini exited with status 1");
        assert_eq!(err.diagnostics(), Some("Error: not authenticated"));
    }

    #[tokio::test]
    async fn non_zero_exit_with_structured_error() {
        let runner = ScriptedRunner::new(LISTING, || {
            Ok(failure(
                1,
                r#"{"error":{"type":"ApiError","message":"quota exceeded","code":429}}"#,
                "",
            ))
        });
        let err = executor(runner)
            .execute(&InvocationRequest::new("hello", SessionTarget::Resume(None)))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "gemini reported an error: quota exceeded");
        assert_eq!(err.diagnostics(), None);
    }

    #[tokio::test]
    async fn non_zero_exit_with_response_is_still_a_result() {
        let runner = ScriptedRunner::new(LISTING, || {
            Ok(failure(2, r#"{"response":"partial","session_id":"s9"}"#, "warning"))
        });
        let result = executor(runner)
            .execute(&InvocationRequest::new("hello", SessionTarget::New))
            .await
            .unwrap();
        assert_eq!(result.response_text, "partial");
        assert_eq!(result.session_id.as_deref(), Some("s9"));
    }

    #[test]
    fn signal_exit_message() {
        let err = ExecutionError::NonZeroExit {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "gemini exited with a signal");
    }
}
