//! SpiderMonkey shell integration.
//!
//! Scripts are never executed. The shell is asked to run `Reflect.parse`
//! over the source and print the resulting Parser API tree as JSON on
//! stdout; a syntax error is caught inside the shell and printed as an
//! error object so it can be told apart from a broken installation.

use std::io::Read;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use crate::config::ValidatorConfig;
use crate::scripts::ParseFailure;
use crate::scripts::ScriptParser;

/// Interval between liveness checks on the shell process.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// External parsing oracle backed by a SpiderMonkey `js` shell.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use xpivet_core::scripts::SpiderMonkeyOracle;
///
/// let oracle = SpiderMonkeyOracle::new("js", Duration::from_secs(5));
/// assert_eq!(oracle.shell().to_str(), Some("js"));
/// ```
#[derive(Debug, Clone)]
pub struct SpiderMonkeyOracle {
    shell: PathBuf,
    timeout: Duration,
}

impl SpiderMonkeyOracle {
    /// Creates an oracle using the given shell binary and wall-clock budget.
    #[must_use]
    pub fn new(shell: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            shell: shell.into(),
            timeout,
        }
    }

    /// Creates an oracle from validator configuration.
    #[must_use]
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new(config.js_shell.clone(), config.oracle_timeout)
    }

    /// The shell binary this oracle invokes.
    #[must_use]
    pub fn shell(&self) -> &std::path::Path {
        &self.shell
    }

    fn run_shell(&self, program: &str) -> Result<String, ParseFailure> {
        let mut child = Command::new(&self.shell)
            .arg("-e")
            .arg(program)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ParseFailure::Launch(format!("failed to start shell: {e}")))?;

        let Some(mut stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ParseFailure::Launch(
                "shell stdout was not captured".to_string(),
            ));
        };

        // Drain stdout off-thread so a large tree cannot fill the pipe
        // and deadlock against the liveness poll below.
        let reader = thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = stdout.read_to_end(&mut buffer);
            buffer
        });

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        let _ = reader.join();
                        return Err(ParseFailure::Timeout);
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = reader.join();
                    return Err(ParseFailure::Launch(format!(
                        "failed to poll shell: {e}"
                    )));
                }
            }
        }

        let output = reader.join().unwrap_or_default();
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

impl ScriptParser for SpiderMonkeyOracle {
    fn parse(&self, source: &str) -> Result<serde_json::Value, ParseFailure> {
        let output = self.run_shell(&oracle_program(source))?;

        // The shell may print banners or warnings before the tree.
        let Some(start) = output.find('{') else {
            return Err(ParseFailure::Launch(
                "shell produced no output".to_string(),
            ));
        };
        let value: serde_json::Value = serde_json::from_str(&output[start..])
            .map_err(|e| ParseFailure::Launch(format!("unreadable shell output: {e}")))?;

        if value.get("error").and_then(serde_json::Value::as_bool) == Some(true) {
            let message = value
                .get("error_message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown syntax error");
            return Err(ParseFailure::Syntax(message.to_string()));
        }
        if value.get("type").and_then(serde_json::Value::as_str) == Some("Program") {
            return Ok(value);
        }
        Err(ParseFailure::Launch(
            "shell output was not a syntax tree".to_string(),
        ))
    }
}

/// Builds the one-line program handed to the shell.
///
/// The source is embedded as a JSON string literal, which is also a
/// valid JavaScript string literal once U+2028 and U+2029 are escaped;
/// those two are line terminators in source text.
fn oracle_program(source: &str) -> String {
    let literal = serde_json::Value::String(source.to_string())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029");
    format!(
        "try{{print(JSON.stringify(Reflect.parse({literal},{{loc:true}})));}}\
         catch(e){{print(JSON.stringify({{error:true,error_message:String(e.message||e)}}));}}"
    )
}
