//! Terminal stand-ins for the host chat log and query dialog.

use async_trait::async_trait;
use kitsheet_domain::{QueryDescriptor, QueryKind};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use crate::infrastructure::ports::{ChatMessage, ChatPort, PortError, QueryPromptPort};

type Writer = Box<dyn AsyncWrite + Unpin + Send>;
type Reader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Prints chat messages as JSON lines.
pub struct ConsoleChat {
    out: Mutex<Writer>,
}

impl ConsoleChat {
    pub fn stdout() -> Self {
        Self::new(Box::new(tokio::io::stdout()))
    }

    pub fn new(out: Writer) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

#[async_trait]
impl ChatPort for ConsoleChat {
    async fn create_message(&self, message: ChatMessage) -> Result<(), PortError> {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');

        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| PortError::host("create_message", e))?;
        out.flush()
            .await
            .map_err(|e| PortError::host("create_message", e))?;

        tracing::info!(
            feature = %message.speaker.feature,
            post = message.post,
            total = ?message.roll.as_ref().map(|r| r.total),
            "Chat message created"
        );
        Ok(())
    }
}

/// Asks each query on the terminal.
///
/// An empty line takes the default (input) or the first option (select).
/// Selects accept the option number, value or label. End of input cancels.
pub struct ConsolePrompt {
    io: Mutex<(Reader, Writer)>,
}

impl ConsolePrompt {
    pub fn stdio() -> Self {
        Self::new(
            Box::new(BufReader::new(tokio::io::stdin())),
            Box::new(tokio::io::stderr()),
        )
    }

    pub fn new(input: Reader, output: Writer) -> Self {
        Self {
            io: Mutex::new((input, output)),
        }
    }
}

fn io_error(e: std::io::Error) -> PortError {
    PortError::host("prompt", e)
}

fn question(query: &QueryDescriptor) -> String {
    match &query.kind {
        QueryKind::Input { default_value } if default_value.is_empty() => {
            format!("{}: ", query.label)
        }
        QueryKind::Input { default_value } => format!("{} [{}]: ", query.label, default_value),
        QueryKind::Select { options } => {
            let mut text = format!("{}\n", query.label);
            for (i, option) in options.iter().enumerate() {
                text.push_str(&format!("  {}) {}\n", i + 1, option.label));
            }
            text.push_str("> ");
            text
        }
    }
}

/// The submitted value for a line, or `None` when it names no option.
fn answer(query: &QueryDescriptor, line: &str) -> Option<String> {
    let line = line.trim();
    match &query.kind {
        QueryKind::Input { default_value } if line.is_empty() => Some(default_value.clone()),
        QueryKind::Input { .. } => Some(line.to_string()),
        QueryKind::Select { options } if options.is_empty() => Some(line.to_string()),
        QueryKind::Select { options } => {
            if line.is_empty() {
                return options.first().map(|o| o.value.clone());
            }
            // Exact value or label wins over a 1-based index
            let named = options
                .iter()
                .find(|o| o.value == line || o.label.eq_ignore_ascii_case(line));
            if let Some(option) = named {
                return Some(option.value.clone());
            }
            line.parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i))
                .map(|o| o.value.clone())
        }
    }
}

#[async_trait]
impl QueryPromptPort for ConsolePrompt {
    async fn prompt(
        &self,
        title: &str,
        queries: &[QueryDescriptor],
    ) -> Result<Option<Vec<String>>, PortError> {
        let mut guard = self.io.lock().await;
        let (input, output) = &mut *guard;
        output
            .write_all(format!("{}\n", title).as_bytes())
            .await
            .map_err(io_error)?;

        let mut answers = Vec::with_capacity(queries.len());
        for query in queries {
            loop {
                output
                    .write_all(question(query).as_bytes())
                    .await
                    .map_err(io_error)?;
                output.flush().await.map_err(io_error)?;

                let mut line = String::new();
                if input.read_line(&mut line).await.map_err(io_error)? == 0 {
                    tracing::debug!(title = %title, "Query dialog closed");
                    return Ok(None);
                }
                match answer(query, &line) {
                    Some(value) => {
                        answers.push(value);
                        break;
                    }
                    None => {
                        output
                            .write_all(b"Not an option.\n")
                            .await
                            .map_err(io_error)?;
                    }
                }
            }
        }
        Ok(Some(answers))
    }
}
