//! Console devices for the emulator.
//!
//! [`ConsoleDisplay`] prints the virtual LCD after every write.
//! [`ConsoleInput`] wraps the mock keypad so the main loop can tell when
//! stdin has been fully consumed. [`route_stdin`] feeds both mock devices
//! from stdin lines, one line at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use keytag_core::{TagId, TagPayload};
use keytag_hardware::mock::{MockInput, MockInputHandle, MockTagReaderHandle};
use keytag_hardware::{DisplayDevice, InputDevice};
use keytag_terminal::VirtualDisplay;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// Prefix of a stdin line that presents a tag.
const TAG_PREFIX: &str = "tag";

/// Virtual LCD rendered to stdout.
#[derive(Debug)]
pub struct ConsoleDisplay {
    lcd: VirtualDisplay,
}

impl ConsoleDisplay {
    pub fn new(lcd: VirtualDisplay) -> Self {
        Self { lcd }
    }
}

impl DisplayDevice for ConsoleDisplay {
    async fn clear(&mut self) -> keytag_hardware::Result<()> {
        self.lcd.clear().await
    }

    async fn write(&mut self, text: &str) -> keytag_hardware::Result<()> {
        self.lcd.write(text).await?;
        println!("{}", self.lcd.render());
        Ok(())
    }

    async fn set_cursor(&mut self, row: usize, col: usize) -> keytag_hardware::Result<()> {
        self.lcd.set_cursor(row, col).await
    }
}

/// Keypad input that records when its source is exhausted.
#[derive(Debug)]
pub struct ConsoleInput {
    inner: MockInput,
    closed: Arc<AtomicBool>,
}

impl ConsoleInput {
    /// Wrap `inner`. The returned flag is set once every queued line has
    /// been read and the source is closed.
    pub fn new(inner: MockInput) -> (Self, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                inner,
                closed: closed.clone(),
            },
            closed,
        )
    }
}

impl InputDevice for ConsoleInput {
    async fn read_line(&mut self) -> keytag_hardware::Result<String> {
        self.inner.read_line().await.inspect_err(|e| {
            if e.is_disconnected() {
                self.closed.store(true, Ordering::SeqCst);
            }
        })
    }
}

/// Meaning of one stdin line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    /// `tag <id>`: present a tag to the reader
    Tag(TagPayload),
    /// `tag` followed by something that is not a tag id
    BadTag(String),
    /// Anything else: keypad input
    Input(String),
}

impl ConsoleLine {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();

        let Some((word, rest)) = trimmed.split_once(char::is_whitespace) else {
            return ConsoleLine::Input(line.to_string());
        };

        if !word.eq_ignore_ascii_case(TAG_PREFIX) {
            return ConsoleLine::Input(line.to_string());
        }

        match TagId::parse(rest).map(|tag_id| tag_id.to_payload()) {
            Ok(Some(payload)) => ConsoleLine::Tag(payload),
            Ok(None) | Err(_) => ConsoleLine::BadTag(rest.trim().to_string()),
        }
    }
}

/// Forward lines from `source` to the mock devices until end of input.
///
/// Each line is handed over only after the previous one has been read, so
/// the controller sees tags and keypad lines in script order.
///
/// # Errors
///
/// Returns an error if `source` cannot be read or a device has been
/// dropped.
pub async fn route_lines<B>(
    source: B,
    reader: MockTagReaderHandle,
    input: MockInputHandle,
) -> keytag_hardware::Result<()>
where
    B: AsyncBufRead + Unpin,
{
    let mut lines = source.lines();

    while let Some(line) = lines.next_line().await? {
        match ConsoleLine::parse(&line) {
            ConsoleLine::Tag(payload) => {
                debug!(tag_id = %TagId::from_payload(payload), "Presenting tag");
                reader.present_tag(payload).await?;
                reader.wait_until_read().await?;
            }
            ConsoleLine::BadTag(text) => {
                warn!(input = %text, "Ignoring tag line, expected 8 hex digits");
            }
            ConsoleLine::Input(text) => {
                input.send_line(text).await?;
                input.wait_until_read().await?;
            }
        }
    }

    debug!("End of input");
    Ok(())
}

/// Forward stdin lines to the mock devices until end of input.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or a device has been dropped.
pub async fn route_stdin(
    reader: MockTagReaderHandle,
    input: MockInputHandle,
) -> keytag_hardware::Result<()> {
    route_lines(tokio::io::BufReader::new(tokio::io::stdin()), reader, input).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use keytag_hardware::TagReader;
    use keytag_hardware::mock::MockTagReader;
    use keytag_storage::{MemoryStorage, UserRegistry};
    use keytag_terminal::{StateController, TerminalConfig};
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case("tag 04A1B2C3", ConsoleLine::Tag([0x04, 0xA1, 0xB2, 0xC3]))]
    #[case("  TAG   04a1b2c3  ", ConsoleLine::Tag([0x04, 0xA1, 0xB2, 0xC3]))]
    #[case("tag 04A1", ConsoleLine::BadTag("04A1".into()))]
    #[case("enroll", ConsoleLine::Input("enroll".into()))]
    #[case("Alice Smith", ConsoleLine::Input("Alice Smith".into()))]
    #[case("tag", ConsoleLine::Input("tag".into()))]
    #[case("", ConsoleLine::Input(String::new()))]
    fn test_console_line_parse(#[case] line: &str, #[case] expected: ConsoleLine) {
        assert_eq!(ConsoleLine::parse(line), expected);
    }

    #[tokio::test]
    async fn test_route_lines_splits_tags_and_input() {
        let (mut reader, reader_handle) = MockTagReader::new();
        let (input, input_handle) = MockInput::new();
        let (mut input, closed) = ConsoleInput::new(input);
        let script: &'static [u8] = b"enroll\nAlice\ntag 04A1B2C3\n";

        let router = tokio::spawn(route_lines(script, reader_handle, input_handle));

        assert_eq!(input.read_line().await.unwrap(), "enroll");
        assert_eq!(input.read_line().await.unwrap(), "Alice");
        assert_eq!(reader.read().await.unwrap(), [0x04, 0xA1, 0xB2, 0xC3]);
        router.await.unwrap().unwrap();

        // Every handle is gone, so the input reports end of stream
        assert!(!closed.load(Ordering::SeqCst));
        assert!(input.read_line().await.is_err());
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_route_lines_holds_input_until_tag_is_read() {
        let (mut reader, reader_handle) = MockTagReader::new();
        let (mut input, input_handle) = MockInput::new();
        let script: &'static [u8] = b"tag 04A1B2C3\nenroll\n";

        let router = tokio::spawn(route_lines(script, reader_handle, input_handle));

        let early = tokio::time::timeout(Duration::from_secs(1), input.read_line()).await;
        assert!(early.is_err());

        assert_eq!(reader.read().await.unwrap(), [0x04, 0xA1, 0xB2, 0xC3]);
        assert_eq!(input.read_line().await.unwrap(), "enroll");
        router.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_script_runs_in_order() {
        let config = TerminalConfig::default();
        let registry = UserRegistry::open(MemoryStorage::new(), &config.registry_path).unwrap();
        let (reader, reader_handle) = MockTagReader::new();
        let (input, input_handle) = MockInput::new();
        let (input, closed) = ConsoleInput::new(input);
        let mut controller =
            StateController::new(VirtualDisplay::default(), reader, input, registry, config);

        let _reader_keepalive = reader_handle.clone();
        let script: &'static [u8] =
            b"tag 04A1B2C3\nenroll\nAlice\ntag 04D4E5F6\ntag 04D4E5F6\n";
        let router = tokio::spawn(route_lines(script, reader_handle, input_handle));

        // Lookup (2 steps), enroll prompt, name, tag, then lookup again
        for _ in 0..7 {
            controller.step().await;
        }

        let alice = TagId::parse("04D4E5F6").unwrap();
        let earlier = TagId::parse("04A1B2C3").unwrap();
        assert_eq!(controller.registry().len(), 1);
        assert_eq!(controller.registry().find(&alice).unwrap().name, "Alice");
        assert!(controller.registry().find(&earlier).is_none());
        assert_eq!(controller.display().text(0), "Access granted");
        assert_eq!(controller.display().text(1), "Alice");

        router.await.unwrap().unwrap();
        assert!(!closed.load(Ordering::SeqCst));

        controller.step().await;
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_console_display_keeps_lcd_contents() {
        let mut display = ConsoleDisplay::new(VirtualDisplay::new(2, 16));

        display.clear().await.unwrap();
        display.write("Waiting for tag").await.unwrap();

        assert_eq!(display.lcd.text(0), "Waiting for tag");
    }
}
