//! Virtual character LCD.
//!
//! [`VirtualDisplay`] emulates an HD44780-style character module: a fixed
//! grid of rows x columns, a cursor, and text that is written at the cursor
//! and clipped at the end of the row. It implements [`DisplayDevice`], so the
//! controller can drive it exactly like the physical display, and tests or
//! the console emulator can read back what is shown.
//!
//! # Character Encoding - ASCII Only
//!
//! The LCD character ROM only covers printable ASCII. Control characters are
//! dropped and any other character is shown as `?`.
//!
//! # Examples
//!
//! ```
//! use keytag_hardware::DisplayDevice;
//! use keytag_terminal::VirtualDisplay;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> keytag_hardware::Result<()> {
//! let mut display = VirtualDisplay::new(2, 16);
//!
//! display.clear().await?;
//! display.write("Waiting for tag").await?;
//! display.set_cursor(1, 0).await?;
//! display.write("04A1B2C3").await?;
//!
//! assert_eq!(display.line(0).unwrap(), "Waiting for tag ");
//! assert_eq!(display.text(1), "04A1B2C3");
//! # Ok(())
//! # }
//! ```
//!
//! ## Builder Pattern
//!
//! ```
//! use keytag_terminal::VirtualDisplay;
//!
//! let display = VirtualDisplay::builder().with_size(4, 20).build();
//!
//! assert_eq!(display.rows(), 4);
//! assert_eq!(display.line(3).unwrap().len(), 20);
//! ```

use keytag_core::constants::{DEFAULT_DISPLAY_COLUMNS, DEFAULT_DISPLAY_ROWS};
use keytag_core::{Error, Result};
use keytag_hardware::{DisplayDevice, HardwareError};

/// Character shown in place of anything the LCD cannot render.
const REPLACEMENT_CHAR: char = '?';

/// Virtual character LCD with a cursor.
///
/// Every row is kept exactly `columns` characters wide, padded with spaces.
///
/// # Thread Safety
///
/// Not synchronized. The controller that drives it holds it exclusively.
#[derive(Debug, Clone)]
pub struct VirtualDisplay {
    /// Number of rows on the display.
    rows: usize,

    /// Number of characters per row.
    columns: usize,

    /// Current contents, one ASCII string per row.
    buffer: Vec<String>,

    /// Cursor position as (row, column).
    cursor: (usize, usize),
}

impl VirtualDisplay {
    /// Create a blank display with the given size.
    ///
    /// A display with zero rows has no cells: every cursor move is rejected
    /// and writes are dropped.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            buffer: vec![" ".repeat(columns); rows],
            cursor: (0, 0),
        }
    }

    /// Create a builder for constructing a virtual display.
    pub fn builder() -> VirtualDisplayBuilder {
        VirtualDisplayBuilder::default()
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns per row
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Current cursor position as (row, column)
    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    /// Get a row, padded to the display width.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLine` if `row` is outside the display.
    pub fn line(&self, row: usize) -> Result<&str> {
        self.buffer
            .get(row)
            .map(String::as_str)
            .ok_or(Error::InvalidLine {
                line: row,
                max: self.rows.saturating_sub(1),
            })
    }

    /// Get a row without its trailing padding.
    ///
    /// Returns an empty string for rows outside the display.
    pub fn text(&self, row: usize) -> &str {
        self.line(row).map(str::trim_end).unwrap_or_default()
    }

    /// Get all rows, padded to the display width.
    pub fn lines(&self) -> Vec<&str> {
        self.buffer.iter().map(String::as_str).collect()
    }

    /// Render the display inside an ASCII frame for console output.
    ///
    /// ```
    /// use keytag_terminal::VirtualDisplay;
    ///
    /// let display = VirtualDisplay::new(1, 4);
    /// assert_eq!(display.render(), "+----+\n|    |\n+----+");
    /// ```
    pub fn render(&self) -> String {
        let border = format!("+{}+", "-".repeat(self.columns));
        let mut out = border.clone();

        for line in &self.buffer {
            out.push_str("\n|");
            out.push_str(line);
            out.push('|');
        }

        out.push('\n');
        out.push_str(&border);
        out
    }

    fn blank(&mut self) {
        for line in &mut self.buffer {
            *line = " ".repeat(self.columns);
        }
        self.cursor = (0, 0);
    }

    fn move_cursor(&mut self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows {
            return Err(Error::InvalidLine {
                line: row,
                max: self.rows.saturating_sub(1),
            });
        }

        self.cursor = (row, col.min(self.columns));
        Ok(())
    }

    fn put(&mut self, text: &str) {
        let (row, col) = self.cursor;
        let Some(line) = self.buffer.get_mut(row) else {
            return;
        };
        let available = self.columns.saturating_sub(col);
        let visible = truncate_text(&sanitize_text(text), available);
        let end = col + visible.len();

        // Rows and sanitized text are ASCII, so byte ranges are char ranges
        line.replace_range(col..end, &visible);
        self.cursor = (row, end);
    }
}

impl Default for VirtualDisplay {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_ROWS, DEFAULT_DISPLAY_COLUMNS)
    }
}

impl DisplayDevice for VirtualDisplay {
    async fn clear(&mut self) -> keytag_hardware::Result<()> {
        self.blank();
        Ok(())
    }

    async fn write(&mut self, text: &str) -> keytag_hardware::Result<()> {
        self.put(text);
        Ok(())
    }

    async fn set_cursor(&mut self, row: usize, col: usize) -> keytag_hardware::Result<()> {
        self.move_cursor(row, col).map_err(HardwareError::from)
    }
}

/// Builder for constructing `VirtualDisplay` instances.
#[derive(Debug)]
pub struct VirtualDisplayBuilder {
    rows: usize,
    columns: usize,
}

impl VirtualDisplayBuilder {
    /// Set the display size (rows and columns).
    pub fn with_size(mut self, rows: usize, columns: usize) -> Self {
        self.rows = rows;
        self.columns = columns;
        self
    }

    /// Build the virtual display.
    pub fn build(self) -> VirtualDisplay {
        VirtualDisplay::new(self.rows, self.columns)
    }
}

impl Default for VirtualDisplayBuilder {
    fn default() -> Self {
        Self {
            rows: DEFAULT_DISPLAY_ROWS,
            columns: DEFAULT_DISPLAY_COLUMNS,
        }
    }
}

/// Truncate text to a maximum number of characters.
///
/// # Examples
///
/// ```
/// use keytag_terminal::truncate_text;
///
/// assert_eq!(truncate_text("Access granted", 6), "Access");
/// assert_eq!(truncate_text("Short", 10), "Short");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Map text onto the LCD character set.
///
/// Control characters are removed and non-ASCII characters are replaced.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii() { c } else { REPLACEMENT_CHAR })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_display_is_blank() {
        let display = VirtualDisplay::new(2, 16);

        assert_eq!(display.rows(), 2);
        assert_eq!(display.columns(), 16);
        assert_eq!(display.cursor(), (0, 0));
        assert_eq!(display.lines(), vec![" ".repeat(16); 2]);
    }

    #[test]
    fn test_default_matches_lcd_module() {
        let display = VirtualDisplay::default();
        assert_eq!((display.rows(), display.columns()), (2, 16));
    }

    #[tokio::test]
    async fn test_write_advances_cursor() {
        let mut display = VirtualDisplay::new(2, 16);

        display.write("Tag").await.unwrap();
        display.write(" in use").await.unwrap();

        assert_eq!(display.text(0), "Tag in use");
        assert_eq!(display.cursor(), (0, 10));
    }

    #[tokio::test]
    async fn test_write_clips_at_row_end() {
        let mut display = VirtualDisplay::new(2, 8);

        display.write("Waiting for tag").await.unwrap();

        assert_eq!(display.line(0).unwrap(), "Waiting ");
        assert_eq!(display.text(1), "");
        assert_eq!(display.cursor(), (0, 8));
    }

    #[tokio::test]
    async fn test_write_at_cursor_overwrites_in_place() {
        let mut display = VirtualDisplay::new(2, 16);
        display.write("Enrolling").await.unwrap();

        display.set_cursor(0, 0).await.unwrap();
        display.write("Rev").await.unwrap();

        assert_eq!(display.text(0), "Revolling");
    }

    #[tokio::test]
    async fn test_clear_resets_cursor() {
        let mut display = VirtualDisplay::new(2, 16);
        display.set_cursor(1, 4).await.unwrap();
        display.write("Bob").await.unwrap();

        display.clear().await.unwrap();

        assert_eq!(display.text(1), "");
        assert_eq!(display.cursor(), (0, 0));
    }

    #[tokio::test]
    async fn test_set_cursor_rejects_missing_row() {
        let mut display = VirtualDisplay::new(2, 16);

        let result = display.set_cursor(2, 0).await;

        assert!(matches!(result, Err(HardwareError::InvalidData { .. })));
        assert_eq!(display.cursor(), (0, 0));
    }

    #[tokio::test]
    async fn test_set_cursor_clamps_column() {
        let mut display = VirtualDisplay::new(2, 16);

        display.set_cursor(1, 40).await.unwrap();
        display.write("dropped").await.unwrap();

        assert_eq!(display.cursor(), (1, 16));
        assert_eq!(display.text(1), "");
    }

    #[rstest]
    #[case("Alice", "Alice")]
    #[case("Jos\u{e9}", "Jos?")]
    #[case("line\nbreak", "linebreak")]
    #[case("tab\there", "tabhere")]
    fn test_sanitize_text(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_text(input), expected);
    }

    #[test]
    fn test_line_out_of_bounds() {
        let display = VirtualDisplay::new(2, 16);

        assert_eq!(
            display.line(5),
            Err(Error::InvalidLine { line: 5, max: 1 })
        );
        assert_eq!(display.text(5), "");
    }

    #[test]
    fn test_builder_sets_size() {
        let display = VirtualDisplay::builder().with_size(4, 20).build();

        assert_eq!(display.rows(), 4);
        assert_eq!(display.columns(), 20);
    }

    #[tokio::test]
    async fn test_zero_row_display_has_no_cells() {
        let mut display = VirtualDisplay::builder().with_size(0, 16).build();

        assert!(matches!(
            display.line(0),
            Err(Error::InvalidLine { line: 0, max: 0 })
        ));
        assert!(display.set_cursor(0, 0).await.is_err());

        display.clear().await.unwrap();
        display.write("Waiting for tag").await.unwrap();
        assert_eq!(display.text(0), "");
    }

    #[tokio::test]
    async fn test_render_frames_every_row() {
        let mut display = VirtualDisplay::new(2, 5);
        display.write("Hi").await.unwrap();

        assert_eq!(display.render(), "+-----+\n|Hi   |\n|     |\n+-----+");
    }
}
