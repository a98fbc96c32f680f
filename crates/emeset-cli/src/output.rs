//! Terminal output for commands.
//!
//! Commands write through the [`Output`] trait so they can be tested against
//! a recording implementation. [`ConsoleOutput`] is the real one: it styles
//! text with `console` and reads answers through a [`TerminalIO`].

use std::io::{self, BufRead, IsTerminal, Write};

use console::Style;
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

/// Background colors for [`Output::background`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

/// Terminal formatting operations available to commands.
pub trait Output {
    /// Yellow text.
    fn warning(&mut self, message: &str) -> io::Result<()>;

    /// Red text.
    fn error(&mut self, message: &str) -> io::Result<()>;

    /// Green text.
    fn success(&mut self, message: &str) -> io::Result<()>;

    /// Blue text.
    fn info(&mut self, message: &str) -> io::Result<()>;

    /// Plain text.
    fn echo(&mut self, message: &str) -> io::Result<()>;

    /// A bordered table. `headers` may be empty.
    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()>;

    /// Pretty-printed JSON.
    fn json(&mut self, data: &Value) -> io::Result<()>;

    /// Empty line.
    fn br(&mut self) -> io::Result<()>;

    /// Prompts for a line of text. With a non-empty `acceptable` list the
    /// prompt repeats until one of the values is entered; `hint` appends the
    /// list to the prompt.
    fn input(&mut self, message: &str, acceptable: &[&str], hint: bool) -> io::Result<String>;

    /// Prompts for a line without echoing it.
    fn password(&mut self, message: &str) -> io::Result<String>;

    /// Asks a yes/no question.
    fn confirm(&mut self, message: &str) -> io::Result<bool>;

    /// Starts a progress bar with `total` steps.
    fn progress(&mut self, total: u64, message: &str) -> io::Result<()>;

    /// Advances the current progress bar.
    fn progress_advance(&mut self, advance: u64, message: &str) -> io::Result<()>;

    /// Clears the screen.
    fn clear(&mut self) -> io::Result<()>;

    /// Text on a colored background.
    fn background(&mut self, color: Color, message: &str) -> io::Result<()>;

    /// `label....result`, padded with `fill` to `length` columns.
    fn padding(&mut self, length: usize, label: &str, result: &str, fill: char) -> io::Result<()>;

    /// Bold text.
    fn bold(&mut self, message: &str) -> io::Result<()>;

    /// A line of `fill` repeated `length` times.
    fn border(&mut self, fill: char, length: usize) -> io::Result<()>;

    /// Items laid out in `cols` columns.
    fn columns(&mut self, items: &[String], cols: usize) -> io::Result<()>;
}

/// Abstraction over terminal input.
pub trait TerminalIO {
    /// Check if stdin is a terminal.
    fn is_terminal(&self) -> bool;

    /// Read a line from stdin.
    fn read_line(&self) -> io::Result<String>;

    /// Read a line without echo.
    fn read_secret(&self) -> io::Result<String> {
        self.read_line()
    }
}

/// Real terminal input.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealTerminal;

impl TerminalIO for RealTerminal {
    fn is_terminal(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn read_line(&self) -> io::Result<String> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }

    fn read_secret(&self) -> io::Result<String> {
        if self.is_terminal() {
            console::Term::stdout().read_secure_line()
        } else {
            self.read_line()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ProgressState {
    total: u64,
    current: u64,
}

const PROGRESS_WIDTH: usize = 40;

/// [`Output`] on a writer, styled with `console`.
pub struct ConsoleOutput {
    out: Box<dyn Write>,
    terminal: Box<dyn TerminalIO>,
    styled: bool,
    progress: Option<ProgressState>,
}

impl ConsoleOutput {
    /// Writes to stdout, styling when stdout supports colors.
    pub fn stdout() -> Self {
        Self {
            out: Box::new(io::stdout()),
            terminal: Box::new(RealTerminal),
            styled: console::colors_enabled(),
            progress: None,
        }
    }

    /// Writes to any writer, reading answers from `terminal`.
    pub fn new(out: Box<dyn Write>, terminal: Box<dyn TerminalIO>) -> Self {
        Self {
            out,
            terminal,
            styled: false,
            progress: None,
        }
    }

    /// Forces styling on or off.
    pub fn styled(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    fn line(&mut self, style: Style, message: &str) -> io::Result<()> {
        let style = style.force_styling(self.styled);
        writeln!(self.out, "{}", style.apply_to(message))
    }

    fn prompt(&mut self, message: &str) -> io::Result<()> {
        write!(self.out, "{} ", message)?;
        self.out.flush()
    }

    fn answer(&self) -> io::Result<String> {
        let line = self.terminal.read_line()?;
        if line.is_empty() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no input"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn draw_progress(&mut self, message: &str) -> io::Result<()> {
        let Some(state) = self.progress else {
            return Ok(());
        };
        let ratio = if state.total == 0 {
            1.0
        } else {
            state.current.min(state.total) as f64 / state.total as f64
        };
        let filled = (ratio * PROGRESS_WIDTH as f64).round() as usize;
        let bar = format!(
            "[{}{}] {:>3}%",
            "=".repeat(filled),
            " ".repeat(PROGRESS_WIDTH - filled),
            (ratio * 100.0).round() as u64
        );
        let text = if message.is_empty() {
            bar
        } else {
            format!("{} {}", bar, message)
        };
        if self.styled {
            write!(self.out, "\r{}", text)?;
            if state.current >= state.total {
                writeln!(self.out)?;
            }
        } else {
            writeln!(self.out, "{}", text)?;
        }
        self.out.flush()
    }
}

impl Output for ConsoleOutput {
    fn warning(&mut self, message: &str) -> io::Result<()> {
        self.line(Style::new().yellow(), message)
    }

    fn error(&mut self, message: &str) -> io::Result<()> {
        self.line(Style::new().red(), message)
    }

    fn success(&mut self, message: &str) -> io::Result<()> {
        self.line(Style::new().green(), message)
    }

    fn info(&mut self, message: &str) -> io::Result<()> {
        self.line(Style::new().blue(), message)
    }

    fn echo(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message)
    }

    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
        let cols = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(headers.len()))
            .max()
            .unwrap_or(0);
        if cols == 0 {
            return Ok(());
        }

        let mut widths = vec![0usize; cols];
        for (i, h) in headers.iter().enumerate() {
            widths[i] = widths[i].max(h.width());
        }
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let rule: String = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("-");
        let rule = format!("-{}-", rule);

        writeln!(self.out, "{}", rule)?;
        if !headers.is_empty() {
            let cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
            let row = format_row(&cells, &widths);
            let bold = Style::new().bold().force_styling(self.styled);
            writeln!(self.out, "{}", bold.apply_to(row))?;
            writeln!(self.out, "{}", rule)?;
        }
        for row in rows {
            writeln!(self.out, "{}", format_row(row, &widths))?;
            writeln!(self.out, "{}", rule)?;
        }
        Ok(())
    }

    fn json(&mut self, data: &Value) -> io::Result<()> {
        let text = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
        writeln!(self.out, "{}", text)
    }

    fn br(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    fn input(&mut self, message: &str, acceptable: &[&str], hint: bool) -> io::Result<String> {
        let prompt = if hint && !acceptable.is_empty() {
            format!("{} [{}]", message, acceptable.join("/"))
        } else {
            message.to_string()
        };
        loop {
            self.prompt(&prompt)?;
            let answer = self.answer()?;
            if acceptable.is_empty() || acceptable.contains(&answer.as_str()) {
                return Ok(answer);
            }
        }
    }

    fn password(&mut self, message: &str) -> io::Result<String> {
        self.prompt(message)?;
        let secret = self.terminal.read_secret()?;
        Ok(secret.trim_end_matches(['\r', '\n']).to_string())
    }

    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        loop {
            self.prompt(&format!("{} [y/n]", message))?;
            match self.answer()?.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => continue,
            }
        }
    }

    fn progress(&mut self, total: u64, message: &str) -> io::Result<()> {
        self.progress = Some(ProgressState { total, current: 0 });
        self.draw_progress(message)
    }

    fn progress_advance(&mut self, advance: u64, message: &str) -> io::Result<()> {
        if let Some(state) = self.progress.as_mut() {
            state.current = state.current.saturating_add(advance);
        }
        self.draw_progress(message)
    }

    fn clear(&mut self) -> io::Result<()> {
        if self.styled {
            write!(self.out, "\x1b[2J\x1b[H")?;
        }
        self.out.flush()
    }

    fn background(&mut self, color: Color, message: &str) -> io::Result<()> {
        let style = match color {
            Color::Red => Style::new().on_red(),
            Color::Green => Style::new().on_green(),
            Color::Blue => Style::new().on_blue(),
            Color::Yellow => Style::new().on_yellow(),
        };
        self.line(style, message)
    }

    fn padding(&mut self, length: usize, label: &str, result: &str, fill: char) -> io::Result<()> {
        let used = label.width();
        let pad = length.saturating_sub(used);
        let filler: String = std::iter::repeat(fill).take(pad).collect();
        writeln!(self.out, "{}{} {}", label, filler, result)
    }

    fn bold(&mut self, message: &str) -> io::Result<()> {
        self.line(Style::new().bold(), message)
    }

    fn border(&mut self, fill: char, length: usize) -> io::Result<()> {
        let line: String = std::iter::repeat(fill).take(length).collect();
        writeln!(self.out, "{}", line)
    }

    fn columns(&mut self, items: &[String], cols: usize) -> io::Result<()> {
        let cols = cols.max(1);
        let width = items.iter().map(|i| i.width()).max().unwrap_or(0);
        for chunk in items.chunks(cols) {
            let cells: Vec<String> = chunk
                .iter()
                .map(|item| pad_right(item, width))
                .collect();
            writeln!(self.out, "{}", cells.join("  ").trim_end())?;
        }
        Ok(())
    }
}

fn pad_right(text: &str, width: usize) -> String {
    let mut out = text.to_string();
    out.push_str(&" ".repeat(width.saturating_sub(text.width())));
    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let parts: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| pad_right(cells.get(i).map(String::as_str).unwrap_or(""), *w))
        .collect();
    format!("| {} |", parts.join(" | "))
}
