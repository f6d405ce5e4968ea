//! Interactive shell
//!
//! Drives the directory browser, notepad, recycle bin manager and usage
//! display against the shared filesystem engine.

use anyhow::Result;
use app_core::{selected_target, AppError, AppState, Browser, BrowserRow, Document};
use app_fs::{Severity, UsageReport, VfsPath};
use std::fmt::Write as _;
use std::io::{BufRead, Write};

const HELP: &str = "\
Browser:   ls | cd <name|..|/path> | back | pwd
Files:     cat <name> | new <name> [text] | mkdir <name> | rn <old> <new>
           mv <name> <folder> | rm <name> | size <name>
Notepad:   open <name> | notepad | type <text> | append <line> | show
           save | saveas <name> [--force] | close
Recycle:   bin | restore <token> | purge <token> | empty
Storage:   df
Other:     help | quit

Names with spaces can be quoted: cd \"A cool folder\"";

/// What the loop should do after a command
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue(String),
    Quit,
}

/// Shell session state
struct Shell<'a> {
    state: &'a AppState,
    browser: Browser,
    document: Option<Document>,
}

impl<'a> Shell<'a> {
    fn new(state: &'a AppState) -> Self {
        Self {
            state,
            browser: Browser::new(),
            document: None,
        }
    }

    fn prompt(&self) -> String {
        match &self.document {
            Some(doc) => format!("{} [{}]> ", self.browser.current_path(), doc.title()),
            None => format!("{}> ", self.browser.current_path()),
        }
    }

    /// Execute one input line
    fn execute(&mut self, line: &str, input: &mut dyn BufRead) -> Result<Flow, AppError> {
        let args = split_args(line);
        let Some((command, rest)) = args.split_first() else {
            return Ok(Flow::Continue(String::new()));
        };
        tracing::debug!("Shell command: {}", command);

        let output = match (command.as_str(), rest) {
            ("help" | "?", _) => HELP.to_string(),
            ("quit" | "exit" | "q", _) => return Ok(Flow::Quit),

            // ========================================
            // Directory browser
            // ========================================
            ("ls", []) => self.list()?,
            ("pwd", []) => self.browser.current_path().to_string(),
            ("cd", [target]) => {
                self.change_dir(target)?;
                self.browser.current_path().to_string()
            }
            ("back", []) => {
                if !self.browser.go_back() {
                    return Ok(Flow::Continue("No previous folder".to_string()));
                }
                self.browser.current_path().to_string()
            }
            ("cat", [name]) => {
                let name = target(name)?;
                let path = self.browser.current_path().clone();
                let bytes = self.state.with_fs(|fs| fs.read_file(&path, name))?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            ("size", [name]) => {
                let name = target(name)?;
                let path = self.browser.current_path().clone();
                let size = self.state.with_fs(|fs| fs.entry_size(&path, name))?;
                format_size(size)
            }

            // ========================================
            // Mutations
            // ========================================
            ("new", [name, text @ ..]) => {
                let name = target(name)?;
                let path = self.browser.current_path().clone();
                let content = text.join(" ").into_bytes();
                self.state.with_fs(|fs| fs.create_file(&path, name, content))?;
                self.after_mutation(format!("Created {}", path.join(name)))
            }
            ("mkdir", [name]) => {
                let name = target(name)?;
                let path = self.browser.current_path().clone();
                self.state.with_fs(|fs| fs.create_folder(&path, name))?;
                self.after_mutation(format!("Created {}", path.join(name)))
            }
            ("rn", [old, new]) => {
                let old = target(old)?;
                let path = self.browser.current_path().clone();
                self.state.with_fs(|fs| fs.rename(&path, old, new))?;
                self.after_mutation(format!("Renamed {} to {}", old, new))
            }
            ("mv", [name, dest]) => {
                let name = target(name)?;
                let from = self.browser.current_path().clone();
                let to = self.folder_arg(dest);
                self.state.with_fs(|fs| fs.move_entry(&from, name, &to))?;
                self.after_mutation(format!("Moved {} to {}", name, to))
            }
            ("rm", [name]) => {
                let name = target(name)?;
                let path = self.browser.current_path().clone();
                let token = self.state.with_fs(|fs| fs.delete_to_recycle_bin(&path, name))?;
                self.after_mutation(format!("Moved to Recycle Bin as {}", token))
            }

            // ========================================
            // Notepad
            // ========================================
            ("open", [name]) => {
                let name = target(name)?;
                let path = self.browser.current_path().clone();
                let doc = self.state.with_fs(|fs| Document::open(fs, &path, name))?;
                let text = doc.text().to_string();
                self.document = Some(doc);
                text
            }
            ("notepad", []) => {
                self.document = Some(Document::untitled());
                "New untitled document".to_string()
            }
            ("type", text) => {
                let doc = self.document_mut()?;
                doc.set_text(text.join(" "));
                doc.title()
            }
            ("append", text) => {
                let doc = self.document_mut()?;
                doc.push_line(&text.join(" "));
                doc.title()
            }
            ("show", []) => {
                let doc = self.document.as_ref().ok_or(AppError::NoDocument)?;
                format!("{}\n{}", doc.title(), doc.text())
            }
            ("save", []) => {
                let mut doc = self.document.take().ok_or(AppError::NoDocument)?;
                let result = self.state.with_fs(|fs| doc.save(fs));
                let saved = format!("Saved {}", doc.path().join(doc.name().unwrap_or_default()));
                self.document = Some(doc);
                result?;
                self.after_mutation(saved)
            }
            ("saveas", [name, flags @ ..]) => {
                let name = target(name)?;
                let overwrite = flags.iter().any(|f| f == "--force");
                let path = self.browser.current_path().clone();
                let mut doc = self.document.take().unwrap_or_else(Document::untitled);
                let result = self.state.with_fs(|fs| doc.save_as(fs, &path, name, overwrite));
                self.document = Some(doc);
                result?;
                self.after_mutation(format!("Saved {}", path.join(name)))
            }
            ("close", []) => match self.document.take() {
                Some(doc) if doc.is_dirty() => {
                    let title = doc.title();
                    self.document = Some(doc);
                    if !confirm(input, "Discard unsaved changes? [y/N] ") {
                        return Ok(Flow::Continue(format!("Kept {}", title)));
                    }
                    self.document = None;
                    "Closed without saving".to_string()
                }
                Some(_) => "Closed".to_string(),
                None => "No open document".to_string(),
            },

            // ========================================
            // Recycle bin manager
            // ========================================
            ("bin", []) => self.bin_listing(),
            ("restore", [token]) => {
                let policy = self.state.config.read().recycle_bin.on_conflict;
                let outcome = self.state.with_fs(|fs| fs.restore(token, policy))?;
                let mut message = format!("Restored {}", outcome.path.join(&outcome.final_name));
                if outcome.fell_back_to_root {
                    message.push_str(" (original folder is gone, restored to root)");
                }
                self.after_mutation(message)
            }
            ("purge", [token]) => {
                self.state.with_fs(|fs| fs.purge(token))?;
                self.after_mutation(format!("Permanently deleted {}", token))
            }
            ("empty", []) => {
                let ask = self.state.config.read().recycle_bin.confirm_empty;
                if ask && !confirm(input, "Permanently delete everything in the Recycle Bin? [y/N] ") {
                    return Ok(Flow::Continue("Cancelled".to_string()));
                }
                let count = self.state.with_fs(|fs| fs.empty_bin());
                self.after_mutation(format!("Permanently deleted {} item(s)", count))
            }

            // ========================================
            // Usage display
            // ========================================
            ("df", []) => usage_line(&self.state.with_fs(|fs| fs.usage_report())),

            _ => format!("Unknown command or wrong arguments: {} (try 'help')", line.trim()),
        };

        Ok(Flow::Continue(output))
    }

    fn list(&self) -> Result<String, AppError> {
        let rows = self.state.with_fs(|fs| self.browser.rows(fs))?;
        if rows.is_empty() {
            return Ok("(empty)".to_string());
        }

        let mut out = String::new();
        for row in &rows {
            match row {
                BrowserRow::Back => {
                    let _ = writeln!(out, "{}", row.label());
                }
                BrowserRow::Entry { size, .. } => {
                    let _ = writeln!(out, "{:<40} {:>10}", row.label(), format_size(*size));
                }
            }
        }
        Ok(out.trim_end().to_string())
    }

    fn change_dir(&mut self, target: &str) -> Result<(), AppError> {
        if target.starts_with('/') {
            let path = VfsPath::parse(target);
            self.state.with_fs(|fs| self.browser.go_to(fs, path))?;
        } else {
            self.state.with_fs(|fs| self.browser.enter(fs, target))?;
        }
        Ok(())
    }

    /// Folder argument: absolute, `..`, or a child of the current folder
    fn folder_arg(&self, arg: &str) -> VfsPath {
        let current = self.browser.current_path();
        if arg.starts_with('/') {
            VfsPath::parse(arg)
        } else if arg == app_fs::BACK_ENTRY {
            current.parent().unwrap_or_default()
        } else {
            current.join(arg)
        }
    }

    fn document_mut(&mut self) -> Result<&mut Document, AppError> {
        self.document
            .as_mut()
            .ok_or(AppError::NoDocument)
    }

    fn bin_listing(&self) -> String {
        let items = self.state.with_fs(|fs| fs.recycle_bin_items());
        if items.is_empty() {
            return "Recycle Bin is empty".to_string();
        }

        let mut out = String::new();
        for item in &items {
            let _ = writeln!(
                out,
                "{}  {} {} (from {}, {}, deleted {})",
                item.token,
                item.kind.marker(),
                item.original_name,
                item.original_path,
                format_size(item.size),
                item.deleted_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
        out.trim_end().to_string()
    }

    /// Refresh views after a mutation and append the usage line
    fn after_mutation(&mut self, message: String) -> String {
        let report = self.state.with_fs(|fs| {
            self.browser.reset_if_missing(fs);
            fs.usage_report()
        });
        format!("{}\n{}", message, usage_line(&report))
    }
}

/// Mutation target for a name, rejecting the back entry
fn target(name: &str) -> Result<&str, AppError> {
    selected_target(name).ok_or(AppError::BackEntry)
}

fn usage_line(report: &UsageReport) -> String {
    match report.severity() {
        Severity::Normal => report.to_string(),
        Severity::Warning => format!("{} - running low", report),
        Severity::Critical => format!("{} - almost full", report),
    }
}

fn confirm(input: &mut dyn BufRead, question: &str) -> bool {
    eprint!("{}", question);
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}

/// Split a command line on whitespace, honouring double quotes
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        args.push(current);
    }
    args
}

/// Run the shell until `quit` or end of input
pub fn run<R: BufRead, W: Write>(state: &AppState, mut input: R, mut output: W) -> Result<()> {
    let mut shell = Shell::new(state);
    writeln!(output, "MemFiler - type 'help' for commands")?;
    writeln!(output, "{}", usage_line(&state.with_fs(|fs| fs.usage_report())))?;

    loop {
        write!(output, "{}", shell.prompt())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        match shell.execute(&line, &mut input) {
            Ok(Flow::Continue(text)) if text.is_empty() => {}
            Ok(Flow::Continue(text)) => writeln!(output, "{}", text)?,
            Ok(Flow::Quit) => break,
            Err(e) => {
                tracing::warn!("Command failed: {}", e);
                writeln!(output, "Error: {}", e.user_message())?;
            }
        }
    }

    if shell.document.as_ref().is_some_and(Document::is_dirty) {
        tracing::warn!("Exiting with unsaved notepad changes");
    }
    tracing::info!("Shell closed");
    Ok(())
}

/// Format file size for display
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
