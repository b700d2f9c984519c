//! Scripted console front end for the mention core.
//!
//! `Demo` plays the part of an editing widget: each script command is applied
//! to a `MemorySurface` the way a user would, then reported to the session.

use std::io::Write;

use anyhow::{Context, Result};
use core_config::Config;
use core_mention::{MentionSpan, StyleRun};
use core_session::memory::{MemorySurface, SurfaceChange};
use core_session::{MentionSession, Presenter};
use core_text::{EditingContent, byte_range};
use tracing::{debug, info};

pub mod script;

use script::Command;

/// Collects what the session wants shown; the demo prints it after each
/// command.
#[derive(Debug, Default)]
pub struct ConsolePresenter {
    candidates: Option<Vec<String>>,
    runs: Vec<StyleRun>,
}

impl ConsolePresenter {
    pub fn candidates(&self) -> Option<&[String]> {
        self.candidates.as_deref()
    }

    pub fn runs(&self) -> &[StyleRun] {
        &self.runs
    }
}

impl Presenter for ConsolePresenter {
    fn show_suggestions(&mut self, candidates: &[String]) {
        self.candidates = Some(candidates.to_vec());
    }

    fn hide_suggestions(&mut self) {
        self.candidates = None;
    }

    fn style_spans(&mut self, runs: &[StyleRun]) {
        self.runs = runs.to_vec();
    }
}

pub struct Demo {
    session: MentionSession<ConsolePresenter>,
    surface: MemorySurface,
}

impl Demo {
    pub fn new(cfg: &Config) -> Result<Self> {
        let mut session = MentionSession::from_config(cfg, ConsolePresenter::default())?;
        let surface = MemorySurface::default();
        session.attach(surface.content());
        Ok(Self { session, surface })
    }

    pub fn session(&self) -> &MentionSession<ConsolePresenter> {
        &self.session
    }

    pub fn surface(&self) -> &MemorySurface {
        &self.surface
    }

    /// Run one command; anything worth showing is written to `out`.
    pub fn execute(&mut self, cmd: &Command, out: &mut dyn Write) -> Result<()> {
        debug!(target: "demo", ?cmd, "execute");
        match cmd {
            Command::Type(text) => {
                let change = self.surface.user_insert(text)?;
                self.notify(change)?;
            }
            Command::Backspace(n) => {
                for _ in 0..*n {
                    let change = self.surface.user_backspace()?;
                    self.notify(change)?;
                }
            }
            Command::Select(range) => {
                let change = self.surface.user_select(*range)?;
                self.notify(change)?;
            }
            Command::Replace { range, text } => {
                let change = self.surface.user_replace(*range, text)?;
                self.notify(change)?;
            }
            Command::Pick(index) => {
                let candidate = self
                    .session
                    .presenter()
                    .candidates()
                    .and_then(|c| c.get(*index))
                    .cloned()
                    .with_context(|| format!("no suggestion #{index} on screen"))?;
                self.accept(&candidate, out)?;
            }
            Command::Accept(name) => self.accept(name, out)?,
            Command::Reset(text) => {
                self.session
                    .reset(&mut self.surface, EditingContent::with_caret_at_end(text.as_str()))?;
            }
            Command::Print => writeln!(out, "{}", self.render()?)?,
        }
        if let Some(candidates) = self.session.presenter().candidates() {
            writeln!(out, "suggestions: {}", candidates.join(", "))?;
        }
        Ok(())
    }

    fn notify(&mut self, change: SurfaceChange) -> Result<()> {
        self.session
            .notify_changed(&mut self.surface, &change.old, &change.new)?;
        Ok(())
    }

    fn accept(&mut self, candidate: &str, out: &mut dyn Write) -> Result<()> {
        match self.session.suggestion_accepted(&mut self.surface, candidate)? {
            Some(result) => info!(target: "demo", span = %result.span.range, "mention_added"),
            None => writeln!(out, "no active trigger")?,
        }
        Ok(())
    }

    /// Buffer text with each mention wrapped in brackets and the caret or
    /// selection marked with `|`.
    pub fn render(&self) -> Result<String> {
        let content = self.surface.content();
        render_marked(&content, self.session.registry().spans())
    }
}

fn render_marked(content: &EditingContent, spans: &[MentionSpan]) -> Result<String> {
    let mut marks: Vec<(usize, &str)> = Vec::with_capacity(spans.len() * 2 + 2);
    for span in spans {
        let bytes = byte_range(&content.text, span.range)?;
        marks.push((bytes.start, "["));
        marks.push((bytes.end, "]"));
    }
    let sel = byte_range(&content.text, content.selection)?;
    marks.push((sel.start, "|"));
    if !sel.is_empty() {
        marks.push((sel.end, "|"));
    }
    // Closing brackets before carets before opening brackets at one offset.
    let rank = |m: &str| match m {
        "]" => 0,
        "|" => 1,
        _ => 2,
    };
    marks.sort_by_key(|&(at, m)| (at, rank(m)));

    let mut out = String::with_capacity(content.text.len() + marks.len());
    let mut last = 0;
    for (at, mark) in marks {
        out.push_str(&content.text[last..at]);
        out.push_str(mark);
        last = at;
    }
    out.push_str(&content.text[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Utf16Range;
    use pretty_assertions::assert_eq;

    fn demo() -> Demo {
        Demo::new(&Config::default()).unwrap()
    }

    fn run(demo: &mut Demo, line: &str) -> String {
        let mut out = Vec::new();
        if let Some(cmd) = script::parse_line(line).unwrap() {
            demo.execute(&cmd, &mut out).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn render_marks_mentions_and_caret() {
        let content = EditingContent::new("hello alice ", Utf16Range::caret(12));
        let span = MentionSpan::new("alice", 6, None, Default::default());
        assert_eq!(render_marked(&content, &[span]).unwrap(), "hello [alice] |");
    }

    #[test]
    fn render_orders_marks_at_same_offset() {
        let content = EditingContent::new("alice", Utf16Range::new(0, 5));
        let span = MentionSpan::new("alice", 0, None, Default::default());
        assert_eq!(render_marked(&content, &[span]).unwrap(), "|[alice]|");
    }

    #[test]
    fn typing_trigger_lists_default_candidates() {
        let mut d = demo();
        let out = run(&mut d, "type hi @c");
        assert_eq!(out, "suggestions: cat\n");
    }

    #[test]
    fn pick_accepts_shown_candidate() {
        let mut d = demo();
        run(&mut d, "type hi @m");
        run(&mut d, "pick 0");
        assert_eq!(run(&mut d, "print"), "hi [meow] |\n");
        // Base run plus the mention.
        assert_eq!(d.session().presenter().runs().len(), 2);
    }

    #[test]
    fn pick_without_list_is_an_error() {
        let mut d = demo();
        let cmd = script::parse_line("pick 0").unwrap().unwrap();
        assert!(d.execute(&cmd, &mut Vec::<u8>::new()).is_err());
    }

    #[test]
    fn accept_without_trigger_reports_it() {
        let mut d = demo();
        run(&mut d, "type plain");
        assert_eq!(run(&mut d, "accept cat"), "no active trigger\n");
    }
}
