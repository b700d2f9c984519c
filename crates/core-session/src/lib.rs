//! Glue between an editing widget and the mention core.
//!
//! The widget (`TextSurface`) owns the visible text and reports every change
//! it made on its own through `MentionSession::notify_changed`. The session
//! reconstructs the edit, keeps the registry in step, and pushes back any
//! correction (filtered input, a widened selection or trimmed mention text)
//! as a single `SurfaceEdit`.
//! Styling and the suggestion list go to a `Presenter`.
//!
//! Edits the session instructs must not be reported back through
//! `notify_changed`; the registry has already accounted for them.

use anyhow::{Context, Result};
use bitflags::bitflags;
use core_config::Config;
use core_mention::{MentionOptions, MentionRegistry, StyleRun, SubstitutionResult};
use core_text::diff::reconstruct_edit;
use core_text::filter::{filter_text, is_bidi_control, strip_bidi_controls};
use core_text::{EditingContent, Utf16Range, replace_utf16, utf16_len};
use core_trigger::{StaticSuggestions, SuggestionSource, TriggerDetector};
use tracing::{debug, trace, warn};

pub mod memory;

bitflags! {
    /// What a surface notification changed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChangeFlags: u8 {
        const TEXT = 0b01;
        const SELECTION = 0b10;
    }
}

/// One atomic instruction for the surface: replace `range` (in the surface's
/// current text) with `replacement`, then set `selection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceEdit {
    pub range: Utf16Range,
    pub replacement: String,
    pub selection: Utf16Range,
}

impl SurfaceEdit {
    /// Selection change only; the text is left alone.
    pub fn select(selection: Utf16Range) -> Self {
        Self {
            range: Utf16Range::caret(selection.location),
            replacement: String::new(),
            selection,
        }
    }
}

/// The editing widget. `apply_edit` must apply text and selection together
/// or not at all.
pub trait TextSurface {
    fn apply_edit(&mut self, edit: &SurfaceEdit) -> Result<()>;
}

/// Where decoration and the suggestion list are shown.
pub trait Presenter {
    fn show_suggestions(&mut self, candidates: &[String]);
    fn hide_suggestions(&mut self);
    fn style_spans(&mut self, runs: &[StyleRun]);
}

pub struct MentionSession<P, S = StaticSuggestions> {
    registry: MentionRegistry,
    detector: TriggerDetector,
    source: S,
    presenter: P,
    strip_bidi_controls: bool,
    suggestions_visible: bool,
}

impl<P: Presenter> MentionSession<P, StaticSuggestions> {
    pub fn from_config(cfg: &Config, presenter: P) -> Result<Self> {
        let detector = TriggerDetector::from_config(cfg).context("building trigger pattern")?;
        let registry = MentionRegistry::new(MentionOptions::from_config(cfg));
        Ok(Self::new(registry, detector, StaticSuggestions::from_config(cfg), presenter)
            .with_bidi_filter(cfg.file.input.strip_bidi_controls))
    }
}

impl<P: Presenter, S: SuggestionSource> MentionSession<P, S> {
    pub fn new(registry: MentionRegistry, detector: TriggerDetector, source: S, presenter: P) -> Self {
        Self {
            registry,
            detector,
            source,
            presenter,
            strip_bidi_controls: true,
            suggestions_visible: false,
        }
    }

    pub fn with_bidi_filter(mut self, enabled: bool) -> Self {
        self.strip_bidi_controls = enabled;
        self
    }

    pub fn registry(&self) -> &MentionRegistry {
        &self.registry
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn suggestions_visible(&self) -> bool {
        self.suggestions_visible
    }

    /// Start tracking `content` from scratch (initial load or programmatic
    /// replacement of the whole buffer). Any BiDi controls are stripped and
    /// the filtered content is pushed to the surface.
    pub fn reset(&mut self, surface: &mut dyn TextSurface, content: EditingContent) -> Result<()> {
        let current_len = self.registry.snapshot().len_utf16();
        let content = if self.strip_bidi_controls {
            strip_bidi_controls(&content)
        } else {
            content
        };
        surface.apply_edit(&SurfaceEdit {
            range: Utf16Range::new(0, current_len),
            replacement: content.text.clone(),
            selection: content.selection,
        })?;
        self.registry.reset(content);
        self.hide();
        self.restyle();
        Ok(())
    }

    /// Like `reset` but for content the surface already shows; nothing is
    /// pushed back.
    pub fn attach(&mut self, content: EditingContent) {
        self.registry.reset(content);
        self.hide();
        self.restyle();
    }

    /// The surface changed from `old` to `new` on its own.
    pub fn notify_changed(
        &mut self,
        surface: &mut dyn TextSurface,
        old: &EditingContent,
        new: &EditingContent,
    ) -> Result<ChangeFlags> {
        let mut flags = ChangeFlags::empty();
        flags.set(ChangeFlags::TEXT, old.text != new.text);
        flags.set(ChangeFlags::SELECTION, old.selection != new.selection);
        if flags.is_empty() {
            trace!(target: "mention.session", "notify_unchanged");
            return Ok(flags);
        }

        let (range, replacement) = if flags.contains(ChangeFlags::TEXT) {
            self.recover_edit(old, new)?
        } else {
            (Utf16Range::caret(0), String::new())
        };

        let filtered = if self.strip_bidi_controls {
            filter_text(&replacement, |c| !is_bidi_control(c)).into_owned()
        } else {
            replacement.clone()
        };
        let inserted = Utf16Range::new(range.location, utf16_len(&replacement));
        let effective = if filtered == replacement {
            new.clone()
        } else {
            let text = replace_utf16(&old.text, range, &filtered)?;
            let map = |p| map_through_filter(p, inserted, &replacement);
            let selection = Utf16Range::from_bounds(map(new.selection.location), map(new.selection.end()));
            debug!(
                target: "mention.session",
                dropped = inserted.length - utf16_len(&filtered),
                "bidi_controls_stripped"
            );
            EditingContent::new(text, selection)
        };

        let checkpoint = self.registry.clone();
        let outcome = self
            .registry
            .on_edit_applied(old, &effective, range, &filtered)
            .with_context(|| format!("repairing mentions after edit {range}"))?;

        let correction = if let Some(rest) = outcome.trimmed {
            // Only pure deletions are trimmed, so nothing was filtered.
            Some(SurfaceEdit {
                range: rest,
                replacement: String::new(),
                selection: outcome.content.selection,
            })
        } else if filtered != replacement {
            Some(SurfaceEdit {
                range: inserted,
                replacement: filtered,
                selection: outcome.content.selection,
            })
        } else if outcome.content.selection != new.selection {
            Some(SurfaceEdit::select(outcome.content.selection))
        } else {
            None
        };
        if let Some(edit) = correction {
            if let Err(err) = surface.apply_edit(&edit) {
                warn!(target: "mention.session", error = %err, "surface_rejected_correction");
                self.registry = checkpoint;
                return Err(err.context("applying correction to surface"));
            }
        }

        debug!(
            target: "mention.session",
            ?flags,
            kind = ?outcome.kind,
            removed = outcome.removed.len(),
            widened = outcome.selection_widened,
            trimmed = outcome.trimmed.is_some(),
            "changed"
        );
        self.restyle();
        self.refresh_suggestions(flags);
        Ok(flags)
    }

    /// The user picked `candidate` from the suggestion list. Returns `None`
    /// when no trigger is active at the caret any more.
    pub fn suggestion_accepted(
        &mut self,
        surface: &mut dyn TextSurface,
        candidate: &str,
    ) -> Result<Option<SubstitutionResult>> {
        let content = self.registry.snapshot();
        let Some(trigger) = self.detector.active_trigger(&content.text, content.selection) else {
            debug!(target: "mention.session", "accept_without_trigger");
            self.hide();
            return Ok(None);
        };
        let range = self
            .detector
            .completion_replacement_range(&content.text, trigger.range)
            .unwrap_or(trigger.range);

        let checkpoint = self.registry.clone();
        let result = self.registry.accept_suggestion(candidate, range)?;
        let edit = SurfaceEdit {
            range: result.replaced,
            replacement: result.inserted_text.clone(),
            selection: result.content.selection,
        };
        if let Err(err) = surface.apply_edit(&edit) {
            warn!(target: "mention.session", error = %err, "surface_rejected_substitution");
            self.registry = checkpoint;
            return Err(err.context("applying substitution to surface"));
        }
        debug!(
            target: "mention.session",
            query = %trigger.partial_query,
            span = %result.span.range,
            "accepted"
        );
        self.hide();
        self.restyle();
        Ok(Some(result))
    }

    /// Recover the single edit that turned `old` into `new`. Inserted text
    /// ends where the new selection ends and a deletion leaves the caret at
    /// its start. When the split is still ambiguous and lands strictly inside
    /// a mention, an equally valid split at the mention's start wins, so the
    /// mention keeps covering its own text.
    fn recover_edit(&self, old: &EditingContent, new: &EditingContent) -> Result<(Utf16Range, String)> {
        let (old_len, new_len) = (old.len_utf16(), new.len_utf16());
        let hint = if new_len < old_len {
            new.selection.location
        } else {
            new.selection.end().saturating_sub(new_len - old_len)
        };
        let mut edit = reconstruct_edit(&old.text, &new.text, hint)
            .context("text changed but no edit could be recovered")?;
        if edit.range.is_empty() {
            let inside = self
                .registry
                .spans_intersecting(edit.range)
                .first()
                .map(|span| span.range.location);
            if let Some(start) = inside {
                let alt = reconstruct_edit(&old.text, &new.text, start)
                    .context("text changed but no edit could be recovered")?;
                if alt.range == Utf16Range::caret(start) {
                    trace!(target: "mention.session", from = %edit.range, to = start, "split_moved_to_mention_start");
                    edit = alt;
                }
            }
        }
        Ok((edit.range, edit.replacement))
    }

    fn restyle(&mut self) {
        let runs = self.registry.style_runs();
        self.presenter.style_spans(&runs);
    }

    fn refresh_suggestions(&mut self, flags: ChangeFlags) {
        let content = self.registry.snapshot();
        match self.detector.active_trigger(&content.text, content.selection) {
            // A bare caret move onto a trigger keeps the list as it was.
            Some(_) if !flags.contains(ChangeFlags::TEXT) => {}
            Some(trigger) => {
                let candidates = self.source.candidates(&trigger.partial_query);
                if candidates.is_empty() {
                    self.hide();
                } else {
                    trace!(target: "mention.session", count = candidates.len(), "show_suggestions");
                    self.presenter.show_suggestions(&candidates);
                    self.suggestions_visible = true;
                }
            }
            None => self.hide(),
        }
    }

    fn hide(&mut self) {
        if self.suggestions_visible {
            self.presenter.hide_suggestions();
            self.suggestions_visible = false;
        }
    }
}

/// Position `p` of the unfiltered text mapped into the text where the
/// replacement occupying `inserted` has been filtered.
fn map_through_filter(p: usize, inserted: Utf16Range, replacement: &str) -> usize {
    if p <= inserted.location {
        return p;
    }
    let filtered_len = |upto: usize| {
        let local = EditingContent::new(replacement, Utf16Range::caret(upto));
        strip_bidi_controls(&local).selection.location
    };
    if p >= inserted.end() {
        p - inserted.length + filtered_len(inserted.length)
    } else {
        inserted.location + filtered_len(p - inserted.location)
    }
}
