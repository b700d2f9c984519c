//! End-to-end flows through `MentionSession` with an in-memory surface.

use core_mention::{MentionOptions, MentionRegistry, StyleKey, StyleRun};
use core_session::memory::MemorySurface;
use core_session::{ChangeFlags, MentionSession, Presenter, SurfaceEdit};
use core_text::{EditingContent, Utf16Range};
use core_trigger::{StaticSuggestions, TriggerDetector};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct Recorder {
    shown: Vec<Vec<String>>,
    hidden: usize,
    runs: Vec<StyleRun>,
}

impl Presenter for Recorder {
    fn show_suggestions(&mut self, candidates: &[String]) {
        self.shown.push(candidates.to_vec());
    }

    fn hide_suggestions(&mut self) {
        self.hidden += 1;
    }

    fn style_spans(&mut self, runs: &[StyleRun]) {
        self.runs = runs.to_vec();
    }
}

struct Harness {
    session: MentionSession<Recorder>,
    surface: MemorySurface,
}

impl Harness {
    fn new() -> Self {
        Self::with_options(MentionOptions::default())
    }

    fn with_options(options: MentionOptions) -> Self {
        let session = MentionSession::new(
            MentionRegistry::new(options),
            TriggerDetector::new('@').unwrap(),
            StaticSuggestions::new(vec!["alice".into(), "albert".into(), "bob".into()], true),
            Recorder::default(),
        );
        Self {
            session,
            surface: MemorySurface::default(),
        }
    }

    fn type_text(&mut self, text: &str) -> ChangeFlags {
        let change = self.surface.user_insert(text).unwrap();
        self.session
            .notify_changed(&mut self.surface, &change.old, &change.new)
            .unwrap()
    }

    fn replace(&mut self, range: Utf16Range, text: &str) {
        let change = self.surface.user_replace(range, text).unwrap();
        self.session
            .notify_changed(&mut self.surface, &change.old, &change.new)
            .unwrap();
    }

    fn select(&mut self, selection: Utf16Range) {
        let change = self.surface.user_select(selection).unwrap();
        self.session
            .notify_changed(&mut self.surface, &change.old, &change.new)
            .unwrap();
    }

    fn backspace(&mut self) {
        let change = self.surface.user_backspace().unwrap();
        self.session
            .notify_changed(&mut self.surface, &change.old, &change.new)
            .unwrap();
    }

    fn accept(&mut self, candidate: &str) {
        self.session
            .suggestion_accepted(&mut self.surface, candidate)
            .unwrap()
            .expect("trigger active");
    }

    fn span_ranges(&self) -> Vec<Utf16Range> {
        self.session
            .registry()
            .spans()
            .iter()
            .map(|s| s.range)
            .collect()
    }

    /// Surface and registry agree on the buffer.
    fn assert_in_sync(&self) {
        assert_eq!(&self.surface.content(), self.session.registry().snapshot());
        self.session.registry().validate().unwrap();
    }
}

/// "hello alice " with a span over "alice", caret after the separator.
fn with_alice() -> Harness {
    let mut h = Harness::new();
    h.type_text("hello @al");
    h.accept("alice");
    h
}

#[test]
fn typing_trigger_offers_matching_candidates() {
    let mut h = Harness::new();
    h.type_text("hello @al");
    assert_eq!(
        h.session.presenter().shown.last().unwrap(),
        &vec!["alice".to_string(), "albert".to_string()]
    );
    assert!(h.session.suggestions_visible());
    h.assert_in_sync();
}

#[test]
fn accepting_suggestion_inserts_span_and_separator() {
    let h = with_alice();
    assert_eq!(h.surface.text(), "hello alice ");
    assert_eq!(h.surface.selection(), Utf16Range::caret(12));
    assert_eq!(h.span_ranges(), vec![Utf16Range::new(6, 5)]);
    assert!(!h.session.suggestions_visible());

    let runs = &h.session.presenter().runs;
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1].range, Utf16Range::new(6, 5));
    assert!(runs[1].attributes.contains_key(&StyleKey::ForegroundColor));
    h.assert_in_sync();
}

#[test]
fn acceptance_replaces_text_typed_after_the_trigger() {
    let mut h = Harness::new();
    h.type_text("hi @al and more");
    h.select(Utf16Range::caret(6));
    h.accept("alice");
    assert_eq!(h.surface.text(), "hi alice and more");
    assert_eq!(h.span_ranges(), vec![Utf16Range::new(3, 5)]);
    h.assert_in_sync();
}

#[test]
fn insertion_before_span_shifts_it() {
    let mut h = with_alice();
    h.replace(Utf16Range::caret(0), "! ");
    assert_eq!(h.surface.text(), "! hello alice ");
    assert_eq!(h.span_ranges(), vec![Utf16Range::new(8, 5)]);

    h.replace(Utf16Range::caret(0), "!");
    assert_eq!(h.span_ranges(), vec![Utf16Range::new(9, 5)]);
    h.assert_in_sync();
}

fn covered_text(h: &Harness, range: Utf16Range) -> String {
    let text = h.surface.text();
    let bytes = core_text::byte_range(&text, range).unwrap();
    text[bytes].to_string()
}

#[test]
fn dropping_text_matching_the_mention_start_shifts_it() {
    let mut h = with_alice();
    // "a" dropped right before "alice"; the caret ends up after the drop.
    h.replace(Utf16Range::caret(6), "a");
    assert_eq!(h.surface.text(), "hello aalice ");
    assert_eq!(h.span_ranges(), vec![Utf16Range::new(7, 5)]);
    assert_eq!(covered_text(&h, Utf16Range::new(7, 5)), "alice");
    h.assert_in_sync();
}

#[test]
fn outside_insertion_with_caret_elsewhere_keeps_mention_text() {
    let mut h = with_alice();
    assert_eq!(h.surface.selection(), Utf16Range::caret(12));
    let change = h.surface.external_insert(6, "a").unwrap();
    assert_eq!(change.new.selection, Utf16Range::caret(13));
    h.session
        .notify_changed(&mut h.surface, &change.old, &change.new)
        .unwrap();
    assert_eq!(h.span_ranges(), vec![Utf16Range::new(7, 5)]);
    assert_eq!(covered_text(&h, Utf16Range::new(7, 5)), "alice");
    h.assert_in_sync();
}

#[test]
fn outside_insertion_strictly_inside_mention_keeps_it() {
    let mut h = with_alice();
    // "al" + "l" + "ice": every valid split lies inside the mention.
    let change = h.surface.external_insert(8, "l").unwrap();
    h.session
        .notify_changed(&mut h.surface, &change.old, &change.new)
        .unwrap();
    assert_eq!(h.surface.text(), "hello allice ");
    assert_eq!(h.span_ranges(), vec![Utf16Range::new(6, 5)]);
    h.assert_in_sync();
}

#[test]
fn deleting_inside_span_removes_it() {
    let mut h = with_alice();
    h.replace(Utf16Range::new(7, 2), "");
    assert_eq!(h.surface.text(), "hello ace ");
    assert!(h.span_ranges().is_empty());
    assert_eq!(h.session.presenter().runs.len(), 1);
    h.assert_in_sync();
}

#[test]
fn backspace_into_span_removes_it() {
    let mut h = with_alice();
    h.backspace();
    assert_eq!(h.span_ranges(), vec![Utf16Range::new(6, 5)]);
    h.backspace();
    assert_eq!(h.surface.text(), "hello alic");
    assert!(h.span_ranges().is_empty());
    h.assert_in_sync();
}

#[test]
fn atomic_delete_removes_whole_mention_on_backspace() {
    let mut h = Harness::with_options(MentionOptions {
        atomic_delete: true,
        ..MentionOptions::default()
    });
    h.type_text("hello @al");
    h.accept("alice");
    h.backspace();
    assert_eq!(h.surface.text(), "hello alice");
    assert_eq!(h.span_ranges(), vec![Utf16Range::new(6, 5)]);

    h.backspace();
    assert_eq!(h.surface.text(), "hello ");
    assert_eq!(h.surface.selection(), Utf16Range::caret(6));
    assert!(h.span_ranges().is_empty());
    assert_eq!(
        h.surface.applied_edits().last().unwrap(),
        &SurfaceEdit {
            range: Utf16Range::new(6, 4),
            replacement: String::new(),
            selection: Utf16Range::caret(6),
        }
    );
    h.assert_in_sync();

    // Ordinary text still goes one cluster at a time.
    h.backspace();
    assert_eq!(h.surface.text(), "hello");
    h.assert_in_sync();
}

#[test]
fn caret_inside_span_is_widened_to_cover_it() {
    let mut h = with_alice();
    h.select(Utf16Range::caret(8));
    assert_eq!(h.surface.selection(), Utf16Range::new(6, 5));
    assert_eq!(
        h.surface.applied_edits().last().unwrap(),
        &SurfaceEdit::select(Utf16Range::new(6, 5))
    );
    h.assert_in_sync();

    // Typing over the widened selection replaces the whole mention.
    h.type_text("x");
    assert_eq!(h.surface.text(), "hello x ");
    assert!(h.span_ranges().is_empty());
    h.assert_in_sync();
}

#[test]
fn caret_at_span_edges_is_not_widened() {
    let mut h = with_alice();
    h.select(Utf16Range::caret(6));
    assert_eq!(h.surface.selection(), Utf16Range::caret(6));
    h.select(Utf16Range::caret(11));
    assert_eq!(h.surface.selection(), Utf16Range::caret(11));
    h.assert_in_sync();
}

#[test]
fn bidi_controls_are_stripped_from_typed_text() {
    let mut h = Harness::new();
    h.type_text("ab");
    h.type_text("\u{202E}cd\u{2066}");
    assert_eq!(h.surface.text(), "abcd");
    assert_eq!(h.surface.selection(), Utf16Range::caret(4));
    h.assert_in_sync();
}

#[test]
fn bidi_filter_can_be_disabled() {
    let mut h = Harness::new();
    h.session = MentionSession::new(
        MentionRegistry::new(MentionOptions::default()),
        TriggerDetector::new('@').unwrap(),
        StaticSuggestions::default(),
        Recorder::default(),
    )
    .with_bidi_filter(false);
    h.type_text("a\u{200F}");
    assert_eq!(h.surface.text(), "a\u{200F}");
    h.assert_in_sync();
}

#[test]
fn two_mentions_stay_ordered() {
    let mut h = with_alice();
    h.type_text("and @b");
    h.accept("bob");
    assert_eq!(h.surface.text(), "hello alice and bob ");
    assert_eq!(
        h.span_ranges(),
        vec![Utf16Range::new(6, 5), Utf16Range::new(16, 3)]
    );

    // A mention accepted before an existing one lands first in the list.
    h.select(Utf16Range::caret(0));
    h.type_text(" ");
    h.select(Utf16Range::caret(0));
    h.type_text("@al");
    h.accept("albert");
    assert_eq!(h.surface.text(), "albert hello alice and bob ");
    assert_eq!(
        h.span_ranges(),
        vec![
            Utf16Range::new(0, 6),
            Utf16Range::new(13, 5),
            Utf16Range::new(23, 3)
        ]
    );
    h.assert_in_sync();
}

#[test]
fn astral_characters_use_utf16_offsets() {
    let mut h = Harness::new();
    h.type_text("🐱 @b");
    h.accept("bob");
    assert_eq!(h.surface.text(), "🐱 bob ");
    assert_eq!(h.span_ranges(), vec![Utf16Range::new(3, 3)]);
    h.assert_in_sync();
}

#[test]
fn reset_drops_mentions_and_hides_list() {
    let mut h = with_alice();
    h.type_text("@b");
    assert!(h.session.suggestions_visible());
    h.session
        .reset(&mut h.surface, EditingContent::with_caret_at_end("fresh"))
        .unwrap();
    assert_eq!(h.surface.text(), "fresh");
    assert!(h.span_ranges().is_empty());
    assert!(!h.session.suggestions_visible());
    h.assert_in_sync();
}
