//! # Scan Event Decoder
//!
//! Turns raw keyboard-wedge input into discrete "code scanned" events.
//!
//! A USB barcode scanner types like a very fast keyboard: the whole code
//! arrives in a burst a few milliseconds apart, usually followed by Enter
//! or Tab. A person typing the same code is an order of magnitude slower.
//! The decoder tells the two apart by inter-character timing only.
//!
//! ## Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Input                                   Result                         │
//! │  ─────                                   ──────                         │
//! │  burst (gaps ≤ burst_gap) + terminator   CodeScanned(code)              │
//! │  burst, then silence ≥ idle_timeout      CodeScanned(code) on tick()    │
//! │  burst, then late char (no tick ran)     old burst emitted first,       │
//! │                                          late char starts a new entry   │
//! │  any gap > burst_gap                     entry becomes MANUAL           │
//! │  manual + terminator                     nothing, text stays pending    │
//! │  manual text, then burst + terminator    CodeScanned(burst), the typed  │
//! │                                          text stays pending             │
//! │  submit()                                CodeScanned(pending), any speed│
//! │  empty / whitespace-only code            nothing                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decoder never blocks and owns no clock. Every arrival carries its own
//! `Instant`, so the same input sequence always decodes the same way.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// =============================================================================
// Timings
// =============================================================================

/// Thresholds that separate scanner bursts from human typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerTimings {
    /// Maximum gap between two characters of one burst.
    pub burst_gap: Duration,
    /// Silence after which an unterminated burst is considered complete.
    pub idle_timeout: Duration,
    /// Shortest unterminated burst that `tick` will emit.
    pub min_burst_len: usize,
}

impl Default for ScannerTimings {
    fn default() -> Self {
        ScannerTimings {
            burst_gap: Duration::from_millis(50),
            idle_timeout: Duration::from_millis(150),
            min_burst_len: 2,
        }
    }
}

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanEvent {
    /// A complete item code, trimmed and non-empty.
    CodeScanned(String),
}

/// Characters that close a scanner burst.
pub fn is_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\t')
}

// =============================================================================
// Decoder
// =============================================================================

/// Synchronous state tracker for one input channel.
#[derive(Debug, Clone)]
pub struct ScanDecoder {
    timings: ScannerTimings,
    buffer: String,
    last_at: Option<Instant>,
    manual: bool,
    /// Byte offset where the current run of fast characters starts.
    run_start: usize,
}

impl ScanDecoder {
    pub fn new(timings: ScannerTimings) -> Self {
        ScanDecoder {
            timings,
            buffer: String::new(),
            last_at: None,
            manual: false,
            run_start: 0,
        }
    }

    pub fn timings(&self) -> ScannerTimings {
        self.timings
    }

    /// Feeds one character that arrived at `at`.
    pub fn feed(&mut self, ch: char, at: Instant) -> Option<ScanEvent> {
        let gap = self.last_at.map(|last| at.saturating_duration_since(last));

        // A burst that outlived the idle timeout is complete even if no
        // tick ran in between.
        if let Some(gap) = gap {
            if self.is_complete_burst() && gap >= self.timings.idle_timeout {
                let flushed = self.take_event();
                let next = self.accept(ch, at, None);
                return flushed.or(next);
            }
        }

        self.accept(ch, at, gap)
    }

    /// Emits an unterminated burst once the channel has been quiet for
    /// `idle_timeout`. Called on a fixed interval; never blocks.
    pub fn tick(&mut self, now: Instant) -> Option<ScanEvent> {
        let last = self.last_at?;
        if self.is_complete_burst() && now.saturating_duration_since(last) >= self.timings.idle_timeout {
            return self.take_event();
        }
        None
    }

    /// Explicit "add" from the operator: emits whatever is pending,
    /// regardless of how fast it was typed.
    pub fn submit(&mut self) -> Option<ScanEvent> {
        self.take_event()
    }

    /// Discards the pending entry.
    pub fn clear(&mut self) {
        self.reset();
    }

    /// Text typed so far, for display.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Whether the pending entry has been classified as human typing.
    pub fn is_manual(&self) -> bool {
        self.manual
    }

    fn accept(&mut self, ch: char, at: Instant, gap: Option<Duration>) -> Option<ScanEvent> {
        let slow = gap.map_or(false, |gap| gap > self.timings.burst_gap);

        if is_terminator(ch) {
            if self.buffer.is_empty() {
                self.last_at = Some(at);
                return None;
            }
            if slow {
                self.manual = true;
                self.last_at = Some(at);
                return None;
            }
            if self.manual {
                self.last_at = Some(at);
                return self.take_trailing_burst();
            }
            return self.take_event();
        }

        if self.buffer.is_empty() {
            self.manual = false;
            self.run_start = 0;
        } else if slow {
            self.manual = true;
            self.run_start = self.buffer.len();
        }
        self.buffer.push(ch);
        self.last_at = Some(at);
        None
    }

    fn is_complete_burst(&self) -> bool {
        !self.manual && self.buffer.chars().count() >= self.timings.min_burst_len
    }

    /// Splits a scanner burst off the end of a manual entry. The typed
    /// prefix stays pending.
    fn take_trailing_burst(&mut self) -> Option<ScanEvent> {
        if self.run_start == 0 {
            return None;
        }
        let run = &self.buffer[self.run_start..];
        if run.chars().count() < self.timings.min_burst_len {
            return None;
        }

        let code = run.trim().to_string();
        self.buffer.truncate(self.run_start);
        self.run_start = self.buffer.len();
        if code.is_empty() {
            None
        } else {
            Some(ScanEvent::CodeScanned(code))
        }
    }

    fn take_event(&mut self) -> Option<ScanEvent> {
        let code = self.buffer.trim().to_string();
        self.reset();
        if code.is_empty() {
            None
        } else {
            Some(ScanEvent::CodeScanned(code))
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.last_at = None;
        self.manual = false;
        self.run_start = 0;
    }
}

impl Default for ScanDecoder {
    fn default() -> Self {
        ScanDecoder::new(ScannerTimings::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Feeds `text` with a fixed gap per character, collecting events.
    fn type_text(
        decoder: &mut ScanDecoder,
        text: &str,
        start: Instant,
        gap: Duration,
    ) -> (Vec<ScanEvent>, Instant) {
        let mut at = start;
        let mut events = Vec::new();
        for ch in text.chars() {
            events.extend(decoder.feed(ch, at));
            at += gap;
        }
        (events, at)
    }

    fn scanned(code: &str) -> ScanEvent {
        ScanEvent::CodeScanned(code.to_string())
    }

    #[test]
    fn test_terminated_burst_emits() {
        let mut decoder = ScanDecoder::default();
        let (events, _) = type_text(&mut decoder, "SHIRT01\n", Instant::now(), ms(5));

        assert_eq!(events, vec![scanned("SHIRT01")]);
        assert_eq!(decoder.pending(), "");
    }

    #[test]
    fn test_every_terminator_closes_a_burst() {
        for terminator in ['\n', '\r', '\t'] {
            let mut decoder = ScanDecoder::default();
            let text = format!("CAP01{}", terminator);
            let (events, _) = type_text(&mut decoder, &text, Instant::now(), ms(3));
            assert_eq!(events, vec![scanned("CAP01")]);
        }
    }

    #[test]
    fn test_double_burst_emits_twice() {
        let mut decoder = ScanDecoder::default();
        let (mut events, at) = type_text(&mut decoder, "A1\n", Instant::now(), ms(4));
        let (more, _) = type_text(&mut decoder, "A1\n", at + ms(300), ms(4));
        events.extend(more);

        assert_eq!(events, vec![scanned("A1"), scanned("A1")]);
    }

    #[test]
    fn test_second_burst_within_30ms_emits_twice() {
        let mut decoder = ScanDecoder::default();
        let (mut events, at) = type_text(&mut decoder, "SHIRT01\n", Instant::now(), ms(4));
        let (more, _) = type_text(&mut decoder, "SHIRT01\n", at - ms(4) + ms(30), ms(4));
        events.extend(more);

        assert_eq!(events, vec![scanned("SHIRT01"), scanned("SHIRT01")]);
        assert_eq!(decoder.pending(), "");
    }

    #[test]
    fn test_burst_after_typed_text_is_split_off() {
        let mut decoder = ScanDecoder::default();
        let (events, at) = type_text(&mut decoder, "AB", Instant::now(), ms(300));
        assert!(events.is_empty());
        assert!(decoder.is_manual());

        let (events, _) = type_text(&mut decoder, "SHIRT01\n", at + ms(400), ms(5));
        assert_eq!(events, vec![scanned("SHIRT01")]);
        assert_eq!(decoder.pending(), "AB");
        assert!(decoder.is_manual());

        assert_eq!(decoder.submit(), Some(scanned("AB")));
    }

    #[test]
    fn test_slow_typing_never_emits() {
        let mut decoder = ScanDecoder::default();
        let (events, at) = type_text(&mut decoder, "A1\n", Instant::now(), ms(200));

        assert!(events.is_empty());
        assert!(decoder.is_manual());
        assert_eq!(decoder.pending(), "A1");
        assert_eq!(decoder.tick(at + ms(1_000)), None);
        assert_eq!(decoder.pending(), "A1");
    }

    #[test]
    fn test_single_slow_char_with_enter_does_not_emit() {
        let mut decoder = ScanDecoder::default();
        let t0 = Instant::now();
        assert_eq!(decoder.feed('7', t0), None);
        assert_eq!(decoder.feed('\n', t0 + ms(120)), None);
        assert_eq!(decoder.pending(), "7");
    }

    #[test]
    fn test_submit_emits_manual_entry() {
        let mut decoder = ScanDecoder::default();
        type_text(&mut decoder, " JEANS-32 ", Instant::now(), ms(250));

        assert_eq!(decoder.submit(), Some(scanned("JEANS-32")));
        assert_eq!(decoder.pending(), "");
        assert_eq!(decoder.submit(), None);
    }

    #[test]
    fn test_tick_emits_unterminated_burst_after_idle() {
        let mut decoder = ScanDecoder::default();
        let (events, at) = type_text(&mut decoder, "890123", Instant::now(), ms(5));
        assert!(events.is_empty());

        let last = at - ms(5);
        assert_eq!(decoder.tick(last + ms(100)), None);
        assert_eq!(decoder.tick(last + ms(150)), Some(scanned("890123")));
        assert_eq!(decoder.tick(last + ms(400)), None);
    }

    #[test]
    fn test_tick_ignores_short_burst() {
        let mut decoder = ScanDecoder::default();
        let t0 = Instant::now();
        decoder.feed('X', t0);
        assert_eq!(decoder.tick(t0 + ms(500)), None);
        assert_eq!(decoder.pending(), "X");
    }

    #[test]
    fn test_late_char_flushes_previous_burst() {
        let mut decoder = ScanDecoder::default();
        let (_, at) = type_text(&mut decoder, "AB12", Instant::now(), ms(5));

        // No tick ran; next scan starts well after the idle timeout
        let event = decoder.feed('C', at + ms(400));
        assert_eq!(event, Some(scanned("AB12")));
        assert_eq!(decoder.pending(), "C");
        assert!(!decoder.is_manual());
    }

    #[test]
    fn test_mid_gap_marks_entry_manual() {
        let mut decoder = ScanDecoder::default();
        let (_, at) = type_text(&mut decoder, "AB", Instant::now(), ms(5));
        decoder.feed('C', at + ms(80));

        assert!(decoder.is_manual());
        assert_eq!(decoder.feed('\n', at + ms(85)), None);
        assert_eq!(decoder.pending(), "ABC");
    }

    #[test]
    fn test_empty_codes_never_emit() {
        let mut decoder = ScanDecoder::default();
        let (events, _) = type_text(&mut decoder, "\n\r\t   \n", Instant::now(), ms(2));
        assert!(events.is_empty());
        assert_eq!(decoder.submit(), None);
    }

    #[test]
    fn test_clear_discards_pending() {
        let mut decoder = ScanDecoder::default();
        type_text(&mut decoder, "ABC", Instant::now(), ms(300));
        decoder.clear();
        assert_eq!(decoder.pending(), "");
        assert!(!decoder.is_manual());
    }
}
