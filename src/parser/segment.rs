//! Command segmentation
//!
//! Splits a raw command string into logical sub-commands and here-document
//! bodies without running a shell. Only boundaries are decided here; the
//! content of each segment is left untouched for the classifiers.
//!
//! Boundaries: `;`, `&&`, `||`, `|`, `|&`, a lone `&`, and newlines, none of
//! which count inside quotes, `$(...)`, `<(...)`, `>(...)`, backticks or
//! `{ ...; }` groups.

/// One logical sub-command, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Trimmed text of the sub-command
    pub text: &'a str,

    /// Byte offset of `text` in the segmented string
    pub offset: usize,

    /// Index of the pipeline this segment belongs to; stages joined by `|`
    /// share an index.
    pub pipeline: usize,

    /// The segment ended inside an open quote, substitution or group
    pub ambiguous: bool,
}

/// Literal text between a here-document opener and its delimiter line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeredocBody<'a> {
    pub text: &'a str,
    pub offset: usize,
    pub delimiter: String,

    /// Index of the segment holding the `<<` opener
    pub segment: usize,

    /// False when the input ended before the delimiter line
    pub terminated: bool,
}

/// Result of segmenting one command string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation<'a> {
    pub segments: Vec<Segment<'a>>,
    pub heredocs: Vec<HeredocBody<'a>>,
}

#[derive(Debug)]
struct PendingHeredoc {
    delimiter: String,
    strip_tabs: bool,
    segment: usize,
}

/// Split `command` into segments and here-document bodies.
pub fn segment_command(command: &str) -> Segmentation<'_> {
    Segmenter::new(command).run()
}

struct Segmenter<'a> {
    src: &'a str,
    bytes: &'a [u8],
    out: Segmentation<'a>,
    start: usize,
    pipeline: usize,
    quote: Option<u8>,
    parens: usize,
    braces: usize,
    backtick: bool,
    pending: Vec<PendingHeredoc>,
}

impl<'a> Segmenter<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            out: Segmentation::default(),
            start: 0,
            pipeline: 0,
            quote: None,
            parens: 0,
            braces: 0,
            backtick: false,
            pending: Vec::new(),
        }
    }

    fn nested(&self) -> bool {
        self.parens > 0 || self.braces > 0 || self.backtick
    }

    fn run(mut self) -> Segmentation<'a> {
        let len = self.bytes.len();
        let mut i = 0;

        while i < len {
            let b = self.bytes[i];

            match self.quote {
                Some(b'\'') => {
                    if b == b'\'' {
                        self.quote = None;
                    }
                    i += 1;
                    continue;
                }
                // $'...' honours backslash escapes, so `\'` does not close it
                Some(b'$') => {
                    match b {
                        b'\\' => i += 1,
                        b'\'' => self.quote = None,
                        _ => {}
                    }
                    i += 1;
                    continue;
                }
                Some(_) => {
                    match b {
                        b'\\' => i += 1,
                        b'"' => self.quote = None,
                        _ => {}
                    }
                    i += 1;
                    continue;
                }
                None => {}
            }

            match b {
                b'\\' => i += 2,
                b'$' if self.bytes.get(i + 1) == Some(&b'\'') => {
                    self.quote = Some(b'$');
                    i += 2;
                }
                b'\'' | b'"' => {
                    self.quote = Some(b);
                    i += 1;
                }
                b'`' => {
                    self.backtick = !self.backtick;
                    i += 1;
                }
                b'(' => {
                    self.parens += 1;
                    i += 1;
                }
                b')' => {
                    self.parens = self.parens.saturating_sub(1);
                    i += 1;
                }
                b'{' if self.opens_group(i) => {
                    self.braces += 1;
                    i += 1;
                }
                b'}' if self.closes_group(i) => {
                    self.braces = self.braces.saturating_sub(1);
                    i += 1;
                }
                b'#' if self.at_word_start(i) => {
                    // Comment text never opens quotes or adds boundaries.
                    i = self.src[i..].find('\n').map_or(len, |n| i + n);
                }
                b'<' if self.heredoc_opener(i) => {
                    i = self.read_heredoc_opener(i + 2);
                }
                b'\n' if !self.pending.is_empty() && !self.nested() => {
                    self.close(i);
                    i = self.read_heredoc_bodies(i + 1);
                    self.start = i;
                    self.pipeline += 1;
                }
                _ if self.nested() => i += 1,
                b';' | b'\n' => {
                    self.close(i);
                    self.pipeline += 1;
                    i += 1;
                    self.start = i;
                }
                b'&' => {
                    let next = self.bytes.get(i + 1).copied();
                    let prev = if i > 0 { Some(self.bytes[i - 1]) } else { None };
                    if next == Some(b'&') {
                        self.close(i);
                        self.pipeline += 1;
                        i += 2;
                        self.start = i;
                    } else if matches!(prev, Some(b'>') | Some(b'<')) || next == Some(b'>') {
                        // >&2, <&0, &>file
                        i += 1;
                    } else {
                        self.close(i);
                        self.pipeline += 1;
                        i += 1;
                        self.start = i;
                    }
                }
                b'|' => {
                    let next = self.bytes.get(i + 1).copied();
                    let prev = if i > 0 { Some(self.bytes[i - 1]) } else { None };
                    if next == Some(b'|') {
                        self.close(i);
                        self.pipeline += 1;
                        i += 2;
                        self.start = i;
                    } else if prev == Some(b'>') {
                        // >| clobber redirection
                        i += 1;
                    } else {
                        self.close(i);
                        i += if next == Some(b'&') { 2 } else { 1 };
                        self.start = i;
                    }
                }
                _ => i += 1,
            }
        }

        let ambiguous = self.quote.is_some() || self.nested();
        self.push(self.start, len, ambiguous);
        self.out
    }

    fn close(&mut self, end: usize) {
        self.push(self.start, end, false);
    }

    fn push(&mut self, start: usize, end: usize, ambiguous: bool) {
        let end = end.min(self.bytes.len());
        if start >= end {
            return;
        }
        let raw = &self.src[start..end];
        let text = raw.trim();
        if text.is_empty() {
            return;
        }
        let lead = raw.len() - raw.trim_start().len();
        self.out.segments.push(Segment {
            text,
            offset: start + lead,
            pipeline: self.pipeline,
            ambiguous,
        });
    }

    fn at_word_start(&self, i: usize) -> bool {
        i == 0
            || matches!(
                self.bytes[i - 1],
                b' ' | b'\t' | b'\n' | b';' | b'&' | b'|' | b'('
            )
    }

    fn opens_group(&self, i: usize) -> bool {
        let before = i == 0
            || matches!(
                self.bytes[i - 1],
                b' ' | b'\t' | b'\n' | b';' | b'&' | b'|' | b'(' | b')'
            );
        let after = self
            .bytes
            .get(i + 1)
            .map_or(true, |b| matches!(b, b' ' | b'\t' | b'\n'));
        before && after
    }

    fn closes_group(&self, i: usize) -> bool {
        if self.braces == 0 {
            return false;
        }
        let before = i > 0 && matches!(self.bytes[i - 1], b' ' | b'\t' | b'\n' | b';');
        let after = self.bytes.get(i + 1).map_or(true, |b| {
            matches!(b, b' ' | b'\t' | b'\n' | b';' | b'&' | b'|' | b')')
        });
        before && after
    }

    /// `<<` that is neither part of `<<<` nor inside a substitution.
    fn heredoc_opener(&self, i: usize) -> bool {
        self.bytes.get(i + 1) == Some(&b'<')
            && self.bytes.get(i + 2) != Some(&b'<')
            && (i == 0 || self.bytes[i - 1] != b'<')
            && !self.nested()
    }

    /// Parse `[-][ ]DELIM` after `<<`, register it, return the next index.
    fn read_heredoc_opener(&mut self, mut i: usize) -> usize {
        let len = self.bytes.len();
        let strip_tabs = self.bytes.get(i) == Some(&b'-');
        if strip_tabs {
            i += 1;
        }
        while i < len && matches!(self.bytes[i], b' ' | b'\t') {
            i += 1;
        }

        let mut delimiter = String::new();
        let mut quote: Option<u8> = None;
        let word_start = i;
        while i < len {
            let b = self.bytes[i];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'\'' | b'"' => quote = Some(b),
                    b'\\' => {}
                    b' ' | b'\t' | b'\n' | b';' | b'&' | b'|' | b'<' | b'>' | b'(' | b')' => break,
                    _ => {}
                },
            }
            i += 1;
        }
        for c in self.src[word_start..i].chars() {
            if !matches!(c, '\'' | '"' | '\\') {
                delimiter.push(c);
            }
        }

        if !delimiter.is_empty() {
            self.pending.push(PendingHeredoc {
                delimiter,
                strip_tabs,
                segment: self.out.segments.len(),
            });
        }
        i
    }

    /// Consume the bodies of all pending here-documents starting at `pos`,
    /// returning the index just past the last delimiter line.
    fn read_heredoc_bodies(&mut self, mut pos: usize) -> usize {
        let len = self.bytes.len();
        for pending in std::mem::take(&mut self.pending) {
            let body_start = pos.min(len);
            let mut body_end = None;

            while pos < len {
                let line_end = self.src[pos..].find('\n').map_or(len, |n| pos + n);
                let line = self.src[pos..line_end].trim_end_matches('\r');
                let line = if pending.strip_tabs {
                    line.trim_start_matches('\t')
                } else {
                    line
                };
                if line == pending.delimiter {
                    body_end = Some(pos);
                    pos = (line_end + 1).min(len);
                    break;
                }
                pos = (line_end + 1).min(len);
                if line_end == len {
                    break;
                }
            }

            let terminated = body_end.is_some();
            let end = body_end.unwrap_or(len);
            let text = self.src[body_start..end.max(body_start)].trim_end_matches('\n');
            self.out.heredocs.push(HeredocBody {
                text,
                offset: body_start,
                delimiter: pending.delimiter,
                segment: pending.segment,
                terminated,
            });
        }
        pos
    }
}
