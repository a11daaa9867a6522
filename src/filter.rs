// src/filter.rs

//! Extract benchmark output from a mixed transport/provisioning stream.
//!
//! Both modes are pure, line-oriented and infallible: a stream without
//! markers simply yields nothing.

/// Line that opens the capture window.
pub const SENTINEL_START: &str = "BENCHMARK_START";
/// Line that closes the capture window.
pub const SENTINEL_END: &str = "BENCHMARK_END";
/// Tag prefixed to every line of program output on a provisioned instance.
pub const OUTPUT_TAG: &str = "Remote-Output:";

/// Progress narration from the provisioning engine.
const NOISE_MARKERS: &[&str] = &["Still creating"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFilter {
    /// Keep lines between the start/end sentinels.
    Sentinel,
    /// Keep only lines carrying [`OUTPUT_TAG`].
    TagOnly,
}

impl OutputFilter {
    pub fn apply(self, raw: &[u8]) -> Vec<u8> {
        match self {
            OutputFilter::Sentinel => filter_sentinel(raw),
            OutputFilter::TagOnly => filter_tagged(raw),
        }
    }
}

/// Keep lines inside the `BENCHMARK_START`/`BENCHMARK_END` window.
///
/// Within the window a literal output tag is stripped and provisioning
/// noise is dropped.
pub fn filter_sentinel(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut capturing = false;

    for line in lines(raw) {
        if contains(line, SENTINEL_START.as_bytes()) {
            capturing = true;
            continue;
        }
        if contains(line, SENTINEL_END.as_bytes()) {
            capturing = false;
            continue;
        }
        if !capturing || is_noise(line) {
            continue;
        }
        let line = match find(line, OUTPUT_TAG.as_bytes()) {
            Some(idx) => {
                let mut stripped = line[..idx].to_vec();
                stripped.extend_from_slice(after_tag(line, idx));
                stripped
            }
            None => line.to_vec(),
        };
        out.extend_from_slice(&line);
        out.push(b'\n');
    }

    out
}

/// Keep only the text following the output tag on tagged lines.
pub fn filter_tagged(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for line in lines(raw) {
        if let Some(idx) = find(line, OUTPUT_TAG.as_bytes()) {
            out.extend_from_slice(after_tag(line, idx));
            out.push(b'\n');
        }
    }
    out
}

/// Split on `\n`, dropping a trailing `\r` and the empty remainder after a
/// final newline.
fn lines(raw: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = raw.strip_suffix(b"\n").unwrap_or(raw);
    let empty = raw.is_empty();
    body.split(|b| *b == b'\n')
        .filter(move |_| !empty)
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

/// Text after the tag at `idx`, minus the single separating space.
fn after_tag(line: &[u8], idx: usize) -> &[u8] {
    let rest = &line[idx + OUTPUT_TAG.len()..];
    rest.strip_prefix(b" ").unwrap_or(rest)
}

fn is_noise(line: &[u8]) -> bool {
    NOISE_MARKERS.iter().any(|m| contains(line, m.as_bytes()))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
