//! SubRip caption output for an export timeline.

use super::timeline::TimelineSegment;

/// Formats milliseconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Negative inputs keep their sign marker but render a zero magnitude.
pub fn ms_to_srt_time(ms: f64) -> String {
    let sign = if ms < 0.0 { "-" } else { "" };
    let mut rest = ms.floor().max(0.0) as u64;

    let hours = rest / 3_600_000;
    rest -= hours * 3_600_000;
    let minutes = rest / 60_000;
    rest -= minutes * 60_000;
    let seconds = rest / 1000;
    let millis = rest - seconds * 1000;

    format!("{sign}{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Builds one cue per segment, numbered from 1, using the matching caption text.
pub fn build_srt<S: AsRef<str>>(segments: &[TimelineSegment], texts: &[Option<S>]) -> String {
    let mut lines = Vec::with_capacity(segments.len() * 4);
    for (i, segment) in segments.iter().enumerate() {
        let text = texts
            .get(i)
            .and_then(|t| t.as_ref())
            .map(|t| AsRef::<str>::as_ref(t).trim())
            .unwrap_or("");
        lines.push((i + 1).to_string());
        lines.push(format!(
            "{} --> {}",
            ms_to_srt_time(segment.start_ms),
            ms_to_srt_time(segment.end_ms())
        ));
        lines.push(text.to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(index: u32, start_ms: f64, duration_ms: f64) -> TimelineSegment {
        TimelineSegment {
            index,
            start_ms,
            duration_ms,
        }
    }

    #[test]
    fn formats_timestamps() {
        assert_eq!(ms_to_srt_time(0.0), "00:00:00,000");
        assert_eq!(ms_to_srt_time(1700.9), "00:00:01,700");
        assert_eq!(ms_to_srt_time(3_723_045.0), "01:02:03,045");
        assert_eq!(ms_to_srt_time(-250.0), "-00:00:00,000");
    }

    #[test]
    fn one_cue_per_segment() {
        let segments = [
            segment(1, 0.0, 1000.0),
            segment(2, 700.0, 1000.0),
            segment(3, 1400.0, 800.0),
        ];
        let srt = build_srt(&segments, &[Some("Hello"), Some(" World "), None]);
        let expected = "1\n00:00:00,000 --> 00:00:01,000\nHello\n\n\
                        2\n00:00:00,700 --> 00:00:01,700\nWorld\n\n\
                        3\n00:00:01,400 --> 00:00:02,200\n\n";
        assert_eq!(srt, expected);
    }

    #[test]
    fn missing_texts_leave_empty_cues() {
        let srt = build_srt::<&str>(&[segment(1, 0.0, 500.0)], &[]);
        assert_eq!(srt, "1\n00:00:00,000 --> 00:00:00,500\n\n");
    }
}
