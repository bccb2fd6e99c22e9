//! Parsing the raw OLIVE workflow report.
//!
//! `olivepyworkflow` prints a few banner lines to stdout before the actual
//! JSON document, and the document itself is an array wrapping a single
//! report. Everything here fails closed: a report that does not match the
//! expected shape exactly is [`Error::MalformedReport`], and the caller skips
//! that file rather than shipping a half-parsed transcript.

use courier_transcript::{SpeakerInterval, SpeakerTimeline, TimeSpan, Utterance};

use crate::error::Error;

/// Banner lines the engine writes before the JSON document.
pub const REPORT_PREAMBLE_LINES: usize = 3;

#[derive(Debug, Clone, serde::Deserialize)]
struct RawReport {
    data: Vec<ReportData>,
    tasks: ReportTasks,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct ReportData {
    data_id: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct ReportTasks {
    #[serde(rename = "ASR")]
    asr: Vec<TaskReport>,
    #[serde(rename = "SDD")]
    sdd: Vec<TaskReport>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct TaskReport {
    analysis: Analysis,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct Analysis {
    region: Vec<Region>,
}

/// One scored region. For the ASR task `class_id` carries the utterance
/// text; for the SDD task it carries the speaker label.
#[derive(Debug, Clone, serde::Deserialize)]
struct Region {
    start_t: f64,
    end_t: f64,
    class_id: String,
}

/// The two streams of one report, converted into fusion inputs.
#[derive(Debug, Clone)]
pub struct EngineReport {
    pub data_id: String,
    pub utterances: Vec<Utterance>,
    pub timeline: SpeakerTimeline,
}

/// Parses raw engine stdout (banner included) into an [`EngineReport`].
pub fn parse_report(raw: &str) -> Result<EngineReport, Error> {
    let body = strip_preamble(raw);

    let reports: Vec<RawReport> =
        serde_json::from_str(body).map_err(|e| Error::MalformedReport {
            reason: format!("not a report array: {e}"),
        })?;
    let report = reports.into_iter().next().ok_or_else(|| Error::MalformedReport {
        reason: "report array is empty".to_string(),
    })?;

    let data = report
        .data
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedReport {
            reason: "data is empty".to_string(),
        })?;
    let asr = take_task(report.tasks.asr, "ASR")?;
    let sdd = take_task(report.tasks.sdd, "SDD")?;

    let mut utterances = Vec::with_capacity(asr.analysis.region.len());
    for region in asr.analysis.region {
        utterances.push(Utterance {
            span: validated_span(&region)?,
            text: region.class_id,
        });
    }

    let mut intervals = Vec::with_capacity(sdd.analysis.region.len());
    for region in sdd.analysis.region {
        intervals.push(SpeakerInterval {
            span: validated_span(&region)?,
            speaker: region.class_id,
        });
    }

    Ok(EngineReport {
        data_id: data.data_id,
        utterances,
        timeline: SpeakerTimeline::new(intervals),
    })
}

fn strip_preamble(raw: &str) -> &str {
    // Everything after the third newline; with fewer newlines the remainder
    // is whatever is left, and the json parse decides if it is usable.
    raw.splitn(REPORT_PREAMBLE_LINES + 1, '\n')
        .last()
        .unwrap_or("")
}

fn take_task(mut tasks: Vec<TaskReport>, name: &str) -> Result<TaskReport, Error> {
    if tasks.is_empty() {
        return Err(Error::MalformedReport {
            reason: format!("tasks.{name} is empty"),
        });
    }
    Ok(tasks.swap_remove(0))
}

fn validated_span(region: &Region) -> Result<TimeSpan, Error> {
    if !region.start_t.is_finite() || !region.end_t.is_finite() {
        return Err(Error::MalformedReport {
            reason: format!(
                "non-finite region bounds ({}, {})",
                region.start_t, region.end_t
            ),
        });
    }
    if region.start_t < 0.0 {
        return Err(Error::MalformedReport {
            reason: format!("negative region start {}", region.start_t),
        });
    }
    if region.end_t < region.start_t {
        return Err(Error::MalformedReport {
            reason: format!("region ends ({}) before it starts ({})", region.end_t, region.start_t),
        });
    }
    Ok(TimeSpan::new(region.start_t, region.end_t))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "OLIVE workflow starting\nconnected to localhost:5588\nworkflow complete\n";

    fn report_json() -> String {
        r#"[{
          "data": [{"data_id": "meeting.wav"}],
          "tasks": {
            "ASR": [{"analysis": {"region": [
              {"start_t": 0.0, "end_t": 2.5, "class_id": "good morning"},
              {"start_t": 2.5, "end_t": 4.0, "class_id": "hi there"}
            ]}}],
            "SDD": [{"analysis": {"region": [
              {"start_t": 2.4, "end_t": 6.0, "class_id": "speaker2"},
              {"start_t": 0.0, "end_t": 2.4, "class_id": "speaker1"}
            ]}}]
          }
        }]"#
            .to_string()
    }

    fn with_banner(json: &str) -> String {
        format!("{BANNER}{json}")
    }

    #[test]
    fn parses_a_full_report() {
        let report = parse_report(&with_banner(&report_json())).unwrap();
        assert_eq!(report.data_id, "meeting.wav");

        let texts: Vec<&str> = report.utterances.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["good morning", "hi there"]);
        assert_eq!(report.utterances[0].span, TimeSpan::new(0.0, 2.5));

        // SDD regions arrived out of order; the timeline sorts them.
        let speakers: Vec<&str> = report
            .timeline
            .intervals()
            .iter()
            .map(|i| i.speaker.as_str())
            .collect();
        assert_eq!(speakers, vec!["speaker1", "speaker2"]);
    }

    #[test]
    fn parses_single_line_document_without_banner() {
        // With fewer than three newlines in the input, the remainder after
        // the last split is the whole document.
        let json = r#"[{"data":[{"data_id":"a.wav"}],"tasks":{"ASR":[{"analysis":{"region":[]}}],"SDD":[{"analysis":{"region":[]}}]}}]"#;
        let report = parse_report(json).unwrap();
        assert_eq!(report.data_id, "a.wav");
    }

    #[test]
    fn rejects_non_array_document() {
        let err = parse_report(&with_banner(r#"{"data": []}"#)).unwrap_err();
        assert!(err.is_malformed_report());
    }

    #[test]
    fn rejects_empty_report_array() {
        let err = parse_report(&with_banner("[]")).unwrap_err();
        assert!(err.is_malformed_report());
    }

    #[test]
    fn rejects_missing_sdd_task() {
        let json = r#"[{
          "data": [{"data_id": "a.wav"}],
          "tasks": {"ASR": [{"analysis": {"region": []}}]}
        }]"#;
        let err = parse_report(&with_banner(json)).unwrap_err();
        assert!(err.is_malformed_report());
    }

    #[test]
    fn rejects_empty_task_list() {
        let json = r#"[{
          "data": [{"data_id": "a.wav"}],
          "tasks": {"ASR": [], "SDD": [{"analysis": {"region": []}}]}
        }]"#;
        let err = parse_report(&with_banner(json)).unwrap_err();
        assert!(err.is_malformed_report());
    }

    #[test]
    fn rejects_missing_data_id() {
        let json = r#"[{
          "data": [],
          "tasks": {
            "ASR": [{"analysis": {"region": []}}],
            "SDD": [{"analysis": {"region": []}}]
          }
        }]"#;
        let err = parse_report(&with_banner(json)).unwrap_err();
        assert!(err.is_malformed_report());
    }

    #[test]
    fn rejects_reversed_region() {
        let json = r#"[{
          "data": [{"data_id": "a.wav"}],
          "tasks": {
            "ASR": [{"analysis": {"region": [
              {"start_t": 5.0, "end_t": 1.0, "class_id": "backwards"}
            ]}}],
            "SDD": [{"analysis": {"region": []}}]
          }
        }]"#;
        let err = parse_report(&with_banner(json)).unwrap_err();
        assert!(err.is_malformed_report());
    }

    #[test]
    fn rejects_negative_region_start() {
        let json = r#"[{
          "data": [{"data_id": "a.wav"}],
          "tasks": {
            "ASR": [{"analysis": {"region": []}}],
            "SDD": [{"analysis": {"region": [
              {"start_t": -0.5, "end_t": 1.0, "class_id": "speaker1"}
            ]}}]
          }
        }]"#;
        let err = parse_report(&with_banner(json)).unwrap_err();
        assert!(err.is_malformed_report());
    }

    #[test]
    fn rejects_garbage_after_banner() {
        let err = parse_report("one\ntwo\nthree\nnot json at all").unwrap_err();
        assert!(err.is_malformed_report());
    }

    #[test]
    fn empty_regions_parse_to_empty_streams() {
        let json = r#"[{
          "data": [{"data_id": "silent.wav"}],
          "tasks": {
            "ASR": [{"analysis": {"region": []}}],
            "SDD": [{"analysis": {"region": []}}]
          }
        }]"#;
        let report = parse_report(&with_banner(json)).unwrap();
        assert!(report.utterances.is_empty());
        assert!(report.timeline.is_empty());
    }
}
