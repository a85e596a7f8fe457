#![allow(unused_assignments)]

//! Line parsers for broadcast logs, lattice configs and lattice outputs.

use std::path::Path;
use std::str::FromStr;

use logaudit_trace::lattice::value_set;
use logaudit_trace::{BroadcastEvent, BroadcastLog, LatticeConfig, ProcessIndex, ValueSet};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PROTOCOL_BROADCAST: &str = "broadcast";
pub const PROTOCOL_LATTICE: &str = "lattice";
pub const PROTOCOL_KINDS: [&str; 2] = [PROTOCOL_BROADCAST, PROTOCOL_LATTICE];

/// Protocol class a run directory was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolKind {
    Broadcast,
    Lattice,
}

impl ProtocolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolKind::Broadcast => PROTOCOL_BROADCAST,
            ProtocolKind::Lattice => PROTOCOL_LATTICE,
        }
    }
}

impl FromStr for ProtocolKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            PROTOCOL_BROADCAST => Ok(ProtocolKind::Broadcast),
            PROTOCOL_LATTICE => Ok(ProtocolKind::Lattice),
            other => Err(format!(
                "unknown protocol '{other}', expected one of: {}",
                PROTOCOL_KINDS.join(", ")
            )),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("{file}:{line}: malformed log line: {message}")]
    #[diagnostic(
        code(logaudit::parse::malformed_log_line),
        help("broadcast lines are `b <msgId>` or `d <senderId> <msgId>` with positive integers")
    )]
    MalformedLogLine {
        file: String,
        line: usize,
        message: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("{file}:{line}: malformed config line: {message}")]
    #[diagnostic(
        code(logaudit::parse::malformed_config_line),
        help("the first config line is `<requiredAgreementRounds> <maxRounds>`")
    )]
    MalformedConfigLine {
        file: String,
        line: usize,
        message: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

impl ParseError {
    /// 1-based line the error points at.
    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedLogLine { line, .. }
            | ParseError::MalformedConfigLine { line, .. } => *line,
        }
    }
}

/// Lines of `raw` with their 1-based number and byte span.
fn spanned_lines(raw: &str) -> impl Iterator<Item = (usize, &str, SourceSpan)> {
    let mut offset = 0usize;
    raw.split_inclusive('\n').enumerate().map(move |(i, chunk)| {
        let text = chunk.trim_end_matches(['\n', '\r']);
        let span = SourceSpan::from((offset, text.len()));
        offset += chunk.len();
        (i + 1, text, span)
    })
}

fn positive_int(token: &str, what: &str) -> Result<u64, String> {
    match token.parse::<u64>() {
        Ok(0) => Err(format!("{what} must be positive, got 0")),
        Ok(v) => Ok(v),
        Err(_) => Err(format!("{what} '{token}' is not an integer")),
    }
}

fn parse_event(tokens: &[&str]) -> Result<BroadcastEvent, String> {
    match tokens {
        ["b", msg] => Ok(BroadcastEvent::Broadcast {
            msg_id: positive_int(msg, "msgId")?,
        }),
        ["d", sender, msg] => Ok(BroadcastEvent::Deliver {
            sender: positive_int(sender, "senderId")?,
            msg_id: positive_int(msg, "msgId")?,
        }),
        ["b", ..] => Err(format!(
            "broadcast line takes 1 argument, got {}",
            tokens.len() - 1
        )),
        ["d", ..] => Err(format!(
            "delivery line takes 2 arguments, got {}",
            tokens.len() - 1
        )),
        [other, ..] => Err(format!("unrecognized event type '{other}'")),
        [] => Err("empty line".into()),
    }
}

/// Parse the contents of one broadcast `.output` file. Blank lines are skipped.
pub fn parse_broadcast_log(
    process: ProcessIndex,
    source: &Path,
    raw: &str,
) -> Result<BroadcastLog, ParseError> {
    let file = source.display().to_string();
    let mut log = BroadcastLog::new(process, source);
    for (line, text, span) in spanned_lines(raw) {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let event = parse_event(&tokens).map_err(|message| ParseError::MalformedLogLine {
            file: file.clone(),
            line,
            message,
            span,
            src: NamedSource::new(file.clone(), raw.to_owned()),
        })?;
        log.push(line, event);
    }
    Ok(log)
}

/// Parse the contents of one lattice `.config` file.
pub fn parse_lattice_config(source: &Path, raw: &str) -> Result<LatticeConfig, ParseError> {
    let file = source.display().to_string();
    let malformed = |line: usize, span: SourceSpan, message: String| {
        ParseError::MalformedConfigLine {
            file: file.clone(),
            line,
            message,
            span,
            src: NamedSource::new(file.clone(), raw.to_owned()),
        }
    };

    let mut lines = spanned_lines(raw);
    let Some((line, header, span)) = lines.next() else {
        return Err(malformed(
            1,
            SourceSpan::from((0, 0)),
            "config file is empty".into(),
        ));
    };
    let header_tokens: Vec<&str> = header.split_whitespace().collect();
    // Tokens after the first two are ignored.
    let [required, max, ..] = header_tokens.as_slice() else {
        return Err(malformed(
            line,
            span,
            format!(
                "header needs at least 2 integers, got {} token(s)",
                header_tokens.len()
            ),
        ));
    };
    let required_agreement_rounds = required.parse::<usize>().map_err(|_| {
        malformed(
            line,
            span,
            format!("requiredAgreementRounds '{required}' is not an integer"),
        )
    })?;
    let max_rounds = max
        .parse::<usize>()
        .map_err(|_| malformed(line, span, format!("maxRounds '{max}' is not an integer")))?;

    Ok(LatticeConfig {
        required_agreement_rounds,
        max_rounds,
        proposals: lines.map(|(_, text, _)| value_set(text)).collect(),
    })
}

/// Parse the contents of one lattice `.output` file: one decided set per line.
pub fn parse_lattice_output(raw: &str) -> Vec<ValueSet> {
    raw.lines().map(value_set).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use logaudit_trace::LatticeValue;

    fn parse(raw: &str) -> Result<BroadcastLog, ParseError> {
        parse_broadcast_log(ProcessIndex(0), Path::new("1.output"), raw)
    }

    #[test]
    fn parses_broadcast_and_delivery_lines() {
        let log = parse("b 1\nd 2 1\n\nb 2\n").unwrap();
        let events: Vec<_> = log.events.iter().map(|e| (e.line, e.event)).collect();
        assert_eq!(
            events,
            vec![
                (1, BroadcastEvent::Broadcast { msg_id: 1 }),
                (
                    2,
                    BroadcastEvent::Deliver {
                        sender: 2,
                        msg_id: 1
                    }
                ),
                (4, BroadcastEvent::Broadcast { msg_id: 2 }),
            ]
        );
    }

    #[test]
    fn unknown_event_type_is_malformed() {
        let err = parse("b 1\nx 3\n").unwrap_err();
        assert_eq!(err.line(), 2);
        assert!(err.to_string().contains("unrecognized event type 'x'"));
    }

    #[test]
    fn non_integer_and_zero_ids_are_malformed() {
        assert!(parse("b one\n").is_err());
        assert!(parse("d 0 1\n").is_err());
        assert!(parse("d 1 -2\n").is_err());
    }

    #[test]
    fn wrong_arity_is_malformed() {
        let err = parse("d 1\n").unwrap_err();
        assert!(err.to_string().contains("takes 2 arguments, got 1"));
        assert!(parse("b 1 2\n").is_err());
    }

    #[test]
    fn malformed_span_points_at_offending_line() {
        let err = parse("b 1\nzz\n").unwrap_err();
        match err {
            ParseError::MalformedLogLine { span, .. } => {
                assert_eq!(span.offset(), 4);
                assert_eq!(span.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn config_header_and_proposals() {
        let cfg = parse_lattice_config(Path::new("p.config"), "2 5\na b\nb c b\n").unwrap();
        assert_eq!(cfg.required_agreement_rounds, 2);
        assert_eq!(cfg.max_rounds, 5);
        assert_eq!(cfg.proposals.len(), 2);
        assert!(cfg.proposals[1].contains(&LatticeValue::from("c")));
        assert_eq!(cfg.proposals[1].len(), 2);
    }

    #[test]
    fn config_header_must_hold_two_integers() {
        assert!(parse_lattice_config(Path::new("p.config"), "").is_err());
        assert!(parse_lattice_config(Path::new("p.config"), "2\n").is_err());
        assert!(parse_lattice_config(Path::new("p.config"), "2 x\n").is_err());
    }

    #[test]
    fn config_header_ignores_trailing_tokens() {
        let cfg = parse_lattice_config(Path::new("1.config"), "2 5 7\na b\nb c\n").unwrap();
        assert_eq!(cfg.required_agreement_rounds, 2);
        assert_eq!(cfg.max_rounds, 5);
        assert_eq!(cfg.proposals.len(), 2);
    }

    #[test]
    fn blank_output_line_is_an_empty_round() {
        let rounds = parse_lattice_output("1 2\n\n3\n");
        assert_eq!(rounds.len(), 3);
        assert!(rounds[1].is_empty());
    }

    #[test]
    fn protocol_kind_round_trips_names() {
        for name in PROTOCOL_KINDS {
            assert_eq!(name.parse::<ProtocolKind>().unwrap().as_str(), name);
        }
        assert!("paxos".parse::<ProtocolKind>().is_err());
    }
}
