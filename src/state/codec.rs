//! Line-oriented state file format.
//!
//! ```text
//! kv:<key>=<value>      variable; the first '=' separates key from value
//! h:<command>           one history entry, oldest first
//! hint:<integer>        puzzle progression marker; last one wins
//! ```
//!
//! The file is read at boot, where refusing to load is worse than losing a
//! line, so unrecognised lines are skipped and reported rather than rejected.
//! Only a `hint:` value that is not a non-negative integer is an error.

use log::warn;

use super::State;
use crate::error::StateError;

const KV_PREFIX: &str = "kv:";
const HISTORY_PREFIX: &str = "h:";
const HINT_PREFIX: &str = "hint:";

/// Result of decoding, with the lines that were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    pub state: State,
    /// 1-based numbers of non-blank lines matching no directive.
    pub skipped_lines: Vec<usize>,
}

impl DecodeReport {
    pub fn skipped(&self) -> usize {
        self.skipped_lines.len()
    }

    pub fn log_skipped(&self) {
        for line in &self.skipped_lines {
            warn!("state line {} not recognised; skipped", line);
        }
    }
}

/// Decode a state buffer.
pub fn decode(bytes: &[u8]) -> Result<State, StateError> {
    decode_report(bytes).map(|report| report.state)
}

/// Decode a state buffer, reporting which lines were skipped.
///
/// Lines end at `\n` only. A `\r` before it stays part of the value, so
/// encoded text round-trips exactly; only `hint:` values are trimmed.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn decode_report(bytes: &[u8]) -> Result<DecodeReport, StateError> {
    let text = String::from_utf8_lossy(bytes);
    let mut state = State::new();
    let mut skipped_lines = Vec::new();

    for (index, line) in text.split('\n').enumerate() {
        let number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(KV_PREFIX) {
            match rest.split_once('=') {
                Some((key, value)) => {
                    state.variables.insert(key, value);
                }
                None => skipped_lines.push(number),
            }
        } else if let Some(command) = line.strip_prefix(HISTORY_PREFIX) {
            state.history.push(command.to_string());
        } else if let Some(value) = line.strip_prefix(HINT_PREFIX) {
            state.hint_level = value
                .trim()
                .parse()
                .map_err(|_| StateError::InvalidHint {
                    line: number,
                    value: value.to_string(),
                })?;
        } else {
            skipped_lines.push(number);
        }
    }

    Ok(DecodeReport {
        state,
        skipped_lines,
    })
}

/// Encode a state as `kv:` lines, then `h:` lines, then one `hint:` line.
///
/// Values are written verbatim. Keys must not contain `=` and no field may
/// contain `\n` for the output to decode back to the same state.
pub fn encode(state: &State) -> Vec<u8> {
    let mut out = String::new();
    for (key, value) in state.variables.iter() {
        out.push_str(KV_PREFIX);
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    for command in &state.history {
        out.push_str(HISTORY_PREFIX);
        out.push_str(command);
        out.push('\n');
    }
    out.push_str(HINT_PREFIX);
    out.push_str(&state.hint_level.to_string());
    out.push('\n');
    out.into_bytes()
}
