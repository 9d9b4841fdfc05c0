//! Checkpoint record and its textual format.
//!
//! ## Format
//!
//! ```text
//! 6\n
//! 12 13 14 15 16 \n
//! ```
//!
//! Line 1 is the iteration counter. Line 2 holds the data vector as
//! whitespace-separated integers; the writer emits a trailing separator
//! before the newline and the reader tolerates any trailing whitespace.
//! The format is meant to be inspected by hand.

use std::fmt;

use thiserror::Error;

/// Stable rank of a participant within its group.
///
/// Assigned by the launcher before the participant starts and identical
/// across restarts, so it doubles as the storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantId(pub u32);

impl ParticipantId {
    /// The rank as a `usize`, for indexing.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ParticipantId {
    fn from(rank: u32) -> Self {
        Self(rank)
    }
}

/// Why a stored record could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordParseError {
    /// The record is empty.
    #[error("missing iteration line")]
    MissingIteration,

    /// Line 1 is not a non-negative integer.
    #[error("invalid iteration {0:?}")]
    InvalidIteration(String),

    /// There is no data line after the iteration.
    #[error("missing data line")]
    MissingData,

    /// A data token is not an integer.
    #[error("invalid data value {token:?} at position {position}")]
    InvalidValue {
        /// Zero-based index of the token in the data line.
        position: usize,
        /// The offending token.
        token: String,
    },

    /// Non-blank content after the data line.
    #[error("unexpected content after data line")]
    TrailingContent,
}

/// The durable `(iteration, data vector)` snapshot of one participant.
///
/// Iteration and data always travel together so a reload yields a state
/// that really existed during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointRecord {
    /// Owner of the record. Only the owner writes or reads it.
    pub participant: ParticipantId,
    /// Iteration counter at capture time.
    pub iteration: u64,
    /// Full data vector at capture time.
    pub data: Vec<i64>,
}

impl CheckpointRecord {
    /// Create a record.
    #[must_use]
    pub fn new(participant: ParticipantId, iteration: u64, data: Vec<i64>) -> Self {
        Self {
            participant,
            iteration,
            data,
        }
    }

    /// Render the record in its textual format.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = format!("{}\n", self.iteration);
        for value in &self.data {
            out.push_str(&value.to_string());
            out.push(' ');
        }
        out.push('\n');
        out
    }

    /// Parse a record previously produced by [`encode`](Self::encode).
    ///
    /// The owner is not part of the text; the caller supplies it from the
    /// storage key.
    ///
    /// # Errors
    ///
    /// Returns [`RecordParseError`] if either line is missing or malformed,
    /// or if non-blank lines follow the data line.
    pub fn decode(participant: ParticipantId, text: &str) -> Result<Self, RecordParseError> {
        let mut lines = text.lines();

        let iteration_line = lines
            .next()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or(RecordParseError::MissingIteration)?;
        let iteration = iteration_line
            .parse::<u64>()
            .map_err(|_| RecordParseError::InvalidIteration(iteration_line.to_string()))?;

        let data_line = lines.next().ok_or(RecordParseError::MissingData)?;
        let data = data_line
            .split_whitespace()
            .enumerate()
            .map(|(position, token)| {
                token
                    .parse::<i64>()
                    .map_err(|_| RecordParseError::InvalidValue {
                        position,
                        token: token.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if lines.any(|l| !l.trim().is_empty()) {
            return Err(RecordParseError::TrailingContent);
        }

        Ok(Self::new(participant, iteration, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_matches_text_format() {
        let record = CheckpointRecord::new(ParticipantId(2), 6, vec![38, 39, 40, 41, 42]);
        assert_eq!(record.encode(), "6\n38 39 40 41 42 \n");
    }

    #[test]
    fn test_decode_round_trip_extremes() {
        let record = CheckpointRecord::new(
            ParticipantId(7),
            u64::MAX,
            vec![i64::MIN, -1, 0, 1, i64::MAX],
        );
        let decoded = CheckpointRecord::decode(ParticipantId(7), &record.encode()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_decode_tolerates_missing_trailing_separator() {
        let decoded = CheckpointRecord::decode(ParticipantId(0), "3\n3 4 5 6 7").unwrap();
        assert_eq!(decoded.iteration, 3);
        assert_eq!(decoded.data, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_decode_tolerates_trailing_blank_lines() {
        let decoded = CheckpointRecord::decode(ParticipantId(0), "3\n1 2 \n\n  \n").unwrap();
        assert_eq!(decoded.data, vec![1, 2]);
    }

    #[test]
    fn test_decode_empty_is_missing_iteration() {
        assert_eq!(
            CheckpointRecord::decode(ParticipantId(0), ""),
            Err(RecordParseError::MissingIteration)
        );
    }

    #[test]
    fn test_decode_rejects_negative_iteration() {
        assert!(matches!(
            CheckpointRecord::decode(ParticipantId(0), "-3\n1 2 3\n"),
            Err(RecordParseError::InvalidIteration(_))
        ));
    }

    #[test]
    fn test_decode_missing_data_line() {
        assert_eq!(
            CheckpointRecord::decode(ParticipantId(0), "9\n"),
            Err(RecordParseError::MissingData)
        );
    }

    #[test]
    fn test_decode_reports_bad_token_position() {
        let err = CheckpointRecord::decode(ParticipantId(1), "3\n1 2 x3 4\n").unwrap_err();
        assert_eq!(
            err,
            RecordParseError::InvalidValue {
                position: 2,
                token: "x3".into(),
            }
        );
    }

    #[test]
    fn test_decode_rejects_trailing_content() {
        assert_eq!(
            CheckpointRecord::decode(ParticipantId(1), "3\n1 2\n4 5\n"),
            Err(RecordParseError::TrailingContent)
        );
    }
}
