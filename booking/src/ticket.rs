//! Ticket codes, payment ids and the decorative confirmation pattern.

use crate::types::PaymentId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Prefix of every ticket code
pub const TICKET_PREFIX: &str = "TKT-";

/// Random characters after the prefix
pub const TICKET_SUFFIX_LEN: usize = 6;

/// Length of a payment id
pub const PAYMENT_ID_LEN: usize = 8;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Uppercase base36 string of `len` random characters
pub fn random_base36<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect()
}

/// Code printed on a confirmed ticket, e.g. `TKT-7Q2M9Z`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketCode(String);

impl TicketCode {
    /// Random code
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("{TICKET_PREFIX}{}", random_base36(rng, TICKET_SUFFIX_LEN)))
    }

    /// Wraps an existing code
    #[must_use]
    pub fn from_raw(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Side of the square confirmation pattern
pub const PATTERN_SIDE: usize = 8;

/// 8×8 decorative pattern derived from a ticket code
///
/// Not a scannable QR code. Cell `i` (row-major) is filled when
/// `(i + byte(code[i % len])) % 3 != 0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QrPattern {
    cells: Vec<bool>,
}

impl QrPattern {
    /// Pattern for a ticket code
    #[must_use]
    pub fn for_code(code: &TicketCode) -> Self {
        let bytes = code.as_str().as_bytes();
        let cells = (0..PATTERN_SIDE * PATTERN_SIDE)
            .map(|i| {
                let byte = if bytes.is_empty() { 0 } else { usize::from(bytes[i % bytes.len()]) };
                (i + byte) % 3 != 0
            })
            .collect();
        Self { cells }
    }

    /// Whether a cell is filled; out-of-range cells are empty
    #[must_use]
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < PATTERN_SIDE
            && col < PATTERN_SIDE
            && self.cells.get(row * PATTERN_SIDE + col).copied().unwrap_or(false)
    }

    /// Text rendering, one line per row
    #[must_use]
    pub fn render(&self) -> String {
        self.cells
            .chunks(PATTERN_SIDE)
            .map(|row| row.iter().map(|filled| if *filled { "██" } else { "  " }).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Source of ticket codes and share-link payment ids
pub trait CodeGenerator: Send + Sync {
    /// New ticket code
    fn ticket_code(&self) -> TicketCode;

    /// New payment id for a share link
    fn payment_id(&self) -> PaymentId;
}

/// Random codes backed by a seedable RNG
pub struct RandomCodes {
    rng: Mutex<StdRng>,
}

impl RandomCodes {
    /// Seeded from OS entropy
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence for a seed
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomCodes {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for RandomCodes {
    fn ticket_code(&self) -> TicketCode {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        TicketCode::generate(&mut *rng)
    }

    fn payment_id(&self) -> PaymentId {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        PaymentId::new(random_base36(&mut *rng, PAYMENT_ID_LEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_code_shape() {
        let codes = RandomCodes::seeded(3);
        let code = codes.ticket_code();
        let suffix = code.as_str().strip_prefix(TICKET_PREFIX).unwrap_or_default();

        assert_eq!(suffix.len(), TICKET_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn payment_id_shape() {
        let id = RandomCodes::seeded(3).payment_id();
        assert_eq!(id.as_str().len(), PAYMENT_ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn pattern_follows_code_bytes() {
        let code = TicketCode::from_raw("TKT-000000");
        let pattern = QrPattern::for_code(&code);

        // cell 0: 'T' = 84, (0 + 84) % 3 == 0 → empty
        assert!(!pattern.is_filled(0, 0));
        // cell 1: 'K' = 75, (1 + 75) % 3 == 1 → filled
        assert!(pattern.is_filled(0, 1));
        assert!(!pattern.is_filled(8, 0));
        assert_eq!(pattern.render().lines().count(), PATTERN_SIDE);
        assert_eq!(pattern, QrPattern::for_code(&code));
    }

    #[test]
    fn out_of_range_cells_are_empty() {
        let pattern = QrPattern::for_code(&TicketCode::from_raw(""));

        for (row, col) in [(0, PATTERN_SIDE), (PATTERN_SIDE, 0), (usize::MAX, usize::MAX)] {
            assert!(!pattern.is_filled(row, col));
        }
        // Empty code: cell i is filled unless i % 3 == 0
        assert!(!pattern.is_filled(7, 7));
        assert!(pattern.is_filled(7, 6));
    }
}
