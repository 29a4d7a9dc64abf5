//! Compact 16-bit move encoding for table entries and vote tallies.

use shakmaty::{Move, Role};

const SRC_MASK: u16 = 0x003F;
const DST_MASK: u16 = 0x0FC0;
const PROMO_MASK: u16 = 0x7000;
const DST_SHIFT: u32 = 6;
const PROMO_SHIFT: u32 = 12;

/// A move reduced to source square, destination square and promotion piece.
///
/// ```text
/// bits  0-5:  source square      (0-63)
/// bits  6-11: destination square (0-63)
/// bits 12-14: promotion          (0 = none, 1 = N, 2 = B, 3 = R, 4 = Q)
/// ```
///
/// This triple is unique among a position's legal moves, so a packed move is
/// re-identified by scanning the legal move list
/// ([`SearchPosition::find_move`](crate::SearchPosition::find_move)).
/// Castling packs shakmaty's king-from/rook-to convention, which round-trips
/// because the same convention is applied on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedMove(u16);

impl PackedMove {
    /// Raw bit representation, used when packing table entries.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Rebuild from the raw bit representation.
    pub const fn from_raw(bits: u16) -> PackedMove {
        PackedMove(bits)
    }

    /// Source square index (0 = a1 .. 63 = h8).
    pub const fn source(self) -> u16 {
        self.0 & SRC_MASK
    }

    /// Destination square index.
    pub const fn dest(self) -> u16 {
        (self.0 & DST_MASK) >> DST_SHIFT
    }

    fn promo_bits(role: Option<Role>) -> u16 {
        match role {
            None => 0,
            Some(Role::Knight) => 1,
            Some(Role::Bishop) => 2,
            Some(Role::Rook) => 3,
            Some(Role::Queen) => 4,
            // Pawn/king promotions do not exist; map them to the empty slot
            Some(Role::Pawn | Role::King) => 0,
        }
    }
}

impl From<&Move> for PackedMove {
    fn from(mv: &Move) -> PackedMove {
        let src = mv.from().map_or(0, |sq| sq as u16);
        let dst = mv.to() as u16;
        PackedMove(
            src | (dst << DST_SHIFT) | (Self::promo_bits(mv.promotion()) << PROMO_SHIFT),
        )
    }
}
