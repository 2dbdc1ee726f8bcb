//! Demand: how many more elements a subscriber is willing to accept.

use std::{
  fmt::{Display, Formatter},
  ops::{Add, AddAssign, Sub, SubAssign},
};

/// The number of elements a subscriber is prepared to receive.
///
/// `Finite(0)` means "nothing right now". Arithmetic saturates: anything plus
/// `Unbounded` is `Unbounded`, finite sums clamp at `usize::MAX`, and
/// subtraction never goes below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Demand {
  Unbounded,
  Finite(usize),
}

impl Demand {
  /// No additional elements.
  #[inline]
  pub const fn none() -> Self { Demand::Finite(0) }

  /// At most `n` additional elements.
  #[inline]
  pub const fn max(n: usize) -> Self { Demand::Finite(n) }

  /// Any number of elements.
  #[inline]
  pub const fn unlimited() -> Self { Demand::Unbounded }

  #[inline]
  pub const fn is_unbounded(&self) -> bool { matches!(self, Demand::Unbounded) }

  #[inline]
  pub const fn is_zero(&self) -> bool { matches!(self, Demand::Finite(0)) }

  /// Returns `true` if at least one element may be delivered.
  #[inline]
  pub const fn is_positive(&self) -> bool { !self.is_zero() }

  /// The finite count, or `None` when unbounded.
  #[inline]
  pub const fn as_finite(&self) -> Option<usize> {
    match self {
      Demand::Unbounded => None,
      Demand::Finite(n) => Some(*n),
    }
  }

  /// Consumes one unit of demand, returning `false` if there was none.
  pub(crate) fn take_one(&mut self) -> bool {
    match self {
      Demand::Unbounded => true,
      Demand::Finite(0) => false,
      Demand::Finite(n) => {
        *n -= 1;
        true
      }
    }
  }
}

impl Default for Demand {
  fn default() -> Self { Demand::none() }
}

impl From<usize> for Demand {
  fn from(n: usize) -> Self { Demand::Finite(n) }
}

impl Display for Demand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Demand::Unbounded => f.write_str("unlimited"),
      Demand::Finite(n) => write!(f, "max({n})"),
    }
  }
}

impl Add for Demand {
  type Output = Demand;

  fn add(self, rhs: Demand) -> Demand {
    match (self, rhs) {
      (Demand::Finite(a), Demand::Finite(b)) => Demand::Finite(a.saturating_add(b)),
      _ => Demand::Unbounded,
    }
  }
}

impl Add<usize> for Demand {
  type Output = Demand;

  fn add(self, rhs: usize) -> Demand { self + Demand::Finite(rhs) }
}

impl AddAssign for Demand {
  fn add_assign(&mut self, rhs: Demand) { *self = *self + rhs; }
}

impl Sub for Demand {
  type Output = Demand;

  fn sub(self, rhs: Demand) -> Demand {
    match (self, rhs) {
      (Demand::Unbounded, _) => Demand::Unbounded,
      (Demand::Finite(_), Demand::Unbounded) => Demand::none(),
      (Demand::Finite(a), Demand::Finite(b)) => Demand::Finite(a.saturating_sub(b)),
    }
  }
}

impl Sub<usize> for Demand {
  type Output = Demand;

  fn sub(self, rhs: usize) -> Demand { self - Demand::Finite(rhs) }
}

impl SubAssign for Demand {
  fn sub_assign(&mut self, rhs: Demand) { *self = *self - rhs; }
}
