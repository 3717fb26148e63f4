pub mod cost;
pub mod energy;
pub mod power;
pub mod rate;

use std::ops::Div;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

#[derive(
    Clone,
    Copy,
    Default,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::From,
    derive_more::FromStr,
    derive_more::Neg,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Sum,
)]
#[from(f64, OrderedFloat<f64>)]
#[serde(transparent)]
#[must_use]
pub struct Quantity<const POWER: isize, const TIME: isize, const COST: isize>(
    pub OrderedFloat<f64>,
);

impl<const POWER: isize, const TIME: isize, const COST: isize> Quantity<POWER, TIME, COST> {
    pub const ZERO: Self = Self(OrderedFloat(0.0));

    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.0.0.is_finite()
    }
}

impl<const POWER: isize, const TIME: isize, const COST: isize> From<Quantity<POWER, TIME, COST>>
    for f64
{
    fn from(quantity: Quantity<POWER, TIME, COST>) -> Self {
        quantity.0.0
    }
}

impl<const POWER: isize, const TIME: isize, const COST: isize> Div<Self>
    for Quantity<POWER, TIME, COST>
{
    type Output = OrderedFloat<f64>;

    fn div(self, rhs: Self) -> Self::Output {
        self.0 / rhs.0
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::{Debug, Formatter};

    use super::*;

    pub type Bare = Quantity<0, 0, 0>;

    impl Debug for Bare {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }

    #[test]
    fn test_min() {
        assert_eq!(Bare::from(1.0).min(Bare::from(2.0)), Bare::from(1.0));
        assert_eq!(Bare::from(2.0).min(Bare::from(1.0)), Bare::from(1.0));
    }

    #[test]
    fn test_max() {
        assert_eq!(Bare::from(1.0).max(Bare::from(2.0)), Bare::from(2.0));
        assert_eq!(Bare::from(2.0).max(Bare::from(1.0)), Bare::from(2.0));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Bare::from(1.0).clamp(Bare::from(2.0), Bare::from(3.0)), Bare::from(2.0));
        assert_eq!(Bare::from(4.0).clamp(Bare::from(2.0), Bare::from(3.0)), Bare::from(3.0));
        assert_eq!(Bare::from(2.0).clamp(Bare::from(1.0), Bare::from(3.0)), Bare::from(2.0));
    }

    #[test]
    #[expect(clippy::float_cmp)]
    fn test_ratio() {
        assert_eq!((Bare::from(3.0) / Bare::from(2.0)).0, 1.5);
    }
}
