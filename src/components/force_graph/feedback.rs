//! Turns "closer" / "further" gestures into strength updates.

use log::debug;

use super::types::{Strength, Strengths};

pub const MIN_STRENGTH: Strength = 1;
pub const MAX_STRENGTH: Strength = 100;

/// How a strength change reaches the running layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RelayoutMode {
	/// Rebuild every force and start a new run seeded with current positions.
	#[default]
	Rebuild,
	/// Swap the forces into the live run and raise its alpha.
	Reheat,
}

/// Clamps the result of a gesture into the user-settable range.
///
/// Unlike the link-distance policy, the floor here is 1, never 0.
pub fn adjusted(current: Strength, delta: Strength) -> Strength {
	let value = current.saturating_sub(delta);
	if value >= MAX_STRENGTH {
		MAX_STRENGTH
	} else if value <= 0 {
		MIN_STRENGTH
	} else {
		value
	}
}

/// Sole owner of the strength sequence.
#[derive(Clone, Debug, Default)]
pub struct StrengthController {
	strengths: Strengths,
}

impl StrengthController {
	pub fn new(strengths: impl Into<Strengths>) -> Self {
		Self {
			strengths: strengths.into(),
		}
	}

	pub fn strengths(&self) -> &Strengths {
		&self.strengths
	}

	/// Applies `strengths[index] - delta` and returns the replacement
	/// sequence. `index` must be in range; the caller owns that contract.
	pub fn adjust(&mut self, index: usize, delta: Strength) -> Strengths {
		debug_assert!(index < self.strengths.len(), "strength index {index} out of range");
		let value = adjusted(self.strengths[index], delta);
		debug!(
			"strength[{index}] {} -> {value} (delta {delta})",
			self.strengths[index]
		);
		self.strengths = self.strengths.with(index, value);
		self.strengths.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strengthen_by_ten() {
		let mut c = StrengthController::new(vec![50]);
		assert_eq!(&*c.adjust(0, 10), &[40]);
	}

	#[test]
	fn underflow_floors_at_one() {
		let mut c = StrengthController::new(vec![50]);
		assert_eq!(&*c.adjust(0, 100), &[1]);
	}

	#[test]
	fn overflow_caps_at_hundred() {
		let mut c = StrengthController::new(vec![50]);
		assert_eq!(&*c.adjust(0, -60), &[100]);
	}

	#[test]
	fn stored_value_always_in_range() {
		let deltas = [
			Strength::MIN,
			-1000,
			-101,
			-100,
			-99,
			-1,
			0,
			1,
			49,
			50,
			99,
			100,
			101,
			1000,
			Strength::MAX,
		];
		for start in [-5, 0, 1, 50, 100, 250] {
			for delta in deltas {
				let v = adjusted(start, delta);
				assert!((MIN_STRENGTH..=MAX_STRENGTH).contains(&v), "{start} - {delta} gave {v}");
			}
		}
	}

	#[test]
	fn adjust_never_produces_zero() {
		for delta in -200..=200 {
			assert_ne!(adjusted(50, delta), 0);
		}
	}

	#[test]
	fn only_the_target_entry_changes() {
		let mut c = StrengthController::new(vec![10, 20, 30]);
		let before = c.strengths().clone();
		let after = c.adjust(1, -5);
		assert_eq!(&*after, &[10, 25, 30]);
		assert_eq!(&*before, &[10, 20, 30]);
		assert_ne!(before.revision(), after.revision());
	}

	#[test]
	#[should_panic]
	fn out_of_range_index_is_a_contract_violation() {
		let mut c = StrengthController::new(vec![10]);
		c.adjust(3, 1);
	}
}
