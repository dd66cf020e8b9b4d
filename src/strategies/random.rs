use super::Action;
use rand::Rng;

/// Picks BUY, SELL or HOLD uniformly every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RandomTrader;

impl RandomTrader {
    pub fn decide<R: Rng + ?Sized>(&self, rng: &mut R) -> Action {
        match rng.gen_range(0..3) {
            0 => Action::Buy,
            1 => Action::Sell,
            _ => Action::Hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random;

    #[test]
    fn test_all_actions_show_up() {
        let mut rng = random::source(Some(42));
        let trader = RandomTrader;

        let mut seen = [0usize; 3];
        for _ in 0..300 {
            match trader.decide(&mut rng) {
                Action::Buy => seen[0] += 1,
                Action::Sell => seen[1] += 1,
                Action::Hold => seen[2] += 1,
            }
        }

        // Roughly 100 each
        assert!(seen.iter().all(|&n| n > 60), "skewed draw: {:?}", seen);
    }
}
