type Strategy<'a, I, O> = Box<dyn Fn(&I) -> Option<O> + Send + Sync + 'a>;

/// Ordered list of named strategies. The first one to produce a value wins.
pub struct FallbackChain<'a, I: ?Sized, O> {
    strategies: Vec<(&'static str, Strategy<'a, I, O>)>,
}

impl<'a, I: ?Sized, O> FallbackChain<'a, I, O> {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn then<F>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: Fn(&I) -> Option<O> + Send + Sync + 'a,
    {
        self.strategies.push((name, Box::new(strategy)));
        self
    }

    /// Value of the first strategy that yields one, with that strategy's name.
    pub fn run(&self, input: &I) -> Option<(&'static str, O)> {
        self.strategies
            .iter()
            .find_map(|(name, strategy)| strategy(input).map(|out| (*name, out)))
    }
}

impl<I: ?Sized, O> Default for FallbackChain<'_, I, O> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn first_value_wins_and_later_strategies_are_skipped() {
        let late_calls = AtomicUsize::new(0);
        let chain = FallbackChain::<str, String>::new()
            .then("never", |_| None)
            .then("upper", |s| Some(s.to_uppercase()))
            .then("late", |s| {
                late_calls.fetch_add(1, Ordering::SeqCst);
                Some(s.to_string())
            });

        assert_eq!(chain.run("abc"), Some(("upper", "ABC".to_string())));
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_chain_yields_nothing() {
        let chain: FallbackChain<str, String> = FallbackChain::default();
        assert_eq!(chain.run("abc"), None);
    }
}
