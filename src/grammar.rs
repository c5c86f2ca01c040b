//! Context-free L-System rewriting over a byte alphabet.
//!
//! An [`LSystem`] owns an axiom and one optional [`ProductionRule`] per symbol.
//! [`LSystem::expand`] rewrites the axiom generation by generation; a symbol
//! without a rule rewrites to itself.

use crate::error::{FractalError, Result};
use crate::random::RandomSource;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// One alphabet unit.
pub type Symbol = u8;

/// Generator behind a [`ProductionRule::Dynamic`].
pub type RuleFn = Rc<dyn Fn(&mut dyn RandomSource) -> Vec<Symbol>>;

/// How a single symbol is rewritten.
#[derive(Clone)]
pub enum ProductionRule {
    /// Always the same replacement.
    Static(Vec<Symbol>),
    /// Evaluated once per occurrence, per generation. Never memoized, so two
    /// sibling occurrences may produce different replacements.
    Dynamic(RuleFn),
}

impl ProductionRule {
    pub fn fixed(replacement: impl AsRef<[u8]>) -> Self {
        Self::Static(replacement.as_ref().to_vec())
    }

    pub fn dynamic(generator: impl Fn(&mut dyn RandomSource) -> Vec<Symbol> + 'static) -> Self {
        Self::Dynamic(Rc::new(generator))
    }

    /// Length of the replacement when it is known without evaluating anything.
    pub fn static_len(&self) -> Option<usize> {
        match self {
            Self::Static(r) => Some(r.len()),
            Self::Dynamic(_) => None,
        }
    }
}

impl fmt::Debug for ProductionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(r) => f
                .debug_tuple("Static")
                .field(&String::from_utf8_lossy(r))
                .finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// An axiom plus a symbol-indexed rule table.
#[derive(Clone, Debug, Default)]
pub struct LSystem {
    axiom: Vec<Symbol>,
    rules: Vec<Option<ProductionRule>>,
    max_len: Option<usize>,
}

impl LSystem {
    /// Creates a grammar with the given axiom and no rules.
    pub fn new(axiom: impl AsRef<[u8]>) -> Self {
        Self {
            axiom: axiom.as_ref().to_vec(),
            rules: Vec::new(),
            max_len: None,
        }
    }

    /// Adds a static rule (builder pattern).
    pub fn with_rule(mut self, symbol: Symbol, replacement: impl AsRef<[u8]>) -> Self {
        self.set_rule(symbol, ProductionRule::fixed(replacement));
        self
    }

    /// Adds a dynamic rule (builder pattern).
    pub fn with_dynamic_rule(
        mut self,
        symbol: Symbol,
        generator: impl Fn(&mut dyn RandomSource) -> Vec<Symbol> + 'static,
    ) -> Self {
        self.set_rule(symbol, ProductionRule::dynamic(generator));
        self
    }

    /// Refuses to expand past `limit` symbols.
    ///
    /// Without a limit the engine grows the sequence as far as the rules take it.
    pub fn with_max_len(mut self, limit: usize) -> Self {
        self.max_len = Some(limit);
        self
    }

    /// Binds `rule` to `symbol`, replacing any previous rule.
    ///
    /// The table grows automatically; gaps are identity rules.
    pub fn set_rule(&mut self, symbol: Symbol, rule: ProductionRule) {
        let idx = symbol as usize;
        if idx >= self.rules.len() {
            self.rules.resize(idx + 1, None);
        }
        self.rules[idx] = Some(rule);
    }

    /// Copies the rule currently bound to `source` onto `target`.
    ///
    /// The copy is a value: rebinding `source` afterwards leaves `target` alone.
    /// If `source` has no rule, `target` becomes an identity symbol.
    pub fn alias_rule(&mut self, target: Symbol, source: Symbol) {
        match self.rule(source).cloned() {
            Some(rule) => self.set_rule(target, rule),
            None => {
                if let Some(slot) = self.rules.get_mut(target as usize) {
                    *slot = None;
                }
            }
        }
    }

    pub fn rule(&self, symbol: Symbol) -> Option<&ProductionRule> {
        self.rules.get(symbol as usize).and_then(Option::as_ref)
    }

    pub fn axiom(&self) -> &[Symbol] {
        &self.axiom
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    /// Exact length of the next generation, if every symbol in `current`
    /// rewrites statically.
    pub fn projected_len(&self, current: &[Symbol]) -> Option<usize> {
        current.iter().try_fold(0usize, |acc, &sym| {
            let n = match self.rule(sym) {
                Some(rule) => rule.static_len()?,
                None => 1,
            };
            Some(acc.saturating_add(n))
        })
    }

    /// Rewrites the axiom `generations` times.
    ///
    /// Each generation is one left-to-right pass. Dynamic rules draw from `rng`
    /// in encounter order, so a fixed seed reproduces the output exactly.
    ///
    /// # Errors
    ///
    /// [`FractalError::SequenceTooLarge`] when a length limit is set and a
    /// generation would exceed it.
    pub fn expand(&self, generations: usize, rng: &mut dyn RandomSource) -> Result<Vec<Symbol>> {
        let mut current = self.axiom.clone();

        for generation in 1..=generations {
            let projected = self.projected_len(&current);
            if let (Some(limit), Some(len)) = (self.max_len, projected)
                && len > limit
            {
                warn!(generation, len, limit, "projected sequence exceeds limit");
                return Err(FractalError::SequenceTooLarge {
                    generation,
                    len,
                    limit,
                });
            }

            let mut next = Vec::with_capacity(projected.unwrap_or(current.len()));
            for &sym in &current {
                match self.rule(sym) {
                    Some(ProductionRule::Static(replacement)) => next.extend_from_slice(replacement),
                    Some(ProductionRule::Dynamic(generator)) => next.extend(generator(&mut *rng)),
                    None => next.push(sym),
                }

                // Dynamic rules can't be projected, so check as we go.
                if let Some(limit) = self.max_len
                    && next.len() > limit
                {
                    warn!(generation, len = next.len(), limit, "sequence exceeds limit");
                    return Err(FractalError::SequenceTooLarge {
                        generation,
                        len: next.len(),
                        limit,
                    });
                }
            }

            debug!(generation, len = next.len(), "expanded generation");
            current = next;
        }

        Ok(current)
    }
}
