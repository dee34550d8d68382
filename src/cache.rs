// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parsed-expression cache
//!
//! Thread-safe LRU cache keyed by expression text. Only successful parses
//! are stored; a syntax error is re-reported on every call.

use crate::ast::ExpressionNode;
use crate::parser::ParseResult;
use lru::LruCache;
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Cache statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to parse
    pub misses: u64,
    /// Expressions currently cached
    pub entries: usize,
    /// Maximum number of cached expressions (0 when disabled)
    pub capacity: usize,
}

impl CacheStats {
    /// Hit ratio as a percentage
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

struct CacheState {
    entries: LruCache<String, Arc<ExpressionNode>>,
    hits: u64,
    misses: u64,
}

/// LRU cache of parsed expressions
pub struct ExpressionCache {
    state: Mutex<CacheState>,
}

impl ExpressionCache {
    /// Create a cache holding at most `capacity` expressions
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Cached AST for `expression`, parsing and storing it on a miss
    ///
    /// Parsing happens outside the lock, so two threads missing on the same
    /// text may both parse it; the second insert simply replaces the first.
    pub fn get_or_parse(
        &self,
        expression: &str,
        parse: impl FnOnce(&str) -> ParseResult<ExpressionNode>,
    ) -> ParseResult<Arc<ExpressionNode>> {
        {
            let mut state = self.state.lock();
            if let Some(ast) = state.entries.get(expression).cloned() {
                state.hits += 1;
                return Ok(ast);
            }
            state.misses += 1;
        }

        log::debug!("Expression cache miss: {expression}");
        let ast = Arc::new(parse(expression)?);

        let mut state = self.state.lock();
        if let Some((evicted, _)) = state.entries.push(expression.to_string(), Arc::clone(&ast)) {
            if evicted != expression {
                log::debug!("Expression cache evicted: {evicted}");
            }
        }
        Ok(ast)
    }

    /// Drop all cached expressions and reset the counters
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
    }

    /// Current statistics
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
            capacity: state.entries.cap().get(),
        }
    }
}

impl fmt::Debug for ExpressionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionCache")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;
    use pretty_assertions::assert_eq;

    fn cache(capacity: usize) -> ExpressionCache {
        ExpressionCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_hits_share_the_ast() {
        let cache = cache(4);
        let first = cache.get_or_parse("a + 1", parse_expression).unwrap();
        let second = cache.get_or_parse("a + 1", parse_expression).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
        assert_eq!(stats.hit_ratio(), 50.0);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = cache(4);
        assert!(cache.get_or_parse("a +", parse_expression).is_err());
        assert!(cache.get_or_parse("a +", parse_expression).is_err());
        assert_eq!(cache.stats().entries, 0);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_eviction_and_clear() {
        let cache = cache(2);
        for expression in ["1", "2", "3"] {
            cache.get_or_parse(expression, parse_expression).unwrap();
        }
        assert_eq!(cache.stats().entries, 2);

        cache.clear();
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 0,
                misses: 0,
                entries: 0,
                capacity: 2
            }
        );
    }
}
