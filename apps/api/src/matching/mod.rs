// Application matching engine.
// resolver (cache-or-fetch criteria) → evaluator (4-of-7 rule) → dispatcher (concurrent batch).

pub mod dispatcher;
pub mod evaluator;
pub mod handlers;
pub mod resolver;
