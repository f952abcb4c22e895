//! Short code generation
//!
//! Workspaces and pipelines carry a 4-character public code that ends up in
//! every wire name they own. Codes are drawn uniformly from a per-kind
//! alphabet and checked against the authoritative store; a bounded number of
//! collisions is tolerated before the request gives up.

use std::future::Future;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of characters in a generated code
pub const CODE_LENGTH: usize = 4;

/// Attempts made before giving up on finding a free code
pub const MAX_ATTEMPTS: usize = 10;

const LOWER_ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER_ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Entity kinds that receive a generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    Workspace,
    Pipeline,
}

impl CodeKind {
    /// Alphabet codes of this kind are drawn from
    pub fn alphabet(&self) -> &'static [u8] {
        match self {
            CodeKind::Workspace => LOWER_ALPHA,
            CodeKind::Pipeline => UPPER_ALPHANUMERIC,
        }
    }

    /// Whether `code` has the shape of a code of this kind
    pub fn matches(&self, code: &str) -> bool {
        code.len() == CODE_LENGTH && code.bytes().all(|b| self.alphabet().contains(&b))
    }
}

impl std::fmt::Display for CodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeKind::Workspace => write!(f, "workspace"),
            CodeKind::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// Code generation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("failed to generate a unique {kind} code after {attempts} attempts")]
    Exhausted { kind: CodeKind, attempts: usize },
}

/// Draw one candidate code.
///
/// `rand::rng()` is a CSPRNG seeded from the OS and `random_range` samples
/// without modulo bias.
pub fn random_code(kind: CodeKind) -> String {
    let alphabet = kind.alphabet();
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// Generate a code for which `exists` reports no collision.
///
/// `exists` is awaited once per candidate. Its errors are returned as-is;
/// running out of attempts yields [`CodeError::Exhausted`] converted into the
/// caller's error type.
pub async fn generate_unique_code<F, Fut, E>(kind: CodeKind, mut exists: F) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: From<CodeError>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = random_code(kind);
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
        tracing::debug!(%kind, attempt, code = %candidate, "generated code already taken");
    }

    tracing::warn!(%kind, attempts = MAX_ATTEMPTS, "code space exhausted for request");
    Err(CodeError::Exhausted {
        kind,
        attempts: MAX_ATTEMPTS,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Code(CodeError),
        Lookup,
    }

    impl From<CodeError> for TestError {
        fn from(err: CodeError) -> Self {
            TestError::Code(err)
        }
    }

    #[test]
    fn test_random_code_shape() {
        for _ in 0..200 {
            let ws = random_code(CodeKind::Workspace);
            assert!(CodeKind::Workspace.matches(&ws), "bad workspace code {ws}");
            assert!(ws.chars().all(|c| c.is_ascii_lowercase()));

            let pl = random_code(CodeKind::Pipeline);
            assert!(CodeKind::Pipeline.matches(&pl), "bad pipeline code {pl}");
        }
    }

    #[test]
    fn test_matches_rejects_wrong_alphabet() {
        assert!(!CodeKind::Workspace.matches("AB12"));
        assert!(!CodeKind::Pipeline.matches("ab12"));
        assert!(!CodeKind::Pipeline.matches("AB123"));
    }

    #[tokio::test]
    async fn test_skips_taken_codes() {
        let checked = Arc::new(Mutex::new(Vec::new()));
        let seen = checked.clone();

        // First three candidates collide.
        let code = generate_unique_code(CodeKind::Pipeline, move |code| {
            let seen = seen.clone();
            async move {
                let mut seen = seen.lock().unwrap();
                seen.push(code);
                Ok::<_, TestError>(seen.len() <= 3)
            }
        })
        .await
        .unwrap();

        let checked = checked.lock().unwrap();
        assert_eq!(checked.len(), 4);
        assert_eq!(checked.last(), Some(&code));
        assert!(CodeKind::Pipeline.matches(&code));
    }

    #[tokio::test]
    async fn test_never_returns_existing_code() {
        let taken: HashSet<String> = (0..50).map(|_| random_code(CodeKind::Workspace)).collect();
        let lookup = taken.clone();

        for _ in 0..20 {
            let lookup = lookup.clone();
            let code = generate_unique_code(CodeKind::Workspace, move |code| {
                let hit = lookup.contains(&code);
                async move { Ok::<_, TestError>(hit) }
            })
            .await
            .unwrap();
            assert!(!taken.contains(&code));
        }
    }

    #[tokio::test]
    async fn test_exhaustion_after_bounded_attempts() {
        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();

        let result = generate_unique_code(CodeKind::Workspace, move |_| {
            *counter.lock().unwrap() += 1;
            async { Ok::<_, TestError>(true) }
        })
        .await;

        assert_eq!(
            result,
            Err(TestError::Code(CodeError::Exhausted {
                kind: CodeKind::Workspace,
                attempts: MAX_ATTEMPTS,
            }))
        );
        assert_eq!(*calls.lock().unwrap(), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_lookup_error_propagates() {
        let result = generate_unique_code(CodeKind::Pipeline, |_| async {
            Err::<bool, _>(TestError::Lookup)
        })
        .await;
        assert_eq!(result, Err(TestError::Lookup));
    }
}
