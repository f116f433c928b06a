use crate::linker::RunMetrics;
use std::collections::HashSet;

/// State scoped to a single `generate` or `preview` call.
///
/// Threaded explicitly through anchor selection and edge creation so every
/// edge of one run sees the anchors already claimed by earlier edges.
#[derive(Debug, Default)]
pub struct RunContext {
    used_anchors: HashSet<String>,
    pub metrics: RunMetrics,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the anchor was already claimed in this run (case-insensitive)
    pub fn is_used(&self, anchor: &str) -> bool {
        self.used_anchors.contains(&anchor.to_lowercase())
    }

    /// Claim an anchor. Returns false if it was already taken.
    pub fn claim(&mut self, anchor: &str) -> bool {
        self.used_anchors.insert(anchor.to_lowercase())
    }

    /// Give an anchor back, e.g. when its edge was rolled back
    pub fn release(&mut self, anchor: &str) {
        self.used_anchors.remove(&anchor.to_lowercase());
    }

    pub fn used_count(&self) -> usize {
        self.used_anchors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_are_case_insensitive() {
        let mut ctx = RunContext::new();
        assert!(ctx.claim("Solar Guide"));
        assert!(ctx.is_used("solar guide"));
        assert!(!ctx.claim("SOLAR GUIDE"));

        ctx.release("solar GUIDE");
        assert!(!ctx.is_used("Solar Guide"));
        assert_eq!(ctx.used_count(), 0);
    }
}
