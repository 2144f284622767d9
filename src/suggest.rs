//! Reuse recommendation derived from a project's match distances.

/// Below this minimum distance a project counts as highly similar.
pub const HIGH_SIMILARITY_THRESHOLD: f64 = 0.3;

/// More matched chunks than this makes a project a reference candidate.
pub const MANY_FRAGMENTS_THRESHOLD: usize = 5;

/// Pick the canned recommendation for one project.
///
/// Precedence: high similarity wins over fragment count, which wins over
/// the moderate default. Callers guarantee `distances` is non-empty (every
/// group holds at least one chunk).
pub fn suggest_reuse(file_name: &str, distances: &[f64]) -> String {
    debug_assert!(!distances.is_empty());
    let min = distances.iter().copied().fold(f64::INFINITY, f64::min);

    if min < HIGH_SIMILARITY_THRESHOLD {
        format!(
            "O projeto '{file_name}' possui alta similaridade. \
             Avalie reutilizar estruturas, escopo ou lógica técnica."
        )
    } else if distances.len() > MANY_FRAGMENTS_THRESHOLD {
        format!(
            "O projeto '{file_name}' tem vários trechos relevantes. \
             Pode servir como base de referência."
        )
    } else {
        format!(
            "O projeto '{file_name}' tem similaridade moderada. \
             Verifique se há pontos específicos que podem ser aproveitados."
        )
    }
}
