// Text sanitizer - lexical blocklist matching and token masking.
//
// Matching is deliberately dumb: a token is offensive if any blocklist root
// appears anywhere inside it. This over-blocks (a root buried in an innocent
// longer word still triggers) and that is accepted behavior.

use super::moderation_models::SanitizeResult;

/// Characters ignored when comparing a token against the blocklist.
const IGNORED_PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

/// Character used to hide an offending token.
pub const MASK_CHAR: char = '*';

/// Built-in roots (Portuguese), used when no blocklist file is configured.
const DEFAULT_ROOTS: &[&str] = &[
    "merda", "bosta", "porra", "caralho", "pqp", "puta", "puto", "carai", "foder", "fuder",
    "cacete", "buceta", "cu", "otario", "idiota", "imbecil", "burro", "vagabundo",
];

/// Decides whether a single normalized token is offensive.
///
/// The token handed in has already been stripped of punctuation and lowercased,
/// so implementations only deal with the comparison itself. Swapping this out
/// does not touch the strike/ban state machine.
pub trait ProfanityMatcher: Send + Sync {
    fn matches(&self, normalized_token: &str) -> bool;
}

/// Immutable ordered list of lowercase word roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blocklist {
    roots: Vec<String>,
}

impl Blocklist {
    /// Build a blocklist from roots. Roots are trimmed and lowercased, empty
    /// ones are dropped and duplicates keep their first position.
    pub fn new<I, T>(roots: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for root in roots {
            let root = root.as_ref().trim().to_lowercase();
            if !root.is_empty() && !list.contains(&root) {
                list.push(root);
            }
        }
        Self { roots: list }
    }

    /// Parse a blocklist file body: one root per line, `#` starts a comment line.
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl Default for Blocklist {
    fn default() -> Self {
        Self::new(DEFAULT_ROOTS.iter().copied())
    }
}

impl ProfanityMatcher for Blocklist {
    fn matches(&self, normalized_token: &str) -> bool {
        // An empty needle would match everything, and an empty token nothing.
        if normalized_token.is_empty() {
            return false;
        }
        self.roots
            .iter()
            .any(|root| normalized_token.contains(root.as_str()))
    }
}

/// Strip the ignored punctuation from anywhere in the token and lowercase it.
pub fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| !IGNORED_PUNCTUATION.contains(c))
        .collect::<String>()
        .to_lowercase()
}

/// Run text through the matcher, masking every offending token.
///
/// The whole original token is masked, punctuation included, with one mask
/// character per original character so the output length gives nothing away.
/// Tokens are re-joined with single spaces.
pub fn sanitize<M>(matcher: &M, text: &str) -> SanitizeResult
where
    M: ProfanityMatcher + ?Sized,
{
    let mut violation_detected = false;

    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|token| {
            if matcher.matches(&normalize_token(token)) {
                violation_detected = true;
                MASK_CHAR.to_string().repeat(token.chars().count())
            } else {
                token.to_string()
            }
        })
        .collect();

    SanitizeResult {
        sanitized_text: tokens.join(" "),
        violation_detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn porra_only() -> Blocklist {
        Blocklist::new(["porra"])
    }

    #[test]
    fn test_masks_offending_token() {
        let result = sanitize(&porra_only(), "que porra é essa");

        assert!(result.violation_detected);
        assert_eq!(result.sanitized_text, "que ***** é essa");
    }

    #[test]
    fn test_clean_text_passes_through() {
        let blocklist = Blocklist::default();
        let text = "Hoje foi um dia difícil, mas consegui levantar.";

        let result = sanitize(&blocklist, text);

        assert!(!result.violation_detected);
        assert_eq!(result.sanitized_text, text);
    }

    #[test]
    fn test_whitespace_is_collapsed_on_rejoin() {
        let result = sanitize(&porra_only(), "  bom   dia\tpessoal ");

        assert!(!result.violation_detected);
        assert_eq!(result.sanitized_text, "bom dia pessoal");
    }

    #[test]
    fn test_punctuation_is_masked_with_the_token() {
        let result = sanitize(&porra_only(), "PORRA!!, ok");

        assert!(result.violation_detected);
        // 5 letters + "!!," = 8 characters
        assert_eq!(result.sanitized_text, "******** ok");
    }

    #[test]
    fn test_embedded_punctuation_is_ignored_for_matching() {
        let result = sanitize(&porra_only(), "po.r,ra");

        assert!(result.violation_detected);
        assert_eq!(result.sanitized_text, "*******");
    }

    #[test]
    fn test_substring_match_over_blocks() {
        let blocklist = Blocklist::default();

        // "cu" lives inside "cuidado" - accepted over-blocking
        let result = sanitize(&blocklist, "tenha cuidado");

        assert!(result.violation_detected);
        assert_eq!(result.sanitized_text, "tenha *******");
    }

    #[test]
    fn test_mask_counts_characters_not_bytes() {
        let blocklist = Blocklist::new(["ção"]);

        let result = sanitize(&blocklist, "canção");

        assert!(result.violation_detected);
        assert_eq!(result.sanitized_text, "******");
        assert_eq!(result.sanitized_text.chars().count(), "canção".chars().count());
    }

    #[test]
    fn test_empty_and_punctuation_only_input() {
        let blocklist = Blocklist::default();

        let empty = sanitize(&blocklist, "");
        assert!(!empty.violation_detected);
        assert_eq!(empty.sanitized_text, "");

        let punct = sanitize(&blocklist, "... ?! ;:");
        assert!(!punct.violation_detected);
        assert_eq!(punct.sanitized_text, "... ?! ;:");
    }

    #[test]
    fn test_empty_token_never_matches() {
        let blocklist = Blocklist::default();
        assert!(!blocklist.matches(""));
    }

    #[test]
    fn test_parse_blocklist_file() {
        let blocklist = Blocklist::parse("# roots\nFoo\n\n  bar  \nfoo\n");

        assert_eq!(blocklist.roots(), &["foo".to_string(), "bar".to_string()]);
        assert_eq!(blocklist.len(), 2);
    }

    #[test]
    fn test_default_blocklist_is_loaded() {
        let blocklist = Blocklist::default();
        assert!(!blocklist.is_empty());
        assert!(blocklist.roots().iter().any(|r| r == "porra"));
    }
}
