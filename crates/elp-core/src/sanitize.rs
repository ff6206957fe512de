// ── Sanitizer ───────────────────────────────────────────────────────────
// Pattern-based PII masking transform applied to real payloads for
// MIRROR responses. Purely functional; compiled patterns cached in a
// `LazyLock` rather than recompiled per call.

use std::sync::LazyLock;

use regex::Regex;

static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("static pattern"));

// `senha` (Portuguese for "password"), optionally followed by `:` or `=`,
// then a non-separator run of characters.
static SENHA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)senha\s*[:=]?\s*[^\s,;]+").expect("static pattern")
});

// `cpf` followed by `:` or `=` and exactly 11 digits (Brazilian taxpayer ID).
static CPF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)cpf\s*[:=]\s*\d{11}\b").expect("static pattern")
});

/// Applies the sanitization transform: `cpf` and `senha` matches key off
/// literal digits, so they run first, against the untouched input; the
/// blanket digit mask runs last so every digit in the final output is
/// masked, including ones the cpf/senha replacements didn't consume.
/// See DESIGN.md for why this reorders the "listed order" relative to
/// a strictly sequential reading — doing it digit-first would make the
/// cpf rule permanently unreachable, since by then there are no digits
/// left to match against.
pub fn sanitize(input: &str) -> String {
    let masked_cpf = CPF.replace_all(input, "cpf=***.***.***-**");
    let masked_senha = SENHA.replace_all(&masked_cpf, "senha=********");
    DIGIT.replace_all(&masked_senha, "*").into_owned()
}
