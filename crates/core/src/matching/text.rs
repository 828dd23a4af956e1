//! Text normalization and similarity scoring.

/// Fold a common accented Latin character to its base letter.
fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Lowercase, fold diacritics, and collapse everything non-alphanumeric to
/// single spaces.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;

    for c in text.to_lowercase().chars() {
        let c = fold_diacritic(c);
        if c.is_alphanumeric() {
            out.push(c);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }

    out.trim_end().to_string()
}

/// Strip separators from an ISBN for separator-insensitive comparison.
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| c.is_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Bracketed qualifiers that audiobook sources append to titles without
/// changing the identity of the book.
const TITLE_NOISE: &[&str] = &[
    "unabridged",
    "abridged",
    "dramatized",
    "a novel",
    "audiobook",
];

/// Drop bracketed edition qualifiers like "(Unabridged)" from a title.
pub fn strip_title_noise(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut chars = title.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '(' || c == '[' {
            let close = if c == '(' { ')' } else { ']' };
            let mut inner = String::new();
            for inner_c in chars.by_ref() {
                if inner_c == close {
                    break;
                }
                inner.push(inner_c);
            }
            if TITLE_NOISE.contains(&normalize(&inner).as_str()) {
                continue;
            }
            // Not a known qualifier: keep the bracketed text for matching.
            out.push(c);
            out.push_str(&inner);
            out.push(close);
        } else {
            out.push(c);
        }
    }

    out.trim().to_string()
}

fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split(' ').filter(|t| !t.is_empty()).collect()
}

/// Levenshtein edit distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate().take(a_len + 1) {
        row[0] = i;
    }
    for (j, val) in matrix[0].iter_mut().enumerate().take(b_len + 1) {
        *val = j;
    }

    for (i, a_char) in a_chars.iter().enumerate() {
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if *a_char == *b_char { 0 } else { 1 };
            matrix[i + 1][j + 1] = (matrix[i][j + 1] + 1)
                .min(matrix[i + 1][j] + 1)
                .min(matrix[i][j] + cost);
        }
    }

    matrix[a_len][b_len]
}

/// Similarity between two strings in `0.0..=1.0`.
///
/// Case- and diacritic-insensitive, token-order-tolerant: the score is the
/// better of token-set overlap and normalized edit distance over the sorted
/// token strings. Empty input never matches anything.
pub fn similarity(a: &str, b: &str) -> f32 {
    let norm_a = normalize(a);
    let norm_b = normalize(b);

    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }

    let mut tokens_a = tokens(&norm_a);
    let mut tokens_b = tokens(&norm_b);
    tokens_a.sort_unstable();
    tokens_a.dedup();
    tokens_b.sort_unstable();
    tokens_b.dedup();

    let common = tokens_a.iter().filter(|t| tokens_b.contains(t)).count();
    let overlap = common as f32 / tokens_a.len().max(tokens_b.len()) as f32;

    // Edit distance over the order-normalized strings catches spelling
    // variations the token overlap misses.
    let sorted_a = tokens_a.join(" ");
    let sorted_b = tokens_b.join(" ");
    let distance = levenshtein_distance(&sorted_a, &sorted_b);
    let max_len = sorted_a.chars().count().max(sorted_b.chars().count());
    let edit_ratio = 1.0 - (distance as f32 / max_len as f32);

    overlap.max(edit_ratio)
}
