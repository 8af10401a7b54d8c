use std::collections::HashSet;

/// Cosine similarity of two vectors. `None` when the dimensions differ or
/// either vector is empty; `Some(0.0)` when either has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }

    Some(dot / (norm_a * norm_b))
}

/// Lowercased alphanumeric tokens of at least `min_chars` characters.
pub fn tokenize(text: &str, min_chars: usize) -> HashSet<String> {
    let mut out = HashSet::new();
    let mut buffer = String::new();

    for ch in text.chars().flat_map(|ch| ch.to_lowercase()) {
        if ch.is_alphanumeric() || ch == '_' {
            buffer.push(ch);
        } else if !buffer.is_empty() {
            flush(&mut buffer, &mut out, min_chars);
        }
    }
    flush(&mut buffer, &mut out, min_chars);

    out
}

fn flush(buffer: &mut String, out: &mut HashSet<String>, min_chars: usize) {
    if !buffer.is_empty() && buffer.chars().count() >= min_chars {
        out.insert(std::mem::take(buffer));
    } else {
        buffer.clear();
    }
}

/// Jaccard overlap: |a ∩ b| / |a ∪ b|, 0 when either side is empty.
pub fn token_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}
