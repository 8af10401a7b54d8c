use sha2::{Digest, Sha256};

/// Hash-derived unit vector for `text`. Stable across runs, so synthetic
/// corpora built from it produce the same graph every time.
pub fn deterministic_embedding(text: &str, dims: usize) -> Vec<f32> {
    let dims = dims.max(1);

    let mut out = Vec::with_capacity(dims);
    let mut block = 0u32;
    while out.len() < dims {
        let mut hasher = Sha256::new();
        hasher.update(block.to_le_bytes());
        hasher.update(text.as_bytes());
        let digest = hasher.finalize();
        for byte in digest.iter() {
            if out.len() == dims {
                break;
            }
            out.push((*byte as f32 / 127.5) - 1.0);
        }
        block += 1;
    }

    normalize(out)
}

/// Embedding that sits close to the centroid of `topic`. `spread` in [0, 1]
/// controls how far `key` pulls the vector away from the topic direction.
pub fn topic_embedding(topic: &str, key: &str, dims: usize, spread: f32) -> Vec<f32> {
    let spread = spread.clamp(0.0, 1.0);
    let center = deterministic_embedding(topic, dims);
    let offset = deterministic_embedding(key, dims);

    let blended = center
        .iter()
        .zip(offset.iter())
        .map(|(c, o)| (1.0 - spread) * c + spread * o)
        .collect();
    normalize(blended)
}

fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}
