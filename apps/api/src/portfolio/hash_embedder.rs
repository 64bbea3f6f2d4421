//! Deterministic feature-hashing embedder for tests: no model download.

use std::hash::Hasher;

use async_trait::async_trait;
use siphasher::sip::SipHasher13;

use super::embedder::Embedder;
use super::PortfolioError;

const HASH_SEED_K0: u64 = 0x0123_4567_89ab_cdef;
const HASH_SEED_K1: u64 = 0xfedc_ba98_7654_3210;

pub const HASH_EMBEDDER_ID: &str = "hash-sip13-v1";
pub const DEFAULT_DIMENSION: usize = 384;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Signed feature hashing over word tokens and character trigrams.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        // raw bytes, not `Hash for str`, so vectors don't depend on std's framing
        hasher.write(feature.as_bytes());
        let h = hasher.finish();
        let idx = (h % self.dimension as u64) as usize;
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        (idx, sign)
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let (idx, sign) = self.bucket(&format!("w:{token}"));
            vector[idx] += sign * WORD_WEIGHT;

            for gram in trigrams(&token) {
                let (idx, sign) = self.bucket(&format!("g:{gram}"));
                vector[idx] += sign * TRIGRAM_WEIGHT;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn id(&self) -> &str {
        HASH_EMBEDDER_ID
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PortfolioError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn trigrams(token: &str) -> Vec<String> {
    let padded: Vec<char> = format!("^{token}$").chars().collect();
    padded
        .windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

mod tests {
    use super::*;

    #[test]
    fn test_vectors_are_normalized_and_deterministic() {
        let e = HashEmbedder::default();
        let v = e.embed_one("React, Node.js, MongoDB");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
        assert_eq!(v, HashEmbedder::default().embed_one("React, Node.js, MongoDB"));
    }

    #[test]
    fn test_bucket_hashes_raw_feature_bytes() {
        let e = HashEmbedder::new(1 << 16);
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        hasher.write(b"w:rust");
        let h = hasher.finish();
        assert_eq!(e.bucket("w:rust").0, (h % (1 << 16)) as usize);
    }

    #[test]
    fn test_tokenize_keeps_language_suffixes() {
        assert_eq!(tokenize("C++, C# and Node.js"), vec!["c++", "c#", "and", "node", "js"]);
    }
}
