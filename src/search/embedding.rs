//! Embedding providers
//!
//! The retrieval core only depends on [`EmbeddingProvider`]. The bundled
//! [`HarmonicEncoder`] is a deterministic, training-free encoder based on
//! Harmonic Token Projection (https://arxiv.org/html/2511.20665):
//! every token is read as a base-2^16 integer, reduced modulo a set of
//! coprime moduli, and each residue is projected onto the unit circle.
//! Token vectors are mean-pooled and L2-normalized, so two unrelated texts
//! land near squared distance 2 and identical texts at 0.

use std::f64::consts::PI;

use crate::error::EmbeddingError;

/// Text to fixed-dimension vector transform
pub trait EmbeddingProvider: Send + Sync {
    /// Length of every vector returned by [`encode`](Self::encode)
    fn dimension(&self) -> usize;

    /// Encode a batch, one vector per input and in input order
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Maximum token length (Unicode code points)
const MAX_TOKEN_CHARS: usize = 64;

/// Harmonic Token Projection encoder
pub struct HarmonicEncoder {
    moduli: Vec<u64>,
}

impl HarmonicEncoder {
    /// `dimension` must be even: each modulus contributes a (sin, cos) pair.
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 || dimension % 2 != 0 {
            return Err(EmbeddingError::Unavailable(format!(
                "harmonic encoder needs a positive even dimension, got {}",
                dimension
            )));
        }
        Ok(Self {
            moduli: first_primes(dimension / 2),
        })
    }

    /// Embed one text: tokenize, project each token, mean-pool, normalize
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let dim = self.dimension();
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; dim];
        }

        let mut pooled = vec![0.0f64; dim];
        for token in &tokens {
            let n = token_to_integer(token);
            for (slot, &m) in self.moduli.iter().enumerate() {
                let theta = 2.0 * PI * (n % m) as f64 / m as f64;
                pooled[2 * slot] += theta.sin();
                pooled[2 * slot + 1] += theta.cos();
            }
        }

        let count = tokens.len() as f64;
        pooled.iter_mut().for_each(|v| *v /= count);

        let norm = pooled.iter().map(|v| v * v).sum::<f64>().sqrt();
        let scale = if norm > 0.0 { 1.0 / norm } else { 1.0 };
        pooled.into_iter().map(|v| (v * scale) as f32).collect()
    }
}

impl EmbeddingProvider for HarmonicEncoder {
    fn dimension(&self) -> usize {
        self.moduli.len() * 2
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

/// First `n` primes; pairwise coprime by construction
fn first_primes(n: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(n);
    let mut candidate = 2u64;
    while primes.len() < n {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// N = sum(u_j * 2^16^(L-j)), wrapping on overflow
fn token_to_integer(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_CHARS)
        .fold(0u64, |n, c| n.wrapping_mul(65536).wrapping_add(c as u64))
}

/// Lowercased words split on whitespace and ASCII punctuation
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Squared Euclidean distance. Callers guarantee equal lengths.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
