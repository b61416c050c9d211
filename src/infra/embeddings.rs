// ============================================================
// Layer 6 — Pretrained Embedding Table
// ============================================================
// Loads word vectors in the word2vec text format:
//
//   [<count> <dim>]            optional header
//   <word> <v1> <v2> ... <vd>  one line per word
//
// Row i of the table is the vector of word i in file order. One
// extra all-zero row is appended after the last word: that is the
// out-of-vocabulary index, used both for unknown words and as the
// padding fill value for InsuranceQA sequences.

use anyhow::{Context, Result};
use rand::Rng;
use std::{collections::HashMap, fs, path::Path};

use crate::domain::traits::SequenceEncoder;
use crate::infra::dictionary::{tokenize, Dictionary, PAD_ID};

/// Row-major `[rows, dim]` weights ready to be copied into an embedding layer.
#[derive(Debug, Clone)]
pub struct EmbeddingMatrix {
    pub rows:   usize,
    pub dim:    usize,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    index:   HashMap<String, u32>,
    words:   Vec<String>,
    vectors: Vec<f32>,
    dim:     usize,
}

impl EmbeddingTable {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read embeddings from '{}'", path.display()))?;

        let mut entries = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            let values: Vec<&str> = parts.collect();

            // "<count> <dim>" header
            if i == 0 && values.len() == 1 && word.parse::<usize>().is_ok()
                && values[0].parse::<usize>().is_ok()
            {
                continue;
            }

            let vector = values
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<std::result::Result<Vec<f32>, _>>()
                .with_context(|| format!("{}:{}: invalid vector value", path.display(), i + 1))?;
            entries.push((word.to_string(), vector));
        }

        let table = Self::from_entries(entries)
            .with_context(|| format!("Invalid embedding file '{}'", path.display()))?;
        tracing::info!(
            "Loaded {} word vectors of dimension {} from '{}'",
            table.words.len(),
            table.dim,
            path.display()
        );
        Ok(table)
    }

    /// Build a table from `(word, vector)` pairs. The first occurrence of a
    /// duplicated word wins.
    pub fn from_entries(entries: Vec<(String, Vec<f32>)>) -> Result<Self> {
        let dim = entries.first().map(|(_, v)| v.len()).unwrap_or(0);
        anyhow::ensure!(dim > 0, "Embedding table has no vectors");

        let mut index   = HashMap::with_capacity(entries.len());
        let mut words   = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len() * dim);

        for (word, vector) in entries {
            anyhow::ensure!(
                vector.len() == dim,
                "Vector for '{}' has {} values, expected {}",
                word,
                vector.len(),
                dim
            );
            if index.contains_key(&word) {
                continue;
            }
            index.insert(word.clone(), words.len() as u32);
            words.push(word);
            vectors.extend(vector);
        }

        Ok(Self { index, words, vectors, dim })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Rows in the matrix, including the trailing OOV row.
    pub fn len(&self) -> usize {
        self.words.len() + 1
    }

    pub fn oov_index(&self) -> u32 {
        self.words.len() as u32
    }

    pub fn index_of(&self, word: &str) -> Option<u32> {
        self.index.get(word).copied()
    }

    pub fn index_or_oov(&self, word: &str) -> u32 {
        self.index_of(word).unwrap_or_else(|| self.oov_index())
    }

    pub fn word(&self, index: u32) -> Option<&str> {
        self.words.get(index as usize).map(String::as_str)
    }

    /// Words for `ids`; the OOV row and unknown ids render as `X`.
    pub fn revert(&self, ids: &[u32]) -> String {
        ids.iter()
            .map(|&id| self.word(id).unwrap_or("X"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The full table including the zero OOV row.
    pub fn matrix(&self) -> EmbeddingMatrix {
        let mut values = self.vectors.clone();
        values.extend(std::iter::repeat(0.0).take(self.dim));
        EmbeddingMatrix { rows: self.len(), dim: self.dim, values }
    }

    /// A matrix whose row i is the vector of dictionary token i.
    ///
    /// Tokens without a pretrained vector get small random values, the
    /// padding row stays zero. Returns the matrix and the number of hits.
    pub fn aligned_to<R: Rng>(&self, dictionary: &Dictionary, rng: &mut R) -> (EmbeddingMatrix, usize) {
        let rows = dictionary.len();
        let mut values = Vec::with_capacity(rows * self.dim);
        let mut hits = 0usize;

        for id in 0..rows as u32 {
            let found = dictionary
                .token(id)
                .and_then(|t| self.index_of(t))
                .map(|row| &self.vectors[row as usize * self.dim..(row as usize + 1) * self.dim]);
            match found {
                Some(vector) => {
                    values.extend_from_slice(vector);
                    hits += 1;
                }
                None if id == PAD_ID => values.extend(std::iter::repeat(0.0).take(self.dim)),
                None => values.extend((0..self.dim).map(|_| rng.gen_range(-0.05f32..0.05))),
            }
        }

        tracing::info!("{} of {} dictionary tokens have pretrained vectors", hits, rows);
        (EmbeddingMatrix { rows, dim: self.dim, values }, hits)
    }
}

impl SequenceEncoder for EmbeddingTable {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Ok(tokenize(text)?.iter().map(|t| self.index_or_oov(t)).collect())
    }

    fn pad_value(&self) -> u32 {
        self.oov_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn small_table() -> EmbeddingTable {
        EmbeddingTable::from_entries(vec![
            ("cat".to_string(), vec![1.0, 0.0]),
            ("dog".to_string(), vec![0.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_oov_row_follows_words() {
        let t = small_table();
        assert_eq!(t.len(), 3);
        assert_eq!(t.oov_index(), 2);
        assert_eq!(t.index_or_oov("bird"), 2);
        assert_eq!(t.index_or_oov("dog"), 1);
    }

    #[test]
    fn test_matrix_appends_zero_row() {
        let m = small_table().matrix();
        assert_eq!(m.rows, 3);
        assert_eq!(m.values, vec![1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_load_with_header() {
        let dir  = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt");
        std::fs::write(&path, "2 3\ncat 0.1 0.2 0.3\ndog 0.4 0.5 0.6\n").unwrap();

        let t = EmbeddingTable::load(&path).unwrap();
        assert_eq!(t.dim(), 3);
        assert_eq!(t.word(0), Some("cat"));
        assert_eq!(t.revert(&[1, 0, 2]), "dog cat X");
    }

    #[test]
    fn test_inconsistent_dimension_is_rejected() {
        let entries = vec![
            ("a".to_string(), vec![1.0, 2.0]),
            ("b".to_string(), vec![1.0]),
        ];
        assert!(EmbeddingTable::from_entries(entries).is_err());
    }

    #[test]
    fn test_aligned_to_dictionary() {
        let t   = small_table();
        let dic = Dictionary::from_texts(&["dog fish"]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let (m, hits) = t.aligned_to(&dic, &mut rng);
        assert_eq!(m.rows, dic.len());
        assert_eq!(hits, 1);
        assert_eq!(&m.values[0..2], &[0.0f32, 0.0]);
        let dog = dic.id("dog").unwrap() as usize;
        assert_eq!(&m.values[dog * 2..dog * 2 + 2], &[0.0f32, 1.0]);
    }

    #[test]
    fn test_encode_uses_oov_for_unknown_words() {
        let t = small_table();
        assert_eq!(t.encode("Cat bird").unwrap(), vec![0, 2]);
        assert_eq!(t.pad_value(), 2);
    }
}
