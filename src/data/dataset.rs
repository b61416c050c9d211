use burn::data::dataset::Dataset;

use crate::domain::sample::RankingTriple;

/// In-memory triples behind Burn's `Dataset` trait.
pub struct TripleDataset {
    triples: Vec<RankingTriple>,
}

impl TripleDataset {
    pub fn new(triples: Vec<RankingTriple>) -> Self { Self { triples } }
}

impl Dataset<RankingTriple> for TripleDataset {
    fn get(&self, index: usize) -> Option<RankingTriple> {
        self.triples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.triples.len()
    }
}
