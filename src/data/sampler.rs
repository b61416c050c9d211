// ============================================================
// Layer 4 — Pair / Triple Samplers
// ============================================================
// Turns loaded corpora into padded training and evaluation data.
//
// LiveQA (judged answers per question):
//   good = score >= 3, bad = score < 3, m = min(#good, #bad)
//   → m good pairs + m bad pairs per question, surplus dropped
//   → or m triples (q, good[i], bad[i]) for the hinge model
//
// InsuranceQA (shared answer pool):
//   for every correct answer of a question draw one random
//   negative from the whole pool, excluding that question's
//   correct answers. Other questions' positives can be drawn,
//   so a few false negatives are expected.
//
// All sequences go through pad_sequence, so every output has
// exactly max_len entries.

use std::collections::HashSet;

use anyhow::Result;
use rand::{seq::SliceRandom, Rng};

use crate::data::{
    error::CorpusError,
    insuranceqa::{pool_candidates, InsuranceQaCorpus, LabeledQuestion},
    liveqa::LiveQaCorpus,
    padding::pad_sequence,
};
use crate::domain::{
    question::Answer,
    sample::{EvaluationPool, LabeledPair, RankingTriple},
    traits::SequenceEncoder,
};

/// Padded question plus padded good and bad answers of one LiveQA question.
struct Partition {
    question: Vec<u32>,
    good:     Vec<Vec<u32>>,
    bad:      Vec<Vec<u32>>,
}

fn partition<E: SequenceEncoder>(
    encoder: &E,
    text:    &str,
    answers: &[Answer],
    max_len: usize,
) -> Result<Partition> {
    let pad = encoder.pad_value();
    let mut good = Vec::new();
    let mut bad  = Vec::new();
    for a in answers {
        let seq = pad_sequence(&encoder.encode(&a.text)?, max_len, pad);
        if a.is_good() { good.push(seq) } else { bad.push(seq) }
    }
    Ok(Partition {
        question: pad_sequence(&encoder.encode(text)?, max_len, pad),
        good,
        bad,
    })
}

fn liveqa_partitions<E: SequenceEncoder>(
    corpus:  &LiveQaCorpus,
    encoder: &E,
    max_len: usize,
) -> Result<Vec<Partition>> {
    corpus
        .iter()
        .map(|(q, answers)| {
            let p = partition(encoder, &q.full_text(), answers, max_len)?;
            if p.good.is_empty() || p.bad.is_empty() {
                tracing::debug!(
                    "{} [{} / {}]: {} good, {} bad answers, no samples",
                    q.qid, q.main_category, q.sub_category, p.good.len(), p.bad.len()
                );
            }
            Ok(p)
        })
        .collect()
}

/// Balanced (question, answer, 1/0) pairs: per question, m good then m bad.
/// Not used by the hinge-loss trainer, which takes `liveqa_triples`.
#[allow(dead_code)]
pub fn liveqa_pairs<E: SequenceEncoder>(
    corpus:  &LiveQaCorpus,
    encoder: &E,
    max_len: usize,
) -> Result<Vec<LabeledPair>> {
    let mut pairs = Vec::new();
    for p in liveqa_partitions(corpus, encoder, max_len)? {
        let m = p.good.len().min(p.bad.len());
        let labelled = p.good.into_iter().take(m).map(|a| (a, 1u8))
            .chain(p.bad.into_iter().take(m).map(|a| (a, 0u8)));
        for (answer, label) in labelled {
            pairs.push(LabeledPair { question: p.question.clone(), answer, label });
        }
    }
    tracing::info!("Built {} balanced LiveQA pairs", pairs.len());
    Ok(pairs)
}

/// The same balance as `liveqa_pairs`, zipped into hinge-loss triples.
pub fn liveqa_triples<E: SequenceEncoder>(
    corpus:  &LiveQaCorpus,
    encoder: &E,
    max_len: usize,
) -> Result<Vec<RankingTriple>> {
    let mut triples = Vec::new();
    for p in liveqa_partitions(corpus, encoder, max_len)? {
        for (good, bad) in p.good.into_iter().zip(p.bad) {
            triples.push(RankingTriple::new(p.question.clone(), good, bad));
        }
    }
    tracing::info!("Built {} LiveQA training triples", triples.len());
    Ok(triples)
}

/// One pool per question that has both kinds of answers:
/// the first good answer followed by every bad one.
pub fn liveqa_pools<E: SequenceEncoder>(
    corpus:  &LiveQaCorpus,
    encoder: &E,
    max_len: usize,
) -> Result<Vec<EvaluationPool>> {
    let pools = liveqa_partitions(corpus, encoder, max_len)?
        .into_iter()
        .filter(|p| !p.good.is_empty() && !p.bad.is_empty())
        .map(|mut p| {
            let mut candidates = vec![p.good.swap_remove(0)];
            candidates.extend(p.bad);
            EvaluationPool { question: p.question, candidates, correct_index: 0 }
        })
        .collect();
    Ok(pools)
}

/// Draw `count` distinct ids from `all_ids` that are not in `exclude`.
pub fn sample_negatives<R: Rng>(
    all_ids: &[u32],
    exclude: &HashSet<u32>,
    count:   usize,
    rng:     &mut R,
) -> Result<Vec<u32>, CorpusError> {
    let available = all_ids.iter().filter(|id| !exclude.contains(id)).count();
    if available < count {
        return Err(CorpusError::NotEnoughNegatives { needed: count, available });
    }

    let mut chosen = HashSet::with_capacity(count);
    let mut out    = Vec::with_capacity(count);
    while out.len() < count {
        let Some(&id) = all_ids.choose(rng) else { break };
        if !exclude.contains(&id) && chosen.insert(id) {
            out.push(id);
        }
    }
    Ok(out)
}

/// One triple per correct answer, each with a freshly sampled negative.
/// The result is shuffled.
pub fn insuranceqa_triples<R: Rng>(
    corpus:    &InsuranceQaCorpus,
    questions: &[LabeledQuestion],
    max_len:   usize,
    rng:       &mut R,
) -> Result<Vec<RankingTriple>> {
    let pad     = corpus.oov_index();
    let all_ids = corpus.answer_ids();
    let mut triples = Vec::new();

    for q in questions {
        let mut seen = HashSet::new();
        let good: Vec<u32> = q.good.iter().copied().filter(|id| seen.insert(*id)).collect();
        let bad = sample_negatives(&all_ids, &seen, good.len(), rng)?;

        let question = pad_sequence(&q.question, max_len, pad);
        for (g, b) in good.into_iter().zip(bad) {
            triples.push(RankingTriple::new(
                question.clone(),
                pad_sequence(corpus.answer(g)?, max_len, pad),
                pad_sequence(corpus.answer(b)?, max_len, pad),
            ));
        }
    }

    triples.shuffle(rng);
    tracing::info!("Built {} InsuranceQA training triples", triples.len());
    Ok(triples)
}

/// Evaluation pools for pooled label files, correct answer first.
pub fn insuranceqa_pools(
    corpus:    &InsuranceQaCorpus,
    questions: &[LabeledQuestion],
    max_len:   usize,
) -> Result<Vec<EvaluationPool>> {
    let pad = corpus.oov_index();
    questions
        .iter()
        .map(|q| {
            let candidates = pool_candidates(q)
                .into_iter()
                .map(|id| Ok(pad_sequence(corpus.answer(id)?, max_len, pad)))
                .collect::<Result<Vec<_>>>()?;
            Ok(EvaluationPool {
                question: pad_sequence(&q.question, max_len, pad),
                candidates,
                correct_index: 0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::insuranceqa::{tests::write_fixture, InsuranceQaSplit};
    use crate::data::liveqa::parse_liveqa;
    use crate::infra::dictionary::Dictionary;
    use rand::{rngs::StdRng, SeedableRng};

    const SAMPLE: &str = "\
1q\tq1\t\tcats purr\twhy\tPets\tCats
1q`\t`q1`\t`4`\t`they vibrate`\t`r
1q`\t`q1`\t`3`\t`larynx muscles`\t`r
1q`\t`q1`\t`0`\t`no idea`\t`r
2q\tq2\t\tbest pizza\t\tFood\tPizza
2q`\t`q2`\t`1`\t`pineapple`\t`r
2q`\t`q2`\t`2`\t`ham`\t`r
2q`\t`q2`\t`4`\t`mushrooms`\t`r
3q\tq3\t\tonly good\t\tMisc\tMisc
3q`\t`q3`\t`4`\t`great`\t`r
";

    fn liveqa_fixture() -> (LiveQaCorpus, Dictionary) {
        let corpus = parse_liveqa(SAMPLE, "sample", None).unwrap();
        let dic    = Dictionary::from_texts(&corpus.texts()).unwrap();
        (corpus, dic)
    }

    #[test]
    fn test_liveqa_pairs_are_balanced_per_question() {
        let (corpus, dic) = liveqa_fixture();
        let pairs = liveqa_pairs(&corpus, &dic, 6).unwrap();

        // q1: 2 good / 1 bad → 1 + 1, q2: 1 good / 2 bad → 1 + 1, q3: none
        assert_eq!(pairs.len(), 4);
        for chunk in pairs.chunks(2) {
            assert_eq!(chunk[0].question, chunk[1].question);
            assert!(chunk[0].is_good());
            assert!(!chunk[1].is_good());
        }
        assert!(pairs.iter().all(|p| p.question.len() == 6 && p.answer.len() == 6));
    }

    #[test]
    fn test_liveqa_triples_pair_good_with_bad() {
        let (corpus, dic) = liveqa_fixture();
        let triples = liveqa_triples(&corpus, &dic, 4).unwrap();
        assert_eq!(triples.len(), 2);

        let they = dic.id("they").unwrap();
        let no   = dic.id("no").unwrap();
        assert_eq!(triples[0].good[0], they);
        assert_eq!(triples[0].bad[0], no);
        assert_eq!(triples[0].label, 0);
    }

    #[test]
    fn test_liveqa_pools_put_correct_first() {
        let (corpus, dic) = liveqa_fixture();
        let pools = liveqa_pools(&corpus, &dic, 4).unwrap();
        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].candidates.len(), 2);
        assert_eq!(pools[1].candidates.len(), 3);
        assert_eq!(pools[1].candidates[0][0], dic.id("mushrooms").unwrap());
        assert!(pools.iter().all(|p| p.correct_index == 0));
    }

    #[test]
    fn test_sample_negatives_excludes_good_ids() {
        let all: Vec<u32> = (1..=20).collect();
        let exclude: HashSet<u32> = [3, 7, 11].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let neg = sample_negatives(&all, &exclude, 3, &mut rng).unwrap();
            assert_eq!(neg.len(), 3);
            assert!(neg.iter().all(|id| !exclude.contains(id)));
            let distinct: HashSet<_> = neg.iter().collect();
            assert_eq!(distinct.len(), 3);
        }
    }

    #[test]
    fn test_sample_negatives_not_enough() {
        let all = vec![1, 2, 3];
        let exclude: HashSet<u32> = [1, 2].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            sample_negatives(&all, &exclude, 2, &mut rng),
            Err(CorpusError::NotEnoughNegatives { needed: 2, available: 1 })
        ));
    }

    #[test]
    fn test_insuranceqa_bad_answer_never_in_good_set() {
        let dir    = tempfile::TempDir::new().unwrap();
        let table  = write_fixture(dir.path());
        let corpus = InsuranceQaCorpus::load(dir.path(), &table).unwrap();
        let qs     = corpus.questions(InsuranceQaSplit::Train).unwrap();

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let triples = insuranceqa_triples(&corpus, &qs, 3, &mut rng).unwrap();
            // one triple per correct answer: 2 + 1
            assert_eq!(triples.len(), 3);

            for t in &triples {
                let owner = qs
                    .iter()
                    .find(|q| pad_sequence(&q.question, 3, corpus.oov_index()) == t.question)
                    .unwrap();
                for &g in &owner.good {
                    let good_seq = pad_sequence(corpus.answer(g).unwrap(), 3, corpus.oov_index());
                    assert_ne!(good_seq, t.bad);
                }
            }
        }
    }

    #[test]
    fn test_insuranceqa_pools() {
        let dir    = tempfile::TempDir::new().unwrap();
        let table  = write_fixture(dir.path());
        let corpus = InsuranceQaCorpus::load(dir.path(), &table).unwrap();
        let qs     = corpus.questions(InsuranceQaSplit::Test1).unwrap();

        let pools = insuranceqa_pools(&corpus, &qs, 3).unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].candidates.len(), 4);
        // answer 2 = "flood" = row 2, padded with OOV (3)
        assert_eq!(pools[0].candidates[0], vec![2, 3, 3]);
    }
}
