use crate::error::{Error, Result};
use crate::models::job_description::JobDescription;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Ranks candidates against a job description by embedding similarity.
///
/// The score attached to an outreach record is recomputed with [`ats_score`]
/// at send time, so this service is both the batch top-k query and the
/// per-candidate scoring step.
#[derive(Clone)]
pub struct RankingService {
    pool: PgPool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedMatch {
    pub resume_id: Uuid,
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub ats_score: i32,
    pub rank: i32,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    // A mismatched dimension is not a partial match; it scores zero.
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0f32;
    let mut na = 0f32;
    let mut nb = 0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

/// Maps a cosine similarity to the 0-100 "ATS score". The clamp guards
/// against floating-point drift pushing the similarity outside [0, 1].
pub fn ats_score(similarity: f32) -> i32 {
    (similarity.clamp(0.0, 1.0) * 100.0) as i32
}

/// Scores every candidate that has a comparable embedding and orders the
/// result by score, descending. Ties keep input order so identical inputs
/// always rank identically. Candidates without an embedding, or with one of
/// the wrong dimension, are excluded, not zeroed.
pub fn rank(jd_embedding: &[f32], candidates: &[(Uuid, Option<Vec<f32>>)]) -> Vec<(Uuid, i32)> {
    let mut scored: Vec<(Uuid, i32)> = candidates
        .iter()
        .filter_map(|(id, embedding)| {
            embedding
                .as_ref()
                .filter(|emb| emb.len() == jd_embedding.len())
                .map(|emb| (*id, ats_score(cosine_similarity(jd_embedding, emb))))
        })
        .collect();
    // Stable sort: first-seen candidate wins the tie.
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}

impl RankingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn top_matches_for_jd(&self, jd_id: Uuid, top_k: usize) -> Result<Vec<RankedMatch>> {
        let jd = sqlx::query_as::<_, JobDescription>(
            r#"SELECT id, title, canonical_json, embedding, created_at
               FROM job_descriptions WHERE id = $1"#,
        )
        .bind(jd_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job description not found: {}", jd_id)))?;

        self.top_matches_against(&jd, top_k).await
    }

    /// Role-keyed variant: resolves the role name to the most recent job
    /// description whose structured `role` (or, failing that, title) matches
    /// it, then ranks against that.
    pub async fn top_matches_for_role(
        &self,
        role_name: &str,
        top_k: usize,
    ) -> Result<Vec<RankedMatch>> {
        let jd = sqlx::query_as::<_, JobDescription>(
            r#"SELECT id, title, canonical_json, embedding, created_at
               FROM job_descriptions
               WHERE LOWER(canonical_json->>'role') = LOWER($1)
                  OR LOWER(title) = LOWER($1)
               ORDER BY created_at DESC
               LIMIT 1"#,
        )
        .bind(role_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!("No job description for role: {}", role_name))
        })?;

        self.top_matches_against(&jd, top_k).await
    }

    async fn top_matches_against(
        &self,
        jd: &JobDescription,
        top_k: usize,
    ) -> Result<Vec<RankedMatch>> {
        let jd_embedding = jd
            .embedding
            .as_ref()
            .ok_or_else(|| Error::Precondition("Job description has no embedding".to_string()))?;

        let rows = sqlx::query_as::<_, (Uuid, Option<String>, Option<String>, Option<Vec<f32>>)>(
            r#"SELECT id, candidate_name, email, embedding
               FROM resumes ORDER BY created_at ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let candidates: Vec<(Uuid, Option<Vec<f32>>)> = rows
            .iter()
            .map(|(id, _, _, embedding)| (*id, embedding.clone()))
            .collect();

        let mut matches = Vec::new();
        for (resume_id, score) in rank(jd_embedding, &candidates).into_iter().take(top_k) {
            if let Some((_, name, email, _)) = rows.iter().find(|(id, _, _, _)| *id == resume_id) {
                matches.push(RankedMatch {
                    resume_id,
                    candidate_name: name.clone(),
                    email: email.clone(),
                    ats_score: score,
                    rank: (matches.len() + 1) as i32,
                });
            }
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ats_score_stays_in_bounds() {
        assert_eq!(ats_score(1.0), 100);
        assert_eq!(ats_score(0.0), 0);
        assert_eq!(ats_score(0.825), 82);
        // Drifted cosines clamp instead of escaping the range.
        assert_eq!(ats_score(1.0000002), 100);
        assert_eq!(ats_score(-0.3), 0);
    }

    #[test]
    fn cosine_of_parallel_and_orthogonal_vectors() {
        let a = [1.0, 0.0];
        assert!((cosine_similarity(&a, &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &[0.0, 5.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn rank_orders_descending_with_stable_ties() {
        let jd = vec![1.0, 0.0];
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let third = Uuid::new_v4();
        let candidates = vec![
            (first, Some(vec![1.0, 1.0])),  // ~70
            (second, Some(vec![1.0, 0.0])), // 100
            (third, Some(vec![1.0, 1.0])),  // ~70, ties with first
        ];
        let ranked = rank(&jd, &candidates);
        assert_eq!(ranked[0].0, second);
        assert_eq!(ranked[1].0, first);
        assert_eq!(ranked[2].0, third);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn mismatched_dimensions_score_zero_not_partial() {
        // A 2-vs-3 dimension pair must not produce a truncated dot product.
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[1.0]), 0.0);
    }

    #[test]
    fn mismatched_dimensions_are_excluded_from_ranking() {
        let jd = vec![1.0, 0.0, 0.0];
        let comparable = Uuid::new_v4();
        let short = Uuid::new_v4();
        let ranked = rank(
            &jd,
            &[
                (short, Some(vec![1.0, 0.0])),
                (comparable, Some(vec![1.0, 0.0, 0.0])),
            ],
        );
        assert_eq!(ranked, vec![(comparable, 100)]);
    }

    #[test]
    fn missing_embeddings_are_excluded_not_zeroed() {
        let jd = vec![1.0, 0.0];
        let present = Uuid::new_v4();
        let absent = Uuid::new_v4();
        let ranked = rank(&jd, &[(absent, None), (present, Some(vec![-1.0, 0.0]))]);
        // The opposite-direction candidate scores 0 but still ranks; the
        // embedding-less one is simply absent.
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0], (present, 0));
    }
}
