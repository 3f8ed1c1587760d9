use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::ingest::decode::{decode_file, NormalizedRecord};
use crate::ingest::delimiter::detect_delimiter;
use crate::ingest::fields::{coerce_date, coerce_int, coerce_post_id, resolve};
use crate::ingest::schema::{classify, IngestRules, SchemaKind};

/// Outcome of one ingestion, echoed back to the uploader.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub kind: SchemaKind,
    pub rows_imported: i64,
}

/// Runs one file through the full pipeline: delimiter detection, decoding,
/// classification, then persistence.
///
/// All rows and the upload record are written inside a single transaction
/// and stamped with a single wall-clock instant, so `[uploaded_at, next
/// uploaded_at)` selects exactly this file's rows and `rows_imported` can
/// never describe a partially imported file.
pub async fn ingest_file(
    pool: &PgPool,
    rules: &IngestRules,
    user_id: i64,
    file_name: &str,
    path: &Path,
) -> Result<IngestReport, AppError> {
    // 1. Decode with the detected delimiter
    let delimiter = detect_delimiter(path);
    let records = decode_file(path, delimiter)
        .map_err(|e| AppError::Validation(format!("could not parse CSV: {e}")))?;

    // 2. Classify once, from the first record
    let kind = classify(rules, file_name, records.first());
    debug!(
        "Decoded {} rows from {file_name} (kind: {}, delimiter: {:?})",
        records.len(),
        kind.as_str(),
        delimiter as char
    );

    // 3. Persist rows and the upload record atomically
    let ingested_at = Utc::now();
    let mut tx = pool.begin().await?;
    let rows_imported = match kind {
        SchemaKind::Overview => {
            insert_overview_rows(&mut tx, rules, user_id, &records, ingested_at).await?
        }
        SchemaKind::Content => {
            insert_content_rows(&mut tx, rules, user_id, &records, ingested_at).await?
        }
    };
    sqlx::query(
        r#"
        INSERT INTO csv_uploads (user_id, kind, file_name, rows_imported, uploaded_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(file_name)
    .bind(rows_imported)
    .bind(ingested_at)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(
        "Imported {rows_imported} {} rows for user {user_id} from {file_name}",
        kind.as_str()
    );

    Ok(IngestReport {
        kind,
        rows_imported,
    })
}

/// Column values for one overview INSERT, resolved and coerced but not yet
/// bound. Split from the INSERT so the mapping is testable without a
/// database.
#[derive(Debug, PartialEq)]
pub struct OverviewValues {
    pub date: DateTime<Utc>,
    pub impressions: Option<i64>,
    pub likes: Option<i64>,
    pub interactions: Option<i64>,
    pub saves: Option<i64>,
    pub shares: Option<i64>,
    pub new_followers: Option<i64>,
    pub unfollows: Option<i64>,
    pub replies: Option<i64>,
    pub reposts: Option<i64>,
    pub profile_visits: Option<i64>,
    pub posts_created: Option<i64>,
    pub video_plays: Option<i64>,
    pub media_views: Option<i64>,
}

/// A row with no readable date still lands; it gets the ingestion instant.
pub fn overview_values(
    rules: &IngestRules,
    record: &NormalizedRecord,
    ingested_at: DateTime<Utc>,
) -> OverviewValues {
    let aliases = &rules.aliases;
    OverviewValues {
        date: coerce_date(resolve(record, &aliases.date)).unwrap_or(ingested_at),
        impressions: coerce_int(resolve(record, &aliases.impressions)),
        likes: coerce_int(resolve(record, &aliases.likes)),
        interactions: coerce_int(resolve(record, &aliases.interactions)),
        saves: coerce_int(resolve(record, &aliases.saves)),
        shares: coerce_int(resolve(record, &aliases.shares)),
        new_followers: coerce_int(resolve(record, &aliases.new_followers)),
        unfollows: coerce_int(resolve(record, &aliases.unfollows)),
        replies: coerce_int(resolve(record, &aliases.replies)),
        reposts: coerce_int(resolve(record, &aliases.reposts)),
        profile_visits: coerce_int(resolve(record, &aliases.profile_visits)),
        posts_created: coerce_int(resolve(record, &aliases.posts_created)),
        video_plays: coerce_int(resolve(record, &aliases.video_plays)),
        media_views: coerce_int(resolve(record, &aliases.media_views)),
    }
}

async fn insert_overview_rows(
    tx: &mut Transaction<'_, Postgres>,
    rules: &IngestRules,
    user_id: i64,
    records: &[NormalizedRecord],
    ingested_at: DateTime<Utc>,
) -> Result<i64, AppError> {
    let mut imported = 0i64;
    for record in records {
        let values = overview_values(rules, record, ingested_at);
        sqlx::query(
            r#"
            INSERT INTO account_overview
                (user_id, date, impressions, likes, interactions, saves, shares,
                 new_followers, unfollows, replies, reposts, profile_visits,
                 posts_created, video_plays, media_views, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(user_id)
        .bind(values.date)
        .bind(values.impressions)
        .bind(values.likes)
        .bind(values.interactions)
        .bind(values.saves)
        .bind(values.shares)
        .bind(values.new_followers)
        .bind(values.unfollows)
        .bind(values.replies)
        .bind(values.reposts)
        .bind(values.profile_visits)
        .bind(values.posts_created)
        .bind(values.video_plays)
        .bind(values.media_views)
        .bind(ingested_at)
        .execute(&mut **tx)
        .await?;
        imported += 1;
    }
    Ok(imported)
}

/// Column values for one content INSERT. Same split as [`OverviewValues`].
#[derive(Debug, PartialEq)]
pub struct ContentValues {
    pub post_id: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub url: Option<String>,
    pub impressions: Option<i64>,
    pub likes: Option<i64>,
    pub interactions: Option<i64>,
    pub saves: Option<i64>,
    pub shares: Option<i64>,
    pub new_followers: Option<i64>,
    pub replies: Option<i64>,
    pub reposts: Option<i64>,
    pub profile_visits: Option<i64>,
    pub detail_expands: Option<i64>,
    pub url_clicks: Option<i64>,
    pub hashtag_clicks: Option<i64>,
    pub permalink_clicks: Option<i64>,
}

/// `fallback_at` seeds the identifier fallback; an unreadable publish date
/// stays NULL rather than defaulting, since "when was this posted" has no
/// honest server-side answer.
pub fn content_values(
    rules: &IngestRules,
    record: &NormalizedRecord,
    fallback_at: DateTime<Utc>,
) -> ContentValues {
    let aliases = &rules.aliases;
    ContentValues {
        post_id: coerce_post_id(resolve(record, &aliases.post_id), fallback_at),
        published_at: coerce_date(resolve(record, &aliases.published_at)),
        text: resolve(record, &aliases.text).map(str::to_string),
        url: resolve(record, &aliases.url).map(str::to_string),
        impressions: coerce_int(resolve(record, &aliases.impressions)),
        likes: coerce_int(resolve(record, &aliases.likes)),
        interactions: coerce_int(resolve(record, &aliases.interactions)),
        saves: coerce_int(resolve(record, &aliases.saves)),
        shares: coerce_int(resolve(record, &aliases.shares)),
        new_followers: coerce_int(resolve(record, &aliases.new_followers)),
        replies: coerce_int(resolve(record, &aliases.replies)),
        reposts: coerce_int(resolve(record, &aliases.reposts)),
        profile_visits: coerce_int(resolve(record, &aliases.profile_visits)),
        detail_expands: coerce_int(resolve(record, &aliases.detail_expands)),
        url_clicks: coerce_int(resolve(record, &aliases.url_clicks)),
        hashtag_clicks: coerce_int(resolve(record, &aliases.hashtag_clicks)),
        permalink_clicks: coerce_int(resolve(record, &aliases.permalink_clicks)),
    }
}

async fn insert_content_rows(
    tx: &mut Transaction<'_, Postgres>,
    rules: &IngestRules,
    user_id: i64,
    records: &[NormalizedRecord],
    ingested_at: DateTime<Utc>,
) -> Result<i64, AppError> {
    let mut imported = 0i64;
    for record in records {
        // Each row gets its own fallback instant so generated identifiers
        // stay distinct within a file.
        let values = content_values(rules, record, Utc::now());
        sqlx::query(
            r#"
            INSERT INTO posts
                (user_id, post_id, published_at, text, url, impressions, likes,
                 interactions, saves, shares, new_followers, replies, reposts,
                 profile_visits, detail_expands, url_clicks, hashtag_clicks,
                 permalink_clicks, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19)
            "#,
        )
        .bind(user_id)
        .bind(values.post_id)
        .bind(values.published_at)
        .bind(values.text)
        .bind(values.url)
        .bind(values.impressions)
        .bind(values.likes)
        .bind(values.interactions)
        .bind(values.saves)
        .bind(values.shares)
        .bind(values.new_followers)
        .bind(values.replies)
        .bind(values.reposts)
        .bind(values.profile_visits)
        .bind(values.detail_expands)
        .bind(values.url_clicks)
        .bind(values.hashtag_clicks)
        .bind(values.permalink_clicks)
        .bind(ingested_at)
        .execute(&mut **tx)
        .await?;
        imported += 1;
    }
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(pairs: &[(&str, &str)]) -> NormalizedRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn at(s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, s).unwrap()
    }

    #[test]
    fn test_overview_mapping_spanish_headers() {
        let rules = IngestRules::default();
        let rec = record(&[
            ("fecha", "2024-03-05"),
            ("impresiones", "1.234"),
            ("me_gusta", "56"),
            ("nuevos_seguidores", "7"),
            ("dejar_de_seguir", "2"),
        ]);
        let values = overview_values(&rules, &rec, at(0));

        assert_eq!(
            values.date,
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );
        assert_eq!(values.impressions, Some(1234));
        assert_eq!(values.likes, Some(56));
        assert_eq!(values.new_followers, Some(7));
        assert_eq!(values.unfollows, Some(2));
        assert_eq!(values.saves, None);
    }

    #[test]
    fn test_overview_unreadable_date_defaults_to_ingestion_instant() {
        let rules = IngestRules::default();
        let rec = record(&[("fecha", "hace dos días"), ("impresiones", "10")]);
        let values = overview_values(&rules, &rec, at(30));

        assert_eq!(values.date, at(30));
        assert_eq!(values.impressions, Some(10));
    }

    #[test]
    fn test_overview_prefers_first_listed_spelling() {
        let rules = IngestRules::default();
        let rec = record(&[("impresiones", "10"), ("impressions", "99")]);
        let values = overview_values(&rules, &rec, at(0));

        assert_eq!(values.impressions, Some(10));
    }

    #[test]
    fn test_content_mapping_with_identifier() {
        let rules = IngestRules::default();
        let rec = record(&[
            ("id_del_post", "987654"),
            ("texto_del_post", "hola mundo"),
            ("postear_enlace", "https://example.com/p/987654"),
            ("impresiones", "2 345,9"),
            ("respuestas", "4"),
        ]);
        let values = content_values(&rules, &rec, at(0));

        assert_eq!(values.post_id, 987654);
        assert_eq!(values.text.as_deref(), Some("hola mundo"));
        assert_eq!(values.url.as_deref(), Some("https://example.com/p/987654"));
        assert_eq!(values.impressions, Some(2345));
        assert_eq!(values.replies, Some(4));
        assert_eq!(values.published_at, None);
    }

    #[test]
    fn test_content_missing_identifier_uses_fallback_millis() {
        let rules = IngestRules::default();
        let rec = record(&[("texto_del_post", "sin id")]);
        let values = content_values(&rules, &rec, at(0));

        assert_eq!(values.post_id, at(0).timestamp_millis());
    }

    #[test]
    fn test_content_unreadable_publish_date_stays_null() {
        let rules = IngestRules::default();
        let rec = record(&[("fecha", "mañana"), ("texto_del_post", "x")]);
        let values = content_values(&rules, &rec, at(0));

        assert_eq!(values.published_at, None);
    }

    #[test]
    fn test_three_row_file_imports_three_rows_one_date_defaulted() {
        let rules = IngestRules::default();
        let ingested_at = at(0);
        let records = vec![
            record(&[("fecha", "2024-03-01"), ("impresiones", "10")]),
            record(&[("fecha", ""), ("impresiones", "20")]),
            record(&[("fecha", "2024-03-03"), ("impresiones", "30")]),
        ];

        let mapped: Vec<OverviewValues> = records
            .iter()
            .map(|r| overview_values(&rules, r, ingested_at))
            .collect();

        assert_eq!(mapped.len(), 3);
        let defaulted: Vec<_> = mapped.iter().filter(|v| v.date == ingested_at).collect();
        assert_eq!(defaulted.len(), 1);
        assert_eq!(defaulted[0].impressions, Some(20));
    }

    #[test]
    fn test_content_publish_date_parses_day_first() {
        let rules = IngestRules::default();
        let rec = record(&[("fecha", "05/03/2024"), ("text", "x")]);
        let values = content_values(&rules, &rec, at(0));

        assert_eq!(
            values.published_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
    }
}
